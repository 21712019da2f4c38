//! Saved profiles and their catalog.

mod schema;
mod store;

pub use schema::{Profile, names_match};
pub use store::{ProfileStore, RenameOutcome};
