//! Configuration: managed-key definitions, inclusion flags, storage layout.
//!
//! `config.json` holds the default profile name and one entry per managed
//! key. The compiled-in definitions decide which keys exist; the file only
//! remembers which of them the user includes.

mod path;
mod schema;
mod store;

pub use path::{
    APP_DIR, BACKUPS_DIR, CONFIG_FILE, HOME_ENV, PROFILE_DATA_DIR, PROFILES_FILE, StoragePaths,
    default_base_dir, expand_home, home_dir,
};
pub use schema::{
    Config, DEFAULT_PROFILE_NAME, ManagedKeyDefinition, ManagedKeyState, SNAPSHOT_EXTENSION,
    default_definitions, is_snapshot_file, key_identifier,
};
pub use store::ConfigStore;
