//! regswap library - Named, restorable snapshots of registry keys.
//!
//! This library exposes the core functionality of the `regswap` CLI for use
//! in tests and potentially other applications.
//!
//! # Modules
//!
//! - `registry`: Registry tool abstraction (real `reg.exe` and mock)
//! - `config`: Managed keys, inclusion flags and storage layout
//! - `backup`: Retention-capped safety backups
//! - `profile`: Profile catalog
//! - `manager`: Save/load/delete/rename workflows
//! - `output`: Output mode abstraction (robot/human)
//! - `menu`: Interactive numbered menu
#![forbid(unsafe_code)]

pub mod atomic;
pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod menu;
pub mod output;
pub mod profile;
pub mod prompt;
pub mod registry;
pub mod state;
pub mod theme;
