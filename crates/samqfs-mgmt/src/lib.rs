#![warn(missing_docs)]

//! SAM-QFS management tooling: snapshot store, configuration, and the
//! `sam-mountcfg` CLI for planning and applying mount option changes.

pub mod cli;
pub mod config;
pub mod store;

pub use config::{MgmtConfig, OutputFormat};
pub use store::DirStore;
