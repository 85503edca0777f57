//! Error types for the mount option subsystem.
//!
//! Register and value operations are total. Errors only surface from the
//! text directive parser, generic value assignment, and the external
//! apply/snapshot contract.

use thiserror::Error;

use crate::fields::Field;

/// Result type alias for mount option operations.
pub type MountResult<T> = Result<T, MountError>;

/// Error variants for mount option operations.
#[derive(Debug, Error)]
pub enum MountError {
    /// The directive names an option that has no Field.
    #[error("Unknown mount option: {name}")]
    UnknownOption {
        /// The option keyword as written.
        name: String,
    },

    /// The value does not fit the Field's type or range.
    #[error("Invalid value for {field}: {value}")]
    InvalidValue {
        /// The Field being assigned.
        field: Field,
        /// The rejected value, as text.
        value: String,
    },

    /// The external engine has no filesystem with this name.
    #[error("File system not found: {fs_name}")]
    FilesystemNotFound {
        /// Name of the requested filesystem.
        fs_name: String,
    },

    /// The filesystem name cannot be used as a snapshot key.
    #[error("Invalid file system name: {fs_name:?}")]
    InvalidFilesystemName {
        /// The rejected name.
        fs_name: String,
    },

    /// The external apply call failed as a whole.
    #[error("Apply failed on {fs_name}: {reason}")]
    ApplyFailed {
        /// Target filesystem.
        fs_name: String,
        /// Description reported by the engine.
        reason: String,
    },

    /// Snapshot or request (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Wraps standard I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
