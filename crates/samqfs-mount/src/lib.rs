#![warn(missing_docs)]

//! SAM-QFS mount options: tri-state change tracking and the apply contract.
//!
//! Every mount option is a [`Field`] belonging to one [`Group`]. A
//! [`MountOptions`] object records which fields the caller set or reset and
//! derives one 32-bit [`ChangeRegister`] per group from that record. The
//! engine applies only touched fields.

pub mod apply;
pub mod directive;
pub mod error;
pub mod fields;
pub mod options;
pub mod register;
pub mod status;
pub mod units;
pub mod unsupported;

pub use apply::{load_options, ApplyOutcome, ApplyRequest, InMemoryEngine, MountApplier, SnapshotSource};
pub use directive::{Directive, DirectiveAction};
pub use error::{MountError, MountResult};
pub use fields::{ChangeRegisters, Field, FieldKind, Group, OptionValue};
pub use options::{
    BasicOptions, Change, IoOptions, MountOptions, MountValues, MultiReaderOptions, Post42Options, QfsOptions,
    Rel46Options, Rel50Options, Rel564Options, SamOptions, SharedFsOptions,
};
pub use register::{ChangeRegister, FieldBits, RegisterState, Toggle};
pub use status::{Activity, FailoverPhase, FsStatus, MountState, ShareRole, StatusFlags};
pub use units::{DisplaySize, SizeUnit, SizedField, UNSET_MAGNITUDE};
pub use unsupported::{unsupported_entries, unsupported_options, UnsupportedDefaults};
