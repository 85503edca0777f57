//! Runtime status word of a mounted filesystem and the views derived from it.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Status bits reported by the engine for one filesystem on one host.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct StatusFlags: u32 {
        /// Mounted.
        const MOUNTED = 0x0000_0001;
        /// Mount in progress.
        const MOUNTING = 0x0000_0002;
        /// Unmount in progress.
        const UMOUNT_IN_PROGRESS = 0x0000_0004;
        /// This host is the metadata server.
        const SERVER = 0x0000_0010;
        /// This host is not the metadata server.
        const CLIENT = 0x0000_0020;
        /// This host cannot become metadata server.
        const NODEVS = 0x0000_0040;
        /// Metadata server is running SAM.
        const SAM = 0x0000_0080;
        /// Write operations locked.
        const LOCK_WRITE = 0x0000_0100;
        /// Name operations locked.
        const LOCK_NAME = 0x0000_0200;
        /// Remove-name operations locked.
        const LOCK_RM_NAME = 0x0000_0400;
        /// All operations locked.
        const LOCK_HARD = 0x0000_0800;
        /// Failover: freezing.
        const FREEZING = 0x0100_0000;
        /// Failover: frozen.
        const FROZEN = 0x0200_0000;
        /// Failover: thawing.
        const THAWING = 0x0400_0000;
        /// Server is resyncing.
        const RESYNCING = 0x0800_0000;
        /// Releaser active.
        const RELEASING = 0x2000_0000;
        /// Stager active.
        const STAGING = 0x4000_0000;
        /// Archiver active.
        const ARCHIVING = 0x8000_0000;
    }
}

/// This host's role in a (possibly) shared filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareRole {
    /// Not a shared filesystem.
    Unshared,
    /// Client that cannot become metadata server.
    Client,
    /// Current metadata server.
    MetadataServer,
    /// Client with metadata devices; may take over as server.
    PotentialMetadataServer,
    /// Shared, but the flags name no role.
    UnknownShared,
}

impl ShareRole {
    /// Classifies a host from the shared indicator and its status flags.
    pub fn classify(shared: bool, flags: StatusFlags) -> Self {
        if !shared {
            ShareRole::Unshared
        } else if flags.contains(StatusFlags::CLIENT | StatusFlags::NODEVS) {
            ShareRole::Client
        } else if flags.contains(StatusFlags::SERVER) {
            ShareRole::MetadataServer
        } else if flags.contains(StatusFlags::CLIENT) {
            ShareRole::PotentialMetadataServer
        } else {
            ShareRole::UnknownShared
        }
    }
}

/// Metadata server failover progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailoverPhase {
    /// No failover activity.
    None,
    /// Host is freezing.
    Freezing,
    /// Host is frozen.
    Frozen,
    /// Host is thawing.
    Thawing,
    /// Server is resyncing.
    Resyncing,
}

impl FailoverPhase {
    /// The latest phase whose bit is set.
    pub fn from_flags(flags: StatusFlags) -> Self {
        if flags.contains(StatusFlags::RESYNCING) {
            FailoverPhase::Resyncing
        } else if flags.contains(StatusFlags::THAWING) {
            FailoverPhase::Thawing
        } else if flags.contains(StatusFlags::FROZEN) {
            FailoverPhase::Frozen
        } else if flags.contains(StatusFlags::FREEZING) {
            FailoverPhase::Freezing
        } else {
            FailoverPhase::None
        }
    }
}

/// Mount lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountState {
    /// Not mounted.
    Unmounted,
    /// Mount in progress.
    Mounting,
    /// Mounted.
    Mounted,
    /// Unmount in progress.
    Unmounting,
}

/// Background SAM activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    /// Releaser.
    Releasing,
    /// Stager.
    Staging,
    /// Archiver.
    Archiving,
}

/// Status snapshot of one filesystem as seen by one host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FsStatus {
    /// The filesystem is configured as shared.
    pub shared: bool,
    /// Runtime status bits.
    pub flags: StatusFlags,
}

impl FsStatus {
    /// Snapshot from a shared indicator and a raw status word. Unknown bits
    /// are dropped.
    pub fn new(shared: bool, raw: u32) -> Self {
        Self {
            shared,
            flags: StatusFlags::from_bits_truncate(raw),
        }
    }

    /// See [`ShareRole::classify`].
    pub fn role(&self) -> ShareRole {
        ShareRole::classify(self.shared, self.flags)
    }

    /// See [`FailoverPhase::from_flags`].
    pub fn phase(&self) -> FailoverPhase {
        FailoverPhase::from_flags(self.flags)
    }

    /// An unmount in progress wins over a mount in progress, which wins over
    /// mounted.
    pub fn mount_state(&self) -> MountState {
        if self.flags.contains(StatusFlags::UMOUNT_IN_PROGRESS) {
            MountState::Unmounting
        } else if self.flags.contains(StatusFlags::MOUNTING) {
            MountState::Mounting
        } else if self.flags.contains(StatusFlags::MOUNTED) {
            MountState::Mounted
        } else {
            MountState::Unmounted
        }
    }

    /// Active background jobs.
    pub fn activities(&self) -> Vec<Activity> {
        [
            (StatusFlags::RELEASING, Activity::Releasing),
            (StatusFlags::STAGING, Activity::Staging),
            (StatusFlags::ARCHIVING, Activity::Archiving),
        ]
        .into_iter()
        .filter(|(bit, _)| self.flags.contains(*bit))
        .map(|(_, activity)| activity)
        .collect()
    }

    /// Lock bits currently held.
    pub fn locks(&self) -> StatusFlags {
        self.flags
            & (StatusFlags::LOCK_WRITE
                | StatusFlags::LOCK_NAME
                | StatusFlags::LOCK_RM_NAME
                | StatusFlags::LOCK_HARD)
    }
}
