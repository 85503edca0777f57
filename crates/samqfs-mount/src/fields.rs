//! Field catalogue: every change-tracked mount option, the group that owns
//! it, and the bits it occupies in that group's change register.
//!
//! The catalogue is a single table expanded by `mount_fields!`. The same
//! table produces the [`Field`] enum, the bit layout, generic access on
//! [`MountValues`], and the typed getter/setter/resetter triple on
//! [`MountOptions`], so the three can never disagree.

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::error::{MountError, MountResult};
use crate::options::{MountOptions, MountValues};
use crate::register::{ChangeRegister, FieldBits, RegisterState};

/// Functional group of mount options. Each group owns one change register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    /// General options (`sync_meta`, `trace`, `stripe`, ...).
    Basic,
    /// I/O tuning and direct I/O discovery.
    Io,
    /// Archiving, release and stage options.
    Sam,
    /// Shared filesystem options.
    SharedFs,
    /// Multi-reader filesystem options.
    MultiReader,
    /// QFS-only options.
    Qfs,
    /// Options added after release 4.2.
    Post42,
    /// Options added in release 4.6.
    Rel46,
    /// Options added in release 5.0.
    Rel50,
    /// Options added in release 5.64.
    Rel564,
}

impl Group {
    /// All groups in register order.
    pub const ALL: [Group; 10] = [
        Group::Basic,
        Group::Io,
        Group::Sam,
        Group::SharedFs,
        Group::MultiReader,
        Group::Qfs,
        Group::Post42,
        Group::Rel46,
        Group::Rel50,
        Group::Rel564,
    ];

    /// Short name used in logs and CLI output.
    pub fn name(self) -> &'static str {
        match self {
            Group::Basic => "basic",
            Group::Io => "io",
            Group::Sam => "sam",
            Group::SharedFs => "shared_fs",
            Group::MultiReader => "multireader",
            Group::Qfs => "qfs",
            Group::Post42 => "post_4_2",
            Group::Rel46 => "rel_4_6",
            Group::Rel50 => "rel_5_0",
            Group::Rel564 => "rel_5_64",
        }
    }

    /// Fields owned by this group, in catalogue order.
    pub fn fields(self) -> impl Iterator<Item = Field> {
        Field::ALL.iter().copied().filter(move |f| f.group() == self)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value shape of a Field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Boolean with a single change bit.
    Flag,
    /// Boolean with separate on/off change bits.
    Toggle,
    /// Plain integer (count, percentage, seconds).
    Integer,
    /// Magnitude in kilobytes.
    Size,
}

/// A Field value without its static type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean options.
    Bool(bool),
    /// Integer and size options.
    Int(i64),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(true) => f.write_str("on"),
            OptionValue::Bool(false) => f.write_str("off"),
            OptionValue::Int(v) => write!(f, "{}", v),
        }
    }
}

/// Conversion between a Field's storage type and [`OptionValue`].
pub(crate) trait FieldValue: Copy {
    fn into_value(self) -> OptionValue;
    fn from_value(value: OptionValue) -> Option<Self>;
}

impl FieldValue for bool {
    fn into_value(self) -> OptionValue {
        OptionValue::Bool(self)
    }

    fn from_value(value: OptionValue) -> Option<Self> {
        match value {
            OptionValue::Bool(b) => Some(b),
            OptionValue::Int(0) => Some(false),
            OptionValue::Int(1) => Some(true),
            OptionValue::Int(_) => None,
        }
    }
}

macro_rules! impl_int_value {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn into_value(self) -> OptionValue {
                    OptionValue::Int(i64::from(self))
                }

                fn from_value(value: OptionValue) -> Option<Self> {
                    match value {
                        OptionValue::Int(v) => <$ty>::try_from(v).ok(),
                        OptionValue::Bool(_) => None,
                    }
                }
            }
        )*
    };
}

impl_int_value!(i16, u16, i32, u32, i64);

macro_rules! mount_fields {
    ($(
        $(#[$meta:meta])*
        $variant:ident {
            key: $key:literal,
            path: $grp:ident . $member:ident,
            ty: $ty:ty,
            kind: $kind:ident,
            group: $group:ident,
            bits: $bits:expr,
            get: $getter:ident,
            set: $setter:ident,
            reset: $resetter:ident $(,)?
        }
    )*) => {
        /// Identity of a change-tracked mount option.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Field {
            $(
                #[doc = concat!("The `", $key, "` option.")]
                $(#[$meta])*
                $variant,
            )*
        }

        impl Field {
            /// Every Field in catalogue order.
            pub const ALL: &'static [Field] = &[$(Field::$variant,)*];

            /// The samfs.cmd keyword for the option (positive form).
            pub fn keyword(self) -> &'static str {
                match self {
                    $(Field::$variant => $key,)*
                }
            }

            /// The group whose register tracks this option.
            pub fn group(self) -> Group {
                match self {
                    $(Field::$variant => Group::$group,)*
                }
            }

            /// Value shape.
            pub fn kind(self) -> FieldKind {
                match self {
                    $(Field::$variant => FieldKind::$kind,)*
                }
            }

            /// Register bits owned by this option.
            pub fn bits(self) -> FieldBits {
                match self {
                    $(Field::$variant => $bits,)*
                }
            }
        }

        impl MountValues {
            /// Reads a Field without knowing its static type.
            pub fn get(&self, field: Field) -> OptionValue {
                match field {
                    $(Field::$variant => self.$grp.$member.into_value(),)*
                }
            }

            /// Writes a Field without knowing its static type. Fails when the
            /// value has the wrong shape or does not fit the storage type.
            pub fn put(&mut self, field: Field, value: OptionValue) -> MountResult<()> {
                match field {
                    $(
                        Field::$variant => {
                            self.$grp.$member = <$ty as FieldValue>::from_value(value)
                                .ok_or_else(|| MountError::InvalidValue {
                                    field,
                                    value: value.to_string(),
                                })?;
                        }
                    )*
                }
                Ok(())
            }
        }

        impl MountOptions {
            $(
                #[doc = concat!("Current value of `", $key, "`.")]
                pub fn $getter(&self) -> $ty {
                    self.values.$grp.$member
                }

                #[doc = concat!("Assigns `", $key, "` and records an explicit set.")]
                pub fn $setter(&mut self, value: $ty) {
                    self.values.$grp.$member = value;
                    self.record_set(Field::$variant, value.into_value());
                }

                #[doc = concat!("Records a reset of `", $key, "` to its default.")]
                pub fn $resetter(&mut self) {
                    self.reset(Field::$variant);
                }
            )*
        }
    };
}

mount_fields! {
    /// 0 = delayed metadata writes, 1 = synchronous.
    SyncMeta {
        key: "sync_meta", path: basic.sync_meta, ty: i16, kind: Integer, group: Basic,
        bits: FieldBits::single(0x0001),
        get: sync_meta, set: set_sync_meta, reset: reset_sync_meta,
    }
    /// `nosuid` is the "on" state; `suid` is the "off" state.
    NoSetUid {
        key: "nosuid", path: basic.no_suid, ty: bool, kind: Toggle, group: Basic,
        bits: FieldBits::paired(0x0004, 0x0002),
        get: is_no_set_uid, set: set_no_set_uid, reset: reset_no_set_uid,
    }
    Trace {
        key: "trace", path: basic.trace, ty: bool, kind: Toggle, group: Basic,
        bits: FieldBits::paired(0x0008, 0x0010),
        get: is_trace, set: set_trace, reset: reset_trace,
    }
    /// Allocation units written to one LUN before switching; 0 round-robins.
    Stripe {
        key: "stripe", path: basic.stripe, ty: i16, kind: Integer, group: Basic,
        bits: FieldBits::single(0x0020),
        get: stripe_width, set: set_stripe_width, reset: reset_stripe_width,
    }
    ReadOnly {
        key: "ro", path: basic.readonly, ty: bool, kind: Flag, group: Basic,
        bits: FieldBits::single(0x0040),
        get: is_read_only, set: set_read_only, reset: reset_read_only,
    }
    Quota {
        key: "quota", path: basic.quota, ty: bool, kind: Toggle, group: Basic,
        bits: FieldBits::paired(0x0080, 0x0100),
        get: is_quota, set: set_quota, reset: reset_quota,
    }
    RdInoBufSize {
        key: "rd_ino_buf_size", path: basic.rd_ino_buf_size, ty: i32, kind: Integer, group: Basic,
        bits: FieldBits::single(0x0200),
        get: rd_ino_buf_size, set: set_rd_ino_buf_size, reset: reset_rd_ino_buf_size,
    }
    WrInoBufSize {
        key: "wr_ino_buf_size", path: basic.wr_ino_buf_size, ty: i32, kind: Integer, group: Basic,
        bits: FieldBits::single(0x0400),
        get: wr_ino_buf_size, set: set_wr_ino_buf_size, reset: reset_wr_ino_buf_size,
    }
    WormCapable {
        key: "worm_capable", path: basic.worm_capable, ty: bool, kind: Flag, group: Basic,
        bits: FieldBits::single(0x0800),
        get: is_worm_capable, set: set_worm_capable, reset: reset_worm_capable,
    }
    Gfsid {
        key: "gfsid", path: basic.gfsid, ty: bool, kind: Toggle, group: Basic,
        bits: FieldBits::paired(0x1000, 0x2000),
        get: is_gfsid, set: set_gfsid, reset: reset_gfsid,
    }

    DioRdConsec {
        key: "dio_rd_consec", path: io.dio_rd_consec, ty: i32, kind: Integer, group: Io,
        bits: FieldBits::single(0x0001),
        get: dio_rd_consec, set: set_dio_rd_consec, reset: reset_dio_rd_consec,
    }
    DioRdFormMin {
        key: "dio_rd_form_min", path: io.dio_rd_form_min, ty: i32, kind: Size, group: Io,
        bits: FieldBits::single(0x0002),
        get: dio_rd_form_min, set: set_dio_rd_form_min, reset: reset_dio_rd_form_min,
    }
    DioRdIllMin {
        key: "dio_rd_ill_min", path: io.dio_rd_ill_min, ty: i32, kind: Size, group: Io,
        bits: FieldBits::single(0x0004),
        get: dio_rd_ill_min, set: set_dio_rd_ill_min, reset: reset_dio_rd_ill_min,
    }
    DioWrConsec {
        key: "dio_wr_consec", path: io.dio_wr_consec, ty: i32, kind: Integer, group: Io,
        bits: FieldBits::single(0x0008),
        get: dio_wr_consec, set: set_dio_wr_consec, reset: reset_dio_wr_consec,
    }
    DioWrFormMin {
        key: "dio_wr_form_min", path: io.dio_wr_form_min, ty: i32, kind: Size, group: Io,
        bits: FieldBits::single(0x0010),
        get: dio_wr_form_min, set: set_dio_wr_form_min, reset: reset_dio_wr_form_min,
    }
    DioWrIllMin {
        key: "dio_wr_ill_min", path: io.dio_wr_ill_min, ty: i32, kind: Size, group: Io,
        bits: FieldBits::single(0x0020),
        get: dio_wr_ill_min, set: set_dio_wr_ill_min, reset: reset_dio_wr_ill_min,
    }
    ForceDirectIo {
        key: "forcedirectio", path: io.forcedirectio, ty: bool, kind: Toggle, group: Io,
        bits: FieldBits::paired(0x0040, 0x0080),
        get: is_force_direct_io, set: set_force_direct_io, reset: reset_force_direct_io,
    }
    SwRaid {
        key: "sw_raid", path: io.sw_raid, ty: bool, kind: Toggle, group: Io,
        bits: FieldBits::paired(0x0100, 0x0200),
        get: is_sw_raid, set: set_sw_raid, reset: reset_sw_raid,
    }
    FlushBehind {
        key: "flush_behind", path: io.flush_behind, ty: i32, kind: Size, group: Io,
        bits: FieldBits::single(0x0400),
        get: flush_behind, set: set_flush_behind, reset: reset_flush_behind,
    }
    Readahead {
        key: "readahead", path: io.readahead, ty: i64, kind: Size, group: Io,
        bits: FieldBits::single(0x0800),
        get: readahead, set: set_readahead, reset: reset_readahead,
    }
    Writebehind {
        key: "writebehind", path: io.writebehind, ty: i64, kind: Size, group: Io,
        bits: FieldBits::single(0x1000),
        get: writebehind, set: set_writebehind, reset: reset_writebehind,
    }
    WrThrottle {
        key: "wr_throttle", path: io.wr_throttle, ty: i64, kind: Size, group: Io,
        bits: FieldBits::single(0x2000),
        get: wr_throttle, set: set_wr_throttle, reset: reset_wr_throttle,
    }
    ForceNfsAsync {
        key: "force_nfs_async", path: io.forcenfsasync, ty: bool, kind: Toggle, group: Io,
        bits: FieldBits::paired(0x4000, 0x8000),
        get: is_force_nfs_async, set: set_force_nfs_async, reset: reset_force_nfs_async,
    }

    /// Release high-water mark, percent.
    High {
        key: "high", path: sam.high, ty: i16, kind: Integer, group: Sam,
        bits: FieldBits::single(0x0001),
        get: hwm, set: set_hwm, reset: reset_hwm,
    }
    /// Release low-water mark, percent.
    Low {
        key: "low", path: sam.low, ty: i16, kind: Integer, group: Sam,
        bits: FieldBits::single(0x0002),
        get: lwm, set: set_lwm, reset: reset_lwm,
    }
    Partial {
        key: "partial", path: sam.partial, ty: i32, kind: Size, group: Sam,
        bits: FieldBits::single(0x0004),
        get: partial, set: set_partial, reset: reset_partial,
    }
    MaxPartial {
        key: "maxpartial", path: sam.maxpartial, ty: i32, kind: Size, group: Sam,
        bits: FieldBits::single(0x0008),
        get: max_partial, set: set_max_partial, reset: reset_max_partial,
    }
    PartialStage {
        key: "partial_stage", path: sam.partial_stage, ty: u32, kind: Size, group: Sam,
        bits: FieldBits::single(0x0010),
        get: partial_stage, set: set_partial_stage, reset: reset_partial_stage,
    }
    StageNWindow {
        key: "stage_n_window", path: sam.stage_n_window, ty: u32, kind: Size, group: Sam,
        bits: FieldBits::single(0x0020),
        get: stage_n_window, set: set_stage_n_window, reset: reset_stage_n_window,
    }
    StageRetries {
        key: "stage_retries", path: sam.stage_retries, ty: i32, kind: Integer, group: Sam,
        bits: FieldBits::single(0x0040),
        get: stage_retries, set: set_stage_retries, reset: reset_stage_retries,
    }
    StageFlushBehind {
        key: "stage_flush_behind", path: sam.stage_flush_behind, ty: i32, kind: Size, group: Sam,
        bits: FieldBits::single(0x0080),
        get: stage_flush_behind, set: set_stage_flush_behind, reset: reset_stage_flush_behind,
    }
    /// Start the archiver when the high-water mark is reached.
    HwmArchive {
        key: "hwm_archive", path: sam.hwm_archive, ty: bool, kind: Toggle, group: Sam,
        bits: FieldBits::paired(0x0100, 0x0200),
        get: is_hwm_archive, set: set_hwm_archive, reset: reset_hwm_archive,
    }
    Archive {
        key: "sam", path: sam.archive, ty: bool, kind: Toggle, group: Sam,
        bits: FieldBits::paired(0x0400, 0x0800),
        get: is_archive, set: set_archive, reset: reset_archive,
    }
    Arscan {
        key: "arscan", path: sam.arscan, ty: bool, kind: Toggle, group: Sam,
        bits: FieldBits::paired(0x1000, 0x2000),
        get: is_arscan, set: set_arscan, reset: reset_arscan,
    }
    /// `oldarchive` is "on"; `newarchive` is "off".
    OldArchive {
        key: "oldarchive", path: sam.oldarchive, ty: bool, kind: Toggle, group: Sam,
        bits: FieldBits::paired(0x4000, 0x8000),
        get: is_old_archive, set: set_old_archive, reset: reset_old_archive,
    }

    Shared {
        key: "shared", path: shared_fs.shared, ty: bool, kind: Flag, group: SharedFs,
        bits: FieldBits::single(0x0001),
        get: is_shared, set: set_shared, reset: reset_shared,
    }
    /// Retry the mount in the background after an initial failure.
    Bg {
        key: "bg", path: shared_fs.bg, ty: bool, kind: Flag, group: SharedFs,
        bits: FieldBits::single(0x0002),
        get: is_mount_in_background, set: set_mount_in_background, reset: reset_mount_in_background,
    }
    Retry {
        key: "retry", path: shared_fs.retry, ty: i16, kind: Integer, group: SharedFs,
        bits: FieldBits::single(0x0004),
        get: mount_retries, set: set_mount_retries, reset: reset_mount_retries,
    }
    MinAllocSz {
        key: "minallocsz", path: shared_fs.minallocsz, ty: i64, kind: Size, group: SharedFs,
        bits: FieldBits::single(0x0008),
        get: min_alloc_size, set: set_min_alloc_size, reset: reset_min_alloc_size,
    }
    MaxAllocSz {
        key: "maxallocsz", path: shared_fs.maxallocsz, ty: i64, kind: Size, group: SharedFs,
        bits: FieldBits::single(0x0010),
        get: max_alloc_size, set: set_max_alloc_size, reset: reset_max_alloc_size,
    }
    RdLease {
        key: "rdlease", path: shared_fs.rdlease, ty: i32, kind: Integer, group: SharedFs,
        bits: FieldBits::single(0x0020),
        get: read_lease, set: set_read_lease, reset: reset_read_lease,
    }
    WrLease {
        key: "wrlease", path: shared_fs.wrlease, ty: i32, kind: Integer, group: SharedFs,
        bits: FieldBits::single(0x0040),
        get: write_lease, set: set_write_lease, reset: reset_write_lease,
    }
    ApLease {
        key: "aplease", path: shared_fs.aplease, ty: i32, kind: Integer, group: SharedFs,
        bits: FieldBits::single(0x0080),
        get: append_lease, set: set_append_lease, reset: reset_append_lease,
    }
    MhWrite {
        key: "mh_write", path: shared_fs.mh_write, ty: bool, kind: Toggle, group: SharedFs,
        bits: FieldBits::paired(0x0100, 0x0200),
        get: is_multi_host_write, set: set_multi_host_write, reset: reset_multi_host_write,
    }
    Nstreams {
        key: "nstreams", path: shared_fs.nstreams, ty: i32, kind: Integer, group: SharedFs,
        bits: FieldBits::single(0x0400),
        get: max_streams, set: set_max_streams, reset: reset_max_streams,
    }
    MetaTimeo {
        key: "meta_timeo", path: shared_fs.meta_timeo, ty: i32, kind: Integer, group: SharedFs,
        bits: FieldBits::single(0x0800),
        get: meta_timeout, set: set_meta_timeout, reset: reset_meta_timeout,
    }
    LeaseTimeo {
        key: "lease_timeo", path: shared_fs.lease_timeo, ty: i32, kind: Integer, group: SharedFs,
        bits: FieldBits::single(0x1000),
        get: lease_timeout, set: set_lease_timeout, reset: reset_lease_timeout,
    }
    Soft {
        key: "soft", path: shared_fs.soft, ty: bool, kind: Flag, group: SharedFs,
        bits: FieldBits::single(0x2000),
        get: is_soft, set: set_soft, reset: reset_soft,
    }

    /// Bit 0x0002 is kept for the old `shared_writer` spelling.
    Writer {
        key: "writer", path: multireader.writer, ty: bool, kind: Flag, group: MultiReader,
        bits: FieldBits::single(0x0001),
        get: is_writer, set: set_writer, reset: reset_writer,
    }
    /// Bit 0x0008 is kept for the old `shared_reader` spelling.
    Reader {
        key: "reader", path: multireader.reader, ty: bool, kind: Flag, group: MultiReader,
        bits: FieldBits::single(0x0004),
        get: is_reader, set: set_reader, reset: reset_reader,
    }
    Invalid {
        key: "invalid", path: multireader.invalid, ty: i32, kind: Integer, group: MultiReader,
        bits: FieldBits::single(0x0010),
        get: invalid, set: set_invalid, reset: reset_invalid,
    }
    RefreshAtEof {
        key: "refresh_at_eof", path: multireader.refresh_at_eof, ty: bool, kind: Toggle, group: MultiReader,
        bits: FieldBits::paired(0x0020, 0x0040),
        get: is_refresh_at_eof, set: set_refresh_at_eof, reset: reset_refresh_at_eof,
    }

    Qwrite {
        key: "qwrite", path: qfs.qwrite, ty: bool, kind: Toggle, group: Qfs,
        bits: FieldBits::paired(0x0001, 0x0002),
        get: is_quick_write, set: set_quick_write, reset: reset_quick_write,
    }
    MmStripe {
        key: "mm_stripe", path: qfs.mm_stripe, ty: u16, kind: Integer, group: Qfs,
        bits: FieldBits::single(0x0004),
        get: metadata_stripe_width, set: set_metadata_stripe_width, reset: reset_metadata_stripe_width,
    }

    DefRetention {
        key: "def_retention", path: post_4_2.def_retention, ty: i32, kind: Integer, group: Post42,
        bits: FieldBits::single(0x0001),
        get: def_retention, set: set_def_retention, reset: reset_def_retention,
    }
    /// Application based recovery.
    Abr {
        key: "abr", path: post_4_2.abr, ty: bool, kind: Toggle, group: Post42,
        bits: FieldBits::paired(0x0002, 0x0004),
        get: is_app_based_recovery, set: set_app_based_recovery, reset: reset_app_based_recovery,
    }
    /// Directed mirror reads.
    Dmr {
        key: "dmr", path: post_4_2.dmr, ty: bool, kind: Toggle, group: Post42,
        bits: FieldBits::paired(0x0008, 0x0010),
        get: is_directed_mirror_reads, set: set_directed_mirror_reads, reset: reset_directed_mirror_reads,
    }
    DioSzero {
        key: "dio_szero", path: post_4_2.dio_szero, ty: bool, kind: Toggle, group: Post42,
        bits: FieldBits::paired(0x0020, 0x0040),
        get: is_direct_io_zeroing, set: set_direct_io_zeroing, reset: reset_direct_io_zeroing,
    }
    Cattr {
        key: "cattr", path: post_4_2.cattr, ty: bool, kind: Toggle, group: Post42,
        bits: FieldBits::paired(0x0080, 0x0100),
        get: is_consistency_checking, set: set_consistency_checking, reset: reset_consistency_checking,
    }

    WormEmul {
        key: "worm_emul", path: rel_4_6.worm_emul, ty: bool, kind: Flag, group: Rel46,
        bits: FieldBits::single(0x0001),
        get: is_worm_emulation, set: set_worm_emulation, reset: reset_worm_emulation,
    }
    WormLite {
        key: "worm_lite", path: rel_4_6.worm_lite, ty: bool, kind: Flag, group: Rel46,
        bits: FieldBits::single(0x0002),
        get: is_worm_lite, set: set_worm_lite, reset: reset_worm_lite,
    }
    EmulLite {
        key: "emul_lite", path: rel_4_6.emul_lite, ty: bool, kind: Flag, group: Rel46,
        bits: FieldBits::single(0x0004),
        get: is_worm_emulation_lite, set: set_worm_emulation_lite, reset: reset_worm_emulation_lite,
    }
    Cdevid {
        key: "cdevid", path: rel_4_6.cdevid, ty: bool, kind: Toggle, group: Rel46,
        bits: FieldBits::paired(0x0008, 0x0010),
        get: is_cdevid, set: set_cdevid, reset: reset_cdevid,
    }
    ClusterMgmt {
        key: "clustermgmt", path: rel_4_6.clustermgmt, ty: bool, kind: Toggle, group: Rel46,
        bits: FieldBits::paired(0x0020, 0x0040),
        get: is_cluster_mgmt, set: set_cluster_mgmt, reset: reset_cluster_mgmt,
    }
    ClusterFastSw {
        key: "clusterfastsw", path: rel_4_6.clusterfastsw, ty: bool, kind: Toggle, group: Rel46,
        bits: FieldBits::paired(0x0080, 0x0100),
        get: is_cluster_fast_sw, set: set_cluster_fast_sw, reset: reset_cluster_fast_sw,
    }
    /// Independent of `atime`; the two are not an on/off pair.
    NoAtime {
        key: "noatime", path: rel_4_6.noatime, ty: bool, kind: Flag, group: Rel46,
        bits: FieldBits::single(0x0200),
        get: is_no_atime, set: set_no_atime, reset: reset_no_atime,
    }
    Atime {
        key: "atime", path: rel_4_6.atime, ty: i16, kind: Integer, group: Rel46,
        bits: FieldBits::single(0x0400),
        get: atime, set: set_atime, reset: reset_atime,
    }
    MinPool {
        key: "min_pool", path: rel_4_6.min_pool, ty: i32, kind: Integer, group: Rel46,
        bits: FieldBits::single(0x0800),
        get: min_pool, set: set_min_pool, reset: reset_min_pool,
    }

    ObjWidth {
        key: "obj_width", path: rel_5_0.obj_width, ty: i16, kind: Integer, group: Rel50,
        bits: FieldBits::single(0x0001),
        get: obj_width, set: set_obj_width, reset: reset_obj_width,
    }
    ObjDepth {
        key: "obj_depth", path: rel_5_0.obj_depth, ty: i64, kind: Size, group: Rel50,
        bits: FieldBits::single(0x0002),
        get: obj_depth, set: set_obj_depth, reset: reset_obj_depth,
    }
    ObjPool {
        key: "obj_pool", path: rel_5_0.obj_pool, ty: i16, kind: Integer, group: Rel50,
        bits: FieldBits::single(0x0004),
        get: obj_pool, set: set_obj_pool, reset: reset_obj_pool,
    }
    ObjSyncData {
        key: "obj_sync_data", path: rel_5_0.obj_sync_data, ty: i16, kind: Integer, group: Rel50,
        bits: FieldBits::single(0x0008),
        get: obj_sync_data, set: set_obj_sync_data, reset: reset_obj_sync_data,
    }
    Logging {
        key: "logging", path: rel_5_0.logging, ty: bool, kind: Toggle, group: Rel50,
        bits: FieldBits::paired(0x0010, 0x0020),
        get: is_logging, set: set_logging, reset: reset_logging,
    }
    SamDb {
        key: "sam_db", path: rel_5_0.sam_db, ty: bool, kind: Toggle, group: Rel50,
        bits: FieldBits::paired(0x0040, 0x0080),
        get: is_sam_db, set: set_sam_db, reset: reset_sam_db,
    }
    Xattr {
        key: "xattr", path: rel_5_0.xattr, ty: bool, kind: Toggle, group: Rel50,
        bits: FieldBits::paired(0x0100, 0x0200),
        get: is_xattr, set: set_xattr, reset: reset_xattr,
    }

    /// Case-insensitive file name lookup (`ci` / `noci`).
    CaseInsensitive {
        key: "ci", path: rel_5_64.ci, ty: bool, kind: Toggle, group: Rel564,
        bits: FieldBits::paired(0x0001, 0x0002),
        get: is_case_insensitive, set: set_case_insensitive, reset: reset_case_insensitive,
    }
}

impl Field {
    /// The samfs.cmd keyword of the "off" form, for paired options.
    pub fn off_keyword(self) -> Option<&'static str> {
        let key = match self {
            Field::NoSetUid => "suid",
            Field::Trace => "notrace",
            Field::Quota => "noquota",
            Field::Gfsid => "nogfsid",
            Field::ForceDirectIo => "noforcedirectio",
            Field::SwRaid => "nosw_raid",
            Field::ForceNfsAsync => "noforce_nfs_async",
            Field::HwmArchive => "nohwm_archive",
            Field::Archive => "nosam",
            Field::Arscan => "noarscan",
            Field::OldArchive => "newarchive",
            Field::MhWrite => "nomh_write",
            Field::RefreshAtEof => "norefresh_at_eof",
            Field::Qwrite => "noqwrite",
            Field::Abr => "noabr",
            Field::Dmr => "nodmr",
            Field::DioSzero => "nodio_szero",
            Field::Cattr => "nocattr",
            Field::Cdevid => "nocdevid",
            Field::ClusterMgmt => "noclustermgmt",
            Field::ClusterFastSw => "noclusterfastsw",
            Field::Logging => "nologging",
            Field::SamDb => "nosam_db",
            Field::Xattr => "noxattr",
            Field::CaseInsensitive => "noci",
            _ => return None,
        };
        Some(key)
    }

    /// Resolves a samfs.cmd keyword. The second element is the boolean a
    /// bare keyword implies: `Some(true)` for positive forms and aliases of
    /// boolean options, `Some(false)` for "no" forms, `None` for numeric
    /// options.
    pub fn lookup(name: &str) -> Option<(Field, Option<bool>)> {
        let name = name.trim();
        match name {
            "shared_writer" => return Some((Field::Writer, Some(true))),
            "shared_reader" => return Some((Field::Reader, Some(true))),
            _ => {}
        }
        Field::ALL.iter().copied().find_map(|field| {
            let boolean = matches!(field.kind(), FieldKind::Flag | FieldKind::Toggle);
            if field.keyword() == name {
                Some((field, boolean.then_some(true)))
            } else if field.off_keyword() == Some(name) {
                Some((field, Some(false)))
            } else {
                None
            }
        })
    }

    /// True for boolean options.
    pub fn is_boolean(self) -> bool {
        matches!(self.kind(), FieldKind::Flag | FieldKind::Toggle)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The register words handed to the apply engine, one per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeRegisters {
    /// General options.
    pub basic: ChangeRegister,
    /// I/O options.
    pub io: ChangeRegister,
    /// SAM options.
    pub sam: ChangeRegister,
    /// Shared filesystem options.
    pub shared_fs: ChangeRegister,
    /// Multi-reader options.
    pub multireader: ChangeRegister,
    /// QFS options.
    pub qfs: ChangeRegister,
    /// Post 4.2 options.
    pub post_4_2: ChangeRegister,
    /// Release 4.6 options.
    pub rel_4_6: ChangeRegister,
    /// Release 5.0 options.
    pub rel_5_0: ChangeRegister,
    /// Release 5.64 options.
    pub rel_5_64: ChangeRegister,
}

impl ChangeRegisters {
    /// The register owned by `group`.
    pub fn get(&self, group: Group) -> ChangeRegister {
        *self.slot(group)
    }

    pub(crate) fn get_mut(&mut self, group: Group) -> &mut ChangeRegister {
        match group {
            Group::Basic => &mut self.basic,
            Group::Io => &mut self.io,
            Group::Sam => &mut self.sam,
            Group::SharedFs => &mut self.shared_fs,
            Group::MultiReader => &mut self.multireader,
            Group::Qfs => &mut self.qfs,
            Group::Post42 => &mut self.post_4_2,
            Group::Rel46 => &mut self.rel_4_6,
            Group::Rel50 => &mut self.rel_5_0,
            Group::Rel564 => &mut self.rel_5_64,
        }
    }

    fn slot(&self, group: Group) -> &ChangeRegister {
        match group {
            Group::Basic => &self.basic,
            Group::Io => &self.io,
            Group::Sam => &self.sam,
            Group::SharedFs => &self.shared_fs,
            Group::MultiReader => &self.multireader,
            Group::Qfs => &self.qfs,
            Group::Post42 => &self.post_4_2,
            Group::Rel46 => &self.rel_4_6,
            Group::Rel50 => &self.rel_5_0,
            Group::Rel564 => &self.rel_5_64,
        }
    }

    /// Decoded state of one Field.
    pub fn state(&self, field: Field) -> RegisterState {
        self.get(field.group()).state(field.bits())
    }

    /// Every Field whose state is not untouched, in catalogue order.
    pub fn changed_fields(&self) -> Vec<(Field, RegisterState)> {
        Field::ALL
            .iter()
            .map(|&f| (f, self.state(f)))
            .filter(|(_, s)| *s != RegisterState::Untouched)
            .collect()
    }

    /// True when nothing in any group was touched.
    pub fn is_clear(&self) -> bool {
        Group::ALL.iter().all(|&g| self.get(g).is_clear())
    }
}
