//! The configuration object: current option values plus per-option change
//! state.
//!
//! [`MountValues`] is the plain value record, grouped the same way the
//! change registers are. [`MountOptions`] wraps a `MountValues` and records,
//! for each [`Field`], whether it was left alone, explicitly set, or reset to
//! the default. Change registers are derived from that record on demand.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MountError, MountResult};
use crate::fields::{ChangeRegisters, Field, FieldKind, Group, OptionValue};
use crate::register::{ChangeRegister, RegisterState, Toggle};
use crate::units::{DisplaySize, SizedField};

/// General options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicOptions {
    /// 0 = delayed metadata writes, 1 = synchronous.
    pub sync_meta: i16,
    /// Disallow set-uid execution.
    pub no_suid: bool,
    /// Kernel tracing.
    pub trace: bool,
    /// Stripe width in allocation units.
    pub stripe: i16,
    /// Read-only mount.
    pub readonly: bool,
    /// Quota enforcement.
    pub quota: bool,
    /// Inode read buffer, bytes.
    pub rd_ino_buf_size: i32,
    /// Inode write buffer, bytes.
    pub wr_ino_buf_size: i32,
    /// WORM capable.
    pub worm_capable: bool,
    /// Generate the filesystem id from the superblock.
    pub gfsid: bool,
}

impl Default for BasicOptions {
    fn default() -> Self {
        Self {
            sync_meta: 0,
            no_suid: false,
            trace: true,
            stripe: 0,
            readonly: false,
            quota: true,
            rd_ino_buf_size: 16384,
            wr_ino_buf_size: 512,
            worm_capable: false,
            gfsid: true,
        }
    }
}

/// I/O tuning. Sizes are in kilobytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoOptions {
    /// Consecutive direct reads before switching to direct I/O.
    pub dio_rd_consec: i32,
    /// Smallest well-formed read counted towards direct I/O.
    pub dio_rd_form_min: i32,
    /// Smallest ill-formed read counted towards direct I/O.
    pub dio_rd_ill_min: i32,
    /// Consecutive direct writes before switching to direct I/O.
    pub dio_wr_consec: i32,
    /// Smallest well-formed write counted towards direct I/O.
    pub dio_wr_form_min: i32,
    /// Smallest ill-formed write counted towards direct I/O.
    pub dio_wr_ill_min: i32,
    /// Force direct I/O for every file.
    pub forcedirectio: bool,
    /// Software RAID underneath.
    pub sw_raid: bool,
    /// Flush-behind size.
    pub flush_behind: i32,
    /// Read-ahead size.
    pub readahead: i64,
    /// Write-behind size.
    pub writebehind: i64,
    /// Outstanding write bytes per file.
    pub wr_throttle: i64,
    /// Treat NFS writes as asynchronous.
    pub forcenfsasync: bool,
}

impl Default for IoOptions {
    fn default() -> Self {
        Self {
            dio_rd_consec: 0,
            dio_rd_form_min: 256,
            dio_rd_ill_min: 256,
            dio_wr_consec: 0,
            dio_wr_form_min: 256,
            dio_wr_ill_min: 256,
            forcedirectio: false,
            sw_raid: false,
            flush_behind: 0,
            readahead: 1024,
            writebehind: 512,
            wr_throttle: 16384,
            forcenfsasync: false,
        }
    }
}

/// Archive, release and stage options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamOptions {
    /// Release high-water mark, percent.
    pub high: i16,
    /// Release low-water mark, percent.
    pub low: i16,
    /// Partial release size, kilobytes.
    pub partial: i32,
    /// Largest partial release size a file may request.
    pub maxpartial: i32,
    /// Bytes read past the partial area before staging starts.
    pub partial_stage: u32,
    /// Stage window for `stage -n` files.
    pub stage_n_window: u32,
    /// Stage attempts per archive copy.
    pub stage_retries: i32,
    /// Stage flush-behind size.
    pub stage_flush_behind: i32,
    /// Start the archiver at the high-water mark.
    pub hwm_archive: bool,
    /// Archiving enabled (`sam` / `nosam`).
    pub archive: bool,
    /// Archiver directory scans.
    pub arscan: bool,
    /// Old archive format.
    pub oldarchive: bool,
}

impl Default for SamOptions {
    fn default() -> Self {
        Self {
            high: 80,
            low: 70,
            partial: 16,
            maxpartial: 16,
            partial_stage: 16,
            stage_n_window: 256,
            stage_retries: 3,
            stage_flush_behind: 0,
            hwm_archive: false,
            archive: true,
            arscan: true,
            oldarchive: true,
        }
    }
}

/// Shared filesystem options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedFsOptions {
    /// Mounted as a shared filesystem.
    pub shared: bool,
    /// Retry the mount in the background.
    pub bg: bool,
    /// Mount retries.
    pub retry: i16,
    /// Zero lets the engine derive it from the allocation unit.
    pub minallocsz: i64,
    /// Zero lets the engine derive it from the allocation unit.
    pub maxallocsz: i64,
    /// Read lease, seconds.
    pub rdlease: i32,
    /// Write lease, seconds.
    pub wrlease: i32,
    /// Append lease, seconds.
    pub aplease: i32,
    /// Writers on several hosts at once.
    pub mh_write: bool,
    /// Concurrent metadata streams.
    pub nstreams: i32,
    /// Metadata cache timeout, seconds.
    pub meta_timeo: i32,
    /// Lease timeout, seconds.
    pub lease_timeo: i32,
    /// Return errors instead of retrying when the server is gone.
    pub soft: bool,
}

impl Default for SharedFsOptions {
    fn default() -> Self {
        Self {
            shared: false,
            bg: false,
            retry: 10000,
            minallocsz: 0,
            maxallocsz: 0,
            rdlease: 30,
            wrlease: 30,
            aplease: 30,
            mh_write: false,
            nstreams: 256,
            meta_timeo: 3,
            lease_timeo: 0,
            soft: false,
        }
    }
}

/// Multi-reader filesystem options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiReaderOptions {
    /// This host is the single writer.
    pub writer: bool,
    /// This host is a reader.
    pub reader: bool,
    /// Seconds cached attributes stay valid on a reader.
    pub invalid: i32,
    /// Refresh file size at end of file.
    pub refresh_at_eof: bool,
}

/// QFS-only options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QfsOptions {
    /// Simultaneous reads and writes to one file.
    pub qwrite: bool,
    /// Metadata stripe width.
    pub mm_stripe: u16,
}

impl Default for QfsOptions {
    fn default() -> Self {
        Self {
            qwrite: false,
            mm_stripe: 1,
        }
    }
}

/// Options added after release 4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post42Options {
    /// Default WORM retention, minutes.
    pub def_retention: i32,
    /// Application based recovery.
    pub abr: bool,
    /// Directed mirror reads.
    pub dmr: bool,
    /// Zero uninitialized areas on direct I/O.
    pub dio_szero: bool,
    /// Consistency checking of file attributes.
    pub cattr: bool,
}

impl Default for Post42Options {
    fn default() -> Self {
        Self {
            def_retention: 43200,
            abr: true,
            dmr: true,
            dio_szero: false,
            cattr: false,
        }
    }
}

/// Options added in release 4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rel46Options {
    /// WORM emulation.
    pub worm_emul: bool,
    /// WORM lite.
    pub worm_lite: bool,
    /// WORM emulation lite.
    pub emul_lite: bool,
    /// Report the filesystem device id.
    pub cdevid: bool,
    /// Cluster management.
    pub clustermgmt: bool,
    /// Fast cluster failover.
    pub clusterfastsw: bool,
    /// Skip access time updates.
    pub noatime: bool,
    /// Access time update mode.
    pub atime: i16,
    /// Minimum pool size of shared filesystem threads.
    pub min_pool: i32,
}

impl Default for Rel46Options {
    fn default() -> Self {
        Self {
            worm_emul: false,
            worm_lite: false,
            emul_lite: false,
            cdevid: true,
            clustermgmt: false,
            clusterfastsw: false,
            noatime: false,
            atime: 0,
            min_pool: 64,
        }
    }
}

/// Options added in release 5.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rel50Options {
    /// Object stripe width.
    pub obj_width: i16,
    /// Object stripe depth.
    pub obj_depth: i64,
    /// Object pool.
    pub obj_pool: i16,
    /// Object data sync mode.
    pub obj_sync_data: i16,
    /// Metadata logging.
    pub logging: bool,
    /// SAM database updates.
    pub sam_db: bool,
    /// Extended attributes.
    pub xattr: bool,
}

impl Default for Rel50Options {
    fn default() -> Self {
        Self {
            obj_width: 0,
            obj_depth: 0,
            obj_pool: 0,
            obj_sync_data: 0,
            logging: false,
            sam_db: false,
            xattr: true,
        }
    }
}

/// Options added in release 5.64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rel564Options {
    /// Case-insensitive file name lookup. Off means case-sensitive.
    pub ci: bool,
}

/// Every option value of one filesystem. `Default` holds the documented
/// defaults; a server snapshot deserializes into the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MountValues {
    /// General options.
    pub basic: BasicOptions,
    /// I/O tuning.
    pub io: IoOptions,
    /// Archive, release and stage options.
    pub sam: SamOptions,
    /// Shared filesystem options.
    pub shared_fs: SharedFsOptions,
    /// Multi-reader options.
    pub multireader: MultiReaderOptions,
    /// QFS-only options.
    pub qfs: QfsOptions,
    /// Post 4.2 options.
    pub post_4_2: Post42Options,
    /// Release 4.6 options.
    pub rel_4_6: Rel46Options,
    /// Release 5.0 options.
    pub rel_5_0: Rel50Options,
    /// Release 5.64 options.
    pub rel_5_64: Rel564Options,
}

impl MountValues {
    /// Parses a JSON snapshot. Missing groups and fields take their defaults.
    pub fn from_json(json: &str) -> MountResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> MountResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Change state of one Field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "value")]
pub enum Change {
    /// Never touched since construction.
    #[default]
    Unchanged,
    /// Explicitly assigned.
    Set(OptionValue),
    /// Return to the documented default.
    ResetToDefault,
}

/// Mount options of one filesystem plus what the caller changed.
///
/// Not `Clone`: the object is consumed by
/// [`into_apply_request`](MountOptions::into_apply_request), and a mutated
/// object is never a valid baseline for another change set.
#[derive(Debug, Default)]
pub struct MountOptions {
    pub(crate) values: MountValues,
    changes: BTreeMap<Field, Change>,
}

impl MountOptions {
    /// Options holding the documented defaults, nothing changed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options holding values read from a live filesystem, nothing changed.
    pub fn from_snapshot(values: MountValues) -> Self {
        Self {
            values,
            changes: BTreeMap::new(),
        }
    }

    /// Current values.
    pub fn values(&self) -> &MountValues {
        &self.values
    }

    /// Change state of `field`.
    pub fn change(&self, field: Field) -> Change {
        self.changes.get(&field).copied().unwrap_or_default()
    }

    /// True if `field` was set or reset.
    pub fn is_touched(&self, field: Field) -> bool {
        self.changes.contains_key(&field)
    }

    /// True if any field was set or reset.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Touched fields with their change, in catalogue order.
    pub fn changes(&self) -> impl Iterator<Item = (Field, Change)> + '_ {
        self.changes.iter().map(|(f, c)| (*f, *c))
    }

    /// Reads any field.
    pub fn get(&self, field: Field) -> OptionValue {
        self.values.get(field)
    }

    /// Assigns any field by identity. Fails without touching anything when
    /// the value does not fit.
    pub fn set_value(&mut self, field: Field, value: OptionValue) -> MountResult<()> {
        self.values.put(field, value)?;
        self.record_set(field, self.values.get(field));
        Ok(())
    }

    /// Marks `field` for reset to its default. The stored value is left as is
    /// and carries no meaning until the engine applies the reset.
    pub fn reset(&mut self, field: Field) {
        debug!(field = %field, group = %field.group(), "mount option reset");
        self.changes.insert(field, Change::ResetToDefault);
    }

    pub(crate) fn record_set(&mut self, field: Field, value: OptionValue) {
        debug!(field = %field, group = %field.group(), value = %value, "mount option set");
        self.changes.insert(field, Change::Set(value));
    }

    /// The change register of one group, derived from the change record.
    pub fn register(&self, group: Group) -> ChangeRegister {
        let mut reg = ChangeRegister::new();
        for (field, change) in self.changes.iter().filter(|(f, _)| f.group() == group) {
            write_change(&mut reg, *field, *change);
        }
        reg
    }

    /// Every group's change register.
    pub fn registers(&self) -> ChangeRegisters {
        let mut regs = ChangeRegisters::default();
        for (field, change) in &self.changes {
            write_change(regs.get_mut(field.group()), *field, *change);
        }
        regs
    }

    /// Decoded register state of one field.
    pub fn state(&self, field: Field) -> RegisterState {
        self.register(field.group()).state(field.bits())
    }

    /// Fills options whose effective value depends on others, for fields the
    /// caller did not touch. Change state is not modified.
    ///
    /// * `sync_meta` is 1 on shared or multi-reader filesystems, else 0.
    /// * `partial_stage` follows `partial`.
    /// * `ro` is forced on when `reader` was explicitly enabled.
    pub fn apply_dependent_defaults(&mut self) {
        if !self.is_touched(Field::SyncMeta) {
            let v = &self.values;
            let shared = v.shared_fs.shared || v.multireader.reader || v.multireader.writer;
            self.values.basic.sync_meta = i16::from(shared);
        }
        if !self.is_touched(Field::PartialStage) {
            if let Ok(stage) = u32::try_from(self.values.sam.partial) {
                self.values.sam.partial_stage = stage;
            }
        }
        if !self.is_touched(Field::ReadOnly)
            && self.is_touched(Field::Reader)
            && self.values.multireader.reader
        {
            self.values.basic.readonly = true;
        }
    }

    /// One line per touched field: `key = value` or `key = default`.
    pub fn change_summary(&self) -> Vec<String> {
        self.changes
            .iter()
            .map(|(field, change)| match change {
                Change::ResetToDefault => format!("{} = default", field),
                Change::Set(OptionValue::Bool(on)) if field.kind() == FieldKind::Toggle => {
                    match (on, field.off_keyword()) {
                        (false, Some(off)) => off.to_string(),
                        _ => field.keyword().to_string(),
                    }
                }
                Change::Set(value) => format!("{} = {}", field, value),
                Change::Unchanged => field.keyword().to_string(),
            })
            .collect()
    }

    /// The current value of a size field, in its best display unit.
    pub fn display_size(&self, field: Field) -> Option<DisplaySize> {
        self.sized(field)?.display()
    }

    /// The current value of a size field as a (magnitude, unit) pair.
    /// `None` for fields that are not sizes.
    pub fn sized(&self, field: Field) -> Option<SizedField> {
        if field.kind() != FieldKind::Size {
            return None;
        }
        match self.get(field) {
            OptionValue::Int(kb) => Some(SizedField::new(kb)),
            OptionValue::Bool(_) => None,
        }
    }

    /// Assigns a size field from a [`SizedField`] and records the change.
    pub fn set_size(&mut self, field: Field, size: SizedField) -> MountResult<()> {
        let invalid = || MountError::InvalidValue {
            field,
            value: size.display().map_or_else(|| "unset".to_string(), |d| d.to_string()),
        };
        if field.kind() != FieldKind::Size {
            return Err(invalid());
        }
        let kb = size.kilobytes().ok_or_else(invalid)?;
        self.set_value(field, OptionValue::Int(kb))
    }
}

fn write_change(reg: &mut ChangeRegister, field: Field, change: Change) {
    match change {
        Change::Set(OptionValue::Bool(on)) => reg.set(field.bits(), Toggle::from(on)),
        Change::Set(OptionValue::Int(_)) => reg.set(field.bits(), Toggle::On),
        Change::ResetToDefault => reg.reset(field.bits()),
        Change::Unchanged => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{SizeUnit, UNSET_MAGNITUDE};

    #[test]
    fn test_new_options_have_zero_registers() {
        let opts = MountOptions::new();
        assert!(opts.registers().is_clear());
        assert!(!opts.has_changes());
        assert_eq!(opts.hwm(), 80);
        assert_eq!(opts.lwm(), 70);
        assert!(opts.is_trace());
    }

    #[test]
    fn test_snapshot_options_have_zero_registers() {
        let mut values = MountValues::default();
        values.sam.high = 95;
        values.basic.trace = false;
        let opts = MountOptions::from_snapshot(values);
        assert!(opts.registers().is_clear());
        assert_eq!(opts.hwm(), 95);
        assert!(!opts.is_trace());
    }

    #[test]
    fn test_hwm_lwm_trace_scenario() {
        let mut opts = MountOptions::new();
        opts.set_hwm(85);
        opts.reset_lwm();
        opts.set_trace(true);

        let regs = opts.registers();
        assert_eq!(regs.sam.bits(), 0x0002_0003);
        assert_eq!(regs.basic.bits(), 0x0000_0008);
        for group in Group::ALL {
            if group != Group::Sam && group != Group::Basic {
                assert!(regs.get(group).is_clear(), "{} not clear", group);
            }
        }
        assert_eq!(opts.hwm(), 85);
        assert_eq!(opts.change(Field::Low), Change::ResetToDefault);
    }

    #[test]
    fn test_paired_set_off_then_on() {
        let mut opts = MountOptions::new();
        opts.set_trace(false);
        assert_eq!(opts.register(Group::Basic).bits(), 0x0000_0010);
        opts.set_trace(true);
        assert_eq!(opts.register(Group::Basic).bits(), 0x0000_0008);
        assert_eq!(opts.state(Field::Trace), RegisterState::Set(Toggle::On));
    }

    #[test]
    fn test_reset_then_set_clears_reset_bits() {
        let mut opts = MountOptions::new();
        opts.reset_quota();
        assert_eq!(opts.register(Group::Basic).bits(), 0x0180_0180);
        opts.set_quota(false);
        assert_eq!(opts.register(Group::Basic).bits(), 0x0000_0100);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut opts = MountOptions::new();
        opts.reset_min_pool();
        let once = opts.registers();
        opts.reset_min_pool();
        assert_eq!(opts.registers(), once);
        assert_eq!(once.rel_4_6.bits(), 0x0800_0800);
    }

    #[test]
    fn test_touched_never_returns_to_untouched() {
        let mut opts = MountOptions::new();
        opts.set_stripe_width(2);
        opts.reset_stripe_width();
        opts.set_stripe_width(0);
        assert!(opts.is_touched(Field::Stripe));
        assert_eq!(opts.state(Field::Stripe), RegisterState::Set(Toggle::On));
    }

    #[test]
    fn test_setting_default_value_is_still_a_change() {
        let mut opts = MountOptions::new();
        opts.set_hwm(80);
        assert_eq!(opts.register(Group::Sam).bits(), 0x0000_0001);
    }

    #[test]
    fn test_logging_setter_follows_value() {
        let mut opts = MountOptions::new();
        opts.set_logging(false);
        assert_eq!(opts.register(Group::Rel50).bits(), 0x0000_0020);
        opts.set_logging(true);
        assert_eq!(opts.register(Group::Rel50).bits(), 0x0000_0010);
        assert!(opts.is_logging());
    }

    #[test]
    fn test_nosuid_uses_header_bits() {
        let mut opts = MountOptions::new();
        opts.set_no_set_uid(true);
        assert_eq!(opts.register(Group::Basic).bits(), 0x0000_0004);
        opts.set_no_set_uid(false);
        assert_eq!(opts.register(Group::Basic).bits(), 0x0000_0002);
    }

    #[test]
    fn test_archive_reset_uses_header_pattern() {
        let mut opts = MountOptions::new();
        opts.reset_archive();
        assert_eq!(opts.register(Group::Sam).bits(), 0x0C00_0C00);
    }

    #[test]
    fn test_noatime_and_atime_are_independent() {
        let mut opts = MountOptions::new();
        opts.set_no_atime(true);
        opts.set_atime(1);
        assert_eq!(opts.register(Group::Rel46).bits(), 0x0000_0600);
        opts.reset_atime();
        assert_eq!(opts.state(Field::NoAtime), RegisterState::Set(Toggle::On));
    }

    #[test]
    fn test_set_value_generic() {
        let mut opts = MountOptions::new();
        opts.set_value(Field::Readahead, OptionValue::Int(4096)).unwrap();
        assert_eq!(opts.readahead(), 4096);
        assert_eq!(opts.change(Field::Readahead), Change::Set(OptionValue::Int(4096)));
    }

    #[test]
    fn test_set_value_rejects_out_of_range() {
        let mut opts = MountOptions::new();
        let err = opts.set_value(Field::High, OptionValue::Int(100_000)).unwrap_err();
        assert!(matches!(err, MountError::InvalidValue { field: Field::High, .. }));
        assert!(!opts.is_touched(Field::High));
        assert_eq!(opts.hwm(), 80);
    }

    #[test]
    fn test_dependent_defaults_shared() {
        let mut opts = MountOptions::new();
        opts.set_shared(true);
        opts.set_partial(64);
        opts.apply_dependent_defaults();
        assert_eq!(opts.sync_meta(), 1);
        assert_eq!(opts.partial_stage(), 64);
        assert!(!opts.is_touched(Field::SyncMeta));
        assert!(!opts.is_touched(Field::PartialStage));
    }

    #[test]
    fn test_dependent_defaults_respect_explicit_values() {
        let mut opts = MountOptions::new();
        opts.set_shared(true);
        opts.set_sync_meta(0);
        opts.set_partial_stage(8);
        opts.apply_dependent_defaults();
        assert_eq!(opts.sync_meta(), 0);
        assert_eq!(opts.partial_stage(), 8);
    }

    #[test]
    fn test_dependent_defaults_reader_forces_readonly() {
        let mut opts = MountOptions::new();
        opts.set_reader(true);
        opts.apply_dependent_defaults();
        assert!(opts.is_read_only());
        assert_eq!(opts.sync_meta(), 1);
    }

    #[test]
    fn test_change_summary() {
        let mut opts = MountOptions::new();
        opts.set_hwm(85);
        opts.reset_lwm();
        opts.set_trace(false);
        opts.set_quota(true);
        let summary = opts.change_summary();
        assert_eq!(summary, vec!["notrace", "quota", "high = 85", "low = default"]);
    }

    #[test]
    fn test_display_size_only_for_size_fields() {
        let mut opts = MountOptions::new();
        opts.set_readahead(4096);
        let size = opts.display_size(Field::Readahead).unwrap();
        assert_eq!(size.to_string(), "4M");
        assert!(opts.display_size(Field::High).is_none());
    }

    #[test]
    fn test_set_size_regroups_display_unit() {
        let mut opts = MountOptions::new();
        opts.set_readahead(1536);
        let mut size = opts.sized(Field::Readahead).unwrap();
        assert_eq!(size.unit(), SizeUnit::Kb);

        size.set_kilobytes(2048);
        opts.set_size(Field::Readahead, size).unwrap();
        assert_eq!(opts.readahead(), 2048);
        assert_eq!(opts.change(Field::Readahead), Change::Set(OptionValue::Int(2048)));
        assert_eq!(opts.display_size(Field::Readahead).unwrap().to_string(), "2M");
    }

    #[test]
    fn test_set_size_rejects_non_size_and_unset() {
        let mut opts = MountOptions::new();
        let err = opts.set_size(Field::High, SizedField::new(4096)).unwrap_err();
        assert!(matches!(err, MountError::InvalidValue { field: Field::High, .. }));
        let err = opts
            .set_size(Field::Readahead, SizedField::new(UNSET_MAGNITUDE))
            .unwrap_err();
        assert!(matches!(err, MountError::InvalidValue { field: Field::Readahead, .. }));
        assert!(!opts.has_changes());
        assert!(opts.sized(Field::Trace).is_none());
    }

    #[test]
    fn test_case_insensitive_toggle() {
        let mut opts = MountOptions::new();
        assert!(!opts.is_case_insensitive());
        opts.set_case_insensitive(true);
        assert_eq!(opts.register(Group::Rel564).bits(), 0x0000_0001);
        opts.set_case_insensitive(false);
        assert_eq!(opts.register(Group::Rel564).bits(), 0x0000_0002);
        opts.reset_case_insensitive();
        assert_eq!(opts.registers().rel_5_64.bits(), 0x0003_0003);
        assert_eq!(opts.change_summary(), vec!["ci = default"]);
    }

    #[test]
    fn test_values_json_partial_snapshot() {
        let json = r#"{ "sam": { "high": 90 }, "rel_4_6": { "min_pool": 128 } }"#;
        let values = MountValues::from_json(json).unwrap();
        assert_eq!(values.sam.high, 90);
        assert_eq!(values.sam.low, 70);
        assert_eq!(values.rel_4_6.min_pool, 128);
        assert!(values.basic.trace);
    }

    #[test]
    fn test_values_json_roundtrip() {
        let mut values = MountValues::default();
        values.io.readahead = 8192;
        let json = values.to_json().unwrap();
        assert_eq!(MountValues::from_json(&json).unwrap(), values);
    }

    #[test]
    fn test_change_serde_shape() {
        let json = serde_json::to_string(&Change::Set(OptionValue::Int(85))).unwrap();
        assert_eq!(json, r#"{"state":"set","value":85}"#);
        let json = serde_json::to_string(&Change::ResetToDefault).unwrap();
        assert_eq!(json, r#"{"state":"reset_to_default"}"#);
    }
}
