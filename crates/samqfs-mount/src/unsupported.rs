//! Reports options that differ from their defaults but that the current
//! management surface cannot display or edit.
//!
//! The output is a comma separated list of `key = value` entries in a fixed
//! order. An empty string means every such option holds its default.

use serde::{Deserialize, Serialize};

use crate::options::MountValues;

/// Baseline values the differ compares against. An option is reported
/// when its value differs from the entry here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnsupportedDefaults {
    /// WORM emulation.
    pub worm_emul: bool,
    /// WORM lite.
    pub worm_lite: bool,
    /// WORM emulation lite.
    pub emul_lite: bool,
    /// Default WORM retention, minutes.
    pub default_retention: i32,
    /// Report the filesystem device id.
    pub cdevid: bool,
    /// Cluster management.
    pub clustermgmt: bool,
    /// Fast cluster failover.
    pub clusterfastsw: bool,
    /// Directed mirror reads.
    pub dmr: bool,
    /// Application based recovery.
    pub abr: bool,
    /// Access time update interval.
    pub atime: i16,
    /// Quota enforcement. Reported through its `noquota` form.
    pub quota: bool,
    /// Multi-reader reader.
    pub reader: bool,
    /// Multi-reader writer.
    pub writer: bool,
    /// Refresh file size at end of file.
    pub refresh_at_eof: bool,
    /// Reader attribute invalidation interval, seconds.
    pub invalid: i32,
    /// Inode write buffer, bytes.
    pub wr_ino_buf_size: i32,
    /// Inode read buffer, bytes.
    pub rd_ino_buf_size: i32,
    /// Minimum inode pool.
    pub min_pool: i32,
    /// Archiver directory scans. Reported through its `noarscan` form.
    pub arscan: bool,
}

impl Default for UnsupportedDefaults {
    fn default() -> Self {
        Self {
            worm_emul: false,
            worm_lite: false,
            emul_lite: false,
            default_retention: 43200,
            cdevid: true,
            clustermgmt: false,
            clusterfastsw: false,
            dmr: true,
            abr: true,
            atime: 0,
            quota: true,
            reader: false,
            writer: false,
            refresh_at_eof: false,
            invalid: 0,
            wr_ino_buf_size: 512,
            rd_ino_buf_size: 16384,
            min_pool: 64,
            arscan: true,
        }
    }
}

fn switch(value: bool, default: bool) -> Option<String> {
    (value != default).then(|| if value { "on" } else { "off" }.to_string())
}

fn differs<T: PartialEq + ToString>(value: T, default: T) -> Option<String> {
    (value != default).then(|| value.to_string())
}

/// Non-default unsupported options, one `key = value` entry each.
pub fn unsupported_entries(values: &MountValues, defaults: &UnsupportedDefaults) -> Vec<String> {
    let basic = &values.basic;
    let mr = &values.multireader;
    let post = &values.post_4_2;
    let rel = &values.rel_4_6;
    let d = defaults;

    let checks = [
        ("worm_emul", switch(rel.worm_emul, d.worm_emul)),
        ("worm_lite", switch(rel.worm_lite, d.worm_lite)),
        ("emul_lite", switch(rel.emul_lite, d.emul_lite)),
        ("default_retention", differs(post.def_retention, d.default_retention)),
        ("cdevid", switch(rel.cdevid, d.cdevid)),
        ("clustermgmt", switch(rel.clustermgmt, d.clustermgmt)),
        ("clusterfastsw", switch(rel.clusterfastsw, d.clusterfastsw)),
        ("dmr", switch(post.dmr, d.dmr)),
        ("abr", switch(post.abr, d.abr)),
        ("atime", differs(rel.atime, d.atime)),
        ("noquota", switch(!basic.quota, !d.quota)),
        ("reader", switch(mr.reader, d.reader)),
        ("writer", switch(mr.writer, d.writer)),
        ("refresh_at_eof", switch(mr.refresh_at_eof, d.refresh_at_eof)),
        ("invalid", differs(mr.invalid, d.invalid)),
        ("wr_ino_buf_size", differs(basic.wr_ino_buf_size, d.wr_ino_buf_size)),
        ("rd_ino_buf_size", differs(basic.rd_ino_buf_size, d.rd_ino_buf_size)),
        ("min_pool", differs(rel.min_pool, d.min_pool)),
        ("noarscan", switch(!values.sam.arscan, !d.arscan)),
    ];

    checks
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| format!("{} = {}", key, v)))
        .collect()
}

/// Same as [`unsupported_entries`], joined with `,`.
pub fn unsupported_options(values: &MountValues, defaults: &UnsupportedDefaults) -> String {
    unsupported_entries(values, defaults).join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_produce_empty_string() {
        let values = MountValues::default();
        assert_eq!(unsupported_options(&values, &UnsupportedDefaults::default()), "");
    }

    #[test]
    fn test_single_difference() {
        let mut values = MountValues::default();
        values.rel_4_6.min_pool = 128;
        assert_eq!(
            unsupported_options(&values, &UnsupportedDefaults::default()),
            "min_pool = 128"
        );
    }

    #[test]
    fn test_fixed_order() {
        let mut values = MountValues::default();
        values.sam.arscan = false;
        values.rel_4_6.worm_emul = true;
        values.basic.quota = false;
        values.post_4_2.def_retention = 60;
        values.rel_4_6.atime = 1;
        values.multireader.reader = true;
        assert_eq!(
            unsupported_options(&values, &UnsupportedDefaults::default()),
            "worm_emul = on,default_retention = 60,atime = 1,noquota = on,reader = on,noarscan = on"
        );
    }

    #[test]
    fn test_negated_booleans() {
        let mut values = MountValues::default();
        values.rel_4_6.cdevid = false;
        values.post_4_2.dmr = false;
        values.post_4_2.abr = false;
        let entries = unsupported_entries(&values, &UnsupportedDefaults::default());
        assert_eq!(entries, vec!["cdevid = off", "dmr = off", "abr = off"]);
    }

    #[test]
    fn test_buffer_sizes() {
        let mut values = MountValues::default();
        values.basic.rd_ino_buf_size = 32768;
        values.basic.wr_ino_buf_size = 1024;
        values.multireader.invalid = 30;
        assert_eq!(
            unsupported_options(&values, &UnsupportedDefaults::default()),
            "invalid = 30,wr_ino_buf_size = 1024,rd_ino_buf_size = 32768"
        );
    }

    #[test]
    fn test_custom_defaults_table() {
        let values = MountValues::default();
        let defaults = UnsupportedDefaults {
            min_pool: 32,
            ..UnsupportedDefaults::default()
        };
        assert_eq!(unsupported_options(&values, &defaults), "min_pool = 64");
    }

    #[test]
    fn test_boolean_baselines_come_from_table() {
        let values = MountValues::default();
        let defaults = UnsupportedDefaults {
            cdevid: false,
            worm_emul: true,
            quota: false,
            ..UnsupportedDefaults::default()
        };
        assert_eq!(
            unsupported_options(&values, &defaults),
            "worm_emul = off,cdevid = on,noquota = off"
        );

        let mut values = MountValues::default();
        values.rel_4_6.cdevid = false;
        values.basic.quota = false;
        assert_eq!(unsupported_options(&values, &defaults), "worm_emul = off");
    }

    #[test]
    fn test_defaults_table_deserializes_partially() {
        let defaults: UnsupportedDefaults = serde_json::from_str(r#"{ "min_pool": 100 }"#).unwrap();
        assert_eq!(defaults.min_pool, 100);
        assert_eq!(defaults.default_retention, 43200);
        assert!(defaults.cdevid);
        assert!(defaults.arscan);
        assert!(!defaults.reader);
    }
}
