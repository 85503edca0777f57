//! Hand-off to the engine that changes options on a live filesystem.
//!
//! The engine receives every value plus the nine change registers and must
//! touch only the options whose register state is set or reset. The
//! [`InMemoryEngine`] here is a reference implementation of that contract.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{MountError, MountResult};
use crate::fields::{ChangeRegisters, Field, FieldKind, OptionValue};
use crate::options::{MountOptions, MountValues};
use crate::register::RegisterState;

/// Everything the engine needs to apply one change set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyRequest {
    /// Target filesystem.
    pub fs_name: String,
    /// All option values; only touched ones are meaningful.
    pub values: MountValues,
    /// Change registers, one per group.
    pub registers: ChangeRegisters,
}

impl ApplyRequest {
    /// Fields the engine must act on, decoded from the registers.
    pub fn changed_fields(&self) -> Vec<(Field, RegisterState)> {
        self.registers.changed_fields()
    }

    /// Serializes to JSON.
    pub fn to_json(&self) -> MountResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses from JSON.
    pub fn from_json(json: &str) -> MountResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Result of an apply call that reached the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    /// Fields assigned a new value.
    pub applied: Vec<Field>,
    /// Fields restored to their default.
    pub reset: Vec<Field>,
    /// Fields the engine refused to change live.
    pub failed: Vec<Field>,
}

impl ApplyOutcome {
    /// True when nothing was refused.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Applies a change set to a live filesystem.
pub trait MountApplier {
    /// Applies every set or reset field of `request`.
    fn apply(&self, request: &ApplyRequest) -> MountResult<ApplyOutcome>;
}

/// Reads the current option values of a filesystem.
pub trait SnapshotSource {
    /// Current values of `fs_name`.
    fn snapshot(&self, fs_name: &str) -> MountResult<MountValues>;
}

impl MountOptions {
    /// Consumes the options and packages them for the engine.
    pub fn into_apply_request(self, fs_name: impl Into<String>) -> ApplyRequest {
        let registers = self.registers();
        ApplyRequest {
            fs_name: fs_name.into(),
            values: self.values,
            registers,
        }
    }
}

/// Loads a snapshot into a fresh [`MountOptions`] with no changes recorded.
pub fn load_options<S: SnapshotSource + ?Sized>(source: &S, fs_name: &str) -> MountResult<MountOptions> {
    Ok(MountOptions::from_snapshot(source.snapshot(fs_name)?))
}

/// Mutex-guarded table of filesystems and their option values.
#[derive(Debug)]
pub struct InMemoryEngine {
    filesystems: Mutex<HashMap<String, MountValues>>,
    defaults: MountValues,
    refused: HashSet<Field>,
}

impl InMemoryEngine {
    /// An engine restoring `defaults` on reset.
    pub fn new(defaults: MountValues) -> Self {
        Self {
            filesystems: Mutex::new(HashMap::new()),
            defaults,
            refused: HashSet::new(),
        }
    }

    /// Marks `field` as not changeable on a mounted filesystem.
    pub fn refuse(mut self, field: Field) -> Self {
        self.refused.insert(field);
        self
    }

    /// Adds or replaces a filesystem.
    pub fn insert(&self, fs_name: impl Into<String>, values: MountValues) {
        let mut map = self.filesystems.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(fs_name.into(), values);
    }

    /// Names of known filesystems, sorted.
    pub fn filesystems(&self) -> Vec<String> {
        let map = self.filesystems.lock().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = map.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new(MountValues::default())
    }
}

impl SnapshotSource for InMemoryEngine {
    fn snapshot(&self, fs_name: &str) -> MountResult<MountValues> {
        let map = self.filesystems.lock().unwrap_or_else(|e| e.into_inner());
        map.get(fs_name)
            .copied()
            .ok_or_else(|| MountError::FilesystemNotFound {
                fs_name: fs_name.to_string(),
            })
    }
}

impl MountApplier for InMemoryEngine {
    fn apply(&self, request: &ApplyRequest) -> MountResult<ApplyOutcome> {
        let mut map = self.filesystems.lock().unwrap_or_else(|e| e.into_inner());
        let target = map
            .get_mut(&request.fs_name)
            .ok_or_else(|| MountError::FilesystemNotFound {
                fs_name: request.fs_name.clone(),
            })?;

        let mut outcome = ApplyOutcome::default();
        for (field, state) in request.changed_fields() {
            if self.refused.contains(&field) {
                warn!(fs = %request.fs_name, field = %field, "option cannot be changed live");
                outcome.failed.push(field);
                continue;
            }
            match state {
                RegisterState::Set(toggle) => {
                    // Paired options take their value from the register bit.
                    let value = if field.kind() == FieldKind::Toggle {
                        OptionValue::Bool(toggle.is_on())
                    } else {
                        request.values.get(field)
                    };
                    target.put(field, value)?;
                    debug!(fs = %request.fs_name, field = %field, value = %value, "applied");
                    outcome.applied.push(field);
                }
                RegisterState::Reset => {
                    target.put(field, self.defaults.get(field))?;
                    debug!(fs = %request.fs_name, field = %field, "reset to default");
                    outcome.reset.push(field);
                }
                RegisterState::Untouched => {}
            }
        }
        info!(
            fs = %request.fs_name,
            applied = outcome.applied.len(),
            reset = outcome.reset.len(),
            failed = outcome.failed.len(),
            "mount options applied"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with(fs: &str, values: MountValues) -> InMemoryEngine {
        let engine = InMemoryEngine::default();
        engine.insert(fs, values);
        engine
    }

    #[test]
    fn test_apply_only_touched_fields() {
        let mut server = MountValues::default();
        server.sam.low = 50;
        server.io.readahead = 2048;
        let engine = engine_with("samfs1", server);

        let mut opts = load_options(&engine, "samfs1").unwrap();
        opts.set_hwm(85);
        opts.reset_lwm();
        let outcome = engine.apply(&opts.into_apply_request("samfs1")).unwrap();

        assert_eq!(outcome.applied, vec![Field::High]);
        assert_eq!(outcome.reset, vec![Field::Low]);
        let after = engine.snapshot("samfs1").unwrap();
        assert_eq!(after.sam.high, 85);
        assert_eq!(after.sam.low, 70);
        assert_eq!(after.io.readahead, 2048);
    }

    #[test]
    fn test_untouched_values_in_request_are_ignored() {
        let engine = engine_with("samfs1", MountValues::default());
        let mut values = MountValues::default();
        values.sam.high = 99;
        let request = MountOptions::from_snapshot(values).into_apply_request("samfs1");
        let outcome = engine.apply(&request).unwrap();
        assert_eq!(outcome, ApplyOutcome::default());
        assert_eq!(engine.snapshot("samfs1").unwrap().sam.high, 80);
    }

    #[test]
    fn test_paired_off_applied() {
        let engine = engine_with("samfs1", MountValues::default());
        let mut opts = MountOptions::new();
        opts.set_trace(false);
        engine.apply(&opts.into_apply_request("samfs1")).unwrap();
        assert!(!engine.snapshot("samfs1").unwrap().basic.trace);
    }

    #[test]
    fn test_refused_fields_reported() {
        let engine = InMemoryEngine::default().refuse(Field::Shared);
        engine.insert("samfs1", MountValues::default());
        let mut opts = MountOptions::new();
        opts.set_shared(true);
        opts.set_stripe_width(2);
        let outcome = engine.apply(&opts.into_apply_request("samfs1")).unwrap();
        assert_eq!(outcome.failed, vec![Field::Shared]);
        assert_eq!(outcome.applied, vec![Field::Stripe]);
        assert!(!outcome.is_complete());
        assert!(!engine.snapshot("samfs1").unwrap().shared_fs.shared);
    }

    #[test]
    fn test_unknown_filesystem() {
        let engine = InMemoryEngine::default();
        let request = MountOptions::new().into_apply_request("nope");
        assert!(matches!(
            engine.apply(&request),
            Err(MountError::FilesystemNotFound { .. })
        ));
        assert!(engine.snapshot("nope").is_err());
    }

    #[test]
    fn test_request_json_roundtrip() {
        let mut opts = MountOptions::new();
        opts.set_hwm(85);
        opts.reset_lwm();
        let request = opts.into_apply_request("samfs1");
        let json = request.to_json().unwrap();
        assert!(json.contains("\"sam\": 131075"));
        assert_eq!(ApplyRequest::from_json(&json).unwrap(), request);
    }

    #[test]
    fn test_filesystems_sorted() {
        let engine = InMemoryEngine::default();
        engine.insert("b", MountValues::default());
        engine.insert("a", MountValues::default());
        assert_eq!(engine.filesystems(), vec!["a", "b"]);
    }
}
