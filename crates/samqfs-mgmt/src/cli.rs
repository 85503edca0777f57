//! The `sam-mountcfg` command line: argument parsing and the text/JSON
//! renderers behind each subcommand.

use crate::config::{MgmtConfig, OutputFormat};
use crate::store::DirStore;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use samqfs_mount::{
    load_options, unsupported_options, units::parse_kb, ApplyOutcome, ApplyRequest, Field, FieldKind, FsStatus,
    Group, MountApplier, MountValues, OptionValue, SizedField, UnsupportedDefaults,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Top-level arguments.
#[derive(Parser)]
#[command(name = "sam-mountcfg")]
#[command(about = "SAM-QFS mount option planning tool", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML or JSON).
    #[arg(short, long, default_value = "/etc/opt/SUNWsamfs/mountcfg.toml", env = "SAM_MOUNTCFG_CONFIG")]
    pub config: PathBuf,

    /// Output format; overrides the configured one.
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Print the documented default of every option.
    Defaults,
    /// List filesystems with a stored snapshot.
    List,
    /// Print the stored values of a filesystem.
    Show {
        /// Filesystem; defaults to `default_fs`.
        fs_name: Option<String>,
    },
    /// Build a change set from directives and print its registers.
    Plan {
        /// Filesystem; defaults to `default_fs`.
        fs_name: Option<String>,
        /// Directive such as `high = 85`, `notrace` or `low = default`.
        #[arg(short = 'o', long = "option")]
        options: Vec<String>,
        /// File of directives, one per line.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Write the apply request as JSON.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Apply the change set to the stored snapshot.
        #[arg(long)]
        apply: bool,
    },
    /// Decode a status word.
    Status {
        /// Raw flags, decimal or 0x-prefixed hex.
        flags: String,
        /// The filesystem is shared.
        #[arg(long)]
        shared: bool,
    },
    /// Express a size in its best display unit.
    Size {
        /// Kilobytes, or a value with unit such as `4M`.
        value: String,
    },
}

impl Cli {
    /// Loads the configuration, runs the subcommand and prints its output.
    pub fn run(self) -> Result<()> {
        let config = MgmtConfig::load_or_default(&self.config)?;
        let format = self.format.unwrap_or(config.output);
        let store = DirStore::new(&config.snapshot_dir);

        let output = match self.command {
            Command::Defaults => render_values(&MountValues::default(), format)?,
            Command::List => render_list(&store.list()?, format)?,
            Command::Show { ref fs_name } => {
                let fs_name = resolve_fs(fs_name.as_deref(), &config)?;
                let opts = load_options(&store, &fs_name)?;
                let mut out = render_values(opts.values(), format)?;
                if format == OutputFormat::Text {
                    out.push_str(&render_unsupported(opts.values(), &config.unsupported_defaults));
                }
                out
            }
            Command::Plan {
                ref fs_name,
                ref options,
                ref file,
                ref out,
                apply,
            } => {
                let fs_name = resolve_fs(fs_name.as_deref(), &config)?;
                plan(&store, &fs_name, options, file.as_deref(), out.as_deref(), apply, format)?
            }
            Command::Status { ref flags, shared } => {
                let raw = parse_flags(flags)?;
                render_status(&FsStatus::new(shared, raw), format)?
            }
            Command::Size { ref value } => {
                let kb = parse_kb(value).with_context(|| format!("invalid size: {}", value))?;
                render_size(kb, format)?
            }
        };
        print!("{}", output);
        Ok(())
    }
}

fn resolve_fs(fs_name: Option<&str>, config: &MgmtConfig) -> Result<String> {
    fs_name
        .map(str::to_string)
        .or_else(|| config.default_fs.clone())
        .context("no filesystem named and no default_fs configured")
}

fn plan(
    store: &DirStore,
    fs_name: &str,
    directives: &[String],
    file: Option<&Path>,
    out: Option<&Path>,
    apply: bool,
    format: OutputFormat,
) -> Result<String> {
    let mut opts = load_options(store, fs_name)?;
    for line in directives {
        opts.apply_directive(line)?;
    }
    if let Some(path) = file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading directives from {}", path.display()))?;
        opts.apply_directives(&text)?;
    }

    let changes = opts.change_summary();
    let request = opts.into_apply_request(fs_name);
    if let Some(path) = out {
        std::fs::write(path, request.to_json()?)?;
        tracing::info!("Apply request written to {}", path.display());
    }
    let outcome = if apply {
        Some(store.apply(&request)?)
    } else {
        None
    };

    render_plan(
        &PlanReport {
            fs_name: fs_name.to_string(),
            changes,
            request,
            outcome,
        },
        format,
    )
}

/// Parses a status word written in decimal or `0x` hex.
pub fn parse_flags(text: &str) -> Result<u32> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse::<u32>(),
    };
    parsed.with_context(|| format!("invalid status flags: {}", text))
}

fn format_value(field: Field, value: OptionValue) -> String {
    match value {
        OptionValue::Int(kb) if field.kind() == FieldKind::Size => match SizedField::new(kb).display() {
            Some(size) => size.to_string(),
            None => kb.to_string(),
        },
        other => other.to_string(),
    }
}

/// Every option grouped by register, or the snapshot JSON.
pub fn render_values(values: &MountValues, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(format!("{}\n", values.to_json()?));
    }
    let mut out = String::new();
    for group in Group::ALL {
        writeln!(out, "[{}]", group)?;
        for field in group.fields() {
            writeln!(out, "  {:<20} {}", field.keyword(), format_value(field, values.get(field)))?;
        }
    }
    Ok(out)
}

/// The `Unsupported:` line, empty when nothing differs from the baseline.
pub fn render_unsupported(values: &MountValues, defaults: &UnsupportedDefaults) -> String {
    let line = unsupported_options(values, defaults);
    if line.is_empty() {
        String::new()
    } else {
        format!("Unsupported: {}\n", line)
    }
}

/// Stored filesystem names, one per line.
pub fn render_list(names: &[String], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(names)?)),
        OutputFormat::Text => Ok(names.iter().map(|n| format!("{}\n", n)).collect()),
    }
}

/// Result of the `plan` subcommand.
#[derive(Debug, Serialize)]
pub struct PlanReport {
    /// Target filesystem.
    pub fs_name: String,
    /// Change summary lines.
    pub changes: Vec<String>,
    /// Request built from the change set.
    pub request: ApplyRequest,
    /// Engine outcome when the plan was applied.
    pub outcome: Option<ApplyOutcome>,
}

/// Change summary, non-zero registers and the apply outcome.
pub fn render_plan(report: &PlanReport, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(report)?));
    }
    let mut out = String::new();
    writeln!(out, "Plan for {}:", report.fs_name)?;
    if report.changes.is_empty() {
        writeln!(out, "  (no changes)")?;
    }
    for change in &report.changes {
        writeln!(out, "  {}", change)?;
    }
    writeln!(out, "Registers:")?;
    for group in Group::ALL {
        let reg = report.request.registers.get(group);
        if !reg.is_clear() {
            writeln!(out, "  {:<12} {}", group.name(), reg)?;
        }
    }
    if let Some(outcome) = &report.outcome {
        let join = |fields: &[Field]| fields.iter().map(|f| f.keyword()).collect::<Vec<_>>().join(", ");
        writeln!(out, "Applied: {}", join(&outcome.applied))?;
        writeln!(out, "Reset: {}", join(&outcome.reset))?;
        if !outcome.is_complete() {
            writeln!(out, "Failed: {}", join(&outcome.failed))?;
        }
    }
    Ok(out)
}

#[derive(Debug, Serialize)]
struct StatusReport {
    flags: String,
    role: samqfs_mount::ShareRole,
    phase: samqfs_mount::FailoverPhase,
    mount_state: samqfs_mount::MountState,
    activities: Vec<samqfs_mount::Activity>,
}

/// Decoded role, failover phase, mount state and activities.
pub fn render_status(status: &FsStatus, format: OutputFormat) -> Result<String> {
    let report = StatusReport {
        flags: format!("{:#010x}", status.flags.bits()),
        role: status.role(),
        phase: status.phase(),
        mount_state: status.mount_state(),
        activities: status.activities(),
    };
    if format == OutputFormat::Json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(&report)?));
    }
    let mut out = String::new();
    writeln!(out, "Flags: {}", report.flags)?;
    writeln!(out, "Role: {:?}", report.role)?;
    writeln!(out, "Failover: {:?}", report.phase)?;
    writeln!(out, "Mount: {:?}", report.mount_state)?;
    writeln!(out, "Activities: {:?}", report.activities)?;
    Ok(out)
}

/// A kilobyte count and its best display form. Zero shows as `0K`.
pub fn render_size(kb: i64, format: OutputFormat) -> Result<String> {
    let display = SizedField::new(kb).display().map(|d| d.to_string());
    match format {
        OutputFormat::Json => Ok(format!(
            "{}\n",
            serde_json::json!({ "kilobytes": kb, "display": display })
        )),
        OutputFormat::Text => Ok(format!("{} KB = {}\n", kb, display.unwrap_or_else(|| "unset".to_string()))),
    }
}
