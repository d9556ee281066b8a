//! The structured inspection result.
//!
//! A report is write-once: built from a [`ProgramCrashInfo`] plus the
//! inspection context, then rendered. Rendering is YAML via serde; the
//! field set and types are the contract, not the exact text.

use crate::analyzer::ProgramCrashInfo;
use chrono::{DateTime, Local};
use hx_common::{Error, Result};
use serde::{Serialize, Serializer};
use std::path::Path;

fn serialize_date<S: Serializer>(date: &DateTime<Local>, ser: S) -> std::result::Result<S::Ok, S::Error> {
    ser.serialize_str(&date.format("%Y%m%d-%H:%M:%S").to_string())
}

/// Outcome of one archive inspection.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Inspection timestamp.
    #[serde(serialize_with = "serialize_date")]
    pub date: DateTime<Local>,
    /// Name of the inspected crash archive.
    pub filename: String,
    /// Name of the plugin that ran the inspection.
    pub plugin: String,
    /// Basename of the core dump inside the archive.
    #[serde(rename = "core-dump")]
    pub core_dump: Option<String>,
    /// Name of the crashed executable.
    pub executable: Option<String>,
    /// Path of the debugger used.
    pub debugger: Option<String>,
    /// Backtrace lines, in debugger output order.
    pub backtrace: Vec<String>,
}

impl Report {
    /// An empty report for the given archive and plugin.
    pub fn new(filename: impl Into<String>, plugin: impl Into<String>) -> Report {
        Report {
            date: Local::now(),
            filename: filename.into(),
            plugin: plugin.into(),
            core_dump: None,
            executable: None,
            debugger: None,
            backtrace: Vec::new(),
        }
    }

    /// Assemble a report from an analysis result.
    pub fn from_crash_info(
        archive: &Path,
        plugin: &str,
        crash: ProgramCrashInfo,
        debugger: &Path,
    ) -> Report {
        let mut report = Report::new(archive.display().to_string(), plugin);
        report.core_dump = Some(crash.core_dump);
        report.executable = Some(crash.executable);
        report.debugger = Some(debugger.display().to_string());
        report.backtrace = crash.backtrace;
        report
    }

    /// Render the report as a YAML document.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::Render(e.to_string()))
    }
}
