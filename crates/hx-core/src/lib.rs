//! Crash-archive inspection pipeline.
//!
//! This library recovers the identity of a crashed process from an ELF
//! core dump and drives an external debugger to produce a symbolic
//! backtrace:
//!
//! - `elf`: core-dump parsing (note iteration, prpsinfo decoding)
//! - `archive`: scoped gzip/tarball unwrapping
//! - `debugger`: external debugger adapter
//! - `analyzer`: turns a core dump into crash info
//! - `repo`: remote repository contract, directory fetcher, watch loop
//! - `plugins`: the Haruspex inspection strategies
//! - `report`: the structured inspection result
//!
//! The binary entry point is in `main.rs`.

pub mod analyzer;
pub mod archive;
pub mod debugger;
pub mod elf;
pub mod exit_codes;
pub mod logging;
pub mod plugins;
pub mod repo;
pub mod report;

pub use analyzer::{CoreDumpAnalyzer, ProgramCrashInfo};
pub use report::Report;
