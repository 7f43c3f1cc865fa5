//! Trace and measure the memory a running process takes.
//!
//! This crate wraps the memory point log in a process-wide session:
//! - Recording memory points (`record`, `record_returning`)
//! - Measuring without recording (`measure_now`)
//! - Before/after points around callables (`trace`, `traced`)
//! - Printing the log in MB (`print_log`)
//! - Environment configuration and debug logging
//!
//! ```no_run
//! use tracemem::prelude::*;
//!
//! fn main() -> Result<()> {
//!     tracemem::record(Some("start"), None)?;
//!     let total = tracemem::trace("build_index", || (0..1_000_000u64).collect::<Vec<_>>().len())?;
//!     tracemem::record(Some("end"), None)?;
//!     tracemem::print_log()?;
//!     println!("{} items, now at {} bytes", total, tracemem::measure_now()?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod debug;
pub mod format;
pub mod session;
pub mod trace;

pub use config::Config;
pub use debug::RecordDebugLog;
pub use format::{Rounding, mb, render_log, write_log};
pub use session::{
    Session, install, install_with, measure_now, print_log, record, record_returning, session,
};
pub use trace::{TraceError, trace, trace_with_labels, traced};
pub use tracemem_log::{
    INIT_LABEL, LogError, Measure, MeasurementError, MemoryPoint, MemoryPointLog,
    ProcessMeasurer, UNLABELED,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::format::{Rounding, mb};
    pub use crate::session::Session;
    pub use crate::trace::TraceError;
    pub use anyhow::{Context, Result};
    pub use tracemem_log::{LogError, Measure, MeasurementError, MemoryPoint, MemoryPointLog};
}
