//! Memory point log for tracemem.
//!
//! Provides:
//! - Memory point schema
//! - The append-only memory point log
//! - Memory measurement (process RSS or injected stubs)

pub mod error;
pub mod log;
pub mod measure;
pub mod point;

pub use error::{LogError, MeasurementError};
pub use log::{INIT_LABEL, MemoryPointLog, UNLABELED};
pub use measure::{Measure, ProcessMeasurer};
pub use point::MemoryPoint;
