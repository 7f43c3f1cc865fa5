//! Memory measurement.
//!
//! The log only needs one capability from the outside world: the current
//! memory footprint in bytes. [`ProcessMeasurer`] reads the resident set size
//! of the running process; tests inject closures instead.

use crate::error::MeasurementError;
use parking_lot::Mutex;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Source of the current total memory footprint, in bytes.
///
/// Implementations must not touch any memory point log.
pub trait Measure: Send + Sync {
    fn measure(&self) -> Result<u64, MeasurementError>;
}

impl<F> Measure for F
where
    F: Fn() -> Result<u64, MeasurementError> + Send + Sync,
{
    fn measure(&self) -> Result<u64, MeasurementError> {
        self()
    }
}

/// Resident set size of the current process, via `sysinfo`.
pub struct ProcessMeasurer {
    pid: Pid,
    /// Kept alive between calls so refreshes only touch one process
    system: Mutex<System>,
}

impl ProcessMeasurer {
    /// Create a measurer bound to the current process.
    pub fn new() -> Result<Self, MeasurementError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(MeasurementError::Unsupported);
        }
        let pid = sysinfo::get_current_pid().map_err(MeasurementError::Pid)?;
        Ok(Self {
            pid,
            system: Mutex::new(System::new()),
        })
    }

    /// Process being measured.
    pub fn pid(&self) -> u32 {
        self.pid.as_u32()
    }
}

impl Measure for ProcessMeasurer {
    fn measure(&self) -> Result<u64, MeasurementError> {
        let mut system = self.system.lock();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            ProcessRefreshKind::new().with_memory(),
        );
        system
            .process(self.pid)
            .map(|process| process.memory())
            .ok_or(MeasurementError::ProcessNotFound(self.pid.as_u32()))
    }
}
