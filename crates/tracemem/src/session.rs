//! Process-wide memory tracing session.
//!
//! A [`Session`] owns the memory point log behind a mutex together with the
//! measurer and configuration. One session can be installed per process with
//! [`install`]; [`session`] returns it, installing a process RSS measurer on
//! first use when nothing was installed. Tests build standalone sessions with
//! [`Session::new`].

use crate::config::Config;
use crate::debug::RecordDebugLog;
use crate::format;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::{Arc, OnceLock};
use tracemem_log::{
    LogError, Measure, MeasurementError, MemoryPoint, MemoryPointLog, ProcessMeasurer,
};

static SESSION: OnceLock<Session> = OnceLock::new();

/// Memory point log plus everything needed to feed and print it.
///
/// Every `record` is atomic with respect to label resolution and append.
/// The measurement itself runs before the lock is taken.
pub struct Session {
    log: Mutex<MemoryPointLog>,
    measurer: Arc<dyn Measure>,
    config: Config,
}

impl Session {
    /// Create a session; records the initial point.
    pub fn new(measurer: impl Measure + 'static, config: Config) -> Result<Self, LogError> {
        let measurer: Arc<dyn Measure> = Arc::new(measurer);
        let log = MemoryPointLog::from_shared(Arc::clone(&measurer))?;
        let session = Self {
            log: Mutex::new(log),
            measurer,
            config,
        };
        if let Some(entry) = session.initial_debug_entry() {
            let _ = entry.write();
        }
        Ok(session)
    }

    /// Debug entry for the initial point. Built under the lock, written after.
    fn initial_debug_entry(&self) -> Option<RecordDebugLog> {
        if !self.config.debug {
            return None;
        }
        self.with_log(|log| {
            log.last()
                .map(|point| RecordDebugLog::new(0, point.label(), point.bytes()))
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Record a memory point. See [`MemoryPointLog::record`].
    pub fn record(&self, label: Option<&str>, value: Option<u64>) -> Result<(), LogError> {
        self.record_returning(label, value).map(|_| ())
    }

    /// Record a memory point and return its byte count.
    pub fn record_returning(
        &self,
        label: Option<&str>,
        value: Option<u64>,
    ) -> Result<u64, LogError> {
        let bytes = match value {
            Some(bytes) => bytes,
            None => self.measurer.measure()?,
        };

        let entry = {
            let mut log = self.log.lock();
            log.record(label, Some(bytes))?;
            let index = log.len() - 1;
            self.config.debug.then(|| {
                RecordDebugLog::new(index, log[index].label(), bytes)
                    .with_requested_label(label)
                    .with_measured(value.is_none())
            })
        };

        if let Some(entry) = entry {
            let _ = entry.write();
        }
        Ok(bytes)
    }

    /// Current memory in bytes. Never touches the log.
    pub fn measure_now(&self) -> Result<u64, MeasurementError> {
        self.measurer.measure()
    }

    /// Run `f` with read access to the log.
    ///
    /// The lock is held for the duration of `f`; do not record from inside.
    pub fn with_log<R>(&self, f: impl FnOnce(&MemoryPointLog) -> R) -> R {
        f(&*self.log.lock())
    }

    /// Copy of all points.
    pub fn points(&self) -> Vec<MemoryPoint> {
        self.with_log(|log| log.as_slice().to_vec())
    }

    pub fn len(&self) -> usize {
        self.with_log(MemoryPointLog::len)
    }

    pub fn is_empty(&self) -> bool {
        self.with_log(MemoryPointLog::is_empty)
    }

    pub fn labels(&self) -> Vec<String> {
        self.with_log(MemoryPointLog::labels)
    }

    pub fn values(&self) -> Vec<u64> {
        self.with_log(MemoryPointLog::values)
    }

    pub fn filter<P>(&self, predicate: P) -> Vec<MemoryPoint>
    where
        P: FnMut(&MemoryPoint) -> bool,
    {
        self.with_log(|log| log.filter(predicate))
    }

    pub fn map<T, F>(&self, transform: F) -> Vec<T>
    where
        F: FnMut(&MemoryPoint) -> T,
    {
        self.with_log(|log| log.map(transform))
    }

    /// Write the log, one point per line.
    pub fn write_log(&self, out: &mut impl Write) -> io::Result<()> {
        self.with_log(|log| format::write_log(out, log, self.config.precision))
    }

    /// Print the log to stdout.
    pub fn print_log(&self) -> anyhow::Result<()> {
        let rendered = self.with_log(|log| format::render_log(log, self.config.precision));
        let mut stdout = io::stdout().lock();
        stdout.write_all(rendered.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

/// Install the process-wide session, configured from the environment.
pub fn install(measurer: impl Measure + 'static) -> Result<&'static Session, LogError> {
    install_with(measurer, Config::from_env())
}

/// Install the process-wide session with an explicit configuration.
///
/// Fails with [`LogError::AlreadyInstalled`] when a session exists,
/// including one created implicitly by [`session`].
pub fn install_with(
    measurer: impl Measure + 'static,
    config: Config,
) -> Result<&'static Session, LogError> {
    if SESSION.get().is_some() {
        return Err(LogError::AlreadyInstalled);
    }

    let candidate = Session::new(measurer, config)?;
    let mut installed = false;
    let current = SESSION.get_or_init(|| {
        installed = true;
        candidate
    });

    if installed {
        Ok(current)
    } else {
        Err(LogError::AlreadyInstalled)
    }
}

/// The process-wide session, created with a [`ProcessMeasurer`] if needed.
pub fn session() -> Result<&'static Session, LogError> {
    if let Some(current) = SESSION.get() {
        return Ok(current);
    }

    let candidate = Session::new(ProcessMeasurer::new()?, Config::from_env())?;
    Ok(SESSION.get_or_init(|| candidate))
}

/// Record a point in the process-wide session.
pub fn record(label: Option<&str>, value: Option<u64>) -> Result<(), LogError> {
    session()?.record(label, value)
}

/// Record a point in the process-wide session and return its byte count.
pub fn record_returning(label: Option<&str>, value: Option<u64>) -> Result<u64, LogError> {
    session()?.record_returning(label, value)
}

/// Current memory in bytes, without recording anything.
pub fn measure_now() -> Result<u64, LogError> {
    Ok(session()?.measure_now()?)
}

/// Print the process-wide log to stdout.
pub fn print_log() -> anyhow::Result<()> {
    session()?.print_log()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::thread;
    use tracemem_log::INIT_LABEL;

    fn counting(start: u64, step: u64) -> impl Measure {
        let next = AtomicU64::new(start);
        move || -> Result<u64, MeasurementError> { Ok(next.fetch_add(step, Ordering::SeqCst)) }
    }

    fn new_session() -> Session {
        Session::new(counting(1 << 20, 1 << 20), Config::default()).unwrap()
    }

    #[test]
    fn test_scenario() {
        let session = new_session();
        assert_eq!(session.len(), 1);

        session.record(Some("a"), None).unwrap();
        assert_eq!(session.len(), 2);
        assert_eq!(session.labels().last().map(String::as_str), Some("a"));

        session.record(Some("a"), None).unwrap();
        assert_eq!(session.len(), 3);
        assert_eq!(session.labels().last().map(String::as_str), Some("a-2"));
    }

    #[test]
    fn test_measure_now_does_not_record() {
        let session = new_session();
        let before = session.len();
        assert_eq!(session.measure_now().unwrap(), 2 << 20);
        assert_eq!(session.measure_now().unwrap(), 3 << 20);
        assert_eq!(session.len(), before);
    }

    #[test]
    fn test_record_returning() {
        let session = new_session();
        assert_eq!(session.record_returning(None, None).unwrap(), 2 << 20);
        assert_eq!(session.record_returning(Some("x"), Some(5)).unwrap(), 5);
        assert_eq!(session.values(), [1 << 20, 2 << 20, 5]);
    }

    #[test]
    fn test_queries_delegate_to_log() {
        let session = new_session();
        session.record(Some("keep"), Some(1)).unwrap();
        session.record(Some("drop"), Some(2)).unwrap();
        session.record(Some("keep"), Some(3)).unwrap();

        let kept = session.filter(|p| p.label().starts_with("keep"));
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].label(), "keep-2");
        assert_eq!(session.map(|p| p.label().to_string()), session.labels());
        assert_eq!(session.points().len(), session.len());
        assert!(!session.is_empty());
    }

    #[test]
    fn test_write_log_uses_configured_precision() {
        let session = Session::new(
            counting(3 * 1024 * 1024 / 2, 0),
            Config::default().with_precision(1),
        )
        .unwrap();

        let mut out = Vec::new();
        session.write_log(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, format!("0    1.5 MB      → {}\n", INIT_LABEL));
        assert_eq!(session.len(), 1);
        assert_eq!(session.config().precision, 1);
        assert!(!session.config().debug);
    }

    #[test]
    fn test_concurrent_records_get_unique_labels() {
        let session = Arc::new(new_session());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let session = Arc::clone(&session);
                thread::spawn(move || {
                    for _ in 0..25 {
                        session.record(Some("worker"), None).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let labels = session.labels();
        assert_eq!(labels.len(), 1 + 8 * 25);
        let unique: std::collections::HashSet<&String> = labels.iter().collect();
        assert_eq!(unique.len(), labels.len());
        assert!(labels.contains(&"worker-200".to_string()));
    }

    #[test]
    fn test_debug_session_still_records() {
        let session =
            Session::new(counting(1, 1), Config::default().with_debug(true)).unwrap();
        session.record(Some("noisy"), None).unwrap();
        assert_eq!(session.labels(), [INIT_LABEL, "noisy"]);
    }

    #[test]
    fn test_initial_debug_entry_is_written_unlocked() {
        let session =
            Session::new(counting(7, 1), Config::default().with_debug(true)).unwrap();
        let entry = session.initial_debug_entry().unwrap();
        assert_eq!(entry.index, 0);
        assert_eq!(entry.label, INIT_LABEL);
        assert_eq!(entry.bytes, 7);

        // the log is free again once the entry exists
        let guard = session.log.try_lock();
        assert!(guard.is_some());
        let mut out = Vec::new();
        entry.write_to(&mut out).unwrap();
        drop(guard);
        assert!(String::from_utf8(out).unwrap().contains("\"index\":0"));

        let quiet = new_session();
        assert!(quiet.initial_debug_entry().is_none());
    }

    #[test]
    fn test_failed_measurement_propagates() {
        let calls = AtomicU64::new(0);
        let measurer = move || -> Result<u64, MeasurementError> {
            match calls.fetch_add(1, Ordering::SeqCst) {
                0 => Ok(1),
                _ => Err(MeasurementError::Probe("gone".to_string())),
            }
        };
        let session = Session::new(measurer, Config::default()).unwrap();

        assert!(session.record(Some("a"), None).is_err());
        assert!(matches!(
            session.measure_now(),
            Err(MeasurementError::Probe(_))
        ));
        assert_eq!(session.len(), 1);
    }
}
