//! Before/after memory points around a callable.
//!
//! A traced call records `"Before {name}()"`, runs the callable, records
//! `"After {name}()"` and hands back the callable's result. If the callable
//! panics the panic propagates and no "after" point is recorded; the "before"
//! point stays in the log. A callable that returns an `Err` value returned
//! normally, so its "after" point is recorded.
//!
//! Recording can fail on either side of the call. A failed "before" point
//! means the callable never runs ([`TraceError::Before`]). A failed "after"
//! point leaves the "before" point unpaired in the log, and the callable's
//! result travels inside [`TraceError::After`] so the work is not lost.

use crate::session::{Session, session};
use std::error::Error;
use std::fmt;
use tracemem_log::LogError;

/// Label recorded before a traced call.
pub fn before_label(name: &str) -> String {
    format!("Before {}()", name)
}

/// Label recorded after a traced call.
pub fn after_label(name: &str) -> String {
    format!("After {}()", name)
}

/// A traced call whose "before" or "after" point could not be recorded.
#[derive(Debug)]
pub enum TraceError<R> {
    /// The "before" point failed; the callable did not run
    Before(LogError),
    /// The callable ran but the "after" point failed
    After { result: R, source: LogError },
}

impl<R> TraceError<R> {
    /// The recording error behind this failure.
    pub fn log_error(&self) -> &LogError {
        match self {
            Self::Before(source) | Self::After { source, .. } => source,
        }
    }

    /// The callable's result, if it ran.
    pub fn into_result(self) -> Option<R> {
        match self {
            Self::Before(_) => None,
            Self::After { result, .. } => Some(result),
        }
    }
}

impl<R> fmt::Display for TraceError<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before(source) => write!(f, "before point not recorded: {}", source),
            Self::After { source, .. } => write!(f, "after point not recorded: {}", source),
        }
    }
}

impl<R: fmt::Debug> Error for TraceError<R> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.log_error())
    }
}

impl<R> From<TraceError<R>> for LogError {
    fn from(err: TraceError<R>) -> Self {
        match err {
            TraceError::Before(source) | TraceError::After { source, .. } => source,
        }
    }
}

impl Session {
    /// Run `f` between a "before" and an "after" point.
    pub fn trace<R>(&self, name: &str, f: impl FnOnce() -> R) -> Result<R, TraceError<R>> {
        self.trace_with_labels(&before_label(name), &after_label(name), f)
    }

    /// Like [`trace`](Self::trace) with explicit labels.
    pub fn trace_with_labels<R>(
        &self,
        before: &str,
        after: &str,
        f: impl FnOnce() -> R,
    ) -> Result<R, TraceError<R>> {
        self.record(Some(before), None)
            .map_err(TraceError::Before)?;
        let result = f();
        match self.record(Some(after), None) {
            Ok(()) => Ok(result),
            Err(source) => Err(TraceError::After { result, source }),
        }
    }

    /// Wrap `f` so that every call is traced.
    ///
    /// Callables with several arguments take them as one tuple.
    ///
    /// ```
    /// use tracemem::{Config, Session};
    ///
    /// let session = Session::new(|| Ok::<u64, tracemem::MeasurementError>(1024), Config::default())?;
    /// let add = session.traced("add", |(a, b): (i32, i32)| a + b);
    /// assert_eq!(add((2, 3))?, 5);
    /// assert_eq!(session.labels()[1..], ["Before add()", "After add()"]);
    /// # Ok::<(), tracemem::LogError>(())
    /// ```
    pub fn traced<'s, A, R, F>(
        &'s self,
        name: &str,
        f: F,
    ) -> impl Fn(A) -> Result<R, TraceError<R>> + use<'s, A, R, F>
    where
        F: Fn(A) -> R,
    {
        let before = before_label(name);
        let after = after_label(name);
        move |args| self.trace_with_labels(&before, &after, || f(args))
    }
}

/// Trace `f` in the process-wide session.
pub fn trace<R>(name: &str, f: impl FnOnce() -> R) -> Result<R, TraceError<R>> {
    session().map_err(TraceError::Before)?.trace(name, f)
}

/// Trace `f` in the process-wide session with explicit labels.
pub fn trace_with_labels<R>(
    before: &str,
    after: &str,
    f: impl FnOnce() -> R,
) -> Result<R, TraceError<R>> {
    session()
        .map_err(TraceError::Before)?
        .trace_with_labels(before, after, f)
}

/// Wrap `f` so that every call is traced in the process-wide session.
pub fn traced<A, R, F>(
    name: &str,
    f: F,
) -> Result<impl Fn(A) -> Result<R, TraceError<R>> + use<A, R, F>, LogError>
where
    F: Fn(A) -> R,
{
    Ok(session()?.traced(name, f))
}
