//! The append-only memory point log.

use crate::error::LogError;
use crate::measure::Measure;
use crate::point::MemoryPoint;
use std::collections::HashSet;
use std::fmt;
use std::ops::Index;
use std::slice::{self, SliceIndex};
use std::sync::Arc;

/// Label of the point recorded when a log is created.
pub const INIT_LABEL: &str = "tracemem init";

/// Base label used when a point is recorded without one.
pub const UNLABELED: &str = "None";

/// Ordered log of memory points with unique labels.
///
/// [`record`](Self::record) is the only way to add points. Everything else is
/// read-only: positional access, slicing, iteration, and the derived views.
/// The mutating sequence operations simply do not exist on this type:
///
/// ```compile_fail
/// # use tracemem_log::{MemoryPoint, MemoryPointLog, ProcessMeasurer};
/// let mut log = MemoryPointLog::new(ProcessMeasurer::new().unwrap()).unwrap();
/// log[0] = MemoryPoint::new("Wrong!", 0);
/// ```
///
/// ```compile_fail
/// # use tracemem_log::{MemoryPoint, MemoryPointLog, ProcessMeasurer};
/// let mut log = MemoryPointLog::new(ProcessMeasurer::new().unwrap()).unwrap();
/// log.push(MemoryPoint::new("Wrong!", 0));
/// ```
///
/// ```compile_fail
/// # use tracemem_log::{MemoryPointLog, ProcessMeasurer};
/// let log = MemoryPointLog::new(ProcessMeasurer::new().unwrap()).unwrap();
/// let _doubled = &log + &log;
/// ```
///
/// ```compile_fail
/// # use tracemem_log::{MemoryPointLog, ProcessMeasurer};
/// let log = MemoryPointLog::new(ProcessMeasurer::new().unwrap()).unwrap();
/// let _repeated = &log * 3;
/// ```
///
/// ```compile_fail
/// # use tracemem_log::{MemoryPoint, MemoryPointLog, ProcessMeasurer};
/// let mut log = MemoryPointLog::new(ProcessMeasurer::new().unwrap()).unwrap();
/// log.extend(vec![MemoryPoint::new("Wrong!", 0)]);
/// ```
pub struct MemoryPointLog {
    points: Vec<MemoryPoint>,
    /// Every label in `points`, for collision checks
    taken: HashSet<String>,
    measurer: Arc<dyn Measure>,
}

impl MemoryPointLog {
    /// Create a log and record its initial point.
    ///
    /// ```
    /// use tracemem_log::{MemoryPointLog, ProcessMeasurer, INIT_LABEL};
    ///
    /// let mut log = MemoryPointLog::new(ProcessMeasurer::new()?)?;
    /// log.record(Some("a"), None)?;
    /// log.record(Some("a"), None)?;
    /// assert_eq!(log.labels(), [INIT_LABEL, "a", "a-2"]);
    /// # Ok::<(), tracemem_log::LogError>(())
    /// ```
    pub fn new(measurer: impl Measure + 'static) -> Result<Self, LogError> {
        Self::from_shared(Arc::new(measurer))
    }

    /// Create a log around a measurer that is also used elsewhere.
    pub fn from_shared(measurer: Arc<dyn Measure>) -> Result<Self, LogError> {
        let mut log = Self {
            points: Vec::new(),
            taken: HashSet::new(),
            measurer,
        };
        log.record(Some(INIT_LABEL), None)?;
        Ok(log)
    }

    /// Measurer used when a point is recorded without an explicit value.
    pub fn measurer(&self) -> &Arc<dyn Measure> {
        &self.measurer
    }

    /// Append a memory point.
    ///
    /// Without `value` the measurer is consulted. Without `label` the base
    /// label is `"None"`. A label already in the log gets the first free
    /// suffix out of `-2`, `-3`, … On error nothing is appended.
    ///
    /// Labels are borrowed strings; stringify other values first, e.g.
    /// `log.record(Some(&step.to_string()), None)`.
    pub fn record(&mut self, label: Option<&str>, value: Option<u64>) -> Result<(), LogError> {
        self.record_returning(label, value).map(|_| ())
    }

    /// Same as [`record`](Self::record), returning the recorded byte count.
    pub fn record_returning(
        &mut self,
        label: Option<&str>,
        value: Option<u64>,
    ) -> Result<u64, LogError> {
        let bytes = match value {
            Some(bytes) => bytes,
            None => self.measurer.measure()?,
        };
        let label = self.resolve_label(label.unwrap_or(UNLABELED))?;
        self.taken.insert(label.clone());
        self.points.push(MemoryPoint::new(label, bytes));
        Ok(bytes)
    }

    /// Pick the label a new point with base label `base` would get.
    pub fn resolve_label(&self, base: &str) -> Result<String, LogError> {
        if !self.taken.contains(base) {
            return Ok(base.to_string());
        }

        // With n labels taken, n + 1 candidates always contain a free one.
        let attempts = self.points.len() + 1;
        (2..)
            .take(attempts)
            .map(|suffix| format!("{}-{}", base, suffix))
            .find(|candidate| !self.taken.contains(candidate))
            .ok_or_else(|| LogError::LabelCollisionExhausted {
                base: base.to_string(),
                attempts,
            })
    }

    /// Labels of all points, in log order.
    pub fn labels(&self) -> Vec<String> {
        self.points.iter().map(|p| p.label().to_string()).collect()
    }

    /// Byte counts of all points, in log order.
    pub fn values(&self) -> Vec<u64> {
        self.points.iter().map(MemoryPoint::bytes).collect()
    }

    /// Points satisfying `predicate`, in log order.
    pub fn filter<P>(&self, mut predicate: P) -> Vec<MemoryPoint>
    where
        P: FnMut(&MemoryPoint) -> bool,
    {
        self.points
            .iter()
            .filter(|point| predicate(*point))
            .cloned()
            .collect()
    }

    /// Apply `transform` to every point, in log order.
    pub fn map<T, F>(&self, transform: F) -> Vec<T>
    where
        F: FnMut(&MemoryPoint) -> T,
    {
        self.points.iter().map(transform).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MemoryPoint> {
        self.points.get(index)
    }

    /// Positional access where negative indices count from the end.
    pub fn at(&self, index: isize) -> Option<&MemoryPoint> {
        let position = if index < 0 {
            self.points.len().checked_sub(index.unsigned_abs())?
        } else {
            index.unsigned_abs()
        };
        self.points.get(position)
    }

    pub fn last(&self) -> Option<&MemoryPoint> {
        self.points.last()
    }

    pub fn iter(&self) -> slice::Iter<'_, MemoryPoint> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[MemoryPoint] {
        &self.points
    }
}

impl<I> Index<I> for MemoryPointLog
where
    I: SliceIndex<[MemoryPoint]>,
{
    type Output = I::Output;

    fn index(&self, index: I) -> &Self::Output {
        &self.points[index]
    }
}

impl<'a> IntoIterator for &'a MemoryPointLog {
    type Item = &'a MemoryPoint;
    type IntoIter = slice::Iter<'a, MemoryPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl fmt::Debug for MemoryPointLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPointLog")
            .field("points", &self.points)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for MemoryPointLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, point) in self.points.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", point)?;
        }
        write!(f, "]")
    }
}
