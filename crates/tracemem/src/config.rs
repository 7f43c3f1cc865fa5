//! Session configuration from the environment.

use serde::{Deserialize, Serialize};

/// Enables the JSONL debug stream on stderr when set (any value).
pub const DEBUG_ENV: &str = "TRACEMEM_DEBUG";

/// Number of decimals used by `print_log`.
pub const PRECISION_ENV: &str = "TRACEMEM_PRECISION";

pub const DEFAULT_PRECISION: usize = 2;
pub const MAX_PRECISION: usize = 6;

/// Settings read once when a session is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Emit a debug line for every recorded point
    pub debug: bool,
    /// Decimals of the MB column in `print_log`
    pub precision: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            precision: DEFAULT_PRECISION,
        }
    }
}

impl Config {
    /// Read `TRACEMEM_DEBUG` and `TRACEMEM_PRECISION`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// Precision values that do not parse or exceed [`MAX_PRECISION`] fall
    /// back to [`DEFAULT_PRECISION`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let precision = lookup(PRECISION_ENV)
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|p| *p <= MAX_PRECISION)
            .unwrap_or(DEFAULT_PRECISION);

        Self {
            debug: lookup(DEBUG_ENV).is_some(),
            precision,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision.min(MAX_PRECISION);
        self
    }
}
