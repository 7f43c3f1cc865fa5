//! Rendering memory point logs for humans.

use std::io::{self, Write};
use tracemem_log::MemoryPoint;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// How to round a megabyte value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// No rounding
    Exact,
    /// Round to this many decimal places
    Decimals(u32),
    /// Round to this many significant digits (at least one)
    Significant(u32),
}

/// Convert bytes to megabytes (`bytes / 1024 / 1024`) and round.
///
/// ```
/// use tracemem::format::{mb, Rounding};
///
/// assert_eq!(mb(26_046_118, Rounding::Decimals(2)), 24.84);
/// assert_eq!(mb(26_046_118, Rounding::Significant(2)), 25.0);
/// ```
pub fn mb(bytes: u64, rounding: Rounding) -> f64 {
    let value = bytes as f64 / BYTES_PER_MB;
    match rounding {
        Rounding::Exact => value,
        Rounding::Decimals(places) => round_to(value, places as i32),
        Rounding::Significant(digits) => {
            if value == 0.0 {
                return 0.0;
            }
            let magnitude = value.abs().log10().floor() as i32;
            round_to(value, digits.max(1) as i32 - 1 - magnitude)
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Format one line: index, MB column, label.
pub fn format_point(index: usize, point: &MemoryPoint, precision: usize) -> String {
    let megabytes = format!(
        "{:.*} MB",
        precision,
        mb(point.bytes(), Rounding::Exact)
    );
    format!("{:<4} {:<11} → {}", index, megabytes, point.label())
}

/// Write every point on its own line, in order.
pub fn write_log<'a, W, I>(out: &mut W, points: I, precision: usize) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a MemoryPoint>,
{
    for (index, point) in points.into_iter().enumerate() {
        writeln!(out, "{}", format_point(index, point, precision))?;
    }
    Ok(())
}

/// Render the whole log into a string.
pub fn render_log<'a>(points: impl IntoIterator<Item = &'a MemoryPoint>, precision: usize) -> String {
    let mut out = Vec::new();
    // writing into a Vec cannot fail
    let _ = write_log(&mut out, points, precision);
    String::from_utf8_lossy(&out).into_owned()
}
