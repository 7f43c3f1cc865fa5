//! tracemem demo: watch process memory grow and shrink.
//!
//! Allocates a buffer of the requested size between memory points,
//! releases it, traces a function call, then prints the log.

use clap::Parser;
use tracemem::prelude::*;

#[derive(Debug, Parser)]
#[command(name = "tracemem-demo", about = "Record memory points around an allocation")]
struct Args {
    /// Size of the buffer to allocate, in MB
    #[arg(short, long, default_value_t = 64)]
    megabytes: usize,

    /// Decimals of the MB column (overrides TRACEMEM_PRECISION)
    #[arg(short, long)]
    precision: Option<usize>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let len = buffer_len(args.megabytes)?;
    let mut config = Config::from_env();
    if let Some(precision) = args.precision {
        config = config.with_precision(precision);
    }
    let measurer = tracemem::ProcessMeasurer::new().context("Failed to start memory probe")?;
    let session = tracemem::install_with(measurer, config)?;

    session.record(Some("before allocation"), None)?;
    let buffer = allocate(len);
    session.record(Some("after allocation"), None)?;
    drop(buffer);
    session.record(Some("after release"), None)?;

    let checksum = session.trace("checksum", || checksum(len))?;
    session.record(None, None)?;

    session.print_log()?;
    println!("checksum: {}", checksum);
    Ok(())
}

/// Buffer size in bytes for `megabytes` MB.
fn buffer_len(megabytes: usize) -> Result<usize> {
    megabytes
        .checked_mul(1024 * 1024)
        .with_context(|| format!("{} MB does not fit in memory addresses", megabytes))
}

/// Allocate and touch `len` bytes so the pages count towards RSS.
fn allocate(len: usize) -> Vec<u8> {
    let mut buffer = vec![0u8; len];
    for (i, byte) in buffer.iter_mut().enumerate().step_by(4096) {
        *byte = (i % 251) as u8;
    }
    buffer
}

fn checksum(len: usize) -> u64 {
    allocate(len).iter().map(|b| u64::from(*b)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_size() {
        assert_eq!(allocate(2 * 1024 * 1024).len(), 2 * 1024 * 1024);
        assert!(allocate(0).is_empty());
    }

    #[test]
    fn test_buffer_len() {
        assert_eq!(buffer_len(0).unwrap(), 0);
        assert_eq!(buffer_len(3).unwrap(), 3 * 1024 * 1024);

        let err = buffer_len(usize::MAX).unwrap_err();
        assert!(err.to_string().contains("does not fit"));
    }

    #[test]
    fn test_checksum_touches_pages() {
        assert_eq!(checksum(0), 0);
        // one touched byte per 4096-byte page, values i % 251
        let expected: u64 = (0..256).map(|page: u64| (page * 4096) % 251).sum();
        assert_eq!(checksum(1024 * 1024), expected);
    }

    #[test]
    fn test_args() {
        let args = Args::parse_from(["tracemem-demo", "--megabytes", "8", "-p", "3"]);
        assert_eq!(args.megabytes, 8);
        assert_eq!(args.precision, Some(3));

        let args = Args::parse_from(["tracemem-demo"]);
        assert_eq!(args.megabytes, 64);
        assert_eq!(args.precision, None);
    }
}
