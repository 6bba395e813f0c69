//! Reference implementation of the helper program protocol
//!
//! A helper reads the whole input from stdin, optionally told the expected
//! length as its first argument, writes `PROGRESS:<n>` lines to stderr while
//! it consumes input and finally prints one lowercase hex digest on stdout.

use securehash_core::create_accumulator;
use securehash_core::progress::ProgressState;
use std::io::{self, Read, Write};

/// Exit status for I/O failures
pub const EXIT_IO_FAILURE: u8 = 1;

/// Exit status for a digest id with no in-process implementation
pub const EXIT_UNSUPPORTED: u8 = 2;

const READ_CHUNK: usize = 64 * 1024;
const PROGRESS_STEP: u8 = 5;

#[derive(Debug, thiserror::Error)]
pub enum HelperError {
    #[error("unsupported digest '{0}'")]
    Unsupported(String),

    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),
}

impl HelperError {
    pub fn exit_code(&self) -> u8 {
        match self {
            HelperError::Unsupported(_) => EXIT_UNSUPPORTED,
            HelperError::Io(_) => EXIT_IO_FAILURE,
        }
    }
}

/// Parse the optional size argument; anything unparseable means "unknown"
pub fn parse_size_hint(arg: Option<&str>) -> u64 {
    arg.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

/// Hash `input` with `digest_id`, speaking the helper protocol
///
/// Progress is only reported when `size_hint` is non-zero. The digest line
/// is written to `output` and also returned.
pub fn run<R, W, E>(
    digest_id: &str,
    size_hint: u64,
    mut input: R,
    mut output: W,
    mut progress: E,
) -> Result<String, HelperError>
where
    R: Read,
    W: Write,
    E: Write,
{
    let mut accumulator =
        create_accumulator(digest_id).map_err(|_| HelperError::Unsupported(digest_id.into()))?;

    let mut state = (size_hint > 0).then(|| ProgressState::new(size_hint, PROGRESS_STEP));
    if state.is_some() {
        report(&mut progress, 0)?;
    }

    let mut buffer = vec![0u8; READ_CHUNK];
    loop {
        let n = match input.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        accumulator.update(&buffer[..n]);

        if let Some(percent) = state.as_mut().and_then(|s| s.advance(n as u64)) {
            report(&mut progress, percent)?;
        }
    }

    if let Some(percent) = state.as_mut().and_then(ProgressState::finish) {
        report(&mut progress, percent)?;
    }

    let digest = accumulator.finalize();
    writeln!(output, "{digest}")?;
    output.flush()?;
    Ok(digest)
}

fn report<E: Write>(progress: &mut E, percent: u8) -> io::Result<()> {
    writeln!(progress, "PROGRESS:{percent}")?;
    progress.flush()
}
