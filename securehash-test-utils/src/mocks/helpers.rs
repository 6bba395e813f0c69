//! Scripted helper programs
//!
//! Each helper is a shell script run through `/bin/sh`, so the script file
//! itself never needs to be executable. The size hint the engine appends
//! shows up as `$1`.

use securehash_core::AlgorithmDescriptor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Writes helper scripts into a temporary directory
pub struct FakeHelper {
    dir: TempDir,
}

impl FakeHelper {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Write a script body and return its path
    pub fn script(&self, file_name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(format!("{file_name}.sh"));
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write helper script");
        path
    }

    /// Descriptor running `body` as algorithm `name`
    pub fn helper(&self, name: &str, body: &str) -> AlgorithmDescriptor {
        let script = self.script(&sanitize(name), body);
        AlgorithmDescriptor::external(name, "/bin/sh")
            .expect("non-empty executable")
            .with_args([script.to_string_lossy().into_owned()])
    }

    /// Consumes the input, reports 50% and 100%, prints `digest`
    pub fn printing(&self, name: &str, digest: &str) -> AlgorithmDescriptor {
        self.helper(
            name,
            &format!(
                "cat > /dev/null\necho PROGRESS:50 >&2\necho PROGRESS:100 >&2\necho {digest}"
            ),
        )
    }

    /// Prints the number of input bytes
    pub fn byte_counter(&self, name: &str) -> AlgorithmDescriptor {
        self.helper(name, "wc -c | tr -d ' '")
    }

    /// Prints `size-<hint>` using the size argument
    pub fn size_echo(&self, name: &str) -> AlgorithmDescriptor {
        self.helper(name, "cat > /dev/null\necho \"size-$1\"")
    }

    /// Consumes the input and exits with `code`
    pub fn failing(&self, name: &str, code: i32) -> AlgorithmDescriptor {
        self.helper(
            name,
            &format!("cat > /dev/null\necho 'helper exploded' >&2\nexit {code}"),
        )
    }

    /// Exits 0 without printing a digest
    pub fn silent(&self, name: &str) -> AlgorithmDescriptor {
        self.helper(name, "cat > /dev/null\nexit 0")
    }

    /// Never reads its input and sleeps for a long time
    pub fn sleeper(&self, name: &str) -> AlgorithmDescriptor {
        self.helper(name, "exec sleep 30")
    }

    /// Ignores SIGTERM and never reads its input
    pub fn stubborn(&self, name: &str) -> AlgorithmDescriptor {
        self.helper(name, "trap '' TERM\nwhile :; do sleep 1; done")
    }

    /// Reports progress out of order and past 100
    pub fn erratic_progress(&self, name: &str) -> AlgorithmDescriptor {
        self.helper(
            name,
            "cat > /dev/null\nfor p in 10 30 20 30 250 90; do echo PROGRESS:$p >&2; done\necho cafe",
        )
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Whether a process with `pid` still exists (zombies included)
pub fn pid_alive(pid: u32) -> bool {
    // SAFETY: signal 0 only checks for existence and permission
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}
