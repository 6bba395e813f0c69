//! Terminal capability detection
//!
//! Digests go to stdout and may be piped into another tool, while progress
//! bars and the batch summary go to stderr. Each stream is judged on its own,
//! so `securehash file big.iso > sums.txt` still shows progress.

use is_terminal::IsTerminal;
use std::ffi::OsString;
use std::io::{stderr, stdout};

/// Variables set by common CI runners that allocate a TTY nobody watches
const CI_VARS: &[&str] = &["CI", "BUILD_NUMBER", "JENKINS_URL", "TF_BUILD", "TEAMCITY_VERSION"];

/// What the attached terminal can show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminal {
    stdout_tty: bool,
    stderr_tty: bool,
    ci: bool,
    dumb: bool,
    no_color: bool,
}

impl Terminal {
    /// Inspect the real streams and process environment
    pub fn detect() -> Self {
        Self::from_env(stdout().is_terminal(), stderr().is_terminal(), |key| {
            std::env::var_os(key)
        })
    }

    fn from_env<F>(stdout_tty: bool, stderr_tty: bool, var: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let set = |key: &str| var(key).is_some_and(|value| !value.is_empty());
        let term = var("TERM").unwrap_or_default();

        Self {
            stdout_tty,
            stderr_tty,
            ci: CI_VARS.iter().any(|key| set(key)),
            // Windows consoles leave TERM unset but handle ANSI
            dumb: term == "dumb" || (term.is_empty() && !cfg!(windows)),
            no_color: set("NO_COLOR"),
        }
    }

    /// Color digests on stdout when configured and stdout is a real terminal
    pub fn color_output(&self, color_enabled: bool) -> bool {
        color_enabled && !self.no_color && self.stdout_tty && !self.dumb
    }

    /// Draw progress bars on stderr
    pub fn show_progress(&self, progress_enabled: bool) -> bool {
        progress_enabled && self.stderr_tty && !self.ci && !self.dumb
    }

    /// Print the end-of-batch summary on stderr
    pub fn show_summary(&self) -> bool {
        self.stderr_tty && !self.ci
    }
}
