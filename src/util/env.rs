//! Terminal capability checks for colored output.

use std::io::IsTerminal;

/// Output stream a color decision applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn is_terminal(self) -> bool {
        match self {
            Self::Stdout => std::io::stdout().is_terminal(),
            Self::Stderr => std::io::stderr().is_terminal(),
        }
    }
}

/// Whether reports written to stdout should be colored.
#[must_use]
pub fn should_use_color(no_color_flag: bool) -> bool {
    color_enabled(Stream::Stdout, no_color_flag)
}

/// Whether `stream` should be colored given `--no-color`, `NO_COLOR`,
/// `TERM=dumb` and TTY detection.
#[must_use]
pub fn color_enabled(stream: Stream, no_color_flag: bool) -> bool {
    decide(
        no_color_flag,
        std::env::var_os("NO_COLOR").is_some(),
        std::env::var("TERM").ok().as_deref(),
        || stream.is_terminal(),
    )
}

fn decide(flag: bool, no_color_env: bool, term: Option<&str>, tty: impl FnOnce() -> bool) -> bool {
    !flag && !no_color_env && term != Some("dumb") && tty()
}
