//! Test logging for structured test output and debugging.
//!
//! Output is silent unless `TEST_LOG_LEVEL` is set, so passing runs stay
//! quiet.
//!
//! ```rust,ignore
//! let log = TestLogger::new("copilot_quota_is_parsed");
//! log.phase("setup");
//! log.info("mock server started");
//! log.finish_ok();
//! ```

use std::cell::RefCell;
use std::time::Instant;

use super::log_capture::TestLogCapture;

/// Per-test logger with phase and duration tracking.
pub struct TestLogger {
    name: String,
    start: Instant,
    phase: RefCell<Option<String>>,
    enabled: bool,
}

impl TestLogger {
    #[must_use]
    pub fn new(name: &str) -> Self {
        let logger = Self {
            name: name.to_string(),
            start: Instant::now(),
            phase: RefCell::new(None),
            enabled: std::env::var_os("TEST_LOG_LEVEL").is_some(),
        };
        logger.emit("INFO", "test started");
        logger
    }

    /// Logger plus a tracing capture scoped to the current thread.
    #[must_use]
    pub fn with_capture(name: &str) -> (Self, TestLogCapture) {
        (Self::new(name), TestLogCapture::start())
    }

    pub fn phase(&self, phase: &str) {
        *self.phase.borrow_mut() = Some(phase.to_string());
        self.emit("INFO", &format!("phase: {phase}"));
    }

    pub fn info(&self, message: &str) {
        self.emit("INFO", message);
    }

    pub fn debug(&self, message: &str) {
        self.emit("DEBUG", message);
    }

    pub fn finish_ok(&self) {
        self.emit(
            "INFO",
            &format!("passed in {}ms", self.start.elapsed().as_millis()),
        );
    }

    fn emit(&self, level: &str, message: &str) {
        if !self.enabled {
            return;
        }
        let phase = self.phase.borrow();
        let phase = phase.as_deref().unwrap_or("-");
        eprintln!("[{level}] {} ({phase}) {message}", self.name);
    }
}
