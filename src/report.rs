use std::fmt;
use std::panic::Location;

/// A location in test source code, so failures point at the calling test
/// rather than at engine internals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: &'static str,
    pub line: u32,
}

impl SourceLocation {
    /// Location of the caller of the enclosing `#[track_caller]` function.
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }
}

impl From<&'static Location<'static>> for SourceLocation {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Surfaces snapshot results to the surrounding test framework.
pub trait Reporter {
    fn report_failure(&mut self, message: &str, location: SourceLocation);

    fn report_success(&mut self) {}
}

/// Fails the current test by panicking, which is how `cargo test` expects
/// failures to be signalled.
#[derive(Debug, Default)]
pub struct PanicReporter;

impl Reporter for PanicReporter {
    fn report_failure(&mut self, message: &str, location: SourceLocation) {
        panic!("{}: {}", location, message);
    }
}

/// Gathers failures so a test can run several snapshots and fail once at the end.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    failures: Vec<(String, SourceLocation)>,
    successes: usize,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> &[(String, SourceLocation)] {
        &self.failures
    }

    pub fn successes(&self) -> usize {
        self.successes
    }

    /// Panics listing every collected failure, if there are any.
    pub fn assert_no_failures(self) {
        if self.failures.is_empty() {
            return;
        }

        let mut message = format!("snapshot failures: {}", self.failures.len());
        for (failure, location) in &self.failures {
            message.push_str(&format!("\n  - {}: {}", location, failure));
        }
        panic!("{}", message);
    }
}

impl Reporter for CollectingReporter {
    fn report_failure(&mut self, message: &str, location: SourceLocation) {
        log::warn!("{}: {}", location, message);
        self.failures.push((message.to_string(), location));
    }

    fn report_success(&mut self) {
        self.successes += 1;
    }
}
