//! Session state object and the values it is made of.

use std::{fmt, time::Duration};

use crate::language::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Availability {
    #[default]
    Unknown,
    Available,
    Unavailable,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Availability::Unknown => "checking",
            Availability::Available => "available",
            Availability::Unavailable => "unavailable",
        })
    }
}

/// Where the current execution stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// Outcome of one completed execution request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Success { output: String },
    Failure { message: String },
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    /// Text for the output panel.
    pub fn text(&self) -> &str {
        match self {
            ExecutionResult::Success { output } => output,
            ExecutionResult::Failure { message } => message,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    /// Language the request was submitted with.
    pub language: Language,
    pub result: ExecutionResult,
    pub exit_code: Option<i32>,
    pub stderr: Option<String>,
    pub elapsed: Duration,
}

/// Transient user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    ServiceUnavailable,
    AlreadyRunning,
    ExecutionFailed,
    ExecutionSucceeded,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Notice::ServiceUnavailable => "API is not available. Please check your connection.",
            Notice::AlreadyRunning => "An execution is already in progress",
            Notice::ExecutionFailed => "Error executing code",
            Notice::ExecutionSucceeded => "Code executed successfully!",
        }
    }

    pub fn is_error(self) -> bool {
        !matches!(self, Notice::ExecutionSucceeded)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Counters over completed runs in this session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub total: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub total_elapsed: Duration,
}

impl RunStats {
    pub fn record(&mut self, run: &RunRecord) {
        self.total += 1;
        if run.result.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.total_elapsed = self.total_elapsed.saturating_add(run.elapsed);
    }

    /// Percentage of completed runs that succeeded; 0 before the first run.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.succeeded) * 100.0 / f64::from(self.total)
        }
    }

    pub fn average_elapsed(&self) -> Duration {
        if self.total == 0 {
            Duration::ZERO
        } else {
            self.total_elapsed / self.total
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub language: Language,
    pub source: String,
    pub last_run: Option<RunRecord>,
    pub availability: Availability,
    pub in_flight: bool,
    pub phase: Phase,
    pub stats: RunStats,
}

impl SessionState {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            source: language.template().to_string(),
            last_run: None,
            availability: Availability::Unknown,
            in_flight: false,
            phase: Phase::Idle,
            stats: RunStats::default(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(Language::default())
    }
}
