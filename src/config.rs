//! Session configuration.
//!
//! There is no configuration file: defaults are compiled in and the CLI
//! overrides them.

use std::time::Duration;

/// Which characteristics a session reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadSelection {
    /// Read the device information strings.
    pub info: bool,
    /// Read the battery level.
    pub battery: bool,
    /// Request a temperature/humidity measurement.
    pub measurement: bool,
}

impl ReadSelection {
    /// Build a selection from individual flags.
    ///
    /// When no flag is set, battery and measurement are read.
    pub fn from_flags(info: bool, battery: bool, measurement: bool) -> Self {
        if !(info || battery || measurement) {
            return Self::default();
        }
        Self {
            info,
            battery,
            measurement,
        }
    }

    /// Everything.
    pub fn all() -> Self {
        Self {
            info: true,
            battery: true,
            measurement: true,
        }
    }
}

impl Default for ReadSelection {
    fn default() -> Self {
        Self {
            info: false,
            battery: true,
            measurement: true,
        }
    }
}

/// Timing and read selection for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Upper bound for every wait on the transport.
    pub timeout: Duration,
    /// Pause after a read and after disconnecting, letting the transport flush.
    pub settle_delay: Duration,
    /// What to read.
    pub reads: ReadSelection,
}

impl SessionConfig {
    /// Default operation timeout (10 seconds).
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default settle delay (100 milliseconds).
    pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

    /// Set the operation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the settle delay.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Set the read selection.
    pub fn with_reads(mut self, reads: ReadSelection) -> Self {
        self.reads = reads;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
            settle_delay: Self::DEFAULT_SETTLE_DELAY,
            reads: ReadSelection::default(),
        }
    }
}
