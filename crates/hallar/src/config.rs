//! Process-wide configuration.
//!
//! Two settings drive the core: `default_max_wait_time` (the poll deadline
//! used when a query does not override it) and `automatic_reload` (whether a
//! stale element transparently re-resolves before failing). They are set
//! once at test-session configuration time and read on every poll and every
//! element operation.
//!
//! The poller takes a [`Settings`] snapshot at the start of each wait, so a
//! concurrent settings change cannot alter behavior within a single
//! in-flight poll. Mutating settings while another thread is mid-poll is
//! otherwise not synchronized; tests that change them should run serialized
//! and restore the previous value.

use parking_lot::RwLock;
use std::time::Duration;

/// Default maximum time to wait for a query to be satisfied (2 seconds)
pub const DEFAULT_MAX_WAIT_TIME_MS: u64 = 2_000;

/// Default polling interval between query evaluations (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// An immutable snapshot of the process-wide settings.
///
/// Read atomically at the start of each poller invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Poll deadline used when a query carries no wait override
    pub default_max_wait_time: Duration,
    /// Whether stale elements transparently reload before acting
    pub automatic_reload: bool,
    /// Sleep between query evaluations
    pub poll_interval: Duration,
}

impl Settings {
    /// The out-of-the-box settings
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            default_max_wait_time: Duration::from_millis(DEFAULT_MAX_WAIT_TIME_MS),
            automatic_reload: true,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::standard()
    }
}

static SETTINGS: RwLock<Settings> = RwLock::new(Settings::standard());

/// Take an atomic snapshot of the current settings
#[must_use]
pub fn settings() -> Settings {
    *SETTINGS.read()
}

/// Get the default maximum wait time
#[must_use]
pub fn default_max_wait_time() -> Duration {
    SETTINGS.read().default_max_wait_time
}

/// Set the default maximum wait time
pub fn set_default_max_wait_time(wait: Duration) {
    SETTINGS.write().default_max_wait_time = wait;
}

/// Whether automatic reload of stale elements is enabled
#[must_use]
pub fn automatic_reload() -> bool {
    SETTINGS.read().automatic_reload
}

/// Enable or disable automatic reload of stale elements
pub fn set_automatic_reload(enabled: bool) {
    SETTINGS.write().automatic_reload = enabled;
}

/// Get the polling interval
#[must_use]
pub fn poll_interval() -> Duration {
    SETTINGS.read().poll_interval
}

/// Set the polling interval
pub fn set_poll_interval(interval: Duration) {
    SETTINGS.write().poll_interval = interval;
}
