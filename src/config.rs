//! # Runtime configuration for the manager.
//!
//! [`Config`] centralizes the knobs for one supervised run: which OS
//! signals trigger cancellation, how long the graceful drain may take,
//! how many attempts each plugin gets, and where progress messages go.
//!
//! Config is consumed once, by [`Manager::new`](crate::Manager::new);
//! a running manager never re-reads it.
//!
//! ## Sentinel values
//! - `retries = 0` is clamped to one attempt by [`Config::attempts`].
//! - `signals = []` disables OS signal handling entirely; cancellation
//!   then only arrives via the caller token or
//!   [`Manager::shutdown`](crate::Manager::shutdown).
//!
//! ## Example
//! ```
//! use std::time::Duration;
//! use plugvisor::{Config, Signal};
//!
//! let mut cfg = Config::default();
//! cfg.timeout = Duration::from_secs(10);
//! cfg.signals = vec![Signal::Interrupt, Signal::Terminate, Signal::Quit];
//! assert_eq!(cfg.attempts(), 1);
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Progress/diagnostic callback invoked with free-form messages.
///
/// Defaults to a no-op. Sinks are called from the manager's control loop
/// and must not block.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// OS signals that can trigger cancellation of a running manager.
///
/// On Unix each variant maps to its `SignalKind`; on other platforms any
/// non-empty selection degrades to Ctrl-C.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    /// SIGINT (Ctrl-C in a terminal).
    Interrupt,
    /// SIGTERM (default kill signal, used by systemd/Kubernetes).
    Terminate,
    /// SIGQUIT (quit signal, often used for core dumps or hard stop).
    Quit,
    /// SIGHUP (terminal hangup, often repurposed for reload-or-stop).
    Hangup,
}

/// Configuration for one manager.
///
/// ## Field semantics
/// - `signals`: OS signals that fire the shared stop token (empty = none)
/// - `timeout`: graceful-drain bound after cancellation has fired
/// - `retries`: total attempts per plugin before a failure is terminal
/// - `log`: progress/diagnostic sink
#[derive(Clone)]
pub struct Config {
    /// OS signals that trigger cancellation.
    pub signals: Vec<Signal>,

    /// Maximum time to wait for plugins to stop once cancellation fires.
    ///
    /// The drain bound only governs how long `start` waits; it never
    /// cancels plugins a second time.
    pub timeout: Duration,

    /// Total attempts per plugin. `0` is treated as `1` (run once).
    pub retries: u32,

    /// Progress/diagnostic callback (default: no-op).
    pub log: LogSink,
}

impl Config {
    /// Returns the effective attempt budget per plugin (`retries`, min 1).
    #[inline]
    pub fn attempts(&self) -> u32 {
        self.retries.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `signals = [Interrupt, Terminate]`
    /// - `timeout = 5s`
    /// - `retries = 1` (run once, no retries)
    /// - `log` = no-op
    fn default() -> Self {
        Self {
            signals: vec![Signal::Interrupt, Signal::Terminate],
            timeout: Duration::from_secs(5),
            retries: 1,
            log: Arc::new(|_| {}),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the log sink is not Debug
        f.debug_struct("Config")
            .field("signals", &self.signals)
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .finish_non_exhaustive()
    }
}

/// Returns a sink that prints each message to stdout with a `[plugvisor]`
/// prefix.
///
/// Enabled via the `logging` feature. Intended for demos and debugging;
/// production users should plug in their own [`LogSink`].
#[cfg(feature = "logging")]
pub fn stdout_log() -> LogSink {
    Arc::new(|msg: &str| println!("[plugvisor] {msg}"))
}
