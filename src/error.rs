//! Error types used by the plugvisor runtime and plugins.
//!
//! One enum, [`PlugError`], covers both the values a caller of
//! [`Manager::start`](crate::Manager::start) can observe and the reports a
//! retry supervisor delivers to the control loop:
//!
//! - [`PlugError::AlreadyStarted`] — misuse of a running manager.
//! - [`PlugError::Panic`] — a plugin's entry point unwound.
//! - [`PlugError::Retryable`] — a failure with attempts remaining; logged,
//!   never fatal.
//! - [`PlugError::Terminal`] — a plugin's final attempt failed.
//! - [`PlugError::DeadlineExceeded`] — the graceful drain ran out of time.
//!
//! Helper methods (`as_label`, `is_retryable`, `is_panic`) provide short
//! stable labels and classification for logging/metrics.

use std::time::Duration;
use thiserror::Error;

/// Boxed error type returned by plugin entry points.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced by the manager and its retry supervisors.
///
/// `Retryable` never surfaces from [`Manager::start`](crate::Manager::start);
/// it is recovered locally by the control loop. The remaining variants are
/// exactly what a caller can observe as the return value.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PlugError {
    /// The manager is already running; the call had no effect.
    #[error("manager already started")]
    AlreadyStarted,

    /// A plugin's entry point panicked.
    ///
    /// Contained by the retry supervisor; becomes terminal only when raised
    /// on the last permitted attempt. Always logged.
    #[error("plugin {plugin} panicked: {message}")]
    Panic {
        /// Name of the offending plugin.
        plugin: String,
        /// Unwind payload, downcast to a string where possible.
        message: String,
    },

    /// A plugin attempt failed with attempts still remaining.
    #[error("plugin {plugin} failed: {source} - will retry (attempt {attempt})")]
    Retryable {
        /// Name of the offending plugin.
        plugin: String,
        /// 1-based attempt that produced the failure.
        attempt: u32,
        /// The underlying failure (a plain error or a contained panic).
        #[source]
        source: BoxError,
    },

    /// A plugin's final attempt failed with a plain error.
    #[error("plugin {plugin} failed: {source}")]
    Terminal {
        /// Name of the offending plugin.
        plugin: String,
        /// The underlying failure.
        #[source]
        source: BoxError,
    },

    /// Plugins did not stop within the configured drain timeout.
    #[error("timeout after {timeout:?} waiting for plugins to stop")]
    DeadlineExceeded {
        /// The configured drain bound that was exceeded.
        timeout: Duration,
    },
}

impl PlugError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use plugvisor::PlugError;
    ///
    /// assert_eq!(PlugError::AlreadyStarted.as_label(), "manager_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PlugError::AlreadyStarted => "manager_already_started",
            PlugError::Panic { .. } => "plugin_panic",
            PlugError::Retryable { .. } => "plugin_retry",
            PlugError::Terminal { .. } => "plugin_failed",
            PlugError::DeadlineExceeded { .. } => "shutdown_deadline_exceeded",
        }
    }

    /// Indicates whether this report is informational: attempts remained
    /// when the failure occurred, so the control loop logs it and keeps
    /// waiting instead of returning.
    ///
    /// # Example
    /// ```
    /// use plugvisor::PlugError;
    ///
    /// let retry = PlugError::Retryable {
    ///     plugin: "demo".into(),
    ///     attempt: 1,
    ///     source: "boom".into(),
    /// };
    /// assert!(retry.is_retryable());
    ///
    /// let fatal = PlugError::Terminal { plugin: "demo".into(), source: "boom".into() };
    /// assert!(!fatal.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlugError::Retryable { .. })
    }

    /// Indicates whether the plugin terminated by unwinding.
    pub fn is_panic(&self) -> bool {
        matches!(self, PlugError::Panic { .. })
    }

    /// Name of the plugin this report concerns, if any.
    pub fn plugin(&self) -> Option<&str> {
        match self {
            PlugError::Panic { plugin, .. }
            | PlugError::Retryable { plugin, .. }
            | PlugError::Terminal { plugin, .. } => Some(plugin),
            PlugError::AlreadyStarted | PlugError::DeadlineExceeded { .. } => None,
        }
    }
}
