//! # Plugin trait.
//!
//! A plugin is a named, long-running unit of work. It receives a
//! [`CancellationToken`] and is expected to return promptly once the token
//! fires; the manager cannot force an early return, it can only wait.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;

/// # Asynchronous, cancelable unit of work supervised by the manager.
///
/// The name is diagnostic only and need not be unique. A clean return
/// (`Ok(())`) ends the plugin's supervision for the current run; an error
/// return is retried up to the configured attempt budget.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use plugvisor::{BoxError, Plugin};
///
/// struct Heartbeat;
///
/// #[async_trait]
/// impl Plugin for Heartbeat {
///     fn name(&self) -> &str { "heartbeat" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), BoxError> {
///         ctx.cancelled().await;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Plugin: Send + Sync + 'static {
    /// Returns a stable, human-readable plugin name (diagnostics only).
    fn name(&self) -> &str;

    /// Runs the plugin until completion or cancellation.
    ///
    /// Implementations should watch `ctx` and exit quickly once it fires to
    /// honor graceful shutdown.
    async fn run(&self, ctx: CancellationToken) -> Result<(), BoxError>;
}
