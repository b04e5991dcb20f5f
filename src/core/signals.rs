//! # OS signal handling for the shared stop token.
//!
//! [`wait_for_any`] completes when any of the configured signals arrives,
//! generalizing the usual SIGINT/SIGTERM pair to a caller-selected set.
//!
//! ## Unix
//! Each [`Signal`] maps to its `tokio::signal::unix::SignalKind` listener.
//!
//! ## Other platforms
//! Any non-empty selection degrades to [`tokio::signal::ctrl_c`].
//!
//! An empty selection, or a listener that fails to register, never
//! completes: cancellation then only arrives via the caller token or
//! [`Manager::shutdown`](crate::Manager::shutdown).

use crate::config::Signal;

/// Waits until any of `signals` is received. Never completes when the set
/// is empty or no listener could be registered.
#[cfg(unix)]
pub(crate) async fn wait_for_any(signals: &[Signal]) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut streams = Vec::with_capacity(signals.len());
    for sig in signals {
        let kind = match sig {
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Terminate => SignalKind::terminate(),
            Signal::Quit => SignalKind::quit(),
            Signal::Hangup => SignalKind::hangup(),
        };
        // registration failure disables this listener only
        if let Ok(stream) = signal(kind) {
            streams.push(stream);
        }
    }

    if streams.is_empty() {
        return futures::future::pending().await;
    }

    let waits: Vec<_> = streams.iter_mut().map(|s| Box::pin(s.recv())).collect();
    futures::future::select_all(waits).await;
}

/// Waits until any of `signals` is received. Never completes when the set
/// is empty or no listener could be registered.
#[cfg(not(unix))]
pub(crate) async fn wait_for_any(signals: &[Signal]) {
    if signals.is_empty() || tokio::signal::ctrl_c().await.is_err() {
        futures::future::pending::<()>().await;
    }
}
