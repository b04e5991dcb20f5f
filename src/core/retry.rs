//! # Retry supervisor: runs one plugin through its attempt budget.
//!
//! One supervisor task wraps one plugin. Per attempt it:
//! 1. stops early if the stop token has already fired;
//! 2. invokes the plugin inside a panic-containment boundary;
//! 3. translates the outcome into a [`PlugError`] report and delivers it
//!    with a non-blocking send.
//!
//! ## Attempt flow
//! ```text
//! for attempt in 1..=attempts {
//!   cancelled?          ──► stop (plugin is not invoked again)
//!   run(ctx)
//!     ├─ Ok(())         ──► stop (clean exit, no report)
//!     ├─ Err(e), last   ──► report Terminal(e)
//!     ├─ Err(e), !last  ──► report Retryable(e, attempt), next attempt
//!     ├─ panic,  last   ──► report Panic
//!     └─ panic,  !last  ──► report Retryable(Panic, attempt), next attempt
//! }
//! ```
//!
//! ## Delivery
//! Reports go through [`mpsc::Sender::try_send`]: when the control loop is
//! not ready to receive, the report is dropped rather than queued. With a
//! single buffered slot in the manager, simultaneous failures across
//! plugins may surface only the first report observed. This is part of the
//! contract, not an oversight.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::PlugError;
use crate::plugins::PluginRef;

/// Runs `plugin` through up to `attempts` invocations, containing panics
/// and reporting failures on `reports`.
pub(crate) async fn supervise(
    plugin: PluginRef,
    ctx: CancellationToken,
    attempts: u32,
    reports: mpsc::Sender<PlugError>,
) {
    for attempt in 1..=attempts {
        if ctx.is_cancelled() {
            break;
        }

        let last = attempt == attempts;
        let outcome = AssertUnwindSafe(plugin.run(ctx.clone())).catch_unwind().await;

        match outcome {
            Ok(Ok(())) => break,
            Ok(Err(source)) => {
                let report = if last {
                    PlugError::Terminal {
                        plugin: plugin.name().to_owned(),
                        source,
                    }
                } else {
                    PlugError::Retryable {
                        plugin: plugin.name().to_owned(),
                        attempt,
                        source,
                    }
                };
                deliver(&reports, report);
            }
            Err(payload) => {
                let panic = PlugError::Panic {
                    plugin: plugin.name().to_owned(),
                    message: panic_message(payload.as_ref()),
                };
                let report = if last {
                    panic
                } else {
                    PlugError::Retryable {
                        plugin: plugin.name().to_owned(),
                        attempt,
                        source: Box::new(panic),
                    }
                };
                deliver(&reports, report);
            }
        }
    }
}

/// Non-blocking, lossy delivery: a full or closed channel drops the report.
fn deliver(reports: &mpsc::Sender<PlugError>, report: PlugError) {
    let _ = reports.try_send(report);
}

/// Extracts a readable message from an unwind payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "plugin panic".to_owned()
    }
}
