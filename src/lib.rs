//! # plugvisor
//!
//! **Plugvisor** is a process-local supervisor for a fixed set of
//! long-running plugins.
//!
//! It starts every registered plugin concurrently, fans a single
//! cancellation signal out to all of them (on an OS signal, an explicit
//! shutdown call, or a fatal plugin failure), recovers plugin failures and
//! panics with a bounded retry budget, and waits a configurable timeout
//! for graceful termination.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │    Plugin    │   │    Plugin    │   │    Plugin    │
//!     │  (user #1)   │   │  (user #2)   │   │  (user #3)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Manager (registry + lifecycle state + control loop)          │
//! │  - shared stop token (caller / OS signal / shutdown())        │
//! │  - report channel (mpsc, capacity 1, lossy)                   │
//! │  - TaskTracker (joins the supervisor tasks)                   │
//! └──────┬──────────────────┬──────────────────┬──────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  supervisor  │   │  supervisor  │   │  supervisor  │
//!     │ (retry loop) │   │ (retry loop) │   │ (retry loop) │
//!     └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! Manager::start(caller)
//!   ├─► stop = caller.child_token()      (shutdown() fires it too)
//!   ├─► watcher: configured OS signals ─► stop.cancel()
//!   ├─► spawn one retry supervisor per plugin
//!   └─► control loop:
//!         ├─ Retryable report  ─► log, keep waiting
//!         ├─ Panic/Terminal    ─► return the error (group fail-fast)
//!         ├─ all finished      ─► return Ok(())
//!         └─ stop fired        ─► drain:
//!              ├─ all stop within timeout ─► Ok(())
//!              └─ timeout elapses         ─► Err(DeadlineExceeded)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits          |
//! |-------------------|--------------------------------------------------------------|-----------------------------|
//! | **Plugins**       | Define plugins as trait impls or plain closures.             | [`Plugin`], [`PluginFn`]    |
//! | **Supervision**   | Group lifecycle, shared cancellation, graceful shutdown.     | [`Manager`]                 |
//! | **Retries**       | Bounded attempt budget with panic containment.               | [`Config::retries`]         |
//! | **Errors**        | Typed taxonomy for everything `start` can return.            | [`PlugError`]               |
//! | **Configuration** | Signals, drain timeout, retries, log sink.                   | [`Config`], [`Signal`]      |
//!
//! ## Optional features
//! - `logging`: exports [`stdout_log`], a simple built-in stdout sink
//!   _(demo/reference only)_.
//!
//! ## Example
//! ```no_run
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use plugvisor::{Config, Manager};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::default();
//!     cfg.timeout = Duration::from_secs(5);
//!     cfg.retries = 3;
//!
//!     let mgr = Manager::new(cfg);
//!
//!     mgr.add_func("worker", |ctx: CancellationToken| async move {
//!         while !ctx.is_cancelled() {
//!             // do work...
//!             tokio::time::sleep(Duration::from_millis(250)).await;
//!         }
//!         Ok(())
//!     });
//!
//!     // blocks until SIGINT/SIGTERM, a fatal plugin failure, or shutdown()
//!     mgr.start(CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod plugins;

// ---- Public re-exports ----

pub use config::{Config, LogSink, Signal};
pub use core::Manager;
pub use error::{BoxError, PlugError};
pub use plugins::{Plugin, PluginFn, PluginRef};

// Optional: expose a simple built-in stdout log sink (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use config::stdout_log;
