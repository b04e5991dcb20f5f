//! # Example: retry
//!
//! A flaky plugin exhausts its attempt budget and takes the group down.
//!
//! Shows how to:
//! - Give every plugin a retry budget with [`Config::retries`]
//! - Watch retryable failures flow through the log sink
//! - Inspect the terminal error returned by [`Manager::start`]
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► cfg.retries = 3
//!   └─► start():
//!         ├─ attempt 1 fails ─► logged as retryable
//!         ├─ attempt 2 fails ─► logged as retryable
//!         └─ attempt 3 fails ─► terminal, start() returns the error
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example retry
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use plugvisor::{Config, Manager};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let mut cfg = Config::default();
    cfg.retries = 3;
    cfg.log = Arc::new(|msg: &str| println!("[manager] {msg}"));

    let mgr = Manager::new(cfg);

    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    mgr.add_func("flaky-worker", move |_ctx: CancellationToken| {
        let counter = counter.clone();
        async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis(200)).await;
            Err(format!("database unreachable (attempt {n})").into())
        }
    });

    match mgr.start(CancellationToken::new()).await {
        Ok(()) => println!("manager stopped cleanly"),
        Err(err) => println!("manager stopped: {err} (label={})", err.as_label()),
    }
}
