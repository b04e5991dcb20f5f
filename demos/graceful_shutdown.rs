//! # Example: graceful_shutdown
//!
//! Three ticker plugins run until the manager is asked to stop.
//!
//! Shows how to:
//! - Register closures as plugins with [`Manager::add_func`]
//! - Request a graceful stop with [`Manager::shutdown`]
//! - Observe progress messages through the log sink
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► register alpha / beta / gamma tickers
//!   ├─► spawn a timer that calls shutdown() after 3 seconds
//!   └─► start(): tickers run ─► shutdown() fires the stop token
//!         ├─► every ticker sees the token and returns
//!         └─► start() returns Ok(())
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example graceful_shutdown
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use plugvisor::{Config, Manager};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = Config::default();
    cfg.timeout = Duration::from_secs(2);
    cfg.log = Arc::new(|msg: &str| println!("[manager] {msg}"));

    let mgr = Arc::new(Manager::new(cfg));

    for name in ["alpha", "beta", "gamma"] {
        mgr.add_func(name, move |ctx: CancellationToken| async move {
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_millis(500)) => {
                        println!("{name}: tick");
                    }
                }
            }
            println!("{name}: stopped");
            Ok(())
        });
    }

    // ask for a graceful stop after a few seconds; Ctrl-C works too
    {
        let mgr = mgr.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            mgr.shutdown();
        });
    }

    mgr.start(CancellationToken::new()).await?;
    println!("done");
    Ok(())
}
