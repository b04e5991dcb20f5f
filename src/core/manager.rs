//! # Manager: plugin registry, lifecycle state, and the control loop.
//!
//! The [`Manager`] owns the registry of plugins and the state of one
//! supervised run. `start` derives a single shared stop token, spawns one
//! retry supervisor per plugin, and blocks in a control loop until the run
//! resolves.
//!
//! ## High-level architecture
//! ```text
//! start(caller):
//!   - stop = caller.child_token()            (also fired by shutdown())
//!   - watcher: configured OS signal ──► stop.cancel()
//!   - spawn supervisors into a TaskTracker, one per plugin:
//!
//!       Plugin[0]      Plugin[1]      ...     Plugin[N-1]
//!          │              │                       │
//!          └──► retry::supervise(plugin, stop.child_token(), attempts, tx)
//!
//!   - control loop:
//!       reports (mpsc cap 1) ──► Retryable          ──► log, keep waiting
//!                            ──► Panic / Terminal   ──► return Err (fail-fast)
//!                            ──► channel closed     ──► return Ok (all finished)
//!       stop fired           ──► drain
//!
//! drain:
//!   timeout(cfg.timeout, tracker.wait()):
//!     ├─ all joined  ──► Ok(())
//!     └─ elapsed     ──► Err(DeadlineExceeded)   (stuck tasks keep running)
//! ```
//!
//! ## Rules
//! - `started` is true for exactly the duration of one `start` call; a
//!   second `start` while running fails with `AlreadyStarted` and has no
//!   side effects.
//! - The stop token has fired by the time `start` returns, on every path.
//! - The lock guards only the flag, the registry, and the stop token;
//!   it is never held across an await.
//! - One failing plugin brings down the whole group: the first
//!   non-retryable report ends the run.

use std::borrow::Cow;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::Config;
use crate::core::{retry, signals};
use crate::error::{BoxError, PlugError};
use crate::plugins::{PluginFn, PluginRef};

/// Supervises a fixed set of plugins for the duration of one `start` call.
///
/// A manager is cheap to construct and may be reused: the registry persists
/// across runs, and a completed `start` leaves it ready for the next one.
///
/// ## Example
/// ```no_run
/// use tokio_util::sync::CancellationToken;
/// use plugvisor::{Config, Manager};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mgr = Manager::new(Config::default());
///
///     mgr.add_func("heartbeat", |ctx: CancellationToken| async move {
///         ctx.cancelled().await;
///         Ok(())
///     });
///
///     // blocks until SIGINT/SIGTERM, a fatal plugin failure, or shutdown()
///     mgr.start(CancellationToken::new()).await?;
///     Ok(())
/// }
/// ```
pub struct Manager {
    cfg: Config,
    inner: Mutex<Inner>,
}

/// Mutable state behind the manager's single lock.
struct Inner {
    started: bool,
    plugins: Vec<PluginRef>,
    /// Stop token for the current run; replaced on every `start` so a
    /// previous run's shutdown does not leak into the next.
    stop: CancellationToken,
}

impl Manager {
    /// Creates a manager with an empty registry.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            inner: Mutex::new(Inner {
                started: false,
                plugins: Vec::new(),
                stop: CancellationToken::new(),
            }),
        }
    }

    fn locked(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a plugin.
    ///
    /// Takes effect on the next `start`; a running manager's already-spawned
    /// supervisors are unaffected.
    pub fn add(&self, plugin: PluginRef) {
        self.locked().plugins.push(plugin);
    }

    /// Registers a closure as a named plugin.
    pub fn add_func<F, Fut>(&self, name: impl Into<Cow<'static, str>>, f: F)
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.add(PluginFn::arc(name, f));
    }

    /// Requests a graceful stop of a running manager; no-op when idle.
    ///
    /// Safe to call repeatedly: firing the stop token is idempotent, so a
    /// second call while running has no further effect.
    pub fn shutdown(&self) {
        let inner = self.locked();
        if inner.started {
            inner.stop.cancel();
        }
    }

    /// Runs every registered plugin until cancellation or a fatal failure.
    ///
    /// Cancellation is a single shared stop token that fires when any of
    /// the following happens first:
    /// - `caller` is cancelled,
    /// - one of the configured OS signals arrives,
    /// - [`Manager::shutdown`] is invoked,
    /// - `start` returns (on every path, so all plugins are told to stop).
    ///
    /// ## Return value
    /// - `Ok(())` — every plugin stopped within the drain timeout, or every
    ///   supervisor finished on its own.
    /// - `Err(AlreadyStarted)` — the manager was already running.
    /// - `Err(Panic | Terminal)` — a plugin's last permitted attempt failed;
    ///   the whole group is stopped (fail-fast).
    /// - `Err(DeadlineExceeded)` — some plugin ignored cancellation past the
    ///   configured timeout. Its task is left running in the background.
    pub async fn start(&self, caller: CancellationToken) -> Result<(), PlugError> {
        let (stop, plugins) = {
            let mut inner = self.locked();
            if inner.started {
                return Err(PlugError::AlreadyStarted);
            }
            inner.started = true;
            // child of the caller token: caller cancellation propagates
            // without a relay, shutdown() fires only this run
            inner.stop = caller.child_token();
            (inner.stop.clone(), inner.plugins.clone())
        };

        let result = self.run(&stop, plugins).await;

        // every return path tells the remaining plugins to stop
        stop.cancel();
        self.locked().started = false;
        result
    }

    /// Spawns the supervisors and drives the control loop.
    async fn run(&self, stop: &CancellationToken, plugins: Vec<PluginRef>) -> Result<(), PlugError> {
        // single decision slot; supervisors drop reports the loop is not
        // ready for (lossy by contract)
        let (tx, mut rx) = mpsc::channel::<PlugError>(1);

        // OS signals fire the shared stop token; the watcher exits once the
        // token fires, whoever wins
        {
            let stop = stop.clone();
            let watched = self.cfg.signals.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = signals::wait_for_any(&watched) => stop.cancel(),
                    _ = stop.cancelled() => {}
                }
            });
        }

        let tracker = TaskTracker::new();
        for plugin in plugins {
            tracker.spawn(retry::supervise(
                plugin,
                stop.child_token(),
                self.cfg.attempts(),
                tx.clone(),
            ));
        }
        tracker.close();
        // supervisors hold the only senders now: a closed channel means
        // every one of them has finished
        drop(tx);

        loop {
            tokio::select! {
                // reports first, so a buffered fatal report is never lost to
                // a simultaneous cancellation
                biased;
                report = rx.recv() => match report {
                    Some(err) if err.is_retryable() => (self.cfg.log)(&err.to_string()),
                    Some(err) => {
                        // panics are always surfaced through the sink as well
                        if err.is_panic() {
                            (self.cfg.log)(&err.to_string());
                        }
                        return Err(err);
                    }
                    None => return Ok(()),
                },
                _ = stop.cancelled() => return self.drain(&tracker).await,
            }
        }
    }

    /// Waits out the graceful drain once cancellation has fired.
    async fn drain(&self, tracker: &TaskTracker) -> Result<(), PlugError> {
        (self.cfg.log)("manager received stop signal, shutting down");
        match time::timeout(self.cfg.timeout, tracker.wait()).await {
            Ok(()) => {
                (self.cfg.log)("all plugins have stopped");
                Ok(())
            }
            Err(_) => {
                // unresponsive plugin tasks are left running in the
                // background; the tracker does not abort them
                (self.cfg.log)("timeout waiting for plugins to stop, giving up");
                Err(PlugError::DeadlineExceeded {
                    timeout: self.cfg.timeout,
                })
            }
        }
    }
}

impl Default for Manager {
    /// Equivalent to `Manager::new(Config::default())`.
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use async_trait::async_trait;

    use super::*;
    use crate::plugins::Plugin;

    /// Config without OS signal listeners, to keep unit tests hermetic.
    fn quiet(timeout: Duration) -> Config {
        Config {
            signals: Vec::new(),
            timeout,
            ..Config::default()
        }
    }

    #[derive(Default)]
    struct Flags {
        started: AtomicBool,
        stopped: AtomicBool,
    }

    fn well_behaved(mgr: &Manager, name: &'static str, flags: Arc<Flags>) {
        mgr.add_func(name, move |ctx: CancellationToken| {
            let flags = flags.clone();
            async move {
                flags.started.store(true, Ordering::SeqCst);
                ctx.cancelled().await;
                flags.stopped.store(true, Ordering::SeqCst);
                Ok(())
            }
        });
    }

    struct Exploding;

    #[async_trait]
    impl Plugin for Exploding {
        fn name(&self) -> &str {
            "exploding"
        }

        async fn run(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
            // yield first so the control loop can keep up with the reports
            time::sleep(Duration::from_millis(10)).await;
            panic!("kaboom");
        }
    }

    #[tokio::test]
    async fn clean_drain_after_caller_cancellation() {
        let mgr = Manager::new(quiet(Duration::from_secs(1)));
        let flags: Vec<Arc<Flags>> = (0..3).map(|_| Arc::new(Flags::default())).collect();
        for (name, f) in ["one", "two", "three"].into_iter().zip(&flags) {
            well_behaved(&mgr, name, f.clone());
        }

        let caller = CancellationToken::new();
        let trigger = caller.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        mgr.start(caller).await.unwrap();
        for f in &flags {
            assert!(f.started.load(Ordering::SeqCst));
            assert!(f.stopped.load(Ordering::SeqCst));
        }
    }

    #[tokio::test]
    async fn deadline_exceeded_when_a_plugin_ignores_cancellation() {
        let timeout = Duration::from_millis(100);
        let mgr = Manager::new(quiet(timeout));

        let one = Arc::new(Flags::default());
        let two = Arc::new(Flags::default());
        well_behaved(&mgr, "one", one.clone());
        well_behaved(&mgr, "two", two.clone());

        let stuck_started = Arc::new(AtomicBool::new(false));
        let flag = stuck_started.clone();
        mgr.add_func("stuck", move |ctx: CancellationToken| {
            let flag = flag.clone();
            async move {
                flag.store(true, Ordering::SeqCst);
                ctx.cancelled().await;
                // never honors the stop
                futures::future::pending::<()>().await;
                Ok(())
            }
        });

        let caller = CancellationToken::new();
        let trigger = caller.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let begun = Instant::now();
        let err = mgr.start(caller).await.unwrap_err();

        assert!(matches!(err, PlugError::DeadlineExceeded { .. }));
        assert!(begun.elapsed() >= timeout);
        // the well-behaved plugins were already stopped by then
        assert!(one.stopped.load(Ordering::SeqCst));
        assert!(two.stopped.load(Ordering::SeqCst));
        assert!(stuck_started.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn second_start_fails_without_disturbing_the_first() {
        let mgr = Arc::new(Manager::new(quiet(Duration::from_secs(1))));
        let flags = Arc::new(Flags::default());
        well_behaved(&mgr, "only", flags.clone());

        let caller = CancellationToken::new();
        let first = tokio::spawn({
            let mgr = mgr.clone();
            let caller = caller.clone();
            async move { mgr.start(caller).await }
        });
        time::sleep(Duration::from_millis(20)).await;

        let err = mgr.start(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, PlugError::AlreadyStarted));

        caller.cancel();
        first.await.unwrap().unwrap();
        assert!(flags.stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn manager_can_be_started_again_after_a_run() {
        let mgr = Manager::new(quiet(Duration::from_secs(1)));
        let runs = Arc::new(AtomicU32::new(0));
        let counter = runs.clone();
        mgr.add_func("counting", move |_ctx: CancellationToken| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        // a clean return from every plugin resolves the run without any
        // cancellation; the registry persists into the next run
        mgr.start(CancellationToken::new()).await.unwrap();
        mgr.start(CancellationToken::new()).await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn shutdown_stops_a_running_manager_and_is_idempotent() {
        let mgr = Arc::new(Manager::new(quiet(Duration::from_secs(1))));
        let flags = Arc::new(Flags::default());
        well_behaved(&mgr, "only", flags.clone());

        // idle manager: no-op
        mgr.shutdown();

        let handle = tokio::spawn({
            let mgr = mgr.clone();
            async move { mgr.start(CancellationToken::new()).await }
        });
        time::sleep(Duration::from_millis(20)).await;

        mgr.shutdown();
        mgr.shutdown(); // repeated firing is a safe no-op

        handle.await.unwrap().unwrap();
        assert!(flags.stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn fatal_failure_stops_the_whole_group() {
        let mgr = Manager::new(quiet(Duration::from_secs(1)));
        let flags = Arc::new(Flags::default());
        well_behaved(&mgr, "healthy", flags.clone());
        mgr.add_func("failing", |_ctx: CancellationToken| async {
            time::sleep(Duration::from_millis(20)).await;
            Err("connection refused".into())
        });

        let err = mgr.start(CancellationToken::new()).await.unwrap_err();
        match err {
            PlugError::Terminal { plugin, .. } => assert_eq!(plugin, "failing"),
            other => panic!("expected a terminal error, got {other}"),
        }
        assert!(flags.started.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn retries_are_logged_and_never_returned() {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = messages.clone();
        let cfg = Config {
            signals: Vec::new(),
            timeout: Duration::from_secs(1),
            retries: 2,
            log: Arc::new(move |msg: &str| sink.lock().unwrap().push(msg.to_owned())),
        };

        let mgr = Manager::new(cfg);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        mgr.add_func("flaky", move |_ctx: CancellationToken| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                // yield between attempts so the control loop drains the slot
                time::sleep(Duration::from_millis(10)).await;
                Err("flaky failure".into())
            }
        });

        let err = mgr.start(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, PlugError::Terminal { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let logged = messages.lock().unwrap();
        assert!(
            logged.iter().any(|m| m.contains("will retry")),
            "missing retry log in {logged:?}"
        );
    }

    #[tokio::test]
    async fn panic_on_the_last_attempt_is_terminal_and_logged() {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = messages.clone();
        let cfg = Config {
            signals: Vec::new(),
            timeout: Duration::from_secs(1),
            retries: 1,
            log: Arc::new(move |msg: &str| sink.lock().unwrap().push(msg.to_owned())),
        };

        let mgr = Manager::new(cfg);
        mgr.add(Arc::new(Exploding));

        let err = mgr.start(CancellationToken::new()).await.unwrap_err();
        assert!(err.is_panic());
        assert_eq!(err.plugin(), Some("exploding"));

        let logged = messages.lock().unwrap();
        assert!(
            logged.iter().any(|m| m.contains("panicked")),
            "missing panic log in {logged:?}"
        );
    }

    #[tokio::test]
    async fn plugins_run_concurrently() {
        let mgr = Manager::new(quiet(Duration::from_secs(1)));
        let barrier = Arc::new(tokio::sync::Barrier::new(2));
        for name in ["left", "right"] {
            let barrier = barrier.clone();
            mgr.add_func(name, move |_ctx: CancellationToken| {
                let barrier = barrier.clone();
                async move {
                    // only resolves if both plugins are running at once
                    barrier.wait().await;
                    Ok(())
                }
            });
        }

        time::timeout(
            Duration::from_secs(5),
            mgr.start(CancellationToken::new()),
        )
        .await
        .expect("plugins never met at the barrier")
        .unwrap();
    }
}
