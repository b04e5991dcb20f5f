//! # Function-backed plugin (`PluginFn`)
//!
//! [`PluginFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing
//! a fresh future per attempt. A retried plugin therefore never observes
//! state left behind by a previous attempt; share state explicitly through
//! an `Arc` inside the closure when you need it.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;
use crate::plugins::Plugin;

/// Shared handle to a plugin.
pub type PluginRef = Arc<dyn Plugin>;

/// Function-backed [`Plugin`] implementation.
///
/// Wraps a closure that *creates* a new future per attempt.
pub struct PluginFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> PluginFn<F> {
    /// Creates a new function-backed plugin.
    ///
    /// Prefer [`PluginFn::arc`] when you immediately need a [`PluginRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the plugin and returns it as a shared handle.
    ///
    /// ## Example
    /// ```
    /// use tokio_util::sync::CancellationToken;
    /// use plugvisor::{BoxError, PluginFn, PluginRef};
    ///
    /// let p: PluginRef = PluginFn::arc("hello", |_ctx: CancellationToken| async {
    ///     Ok::<_, BoxError>(())
    /// });
    /// assert_eq!(p.name(), "hello");
    /// ```
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Plugin for PluginFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), BoxError> {
        (self.f)(ctx).await
    }
}
