//! # Plugin abstractions.
//!
//! This module provides the plugin-facing types:
//! - [`Plugin`] - trait for implementing async cancelable plugins
//! - [`PluginFn`] - function-backed plugin implementation
//! - [`PluginRef`] - shared handle to a plugin (`Arc<dyn Plugin>`)

mod plugin;
mod plugin_fn;

pub use plugin::Plugin;
pub use plugin_fn::{PluginFn, PluginRef};
