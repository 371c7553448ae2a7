//! Progress-callback trait for conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the dispatcher works through a request. Multi-input operations
//! (merge-pdfs, images-to-pdf) report once per input; single-input
//! operations report a single input.
//!
//! # Example
//!
//! ```rust
//! use convertkit::{ConversionConfig, ConversionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_input_complete(&self, index: usize, total: usize) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("input {}/{} done", index + 1, total);
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::operation::Operation;
use std::sync::Arc;

/// Called by the dispatcher as it processes a request.
///
/// Implementations must be `Send + Sync`: per-input events fire from the
/// blocking worker thread that runs the codec. All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once, before any input is touched.
    fn on_conversion_start(&self, operation: Operation, total_inputs: usize) {
        let _ = (operation, total_inputs);
    }

    /// Called before an input is handed to the delegate.
    ///
    /// `index` is 0-based.
    fn on_input_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called after an input has been consumed by the delegate.
    fn on_input_complete(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called once when the output file is ready.
    fn on_conversion_complete(&self, operation: Operation, output_len: usize) {
        let _ = (operation, output_len);
    }

    /// Called once when the request fails.
    fn on_conversion_error(&self, operation: Operation, error: String) {
        let _ = (operation, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// Fan-out helper for stages that loop over inputs.
///
/// Holds an optional callback so stages don't repeat the `if let Some` dance.
#[derive(Clone, Default)]
pub struct InputProgress {
    callback: Option<ProgressCallback>,
    total: usize,
}

impl InputProgress {
    pub fn new(callback: Option<ProgressCallback>, total: usize) -> Self {
        Self { callback, total }
    }

    pub fn start(&self, index: usize, name: &str) {
        if let Some(ref cb) = self.callback {
            cb.on_input_start(index, self.total, name);
        }
    }

    pub fn complete(&self, index: usize) {
        if let Some(ref cb) = self.callback {
            cb.on_input_complete(index, self.total);
        }
    }
}
