// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Executor error reporting with scoped suppression.
//!
//! Executor failures are expected while the runtime probes arena sizes, so
//! reporting can be silenced for a scope. The [`SuppressGuard`] restores the
//! previous state when dropped, on every exit path.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct ReporterInner {
    suppressed: AtomicBool,
    reported: AtomicUsize,
    silenced: AtomicUsize,
}

/// Forwards executor errors to `tracing::error!` unless suppressed.
///
/// Clones share state, so a guard taken through one clone silences all.
///
/// # Example
/// ```
/// use interpreter::ErrorReporter;
///
/// let reporter = ErrorReporter::new();
/// {
///     let _quiet = reporter.suppress();
///     reporter.report(&"arena too small");
///     assert!(reporter.is_suppressed());
/// }
/// assert!(!reporter.is_suppressed());
/// assert_eq!(reporter.reported_count(), 0);
/// assert_eq!(reporter.silenced_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ErrorReporter {
    inner: Arc<ReporterInner>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports an executor error.
    pub fn report(&self, err: &dyn Display) {
        if self.inner.suppressed.load(Ordering::Acquire) {
            self.inner.silenced.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(error = %err, "executor error (suppressed)");
        } else {
            self.inner.reported.fetch_add(1, Ordering::Relaxed);
            tracing::error!("{err}");
        }
    }

    /// Silences reporting until the returned guard is dropped.
    pub fn suppress(&self) -> SuppressGuard {
        let previous = self.inner.suppressed.swap(true, Ordering::AcqRel);
        SuppressGuard {
            reporter: self.clone(),
            previous,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.inner.suppressed.load(Ordering::Acquire)
    }

    /// Number of errors emitted to the log.
    pub fn reported_count(&self) -> usize {
        self.inner.reported.load(Ordering::Relaxed)
    }

    /// Number of errors swallowed while suppressed.
    pub fn silenced_count(&self) -> usize {
        self.inner.silenced.load(Ordering::Relaxed)
    }
}

/// Restores the reporter's previous suppression state on drop.
#[derive(Debug)]
#[must_use = "reporting is restored as soon as the guard is dropped"]
pub struct SuppressGuard {
    reporter: ErrorReporter,
    previous: bool,
}

impl Drop for SuppressGuard {
    fn drop(&mut self) {
        self.reporter
            .inner
            .suppressed
            .store(self.previous, Ordering::Release);
    }
}
