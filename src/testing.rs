//! Testing utilities for code that relies on deferred actions and anchors.
//!
//! The interesting property of a guard is usually *how many times* something
//! ran and *in which order*. [`Probe`] records labelled invocations so tests can
//! assert on exactly that, and [`assert_fired!`](crate::assert_fired) turns the
//! common "ran exactly once" check into a one-liner.
//!
//! # Examples
//!
//! ```rust
//! use mooring::testing::Probe;
//! use mooring::{assert_fired, defer};
//!
//! let probe = Probe::new();
//! {
//!     let _guard = defer(probe.recorder("close"));
//! }
//! assert_fired!(probe, "close");
//! ```

use std::cell::RefCell;
use std::rc::Rc;

/// Shared recorder of labelled invocations.
///
/// Cloning a `Probe` yields a handle to the same log, so one clone can be
/// moved into a deferred action while the test keeps another for assertions.
#[derive(Debug, Clone, Default)]
pub struct Probe {
    calls: Rc<RefCell<Vec<String>>>,
}

impl Probe {
    /// Create an empty probe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one invocation under `label`.
    pub fn record(&self, label: impl Into<String>) {
        self.calls.borrow_mut().push(label.into());
    }

    /// Build a zero-argument closure that records `label` when called.
    ///
    /// ```rust
    /// use mooring::testing::Probe;
    ///
    /// let probe = Probe::new();
    /// let hit = probe.recorder("hit");
    /// assert!(probe.is_empty());
    /// hit();
    /// assert_eq!(probe.calls(), vec!["hit"]);
    /// ```
    pub fn recorder(&self, label: impl Into<String>) -> impl FnOnce() + 'static {
        let probe = self.clone();
        let label = label.into();
        move || probe.record(label)
    }

    /// All recorded labels, in invocation order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Number of times `label` was recorded.
    pub fn count(&self, label: &str) -> usize {
        self.calls.borrow().iter().filter(|l| *l == label).count()
    }

    /// Total number of recorded invocations.
    pub fn total(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }
}

/// Assert that a [`Probe`] recorded a label a given number of times.
///
/// With two arguments the expected count is one.
///
/// # Example
///
/// ```rust
/// use mooring::assert_fired;
/// use mooring::testing::Probe;
///
/// let probe = Probe::new();
/// probe.record("release");
/// assert_fired!(probe, "release");
/// assert_fired!(probe, "acquire", 0);
/// ```
#[macro_export]
macro_rules! assert_fired {
    ($probe:expr, $label:expr) => {
        $crate::assert_fired!($probe, $label, 1)
    };
    ($probe:expr, $label:expr, $times:expr) => {{
        let fired = $probe.count($label);
        let expected: usize = $times;
        if fired != expected {
            panic!(
                "Expected `{}` to fire {} time(s), fired {} (calls: {:?})",
                $label,
                expected,
                fired,
                $probe.calls()
            );
        }
    }};
}
