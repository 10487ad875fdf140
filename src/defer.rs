//! Deferred actions that run exactly once at scope exit.
//!
//! A [`Deferred`] guard owns a bound callable and invokes it when the guard is
//! dropped, however the enclosing scope is left: falling off the end, an early
//! `return`, `?` propagating an error, or a panic unwinding through the frame.
//!
//! - [`defer`] - guard a zero-argument closure
//! - [`defer_with`] - guard a function with pre-bound arguments
//! - [`defer!`](crate::defer!) - anonymous guard for the current scope
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use mooring::defer;
//!
//! let log = RefCell::new(Vec::new());
//! {
//!     let _cleanup = defer(|| log.borrow_mut().push("cleanup"));
//!     log.borrow_mut().push("work");
//! }
//! assert_eq!(*log.borrow(), ["work", "cleanup"]);
//! ```
//!
//! # Moves
//!
//! Moving a guard hands the action to the new owner. The moved-from binding is
//! statically dead and never dropped, so however many times a guard is moved,
//! the action still runs once, when the final owner goes away.
//!
//! # Panics
//!
//! A panic raised by the action propagates out of the drop point. If the
//! guard is being dropped because of an earlier panic, a second panic aborts
//! the process. Actions that can fail should handle the failure themselves or
//! be run explicitly through [`Deferred::fire`].

use std::mem::ManuallyDrop;

use crate::bind::{bind, Bound, Callable};

/// Guard that runs a bound action exactly once when dropped.
///
/// Created by [`defer`], [`defer_with`] or the [`defer!`](crate::defer!) macro.
/// The action's return value, whatever its type, is discarded on drop; use
/// [`fire`](Deferred::fire) to run it early and keep the value.
#[must_use = "the action runs immediately if the guard is not bound to a variable"]
pub struct Deferred<F, Args = ()>
where
    F: Callable<Args>,
{
    action: ManuallyDrop<Bound<F, Args>>,
}

impl<F, Args> std::fmt::Debug for Deferred<F, Args>
where
    F: Callable<Args>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("action", &"<function>")
            .field("output", &std::any::type_name::<F::Output>())
            .finish()
    }
}

impl<F, Args> Deferred<F, Args>
where
    F: Callable<Args>,
{
    fn armed(action: Bound<F, Args>) -> Self {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            output = std::any::type_name::<F::Output>(),
            "deferred action armed"
        );
        Deferred {
            action: ManuallyDrop::new(action),
        }
    }

    /// Run the action now and return its result.
    ///
    /// This is the explicit form of dropping the guard: the action runs once,
    /// here, and nothing runs at scope exit afterwards.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mooring::defer;
    ///
    /// let guard = defer(|| 40 + 2);
    /// assert_eq!(guard.fire(), 42);
    /// ```
    pub fn fire(self) -> F::Output {
        let mut this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the action is taken exactly once.
        let action = unsafe { ManuallyDrop::take(&mut this.action) };
        #[cfg(feature = "tracing")]
        tracing::trace!("deferred action fired explicitly");
        action.call()
    }
}

impl<F, Args> Drop for Deferred<F, Args>
where
    F: Callable<Args>,
{
    fn drop(&mut self) {
        // SAFETY: drop runs at most once and `action` is not touched afterwards.
        let action = unsafe { ManuallyDrop::take(&mut self.action) };
        #[cfg(feature = "tracing")]
        tracing::trace!(
            discarded = std::any::type_name::<F::Output>(),
            "deferred action fired on drop"
        );
        let _ = action.call();
    }
}

/// Defer `action` until the returned guard is dropped.
///
/// `action` may return any type; the value is discarded when the guard fires
/// on drop.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use mooring::defer;
///
/// fn early_exit(flag: &Cell<bool>, bail: bool) -> Result<(), &'static str> {
///     let _reset = defer(|| flag.set(false));
///     flag.set(true);
///     if bail {
///         return Err("bailed");
///     }
///     Ok(())
/// }
///
/// let flag = Cell::new(false);
/// assert!(early_exit(&flag, true).is_err());
/// assert!(!flag.get());
/// ```
pub fn defer<F, R>(action: F) -> Deferred<F>
where
    F: FnOnce() -> R,
{
    Deferred::armed(bind(action, ()))
}

/// Defer `action(args...)` until the returned guard is dropped.
///
/// The argument tuple is bound now and moved into the guard; `action` is not
/// invoked until the guard fires. Closures passed here need annotated
/// parameter types, since they are inferred from the tuple rather than from an
/// `Fn` signature.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use mooring::defer_with;
///
/// fn log_line(log: &RefCell<Vec<String>>, tag: &str, code: u32) {
///     log.borrow_mut().push(format!("{tag}:{code}"));
/// }
///
/// let log = RefCell::new(Vec::new());
/// {
///     let _g = defer_with(log_line, (&log, "exit", 0));
/// }
/// assert_eq!(*log.borrow(), ["exit:0"]);
/// ```
pub fn defer_with<F, Args>(action: F, args: Args) -> Deferred<F, Args>
where
    F: Callable<Args>,
{
    Deferred::armed(bind(action, args))
}

/// Run a block when the current scope exits.
///
/// Expands to an anonymous [`Deferred`] guard bound in the enclosing scope.
/// Several `defer!` blocks in one scope run in reverse order of declaration.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
///
/// let order = RefCell::new(Vec::new());
/// {
///     mooring::defer! { order.borrow_mut().push(1) }
///     mooring::defer! { order.borrow_mut().push(2) }
/// }
/// assert_eq!(*order.borrow(), [2, 1]);
/// ```
#[macro_export]
macro_rules! defer {
    ($($body:tt)*) => {
        let _deferred = $crate::defer(|| { $($body)* });
    };
}
