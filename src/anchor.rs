//! Resource anchors: an acquired value tied to its release.
//!
//! An [`Anchor`] is created by running an acquisition function and pairing its
//! result with a release function. From then on the anchor owns the resource:
//!
//! - chained operations ([`chain`](Anchor::chain), [`chain_with`](Anchor::chain_with),
//!   [`try_chain`](Anchor::try_chain)) configure the resource in place and hand
//!   the anchor back, so multi-step setup reads top to bottom
//! - the resource is reachable in between through `Deref`/`DerefMut`
//! - when the anchor is dropped, or [`release`](Anchor::release)d explicitly,
//!   the release function receives the resource as it stands at that moment
//!
//! Release happens exactly once. A moved anchor leaves nothing behind that
//! could release a second time, which is what makes returning `self` from each
//! chained step safe.
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use mooring::anchor;
//!
//! let released = Cell::new(None);
//!
//! {
//!     let counter = anchor(|n: u32| released.set(Some(n)), || 0u32)
//!         .chain(|n| *n += 1)
//!         .chain(|n| *n += 1);
//!     assert_eq!(*counter, 2);
//! }
//!
//! assert_eq!(released.get(), Some(2));
//! ```
//!
//! # Failure
//!
//! | Where it fails            | What happens |
//! |---------------------------|--------------|
//! | acquisition ([`try_anchor`]) | no anchor exists, nothing is released, the error is returned |
//! | chained step ([`Anchor::try_chain`]) | the resource is released, then the error is returned |
//! | chained step panics       | the resource is released while unwinding |
//! | release panics            | the panic propagates from the drop point |

use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};

use crate::bind::{Callable, CallableOn};

/// Owner of one resource and the function that releases it.
///
/// See the [module documentation](self) for the lifecycle.
#[must_use = "the resource is released immediately if the anchor is not bound to a variable"]
pub struct Anchor<O, D>
where
    D: Callable<(O,)>,
{
    resource: ManuallyDrop<O>,
    release: ManuallyDrop<D>,
}

impl<O, D> std::fmt::Debug for Anchor<O, D>
where
    O: std::fmt::Debug,
    D: Callable<(O,)>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Anchor")
            .field("resource", &*self.resource)
            .field("release", &"<function>")
            .finish()
    }
}

impl<O, D> Anchor<O, D>
where
    D: Callable<(O,)>,
{
    fn armed(resource: O, release: D) -> Self {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            resource = std::any::type_name::<O>(),
            "resource anchored"
        );
        Anchor {
            resource: ManuallyDrop::new(resource),
            release: ManuallyDrop::new(release),
        }
    }

    /// Acquire a resource with `acquire` and anchor it to `release`.
    ///
    /// Same as the free function [`anchor`].
    pub fn new<C>(release: D, acquire: C) -> Self
    where
        C: FnOnce() -> O,
    {
        Self::armed(acquire(), release)
    }

    /// Apply `op` to the resource and return the anchor.
    ///
    /// `op` runs immediately. Whatever it returns is discarded; use
    /// [`try_chain`](Anchor::try_chain) when the step can fail.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mooring::anchor;
    ///
    /// let buf = anchor(drop::<Vec<u8>>, Vec::new)
    ///     .chain(|b| b.extend_from_slice(b"head"))
    ///     .chain(|b| b.push(b'!'));
    /// assert_eq!(buf.as_slice(), b"head!");
    /// ```
    pub fn chain<Op, R>(mut self, op: Op) -> Self
    where
        Op: FnOnce(&mut O) -> R,
    {
        let _ = op(&mut *self.resource);
        #[cfg(feature = "tracing")]
        tracing::trace!(
            resource = std::any::type_name::<O>(),
            "chained operation applied"
        );
        self
    }

    /// Apply `op(resource, args...)` and return the anchor.
    ///
    /// The argument tuple follows the same rules as
    /// [`defer_with`](crate::defer_with).
    ///
    /// # Example
    ///
    /// ```rust
    /// use mooring::anchor;
    ///
    /// fn set_field(map: &mut Vec<(String, u32)>, key: &str, value: u32) {
    ///     map.push((key.to_string(), value));
    /// }
    ///
    /// let cfg = anchor(drop::<Vec<(String, u32)>>, Vec::new)
    ///     .chain_with(set_field, ("retries", 3))
    ///     .chain_with(set_field, ("timeout", 30));
    /// assert_eq!(cfg.len(), 2);
    /// ```
    pub fn chain_with<Op, Args>(mut self, op: Op, args: Args) -> Self
    where
        Op: CallableOn<O, Args>,
    {
        let _ = op.call_on(&mut *self.resource, args);
        #[cfg(feature = "tracing")]
        tracing::trace!(
            resource = std::any::type_name::<O>(),
            "chained operation applied"
        );
        self
    }

    /// Apply a fallible `op` to the resource.
    ///
    /// On success the anchor is handed back. On failure the anchor is dropped
    /// here, so the resource is released before the error reaches the caller,
    /// and the error is returned unchanged.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::cell::Cell;
    /// use mooring::anchor;
    ///
    /// let closed = Cell::new(false);
    /// let result = anchor(|_: u32| closed.set(true), || 7u32)
    ///     .try_chain(|n| if *n > 5 { Err("too large") } else { Ok(()) });
    ///
    /// assert_eq!(result.err(), Some("too large"));
    /// assert!(closed.get());
    /// ```
    pub fn try_chain<Op, R, E>(mut self, op: Op) -> Result<Self, E>
    where
        Op: FnOnce(&mut O) -> Result<R, E>,
    {
        op(&mut *self.resource)?;
        #[cfg(feature = "tracing")]
        tracing::trace!(
            resource = std::any::type_name::<O>(),
            "chained operation applied"
        );
        Ok(self)
    }

    /// Borrow the anchored resource.
    ///
    /// Same as `Deref`, for when `O` has its own `chain` or `release` method
    /// and `anchor.chain(..)` would resolve to the anchor's instead.
    pub fn resource(&self) -> &O {
        &self.resource
    }

    /// Mutably borrow the anchored resource.
    ///
    /// Same as `DerefMut`; see [`resource`](Anchor::resource).
    pub fn resource_mut(&mut self) -> &mut O {
        &mut self.resource
    }

    /// Release the resource now and return what the release function returned.
    ///
    /// This is the explicit form of dropping the anchor, for callers that want
    /// to observe the release result (for example a `Result` from closing a
    /// handle). Nothing is released again at scope exit.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mooring::anchor;
    ///
    /// let total = anchor(|v: Vec<u32>| v.iter().sum::<u32>(), || vec![1, 2])
    ///     .chain(|v| v.push(3))
    ///     .release();
    /// assert_eq!(total, 6);
    /// ```
    pub fn release(self) -> D::Output {
        let mut this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so each field is taken exactly once.
        let (resource, release) = unsafe {
            (
                ManuallyDrop::take(&mut this.resource),
                ManuallyDrop::take(&mut this.release),
            )
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(
            resource = std::any::type_name::<O>(),
            "resource released explicitly"
        );
        release.call_with((resource,))
    }
}

impl<O, D> Deref for Anchor<O, D>
where
    D: Callable<(O,)>,
{
    type Target = O;

    fn deref(&self) -> &O {
        &self.resource
    }
}

impl<O, D> DerefMut for Anchor<O, D>
where
    D: Callable<(O,)>,
{
    fn deref_mut(&mut self) -> &mut O {
        &mut self.resource
    }
}

impl<O, D> Drop for Anchor<O, D>
where
    D: Callable<(O,)>,
{
    fn drop(&mut self) {
        // SAFETY: drop runs at most once and neither field is touched afterwards.
        let (resource, release) = unsafe {
            (
                ManuallyDrop::take(&mut self.resource),
                ManuallyDrop::take(&mut self.release),
            )
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(
            resource = std::any::type_name::<O>(),
            discarded = std::any::type_name::<D::Output>(),
            "resource released on drop"
        );
        let _ = release.call_with((resource,));
    }
}

/// Acquire a resource and anchor it to its release function.
///
/// `acquire` runs immediately and its result becomes the anchored resource;
/// `release` is stored and runs exactly once, with the resource by value, when
/// the anchor is dropped or explicitly released.
///
/// The release closure is checked before the resource type is known, so give
/// its parameter a type (or pass a function item).
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use mooring::anchor;
///
/// let closed = RefCell::new(Vec::new());
/// {
///     let _conn = anchor(|name: String| closed.borrow_mut().push(name), || "db".to_string());
///     assert!(closed.borrow().is_empty());
/// }
/// assert_eq!(*closed.borrow(), ["db"]);
/// ```
pub fn anchor<O, D, C>(release: D, acquire: C) -> Anchor<O, D>
where
    C: FnOnce() -> O,
    D: Callable<(O,)>,
{
    Anchor::new(release, acquire)
}

/// Like [`anchor`], with an argument tuple bound to the acquisition function.
///
/// # Example
///
/// ```rust
/// use mooring::anchor_with;
///
/// fn alloc(len: usize, fill: u8) -> Vec<u8> {
///     vec![fill; len]
/// }
///
/// let buf = anchor_with(drop::<Vec<u8>>, alloc, (4, 0xff));
/// assert_eq!(buf.as_slice(), [0xff; 4]);
/// ```
pub fn anchor_with<O, D, C, Args>(release: D, acquire: C, args: Args) -> Anchor<O, D>
where
    C: Callable<Args, Output = O>,
    D: Callable<(O,)>,
{
    Anchor::armed(acquire.call_with(args), release)
}

/// Like [`anchor`], for acquisitions that can fail.
///
/// If `acquire` returns an error there is nothing to release: no anchor is
/// built, `release` is dropped without being called, and the error is returned
/// unchanged.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use mooring::try_anchor;
///
/// let released = Cell::new(false);
/// let result = try_anchor(|_: u32| released.set(true), || Err::<u32, _>("refused"));
///
/// assert_eq!(result.err(), Some("refused"));
/// assert!(!released.get());
/// ```
pub fn try_anchor<O, E, D, C>(release: D, acquire: C) -> Result<Anchor<O, D>, E>
where
    C: FnOnce() -> Result<O, E>,
    D: Callable<(O,)>,
{
    let resource = acquire()?;
    Ok(Anchor::armed(resource, release))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_fired;
    use crate::testing::Probe;
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_counter_scenario() {
        let received = RefCell::new(Vec::new());
        {
            let _a = anchor(|n: i32| received.borrow_mut().push(n), || 0)
                .chain(|n| *n += 1)
                .chain(|n| *n += 1);
        }
        assert_eq!(*received.borrow(), [2]);
    }

    #[test]
    fn test_acquire_runs_once_at_construction() {
        let acquired = Cell::new(0);
        let a = anchor(drop::<u8>, || {
            acquired.set(acquired.get() + 1);
            1u8
        });
        assert_eq!(acquired.get(), 1);
        drop(a);
        assert_eq!(acquired.get(), 1);
    }

    #[test]
    fn test_release_not_called_before_drop() {
        let probe = Probe::new();
        let p = probe.clone();
        let a = anchor(move |_: ()| p.record("release"), || ());
        assert!(probe.is_empty());
        drop(a);
        assert_fired!(probe, "release");
    }

    #[test]
    fn test_moved_anchor_releases_once() {
        let probe = Probe::new();
        let p = probe.clone();
        let a = anchor(move |_: u8| p.record("release"), || 1u8);
        let b = a;
        let c = b;
        assert!(probe.is_empty());
        drop(c);
        assert_fired!(probe, "release");
    }

    #[test]
    fn test_chain_order() {
        let steps = RefCell::new(Vec::new());
        {
            let _a = anchor(|_: ()| steps.borrow_mut().push("release"), || ())
                .chain(|_| steps.borrow_mut().push("one"))
                .chain(|_| steps.borrow_mut().push("two"))
                .chain(|_| steps.borrow_mut().push("three"));
            assert_eq!(*steps.borrow(), ["one", "two", "three"]);
        }
        assert_eq!(*steps.borrow(), ["one", "two", "three", "release"]);
    }

    #[test]
    fn test_chain_discards_result() {
        let a = anchor(drop::<Vec<i32>>, Vec::new).chain(|v| {
            v.push(1);
            v.len()
        });
        assert_eq!(a.resource(), &[1]);
    }

    #[test]
    fn test_chain_with_bound_args() {
        let got = Cell::new(0);
        {
            let _a = anchor(|n: i64| got.set(n), || 1i64)
                .chain_with(|n: &mut i64, by: i64| *n *= by, (6,))
                .chain_with(|n: &mut i64, a: i64, b: i64| *n += a - b, (10, 3));
        }
        assert_eq!(got.get(), 13);
    }

    #[test]
    fn test_try_chain_success_keeps_anchor() {
        let released = Cell::new(None);
        {
            let a = anchor(|n: u32| released.set(Some(n)), || 1u32)
                .try_chain(|n| {
                    *n += 1;
                    Ok::<_, String>(())
                })
                .unwrap();
            assert_eq!(*a, 2);
            assert_eq!(released.get(), None);
        }
        assert_eq!(released.get(), Some(2));
    }

    #[test]
    fn test_try_chain_failure_releases_before_error() {
        let probe = Probe::new();
        let p = probe.clone();
        let result = anchor(move |_: u32| p.record("release"), || 0u32)
            .try_chain(|_| Err::<(), _>("step failed"));

        assert_fired!(probe, "release");
        assert_eq!(result.err(), Some("step failed"));
    }

    #[test]
    fn test_try_chain_failure_sees_mutated_resource() {
        let released = Cell::new(0);
        let result = anchor(|n: u32| released.set(n), || 0u32)
            .chain(|n| *n = 5)
            .try_chain(|n| {
                *n += 1;
                Err::<(), _>(())
            });
        assert!(result.is_err());
        assert_eq!(released.get(), 6);
    }

    #[test]
    fn test_try_chain_with_question_mark() {
        fn configure(probe: &Probe) -> Result<u32, String> {
            let p = probe.clone();
            let a = anchor(move |_: u32| p.record("release"), || 1u32)
                .try_chain(|n| {
                    *n *= 10;
                    Ok::<_, String>(())
                })?
                .try_chain(|_| Err::<(), _>("bad config".to_string()))?;
            Ok(*a)
        }

        let probe = Probe::new();
        assert_eq!(configure(&probe), Err("bad config".to_string()));
        assert_fired!(probe, "release");
    }

    #[test]
    fn test_try_anchor_failure_never_releases() {
        let probe = Probe::new();
        let p = probe.clone();
        let result = try_anchor(move |_: u8| p.record("release"), || Err::<u8, _>("no"));
        assert!(result.is_err());
        assert_fired!(probe, "release", 0);
    }

    #[test]
    fn test_try_anchor_success() {
        let probe = Probe::new();
        let p = probe.clone();
        {
            let a = try_anchor(move |_: u8| p.record("release"), || Ok::<_, ()>(9u8)).unwrap();
            assert_eq!(*a, 9);
        }
        assert_fired!(probe, "release");
    }

    #[test]
    fn test_anchor_with_bound_acquire_args() {
        let a = anchor_with(drop::<String>, |s: &str, n: usize| s.repeat(n), ("ab", 3));
        assert_eq!(a.as_str(), "ababab");
    }

    #[test]
    fn test_explicit_release_returns_result() {
        let probe = Probe::new();
        let p = probe.clone();
        let out = anchor(
            move |n: u32| {
                p.record("release");
                if n == 0 {
                    Err("zero")
                } else {
                    Ok(n)
                }
            },
            || 0u32,
        )
        .release();
        assert_eq!(out, Err("zero"));
        assert_fired!(probe, "release");
    }

    #[test]
    fn test_deref_mut_between_steps() {
        let released = Cell::new(0);
        {
            let mut a = anchor(|n: u32| released.set(n), || 1u32);
            *a += 41;
            *a.resource_mut() *= 1;
        }
        assert_eq!(released.get(), 42);
    }

    #[test]
    fn test_release_on_panic_in_chain() {
        let probe = Probe::new();
        let p = probe.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _a = anchor(move |_: ()| p.record("release"), || ())
                .chain(|_| panic!("chained step panicked"));
        }));
        assert!(result.is_err());
        assert_fired!(probe, "release");
    }

    struct DropNote(Probe);

    impl Drop for DropNote {
        fn drop(&mut self) {
            self.0.record("resource dropped");
        }
    }

    #[test]
    fn test_panicking_release_propagates_from_drop() {
        let probe = Probe::new();
        let (p, res) = (probe.clone(), probe.clone());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let a = anchor(
                move |_: DropNote| {
                    p.record("release");
                    panic!("close failed");
                },
                move || DropNote(res),
            );
            drop(a);
        }));
        let payload = result.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"close failed"));
        assert_fired!(probe, "release");
        assert_fired!(probe, "resource dropped");
    }

    #[test]
    fn test_panicking_explicit_release_propagates() {
        let probe = Probe::new();
        let (p, res) = (probe.clone(), probe.clone());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            anchor(
                move |_: DropNote| -> Result<(), String> {
                    p.record("release");
                    panic!("close failed");
                },
                move || DropNote(res),
            )
            .release()
        }));
        assert!(result.is_err());
        assert_fired!(probe, "release");
        assert_fired!(probe, "resource dropped");
    }

    #[test]
    fn test_anchor_debug_shows_resource() {
        let a = anchor(drop::<u16>, || 77u16);
        let dbg = format!("{:?}", a);
        assert!(dbg.contains("77"));
        assert!(dbg.contains("<function>"));
    }
}
