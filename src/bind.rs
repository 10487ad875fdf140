//! Binding callables to pre-supplied arguments.
//!
//! Both [`Deferred`](crate::Deferred) and [`Anchor`](crate::Anchor) store a
//! callable together with the arguments it will eventually receive. Rather than
//! forcing every call site to write a closure, a function and an argument tuple
//! can be bound directly:
//!
//! ```
//! use mooring::bind::bind;
//!
//! fn add(a: u32, b: u32) -> u32 {
//!     a + b
//! }
//!
//! let bound = bind(add, (2, 3));
//! assert_eq!(bound.call(), 5);
//! ```
//!
//! The result type is deduced from the callable through [`Callable::Output`],
//! so the bound function may return anything, including `()` or a `Result`.
//!
//! Argument tuples of up to six elements are supported.

/// A callable that can be invoked once with an argument tuple.
///
/// Implemented for every `FnOnce` whose parameters match the tuple `Args`,
/// for tuples of arity 0 through 6.
pub trait Callable<Args> {
    /// The value produced by the call.
    type Output;

    /// Invoke the callable, spreading `args` into its parameters.
    fn call_with(self, args: Args) -> Self::Output;
}

/// A callable that operates on a borrowed target plus an argument tuple.
///
/// This is the shape of a chained operation on an [`Anchor`](crate::Anchor):
/// the anchored resource comes first as `&mut T`, followed by the bound
/// arguments.
pub trait CallableOn<T: ?Sized, Args> {
    /// The value produced by the call.
    type Output;

    /// Invoke the callable against `target`.
    fn call_on(self, target: &mut T, args: Args) -> Self::Output;
}

macro_rules! impl_callable {
    ($($arg:ident: $ty:ident),*) => {
        impl<Func, Ret, $($ty),*> Callable<($($ty,)*)> for Func
        where
            Func: FnOnce($($ty),*) -> Ret,
        {
            type Output = Ret;

            #[inline]
            fn call_with(self, ($($arg,)*): ($($ty,)*)) -> Ret {
                self($($arg),*)
            }
        }

        impl<Func, Ret, Target: ?Sized, $($ty),*> CallableOn<Target, ($($ty,)*)> for Func
        where
            Func: FnOnce(&mut Target, $($ty),*) -> Ret,
        {
            type Output = Ret;

            #[inline]
            fn call_on(self, target: &mut Target, ($($arg,)*): ($($ty,)*)) -> Ret {
                self(target, $($arg),*)
            }
        }
    };
}

impl_callable!();
impl_callable!(a: A);
impl_callable!(a: A, b: B);
impl_callable!(a: A, b: B, c: C);
impl_callable!(a: A, b: B, c: C, d: D);
impl_callable!(a: A, b: B, c: C, d: D, e: E);
impl_callable!(a: A, b: B, c: C, d: D, e: E, f: F);

/// A callable with its arguments already supplied.
///
/// Created by [`bind`]. Calling it consumes the binding, so a `Bound` value
/// can run at most once.
pub struct Bound<F, Args> {
    f: F,
    args: Args,
}

impl<F, Args> std::fmt::Debug for Bound<F, Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bound")
            .field("f", &"<function>")
            .field("args", &std::any::type_name::<Args>())
            .finish()
    }
}

impl<F, Args> Bound<F, Args>
where
    F: Callable<Args>,
{
    /// Invoke the bound callable with its stored arguments.
    #[inline]
    pub fn call(self) -> F::Output {
        self.f.call_with(self.args)
    }
}

/// Bind `f` to the argument tuple `args` for later invocation.
///
/// Nothing is invoked here; see [`Bound::call`].
///
/// # Example
///
/// ```
/// use mooring::bind::bind;
///
/// let greeting = bind(|name: &str, punct: char| format!("hello {name}{punct}"), ("world", '!'));
/// assert_eq!(greeting.call(), "hello world!");
/// ```
pub fn bind<F, Args>(f: F, args: Args) -> Bound<F, Args>
where
    F: Callable<Args>,
{
    Bound { f, args }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concat(a: &str, b: &str, c: &str) -> String {
        format!("{a}{b}{c}")
    }

    #[test]
    fn test_bind_zero_args() {
        let bound = bind(|| 7, ());
        assert_eq!(bound.call(), 7);
    }

    #[test]
    fn test_bind_function_item() {
        let bound = bind(concat, ("a", "b", "c"));
        assert_eq!(bound.call(), "abc");
    }

    #[test]
    fn test_bind_six_args() {
        let bound = bind(
            |a: u8, b: u16, c: u32, d: u64, e: usize, f: i32| {
                a as i64 + b as i64 + c as i64 + d as i64 + e as i64 + f as i64
            },
            (1, 2, 3, 4, 5, -15),
        );
        assert_eq!(bound.call(), 0);
    }

    #[test]
    fn test_bind_unit_output() {
        let mut hits = 0;
        bind(|n: i32| hits += n, (3,)).call();
        assert_eq!(hits, 3);
    }

    #[test]
    fn test_bind_moves_owned_args() {
        let owned = vec![1, 2, 3];
        let bound = bind(|v: Vec<i32>| v.into_iter().sum::<i32>(), (owned,));
        assert_eq!(bound.call(), 6);
    }

    #[test]
    fn test_call_on_mutates_target() {
        let mut total = 10;
        let out = CallableOn::call_on(|t: &mut i32, by: i32| {
            *t += by;
            *t
        }, &mut total, (5,));
        assert_eq!(out, 15);
        assert_eq!(total, 15);
    }

    #[test]
    fn test_call_on_unsized_target() {
        let mut buf = [1u8, 2, 3];
        let len = CallableOn::call_on(
            |s: &mut [u8], fill: u8| {
                s.fill(fill);
                s.len()
            },
            &mut buf[..],
            (9,),
        );
        assert_eq!(len, 3);
        assert_eq!(buf, [9, 9, 9]);
    }

    #[test]
    fn test_bound_debug_hides_function() {
        let bound = bind(|x: i32| x, (1,));
        let dbg = format!("{:?}", bound);
        assert!(dbg.contains("<function>"));
    }
}
