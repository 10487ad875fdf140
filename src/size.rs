//! Compile-time size helpers.
//!
//! Small `const fn` utilities that tend to sit next to resource setup code:
//! element counts of fixed-size arrays, the length of NUL-terminated byte
//! literals, and binary byte-size multipliers.
//!
//! Rust has no user-defined literal suffixes, so the byte-size multipliers come
//! in two forms: `const fn`s usable in constants, and the [`ByteSize`]
//! extension trait for reading like a suffix.
//!
//! ```rust
//! use mooring::size::{kib, ByteSize};
//!
//! const PAGE: u64 = kib(4);
//! assert_eq!(PAGE, 4u64.k());
//! assert_eq!(2u32.m(), 2_097_152);
//! assert_eq!(1usize.g(), 1_073_741_824);
//! ```

/// Bytes in a kibibyte.
pub const KIB: u64 = 1024;
/// Bytes in a mebibyte.
pub const MIB: u64 = KIB * 1024;
/// Bytes in a gibibyte.
pub const GIB: u64 = MIB * 1024;

/// Number of elements in a fixed-size array.
///
/// ```rust
/// use mooring::size::array_size;
///
/// const PRIMES: [u32; 5] = [2, 3, 5, 7, 11];
/// assert_eq!(array_size(&PRIMES), 5);
/// ```
pub const fn array_size<T, const N: usize>(_: &[T; N]) -> usize {
    N
}

/// Length of a NUL-terminated byte literal, not counting the terminator.
///
/// An empty array has length zero.
///
/// ```rust
/// use mooring::size::str_size;
///
/// assert_eq!(str_size(b"h3\0"), 2);
/// assert_eq!(str_size(b"\0"), 0);
/// ```
pub const fn str_size<const N: usize>(_: &[u8; N]) -> usize {
    N.saturating_sub(1)
}

/// `n` kibibytes in bytes, saturating at `u64::MAX`.
pub const fn kib(n: u64) -> u64 {
    n.saturating_mul(KIB)
}

/// `n` mebibytes in bytes, saturating at `u64::MAX`.
pub const fn mib(n: u64) -> u64 {
    n.saturating_mul(MIB)
}

/// `n` gibibytes in bytes, saturating at `u64::MAX`.
pub const fn gib(n: u64) -> u64 {
    n.saturating_mul(GIB)
}

/// Byte-size multipliers as methods on unsigned integers.
///
/// The result is always `u64`, so `4u8.k()` is `4096` rather than an
/// overflowing `u8`. Literals need a type suffix (`4u64.k()`), since a bare
/// `4` does not pick an integer type for method lookup.
///
/// Results that do not fit in `u64` saturate at `u64::MAX`, in debug and
/// release builds alike.
pub trait ByteSize {
    /// Multiply by 1024.
    fn k(self) -> u64;
    /// Multiply by 1024².
    fn m(self) -> u64;
    /// Multiply by 1024³.
    fn g(self) -> u64;
}

macro_rules! impl_byte_size {
    ($($t:ty),*) => {
        $(
            impl ByteSize for $t {
                #[inline]
                fn k(self) -> u64 {
                    kib(self as u64)
                }

                #[inline]
                fn m(self) -> u64 {
                    mib(self as u64)
                }

                #[inline]
                fn g(self) -> u64 {
                    gib(self as u64)
                }
            }
        )*
    };
}

impl_byte_size!(u8, u16, u32, u64, usize);
