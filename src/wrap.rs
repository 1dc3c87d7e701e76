//! The adapter core.
//!
//! A raw system call reports failure by returning one reserved value and
//! leaving the reason in the thread's error slot. [`Wrapped`] turns such a
//! callable into one that returns `Result`: the slot is captured in the
//! same uninterrupted step as the sentinel check, so the code a failure
//! carries is the one the call itself set.

use std::fmt;
use std::marker::PhantomData;

use crate::errno::{Errno, Result};

/// Raw return types that reserve one value to mean "the call failed".
///
/// For the libc integer conventions that value is `-1`.
pub trait Sentinel: Copy + PartialEq {
    /// The reserved failure value.
    const FAILURE: Self;

    /// Whether this return value is the failure sentinel.
    #[inline]
    fn is_failure(self) -> bool {
        self == Self::FAILURE
    }
}

impl Sentinel for i32 {
    const FAILURE: i32 = -1;
}

impl Sentinel for i64 {
    const FAILURE: i64 = -1;
}

impl Sentinel for isize {
    const FAILURE: isize = -1;
}

/// Conversion from a sentinel-checked raw return value to the type the
/// caller is handed.
///
/// Conversions are plain `as` casts: same-width sign reinterpretation wraps
/// and narrowing truncates, exactly as the cast rules say. A raw value is
/// converted only after it has been checked, so the sentinel never reaches
/// a conversion; a success value whose raw bits happen to equal the
/// sentinel cannot be told apart from a failure and is treated as one.
pub trait FromRaw<T>: Sized {
    fn from_raw(raw: T) -> Self;
}

impl FromRaw<i32> for i32 {
    #[inline]
    fn from_raw(raw: i32) -> i32 {
        raw
    }
}

impl FromRaw<i64> for i64 {
    #[inline]
    fn from_raw(raw: i64) -> i64 {
        raw
    }
}

impl FromRaw<isize> for isize {
    #[inline]
    fn from_raw(raw: isize) -> isize {
        raw
    }
}

/// Success carries no data; the raw return value only ever signaled
/// success or failure.
impl<T> FromRaw<T> for () {
    #[inline]
    fn from_raw(_raw: T) {}
}

/// `ssize_t` counts that are pure sizes once the sentinel is ruled out.
impl FromRaw<isize> for usize {
    #[inline]
    fn from_raw(raw: isize) -> usize {
        raw as usize
    }
}

/// 32-bit signed counts reported as unsigned.
impl FromRaw<i32> for u32 {
    #[inline]
    fn from_raw(raw: i32) -> u32 {
        raw as u32
    }
}

/// A fixed-arity callable taking its arguments as one tuple.
///
/// Implemented for `unsafe extern "C"` function pointers (the libc call
/// surface) and for plain `fn` pointers (pure-Rust callables that follow
/// the same return convention), up to four arguments.
pub trait RawCall<A>: Copy {
    /// The callable's native return type.
    type Ret;

    /// Invoke with the tuple fields as arguments, in order.
    ///
    /// # Safety
    ///
    /// The arguments must satisfy whatever contract the underlying callable
    /// imposes; plain `fn` pointers impose none.
    unsafe fn invoke(self, args: A) -> Self::Ret;
}

macro_rules! impl_raw_call {
    ($($arg:ident: $ty:ident),*) => {
        impl<R, $($ty),*> RawCall<($($ty,)*)>
            for unsafe extern "C" fn($($ty),*) -> R
        {
            type Ret = R;

            #[inline]
            unsafe fn invoke(self, ($($arg,)*): ($($ty,)*)) -> R {
                self($($arg),*)
            }
        }

        impl<R, $($ty),*> RawCall<($($ty,)*)> for fn($($ty),*) -> R {
            type Ret = R;

            #[inline]
            unsafe fn invoke(self, ($($arg,)*): ($($ty,)*)) -> R {
                self($($arg),*)
            }
        }
    };
}

impl_raw_call!();
impl_raw_call!(a1: A1);
impl_raw_call!(a1: A1, a2: A2);
impl_raw_call!(a1: A1, a2: A2, a3: A3);
impl_raw_call!(a1: A1, a2: A2, a3: A3, a4: A4);

/// Check a raw return value against the failure sentinel, capturing the
/// error slot in the same step.
///
/// Call this on the result of a raw call with nothing in between: the slot
/// is only valid until the thread does anything else.
#[inline]
pub fn check<T: Sentinel>(ret: T) -> Result<T> {
    let errno = Errno::last();
    if ret.is_failure() {
        Err(errno)
    } else {
        Ok(ret)
    }
}

/// A system call adapted to report failure through `Result`.
///
/// Holds the raw callable and, as a phantom, the type successes are
/// reported as. A `Wrapped` value is immutable and every invocation is
/// independent; see [`wrap`] for construction.
pub struct Wrapped<F, U> {
    raw: F,
    reported: PhantomData<fn() -> U>,
}

impl<F, U> Wrapped<F, U> {
    pub const fn new(raw: F) -> Wrapped<F, U> {
        Wrapped {
            raw,
            reported: PhantomData,
        }
    }

    /// The callable this wraps.
    pub fn raw(&self) -> F
    where
        F: Copy,
    {
        self.raw
    }

    /// Invoke the wrapped call with `args`.
    ///
    /// The raw callable runs exactly once. The error slot is read
    /// immediately after it returns, before the sentinel branch; the
    /// reported-type conversion is a pure cast performed after the branch,
    /// so nothing between call and capture can disturb the slot.
    ///
    /// # Safety
    ///
    /// Same contract as [`RawCall::invoke`] for these arguments.
    pub unsafe fn call<A>(&self, args: A) -> Result<U>
    where
        F: RawCall<A>,
        F::Ret: Sentinel,
        U: FromRaw<F::Ret>,
    {
        let ret = check(self.raw.invoke(args))?;
        Ok(U::from_raw(ret))
    }
}

impl<F: Copy, U> Clone for Wrapped<F, U> {
    fn clone(&self) -> Wrapped<F, U> {
        *self
    }
}

impl<F: Copy, U> Copy for Wrapped<F, U> {}

impl<F: fmt::Debug, U> fmt::Debug for Wrapped<F, U> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Wrapped").field("raw", &self.raw).finish()
    }
}

/// Wrap a raw callable, reporting its non-sentinel returns as `U`.
///
/// Pure construction: no I/O, cannot fail, usable in statics. The reported
/// type comes first so a call site reads as a declaration of what its
/// successes mean:
///
/// ```
/// use libc::{c_char, c_int};
/// use syswrap::{wrap, Wrapped};
///
/// type RawUnlinkFn = unsafe extern "C" fn(*const c_char) -> c_int;
///
/// // success carries nothing; the return value only flagged errors
/// static UNLINK: Wrapped<RawUnlinkFn, ()> =
///     wrap(libc::unlink as RawUnlinkFn);
///
/// let missing = b"/hopefully/nonexisting/file\0";
/// let res = unsafe { UNLINK.call((missing.as_ptr() as *const c_char,)) };
/// assert_eq!(res.unwrap_err().code(), libc::ENOENT);
/// ```
pub const fn wrap<U, F>(raw: F) -> Wrapped<F, U> {
    Wrapped::new(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use libc::c_int;

    fn echo(val: c_int) -> c_int {
        val
    }

    fn fail_with(code: c_int) -> c_int {
        Errno::new(code).set();
        -1
    }

    fn echo_count(val: isize) -> isize {
        val
    }

    fn echo_offset(val: i64) -> i64 {
        val
    }

    fn diff(a: c_int, b: c_int, c: c_int) -> c_int {
        a - b - c
    }

    #[test]
    fn test_value_bearing_success() {
        let call = wrap::<c_int, _>(echo as fn(c_int) -> c_int);
        assert_eq!(unsafe { call.call((5,)) }, Ok(5));
    }

    #[test]
    fn test_sentinel_reports_code_at_return() {
        let call = wrap::<c_int, _>(fail_with as fn(c_int) -> c_int);
        let err = unsafe { call.call((libc::EACCES,)) }.unwrap_err();
        // later writes to the slot must not move an already-captured code
        Errno::new(libc::EBUSY).set();
        assert_eq!(err, Errno::new(libc::EACCES));
    }

    #[test]
    fn test_success_ignores_stale_slot() {
        Errno::new(libc::EINVAL).set();
        let call = wrap::<c_int, _>(echo as fn(c_int) -> c_int);
        assert_eq!(unsafe { call.call((0,)) }, Ok(0));
    }

    #[test]
    fn test_signal_only_discards_value() {
        let call = wrap::<(), _>(echo as fn(c_int) -> c_int);
        assert_eq!(unsafe { call.call((7,)) }, Ok(()));
        assert_eq!(unsafe { call.call((9,)) }, Ok(()));
    }

    #[test]
    fn test_signal_only_still_fails() {
        let call = wrap::<(), _>(fail_with as fn(c_int) -> c_int);
        let err = unsafe { call.call((libc::EPERM,)) }.unwrap_err();
        assert_eq!(err.code(), libc::EPERM);
    }

    #[test]
    fn test_sign_translation_reports_zero() {
        let call = wrap::<usize, _>(echo_count as fn(isize) -> isize);
        assert_eq!(unsafe { call.call((0,)) }, Ok(0));
        assert_eq!(unsafe { call.call((5,)) }, Ok(5));
    }

    #[test]
    fn test_sentinel_never_becomes_large_unsigned() {
        Errno::new(libc::EIO).set();
        let call = wrap::<usize, _>(echo_count as fn(isize) -> isize);
        assert_eq!(unsafe { call.call((-1,)) }, Err(Errno::new(libc::EIO)));
    }

    #[test]
    fn test_sign_translation_32bit() {
        let call = wrap::<u32, _>(echo as fn(c_int) -> c_int);
        assert_eq!(unsafe { call.call((7,)) }, Ok(7u32));
    }

    #[test]
    fn test_wide_offset_returns() {
        let call = wrap::<i64, _>(echo_offset as fn(i64) -> i64);
        assert_eq!(unsafe { call.call((4096,)) }, Ok(4096));
        Errno::new(libc::EINVAL).set();
        assert_eq!(unsafe { call.call((-1,)) }, Err(Errno::new(libc::EINVAL)));
    }

    #[test]
    fn test_arguments_forwarded_in_order() {
        let call = wrap::<c_int, _>(diff as fn(c_int, c_int, c_int) -> c_int);
        assert_eq!(unsafe { call.call((10, 3, 2)) }, Ok(5));
    }

    #[test]
    fn test_construction_is_repeatable() {
        let first = wrap::<c_int, _>(echo as fn(c_int) -> c_int);
        let second = wrap::<c_int, _>(echo as fn(c_int) -> c_int);
        let (a, b) = unsafe { (first.call((3,)), second.call((3,))) };
        assert_eq!(a, b);
    }

    #[test]
    fn test_wrapped_is_copy() {
        let call = wrap::<c_int, _>(echo as fn(c_int) -> c_int);
        let copy = call;
        assert_eq!(unsafe { call.call((1,)) }, unsafe { copy.call((1,)) });
    }

    #[test]
    fn test_raw_returns_the_callable() {
        let call = wrap::<c_int, _>(echo as fn(c_int) -> c_int);
        assert_eq!((call.raw())(6), 6);
    }

    #[test]
    fn test_extern_zero_arity() {
        type RawGetpidFn = unsafe extern "C" fn() -> libc::pid_t;
        let call = wrap::<libc::pid_t, _>(libc::getpid as RawGetpidFn);
        let pid = unsafe { call.call(()) }.unwrap();
        assert!(pid > 0);
    }

    #[test]
    fn test_check_passes_non_sentinel() {
        assert_eq!(check(0), Ok(0));
        assert_eq!(check(42), Ok(42));
    }

    #[test]
    fn test_check_catches_sentinel() {
        Errno::new(libc::ENOENT).set();
        assert_eq!(check(-1), Err(Errno::new(libc::ENOENT)));
    }

    #[test]
    fn test_concurrent_failures_capture_independently() {
        let worker = |code: c_int| {
            std::thread::spawn(move || {
                let call = wrap::<c_int, _>(fail_with as fn(c_int) -> c_int);
                unsafe { call.call((code,)) }.unwrap_err()
            })
        };
        let first = worker(libc::EPERM);
        let second = worker(libc::ENOENT);
        assert_eq!(first.join().unwrap().code(), libc::EPERM);
        assert_eq!(second.join().unwrap().code(), libc::ENOENT);
    }
}
