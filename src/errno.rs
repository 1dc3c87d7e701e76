//! Error number access.
//!
//! Calls in the libc convention leave the reason for a failure in a
//! thread-local slot rather than in their return value. [`Errno`] is the
//! captured value of that slot plus the platform's text for it. The slot is
//! only meaningful immediately after a call reported failure through its
//! return value; capture it before the thread does anything else.

use std::ffi::CStr;
use std::fmt;
use std::io::Error as IoError;

use libc::c_int;

/// Outcome of a wrapped system call.
pub type Result<T> = std::result::Result<T, Errno>;

/// A captured operating-system error code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Errno(c_int);

#[cfg(target_os = "linux")]
fn errno_location() -> *mut c_int {
    unsafe { libc::__errno_location() }
}

#[cfg(any(
    target_os = "android",
    target_os = "netbsd",
    target_os = "openbsd"
))]
fn errno_location() -> *mut c_int {
    unsafe { libc::__errno() }
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
fn errno_location() -> *mut c_int {
    unsafe { libc::__error() }
}

#[cfg(any(target_os = "illumos", target_os = "solaris"))]
fn errno_location() -> *mut c_int {
    unsafe { libc::___errno() }
}

impl Errno {
    pub const fn new(code: c_int) -> Errno {
        Errno(code)
    }

    /// The numeric code as the platform reports it (`ENOENT`, `EACCES`, ...).
    pub const fn code(self) -> c_int {
        self.0
    }

    /// Read the current thread's error slot.
    #[inline]
    pub fn last() -> Errno {
        Errno(unsafe { *errno_location() })
    }

    /// Write this code into the current thread's error slot.
    #[inline]
    pub fn set(self) {
        unsafe { *errno_location() = self.0 };
    }

    /// Reset the current thread's error slot to "no error".
    pub fn clear() {
        Errno(0).set()
    }

    /// The platform's text for this code.
    ///
    /// Codes the platform has no text for come back as `"Unknown error N"`.
    pub fn desc(self) -> String {
        let mut buf = [0 as libc::c_char; 256];
        let ret =
            unsafe { libc::strerror_r(self.0, buf.as_mut_ptr(), buf.len()) };
        if ret == 0 {
            let msg = unsafe { CStr::from_ptr(buf.as_ptr()) };
            msg.to_string_lossy().into_owned()
        } else {
            format!("Unknown error {}", self.0)
        }
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{} (os error {})", self.desc(), self.0)
    }
}

impl std::error::Error for Errno {}

impl From<Errno> for IoError {
    fn from(value: Errno) -> IoError {
        IoError::from_raw_os_error(value.code())
    }
}
