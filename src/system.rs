//! Wrapped system calls.
//!
//! Each binding constructs its adapter once, as a static, and marshals safe
//! argument types onto the raw argument tuple. Argument order is the
//! platform call's own.

use std::ffi::CStr;
use std::os::unix::io::RawFd;

use libc::{c_char, c_int, c_void, size_t, ssize_t};

use crate::errno::Result;
use crate::wrap::{wrap, Wrapped};

type RawSocketFn = unsafe extern "C" fn(c_int, c_int, c_int) -> c_int;
type RawUnlinkFn = unsafe extern "C" fn(*const c_char) -> c_int;
type RawReadFn = unsafe extern "C" fn(c_int, *mut c_void, size_t) -> ssize_t;

static SOCKET: Wrapped<RawSocketFn, RawFd> =
    wrap(libc::socket as RawSocketFn);
static UNLINK: Wrapped<RawUnlinkFn, ()> = wrap(libc::unlink as RawUnlinkFn);
static READ: Wrapped<RawReadFn, usize> = wrap(libc::read as RawReadFn);

/// `socket(2)`: raw and reported types coincide; only the `-1` sentinel
/// needs translating into a failure.
pub fn socket(domain: c_int, ty: c_int, protocol: c_int) -> Result<RawFd> {
    unsafe { SOCKET.call((domain, ty, protocol)) }
}

/// `unlink(2)`: the return value only ever signals success or failure, so
/// success reports nothing.
pub fn unlink(path: &CStr) -> Result<()> {
    unsafe { UNLINK.call((path.as_ptr(),)) }
}

/// `read(2)`: the raw `ssize_t` exists to make room for the error marker;
/// past the sentinel check the count is pure data, reported as `usize`.
///
/// Reads at most `buf.len()` bytes from `fd` into `buf`.
pub fn read(fd: RawFd, buf: &mut [u8]) -> Result<usize> {
    unsafe { READ.call((fd, buf.as_mut_ptr() as *mut c_void, buf.len())) }
}
