//! Checked wrappers over errno-reporting system calls.
//!
//! Calls in the libc convention report failure through a reserved return
//! value and leave the reason in a thread-local error slot. The [`wrap()`]
//! adapter turns such a callable into one returning `Result`: the sentinel
//! becomes an [`Errno`] failure carrying the code the call set, anything
//! else a success converted to the declared reported type ([`FromRaw`]),
//! or to `()` when the return value never carried data in the first place.
//!
//! [`system`] binds the adapter to a few real calls; the `syswrap` binary
//! demonstrates catching and logging a failure from one of them.

pub mod errno;
pub mod system;
pub mod wrap;

pub use errno::{Errno, Result};
pub use wrap::{check, wrap, FromRaw, RawCall, Sentinel, Wrapped};
