//! Platform layer: thin, descriptor-level wrappers over BSD sockets and
//! Winsock.
//!
//! Nothing in here owns a descriptor; ownership lives in
//! [`Descriptor`](crate::resource::Descriptor). Every function performs a
//! single system call attempt and reports failure as [`io::Error`]; retrying
//! interrupted calls is the caller's business, through
//! [`retry_interrupted`].

use std::io;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub(crate) use unix::*;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub(crate) use windows::*;

#[cfg(not(any(unix, windows)))]
compile_error!("sckt supports Unix-like systems and Windows only");

/// Kind of socket to create. Always `AF_INET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SocketKind {
  Stream,
  Datagram,
}

/// Runs `f` until it completes with anything other than
/// [`io::ErrorKind::Interrupted`].
///
/// A signal landing during a blocking call is not a failure of the call, so
/// the call is simply reissued. The loop is bounded only by how often the OS
/// interrupts it.
pub(crate) fn retry_interrupted<T>(
  op: &'static str,
  mut f: impl FnMut() -> io::Result<T>,
) -> io::Result<T> {
  loop {
    match f() {
      Err(err) if err.kind() == io::ErrorKind::Interrupted => {
        tracing::trace!(op, "interrupted system call, retrying");
      }
      res => return res,
    }
  }
}
