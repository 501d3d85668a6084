//! Ownership of OS socket descriptors.
//!
//! A [`Descriptor`] is the single owner of one open socket (a file descriptor
//! on Unix, a `SOCKET` on Windows). It cannot be cloned; dropping it releases
//! the socket. Everything that hands out a descriptor to the OS borrows it
//! through [`Descriptor::raw`].
//!
//! Partially built sockets are held in a `Descriptor` from the moment the OS
//! returns them, so any `?` on the way to a fully configured socket closes
//! it instead of leaking it.

use std::fmt;

use crate::sys::{self, RawSocket};

/// An owned, open OS socket.
pub(crate) struct Descriptor {
  raw: RawSocket,
}

impl Descriptor {
  /// Takes ownership of `raw`.
  ///
  /// `raw` must be an open socket that nothing else will close.
  pub(crate) fn from_raw(raw: RawSocket) -> Self {
    Self { raw }
  }

  pub(crate) fn raw(&self) -> RawSocket {
    self.raw
  }
}

impl Drop for Descriptor {
  /// Releases the socket. Release is best-effort: a failure here is logged
  /// and otherwise ignored.
  fn drop(&mut self) {
    match sys::release(self.raw) {
      Ok(()) => tracing::debug!(socket = ?self.raw, "closed socket"),
      Err(err) => {
        tracing::warn!(socket = ?self.raw, error = %err, "failed to close socket")
      }
    }
  }
}

impl fmt::Debug for Descriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Descriptor").field(&self.raw).finish()
  }
}
