use std::{cell::Cell, fmt, mem};

use crate::{
  address::IpAddress,
  error::{Error, OpenError, Result},
  resource::Descriptor,
  sys::{self, RawSocket, SocketKind},
};

/// The state shared by every socket type: an optional owned descriptor and
/// a readiness flag.
///
/// A `Socket` starts out invalid, becomes valid when one of the socket types
/// opens it, and goes back to invalid on [`close`](Self::close) or
/// [`take`](Self::take). Dropping a valid socket closes it.
///
/// The readiness flag is set by [`SocketSet::poll`](super::SocketSet::poll)
/// and cleared by receiving. A `Socket` is `Send` but not `Sync`: a socket and
/// the sets that watch it belong to one thread at a time.
#[derive(Default)]
pub struct Socket {
  desc: Option<Descriptor>,
  ready: Cell<bool>,
}

impl Socket {
  /// Returns an invalid socket.
  pub const fn new() -> Self {
    Self { desc: None, ready: Cell::new(false) }
  }

  /// Returns whether the socket owns an open descriptor.
  pub fn is_valid(&self) -> bool {
    self.desc.is_some()
  }

  /// Returns whether a poll found data waiting since the last receive.
  pub fn is_ready(&self) -> bool {
    self.ready.get()
  }

  /// Closes the socket, if open.
  ///
  /// Shuts the connection down and releases the descriptor. Failures while
  /// releasing are not reported. Closing an invalid socket does nothing.
  pub fn close(&mut self) {
    // Dropping the descriptor releases it.
    self.desc = None;
    self.ready.set(false);
  }

  /// Moves the descriptor and readiness flag out into a new `Socket`,
  /// leaving `self` invalid.
  pub fn take(&mut self) -> Socket {
    mem::take(self)
  }

  /// Returns the local address the socket is bound to.
  ///
  /// Useful after binding port 0, or after a datagram socket's first send,
  /// to learn the port the OS picked.
  pub fn local_address(&self) -> Result<IpAddress> {
    let raw = self.raw().ok_or(Error::State { op: "local_address" })?;
    sys::local_addr(raw).map_err(|err| Error::io("getsockname", err))
  }

  pub(crate) fn raw(&self) -> Option<RawSocket> {
    self.desc.as_ref().map(Descriptor::raw)
  }

  pub(crate) fn mark_ready(&self) {
    self.ready.set(true);
  }

  pub(crate) fn clear_ready(&self) {
    self.ready.set(false);
  }

  /// Fails with [`OpenError::AlreadyOpen`] if the socket is valid.
  pub(crate) fn ensure_closed(&self) -> Result<()> {
    if self.is_valid() {
      return Err(OpenError::AlreadyOpen.into());
    }
    Ok(())
  }

  /// Creates a fresh descriptor of the given kind.
  ///
  /// The descriptor is not installed yet: callers configure it and
  /// [`install`](Self::install) it only once every step succeeded, so a
  /// failure drops (and closes) it.
  pub(crate) fn create(kind: SocketKind) -> Result<Descriptor> {
    sys::socket(kind)
      .map(Descriptor::from_raw)
      .map_err(OpenError::syscall("socket"))
  }

  pub(crate) fn install(&mut self, desc: Descriptor) {
    debug_assert!(self.desc.is_none());
    self.desc = Some(desc);
    self.ready.set(false);
  }

  pub(crate) fn from_descriptor(desc: Descriptor) -> Self {
    Self { desc: Some(desc), ready: Cell::new(false) }
  }
}

impl AsRef<Socket> for Socket {
  fn as_ref(&self) -> &Socket {
    self
  }
}

impl fmt::Debug for Socket {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Socket")
      .field("raw", &self.raw())
      .field("ready", &self.ready.get())
      .finish()
  }
}
