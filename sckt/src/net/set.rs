use std::{fmt, ptr, time::Duration};

use crate::{
  error::{CapacityError, Error, Result},
  sys::{self, RawSocket, retry_interrupted},
};

use super::socket::Socket;

/// A bounded group of sockets polled together for read readiness.
///
/// The set borrows its members; it never owns or closes them. Because of
/// the borrow, a registered socket can be neither closed, reopened nor
/// dropped until the set is gone, so a poll never sees a stale descriptor.
///
/// Members are polled in insertion order. A poll sets the readiness flag of
/// every member that has data waiting (see [`Socket::is_ready`]); only a
/// receive clears it again.
///
/// # Examples
///
/// ```rust,no_run
/// use std::time::Duration;
/// use sckt::net::{SocketSet, UdpSocket};
///
/// fn wait_for_either(a: &UdpSocket, b: &UdpSocket) -> sckt::Result<()> {
///     let mut set = SocketSet::new(2)?;
///     set.add(a)?;
///     set.add(b)?;
///
///     while !set.poll(Duration::from_secs(1))? {}
///
///     let mut buf = [0u8; 512];
///     for socket in [a, b] {
///         if socket.is_ready() {
///             let (n, from) = socket.receive_from(&mut buf)?;
///             println!("{n} bytes from {from}");
///         }
///     }
///     Ok(())
/// }
/// ```
pub struct SocketSet<'a> {
  capacity: usize,
  members: Vec<&'a Socket>,
}

impl<'a> SocketSet<'a> {
  /// Largest capacity a set can have: the platform's `FD_SETSIZE`.
  pub const MAX_CAPACITY: usize = sys::MAX_SELECT;

  /// Creates an empty set with room for `capacity` sockets.
  ///
  /// Fails with [`CapacityError::TooLarge`] above
  /// [`MAX_CAPACITY`](Self::MAX_CAPACITY).
  pub fn new(capacity: usize) -> Result<Self> {
    if capacity > Self::MAX_CAPACITY {
      return Err(
        CapacityError::TooLarge {
          requested: capacity,
          maximum: Self::MAX_CAPACITY,
        }
        .into(),
      );
    }
    Ok(Self { capacity, members: Vec::with_capacity(capacity) })
  }

  /// Registers `socket`.
  ///
  /// Adding a socket that is already a member does nothing. Fails with
  /// [`CapacityError::Full`] when the set is full and with
  /// [`Error::State`] when the socket is not open.
  pub fn add<S>(&mut self, socket: &'a S) -> Result<()>
  where
    S: AsRef<Socket> + ?Sized,
  {
    let socket = socket.as_ref();
    if self.contains(socket) {
      return Ok(());
    }
    if self.members.len() == self.capacity {
      return Err(CapacityError::Full { capacity: self.capacity }.into());
    }
    if !socket.is_valid() {
      return Err(Error::State { op: "SocketSet::add" });
    }
    self.members.push(socket);
    Ok(())
  }

  /// Unregisters `socket`, keeping the other members in order.
  ///
  /// Does nothing if `socket` is not a member. Does not close it.
  pub fn remove<S>(&mut self, socket: &S)
  where
    S: AsRef<Socket> + ?Sized,
  {
    let socket = socket.as_ref();
    if let Some(index) = self.members.iter().position(|m| ptr::eq(*m, socket)) {
      self.members.remove(index);
    }
  }

  /// Returns whether `socket` is a member.
  pub fn contains<S>(&self, socket: &S) -> bool
  where
    S: AsRef<Socket> + ?Sized,
  {
    let socket = socket.as_ref();
    self.members.iter().any(|m| ptr::eq(*m, socket))
  }

  pub fn len(&self) -> usize {
    self.members.len()
  }

  pub fn is_empty(&self) -> bool {
    self.members.is_empty()
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Waits up to `timeout` for any member to become readable.
  ///
  /// Marks every readable member ready and returns whether there was at
  /// least one. Members that are not readable keep whatever flag they had.
  /// A zero timeout checks without blocking; an empty set returns `false`
  /// at once. Interrupted waits are restarted with the full timeout.
  pub fn poll(&self, timeout: Duration) -> Result<bool> {
    if self.members.is_empty() {
      return Ok(false);
    }

    let raws = self
      .members
      .iter()
      .map(|m| m.raw().ok_or(Error::State { op: "SocketSet::poll" }))
      .collect::<Result<Vec<RawSocket>>>()?;
    let mut ready = vec![false; raws.len()];

    let marked = retry_interrupted("select", || {
      sys::select_readable(&raws, timeout, &mut ready)
    })
    .map_err(|err| Error::io("select", err))?;

    for (member, _) in self.members.iter().zip(&ready).filter(|(_, r)| **r) {
      member.mark_ready();
    }

    tracing::trace!(members = raws.len(), ready = marked, "polled socket set");
    Ok(marked > 0)
  }
}

impl fmt::Debug for SocketSet<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SocketSet")
      .field("capacity", &self.capacity)
      .field("members", &self.members)
      .finish()
  }
}
