use std::fmt;

use crate::{
  address::IpAddress,
  error::{Error, OpenError, Result},
  sys::{self, SocketKind, retry_interrupted},
};

use super::socket::Socket;

/// A UDP socket.
///
/// Each [`send_to`](Self::send_to) is one datagram and each
/// [`receive_from`](Self::receive_from) returns one datagram; nothing is
/// split, merged or retried on a short count.
///
/// # Examples
///
/// ```rust,no_run
/// use sckt::{IpAddress, net::UdpSocket};
///
/// fn echo_once() -> sckt::Result<()> {
///     let socket = UdpSocket::bind(9000)?;
///     let mut buf = [0u8; 1500];
///     let (n, sender) = socket.receive_from(&mut buf)?;
///     socket.send_to(&buf[..n], sender)?;
///     Ok(())
/// }
/// ```
#[derive(Default)]
pub struct UdpSocket {
  socket: Socket,
}

impl UdpSocket {
  /// Returns a socket that is not open yet.
  pub const fn new() -> Self {
    Self { socket: Socket::new() }
  }

  /// Opens a UDP socket. See [`open`](Self::open).
  pub fn bind(port: u16) -> Result<Self> {
    let mut socket = Self::new();
    socket.open(port)?;
    Ok(socket)
  }

  /// Opens the socket, bound to `port` on every local interface.
  ///
  /// Port 0 leaves the socket unbound; the OS assigns an ephemeral port on
  /// the first send. Broadcasting is enabled.
  ///
  /// Fails with [`OpenError::AlreadyOpen`] if the socket is open (which is
  /// then left untouched); any other failure closes the half-built socket.
  pub fn open(&mut self, port: u16) -> Result<()> {
    self.socket.ensure_closed()?;

    let desc = Socket::create(SocketKind::Datagram)?;
    if port != 0 {
      sys::bind(desc.raw(), IpAddress::ANY.with_port(port))
        .map_err(OpenError::syscall("bind"))?;
    }
    sys::set_broadcast(desc.raw()).map_err(OpenError::syscall("setsockopt"))?;

    tracing::debug!(socket = ?desc.raw(), port, "opened datagram socket");
    self.socket.install(desc);
    Ok(())
  }

  /// Sends `bytes` as one datagram to `destination`.
  ///
  /// Returns how many bytes the OS accepted, which for a datagram socket is
  /// normally all of them.
  pub fn send_to(&self, bytes: &[u8], destination: IpAddress) -> Result<usize> {
    let raw = self.socket.raw().ok_or_else(|| Error::not_connected("sendto"))?;

    retry_interrupted("sendto", || sys::send_to(raw, bytes, destination))
      .map_err(|err| Error::io("sendto", err))
  }

  /// Receives one datagram into `buf`, blocking until one arrives.
  ///
  /// Returns the number of bytes stored and the sender's address. A
  /// datagram longer than `buf` is truncated. The readiness flag is cleared
  /// first, even if the receive then fails.
  pub fn receive_from(&self, buf: &mut [u8]) -> Result<(usize, IpAddress)> {
    self.socket.clear_ready();
    let raw =
      self.socket.raw().ok_or_else(|| Error::not_connected("recvfrom"))?;

    retry_interrupted("recvfrom", || sys::recv_from(raw, &mut *buf))
      .map_err(|err| Error::io("recvfrom", err))
  }

  /// Closes the socket. See [`Socket::close`].
  pub fn close(&mut self) {
    self.socket.close();
  }

  /// Moves the socket out, leaving `self` closed.
  pub fn take(&mut self) -> UdpSocket {
    UdpSocket { socket: self.socket.take() }
  }
}

impl std::ops::Deref for UdpSocket {
  type Target = Socket;

  fn deref(&self) -> &Socket {
    &self.socket
  }
}

impl AsRef<Socket> for UdpSocket {
  fn as_ref(&self) -> &Socket {
    &self.socket
  }
}

impl fmt::Debug for UdpSocket {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("UdpSocket").field(&self.socket).finish()
  }
}
