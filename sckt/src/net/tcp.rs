use std::{fmt, io};

use crate::{
  address::IpAddress,
  error::{Error, OpenError, Result},
  resource::Descriptor,
  sys::{self, SocketKind, retry_interrupted},
};

use super::socket::Socket;

/// Pending-connection queue length for [`TcpListener`].
const LISTEN_BACKLOG: i32 = 5;

/// A listening TCP socket.
///
/// The listener is non-blocking: [`accept`](Self::accept) returns at once
/// whether or not a client is waiting. Put the listener in a
/// [`SocketSet`](super::SocketSet) and accept when the set reports it ready.
///
/// # Examples
///
/// ```rust,no_run
/// use std::time::Duration;
/// use sckt::net::{SocketSet, TcpListener};
///
/// fn serve_one() -> sckt::Result<()> {
///     let listener = TcpListener::bind(8080, true)?;
///     let mut set = SocketSet::new(1)?;
///     set.add(&listener)?;
///
///     loop {
///         if set.poll(Duration::from_millis(100))? {
///             if let Some(client) = listener.accept()? {
///                 client.send(b"hello\n")?;
///                 return Ok(());
///             }
///         }
///     }
/// }
/// ```
#[derive(Default)]
pub struct TcpListener {
  socket: Socket,
  disable_nagle: bool,
}

impl TcpListener {
  /// Returns a listener that is not open yet.
  pub const fn new() -> Self {
    Self { socket: Socket::new(), disable_nagle: false }
  }

  /// Opens a listener on `port` of every local interface.
  ///
  /// See [`open`](Self::open).
  pub fn bind(port: u16, disable_nagle: bool) -> Result<Self> {
    let mut listener = Self::new();
    listener.open(port, disable_nagle)?;
    Ok(listener)
  }

  /// Starts listening on `port` of every local interface.
  ///
  /// The socket allows local address reuse, has a backlog of 5 and is put in
  /// non-blocking mode. When `disable_nagle` is set, every accepted socket
  /// gets `TCP_NODELAY`.
  ///
  /// Fails with [`OpenError::AlreadyOpen`] if the listener is open (which is
  /// then left untouched); any other failure closes the half-built socket.
  pub fn open(&mut self, port: u16, disable_nagle: bool) -> Result<()> {
    self.socket.ensure_closed()?;

    let desc = Socket::create(SocketKind::Stream)?;
    let raw = desc.raw();

    sys::set_reuse_address(raw).map_err(OpenError::syscall("setsockopt"))?;
    sys::bind(raw, IpAddress::ANY.with_port(port))
      .map_err(OpenError::syscall("bind"))?;
    sys::listen(raw, LISTEN_BACKLOG).map_err(OpenError::syscall("listen"))?;
    sys::set_nonblocking(raw, true).map_err(OpenError::syscall("set_nonblocking"))?;

    tracing::debug!(socket = ?raw, port, disable_nagle, "listening");
    self.disable_nagle = disable_nagle;
    self.socket.install(desc);
    Ok(())
  }

  /// Accepts a pending connection, if there is one.
  ///
  /// Returns `Ok(None)` when no client is waiting. An accepted socket is in
  /// blocking mode and, if the listener was opened with `disable_nagle`, has
  /// `TCP_NODELAY` set. Clears the listener's readiness flag.
  ///
  /// Fails with [`OpenError::NotOpen`] if the listener is not open.
  pub fn accept(&self) -> Result<Option<TcpSocket>> {
    let raw = self.socket.raw().ok_or(OpenError::NotOpen)?;
    self.socket.clear_ready();

    let accepted = match retry_interrupted("accept", || sys::accept(raw)) {
      Ok(accepted) => Descriptor::from_raw(accepted),
      Err(err) if is_not_pending(&err) => return Ok(None),
      Err(err) => return Err(OpenError::syscall("accept")(err)),
    };

    // BSD-derived stacks hand the listener's O_NONBLOCK down to the
    // accepted socket.
    sys::set_nonblocking(accepted.raw(), false)
      .map_err(OpenError::syscall("set_nonblocking"))?;
    if self.disable_nagle {
      sys::set_nodelay(accepted.raw()).map_err(OpenError::syscall("setsockopt"))?;
    }

    tracing::debug!(listener = ?raw, socket = ?accepted.raw(), "accepted connection");
    Ok(Some(TcpSocket { socket: Socket::from_descriptor(accepted) }))
  }

  /// Returns whether accepted sockets get `TCP_NODELAY`.
  pub fn disables_nagle(&self) -> bool {
    self.disable_nagle
  }

  /// Stops listening. See [`Socket::close`].
  pub fn close(&mut self) {
    self.socket.close();
  }
}

/// A connection that went away between readiness and `accept` is as good as
/// no connection at all.
fn is_not_pending(err: &io::Error) -> bool {
  matches!(
    err.kind(),
    io::ErrorKind::WouldBlock | io::ErrorKind::ConnectionAborted
  )
}

impl std::ops::Deref for TcpListener {
  type Target = Socket;

  fn deref(&self) -> &Socket {
    &self.socket
  }
}

impl AsRef<Socket> for TcpListener {
  fn as_ref(&self) -> &Socket {
    &self.socket
  }
}

impl fmt::Debug for TcpListener {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TcpListener")
      .field("socket", &self.socket)
      .field("disable_nagle", &self.disable_nagle)
      .finish()
  }
}

/// A connected TCP stream socket.
///
/// Sends and receives block the calling thread. Framing is up to the caller:
/// the bytes of one [`send`](Self::send) may arrive over several
/// [`receive`](Self::receive) calls.
///
/// # Examples
///
/// ```rust,no_run
/// use sckt::{IpAddress, net::TcpSocket};
///
/// fn fetch() -> sckt::Result<Vec<u8>> {
///     let addr = IpAddress::resolve("example.com", 80)?;
///     let socket = TcpSocket::connect(addr, true)?;
///     socket.send(b"GET / HTTP/1.0\r\nHost: example.com\r\n\r\n")?;
///
///     let mut response = Vec::new();
///     let mut buf = [0u8; 4096];
///     loop {
///         let n = socket.receive(&mut buf)?;
///         if n == 0 {
///             break;
///         }
///         response.extend_from_slice(&buf[..n]);
///     }
///     Ok(response)
/// }
/// ```
#[derive(Default)]
pub struct TcpSocket {
  socket: Socket,
}

impl TcpSocket {
  /// Returns a socket that is not connected yet.
  pub const fn new() -> Self {
    Self { socket: Socket::new() }
  }

  /// Connects to `address`. See [`open`](Self::open).
  pub fn connect(address: IpAddress, disable_nagle: bool) -> Result<Self> {
    let mut socket = Self::new();
    socket.open(address, disable_nagle)?;
    Ok(socket)
  }

  /// Connects to `address`, blocking until the connection is established
  /// or refused.
  ///
  /// Fails with [`OpenError::AlreadyOpen`] if the socket is open (which is
  /// then left untouched); any other failure closes the half-built socket.
  pub fn open(&mut self, address: IpAddress, disable_nagle: bool) -> Result<()> {
    self.socket.ensure_closed()?;

    let desc = Socket::create(SocketKind::Stream)?;
    sys::connect(desc.raw(), address).map_err(OpenError::syscall("connect"))?;
    if disable_nagle {
      sys::set_nodelay(desc.raw()).map_err(OpenError::syscall("setsockopt"))?;
    }

    tracing::debug!(socket = ?desc.raw(), %address, "connected");
    self.socket.install(desc);
    Ok(())
  }

  /// Sets `TCP_NODELAY`, so small writes go out without waiting to be
  /// batched.
  pub fn disable_nagle(&self) -> Result<()> {
    let raw = self.socket.raw().ok_or(Error::State { op: "disable_nagle" })?;
    sys::set_nodelay(raw).map_err(|err| Error::io("setsockopt", err))
  }

  /// Sends all of `bytes`.
  ///
  /// Keeps writing until every byte has been handed to the OS; partial
  /// writes are continued and interrupted writes are reissued. Returns
  /// `bytes.len()`. Any other failure aborts with [`Error::Io`], in which case
  /// an unknown prefix of `bytes` may already have been sent. An OS that
  /// accepts nothing for a non-empty write fails with
  /// [`io::ErrorKind::WriteZero`].
  pub fn send(&self, bytes: &[u8]) -> Result<usize> {
    let raw = self.socket.raw().ok_or_else(|| Error::not_connected("send"))?;

    send_all(bytes, |rest| retry_interrupted("send", || sys::send(raw, rest)))
      .map_err(|err| Error::io("send", err))
  }

  /// Receives into `buf`, blocking until something arrives.
  ///
  /// Returns the number of bytes read. `Ok(0)` means the peer closed the
  /// connection; it is not an error, but nothing more will arrive.
  ///
  /// The readiness flag is cleared first, even if the receive then fails.
  /// An empty `buf` is rejected with [`io::ErrorKind::InvalidInput`] before
  /// anything else happens, so `Ok(0)` always means end of stream.
  pub fn receive(&self, buf: &mut [u8]) -> Result<usize> {
    if buf.is_empty() {
      return Err(Error::io("recv", io::ErrorKind::InvalidInput.into()));
    }
    self.socket.clear_ready();
    let raw = self.socket.raw().ok_or_else(|| Error::not_connected("recv"))?;

    retry_interrupted("recv", || sys::recv(raw, &mut *buf))
      .map_err(|err| Error::io("recv", err))
  }

  /// Returns the address of the connected peer.
  pub fn peer_address(&self) -> Result<IpAddress> {
    let raw = self.socket.raw().ok_or(Error::State { op: "peer_address" })?;
    sys::peer_addr(raw).map_err(|err| Error::io("getpeername", err))
  }

  /// Closes the connection. See [`Socket::close`].
  pub fn close(&mut self) {
    self.socket.close();
  }

  /// Moves the connection out, leaving `self` closed.
  pub fn take(&mut self) -> TcpSocket {
    TcpSocket { socket: self.socket.take() }
  }
}

/// Feeds `bytes` to `write` until all of it is taken.
fn send_all(
  bytes: &[u8],
  mut write: impl FnMut(&[u8]) -> io::Result<usize>,
) -> io::Result<usize> {
  let mut sent = 0;
  while sent < bytes.len() {
    match write(&bytes[sent..])? {
      0 => return Err(io::ErrorKind::WriteZero.into()),
      n => sent += n,
    }
  }
  Ok(sent)
}

impl std::ops::Deref for TcpSocket {
  type Target = Socket;

  fn deref(&self) -> &Socket {
    &self.socket
  }
}

impl AsRef<Socket> for TcpSocket {
  fn as_ref(&self) -> &Socket {
    &self.socket
  }
}

impl fmt::Debug for TcpSocket {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("TcpSocket").field(&self.socket).finish()
  }
}
