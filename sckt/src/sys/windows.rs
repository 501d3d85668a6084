use std::{io, mem, ptr, time::Duration};

use windows_sys::Win32::Networking::WinSock::{
  self, AF_INET, FD_SET, FIONBIO, INVALID_SOCKET, IN_ADDR, IN_ADDR_0,
  IPPROTO_TCP, SD_BOTH, SO_BROADCAST, SO_REUSEADDR, SOCK_DGRAM, SOCK_STREAM,
  SOCKADDR, SOCKADDR_IN, SOCKET, SOL_SOCKET, TCP_NODELAY, TIMEVAL, WSADATA,
  WSAEINPROGRESS,
};

use super::SocketKind;
use crate::address::IpAddress;

pub(crate) type RawSocket = SOCKET;

/// Winsock's `FD_SETSIZE`: the capacity of `FD_SET::fd_array`.
pub(crate) const MAX_SELECT: usize = 64;

pub(crate) fn last_error() -> io::Error {
  // SAFETY: reads thread-local Winsock state.
  io::Error::from_raw_os_error(unsafe { WinSock::WSAGetLastError() })
}

pub(crate) fn socket(kind: SocketKind) -> io::Result<RawSocket> {
  let ty = match kind {
    SocketKind::Stream => SOCK_STREAM,
    SocketKind::Datagram => SOCK_DGRAM,
  };
  // SAFETY: plain socket(2) equivalent.
  let socket = unsafe { WinSock::socket(AF_INET as i32, ty, 0) };
  if socket == INVALID_SOCKET {
    return Err(last_error());
  }
  Ok(socket)
}

/// Orderly close: shutdown both directions, then `closesocket`.
pub(crate) fn release(socket: RawSocket) -> io::Result<()> {
  let _ = wsa_call!(shutdown(socket, SD_BOTH));
  wsa_call!(closesocket(socket)).map(drop)
}

fn set_flag(socket: RawSocket, level: i32, name: i32) -> io::Result<()> {
  let yes: i32 = 1;
  wsa_call!(setsockopt(
    socket,
    level,
    name,
    &yes as *const i32 as *const u8,
    mem::size_of::<i32>() as i32,
  ))
  .map(drop)
}

pub(crate) fn set_reuse_address(socket: RawSocket) -> io::Result<()> {
  set_flag(socket, SOL_SOCKET, SO_REUSEADDR)
}

pub(crate) fn set_broadcast(socket: RawSocket) -> io::Result<()> {
  set_flag(socket, SOL_SOCKET, SO_BROADCAST)
}

pub(crate) fn set_nodelay(socket: RawSocket) -> io::Result<()> {
  set_flag(socket, IPPROTO_TCP, TCP_NODELAY)
}

pub(crate) fn set_nonblocking(socket: RawSocket, nonblocking: bool) -> io::Result<()> {
  let mut mode: u32 = nonblocking.into();
  wsa_call!(ioctlsocket(socket, FIONBIO, &mut mode)).map(drop)
}

pub(crate) fn bind(socket: RawSocket, addr: IpAddress) -> io::Result<()> {
  let sockaddr = into_sockaddr(addr);
  wsa_call!(bind(
    socket,
    &sockaddr as *const SOCKADDR_IN as *const SOCKADDR,
    mem::size_of::<SOCKADDR_IN>() as i32,
  ))
  .map(drop)
}

pub(crate) fn listen(socket: RawSocket, backlog: i32) -> io::Result<()> {
  wsa_call!(listen(socket, backlog)).map(drop)
}

pub(crate) fn connect(socket: RawSocket, addr: IpAddress) -> io::Result<()> {
  let sockaddr = into_sockaddr(addr);
  wsa_call!(connect(
    socket,
    &sockaddr as *const SOCKADDR_IN as *const SOCKADDR,
    mem::size_of::<SOCKADDR_IN>() as i32,
  ))
  .map(drop)
}

pub(crate) fn accept(socket: RawSocket) -> io::Result<RawSocket> {
  let mut storage = SockAddrIn::zeroed();
  // SAFETY: storage is a valid SOCKADDR_IN with its length.
  let accepted = unsafe {
    WinSock::accept(socket, storage.as_mut_ptr(), &mut storage.len)
  };
  if accepted == INVALID_SOCKET {
    return Err(last_error());
  }
  Ok(accepted)
}

fn clamp_len(len: usize) -> i32 {
  len.min(i32::MAX as usize) as i32
}

pub(crate) fn send(socket: RawSocket, buf: &[u8]) -> io::Result<usize> {
  wsa_call!(send(socket, buf.as_ptr(), clamp_len(buf.len()), 0))
    .map(|n| n as usize)
}

pub(crate) fn recv(socket: RawSocket, buf: &mut [u8]) -> io::Result<usize> {
  wsa_call!(recv(socket, buf.as_mut_ptr(), clamp_len(buf.len()), 0))
    .map(|n| n as usize)
}

pub(crate) fn send_to(
  socket: RawSocket,
  buf: &[u8],
  dest: IpAddress,
) -> io::Result<usize> {
  let sockaddr = into_sockaddr(dest);
  wsa_call!(sendto(
    socket,
    buf.as_ptr(),
    clamp_len(buf.len()),
    0,
    &sockaddr as *const SOCKADDR_IN as *const SOCKADDR,
    mem::size_of::<SOCKADDR_IN>() as i32,
  ))
  .map(|n| n as usize)
}

pub(crate) fn recv_from(
  socket: RawSocket,
  buf: &mut [u8],
) -> io::Result<(usize, IpAddress)> {
  let mut storage = SockAddrIn::zeroed();
  let n = wsa_call!(recvfrom(
    socket,
    buf.as_mut_ptr(),
    clamp_len(buf.len()),
    0,
    storage.as_mut_ptr(),
    &mut storage.len,
  ))?;
  Ok((n as usize, storage.into_address()))
}

pub(crate) fn local_addr(socket: RawSocket) -> io::Result<IpAddress> {
  let mut storage = SockAddrIn::zeroed();
  wsa_call!(getsockname(socket, storage.as_mut_ptr(), &mut storage.len))?;
  Ok(storage.into_address())
}

pub(crate) fn peer_addr(socket: RawSocket) -> io::Result<IpAddress> {
  let mut storage = SockAddrIn::zeroed();
  wsa_call!(getpeername(socket, storage.as_mut_ptr(), &mut storage.len))?;
  Ok(storage.into_address())
}

/// One `select` over `sockets` for read readiness.
///
/// Winsock's `FD_SET` is a counted array rather than a bitmap, so membership
/// is tested by scanning what select left in it.
pub(crate) fn select_readable(
  sockets: &[RawSocket],
  timeout: Duration,
  ready: &mut [bool],
) -> io::Result<usize> {
  debug_assert_eq!(sockets.len(), ready.len());

  if sockets.len() > MAX_SELECT {
    return Err(io::Error::new(
      io::ErrorKind::InvalidInput,
      "too many sockets for a single select",
    ));
  }

  let mut read_set = FD_SET { fd_count: 0, fd_array: [0; MAX_SELECT] };
  for &socket in sockets {
    read_set.fd_array[read_set.fd_count as usize] = socket;
    read_set.fd_count += 1;
  }

  let tv = TIMEVAL {
    tv_sec: timeout.as_secs().min(i32::MAX as u64) as i32,
    tv_usec: timeout.subsec_micros() as i32,
  };

  // The first argument is ignored by Winsock.
  wsa_call!(select(0, &mut read_set, ptr::null_mut(), ptr::null_mut(), &tv))?;

  let selected = &read_set.fd_array[..read_set.fd_count as usize];
  let mut marked = 0;
  for (socket, flag) in sockets.iter().zip(ready.iter_mut()) {
    if selected.contains(socket) {
      *flag = true;
      marked += 1;
    }
  }
  Ok(marked)
}

/// Winsock 2.2 registration held by
/// [`NetworkSubsystem`](crate::NetworkSubsystem).
#[derive(Debug)]
pub(crate) struct Startup(());

pub(crate) fn startup() -> io::Result<Startup> {
  // SAFETY: WSADATA is plain data; WSAStartup fills it in.
  let mut data: WSADATA = unsafe { mem::zeroed() };
  // SAFETY: data is valid for writes.
  let res = unsafe { WinSock::WSAStartup(0x0202, &mut data) };
  if res != 0 {
    return Err(io::Error::from_raw_os_error(res));
  }
  Ok(Startup(()))
}

impl Startup {
  pub(crate) fn cleanup(self) -> io::Result<()> {
    match wsa_call!(WSACleanup()) {
      Err(err) if err.raw_os_error() == Some(WSAEINPROGRESS) => {
        // A blocking call is still in flight on this thread; cancel it and
        // try once more.
        // SAFETY: both calls only touch Winsock's own state.
        unsafe { WinSock::WSACancelBlockingCall() };
        wsa_call!(WSACleanup()).map(drop)
      }
      res => res.map(drop),
    }
  }
}

struct SockAddrIn {
  addr: SOCKADDR_IN,
  len: i32,
}

impl SockAddrIn {
  fn zeroed() -> Self {
    Self {
      // SAFETY: SOCKADDR_IN is plain data; zero is valid.
      addr: unsafe { mem::zeroed() },
      len: mem::size_of::<SOCKADDR_IN>() as i32,
    }
  }

  fn as_mut_ptr(&mut self) -> *mut SOCKADDR {
    &mut self.addr as *mut SOCKADDR_IN as *mut SOCKADDR
  }

  fn into_address(self) -> IpAddress {
    // SAFETY: every variant of the IN_ADDR union is the same four bytes.
    let s_addr = unsafe { self.addr.sin_addr.S_un.S_addr };
    IpAddress::new(u32::from_be(s_addr), u16::from_be(self.addr.sin_port))
  }
}

fn into_sockaddr(addr: IpAddress) -> SOCKADDR_IN {
  SOCKADDR_IN {
    sin_family: AF_INET,
    sin_port: addr.port().to_be(),
    sin_addr: IN_ADDR { S_un: IN_ADDR_0 { S_addr: addr.host().to_be() } },
    sin_zero: [0; 8],
  }
}
