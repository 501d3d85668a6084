use std::{io, mem, os::fd::RawFd, ptr, time::Duration};

use super::SocketKind;
use crate::address::IpAddress;

pub(crate) type RawSocket = RawFd;

/// Largest number of descriptors a single `select` can watch.
pub(crate) const MAX_SELECT: usize = libc::FD_SETSIZE as usize;

pub(crate) fn socket(kind: SocketKind) -> io::Result<RawSocket> {
  let ty = match kind {
    SocketKind::Stream => libc::SOCK_STREAM,
    SocketKind::Datagram => libc::SOCK_DGRAM,
  };

  #[cfg(linux)]
  let ty = ty | libc::SOCK_CLOEXEC;

  let fd = syscall!(socket(libc::AF_INET, ty, 0))?;

  // Writes to a peer-closed socket must not raise SIGPIPE.
  #[cfg(apple)]
  if let Err(err) = set_flag(fd, libc::SOL_SOCKET, libc::SO_NOSIGPIPE) {
    let _ = syscall!(close(fd));
    return Err(err);
  }

  Ok(fd)
}

/// Shuts down both directions and closes `fd`.
///
/// Shutdown fails with `ENOTCONN` on listening and unconnected sockets,
/// which is expected and ignored; only the close result is reported.
pub(crate) fn release(fd: RawSocket) -> io::Result<()> {
  let _ = syscall!(shutdown(fd, libc::SHUT_RDWR));
  syscall!(close(fd)).map(drop)
}

fn set_flag(fd: RawSocket, level: libc::c_int, name: libc::c_int) -> io::Result<()> {
  let yes: libc::c_int = 1;
  syscall!(setsockopt(
    fd,
    level,
    name,
    &yes as *const libc::c_int as *const libc::c_void,
    mem::size_of::<libc::c_int>() as libc::socklen_t,
  ))
  .map(drop)
}

pub(crate) fn set_reuse_address(fd: RawSocket) -> io::Result<()> {
  set_flag(fd, libc::SOL_SOCKET, libc::SO_REUSEADDR)
}

pub(crate) fn set_broadcast(fd: RawSocket) -> io::Result<()> {
  set_flag(fd, libc::SOL_SOCKET, libc::SO_BROADCAST)
}

pub(crate) fn set_nodelay(fd: RawSocket) -> io::Result<()> {
  set_flag(fd, libc::IPPROTO_TCP, libc::TCP_NODELAY)
}

pub(crate) fn set_nonblocking(fd: RawSocket, nonblocking: bool) -> io::Result<()> {
  let flags = syscall!(fcntl(fd, libc::F_GETFL))?;
  let flags = if nonblocking {
    flags | libc::O_NONBLOCK
  } else {
    flags & !libc::O_NONBLOCK
  };
  syscall!(fcntl(fd, libc::F_SETFL, flags)).map(drop)
}

pub(crate) fn bind(fd: RawSocket, addr: IpAddress) -> io::Result<()> {
  let sockaddr = into_sockaddr(addr);
  syscall!(bind(
    fd,
    &sockaddr as *const libc::sockaddr_in as *const libc::sockaddr,
    mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
  ))
  .map(drop)
}

pub(crate) fn listen(fd: RawSocket, backlog: i32) -> io::Result<()> {
  syscall!(listen(fd, backlog)).map(drop)
}

pub(crate) fn connect(fd: RawSocket, addr: IpAddress) -> io::Result<()> {
  let sockaddr = into_sockaddr(addr);
  syscall!(connect(
    fd,
    &sockaddr as *const libc::sockaddr_in as *const libc::sockaddr,
    mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
  ))
  .map(drop)
}

pub(crate) fn accept(fd: RawSocket) -> io::Result<RawSocket> {
  let mut storage = SockAddrIn::zeroed();
  let accepted = syscall!(accept(fd, storage.as_mut_ptr(), &mut storage.len))?;

  #[cfg(linux)]
  if let Err(err) = syscall!(fcntl(accepted, libc::F_SETFD, libc::FD_CLOEXEC)) {
    let _ = release(accepted);
    return Err(err);
  }

  Ok(accepted)
}

#[cfg(linux)]
const SEND_FLAGS: libc::c_int = libc::MSG_NOSIGNAL;
#[cfg(not(linux))]
const SEND_FLAGS: libc::c_int = 0;

pub(crate) fn send(fd: RawSocket, buf: &[u8]) -> io::Result<usize> {
  syscall!(send(fd, buf.as_ptr() as *const libc::c_void, buf.len(), SEND_FLAGS))
    .map(|n| n as usize)
}

pub(crate) fn recv(fd: RawSocket, buf: &mut [u8]) -> io::Result<usize> {
  syscall!(recv(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), 0))
    .map(|n| n as usize)
}

pub(crate) fn send_to(
  fd: RawSocket,
  buf: &[u8],
  dest: IpAddress,
) -> io::Result<usize> {
  let sockaddr = into_sockaddr(dest);
  syscall!(sendto(
    fd,
    buf.as_ptr() as *const libc::c_void,
    buf.len(),
    SEND_FLAGS,
    &sockaddr as *const libc::sockaddr_in as *const libc::sockaddr,
    mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
  ))
  .map(|n| n as usize)
}

pub(crate) fn recv_from(
  fd: RawSocket,
  buf: &mut [u8],
) -> io::Result<(usize, IpAddress)> {
  let mut storage = SockAddrIn::zeroed();
  let n = syscall!(recvfrom(
    fd,
    buf.as_mut_ptr() as *mut libc::c_void,
    buf.len(),
    0,
    storage.as_mut_ptr(),
    &mut storage.len,
  ))?;
  Ok((n as usize, storage.into_address()?))
}

pub(crate) fn local_addr(fd: RawSocket) -> io::Result<IpAddress> {
  let mut storage = SockAddrIn::zeroed();
  syscall!(getsockname(fd, storage.as_mut_ptr(), &mut storage.len))?;
  storage.into_address()
}

pub(crate) fn peer_addr(fd: RawSocket) -> io::Result<IpAddress> {
  let mut storage = SockAddrIn::zeroed();
  syscall!(getpeername(fd, storage.as_mut_ptr(), &mut storage.len))?;
  storage.into_address()
}

/// One `select(2)` over `fds` for read readiness.
///
/// Marks `ready[i]` for every readable `fds[i]` (and leaves the other
/// entries alone); returns how many were marked.
pub(crate) fn select_readable(
  fds: &[RawSocket],
  timeout: Duration,
  ready: &mut [bool],
) -> io::Result<usize> {
  debug_assert_eq!(fds.len(), ready.len());

  if let Some(&fd) = fds.iter().find(|&&fd| fd < 0 || fd as usize >= MAX_SELECT) {
    return Err(io::Error::new(
      io::ErrorKind::InvalidInput,
      format!("descriptor {fd} cannot be watched by select"),
    ));
  }

  // SAFETY: fd_set is a plain bit array; all-zero is the empty set.
  let mut read_set: libc::fd_set = unsafe { mem::zeroed() };
  let mut max_fd = 0;
  for &fd in fds {
    // SAFETY: fd is within [0, FD_SETSIZE), checked above.
    unsafe { libc::FD_SET(fd, &mut read_set) };
    max_fd = max_fd.max(fd);
  }

  let mut tv = libc::timeval {
    tv_sec: timeout.as_secs().min(libc::time_t::MAX as u64) as libc::time_t,
    tv_usec: timeout.subsec_micros() as libc::suseconds_t,
  };

  syscall!(select(
    max_fd + 1,
    &mut read_set,
    ptr::null_mut(),
    ptr::null_mut(),
    &mut tv,
  ))?;

  let mut marked = 0;
  for (&fd, flag) in fds.iter().zip(ready.iter_mut()) {
    // SAFETY: same bounds as above; read_set was filled in by select.
    if unsafe { libc::FD_ISSET(fd, &read_set) } {
      *flag = true;
      marked += 1;
    }
  }
  Ok(marked)
}

/// Process-wide state touched by [`NetworkSubsystem`](crate::NetworkSubsystem).
///
/// `SIGPIPE` is only ignored while it still has its default disposition; a
/// handler (or `SIG_IGN`) installed by the application is left in place.
#[derive(Debug)]
pub(crate) struct Startup {
  ignored_sigpipe: bool,
}

fn set_sigpipe(handler: libc::sighandler_t) -> io::Result<libc::sighandler_t> {
  // SAFETY: swaps the disposition for another one; no handler code runs here.
  let previous = unsafe { libc::signal(libc::SIGPIPE, handler) };
  if previous == libc::SIG_ERR {
    return Err(io::Error::last_os_error());
  }
  Ok(previous)
}

pub(crate) fn startup() -> io::Result<Startup> {
  let previous = set_sigpipe(libc::SIG_IGN)?;
  if previous != libc::SIG_DFL {
    set_sigpipe(previous)?;
    return Ok(Startup { ignored_sigpipe: false });
  }
  Ok(Startup { ignored_sigpipe: true })
}

impl Startup {
  pub(crate) fn cleanup(self) -> io::Result<()> {
    if self.ignored_sigpipe {
      set_sigpipe(libc::SIG_DFL)?;
    }
    Ok(())
  }
}

/// A `sockaddr_in` buffer plus its length, for calls that write an address
/// back.
struct SockAddrIn {
  addr: libc::sockaddr_in,
  len: libc::socklen_t,
}

impl SockAddrIn {
  fn zeroed() -> Self {
    Self {
      // SAFETY: sockaddr_in is a C struct of integers; zero is valid.
      addr: unsafe { mem::zeroed() },
      len: mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
    }
  }

  fn as_mut_ptr(&mut self) -> *mut libc::sockaddr {
    &mut self.addr as *mut libc::sockaddr_in as *mut libc::sockaddr
  }

  fn into_address(self) -> io::Result<IpAddress> {
    if self.addr.sin_family != libc::AF_INET as libc::sa_family_t {
      return Err(io::Error::from_raw_os_error(libc::EAFNOSUPPORT));
    }
    Ok(IpAddress::new(
      u32::from_be(self.addr.sin_addr.s_addr),
      u16::from_be(self.addr.sin_port),
    ))
  }
}

fn into_sockaddr(addr: IpAddress) -> libc::sockaddr_in {
  // SAFETY: sockaddr_in is a C struct with primitive integer fields.
  // Zero-initialization is safe - all fields accept zero as a valid value.
  let mut sockaddr: libc::sockaddr_in = unsafe { mem::zeroed() };

  #[cfg(bsd_like)]
  {
    sockaddr.sin_len = mem::size_of::<libc::sockaddr_in>() as u8;
  }
  sockaddr.sin_family = libc::AF_INET as libc::sa_family_t;
  sockaddr.sin_port = addr.port().to_be();
  sockaddr.sin_addr = libc::in_addr { s_addr: addr.host().to_be() };

  sockaddr
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sockaddr_is_network_order() {
    let sockaddr = into_sockaddr(IpAddress::from_octets([10, 1, 2, 3], 0x1234));
    assert_eq!(sockaddr.sin_port.to_ne_bytes(), [0x12, 0x34]);
    assert_eq!(sockaddr.sin_addr.s_addr.to_ne_bytes(), [10, 1, 2, 3]);
  }

  #[test]
  fn select_accepts_unbounded_timeout() {
    let fd = socket(SocketKind::Datagram).unwrap();
    bind(fd, IpAddress::LOCALHOST).unwrap();
    let target = local_addr(fd).unwrap();
    send_to(fd, b"x", target).unwrap();

    let mut ready = [false];
    let marked = select_readable(&[fd], Duration::MAX, &mut ready);
    release(fd).unwrap();
    assert_eq!(marked.unwrap(), 1);
    assert!(ready[0]);
  }

  #[test]
  fn select_rejects_out_of_range_descriptor() {
    let mut ready = [false];
    let err =
      select_readable(&[MAX_SELECT as RawSocket], Duration::ZERO, &mut ready)
        .unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    assert!(!ready[0]);
  }
}
