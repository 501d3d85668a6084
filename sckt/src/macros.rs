/// Calls a libc function, mapping a `-1` return to
/// `io::Error::last_os_error()`.
#[cfg(unix)]
macro_rules! syscall {
  ($fn: ident ( $($arg: expr),* $(,)* ) ) => {{
      #[allow(unused_unsafe)]
      let res = unsafe { libc::$fn($($arg, )*) };
      if res == -1 {
          Err(std::io::Error::last_os_error())
      } else {
          Ok(res)
      }
  }};
}

/// Calls a Winsock function, mapping `SOCKET_ERROR` to the thread's
/// `WSAGetLastError()` value.
#[cfg(windows)]
macro_rules! wsa_call {
  ($fn: ident ( $($arg: expr),* $(,)* ) ) => {{
      #[allow(unused_unsafe)]
      let res = unsafe {
        windows_sys::Win32::Networking::WinSock::$fn($($arg, )*)
      };
      if res == windows_sys::Win32::Networking::WinSock::SOCKET_ERROR {
          Err($crate::sys::last_error())
      } else {
          Ok(res)
      }
  }};
}
