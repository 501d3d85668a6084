#![allow(dead_code)]

use std::{sync::OnceLock, time::Duration};

use sckt::{
  IpAddress, NetworkSubsystem,
  net::{Socket, SocketSet, UdpSocket},
};
use tracing_subscriber::EnvFilter;

static NET: OnceLock<NetworkSubsystem> = OnceLock::new();

/// Starts networking once for the whole test binary and installs a test
/// subscriber (`RUST_LOG=sckt=trace` to see socket events).
pub fn init() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();

  NET.get_or_init(|| {
    NetworkSubsystem::start().expect("Failed to start network subsystem")
  });
}

/// Loopback address of the port `socket` is bound to.
pub fn loopback_of<S: AsRef<Socket>>(socket: &S) -> IpAddress {
  let port = socket
    .as_ref()
    .local_address()
    .expect("Failed to read local address")
    .port();
  IpAddress::LOCALHOST.with_port(port)
}

/// Polls `set` until something is ready, for at most five seconds.
pub fn wait_ready(set: &SocketSet<'_>) {
  for _ in 0..100 {
    if set.poll(Duration::from_millis(50)).expect("Failed to poll") {
      return;
    }
  }
  panic!("nothing became ready within 5s");
}

/// Opens a UDP socket bound to a free port. Port 0 would leave it unbound.
pub fn bound_udp() -> UdpSocket {
  for _ in 0..32 {
    let port = fastrand::u16(20_000..60_000);
    if let Ok(socket) = UdpSocket::bind(port) {
      return socket;
    }
  }
  panic!("no free UDP port found");
}
