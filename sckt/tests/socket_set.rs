mod common;

use std::time::{Duration, Instant};

use sckt::{
  CapacityError, Error, ErrorKind,
  net::{SocketSet, TcpListener, UdpSocket},
};

fn udp() -> UdpSocket {
  UdpSocket::bind(0).expect("Failed to open UDP socket")
}

#[test]
fn test_set_capacity_limits() {
  common::init();
  let err = SocketSet::new(SocketSet::MAX_CAPACITY + 1).unwrap_err();
  assert!(matches!(err, Error::Capacity(CapacityError::TooLarge { .. })));
  assert!(SocketSet::new(SocketSet::MAX_CAPACITY).is_ok());

  let (a, b, c) = (udp(), udp(), udp());
  let mut set = SocketSet::new(2).unwrap();
  set.add(&a).unwrap();
  set.add(&b).unwrap();

  let err = set.add(&c).unwrap_err();
  assert!(matches!(err, Error::Capacity(CapacityError::Full { capacity: 2 })));
  assert_eq!(set.len(), 2);
  assert!(!set.contains(&c));
}

#[test]
fn test_set_add_is_idempotent() {
  common::init();
  let a = udp();
  let mut set = SocketSet::new(1).unwrap();
  set.add(&a).unwrap();
  set.add(&a).expect("re-adding a member must not fail on a full set");
  assert_eq!(set.len(), 1);
}

#[test]
fn test_set_rejects_closed_socket() {
  common::init();
  let closed = UdpSocket::new();
  let mut set = SocketSet::new(4).unwrap();
  assert_eq!(set.add(&closed).unwrap_err().kind(), ErrorKind::State);
  assert!(set.is_empty());
}

#[test]
fn test_set_remove() {
  common::init();
  let (a, b, c) = (udp(), udp(), udp());
  let mut set = SocketSet::new(3).unwrap();
  set.add(&a).unwrap();
  set.add(&b).unwrap();
  set.add(&c).unwrap();

  set.remove(&b);
  assert_eq!(set.len(), 2);
  assert!(set.contains(&a) && !set.contains(&b) && set.contains(&c));

  set.remove(&b);
  assert_eq!(set.len(), 2);

  set.add(&b).expect("freed slot must be reusable");
  assert_eq!(set.len(), 3);
  assert!(b.is_valid());
}

#[test]
fn test_poll_empty_set_returns_at_once() {
  common::init();
  let set = SocketSet::new(8).unwrap();
  let start = Instant::now();
  assert!(!set.poll(Duration::from_secs(5)).unwrap());
  assert!(start.elapsed() < Duration::from_millis(50));
}

#[test]
fn test_poll_times_out() {
  common::init();
  let a = common::bound_udp();
  let mut set = SocketSet::new(1).unwrap();
  set.add(&a).unwrap();

  assert!(!set.poll(Duration::ZERO).unwrap());

  let start = Instant::now();
  assert!(!set.poll(Duration::from_millis(100)).unwrap());
  assert!(start.elapsed() >= Duration::from_millis(80));
  assert!(!a.is_ready());
}

#[test]
fn test_poll_marks_only_readable_members() {
  common::init();
  let (a, b) = (common::bound_udp(), common::bound_udp());
  let sender = udp();

  let mut both = SocketSet::new(2).unwrap();
  both.add(&a).unwrap();
  both.add(&b).unwrap();

  sender.send_to(b"to a", common::loopback_of(&a)).unwrap();
  common::wait_ready(&both);
  assert!(a.is_ready());
  assert!(!b.is_ready());

  // Polling a set that does not contain `a` leaves its flag alone.
  let mut only_b = SocketSet::new(1).unwrap();
  only_b.add(&b).unwrap();
  sender.send_to(b"to b", common::loopback_of(&b)).unwrap();
  common::wait_ready(&only_b);
  assert!(a.is_ready());
  assert!(b.is_ready());

  let mut buf = [0u8; 16];
  let (n, _) = a.receive_from(&mut buf).unwrap();
  assert_eq!(&buf[..n], b"to a");
  assert!(!a.is_ready());
  assert!(b.is_ready());

  // `a` has nothing left; a zero-timeout poll marks `b` only.
  assert!(both.poll(Duration::ZERO).unwrap());
  assert!(!a.is_ready());
  assert!(b.is_ready());
}

#[test]
fn test_poll_listener_readiness() {
  common::init();
  let listener = TcpListener::bind(0, false).unwrap();
  let mut set = SocketSet::new(1).unwrap();
  set.add(&listener).unwrap();

  assert!(!set.poll(Duration::ZERO).unwrap());

  let _client = sckt::net::TcpSocket::connect(common::loopback_of(&listener), false).unwrap();
  common::wait_ready(&set);
  assert!(listener.is_ready());
  assert!(listener.accept().unwrap().is_some());
  assert!(!listener.is_ready());
}

#[test]
fn test_poll_huge_timeout() {
  common::init();
  let a = common::bound_udp();
  udp().send_to(b"wake", common::loopback_of(&a)).unwrap();

  let mut set = SocketSet::new(1).unwrap();
  set.add(&a).unwrap();
  assert!(set.poll(Duration::MAX).expect("Failed to poll with unbounded timeout"));
  assert!(a.is_ready());
}
