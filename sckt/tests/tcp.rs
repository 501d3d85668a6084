mod common;

use std::thread;

use sckt::{
  Error, ErrorKind, IpAddress, OpenError,
  net::{SocketSet, TcpListener, TcpSocket},
};

fn connected_pair() -> (TcpListener, TcpSocket, TcpSocket) {
  let listener = TcpListener::bind(0, true).expect("Failed to listen");
  let client = TcpSocket::connect(common::loopback_of(&listener), true)
    .expect("Failed to connect");

  let server = {
    let mut set = SocketSet::new(1).unwrap();
    set.add(&listener).unwrap();
    common::wait_ready(&set);
    assert!(listener.is_ready());
    listener.accept().expect("Failed to accept").expect("no pending connection")
  };
  assert!(!listener.is_ready());

  (listener, client, server)
}

fn receive_exact(socket: &TcpSocket, len: usize) -> Vec<u8> {
  let mut out = Vec::with_capacity(len);
  let mut buf = [0u8; 8192];
  while out.len() < len {
    let n = socket.receive(&mut buf).expect("Failed to receive");
    assert_ne!(n, 0, "peer closed after {} of {len} bytes", out.len());
    out.extend_from_slice(&buf[..n]);
  }
  out
}

#[test]
fn test_tcp_hello() {
  common::init();
  let (_listener, client, server) = connected_pair();

  assert_eq!(client.send(b"hello").unwrap(), 5);
  assert_eq!(receive_exact(&server, 5), b"hello");

  assert_eq!(server.send(b"world").unwrap(), 5);
  assert_eq!(receive_exact(&client, 5), b"world");

  assert_eq!(server.peer_address().unwrap(), client.local_address().unwrap());
}

#[test]
fn test_tcp_stream_has_no_message_boundaries() {
  common::init();
  let (_listener, client, server) = connected_pair();

  client.send(b"pi").unwrap();
  client.send(b"ng").unwrap();
  assert_eq!(receive_exact(&server, 4), b"ping");
}

#[test]
fn test_tcp_send_delivers_everything() {
  common::init();
  let (_listener, client, server) = connected_pair();

  let len = 4 * 1024 * 1024 + fastrand::usize(..4096);
  let payload: Vec<u8> = (0..len).map(|_| fastrand::u8(..)).collect();

  let reader = thread::spawn(move || receive_exact(&server, len));
  assert_eq!(client.send(&payload).expect("Failed to send"), len);

  let received = reader.join().expect("reader panicked");
  assert!(received == payload, "payload corrupted in transit");
}

#[test]
fn test_tcp_receive_zero_after_peer_close() {
  common::init();
  let (_listener, mut client, server) = connected_pair();

  client.send(b"bye").unwrap();
  client.close();
  assert!(!client.is_valid());

  assert_eq!(receive_exact(&server, 3), b"bye");
  let mut buf = [0u8; 16];
  assert_eq!(server.receive(&mut buf).unwrap(), 0);
}

#[test]
fn test_accept_without_pending_connection() {
  common::init();
  let listener = TcpListener::bind(0, false).expect("Failed to listen");
  assert!(!listener.disables_nagle());

  assert!(listener.accept().expect("accept failed").is_none());
  assert!(listener.is_valid());
}

#[test]
fn test_accept_on_unopened_listener() {
  common::init();
  let listener = TcpListener::new();
  let err = listener.accept().unwrap_err();
  assert!(matches!(err, Error::Open(OpenError::NotOpen)));
}

#[test]
fn test_open_twice_is_rejected() {
  common::init();
  let mut listener = TcpListener::bind(0, false).expect("Failed to listen");
  let port = listener.local_address().unwrap().port();

  let err = listener.open(0, false).unwrap_err();
  assert!(matches!(err, Error::Open(OpenError::AlreadyOpen)));
  assert_eq!(listener.local_address().unwrap().port(), port);

  let mut client = TcpSocket::connect(common::loopback_of(&listener), false)
    .expect("Failed to connect");
  let err = client.open(common::loopback_of(&listener), false).unwrap_err();
  assert!(matches!(err, Error::Open(OpenError::AlreadyOpen)));
  assert!(client.is_valid());
}

#[test]
fn test_connect_refused_leaves_socket_closed() {
  common::init();
  let address = {
    let listener = TcpListener::bind(0, false).expect("Failed to listen");
    common::loopback_of(&listener)
  };

  let mut client = TcpSocket::new();
  let err = client.open(address, false).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Open);
  assert!(!client.is_valid());
}

#[test]
fn test_operations_on_closed_socket() {
  common::init();
  let mut socket = TcpSocket::new();
  socket.close();
  socket.close();
  assert!(!socket.is_valid());

  assert_eq!(socket.disable_nagle().unwrap_err().kind(), ErrorKind::State);
  assert_eq!(socket.peer_address().unwrap_err().kind(), ErrorKind::State);
  assert_eq!(socket.send(b"x").unwrap_err().kind(), ErrorKind::Io);

  let mut buf = [0u8; 4];
  assert_eq!(socket.receive(&mut buf).unwrap_err().kind(), ErrorKind::Io);
}

#[test]
fn test_take_moves_connection() {
  common::init();
  let (_listener, mut client, server) = connected_pair();

  let moved = client.take();
  assert!(!client.is_valid());
  assert!(moved.is_valid());

  moved.send(b"still here").unwrap();
  assert_eq!(receive_exact(&server, 10), b"still here");
}

#[test]
fn test_listener_binds_any_interface() {
  common::init();
  let listener = TcpListener::bind(0, false).expect("Failed to listen");
  let local = listener.local_address().unwrap();
  assert_eq!(local.host(), IpAddress::ANY.host());
  assert_ne!(local.port(), 0);
}

#[test]
fn test_receive_into_empty_buffer() {
  common::init();
  let (_listener, client, server) = connected_pair();
  client.send(b"data").unwrap();

  let mut set = SocketSet::new(1).unwrap();
  set.add(&server).unwrap();
  common::wait_ready(&set);

  let err = server.receive(&mut [0u8; 0]).unwrap_err();
  assert!(
    matches!(&err, Error::Io { source, .. } if source.kind() == std::io::ErrorKind::InvalidInput),
    "got {err:?}"
  );
  assert!(server.is_ready());
  assert_eq!(receive_exact(&server, 4), b"data");
}
