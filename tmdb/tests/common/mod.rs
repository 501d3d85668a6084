#![allow(dead_code)]

use std::{
  sync::{OnceLock, mpsc},
  thread,
  time::Duration,
};

use sckt::{
  NetworkSubsystem,
  net::{SocketSet, TcpListener},
};
use tmdb::Config;
use tracing_subscriber::EnvFilter;

static NET: OnceLock<NetworkSubsystem> = OnceLock::new();

pub fn init() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();

  NET.get_or_init(|| {
    NetworkSubsystem::start().expect("Failed to start network subsystem")
  });
}

/// A one-shot HTTP server on loopback that answers the first request with
/// `response` and hands the raw request back.
pub struct FakeServer {
  pub config: Config,
  request: mpsc::Receiver<String>,
}

impl FakeServer {
  pub fn start(response: impl Into<Vec<u8>>) -> FakeServer {
    let response = response.into();
    let listener = TcpListener::bind(0, true).expect("Failed to listen");
    let port = listener.local_address().expect("Failed to read port").port();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
      let mut set = SocketSet::new(1).unwrap();
      set.add(&listener).unwrap();
      let client = loop {
        if set.poll(Duration::from_millis(50)).unwrap() {
          if let Some(client) = listener.accept().unwrap() {
            break client;
          }
        }
      };

      let mut request = Vec::new();
      let mut buf = [0u8; 1024];
      while !request.ends_with(b"\r\n\r\n") {
        let n = client.receive(&mut buf).expect("Failed to read request");
        if n == 0 {
          break;
        }
        request.extend_from_slice(&buf[..n]);
      }

      client.send(&response).expect("Failed to send response");
      let _ = tx.send(String::from_utf8_lossy(&request).into_owned());
    });

    let config = Config {
      host: "127.0.0.1".to_owned(),
      port,
      language: String::new(),
      ..Config::with_api_key("test-key")
    };
    FakeServer { config, request: rx }
  }

  pub fn request(&self) -> String {
    self
      .request
      .recv_timeout(Duration::from_secs(5))
      .expect("server never saw a request")
  }
}

pub fn http_response(status: &str, body: &str) -> Vec<u8> {
  format!(
    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
    body.len()
  )
  .into_bytes()
}
