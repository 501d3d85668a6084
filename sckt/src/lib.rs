#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_debug_implementations, rust_2018_idioms)]

//! # sckt - blocking IPv4 sockets with select-style readiness
//!
//! sckt is a small cross-platform layer over the OS socket API: TCP clients
//! and listeners, UDP sockets, strict dotted-quad address parsing, and
//! readiness polling over a bounded set of sockets.
//!
//! ## Features
//! - **Single owner per descriptor.** Sockets cannot be cloned; moving one
//!   moves the descriptor, and dropping one closes it.
//! - **No leaks on failure.** A socket that fails half way through opening
//!   is closed before the error is returned.
//! - **Full sends.** [`TcpSocket::send`](net::TcpSocket::send) writes every
//!   byte or fails; interrupted system calls are restarted everywhere.
//! - **Explicit readiness.** [`SocketSet::poll`](net::SocketSet::poll) marks
//!   readable sockets; receiving clears the mark.
//!
//! ## Platform support
//!
//! | Platform   | API                 | Status |
//! |------------|---------------------|--------|
//! | Linux      | BSD sockets, select | Yes    |
//! | macOS/BSD  | BSD sockets, select | Yes    |
//! | Windows    | Winsock 2.2, select | Yes    |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use sckt::{IpAddress, NetworkSubsystem};
//! use sckt::net::{SocketSet, TcpListener, TcpSocket};
//!
//! fn main() -> sckt::Result<()> {
//!     let _net = NetworkSubsystem::start()?;
//!
//!     let listener = TcpListener::bind(0, true)?;
//!     let port = listener.local_address()?.port();
//!
//!     let client = TcpSocket::connect(IpAddress::LOCALHOST.with_port(port), true)?;
//!     client.send(b"hello")?;
//!
//!     let mut set = SocketSet::new(1)?;
//!     set.add(&listener)?;
//!     while !set.poll(Duration::from_millis(100))? {}
//!
//!     if let Some(server_side) = listener.accept()? {
//!         let mut buf = [0u8; 5];
//!         let n = server_side.receive(&mut buf)?;
//!         assert_eq!(&buf[..n], b"hello");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`Result`]. [`Error::kind`] tells the
//! classes apart: bad input ([`ErrorKind::Parse`], [`ErrorKind::Resolution`]),
//! resource acquisition ([`ErrorKind::Open`]), misuse
//! ([`ErrorKind::State`]), set sizing ([`ErrorKind::Capacity`]), transport
//! failures ([`ErrorKind::Io`]) and process-wide setup
//! ([`ErrorKind::Subsystem`]). A receive of 0 bytes is not an error: it is
//! the peer closing the connection.
//!
//! ## Logging
//!
//! sckt emits [`tracing`] events (socket lifecycle at `debug`, retries and
//! polls at `trace`, swallowed release failures at `warn`) and never installs
//! a subscriber itself.

#[macro_use]
mod macros;

pub mod address;
pub mod error;
pub mod net;
mod resource;
mod subsystem;
mod sys;

pub use address::IpAddress;
pub use error::{
  CapacityError, Error, ErrorKind, OpenError, ParseError, Result,
  SubsystemError,
};
pub use subsystem::NetworkSubsystem;
