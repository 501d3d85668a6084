//! Blocking IPv4 sockets.
//!
//! # Main Types
//!
//! - [`Socket`]: the descriptor-owning state every socket type shares
//! - [`TcpListener`]: a non-blocking listening socket
//! - [`TcpSocket`]: a connected, blocking TCP stream
//! - [`UdpSocket`]: a datagram socket
//! - [`SocketSet`]: a bounded group of sockets polled together
//!
//! Every socket type dereferences to [`Socket`] for
//! [`is_valid`](Socket::is_valid), [`is_ready`](Socket::is_ready) and
//! [`local_address`](Socket::local_address), and can be registered in a
//! [`SocketSet`].
//!
//! # Event loop
//!
//! Only [`TcpListener::accept`] is non-blocking. A server that juggles
//! several sockets polls a [`SocketSet`] and then only touches the sockets
//! the poll marked ready, so that no call blocks:
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use sckt::net::{SocketSet, TcpListener, TcpSocket};
//!
//! fn run(listener: &TcpListener) -> sckt::Result<()> {
//!     let mut clients: Vec<TcpSocket> = Vec::new();
//!     let mut buf = [0u8; 1024];
//!
//!     loop {
//!         {
//!             let mut set = SocketSet::new(1 + clients.len())?;
//!             set.add(listener)?;
//!             for client in &clients {
//!                 set.add(client)?;
//!             }
//!             set.poll(Duration::from_millis(500))?;
//!         }
//!
//!         // Echo, dropping (and so closing) clients that hung up.
//!         clients.retain(|client| {
//!             if !client.is_ready() {
//!                 return true;
//!             }
//!             match client.receive(&mut buf) {
//!                 Ok(0) | Err(_) => false,
//!                 Ok(n) => client.send(&buf[..n]).is_ok(),
//!             }
//!         });
//!
//!         if listener.is_ready() {
//!             if let Some(client) = listener.accept()? {
//!                 clients.push(client);
//!             }
//!         }
//!     }
//! }
//! ```

mod set;
mod socket;
mod tcp;
mod udp;

pub use set::*;
pub use socket::*;
pub use tcp::*;
pub use udp::*;
