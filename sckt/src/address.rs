//! IPv4 endpoint addresses.
//!
//! [`IpAddress`] pairs a 32-bit host with a port. Parsing is deliberately
//! strict: only the full `ddd.ddd.ddd.ddd` form is accepted, never the
//! shorthand forms (`"127.1"`, hex or octal components) that `inet_addr`
//! tolerates.
//!
//! ```rust
//! use sckt::IpAddress;
//!
//! let addr = IpAddress::parse("192.168.0.7").unwrap().with_port(8080);
//! assert_eq!(addr.octets(), [192, 168, 0, 7]);
//! assert_eq!(addr.to_string(), "192.168.0.7:8080");
//!
//! assert!(IpAddress::parse("192.168.0").is_err());
//! assert!(IpAddress::parse("192.168.0.256").is_err());
//! ```

use std::{
  fmt, io,
  net::{Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs},
  str::FromStr,
};

use crate::error::{Error, ParseError, Result};

/// An IPv4 host and port.
///
/// The host is kept as the numeric value of the dotted quad, so
/// `1.2.3.4` is `0x01020304`; byte order only matters at the OS boundary,
/// where it is converted to network order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IpAddress {
  host: u32,
  port: u16,
}

impl IpAddress {
  /// The wildcard host, `0.0.0.0`, port 0.
  pub const ANY: IpAddress = IpAddress { host: 0, port: 0 };
  /// The loopback host, `127.0.0.1`, port 0.
  pub const LOCALHOST: IpAddress = IpAddress { host: 0x7f00_0001, port: 0 };
  /// The limited broadcast host, `255.255.255.255`, port 0.
  pub const BROADCAST: IpAddress = IpAddress { host: u32::MAX, port: 0 };

  pub const fn new(host: u32, port: u16) -> Self {
    Self { host, port }
  }

  pub const fn from_octets(octets: [u8; 4], port: u16) -> Self {
    Self { host: u32::from_be_bytes(octets), port }
  }

  /// Returns a copy of this address with the port replaced.
  #[must_use]
  pub const fn with_port(self, port: u16) -> Self {
    Self { host: self.host, port }
  }

  pub const fn host(&self) -> u32 {
    self.host
  }

  pub const fn port(&self) -> u16 {
    self.port
  }

  pub const fn octets(&self) -> [u8; 4] {
    self.host.to_be_bytes()
  }

  pub const fn ip(&self) -> Ipv4Addr {
    Ipv4Addr::from_bits(self.host)
  }

  /// Parses a dotted-quad host. The returned address has port 0.
  pub fn parse(text: &str) -> std::result::Result<Self, ParseError> {
    Self::parse_host(text).map(|host| Self { host, port: 0 })
  }

  /// Parses a dotted-quad host into its numeric value.
  ///
  /// Exactly four components separated by `.`, each made of one to three
  /// ASCII digits with a value of at most 255. Nothing may precede or follow.
  pub fn parse_host(text: &str) -> std::result::Result<u32, ParseError> {
    let mut host = 0u32;
    let mut components = text.split('.');

    for index in 0..4 {
      let Some(component) = components.next() else {
        return Err(ParseError::ComponentCount { found: index });
      };
      host = (host << 8) | u32::from(parse_component(index, component)?);
    }

    if components.next().is_some() {
      return Err(ParseError::ComponentCount { found: 5 });
    }

    Ok(host)
  }

  /// Looks up `name`, trying it as a dotted quad first.
  ///
  /// Falls back to the system resolver; the first IPv4 answer wins.
  /// Blocks for as long as the resolver does.
  pub fn resolve(name: &str, port: u16) -> Result<Self> {
    if let Ok(host) = Self::parse_host(name) {
      return Ok(Self { host, port });
    }

    let resolution_error = |source| Error::Resolution { host: name.to_owned(), source };

    let found = (name, port)
      .to_socket_addrs()
      .map_err(resolution_error)?
      .find_map(|addr| match addr {
        SocketAddr::V4(v4) => Some(Self::from(v4)),
        SocketAddr::V6(_) => None,
      });

    let addr = found.ok_or_else(|| {
      resolution_error(io::Error::new(
        io::ErrorKind::NotFound,
        "no IPv4 address found",
      ))
    })?;

    tracing::debug!(host = name, %addr, "resolved host");
    Ok(addr)
  }
}

fn parse_component(
  index: usize,
  component: &str,
) -> std::result::Result<u8, ParseError> {
  if component.is_empty() {
    return Err(ParseError::EmptyComponent { index });
  }

  let mut value = 0u16;
  for (position, ch) in component.chars().enumerate() {
    if !ch.is_ascii_digit() {
      return Err(ParseError::InvalidCharacter { index, found: ch });
    }
    if position == 3 {
      return Err(ParseError::TooManyDigits { index });
    }
    value = value * 10 + (ch as u16 - u16::from(b'0'));
  }

  u8::try_from(value).map_err(|_| ParseError::OutOfRange { index, value })
}

impl FromStr for IpAddress {
  type Err = ParseError;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl fmt::Display for IpAddress {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.ip(), self.port)
  }
}

impl From<SocketAddrV4> for IpAddress {
  fn from(addr: SocketAddrV4) -> Self {
    Self { host: addr.ip().to_bits(), port: addr.port() }
  }
}

impl From<IpAddress> for SocketAddrV4 {
  fn from(addr: IpAddress) -> Self {
    SocketAddrV4::new(addr.ip(), addr.port)
  }
}

impl From<IpAddress> for SocketAddr {
  fn from(addr: IpAddress) -> Self {
    SocketAddr::V4(addr.into())
  }
}
