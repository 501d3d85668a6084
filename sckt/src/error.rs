use std::io;

use thiserror::Error;

/// A convenience wrapper around `Result` for [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by sckt operations.
///
/// Every operation reports the failure it detected synchronously; the only
/// errors that are ever swallowed are the ones raised while releasing a
/// descriptor (see [`Socket::close`](crate::net::Socket::close)).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
  /// Process-wide network initialization or teardown failed.
  #[error(transparent)]
  Subsystem(#[from] SubsystemError),
  /// Text was not a dotted-quad IPv4 address.
  #[error(transparent)]
  Parse(#[from] ParseError),
  /// A host name did not resolve to any IPv4 address.
  #[error("could not resolve host `{host}`: {source}")]
  Resolution {
    /// The name that was looked up.
    host: String,
    /// Why the lookup produced nothing usable.
    #[source]
    source: io::Error,
  },
  /// Acquiring a socket failed. No half-open descriptor is left behind.
  #[error(transparent)]
  Open(#[from] OpenError),
  /// The operation is not valid in the socket's current state.
  #[error("{op}: socket is not open")]
  State {
    /// The operation that was attempted.
    op: &'static str,
  },
  /// A socket set is full or cannot be created that large.
  #[error(transparent)]
  Capacity(#[from] CapacityError),
  /// The transport failed while moving data or polling.
  #[error("{op} failed: {source}")]
  Io {
    /// The system call that failed.
    op: &'static str,
    /// The underlying OS error.
    #[source]
    source: io::Error,
  },
}

/// The error taxonomy, without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  /// See [`Error::Subsystem`].
  Subsystem,
  /// See [`Error::Parse`].
  Parse,
  /// See [`Error::Resolution`].
  Resolution,
  /// See [`Error::Open`].
  Open,
  /// See [`Error::State`].
  State,
  /// See [`Error::Capacity`].
  Capacity,
  /// See [`Error::Io`].
  Io,
}

impl Error {
  /// Returns which class of failure this is.
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::Subsystem(_) => ErrorKind::Subsystem,
      Error::Parse(_) => ErrorKind::Parse,
      Error::Resolution { .. } => ErrorKind::Resolution,
      Error::Open(_) => ErrorKind::Open,
      Error::State { .. } => ErrorKind::State,
      Error::Capacity(_) => ErrorKind::Capacity,
      Error::Io { .. } => ErrorKind::Io,
    }
  }

  pub(crate) fn io(op: &'static str, source: io::Error) -> Error {
    Error::Io { op, source }
  }

  /// Transport error for a data operation on a socket that is not open.
  pub(crate) fn not_connected(op: &'static str) -> Error {
    Error::Io { op, source: io::Error::from(io::ErrorKind::NotConnected) }
  }
}

/// Failures of [`NetworkSubsystem`](crate::NetworkSubsystem).
#[derive(Debug, Error)]
pub enum SubsystemError {
  /// Another `NetworkSubsystem` is still alive.
  #[error("network subsystem is already started")]
  AlreadyStarted,
  /// The platform refused to initialize networking.
  #[error("network subsystem initialization failed: {0}")]
  Init(#[source] io::Error),
}

/// Why a string is not a dotted-quad IPv4 address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
  /// The text does not have exactly four components.
  #[error("invalid IPv4 address: expected 4 components, found {found}")]
  ComponentCount {
    /// Number of components that were present (counting up to 5).
    found: usize,
  },
  /// A component has no digits (`"1..2.3"`).
  #[error("invalid IPv4 address: component {index} is empty")]
  EmptyComponent {
    /// Zero-based component index.
    index: usize,
  },
  /// A component contains something other than an ASCII digit.
  #[error("invalid IPv4 address: unexpected character {found:?} in component {index}")]
  InvalidCharacter {
    /// Zero-based component index.
    index: usize,
    /// The offending character.
    found: char,
  },
  /// A component has more than three digits.
  #[error("invalid IPv4 address: component {index} has more than 3 digits")]
  TooManyDigits {
    /// Zero-based component index.
    index: usize,
  },
  /// A component is greater than 255.
  #[error("invalid IPv4 address: component {index} is {value} (maximum 255)")]
  OutOfRange {
    /// Zero-based component index.
    index: usize,
    /// The decoded value.
    value: u16,
  },
}

/// Failures to acquire a socket.
#[derive(Debug, Error)]
pub enum OpenError {
  /// The socket already owns a descriptor; it was left untouched.
  #[error("socket is already open")]
  AlreadyOpen,
  /// The operation needs an open socket (e.g. accepting on a closed listener).
  #[error("socket is not open")]
  NotOpen,
  /// A system call failed while building the socket.
  #[error("{op} failed: {source}")]
  Syscall {
    /// The system call that failed.
    op: &'static str,
    /// The underlying OS error.
    #[source]
    source: io::Error,
  },
}

impl OpenError {
  pub(crate) fn syscall(op: &'static str) -> impl FnOnce(io::Error) -> Error {
    move |source| Error::Open(OpenError::Syscall { op, source })
  }
}

/// Failures of [`SocketSet`](crate::net::SocketSet) sizing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapacityError {
  /// Every slot of the set is taken.
  #[error("socket set is full ({capacity} sockets)")]
  Full {
    /// The capacity of the set.
    capacity: usize,
  },
  /// The requested capacity exceeds what the platform can poll.
  #[error("socket set capacity {requested} exceeds the platform limit of {maximum}")]
  TooLarge {
    /// The capacity that was asked for.
    requested: usize,
    /// The largest supported capacity.
    maximum: usize,
  },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kind_matches_variant() {
    assert_eq!(Error::State { op: "recv" }.kind(), ErrorKind::State);
    assert_eq!(Error::not_connected("send").kind(), ErrorKind::Io);
    assert_eq!(Error::from(OpenError::AlreadyOpen).kind(), ErrorKind::Open);
    assert_eq!(
      Error::from(CapacityError::Full { capacity: 2 }).kind(),
      ErrorKind::Capacity
    );
    assert_eq!(
      Error::from(ParseError::ComponentCount { found: 3 }).kind(),
      ErrorKind::Parse
    );
  }

  #[test]
  fn messages_name_the_failing_call() {
    let err = Error::io("recvfrom", io::Error::from(io::ErrorKind::TimedOut));
    assert!(err.to_string().starts_with("recvfrom failed"));

    let err = OpenError::syscall("bind")(io::Error::from(
      io::ErrorKind::AddrInUse,
    ));
    assert!(err.to_string().starts_with("bind failed"));
  }
}
