use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the catalog client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
  /// Resolving, connecting or transferring failed.
  #[error(transparent)]
  Net(#[from] sckt::Error),
  /// The server answered with something other than `200 OK`.
  #[error("catalog answered with HTTP status {code}")]
  Status { code: u16 },
  /// The response was not a well-formed HTTP/1.x message.
  #[error("malformed HTTP response: {0}")]
  MalformedResponse(&'static str),
  /// The body was not the expected JSON document.
  #[error("invalid response body: {0}")]
  Json(#[from] serde_json::Error),
  #[error(transparent)]
  Config(#[from] ConfigError),
}
