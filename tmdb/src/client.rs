use std::fmt::Write as _;

use sckt::{IpAddress, net::TcpSocket};
use serde::Deserialize;

use crate::{
  config::Config,
  error::{Error, Result},
  movie::Movie,
  urlencode,
};

const SEARCH_PATH: &str = "/3/search/movie";
const RECEIVE_CHUNK: usize = 4096;

/// Catalog client.
///
/// Every call opens a fresh connection, sends one request and reads the
/// response until the server closes the connection.
#[derive(Debug, Clone)]
pub struct Tmdb {
  config: Config,
}

#[derive(Deserialize)]
struct SearchPage {
  #[serde(default)]
  results: Vec<Movie>,
}

impl Tmdb {
  pub fn new(config: Config) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Searches the catalog by title and returns every hit on the first page.
  pub fn search_movies(&self, title: &str) -> Result<Vec<Movie>> {
    let body = self.get(&self.search_target(title))?;
    let page: SearchPage = serde_json::from_slice(&body)?;
    tracing::debug!(title, hits = page.results.len(), "movie search finished");
    Ok(page.results)
  }

  /// Returns the best match for `title`, if any.
  pub fn search_movie(&self, title: &str) -> Result<Option<Movie>> {
    Ok(self.search_movies(title)?.into_iter().next())
  }

  fn search_target(&self, title: &str) -> String {
    let mut target = format!(
      "{SEARCH_PATH}?api_key={}&query={}",
      urlencode::encode(&self.config.api_key),
      urlencode::encode(title)
    );
    if !self.config.language.is_empty() {
      // Infallible for String.
      let _ = write!(target, "&language={}", urlencode::encode(&self.config.language));
    }
    target
  }

  /// Performs `GET target` and returns the body of a `200` response.
  fn get(&self, target: &str) -> Result<Vec<u8>> {
    let address = IpAddress::resolve(&self.config.host, self.config.port)?;
    let socket = TcpSocket::connect(address, true)?;

    let request = format!(
      "GET {target} HTTP/1.0\r\n\
       Host: {host}\r\n\
       Accept: application/json\r\n\
       Connection: close\r\n\
       \r\n",
      host = self.config.host,
    );
    tracing::debug!(%address, path = SEARCH_PATH, "sending catalog request");
    socket.send(request.as_bytes())?;

    let response = receive_to_end(&socket)?;
    let (code, body) = split_response(&response)?;
    if code != 200 {
      return Err(Error::Status { code });
    }
    Ok(body.to_vec())
  }
}

fn receive_to_end(socket: &TcpSocket) -> Result<Vec<u8>> {
  let mut response = Vec::new();
  let mut buf = [0u8; RECEIVE_CHUNK];
  loop {
    let n = socket.receive(&mut buf)?;
    if n == 0 {
      break;
    }
    tracing::trace!(bytes = n, "received response data");
    response.extend_from_slice(&buf[..n]);
  }
  Ok(response)
}

/// Splits an HTTP/1.x response into its status code and body.
fn split_response(response: &[u8]) -> Result<(u16, &[u8])> {
  let head_end = response
    .windows(4)
    .position(|w| w == b"\r\n\r\n")
    .ok_or(Error::MalformedResponse("no end of headers"))?;
  let head = std::str::from_utf8(&response[..head_end])
    .map_err(|_| Error::MalformedResponse("headers are not UTF-8"))?;

  let status_line = head.lines().next().unwrap_or_default();
  let mut parts = status_line.split_whitespace();
  match parts.next() {
    Some(version) if version.starts_with("HTTP/1.") => {}
    _ => return Err(Error::MalformedResponse("not an HTTP/1.x status line")),
  }
  let code = parts
    .next()
    .and_then(|code| code.parse::<u16>().ok())
    .ok_or(Error::MalformedResponse("missing status code"))?;

  Ok((code, &response[head_end + 4..]))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn search_target_encodes_query() {
    let client = Tmdb::new(Config::with_api_key("k3y"));
    assert_eq!(
      client.search_target("Lock, Stock & Two"),
      "/3/search/movie?api_key=k3y&query=Lock%2C+Stock+%26+Two"
    );
  }

  #[test]
  fn search_target_adds_language() {
    let config = Config { language: "fr-FR".into(), ..Config::with_api_key("k") };
    let client = Tmdb::new(config);
    assert!(client.search_target("x").ends_with("&query=x&language=fr-FR"));
  }

  #[test]
  fn splits_status_and_body() {
    let (code, body) =
      split_response(b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nhi").unwrap();
    assert_eq!(code, 200);
    assert_eq!(body, b"hi");

    let (code, body) = split_response(b"HTTP/1.0 404 Not Found\r\n\r\n").unwrap();
    assert_eq!(code, 404);
    assert!(body.is_empty());
  }

  #[test]
  fn rejects_broken_responses() {
    for bad in [&b"HTTP/1.1 200 OK\r\n"[..], b"SPDY 200\r\n\r\n", b"HTTP/1.1 abc\r\n\r\n", b""] {
      assert!(matches!(split_response(bad), Err(Error::MalformedResponse(_))));
    }
  }
}
