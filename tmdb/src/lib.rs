#![warn(missing_debug_implementations, rust_2018_idioms)]

//! # tmdb - movie search over plain HTTP
//!
//! A small client for the catalog's `search/movie` endpoint, written on top
//! of [`sckt`] stream sockets. It speaks HTTP/1.0 without TLS, so point it
//! at a plain-HTTP endpoint or a local proxy.
//!
//! ```rust,no_run
//! use sckt::NetworkSubsystem;
//! use tmdb::{Config, Tmdb};
//!
//! fn main() -> tmdb::Result<()> {
//!     let _net = NetworkSubsystem::start()?;
//!
//!     let config = Config::from_toml(r#"api_key = "0123abcd""#)?;
//!     let client = Tmdb::new(config);
//!     for movie in client.search_movies("Blade Runner")? {
//!         println!("{} ({})", movie.name, movie.released);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! A [`sckt::NetworkSubsystem`] must be alive while requests are made.

mod client;
pub mod config;
pub mod error;
pub mod movie;
pub mod urlencode;

pub use client::Tmdb;
pub use config::{Config, ConfigError};
pub use error::{Error, Result};
pub use movie::Movie;
