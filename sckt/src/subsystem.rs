//! Process-wide networking setup.
//!
//! Some platforms need one-time initialization before sockets behave:
//! Windows must register with Winsock, and on Unix a write to a peer-closed
//! socket raises `SIGPIPE`, which kills the process unless it is ignored.
//! [`NetworkSubsystem`] performs that setup when started and undoes it when
//! dropped. At most one can be alive at a time.
//!
//! ```rust
//! use sckt::NetworkSubsystem;
//!
//! let net = NetworkSubsystem::start().unwrap();
//! assert!(NetworkSubsystem::is_active());
//! assert!(NetworkSubsystem::start().is_err());
//!
//! drop(net);
//! assert!(!NetworkSubsystem::is_active());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
  error::{Result, SubsystemError},
  sys,
};

static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Guard for the process-wide network initialization.
///
/// Create one at program start with [`NetworkSubsystem::start`] and keep it
/// alive for as long as sockets are in use; dropping it (or calling
/// [`stop`](Self::stop)) reverses the initialization.
#[derive(Debug)]
#[must_use = "networking is torn down again when the subsystem is dropped"]
pub struct NetworkSubsystem {
  startup: Option<sys::Startup>,
}

impl NetworkSubsystem {
  /// Initializes networking for the process.
  ///
  /// Fails with [`SubsystemError::AlreadyStarted`] while another instance is
  /// alive, or [`SubsystemError::Init`] if the platform refuses.
  pub fn start() -> Result<Self> {
    if ACTIVE
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      return Err(SubsystemError::AlreadyStarted.into());
    }

    match sys::startup() {
      Ok(startup) => {
        tracing::debug!("network subsystem started");
        Ok(Self { startup: Some(startup) })
      }
      Err(err) => {
        ACTIVE.store(false, Ordering::Release);
        Err(SubsystemError::Init(err).into())
      }
    }
  }

  /// Returns whether a `NetworkSubsystem` is currently alive.
  pub fn is_active() -> bool {
    ACTIVE.load(Ordering::Acquire)
  }

  /// Tears networking down. Same as dropping the guard.
  pub fn stop(self) {
    drop(self);
  }
}

impl Drop for NetworkSubsystem {
  fn drop(&mut self) {
    if let Some(startup) = self.startup.take() {
      if let Err(err) = startup.cleanup() {
        tracing::warn!(error = %err, "network subsystem teardown failed");
      }
      ACTIVE.store(false, Ordering::Release);
      tracing::debug!("network subsystem stopped");
    }
  }
}
