use sckt::{Error, NetworkSubsystem, SubsystemError, net::UdpSocket};

// Runs as one test: the subsystem is process-wide and this binary must not
// share it with tests running in parallel.
#[test]
fn test_subsystem_lifecycle() {
  assert!(!NetworkSubsystem::is_active());

  let net = NetworkSubsystem::start().expect("Failed to start");
  assert!(NetworkSubsystem::is_active());

  let err = NetworkSubsystem::start().unwrap_err();
  assert!(matches!(err, Error::Subsystem(SubsystemError::AlreadyStarted)));
  assert!(NetworkSubsystem::is_active());

  let socket = UdpSocket::bind(0).expect("Failed to open socket");
  drop(socket);

  net.stop();
  assert!(!NetworkSubsystem::is_active());

  let again = NetworkSubsystem::start().expect("Failed to restart");
  assert!(NetworkSubsystem::is_active());
  drop(again);
  assert!(!NetworkSubsystem::is_active());
}
