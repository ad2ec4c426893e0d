// tests/unit_readiness_test.rs
//
// Direct tests of the readiness registry (§4.2): register/unregister
// bookkeeping, the `current_n_fds` invariant, `Full` at capacity, and slot
// reuse after a drop.

use cerver::core::errors::CerverError;
use cerver::core::readiness::ReadinessRegistry;

#[test]
fn register_and_unregister_update_current_n_fds() {
    let registry = ReadinessRegistry::new(4);
    assert_eq!(registry.current_n_fds(), 0);

    registry.register(10).unwrap();
    assert_eq!(registry.current_n_fds(), 1);
    assert!(registry.is_registered(10));

    registry.register(11).unwrap();
    assert_eq!(registry.current_n_fds(), 2);

    assert!(registry.unregister(10));
    assert_eq!(registry.current_n_fds(), 1);
    assert!(!registry.is_registered(10));
    assert!(registry.is_registered(11));
}

#[test]
fn unregistering_an_unknown_fd_is_a_no_op() {
    let registry = ReadinessRegistry::new(2);
    registry.register(1).unwrap();
    assert!(!registry.unregister(999));
    assert_eq!(registry.current_n_fds(), 1);
}

#[test]
fn registering_past_capacity_fails_with_full() {
    let registry = ReadinessRegistry::new(2);
    registry.register(1).unwrap();
    registry.register(2).unwrap();
    let err = registry.register(3).unwrap_err();
    assert!(matches!(err, CerverError::Full));
    assert_eq!(registry.current_n_fds(), 2);
}

#[test]
fn a_freed_slot_is_reused() {
    let registry = ReadinessRegistry::new(1);
    registry.register(1).unwrap();
    assert!(matches!(registry.register(2).unwrap_err(), CerverError::Full));

    assert!(registry.unregister(1));
    registry.register(2).unwrap();
    assert_eq!(registry.current_n_fds(), 1);
    assert!(registry.is_registered(2));
    assert!(!registry.is_registered(1));
}

#[test]
fn max_n_fds_reports_the_configured_capacity() {
    let registry = ReadinessRegistry::new(16);
    assert_eq!(registry.max_n_fds(), 16);
}
