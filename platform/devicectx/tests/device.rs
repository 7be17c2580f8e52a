// Copyright 2026 NGN Stack Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Behavioral tests for the device context over the host backend
//! OWNERS: @engine
//! STATUS: Functional
//!
//! TEST_SCOPE:
//!   - URN derivation pinning, including the placeholder path
//!   - Service handle and app version memoization
//!   - Wake lock idempotence and failure handling
//!
//! DEPENDENCIES:
//!   - devicectx host backend (scripted faults and counters)

#![cfg(feature = "backend-host")]

use std::sync::Arc;
use std::thread;

use devicectx::{
    AppVersion, BuildProfile, ContextError, DeviceContext, DeviceUrn, HostPlatform, Platform,
    PowerError, RegistryError, ServiceError, ServiceHandle, ServiceKind, TelephonyError, WakeLock,
};

fn context(model: &str, sdk: &str) -> DeviceContext<HostPlatform> {
    DeviceContext::new(HostPlatform::new(BuildProfile::new(model, sdk)))
        .expect("context should build")
}

#[test]
fn urn_from_line_number_pins_across_platform_changes() {
    let context = context("GT-I9000", "10");
    context.platform().set_line_number(Some("15551234567"));

    assert_eq!(context.device_urn().to_string(), "urn:tel:15551234567");

    context.platform().set_line_number(Some("19998887777"));
    context.platform().fail_telephony(true);
    assert_eq!(
        context.device_urn(),
        &DeviceUrn::Tel("15551234567".into()),
        "first derivation wins for the life of the context"
    );
    assert_eq!(context.platform().telephony_queries(), 1);
}

#[test]
fn urn_falls_back_to_equipment_id_without_a_line() {
    let context = context("GT-I9000", "10");
    context.platform().set_equipment_id(Some("356938035643809"));

    assert_eq!(
        context.device_urn().to_string(),
        "urn:imei:356938035643809"
    );
    assert_eq!(
        context.platform().telephony_queries(),
        2,
        "line number was tried first"
    );
}

#[test]
fn failed_derivation_pins_the_placeholder() {
    let context = context("GT-I9000", "10");
    context.platform().fail_telephony(true);

    assert!(context.device_urn().is_fallback());
    assert_eq!(
        context.device_urn().to_string(),
        "urn:uuid:3ca50bcb-7a67-44f1-afd0-994a55f930f4"
    );

    context.platform().fail_telephony(false);
    context.platform().set_line_number(Some("15551234567"));
    assert!(
        context.device_urn().is_fallback(),
        "identity never changes once derived"
    );
    assert_eq!(context.platform().telephony_queries(), 1);
}

#[test]
fn service_handles_resolve_once_per_kind() {
    let context = context("GT-I9000", "10");

    let first = context.audio_service().expect("audio resolves").clone();
    let second = context
        .service(ServiceKind::Audio)
        .expect("audio still resolves");
    assert_eq!(&first, second);
    assert_eq!(first.endpoint.as_str(), "ipc://audio");
    assert_eq!(context.platform().service_lookups(ServiceKind::Audio), 1);

    assert!(context.sensor_service().is_some());
    assert_eq!(context.platform().service_lookups(ServiceKind::Sensor), 1);
    assert_eq!(
        context.platform().service_lookups(ServiceKind::Power),
        0,
        "unasked services are never resolved"
    );
}

#[test]
fn service_denial_is_pinned() {
    let platform = HostPlatform::new(BuildProfile::new("GT-I9000", "10"));
    platform.deny_service(ServiceKind::Keyguard);
    let context = DeviceContext::new(platform).expect("context should build");

    assert!(context.keyguard_service().is_none());

    context.platform().allow_service(ServiceKind::Keyguard);
    assert!(
        context.keyguard_service().is_none(),
        "the denial was pinned, not retried"
    );
    assert_eq!(context.platform().service_lookups(ServiceKind::Keyguard), 1);

    assert!(
        context.connectivity_service().is_some(),
        "other kinds are unaffected"
    );
}

#[test]
fn app_version_failure_pins_the_fallback() {
    let platform = HostPlatform::new(BuildProfile::new("GT-I9000", "10"));
    platform.fail_registry(true);
    let context = DeviceContext::new(platform).expect("context should build");

    assert!(context.app_version().is_fallback());
    assert_eq!(context.version_code(), 0);
    assert_eq!(context.version_name(), "0.0");

    context.platform().fail_registry(false);
    context
        .platform()
        .set_app_version(AppVersion::new(7, "7.0.1"));
    assert!(
        context.app_version().is_fallback(),
        "the lookup is never retried"
    );
    assert_eq!(context.platform().registry_lookups(), 1);
}

#[test]
fn equipment_errors_propagate_and_are_not_cached() {
    let context = context("GT-I9000", "10");
    context.platform().fail_telephony(true);

    assert!(matches!(
        context.equipment_id(),
        Err(TelephonyError::Unavailable(_))
    ));

    context.platform().fail_telephony(false);
    context.platform().set_equipment_id(Some("356938035643809"));
    assert_eq!(
        context.equipment_id().expect("telephony recovered"),
        Some("356938035643809")
    );
    assert_eq!(
        context.equipment_id().expect("cached"),
        Some("356938035643809")
    );
    assert_eq!(
        context.platform().telephony_queries(),
        2,
        "the success was cached, the error was not"
    );
}

#[test]
fn absent_equipment_id_counts_as_a_successful_query() {
    let context = context("GT-I9000", "10");

    assert_eq!(context.equipment_id().expect("query succeeds"), None);

    context.platform().set_equipment_id(Some("356938035643809"));
    assert_eq!(
        context.equipment_id().expect("still the pinned answer"),
        None,
        "absence was cached like any other success"
    );
    assert_eq!(context.platform().telephony_queries(), 1);
}

#[test]
fn wake_lock_acquire_is_idempotent() {
    let context = context("GT-I9000", "10");
    assert!(!context.wake_lock_held());

    assert!(context.acquire_wake_lock());
    assert!(context.acquire_wake_lock(), "second acquire is a no-op");
    assert!(context.wake_lock_held());
    assert_eq!(context.platform().wake_locks_built(), 1);
    assert_eq!(context.platform().wake_acquires(), 1);

    assert!(context.release_wake_lock());
    assert!(!context.wake_lock_held());
    assert_eq!(context.platform().wake_releases(), 1);

    assert!(context.acquire_wake_lock(), "lock is reusable after release");
    assert_eq!(
        context.platform().wake_locks_built(),
        1,
        "the lock is constructed exactly once"
    );
    assert_eq!(context.platform().wake_acquires(), 2);
}

#[test]
fn release_without_acquire_reports_success() {
    let context = context("GT-I9000", "10");

    assert!(context.release_wake_lock());
    assert!(context.release_wake_lock());
    assert_eq!(
        context.platform().wake_locks_built(),
        0,
        "release never constructs the lock"
    );
    assert_eq!(context.platform().wake_releases(), 0);
}

#[test]
fn denied_wake_lock_reports_false_and_construction_retries() {
    let context = context("GT-I9000", "10");
    context.platform().deny_wake_lock(true);

    assert!(!context.acquire_wake_lock());
    assert!(!context.wake_lock_held());

    context.platform().deny_wake_lock(false);
    assert!(
        context.acquire_wake_lock(),
        "construction is retried after a denial"
    );
    assert!(context.wake_lock_held());
}

#[test]
fn failed_acquire_reports_false_but_keeps_the_lock() {
    let context = context("GT-I9000", "10");
    context.platform().fail_wake_acquire(true);

    assert!(!context.acquire_wake_lock());
    assert!(!context.wake_lock_held());

    context.platform().fail_wake_acquire(false);
    assert!(context.acquire_wake_lock());
    assert_eq!(
        context.platform().wake_locks_built(),
        1,
        "a constructed lock survives a failed acquire"
    );
}

#[test]
fn failed_release_reports_false_and_stays_held() {
    let context = context("GT-I9000", "10");
    assert!(context.acquire_wake_lock());

    context.platform().fail_wake_release(true);
    assert!(!context.release_wake_lock());
    assert!(
        context.wake_lock_held(),
        "a rejected release leaves the device awake"
    );

    context.platform().fail_wake_release(false);
    assert!(context.release_wake_lock());
    assert!(!context.wake_lock_held());
    assert_eq!(context.platform().wake_releases(), 1);
}

#[test]
fn concurrent_urn_derivation_happens_once() {
    let platform = Arc::new(HostPlatform::new(BuildProfile::new("GT-I9000", "10")));
    platform.set_line_number(Some("15551234567"));
    let context = DeviceContext::new(Arc::clone(&platform)).expect("context should build");

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                assert_eq!(context.device_urn().to_string(), "urn:tel:15551234567");
            });
        }
    });

    assert_eq!(platform.telephony_queries(), 1, "derivation ran exactly once");
}

#[test]
fn concurrent_acquires_hold_exactly_one_lock() {
    let platform = Arc::new(HostPlatform::new(BuildProfile::new("GT-I9000", "10")));
    let context = DeviceContext::new(Arc::clone(&platform)).expect("context should build");

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| assert!(context.acquire_wake_lock()));
        }
    });

    assert_eq!(platform.wake_locks_built(), 1);
    assert_eq!(platform.wake_acquires(), 1);
    assert!(context.wake_lock_held());
}

struct DeadPlatform;

impl Platform for DeadPlatform {
    fn build_profile(&self) -> Result<BuildProfile, ServiceError> {
        Err(ServiceError::Unsupported)
    }

    fn service(&self, kind: ServiceKind) -> Result<ServiceHandle, ServiceError> {
        Err(ServiceError::Denied(kind))
    }

    fn line_number(&self) -> Result<Option<String>, TelephonyError> {
        Err(TelephonyError::Unsupported)
    }

    fn equipment_id(&self) -> Result<Option<String>, TelephonyError> {
        Err(TelephonyError::Unsupported)
    }

    fn app_version(&self) -> Result<AppVersion, RegistryError> {
        Err(RegistryError::Unsupported)
    }

    fn wake_lock(&self, _tag: &str) -> Result<Box<dyn WakeLock>, PowerError> {
        Err(PowerError::Unsupported)
    }
}

#[test]
fn construction_requires_a_build_profile() {
    let err = DeviceContext::new(DeadPlatform)
        .err()
        .expect("no profile, no context");
    assert_eq!(err, ContextError::Platform(ServiceError::Unsupported));
}
