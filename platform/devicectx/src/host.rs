// Copyright 2026 NGN Stack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scriptable in-memory platform backend.
//!
//! Host builds and tests run against this backend instead of a real OS. The
//! platform starts healthy (every service resolvable, telephony and the
//! package registry answering) and individual subsystems can be degraded
//! through the `set_*`, `deny_*`, and `fail_*` methods. Counters record how
//! often the engine actually reached the backend, which is what the caching
//! tests assert on.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    AppVersion, BuildProfile, Endpoint, Platform, PowerError, RegistryError, ServiceError,
    ServiceHandle, ServiceKind, TelephonyError, WakeLock,
};

/// In-memory [`Platform`] with fault injection and call counters.
pub struct HostPlatform {
    state: Arc<Mutex<HostState>>,
}

#[derive(Debug)]
struct HostState {
    profile: BuildProfile,
    line_number: Option<String>,
    equipment_id: Option<String>,
    app_version: AppVersion,
    telephony_down: bool,
    registry_down: bool,
    wake_denied: bool,
    wake_acquire_fails: bool,
    wake_release_fails: bool,
    denied: BTreeSet<ServiceKind>,
    telephony_queries: u32,
    registry_lookups: u32,
    service_lookups: BTreeMap<ServiceKind, u32>,
    wake_locks_built: u32,
    wake_acquires: u32,
    wake_releases: u32,
    wake_held: bool,
}

impl HostPlatform {
    /// Creates a healthy platform reporting `profile`.
    pub fn new(profile: BuildProfile) -> Self {
        Self {
            state: Arc::new(Mutex::new(HostState {
                profile,
                line_number: None,
                equipment_id: None,
                app_version: AppVersion::new(1, "1.0.0"),
                telephony_down: false,
                registry_down: false,
                wake_denied: false,
                wake_acquire_fails: false,
                wake_release_fails: false,
                denied: BTreeSet::new(),
                telephony_queries: 0,
                registry_lookups: 0,
                service_lookups: BTreeMap::new(),
                wake_locks_built: 0,
                wake_acquires: 0,
                wake_releases: 0,
                wake_held: false,
            })),
        }
    }

    /// Scripts the subscriber line number returned by telephony.
    pub fn set_line_number(&self, number: Option<&str>) {
        self.state.lock().line_number = number.map(str::to_string);
    }

    /// Scripts the hardware equipment identifier returned by telephony.
    pub fn set_equipment_id(&self, id: Option<&str>) {
        self.state.lock().equipment_id = id.map(str::to_string);
    }

    /// Scripts the application version reported by the package registry.
    pub fn set_app_version(&self, version: AppVersion) {
        self.state.lock().app_version = version;
    }

    /// Makes every telephony query fail while `down` is set.
    pub fn fail_telephony(&self, down: bool) {
        self.state.lock().telephony_down = down;
    }

    /// Makes package registry lookups fail while `down` is set.
    pub fn fail_registry(&self, down: bool) {
        self.state.lock().registry_down = down;
    }

    /// Denies lookups of `kind` until [`HostPlatform::allow_service`].
    pub fn deny_service(&self, kind: ServiceKind) {
        self.state.lock().denied.insert(kind);
    }

    /// Clears a denial installed by [`HostPlatform::deny_service`].
    pub fn allow_service(&self, kind: ServiceKind) {
        self.state.lock().denied.remove(&kind);
    }

    /// Refuses wake lock construction while `denied` is set.
    pub fn deny_wake_lock(&self, denied: bool) {
        self.state.lock().wake_denied = denied;
    }

    /// Makes wake lock acquisition fail while `fails` is set.
    pub fn fail_wake_acquire(&self, fails: bool) {
        self.state.lock().wake_acquire_fails = fails;
    }

    /// Makes wake lock release fail while `fails` is set.
    pub fn fail_wake_release(&self, fails: bool) {
        self.state.lock().wake_release_fails = fails;
    }

    /// Number of line number and equipment identifier queries served.
    pub fn telephony_queries(&self) -> u32 {
        self.state.lock().telephony_queries
    }

    /// Number of package registry lookups served.
    pub fn registry_lookups(&self) -> u32 {
        self.state.lock().registry_lookups
    }

    /// Number of lookups served for `kind`, denials included.
    pub fn service_lookups(&self, kind: ServiceKind) -> u32 {
        self.state
            .lock()
            .service_lookups
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }

    /// Number of wake locks handed out.
    pub fn wake_locks_built(&self) -> u32 {
        self.state.lock().wake_locks_built
    }

    /// Number of successful acquire calls across all wake locks.
    pub fn wake_acquires(&self) -> u32 {
        self.state.lock().wake_acquires
    }

    /// Number of successful release calls across all wake locks.
    pub fn wake_releases(&self) -> u32 {
        self.state.lock().wake_releases
    }

    /// Whether the most recent wake lock operation left the device awake.
    pub fn wake_held(&self) -> bool {
        self.state.lock().wake_held
    }
}

impl Platform for HostPlatform {
    fn build_profile(&self) -> Result<BuildProfile, ServiceError> {
        Ok(self.state.lock().profile.clone())
    }

    fn service(&self, kind: ServiceKind) -> Result<ServiceHandle, ServiceError> {
        let mut state = self.state.lock();
        *state.service_lookups.entry(kind).or_insert(0) += 1;
        if state.denied.contains(&kind) {
            return Err(ServiceError::Denied(kind));
        }
        Ok(ServiceHandle::new(
            kind,
            Endpoint::new(format!("ipc://{kind}")),
        ))
    }

    fn line_number(&self) -> Result<Option<String>, TelephonyError> {
        let mut state = self.state.lock();
        state.telephony_queries += 1;
        if state.telephony_down {
            return Err(TelephonyError::Unavailable("telephony service down".into()));
        }
        Ok(state.line_number.clone())
    }

    fn equipment_id(&self) -> Result<Option<String>, TelephonyError> {
        let mut state = self.state.lock();
        state.telephony_queries += 1;
        if state.telephony_down {
            return Err(TelephonyError::Unavailable("telephony service down".into()));
        }
        Ok(state.equipment_id.clone())
    }

    fn app_version(&self) -> Result<AppVersion, RegistryError> {
        let mut state = self.state.lock();
        state.registry_lookups += 1;
        if state.registry_down {
            return Err(RegistryError::Lookup("package registry offline".into()));
        }
        Ok(state.app_version.clone())
    }

    fn wake_lock(&self, tag: &str) -> Result<Box<dyn WakeLock>, PowerError> {
        let mut state = self.state.lock();
        if state.wake_denied {
            return Err(PowerError::Denied(format!("wake lock `{tag}` refused")));
        }
        state.wake_locks_built += 1;
        Ok(Box::new(HostWakeLock {
            state: Arc::clone(&self.state),
            held: false,
        }))
    }
}

/// Wake lock handed out by [`HostPlatform`]; not reference counted.
pub struct HostWakeLock {
    state: Arc<Mutex<HostState>>,
    held: bool,
}

impl WakeLock for HostWakeLock {
    fn acquire(&mut self) -> Result<(), PowerError> {
        let mut state = self.state.lock();
        if state.wake_acquire_fails {
            return Err(PowerError::Denied("wake acquire rejected".into()));
        }
        state.wake_acquires += 1;
        state.wake_held = true;
        self.held = true;
        Ok(())
    }

    fn release(&mut self) -> Result<(), PowerError> {
        let mut state = self.state.lock();
        if state.wake_release_fails {
            return Err(PowerError::Denied("wake release rejected".into()));
        }
        state.wake_releases += 1;
        state.wake_held = false;
        self.held = false;
        Ok(())
    }

    fn is_held(&self) -> bool {
        self.held
    }
}

impl Drop for HostWakeLock {
    fn drop(&mut self) {
        // The OS reclaims a lock whose owner went away.
        if self.held {
            self.state.lock().wake_held = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> HostPlatform {
        HostPlatform::new(BuildProfile::new("GT-I9000", "10"))
    }

    #[test]
    fn healthy_platform_resolves_every_service() {
        let platform = host();
        for kind in ServiceKind::ALL {
            let handle = platform.service(kind).expect("service should resolve");
            assert_eq!(handle.kind, kind);
            assert_eq!(handle.endpoint.as_str(), format!("ipc://{kind}"));
        }
        assert_eq!(platform.service_lookups(ServiceKind::Audio), 1);
    }

    #[test]
    fn denied_service_errors_but_still_counts() {
        let platform = host();
        platform.deny_service(ServiceKind::Keyguard);
        assert_eq!(
            platform.service(ServiceKind::Keyguard),
            Err(ServiceError::Denied(ServiceKind::Keyguard))
        );
        assert_eq!(platform.service_lookups(ServiceKind::Keyguard), 1);

        platform.allow_service(ServiceKind::Keyguard);
        assert!(platform.service(ServiceKind::Keyguard).is_ok());
        assert_eq!(platform.service_lookups(ServiceKind::Keyguard), 2);
    }

    #[test]
    fn telephony_outage_is_reversible() {
        let platform = host();
        platform.set_line_number(Some("15551234567"));
        platform.fail_telephony(true);
        assert!(platform.line_number().is_err());
        assert!(platform.equipment_id().is_err());

        platform.fail_telephony(false);
        assert_eq!(
            platform.line_number().expect("telephony back up"),
            Some("15551234567".to_string())
        );
        assert_eq!(platform.telephony_queries(), 3);
    }

    #[test]
    fn wake_lock_round_trip_updates_counters() {
        let platform = host();
        let mut lock = platform.wake_lock("engine").expect("lock should build");
        assert_eq!(platform.wake_locks_built(), 1);
        assert!(!lock.is_held());

        lock.acquire().expect("acquire");
        assert!(lock.is_held());
        assert!(platform.wake_held());

        lock.release().expect("release");
        assert!(!lock.is_held());
        assert!(!platform.wake_held());
        assert_eq!(platform.wake_acquires(), 1);
        assert_eq!(platform.wake_releases(), 1);
    }

    #[test]
    fn denied_wake_lock_never_constructs() {
        let platform = host();
        platform.deny_wake_lock(true);
        assert!(platform.wake_lock("engine").is_err());
        assert_eq!(platform.wake_locks_built(), 0);
    }

    #[test]
    fn failing_acquire_leaves_lock_released() {
        let platform = host();
        let mut lock = platform.wake_lock("engine").expect("lock should build");
        platform.fail_wake_acquire(true);
        assert!(lock.acquire().is_err());
        assert!(!lock.is_held());
        assert_eq!(platform.wake_acquires(), 0);
    }

    #[test]
    fn failing_release_keeps_the_lock_held() {
        let platform = host();
        let mut lock = platform.wake_lock("engine").expect("lock should build");
        lock.acquire().expect("acquire");

        platform.fail_wake_release(true);
        assert!(lock.release().is_err());
        assert!(lock.is_held());
        assert!(platform.wake_held());
        assert_eq!(platform.wake_releases(), 0);
    }

    #[test]
    fn dropping_a_held_lock_lets_the_device_sleep() {
        let platform = host();
        let mut lock = platform.wake_lock("engine").expect("lock should build");
        lock.acquire().expect("acquire");
        assert!(platform.wake_held());
        drop(lock);
        assert!(!platform.wake_held());
    }
}
