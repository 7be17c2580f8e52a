// Copyright 2026 NGN Stack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Device and platform context facade used by the NGN client engine.
//!
//! The engine reaches the operating system through the [`Platform`] trait:
//! service lookups, telephony identity, package metadata, and wake locks.
//! [`DeviceContext`] layers the policy the engine expects on top of it:
//! memoized service handles, a device URN pinned on first derivation with a
//! fixed placeholder fallback, per-model quirk predicates, and a single
//! idempotent wake lock. Host builds ship a scriptable in-memory platform
//! for tests; OS builds currently provide stubs that return `Unsupported`
//! until real service wiring lands.

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

#[cfg(all(feature = "backend-host", feature = "backend-os"))]
compile_error!("Choose exactly one backend feature.");

#[cfg(not(any(feature = "backend-host", feature = "backend-os")))]
compile_error!("Select a backend feature.");

pub mod context;
pub mod identity;
pub mod quirks;

#[cfg(feature = "backend-host")]
mod host;
#[cfg(feature = "backend-os")]
mod os;

/// Memoizing context over a [`Platform`].
pub use context::DeviceContext;
/// Device URN derivation and rendering.
pub use identity::{DeviceUrn, FALLBACK_URN_UUID};
/// Model quirk table and vendor predicates.
pub use quirks::{is_htc_model, is_samsung_model, QuirkError, QuirkFlags, QuirkTable};

/// Scriptable in-memory platform for host builds and tests.
#[cfg(feature = "backend-host")]
pub use host::{HostPlatform, HostWakeLock};
/// Stub platform for OS builds.
#[cfg(feature = "backend-os")]
pub use os::OsPlatform;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Address at which an OS service can be reached.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    /// Creates an endpoint from any string-like address.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Endpoint {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The OS services the engine consults through the context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceKind {
    /// Audio routing and volume control.
    Audio,
    /// Motion and proximity sensors.
    Sensor,
    /// Screen lock state.
    Keyguard,
    /// Network reachability.
    Connectivity,
    /// Wake lock issuance.
    Power,
}

impl ServiceKind {
    /// Every kind, in a stable order.
    pub const ALL: [ServiceKind; 5] = [
        ServiceKind::Audio,
        ServiceKind::Sensor,
        ServiceKind::Keyguard,
        ServiceKind::Connectivity,
        ServiceKind::Power,
    ];

    /// Short lowercase name used in endpoints and log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceKind::Audio => "audio",
            ServiceKind::Sensor => "sensor",
            ServiceKind::Keyguard => "keyguard",
            ServiceKind::Connectivity => "connectivity",
            ServiceKind::Power => "power",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to a live OS service connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceHandle {
    /// Which service the handle points at.
    pub kind: ServiceKind,
    /// Where the service can be reached.
    pub endpoint: Endpoint,
}

impl ServiceHandle {
    /// Creates a handle for `kind` reachable at `endpoint`.
    pub fn new(kind: ServiceKind, endpoint: Endpoint) -> Self {
        Self { kind, endpoint }
    }
}

/// Immutable build facts reported by the platform at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildProfile {
    /// Device model string, e.g. `GT-I9000`.
    pub model: String,
    /// OS release expressed as a decimal API level, e.g. `10`.
    pub sdk: String,
}

impl BuildProfile {
    /// Creates a profile from model and SDK release strings.
    pub fn new(model: impl Into<String>, sdk: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            sdk: sdk.into(),
        }
    }
}

/// Installed application version, as recorded by the package registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppVersion {
    /// Monotonically increasing install counter.
    pub code: u32,
    /// Human-readable version string.
    pub name: String,
}

impl AppVersion {
    /// Creates a version from its registry fields.
    pub fn new(code: u32, name: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
        }
    }

    /// Version substituted when the registry lookup fails: code `0`, name `0.0`.
    pub fn fallback() -> Self {
        Self::new(0, "0.0")
    }
}

/// A value that either came from the platform or was substituted locally.
///
/// Callers that only need the value use [`Resolved::value`]; callers that
/// must tell real data from placeholders match on the variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolved<T> {
    /// The platform supplied the value.
    Reported(T),
    /// The platform failed and a local placeholder was substituted.
    Fallback(T),
}

impl<T> Resolved<T> {
    /// Borrows the inner value regardless of provenance.
    pub fn value(&self) -> &T {
        match self {
            Resolved::Reported(value) | Resolved::Fallback(value) => value,
        }
    }

    /// Consumes the wrapper, returning the inner value.
    pub fn into_value(self) -> T {
        match self {
            Resolved::Reported(value) | Resolved::Fallback(value) => value,
        }
    }

    /// True when the value is a locally substituted placeholder.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolved::Fallback(_))
    }
}

/// Service registry failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The platform refused to hand out the service.
    #[error("service `{0}` denied by the platform")]
    Denied(ServiceKind),
    /// The backend has no service registry.
    #[error("service registry unsupported in this environment")]
    Unsupported,
}

/// Telephony subsystem failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TelephonyError {
    /// The telephony service exists but could not answer.
    #[error("telephony unavailable: {0}")]
    Unavailable(String),
    /// The backend has no telephony subsystem.
    #[error("telephony unsupported in this environment")]
    Unsupported,
}

/// Package registry failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The lookup reached the registry but failed.
    #[error("package registry lookup failed: {0}")]
    Lookup(String),
    /// The backend has no package registry.
    #[error("package registry unsupported in this environment")]
    Unsupported,
}

/// Power management failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PowerError {
    /// The power service refused the request.
    #[error("wake lock denied: {0}")]
    Denied(String),
    /// The backend has no power manager.
    #[error("power management unsupported in this environment")]
    Unsupported,
}

/// Fatal failures while constructing a [`DeviceContext`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    /// The platform could not report its build profile.
    #[error("build profile unavailable: {0}")]
    Platform(#[from] ServiceError),
    /// The reported SDK release is not a decimal integer.
    #[error("malformed sdk release `{0}`")]
    MalformedSdk(String),
}

/// Low-level OS surface the context is built on.
///
/// Implementations must be callable from multiple threads. The context
/// layers caching on top, so a platform query for a given datum happens at
/// most once per context unless it errors.
pub trait Platform: Send + Sync {
    /// Reports the device model and OS release.
    fn build_profile(&self) -> Result<BuildProfile, ServiceError>;

    /// Connects to one of the well-known OS services.
    fn service(&self, kind: ServiceKind) -> Result<ServiceHandle, ServiceError>;

    /// Subscriber line number, if the device has one provisioned.
    fn line_number(&self) -> Result<Option<String>, TelephonyError>;

    /// Hardware equipment identifier, if the device exposes one.
    fn equipment_id(&self) -> Result<Option<String>, TelephonyError>;

    /// Version of the running application per the package registry.
    fn app_version(&self) -> Result<AppVersion, RegistryError>;

    /// Constructs a partial wake lock identified by `tag`. Partial locks
    /// keep the CPU running without lighting the display. The lock starts
    /// released.
    fn wake_lock(&self, tag: &str) -> Result<Box<dyn WakeLock>, PowerError>;
}

impl<P: Platform + ?Sized> Platform for Arc<P> {
    fn build_profile(&self) -> Result<BuildProfile, ServiceError> {
        (**self).build_profile()
    }

    fn service(&self, kind: ServiceKind) -> Result<ServiceHandle, ServiceError> {
        (**self).service(kind)
    }

    fn line_number(&self) -> Result<Option<String>, TelephonyError> {
        (**self).line_number()
    }

    fn equipment_id(&self) -> Result<Option<String>, TelephonyError> {
        (**self).equipment_id()
    }

    fn app_version(&self) -> Result<AppVersion, RegistryError> {
        (**self).app_version()
    }

    fn wake_lock(&self, tag: &str) -> Result<Box<dyn WakeLock>, PowerError> {
        (**self).wake_lock(tag)
    }
}

/// A handle that keeps the device awake while held.
///
/// Locks are not reference counted: however many times `acquire` succeeds,
/// one `release` lets the device sleep.
pub trait WakeLock: Send {
    /// Asks the OS to hold the device awake.
    fn acquire(&mut self) -> Result<(), PowerError>;

    /// Lets the device sleep again.
    fn release(&mut self) -> Result<(), PowerError>;

    /// Whether the OS currently considers the lock held.
    fn is_held(&self) -> bool;
}
