// Copyright 2026 NGN Stack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Memoizing device context.
//!
//! One `DeviceContext` is built at engine startup and shared for the life of
//! the process. It resolves everything the engine repeatedly asks the
//! platform for (service handles, the device URN, the application version)
//! exactly once, and pins the answer. Failures at this layer are absorbed:
//! lookups degrade to `None` or a placeholder and the failure is logged, so
//! call sites stay infallible. The exception is construction itself, which
//! refuses to produce a context with an unusable build profile.

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use log::{debug, warn};

use crate::identity::DeviceUrn;
use crate::quirks::{is_htc_model, is_samsung_model, QuirkTable};
use crate::{
    AppVersion, ContextError, Platform, Resolved, ServiceHandle, ServiceKind, TelephonyError,
    WakeLock,
};

/// Tag reported to the power service when constructing the wake lock.
const WAKE_TAG: &str = "devicectx";

/// Process-wide device facts and memoized OS handles.
pub struct DeviceContext<P: Platform> {
    platform: P,
    model: String,
    sdk_version: u32,
    quirks: QuirkTable,
    urn: OnceCell<DeviceUrn>,
    equipment_id: OnceCell<Option<String>>,
    app_version: OnceCell<Resolved<AppVersion>>,
    services: [OnceCell<Option<ServiceHandle>>; ServiceKind::ALL.len()],
    wake: Mutex<Option<Box<dyn WakeLock>>>,
}

impl<P: Platform> DeviceContext<P> {
    /// Builds a context over `platform` with the built-in quirk table.
    ///
    /// Fails when the platform cannot report a build profile or reports an
    /// SDK release that is not a decimal integer.
    pub fn new(platform: P) -> Result<Self, ContextError> {
        Self::with_quirks(platform, QuirkTable::builtin())
    }

    /// Builds a context with a caller-supplied quirk table.
    pub fn with_quirks(platform: P, quirks: QuirkTable) -> Result<Self, ContextError> {
        let profile = platform.build_profile()?;
        let sdk_version = profile
            .sdk
            .trim()
            .parse::<u32>()
            .map_err(|_| ContextError::MalformedSdk(profile.sdk.clone()))?;
        let context = Self {
            platform,
            model: profile.model,
            sdk_version,
            quirks,
            urn: OnceCell::new(),
            equipment_id: OnceCell::new(),
            app_version: OnceCell::new(),
            services: Default::default(),
            wake: Mutex::new(None),
        };
        debug!(
            "device context ready: model={} sdk={}",
            context.model, context.sdk_version
        );
        Ok(context)
    }

    /// The platform the context was built over.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Device model as reported by the platform, verbatim.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// OS API level parsed from the build profile.
    pub fn sdk_version(&self) -> u32 {
        self.sdk_version
    }

    /// True on Samsung hardware, by model prefix or substring.
    pub fn is_samsung(&self) -> bool {
        is_samsung_model(&self.model)
    }

    /// True on HTC hardware, by model prefix.
    pub fn is_htc(&self) -> bool {
        is_htc_model(&self.model)
    }

    /// Loudspeaker routing needs the forced audio mode workaround here.
    pub fn speaker_mode_hack(&self) -> bool {
        self.quirks.flags(&self.model).speaker_mode_hack
    }

    /// The device tolerates an explicit audio mode switch around calls.
    pub fn set_mode_allowed(&self) -> bool {
        self.quirks.flags(&self.model).set_mode_allowed
    }

    /// Proximity readings cannot be trusted during calls on this model.
    pub fn buggy_proximity_sensor(&self) -> bool {
        self.quirks.flags(&self.model).buggy_proximity_sensor
    }

    /// Audio sessions must be torn down and rebuilt between calls here.
    pub fn audio_recreate_required(&self) -> bool {
        self.quirks.flags(&self.model).audio_recreate
    }

    /// Hardware automatic gain control is usable on this device.
    pub fn agc_supported(&self) -> bool {
        // Samsung and HTC builds ship a usable hardware AGC.
        self.is_samsung() || self.is_htc()
    }

    /// Application version, resolved once against the package registry.
    ///
    /// A failed lookup is logged and pinned as the `0`/`0.0` fallback; it is
    /// not retried.
    pub fn app_version(&self) -> &Resolved<AppVersion> {
        self.app_version
            .get_or_init(|| match self.platform.app_version() {
                Ok(version) => Resolved::Reported(version),
                Err(err) => {
                    warn!("app version lookup failed, using fallback: {err}");
                    Resolved::Fallback(AppVersion::fallback())
                }
            })
    }

    /// Numeric install counter from [`DeviceContext::app_version`].
    pub fn version_code(&self) -> u32 {
        self.app_version().value().code
    }

    /// Display string from [`DeviceContext::app_version`].
    pub fn version_name(&self) -> &str {
        &self.app_version().value().name
    }

    /// Device URN, derived once and pinned, placeholder included. A
    /// derivation that degraded to the placeholder is never retried; the
    /// process keeps one identity for its whole life.
    pub fn device_urn(&self) -> &DeviceUrn {
        self.urn.get_or_init(|| DeviceUrn::derive(&self.platform))
    }

    /// Hardware equipment identifier, cached after the first successful
    /// query. Telephony errors propagate and leave the cache empty, so a
    /// later call queries again.
    pub fn equipment_id(&self) -> Result<Option<&str>, TelephonyError> {
        let cached = self
            .equipment_id
            .get_or_try_init(|| self.platform.equipment_id())?;
        Ok(cached.as_deref())
    }

    /// Memoized handle for `kind`.
    ///
    /// The first call asks the platform; the answer is pinned for the life
    /// of the context. A denial is logged, surfaces as `None`, and is
    /// pinned like any other answer.
    pub fn service(&self, kind: ServiceKind) -> Option<&ServiceHandle> {
        self.services[kind.index()]
            .get_or_init(|| match self.platform.service(kind) {
                Ok(handle) => Some(handle),
                Err(err) => {
                    warn!("service {kind} unavailable: {err}");
                    None
                }
            })
            .as_ref()
    }

    /// Memoized audio service handle.
    pub fn audio_service(&self) -> Option<&ServiceHandle> {
        self.service(ServiceKind::Audio)
    }

    /// Memoized sensor service handle.
    pub fn sensor_service(&self) -> Option<&ServiceHandle> {
        self.service(ServiceKind::Sensor)
    }

    /// Memoized keyguard service handle.
    pub fn keyguard_service(&self) -> Option<&ServiceHandle> {
        self.service(ServiceKind::Keyguard)
    }

    /// Memoized connectivity service handle.
    pub fn connectivity_service(&self) -> Option<&ServiceHandle> {
        self.service(ServiceKind::Connectivity)
    }

    /// Memoized power service handle.
    pub fn power_service(&self) -> Option<&ServiceHandle> {
        self.service(ServiceKind::Power)
    }

    /// Holds the device awake. The wake lock is constructed on first use
    /// and acquired only when not already held, so repeat calls are no-ops.
    /// Returns whether the device is now held awake. A failed construction
    /// is retried on the next call.
    pub fn acquire_wake_lock(&self) -> bool {
        let mut slot = self.wake.lock();
        if slot.is_none() {
            match self.platform.wake_lock(WAKE_TAG) {
                Ok(lock) => *slot = Some(lock),
                Err(err) => {
                    warn!("wake lock construction failed: {err}");
                    return false;
                }
            }
        }
        match slot.as_mut() {
            Some(lock) if !lock.is_held() => match lock.acquire() {
                Ok(()) => {
                    debug!("wake lock acquired");
                    true
                }
                Err(err) => {
                    warn!("wake lock acquire failed: {err}");
                    false
                }
            },
            _ => true,
        }
    }

    /// Lets the device sleep if the wake lock is held; a no-op otherwise.
    /// Returns false only when the OS rejects the release.
    pub fn release_wake_lock(&self) -> bool {
        let mut slot = self.wake.lock();
        match slot.as_mut() {
            Some(lock) if lock.is_held() => match lock.release() {
                Ok(()) => {
                    debug!("wake lock released");
                    true
                }
                Err(err) => {
                    warn!("wake lock release failed: {err}");
                    false
                }
            },
            _ => true,
        }
    }

    /// Whether the wake lock currently holds the device awake.
    pub fn wake_lock_held(&self) -> bool {
        self.wake.lock().as_ref().is_some_and(|lock| lock.is_held())
    }
}
