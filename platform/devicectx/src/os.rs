// Copyright 2026 NGN Stack Contributors
// SPDX-License-Identifier: Apache-2.0

//! OS platform backend.
//!
//! Placeholder for the real service wiring. Every operation currently
//! returns the matching `Unsupported` error so callers degrade the same way
//! they would on a device with the subsystem missing.

use crate::{
    AppVersion, BuildProfile, Platform, PowerError, RegistryError, ServiceError, ServiceHandle,
    ServiceKind, TelephonyError, WakeLock,
};

/// Stub [`Platform`] used until OS service transport lands.
#[derive(Debug, Default)]
pub struct OsPlatform;

impl OsPlatform {
    /// Creates the stub platform.
    pub fn new() -> Self {
        Self
    }
}

impl Platform for OsPlatform {
    fn build_profile(&self) -> Result<BuildProfile, ServiceError> {
        Err(ServiceError::Unsupported)
    }

    fn service(&self, _kind: ServiceKind) -> Result<ServiceHandle, ServiceError> {
        Err(ServiceError::Unsupported)
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
