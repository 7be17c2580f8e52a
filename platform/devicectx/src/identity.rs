// Copyright 2026 NGN Stack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Device URN derivation.
//!
//! SIP registration identifies the device by URN. Preference order: the
//! subscriber line number (`urn:tel:`), then the hardware equipment
//! identifier (`urn:imei:`), then a fixed placeholder UUID shared by every
//! device that reports neither.

use std::fmt;

use log::debug;

use crate::Platform;

/// UUID rendered into the placeholder URN when telephony yields nothing.
pub const FALLBACK_URN_UUID: &str = "3ca50bcb-7a67-44f1-afd0-994a55f930f4";

/// Stable identity a device registers under.
///
/// The variant records where the identity came from, so callers can tell a
/// real subscriber identity from the shared placeholder without parsing the
/// rendered string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceUrn {
    /// Derived from the subscriber line number.
    Tel(String),
    /// Derived from the hardware equipment identifier.
    Imei(String),
    /// Placeholder used when neither identifier was usable.
    Fallback,
}

impl DeviceUrn {
    /// Derives the URN from `platform`, preferring the line number over the
    /// equipment identifier. Telephony failures degrade to
    /// [`DeviceUrn::Fallback`]; derivation never errors.
    pub fn derive<P: Platform + ?Sized>(platform: &P) -> Self {
        match platform.line_number() {
            Ok(Some(number)) if !number.trim().is_empty() => return DeviceUrn::Tel(number),
            Ok(_) => {}
            Err(err) => {
                debug!("device urn: line number unavailable: {err}");
                return DeviceUrn::Fallback;
            }
        }
        match platform.equipment_id() {
            Ok(Some(id)) if !id.trim().is_empty() => DeviceUrn::Imei(id),
            Ok(_) => {
                debug!("device urn: no telephony identifier, using placeholder");
                DeviceUrn::Fallback
            }
            Err(err) => {
                debug!("device urn: equipment id unavailable: {err}");
                DeviceUrn::Fallback
            }
        }
    }

    /// True when the URN is the shared placeholder.
    pub fn is_fallback(&self) -> bool {
        matches!(self, DeviceUrn::Fallback)
    }

    /// The raw identifier the URN was derived from, if any.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            DeviceUrn::Tel(value) | DeviceUrn::Imei(value) => Some(value),
            DeviceUrn::Fallback => None,
        }
    }
}

impl fmt::Display for DeviceUrn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceUrn::Tel(number) => write!(f, "urn:tel:{number}"),
            DeviceUrn::Imei(id) => write!(f, "urn:imei:{id}"),
            DeviceUrn::Fallback => write!(f, "urn:uuid:{FALLBACK_URN_UUID}"),
        }
    }
}
