// Copyright (C) 2026 The display-brightness project authors. Distributed under the 0BSD license.

//! Display handles and identity matching.

use std::fmt;

/// Opaque identifier of a physical display, as reported by the display
/// enumeration API (a `CGDirectDisplayID` on macOS).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DisplayId(pub u32);

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Opaque handle to the device-service registry entry backing a display (an
/// `io_service_t` on macOS). A zero port means no matching entry was found;
/// the lowest brightness tier will then fail with the kernel's error code.
///
/// A port is only valid until the display configuration changes. It is held
/// for one resolve→use→release cycle by a
/// [`BrightnessDevice`](crate::blocking::BrightnessDevice), which releases it
/// when dropped.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ServicePort(pub u32);

impl ServicePort {
    /// Returns `true` if no registry entry matched the display.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// A display paired with its service registry entry.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DisplayTarget {
    /// Display handle used by the upper brightness tiers.
    pub display: DisplayId,
    /// Service registry entry used by the lowest brightness tier.
    pub service: ServicePort,
}

/// Identity triple reported by the display enumeration API for one display.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DisplayIdentity {
    /// Vendor number.
    pub vendor: u32,
    /// Model (product) number.
    pub product: u32,
    /// Serial number.
    pub serial: u32,
}

/// One numeric field read from a service registry entry's info dictionary.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RegistryField {
    /// The key is absent. Compares equal to a reported value of zero, since
    /// the registry omits fields the device does not report.
    Missing,
    /// The key is present but its value could not be read as an integer.
    /// Never matches.
    Unreadable,
    /// The field's value, widened to avoid truncation.
    Value(i64),
}

impl RegistryField {
    fn matches(self, wanted: u32) -> bool {
        match self {
            RegistryField::Missing => wanted == 0,
            RegistryField::Unreadable => false,
            RegistryField::Value(value) => value == i64::from(wanted),
        }
    }
}

/// Identity triple read from a service registry entry.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RegistryIdentity {
    /// Vendor field.
    pub vendor: RegistryField,
    /// Product field.
    pub product: RegistryField,
    /// Serial number field.
    pub serial: RegistryField,
}

impl RegistryIdentity {
    /// Returns `true` if the registry entry belongs to the given display.
    /// All three fields must compare equal; one mismatch excludes the entry.
    pub fn matches(&self, identity: &DisplayIdentity) -> bool {
        self.vendor.matches(identity.vendor)
            && self.product.matches(identity.product)
            && self.serial.matches(identity.serial)
    }
}
