// Copyright (C) 2026 The display-brightness project authors. Distributed under the 0BSD license.

//! Stub for platforms without a supported hardware-brightness API.
//!
//! Enumerates no displays, so [`internal_display`](crate::blocking::internal_display)
//! reports [`Error::NoDisplayFound`]. This keeps the policy core and its
//! tests building on every platform.

use crate::backend::AvailableCapabilities;
use crate::blocking::BrightnessDevice;
use crate::display::ServicePort;
use crate::Error;
use std::iter;

pub(crate) fn capabilities() -> AvailableCapabilities {
    AvailableCapabilities::default()
}

pub(crate) fn brightness_devices() -> impl Iterator<Item = Result<BrightnessDevice, Error>> {
    iter::empty()
}

pub(crate) fn release_service(_service: ServicePort) {}
