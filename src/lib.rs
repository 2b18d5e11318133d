// Copyright (C) 2026 The display-brightness project authors. Distributed under the 0BSD license.

//! # Overview
//!
//! This crate provides definitions to get and set the hardware brightness of
//! macOS displays.
//!
//! Brightness is read and written through the first of three OS API tiers
//! that services the call: the modern DisplayServices calls, the CoreDisplay
//! user-brightness calls, and finally the public IOKit display parameters.
//! Which tiers exist depends on the macOS version; [`capabilities`] reports
//! what was found on the running system. The crate compiles on other
//! platforms but enumerates no displays there.
//!
//! # Example
//!
//! ```rust
//! use display_brightness::Brightness;
//!
//! async fn dim() -> Result<(), display_brightness::Error> {
//!     let mut display = display_brightness::internal_display().await?;
//!     let level = display.get().await?;
//!     display.set(level - 0.1).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Caveats
//!
//! The CoreDisplay user-brightness setter reports neither success nor
//! failure, so a write through that tier is assumed to have worked. This is
//! a platform limitation, not something the crate can detect.
//!
//! Service handles resolved during enumeration are only valid until the
//! display configuration changes; re-resolve devices after plugging or
//! unplugging displays.

#![deny(warnings)]
#![deny(missing_docs)]

pub mod backend;
pub mod blocking;
mod display;

use thiserror::Error;

pub use crate::backend::AvailableCapabilities;
pub use crate::display::{
    DisplayId, DisplayIdentity, DisplayTarget, RegistryField, RegistryIdentity, ServicePort,
};

#[cfg(feature = "async")]
use async_trait::async_trait;
#[cfg(feature = "async")]
use futures::Stream;

/// Errors used in this API.
///
/// All errors are terminal for the call that produced them; no tier is
/// retried and no retry spans calls.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Display enumeration failed or found no online display.
    #[error("no online display found")]
    NoDisplayFound,

    /// The capability check says the display's brightness cannot be changed.
    #[error("brightness of display {display} cannot be adjusted")]
    BrightnessNotAdjustable {
        /// Display the write targeted.
        display: DisplayId,
    },

    /// The capability check says the display's brightness cannot be read.
    #[error("brightness of display {display} cannot be read")]
    BrightnessNotReadable {
        /// Display the read targeted.
        display: DisplayId,
    },

    /// The display-parameter call failed; `code` is the kernel return code,
    /// unchanged.
    #[error("display parameter call failed for display {display} (error {code})")]
    IoDisplayParameter {
        /// Display the call targeted.
        display: DisplayId,
        /// Kernel return code.
        code: i32,
    },

    /// Every tier in the chain declined the call. Unreachable with the
    /// native chain, whose lowest tier always completes.
    #[error("no brightness API completed the call for display {display}")]
    ExhaustedBackends {
        /// Display the call targeted.
        display: DisplayId,
    },
}

/// Returns which optional brightness entry points exist on this system.
///
/// Computed once at startup; always empty on platforms other than macOS.
pub fn capabilities() -> AvailableCapabilities {
    blocking::platform::capabilities()
}

/// Interface to get and set brightness.
#[cfg(feature = "async")]
#[async_trait]
pub trait Brightness {
    /// Returns the handle of the display this device controls.
    fn display_id(&self) -> DisplayId;

    /// Returns the current brightness in `[0.0, 1.0]`.
    async fn get(&self) -> Result<f32, Error>;

    /// Sets the brightness. The level is clamped into `[0.0, 1.0]`.
    async fn set(&mut self, level: f32) -> Result<(), Error>;
}

/// Brightness device.
#[cfg(feature = "async")]
#[derive(Debug)]
pub struct BrightnessDevice(blocking::BrightnessDevice);

#[cfg(feature = "async")]
impl From<blocking::BrightnessDevice> for BrightnessDevice {
    fn from(device: blocking::BrightnessDevice) -> Self {
        BrightnessDevice(device)
    }
}

#[cfg(feature = "async")]
#[async_trait]
impl Brightness for BrightnessDevice {
    fn display_id(&self) -> DisplayId {
        blocking::Brightness::display_id(&self.0)
    }

    // The underlying OS calls are quick and synchronous, so they are safe to
    // make from an async context without spawning blocking tasks.

    async fn get(&self) -> Result<f32, Error> {
        blocking::Brightness::get(&self.0)
    }

    async fn set(&mut self, level: f32) -> Result<(), Error> {
        blocking::Brightness::set(&self.0, level)
    }
}

/// Returns all online displays as brightness devices.
#[cfg(feature = "async")]
pub fn brightness_devices() -> impl Stream<Item = Result<BrightnessDevice, Error>> {
    futures::stream::iter(blocking::brightness_devices().map(|r| r.map(BrightnessDevice)))
}

/// Returns the built-in display.
///
/// Takes the first enumerated display, which on a laptop is the internal
/// panel; see [`blocking::internal_display`].
#[cfg(feature = "async")]
pub async fn internal_display() -> Result<BrightnessDevice, Error> {
    blocking::internal_display().map(BrightnessDevice)
}

#[cfg(all(test, feature = "async"))]
mod tests {
    use super::*;
    use crate::backend::{Controller, DisplayServicesBackend};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn async_device_delegates_to_blocking() {
        let stored = Arc::new(Mutex::new(0.25f32));
        let read = stored.clone();
        let written = stored.clone();
        let backend = DisplayServicesBackend::new(
            Some(Box::new(move |_| Ok(*read.lock().unwrap()))),
            Some(Box::new(move |_, level| {
                *written.lock().unwrap() = level;
                0
            })),
        );
        let inner = blocking::BrightnessDevice::from_parts(
            DisplayTarget {
                display: DisplayId(3),
                service: ServicePort(0),
            },
            Controller::new(vec![Box::new(backend)]),
        );
        let mut device = BrightnessDevice::from(inner);
        assert_eq!(device.display_id(), DisplayId(3));
        assert_eq!(device.get().await.unwrap(), 0.25);
        device.set(0.5).await.unwrap();
        assert_eq!(device.get().await.unwrap(), 0.5);
        assert_eq!(*stored.lock().unwrap(), 0.5);
    }
}
