// Copyright (C) 2026 The display-brightness project authors. Distributed under the 0BSD license.

//! The blocking API.

use crate::backend::Controller;
use crate::display::{DisplayId, DisplayTarget};
use crate::Error;
use std::fmt;

cfg_if::cfg_if! {
    if #[cfg(target_os = "macos")] {
        pub(crate) mod macos;
        pub(crate) use self::macos as platform;
    } else {
        pub(crate) mod fallback;
        pub(crate) use self::fallback as platform;
    }
}

/// Blocking interface to get and set brightness.
///
/// Every call blocks on a single underlying OS call and returns once it
/// completes. Callers invoking concurrently from several threads must
/// serialize themselves if the OS display-service API is not reentrant.
pub trait Brightness {
    /// Returns the handle of the display this device controls.
    fn display_id(&self) -> DisplayId;

    /// Returns the current brightness in `[0.0, 1.0]`.
    fn get(&self) -> Result<f32, Error>;

    /// Sets the brightness. The level is clamped into `[0.0, 1.0]`.
    fn set(&self, level: f32) -> Result<(), Error>;
}

/// Blocking brightness device.
///
/// Owns the display's service registry entry for one resolve→use→release
/// cycle and releases it on drop. Do not hold a device across display
/// reconfiguration; re-resolve instead.
pub struct BrightnessDevice {
    target: DisplayTarget,
    controller: Controller,
}

impl BrightnessDevice {
    /// Creates a device over an explicit backend chain.
    ///
    /// [`brightness_devices`] builds devices over the native chain; this
    /// constructor exists for callers injecting their own tiers.
    pub fn from_parts(target: DisplayTarget, controller: Controller) -> Self {
        BrightnessDevice { target, controller }
    }
}

impl fmt::Debug for BrightnessDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrightnessDevice")
            .field("display", &self.target.display)
            .field("service", &self.target.service)
            .finish()
    }
}

impl Brightness for BrightnessDevice {
    fn display_id(&self) -> DisplayId {
        self.target.display
    }

    fn get(&self) -> Result<f32, Error> {
        self.controller.get(&self.target)
    }

    fn set(&self, level: f32) -> Result<(), Error> {
        let level = level.max(0.0).min(1.0);
        self.controller.set(&self.target, level)
    }
}

impl Drop for BrightnessDevice {
    fn drop(&mut self) {
        platform::release_service(self.target.service);
    }
}

/// Blocking function that returns all online displays as brightness devices.
pub fn brightness_devices() -> impl Iterator<Item = Result<BrightnessDevice, Error>> {
    platform::brightness_devices()
}

/// Blocking function that returns the built-in display.
///
/// This takes the first entry of the enumeration, which on a laptop is the
/// internal panel. It is a simplifying assumption, not a guarantee of which
/// physical display is selected.
pub fn internal_display() -> Result<BrightnessDevice, Error> {
    internal_from(brightness_devices())
}

fn internal_from<I>(mut devices: I) -> Result<BrightnessDevice, Error>
where
    I: Iterator<Item = Result<BrightnessDevice, Error>>,
{
    devices.next().unwrap_or(Err(Error::NoDisplayFound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Controller, DisplayServicesBackend};
    use crate::display::ServicePort;
    use std::iter;
    use std::sync::{Arc, Mutex};

    fn mock_device(display: u32, stored: Arc<Mutex<f32>>) -> BrightnessDevice {
        let read = stored.clone();
        let backend = DisplayServicesBackend::new(
            Some(Box::new(move |_| Ok(*read.lock().unwrap()))),
            Some(Box::new(move |_, level| {
                *stored.lock().unwrap() = level;
                0
            })),
        );
        BrightnessDevice::from_parts(
            DisplayTarget {
                display: DisplayId(display),
                service: ServicePort(0),
            },
            Controller::new(vec![Box::new(backend)]),
        )
    }

    #[test]
    fn empty_enumeration_yields_no_display_found() {
        let err = internal_from(iter::empty()).unwrap_err();
        assert!(matches!(err, Error::NoDisplayFound));
    }

    #[test]
    fn internal_display_is_first_enumerated() {
        let first = mock_device(1, Arc::new(Mutex::new(0.0)));
        let second = mock_device(2, Arc::new(Mutex::new(0.0)));
        let dev = internal_from(vec![Ok(first), Ok(second)].into_iter()).unwrap();
        assert_eq!(dev.display_id(), DisplayId(1));
    }

    #[test]
    fn set_clamps_into_unit_range() {
        let stored = Arc::new(Mutex::new(0.5f32));
        let dev = mock_device(1, stored.clone());
        dev.set(1.5).unwrap();
        assert_eq!(*stored.lock().unwrap(), 1.0);
        dev.set(-0.25).unwrap();
        assert_eq!(*stored.lock().unwrap(), 0.0);
        dev.set(0.5).unwrap();
        assert_eq!(dev.get().unwrap(), 0.5);
    }
}
