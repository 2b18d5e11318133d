// Copyright (C) 2026 The display-brightness project authors. Distributed under the 0BSD license.

//! Brightness backends and the fallback policy over them.
//!
//! The OS exposes up to three independent brightness APIs of different
//! vintages. Each is modeled as a [`BrightnessBackend`]; a [`Controller`]
//! tries them in fixed priority order and stops at the first tier that
//! completes the call, successfully or not. Entry points that may be missing
//! on older or newer OS releases are injected as optional closures, so every
//! tier can be exercised against a mocked platform.

use crate::display::{DisplayId, DisplayTarget};
use crate::Error;
use log::{debug, warn};

/// Entry points found on the running system, computed once at startup.
///
/// Each flag mirrors one optional symbol of the DisplayServices or
/// CoreDisplay tier. The lowest tier has no flag; its API is always linked.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct AvailableCapabilities {
    /// Modern get-brightness call.
    pub display_services_get: bool,
    /// Modern set-brightness call.
    pub display_services_set: bool,
    /// Query answering whether a display's brightness can be changed at all.
    pub can_change_brightness: bool,
    /// Notification propagating a brightness change to other subsystems.
    pub brightness_change_notify: bool,
    /// User-brightness getter.
    pub user_brightness_get: bool,
    /// User-brightness setter.
    pub user_brightness_set: bool,
}

/// Outcome of handing a call to one tier.
pub enum Attempt<T> {
    /// The tier's entry point is missing, or the tier declined the call and
    /// the next one should be tried.
    Skipped,
    /// The tier serviced the call; its result is final for this operation.
    Completed(Result<T, Error>),
}

/// One OS brightness API tier.
pub trait BrightnessBackend: Send + Sync {
    /// Tier name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Reads the brightness of the target display.
    fn get(&self, target: &DisplayTarget) -> Attempt<f32>;

    /// Writes the brightness of the target display.
    fn set(&self, target: &DisplayTarget, level: f32) -> Attempt<()>;
}

/// Getter with an integer status code; zero means success.
pub type StatusGetFn = Box<dyn Fn(DisplayId) -> Result<f32, i32> + Send + Sync>;
/// Setter returning an integer status code; zero means success.
pub type StatusSetFn = Box<dyn Fn(DisplayId, f32) -> i32 + Send + Sync>;
/// User-brightness getter. No failure signal.
pub type UserGetFn = Box<dyn Fn(DisplayId) -> f64 + Send + Sync>;
/// User-brightness setter. No failure signal.
pub type UserSetFn = Box<dyn Fn(DisplayId, f64) + Send + Sync>;
/// Capability check answering whether brightness can be changed.
pub type CanChangeFn = Box<dyn Fn(DisplayId) -> bool + Send + Sync>;
/// Change notification hook.
pub type ChangedFn = Box<dyn Fn(DisplayId, f64) + Send + Sync>;
/// Device-parameter getter; errors carry the kernel return code.
pub type ParamGetFn = Box<dyn Fn(&DisplayTarget) -> Result<f32, i32> + Send + Sync>;
/// Device-parameter setter; errors carry the kernel return code.
pub type ParamSetFn = Box<dyn Fn(&DisplayTarget, f32) -> Result<(), i32> + Send + Sync>;

/// Highest-priority tier, present on recent OS releases.
///
/// A nonzero status code makes the tier decline the call so the chain falls
/// through to the next one.
pub struct DisplayServicesBackend {
    get: Option<StatusGetFn>,
    set: Option<StatusSetFn>,
}

impl DisplayServicesBackend {
    /// Creates the tier from whichever entry points were found.
    pub fn new(get: Option<StatusGetFn>, set: Option<StatusSetFn>) -> Self {
        DisplayServicesBackend { get, set }
    }
}

impl BrightnessBackend for DisplayServicesBackend {
    fn name(&self) -> &'static str {
        "DisplayServices"
    }

    fn get(&self, target: &DisplayTarget) -> Attempt<f32> {
        let call = match &self.get {
            Some(call) => call,
            None => return Attempt::Skipped,
        };
        match call(target.display) {
            Ok(level) => Attempt::Completed(Ok(level)),
            Err(code) => {
                debug!(
                    "{} get returned {} for display {}, trying next tier",
                    self.name(),
                    code,
                    target.display
                );
                Attempt::Skipped
            }
        }
    }

    fn set(&self, target: &DisplayTarget, level: f32) -> Attempt<()> {
        let call = match &self.set {
            Some(call) => call,
            None => return Attempt::Skipped,
        };
        let code = call(target.display, level);
        if code == 0 {
            Attempt::Completed(Ok(()))
        } else {
            debug!(
                "{} set returned {} for display {}, trying next tier",
                self.name(),
                code,
                target.display
            );
            Attempt::Skipped
        }
    }
}

/// Middle tier: the user-brightness API.
///
/// The setter reports neither success nor failure, so once the capability
/// check passes (or is unavailable) the call is treated as successful. This
/// under-reports real failures; the platform offers no success signal to
/// check.
pub struct UserBrightnessBackend {
    get: Option<UserGetFn>,
    set: Option<UserSetFn>,
    can_change: Option<CanChangeFn>,
    changed: Option<ChangedFn>,
}

impl UserBrightnessBackend {
    /// Creates the tier from whichever entry points were found.
    pub fn new(
        get: Option<UserGetFn>,
        set: Option<UserSetFn>,
        can_change: Option<CanChangeFn>,
        changed: Option<ChangedFn>,
    ) -> Self {
        UserBrightnessBackend {
            get,
            set,
            can_change,
            changed,
        }
    }

    fn brightness_fixed(&self, display: DisplayId) -> bool {
        match &self.can_change {
            Some(check) => !check(display),
            None => false,
        }
    }
}

impl BrightnessBackend for UserBrightnessBackend {
    fn name(&self) -> &'static str {
        "user-brightness"
    }

    fn get(&self, target: &DisplayTarget) -> Attempt<f32> {
        let call = match &self.get {
            Some(call) => call,
            None => return Attempt::Skipped,
        };
        if self.brightness_fixed(target.display) {
            warn!("unable to get brightness of display {}", target.display);
            return Attempt::Completed(Err(Error::BrightnessNotReadable {
                display: target.display,
            }));
        }
        Attempt::Completed(Ok(call(target.display) as f32))
    }

    fn set(&self, target: &DisplayTarget, level: f32) -> Attempt<()> {
        let call = match &self.set {
            Some(call) => call,
            None => return Attempt::Skipped,
        };
        if self.brightness_fixed(target.display) {
            warn!("unable to set brightness of display {}", target.display);
            return Attempt::Completed(Err(Error::BrightnessNotAdjustable {
                display: target.display,
            }));
        }
        call(target.display, f64::from(level));
        if let Some(notify) = &self.changed {
            notify(target.display, f64::from(level));
        }
        Attempt::Completed(Ok(()))
    }
}

/// Lowest tier: float parameters on the display's service registry entry.
/// Always linked, so it never declines; a nonzero kernel return code is a
/// terminal error carrying that code.
pub struct IoDisplayBackend {
    get: ParamGetFn,
    set: ParamSetFn,
}

impl IoDisplayBackend {
    /// Creates the tier from the parameter accessors.
    pub fn new(get: ParamGetFn, set: ParamSetFn) -> Self {
        IoDisplayBackend { get, set }
    }
}

impl BrightnessBackend for IoDisplayBackend {
    fn name(&self) -> &'static str {
        "IODisplay"
    }

    fn get(&self, target: &DisplayTarget) -> Attempt<f32> {
        match (self.get)(target) {
            Ok(level) => Attempt::Completed(Ok(level)),
            Err(code) => {
                warn!(
                    "failed to get brightness of display {} (error {})",
                    target.display, code
                );
                Attempt::Completed(Err(Error::IoDisplayParameter {
                    display: target.display,
                    code,
                }))
            }
        }
    }

    fn set(&self, target: &DisplayTarget, level: f32) -> Attempt<()> {
        match (self.set)(target, level) {
            Ok(()) => Attempt::Completed(Ok(())),
            Err(code) => {
                warn!(
                    "failed to set brightness of display {} (error {})",
                    target.display, code
                );
                Attempt::Completed(Err(Error::IoDisplayParameter {
                    display: target.display,
                    code,
                }))
            }
        }
    }
}

/// Tries each backend in priority order; the first completed attempt is
/// final. No tier is retried and no retry spans calls.
pub struct Controller {
    backends: Vec<Box<dyn BrightnessBackend>>,
}

impl Controller {
    /// Creates a controller over backends sorted by descending priority.
    pub fn new(backends: Vec<Box<dyn BrightnessBackend>>) -> Self {
        Controller { backends }
    }

    /// Reads brightness through the first tier that completes the call.
    pub fn get(&self, target: &DisplayTarget) -> Result<f32, Error> {
        for backend in &self.backends {
            match backend.get(target) {
                Attempt::Skipped => continue,
                Attempt::Completed(result) => return result,
            }
        }
        warn!("no brightness API completed a read for display {}", target.display);
        Err(Error::ExhaustedBackends {
            display: target.display,
        })
    }

    /// Writes brightness through the first tier that completes the call.
    pub fn set(&self, target: &DisplayTarget, level: f32) -> Result<(), Error> {
        for backend in &self.backends {
            match backend.set(target, level) {
                Attempt::Skipped => continue,
                Attempt::Completed(result) => return result,
            }
        }
        warn!("no brightness API completed a write for display {}", target.display);
        Err(Error::ExhaustedBackends {
            display: target.display,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::ServicePort;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn target() -> DisplayTarget {
        DisplayTarget {
            display: DisplayId(1),
            service: ServicePort(7),
        }
    }

    struct Counters {
        user_get: Arc<AtomicUsize>,
        user_set: Arc<AtomicUsize>,
        io_get: Arc<AtomicUsize>,
        io_set: Arc<AtomicUsize>,
    }

    fn counting_user_backend(counters: &Counters) -> UserBrightnessBackend {
        let gets = counters.user_get.clone();
        let sets = counters.user_set.clone();
        UserBrightnessBackend::new(
            Some(Box::new(move |_| {
                gets.fetch_add(1, Ordering::SeqCst);
                0.75
            })),
            Some(Box::new(move |_, _| {
                sets.fetch_add(1, Ordering::SeqCst);
            })),
            None,
            None,
        )
    }

    fn counting_io_backend(counters: &Counters) -> IoDisplayBackend {
        let gets = counters.io_get.clone();
        let sets = counters.io_set.clone();
        IoDisplayBackend::new(
            Box::new(move |_: &DisplayTarget| {
                gets.fetch_add(1, Ordering::SeqCst);
                Ok(0.25)
            }),
            Box::new(move |_: &DisplayTarget, _| {
                sets.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
    }

    fn counters() -> Counters {
        Counters {
            user_get: Arc::new(AtomicUsize::new(0)),
            user_set: Arc::new(AtomicUsize::new(0)),
            io_get: Arc::new(AtomicUsize::new(0)),
            io_set: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[test]
    fn first_tier_success_leaves_lower_tiers_untouched() {
        let counts = counters();
        let controller = Controller::new(vec![
            Box::new(DisplayServicesBackend::new(
                Some(Box::new(|_| Ok(0.5))),
                Some(Box::new(|_, _| 0)),
            )),
            Box::new(counting_user_backend(&counts)),
            Box::new(counting_io_backend(&counts)),
        ]);
        assert_eq!(controller.get(&target()).unwrap(), 0.5);
        controller.set(&target(), 0.5).unwrap();
        assert_eq!(counts.user_get.load(Ordering::SeqCst), 0);
        assert_eq!(counts.user_set.load(Ordering::SeqCst), 0);
        assert_eq!(counts.io_get.load(Ordering::SeqCst), 0);
        assert_eq!(counts.io_set.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn nonzero_status_falls_through_to_next_tier() {
        let counts = counters();
        let controller = Controller::new(vec![
            Box::new(DisplayServicesBackend::new(
                Some(Box::new(|_| Err(-1))),
                Some(Box::new(|_, _| -1)),
            )),
            Box::new(counting_user_backend(&counts)),
        ]);
        assert_eq!(controller.get(&target()).unwrap(), 0.75);
        controller.set(&target(), 0.4).unwrap();
        assert_eq!(counts.user_get.load(Ordering::SeqCst), 1);
        assert_eq!(counts.user_set.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_entry_points_fall_through_to_next_tier() {
        let counts = counters();
        let controller = Controller::new(vec![
            Box::new(DisplayServicesBackend::new(None, None)),
            Box::new(UserBrightnessBackend::new(None, None, None, None)),
            Box::new(counting_io_backend(&counts)),
        ]);
        assert_eq!(controller.get(&target()).unwrap(), 0.25);
        controller.set(&target(), 0.4).unwrap();
        assert_eq!(counts.io_get.load(Ordering::SeqCst), 1);
        assert_eq!(counts.io_set.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn capability_check_gates_set_without_invoking_setter() {
        let counts = counters();
        let sets = counts.user_set.clone();
        let backend = UserBrightnessBackend::new(
            None,
            Some(Box::new(move |_, _| {
                sets.fetch_add(1, Ordering::SeqCst);
            })),
            Some(Box::new(|_| false)),
            None,
        );
        let controller = Controller::new(vec![Box::new(backend), Box::new(counting_io_backend(&counts))]);
        let err = controller.set(&target(), 0.4).unwrap_err();
        assert!(matches!(
            err,
            Error::BrightnessNotAdjustable {
                display: DisplayId(1)
            }
        ));
        assert_eq!(counts.user_set.load(Ordering::SeqCst), 0);
        // Terminal for the call: the lowest tier must not run either.
        assert_eq!(counts.io_set.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn capability_check_gates_get_without_invoking_getter() {
        let counts = counters();
        let gets = counts.user_get.clone();
        let backend = UserBrightnessBackend::new(
            Some(Box::new(move |_| {
                gets.fetch_add(1, Ordering::SeqCst);
                0.75
            })),
            None,
            Some(Box::new(|_| false)),
            None,
        );
        let controller = Controller::new(vec![Box::new(backend), Box::new(counting_io_backend(&counts))]);
        let err = controller.get(&target()).unwrap_err();
        assert!(matches!(
            err,
            Error::BrightnessNotReadable {
                display: DisplayId(1)
            }
        ));
        assert_eq!(counts.user_get.load(Ordering::SeqCst), 0);
        assert_eq!(counts.io_get.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn change_notification_fires_after_set() {
        let notified = Arc::new(Mutex::new(None));
        let seen = notified.clone();
        let backend = UserBrightnessBackend::new(
            None,
            Some(Box::new(|_, _| {})),
            Some(Box::new(|_| true)),
            Some(Box::new(move |display, level| {
                *seen.lock().unwrap() = Some((display, level));
            })),
        );
        let controller = Controller::new(vec![Box::new(backend)]);
        controller.set(&target(), 0.4).unwrap();
        let seen = notified.lock().unwrap();
        assert_eq!(*seen, Some((DisplayId(1), f64::from(0.4f32))));
    }

    #[test]
    fn lowest_tier_error_carries_kernel_code_unchanged() {
        let backend = IoDisplayBackend::new(
            Box::new(|_: &DisplayTarget| Err(0x2c7)),
            Box::new(|_: &DisplayTarget, _| Err(0x2c7)),
        );
        let controller = Controller::new(vec![Box::new(backend)]);
        match controller.get(&target()).unwrap_err() {
            Error::IoDisplayParameter { display, code } => {
                assert_eq!(display, DisplayId(1));
                assert_eq!(code, 0x2c7);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        match controller.set(&target(), 0.4).unwrap_err() {
            Error::IoDisplayParameter { code, .. } => assert_eq!(code, 0x2c7),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn empty_chain_reports_exhaustion() {
        let controller = Controller::new(vec![
            Box::new(DisplayServicesBackend::new(None, None)),
            Box::new(UserBrightnessBackend::new(None, None, None, None)),
        ]);
        assert!(matches!(
            controller.get(&target()).unwrap_err(),
            Error::ExhaustedBackends { .. }
        ));
        assert!(matches!(
            controller.set(&target(), 0.4).unwrap_err(),
            Error::ExhaustedBackends { .. }
        ));
    }

    #[test]
    fn set_then_get_round_trips_within_one_tier() {
        let stored = Arc::new(Mutex::new(0.0f32));
        let read = stored.clone();
        let written = stored.clone();
        let backend = DisplayServicesBackend::new(
            Some(Box::new(move |_| Ok(*read.lock().unwrap()))),
            Some(Box::new(move |_, level| {
                *written.lock().unwrap() = level;
                0
            })),
        );
        let controller = Controller::new(vec![Box::new(backend)]);
        controller.set(&target(), 0.5).unwrap();
        assert_eq!(controller.get(&target()).unwrap(), 0.5);
    }
}
