// Copyright (C) 2026 The display-brightness project authors. Distributed under the 0BSD license.

//! Platform-specific implementation for macOS.
//!
//! Three API tiers are probed, newest first:
//!
//! 1. `DisplayServices*` — private framework, required on Apple Silicon and
//!    macOS 11+.
//! 2. `CoreDisplay_Display_{Get,Set}UserBrightness` — adjusts the "user"
//!    brightness (what the keyboard keys and System Settings move). The
//!    symbols appear in the framework's `.tbd` but ship no headers. The
//!    setter has no return value, brightness 1.0 is indistinguishable from
//!    "not adjustable", and changes are not reflected in System Settings
//!    unless `DisplayServicesBrightnessChanged` is also called.
//! 3. `IODisplay{Get,Set}FloatParameter` — public IOKit API. Since macOS
//!    10.12.4 CoreDisplay overrides brightness set this way (Night Shift),
//!    and it does not cover all display types, hence last place.
//!
//! None of the optional symbols can be weak-linked from Rust, so they are
//! resolved once with `dlopen`/`dlsym` and carried as optional function
//! pointers. The framework handles are never closed; the symbols must live
//! for the whole process.

use crate::backend::{
    AvailableCapabilities, CanChangeFn, ChangedFn, Controller, DisplayServicesBackend,
    IoDisplayBackend, ParamGetFn, ParamSetFn, StatusGetFn, StatusSetFn, UserBrightnessBackend,
    UserGetFn, UserSetFn,
};
use crate::blocking::BrightnessDevice;
use crate::display::{
    DisplayId, DisplayIdentity, DisplayTarget, RegistryField, RegistryIdentity, ServicePort,
};
use crate::Error;
use itertools::Either;
use log::debug;
use std::os::raw::{c_char, c_void};
use std::sync::OnceLock;
use std::{iter, mem, ptr};

type CGDirectDisplayID = u32;
type CGError = i32;
type IOReturn = i32;
type IOOptionBits = u32;
#[allow(non_camel_case_types)]
type io_object_t = u32;
#[allow(non_camel_case_types)]
type io_iterator_t = u32;
#[allow(non_camel_case_types)]
type io_service_t = u32;
type CFStringRef = *const c_void;
type CFDictionaryRef = *const c_void;
type CFMutableDictionaryRef = *mut c_void;
type CFNumberRef = *const c_void;
type CFIndex = isize;

/// `kMaxDisplays` of the enumeration buffer.
const MAX_DISPLAYS: u32 = 16;
const KERN_SUCCESS: IOReturn = 0;
const NIL_OPTIONS: IOOptionBits = 0;
/// Mach port 0 selects the default master port.
const MASTER_PORT_DEFAULT: u32 = 0;
/// `kIODisplayNoProductName`; skips localized product-name lookup.
const DISPLAY_NO_PRODUCT_NAME: IOOptionBits = 0x0000_0400;
/// `kCFNumberSInt64Type`; no CFNumber type is guaranteed to be a `u32`, so
/// values are read as something bigger that cannot truncate.
const CF_NUMBER_SINT64_TYPE: CFIndex = 4;
/// `kCFStringEncodingUTF8`.
const CF_STRING_ENCODING_UTF8: u32 = 0x0800_0100;

const DISPLAY_CONNECT_CLASS: &[u8] = b"IODisplayConnect\0";
const VENDOR_ID_KEY: &[u8] = b"DisplayVendorID\0";
const PRODUCT_ID_KEY: &[u8] = b"DisplayProductID\0";
const SERIAL_NUMBER_KEY: &[u8] = b"DisplaySerialNumber\0";
/// `kIODisplayBrightnessKey`.
const BRIGHTNESS_KEY: &[u8] = b"brightness\0";

const DISPLAY_SERVICES_PATH: &[u8] =
    b"/System/Library/PrivateFrameworks/DisplayServices.framework/DisplayServices\0";
const CORE_DISPLAY_PATH: &[u8] =
    b"/System/Library/Frameworks/CoreDisplay.framework/CoreDisplay\0";

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGGetOnlineDisplayList(
        max_displays: u32,
        online_displays: *mut CGDirectDisplayID,
        display_count: *mut u32,
    ) -> CGError;
    fn CGDisplayVendorNumber(display: CGDirectDisplayID) -> u32;
    fn CGDisplayModelNumber(display: CGDirectDisplayID) -> u32;
    fn CGDisplaySerialNumber(display: CGDirectDisplayID) -> u32;
}

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    fn IOServiceMatching(name: *const c_char) -> CFMutableDictionaryRef;
    fn IOServiceGetMatchingServices(
        master_port: u32,
        matching: CFMutableDictionaryRef,
        existing: *mut io_iterator_t,
    ) -> IOReturn;
    fn IOIteratorNext(iterator: io_iterator_t) -> io_object_t;
    fn IOObjectRelease(object: io_object_t) -> IOReturn;
    fn IODisplayCreateInfoDictionary(
        frame_buffer: io_service_t,
        options: IOOptionBits,
    ) -> CFDictionaryRef;
    fn IODisplayGetFloatParameter(
        service: io_service_t,
        options: IOOptionBits,
        parameter: CFStringRef,
        value: *mut f32,
    ) -> IOReturn;
    fn IODisplaySetFloatParameter(
        service: io_service_t,
        options: IOOptionBits,
        parameter: CFStringRef,
        value: f32,
    ) -> IOReturn;
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    fn CFStringCreateWithCString(
        alloc: *const c_void,
        c_str: *const c_char,
        encoding: u32,
    ) -> CFStringRef;
    fn CFDictionaryGetValue(dict: CFDictionaryRef, key: *const c_void) -> *const c_void;
    fn CFNumberGetValue(number: CFNumberRef, number_type: CFIndex, value: *mut c_void) -> bool;
    fn CFRelease(cf: *const c_void);
}

/// Optional entry points of the DisplayServices and CoreDisplay tiers.
/// `None` means the running OS does not export the symbol.
#[derive(Clone, Copy)]
struct WeakSymbols {
    ds_get_brightness: Option<unsafe extern "C" fn(CGDirectDisplayID, *mut f32) -> i32>,
    ds_set_brightness: Option<unsafe extern "C" fn(CGDirectDisplayID, f32) -> i32>,
    ds_can_change_brightness: Option<unsafe extern "C" fn(CGDirectDisplayID) -> bool>,
    ds_brightness_changed: Option<unsafe extern "C" fn(CGDirectDisplayID, f64)>,
    cd_get_user_brightness: Option<unsafe extern "C" fn(CGDirectDisplayID) -> f64>,
    cd_set_user_brightness: Option<unsafe extern "C" fn(CGDirectDisplayID, f64)>,
}

impl WeakSymbols {
    fn resolve() -> Self {
        let display_services = open_framework(DISPLAY_SERVICES_PATH);
        let core_display = open_framework(CORE_DISPLAY_PATH);
        unsafe {
            WeakSymbols {
                ds_get_brightness: symbol(display_services, b"DisplayServicesGetBrightness\0"),
                ds_set_brightness: symbol(display_services, b"DisplayServicesSetBrightness\0"),
                ds_can_change_brightness: symbol(
                    display_services,
                    b"DisplayServicesCanChangeBrightness\0",
                ),
                ds_brightness_changed: symbol(
                    display_services,
                    b"DisplayServicesBrightnessChanged\0",
                ),
                cd_get_user_brightness: symbol(
                    core_display,
                    b"CoreDisplay_Display_GetUserBrightness\0",
                ),
                cd_set_user_brightness: symbol(
                    core_display,
                    b"CoreDisplay_Display_SetUserBrightness\0",
                ),
            }
        }
    }

    fn capabilities(&self) -> AvailableCapabilities {
        AvailableCapabilities {
            display_services_get: self.ds_get_brightness.is_some(),
            display_services_set: self.ds_set_brightness.is_some(),
            can_change_brightness: self.ds_can_change_brightness.is_some(),
            brightness_change_notify: self.ds_brightness_changed.is_some(),
            user_brightness_get: self.cd_get_user_brightness.is_some(),
            user_brightness_set: self.cd_set_user_brightness.is_some(),
        }
    }
}

fn open_framework(path: &'static [u8]) -> *mut c_void {
    // The handle is kept for the life of the process.
    unsafe { libc::dlopen(path.as_ptr() as *const c_char, libc::RTLD_LAZY | libc::RTLD_LOCAL) }
}

unsafe fn symbol<T: Copy>(handle: *mut c_void, name: &'static [u8]) -> Option<T> {
    if handle.is_null() {
        return None;
    }
    let address = libc::dlsym(handle, name.as_ptr() as *const c_char);
    if address.is_null() {
        None
    } else {
        Some(mem::transmute_copy(&address))
    }
}

fn weak_symbols() -> &'static WeakSymbols {
    static SYMBOLS: OnceLock<WeakSymbols> = OnceLock::new();
    SYMBOLS.get_or_init(|| {
        let symbols = WeakSymbols::resolve();
        debug!("resolved brightness capabilities: {:?}", symbols.capabilities());
        symbols
    })
}

pub(crate) fn capabilities() -> AvailableCapabilities {
    weak_symbols().capabilities()
}

fn native_controller() -> Controller {
    let symbols = *weak_symbols();
    let display_services = DisplayServicesBackend::new(
        symbols.ds_get_brightness.map(|call| -> StatusGetFn {
            Box::new(move |display| {
                let mut level = 0.0f32;
                let code = unsafe { call(display.0, &mut level) };
                if code == 0 {
                    Ok(level)
                } else {
                    Err(code)
                }
            })
        }),
        symbols.ds_set_brightness.map(|call| -> StatusSetFn {
            Box::new(move |display, level| unsafe { call(display.0, level) })
        }),
    );
    let user_brightness = UserBrightnessBackend::new(
        symbols.cd_get_user_brightness.map(|call| -> UserGetFn {
            Box::new(move |display| unsafe { call(display.0) })
        }),
        symbols.cd_set_user_brightness.map(|call| -> UserSetFn {
            Box::new(move |display, level| unsafe { call(display.0, level) })
        }),
        symbols.ds_can_change_brightness.map(|call| -> CanChangeFn {
            Box::new(move |display| unsafe { call(display.0) })
        }),
        symbols.ds_brightness_changed.map(|call| -> ChangedFn {
            Box::new(move |display, level| unsafe { call(display.0, level) })
        }),
    );
    let get: ParamGetFn = Box::new(|target: &DisplayTarget| {
        let mut level = 0.0f32;
        let code = unsafe {
            with_brightness_key(|key| {
                IODisplayGetFloatParameter(target.service.0, NIL_OPTIONS, key, &mut level)
            })
        };
        if code == KERN_SUCCESS {
            Ok(level)
        } else {
            Err(code)
        }
    });
    let set: ParamSetFn = Box::new(|target: &DisplayTarget, level| {
        let code = unsafe {
            with_brightness_key(|key| {
                IODisplaySetFloatParameter(target.service.0, NIL_OPTIONS, key, level)
            })
        };
        if code == KERN_SUCCESS {
            Ok(())
        } else {
            Err(code)
        }
    });
    Controller::new(vec![
        Box::new(display_services),
        Box::new(user_brightness),
        Box::new(IoDisplayBackend::new(get, set)),
    ])
}

unsafe fn with_brightness_key<T>(call: impl FnOnce(CFStringRef) -> T) -> T {
    let key = CFStringCreateWithCString(
        ptr::null(),
        BRIGHTNESS_KEY.as_ptr() as *const c_char,
        CF_STRING_ENCODING_UTF8,
    );
    let out = call(key);
    CFRelease(key);
    out
}

pub(crate) fn brightness_devices() -> impl Iterator<Item = Result<BrightnessDevice, Error>> {
    match online_displays() {
        Ok(displays) => Either::Left(displays.into_iter().map(|display| {
            let service = matching_service(&display_identity(display));
            Ok(BrightnessDevice::from_parts(
                DisplayTarget { display, service },
                native_controller(),
            ))
        })),
        Err(e) => Either::Right(iter::once(Err(e))),
    }
}

pub(crate) fn release_service(service: ServicePort) {
    if !service.is_null() {
        unsafe {
            IOObjectRelease(service.0);
        }
    }
}

fn online_displays() -> Result<Vec<DisplayId>, Error> {
    let mut ids = [0 as CGDirectDisplayID; MAX_DISPLAYS as usize];
    let mut count: u32 = 0;
    let err = unsafe { CGGetOnlineDisplayList(MAX_DISPLAYS, ids.as_mut_ptr(), &mut count) };
    if err != 0 {
        return Err(Error::NoDisplayFound);
    }
    Ok(ids[..count as usize].iter().map(|&id| DisplayId(id)).collect())
}

fn display_identity(display: DisplayId) -> DisplayIdentity {
    unsafe {
        DisplayIdentity {
            vendor: CGDisplayVendorNumber(display.0),
            product: CGDisplayModelNumber(display.0),
            serial: CGDisplaySerialNumber(display.0),
        }
    }
}

/// Finds the registry entry whose vendor/product/serial triple matches the
/// display. `CGDisplayIOServicePort` is deprecated since 10.9, so the match
/// is done by hand. Returns a null port when nothing matches.
fn matching_service(identity: &DisplayIdentity) -> ServicePort {
    unsafe {
        let matching = IOServiceMatching(DISPLAY_CONNECT_CLASS.as_ptr() as *const c_char);
        let mut iterator: io_iterator_t = 0;
        if IOServiceGetMatchingServices(MASTER_PORT_DEFAULT, matching, &mut iterator)
            != KERN_SUCCESS
        {
            return ServicePort(0);
        }
        let mut matched = ServicePort(0);
        loop {
            let service = IOIteratorNext(iterator);
            if service == 0 {
                break;
            }
            let info = IODisplayCreateInfoDictionary(service, DISPLAY_NO_PRODUCT_NAME);
            let entry = registry_identity(info);
            CFRelease(info);
            if entry.matches(identity) {
                matched = ServicePort(service);
                break;
            }
            IOObjectRelease(service);
        }
        IOObjectRelease(iterator);
        matched
    }
}

unsafe fn registry_identity(info: CFDictionaryRef) -> RegistryIdentity {
    RegistryIdentity {
        vendor: number_field(info, VENDOR_ID_KEY),
        product: number_field(info, PRODUCT_ID_KEY),
        serial: number_field(info, SERIAL_NUMBER_KEY),
    }
}

unsafe fn number_field(info: CFDictionaryRef, key: &'static [u8]) -> RegistryField {
    let key_ref = CFStringCreateWithCString(
        ptr::null(),
        key.as_ptr() as *const c_char,
        CF_STRING_ENCODING_UTF8,
    );
    let value = CFDictionaryGetValue(info, key_ref);
    CFRelease(key_ref);
    if value.is_null() {
        return RegistryField::Missing;
    }
    let mut number: i64 = 0;
    if CFNumberGetValue(
        value,
        CF_NUMBER_SINT64_TYPE,
        &mut number as *mut i64 as *mut c_void,
    ) {
        RegistryField::Value(number)
    } else {
        RegistryField::Unreadable
    }
}
