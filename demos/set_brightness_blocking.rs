use display_brightness::blocking::{Brightness, BrightnessDevice};
use std::env;

fn main() {
    let level = env::args()
        .skip(1)
        .next()
        .and_then(|a| a.parse().ok())
        .expect("Desired brightness level (0.0-1.0) must be given as parameter");
    run(level);
}

fn run(level: f32) {
    let dev = display_brightness::blocking::internal_display().unwrap();
    show_brightness(&dev).unwrap();
    dev.set(level).unwrap();
    show_brightness(&dev).unwrap();
}

fn show_brightness(dev: &BrightnessDevice) -> Result<(), display_brightness::Error> {
    println!(
        "Brightness of display {} is {}",
        dev.display_id(),
        dev.get()?
    );
    Ok(())
}
