use display_brightness::blocking::{brightness_devices, Brightness};

fn main() {
    println!("Capabilities: {:?}", display_brightness::capabilities());
    for dev in brightness_devices() {
        match dev {
            Ok(dev) => match dev.get() {
                Ok(level) => println!("Display {}: brightness {}", dev.display_id(), level),
                Err(e) => println!("Display {}: {}", dev.display_id(), e),
            },
            Err(e) => println!("Error: {}", e),
        }
    }
}
