//! Terminal rendering of the projected device view.

use lansentry_core::projection::{ProjectedDevice, ProjectedView};

/// Print the projected view as a plain table. Row groups from the column
/// layout are separated by a blank line.
pub fn print_view(view: &ProjectedView) {
    if view.groups.iter().all(Vec::is_empty) {
        println!("No devices online");
        return;
    }

    for (index, group) in view.groups.iter().enumerate() {
        if index > 0 && !group.is_empty() {
            println!();
        }
        for device in group {
            print_device(device);
        }
    }
}

fn print_device(device: &ProjectedDevice) {
    let state = if device.online { "online " } else { "offline" };
    let ip = device.ip_address.as_deref().unwrap_or("-");

    let mut trailer = String::new();
    if let Some(vendor) = &device.vendor {
        trailer.push_str(&format!(" ({vendor})"));
    }
    if let Some(last_seen) = &device.last_seen {
        trailer.push_str(&format!("  last seen {last_seen}"));
    }

    println!("  {state} {:24} {ip:15}{trailer}", device.name);
}
