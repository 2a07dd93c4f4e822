mod audio;
mod content;
mod controller;
mod dom;
mod page_turn;
mod script_loader;
mod settings_store;
mod snowfall;

use gloo::console;

fn main() {
    let settings = settings_store::load_card_settings();
    let device = dom::detect_device(settings_store::reduced_motion_override());
    if let Err(err) = controller::boot(settings, device) {
        console::warn!("greeting card not started", err);
    }
}
