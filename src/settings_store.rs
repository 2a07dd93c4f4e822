use gloo::console;

use noel_card_core::settings::{parse_flag, REDUCED_MOTION_OVERRIDE_KEY, SETTINGS_STORAGE_KEY};
use noel_card_core::CardSettings;

fn read_storage(key: &str) -> Option<String> {
    let window = web_sys::window()?;
    let storage = window.local_storage().ok()??;
    let raw = storage.get_item(key).ok()??;
    if raw.trim().is_empty() {
        return None;
    }
    Some(raw)
}

pub(crate) fn load_card_settings() -> CardSettings {
    let Some(raw) = read_storage(SETTINGS_STORAGE_KEY) else {
        return CardSettings::default();
    };
    match CardSettings::from_json(&raw) {
        Ok(settings) => settings,
        Err(err) => {
            console::warn!("ignoring stored card settings", err.to_string());
            CardSettings::default()
        }
    }
}

pub(crate) fn reduced_motion_override() -> Option<bool> {
    read_storage(REDUCED_MOTION_OVERRIDE_KEY).and_then(|raw| parse_flag(&raw))
}
