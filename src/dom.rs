use js_sys::{Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, Window};

use noel_card_core::device::{NARROW_QUERY, REDUCED_MOTION_QUERY};
use noel_card_core::DeviceClass;

pub(crate) fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("missing window"))
}

pub(crate) fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("missing document"))
}

pub(crate) fn body() -> Result<HtmlElement, JsValue> {
    document()?
        .body()
        .ok_or_else(|| JsValue::from_str("missing document body"))
}

pub(crate) fn element_by_id<T: JsCast>(id: &str) -> Option<T> {
    document()
        .ok()?
        .get_element_by_id(id)?
        .dyn_into::<T>()
        .ok()
}

pub(crate) fn query_selector(selector: &str) -> Option<Element> {
    document().ok()?.query_selector(selector).ok()?
}

pub(crate) fn js_err(error: JsValue) -> String {
    if let Some(value) = error.as_string() {
        return value;
    }
    if let Some(error) = error.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    if let Ok(json) = js_sys::JSON::stringify(&error) {
        if let Some(value) = json.as_string() {
            return value;
        }
    }
    "js error".to_string()
}

pub(crate) fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|performance| performance.now())
        .unwrap_or_else(js_sys::Date::now)
}

pub(crate) fn device_pixel_ratio() -> f64 {
    web_sys::window()
        .map(|window| window.device_pixel_ratio())
        .unwrap_or(1.0)
}

pub(crate) fn media_matches(query: &str) -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    let Ok(match_media) = Reflect::get(&window, &"matchMedia".into()) else {
        return false;
    };
    let Ok(match_media) = match_media.dyn_into::<Function>() else {
        return false;
    };
    let Ok(query) = match_media.call1(&window, &query.into()) else {
        return false;
    };
    Reflect::get(&query, &"matches".into())
        .ok()
        .and_then(|value| value.as_bool())
        .unwrap_or(false)
}

fn has_touch() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    let touch_events = Reflect::has(&window, &"ontouchstart".into()).unwrap_or(false);
    touch_events || window.navigator().max_touch_points() > 0
}

pub(crate) fn detect_device(reduced_motion_override: Option<bool>) -> DeviceClass {
    DeviceClass {
        narrow: media_matches(NARROW_QUERY),
        touch: has_touch(),
        reduced_motion: reduced_motion_override
            .unwrap_or_else(|| media_matches(REDUCED_MOTION_QUERY)),
    }
}

pub(crate) fn document_hidden() -> bool {
    document().map(|document| document.hidden()).unwrap_or(false)
}
