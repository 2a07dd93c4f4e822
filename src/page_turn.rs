use gloo::console;
use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};

use noel_card_core::page_turn::{page_turn_plan, TweenPosition, TweenValue};
use noel_card_core::{DeviceClass, TurnMode};

use crate::dom::{self, js_err};

const TIMELINE_GLOBAL: &str = "gsap";

/// How the card visually moves between closed and open.
pub(crate) trait PageTurn {
    fn mode(&self) -> TurnMode;
    fn play(&self);
    fn reverse(&self);
}

/// CSS classes alone carry the transition.
pub(crate) struct InstantTurn;

impl PageTurn for InstantTurn {
    fn mode(&self) -> TurnMode {
        TurnMode::Instant
    }

    fn play(&self) {}

    fn reverse(&self) {}
}

/// Page-turn driven by a paused GSAP timeline.
pub(crate) struct TimelineTurn {
    timeline: JsValue,
}

impl TimelineTurn {
    /// Builds the timeline if the library has been loaded into the page.
    pub(crate) fn build(device: DeviceClass) -> Result<Option<Self>, String> {
        let Some(gsap) = timeline_library() else {
            return Ok(None);
        };
        let plan = page_turn_plan(device);

        let targets = Array::new();
        for target in plan.setup_targets {
            targets.push(&JsValue::from_str(target));
        }
        call_method(&gsap, "set", &[targets.into(), tween_vars(&plan.setup_vars)?.into()])
            .map_err(js_err)?;

        let options = Object::new();
        Reflect::set(&options, &"paused".into(), &JsValue::TRUE).map_err(js_err)?;
        let timeline = call_method(&gsap, "timeline", &[options.into()]).map_err(js_err)?;
        for segment in &plan.segments {
            let position = match segment.position {
                TweenPosition::At(at) => JsValue::from_f64(at),
                TweenPosition::Label(label) => JsValue::from_str(label),
            };
            call_method(
                &timeline,
                "to",
                &[
                    JsValue::from_str(segment.target),
                    tween_vars(&segment.vars)?.into(),
                    position,
                ],
            )
            .map_err(js_err)?;
        }
        console::log!("page-turn timeline built", plan.total_duration());
        Ok(Some(Self { timeline }))
    }
}

impl PageTurn for TimelineTurn {
    fn mode(&self) -> TurnMode {
        TurnMode::Animated
    }

    fn play(&self) {
        let _ = call_method(&self.timeline, "play", &[JsValue::from_f64(0.0)]);
    }

    fn reverse(&self) {
        let _ = call_method(&self.timeline, "reverse", &[]);
    }
}

fn timeline_library() -> Option<JsValue> {
    let window = dom::window().ok()?;
    let value = Reflect::get(&window, &JsValue::from_str(TIMELINE_GLOBAL)).ok()?;
    if value.is_null() || value.is_undefined() {
        return None;
    }
    Some(value)
}

fn tween_vars(vars: &[(&'static str, TweenValue)]) -> Result<Object, String> {
    let object = Object::new();
    for (key, value) in vars {
        let value = match value {
            TweenValue::Number(value) => JsValue::from_f64(*value),
            TweenValue::Text(value) => JsValue::from_str(value),
            TweenValue::Flag(value) => JsValue::from_bool(*value),
        };
        Reflect::set(&object, &JsValue::from_str(key), &value).map_err(js_err)?;
    }
    Ok(object)
}

fn call_method(target: &JsValue, method: &str, args: &[JsValue]) -> Result<JsValue, JsValue> {
    let func = Reflect::get(target, &JsValue::from_str(method))?
        .dyn_into::<Function>()
        .map_err(|_| JsValue::from_str(&format!("{method} is not a function")))?;
    let array = Array::new();
    for arg in args {
        array.push(arg);
    }
    func.apply(target, &array)
}
