use gloo::console;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Event, HtmlScriptElement, RequestCache, RequestInit, RequestMode, Response};

use noel_card_core::sniff::{sniff_script_payload, PayloadRejected};
use noel_card_core::template::MODULE_SCRIPT_TYPE;
use noel_card_core::ScriptKind;

use crate::dom::{self, js_err};

#[derive(Debug, thiserror::Error)]
pub(crate) enum ScriptLoadError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("unexpected http status {0}")]
    Status(u16),
    #[error("response body unreadable: {0}")]
    Body(String),
    #[error(transparent)]
    Rejected(#[from] PayloadRejected),
    #[error("script element failed to load: {0}")]
    Tag(String),
    #[error("dom error: {0}")]
    Dom(String),
}

impl ScriptLoadError {
    /// Fetch-side failures (cors, network, http status) fall back to a
    /// plain `<script src>` tag; everything else is final.
    fn wants_tag_fallback(&self) -> bool {
        matches!(
            self,
            ScriptLoadError::Fetch(_) | ScriptLoadError::Status(_) | ScriptLoadError::Body(_)
        )
    }
}

/// Loads one external script. Never fails: problems are logged and the
/// script is reported as absent so the caller can keep going.
pub(crate) async fn load_external_script(url: &str, kind: ScriptKind) -> Option<HtmlScriptElement> {
    match try_load_external(url, kind).await {
        Ok(script) => Some(script),
        Err(ScriptLoadError::Rejected(rejected)) => {
            console::warn!(
                "skipping script that looks like an html or landing page",
                url,
                rejected.marker
            );
            None
        }
        Err(err) => {
            console::warn!("failed to load external script", url, err.to_string());
            None
        }
    }
}

async fn try_load_external(url: &str, kind: ScriptKind) -> Result<HtmlScriptElement, ScriptLoadError> {
    let text = match fetch_text(url).await {
        Ok(text) => text,
        Err(err) if err.wants_tag_fallback() => return load_with_tag(url, kind).await,
        Err(err) => return Err(err),
    };
    sniff_script_payload(&text)?;
    run_inline_script(&text, kind).map_err(|err| ScriptLoadError::Dom(js_err(err)))
}

async fn fetch_text(url: &str) -> Result<String, ScriptLoadError> {
    let window = dom::window().map_err(|err| ScriptLoadError::Dom(js_err(err)))?;
    let init = RequestInit::new();
    init.set_mode(RequestMode::Cors);
    init.set_cache(RequestCache::NoCache);
    let response = JsFuture::from(window.fetch_with_str_and_init(url, &init))
        .await
        .map_err(|err| ScriptLoadError::Fetch(js_err(err)))?;
    let response = response
        .dyn_into::<Response>()
        .map_err(|_| ScriptLoadError::Fetch("fetch resolved to a non-response".to_string()))?;
    if !response.ok() {
        return Err(ScriptLoadError::Status(response.status()));
    }
    let body = response
        .text()
        .map_err(|err| ScriptLoadError::Body(js_err(err)))?;
    let text = JsFuture::from(body)
        .await
        .map_err(|err| ScriptLoadError::Body(js_err(err)))?;
    Ok(text.as_string().unwrap_or_default())
}

fn create_script(kind: ScriptKind) -> Result<HtmlScriptElement, JsValue> {
    let script = dom::document()?
        .create_element("script")?
        .dyn_into::<HtmlScriptElement>()
        .map_err(|_| JsValue::from_str("script element has unexpected type"))?;
    if kind.is_module() {
        script.set_type(MODULE_SCRIPT_TYPE);
    }
    script.set_async(false);
    Ok(script)
}

async fn load_with_tag(url: &str, kind: ScriptKind) -> Result<HtmlScriptElement, ScriptLoadError> {
    let script = create_script(kind).map_err(|err| ScriptLoadError::Dom(js_err(err)))?;
    script.set_src(url);
    let loaded = script_load_promise(&script);
    dom::body()
        .and_then(|body| body.append_child(&script))
        .map_err(|err| ScriptLoadError::Dom(js_err(err)))?;
    JsFuture::from(loaded)
        .await
        .map_err(|err| ScriptLoadError::Tag(js_err(err)))?;
    Ok(script)
}

fn script_load_promise(script: &HtmlScriptElement) -> js_sys::Promise {
    js_sys::Promise::new(&mut |resolve, reject| {
        let on_load = Closure::once(move |_event: Event| {
            let _ = resolve.call0(&JsValue::NULL);
        });
        let on_error = Closure::once(move |event: Event| {
            let _ = reject.call1(&JsValue::NULL, &JsValue::from_str(&event.type_()));
        });
        script.set_onload(Some(on_load.as_ref().unchecked_ref()));
        script.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_load.forget();
        on_error.forget();
    })
}

/// Appends an executable script holding `code`. Classic scripts run before
/// this returns.
pub(crate) fn run_inline_script(code: &str, kind: ScriptKind) -> Result<HtmlScriptElement, JsValue> {
    let script = create_script(kind)?;
    script.set_text(code)?;
    dom::body()?.append_child(&script)?;
    Ok(script)
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use js_sys::Reflect;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn global_number(name: &str) -> Option<f64> {
        let window = web_sys::window()?;
        Reflect::get(&window, &JsValue::from_str(name)).ok()?.as_f64()
    }

    #[wasm_bindgen_test]
    fn inline_classic_script_runs_synchronously() {
        let code = "window.__noelInlineRuns = (window.__noelInlineRuns || 0) + 1;";
        let before = global_number("__noelInlineRuns").unwrap_or(0.0);
        let script = run_inline_script(code, ScriptKind::Classic).expect("append script");
        assert_eq!(global_number("__noelInlineRuns"), Some(before + 1.0));
        assert!(script.type_().is_empty());
        assert!(!script.async_());
    }

    #[wasm_bindgen_test]
    fn inline_module_script_is_typed() {
        let script = run_inline_script("export {};", ScriptKind::Module).expect("append script");
        assert_eq!(script.type_(), "module");
    }

    #[wasm_bindgen_test(async)]
    async fn fetched_script_is_injected() {
        let url = "data:text/javascript,window.__noelFetched%20%3D%2042%3B";
        let script = load_external_script(url, ScriptKind::Classic).await;
        assert!(script.is_some());
        assert_eq!(global_number("__noelFetched"), Some(42.0));
    }

    #[wasm_bindgen_test(async)]
    async fn html_payload_is_never_injected() {
        let url = "data:text/plain,%3C!DOCTYPE%20html%3E%3Cscript%3Ewindow.__noelLanding%3D1%3C%2Fscript%3E";
        let script = load_external_script(url, ScriptKind::Classic).await;
        assert!(script.is_none());
        assert_eq!(global_number("__noelLanding"), None);
        let body = dom::body().expect("body");
        let scripts = body.get_elements_by_tag_name("script");
        for index in 0..scripts.length() {
            let text = scripts
                .item(index)
                .and_then(|node| node.text_content())
                .unwrap_or_default();
            assert!(!text.contains("DOCTYPE"));
        }
    }

    #[wasm_bindgen_test(async)]
    async fn unreachable_script_resolves_to_none() {
        let script = load_external_script("http://127.0.0.1:9/missing.js", ScriptKind::Classic).await;
        assert!(script.is_none());
    }
}
