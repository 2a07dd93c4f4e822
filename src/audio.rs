use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::HtmlAudioElement;

pub(crate) struct CardAudio {
    element: Option<HtmlAudioElement>,
}

impl CardAudio {
    pub(crate) fn new(element: Option<HtmlAudioElement>) -> Self {
        Self { element }
    }

    /// Starts playback; autoplay rejections are expected and dropped.
    pub(crate) fn play(&self) {
        let Some(element) = self.element.as_ref() else {
            return;
        };
        let Ok(promise) = element.play() else {
            return;
        };
        spawn_local(async move {
            let _ = JsFuture::from(promise).await;
        });
    }

    pub(crate) fn stop(&self) {
        let Some(element) = self.element.as_ref() else {
            return;
        };
        let _ = element.pause();
        element.set_current_time(0.0);
    }
}
