use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use gloo::console;
use gloo::events::EventListener;
use gloo::render::{request_animation_frame, AnimationFrame};
use gloo::timers::callback::Timeout;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Element, Event, EventTarget, HtmlAudioElement, HtmlCanvasElement, HtmlElement,
    HtmlTemplateElement, Node, PageTransitionEvent, ResizeObserver,
};

use noel_card_core::{
    CardEffect, CardMarker, CardRequest, CardSettings, CardState, CardTiming, DeviceClass,
    ElementIds, MarkerDelay,
};

use crate::audio::CardAudio;
use crate::content::ContentInjector;
use crate::dom::{self, js_err};
use crate::page_turn::{InstantTurn, PageTurn, TimelineTurn};
use crate::snowfall::Snowfall;

thread_local! {
    static CONTROLLER: RefCell<Option<Rc<CardController>>> = RefCell::new(None);
    static PAGE_LIFECYCLE: RefCell<Vec<EventListener>> = RefCell::new(Vec::new());
}

pub(crate) struct CardElements {
    open_button: HtmlElement,
    card: Element,
    card_inner: Element,
    template: HtmlTemplateElement,
    audio: Option<HtmlAudioElement>,
    snow_canvas: Option<HtmlCanvasElement>,
}

impl CardElements {
    pub(crate) fn lookup(ids: &ElementIds) -> Result<Self, String> {
        let open_button = dom::element_by_id::<HtmlElement>(&ids.open_button)
            .ok_or_else(|| format!("missing trigger #{}", ids.open_button))?;
        let card = dom::query_selector(&ids.card_selector)
            .ok_or_else(|| format!("missing card {}", ids.card_selector))?;
        let card_inner = dom::element_by_id::<Element>(&ids.card_inner)
            .ok_or_else(|| format!("missing card body #{}", ids.card_inner))?;
        let template = dom::element_by_id::<HtmlTemplateElement>(&ids.template)
            .ok_or_else(|| format!("missing template #{}", ids.template))?;
        Ok(Self {
            open_button,
            card,
            card_inner,
            template,
            audio: dom::element_by_id::<HtmlAudioElement>(&ids.audio),
            snow_canvas: dom::element_by_id::<HtmlCanvasElement>(&ids.snow_canvas),
        })
    }
}

// Held only so that dropping it cancels the pending change.
#[allow(dead_code)]
enum PendingMarker {
    Timer(Timeout),
    Frame(AnimationFrame),
}

struct ResizeWatch {
    observer: ResizeObserver,
    _callback: Closure<dyn FnMut()>,
}

pub(crate) struct CardController {
    open_button: HtmlElement,
    card: Element,
    device: DeviceClass,
    timing: CardTiming,
    state: RefCell<CardState>,
    page_turn: RefCell<Box<dyn PageTurn>>,
    probe_timeline: Cell<bool>,
    content: Rc<ContentInjector>,
    snowfall: Rc<Snowfall>,
    audio: CardAudio,
    pending_marker: RefCell<Option<PendingMarker>>,
    listeners: RefCell<Vec<EventListener>>,
    resize_watch: RefCell<Option<ResizeWatch>>,
}

impl CardController {
    pub(crate) fn new(elements: CardElements, settings: &CardSettings, device: DeviceClass) -> Rc<Self> {
        let CardElements {
            open_button,
            card,
            card_inner,
            template,
            audio,
            snow_canvas,
        } = elements;
        let snowfall = Snowfall::new(snow_canvas, card.clone(), device, settings.snow.clone());
        Rc::new(Self {
            open_button,
            card,
            device,
            timing: CardTiming::from(settings),
            state: RefCell::new(CardState::default()),
            page_turn: RefCell::new(Box::new(InstantTurn)),
            probe_timeline: Cell::new(!device.reduced_motion),
            content: ContentInjector::new(template, card_inner),
            snowfall,
            audio: CardAudio::new(audio),
            pending_marker: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
            resize_watch: RefCell::new(None),
        })
    }

    /// Installs the controller as the page singleton and starts it.
    pub(crate) fn mount(self: Rc<Self>) {
        let previous = CONTROLLER.with(|slot| slot.borrow_mut().replace(Rc::clone(&self)));
        if let Some(previous) = previous {
            previous.teardown();
        }
        install_page_lifecycle();
        self.install_listeners();
        let content = Rc::clone(&self.content);
        let controller = Rc::downgrade(&self);
        spawn_local(async move {
            content.inject_once().await;
            let Some(this) = controller.upgrade() else {
                return;
            };
            this.request(CardRequest::Reset);
            if !dom::document_hidden() {
                this.snowfall.start();
            }
        });
    }

    pub(crate) fn open(self: &Rc<Self>) {
        self.request(CardRequest::Open);
    }

    pub(crate) fn close(self: &Rc<Self>) {
        self.request(CardRequest::Close);
    }

    pub(crate) fn toggle(self: &Rc<Self>) {
        self.request(CardRequest::Toggle);
    }

    fn request(self: &Rc<Self>, request: CardRequest) {
        self.ensure_timeline();
        let mode = self.page_turn.borrow().mode();
        let effects = self.state.borrow_mut().apply(request, mode, self.timing);
        for effect in effects {
            self.run_effect(effect);
        }
    }

    /// Swaps in the timeline once the library shows up; content scripts
    /// load it asynchronously, so this is retried on every request.
    fn ensure_timeline(&self) {
        if !self.probe_timeline.get() || !self.content.is_loaded() {
            return;
        }
        match TimelineTurn::build(self.device) {
            Ok(Some(timeline)) => {
                *self.page_turn.borrow_mut() = Box::new(timeline);
                self.probe_timeline.set(false);
            }
            Ok(None) => {}
            Err(err) => {
                console::warn!("page-turn timeline unavailable, using css fallback", err);
                self.probe_timeline.set(false);
            }
        }
    }

    fn run_effect(self: &Rc<Self>, effect: CardEffect) {
        match effect {
            CardEffect::AddMarker(marker) => self.set_marker(marker, true),
            CardEffect::RemoveMarker(marker) => self.set_marker(marker, false),
            CardEffect::ScheduleMarker { marker, add, delay } => {
                self.schedule_marker(marker, add, delay)
            }
            CardEffect::PlayTurn => self.page_turn.borrow().play(),
            CardEffect::ReverseTurn => self.page_turn.borrow().reverse(),
            CardEffect::PlayAudio => self.audio.play(),
            CardEffect::StopAudio => self.audio.stop(),
            CardEffect::SetPressed(pressed) => {
                let value = if pressed { "true" } else { "false" };
                let _ = self.open_button.set_attribute("aria-pressed", value);
            }
        }
    }

    fn set_marker(&self, marker: CardMarker, add: bool) {
        let classes = self.card.class_list();
        let result = if add {
            classes.add_1(marker.class_name())
        } else {
            classes.remove_1(marker.class_name())
        };
        if let Err(err) = result {
            console::warn!("card marker update failed", marker.class_name(), js_err(err));
        }
    }

    fn schedule_marker(self: &Rc<Self>, marker: CardMarker, add: bool, delay: MarkerDelay) {
        let controller = Rc::downgrade(self);
        let settle = move || {
            if let Some(this) = controller.upgrade() {
                this.set_marker(marker, add);
            }
        };
        let pending = match delay {
            MarkerDelay::NextFrame => {
                PendingMarker::Frame(request_animation_frame(move |_| settle()))
            }
            MarkerDelay::Millis(ms) => PendingMarker::Timer(Timeout::new(ms, settle)),
        };
        *self.pending_marker.borrow_mut() = Some(pending);
    }

    fn on_visibility_change(&self, hidden: bool) {
        if hidden {
            self.snowfall.stop();
        } else if self.content.is_loaded() {
            self.snowfall.start();
        }
    }

    /// Drops any pending marker change and applies the classes the current
    /// state would end up with.
    fn settle_markers(&self) {
        self.pending_marker.borrow_mut().take();
        let opened = self.state.borrow().opened();
        self.set_marker(CardMarker::Opening, opened);
        self.set_marker(CardMarker::Open, opened);
    }

    /// Page entered the back/forward cache: pause, keep every listener.
    fn suspend(&self) {
        self.snowfall.stop();
        self.settle_markers();
    }

    fn resume(&self) {
        self.on_visibility_change(dom::document_hidden());
    }

    fn is_outside_click(&self, target: Option<&EventTarget>) -> bool {
        let Some(node) = target.and_then(|target| target.dyn_ref::<Node>()) else {
            return false;
        };
        !self.card.contains(Some(node)) && !self.open_button.contains(Some(node))
    }

    fn install_listeners(self: &Rc<Self>) {
        let (Ok(window), Ok(document)) = (dom::window(), dom::document()) else {
            console::warn!("card listeners not installed: no window");
            return;
        };
        let mut listeners = Vec::new();

        let controller = Rc::downgrade(self);
        listeners.push(EventListener::new(&self.open_button, "click", move |_event| {
            with_live(&controller, |this| this.toggle());
        }));

        let controller = Rc::downgrade(self);
        listeners.push(EventListener::new(&document, "click", move |event| {
            with_live(&controller, |this| {
                if this.is_outside_click(event.target().as_ref()) {
                    this.request(CardRequest::OutsideClick);
                }
            });
        }));

        let controller = Rc::downgrade(self);
        listeners.push(EventListener::new(&window, "resize", move |_event| {
            with_live(&controller, |this| this.snowfall.resize());
        }));

        let controller = Rc::downgrade(self);
        listeners.push(EventListener::new(&document, "visibilitychange", move |_event| {
            with_live(&controller, |this| this.on_visibility_change(dom::document_hidden()));
        }));

        *self.listeners.borrow_mut() = listeners;
        self.watch_card_size();
    }

    fn watch_card_size(self: &Rc<Self>) {
        let controller = Rc::downgrade(self);
        let callback = Closure::<dyn FnMut()>::new(move || {
            with_live(&controller, |this| {
                if this.snowfall.is_running() {
                    this.snowfall.resize();
                }
            });
        });
        match ResizeObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => {
                observer.observe(&self.card);
                *self.resize_watch.borrow_mut() = Some(ResizeWatch {
                    observer,
                    _callback: callback,
                });
            }
            Err(err) => console::warn!("card resize observer unavailable", js_err(err)),
        }
    }

    pub(crate) fn teardown(&self) {
        self.listeners.borrow_mut().clear();
        self.pending_marker.borrow_mut().take();
        if let Some(watch) = self.resize_watch.borrow_mut().take() {
            watch.observer.disconnect();
        }
        self.snowfall.stop();
        console::log!("card controller torn down");
    }
}

/// Page-level hooks shared by every controller mounted on this page.
fn install_page_lifecycle() {
    PAGE_LIFECYCLE.with(|slot| {
        let mut slot = slot.borrow_mut();
        if !slot.is_empty() {
            return;
        }
        let Ok(window) = dom::window() else {
            return;
        };
        slot.push(EventListener::new(&window, "pagehide", |event| {
            page_hidden(page_persisted(event));
        }));
        slot.push(EventListener::new(&window, "pageshow", |event| {
            page_shown(page_persisted(event));
        }));
    });
}

fn page_persisted(event: &Event) -> bool {
    event
        .dyn_ref::<PageTransitionEvent>()
        .map(|event| event.persisted())
        .unwrap_or(false)
}

fn page_hidden(persisted: bool) {
    if persisted {
        with_controller(|controller| controller.suspend());
        return;
    }
    let controller = CONTROLLER.with(|slot| slot.borrow_mut().take());
    if let Some(controller) = controller {
        controller.teardown();
    }
}

fn page_shown(persisted: bool) {
    if persisted {
        with_controller(|controller| controller.resume());
    }
}

fn with_live<F: FnOnce(&Rc<CardController>)>(controller: &Weak<CardController>, action: F) {
    if let Some(this) = controller.upgrade() {
        action(&this);
    }
}

fn with_controller<F: FnOnce(&Rc<CardController>)>(action: F) {
    let controller = CONTROLLER.with(|slot| slot.borrow().clone());
    if let Some(controller) = controller {
        action(&controller);
    }
}

pub(crate) fn boot(settings: CardSettings, device: DeviceClass) -> Result<(), String> {
    let elements = CardElements::lookup(&settings.elements)?;
    CardController::new(elements, &settings, device).mount();
    Ok(())
}

#[wasm_bindgen(js_name = openCard)]
pub fn open_card() {
    with_controller(|controller| controller.open());
}

#[wasm_bindgen(js_name = closeCard)]
pub fn close_card() {
    with_controller(|controller| controller.close());
}
