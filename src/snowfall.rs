use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use gloo::render::{request_animation_frame, AnimationFrame};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Element, HtmlCanvasElement};

use noel_card_core::snow::{flake_style, SnowField, SurfaceSize};
use noel_card_core::{DeviceClass, SnowSettings};

use crate::dom;

pub(crate) struct Snowfall {
    canvas: Option<HtmlCanvasElement>,
    container: Element,
    ctx: RefCell<Option<CanvasRenderingContext2d>>,
    field: RefCell<SnowField>,
    rng: RefCell<SmallRng>,
    frame: RefCell<Option<AnimationFrame>>,
}

fn seed_rng() -> SmallRng {
    let entropy = js_sys::Math::random() * u32::MAX as f64;
    let clock = js_sys::Date::now();
    SmallRng::seed_from_u64(((entropy as u64) << 32) ^ clock.to_bits())
}

impl Snowfall {
    pub(crate) fn new(
        canvas: Option<HtmlCanvasElement>,
        container: Element,
        device: DeviceClass,
        settings: SnowSettings,
    ) -> Rc<Self> {
        Rc::new(Self {
            canvas,
            container,
            ctx: RefCell::new(None),
            field: RefCell::new(SnowField::new(device, settings)),
            rng: RefCell::new(seed_rng()),
            frame: RefCell::new(None),
        })
    }

    pub(crate) fn is_running(&self) -> bool {
        self.frame.borrow().is_some()
    }

    pub(crate) fn flake_count(&self) -> usize {
        self.field.borrow().len()
    }

    /// Matches the canvas to the container box and retargets the flake count.
    pub(crate) fn resize(&self) {
        let Some(canvas) = self.canvas.as_ref() else {
            return;
        };
        let rect = self.container.get_bounding_client_rect();
        let surface = SurfaceSize::new(rect.width(), rect.height(), dom::device_pixel_ratio());
        canvas.set_width(surface.backing_width());
        canvas.set_height(surface.backing_height());
        let style = canvas.style();
        let _ = style.set_property("width", &format!("{}px", surface.width));
        let _ = style.set_property("height", &format!("{}px", surface.height));

        match context_2d(canvas) {
            Ok(ctx) => {
                let _ = ctx.set_transform(surface.dpr, 0.0, 0.0, surface.dpr, 0.0, 0.0);
                *self.ctx.borrow_mut() = Some(ctx);
            }
            Err(err) => {
                gloo::console::warn!("snow canvas has no 2d context", dom::js_err(err));
                self.ctx.borrow_mut().take();
            }
        }

        let mut rng = self.rng.borrow_mut();
        self.field.borrow_mut().configure(surface, &mut *rng);
    }

    pub(crate) fn start(self: &Rc<Self>) {
        if self.canvas.is_none() {
            return;
        }
        self.resize();
        // reduced motion configures an empty field
        if self.field.borrow().is_empty() {
            return;
        }
        self.field.borrow_mut().reset_clock(dom::now_ms());
        if !self.is_running() {
            gloo::console::log!("snowfall started", self.flake_count() as u32);
            self.schedule();
        }
    }

    pub(crate) fn stop(&self) {
        self.frame.borrow_mut().take();
    }

    fn schedule(self: &Rc<Self>) {
        let snow = Rc::clone(self);
        let handle = request_animation_frame(move |timestamp| {
            snow.frame.borrow_mut().take();
            snow.tick(timestamp);
        });
        *self.frame.borrow_mut() = Some(handle);
    }

    fn tick(self: &Rc<Self>, now: f64) {
        if self.ctx.borrow().is_none() {
            return;
        }
        {
            let mut rng = self.rng.borrow_mut();
            self.field.borrow_mut().step(now, &mut *rng);
        }
        self.paint();
        self.schedule();
    }

    fn paint(&self) {
        let ctx = self.ctx.borrow();
        let Some(ctx) = ctx.as_ref() else {
            return;
        };
        let field = self.field.borrow();
        let surface = field.surface();
        let device = field.device();
        ctx.clear_rect(0.0, 0.0, surface.width, surface.height);
        for flake in field.flakes() {
            let style = flake_style(flake, device);
            ctx.save();
            ctx.begin_path();
            ctx.set_fill_style_str(&style.fill_css());
            ctx.set_shadow_blur(style.shadow_blur);
            ctx.set_shadow_color(&style.shadow_css());
            let _ = ctx.arc(flake.x, flake.y, flake.radius, 0.0, TAU);
            ctx.fill();
            ctx.restore();
        }
    }
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| JsValue::from_str("unexpected 2d context type"))
}
