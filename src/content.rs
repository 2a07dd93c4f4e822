use std::cell::Cell;
use std::rc::Rc;

use gloo::console;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlTemplateElement, Node};

use noel_card_core::template::{
    plan_injection, ScriptDescriptor, SecondPassStep, TemplateItem, DESCRIPTOR_TYPE,
};

use crate::dom::js_err;
use crate::script_loader::{load_external_script, run_inline_script};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InjectState {
    Idle,
    Running,
    Done,
}

pub(crate) struct ContentInjector {
    template: HtmlTemplateElement,
    target: Element,
    state: Cell<InjectState>,
    inline_runs: Cell<usize>,
}

impl ContentInjector {
    pub(crate) fn new(template: HtmlTemplateElement, target: Element) -> Rc<Self> {
        Rc::new(Self {
            template,
            target,
            state: Cell::new(InjectState::Idle),
            inline_runs: Cell::new(0),
        })
    }

    pub(crate) fn is_loaded(&self) -> bool {
        self.state.get() == InjectState::Done
    }

    pub(crate) fn inline_runs(&self) -> usize {
        self.inline_runs.get()
    }

    /// Clones the template into the card once per page. Later calls, and
    /// calls made while the first one is still loading, return immediately.
    pub(crate) async fn inject_once(&self) {
        if self.state.get() != InjectState::Idle {
            return;
        }
        self.state.set(InjectState::Running);

        let items = match self.template.content().clone_node_with_deep(true) {
            Ok(fragment) => classify_children(&fragment),
            Err(err) => {
                console::warn!("card template could not be cloned", js_err(err));
                Vec::new()
            }
        };
        let plan = plan_injection(items);
        let external_count = plan.external.len();
        let inline_planned = plan.inline_count();
        for skipped in &plan.skipped {
            console::warn!(
                "skipping script with unsupported data-type",
                skipped.url.clone(),
                skipped.data_type.clone()
            );
        }

        for external in &plan.external {
            let _ = load_external_script(&external.url, external.kind).await;
        }

        for step in plan.second_pass {
            match step {
                SecondPassStep::RunInline { code, kind } => match run_inline_script(&code, kind) {
                    Ok(_) => self.inline_runs.set(self.inline_runs.get() + 1),
                    Err(err) => console::warn!("inline card script failed", js_err(err)),
                },
                SecondPassStep::Append(node) => {
                    if let Err(err) = self.target.append_child(&node) {
                        console::warn!("card content node could not be appended", js_err(err));
                    }
                }
            }
        }

        self.state.set(InjectState::Done);
        console::log!(
            "card content injected",
            external_count as u32,
            self.inline_runs() as u32,
            inline_planned as u32
        );
    }
}

fn classify_children(fragment: &Node) -> Vec<TemplateItem<Node>> {
    let children = fragment.child_nodes();
    let mut items = Vec::with_capacity(children.length() as usize);
    for index in 0..children.length() {
        let Some(node) = children.item(index) else {
            continue;
        };
        match script_descriptor(&node) {
            Some(descriptor) => items.push(TemplateItem::Script(descriptor)),
            None => items.push(TemplateItem::Content(node)),
        }
    }
    items
}

fn script_descriptor(node: &Node) -> Option<ScriptDescriptor> {
    let element = node.dyn_ref::<Element>()?;
    if !element.tag_name().eq_ignore_ascii_case("script") {
        return None;
    }
    let script_type = element.get_attribute("type")?;
    if !script_type.trim().eq_ignore_ascii_case(DESCRIPTOR_TYPE) {
        return None;
    }
    Some(ScriptDescriptor {
        src: element.get_attribute("data-src"),
        code: element.inner_html(),
        data_type: element.get_attribute("data-type"),
    })
}
