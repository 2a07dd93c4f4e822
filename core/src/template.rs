//! Ordering rules for the deferred card content.
//!
//! Template children are classified into script descriptors and plain
//! nodes. External scripts load first, strictly in document order; the
//! second pass then runs inline code and appends content in the original
//! order.

pub const DESCRIPTOR_TYPE: &str = "text/template";
pub const CLASSIC_SCRIPT_TYPE: &str = "text/javascript";
pub const MODULE_SCRIPT_TYPE: &str = "module";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScriptKind {
    #[default]
    Classic,
    Module,
}

impl ScriptKind {
    /// Maps a `data-type` attribute; `None` means the type is unsupported.
    pub fn from_data_type(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            None | Some("") | Some(CLASSIC_SCRIPT_TYPE) => Some(ScriptKind::Classic),
            Some(MODULE_SCRIPT_TYPE) => Some(ScriptKind::Module),
            Some(_) => None,
        }
    }

    pub fn is_module(self) -> bool {
        matches!(self, ScriptKind::Module)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptDescriptor {
    pub src: Option<String>,
    pub code: String,
    pub data_type: Option<String>,
}

impl ScriptDescriptor {
    pub fn external(src: &str) -> Self {
        Self {
            src: Some(src.to_string()),
            code: String::new(),
            data_type: None,
        }
    }

    pub fn inline(code: &str) -> Self {
        Self {
            src: None,
            code: code.to_string(),
            data_type: None,
        }
    }

    pub fn with_data_type(mut self, data_type: &str) -> Self {
        self.data_type = Some(data_type.to_string());
        self
    }

    pub fn kind(&self) -> Option<ScriptKind> {
        ScriptKind::from_data_type(self.data_type.as_deref())
    }

    fn source_url(&self) -> Option<&str> {
        self.src
            .as_deref()
            .map(str::trim)
            .filter(|src| !src.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateItem<N> {
    Script(ScriptDescriptor),
    Content(N),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalScript {
    pub url: String,
    pub kind: ScriptKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SecondPassStep<N> {
    RunInline { code: String, kind: ScriptKind },
    Append(N),
}

/// Descriptor the plan had to leave out, reported so the caller can log it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedScript {
    pub url: String,
    pub data_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InjectionPlan<N> {
    pub external: Vec<ExternalScript>,
    pub second_pass: Vec<SecondPassStep<N>>,
    pub skipped: Vec<SkippedScript>,
}

impl<N> Default for InjectionPlan<N> {
    fn default() -> Self {
        Self {
            external: Vec::new(),
            second_pass: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<N> InjectionPlan<N> {
    pub fn inline_count(&self) -> usize {
        self.second_pass
            .iter()
            .filter(|step| matches!(step, SecondPassStep::RunInline { .. }))
            .count()
    }
}

pub fn plan_injection<N>(items: Vec<TemplateItem<N>>) -> InjectionPlan<N> {
    let mut plan = InjectionPlan::default();
    for item in items {
        match item {
            TemplateItem::Script(descriptor) => {
                let kind = descriptor.kind();
                if let Some(url) = descriptor.source_url() {
                    match kind {
                        Some(kind) => plan.external.push(ExternalScript {
                            url: url.to_string(),
                            kind,
                        }),
                        None => plan.skipped.push(SkippedScript {
                            url: url.to_string(),
                            data_type: descriptor.data_type.clone().unwrap_or_default(),
                        }),
                    }
                }
                if !descriptor.code.trim().is_empty() {
                    plan.second_pass.push(SecondPassStep::RunInline {
                        code: descriptor.code,
                        kind: kind.unwrap_or_default(),
                    });
                }
            }
            TemplateItem::Content(node) => plan.second_pass.push(SecondPassStep::Append(node)),
        }
    }
    plan
}
