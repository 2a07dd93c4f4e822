pub mod card;
pub mod device;
pub mod page_turn;
pub mod settings;
pub mod sniff;
pub mod snow;
pub mod template;

pub use card::{CardEffect, CardMarker, CardRequest, CardState, CardTiming, MarkerDelay, TurnMode};
pub use device::DeviceClass;
pub use page_turn::{page_turn_plan, PageTurnPlan, TurnSegment, TweenPosition, TweenValue};
pub use settings::{CardSettings, ElementIds, SettingsError, SnowSettings};
pub use sniff::{sniff_script_payload, PayloadRejected};
pub use snow::{flake_style, spawn_flake, target_flake_count, Flake, FlakeStyle, SnowField, SurfaceSize};
pub use template::{
    plan_injection, ExternalScript, InjectionPlan, ScriptDescriptor, ScriptKind, SecondPassStep,
    SkippedScript, TemplateItem,
};
