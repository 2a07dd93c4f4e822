use crate::device::DeviceClass;

pub const PAGES_SELECTOR: &str = ".pages";
pub const COVER_SELECTOR: &str = ".card-cover";
pub const INNER_SELECTOR: &str = ".card-inner";

pub const TURN_TARGETS: [&str; 3] = [COVER_SELECTOR, PAGES_SELECTOR, INNER_SELECTOR];

#[derive(Clone, Debug, PartialEq)]
pub enum TweenValue {
    Number(f64),
    Text(&'static str),
    Flag(bool),
}

#[derive(Clone, Debug, PartialEq)]
pub enum TweenPosition {
    /// Absolute offset in seconds from the timeline start.
    At(f64),
    /// Relative position string understood by the timeline (`">-0.15"`).
    Label(&'static str),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TurnSegment {
    pub target: &'static str,
    pub vars: Vec<(&'static str, TweenValue)>,
    pub position: TweenPosition,
}

impl TurnSegment {
    pub fn duration(&self) -> f64 {
        self.vars
            .iter()
            .find_map(|(key, value)| match (key, value) {
                (&"duration", TweenValue::Number(value)) => Some(*value),
                _ => None,
            })
            .unwrap_or(0.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PageTurnPlan {
    pub setup_targets: [&'static str; 3],
    pub setup_vars: Vec<(&'static str, TweenValue)>,
    pub segments: Vec<TurnSegment>,
}

impl PageTurnPlan {
    /// Seconds until the last segment settles, assuming each labelled
    /// segment starts where `">-offset"` puts it.
    pub fn total_duration(&self) -> f64 {
        let mut end: f64 = 0.0;
        let mut previous_end: f64 = 0.0;
        for segment in &self.segments {
            let start = match segment.position {
                TweenPosition::At(at) => at,
                TweenPosition::Label(label) => relative_start(label, previous_end),
            };
            previous_end = start + segment.duration();
            end = end.max(previous_end);
        }
        end
    }
}

fn relative_start(label: &str, previous_end: f64) -> f64 {
    label
        .strip_prefix('>')
        .and_then(|offset| offset.parse::<f64>().ok())
        .map(|offset| previous_end + offset)
        .unwrap_or(previous_end)
}

pub fn page_turn_plan(device: DeviceClass) -> PageTurnPlan {
    let narrow = device.narrow;
    let main_duration = if narrow { 1.2 } else { 1.8 };
    let settle_duration = if narrow { 0.45 } else { 0.8 };
    let page_rotation = if narrow { -140.0 } else { -160.0 };
    PageTurnPlan {
        setup_targets: TURN_TARGETS,
        setup_vars: vec![
            ("transformStyle", TweenValue::Text("preserve-3d")),
            ("force3D", TweenValue::Flag(true)),
        ],
        segments: vec![
            TurnSegment {
                target: PAGES_SELECTOR,
                vars: vec![
                    ("duration", TweenValue::Number(main_duration)),
                    ("rotationY", TweenValue::Number(page_rotation)),
                    ("transformOrigin", TweenValue::Text("left center")),
                    ("ease", TweenValue::Text("power2.inOut")),
                ],
                position: TweenPosition::At(0.0),
            },
            TurnSegment {
                target: COVER_SELECTOR,
                vars: vec![
                    ("duration", TweenValue::Number(main_duration)),
                    ("rotationY", TweenValue::Number(-180.0)),
                    ("transformOrigin", TweenValue::Text("left center")),
                    ("ease", TweenValue::Text("power2.inOut")),
                ],
                position: TweenPosition::At(0.0),
            },
            TurnSegment {
                target: INNER_SELECTOR,
                vars: vec![
                    ("duration", TweenValue::Number(main_duration)),
                    ("rotationY", TweenValue::Number(if narrow { 6.0 } else { 10.0 })),
                    ("x", TweenValue::Text(if narrow { "8%" } else { "12%" })),
                    ("z", TweenValue::Number(if narrow { 4.0 } else { 8.0 })),
                    ("ease", TweenValue::Text("power2.out")),
                ],
                position: TweenPosition::At(0.03),
            },
            TurnSegment {
                target: PAGES_SELECTOR,
                vars: vec![
                    ("duration", TweenValue::Number(settle_duration)),
                    ("rotationY", TweenValue::Number(-12.0)),
                    ("ease", TweenValue::Text("elastic.out(1, 0.6)")),
                ],
                position: TweenPosition::Label(">-0.15"),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_turn_total_duration() {
        let plan = page_turn_plan(DeviceClass::desktop());
        let total = plan.total_duration();
        assert!((total - 2.48).abs() < 1e-9, "total {total}");
        assert_eq!(plan.segments.len(), 4);
    }

    #[test]
    fn narrow_turn_is_shorter_and_shallower() {
        let narrow = DeviceClass {
            narrow: true,
            ..DeviceClass::default()
        };
        let plan = page_turn_plan(narrow);
        assert_eq!(plan.segments[0].duration(), 1.2);
        assert!(plan.segments[0]
            .vars
            .contains(&("rotationY", TweenValue::Number(-140.0))));
        assert!(plan.total_duration() < page_turn_plan(DeviceClass::desktop()).total_duration());
    }
}
