pub const NARROW_QUERY: &str = "(max-width:600px)";
pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// Device and accessibility signals, sampled once at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceClass {
    pub narrow: bool,
    pub touch: bool,
    pub reduced_motion: bool,
}

impl DeviceClass {
    pub fn desktop() -> Self {
        Self::default()
    }

    /// Narrow viewports and touch screens share the lighter snow profile.
    pub fn compact(&self) -> bool {
        self.narrow || self.touch
    }

    pub fn with_reduced_motion(mut self, reduced_motion: bool) -> Self {
        self.reduced_motion = reduced_motion;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_alone_is_compact() {
        let device = DeviceClass {
            touch: true,
            ..DeviceClass::default()
        };
        assert!(device.compact());
        assert!(!DeviceClass::desktop().compact());
    }
}
