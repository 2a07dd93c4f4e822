use std::f64::consts::TAU;

use rand::Rng;

use crate::device::DeviceClass;
use crate::settings::SnowSettings;

pub const LARGE_FLAKE_CHANCE: f64 = 0.12;
pub const COMPACT_SIZE_FACTOR: f64 = 0.6;
pub const NARROW_FALL_FACTOR: f64 = 0.9;
pub const NARROW_SWING_FACTOR: f64 = 0.8;
pub const MOTION_SCALE_DESKTOP: f64 = 10.0;
pub const MOTION_SCALE_NARROW: f64 = 6.0;
pub const SWAY_DESKTOP: f64 = 0.2;
pub const SWAY_NARROW: f64 = 0.14;
pub const GLOW_RADIUS_THRESHOLD: f64 = 5.0;
pub const GLOW_BLUR: f64 = 8.0;
pub const GLOW_ALPHA: f64 = 0.9;
pub const PLAIN_BLUR: f64 = 1.0;
pub const PLAIN_ALPHA: f64 = 0.6;
const RESPAWN_TOP_OFFSET: f64 = 10.0;
const RESPAWN_TOP_JITTER: f64 = 60.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Flake {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub vx: f64,
    pub vy: f64,
    pub swing: f64,
    pub swing_speed: f64,
    pub alpha: f64,
}

/// CSS size of the drawing surface plus the device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
    pub dpr: f64,
}

impl SurfaceSize {
    pub fn new(width: f64, height: f64, dpr: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            dpr: if dpr > 0.0 { dpr } else { 1.0 },
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn backing_width(&self) -> u32 {
        (self.width * self.dpr).floor().max(1.0) as u32
    }

    pub fn backing_height(&self) -> u32 {
        (self.height * self.dpr).floor().max(1.0) as u32
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

/// Number of flakes a surface of `area` square pixels should carry.
pub fn target_flake_count(area: f64, device: DeviceClass, settings: &SnowSettings) -> usize {
    if device.reduced_motion {
        return 0;
    }
    let base = if device.compact() {
        settings.base_compact
    } else {
        settings.base_desktop
    };
    let reference = (settings.reference_width * settings.reference_height).max(1.0);
    let area = if area.is_finite() { area.max(0.0) } else { 0.0 };
    let area_factor = (area / reference).max(settings.min_area_factor);
    (base.max(0.0) * area_factor).round() as usize
}

pub fn spawn_flake<R: Rng + ?Sized>(
    rng: &mut R,
    width: f64,
    height: f64,
    device: DeviceClass,
) -> Flake {
    let size_factor = if device.compact() {
        COMPACT_SIZE_FACTOR
    } else {
        1.0
    };
    let radius = if rng.random::<f64>() < LARGE_FLAKE_CHANCE {
        6.0 * size_factor + rng.random::<f64>() * 6.0 * size_factor
    } else {
        2.0 * size_factor + rng.random::<f64>() * 4.0 * size_factor
    };
    let fall_factor = if device.narrow { NARROW_FALL_FACTOR } else { 1.0 };
    let drift = if device.narrow { 0.25 } else { 0.3 };
    let swing_factor = if device.narrow {
        NARROW_SWING_FACTOR
    } else {
        1.0
    };
    Flake {
        x: rng.random::<f64>() * width,
        y: -(rng.random::<f64>() * height),
        radius,
        vy: (0.15 + rng.random::<f64>() * 0.6) * fall_factor,
        vx: (rng.random::<f64>() - 0.5) * drift,
        swing: rng.random::<f64>() * TAU,
        swing_speed: (0.001 + rng.random::<f64>() * 0.003) * swing_factor,
        alpha: 0.65 + rng.random::<f64>() * 0.35,
    }
}

/// Paint parameters for a single flake.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlakeStyle {
    pub fill_alpha: f64,
    pub shadow_blur: f64,
    pub shadow_alpha: f64,
}

impl FlakeStyle {
    pub fn fill_css(&self) -> String {
        format!("rgba(255,255,255,{})", self.fill_alpha)
    }

    pub fn shadow_css(&self) -> String {
        format!("rgba(255,255,255,{})", self.shadow_alpha)
    }
}

pub fn flake_style(flake: &Flake, device: DeviceClass) -> FlakeStyle {
    if flake.radius > GLOW_RADIUS_THRESHOLD && !device.narrow {
        FlakeStyle {
            fill_alpha: flake.alpha,
            shadow_blur: GLOW_BLUR,
            shadow_alpha: GLOW_ALPHA,
        }
    } else {
        FlakeStyle {
            fill_alpha: flake.alpha,
            shadow_blur: PLAIN_BLUR,
            shadow_alpha: PLAIN_ALPHA,
        }
    }
}

pub struct SnowField {
    flakes: Vec<Flake>,
    device: DeviceClass,
    settings: SnowSettings,
    surface: SurfaceSize,
    last_tick_ms: Option<f64>,
}

impl SnowField {
    pub fn new(device: DeviceClass, settings: SnowSettings) -> Self {
        Self {
            flakes: Vec::new(),
            device,
            settings,
            surface: SurfaceSize::default(),
            last_tick_ms: None,
        }
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    pub fn flakes(&self) -> &[Flake] {
        &self.flakes
    }

    pub fn len(&self) -> usize {
        self.flakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flakes.is_empty()
    }

    /// Adopts `surface` and grows or truncates the set to its target count.
    /// Surviving flakes keep their state.
    pub fn configure<R: Rng + ?Sized>(&mut self, surface: SurfaceSize, rng: &mut R) -> usize {
        self.surface = surface;
        let target = target_flake_count(surface.area(), self.device, &self.settings);
        while self.flakes.len() < target {
            let flake = spawn_flake(rng, surface.width, surface.height, self.device);
            self.flakes.push(flake);
        }
        self.flakes.truncate(target);
        target
    }

    pub fn reset_clock(&mut self, now_ms: f64) {
        self.last_tick_ms = Some(now_ms);
    }

    /// Frame step normalised to 60 updates per second, with gaps clamped
    /// to `max_frame_gap_ms`. Never negative, whatever the settings say.
    pub fn frame_delta(&mut self, now_ms: f64) -> f64 {
        let elapsed = match self.last_tick_ms {
            Some(prev) => (now_ms - prev).max(0.0),
            None => 0.0,
        };
        self.last_tick_ms = Some(now_ms);
        let frame_ms = self.settings.frame_ms.max(f64::EPSILON);
        elapsed.min(self.settings.max_frame_gap_ms.max(0.0)) / frame_ms
    }

    /// Advances every flake and returns the normalised step used.
    pub fn step<R: Rng + ?Sized>(&mut self, now_ms: f64, rng: &mut R) -> f64 {
        let dt = self.frame_delta(now_ms);
        let narrow = self.device.narrow;
        let scale = if narrow {
            MOTION_SCALE_NARROW
        } else {
            MOTION_SCALE_DESKTOP
        };
        let sway = if narrow { SWAY_NARROW } else { SWAY_DESKTOP };
        let fall_factor = if narrow { NARROW_FALL_FACTOR } else { 1.0 };
        let width = self.surface.width;
        let floor = self.surface.height + self.settings.respawn_margin;
        for flake in &mut self.flakes {
            flake.swing += flake.swing_speed * dt * scale;
            flake.x += flake.vx * dt * scale + flake.swing.sin() * sway;
            flake.y += flake.vy * dt * scale;
            if flake.y > floor {
                flake.x = rng.random::<f64>() * width;
                flake.y = -RESPAWN_TOP_OFFSET - rng.random::<f64>() * RESPAWN_TOP_JITTER;
                flake.vy = (0.4 + rng.random::<f64>() * 1.2) * fall_factor;
            }
        }
        dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn backing_size_never_zero() {
        let surface = SurfaceSize::new(0.2, 0.0, 2.0);
        assert_eq!(surface.backing_width(), 1);
        assert_eq!(surface.backing_height(), 1);
        assert_eq!(SurfaceSize::new(400.5, 300.0, 2.0).backing_width(), 801);
    }

    #[test]
    fn glow_is_skipped_on_narrow_devices() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut flake = spawn_flake(&mut rng, 100.0, 100.0, DeviceClass::desktop());
        flake.radius = 7.0;
        let desktop = flake_style(&flake, DeviceClass::desktop());
        assert_eq!(desktop.shadow_blur, GLOW_BLUR);
        let narrow = DeviceClass {
            narrow: true,
            ..DeviceClass::default()
        };
        assert_eq!(flake_style(&flake, narrow).shadow_blur, PLAIN_BLUR);
        flake.radius = 5.0;
        assert_eq!(flake_style(&flake, DeviceClass::desktop()).shadow_blur, PLAIN_BLUR);
    }

    fn field_with(device: DeviceClass, width: f64, height: f64, seed: u64) -> (SnowField, SmallRng) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut field = SnowField::new(device, SnowSettings::default());
        field.configure(SurfaceSize::new(width, height, 1.0), &mut rng);
        (field, rng)
    }

    #[test]
    fn fallen_flake_is_recycled_not_removed() {
        let device = DeviceClass {
            narrow: true,
            ..DeviceClass::default()
        };
        let (mut field, mut rng) = field_with(device, 300.0, 200.0, 9);
        let count = field.len();
        field.flakes[0].y = 200.0 + 10.5;
        field.reset_clock(0.0);
        field.step(16.0, &mut rng);

        assert_eq!(field.len(), count);
        let flake = field.flakes[0];
        assert!(flake.y < 0.0 && flake.y >= -70.0, "y {}", flake.y);
        assert!(flake.x >= 0.0 && flake.x < 300.0);
        assert!(flake.vy >= 0.4 * 0.9 && flake.vy < 1.6 * 0.9);
    }

    #[test]
    fn flake_inside_the_margin_is_left_alone() {
        let (mut field, mut rng) = field_with(DeviceClass::desktop(), 300.0, 200.0, 4);
        for flake in &mut field.flakes {
            flake.y = 150.0;
            flake.vy = 0.0;
        }
        field.reset_clock(0.0);
        field.step(16.0, &mut rng);
        assert!(field.flakes.iter().all(|flake| flake.y == 150.0));
    }

    #[test]
    fn negative_frame_gap_setting_never_reverses_time() {
        let settings = SnowSettings {
            max_frame_gap_ms: -40.0,
            ..SnowSettings::default()
        };
        let mut rng = SmallRng::seed_from_u64(12);
        let mut field = SnowField::new(DeviceClass::desktop(), settings);
        field.configure(SurfaceSize::new(800.0, 600.0, 1.0), &mut rng);
        let before: Vec<f64> = field.flakes.iter().map(|flake| flake.y).collect();
        field.reset_clock(0.0);
        let dt = field.step(16.0, &mut rng);
        assert_eq!(dt, 0.0);
        for (old, flake) in before.iter().zip(&field.flakes) {
            assert!(flake.y >= *old);
        }
    }

    #[test]
    fn fill_css_uses_alpha() {
        let style = FlakeStyle {
            fill_alpha: 0.75,
            shadow_blur: 1.0,
            shadow_alpha: 0.6,
        };
        assert_eq!(style.fill_css(), "rgba(255,255,255,0.75)");
        assert_eq!(style.shadow_css(), "rgba(255,255,255,0.6)");
    }
}
