use noel_card_core::settings::SnowSettings;
use noel_card_core::snow::{spawn_flake, target_flake_count, SnowField, SurfaceSize};
use noel_card_core::DeviceClass;
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn narrow() -> DeviceClass {
    DeviceClass {
        narrow: true,
        ..DeviceClass::default()
    }
}

fn field_with(device: DeviceClass, width: f64, height: f64, seed: u64) -> (SnowField, SmallRng) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut field = SnowField::new(device, SnowSettings::default());
    field.configure(SurfaceSize::new(width, height, 1.0), &mut rng);
    (field, rng)
}

#[test]
fn target_count_is_monotonic_in_area() {
    let settings = SnowSettings::default();
    for device in [DeviceClass::desktop(), narrow()] {
        let mut previous = 0usize;
        for step in 0..400 {
            let area = step as f64 * 5_000.0;
            let count = target_flake_count(area, device, &settings);
            assert!(count >= previous, "area {area}: {count} < {previous}");
            previous = count;
        }
    }
}

#[test]
fn target_count_matches_reference_density() {
    let settings = SnowSettings::default();
    assert_eq!(target_flake_count(800.0 * 600.0, DeviceClass::desktop(), &settings), 70);
    assert_eq!(target_flake_count(800.0 * 600.0, narrow(), &settings), 35);
    assert_eq!(target_flake_count(1600.0 * 600.0, DeviceClass::desktop(), &settings), 140);
    // small surfaces still get half the baseline
    assert_eq!(target_flake_count(0.0, DeviceClass::desktop(), &settings), 35);
    assert_eq!(target_flake_count(-10.0, narrow(), &settings), 18);
}

#[test]
fn reduced_motion_means_no_flakes() {
    let settings = SnowSettings::default();
    let device = DeviceClass::desktop().with_reduced_motion(true);
    for area in [0.0, 1.0, 480_000.0, 10_000_000.0] {
        assert_eq!(target_flake_count(area, device, &settings), 0);
    }
    let (field, _) = field_with(device, 800.0, 600.0, 1);
    assert!(field.is_empty());
}

#[test]
fn configure_grows_and_shrinks_from_the_end() {
    let (mut field, mut rng) = field_with(DeviceClass::desktop(), 1600.0, 600.0, 7);
    assert_eq!(field.len(), 140);
    let head: Vec<_> = field.flakes()[..70].to_vec();

    field.configure(SurfaceSize::new(800.0, 600.0, 2.0), &mut rng);
    assert_eq!(field.len(), 70);
    assert_eq!(field.flakes(), head.as_slice());

    field.configure(SurfaceSize::new(1600.0, 600.0, 2.0), &mut rng);
    assert_eq!(field.len(), 140);
    assert_eq!(&field.flakes()[..70], head.as_slice());
}

#[test]
fn spawned_flakes_start_above_the_surface() {
    let mut rng = SmallRng::seed_from_u64(11);
    let mut large = 0;
    for _ in 0..2_000 {
        let flake = spawn_flake(&mut rng, 400.0, 300.0, DeviceClass::desktop());
        assert!(flake.y <= 0.0 && flake.y > -300.0);
        assert!(flake.x >= 0.0 && flake.x < 400.0);
        assert!(flake.radius >= 2.0 && flake.radius < 12.0);
        assert!(flake.alpha >= 0.65 && flake.alpha <= 1.0);
        assert!(flake.vy >= 0.15 && flake.vy < 0.75);
        assert!(flake.vx.abs() <= 0.15);
        if flake.radius >= 6.0 {
            large += 1;
        }
    }
    // roughly 12% large, plus normal flakes can't reach 6
    assert!(large > 150 && large < 350, "large flakes: {large}");
}

#[test]
fn compact_devices_get_smaller_flakes() {
    let mut rng = SmallRng::seed_from_u64(5);
    let touch = DeviceClass {
        touch: true,
        ..DeviceClass::default()
    };
    for _ in 0..500 {
        let flake = spawn_flake(&mut rng, 400.0, 300.0, touch);
        assert!(flake.radius < 12.0 * 0.6 + 1e-9);
    }
}

#[test]
fn long_pause_is_clamped() {
    let (mut field, mut rng) = field_with(DeviceClass::desktop(), 800.0, 100_000.0, 21);
    let before: Vec<_> = field.flakes().to_vec();

    let first = field.step(0.0, &mut rng);
    assert_eq!(first, 0.0);
    let dt = field.step(1000.0, &mut rng);
    assert!((dt - 50.0 / 16.6667).abs() < 1e-9);

    for (old, new) in before.iter().zip(field.flakes()) {
        // one clamped frame of fall plus the sway applied on both steps
        let max_fall = old.vy * dt * 10.0;
        assert!(new.y - old.y <= max_fall + 1e-9);
        let max_drift = old.vx.abs() * dt * 10.0 + 2.0 * 0.2;
        assert!((new.x - old.x).abs() <= max_drift + 1e-9);
    }
}

#[test]
fn backwards_clock_does_not_move_flakes_back() {
    let (mut field, mut rng) = field_with(DeviceClass::desktop(), 800.0, 600.0, 2);
    field.reset_clock(500.0);
    let before: Vec<_> = field.flakes().to_vec();
    let dt = field.step(100.0, &mut rng);
    assert_eq!(dt, 0.0);
    for (old, new) in before.iter().zip(field.flakes()) {
        assert_eq!(old.y, new.y);
    }
}
