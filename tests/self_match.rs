use mvscost::{
    resolve_load_type, CostMetric, Homography, Image, LoadType, Metric, MetricContext,
    MetricKind, Parameters, BAD_COST,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Smooth-ish texture: a ramp plus bounded noise, so bilateral windows keep
/// enough similar neighbours to have a well-defined weighted variance.
fn texture(width: usize, height: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let base = (x * 3 + y * 2) as i32 % 120;
            let noise = rng.random_range(0..=60);
            data.push((base + noise + 20) as u8);
        }
    }
    data
}

fn twin_images(width: usize, height: usize, load: LoadType) -> (Image, Image) {
    let data = texture(width, height, 99);
    let mut a = Image::from_gray(data.clone(), width, height).unwrap();
    let mut b = Image::from_gray(data, width, height).unwrap();
    a.prepare(load);
    b.prepare(load);
    assert_ne!(a.id(), b.id());
    (a, b)
}

fn assert_interior_self_match(kind: MetricKind, tol: f64) {
    let ctx = MetricContext::new();
    let load = resolve_load_type(kind);
    let (reference, target) = twin_images(28, 24, load);
    let params = Parameters::for_metric(kind);
    let metric = Metric::new(&reference, &target, &params, &ctx).unwrap();
    let half = params.half_window;
    let h = Homography::identity();
    for row in half..reference.height() - half {
        for col in half..reference.width() - half {
            let cost = metric.evaluate(row, col, &h);
            assert!(cost < BAD_COST, "{kind} bad at ({row}, {col})");
            assert!(cost.abs() <= tol, "{kind} cost {cost} at ({row}, {col})");
        }
    }
}

#[test]
fn ncc_self_match_is_zero() {
    assert_interior_self_match(MetricKind::Ncc, 1e-9);
}

#[test]
fn bilateral_ncc_self_match_is_zero() {
    assert_interior_self_match(MetricKind::BilateralNcc, 1e-9);
}

#[test]
fn patch_match_self_match_is_zero() {
    assert_interior_self_match(MetricKind::PatchMatch, 1e-9);
}

#[test]
fn census_self_match_is_zero() {
    assert_interior_self_match(MetricKind::Census, 0.0);
}

#[test]
fn descriptor_self_match_is_zero() {
    assert_interior_self_match(MetricKind::Descriptor, 1e-5);
}

#[test]
fn shifted_target_matches_under_translation() {
    let width = 30;
    let height = 26;
    let data = texture(width + 2, height, 7);
    let reference_data: Vec<u8> = data
        .chunks(width + 2)
        .flat_map(|row| row[..width].to_vec())
        .collect();
    let target_data: Vec<u8> = data
        .chunks(width + 2)
        .flat_map(|row| row[2..].to_vec())
        .collect();
    let reference = Image::from_gray(reference_data, width, height).unwrap();
    let target = Image::from_gray(target_data, width, height).unwrap();

    let ctx = MetricContext::new();
    let params = Parameters::for_metric(MetricKind::Ncc);
    let metric = Metric::new(&reference, &target, &params, &ctx).unwrap();
    // Reference pixel x appears at x - 2 in the target.
    let h = Homography::new(1.0, 0.0, -2.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
    let wrong = Homography::identity();
    let good = metric.evaluate(12, 14, &h);
    let bad = metric.evaluate(12, 14, &wrong);
    assert!(good < 1e-9, "good {good}");
    assert!(bad > good);
}
