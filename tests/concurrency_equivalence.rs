use mvscost::{
    compute_cost_map, resolve_load_type, CostMetric, Homography, Image, Metric, MetricContext,
    MetricKind, Parameters,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::thread;

const WIDTH: usize = 40;
const HEIGHT: usize = 32;

fn random_image(seed: u64, kind: MetricKind) -> Image {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..WIDTH * HEIGHT)
        .map(|_| rng.random_range(0..=255u8))
        .collect();
    let mut img = Image::from_gray(data, WIDTH, HEIGHT).unwrap();
    img.prepare(resolve_load_type(kind));
    img
}

/// Per-pixel hypothesis: small, position-dependent sub-pixel shifts and a
/// mild perspective term, some of which push windows out of the target.
fn hypothesis(row: usize, col: usize) -> Homography {
    let tx = ((row * 7 + col * 3) % 11) as f64 * 0.37 - 1.5;
    let ty = ((row * 5 + col) % 7) as f64 * 0.29 - 0.8;
    Homography::new(1.01, 0.02, tx, -0.01, 0.99, ty, 1e-4, -2e-4, 1.0)
}

fn threaded_costs<M: CostMetric>(metric: &M, threads: usize) -> Vec<f64> {
    let mut costs = vec![0.0f64; WIDTH * HEIGHT];
    let rows_per = HEIGHT.div_ceil(threads);
    thread::scope(|s| {
        // Interleave: chunk i goes to a thread that walks its rows backwards.
        for (chunk_idx, chunk) in costs.chunks_mut(rows_per * WIDTH).enumerate() {
            s.spawn(move || {
                let rows = chunk.len() / WIDTH;
                for local in (0..rows).rev() {
                    let row = chunk_idx * rows_per + local;
                    for col in (0..WIDTH).rev() {
                        chunk[local * WIDTH + col] =
                            metric.evaluate(row, col, &hypothesis(row, col));
                    }
                }
            });
        }
    });
    costs
}

#[test]
fn threaded_evaluation_is_bit_identical_to_sequential() {
    let ctx = MetricContext::new();
    for kind in MetricKind::ALL {
        let reference = random_image(1, kind);
        let target = random_image(2, kind);
        let params = Parameters::for_metric(kind);
        let metric = Metric::new(&reference, &target, &params, &ctx).unwrap();

        let sequential = compute_cost_map(&metric, WIDTH, HEIGHT, hypothesis);
        for threads in [2, 5, 8] {
            let parallel = threaded_costs(&metric, threads);
            for (a, b) in sequential.as_slice().iter().zip(parallel.iter()) {
                assert_eq!(a.to_bits(), b.to_bits(), "{kind} with {threads} threads");
            }
        }
        assert!(sequential.stats().is_some(), "{kind}");
    }
}
