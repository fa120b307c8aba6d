use mvscost::descriptor::{Daisy, DescriptorExtractor, DescriptorVolume};
use mvscost::{
    CostMetric, DescriptorDistance, DescriptorMetric, Homography, Image, Metric,
    MetricContext, MetricKind, Parameters, BAD_COST,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

/// Wraps the default extractor and counts `compute` calls.
struct CountingDaisy {
    inner: Daisy,
    calls: AtomicUsize,
    delay: Duration,
}

impl CountingDaisy {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner: Daisy::default(),
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DescriptorExtractor for CountingDaisy {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn compute(&self, image: &Image) -> DescriptorVolume {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        self.inner.compute(image)
    }
}

fn image(seed: usize) -> Image {
    let data = (0..32 * 32)
        .map(|i| ((i * 29 + seed * 7) ^ (i / 32 * 13)) as u8)
        .collect();
    Image::from_gray(data, 32, 32).unwrap()
}

#[test]
fn repeated_evaluations_compute_each_image_once() {
    let counter = CountingDaisy::new(Duration::ZERO);
    let ctx = MetricContext::with_extractor(counter.clone());
    let reference = image(1);
    let target = image(2);
    let params = Parameters::for_metric(MetricKind::Descriptor);
    let metric = DescriptorMetric::new(&reference, &target, &params, ctx.descriptors()).unwrap();

    assert_eq!(counter.calls(), 0);
    let h = Homography::identity();
    let a = metric.evaluate(10, 10, &h);
    let b = metric.evaluate(20, 5, &h);
    let _ = metric.evaluate(10, 10, &h);
    assert!(a < BAD_COST && b < BAD_COST);
    assert_eq!(counter.calls(), 2);
    assert_eq!(ctx.descriptors().computed_count(), 2);
    assert_eq!(ctx.descriptors().len(), 2);
}

#[test]
fn warm_resolves_both_volumes_before_evaluation() {
    let counter = CountingDaisy::new(Duration::ZERO);
    let ctx = MetricContext::with_extractor(counter.clone());
    let reference = image(11);
    let target = image(12);
    let params = Parameters::for_metric(MetricKind::Descriptor);
    let metric = Metric::new(&reference, &target, &params, &ctx).unwrap();

    metric.warm();
    assert_eq!(counter.calls(), 2);
    metric.warm();
    assert!(metric.evaluate(16, 16, &Homography::identity()) < BAD_COST);
    assert_eq!(counter.calls(), 2);
}

#[test]
fn metrics_sharing_an_image_share_its_volume() {
    let counter = CountingDaisy::new(Duration::ZERO);
    let ctx = MetricContext::with_extractor(counter.clone());
    let reference = image(3);
    let first = image(4);
    let second = image(5);
    let params = Parameters::for_metric(MetricKind::Descriptor);
    let h = Homography::identity();

    let m1 = DescriptorMetric::new(&reference, &first, &params, ctx.descriptors()).unwrap();
    let m2 = DescriptorMetric::new(&reference, &second, &params, ctx.descriptors()).unwrap();
    m1.evaluate(8, 8, &h);
    m2.evaluate(8, 8, &h);
    assert_eq!(counter.calls(), 3);

    let cached = ctx.descriptors().get(reference.id()).unwrap();
    assert!(Arc::ptr_eq(
        &cached,
        &ctx.descriptors().get_or_compute(&reference)
    ));
    assert_eq!(counter.calls(), 3);
}

#[test]
fn racing_threads_trigger_a_single_computation() {
    let counter = CountingDaisy::new(Duration::from_millis(30));
    let ctx = MetricContext::with_extractor(counter.clone());
    let reference = image(6);
    let target = image(7);
    let params = Parameters::for_metric(MetricKind::Descriptor);
    let metric = DescriptorMetric::new(&reference, &target, &params, ctx.descriptors()).unwrap();
    let h = Homography::identity();

    let threads = 8;
    let barrier = Barrier::new(threads);
    let costs: Vec<f64> = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let metric = &metric;
                let barrier = &barrier;
                let h = &h;
                s.spawn(move || {
                    barrier.wait();
                    metric.evaluate(8 + i, 9, h)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(costs.iter().all(|&c| c < BAD_COST));
    assert_eq!(counter.calls(), 2);
}

#[test]
fn release_drops_cached_volumes() {
    let counter = CountingDaisy::new(Duration::ZERO);
    let ctx = MetricContext::with_extractor(counter.clone());
    let reference = image(8);
    let target = image(9);
    let params = Parameters::for_metric(MetricKind::Descriptor);
    let h = Homography::identity();
    {
        let metric =
            DescriptorMetric::new(&reference, &target, &params, ctx.descriptors()).unwrap();
        metric.evaluate(12, 12, &h);
    }
    assert_eq!(ctx.release_cached_descriptors(), 2);
    assert!(ctx.descriptors().is_empty());
    assert!(ctx.descriptors().get(reference.id()).is_none());

    let metric = DescriptorMetric::new(&reference, &target, &params, ctx.descriptors()).unwrap();
    metric.evaluate(12, 12, &h);
    assert_eq!(counter.calls(), 4);
}

#[test]
fn l1_and_l2_distances_agree_on_ordering_for_self_match() {
    let ctx = MetricContext::new();
    let reference = image(10);
    let target = image(11);
    let h = Homography::identity();
    for distance in [DescriptorDistance::L1, DescriptorDistance::L2] {
        let params = Parameters {
            metric: MetricKind::Descriptor,
            descriptor_distance: distance,
            ..Parameters::default()
        };
        let same = DescriptorMetric::new(&reference, &reference, &params, ctx.descriptors())
            .unwrap()
            .evaluate(16, 16, &h);
        let other = DescriptorMetric::new(&reference, &target, &params, ctx.descriptors())
            .unwrap()
            .evaluate(16, 16, &h);
        assert_eq!(same, 0.0);
        assert!(other > same);
    }
}
