use mvscost::{
    CostError, Image, ImageView, Metric, MetricContext, MetricKind, Parameters, Representation,
};

fn gray(width: usize, height: usize) -> Image {
    let data = (0..width * height).map(|i| (i * 13 % 251) as u8).collect();
    Image::from_gray(data, width, height).unwrap()
}

#[test]
fn image_view_rejects_bad_shapes() {
    let data = vec![0u8; 12];
    assert_eq!(
        ImageView::from_slice(&data, 0, 3).err(),
        Some(CostError::InvalidDimensions {
            width: 0,
            height: 3
        })
    );
    assert_eq!(
        ImageView::from_slice(&data, 4, 4).err(),
        Some(CostError::BufferTooSmall { needed: 16, got: 12 })
    );
    let view = ImageView::from_slice(&data, 4, 3).unwrap();
    assert_eq!(view.row(2).map(<[u8]>::len), Some(4));
    assert!(view.row(3).is_none());
    assert!(view.get(4, 0).is_none());
}

#[test]
fn image_construction_errors() {
    assert!(matches!(
        Image::from_gray(vec![0; 5], 2, 3),
        Err(CostError::BufferTooSmall { needed: 6, got: 5 })
    ));
    assert!(matches!(
        Image::from_rgb(vec![0; 6], 2, 3),
        Err(CostError::BufferTooSmall { needed: 18, got: 6 })
    ));
    assert!(matches!(
        gray(4, 4).with_mask(vec![1; 15]),
        Err(CostError::MaskMismatch {
            expected: 16,
            got: 15
        })
    ));
}

#[test]
fn image_ids_are_unique() {
    let a = gray(3, 3);
    let b = gray(3, 3);
    assert_ne!(a.id(), b.id());
}

#[test]
fn parameter_validation_reports_the_field() {
    let mut params = Parameters::default();
    params.half_window = 0;
    assert!(matches!(
        params.validate(),
        Err(CostError::InvalidParameter {
            name: "half_window",
            ..
        })
    ));

    let mut params = Parameters::default();
    params.step = params.half_window + 1;
    assert!(matches!(
        params.validate(),
        Err(CostError::InvalidParameter { name: "step", .. })
    ));

    let mut params = Parameters::default();
    params.sigma_color = f64::NAN;
    assert!(matches!(
        params.validate(),
        Err(CostError::InvalidParameter {
            name: "sigma_color",
            ..
        })
    ));

    let mut params = Parameters::default();
    params.alpha = 1.5;
    assert!(matches!(
        params.validate(),
        Err(CostError::InvalidParameter { name: "alpha", .. })
    ));
}

#[test]
fn metric_construction_checks_window_and_planes() {
    let ctx = MetricContext::new();
    let small = gray(5, 20);
    let large = gray(20, 20);
    let params = Parameters::for_metric(MetricKind::Ncc);
    assert_eq!(
        Metric::new(&small, &large, &params, &ctx).err(),
        Some(CostError::WindowTooLarge {
            window: 7,
            width: 5,
            height: 20
        })
    );

    let params = Parameters::for_metric(MetricKind::PatchMatch);
    let other = gray(20, 20);
    let err = Metric::new(&large, &other, &params, &ctx).err();
    assert_eq!(
        err,
        Some(CostError::MissingRepresentation {
            representation: Representation::Color
        })
    );
}

#[test]
fn error_messages_are_readable() {
    let msg = CostError::UnknownMetric("ssd".into()).to_string();
    assert!(msg.contains("ssd"));
    let msg = CostError::InvalidParameter {
        name: "gamma",
        reason: "must be finite and > 0",
    }
    .to_string();
    assert!(msg.contains("gamma"));
}
