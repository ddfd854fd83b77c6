use netdecode::lowlevel::softmax;
use netdecode::{decode_grid, GridConfig, LabelTable, NetDecodeError, Rect, TensorView};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn pets() -> LabelTable {
    ["cat", "dog"].into_iter().collect()
}

fn single_anchor(max_per_class: usize) -> GridConfig {
    GridConfig {
        block_size: 32,
        num_boxes_per_block: 1,
        anchors: vec![1.0, 1.0],
        threshold: 0.1,
        max_per_class,
    }
}

#[test]
fn single_cell_decodes_to_full_frame_box() {
    // tx, ty, tw, th, to, logit(cat), logit(dog)
    let head = [0.0f32, 0.0, 0.0, 0.0, 10.0, 0.0, 5.0];
    let view = TensorView::new(&head, 1, 1, 7).unwrap();
    let out = decode_grid(view, &pets(), &single_anchor(5)).unwrap();

    assert_eq!(out.len(), 1);
    let det = &out[0];
    assert_eq!(det.label, "dog");
    assert_eq!(det.class_index, 1);
    let expected = (1.0 / (1.0 + (-10.0f32).exp())) * (1.0 / (1.0 + (-5.0f32).exp()));
    assert!((det.confidence - expected).abs() < 1e-5);
    assert_eq!(det.rect, Rect { x: 0.0, y: 0.0, w: 1.0, h: 1.0 });
}

#[test]
fn cap_keeps_highest_confidence_per_class() {
    #[rustfmt::skip]
    let head = [
        0.0f32, 0.0, -1.0, -1.0, 0.0, 0.0, 5.0,
        0.0, 0.0, -1.0, -1.0, 3.0, 0.0, 5.0,
    ];
    let view = TensorView::new(&head, 1, 2, 7).unwrap();

    let capped = decode_grid(view, &pets(), &single_anchor(1)).unwrap();
    assert_eq!(capped.len(), 1);
    // The second cell has the larger objectness and sits on the right half.
    assert!(capped[0].rect.x > 0.25);

    let all = decode_grid(view, &pets(), &single_anchor(5)).unwrap();
    assert_eq!(all.len(), 2);
    assert!(all[0].confidence > all[1].confidence);
}

#[test]
fn non_finite_geometry_is_skipped() {
    let labels = pets();
    let cfg = single_anchor(5);
    for head in [
        [f32::NAN, f32::NAN, 0.0, 0.0, 10.0, 0.0, 5.0],
        [0.0, 0.0, f32::NAN, 0.0, 10.0, 0.0, 5.0],
        [0.0, 0.0, 0.0, 200.0, 10.0, 0.0, 5.0],
    ] {
        let view = TensorView::new(&head, 1, 1, 7).unwrap();
        let out = decode_grid(view, &labels, &cfg).unwrap();
        assert!(out.is_empty(), "{head:?} decoded to {out:?}");
    }

    // A finite slot next to a broken one still decodes.
    #[rustfmt::skip]
    let head = [
        f32::NAN, 0.0, 0.0, 0.0, 10.0, 0.0, 5.0,
        0.0, 0.0, 0.0, 0.0, 10.0, 0.0, 5.0,
    ];
    let view = TensorView::new(&head, 1, 2, 7).unwrap();
    let out = decode_grid(view, &labels, &cfg).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].rect, Rect { x: 0.5, y: 0.0, w: 0.5, h: 1.0 });
}

#[test]
fn cap_of_zero_admits_nothing() {
    let head = [0.0f32, 0.0, 0.0, 0.0, 10.0, 0.0, 5.0];
    let view = TensorView::new(&head, 1, 1, 7).unwrap();
    let out = decode_grid(view, &pets(), &single_anchor(0)).unwrap();
    assert!(out.is_empty());
}

#[test]
fn random_heads_stay_in_bounds_and_ranked() {
    let mut rng = StdRng::seed_from_u64(7);
    let labels: LabelTable = ["a", "b", "c"].into_iter().collect();
    let (grid_h, grid_w, boxes) = (4, 5, 2);
    let channels = boxes * (5 + labels.len());
    let head: Vec<f32> = (0..grid_h * grid_w * channels)
        .map(|_| rng.random_range(-4.0f32..4.0))
        .collect();
    let view = TensorView::new(&head, grid_h, grid_w, channels).unwrap();
    let cfg = GridConfig {
        block_size: 16,
        num_boxes_per_block: boxes,
        anchors: vec![0.5, 0.5, 3.0, 2.0],
        threshold: 0.0,
        max_per_class: usize::MAX,
    };

    let out = decode_grid(view, &labels, &cfg).unwrap();
    assert_eq!(out.len(), grid_h * grid_w * boxes);
    for det in &out {
        assert!(det.rect.x >= 0.0 && det.rect.y >= 0.0);
        assert!(det.rect.right() <= 1.0 + 1e-6);
        assert!(det.rect.bottom() <= 1.0 + 1e-6);
        assert!(det.confidence > 0.0 && det.confidence <= 1.0);
    }
    assert!(out.windows(2).all(|w| w[0].confidence >= w[1].confidence));

    let capped = decode_grid(
        view,
        &labels,
        &GridConfig {
            max_per_class: 2,
            ..cfg
        },
    )
    .unwrap();
    assert!(capped.len() <= 2 * labels.len());
    for class in 0..labels.len() {
        let count = capped.iter().filter(|d| d.class_index == class).count();
        assert!(count <= 2);
        let best = out.iter().find(|d| d.class_index == class);
        let kept = capped.iter().find(|d| d.class_index == class);
        assert_eq!(best.map(|d| d.confidence), kept.map(|d| d.confidence));
    }
}

#[test]
fn softmax_sums_to_one() {
    let mut rng = StdRng::seed_from_u64(11);
    for len in 1..12 {
        let mut logits: Vec<f32> = (0..len).map(|_| rng.random_range(-30.0f32..30.0)).collect();
        softmax(&mut logits);
        let sum: f32 = logits.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "sum {sum} for len {len}");
        assert!(logits.iter().all(|p| (0.0..=1.0).contains(p)));
    }
}

#[test]
fn short_anchor_list_is_rejected() {
    let head = vec![0.0f32; 14];
    let view = TensorView::new(&head, 1, 1, 14).unwrap();
    let cfg = GridConfig {
        num_boxes_per_block: 2,
        ..single_anchor(5)
    };
    let err = decode_grid(view, &pets(), &cfg).unwrap_err();
    assert_eq!(err, NetDecodeError::AnchorsTooShort { needed: 4, got: 2 });
}

#[test]
fn channel_count_must_match_slots() {
    let head = vec![0.0f32; 8];
    let view = TensorView::new(&head, 1, 1, 8).unwrap();
    let err = decode_grid(view, &pets(), &single_anchor(5)).unwrap_err();
    assert_eq!(
        err,
        NetDecodeError::ChannelMismatch {
            expected: 7,
            got: 8,
            context: "grid anchor slots",
        }
    );
}

#[test]
fn empty_labels_or_anchors_yield_nothing() {
    let head = vec![0.0f32; 7];
    let view = TensorView::new(&head, 1, 1, 7).unwrap();
    assert!(decode_grid(view, &LabelTable::default(), &single_anchor(5))
        .unwrap()
        .is_empty());
    let no_anchors = GridConfig {
        anchors: Vec::new(),
        ..single_anchor(5)
    };
    assert!(decode_grid(view, &pets(), &no_anchors).unwrap().is_empty());
}

#[test]
fn zero_block_size_is_rejected() {
    let head = vec![0.0f32; 7];
    let view = TensorView::new(&head, 1, 1, 7).unwrap();
    let cfg = GridConfig {
        block_size: 0,
        ..single_anchor(5)
    };
    assert!(matches!(
        decode_grid(view, &pets(), &cfg),
        Err(NetDecodeError::InvalidConfig { .. })
    ));
}
