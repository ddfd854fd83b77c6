use netdecode::{
    decode_boxes, BoxConfig, BoxTensors, LabelTable, NetDecodeError, Rect,
};

fn coco_like() -> LabelTable {
    ["???", "person", "car"].into_iter().collect()
}

fn assert_rect_close(actual: Rect, expected: Rect) {
    let pairs = [
        (actual.x, expected.x),
        (actual.y, expected.y),
        (actual.w, expected.w),
        (actual.h, expected.h),
    ];
    for (a, e) in pairs {
        assert!((a - e).abs() < 1e-6, "{actual:?} != {expected:?}");
    }
}

#[test]
fn decodes_clips_and_caps_per_class() {
    #[rustfmt::skip]
    let locations = [
        0.1f32, 0.2, 0.5, 0.6,
        -0.1, 0.5, 0.4, 1.3,
        0.0, 0.0, 1.0, 1.0,
        0.3, 0.3, 0.4, 0.4,
    ];
    let classes = [0.0f32, 1.0, 0.0, 0.0];
    let scores = [0.9f32, 0.8, 0.05, 0.7];
    let tensors = BoxTensors::new(&locations, &classes, &scores, 4).unwrap();

    let out = decode_boxes(
        &tensors,
        &coco_like(),
        BoxConfig {
            threshold: 0.1,
            max_per_class: 1,
            class_offset: 1,
        },
    )
    .unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].label, "person");
    assert_eq!(out[0].class_index, 1);
    assert_eq!(out[0].confidence, 0.9);
    assert_rect_close(out[0].rect, Rect { x: 0.2, y: 0.1, w: 0.4, h: 0.4 });

    assert_eq!(out[1].label, "car");
    assert_rect_close(out[1].rect, Rect { x: 0.5, y: 0.0, w: 0.5, h: 0.4 });

    for det in &out {
        assert!(det.rect.x >= 0.0 && det.rect.y >= 0.0);
        assert!(det.rect.right() <= 1.0 && det.rect.bottom() <= 1.0);
    }
}

#[test]
fn keeps_tensor_order_instead_of_score_order() {
    let locations = [0.0f32, 0.0, 0.5, 0.5, 0.5, 0.5, 1.0, 1.0];
    let classes = [0.0f32, 1.0];
    let scores = [0.5f32, 0.9];
    let tensors = BoxTensors::new(&locations, &classes, &scores, 2).unwrap();
    let out = decode_boxes(&tensors, &coco_like(), BoxConfig::default()).unwrap();
    let confidences: Vec<f32> = out.iter().map(|d| d.confidence).collect();
    assert_eq!(confidences, vec![0.5, 0.9]);
}

#[test]
fn first_encountered_wins_when_class_saturates() {
    let locations = [0.0f32, 0.0, 0.2, 0.2, 0.5, 0.5, 0.9, 0.9];
    let classes = [0.0f32, 0.0];
    let scores = [0.4f32, 0.95];
    let tensors = BoxTensors::new(&locations, &classes, &scores, 2).unwrap();
    let out = decode_boxes(
        &tensors,
        &coco_like(),
        BoxConfig {
            max_per_class: 1,
            ..BoxConfig::default()
        },
    )
    .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].confidence, 0.4);
}

#[test]
fn score_equal_to_threshold_is_kept() {
    let locations = [0.0f32, 0.0, 0.5, 0.5];
    let tensors = BoxTensors::new(&locations, &[0.0], &[0.25], 1).unwrap();
    let out = decode_boxes(
        &tensors,
        &coco_like(),
        BoxConfig {
            threshold: 0.25,
            ..BoxConfig::default()
        },
    )
    .unwrap();
    assert_eq!(out.len(), 1);
}

#[test]
fn only_first_count_entries_are_read() {
    let locations = [0.0f32, 0.0, 0.5, 0.5, 0.0, 0.0, 0.5, 0.5];
    let tensors = BoxTensors::new(&locations, &[0.0, 1.0], &[0.9, 0.9], 1).unwrap();
    let out = decode_boxes(&tensors, &coco_like(), BoxConfig::default()).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(tensors.count(), 1);
}

#[test]
fn class_outside_label_table_is_an_error() {
    let locations = [0.0f32, 0.0, 0.5, 0.5];
    let tensors = BoxTensors::new(&locations, &[5.0], &[0.9], 1).unwrap();
    let err = decode_boxes(&tensors, &coco_like(), BoxConfig::default()).unwrap_err();
    assert_eq!(err, NetDecodeError::LabelOutOfRange { index: 6, len: 3 });
}

#[test]
fn class_outside_table_below_threshold_is_ignored() {
    let locations = [0.0f32, 0.0, 0.5, 0.5];
    let tensors = BoxTensors::new(&locations, &[5.0], &[0.01], 1).unwrap();
    let out = decode_boxes(&tensors, &coco_like(), BoxConfig::default()).unwrap();
    assert!(out.is_empty());
}

#[test]
fn short_tensors_are_rejected() {
    let err = BoxTensors::new(&[0.0f32; 7], &[0.0, 0.0], &[0.9, 0.9], 2).unwrap_err();
    assert_eq!(err, NetDecodeError::BufferTooSmall { needed: 8, got: 7 });
    let err = BoxTensors::new(&[0.0f32; 8], &[0.0], &[0.9, 0.9], 2).unwrap_err();
    assert_eq!(err, NetDecodeError::BufferTooSmall { needed: 2, got: 1 });
}

#[test]
fn empty_label_table_yields_no_detections() {
    let locations = [0.0f32, 0.0, 0.5, 0.5];
    let tensors = BoxTensors::new(&locations, &[0.0], &[0.9], 1).unwrap();
    let out = decode_boxes(&tensors, &LabelTable::default(), BoxConfig::default()).unwrap();
    assert!(out.is_empty());
}
