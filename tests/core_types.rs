use netdecode::pose::Edge;
use netdecode::{BodyPart, LabelTable, NetDecodeError, Skeleton, TensorView};

#[test]
fn tensor_view_rejects_bad_shapes() {
    let data = [0.0f32; 6];
    assert_eq!(
        TensorView::new(&data, 0, 2, 3).unwrap_err(),
        NetDecodeError::InvalidDimensions {
            height: 0,
            width: 2,
            channels: 3,
        }
    );
    assert_eq!(
        TensorView::new(&data, 2, 2, 3).unwrap_err(),
        NetDecodeError::BufferTooSmall { needed: 12, got: 6 }
    );
    assert!(matches!(
        TensorView::new(&data, usize::MAX, 2, 3),
        Err(NetDecodeError::InvalidDimensions { .. })
    ));
}

#[test]
fn tensor_view_addresses_nhwc() {
    let data: Vec<u8> = (0..24).collect();
    let view = TensorView::from_nhwc(&data, [1, 2, 3, 4]).unwrap();
    assert_eq!(view.height(), 2);
    assert_eq!(view.width(), 3);
    assert_eq!(view.channels(), 4);
    assert_eq!(view.index(1, 2, 3), 23);
    assert_eq!(view.get(1, 0, 2), Some(14));
    assert_eq!(view.get(2, 0, 0), None);
    assert_eq!(view.get(0, 0, 4), None);
    assert_eq!(view.cell(0, 1), Some(&[4u8, 5, 6, 7][..]));
    assert_eq!(view.cell(0, 3), None);
}

#[test]
fn label_table_parses_lines() {
    let table = LabelTable::from_lines("background\r\nperson\n\nbicycle\n");
    assert_eq!(table.len(), 4);
    assert_eq!(table.get(0), Some("background"));
    assert_eq!(table.get(1), Some("person"));
    assert_eq!(table.get(2), Some(""));
    assert_eq!(table.get(3), Some("bicycle"));
    assert_eq!(table.get(4), None);
    assert_eq!(table.iter().count(), 4);
}

#[test]
fn posenet_skeleton_is_a_tree_rooted_at_the_nose() {
    let skeleton = Skeleton::posenet();
    assert_eq!(skeleton.num_edges(), 16);
    assert_eq!(skeleton.edges()[0].parent, BodyPart::Nose);
    assert_eq!(Skeleton::new(skeleton.edges().to_vec()).unwrap(), skeleton);
    assert_eq!(Skeleton::default(), skeleton);
}

#[test]
fn skeleton_rejects_non_trees() {
    assert!(matches!(
        Skeleton::new(Vec::new()),
        Err(NetDecodeError::InvalidSkeleton { .. })
    ));

    let self_loop = vec![Edge::new(BodyPart::Nose, BodyPart::Nose)];
    assert!(matches!(
        Skeleton::new(self_loop),
        Err(NetDecodeError::InvalidSkeleton { .. })
    ));

    let two_parents = vec![
        Edge::new(BodyPart::Nose, BodyPart::LeftEye),
        Edge::new(BodyPart::RightEye, BodyPart::LeftEye),
    ];
    assert!(Skeleton::new(two_parents).is_err());

    let cycle = vec![
        Edge::new(BodyPart::Nose, BodyPart::LeftEye),
        Edge::new(BodyPart::LeftEye, BodyPart::Nose),
    ];
    assert!(Skeleton::new(cycle).is_err());

    let forest = vec![
        Edge::new(BodyPart::Nose, BodyPart::LeftEye),
        Edge::new(BodyPart::LeftHip, BodyPart::LeftKnee),
    ];
    assert!(Skeleton::new(forest).is_err());
}
