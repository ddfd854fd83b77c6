use netdecode::{
    decode_segmentation, ColorTable, NetDecodeError, OutputMode, PixelBuffer, TensorView,
};

const RED: u32 = 0xFFFF_0000;
const GREEN: u32 = 0xFF00_FF00;
const BLUE: u32 = 0xFF00_00FF;

fn palette() -> ColorTable {
    ColorTable::new(vec![RED, GREEN, BLUE])
}

fn one_hot(height: usize, width: usize, channels: usize, class_of: impl Fn(usize, usize) -> usize) -> Vec<f32> {
    let mut data = vec![0.0f32; height * width * channels];
    for y in 0..height {
        for x in 0..width {
            data[(y * width + x) * channels + class_of(y, x)] = 1.0;
        }
    }
    data
}

#[test]
fn one_hot_pixels_take_their_class_color() {
    let (h, w) = (3, 4);
    let data = one_hot(h, w, 3, |y, x| (y + x) % 3);
    let view = TensorView::new(&data, h, w, 3).unwrap();
    let map = decode_segmentation(view, &palette()).unwrap();

    assert_eq!(map.width(), w);
    assert_eq!(map.height(), h);
    for y in 0..h {
        for x in 0..w {
            let class = (y + x) % 3;
            assert_eq!(map.class_at(y, x), Some(class));
            assert_eq!(map.color_at(y, x), palette().get(class));
        }
    }
    assert_eq!(map.class_at(h, 0), None);
    assert_eq!(map.color_at(0, w), None);
}

#[test]
fn non_positive_pixels_fall_back_to_class_zero() {
    let data = [-1.0f32, -0.5, -2.0, 0.0, 0.0, 0.0];
    let view = TensorView::new(&data, 1, 2, 3).unwrap();
    let map = decode_segmentation(view, &palette()).unwrap();
    assert_eq!(map.class_ids(), &[0, 0]);
    assert_eq!(map.colors(), &[RED, RED]);
}

#[test]
fn first_channel_wins_ties() {
    let data = [0.2f32, 0.7, 0.7];
    let view = TensorView::new(&data, 1, 1, 3).unwrap();
    let map = decode_segmentation(view, &palette()).unwrap();
    assert_eq!(map.class_ids(), &[1]);
}

#[test]
fn quantized_heads_compare_raw_values() {
    let unsigned = [10u8, 200, 30, 0, 0, 5];
    let view = TensorView::new(&unsigned, 1, 2, 3).unwrap();
    let map = decode_segmentation(view, &palette()).unwrap();
    assert_eq!(map.class_ids(), &[1, 2]);

    // Signed bytes above 127 are negative and cannot win.
    let signed = [10i8, -56, 30, -1, -2, -3];
    let view = TensorView::new(&signed, 1, 2, 3).unwrap();
    let map = decode_segmentation(view, &palette()).unwrap();
    assert_eq!(map.class_ids(), &[2, 0]);
}

#[test]
fn pixel_layouts_carry_the_same_colors() {
    let data = one_hot(1, 2, 3, |_, x| x + 1);
    let view = TensorView::new(&data, 1, 2, 3).unwrap();
    let map = decode_segmentation(view, &palette()).unwrap();

    assert_eq!(
        map.clone().into_pixels(OutputMode::ArgbPixels),
        PixelBuffer::Argb(vec![GREEN, BLUE])
    );
    assert_eq!(
        map.into_pixels(OutputMode::RgbaBytes),
        PixelBuffer::Rgba(vec![0, 255, 0, 255, 0, 0, 255, 255])
    );
}

#[test]
fn color_table_must_cover_every_channel() {
    let data = vec![0.0f32; 4 * 21];
    let view = TensorView::new(&data, 2, 2, 21).unwrap();
    let err = decode_segmentation(view, &palette()).unwrap_err();
    assert_eq!(err, NetDecodeError::ColorTableTooShort { needed: 21, got: 3 });

    assert!(decode_segmentation(view, &ColorTable::pascal_voc()).is_ok());
}

#[test]
fn batched_heads_are_rejected() {
    let data = vec![0.0f32; 2 * 2 * 2 * 3];
    let err = TensorView::from_nhwc(&data, [2, 2, 2, 3]).unwrap_err();
    assert_eq!(err, NetDecodeError::BatchUnsupported { batch: 2 });
}
