use clap::Parser;
use netdecode::io::save_argb_png;
use netdecode::{
    decode_boxes, decode_grid, decode_image_f32, decode_image_u8, decode_segmentation,
    detection_count, top_k, top_k_quantized, BoxConfig, BoxTensors, ClassifyConfig, ColorTable,
    Denormalize, Detection, GridConfig, LabelTable, Pose, PoseConfig, PoseDecoder, PoseTensors,
    Quantization, SegmentationMap, Skeleton, TensorView, TopKEntry,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "NetDecode CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum DType {
    #[default]
    F32,
    U8,
    /// Signed bytes; only segmentation heads accept them.
    I8,
}

/// Raw little-endian tensor dump plus its shape.
#[derive(Debug, Deserialize)]
struct TensorFile {
    path: PathBuf,
    #[serde(default)]
    dtype: DType,
    /// `[h, w, c]` or `[1, h, w, c]`; ignored for flat tensors.
    #[serde(default)]
    shape: Vec<usize>,
}

enum TensorData {
    F32(Vec<f32>),
    U8(Vec<u8>),
    I8(Vec<i8>),
}

impl TensorFile {
    fn load(&self) -> CliResult<TensorData> {
        let bytes = fs::read(&self.path)?;
        match self.dtype {
            DType::U8 => Ok(TensorData::U8(bytes)),
            DType::I8 => Ok(TensorData::I8(bytes.into_iter().map(|b| b as i8).collect())),
            DType::F32 => {
                if bytes.len() % 4 != 0 {
                    return Err(format!(
                        "{}: {} bytes is not a whole number of f32 values",
                        self.path.display(),
                        bytes.len()
                    )
                    .into());
                }
                let values = bytes
                    .chunks_exact(4)
                    .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                    .collect();
                Ok(TensorData::F32(values))
            }
        }
    }

    fn load_f32(&self) -> CliResult<Vec<f32>> {
        match self.load()? {
            TensorData::F32(values) => Ok(values),
            TensorData::U8(_) | TensorData::I8(_) => {
                Err(format!("{}: expected dtype f32", self.path.display()).into())
            }
        }
    }

    fn nhwc(&self) -> CliResult<[usize; 4]> {
        match *self.shape.as_slice() {
            [h, w, c] => Ok([1, h, w, c]),
            [b, h, w, c] => Ok([b, h, w, c]),
            _ => Err(format!("{}: shape must have 3 or 4 dimensions", self.path.display()).into()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct QuantizationJson {
    scale: f32,
    zero_point: i32,
}

impl Default for QuantizationJson {
    fn default() -> Self {
        let q = Quantization::UNIT_RANGE;
        Self {
            scale: q.scale,
            zero_point: q.zero_point,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClassifyTask {
    labels_path: PathBuf,
    scores: TensorFile,
    #[serde(default)]
    quantization: QuantizationJson,
    #[serde(default = "default_classify_threshold")]
    threshold: f32,
    #[serde(default = "default_classify_results")]
    num_results: usize,
}

fn default_classify_threshold() -> f32 {
    ClassifyConfig::default().threshold
}

fn default_classify_results() -> usize {
    ClassifyConfig::default().num_results
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct BoxConfigJson {
    threshold: f32,
    max_per_class: usize,
    class_offset: usize,
}

impl Default for BoxConfigJson {
    fn default() -> Self {
        let cfg = BoxConfig::default();
        Self {
            threshold: cfg.threshold,
            max_per_class: cfg.max_per_class,
            class_offset: cfg.class_offset,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BoxesTask {
    labels_path: PathBuf,
    locations: TensorFile,
    classes: TensorFile,
    scores: TensorFile,
    /// Detection count as reported by the model; defaults to the score length.
    #[serde(default)]
    num_detections: Option<f32>,
    #[serde(default)]
    decode: BoxConfigJson,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct GridConfigJson {
    block_size: usize,
    num_boxes_per_block: usize,
    anchors: Vec<f32>,
    threshold: f32,
    max_per_class: usize,
}

impl Default for GridConfigJson {
    fn default() -> Self {
        let cfg = GridConfig::default();
        Self {
            block_size: cfg.block_size,
            num_boxes_per_block: cfg.num_boxes_per_block,
            anchors: cfg.anchors,
            threshold: cfg.threshold,
            max_per_class: cfg.max_per_class,
        }
    }
}

impl From<GridConfigJson> for GridConfig {
    fn from(value: GridConfigJson) -> Self {
        Self {
            block_size: value.block_size,
            num_boxes_per_block: value.num_boxes_per_block,
            anchors: value.anchors,
            threshold: value.threshold,
            max_per_class: value.max_per_class,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GridTask {
    labels_path: PathBuf,
    output: TensorFile,
    #[serde(default)]
    decode: GridConfigJson,
}

#[derive(Debug, Deserialize)]
struct SegmentTask {
    output: TensorFile,
    /// Packed `0xAARRGGBB` colors per class; Pascal VOC when omitted.
    #[serde(default)]
    colors: Option<Vec<u32>>,
    #[serde(default)]
    png_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PoseConfigJson {
    local_maximum_radius: usize,
    output_stride: usize,
    nms_radius: f32,
    threshold: f32,
    num_results: usize,
    input_size: usize,
}

impl Default for PoseConfigJson {
    fn default() -> Self {
        let cfg = PoseConfig::default();
        Self {
            local_maximum_radius: cfg.local_maximum_radius,
            output_stride: cfg.output_stride,
            nms_radius: cfg.nms_radius,
            threshold: cfg.threshold,
            num_results: cfg.num_results,
            input_size: cfg.input_size,
        }
    }
}

impl From<PoseConfigJson> for PoseConfig {
    fn from(value: PoseConfigJson) -> Self {
        Self {
            local_maximum_radius: value.local_maximum_radius,
            output_stride: value.output_stride,
            nms_radius: value.nms_radius,
            threshold: value.threshold,
            num_results: value.num_results,
            input_size: value.input_size,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PoseTask {
    scores: TensorFile,
    offsets: TensorFile,
    displacements_fwd: TensorFile,
    displacements_bwd: TensorFile,
    #[serde(default)]
    decode: PoseConfigJson,
}

#[derive(Debug, Deserialize)]
struct ImageTask {
    output: TensorFile,
    #[serde(default = "default_mean")]
    mean: f32,
    #[serde(default = "default_std")]
    std: f32,
    #[serde(default)]
    png_path: Option<PathBuf>,
}

fn default_mean() -> f32 {
    Denormalize::default().mean
}

fn default_std() -> f32 {
    Denormalize::default().std
}

#[derive(Debug, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
enum Task {
    Classify(ClassifyTask),
    Boxes(BoxesTask),
    Grid(GridTask),
    Segment(SegmentTask),
    Pose(PoseTask),
    Image(ImageTask),
}

#[derive(Debug, Deserialize)]
struct Config {
    #[serde(flatten)]
    task: Task,
    #[serde(default)]
    output_path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct TopKRecord {
    index: usize,
    label: String,
    confidence: f32,
}

impl From<TopKEntry> for TopKRecord {
    fn from(value: TopKEntry) -> Self {
        Self {
            index: value.index,
            label: value.label,
            confidence: value.confidence,
        }
    }
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    label: String,
    class_index: usize,
    confidence: f32,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

impl From<Detection> for DetectionRecord {
    fn from(value: Detection) -> Self {
        Self {
            label: value.label,
            class_index: value.class_index,
            confidence: value.confidence,
            x: value.rect.x,
            y: value.rect.y,
            w: value.rect.w,
            h: value.rect.h,
        }
    }
}

#[derive(Debug, Serialize)]
struct KeypointRecord {
    part: &'static str,
    x: f32,
    y: f32,
    score: f32,
}

#[derive(Debug, Serialize)]
struct PoseRecord {
    score: f32,
    keypoints: Vec<KeypointRecord>,
}

impl From<&Pose> for PoseRecord {
    fn from(value: &Pose) -> Self {
        Self {
            score: value.score(),
            keypoints: value
                .keypoints()
                .map(|kp| KeypointRecord {
                    part: kp.part.name(),
                    x: kp.x,
                    y: kp.y,
                    score: kp.score,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ClassArea {
    class: usize,
    pixels: usize,
}

#[derive(Debug, Serialize)]
#[serde(tag = "task", rename_all = "snake_case")]
enum Output {
    Classify {
        results: Vec<TopKRecord>,
    },
    Boxes {
        detections: Vec<DetectionRecord>,
    },
    Grid {
        detections: Vec<DetectionRecord>,
    },
    Segment {
        width: usize,
        height: usize,
        classes: Vec<ClassArea>,
        png_path: Option<PathBuf>,
    },
    Pose {
        poses: Vec<PoseRecord>,
    },
    Image {
        width: usize,
        height: usize,
        png_path: Option<PathBuf>,
    },
}

fn load_labels(path: &Path) -> CliResult<LabelTable> {
    let text = fs::read_to_string(path)?;
    Ok(LabelTable::from_lines(&text))
}

fn class_areas(map: &SegmentationMap) -> Vec<ClassArea> {
    let num_classes = map.class_ids().iter().copied().max().map_or(0, |m| m + 1);
    let mut pixels = vec![0usize; num_classes];
    for &class in map.class_ids() {
        pixels[class] += 1;
    }
    pixels
        .into_iter()
        .enumerate()
        .filter(|&(_, count)| count > 0)
        .map(|(class, pixels)| ClassArea { class, pixels })
        .collect()
}

fn signed_bytes_unsupported(file: &TensorFile) -> Box<dyn std::error::Error> {
    format!(
        "{}: dtype i8 is only accepted for segmentation heads",
        file.path.display()
    )
    .into()
}

/// Raw argmax over whichever element type the head was dumped as.
fn segmentation_map(
    data: TensorData,
    shape: [usize; 4],
    colors: &ColorTable,
) -> CliResult<SegmentationMap> {
    let map = match data {
        TensorData::F32(values) => {
            decode_segmentation(TensorView::from_nhwc(&values, shape)?, colors)?
        }
        TensorData::U8(raw) => decode_segmentation(TensorView::from_nhwc(&raw, shape)?, colors)?,
        TensorData::I8(raw) => decode_segmentation(TensorView::from_nhwc(&raw, shape)?, colors)?,
    };
    Ok(map)
}

fn run_classify(task: ClassifyTask) -> CliResult<Output> {
    let labels = load_labels(&task.labels_path)?;
    let cfg = ClassifyConfig {
        threshold: task.threshold,
        num_results: task.num_results,
    };
    let entries = match task.scores.load()? {
        TensorData::F32(values) => top_k(&values, &labels, cfg)?,
        TensorData::U8(raw) => {
            let q = Quantization::new(task.quantization.scale, task.quantization.zero_point);
            top_k_quantized(&raw, q, &labels, cfg)?
        }
        TensorData::I8(_) => return Err(signed_bytes_unsupported(&task.scores)),
    };
    Ok(Output::Classify {
        results: entries.into_iter().map(TopKRecord::from).collect(),
    })
}

fn run_boxes(task: BoxesTask) -> CliResult<Output> {
    let labels = load_labels(&task.labels_path)?;
    let locations = task.locations.load_f32()?;
    let classes = task.classes.load_f32()?;
    let scores = task.scores.load_f32()?;
    let count = match task.num_detections {
        Some(value) => detection_count(value)?,
        None => scores.len(),
    };
    let tensors = BoxTensors::new(&locations, &classes, &scores, count)?;
    let detections = decode_boxes(
        &tensors,
        &labels,
        BoxConfig {
            threshold: task.decode.threshold,
            max_per_class: task.decode.max_per_class,
            class_offset: task.decode.class_offset,
        },
    )?;
    Ok(Output::Boxes {
        detections: detections.into_iter().map(DetectionRecord::from).collect(),
    })
}

fn run_grid(task: GridTask) -> CliResult<Output> {
    let labels = load_labels(&task.labels_path)?;
    let data = task.output.load_f32()?;
    let view = TensorView::from_nhwc(&data, task.output.nhwc()?)?;
    let detections = decode_grid(view, &labels, &task.decode.into())?;
    Ok(Output::Grid {
        detections: detections.into_iter().map(DetectionRecord::from).collect(),
    })
}

fn run_segment(task: SegmentTask) -> CliResult<Output> {
    let colors = task
        .colors
        .map(ColorTable::new)
        .unwrap_or_else(ColorTable::pascal_voc);
    let shape = task.output.nhwc()?;
    let map = segmentation_map(task.output.load()?, shape, &colors)?;
    if let Some(path) = &task.png_path {
        save_argb_png(path, map.width(), map.height(), map.colors())?;
    }
    Ok(Output::Segment {
        width: map.width(),
        height: map.height(),
        classes: class_areas(&map),
        png_path: task.png_path,
    })
}

fn run_pose(task: PoseTask) -> CliResult<Output> {
    let scores = task.scores.load_f32()?;
    let offsets = task.offsets.load_f32()?;
    let fwd = task.displacements_fwd.load_f32()?;
    let bwd = task.displacements_bwd.load_f32()?;
    let tensors = PoseTensors::new(
        TensorView::from_nhwc(&scores, task.scores.nhwc()?)?,
        TensorView::from_nhwc(&offsets, task.offsets.nhwc()?)?,
        TensorView::from_nhwc(&fwd, task.displacements_fwd.nhwc()?)?,
        TensorView::from_nhwc(&bwd, task.displacements_bwd.nhwc()?)?,
    )?;
    let skeleton = Skeleton::posenet();
    let decoder = PoseDecoder::new(&skeleton, task.decode.into())?;
    let poses = decoder.decode(&tensors)?;
    Ok(Output::Pose {
        poses: poses.iter().map(PoseRecord::from).collect(),
    })
}

fn run_image(task: ImageTask) -> CliResult<Output> {
    let shape = task.output.nhwc()?;
    let decoded = match task.output.load()? {
        TensorData::F32(values) => decode_image_f32(
            TensorView::from_nhwc(&values, shape)?,
            Denormalize {
                mean: task.mean,
                std: task.std,
            },
        )?,
        TensorData::U8(raw) => decode_image_u8(TensorView::from_nhwc(&raw, shape)?)?,
        TensorData::I8(_) => return Err(signed_bytes_unsupported(&task.output)),
    };
    if let Some(path) = &task.png_path {
        save_argb_png(path, decoded.width, decoded.height, &decoded.pixels)?;
    }
    Ok(Output::Image {
        width: decoded.width,
        height: decoded.height,
        png_path: task.png_path,
    })
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("netdecode=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;

    let output = match config.task {
        Task::Classify(task) => run_classify(task)?,
        Task::Boxes(task) => run_boxes(task)?,
        Task::Grid(task) => run_grid(task)?,
        Task::Segment(task) => run_segment(task)?,
        Task::Pose(task) => run_pose(task)?,
        Task::Image(task) => run_image(task)?,
    };
    tracing::info!(config = %cli.config.display(), "decode finished");
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
