use async_trait::async_trait;
use image::DynamicImage;
use rten::{Model, NodeId, Value};
use rten_tensor::NdTensor;
use rten_tensor::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use super::{Detection, DetectorFactory, ObjectDetector, coco};
use crate::config::DetectorSettings;
use crate::error::DetectionError;
use crate::models::BoundingBox;

const BOXES_OUTPUT: &str = "detection_boxes:0";
const CLASSES_OUTPUT: &str = "detection_classes:0";
const SCORES_OUTPUT: &str = "detection_scores:0";
const COUNT_OUTPUT: &str = "num_detections:0";

/// Loads an SSD-style COCO detector from an `.rten` file.
///
/// The model must take a `[1, H, W, 3]` u8 image and emit the standard
/// `detection_boxes`, `detection_classes`, `detection_scores` and
/// `num_detections` outputs, with boxes as normalised
/// `[ymin, xmin, ymax, xmax]`.
pub struct RtenDetectorFactory {
    model_path: PathBuf,
    min_score: f32,
    max_detections: usize,
}

impl RtenDetectorFactory {
    pub fn new(settings: &DetectorSettings) -> Self {
        Self {
            model_path: settings.model.clone(),
            min_score: settings.min_score,
            max_detections: settings.max_detections,
        }
    }
}

#[async_trait]
impl DetectorFactory for RtenDetectorFactory {
    async fn load(&self) -> Result<Box<dyn ObjectDetector>, DetectionError> {
        if !self.model_path.exists() {
            return Err(DetectionError::ModelMissing(
                self.model_path.display().to_string(),
            ));
        }

        let path = self.model_path.clone();
        debug!("Loading detection model from {}", path.display());
        let model = tokio::task::spawn_blocking(move || Model::load_file(&path))
            .await
            .map_err(|e| DetectionError::Worker(e.to_string()))?
            .map_err(|e| DetectionError::Load(e.to_string()))?;

        Ok(Box::new(RtenDetector::new(
            model,
            self.min_score,
            self.max_detections,
        )?))
    }
}

#[derive(Clone, Copy)]
struct OutputIds {
    boxes: NodeId,
    classes: NodeId,
    scores: NodeId,
    count: NodeId,
}

pub struct RtenDetector {
    model: Arc<Model>,
    input: NodeId,
    outputs: OutputIds,
    min_score: f32,
    max_detections: usize,
}

impl RtenDetector {
    pub fn new(model: Model, min_score: f32, max_detections: usize) -> Result<Self, DetectionError> {
        let find = |name: &str| {
            model
                .find_node(name)
                .ok_or_else(|| DetectionError::MissingOutput(name.to_string()))
        };
        let outputs = OutputIds {
            boxes: find(BOXES_OUTPUT)?,
            classes: find(CLASSES_OUTPUT)?,
            scores: find(SCORES_OUTPUT)?,
            count: find(COUNT_OUTPUT)?,
        };
        let input = *model
            .input_ids()
            .first()
            .ok_or_else(|| DetectionError::Load("model has no inputs".to_string()))?;

        Ok(Self {
            model: Arc::new(model),
            input,
            outputs,
            min_score,
            max_detections,
        })
    }
}

fn to_tensor<const N: usize>(value: Value) -> Result<NdTensor<f32, N>, DetectionError>
where
    NdTensor<f32, N>: TryFrom<Value>,
    <NdTensor<f32, N> as TryFrom<Value>>::Error: std::fmt::Display,
{
    NdTensor::<f32, N>::try_from(value).map_err(|e| DetectionError::Inference(e.to_string()))
}

fn run_model(
    model: &Model,
    input_id: NodeId,
    outputs: &OutputIds,
    image: &DynamicImage,
) -> Result<(Vec<f32>, Vec<f32>, Vec<f32>, usize), DetectionError> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let input = NdTensor::from_data([1, height as usize, width as usize, 3], rgb.into_raw());

    let mut results = model
        .run(
            vec![(input_id, input.view().into())],
            &[outputs.boxes, outputs.classes, outputs.scores, outputs.count],
            None,
        )
        .map_err(|e| DetectionError::Inference(e.to_string()))?
        .into_iter();

    let mut next = || {
        results
            .next()
            .ok_or_else(|| DetectionError::Inference("model returned too few outputs".to_string()))
    };
    let boxes: NdTensor<f32, 3> = to_tensor(next()?)?;
    let classes: NdTensor<f32, 2> = to_tensor(next()?)?;
    let scores: NdTensor<f32, 2> = to_tensor(next()?)?;
    let count: NdTensor<f32, 1> = to_tensor(next()?)?;

    let count = count.to_vec().first().copied().unwrap_or(0.0).max(0.0) as usize;
    Ok((boxes.to_vec(), classes.to_vec(), scores.to_vec(), count))
}

/// Turn flat model outputs into labelled detections in source pixels.
pub fn decode_detections(
    boxes: &[f32],
    classes: &[f32],
    scores: &[f32],
    count: usize,
    image_size: (u32, u32),
    min_score: f32,
    max_detections: usize,
) -> Vec<Detection> {
    let (width, height) = (image_size.0 as f32, image_size.1 as f32);
    let count = count.min(scores.len()).min(classes.len()).min(boxes.len() / 4);

    (0..count)
        .filter(|&i| scores[i] >= min_score)
        .filter_map(|i| {
            let label = coco::label_for_class(classes[i].max(0.0) as usize)?;
            let [ymin, xmin, ymax, xmax] = [
                boxes[i * 4],
                boxes[i * 4 + 1],
                boxes[i * 4 + 2],
                boxes[i * 4 + 3],
            ]
            .map(|v| v.clamp(0.0, 1.0));
            Some(Detection {
                label: label.to_string(),
                confidence: scores[i].clamp(0.0, 1.0),
                bbox: BoundingBox::from_corners(xmin * width, ymin * height, xmax * width, ymax * height),
            })
        })
        .take(max_detections)
        .collect()
}

#[async_trait]
impl ObjectDetector for RtenDetector {
    async fn detect(&self, image: Arc<DynamicImage>) -> Result<Vec<Detection>, DetectionError> {
        let model = self.model.clone();
        let input = self.input;
        let outputs = self.outputs;
        let (min_score, max_detections) = (self.min_score, self.max_detections);

        let detections = tokio::task::spawn_blocking(move || {
            let (boxes, classes, scores, count) = run_model(&model, input, &outputs, &image)?;
            Ok::<_, DetectionError>(decode_detections(
                &boxes,
                &classes,
                &scores,
                count,
                (image.width(), image.height()),
                min_score,
                max_detections,
            ))
        })
        .await
        .map_err(|e| DetectionError::Worker(e.to_string()))??;

        info!("Detected {} objects", detections.len());
        Ok(detections)
    }
}
