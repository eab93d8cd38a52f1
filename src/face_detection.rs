//! SCRFD face detector.
//!
//! Finds face boxes so the mesh model can be fed a tight crop. Only boxes and
//! scores are decoded; the optional five-point keypoint heads are ignored.

use crate::{
    constants::{IMAGE_NORMALIZATION_OFFSET, IMAGE_NORMALIZATION_SCALE},
    error::Error,
    utils::usize_to_i32,
    Result,
};
use log::{debug, info, warn};
use ndarray::{Array4, CowArray};
use opencv::core::{Mat, Rect, Scalar, Size, Vec3b, CV_8UC3};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Default SCRFD input size
const DEFAULT_INPUT_SIZE: i32 = 640;

/// Detected face in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
}

impl FaceBox {
    #[must_use]
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    /// Intersection over union with another box
    #[must_use]
    pub fn iou(&self, other: &Self) -> f32 {
        let w = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let h = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let inter = w * h;
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Pixel coordinates fit in i32
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            self.x1 as i32,
            self.y1 as i32,
            (self.x2 - self.x1) as i32,
            (self.y2 - self.y1) as i32,
        )
    }
}

/// SCRFD output layout, derived from the number of model outputs
#[derive(Debug, Clone, PartialEq, Eq)]
struct HeadLayout {
    strides: Vec<i32>,
    anchors_per_cell: usize,
    /// Distance between the score output and the box output of one stride
    offset: usize,
}

impl HeadLayout {
    fn from_output_count(count: usize) -> Self {
        match count {
            10 | 15 => Self {
                strides: vec![8, 16, 32, 64, 128],
                anchors_per_cell: 1,
                offset: 5,
            },
            6 | 9 => Self {
                strides: vec![8, 16, 32],
                anchors_per_cell: 2,
                offset: 3,
            },
            _ => {
                warn!("Unknown detector layout with {} outputs, assuming 3 strides", count);
                Self {
                    strides: vec![8, 16, 32],
                    anchors_per_cell: 2,
                    offset: 3,
                }
            }
        }
    }
}

/// SCRFD Face Detector using ONNX Runtime
pub struct FaceDetector {
    session: Session,
    input_size: (i32, i32),
    conf_threshold: f32,
    nms_threshold: f32,
    layout: HeadLayout,
    center_cache: HashMap<(i32, i32, i32), Vec<(f32, f32)>>,
}

impl FaceDetector {
    /// Create a new face detector from an ONNX model file
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded or has no inputs.
    pub fn new<P: AsRef<Path>>(model_path: P, conf_threshold: f32, nms_threshold: f32) -> Result<Self> {
        info!("Initializing FaceDetector with model: {}", model_path.as_ref().display());
        let environment = Arc::new(
            Environment::builder()
                .with_name("face_detector")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        let input_meta = session
            .inputs
            .first()
            .ok_or_else(|| Error::ModelInputError("Detector has no inputs".to_string()))?;

        // [batch, channels, height, width]; dynamic axes fall back to the default size
        let dims = &input_meta.dimensions;
        let input_size = if dims.len() >= 4 {
            let height = dims[2].and_then(|d| i32::try_from(d).ok()).unwrap_or(DEFAULT_INPUT_SIZE);
            let width = dims[3].and_then(|d| i32::try_from(d).ok()).unwrap_or(DEFAULT_INPUT_SIZE);
            (width, height)
        } else {
            (DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE)
        };

        let layout = HeadLayout::from_output_count(session.outputs.len());
        debug!("Detector input {:?}, layout {:?}", input_size, layout);

        Ok(Self {
            session,
            input_size,
            conf_threshold,
            nms_threshold,
            layout,
            center_cache: HashMap::new(),
        })
    }

    /// Detect faces, highest score first
    ///
    /// # Errors
    ///
    /// Returns an error if preprocessing or inference fails.
    #[allow(clippy::cast_precision_loss)]
    #[allow(clippy::cast_possible_truncation)]
    pub fn detect(&mut self, image: &Mat) -> Result<Vec<FaceBox>> {
        let img_height = image.rows();
        let img_width = image.cols();
        if img_height <= 0 || img_width <= 0 {
            return Ok(Vec::new());
        }

        // Letterbox into the model input, keeping the aspect ratio
        let (input_width, input_height) = self.input_size;
        let ratio_img = img_height as f32 / img_width as f32;
        let ratio_model = input_height as f32 / input_width as f32;
        let (new_width, new_height) = if ratio_img > ratio_model {
            ((input_height as f32 / ratio_img) as i32, input_height)
        } else {
            (input_width, (input_width as f32 * ratio_img) as i32)
        };
        let det_scale = new_height as f32 / img_height as f32;

        let mut resized = Mat::default();
        imgproc::resize(
            image,
            &mut resized,
            Size::new(new_width, new_height),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;

        let mut padded = Mat::new_rows_cols_with_default(input_height, input_width, CV_8UC3, Scalar::all(0.0))?;
        {
            let mut roi = padded.roi_mut(Rect::new(0, 0, new_width, new_height))?;
            resized.copy_to(&mut roi)?;
        }

        let input = Self::preprocess(&padded)?;
        let candidates = self.forward(input)?;

        let scaled = candidates
            .into_iter()
            .map(|b| FaceBox {
                x1: b.x1 / det_scale,
                y1: b.y1 / det_scale,
                x2: b.x2 / det_scale,
                y2: b.y2 / det_scale,
                score: b.score,
            })
            .collect();

        Ok(non_max_suppression(scaled, self.nms_threshold))
    }

    /// Highest scoring face, if any
    ///
    /// # Errors
    ///
    /// Propagates detection errors.
    pub fn detect_primary(&mut self, image: &Mat) -> Result<Option<FaceBox>> {
        Ok(self.detect(image)?.into_iter().next())
    }

    /// BGR u8 image to normalized RGB NCHW tensor
    #[allow(clippy::cast_sign_loss)] // OpenCV dimensions are positive
    fn preprocess(image: &Mat) -> Result<Array4<f32>> {
        let height = image.rows() as usize;
        let width = image.cols() as usize;

        let mut array = Array4::<f32>::zeros((1, 3, height, width));
        for row in 0..height {
            for col in 0..width {
                let bgr = image.at_2d::<Vec3b>(usize_to_i32(row)?, usize_to_i32(col)?)?;
                for (ch, &src) in [2usize, 1, 0].iter().enumerate() {
                    array[[0, ch, row, col]] =
                        (f32::from(bgr[src]) - IMAGE_NORMALIZATION_OFFSET) / IMAGE_NORMALIZATION_SCALE;
                }
            }
        }

        Ok(array)
    }

    /// Run the model and decode every stride above the confidence threshold
    fn forward(&mut self, input: Array4<f32>) -> Result<Vec<FaceBox>> {
        let input_height = usize_to_i32(input.shape()[2])?;
        let input_width = usize_to_i32(input.shape()[3])?;

        let cow_array = CowArray::from(input.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
        let outputs = self.session.run(vec![input_tensor])?;

        let mut candidates = Vec::new();
        for (idx, &stride) in self.layout.strides.iter().enumerate() {
            let score_output = outputs
                .get(idx)
                .ok_or_else(|| Error::ModelOutputError(format!("Missing score output {idx}")))?
                .try_extract::<f32>()?;
            let score_view = score_output.view();
            let scores = score_view
                .as_slice()
                .ok_or_else(|| Error::ModelOutputError("Score output is not contiguous".to_string()))?;

            let box_idx = idx + self.layout.offset;
            let box_output = outputs
                .get(box_idx)
                .ok_or_else(|| Error::ModelOutputError(format!("Missing box output {box_idx}")))?
                .try_extract::<f32>()?;
            let box_view = box_output.view();
            let distances = box_view
                .as_slice()
                .ok_or_else(|| Error::ModelOutputError("Box output is not contiguous".to_string()))?;

            let key = (input_height / stride, input_width / stride, stride);
            let anchors_per_cell = self.layout.anchors_per_cell;
            let centers = self
                .center_cache
                .entry(key)
                .or_insert_with(|| anchor_centers(key.0, key.1, stride, anchors_per_cell));

            candidates.extend(decode_stride(centers, scores, distances, stride, self.conf_threshold));
        }

        Ok(candidates)
    }
}

/// Anchor centers of one stride, row-major, repeated per anchor
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn anchor_centers(height: i32, width: i32, stride: i32, anchors_per_cell: usize) -> Vec<(f32, f32)> {
    let mut centers = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let center = ((x * stride) as f32, (y * stride) as f32);
            centers.extend(std::iter::repeat(center).take(anchors_per_cell.max(1)));
        }
    }
    centers
}

/// Turn per-anchor scores and (left, top, right, bottom) distances into boxes.
/// Distances are in stride units.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn decode_stride(
    centers: &[(f32, f32)],
    scores: &[f32],
    distances: &[f32],
    stride: i32,
    threshold: f32,
) -> Vec<FaceBox> {
    let scale = stride as f32;
    centers
        .iter()
        .zip(scores)
        .zip(distances.chunks_exact(4))
        .filter(|((_, score), _)| **score >= threshold)
        .map(|((&(cx, cy), &score), d)| FaceBox {
            x1: cx - d[0] * scale,
            y1: cy - d[1] * scale,
            x2: cx + d[2] * scale,
            y2: cy + d[3] * scale,
            score,
        })
        .collect()
}

/// Greedy non-maximum suppression; output sorted by descending score
#[must_use]
pub fn non_max_suppression(mut boxes: Vec<FaceBox>, iou_threshold: f32) -> Vec<FaceBox> {
    boxes.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut keep: Vec<FaceBox> = Vec::new();
    for candidate in boxes {
        if keep.iter().all(|kept| kept.iou(&candidate) <= iou_threshold) {
            keep.push(candidate);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> FaceBox {
        FaceBox { x1, y1, x2, y2, score }
    }

    #[test]
    fn test_anchor_centers_repeat_per_anchor() {
        let centers = anchor_centers(2, 2, 8, 2);
        assert_eq!(centers.len(), 8);
        assert_eq!(centers[0], (0.0, 0.0));
        assert_eq!(centers[1], (0.0, 0.0));
        assert_eq!(centers[2], (8.0, 0.0));
        assert_eq!(centers[4], (0.0, 8.0));
    }

    #[test]
    fn test_decode_stride_scales_distances() {
        let centers = vec![(100.0, 100.0), (200.0, 200.0)];
        let scores = vec![0.9, 0.1];
        let distances = vec![1.0, 1.0, 2.0, 2.0, 1.0, 1.0, 1.0, 1.0];

        let boxes = decode_stride(&centers, &scores, &distances, 10, 0.5);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0], face(90.0, 90.0, 120.0, 120.0, 0.9));
        assert_eq!(boxes[0].to_rect(), Rect::new(90, 90, 30, 30));
    }

    #[test]
    fn test_iou() {
        let a = face(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = face(5.0, 0.0, 15.0, 10.0, 1.0);
        assert!((a.iou(&b) - 50.0 / 150.0).abs() < 1e-6);
        assert_eq!(a.iou(&face(20.0, 20.0, 30.0, 30.0, 1.0)), 0.0);
    }

    #[test]
    fn test_nms_keeps_best_of_overlaps() {
        let boxes = vec![
            face(0.0, 0.0, 10.0, 10.0, 0.6),
            face(1.0, 1.0, 11.0, 11.0, 0.9),
            face(50.0, 50.0, 60.0, 60.0, 0.7),
        ];
        let kept = non_max_suppression(boxes, 0.4);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 0.9);
        assert_eq!(kept[1].score, 0.7);
    }

    #[test]
    fn test_layout_from_outputs() {
        assert_eq!(HeadLayout::from_output_count(9).strides, vec![8, 16, 32]);
        assert_eq!(HeadLayout::from_output_count(10).anchors_per_cell, 1);
        assert_eq!(HeadLayout::from_output_count(15).offset, 5);
    }
}
