//! Face mesh landmark extraction.
//!
//! The mesh model takes a square RGB face crop and predicts 468 points in
//! crop pixels. `FaceMeshExtractor` runs the face detector, crops the best
//! face and re-expresses the points as fractions of the full frame.

use crate::{
    constants::{
        DEFAULT_CROP_EXPANSION, DEFAULT_PRESENCE_THRESHOLD, FACE_MESH_INPUT_SIZE, FACE_MESH_VALUES_PER_LANDMARK,
        NUM_FACE_MESH_LANDMARKS,
    },
    error::Error,
    face_detection::FaceDetector,
    landmarks::{FaceLandmarks, Landmark, LandmarkExtractor},
    utils::{expand_to_square, usize_to_i32},
    Result,
};
use log::{debug, info};
use ndarray::{Array4, CowArray};
use opencv::core::{Mat, Rect, Size, Vec3b};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Face mesh landmark model using `ONNX` Runtime
pub struct FaceMesh {
    session: Session,
    input_size: i32,
}

/// Mesh model output for one crop
#[derive(Debug, Clone)]
pub struct MeshOutput {
    /// Flattened (x, y, z) triples in input pixels
    pub raw: Vec<f32>,
    /// Face presence probability, when the model reports one
    pub presence: Option<f32>,
}

impl FaceMesh {
    /// Load the mesh model
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded or has no outputs.
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        info!("Initializing FaceMesh with model: {}", model_path.as_ref().display());
        let environment = Arc::new(
            Environment::builder()
                .with_name("face_mesh")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        if session.outputs.is_empty() {
            return Err(Error::ModelOutputError("Mesh model has no outputs".to_string()));
        }

        Ok(Self {
            session,
            input_size: FACE_MESH_INPUT_SIZE,
        })
    }

    #[must_use]
    pub const fn input_size(&self) -> i32 {
        self.input_size
    }

    /// Run the model on a BGR face crop of any size
    ///
    /// # Errors
    ///
    /// Returns an error if resizing or inference fails.
    pub fn infer(&self, crop: &Mat) -> Result<MeshOutput> {
        let input = self.preprocess(crop)?;

        let cow_array = CowArray::from(input.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
        let outputs = self.session.run(vec![input_tensor])?;

        let mut outputs = outputs.into_iter();
        let landmarks_output = outputs
            .next()
            .ok_or_else(|| Error::ModelOutputError("No output from mesh model".to_string()))?;
        let landmarks_tensor = landmarks_output.try_extract::<f32>()?;
        let landmarks_view = landmarks_tensor.view();
        let raw = landmarks_view
            .as_slice()
            .ok_or_else(|| Error::ModelOutputError("Failed to get landmark data".to_string()))?
            .to_vec();

        // Second head is a face-flag logit
        let presence = match outputs.next() {
            Some(flag_output) => {
                let flag_tensor = flag_output.try_extract::<f32>()?;
                let flag_view = flag_tensor.view();
                flag_view.iter().next().map(|&logit| sigmoid(logit))
            }
            None => None,
        };

        Ok(MeshOutput { raw, presence })
    }

    /// Resize to the model input and convert to NHWC RGB in [0, 1]
    #[allow(clippy::cast_sign_loss)] // Model input size is positive
    fn preprocess(&self, crop: &Mat) -> Result<Array4<f32>> {
        let mut resized = Mat::default();
        imgproc::resize(
            crop,
            &mut resized,
            Size::new(self.input_size, self.input_size),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;

        let size = self.input_size as usize;
        let mut array = Array4::<f32>::zeros((1, size, size, 3));
        for row in 0..size {
            for col in 0..size {
                let bgr = resized.at_2d::<Vec3b>(usize_to_i32(row)?, usize_to_i32(col)?)?;
                array[[0, row, col, 0]] = f32::from(bgr[2]) / 255.0;
                array[[0, row, col, 1]] = f32::from(bgr[1]) / 255.0;
                array[[0, row, col, 2]] = f32::from(bgr[0]) / 255.0;
            }
        }

        Ok(array)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Map raw mesh output (input pixels of a crop) to landmarks normalized to
/// the full frame.
///
/// # Errors
///
/// Returns `ModelValidationError` when the output holds too few points.
#[allow(clippy::cast_precision_loss)]
pub fn crop_points_to_frame(
    raw: &[f32],
    crop: Rect,
    input_size: i32,
    frame_width: i32,
    frame_height: i32,
) -> Result<FaceLandmarks> {
    if raw.len() < NUM_FACE_MESH_LANDMARKS * FACE_MESH_VALUES_PER_LANDMARK {
        return Err(Error::ModelValidationError(format!(
            "Mesh output has {} values, expected {}",
            raw.len(),
            NUM_FACE_MESH_LANDMARKS * FACE_MESH_VALUES_PER_LANDMARK
        )));
    }
    if input_size <= 0 || frame_width <= 0 || frame_height <= 0 {
        return Err(Error::InvalidInput(format!(
            "Cannot normalize to {frame_width}x{frame_height} from input size {input_size}"
        )));
    }

    let scale_x = f64::from(crop.width) / f64::from(input_size);
    let scale_y = f64::from(crop.height) / f64::from(input_size);

    let points = raw
        .chunks_exact(FACE_MESH_VALUES_PER_LANDMARK)
        .map(|p| {
            let x = f64::from(crop.x) + f64::from(p[0]) * scale_x;
            let y = f64::from(crop.y) + f64::from(p[1]) * scale_y;
            Landmark::new(x / f64::from(frame_width), y / f64::from(frame_height))
        })
        .collect();

    FaceLandmarks::new(points)
}

/// Detector + mesh model pipeline
pub struct FaceMeshExtractor {
    detector: FaceDetector,
    mesh: FaceMesh,
    crop_expansion: f32,
    presence_threshold: f32,
}

impl FaceMeshExtractor {
    #[must_use]
    pub fn new(detector: FaceDetector, mesh: FaceMesh) -> Self {
        Self {
            detector,
            mesh,
            crop_expansion: DEFAULT_CROP_EXPANSION,
            presence_threshold: DEFAULT_PRESENCE_THRESHOLD,
        }
    }

    #[must_use]
    pub fn with_crop_expansion(mut self, expansion: f32) -> Self {
        self.crop_expansion = expansion;
        self
    }

    #[must_use]
    pub fn with_presence_threshold(mut self, threshold: f32) -> Self {
        self.presence_threshold = threshold;
        self
    }
}

impl LandmarkExtractor for FaceMeshExtractor {
    fn extract(&mut self, frame: &Mat) -> Result<Option<FaceLandmarks>> {
        let Some(face) = self.detector.detect_primary(frame)? else {
            return Ok(None);
        };

        let Some(crop_rect) = expand_to_square(face.to_rect(), frame.cols(), frame.rows(), self.crop_expansion)
        else {
            return Ok(None);
        };

        let crop = Mat::roi(frame, crop_rect)?.try_clone()?;
        let output = self.mesh.infer(&crop)?;

        if let Some(presence) = output.presence {
            if presence < self.presence_threshold {
                debug!("Mesh presence {:.2} below threshold, skipping frame", presence);
                return Ok(None);
            }
        }

        crop_points_to_frame(&output.raw, crop_rect, self.mesh.input_size(), frame.cols(), frame.rows()).map(Some)
    }
}
