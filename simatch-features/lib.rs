//! Feature-set construction: image normalization plus a pluggable detector.
//!
//! The detector itself lives behind the [`Detector`] trait; this crate owns
//! everything around it: decoding the raster input, bounding its size,
//! optional smoothing, and shaping the detector output into a canonical
//! [`FeatureSet`].

pub mod error;

pub use error::{BuildError, BuildResult};

use image::imageops;
use image::GrayImage;
use log::debug;
use serde::{Deserialize, Serialize};
use simatch_core::{Descriptors, FeatureSet, Keypoint};

/// Per-call tuning handed to the detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorOptions {
    /// Upper bound on returned keypoints
    pub max_features: usize,
    /// Sensitivity threshold; weaker responses are discarded
    pub min_contrast: f64,
}

/// What a detector reports for one image
#[derive(Debug, Clone)]
pub struct Detection {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Descriptors,
}

/// External keypoint/descriptor engine.
///
/// Implementations must be deterministic for a fixed image and options, and
/// must keep keypoints ordered strongest-response first. Internal failures
/// are reported as errors and propagated unchanged; they are never mapped to
/// an empty detection.
pub trait Detector {
    fn detect(
        &self,
        image: &GrayImage,
        options: &DetectorOptions,
    ) -> Result<Detection, Box<dyn std::error::Error + Send + Sync>>;
}

/// Extraction tuning for [`FeatureSetBuilder`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOptions {
    /// Keypoint cap; detector output beyond this is truncated
    pub max_features: usize,
    /// Detector sensitivity threshold
    pub min_contrast: f64,
    /// Images with a larger side than this are downscaled before detection
    pub max_dimension: u32,
    /// Gaussian smoothing applied before detection when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothing_sigma: Option<f32>,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            max_features: 200,
            min_contrast: 0.08,
            max_dimension: 1024,
            smoothing_sigma: None,
        }
    }
}

impl ExtractionOptions {
    pub fn validate(&self) -> BuildResult<()> {
        if self.max_features == 0 {
            return Err(BuildError::InvalidOptions("max_features must be at least 1"));
        }
        if self.max_dimension == 0 {
            return Err(BuildError::InvalidOptions("max_dimension must be at least 1"));
        }
        if self.min_contrast < 0.0 {
            return Err(BuildError::InvalidOptions("min_contrast must not be negative"));
        }
        if let Some(sigma) = self.smoothing_sigma {
            if sigma <= 0.0 {
                return Err(BuildError::InvalidOptions("smoothing_sigma must be positive"));
            }
        }
        Ok(())
    }
}

/// Builds canonical feature sets from raw image bytes
#[derive(Debug, Clone)]
pub struct FeatureSetBuilder {
    options: ExtractionOptions,
}

impl FeatureSetBuilder {
    pub fn new(options: ExtractionOptions) -> BuildResult<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &ExtractionOptions {
        &self.options
    }

    /// Decode, normalize and run the detector over one image.
    ///
    /// A detector reporting zero keypoints builds a valid empty set, not an
    /// error. Keypoint coordinates are relative to the working image, which
    /// may be a downscaled copy of the input; the working (height, width) is
    /// recorded on the returned set.
    pub fn build<D: Detector>(&self, image_bytes: &[u8], detector: &D) -> BuildResult<FeatureSet> {
        let decoded = image::load_from_memory(image_bytes)
            .map_err(|e| BuildError::InvalidImage(e.to_string()))?;
        let mut working = self.bound_size(decoded.to_luma8());
        if let Some(sigma) = self.options.smoothing_sigma {
            working = imageproc::filter::gaussian_blur_f32(&working, sigma);
        }
        let shape = (working.height(), working.width());

        let detector_options = DetectorOptions {
            max_features: self.options.max_features,
            min_contrast: self.options.min_contrast,
        };
        let Detection { mut keypoints, mut descriptors } = detector
            .detect(&working, &detector_options)
            .map_err(BuildError::DetectorFailure)?;

        if keypoints.len() != descriptors.len() {
            return Err(BuildError::InconsistentDetection {
                keypoints: keypoints.len(),
                descriptors: descriptors.len(),
            });
        }
        if keypoints.len() > self.options.max_features {
            // Detector order is strongest-first; keep the leading rows of
            // both sequences together
            keypoints.truncate(self.options.max_features);
            descriptors.truncate(self.options.max_features);
        }
        debug!(
            "extracted {} keypoints from {}x{} working image",
            keypoints.len(),
            shape.1,
            shape.0
        );
        Ok(FeatureSet::new(keypoints, descriptors, shape)?)
    }

    /// Downscale so the larger side fits `max_dimension`, preserving aspect
    /// ratio with area-averaged sampling. Smaller images pass through.
    fn bound_size(&self, image: GrayImage) -> GrayImage {
        let (width, height) = image.dimensions();
        let largest = width.max(height);
        if largest <= self.options.max_dimension {
            return image;
        }
        let scale = self.options.max_dimension as f64 / largest as f64;
        let new_width = ((width as f64 * scale).round() as u32).max(1);
        let new_height = ((height as f64 * scale).round() as u32).max(1);
        debug!("downscaling {}x{} to {}x{}", width, height, new_width, new_height);
        imageops::thumbnail(&image, new_width, new_height)
    }
}
