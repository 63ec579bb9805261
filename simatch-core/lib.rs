pub mod codec;
pub mod error;
pub mod wire;

pub use error::{CoreError, CoreResult};
pub use wire::FeatureSetRecord;

use serde::{Deserialize, Serialize};

/// Detected salient point: subpixel position, local scale and orientation (radians)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub angle: f64,
}

/// Element family of a descriptor matrix, fixed per feature set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Binary descriptors, compared with Hamming distance
    U8,
    /// Gradient-histogram descriptors, compared with L2 distance
    F32,
}

impl ElementType {
    pub fn byte_width(self) -> usize {
        match self {
            ElementType::U8 => 1,
            ElementType::F32 => 4,
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementType::U8 => write!(f, "u8"),
            ElementType::F32 => write!(f, "f32"),
        }
    }
}

/// Row-major N×D descriptor storage; one row per keypoint
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorMatrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T: Copy> DescriptorMatrix<T> {
    pub fn new(data: Vec<T>, rows: usize, cols: usize) -> CoreResult<Self> {
        if data.len() != rows.saturating_mul(cols) {
            return Err(CoreError::ShapeMismatch { rows, cols, len: data.len() });
        }
        Ok(Self { data, rows, cols })
    }

    /// Matrix with zero rows but a known descriptor width
    pub fn empty(cols: usize) -> Self {
        Self { data: Vec::new(), rows: 0, cols }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, index: usize) -> &[T] {
        let start = index * self.cols;
        &self.data[start..start + self.cols]
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Keep only the first `max_rows` rows
    pub fn truncate(&mut self, max_rows: usize) {
        if max_rows < self.rows {
            self.data.truncate(max_rows * self.cols);
            self.rows = max_rows;
        }
    }
}

/// Descriptor matrix tagged with its element family
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptors {
    Binary(DescriptorMatrix<u8>),
    Float(DescriptorMatrix<f32>),
}

impl Descriptors {
    pub fn element_type(&self) -> ElementType {
        match self {
            Descriptors::Binary(_) => ElementType::U8,
            Descriptors::Float(_) => ElementType::F32,
        }
    }

    /// Number of descriptor rows
    pub fn len(&self) -> usize {
        match self {
            Descriptors::Binary(m) => m.rows(),
            Descriptors::Float(m) => m.rows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Descriptor width D
    pub fn width(&self) -> usize {
        match self {
            Descriptors::Binary(m) => m.cols(),
            Descriptors::Float(m) => m.cols(),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.len(), self.width())
    }

    pub fn truncate(&mut self, max_rows: usize) {
        match self {
            Descriptors::Binary(m) => m.truncate(max_rows),
            Descriptors::Float(m) => m.truncate(max_rows),
        }
    }
}

/// Keypoints paired with their descriptors, extracted from one image.
/// Immutable once built; row i of the descriptors belongs to keypoint i.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    keypoints: Vec<Keypoint>,
    descriptors: Descriptors,
    source_shape: (u32, u32), // (height, width) of the detected-on image
}

impl FeatureSet {
    pub fn new(
        keypoints: Vec<Keypoint>,
        descriptors: Descriptors,
        source_shape: (u32, u32),
    ) -> CoreResult<Self> {
        if keypoints.len() != descriptors.len() {
            return Err(CoreError::CountMismatch {
                keypoints: keypoints.len(),
                descriptors: descriptors.len(),
            });
        }
        Ok(Self { keypoints, descriptors, source_shape })
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &Descriptors {
        &self.descriptors
    }

    /// (height, width) of the image the features were detected on
    pub fn source_shape(&self) -> (u32, u32) {
        self.source_shape
    }

    /// Feature count N
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}
