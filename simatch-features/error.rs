use simatch_core::CoreError;

#[derive(Debug)]
pub enum BuildError {
    InvalidOptions(&'static str),
    InvalidImage(String),
    DetectorFailure(Box<dyn std::error::Error + Send + Sync>),
    InconsistentDetection { keypoints: usize, descriptors: usize },
    FeatureSet(CoreError),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::InvalidOptions(msg) => {
                write!(f, "Invalid extraction options: {}", msg)
            }
            BuildError::InvalidImage(msg) => {
                write!(f, "Could not decode image: {}", msg)
            }
            BuildError::DetectorFailure(e) => {
                write!(f, "Detector failed: {}", e)
            }
            BuildError::InconsistentDetection { keypoints, descriptors } => {
                write!(f, "Detector returned {} keypoints but {} descriptor rows", keypoints, descriptors)
            }
            BuildError::FeatureSet(e) => {
                write!(f, "Invalid feature set: {}", e)
            }
        }
    }
}

impl std::error::Error for BuildError {}

impl From<CoreError> for BuildError {
    fn from(e: CoreError) -> Self {
        BuildError::FeatureSet(e)
    }
}

pub type BuildResult<T> = Result<T, BuildError>;
