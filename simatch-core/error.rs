#[derive(Debug, Clone)]
pub enum CoreError {
    ShapeMismatch { rows: usize, cols: usize, len: usize },
    CountMismatch { keypoints: usize, descriptors: usize },
    CorruptDescriptorData { expected: usize, actual: usize },
    InvalidEncoding(String),
    KeypointCountMismatch { declared: usize, actual: usize },
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::ShapeMismatch { rows, cols, len } => {
                write!(f, "Buffer of {} elements cannot form a {}x{} matrix", len, rows, cols)
            }
            CoreError::CountMismatch { keypoints, descriptors } => {
                write!(f, "Feature set has {} keypoints but {} descriptor rows", keypoints, descriptors)
            }
            CoreError::CorruptDescriptorData { expected, actual } => {
                write!(f, "Descriptor byte size mismatch: expected {}, got {}", expected, actual)
            }
            CoreError::InvalidEncoding(msg) => {
                write!(f, "Invalid descriptor encoding: {}", msg)
            }
            CoreError::KeypointCountMismatch { declared, actual } => {
                write!(f, "Record declares {} keypoints but carries {}", declared, actual)
            }
        }
    }
}

impl std::error::Error for CoreError {}

pub type CoreResult<T> = Result<T, CoreError>;
