use simatch_core::ElementType;

#[derive(Debug, Clone)]
pub enum MatchError {
    IncompatibleDescriptors {
        first_shape: (usize, usize),
        first_type: ElementType,
        second_shape: (usize, usize),
        second_type: ElementType,
    },
    InvalidRatio(f64),
    InvalidDistanceGate(f64),
    InvalidCheckBudget,
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchError::IncompatibleDescriptors {
                first_shape,
                first_type,
                second_shape,
                second_type,
            } => {
                write!(
                    f,
                    "Incompatible descriptors: {}x{} {} vs {}x{} {}",
                    first_shape.0, first_shape.1, first_type,
                    second_shape.0, second_shape.1, second_type
                )
            }
            MatchError::InvalidRatio(ratio) => {
                write!(f, "Invalid ratio threshold: {} (must lie in (0, 1))", ratio)
            }
            MatchError::InvalidDistanceGate(gate) => {
                write!(f, "Invalid distance gate: {} (must be positive)", gate)
            }
            MatchError::InvalidCheckBudget => {
                write!(f, "Indexed search needs a non-zero check budget")
            }
        }
    }
}

impl std::error::Error for MatchError {}

pub type MatcherResult<T> = Result<T, MatchError>;
