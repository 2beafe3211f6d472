use dgpe_common::CommonError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Invalid number of dimensions (expected 1, 2, 3, got {dims})")]
    UnsupportedDimension { dims: usize },

    #[error("A NaN or Inf value was produced at step {step}")]
    NanOrInf { step: usize },

    #[error("Shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Spatially varying dissipation requires the comoving evolver")]
    NonUniformDissipation,

    #[error("Invalid parameter: {msg}")]
    InvalidParameter { msg: String },

    #[error("Error in common: {err}")]
    Common {
        #[from]
        err: CommonError,
    },
}
