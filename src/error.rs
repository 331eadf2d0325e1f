use crate::dtype::DType;
use thiserror::Error;

pub type CResult<T> = Result<T, CError>;

#[derive(Error, Debug)]
pub enum CError {
    #[error("memory allocation failed")]
    OutOfMemory,
    #[error("index out of bounds: [{row}, {col}] for matrix size [{rows}, {cols}]")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("{op}: shape mismatch, lhs {lhs:?} rhs {rhs:?}")]
    ShapeMismatch {
        op: &'static str,
        lhs: (usize, usize),
        rhs: (usize, usize),
    },
    #[error("{op}: dtype mismatch, lhs {lhs} rhs {rhs}")]
    TypeMismatch {
        op: &'static str,
        lhs: DType,
        rhs: DType,
    },
    #[error("cannot multiply: lhs cols ({lhs_cols}) != rhs rows ({rhs_rows})")]
    DimensionMismatch { lhs_cols: usize, rhs_rows: usize },
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("{0} on an unloaded matrix")]
    UseAfterRelease(&'static str),
}

impl From<&str> for CError {
    fn from(e: &str) -> Self {
        CError::UnsupportedOperation(e.to_string())
    }
}

impl From<CError> for String {
    fn from(e: CError) -> Self {
        format!("{}", e)
    }
}
