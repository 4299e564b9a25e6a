use crate::Key;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error(
        "brain dimension mismatch: expected {expected_inputs} inputs and {expected_outputs} outputs, \
         found {found_inputs} and {found_outputs}"
    )]
    DimensionMismatch {
        /// Offending cell; `None` for a single whole-body brain.
        cell: Option<Key>,
        expected_inputs: usize,
        expected_outputs: usize,
        found_inputs: usize,
        found_outputs: usize,
    },

    #[error("no function for occupied cell {cell}")]
    MissingFunction { cell: Key },

    #[error("grid is {found_w}x{found_h}, body is {expected_w}x{expected_h}")]
    ShapeMismatch {
        expected_w: usize,
        expected_h: usize,
        found_w: usize,
        found_h: usize,
    },

    #[error("unknown shape {0:?}")]
    UnknownShape(String),

    #[error("invalid shape {shape:?}: {reason}")]
    InvalidShape { shape: String, reason: String },
}
