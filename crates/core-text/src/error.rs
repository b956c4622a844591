use thiserror::Error;

/// Failure of a buffer operation. The buffer is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("offset {offset} out of range (size {size})")]
    OffsetOutOfRange { offset: usize, size: usize },
}
