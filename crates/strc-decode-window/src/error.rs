#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("sample rate mismatch: buffer is {expected} Hz, append was {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },

    #[error("decode model not ready")]
    ModelNotReady,

    #[error("decoder failed: {0}")]
    DecoderFailed(String),

    #[error(transparent)]
    Merge(#[from] strc::MergeError),
}
