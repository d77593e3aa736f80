//! Non-fatal conditions surfaced during reconciliation, plus the small set
//! of payload problems that are fatal to a merge.
//!
//! A malformed word never aborts a merge: [`crate::session::Session::merge`]
//! still returns `Ok(`[`crate::session::MergeOutcome`]`)`. Problems are
//! instead collected as [`MergeWarning`]s so callers can log or surface them
//! without the pipeline itself ever short-circuiting on bad decoder input.
//! [`MergeError`] is reserved for payload shapes `merge` can't reason about
//! at all, like word spans that arrive out of time order.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MergeWarning {
    #[error("word {index} has empty text after trimming, skipped")]
    EmptyText { index: usize },

    #[error("word {index} has non-finite start/end ({start}, {end}), skipped")]
    NonFiniteTime { index: usize, start: f64, end: f64 },

    #[error("word {index} has end ({end}) before start ({start}), skipped")]
    EndBeforeStart { index: usize, start: f64, end: f64 },

    #[error("word {index} has negative confidence ({confidence}), skipped")]
    NegativeConfidence { index: usize, confidence: f64 },
}

/// Errors from the boundary-detector / cursor layer. Reconciliation itself
/// cannot fail, but a pluggable [`crate::boundary::SentenceBoundaryDetector`]
/// is free to reject malformed state it's handed.
#[derive(Debug, thiserror::Error)]
pub enum StrcError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("word id {0:?} not found in transcript")]
    UnknownWordId(String),
}

/// Structural problems with a payload that a merge cannot proceed past.
/// Distinct from [`MergeWarning`]: a warning means "this word was dropped,
/// everything else still makes sense," while a `MergeError` means the
/// payload's own word ordering can't be trusted to compute an overlap
/// range against, so no decision can be made at all.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MergeError {
    #[error(
        "payload word {index} starts at {start} before the previous word's start ({prev_start}); \
         payloads must be time-sorted"
    )]
    UnsortedPayload { index: usize, prev_start: f64, start: f64 },
}
