//! Streaming Transcription Reconciliation Core.
//!
//! Converts a stream of overlapping, revisable speech-to-text hypotheses
//! into a single, monotonically-stabilizing transcript with per-word
//! confidence, stability, finalization, and a "mature cursor" marking the
//! boundary between immutable and still-revisable content.
//!
//! [`Session`] is the single entry point: construct one per conversation,
//! feed it [`DecoderResult`]s via [`Session::merge`], and read back
//! [`MergeOutcome`] snapshots.

mod align;
mod boundary;
mod cleaner;
mod config;
mod cursor;
mod decider;
mod error;
mod finalizer;
mod reconciler;
mod session;
mod stats;
mod store;
mod word;

pub use boundary::{HeuristicBoundaryDetector, SentenceBoundaryDetector};
pub use config::{CursorMode, StrcConfig};
pub use error::{MergeError, StrcError};
pub use session::{DecoderResult, MergeOutcome, Session, TranscriptSnapshot};
pub use stats::SessionStats;
pub use word::{DecoderWord, HistoryEntry, IdGenerator, SequentialIdGen, Token, UuidIdGen, Word};
