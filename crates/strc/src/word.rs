//! Word & token model (component A).
//!
//! Words are immutable-by-default records: once `finalized` is set, only the
//! user-lock path (see [`crate::session::Session::update_word_lock`]) may
//! still change `text`. Everything else in the pipeline treats a finalized
//! word as a value, never a handle.

/// A prior alternative superseded during reconciliation.
///
/// Stored value-typed on the successor word, never as a reference to a live
/// word — there is no shared/back-pointer graph to reason about.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct HistoryEntry {
    pub text: String,
    pub confidence: f64,
    pub start: f64,
    pub end: f64,
}

/// One word in the transcript.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct Word {
    pub id: String,
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub confidence: f64,
    pub finalized: bool,
    pub stability_counter: u32,
    pub last_modified_sequence: u64,
    pub source_segment_id: String,
    pub history: Vec<HistoryEntry>,
    pub locked_by_user: bool,
}

impl Word {
    pub(crate) fn new(
        id: String,
        raw: DecoderWord,
        sequence_num: u64,
        source_segment_id: String,
    ) -> Self {
        Self {
            id,
            text: raw.text,
            start: raw.start,
            end: raw.end,
            confidence: raw.confidence,
            finalized: false,
            stability_counter: 0,
            last_modified_sequence: sequence_num,
            source_segment_id,
            history: Vec::new(),
            locked_by_user: false,
        }
    }

    pub(crate) fn to_history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            text: self.text.clone(),
            confidence: self.confidence,
            start: self.start,
            end: self.end,
        }
    }
}

/// A decoder diagnostic token, `{token, start, end, confidence}`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct Token {
    pub token: String,
    pub start: f64,
    pub end: f64,
    pub confidence: f64,
}

/// A raw word hypothesis as delivered by the decoder, before it has an `id`
/// or any of the reconciliation bookkeeping fields.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct DecoderWord {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub confidence: f64,
}

/// Assigns stable unique identifiers to newly created words.
///
/// Production code uses [`UuidIdGen`]; tests and golden-file fixtures use
/// [`SequentialIdGen`] for reproducible output.
pub trait IdGenerator: Send {
    fn next_id(&mut self) -> String;
}

#[derive(Debug, Default)]
pub struct UuidIdGen;

impl IdGenerator for UuidIdGen {
    fn next_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic sequential ID generator for tests and golden-file snapshots.
#[derive(Debug, Default)]
pub struct SequentialIdGen(u64);

impl SequentialIdGen {
    pub fn new() -> Self {
        Self(0)
    }
}

impl IdGenerator for SequentialIdGen {
    fn next_id(&mut self) -> String {
        let id = self.0;
        self.0 += 1;
        id.to_string()
    }
}
