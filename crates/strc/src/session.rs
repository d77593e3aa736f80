//! Session core (component L): owns the transcript store, cursor engine,
//! boundary detector and stats, and exposes the `new/merge/update_config/
//! reset/update_word_lock` lifecycle.
//!
//! Owns an `IdGenerator` and drives the full reconcile/clean/finalize/
//! advance-cursor/re-finalize pipeline once per merge.

use tracing::{debug, info};

use crate::align::TokenAligner;
use crate::boundary::{HeuristicBoundaryDetector, SentenceBoundaryDetector};
use crate::cleaner;
use crate::config::StrcConfig;
use crate::cursor::MatureCursorEngine;
use crate::decider;
use crate::decider::decide;
use crate::error::{MergeError, MergeWarning};
use crate::finalizer;
use crate::reconciler;
use crate::stats::SessionStats;
use crate::store::TranscriptStore;
use crate::word::{DecoderWord, HistoryEntry, IdGenerator, Token, UuidIdGen, Word};

/// A batch of word hypotheses from the decoder for one segment.
#[derive(Debug, Clone, Default)]
pub struct DecoderResult {
    pub sequence_num: u64,
    pub session_id: String,
    pub words: Vec<DecoderWord>,
    pub tokens: Option<Vec<Token>>,
    pub utterance_text: Option<String>,
    pub is_final: Option<bool>,
    pub metrics: Option<serde_json::Value>,
}

/// Immutable view of the transcript; the session never hands out a
/// reference into its internal `Vec<Word>`, only clones via this type.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct TranscriptSnapshot {
    pub words: Vec<Word>,
}

/// Emitted after every merge.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct MergeOutcome {
    pub snapshot: TranscriptSnapshot,
    pub stats: SessionStats,
    pub mature_cursor_time: f64,
    pub last_sequence_num: u64,
    pub utterance_text: Option<String>,
    pub is_final: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
}

fn validate(raw: Vec<DecoderWord>, warnings: &mut Vec<MergeWarning>) -> Vec<DecoderWord> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, word)| {
            if word.text.trim().is_empty() {
                warnings.push(MergeWarning::EmptyText { index });
                return None;
            }
            if !word.start.is_finite() || !word.end.is_finite() {
                warnings.push(MergeWarning::NonFiniteTime {
                    index,
                    start: word.start,
                    end: word.end,
                });
                return None;
            }
            if word.end < word.start {
                warnings.push(MergeWarning::EndBeforeStart {
                    index,
                    start: word.start,
                    end: word.end,
                });
                return None;
            }
            if word.confidence < 0.0 {
                warnings.push(MergeWarning::NegativeConfidence {
                    index,
                    confidence: word.confidence,
                });
                return None;
            }
            Some(word)
        })
        .collect()
}

pub struct Session {
    config: StrcConfig,
    store: TranscriptStore,
    cursor: MatureCursorEngine,
    boundary_detector: Box<dyn SentenceBoundaryDetector>,
    id_gen: Box<dyn IdGenerator>,
    aligner: TokenAligner,
    stats: SessionStats,
    latest_segment_end: f64,
    last_sequence_num: u64,
}

impl Session {
    pub fn new(config: StrcConfig) -> Self {
        let boundary_detector = Box::new(HeuristicBoundaryDetector::new(config.max_retained_sentences));
        Self {
            config,
            store: TranscriptStore::new(),
            cursor: MatureCursorEngine::new(),
            boundary_detector,
            id_gen: Box::new(UuidIdGen),
            aligner: TokenAligner::new(),
            stats: SessionStats::default(),
            latest_segment_end: 0.0,
            last_sequence_num: 0,
        }
    }

    pub fn with_id_generator(mut self, id_gen: Box<dyn IdGenerator>) -> Self {
        self.id_gen = id_gen;
        self
    }

    pub fn with_boundary_detector(mut self, detector: Box<dyn SentenceBoundaryDetector>) -> Self {
        self.boundary_detector = detector;
        self
    }

    pub fn config(&self) -> &StrcConfig {
        &self.config
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn mature_cursor_time(&self) -> f64 {
        self.cursor.cursor_time()
    }

    /// Replaces the active configuration. Takes effect starting with the
    /// next merge.
    pub fn update_config(&mut self, config: StrcConfig) {
        self.config = config;
    }

    /// Clears the transcript, cursor, token tail and stats.
    pub fn reset(&mut self) {
        self.store.clear();
        self.cursor.reset();
        self.boundary_detector.reset();
        self.aligner = TokenAligner::new();
        self.stats = SessionStats::default();
        self.latest_segment_end = 0.0;
        self.last_sequence_num = 0;
    }

    /// Advisory lower bound on the cursor, applied on the next advance.
    pub fn apply_cursor_hint(&mut self, time: f64) {
        self.cursor.apply_hint(time);
    }

    /// Mutates exactly one word. Returns `false` if `word_id` isn't found.
    pub fn update_word_lock(
        &mut self,
        word_id: &str,
        locked: bool,
        new_text: Option<String>,
        new_history: Option<Vec<HistoryEntry>>,
    ) -> bool {
        let Some(word) = self.store.words_mut().iter_mut().find(|w| w.id == word_id) else {
            return false;
        };
        word.locked_by_user = locked;
        if let Some(text) = new_text {
            word.text = text;
        }
        if let Some(history) = new_history {
            word.history = history;
        }
        true
    }

    pub fn snapshot(&self) -> TranscriptSnapshot {
        TranscriptSnapshot { words: self.store.words().to_vec() }
    }

    /// Runs one full merge: validate, reconcile, clean, finalize, advance
    /// cursor, re-finalize, refresh stats. Fails only when the payload's own
    /// word ordering is structurally unusable; any per-word defect instead
    /// becomes a [`MergeWarning`] and the rest of the payload still merges.
    pub fn merge(&mut self, payload: DecoderResult) -> Result<MergeOutcome, MergeError> {
        let span = tracing::info_span!("strc_merge", sequence_num = payload.sequence_num);
        let _enter = span.enter();

        let mut prev_start = f64::NEG_INFINITY;
        for (index, word) in payload.words.iter().enumerate() {
            if word.start < prev_start {
                return Err(MergeError::UnsortedPayload { index, prev_start, start: word.start });
            }
            prev_start = word.start;
        }

        let mut warnings = Vec::new();
        let filtered = validate(payload.words, &mut warnings);

        if let Some(tokens) = &payload.tokens {
            self.aligner.align(tokens);
        }

        if filtered.is_empty() {
            debug!(warnings = warnings.len(), "empty payload after validation, no-op");
            return Ok(self.build_outcome(payload.sequence_num, payload.utterance_text, payload.is_final, warnings));
        }

        let current_seq = payload.sequence_num;
        let words_in_payload = filtered.len() as u64;
        let first_start = filtered.first().unwrap().start;
        let last_end = filtered.last().unwrap().end;
        self.latest_segment_end = self.latest_segment_end.max(last_end);

        match self.store.find_overlap(first_start, last_end) {
            None => {
                let words: Vec<Word> = filtered
                    .into_iter()
                    .map(|raw| {
                        Word::new(self.id_gen.next_id(), raw, current_seq, payload.session_id.clone())
                    })
                    .collect();
                self.stats.words_added += words.len() as u64;
                let at = self.store.words().partition_point(|w| w.start <= first_start);
                self.store.insert_sorted(words, Some(at));
            }
            Some((i, j)) => {
                // Finalized words are immutable: never let them enter the
                // decidable overlap range. The finalizer's stability rule
                // can finalize a word irrespective of cursor position, so a
                // finalized word is not guaranteed to sit only in a leading
                // run — it can appear anywhere in the overlap. Skip past
                // the rightmost finalized index found, so the decidable
                // suffix is guaranteed finalized-word-free regardless of
                // where the finalized word(s) fall.
                let effective_start = (i..j)
                    .rev()
                    .find(|&idx| self.store.words()[idx].finalized)
                    .map(|idx| idx + 1)
                    .unwrap_or(i);

                let mut filtered = filtered;
                if effective_start > i {
                    let prev = self.store.words()[effective_start - 1].clone();
                    decider::trim_finalized_boundary_duplicate(&prev, &mut filtered, &self.config);
                }

                if effective_start == j {
                    let words: Vec<Word> = filtered
                        .into_iter()
                        .map(|raw| {
                            Word::new(self.id_gen.next_id(), raw, current_seq, payload.session_id.clone())
                        })
                        .collect();
                    self.stats.words_added += words.len() as u64;
                    self.store.insert_sorted(words, Some(j));
                } else {
                    let verdict = decide(
                        &filtered,
                        &self.store.words()[effective_start..j],
                        current_seq,
                        &self.config,
                    );
                    let effect = reconciler::apply(
                        &mut self.store,
                        effective_start,
                        j - effective_start,
                        verdict,
                        current_seq,
                        &payload.session_id,
                        self.id_gen.as_mut(),
                    );
                    self.stats.words_added += effect.added as u64;
                    self.stats.words_replaced += effect.replaced as u64;
                    self.stats.words_kept_stable += effect.kept_stable as u64;
                }
            }
        }

        self.stats.total_segments_processed += 1;
        self.stats.total_words_processed += words_in_payload;

        cleaner::clean(&mut self.store);

        self.stats.words_finalized += finalizer::sweep(
            &mut self.store,
            self.cursor.cursor_time(),
            self.latest_segment_end,
            current_seq,
            &self.config,
        ) as u64;

        let advanced = self.cursor.advance(
            &self.store.finalized_words(),
            self.boundary_detector.as_mut(),
            self.latest_segment_end,
            &self.config,
        );

        if advanced {
            self.stats.words_finalized += finalizer::sweep(
                &mut self.store,
                self.cursor.cursor_time(),
                self.latest_segment_end,
                current_seq,
                &self.config,
            ) as u64;
        }

        self.stats.refresh_wpm(self.store.words(), &self.config);
        self.last_sequence_num = self.last_sequence_num.max(current_seq);

        info!(
            words = self.store.len(),
            cursor = self.cursor.cursor_time(),
            "merge complete"
        );

        Ok(self.build_outcome(current_seq, payload.utterance_text, payload.is_final, warnings))
    }

    fn build_outcome(
        &self,
        sequence_num: u64,
        utterance_text: Option<String>,
        is_final: Option<bool>,
        warnings: Vec<MergeWarning>,
    ) -> MergeOutcome {
        MergeOutcome {
            snapshot: self.snapshot(),
            stats: self.stats,
            mature_cursor_time: self.cursor.cursor_time(),
            last_sequence_num: self.last_sequence_num.max(sequence_num),
            utterance_text,
            is_final,
            warnings: warnings.into_iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(StrcConfig::default())
    }
}
