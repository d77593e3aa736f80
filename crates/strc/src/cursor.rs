//! Mature-cursor engine (component G): advances a monotone cursor marking
//! the boundary between immutable and still-revisable transcript content.
//!
//! A small piece of engine state advanced by an external signal, anchored
//! on sentence boundaries with an advisory hint input.

use crate::boundary::SentenceBoundaryDetector;
use crate::config::{CursorMode, StrcConfig};
use crate::word::Word;

#[derive(Debug, Default)]
pub struct MatureCursorEngine {
    cursor_time: f64,
    last_hint: f64,
}

impl MatureCursorEngine {
    pub fn new() -> Self {
        Self { cursor_time: 0.0, last_hint: 0.0 }
    }

    pub fn cursor_time(&self) -> f64 {
        self.cursor_time
    }

    /// Applies an advisory lower bound on the cursor (`CursorHint` ingress
    /// message). Monotone: later, smaller hints never move it backwards.
    pub fn apply_hint(&mut self, time: f64) {
        self.last_hint = self.last_hint.max(time);
    }

    pub fn reset(&mut self) {
        self.cursor_time = 0.0;
        self.last_hint = 0.0;
    }

    /// Attempts to advance the cursor. Returns `true` if it moved.
    /// `current_abs_stream_time` gates advancement until
    /// `min_initial_context_time` has elapsed.
    pub fn advance(
        &mut self,
        finalized_words: &[&Word],
        detector: &mut dyn SentenceBoundaryDetector,
        current_abs_stream_time: f64,
        cfg: &StrcConfig,
    ) -> bool {
        if current_abs_stream_time < cfg.min_initial_context_time {
            return false;
        }

        let owned: Vec<Word> = finalized_words.iter().map(|w| (*w).clone()).collect();
        let candidate = match cfg.cursor_behavior_mode {
            CursorMode::SentenceBased => {
                let endings = detector.detect_endings(&owned);
                if endings.len() >= 2 {
                    Some(owned[endings[endings.len() - 2]].end)
                } else {
                    None
                }
            }
            CursorMode::LastFinalized => owned.last().map(|w| w.end),
        };

        let candidate = match candidate {
            Some(c) => c.max(self.last_hint),
            None => self.last_hint,
        };

        if candidate > self.cursor_time {
            self.cursor_time = candidate;
            true
        } else {
            false
        }
    }
}
