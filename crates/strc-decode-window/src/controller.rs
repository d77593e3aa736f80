//! Decode window controller (component J): picks the next decode window,
//! drives the external decoder, shifts its output into absolute time, and
//! feeds the result through the reconciliation core.
//!
//! Modeled as an explicit state machine, `Idle -> Decoding -> Reconciling ->
//! Idle`, with `PatchDecoding` reachable only from `Idle`. No actor
//! framework here: there is no supervision tree to model, just one
//! in-flight decode at a time, so a plain async state machine plus
//! `tracing` spans carries the same single-flight guarantee with far less
//! machinery.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, info, warn};

use strc::{DecoderResult, MergeOutcome, Session, Token};

use crate::buffer::StitchedAudioBuffer;
use crate::error::DecodeError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One decoded segment, in window-relative time, handed back by the
/// external decoder this crate does not implement.
#[derive(Debug, Clone, Default)]
pub struct DecodedSegment {
    pub words: Vec<strc::DecoderWord>,
    pub tokens: Option<Vec<Token>>,
}

/// The external speech-to-text model. Decoding is assumed to be the
/// expensive, fallible, asynchronous step; everything downstream of it in
/// this crate is synchronous.
pub trait SegmentDecoder: Send {
    fn decode<'a>(
        &'a mut self,
        window: &'a [f32],
        sample_rate: u32,
    ) -> BoxFuture<'a, Result<DecodedSegment, DecodeError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Decoding,
    Reconciling,
    PatchDecoding,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodeWindowConfig {
    pub lc_seconds: f64,
    pub lc_min: f64,
    pub lc_max: f64,
    pub right_window_seconds: f64,
    pub min_decode_seconds: f64,
    pub initial_base_seconds: f64,
    pub window_clamp: f64,
    pub trim_margin: f64,
    pub drop_first_boundary_word: bool,
    pub lc_inc_step: f64,
    pub lc_dec_step: f64,
    pub lc_decay_stable_ticks: u32,
    pub patch_decode_enabled: bool,
    pub patch_cooldown_ms: u64,
    pub patch_left_seconds: f64,
    pub patch_right_seconds: f64,
}

impl Default for DecodeWindowConfig {
    fn default() -> Self {
        Self {
            lc_seconds: 0.8,
            lc_min: 0.8,
            lc_max: 2.4,
            right_window_seconds: 1.6,
            min_decode_seconds: 0.8,
            initial_base_seconds: 4.0,
            window_clamp: 30.0,
            trim_margin: 0.05,
            drop_first_boundary_word: true,
            lc_inc_step: 0.2,
            lc_dec_step: 0.2,
            lc_decay_stable_ticks: 3,
            patch_decode_enabled: true,
            patch_cooldown_ms: 750,
            patch_left_seconds: 1.0,
            patch_right_seconds: 1.2,
        }
    }
}

fn select_window(
    bootstrap: bool,
    stream_end: f64,
    cursor: f64,
    lc_seconds: f64,
    latest_chunk_end: f64,
    cfg: &DecodeWindowConfig,
) -> (f64, f64) {
    let (mut start, mut end) = if bootstrap {
        ((stream_end - cfg.initial_base_seconds).max(0.0), stream_end)
    } else {
        let start = cursor - lc_seconds;
        let end = latest_chunk_end.max(cursor + cfg.right_window_seconds);
        (start, end)
    };

    start = start.max(0.0);
    end = end.min(stream_end).max(start);

    if end - start < cfg.min_decode_seconds {
        end = (start + cfg.min_decode_seconds).min(stream_end);
    }
    if end - start > cfg.window_clamp {
        start = end - cfg.window_clamp;
    }
    (start, end)
}

fn shift(words: Vec<strc::DecoderWord>, by: f64) -> Vec<strc::DecoderWord> {
    words
        .into_iter()
        .map(|mut w| {
            w.start += by;
            w.end += by;
            w
        })
        .collect()
}

fn shift_tokens(tokens: Vec<Token>, by: f64) -> Vec<Token> {
    tokens
        .into_iter()
        .map(|mut t| {
            t.start += by;
            t.end += by;
            t
        })
        .collect()
}

/// Drops words fully at or before `cursor + trim_margin`, then (unless
/// bootstrapping) drops the first surviving word if it's a restated
/// boundary word from the previous window.
fn trim(
    mut words: Vec<strc::DecoderWord>,
    cursor: f64,
    window_start_abs: f64,
    bootstrap: bool,
    cfg: &DecodeWindowConfig,
) -> Vec<strc::DecoderWord> {
    let floor = cursor + cfg.trim_margin;
    words.retain(|w| w.end > floor);

    if cfg.drop_first_boundary_word && !bootstrap {
        if let Some(first) = words.first() {
            let is_boundary_echo =
                (first.start - window_start_abs).abs() <= 0.05 || first.start <= floor;
            if is_boundary_echo {
                words.remove(0);
            }
        }
    }
    words
}

pub struct DecodeWindowController {
    state: ControllerState,
    cfg: DecodeWindowConfig,
    lc_seconds: f64,
    stable_ticks: u32,
    last_patch_ms: Option<u64>,
    sequence_counter: u64,
    prev_words_added: u64,
    prev_words_replaced: u64,
}

impl DecodeWindowController {
    pub fn new(cfg: DecodeWindowConfig) -> Self {
        let lc_seconds = cfg.lc_seconds;
        Self {
            state: ControllerState::Idle,
            cfg,
            lc_seconds,
            stable_ticks: 0,
            last_patch_ms: None,
            sequence_counter: 0,
            prev_words_added: 0,
            prev_words_replaced: 0,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn current_lc_seconds(&self) -> f64 {
        self.lc_seconds
    }

    fn adapt_lc(&mut self, stats: &strc::SessionStats) {
        let delta_replaced = stats.words_replaced.saturating_sub(self.prev_words_replaced);
        let delta_added = stats.words_added.saturating_sub(self.prev_words_added);
        let churn = delta_replaced as f64 / (delta_added + 1) as f64;

        if churn > 0.25 {
            self.lc_seconds = (self.lc_seconds + self.cfg.lc_inc_step).min(self.cfg.lc_max);
            self.stable_ticks = 0;
        } else {
            self.stable_ticks += 1;
            if self.stable_ticks % self.cfg.lc_decay_stable_ticks == 0 {
                self.lc_seconds = (self.lc_seconds - self.cfg.lc_dec_step).max(self.cfg.lc_min);
            }
        }

        self.prev_words_added = stats.words_added;
        self.prev_words_replaced = stats.words_replaced;
    }

    /// Runs one decode/reconcile cycle. Returns `Ok(None)` if a decode is
    /// already in flight (ticks coalesce) or the stream has nothing new.
    pub async fn tick(
        &mut self,
        buffer: &StitchedAudioBuffer,
        session: &mut Session,
        decoder: &mut dyn SegmentDecoder,
        latest_chunk_end: f64,
    ) -> Result<Option<MergeOutcome>, DecodeError> {
        if self.state != ControllerState::Idle {
            debug!("decode tick coalesced, controller busy");
            return Ok(None);
        }

        let cursor = session.mature_cursor_time();
        let stream_end = buffer.stream_end_abs();
        let bootstrap = cursor == 0.0;
        let (window_start, window_end) =
            select_window(bootstrap, stream_end, cursor, self.lc_seconds, latest_chunk_end, &self.cfg);

        if window_end <= window_start {
            return Ok(None);
        }

        self.state = ControllerState::Decoding;
        let samples = buffer.read(window_start, window_end);
        let decoded = match decoder.decode(samples, buffer.sample_rate()).await {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "decode tick failed, buffer retained for retry");
                self.state = ControllerState::Idle;
                return Err(e);
            }
        };

        self.state = ControllerState::Reconciling;
        let words = shift(decoded.words, window_start);
        let words = trim(words, cursor, window_start, bootstrap, &self.cfg);
        let tokens = decoded.tokens.map(|t| shift_tokens(t, window_start));

        self.sequence_counter += 1;
        let outcome = match session.merge(DecoderResult {
            sequence_num: self.sequence_counter,
            session_id: String::new(),
            words,
            tokens,
            utterance_text: None,
            is_final: None,
            metrics: None,
        }) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.state = ControllerState::Idle;
                return Err(e.into());
            }
        };

        self.adapt_lc(&outcome.stats);
        self.state = ControllerState::Idle;
        info!(lc = self.lc_seconds, window_start, window_end, "decode tick complete");
        Ok(Some(outcome))
    }

    /// Performs an additional, narrow decode centered on the cursor if
    /// patch decoding is enabled, idle, and past its cooldown.
    pub async fn maybe_patch_decode(
        &mut self,
        buffer: &StitchedAudioBuffer,
        session: &mut Session,
        decoder: &mut dyn SegmentDecoder,
        now_ms: u64,
    ) -> Result<Option<MergeOutcome>, DecodeError> {
        if !self.cfg.patch_decode_enabled || self.state != ControllerState::Idle {
            return Ok(None);
        }
        if let Some(last) = self.last_patch_ms {
            if now_ms.saturating_sub(last) < self.cfg.patch_cooldown_ms {
                return Ok(None);
            }
        }

        let cursor = session.mature_cursor_time();
        let start = (cursor - self.cfg.patch_left_seconds).max(0.0);
        let end = (cursor + self.cfg.patch_right_seconds).min(buffer.stream_end_abs());
        if end <= start {
            return Ok(None);
        }

        self.state = ControllerState::PatchDecoding;
        let samples = buffer.read(start, end);
        let decoded = match decoder.decode(samples, buffer.sample_rate()).await {
            Ok(d) => d,
            Err(e) => {
                self.state = ControllerState::Idle;
                return Err(e);
            }
        };

        let words = shift(decoded.words, start);
        let tokens = decoded.tokens.map(|t| shift_tokens(t, start));
        self.sequence_counter += 1;
        let outcome = match session.merge(DecoderResult {
            sequence_num: self.sequence_counter,
            session_id: String::new(),
            words,
            tokens,
            utterance_text: None,
            is_final: None,
            metrics: None,
        }) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.state = ControllerState::Idle;
                return Err(e.into());
            }
        };

        self.last_patch_ms = Some(now_ms);
        self.state = ControllerState::Idle;
        Ok(Some(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_window_uses_initial_base() {
        let cfg = DecodeWindowConfig::default();
        let (start, end) = select_window(true, 10.0, 0.0, cfg.lc_seconds, 10.0, &cfg);
        assert_eq!(start, 6.0);
        assert_eq!(end, 10.0);
    }

    #[test]
    fn steady_window_floors_to_min_decode_seconds() {
        let cfg = DecodeWindowConfig::default();
        let (start, end) = select_window(false, 20.0, 5.0, 0.8, 5.0, &cfg);
        assert!(end - start >= cfg.min_decode_seconds);
    }

    #[test]
    fn window_never_exceeds_clamp() {
        let cfg = DecodeWindowConfig::default();
        let (start, end) = select_window(false, 1000.0, 500.0, 0.8, 900.0, &cfg);
        assert!(end - start <= cfg.window_clamp + 1e-9);
    }

    #[test]
    fn trim_drops_words_at_or_before_cursor() {
        let cfg = DecodeWindowConfig::default();
        let words = vec![
            strc::DecoderWord { text: "old".into(), start: 0.0, end: 1.0, confidence: 0.9 },
            strc::DecoderWord { text: "new".into(), start: 1.2, end: 1.5, confidence: 0.9 },
        ];
        let trimmed = trim(words, 1.0, 0.0, true, &cfg);
        assert_eq!(trimmed.len(), 1);
        assert_eq!(trimmed[0].text, "new");
    }
}
