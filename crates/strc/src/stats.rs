//! Session statistics (component M): cumulative merge counters plus
//! rolling and overall words-per-minute.

use crate::config::StrcConfig;
use crate::word::Word;

#[derive(Debug, Default, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct SessionStats {
    pub total_segments_processed: u64,
    pub total_words_processed: u64,
    pub words_added: u64,
    pub words_replaced: u64,
    pub words_kept_stable: u64,
    pub words_finalized: u64,
    pub wpm_overall: f64,
    pub wpm_rolling: f64,
}

impl SessionStats {
    /// Recomputes `wpm_overall` and `wpm_rolling` from the current
    /// transcript; the cumulative counters are updated by the session as
    /// it applies each merge.
    pub fn refresh_wpm(&mut self, words: &[Word], cfg: &StrcConfig) {
        self.wpm_overall = overall_wpm(words);
        self.wpm_rolling = rolling_wpm(words, cfg.wpm_calculation_window_seconds);
    }
}

/// Overall WPM: all words divided by `(last.end - first.start)` in
/// minutes, floored at a 0.05s duration. Fewer than 2 words reports 0.
pub fn overall_wpm(words: &[Word]) -> f64 {
    if words.len() < 2 {
        return 0.0;
    }
    let first = words.first().unwrap();
    let last = words.last().unwrap();
    let duration = (last.end - first.start).max(0.05);
    words.len() as f64 / (duration / 60.0)
}

/// Rolling WPM: count of words whose `end ∈ (latest_end - W, latest_end]`
/// divided by `W/60`, ramping up to use total elapsed speech while it is
/// shorter than `W`.
pub fn rolling_wpm(words: &[Word], window_seconds: f64) -> f64 {
    let Some(latest_end) =
        words.iter().map(|w| w.end).fold(None, |acc, e| Some(acc.map_or(e, |a: f64| a.max(e))))
    else {
        return 0.0;
    };
    let first_start = words.iter().map(|w| w.start).fold(f64::INFINITY, f64::min);
    let elapsed = (latest_end - first_start).max(0.05);
    let effective_window = elapsed.min(window_seconds);

    let count = words
        .iter()
        .filter(|w| w.end > latest_end - effective_window && w.end <= latest_end)
        .count();

    let minutes = effective_window / 60.0;
    if minutes <= 0.0 {
        0.0
    } else {
        count as f64 / minutes
    }
}
