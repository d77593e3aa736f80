//! Finalizer (component F): promotes words to `finalized` via cursor
//! crossing, age, or stability rules.
//!
//! Generalizes a single seen-count promotion policy into the three
//! independent promotion rules this system composes.

use crate::config::StrcConfig;
use crate::store::TranscriptStore;

const CURSOR_FINALIZATION_MARGIN_SECONDS: f64 = 0.1;

/// Sweeps the transcript, finalizing every word whose cursor/age/stability
/// rule fires. Returns the number of words newly finalized. Idempotent:
/// running twice in a row with the same arguments finalizes nothing new the
/// second time.
pub fn sweep(
    store: &mut TranscriptStore,
    mature_cursor_time: f64,
    latest_segment_end: f64,
    current_sequence: u64,
    cfg: &StrcConfig,
) -> usize {
    let mut newly_finalized = 0;
    for word in store.words_mut() {
        if word.finalized {
            continue;
        }

        let cursor_rule = mature_cursor_time > 0.0
            && word.end < mature_cursor_time - CURSOR_FINALIZATION_MARGIN_SECONDS;
        let age_rule = cfg.use_age_finalization
            && latest_segment_end - word.end >= cfg.finalization_age_threshold;
        let stability_rule = word.stability_counter >= cfg.finalization_stability_threshold
            && word.last_modified_sequence < current_sequence;

        if cursor_rule || age_rule || stability_rule {
            word.finalized = true;
            newly_finalized += 1;
        }
    }
    newly_finalized
}
