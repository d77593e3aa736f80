//! Reconciler (component D): turns a [`Verdict`](crate::decider::Verdict)
//! into mutations on the [`TranscriptStore`], preserving history and
//! bumping stability counters.
//!
//! Covers replace-all and partial-replace alongside keep, prepending
//! history on every path that displaces a live word.

use crate::decider::{Decision, Verdict};
use crate::store::TranscriptStore;
use crate::word::{DecoderWord, Word};

/// Net effect of applying one verdict, for stats bookkeeping.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ApplyEffect {
    pub added: usize,
    pub replaced: usize,
    pub kept_stable: usize,
}

fn build_words(
    incoming: Vec<DecoderWord>,
    current_seq: u64,
    source_segment_id: &str,
    id_gen: &mut dyn crate::word::IdGenerator,
) -> Vec<Word> {
    incoming
        .into_iter()
        .map(|raw| Word::new(id_gen.next_id(), raw, current_seq, source_segment_id.to_string()))
        .collect()
}

/// Applies `verdict` to `store[base..]`-relative indices, where `base` is
/// the start of the overlap range the verdict was computed against (or
/// `store.len()` / irrelevant for a fresh [`Decision::AddNew`] with no
/// overlap at all — callers pass `base = insertion point` and an empty
/// `overlap_len` in that case).
pub fn apply(
    store: &mut TranscriptStore,
    base: usize,
    overlap_len: usize,
    verdict: Verdict,
    current_seq: u64,
    source_segment_id: &str,
    id_gen: &mut dyn crate::word::IdGenerator,
) -> ApplyEffect {
    if let Some(update) = verdict.redundancy_update {
        let idx = base + update.overlap_index;
        let w = &mut store.words_mut()[idx];
        w.start = update.start;
        w.end = update.end;
        w.confidence = update.confidence;
        w.last_modified_sequence = current_seq;
    }

    let mut effect = ApplyEffect::default();

    match verdict.decision {
        Decision::AddNew => {
            let words = build_words(verdict.incoming, current_seq, source_segment_id, id_gen);
            effect.added = words.len();
            store.insert_sorted(words, Some(base));
        }
        Decision::Keep => {
            for &idx in &verdict.stability_bump_indices {
                let w = &mut store.words_mut()[base + idx];
                if w.last_modified_sequence != current_seq {
                    w.stability_counter += 1;
                }
                w.last_modified_sequence = current_seq;
            }
            effect.kept_stable = verdict.stability_bump_indices.len();

            let bumped: std::collections::HashSet<usize> =
                verdict.stability_bump_indices.iter().copied().collect();
            for idx in 0..overlap_len {
                if !bumped.contains(&idx) {
                    store.words_mut()[base + idx].last_modified_sequence = current_seq;
                }
            }
        }
        Decision::ReplaceAll => {
            let removed = store.splice(base..base + overlap_len, Vec::new());
            let history: Vec<_> = removed.iter().map(Word::to_history_entry).collect();
            let mut new_words =
                build_words(verdict.incoming, current_seq, source_segment_id, id_gen);
            if let Some(first) = new_words.first_mut() {
                let mut combined = history;
                combined.append(&mut first.history);
                first.history = combined;
            }
            effect.replaced = removed.len();
            store.insert_sorted(new_words, Some(base));
        }
        Decision::PartialReplace(k) => {
            debug_assert!(
                k > 0 && k <= overlap_len,
                "PartialReplace(k={k}) out of range for overlap_len={overlap_len}"
            );
            for &idx in &verdict.stability_bump_indices {
                let w = &mut store.words_mut()[base + idx];
                if w.last_modified_sequence != current_seq {
                    w.stability_counter += 1;
                }
                w.last_modified_sequence = current_seq;
            }
            effect.kept_stable = verdict.stability_bump_indices.len();

            let removed = store.splice(base + k..base + overlap_len, Vec::new());
            let history: Vec<_> = removed.iter().map(Word::to_history_entry).collect();
            let mut new_words = build_words(
                verdict.incoming[k..].to_vec(),
                current_seq,
                source_segment_id,
                id_gen,
            );
            if let Some(first) = new_words.first_mut() {
                let mut combined = history;
                combined.append(&mut first.history);
                first.history = combined;
            }
            effect.replaced = removed.len();
            store.insert_sorted(new_words, Some(base + k));
        }
    }

    effect
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decider::decide;
    use crate::word::{DecoderWord, SequentialIdGen};

    #[test]
    fn replace_all_prepends_history_to_successor() {
        let mut store = TranscriptStore::new();
        let mut id_gen = SequentialIdGen::new();
        store.insert_sorted(
            vec![Word::new("orig".into(), DecoderWord { text: "teh".into(), start: 0.0, end: 0.3, confidence: 0.5 }, 1, "s1".into())],
            None,
        );
        let incoming = vec![DecoderWord { text: "the".into(), start: 0.0, end: 0.3, confidence: 0.95 }];
        let (base, j) = store.find_overlap(0.0, 0.3).unwrap();
        let verdict = decide(&incoming, &store.words()[base..j], 2, &crate::config::StrcConfig::default());
        assert_eq!(verdict.decision, Decision::ReplaceAll);
        let effect = apply(&mut store, base, j - base, verdict, 2, "s2", &mut id_gen);
        assert_eq!(effect.replaced, 1);
        assert_eq!(store.words().len(), 1);
        assert_eq!(store.words()[0].text, "the");
        assert_eq!(store.words()[0].history.len(), 1);
        assert_eq!(store.words()[0].history[0].text, "teh");
    }
}
