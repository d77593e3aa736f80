//! Post-merge cleaner (component E): collapses consecutive duplicates and
//! suppresses short phrase repetitions left behind by reconciliation.
//!
//! Runs as a transcript-wide cleanup pass after accumulation, the same
//! shape as the rest of this pipeline's post-processing stages, specialized
//! here to the two concrete passes this system needs rather than a
//! pluggable pipeline.

use crate::store::TranscriptStore;

const DUPLICATE_GAP_SECONDS: f64 = 2.0;
const PHRASE_REPEAT_TAIL_WORDS: usize = 80;
const PHRASE_REPEAT_MAX_SPAN_SECONDS: f64 = 6.0;
const PHRASE_REPEAT_MIN_LEN: usize = 3;
const PHRASE_REPEAT_MAX_LEN: usize = 8;

fn texts_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// `true` if `keep` should survive over `drop_candidate` (reverse: picks the
/// loser to remove). Finalized words always win; otherwise higher
/// confidence wins; ties keep the earlier occurrence.
fn pick_loser(a: usize, b: usize, store: &TranscriptStore) -> usize {
    let wa = &store.words()[a];
    let wb = &store.words()[b];
    if wa.finalized != wb.finalized {
        return if wa.finalized { b } else { a };
    }
    if wa.confidence != wb.confidence {
        return if wa.confidence >= wb.confidence { b } else { a };
    }
    b
}

/// Collapses immediately-adjacent duplicate words within `DUPLICATE_GAP_SECONDS`.
fn collapse_consecutive_duplicates(store: &mut TranscriptStore) {
    loop {
        let words = store.words();
        let mut found = None;
        for i in 0..words.len().saturating_sub(1) {
            let (a, b) = (&words[i], &words[i + 1]);
            let gap = b.start - a.end;
            if texts_match(&a.text, &b.text)
                && gap >= 0.0
                && gap <= DUPLICATE_GAP_SECONDS
                && !(a.finalized && b.finalized)
            {
                found = Some(i);
                break;
            }
        }
        let Some(i) = found else { break };
        let loser = pick_loser(i, i + 1, store);
        store.splice(loser..loser + 1, Vec::new());
    }
}

/// Suppresses at most one `A A` phrase repetition in the last
/// `PHRASE_REPEAT_TAIL_WORDS` words, preferring the shortest repeated unit.
fn suppress_phrase_repetition(store: &mut TranscriptStore) {
    let len = store.words().len();
    let tail_start = len.saturating_sub(PHRASE_REPEAT_TAIL_WORDS);

    for l in PHRASE_REPEAT_MIN_LEN..=PHRASE_REPEAT_MAX_LEN {
        if len < tail_start + 2 * l {
            continue;
        }
        let block1 = &store.words()[len - 2 * l..len - l];
        let block2 = &store.words()[len - l..len];
        let matches = block1.iter().zip(block2.iter()).all(|(a, b)| texts_match(&a.text, &b.text));
        if !matches {
            continue;
        }
        let span = block2.last().unwrap().end - block1.first().unwrap().start;
        if span > PHRASE_REPEAT_MAX_SPAN_SECONDS {
            continue;
        }

        let first_base = len - 2 * l;
        let second_base = len - l;
        let any_second_finalized = block2.iter().any(|w| w.finalized);
        let any_first_finalized = block1.iter().any(|w| w.finalized);
        if any_first_finalized && any_second_finalized {
            // No removal preserves the finalized-word count here; leave
            // the repetition alone rather than violate that invariant.
            continue;
        }
        let remove_range = if any_first_finalized && !any_second_finalized {
            second_base..len
        } else if any_second_finalized && !any_first_finalized {
            first_base..second_base
        } else {
            let conf1: f64 = block1.iter().map(|w| w.confidence).sum();
            let conf2: f64 = block2.iter().map(|w| w.confidence).sum();
            if conf1 >= conf2 {
                second_base..len
            } else {
                first_base..second_base
            }
        };
        store.splice(remove_range, Vec::new());
        return;
    }
}

/// Runs the full post-merge cleaning pass. Never reduces the count of
/// finalized words and never reorders the transcript.
pub fn clean(store: &mut TranscriptStore) {
    collapse_consecutive_duplicates(store);
    suppress_phrase_repetition(store);
}
