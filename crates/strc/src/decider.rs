//! Overlap decider (component C): a pure function from an incoming word
//! span and the transcript's overlapping words to a [`Decision`].
//!
//! Builds on a plain longest-common-prefix replace rule, generalized to the
//! confidence- and stability-weighted tail comparison this system needs.

use crate::config::StrcConfig;
use crate::word::{DecoderWord, Word};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    AddNew,
    Keep,
    ReplaceAll,
    PartialReplace(usize),
}

/// An in-place correction to `overlap[overlap_index]` made during the
/// boundary-redundancy step, before classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedundancyUpdate {
    pub overlap_index: usize,
    pub start: f64,
    pub end: f64,
    pub confidence: f64,
}

/// Everything the reconciler needs to apply a decision: the decision
/// itself, the (possibly trimmed) incoming word list, which overlap
/// indices should receive a stability bump, and any redundancy fixup.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub decision: Decision,
    pub incoming: Vec<DecoderWord>,
    pub stability_bump_indices: Vec<usize>,
    pub redundancy_update: Option<RedundancyUpdate>,
}

fn texts_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Looser match used only for boundary-redundancy detection: ignores a
/// trailing sentence-ending punctuation mark, since the same spoken word
/// may gain or lose one across revisions (`"back."` vs `"back"`).
fn texts_approx_match(a: &str, b: &str) -> bool {
    fn normalize(s: &str) -> String {
        s.trim().trim_end_matches(['.', ',', '!', '?', ';', ':']).to_lowercase()
    }
    normalize(a) == normalize(b)
}

fn time_overlap(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> f64 {
    (a_end.min(b_end) - a_start.max(b_start)).max(0.0)
}

/// Longest common prefix by exact (case-insensitive) text equality, used
/// only for the user-lock short-circuit.
fn common_prefix_len_exact(incoming: &[DecoderWord], overlap: &[Word]) -> usize {
    incoming
        .iter()
        .zip(overlap.iter())
        .take_while(|(i, o)| texts_match(&i.text, &o.text))
        .count()
}

/// Longest common prefix by approximate (punctuation-tolerant) text
/// equality, used for the main agreement-length computation.
fn common_prefix_len(incoming: &[DecoderWord], overlap: &[Word]) -> usize {
    incoming
        .iter()
        .zip(overlap.iter())
        .take_while(|(i, o)| texts_approx_match(&i.text, &o.text))
        .count()
}

/// Rule 4.C.6: confidence/stability tail comparison. Returns whether the
/// tail should be replaced.
fn tail_should_replace(
    incoming_tail: &[DecoderWord],
    overlap_tail: &[Word],
    current_seq: u64,
    cfg: &StrcConfig,
) -> bool {
    if incoming_tail.is_empty() {
        return false;
    }
    if overlap_tail.is_empty() {
        return true;
    }

    let n_in = incoming_tail.len();
    let n_ex = overlap_tail.len();
    let c_in = incoming_tail.iter().map(|w| w.confidence).sum::<f64>() / n_in as f64;
    let c_ex = overlap_tail.iter().map(|w| w.confidence).sum::<f64>() / n_ex as f64;
    let stab_min = overlap_tail.iter().map(|w| w.stability_counter).min().unwrap_or(0);
    let seq_max = overlap_tail.iter().map(|w| w.last_modified_sequence).max().unwrap_or(0);
    let recent = seq_max >= current_seq.saturating_sub(1);

    let bias = cfg.confidence_bias * if recent { 1.1 } else { 1.0 };

    let prelim = if c_in > c_ex * bias {
        true
    } else if (c_in - c_ex).abs() <= (bias - 1.0) * c_ex {
        if stab_min >= cfg.stability_threshold && !recent {
            false
        } else {
            let score_in = c_in + cfg.length_bias_factor * n_in as f64;
            let score_ex = c_ex + cfg.length_bias_factor * n_ex as f64;
            score_in > score_ex
        }
    } else if c_in < c_ex {
        !(stab_min >= 1 && !recent)
    } else {
        true
    };

    if !prelim {
        return false;
    }

    // Veto: a strongly-agreed-upon existing word beats a weaker, different
    // incoming word even when the aggregate comparison favored replacement.
    let m = 3.min(n_in).min(n_ex);
    for i in 0..m {
        let ex = &overlap_tail[i];
        let inc = &incoming_tail[i];
        if !texts_match(&ex.text, &inc.text)
            && ex.stability_counter >= cfg.stability_threshold_for_veto
            && ex.confidence > inc.confidence + cfg.word_min_confidence_superiority_for_veto
        {
            return false;
        }
    }
    true
}

/// Drops `incoming[0]` if it punctuation-tolerantly duplicates `prev`, a
/// word immediately preceding the decidable overlap range that is itself
/// finalized and therefore outside `decide`'s view (`decide` never sees a
/// finalized prefix — see `Session::merge`). Mirrors the step-4
/// boundary-redundancy text check without the confidence-driven
/// `RedundancyUpdate`, since a finalized word's timing/confidence can never
/// be touched.
pub fn trim_finalized_boundary_duplicate(prev: &Word, incoming: &mut Vec<DecoderWord>, cfg: &StrcConfig) {
    let Some(next) = incoming.first() else { return };
    let overlap_seconds = time_overlap(prev.start, prev.end, next.start, next.end);
    if texts_approx_match(&prev.text, &next.text) && overlap_seconds >= cfg.min_overlap_duration_for_redundancy {
        incoming.remove(0);
    }
}

pub fn decide(
    incoming: &[DecoderWord],
    overlap: &[Word],
    current_seq: u64,
    cfg: &StrcConfig,
) -> Verdict {
    // 1. User lock short-circuit.
    if overlap.iter().any(|w| w.locked_by_user) {
        let k = common_prefix_len_exact(incoming, overlap);
        let stability_bump_indices = (0..k).filter(|&i| !overlap[i].locked_by_user).collect();
        return Verdict {
            decision: Decision::Keep,
            incoming: incoming.to_vec(),
            stability_bump_indices,
            redundancy_update: None,
        };
    }

    // 2. Empty overlap -> AddNew (only reachable if caller passes an empty
    // overlap slice; find_overlap never returns an empty range).
    if overlap.is_empty() {
        return Verdict {
            decision: Decision::AddNew,
            incoming: incoming.to_vec(),
            stability_bump_indices: Vec::new(),
            redundancy_update: None,
        };
    }

    // 3. Agreement length.
    let k = common_prefix_len(incoming, overlap);

    let mut incoming = incoming.to_vec();
    let mut redundancy_update = None;

    // 4. Boundary redundancy.
    if k > 0 && k < incoming.len() {
        let prev = &overlap[k - 1];
        let next = &incoming[k];
        let overlap_seconds = time_overlap(prev.start, prev.end, next.start, next.end);
        if texts_approx_match(&prev.text, &next.text)
            && overlap_seconds >= cfg.min_overlap_duration_for_redundancy
        {
            if next.confidence > prev.confidence + cfg.word_confidence_replace_threshold {
                redundancy_update = Some(RedundancyUpdate {
                    overlap_index: k - 1,
                    start: next.start,
                    end: next.end,
                    confidence: next.confidence,
                });
            }
            incoming.remove(k);
        }
    }

    // 5. Classification.
    let decision = if k >= incoming.len() {
        Decision::Keep
    } else if k > 0 && k >= overlap.len() {
        Decision::PartialReplace(k)
    } else {
        let replace = tail_should_replace(&incoming[k..], &overlap[k..], current_seq, cfg);
        if replace {
            if k == 0 {
                Decision::ReplaceAll
            } else {
                Decision::PartialReplace(k)
            }
        } else {
            Decision::Keep
        }
    };

    Verdict {
        decision,
        incoming,
        stability_bump_indices: (0..k).collect(),
        redundancy_update,
    }
}
