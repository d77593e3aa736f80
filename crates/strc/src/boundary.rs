//! Sentence boundary detector (component H): identifies which finalized
//! words end a sentence, so the mature-cursor engine knows where it is
//! safe to stop revising.
//!
//! The interface is polymorphic over the capability set
//! `{detect_endings, reset}`; [`HeuristicBoundaryDetector`] is the crate's
//! built-in implementation (trailing `.?!` with an abbreviation
//! suppression list). An NLP-backed implementation can be swapped in by
//! the embedder without touching the cursor engine.
//!
//! Shaped as a small, swappable, stateful decision interface, the same
//! pattern used elsewhere in this pipeline for stateful policy decisions.

use crate::word::Word;

/// Abbreviations whose trailing `.` must not be read as a sentence end.
const ABBREVIATIONS: &[&str] = &["mr.", "mrs.", "ms.", "dr.", "vs.", "etc.", "jr.", "sr.", "st."];

pub trait SentenceBoundaryDetector: Send {
    /// Returns the indices (into `words`) of words that end a sentence.
    /// Contract: calling with a shorter `words` slice than the previous
    /// call must behave as if [`reset`](Self::reset) were called first.
    fn detect_endings(&mut self, words: &[Word]) -> Vec<usize>;

    fn reset(&mut self);
}

fn is_abbreviation(word: &str) -> bool {
    let lower = word.trim().to_lowercase();
    if ABBREVIATIONS.contains(&lower.as_str()) {
        return true;
    }
    // Single capital letter followed by a period, e.g. an initial: "J."
    let trimmed = word.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(c), Some('.'), None) => c.is_uppercase(),
        _ => false,
    }
}

fn is_sentence_end(text: &str) -> bool {
    let trimmed = text.trim();
    let Some(last) = trimmed.chars().last() else {
        return false;
    };
    if !matches!(last, '.' | '?' | '!') {
        return false;
    }
    if last == '.' && is_abbreviation(trimmed) {
        return false;
    }
    true
}

/// Heuristic default implementation: regex-free trailing-punctuation scan
/// with incremental prefix-diffing so repeated calls over a
/// mostly-unchanged transcript don't rescan from the start.
pub struct HeuristicBoundaryDetector {
    max_retained_sentences: usize,
    snapshot_texts: Vec<String>,
    endings: Vec<usize>,
}

impl HeuristicBoundaryDetector {
    pub fn new(max_retained_sentences: usize) -> Self {
        Self {
            max_retained_sentences,
            snapshot_texts: Vec::new(),
            endings: Vec::new(),
        }
    }

    fn divergence_point(&self, words: &[Word]) -> usize {
        self.snapshot_texts
            .iter()
            .zip(words.iter())
            .take_while(|(prev, w)| prev.as_str() == w.text)
            .count()
    }

    /// How far back of `divergence` is "safe context": at least 15 words,
    /// or the start of the 8th-from-last sentence before the divergence,
    /// whichever reaches further back.
    fn safe_recompute_start(&self, divergence: usize) -> usize {
        let by_words = divergence.saturating_sub(15);
        let prior_endings: Vec<usize> =
            self.endings.iter().copied().filter(|&e| e < divergence).collect();
        let by_sentences = if prior_endings.len() >= 8 {
            prior_endings[prior_endings.len() - 8] + 1
        } else {
            0
        };
        by_words.min(by_sentences)
    }
}

impl SentenceBoundaryDetector for HeuristicBoundaryDetector {
    fn detect_endings(&mut self, words: &[Word]) -> Vec<usize> {
        if words.len() < self.snapshot_texts.len() {
            self.reset();
        }

        let divergence = self.divergence_point(words);
        let is_pure_extension = divergence == self.snapshot_texts.len();

        let rescan_start = if is_pure_extension {
            divergence
        } else {
            self.safe_recompute_start(divergence)
        };

        let mut endings: Vec<usize> =
            self.endings.iter().copied().filter(|&e| e < rescan_start).collect();
        for (i, word) in words.iter().enumerate().skip(rescan_start) {
            if is_sentence_end(&word.text) {
                endings.push(i);
            }
        }

        if endings.len() > self.max_retained_sentences {
            let drop = endings.len() - self.max_retained_sentences;
            endings.drain(0..drop);
        }

        self.snapshot_texts = words.iter().map(|w| w.text.clone()).collect();
        self.endings = endings.clone();
        endings
    }

    fn reset(&mut self) {
        self.snapshot_texts.clear();
        self.endings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::DecoderWord;

    fn words(texts: &[&str]) -> Vec<Word> {
        let mut t = 0.0;
        texts
            .iter()
            .map(|text| {
                let w = Word::new(
                    format!("{text}-{t}"),
                    DecoderWord { text: text.to_string(), start: t, end: t + 0.3, confidence: 0.9 },
                    0,
                    "seg".into(),
                );
                t += 0.35;
                w
            })
            .collect()
    }

    #[test]
    fn detects_trailing_punctuation() {
        let mut det = HeuristicBoundaryDetector::new(20);
        let w = words(&["Hello", "world.", "Next", "one."]);
        assert_eq!(det.detect_endings(&w), vec![1, 3]);
    }

    #[test]
    fn suppresses_abbreviations() {
        let mut det = HeuristicBoundaryDetector::new(20);
        let w = words(&["See", "Dr.", "Smith", "now."]);
        assert_eq!(det.detect_endings(&w), vec![3]);
    }

    #[test]
    fn pure_extension_reuses_prior_endings() {
        let mut det = HeuristicBoundaryDetector::new(20);
        let w1 = words(&["First.", "second"]);
        assert_eq!(det.detect_endings(&w1), vec![0]);
        let w2 = words(&["First.", "second", "third."]);
        assert_eq!(det.detect_endings(&w2), vec![0, 2]);
    }

    #[test]
    fn shorter_call_resets() {
        let mut det = HeuristicBoundaryDetector::new(20);
        let w1 = words(&["One.", "Two."]);
        det.detect_endings(&w1);
        let w2 = words(&["Different."]);
        assert_eq!(det.detect_endings(&w2), vec![0]);
    }
}
