//! Token DP aligner (component K): a time-aware Needleman–Wunsch alignment
//! over decoder diagnostic tokens. Diagnostic only today — the alignment
//! matrix is computed and discarded, kept for a future splicing use that
//! is currently out of scope.
//!
//! Uses the same bounded-retention-window shape as the rest of the
//! pipeline's rolling buffers, applied here to a token alignment matrix
//! instead of PCM.

use crate::word::Token;

const MATCH_TIME_TOLERANCE_SECONDS: f64 = 1.5;
const MATCH_TIME_SKEW_SECONDS: f64 = 0.2;
const GAP_PENALTY: f64 = 1.0;
const TAIL_RETENTION_SECONDS: f64 = 10.0;

fn match_score(a: &Token, b: &Token) -> Option<f64> {
    if a.token != b.token {
        return None;
    }
    if (a.start - b.start).abs() > MATCH_TIME_TOLERANCE_SECONDS {
        return None;
    }
    if b.start < a.start - MATCH_TIME_SKEW_SECONDS {
        return None;
    }
    Some(2.0 + 0.5 * ((a.confidence + b.confidence) / 2.0))
}

/// Result of aligning a stored tail against an incoming token run.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub score: f64,
    /// `(Some(a_idx), Some(b_idx))` for a match/substitution, `(Some, None)`
    /// for a deletion from the tail, `(None, Some)` for an insertion from
    /// the incoming run.
    pub ops: Vec<(Option<usize>, Option<usize>)>,
}

pub struct TokenAligner {
    tail: Vec<Token>,
}

impl TokenAligner {
    pub fn new() -> Self {
        Self { tail: Vec::new() }
    }

    pub fn tail(&self) -> &[Token] {
        &self.tail
    }

    /// Aligns `incoming` against the current tail with Needleman–Wunsch,
    /// then replaces the tail with `incoming` trimmed to the last
    /// [`TAIL_RETENTION_SECONDS`].
    pub fn align(&mut self, incoming: &[Token]) -> Alignment {
        let a = &self.tail;
        let b = incoming;
        let (n, m) = (a.len(), b.len());

        let mut dp = vec![vec![0.0f64; m + 1]; n + 1];
        for i in 1..=n {
            dp[i][0] = dp[i - 1][0] - GAP_PENALTY;
        }
        for j in 1..=m {
            dp[0][j] = dp[0][j - 1] - GAP_PENALTY;
        }
        for i in 1..=n {
            for j in 1..=m {
                let sub = dp[i - 1][j - 1]
                    + match_score(&a[i - 1], &b[j - 1]).unwrap_or(-GAP_PENALTY);
                let del = dp[i - 1][j] - GAP_PENALTY;
                let ins = dp[i][j - 1] - GAP_PENALTY;
                dp[i][j] = sub.max(del).max(ins);
            }
        }

        let mut ops = Vec::new();
        let (mut i, mut j) = (n, m);
        while i > 0 || j > 0 {
            if i > 0
                && j > 0
                && dp[i][j]
                    == dp[i - 1][j - 1] + match_score(&a[i - 1], &b[j - 1]).unwrap_or(-GAP_PENALTY)
            {
                ops.push((Some(i - 1), Some(j - 1)));
                i -= 1;
                j -= 1;
            } else if i > 0 && dp[i][j] == dp[i - 1][j] - GAP_PENALTY {
                ops.push((Some(i - 1), None));
                i -= 1;
            } else {
                ops.push((None, Some(j - 1)));
                j -= 1;
            }
        }
        ops.reverse();

        let score = dp[n][m];

        self.tail = b.to_vec();
        if let Some(latest_end) = self.tail.iter().map(|t| t.end).fold(None, |acc, e| {
            Some(acc.map_or(e, |a: f64| a.max(e)))
        }) {
            let cutoff = latest_end - TAIL_RETENTION_SECONDS;
            self.tail.retain(|t| t.end >= cutoff);
        }

        Alignment { score, ops }
    }
}

impl Default for TokenAligner {
    fn default() -> Self {
        Self::new()
    }
}
