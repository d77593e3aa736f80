//! End-to-end scenarios replaying full merge sequences against the public
//! [`Session`] API, plus a handful of property checks over random payload
//! sequences for the invariants that are naturally randomized-input
//! properties rather than fixed examples.

use quickcheck_macros::quickcheck;
use strc::{DecoderResult, DecoderWord, Session, SequentialIdGen, StrcConfig};

fn dw(text: &str, start: f64, end: f64, confidence: f64) -> DecoderWord {
    DecoderWord { text: text.to_string(), start, end, confidence }
}

fn payload(seq: u64, words: Vec<DecoderWord>) -> DecoderResult {
    DecoderResult {
        sequence_num: seq,
        session_id: "sess".into(),
        words,
        tokens: None,
        utterance_text: None,
        is_final: None,
        metrics: None,
    }
}

fn new_session() -> Session {
    Session::new(StrcConfig::default()).with_id_generator(Box::new(SequentialIdGen::new()))
}

fn texts(session: &Session) -> Vec<String> {
    session.snapshot().words.into_iter().map(|w| w.text).collect()
}

/// A. Append, no overlap.
#[test]
fn scenario_a_append_no_overlap() {
    let mut session = new_session();
    session.merge(payload(1, vec![dw("First", 0.1, 0.8, 0.9)])).unwrap();
    let outcome = session.merge(payload(2, vec![dw("Second", 1.1, 1.8, 0.9)])).unwrap();

    assert_eq!(texts(&session), vec!["First", "Second"]);
    assert_eq!(outcome.stats.words_added, 2);
}

/// B. Full agreement: re-merging the same words bumps stability and never
/// replaces.
#[test]
fn scenario_b_full_agreement() {
    let mut session = new_session();
    let words = vec![
        dw("This", 0.1, 0.4, 0.9),
        dw("is", 0.5, 0.7, 0.9),
        dw("a", 0.8, 0.9, 0.9),
        dw("test", 1.0, 1.4, 0.9),
    ];
    session.merge(payload(1, words.clone())).unwrap();

    let resaid = words.into_iter().map(|w| dw(&w.text, w.start, w.end, 0.95)).collect();
    let outcome = session.merge(payload(2, resaid)).unwrap();

    assert_eq!(texts(&session), vec!["This", "is", "a", "test"]);
    assert_eq!(outcome.stats.words_replaced, 0);
    assert!(session.snapshot().words.iter().all(|w| w.stability_counter >= 1));
}

/// C. Partial correction: a low-confidence tail is replaced while the
/// agreed-upon prefix is kept stable, and the replaced word's prior state
/// lands in the successor's history.
#[test]
fn scenario_c_partial_correction() {
    let mut session = new_session();
    session
        .merge(payload(
            1,
            vec![
                dw("Partial", 0.1, 0.6, 0.9),
                dw("agreement", 0.7, 1.3, 0.9),
                dw("old", 1.4, 1.7, 0.8),
            ],
        ))
        .unwrap();
    let outcome = session
        .merge(payload(
            2,
            vec![
                dw("Partial", 0.1, 0.6, 0.95),
                dw("agreement", 0.7, 1.3, 0.95),
                dw("new", 1.45, 1.8, 0.9),
            ],
        ))
        .unwrap();

    assert_eq!(texts(&session), vec!["Partial", "agreement", "new"]);
    assert_eq!(outcome.stats.words_replaced, 1);
    assert_eq!(outcome.stats.words_kept_stable, 2);

    let new_word = session.snapshot().words.into_iter().last().unwrap();
    assert_eq!(new_word.history.len(), 1);
    let prior = &new_word.history[0];
    assert_eq!(prior.text, "old");
    assert_eq!(prior.confidence, 0.8);
    assert_eq!(prior.start, 1.4);
    assert_eq!(prior.end, 1.7);
}

/// D. Stable veto: a single stable, confident word is not displaced by a
/// much lower-confidence competitor, even many sequences later.
#[test]
fn scenario_d_stable_veto() {
    let mut session = new_session();
    session.merge(payload(1, vec![dw("Stable", 0.1, 0.8, 0.9)])).unwrap();
    // Re-merge the same word four more times to build stability_counter up
    // to 5 the way ordinary repeated agreement would.
    for seq in 2..=6 {
        session.merge(payload(seq, vec![dw("Stable", 0.1, 0.8, 0.9)])).unwrap();
    }

    let outcome = session.merge(payload(10, vec![dw("UnstableNew", 0.15, 0.9, 0.7)])).unwrap();

    assert_eq!(texts(&session), vec!["Stable"]);
    assert_eq!(outcome.stats.words_replaced, 0);
}

/// E. Boundary redundancy: a finalized `"back."` must not be duplicated by
/// an incoming `"back"` that merely repeats it across a segment boundary.
#[test]
fn scenario_e_boundary_redundancy() {
    let mut session = new_session();
    session.merge(payload(1, vec![dw("back.", 105.0, 105.3, 0.96)])).unwrap();
    // Merge an unrelated later word so the age rule finalizes "back." before
    // the boundary-redundancy scenario plays out.
    session.merge(payload(2, vec![dw("filler", 200.0, 200.3, 0.9)])).unwrap();
    assert!(session.snapshot().words[0].finalized);

    session
        .merge(payload(
            23,
            vec![
                dw("back", 105.25, 105.5, 0.85),
                dw("The", 105.8, 106.0, 0.99),
                dw("ship", 106.1, 106.4, 0.99),
            ],
        ))
        .unwrap();

    let final_texts = texts(&session);
    assert_eq!(final_texts.iter().filter(|t| t.eq_ignore_ascii_case("back.")).count(), 1);
    let joined = final_texts.join(" ").to_lowercase();
    assert!(!joined.contains("back. back"));
    assert!(joined.contains("the"));
    assert!(joined.contains("ship"));
}

/// F. Cursor advancement & finalization sweep: once two sentences have
/// ended, the cursor lands on the next-to-last ending and everything before
/// it (minus a small margin) finalizes on the same merge.
#[test]
fn scenario_f_cursor_advancement_and_sweep() {
    let mut session = new_session();
    session
        .merge(payload(
            1,
            vec![
                dw("Hello.", 2.7, 3.0, 0.95),
                dw("Again.", 7.5, 7.84, 0.95),
                dw("More", 8.0, 8.3, 0.95),
            ],
        ))
        .unwrap();
    // Age-finalize everything so the cursor has finalized words to walk.
    let outcome = session.merge(payload(2, vec![dw("later", 50.0, 50.3, 0.9)])).unwrap();

    assert_eq!(outcome.mature_cursor_time, 3.0);
    for word in session.snapshot().words {
        if word.end < 3.0 - 0.1 {
            assert!(word.finalized, "{:?} should be finalized after cursor advance", word);
        }
    }
}

/// G. A word can stability-finalize while an earlier, still-unsettled word
/// sits to its left in the transcript. A later overlapping merge spanning
/// both must never let the finalized word's fields move.
#[test]
fn scenario_g_stability_finalized_word_right_of_unfinalized() {
    let mut session = new_session();
    session
        .merge(payload(1, vec![dw("alpha", 0.0, 0.5, 0.6), dw("beta", 1.0, 1.5, 0.9)]))
        .unwrap();
    // Correct "alpha" once; a fresh word starts at stability_counter = 0.
    session.merge(payload(2, vec![dw("alphb", 0.0, 0.5, 0.9)])).unwrap();
    // "beta" agrees twice running, reaching the stability threshold (2)
    // while "alpha" is left behind at stability_counter = 0.
    session.merge(payload(3, vec![dw("beta", 1.0, 1.5, 0.9)])).unwrap();
    session.merge(payload(4, vec![dw("beta", 1.0, 1.5, 0.9)])).unwrap();
    // One more merge untouched by "beta" bumps the sequence number past
    // beta's last_modified_sequence, letting the stability rule fire for
    // beta alone: no sentence-ending punctuation anywhere means the cursor
    // stays at 0.0, so this can only be the stability rule, never the
    // cursor rule.
    session.merge(payload(5, vec![dw("alphb", 0.0, 0.5, 0.9)])).unwrap();

    let snapshot = session.snapshot().words;
    let alpha = snapshot.iter().find(|w| w.text == "alphb").unwrap();
    let beta = snapshot.iter().find(|w| w.text == "beta").unwrap();
    assert!(!alpha.finalized, "alpha should still be revisable");
    assert!(beta.finalized, "beta should have stability-finalized ahead of alpha");

    let beta_before = beta.clone();

    // An overlapping merge spanning both words' time range must not be
    // allowed to splice over the finalized "beta", even though it sits to
    // the right of the still-unfinalized "alpha".
    session
        .merge(payload(6, vec![dw("zzz", 0.0, 0.5, 0.99), dw("yyy", 1.0, 1.5, 0.99)]))
        .unwrap();

    let after = session.snapshot().words;
    let beta_after = after.iter().find(|w| w.id == beta_before.id).unwrap();
    assert_eq!(beta_after.text, beta_before.text);
    assert_eq!(beta_after.start, beta_before.start);
    assert_eq!(beta_after.end, beta_before.end);
    assert_eq!(beta_after.confidence, beta_before.confidence);
    assert!(beta_after.finalized);
}

/// mature_cursor_time never decreases across merges.
#[quickcheck]
fn prop_monotone_cursor(deltas: Vec<(u8, u8, u8)>) -> bool {
    let mut session = new_session();
    let mut last_cursor = 0.0;
    let mut t = 0.0;
    for (seq, (d_start, d_len, conf)) in deltas.into_iter().enumerate() {
        let start = t + 1.0 + (d_start as f64) * 0.01;
        let len = 0.2 + (d_len as f64) * 0.01;
        let end = start + len;
        t = end;
        let confidence = 0.5 + (conf as f64 % 50.0) / 100.0;
        let outcome =
            session.merge(payload(seq as u64 + 1, vec![dw("word", start, end, confidence)])).unwrap();
        if outcome.mature_cursor_time < last_cursor {
            return false;
        }
        last_cursor = outcome.mature_cursor_time;
    }
    true
}

/// The transcript stays strictly sorted by `start` after every
/// merge, regardless of the order segments arrive in.
#[quickcheck]
fn prop_sorted_after_merge(order: Vec<u8>) -> bool {
    let mut session = new_session();
    let mut t = 0.0;
    for (seq, n) in order.into_iter().enumerate() {
        let start = t;
        let end = t + 0.3 + (n as f64 % 5.0) * 0.05;
        t = end + 0.05;
        session.merge(payload(seq as u64 + 1, vec![dw("w", start, end, 0.9)])).unwrap();
        let words = session.snapshot().words;
        if !words.windows(2).all(|pair| pair[0].start <= pair[1].start) {
            return false;
        }
    }
    true
}

/// Merging the same payload twice in a row never increases the
/// word count on the second merge, and no finalized word changes.
#[quickcheck]
fn prop_idempotent_repeat_merge(text_len: u8, start: u8, conf: u8) -> bool {
    let mut session = new_session();
    let text: String = "x".repeat(1 + (text_len as usize % 6));
    let start = 1.0 + start as f64 * 0.01;
    let end = start + 0.4;
    let confidence = 0.5 + (conf as f64 % 50.0) / 100.0;

    session.merge(payload(1, vec![dw(&text, start, end, confidence)])).unwrap();
    let before = session.snapshot().words;
    let before_count = before.len();
    let before_finalized: Vec<_> = before.iter().filter(|w| w.finalized).cloned().collect();

    session.merge(payload(2, vec![dw(&text, start, end, confidence)])).unwrap();
    let after = session.snapshot().words;

    if after.len() > before_count {
        return false;
    }
    for f in &before_finalized {
        let Some(still) = after.iter().find(|w| w.id == f.id) else { return false };
        if still.text != f.text || still.start != f.start || still.end != f.end || still.confidence != f.confidence {
            return false;
        }
    }
    true
}
