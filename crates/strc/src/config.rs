//! Tunable parameters for the reconciler, finalizer, cursor engine and WPM
//! calculations.
//!
//! `StrcConfig` is the single source of truth for every numeric constant the
//! pipeline uses; a hand-written [`Default`] impl pins the values from the
//! option table, and `#[serde(default = "...")]` lets embedders send partial
//! JSON/TOML fragments and still get the rest filled in.

fn default_stability_threshold() -> u32 {
    3
}
fn default_confidence_bias() -> f64 {
    1.15
}
fn default_length_bias_factor() -> f64 {
    0.01
}
fn default_word_confidence_replace_threshold() -> f64 {
    0.15
}
fn default_min_overlap_duration_for_redundancy() -> f64 {
    0.05
}
fn default_finalization_stability_threshold() -> u32 {
    2
}
fn default_use_age_finalization() -> bool {
    true
}
fn default_finalization_age_threshold() -> f64 {
    10.0
}
fn default_cursor_behavior_mode() -> CursorMode {
    CursorMode::SentenceBased
}
fn default_min_initial_context_time() -> f64 {
    3.0
}
fn default_stability_threshold_for_veto() -> u32 {
    1
}
fn default_word_min_confidence_superiority_for_veto() -> f64 {
    0.20
}
fn default_wpm_calculation_window_seconds() -> f64 {
    60.0
}
fn default_max_retained_sentences() -> usize {
    20
}

/// How the mature-cursor engine picks its candidate advance point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub enum CursorMode {
    SentenceBased,
    LastFinalized,
}

impl Default for CursorMode {
    fn default() -> Self {
        CursorMode::SentenceBased
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct StrcConfig {
    #[serde(default = "default_stability_threshold")]
    pub stability_threshold: u32,

    #[serde(default = "default_confidence_bias")]
    pub confidence_bias: f64,

    #[serde(default = "default_length_bias_factor")]
    pub length_bias_factor: f64,

    #[serde(default = "default_word_confidence_replace_threshold")]
    pub word_confidence_replace_threshold: f64,

    #[serde(default = "default_min_overlap_duration_for_redundancy")]
    pub min_overlap_duration_for_redundancy: f64,

    #[serde(default = "default_finalization_stability_threshold")]
    pub finalization_stability_threshold: u32,

    #[serde(default = "default_use_age_finalization")]
    pub use_age_finalization: bool,

    #[serde(default = "default_finalization_age_threshold")]
    pub finalization_age_threshold: f64,

    #[serde(default = "default_cursor_behavior_mode")]
    pub cursor_behavior_mode: CursorMode,

    #[serde(default = "default_min_initial_context_time")]
    pub min_initial_context_time: f64,

    #[serde(default = "default_stability_threshold_for_veto")]
    pub stability_threshold_for_veto: u32,

    #[serde(default = "default_word_min_confidence_superiority_for_veto")]
    pub word_min_confidence_superiority_for_veto: f64,

    #[serde(default = "default_wpm_calculation_window_seconds")]
    pub wpm_calculation_window_seconds: f64,

    #[serde(default = "default_max_retained_sentences")]
    pub max_retained_sentences: usize,
}

impl Default for StrcConfig {
    fn default() -> Self {
        Self {
            stability_threshold: default_stability_threshold(),
            confidence_bias: default_confidence_bias(),
            length_bias_factor: default_length_bias_factor(),
            word_confidence_replace_threshold: default_word_confidence_replace_threshold(),
            min_overlap_duration_for_redundancy: default_min_overlap_duration_for_redundancy(),
            finalization_stability_threshold: default_finalization_stability_threshold(),
            use_age_finalization: default_use_age_finalization(),
            finalization_age_threshold: default_finalization_age_threshold(),
            cursor_behavior_mode: default_cursor_behavior_mode(),
            min_initial_context_time: default_min_initial_context_time(),
            stability_threshold_for_veto: default_stability_threshold_for_veto(),
            word_min_confidence_superiority_for_veto:
                default_word_min_confidence_superiority_for_veto(),
            wpm_calculation_window_seconds: default_wpm_calculation_window_seconds(),
            max_retained_sentences: default_max_retained_sentences(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_option_table() {
        let cfg = StrcConfig::default();
        assert_eq!(cfg.stability_threshold, 3);
        assert_eq!(cfg.confidence_bias, 1.15);
        assert_eq!(cfg.finalization_stability_threshold, 2);
        assert_eq!(cfg.cursor_behavior_mode, CursorMode::SentenceBased);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let cfg: StrcConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, StrcConfig::default());
    }

    #[test]
    fn cursor_mode_uses_camel_case_on_the_wire() {
        let json = serde_json::to_string(&CursorMode::LastFinalized).unwrap();
        assert_eq!(json, "\"lastFinalized\"");
    }
}
