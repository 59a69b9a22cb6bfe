// Detection Scorer
// Cheap heuristic proxy for "how AI-generated does this look", plus a
// word-entropy variability signal.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

const BASE_SCORE: f64 = 0.5;
const AI_MARKER_WEIGHT: f64 = 0.05;
const HUMAN_MARKER_WEIGHT: f64 = 0.03;

const AI_MARKERS: &[&str] = &[
    r"(?i)\bmoreover\b",
    r"(?i)\bfurthermore\b",
    r"(?i)\badditionally\b",
    r"(?i)\bconsequently\b",
    r"(?i)\bthus\b",
    r"(?i)\bhence\b",
    r"(?i)\bnevertheless\b",
    r"(?i)\bwhereas\b",
    r"(?i)\bwhilst\b",
    r"(?i)\bIn conclusion\b",
    r"(?i)\bTo summarize\b",
];

// Ellipsis runs match both dot patterns and are counted twice.
const HUMAN_MARKERS: &[&str] = &[
    r"(?i)\b(you know|I mean|basically|actually|sort of|kind of)\b",
    r"(?i)\b(well|so|right|like|um|uh|anyway|anyhow)\b",
    r"\([^)]+\)",
    r"\.{2,}",
    r"\?!",
    r"\.{3,}",
];

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("marker regex"))
        .collect()
}

fn ai_marker_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| compile_all(AI_MARKERS))
}

fn human_marker_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| compile_all(HUMAN_MARKERS))
}

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\w+\b").expect("word regex"))
}

fn count_matches(text: &str, patterns: &[Regex]) -> usize {
    patterns.iter().map(|re| re.find_iter(text).count()).sum()
}

/// Heuristic detection score in `[0, 1]`; higher looks more machine-written.
pub fn detection_score(text: &str) -> f64 {
    let ai = count_matches(text, ai_marker_res());
    let human = count_matches(text, human_marker_res());
    score_from_counts(ai, human)
}

fn score_from_counts(ai: usize, human: usize) -> f64 {
    let score = BASE_SCORE + AI_MARKER_WEIGHT * ai as f64 - HUMAN_MARKER_WEIGHT * human as f64;
    score.clamp(0.0, 1.0)
}

/// Shannon entropy (bits) of the text's own case-folded word distribution.
pub fn perplexity_estimate(text: &str) -> f64 {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = word_re().find_iter(&lowered).map(|m| m.as_str()).collect();
    if words.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<&str, usize> = HashMap::new();
    for w in &words {
        *freq.entry(*w).or_insert(0) += 1;
    }

    let total = words.len() as f64;
    -freq
        .values()
        .map(|&count| {
            let p = count as f64 / total;
            p * p.log2()
        })
        .sum::<f64>()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub score: f64,
    pub perplexity: f64,
    pub ai_markers: usize,
    pub human_markers: usize,
}

pub fn score_report(text: &str) -> ScoreReport {
    let ai_markers = count_matches(text, ai_marker_res());
    let human_markers = count_matches(text, human_marker_res());
    ScoreReport {
        score: score_from_counts(ai_markers, human_markers),
        perplexity: perplexity_estimate(text),
        ai_markers,
        human_markers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_text() {
        assert!(approx(detection_score(""), 0.5));
        assert_eq!(perplexity_estimate(""), 0.0);
        assert_eq!(perplexity_estimate("  ... !! "), 0.0);
    }

    #[test]
    fn test_ai_markers_raise_score() {
        let text = "Moreover, it works. Furthermore, thus and hence.";
        assert!(approx(detection_score(text), 0.7));
    }

    #[test]
    fn test_human_markers_lower_score() {
        // "so", "right", the parenthetical, and "..." counted twice
        let text = "It works so (right?) yes...";
        let report = score_report(text);
        assert_eq!(report.ai_markers, 0);
        assert_eq!(report.human_markers, 5);
        assert!(approx(report.score, 0.5 - 5.0 * 0.03));
    }

    #[test]
    fn test_score_clamped() {
        let formal = "moreover ".repeat(50);
        assert_eq!(detection_score(&formal), 1.0);
        let casual = "well ".repeat(50);
        assert_eq!(detection_score(&casual), 0.0);
    }

    #[test]
    fn test_perplexity_entropy() {
        assert!(approx(perplexity_estimate("same Same SAME"), 0.0));
        assert!(approx(perplexity_estimate("a b"), 1.0));
        assert!(approx(perplexity_estimate("a b c d"), 2.0));
    }
}
