// Text Processing Service
// Input normalization and cleanup of generated text

use regex::Regex;
use std::sync::OnceLock;

fn space_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\u{3000}\u{00A0}]").expect("space regex"))
}

fn horizontal_ws_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t\x0C\x0B]+").expect("whitespace regex"))
}

fn blank_lines_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("blank lines regex"))
}

/// Labels models like to put in front of the rewritten text.
fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(?:final essay|final|draft|revised essay|essay|summary|output|humanized text|polished version|enhanced text|rewritten text|more human version|here(?:'s| is)[^:\n]{0,60})\s*:\s*",
        )
        .expect("label regex")
    })
}

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\w+\b").expect("word regex"))
}

/// Normalize quotes, dashes and whitespace in input text
pub fn normalize_punctuation(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut s = text
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace('\u{2014}', "-");

    s = space_re().replace_all(&s, " ").into_owned();
    s = s.replace("\r\n", "\n").replace('\r', "\n");
    s = horizontal_ws_re().replace_all(&s, " ").into_owned();

    s = s.lines().map(|ln| ln.trim()).collect::<Vec<_>>().join("\n");
    s = blank_lines_re().replace_all(&s, "\n\n").into_owned();

    s.trim().to_string()
}

fn strip_wrapping_quotes(s: &str) -> &str {
    let trimmed = s.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        let inner = &trimmed[1..trimmed.len() - 1];
        if !inner.contains('"') {
            return inner.trim();
        }
    }
    trimmed
}

/// Strip label prefixes and echoed quotes from a model reply.
/// Paragraph breaks are kept.
pub fn clean_generated_text(text: &str) -> String {
    let lines: Vec<String> = text
        .trim()
        .lines()
        .map(|line| label_re().replace(line.trim(), "").into_owned())
        .collect();

    let joined = lines.join("\n");
    let collapsed = blank_lines_re().replace_all(joined.trim(), "\n\n");
    strip_wrapping_quotes(&collapsed).to_string()
}

pub fn word_count(text: &str) -> usize {
    word_re().find_iter(text).count()
}
