// Pattern Enhancer
// Regex-driven rewriting passes that make text read less machine-written.
//
// Every pass is a pure function of (text, random source). Probabilities and
// word lists are hand-tuned constants; keep them as they are.

use crate::models::EnhancementOptions;
use crate::services::random::{either, pick, RandomSource};
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// A single rewriting pass.
pub type EnhancementPass = fn(&str, &mut dyn RandomSource) -> String;

// Probability that an optional rewrite fires at a given match.
const YOU_KNOW_PROBABILITY: f64 = 0.3;
const ELLIPSIS_BOUNDARY_PROBABILITY: f64 = 0.15;
const INTERROBANG_PROBABILITY: f64 = 0.2;
const TRIPLE_DOT_PROBABILITY: f64 = 0.1;
const FILLER_PROBABILITY: f64 = 0.3;
const ASIDE_PROBABILITY: f64 = 0.2;
const SHORT_SENTENCE_PROBABILITY: f64 = 0.25;
const QUESTION_PROBABILITY: f64 = 0.2;
const HEDGE_PROBABILITY: f64 = 0.15;
const CONNECTOR_PROBABILITY: f64 = 0.4;

/// Runs of this many non-terminal characters are split candidates...
const LONG_RUN_MIN_CHARS: usize = 80;
/// ...but only runs longer than this are actually split.
const LONG_RUN_SPLIT_CHARS: usize = 120;

const MOREOVER_ALTERNATIVES: (&str, &str) = ("also", "plus");
const FURTHERMORE_ALTERNATIVES: (&str, &str) = ("what's more", "on top of that");
const ADDITIONALLY_ALTERNATIVES: (&str, &str) = ("and", "as well");

const FILLER_WORDS: &[&str] = &[
    "you know", "I mean", "basically", "actually", "sort of", "kind of", "well", "so", "right",
    "like", "um", "uh", "anyway", "anyhow",
];

const ASIDES: &[&str] = &[
    "(which makes sense)",
    "(if you think about it)",
    "(you see?)",
    "(I guess)",
    "(right?)",
    "(sort of)",
    "(in a way)",
];

const SPLIT_CONNECTORS: &[&str] = &["And", "Plus", "Also", "What's more"];

const SHORT_SENTENCES: &[&str] = &[
    "That's the thing.",
    "It's interesting.",
    "Think about it.",
    "You see?",
    "Right?",
    "Makes sense.",
    "Simple as that.",
];

const RHETORICAL_QUESTIONS: &[&str] = &[
    "But what does that really mean?",
    "How so?",
    "Why is that?",
    "What do you think?",
    "Does that make sense?",
    "See what I mean?",
];

const HOWEVER_ALTERNATIVES: &[&str] = &["That said", "Still", "On the other hand", "But then again"];
const THEREFORE_ALTERNATIVES: &[&str] = &["So", "That's why", "Which means", "As a result"];

const HEDGES: &[&str] = &[
    "I think",
    "I believe",
    "In my view",
    "From what I've seen",
    "It seems to me",
    "I'd say",
    "My take on it",
];

const SENTENCE_CONNECTORS: &[&str] = &[
    "Now,",
    "So,",
    "Well,",
    "Right,",
    "You see,",
    "Look,",
    "Here's the thing,",
    "Get this,",
];

const REPEATED_PHRASES: &[(&str, &str)] = &[
    (
        r"(?i)\b(which,? considering the\s+){2,}broader context\b",
        "which, considering the broader context",
    ),
    (
        r"(?i)\b(furthermore,? it is important to note that\s+){2,}",
        "furthermore, it is important to note that",
    ),
    (
        r"(?i)\b(in conclusion,? we can see that\s+){2,}",
        "in conclusion, we can see that",
    ),
];

const ACADEMIC_REPLACEMENTS: &[(&str, &str)] = &[
    (r"(?i)\bconsequently\b", "so"),
    (r"(?i)\bnevertheless\b", "still"),
    (r"(?i)\bthus\b", "so"),
    (r"(?i)\bhence\b", "that's why"),
    (r"(?i)\bwhereas\b", "while"),
    (r"(?i)\bwhilst\b", "while"),
    (r"(?i)\bwhom\b", "who"),
    (r"(?i)\bwhomsoever\b", "whoever"),
    (r"(?i)\bIn conclusion\b", "So, to wrap this up"),
    (r"(?i)\bTo summarize\b", "Long story short"),
    (r"(?i)\bIt is important to note\b", "Keep in mind"),
    (r"(?i)\bIt should be noted\b", "Just remember"),
    (r"(?i)\bIt is worth mentioning\b", "Oh, and"),
];

/// Sentence boundary followed by a capitalized word.
fn boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([.!?])\s+([A-Z][a-z]+)").expect("boundary regex"))
}

fn repeated_dots_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.{2,}").expect("repeated dots regex"))
}

fn repeated_commas_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",{2,}").expect("repeated commas regex"))
}

fn long_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"[^.!?]{{{},}}", LONG_RUN_MIN_CHARS)).expect("long run regex")
    })
}

fn formal_connective_res() -> &'static [(Regex, (&'static str, &'static str)); 3] {
    static RES: OnceLock<[(Regex, (&'static str, &'static str)); 3]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            (Regex::new(r"(?i)\bmoreover\b").expect("moreover regex"), MOREOVER_ALTERNATIVES),
            (
                Regex::new(r"(?i)\bfurthermore\b").expect("furthermore regex"),
                FURTHERMORE_ALTERNATIVES,
            ),
            (
                Regex::new(r"(?i)\badditionally\b").expect("additionally regex"),
                ADDITIONALLY_ALTERNATIVES,
            ),
        ]
    })
}

fn however_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bHowever\b").expect("however regex"))
}

fn therefore_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bTherefore\b").expect("therefore regex"))
}

fn compile_table(table: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    table
        .iter()
        .map(|(pattern, replacement)| {
            (Regex::new(pattern).expect("replacement table regex"), *replacement)
        })
        .collect()
}

fn repeated_phrase_res() -> &'static [(Regex, &'static str)] {
    static RES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RES.get_or_init(|| compile_table(REPEATED_PHRASES))
}

fn academic_res() -> &'static [(Regex, &'static str)] {
    static RES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RES.get_or_init(|| compile_table(ACADEMIC_REPLACEMENTS))
}

/// Apply a literal substitution table in order.
pub(crate) fn apply_table(text: &str, table: &[(Regex, &'static str)]) -> String {
    table.iter().fold(text.to_string(), |acc, (re, replacement)| {
        re.replace_all(&acc, regex::NoExpand(replacement)).into_owned()
    })
}

/// Replace every match with an independently drawn alternative.
pub(crate) fn replace_with_choice(
    text: &str,
    re: &Regex,
    choices: &[&str],
    rng: &mut dyn RandomSource,
) -> String {
    re.replace_all(text, |_: &Captures| pick(rng, choices).to_string())
        .into_owned()
}

/// Replace every match with one of two alternatives, drawn per match.
pub(crate) fn replace_with_either(
    text: &str,
    re: &Regex,
    (first, second): (&'static str, &'static str),
    rng: &mut dyn RandomSource,
) -> String {
    re.replace_all(text, |_: &Captures| either(rng, first, second).to_string())
        .into_owned()
}

/// Visit every sentence boundary; with probability `probability` the boundary
/// is re-rendered from its punctuation and following word.
fn rewrite_boundaries<F>(
    text: &str,
    rng: &mut dyn RandomSource,
    probability: f64,
    mut render: F,
) -> String
where
    F: FnMut(&str, &str, &mut dyn RandomSource) -> String,
{
    boundary_re()
        .replace_all(text, |caps: &Captures| {
            if rng.chance(probability) {
                render(&caps[1], &caps[2], rng)
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Pass 1: collapse duplicated punctuation and phrases, swap formal
/// connectives, and sprinkle "You know," at sentence starts.
pub fn remove_robotic_patterns(text: &str, rng: &mut dyn RandomSource) -> String {
    let mut out = repeated_dots_re().replace_all(text, ".").into_owned();
    out = repeated_commas_re().replace_all(&out, ",").into_owned();
    out = apply_table(&out, repeated_phrase_res());

    for (re, choices) in formal_connective_res().iter() {
        out = replace_with_either(&out, re, *choices, rng);
    }

    rewrite_boundaries(&out, rng, YOU_KNOW_PROBABILITY, |punct, word, _| {
        format!("{} You know, {}", punct, word.to_lowercase())
    })
}

/// Pass 2: occasional ellipses and interrobangs.
pub fn adjust_punctuation(text: &str, rng: &mut dyn RandomSource) -> String {
    let out = rewrite_boundaries(text, rng, ELLIPSIS_BOUNDARY_PROBABILITY, |punct, word, _| {
        format!("{}.. {}", punct, word)
    });

    let mut result = String::with_capacity(out.len() + 16);
    for ch in out.chars() {
        match ch {
            '?' if rng.chance(INTERROBANG_PROBABILITY) => result.push_str("?!"),
            '.' if rng.chance(TRIPLE_DOT_PROBABILITY) => result.push_str("..."),
            _ => result.push(ch),
        }
    }
    result
}

/// Pass 3: filler words before sentences, then parenthetical asides after
/// the first word of a sentence.
pub fn add_human_filler_words(text: &str, rng: &mut dyn RandomSource) -> String {
    let with_fillers = rewrite_boundaries(text, rng, FILLER_PROBABILITY, |punct, word, rng| {
        let filler = pick(rng, FILLER_WORDS);
        format!("{} {}, {}", punct, capitalize_first(filler), word.to_lowercase())
    });

    rewrite_boundaries(&with_fillers, rng, ASIDE_PROBABILITY, |punct, word, rng| {
        let aside = pick(rng, ASIDES);
        format!("{} {} {}", punct, word, aside)
    })
}

fn split_long_run(run: &str, rng: &mut dyn RandomSource) -> String {
    if run.chars().count() <= LONG_RUN_SPLIT_CHARS {
        return run.to_string();
    }
    let words: Vec<&str> = run.split(' ').collect();
    let mid = words.len() / 2;
    let connector = pick(rng, SPLIT_CONNECTORS);
    format!(
        "{}. {}, {}",
        words[..mid].join(" "),
        connector,
        words[mid..].join(" ")
    )
}

/// Pass 4: split very long sentences and drop in short punchy ones.
pub fn vary_sentence_length(text: &str, rng: &mut dyn RandomSource) -> String {
    let split = long_run_re()
        .replace_all(text, |caps: &Captures| split_long_run(&caps[0], rng))
        .into_owned();

    rewrite_boundaries(&split, rng, SHORT_SENTENCE_PROBABILITY, |punct, word, rng| {
        let short = pick(rng, SHORT_SENTENCES);
        format!("{} {} {}", punct, short, word.to_lowercase())
    })
}

/// Pass 5: rhetorical questions, softer contrast words and first-person hedges.
pub fn add_conversational_elements(text: &str, rng: &mut dyn RandomSource) -> String {
    let mut out = rewrite_boundaries(text, rng, QUESTION_PROBABILITY, |punct, word, rng| {
        let question = pick(rng, RHETORICAL_QUESTIONS);
        format!("{} {} {}", punct, question, word.to_lowercase())
    });

    out = replace_with_choice(&out, however_re(), HOWEVER_ALTERNATIVES, rng);
    out = replace_with_choice(&out, therefore_re(), THEREFORE_ALTERNATIVES, rng);

    rewrite_boundaries(&out, rng, HEDGE_PROBABILITY, |punct, word, rng| {
        let hedge = pick(rng, HEDGES);
        format!("{} {}, {}", punct, hedge, word.to_lowercase())
    })
}

/// Academic vocabulary to casual equivalents, plus spoken-style connectors
/// at sentence starts.
pub fn advanced_pattern_replacement(text: &str, rng: &mut dyn RandomSource) -> String {
    let out = apply_table(text, academic_res());

    rewrite_boundaries(&out, rng, CONNECTOR_PROBABILITY, |punct, word, rng| {
        let connector = pick(rng, SENTENCE_CONNECTORS);
        format!("{} {} {}", punct, connector, word.to_lowercase())
    })
}

fn run_passes(text: &str, steps: &[(bool, EnhancementPass)], rng: &mut dyn RandomSource) -> String {
    steps
        .iter()
        .filter(|(enabled, _)| *enabled)
        .fold(text.to_string(), |acc, (_, pass)| pass(&acc, rng))
        .trim()
        .to_string()
}

/// Run the enabled passes in their fixed order and trim the result.
pub fn enhance(text: &str, options: &EnhancementOptions, rng: &mut dyn RandomSource) -> String {
    let steps: [(bool, EnhancementPass); 5] = [
        (options.remove_robotic_patterns, remove_robotic_patterns),
        (options.adjust_punctuation, adjust_punctuation),
        (options.add_filler_words, add_human_filler_words),
        (options.vary_sentence_length, vary_sentence_length),
        (options.add_conversational_elements, add_conversational_elements),
    ];
    run_passes(text, &steps, rng)
}

/// Every pass plus the advanced replacement, in fallback order.
pub fn full_enhancement(text: &str, rng: &mut dyn RandomSource) -> String {
    let steps: [(bool, EnhancementPass); 6] = [
        (true, remove_robotic_patterns),
        (true, add_human_filler_words),
        (true, add_conversational_elements),
        (true, advanced_pattern_replacement),
        (true, adjust_punctuation),
        (true, vary_sentence_length),
    ];
    run_passes(text, &steps, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::random::{FixedRandom, SequenceRandom};
    use crate::services::scoring::detection_score;

    const FORMAL: &str = "Moreover, the system is effective. Furthermore, it is efficient.";

    #[test]
    fn test_enhance_all_disabled_is_trim() {
        let text = "  However, this stays. Therefore it is.  ";
        let out = enhance(text, &EnhancementOptions::none(), &mut FixedRandom(0.0));
        assert_eq!(out, text.trim());
    }

    #[test]
    fn test_full_enhancement_high_draw_only_swaps_words() {
        let out = full_enhancement(FORMAL, &mut FixedRandom(0.99));
        assert_eq!(out, "also, the system is effective. what's more, it is efficient.");
        assert!(detection_score(&out) < detection_score(FORMAL));
    }

    #[test]
    fn test_enhance_is_deterministic_with_fixed_draws() {
        let text = "The model works. The data is clean. However, results vary? Therefore we test.";
        let a = enhance(text, &EnhancementOptions::default(), &mut FixedRandom(0.1));
        let b = enhance(text, &EnhancementOptions::default(), &mut FixedRandom(0.1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_remove_robotic_collapses_punctuation() {
        let out = remove_robotic_patterns("Wait.. what,, now", &mut FixedRandom(0.99));
        assert_eq!(out, "Wait. what, now");
    }

    #[test]
    fn test_remove_robotic_collapses_repeated_phrase() {
        let text = "which, considering the which, considering the broader context";
        let out = remove_robotic_patterns(text, &mut FixedRandom(0.99));
        assert_eq!(out, "which, considering the broader context");
    }

    #[test]
    fn test_you_know_inserted_at_low_draw() {
        let out = remove_robotic_patterns("It works. The end.", &mut FixedRandom(0.0));
        assert_eq!(out, "It works. You know, the end.");
    }

    #[test]
    fn test_adjust_punctuation_low_draw() {
        let out = adjust_punctuation("Hi there. Next one?", &mut FixedRandom(0.0));
        assert_eq!(out, "Hi there...... Next one?!");
    }

    #[test]
    fn test_filler_then_aside_are_independent() {
        // filler fires and picks "you know"; aside pass does not fire.
        let mut rng = SequenceRandom::new(vec![0.0, 0.0, 0.99]);
        let out = add_human_filler_words("It works. The end.", &mut rng);
        assert_eq!(out, "It works. You know, the end.");
    }

    #[test]
    fn test_formal_connectives_low_draw_take_second_option() {
        let out = remove_robotic_patterns(
            "Moreover, furthermore, additionally.",
            &mut SequenceRandom::new(vec![0.0, 0.0, 0.0]),
        );
        assert_eq!(out, "plus, on top of that, as well.");
    }

    #[test]
    fn test_aside_inserted_after_first_word() {
        // filler skipped, aside fires and picks the first aside
        let mut rng = SequenceRandom::new(vec![0.99, 0.0, 0.0]);
        let out = add_human_filler_words("It works. The end.", &mut rng);
        assert_eq!(out, "It works. The (which makes sense) end.");
    }

    #[test]
    fn test_short_sentence_inserted_at_boundary() {
        let mut rng = SequenceRandom::new(vec![0.0, 0.3]);
        let out = vary_sentence_length("It works. The end.", &mut rng);
        assert_eq!(out, "It works. Think about it. the end.");
    }

    #[test]
    fn test_rhetorical_question_inserted() {
        // question fires with "How so?", hedge pass skipped
        let mut rng = SequenceRandom::new(vec![0.0, 0.2, 0.99]);
        let out = add_conversational_elements("It works. The end.", &mut rng);
        assert_eq!(out, "It works. How so? the end.");
    }

    #[test]
    fn test_hedge_inserted() {
        let mut rng = SequenceRandom::new(vec![0.99, 0.0, 0.0]);
        let out = add_conversational_elements("It works. The end.", &mut rng);
        assert_eq!(out, "It works. I think, the end.");
    }

    #[test]
    fn test_connector_inserted_by_advanced_replacement() {
        let mut rng = SequenceRandom::new(vec![0.0, 0.8]);
        let out = advanced_pattern_replacement("It works. The end.", &mut rng);
        assert_eq!(out, "It works. Here's the thing, the end.");
    }

    #[test]
    fn test_long_sentence_is_split() {
        let words = vec!["word"; 30];
        let text = words.join(" ");
        let out = vary_sentence_length(&text, &mut FixedRandom(0.99));
        let half = vec!["word"; 15].join(" ");
        assert_eq!(out, format!("{}. What's more, {}", half, half));
    }

    #[test]
    fn test_medium_sentence_not_split() {
        let text = vec!["word"; 20].join(" ");
        assert!(text.len() > LONG_RUN_MIN_CHARS && text.len() <= LONG_RUN_SPLIT_CHARS);
        let out = vary_sentence_length(&text, &mut FixedRandom(0.0));
        assert_eq!(out, text);
    }

    #[test]
    fn test_however_and_therefore_replaced() {
        let out = add_conversational_elements(
            "However, it fails. Therefore, we retry.",
            &mut SequenceRandom::new(vec![0.99, 0.0, 0.0, 0.99]),
        );
        assert_eq!(out, "That said, it fails. So, we retry.");
    }

    #[test]
    fn test_advanced_pattern_replacement() {
        let out = advanced_pattern_replacement(
            "In conclusion, it works. It is important to note the cost, whilst thus cheap.",
            &mut FixedRandom(0.99),
        );
        assert_eq!(
            out,
            "So, to wrap this up, it works. Keep in mind the cost, while so cheap."
        );
    }

    #[test]
    fn test_enhance_empty_input() {
        assert_eq!(enhance("", &EnhancementOptions::default(), &mut FixedRandom(0.0)), "");
        assert_eq!(full_enhancement("", &mut FixedRandom(0.0)), "");
    }
}
