// Education Level Adjuster
// Register-keyed connective substitution applied as a final pass

use crate::services::enhancer::{apply_table, replace_with_either};
use crate::services::random::RandomSource;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EducationLevel {
    Elementary,
    Middle,
    High,
    Undergraduate,
    Graduate,
}

impl EducationLevel {
    pub fn parse(val: &str) -> Option<Self> {
        match val.trim().to_lowercase().as_str() {
            "elementary" => Some(Self::Elementary),
            "middle" => Some(Self::Middle),
            "high" => Some(Self::High),
            "undergraduate" => Some(Self::Undergraduate),
            "graduate" => Some(Self::Graduate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Elementary => "elementary",
            Self::Middle => "middle",
            Self::High => "high",
            Self::Undergraduate => "undergraduate",
            Self::Graduate => "graduate",
        }
    }
}

const ELEMENTARY: &[(&str, &str)] = &[
    (r"(?i)\bconsequently\b", "so"),
    (r"(?i)\bnevertheless\b", "but still"),
    (r"(?i)\bthus\b", "so"),
    (r"(?i)\bhence\b", "that's why"),
    (r"(?i)\bwhereas\b", "while"),
    (r"(?i)\bwhilst\b", "while"),
    (r"(?i)\bIn conclusion\b", "So, to finish"),
    (r"(?i)\bTo summarize\b", "To sum up"),
];

const MIDDLE: &[(&str, &str)] = &[
    (r"(?i)\bconsequently\b", "so"),
    (r"(?i)\bnevertheless\b", "still"),
    (r"(?i)\bthus\b", "so"),
    (r"(?i)\bhence\b", "that's why"),
    (r"(?i)\bwhereas\b", "while"),
    (r"(?i)\bwhilst\b", "while"),
];

const HIGH: &[(&str, &str)] = &[
    (r"(?i)\bconsequently\b", "so"),
    (r"(?i)\bnevertheless\b", "still"),
    (r"(?i)\bthus\b", "so"),
    (r"(?i)\bhence\b", "that's why"),
];

const GRADUATE: &[(&str, (&str, &str))] = &[
    (r"(?i)\bso\b", ("consequently", "thus")),
    (r"(?i)\bstill\b", ("nevertheless", "nonetheless")),
    (r"(?i)\bthat's why\b", ("hence", "therefore")),
];

struct LevelTables {
    elementary: Vec<(Regex, &'static str)>,
    middle: Vec<(Regex, &'static str)>,
    high: Vec<(Regex, &'static str)>,
    graduate: Vec<(Regex, (&'static str, &'static str))>,
}

fn compile(table: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    table
        .iter()
        .map(|(p, r)| (Regex::new(p).expect("education regex"), *r))
        .collect()
}

fn tables() -> &'static LevelTables {
    static TABLES: OnceLock<LevelTables> = OnceLock::new();
    TABLES.get_or_init(|| LevelTables {
        elementary: compile(ELEMENTARY),
        middle: compile(MIDDLE),
        high: compile(HIGH),
        graduate: GRADUATE
            .iter()
            .map(|(p, choices)| (Regex::new(p).expect("education regex"), *choices))
            .collect(),
    })
}

/// Adjust vocabulary for a typed level.
pub fn adjust(text: &str, level: EducationLevel, rng: &mut dyn RandomSource) -> String {
    let t = tables();
    match level {
        EducationLevel::Elementary => apply_table(text, &t.elementary),
        EducationLevel::Middle => apply_table(text, &t.middle),
        EducationLevel::High => apply_table(text, &t.high),
        EducationLevel::Undergraduate => text.to_string(),
        EducationLevel::Graduate => t.graduate.iter().fold(text.to_string(), |acc, (re, choices)| {
            replace_with_either(&acc, re, *choices, rng)
        }),
    }
}

/// Adjust vocabulary for a level name; unknown names leave the text as is.
pub fn adjust_to_level(text: &str, level: &str, rng: &mut dyn RandomSource) -> String {
    match EducationLevel::parse(level) {
        Some(level) => adjust(text, level, rng),
        None => text.to_string(),
    }
}
