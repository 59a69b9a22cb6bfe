// ReHumanizer Core Services
// Rewriting passes, scoring, generation and the stage pipeline

pub mod random;
pub mod enhancer;
pub mod education;
pub mod scoring;
pub mod text_processor;
pub mod config_store;
pub mod providers;
pub mod rewriter;
pub mod pipeline;
pub mod humanize;

pub use config_store::*;
pub use providers::*;
pub use text_processor::*;

pub use education::{adjust_to_level, EducationLevel};
pub use enhancer::{enhance, full_enhancement};
pub use humanize::{validate_input, HumanizeError, HumanizeService};
pub use pipeline::Pipeline;
pub use random::{FixedRandom, RandomSource, SequenceRandom, StdRandom};
pub use rewriter::{
    GenerationError, GenerativeRewriter, MultiPassOutcome, StageOutcome, TextGenerator,
    UnavailableGenerator,
};
pub use scoring::{detection_score, perplexity_estimate, score_report, ScoreReport};
