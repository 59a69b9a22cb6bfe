// ReHumanizer Data Models
// Shared request/response and pipeline types

use serde::{Deserialize, Serialize};
use std::fmt;

// ============ Enhancement Options ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementOptions {
    #[serde(default = "default_true")]
    pub add_filler_words: bool,
    #[serde(default = "default_true")]
    pub vary_sentence_length: bool,
    #[serde(default = "default_true")]
    pub add_conversational_elements: bool,
    #[serde(default = "default_true")]
    pub remove_robotic_patterns: bool,
    #[serde(default = "default_true")]
    pub adjust_punctuation: bool,
}

impl Default for EnhancementOptions {
    fn default() -> Self {
        Self {
            add_filler_words: true,
            vary_sentence_length: true,
            add_conversational_elements: true,
            remove_robotic_patterns: true,
            adjust_punctuation: true,
        }
    }
}

impl EnhancementOptions {
    /// Every pass disabled.
    pub fn none() -> Self {
        Self {
            add_filler_words: false,
            vary_sentence_length: false,
            add_conversational_elements: false,
            remove_robotic_patterns: false,
            adjust_punctuation: false,
        }
    }
}

// ============ Pipeline Configuration ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfiguration {
    #[serde(default = "default_true")]
    pub enable_stage1: bool,
    #[serde(default = "default_true")]
    pub enable_stage2: bool,
    #[serde(default = "default_true")]
    pub enable_stage3: bool,
    #[serde(default = "default_passes")]
    pub stage2_passes: u32,
}

impl PipelineConfiguration {
    pub fn new(enable_stage1: bool, enable_stage2: bool, enable_stage3: bool, stage2_passes: u32) -> Self {
        Self {
            enable_stage1,
            enable_stage2,
            enable_stage3,
            stage2_passes,
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.enable_stage1 || self.enable_stage2 || self.enable_stage3
    }
}

impl Default for PipelineConfiguration {
    fn default() -> Self {
        PipelinePreset::Comprehensive.configuration()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelinePreset {
    Comprehensive,
    Enhanced,
    Fluency,
    Quick,
}

impl PipelinePreset {
    /// Unknown names fall back to the comprehensive preset.
    pub fn parse(val: &str) -> Self {
        match val.trim().to_lowercase().as_str() {
            "enhanced" => Self::Enhanced,
            "fluency" => Self::Fluency,
            "quick" => Self::Quick,
            _ => Self::Comprehensive,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comprehensive => "comprehensive",
            Self::Enhanced => "enhanced",
            Self::Fluency => "fluency",
            Self::Quick => "quick",
        }
    }

    pub fn configuration(&self) -> PipelineConfiguration {
        match self {
            Self::Comprehensive => PipelineConfiguration::new(true, true, true, 3),
            Self::Enhanced => PipelineConfiguration::new(true, false, true, 0),
            Self::Fluency => PipelineConfiguration::new(true, true, false, 2),
            Self::Quick => PipelineConfiguration::new(false, false, true, 0),
        }
    }
}

// ============ Pipeline Result ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageName {
    Paraphrasing,
    Humanization,
    Enhancement,
}

impl StageName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paraphrasing => "Paraphrasing",
            Self::Humanization => "Humanization",
            Self::Enhancement => "Enhancement",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub original_text: String,
    pub stage1_output: String,
    pub stage2_output: String,
    pub stage3_output: String,
    pub final_text: String,
    pub processing_time_ms: u64,
    /// Stages that executed, in execution order.
    pub stages_completed: Vec<String>,
    /// Stages that completed through a local fallback.
    #[serde(default)]
    pub degraded_stages: Vec<String>,
}

impl PipelineResult {
    pub fn is_degraded(&self) -> bool {
        !self.degraded_stages.is_empty()
    }
}

// ============ Humanize Request / Response ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanizeRequest {
    pub text: String,
    #[serde(default)]
    pub pipeline_type: Option<String>,
    #[serde(default)]
    pub education_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanizeResponse {
    pub request_id: String,
    pub original_text: String,
    pub paraphrased_text: String,
    /// Final text after the education level pass.
    pub humanized_text: String,
    /// Pipeline output before the education level pass.
    pub generated_text: String,
    pub processing_time_ms: u64,
    pub ai_detection_score_before: f64,
    pub ai_detection_score_after: f64,
    pub readability_improvement: f64,
    pub education_level: String,
    pub pipeline_type: String,
    pub fallback_used: bool,
    /// Output words divided by input words.
    pub length_ratio: f64,
    pub pipeline_result: PipelineResult,
}

// ============ Health ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthFeatures {
    pub text_humanization: bool,
    pub multiple_pipelines: bool,
    pub education_levels: bool,
    pub generator_integration: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub generator: Option<String>,
    pub features: HealthFeatures,
}

fn default_true() -> bool {
    true
}

fn default_passes() -> u32 {
    3
}
