// Humanize Service
// Request-level flow: validate, score, run the preset pipeline, apply the
// education level, score again.

use crate::models::{
    HealthFeatures, HealthReport, HumanizeRequest, HumanizeResponse, PipelineConfiguration,
    PipelinePreset,
};
use crate::services::education::adjust_to_level;
use crate::services::pipeline::Pipeline;
use crate::services::random::{RandomSource, StdRandom};
use crate::services::rewriter::{TextGenerator, UnavailableGenerator};
use crate::services::scoring::{detection_score, perplexity_estimate};
use crate::services::text_processor::{normalize_punctuation, word_count};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_MAX_INPUT_CHARS: usize = 10_000;
pub const DEFAULT_EDUCATION_LEVEL: &str = "undergraduate";
pub const SERVICE_NAME: &str = "rehumanizer-humanization-api";

#[derive(Error, Debug, PartialEq)]
pub enum HumanizeError {
    #[error("Text is required")]
    EmptyText,
    #[error("Text too long: {len} characters (maximum {max})")]
    TooLong { len: usize, max: usize },
}

/// Reject blank input and input longer than `max_chars` characters.
pub fn validate_input(text: &str, max_chars: usize) -> Result<(), HumanizeError> {
    if text.trim().is_empty() {
        return Err(HumanizeError::EmptyText);
    }
    let len = text.chars().count();
    if len > max_chars {
        return Err(HumanizeError::TooLong { len, max: max_chars });
    }
    Ok(())
}

pub struct HumanizeService {
    pipeline: Pipeline,
    generator_configured: bool,
    max_input_chars: usize,
    /// Overrides the preset's pass count when set.
    stage2_passes: Option<u32>,
}

impl HumanizeService {
    /// `None` runs every generative stage through its local fallback.
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        let generator_configured = generator.is_some();
        let generator: Arc<dyn TextGenerator> = match generator {
            Some(g) => g,
            None => Arc::new(UnavailableGenerator::new("no generator configured")),
        };
        Self {
            pipeline: Pipeline::new(generator),
            generator_configured,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            stage2_passes: None,
        }
    }

    pub fn with_max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = max;
        self
    }

    pub fn with_stage2_passes(mut self, passes: Option<u32>) -> Self {
        self.stage2_passes = passes;
        self
    }

    fn configuration_for(&self, preset: PipelinePreset) -> PipelineConfiguration {
        let mut config = preset.configuration();
        if let (Some(passes), true) = (self.stage2_passes, config.enable_stage2) {
            config.stage2_passes = passes;
        }
        config
    }

    pub async fn humanize(&self, request: &HumanizeRequest) -> Result<HumanizeResponse, HumanizeError> {
        let mut rng = StdRandom::from_entropy();
        self.humanize_with_rng(request, &mut rng).await
    }

    pub async fn humanize_with_rng(
        &self,
        request: &HumanizeRequest,
        rng: &mut dyn RandomSource,
    ) -> Result<HumanizeResponse, HumanizeError> {
        validate_input(&request.text, self.max_input_chars)?;

        let started = Instant::now();
        let request_id = uuid::Uuid::new_v4().to_string();
        let preset = PipelinePreset::parse(request.pipeline_type.as_deref().unwrap_or_default());
        let education_level = request
            .education_level
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_EDUCATION_LEVEL)
            .to_lowercase();

        info!(
            "[HUMANIZE] request_id={} pipeline={} level={} chars={}",
            request_id,
            preset.as_str(),
            education_level,
            request.text.chars().count()
        );

        let text = &request.text;
        let score_before = detection_score(text);
        let entropy_before = perplexity_estimate(text);

        let input = normalize_punctuation(text);
        let config = self.configuration_for(preset);
        let pipeline_result = self.pipeline.execute_with_rng(&input, &config, rng).await;

        let generated = pipeline_result.final_text.clone();
        let adjusted = adjust_to_level(&generated, &education_level, rng);

        let score_after = detection_score(&adjusted);
        let entropy_after = perplexity_estimate(&adjusted);
        let words_in = word_count(text);
        let length_ratio = if words_in == 0 {
            0.0
        } else {
            word_count(&adjusted) as f64 / words_in as f64
        };
        let processing_time_ms = started.elapsed().as_millis() as u64;

        info!(
            "[HUMANIZE] request_id={} done score_before={:.3} score_after={:.3} degraded={:?} elapsed_ms={}",
            request_id, score_before, score_after, pipeline_result.degraded_stages, processing_time_ms
        );

        Ok(HumanizeResponse {
            request_id,
            original_text: text.clone(),
            paraphrased_text: pipeline_result.stage1_output.clone(),
            humanized_text: adjusted,
            generated_text: generated,
            processing_time_ms,
            ai_detection_score_before: score_before,
            ai_detection_score_after: score_after,
            readability_improvement: entropy_after - entropy_before,
            education_level,
            pipeline_type: preset.as_str().to_string(),
            fallback_used: pipeline_result.is_degraded(),
            length_ratio,
            pipeline_result,
        })
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            generator: self
                .generator_configured
                .then(|| self.pipeline.generator_name()),
            features: HealthFeatures {
                text_humanization: true,
                multiple_pipelines: true,
                education_levels: true,
                generator_integration: self.generator_configured,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::random::FixedRandom;
    use crate::services::rewriter::testing::{ScriptedGenerator, StaticGenerator};

    fn request(text: &str, pipeline: Option<&str>, level: Option<&str>) -> HumanizeRequest {
        HumanizeRequest {
            text: text.to_string(),
            pipeline_type: pipeline.map(str::to_string),
            education_level: level.map(str::to_string),
        }
    }

    #[test]
    fn test_validate_input() {
        assert_eq!(validate_input("  \n", 10), Err(HumanizeError::EmptyText));
        assert_eq!(
            validate_input("abcdef", 5),
            Err(HumanizeError::TooLong { len: 6, max: 5 })
        );
        assert!(validate_input("abcde", 5).is_ok());
        // characters, not bytes
        assert!(validate_input("ééééé", 5).is_ok());
    }

    #[tokio::test]
    async fn test_rejects_empty_and_long_input() {
        let service = HumanizeService::new(None).with_max_input_chars(8);
        let err = service.humanize(&request("", None, None)).await.unwrap_err();
        assert_eq!(err, HumanizeError::EmptyText);
        let err = service
            .humanize(&request("far too long for this", None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, HumanizeError::TooLong { max: 8, .. }));
    }

    #[tokio::test]
    async fn test_quick_pipeline_without_generator() {
        let service = HumanizeService::new(None);
        let text = "Moreover, the system is effective. Furthermore, it is efficient.";
        let response = service
            .humanize_with_rng(&request(text, Some("quick"), None), &mut FixedRandom(0.99))
            .await
            .unwrap();

        assert_eq!(response.pipeline_type, "quick");
        assert_eq!(response.education_level, "undergraduate");
        assert_eq!(response.original_text, text);
        assert_eq!(response.paraphrased_text, text);
        assert_eq!(
            response.humanized_text,
            "also, the system is effective. what's more, it is efficient."
        );
        assert_eq!(response.generated_text, response.humanized_text);
        assert!(response.ai_detection_score_after < response.ai_detection_score_before);
        assert!(!response.fallback_used);
        assert!((response.length_ratio - 11.0 / 9.0).abs() < 1e-9);
        assert_eq!(response.pipeline_result.stages_completed, vec!["Enhancement"]);
        assert!(!response.request_id.is_empty());
    }

    #[tokio::test]
    async fn test_education_level_applied_after_pipeline() {
        let service = HumanizeService::new(Some(Arc::new(StaticGenerator("Thus it works."))));
        let response = service
            .humanize_with_rng(
                &request("Some input text.", Some("fluency"), Some("Elementary")),
                &mut FixedRandom(0.99),
            )
            .await
            .unwrap();

        assert_eq!(response.generated_text, "Thus it works.");
        assert_eq!(response.humanized_text, "so it works.");
        assert_eq!(response.education_level, "elementary");
        assert_eq!(
            response.pipeline_result.stages_completed,
            vec!["Paraphrasing", "Humanization"]
        );
    }

    #[tokio::test]
    async fn test_unknown_preset_runs_comprehensive_with_fallbacks() {
        let service = HumanizeService::new(None);
        let response = service
            .humanize_with_rng(
                &request("Hence we ship.", Some("mystery"), Some("unknown-level")),
                &mut FixedRandom(0.99),
            )
            .await
            .unwrap();

        assert_eq!(response.pipeline_type, "comprehensive");
        assert!(response.fallback_used);
        assert_eq!(response.paraphrased_text, "so we ship.");
        assert_eq!(response.humanized_text, "so we ship.");
        assert_eq!(response.pipeline_result.stages_completed.len(), 3);
    }

    #[tokio::test]
    async fn test_stage2_pass_override() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Some("p"), Some("h1")]));
        let service = HumanizeService::new(Some(generator.clone())).with_stage2_passes(Some(1));
        let response = service
            .humanize_with_rng(&request("Input.", Some("fluency"), None), &mut FixedRandom(0.99))
            .await
            .unwrap();
        assert_eq!(response.humanized_text, "h1");
        assert_eq!(generator.prompt_count(), 2);
    }

    #[test]
    fn test_health() {
        let report = HumanizeService::new(None).health();
        assert_eq!(report.status, "healthy");
        assert_eq!(report.service, SERVICE_NAME);
        assert!(report.generator.is_none());
        assert!(!report.features.generator_integration);

        let report = HumanizeService::new(Some(Arc::new(StaticGenerator("x")))).health();
        assert_eq!(report.generator.as_deref(), Some("generator"));
        assert!(report.features.generator_integration);
    }
}
