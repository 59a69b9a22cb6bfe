// Humanization Pipeline
// Paraphrase -> multi-pass humanize -> pattern enhancement, each stage
// independently toggleable and always run in that order.

use crate::models::{PipelineConfiguration, PipelineResult, StageName};
use crate::services::enhancer::full_enhancement;
use crate::services::random::{RandomSource, StdRandom};
use crate::services::rewriter::{basic_paraphrase, GenerativeRewriter, TextGenerator};
use futures::FutureExt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub struct Pipeline {
    rewriter: GenerativeRewriter,
}

/// Intermediate outputs; `None` means the stage did not produce text.
#[derive(Default)]
struct StageOutputs {
    stage1: Option<String>,
    stage2: Option<String>,
    stage3: Option<String>,
    completed: Vec<StageName>,
    degraded: Vec<StageName>,
}

impl StageOutputs {
    /// Last non-empty output, falling back stage3 -> stage2 -> stage1 -> original.
    fn best_available(&self, original: &str) -> String {
        [&self.stage3, &self.stage2, &self.stage1]
            .into_iter()
            .flatten()
            .find(|t| !t.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| original.to_string())
    }

    /// Output of the last stage that produced text.
    fn last_output(&self) -> Option<&String> {
        self.stage3
            .as_ref()
            .or(self.stage2.as_ref())
            .or(self.stage1.as_ref())
    }
}

impl Pipeline {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            rewriter: GenerativeRewriter::new(generator),
        }
    }

    pub fn generator_name(&self) -> String {
        self.rewriter.generator_name()
    }

    /// Run the configured stages with a fresh entropy-seeded random source.
    pub async fn execute(&self, text: &str, config: &PipelineConfiguration) -> PipelineResult {
        let mut rng = StdRandom::from_entropy();
        self.execute_with_rng(text, config, &mut rng).await
    }

    pub async fn execute_with_rng(
        &self,
        text: &str,
        config: &PipelineConfiguration,
        rng: &mut dyn RandomSource,
    ) -> PipelineResult {
        let started = Instant::now();
        let mut out = StageOutputs::default();

        if !config.any_enabled() {
            info!("[PIPELINE] no stages enabled, returning input unchanged");
        }

        if config.enable_stage1 {
            info!("[PIPELINE] stage 1: {}", StageName::Paraphrasing);
            let t0 = Instant::now();
            let caught = AssertUnwindSafe(self.rewriter.paraphrase(text))
                .catch_unwind()
                .await;
            match caught {
                Ok(outcome) => {
                    if outcome.used_fallback() {
                        out.degraded.push(StageName::Paraphrasing);
                    }
                    out.stage1 = Some(outcome.into_text());
                }
                Err(_) => {
                    warn!("[PIPELINE] stage 1 generator panicked, using basic substitution");
                    out.degraded.push(StageName::Paraphrasing);
                    out.stage1 = Some(basic_paraphrase(text));
                }
            }
            out.completed.push(StageName::Paraphrasing);
            info!("[PIPELINE] stage 1 done elapsed_ms={}", t0.elapsed().as_millis());
        }

        if config.enable_stage2 {
            info!(
                "[PIPELINE] stage 2: {} passes={}",
                StageName::Humanization,
                config.stage2_passes
            );
            let t0 = Instant::now();
            let input = out.stage1.clone().unwrap_or_else(|| text.to_string());
            let caught = AssertUnwindSafe(self.rewriter.humanize_multi_pass(&input, config.stage2_passes))
                .catch_unwind()
                .await;
            match caught {
                Ok(outcome) => {
                    if !outcome.is_complete() {
                        out.degraded.push(StageName::Humanization);
                    }
                    info!(
                        "[PIPELINE] stage 2 done passes_completed={} elapsed_ms={}",
                        outcome.passes_completed,
                        t0.elapsed().as_millis()
                    );
                    out.stage2 = Some(outcome.text);
                }
                Err(_) => {
                    warn!("[PIPELINE] stage 2 generator panicked, keeping stage input");
                    out.degraded.push(StageName::Humanization);
                    out.stage2 = Some(input);
                }
            }
            out.completed.push(StageName::Humanization);
        }

        if config.enable_stage3 {
            info!("[PIPELINE] stage 3: {}", StageName::Enhancement);
            let input = out
                .stage2
                .as_deref()
                .or(out.stage1.as_deref())
                .unwrap_or(text);
            match panic::catch_unwind(AssertUnwindSafe(|| full_enhancement(input, &mut *rng))) {
                Ok(enhanced) => {
                    out.stage3 = Some(enhanced);
                    out.completed.push(StageName::Enhancement);
                }
                Err(_) => {
                    warn!("[PIPELINE] stage 3 aborted, keeping best intermediate text");
                }
            }
        }

        // Blank input has no better text to fall back to.
        let final_text = match out.last_output() {
            None => text.to_string(),
            Some(last) if text.trim().is_empty() => last.clone(),
            Some(_) => out.best_available(text),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            "[PIPELINE] done stages={:?} degraded={:?} elapsed_ms={}",
            out.completed, out.degraded, elapsed_ms
        );

        PipelineResult {
            original_text: text.to_string(),
            stage1_output: out.stage1.clone().unwrap_or_else(|| text.to_string()),
            stage2_output: out.stage2.clone().unwrap_or_else(|| text.to_string()),
            stage3_output: out.stage3.clone().unwrap_or_else(|| text.to_string()),
            final_text,
            processing_time_ms: elapsed_ms,
            stages_completed: out.completed.iter().map(|s| s.to_string()).collect(),
            degraded_stages: out.degraded.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::random::FixedRandom;
    use crate::services::rewriter::testing::{PanickingGenerator, ScriptedGenerator, StaticGenerator};
    use crate::services::rewriter::UnavailableGenerator;
    use crate::services::scoring::detection_score;

    const FORMAL: &str = "Moreover, the system is effective. Furthermore, it is efficient.";

    fn config(s1: bool, s2: bool, s3: bool, passes: u32) -> PipelineConfiguration {
        PipelineConfiguration::new(s1, s2, s3, passes)
    }

    #[tokio::test]
    async fn test_all_disabled_returns_input() {
        let pipeline = Pipeline::new(Arc::new(StaticGenerator("X")));
        let result = pipeline.execute(FORMAL, &config(false, false, false, 0)).await;
        assert_eq!(result.final_text, FORMAL);
        assert!(result.stages_completed.is_empty());
        assert_eq!(result.stage1_output, FORMAL);
    }

    #[tokio::test]
    async fn test_stage1_only() {
        let pipeline = Pipeline::new(Arc::new(StaticGenerator("X")));
        let result = pipeline.execute("input", &config(true, false, false, 0)).await;
        assert_eq!(result.final_text, "X");
        assert_eq!(result.stages_completed, vec!["Paraphrasing"]);
        assert!(!result.is_degraded());
    }

    #[tokio::test]
    async fn test_stage1_failure_counts_as_completed() {
        let pipeline = Pipeline::new(Arc::new(UnavailableGenerator::new("down")));
        let result = pipeline.execute(FORMAL, &config(true, false, false, 0)).await;
        assert!(!result.final_text.is_empty());
        assert_eq!(result.final_text, "also, the system is effective. what's more, it is efficient.");
        assert_eq!(result.stages_completed, vec!["Paraphrasing"]);
        assert_eq!(result.degraded_stages, vec!["Paraphrasing"]);
    }

    #[tokio::test]
    async fn test_stage3_only_end_to_end() {
        let pipeline = Pipeline::new(Arc::new(UnavailableGenerator::new("unused")));
        let result = pipeline
            .execute_with_rng(FORMAL, &config(false, false, true, 0), &mut FixedRandom(0.99))
            .await;
        assert_eq!(result.final_text, "also, the system is effective. what's more, it is efficient.");
        assert_eq!(result.stages_completed, vec!["Enhancement"]);
        assert!(detection_score(&result.final_text) < detection_score(FORMAL));
    }

    #[tokio::test]
    async fn test_stage_chaining() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Some("paraphrased"),
            Some("pass one"),
            Some("pass two"),
        ]));
        let pipeline = Pipeline::new(generator.clone());
        let result = pipeline
            .execute_with_rng("original", &config(true, true, true, 2), &mut FixedRandom(0.99))
            .await;
        assert_eq!(result.stage1_output, "paraphrased");
        assert_eq!(result.stage2_output, "pass two");
        assert_eq!(result.stage3_output, "pass two");
        assert_eq!(result.final_text, "pass two");
        assert_eq!(
            result.stages_completed,
            vec!["Paraphrasing", "Humanization", "Enhancement"]
        );

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[1].contains("\"paraphrased\""));
    }

    #[tokio::test]
    async fn test_stage2_uses_original_when_stage1_disabled() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Some("humanized")]));
        let pipeline = Pipeline::new(generator.clone());
        let result = pipeline.execute("source text", &config(false, true, false, 1)).await;
        assert_eq!(result.final_text, "humanized");
        assert_eq!(result.stages_completed, vec!["Humanization"]);
        assert!(generator.prompts.lock().unwrap()[0].contains("\"source text\""));
    }

    #[tokio::test]
    async fn test_stage2_partial_failure_keeps_best_text() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Some("paraphrased"), Some("pass one"), None]));
        let pipeline = Pipeline::new(generator);
        let result = pipeline.execute("original", &config(true, true, false, 3)).await;
        assert_eq!(result.final_text, "pass one");
        assert_eq!(result.stages_completed, vec!["Paraphrasing", "Humanization"]);
        assert_eq!(result.degraded_stages, vec!["Humanization"]);
    }

    #[tokio::test]
    async fn test_empty_input_tolerated() {
        let pipeline = Pipeline::new(Arc::new(UnavailableGenerator::new("down")));
        let result = pipeline.execute("", &PipelineConfiguration::default()).await;
        assert_eq!(result.final_text, "");
        assert_eq!(result.stages_completed.len(), 3);
    }

    #[tokio::test]
    async fn test_stage1_panic_is_contained() {
        let pipeline = Pipeline::new(Arc::new(PanickingGenerator));
        let result = pipeline
            .execute_with_rng(FORMAL, &config(true, false, true, 0), &mut FixedRandom(0.99))
            .await;
        assert_eq!(result.stage1_output, "also, the system is effective. what's more, it is efficient.");
        assert_eq!(result.final_text, result.stage1_output);
        assert_eq!(result.stages_completed, vec!["Paraphrasing", "Enhancement"]);
        assert_eq!(result.degraded_stages, vec!["Paraphrasing"]);
    }

    #[tokio::test]
    async fn test_stage2_panic_keeps_input() {
        let pipeline = Pipeline::new(Arc::new(PanickingGenerator));
        let result = pipeline.execute("keep this", &config(false, true, false, 2)).await;
        assert_eq!(result.stage2_output, "keep this");
        assert_eq!(result.final_text, "keep this");
        assert_eq!(result.stages_completed, vec!["Humanization"]);
        assert_eq!(result.degraded_stages, vec!["Humanization"]);
    }

    #[tokio::test]
    async fn test_panic_does_not_escape_spawned_task() {
        let pipeline = Arc::new(Pipeline::new(Arc::new(PanickingGenerator)));
        let handle = tokio::spawn(async move {
            pipeline
                .execute(FORMAL, &PipelineConfiguration::default())
                .await
        });
        let result = handle.await.expect("pipeline task panicked");
        assert_eq!(result.stages_completed.len(), 3);
        assert!(!result.final_text.is_empty());
    }

    #[tokio::test]
    async fn test_blank_input_final_matches_last_stage() {
        let pipeline = Pipeline::new(Arc::new(UnavailableGenerator::new("unused")));
        let result = pipeline
            .execute_with_rng("   ", &config(false, false, true, 0), &mut FixedRandom(0.99))
            .await;
        assert_eq!(result.stage3_output, "");
        assert_eq!(result.final_text, result.stage3_output);
    }

    #[test]
    fn test_best_available_skips_empty() {
        let outputs = StageOutputs {
            stage1: Some("one".to_string()),
            stage2: Some("  ".to_string()),
            stage3: None,
            ..Default::default()
        };
        assert_eq!(outputs.best_available("orig"), "one");
        assert_eq!(StageOutputs::default().best_available("orig"), "orig");
    }
}
