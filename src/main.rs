use anyhow::{Context, Result};
use rehumanizer_lib::models::HumanizeRequest;
use rehumanizer_lib::services::{
    AppConfig, ConfigStore, HumanizeService, ProviderGenerator, StdRandom, TextGenerator,
};
use std::io::Read;
use std::sync::Arc;
use tracing::{info, warn};

const USAGE: &str = "Usage:
  rehumanizer [<path> | -] [--provider <name[:model]>] [--pipeline <comprehensive|enhanced|fluency|quick>]
              [--level <elementary|middle|high|undergraduate|graduate>] [--seed <n>] [--out <json_path>] [--json]
  rehumanizer --health [--provider <name[:model]>]

Notes:
  - Reads stdin when no path (or `-`) is given.
  - Without a usable provider every generative stage falls back to local rewriting.
  - API keys come from GEMINI_API_KEY / OPENAI_API_KEY / ... or the config file.";

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

/// First positional argument, skipping values of known options.
fn input_path(args: &[String]) -> Option<String> {
    const WITH_VALUE: &[&str] = &["--provider", "--pipeline", "--level", "--seed", "--out"];
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if WITH_VALUE.contains(&arg.as_str()) {
            iter.next();
        } else if arg == "-" || !arg.starts_with("--") {
            return Some(arg.clone());
        }
    }
    None
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(p) if p != "-" => {
            std::fs::read_to_string(p).with_context(|| format!("read file failed: {}", p))
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("read stdin failed")?;
            Ok(buf)
        }
    }
}

fn build_generator(provider: Option<&str>, config: &AppConfig) -> Option<Arc<dyn TextGenerator>> {
    let spec = provider.map(str::to_string).or_else(|| config.default_provider.clone())?;
    let proxy = config.proxy_url();
    match ProviderGenerator::from_spec(&spec, proxy.as_deref()) {
        Ok(generator) => {
            info!("[CLI] generator ready: {}", generator.label());
            Some(Arc::new(generator))
        }
        Err(e) => {
            warn!("[CLI] provider {} unavailable, using local fallbacks: {}", spec, e);
            None
        }
    }
}

fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

#[tokio::main]
async fn main() -> Result<()> {
    rehumanizer_lib::init_logging();

    let args: Vec<String> = std::env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = match ConfigStore::open_default() {
        Some(store) => store.load().unwrap_or_else(|e| {
            warn!("[CLI] {}; using defaults", e);
            AppConfig::default()
        }),
        None => AppConfig::default(),
    };

    let provider = parse_arg_value(&args, "--provider");
    let generator = build_generator(provider.as_deref(), &config);
    let service = HumanizeService::new(generator)
        .with_max_input_chars(config.humanizer.max_input_chars)
        .with_stage2_passes(config.humanizer.stage2_passes);

    if has_flag(&args, "--health") {
        println!("{}", serde_json::to_string_pretty(&service.health())?);
        return Ok(());
    }

    let text = read_input(input_path(&args).as_deref())?;
    let request = HumanizeRequest {
        text,
        pipeline_type: Some(
            parse_arg_value(&args, "--pipeline").unwrap_or_else(|| config.humanizer.pipeline.clone()),
        ),
        education_level: Some(
            parse_arg_value(&args, "--level").unwrap_or_else(|| config.humanizer.education_level.clone()),
        ),
    };

    let seed = match parse_arg_value(&args, "--seed") {
        Some(s) => Some(s.parse::<u64>().with_context(|| format!("invalid --seed: {}", s))?),
        None => None,
    };
    let mut rng = match seed {
        Some(seed) => StdRandom::seeded(seed),
        None => StdRandom::from_entropy(),
    };

    let response = service.humanize_with_rng(&request, &mut rng).await?;

    if has_flag(&args, "--json") {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", response.humanized_text);
        eprintln!();
        eprintln!(
            "pipeline={} level={} stages={} fallback={} time={}ms",
            response.pipeline_type,
            response.education_level,
            response.pipeline_result.stages_completed.join(","),
            response.fallback_used,
            response.processing_time_ms
        );
        eprintln!(
            "score {:.2} -> {:.2}  entropy {:+.3}  length x{:.2}",
            response.ai_detection_score_before,
            response.ai_detection_score_after,
            response.readability_improvement,
            response.length_ratio
        );
        eprintln!("paraphrase: {}", preview(&response.paraphrased_text, 120));
    }

    if let Some(out_path) = parse_arg_value(&args, "--out") {
        let json = serde_json::to_string_pretty(&response)?;
        std::fs::write(&out_path, json).with_context(|| format!("write out failed: {}", out_path))?;
        eprintln!("Wrote JSON: {}", out_path);
    }

    Ok(())
}
