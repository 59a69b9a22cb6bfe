use rehumanizer_lib::services::scoring::{score_report, ScoreReport};
use rehumanizer_lib::services::text_processor::{normalize_punctuation, word_count};
use serde::Serialize;

fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn main() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage:\n  cargo run --bin score_text -- <path.txt> [--paragraphs] [--out <json_path>]\n\nNotes:\n  - Scores the whole file, and each paragraph with `--paragraphs`.\n  - Scores are heuristic: 0.5 is neutral, higher reads more machine-written."
        );
        return Ok(());
    }

    let path = args[1].clone();
    let per_paragraph = has_flag(&args, "--paragraphs");
    let out_path = parse_arg_value(&args, "--out");

    let raw = std::fs::read_to_string(&path).map_err(|e| format!("read file failed: {}", e))?;
    let text = normalize_punctuation(&raw);
    let report = score_report(&text);

    println!("File: {}", path);
    println!("Text: {} chars, {} words", text.chars().count(), word_count(&text));
    println!("Detection score: {:.3}", report.score);
    println!("Word entropy: {:.3} bits", report.perplexity);
    println!("Markers: ai={} human={}", report.ai_markers, report.human_markers);

    let paragraphs: Vec<(String, ScoreReport)> = if per_paragraph {
        text.split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| (p.to_string(), score_report(p)))
            .collect()
    } else {
        Vec::new()
    };

    if !paragraphs.is_empty() {
        println!();
        println!("Paragraphs: {}", paragraphs.len());
        for (i, (p, r)) in paragraphs.iter().enumerate() {
            println!(
                "[P{:03}] score={:.3} entropy={:.3} ai={} human={}  {}",
                i,
                r.score,
                r.perplexity,
                r.ai_markers,
                r.human_markers,
                preview(p, 100)
            );
        }
    }

    if let Some(out_path) = out_path {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct ParagraphScore {
            index: usize,
            chars: usize,
            report: ScoreReport,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Output {
            file: String,
            chars: usize,
            words: usize,
            report: ScoreReport,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            paragraphs: Vec<ParagraphScore>,
        }

        let out = Output {
            file: path.clone(),
            chars: text.chars().count(),
            words: word_count(&text),
            report,
            paragraphs: paragraphs
                .iter()
                .enumerate()
                .map(|(index, (p, r))| ParagraphScore {
                    index,
                    chars: p.chars().count(),
                    report: r.clone(),
                })
                .collect(),
        };

        let json = serde_json::to_string_pretty(&out).map_err(|e| e.to_string())?;
        std::fs::write(&out_path, json).map_err(|e| format!("write out failed: {}", e))?;
        println!();
        println!("Wrote JSON: {}", out_path);
    }

    Ok(())
}
