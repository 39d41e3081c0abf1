//! Faultline CLI entry point

use std::fs;
use std::io::Read;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use faultline::cli::{AnalyzeArgs, BlameArgs, Cli, Commands, HotspotsArgs, IndexArgs};
use faultline::fragility::{FragilityScorer, Normalizer};
use faultline::history::{self, HistoryLedger};
use faultline::prompt::ExplanationPrompt;
use faultline::render::{render_json, render_text, render_text_with, OutputFormat, Translator};
use faultline::{
    AnalysisConfig, AnalysisRequest, Engine, FaultlineError, SymbolIndex,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "faultline=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli) -> faultline::Result<String> {
    match &cli.command {
        Commands::Analyze(args) => run_analyze(cli, args),
        Commands::Index(args) => run_index(cli, args),
        Commands::Hotspots(args) => run_hotspots(cli, args),
        Commands::Blame(args) => run_blame(cli, args),
    }
}

/// Load the config file if given, then apply per-invocation overrides
fn load_config(cli: &Cli, args: &AnalyzeArgs) -> faultline::Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if let Some(window_days) = args.window_days {
        config.history.window_days = window_days;
    }
    if !args.strategies.is_empty() {
        config.strategies = args.strategies.clone();
    }
    config.validate()?;
    Ok(config)
}

fn read_trace(source: &str) -> faultline::Result<String> {
    if source == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        return Ok(raw);
    }
    fs::read_to_string(source).map_err(|_| FaultlineError::FileNotFound {
        path: source.to_string(),
    })
}

/// Tags rendered text with its target language for the downstream
/// generator. The wording itself stays in the source language until that
/// collaborator rewords it; scores and ordering are untouched.
struct TargetLanguage<'a>(&'a str);

impl Translator for TargetLanguage<'_> {
    fn translate(&self, text: &str) -> faultline::Result<String> {
        Ok(format!("[target language: {}]\n{}", self.0, text))
    }
}

fn run_analyze(cli: &Cli, args: &AnalyzeArgs) -> faultline::Result<String> {
    let config = load_config(cli, args)?;
    let raw_trace = read_trace(&args.trace)?;

    let engine = Engine::new(&args.root, config)?;
    let request = AnalysisRequest::new(raw_trace);
    let report = if args.no_cache {
        std::sync::Arc::new(engine.analyze_uncached(&request)?)
    } else {
        engine.analyze(&request)?
    };

    match cli.format {
        OutputFormat::Json => {
            let mut out = render_json(&report)?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Text => {
            let mut out = match args.lang.as_deref() {
                Some(lang) => render_text_with(&report, &TargetLanguage(lang))?,
                None => render_text(&report),
            };
            // assembled context for an external explanation generator
            let mut prompt = ExplanationPrompt::build(&report, args.depth);
            if let Some(lang) = &args.lang {
                prompt.instruction.push_str(&format!(" Respond in {}.", lang));
            }
            out.push_str("\n--- explanation context ---\n");
            out.push_str(&prompt.instruction);
            out.push('\n');
            out.push_str(&prompt.context);
            Ok(out)
        }
    }
}

fn run_index(cli: &Cli, args: &IndexArgs) -> faultline::Result<String> {
    if !args.dir.exists() {
        return Err(FaultlineError::FileNotFound {
            path: args.dir.display().to_string(),
        });
    }
    let config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    let (index, warnings) = SymbolIndex::rebuild(&args.dir, &config.scan);

    match cli.format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "files": index.file_count(),
                "symbols": index.symbol_count(),
                "warnings": warnings,
            });
            Ok(format!("{:#}\n", value))
        }
        OutputFormat::Text => {
            let mut out = format!(
                "indexed {} files, {} symbols\n",
                index.file_count(),
                index.symbol_count()
            );
            for file in index.files() {
                out.push_str(&format!(
                    "  {}: {} symbols\n",
                    file,
                    index.symbols_defined_in(file).len()
                ));
            }
            for warning in &warnings {
                out.push_str(&format!("  warning: {}\n", warning.describe()));
            }
            Ok(out)
        }
    }
}

fn run_hotspots(cli: &Cli, args: &HotspotsArgs) -> faultline::Result<String> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(window_days) = args.window_days {
        config.history.window_days = window_days;
    }

    let ledger = HistoryLedger::new(
        Box::new(history::source_for(&args.dir)),
        config.history.clone(),
    );
    if !ledger.is_available() {
        return Ok(format!(
            "no readable history at {}\n",
            args.dir.display()
        ));
    }

    let stats = ledger.repo_churn(config.history.window_days);
    let scorer = FragilityScorer::new(
        config.fragility.clone(),
        Normalizer::from_stats(&stats, ledger.now()),
        ledger.now(),
    );

    let mut scored: Vec<(f64, &faultline::ChurnStat)> =
        stats.iter().map(|s| (scorer.score(s), s)).collect();
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.file.cmp(&b.1.file))
    });
    scored.truncate(args.limit);

    match cli.format {
        OutputFormat::Json => {
            let value: Vec<serde_json::Value> = scored
                .iter()
                .map(|(score, stat)| {
                    serde_json::json!({
                        "file": stat.file,
                        "fragility": score,
                        "hot_spot": scorer.is_hot_spot(*score),
                        "changes": stat.change_count,
                        "authors": stat.author_count,
                        "bug_fixes": stat.bug_fix_count,
                    })
                })
                .collect();
            Ok(format!("{:#}\n", serde_json::Value::Array(value)))
        }
        OutputFormat::Text => {
            let mut out = format!(
                "fragility over the last {} days:\n",
                config.history.window_days
            );
            for (score, stat) in &scored {
                let marker = if scorer.is_hot_spot(*score) { " *" } else { "" };
                out.push_str(&format!(
                    "  {:.2}  {} ({} changes, {} authors, {} bug fixes){}\n",
                    score,
                    stat.file,
                    stat.change_count,
                    stat.author_count,
                    stat.bug_fix_count,
                    marker
                ));
            }
            if scored.is_empty() {
                out.push_str("  no changes in the window\n");
            }
            Ok(out)
        }
    }
}

fn run_blame(cli: &Cli, args: &BlameArgs) -> faultline::Result<String> {
    let ledger = HistoryLedger::new(
        Box::new(history::source_for(&args.root)),
        AnalysisConfig::default().history,
    );

    match ledger.blame_line(&args.file, args.line) {
        Some(record) => match cli.format {
            OutputFormat::Json => Ok(format!("{:#}\n", serde_json::json!(record))),
            OutputFormat::Text => Ok(format!(
                "{}:{} last changed by {} in {} ({})\n  {}\n",
                args.file, args.line, record.author, record.short_id, record.timestamp,
                record.subject
            )),
        },
        None => Ok(format!(
            "no blame information for {}:{}\n",
            args.file, args.line
        )),
    }
}
