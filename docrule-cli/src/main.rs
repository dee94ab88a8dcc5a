use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

// Import from docrule-core
use docrule_core::{
    emit_report, Annotator, CheckConfig, CheckReport, DocumentChecker, RulesetStore, WriterSink,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "docrule")]
#[command(about = "Check a document's formatting against a ruleset")]
struct Args {
    /// Path to the document to check (.docx, or a .json document model)
    #[arg(short, long, required_unless_present = "list_rulesets")]
    input: Option<PathBuf>,

    /// Id of the ruleset to check against
    #[arg(short, long, required_unless_present = "list_rulesets")]
    ruleset: Option<String>,

    /// Ruleset overlay file (YAML); defaults to <config dir>/docrule/rulesets.yaml
    #[arg(long)]
    rulesets: Option<PathBuf>,

    /// Path to custom check config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Report format on stdout
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Also write the JSON report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a copy of the document with violating paragraphs highlighted
    #[arg(long)]
    annotate: Option<PathBuf>,

    /// List available rulesets and exit
    #[arg(long)]
    list_rulesets: bool,

    /// Log per-step and per-checker timings
    #[arg(long)]
    profile: bool,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        "debug"
    } else if args.profile {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let code = match run(&args) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            eprintln!("❌ {e:#}");
            2
        }
    };
    std::process::exit(code);
}

/// Ok(true) when the document complies.
fn run(args: &Args) -> Result<bool> {
    let store = RulesetStore::with_overlay(args.rulesets.as_deref())?;

    if args.list_rulesets {
        list_rulesets(&store)?;
        return Ok(true);
    }

    let (Some(input), Some(ruleset_id)) = (&args.input, &args.ruleset) else {
        anyhow::bail!("--input and --ruleset are required");
    };

    let config = CheckConfig::load_with_fallback(args.config.as_deref());
    match &args.config {
        Some(path) => log::info!("📋 Loaded config from: {path}"),
        None => log::info!("📋 Using default config"),
    }
    let report_config = config.report.clone();

    let mut checker = DocumentChecker::new(store, config);
    let report = checker.check_file_with_profiling(input, ruleset_id, args.profile)?;

    match args.format {
        OutputFormat::Text => {
            let mut sink = WriterSink::new(io::stdout().lock());
            emit_report(&report, &mut sink, &report_config);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if let Some(path) = &args.output {
        save_report(&report, path)?;
    }

    // Annotation runs only once every checker has finished
    if let Some(target) = &args.annotate {
        let summary = Annotator::default().annotate(&report, target)?;
        eprintln!(
            "🖍️  Annotated copy saved to {} ({} paragraph(s) highlighted)",
            summary.target.display(),
            summary.highlighted
        );
    }

    Ok(report.is_valid)
}

fn list_rulesets(store: &RulesetStore) -> Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "📋 Available rulesets:")?;
    for ruleset in store.list() {
        writeln!(out, "  {:<24} {}", ruleset.id, ruleset.display_name())?;
        if let Some(description) = &ruleset.description {
            writeln!(out, "  {:<24} {}", "", description)?;
        }
    }
    Ok(())
}

fn save_report(report: &CheckReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    eprintln!("💾 Report saved to: {}", path.display());
    Ok(())
}
