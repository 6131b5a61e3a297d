//! sheet-lens CLI - spreadsheet structure analysis tool

mod gemini;
mod logger;
mod output;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use sheet_lens::chunk::{
    chunk_text, DEFAULT_FALLBACK_MAX_TOKENS, DEFAULT_MAX_TOKENS, REQUIREMENTS_MAX_TOKENS,
};
use sheet_lens::prelude::*;
use sheet_lens::render::summary_markdown;
use sheet_lens::{is_supported, ApproximateTokenCounter, WorkbookContext};
use std::path::{Path, PathBuf};

use gemini::GeminiGenerator;

#[derive(Parser)]
#[command(name = "sheetlens")]
#[command(
    author,
    version,
    about = "Explain the structure of Excel workbooks and draft requirements from them"
)]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a workbook, or every .xlsx/.xlsm file in a directory
    Analyze(AnalyzeArgs),

    /// Print the workbook summary
    Summary {
        /// Input workbook
        input: PathBuf,

        /// Print JSON instead of markdown
        #[arg(long)]
        json: bool,
    },

    /// Show how a text file would be chunked
    Chunk {
        /// Input text file, usually a combined workbook document
        input: PathBuf,

        /// Token ceiling per chunk
        #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
        max_tokens: usize,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Workbook file or directory of workbooks
    input: PathBuf,

    /// Output root; each workbook gets a subdirectory
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model name
    #[arg(long, default_value = "gemini-2.5-pro")]
    model: String,

    /// Token ceiling per chunk for the analysis report
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: usize,

    /// Ceiling used to split a chunk the service rejected
    #[arg(long, default_value_t = DEFAULT_FALLBACK_MAX_TOKENS)]
    fallback_max_tokens: usize,

    /// Token ceiling per chunk for the requirements document
    #[arg(long, default_value_t = REQUIREMENTS_MAX_TOKENS)]
    requirements_max_tokens: usize,

    /// Write the structural analysis only; no text generation
    #[arg(long)]
    offline: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(logger::level_for(cli.verbose, cli.quiet));

    match cli.command {
        Commands::Analyze(args) => analyze(&args),
        Commands::Summary { input, json } => show_summary(&input, json),
        Commands::Chunk { input, max_tokens } => show_chunks(&input, max_tokens),
    }
}

/// Workbooks named by `input`, sorted by path
fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    let entries = std::fs::read_dir(input)
        .with_context(|| format!("Failed to read directory '{}'", input.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_supported(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn analyze(args: &AnalyzeArgs) -> Result<()> {
    let generator = if args.offline {
        None
    } else {
        let Some(key) = args.api_key.as_deref().filter(|k| !k.is_empty()) else {
            bail!("No API key: pass --api-key, set GEMINI_API_KEY, or use --offline");
        };
        Some(GeminiGenerator::new(key, &args.model)?)
    };

    let inputs = collect_inputs(&args.input)?;
    if inputs.is_empty() {
        log::warn!("no workbooks found in '{}'", args.input.display());
        return Ok(());
    }

    let mut failed = 0;
    for input in &inputs {
        eprintln!("Processing {}...", input.display());
        if let Err(e) = analyze_one(args, input, generator.as_ref()) {
            log::error!("{}: {:#}", input.display(), e);
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{} of {} workbook(s) failed", failed, inputs.len());
    }
    Ok(())
}

fn analyze_one(args: &AnalyzeArgs, input: &Path, generator: Option<&GeminiGenerator>) -> Result<()> {
    let workbook =
        Workbook::open(input).with_context(|| format!("Failed to open '{}'", input.display()))?;
    let analysis = analyze_workbook(&workbook);

    let dir = output::workbook_dir(&args.output, input);
    let source = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let combined = output::write_analysis(&dir, &source, &analysis)?;
    eprintln!(
        "Wrote {} sheet(s) to '{}' ({} formulas, complexity {})",
        analysis.sheets.len(),
        dir.display(),
        analysis.summary.total_formulas(),
        analysis.summary.complexity_rating
    );

    let Some(generator) = generator else {
        return Ok(());
    };

    let report = ChunkedAnalyzer::new(generator)
        .with_chunker(ChunkerConfig {
            max_tokens: args.max_tokens,
            fallback_max_tokens: args.fallback_max_tokens,
        })
        .analyze(&combined)
        .context("Analysis report failed")?;
    let path = output::write_report(&dir, &report.text)?;
    eprintln!(
        "Created analysis report: {} ({} chunk(s), {} missing)",
        path.display(),
        report.chunk_count,
        report.failures.len()
    );

    let context = WorkbookContext::from_summary(&analysis.summary);
    let requirements = ChunkedAnalyzer::new(generator)
        .with_chunker(ChunkerConfig {
            max_tokens: args.requirements_max_tokens,
            fallback_max_tokens: args.fallback_max_tokens,
        })
        .requirements(&combined, &context)
        .context("Requirements document failed")?;
    let generated = chrono::Local::now().naive_local();
    let path = output::write_requirements(&dir, &requirements.text, generated)?;
    eprintln!("Created requirements document: {}", path.display());

    Ok(())
}

fn show_summary(input: &Path, json: bool) -> Result<()> {
    let workbook =
        Workbook::open(input).with_context(|| format!("Failed to open '{}'", input.display()))?;
    let analysis = analyze_workbook(&workbook);

    if json {
        println!(
            "{}",
            analysis
                .summary
                .to_json_pretty()
                .context("Failed to serialize summary")?
        );
    } else {
        print!("{}", summary_markdown(&analysis.summary));
    }
    Ok(())
}

fn show_chunks(input: &Path, max_tokens: usize) -> Result<()> {
    if max_tokens == 0 {
        bail!("--max-tokens must be at least 1");
    }
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;

    let chunks = chunk_text(&text, max_tokens, &ApproximateTokenCounter);
    println!("File: {}", input.display());
    println!("Chunks: {}", chunks.len());

    let mut first_line = 1;
    for chunk in &chunks {
        let last_line = first_line + chunk.lines.len() - 1;
        let marker = if chunk.token_count > max_tokens {
            " (oversized line)"
        } else {
            ""
        };
        println!(
            "  {}. lines {}-{}, {} tokens{}",
            chunk.index + 1,
            first_line,
            last_line,
            chunk.token_count,
            marker
        );
        first_line = last_line + 1;
    }
    Ok(())
}
