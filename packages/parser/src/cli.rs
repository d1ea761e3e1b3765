//! Command-line interface for the guidelines parser.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{validate_chapter, DEFAULT_OUTPUT_DIR, DEFAULT_PDF_DIR};
use crate::corpus::PdfCorpus;
use crate::error::Result;
use crate::interpret::{AnthropicClient, InterpreterConfig, LlmInterpreter};
use crate::output::{default_output_path, merge_sections, save_chapter};
use crate::parser::{GuidelinesParser, SectionOutcome};
use crate::text::truncate_chars;
use crate::types::{ExtractedText, SectionId};
use crate::validator::ValidationIssue;

type PdfParser = GuidelinesParser<PdfCorpus, LlmInterpreter<AnthropicClient>>;

/// USSG Parser - Convert Sentencing Guidelines Chapter 2 PDFs into decision-tree JSON.
#[derive(Parser)]
#[command(name = "ussg-parser")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the GLMFull <n>.pdf files
    #[arg(long, global = true, default_value = DEFAULT_PDF_DIR)]
    pub pdf_dir: PathBuf,

    /// Directory for per-chapter JSON output
    #[arg(long, global = true, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every section found in the corpus, grouped by chapter.
    Scan,

    /// Parse a single section and merge it into its chapter file.
    Section {
        /// Section identifier (e.g., 2K2.1)
        section: String,

        /// Extract and segment only, without calling the LLM
        #[arg(long)]
        dry_run: bool,

        /// Output file (default: <output-dir>/<chapter>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse every section of a chapter and write the chapter file.
    Chapter {
        /// Chapter prefix (e.g., 2K)
        chapter: String,

        /// Extract and segment only, without calling the LLM
        #[arg(long)]
        dry_run: bool,

        /// Output file (default: <output-dir>/<chapter>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan => scan_command(&cli.pdf_dir),
        Commands::Section {
            section,
            dry_run,
            output,
        } => section_command(
            &cli.pdf_dir,
            &cli.output_dir,
            &section,
            dry_run,
            output.as_deref(),
        ),
        Commands::Chapter {
            chapter,
            dry_run,
            output,
        } => chapter_command(
            &cli.pdf_dir,
            &cli.output_dir,
            &chapter,
            dry_run,
            output.as_deref(),
        ),
    }
}

/// Build a parser; the LLM is only configured when it will be called.
fn build_parser(pdf_dir: &Path, dry_run: bool) -> Result<PdfParser> {
    let parser = GuidelinesParser::new(PdfCorpus::new(pdf_dir));
    if dry_run {
        return Ok(parser);
    }
    let config = InterpreterConfig::from_env()?;
    let client = AnthropicClient::new(&config)?;
    Ok(parser.with_interpreter(LlmInterpreter::new(client, &config)))
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Execute the scan command.
fn scan_command(pdf_dir: &Path) -> Result<()> {
    println!(
        "{} {}",
        style("Scanning").bold(),
        style(pdf_dir.display()).cyan()
    );

    let parser: PdfParser = GuidelinesParser::new(PdfCorpus::new(pdf_dir));
    let pb = spinner("Locating section headers...");
    let sections = parser.scan_sections();
    pb.finish_and_clear();

    println!();
    println!(
        "Found {} sections",
        style(sections.len()).green().bold()
    );

    for (chapter, locations) in sections.by_chapter() {
        println!();
        println!(
            "{} ({} sections)",
            style(&chapter).bold(),
            locations.len()
        );
        for location in locations {
            println!(
                "  §{:<8} {:<63} {}",
                location.section,
                truncate_chars(&location.title, 60),
                style(location.start).dim()
            );
        }
    }

    Ok(())
}

/// Execute the section command.
fn section_command(
    pdf_dir: &Path,
    output_dir: &Path,
    section: &str,
    dry_run: bool,
    output: Option<&Path>,
) -> Result<()> {
    // Validate input before touching the corpus or the LLM configuration
    let section = SectionId::parse(section)?;
    let parser = build_parser(pdf_dir, dry_run)?;

    println!(
        "{} {}",
        style("Parsing").bold(),
        style(format!("§{section}")).cyan()
    );

    let pb = spinner("Scanning and interpreting...");
    let outcome = parser.parse_section(&section, dry_run);
    pb.finish_and_clear();

    match outcome? {
        SectionOutcome::DryRun(extracted) => print_dry_run(&extracted),
        SectionOutcome::Parsed { rules, issues } => {
            println!("  Title: {}", style(&rules.title).green());
            print_issues(&section.to_string(), &issues);

            let path = output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| default_output_path(output_dir, section.chapter()));
            let sections = BTreeMap::from([(section.to_string(), rules)]);
            let total = merge_sections(&path, &sections)?;

            println!();
            println!(
                "{} {} ({} sections)",
                style("Saved to:").green().bold(),
                path.display(),
                total
            );
        }
    }

    Ok(())
}

/// Execute the chapter command.
fn chapter_command(
    pdf_dir: &Path,
    output_dir: &Path,
    chapter: &str,
    dry_run: bool,
    output: Option<&Path>,
) -> Result<()> {
    validate_chapter(chapter)?;
    let parser = build_parser(pdf_dir, dry_run)?;

    println!(
        "{} chapter {}",
        style("Parsing").bold(),
        style(chapter).cyan()
    );

    let pb = spinner("Scanning and interpreting...");
    let report = parser.parse_chapter(chapter, dry_run);
    pb.finish_and_clear();
    let report = report?;

    for extracted in &report.dry_runs {
        print_dry_run(extracted);
    }

    for (section, issues) in &report.issues {
        print_issues(section, issues);
    }

    for failure in &report.failures {
        println!(
            "  {} §{} ({}): {}",
            style("Failed").red().bold(),
            failure.section,
            failure.stage,
            failure.error
        );
    }

    if dry_run {
        return Ok(());
    }

    if report.sections.is_empty() {
        println!();
        println!("{}", style("No sections parsed, nothing written").yellow());
        return Ok(());
    }

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(output_dir, chapter));
    save_chapter(&path, &report.sections)?;

    println!();
    println!("  Parsed: {}", style(report.sections.len()).green());
    if report.issue_count() > 0 {
        println!("  Warnings: {}", style(report.issue_count()).yellow().bold());
    }
    if !report.failures.is_empty() {
        println!("  Failed: {}", style(report.failures.len()).red().bold());
    }
    println!(
        "{} {}",
        style("Saved to:").green().bold(),
        path.display()
    );

    Ok(())
}

fn print_dry_run(extracted: &ExtractedText) {
    println!();
    println!(
        "§{} {}",
        style(&extracted.section).cyan(),
        extracted.title
    );
    println!("  Source: {}", extracted.pdf_reference);
    println!("  Full text: {} chars", extracted.full_text.chars().count());
    println!(
        "  Base offense: {} chars",
        extracted.base_offense_text.chars().count()
    );
    println!(
        "  Specific offense characteristics: {} chars",
        extracted.soc_text.chars().count()
    );
    println!(
        "  Cross reference: {} chars",
        extracted.cross_reference_text.chars().count()
    );
}

fn print_issues(section: &str, issues: &[ValidationIssue]) {
    for issue in issues {
        println!(
            "  {} §{}: {}",
            style("Warning").yellow().bold(),
            section,
            issue
        );
    }
}
