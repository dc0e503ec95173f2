//! inkdoc CLI - document reconstruction from OCR detections

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use inkdoc::render::{self, JsonFormat, RenderOptions};
use inkdoc::{
    ClassifiedDocument, HttpOracle, HttpOracleConfig, LayoutOptions, OcrPage, Reconstructor,
    Tolerance,
};

#[derive(Parser)]
#[command(name = "inkdoc")]
#[command(version)]
#[command(about = "Rebuild structured documents from OCR detections", long_about = None)]
struct Cli {
    #[command(flatten)]
    pipeline: PipelineArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by every reconstructing command.
#[derive(Args, Clone)]
struct PipelineArgs {
    /// Row grouping threshold in pixels
    #[arg(long, global = true, value_name = "PX")]
    row_threshold: Option<f32>,

    /// Table column tolerance as a fraction of page width
    #[arg(long, global = true, value_name = "FRACTION")]
    table_tolerance: Option<f32>,

    /// Escalate unresolved rows to the HTTP classification oracle
    #[arg(long, global = true)]
    oracle: bool,

    /// API key for the oracle (defaults to OPENROUTER_API_KEY)
    #[arg(long, global = true, value_name = "KEY")]
    api_key: Option<String>,

    /// Oracle request timeout in seconds
    #[arg(long, global = true, default_value = "60", value_name = "SECS")]
    oracle_timeout: u64,

    /// Output compact JSON
    #[arg(long, global = true)]
    compact: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an OCR page as an HTML fragment
    Html {
        /// Input OCR JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Render tables without borders
        #[arg(long)]
        no_border: bool,
    },

    /// Render an OCR page as a document tree (JSON)
    Tree {
        /// Input OCR JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Attach geometry hints to the tree root
        #[arg(long)]
        hints: bool,

        /// Have the HTTP oracle write the tree from the page text and hints
        #[arg(long, conflicts_with = "hints")]
        generate: bool,
    },

    /// Render an OCR page as Markdown
    #[command(alias = "md")]
    Markdown {
        /// Input OCR JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Render an OCR page as plain text
    Text {
        /// Input OCR JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Dump the classified document as JSON
    Json {
        /// Input OCR JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Dump per-row geometry hints as JSON
    Hints {
        /// Input OCR JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Validate and normalize an externally produced document tree
    Normalize {
        /// Input document tree JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Write every output format into a directory
    Convert {
        /// Input OCR JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Reconstruct several OCR pages in parallel
    Batch {
        /// Input OCR JSON files
        #[arg(value_name = "FILES", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = "inkdoc_output")]
        output: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let pipeline = cli.pipeline;

    let result = match cli.command {
        Some(Commands::Html {
            input,
            output,
            no_border,
        }) => cmd_html(&pipeline, &input, output.as_deref(), no_border),
        Some(Commands::Tree {
            input,
            output,
            hints,
            generate,
        }) => cmd_tree(&pipeline, &input, output.as_deref(), hints, generate),
        Some(Commands::Markdown { input, output }) => {
            cmd_markdown(&pipeline, &input, output.as_deref())
        }
        Some(Commands::Text { input, output }) => cmd_text(&pipeline, &input, output.as_deref()),
        Some(Commands::Json { input, output }) => cmd_json(&pipeline, &input, output.as_deref()),
        Some(Commands::Hints { input, output }) => {
            cmd_hints(&pipeline, &input, output.as_deref())
        }
        Some(Commands::Normalize { input, output }) => {
            cmd_normalize(&pipeline, &input, output.as_deref())
        }
        Some(Commands::Convert { input, output }) => {
            cmd_convert(&pipeline, &input, output.as_deref())
        }
        Some(Commands::Batch { inputs, output }) => cmd_batch(&pipeline, &inputs, &output),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            println!("{}", "Usage: inkdoc <COMMAND> <FILE>".yellow());
            println!("       inkdoc --help for more information");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

fn build_reconstructor(args: &PipelineArgs) -> Result<Reconstructor, Box<dyn std::error::Error>> {
    let mut layout = LayoutOptions::new();
    if let Some(px) = args.row_threshold {
        layout = layout.with_row_threshold(Tolerance::Pixels(px));
    }
    if let Some(fraction) = args.table_tolerance {
        layout = layout.with_table_tolerance(Tolerance::PageFraction(fraction));
    }

    let mut reconstructor = Reconstructor::new().with_layout_options(layout);

    if args.oracle {
        reconstructor = reconstructor.with_oracle(http_oracle(args)?);
    }

    Ok(reconstructor)
}

fn http_oracle(args: &PipelineArgs) -> Result<HttpOracle, Box<dyn std::error::Error>> {
    let config = match &args.api_key {
        Some(key) => HttpOracleConfig::new(key.clone()).with_env_overrides(),
        None => HttpOracleConfig::from_env()?,
    }
    .with_timeout(Duration::from_secs(args.oracle_timeout));

    log::debug!("Using oracle {} ({})", config.endpoint, config.model);
    Ok(HttpOracle::new(config)?)
}

fn load(args: &PipelineArgs, input: &Path) -> Result<ClassifiedDocument, Box<dyn std::error::Error>> {
    let page = OcrPage::from_file(input)?;
    let doc = build_reconstructor(args)?.reconstruct_page(&page)?;
    Ok(doc)
}

fn json_format(args: &PipelineArgs) -> JsonFormat {
    if args.compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn emit(output: Option<&Path>, content: &str) -> CmdResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_html(args: &PipelineArgs, input: &Path, output: Option<&Path>, no_border: bool) -> CmdResult {
    let doc = load(args, input)?;
    let options = RenderOptions::new().with_table_border(!no_border);
    emit(output, &render::to_html(&doc, &options))
}

fn cmd_tree(
    args: &PipelineArgs,
    input: &Path,
    output: Option<&Path>,
    hints: bool,
    generate: bool,
) -> CmdResult {
    if generate {
        let page = OcrPage::from_file(input)?;
        let oracle = http_oracle(args)?;
        let tree = build_reconstructor(args)?.reconstruct_tree(
            &page.detections,
            page.page_width,
            &oracle,
        )?;
        return emit(output, &tree.to_json(json_format(args))?);
    }

    let doc = load(args, input)?;
    let options = RenderOptions::new().with_hints(hints);
    let tree = render::to_doc_tree(&doc, &options)?;
    emit(output, &tree.to_json(json_format(args))?)
}

fn cmd_markdown(args: &PipelineArgs, input: &Path, output: Option<&Path>) -> CmdResult {
    let doc = load(args, input)?;
    emit(output, &render::to_markdown(&doc, &RenderOptions::default()))
}

fn cmd_text(args: &PipelineArgs, input: &Path, output: Option<&Path>) -> CmdResult {
    let doc = load(args, input)?;
    emit(output, &render::to_text(&doc, &RenderOptions::default()))
}

fn cmd_json(args: &PipelineArgs, input: &Path, output: Option<&Path>) -> CmdResult {
    let doc = load(args, input)?;
    emit(output, &render::to_json(&doc, json_format(args))?)
}

fn cmd_hints(args: &PipelineArgs, input: &Path, output: Option<&Path>) -> CmdResult {
    let doc = load(args, input)?;
    emit(output, &render::hints_to_json(&doc.hints, json_format(args))?)
}

fn cmd_normalize(args: &PipelineArgs, input: &Path, output: Option<&Path>) -> CmdResult {
    let raw = fs::read_to_string(input)?;
    let tree = render::normalize(render::parse_doc_tree(&raw)?);
    emit(output, &tree.to_json(json_format(args))?)
}

fn cmd_convert(args: &PipelineArgs, input: &Path, output: Option<&Path>) -> CmdResult {
    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_output", stem))
    });

    fs::create_dir_all(&output_dir)?;

    let pb = ProgressBar::new(5);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Reconstructing layout...");
    let doc = load(args, input)?;
    let options = RenderOptions::default();
    pb.inc(1);

    pb.set_message("Generating HTML...");
    fs::write(output_dir.join("document.html"), render::to_html(&doc, &options))?;
    pb.inc(1);

    pb.set_message("Generating document tree...");
    let tree = render::to_doc_tree(&doc, &options)?;
    fs::write(output_dir.join("document.json"), tree.to_json(json_format(args))?)?;
    pb.inc(1);

    pb.set_message("Generating Markdown and text...");
    fs::write(output_dir.join("document.md"), render::to_markdown(&doc, &options))?;
    fs::write(output_dir.join("document.txt"), render::to_text(&doc, &options))?;
    pb.inc(1);

    pb.set_message("Writing classification...");
    fs::write(
        output_dir.join("classified.json"),
        render::to_json(&doc, json_format(args))?,
    )?;
    pb.inc(1);

    pb.finish_with_message("Done!");

    println!("\n{}", "Output files:".green().bold());
    println!("  {} document.html", "├─".dimmed());
    println!("  {} document.json", "├─".dimmed());
    println!("  {} document.md", "├─".dimmed());
    println!("  {} document.txt", "├─".dimmed());
    println!("  {} classified.json", "└─".dimmed());

    Ok(())
}

fn cmd_batch(args: &PipelineArgs, inputs: &[PathBuf], output_dir: &Path) -> CmdResult {
    fs::create_dir_all(output_dir)?;

    let pb = ProgressBar::new(inputs.len() as u64 * 2);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Loading pages...");
    let mut loaded = Vec::with_capacity(inputs.len());
    let mut pages = Vec::with_capacity(inputs.len());
    let mut load_errors = Vec::new();
    for input in inputs {
        match OcrPage::from_file(input) {
            Ok(page) => {
                loaded.push(input);
                pages.push(page);
            }
            Err(e) => load_errors.push((input.clone(), e.to_string())),
        }
        pb.inc(1);
    }

    pb.set_message("Reconstructing...");
    let reconstructor = build_reconstructor(args)?;
    let results = reconstructor.reconstruct_batch(&pages);

    let mut summary = Vec::new();
    let mut failed = load_errors.len();
    for (input, error) in &load_errors {
        summary.push(serde_json::json!({ "input": input.display().to_string(), "error": error }));
    }

    for (input, result) in loaded.into_iter().zip(results) {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        match result {
            Ok(doc) => {
                let html_path = output_dir.join(format!("{}.html", stem));
                fs::write(&html_path, render::to_html(&doc, &RenderOptions::default()))?;
                summary.push(serde_json::json!({
                    "input": input.display().to_string(),
                    "output": html_path.display().to_string(),
                    "stats": doc.stats,
                }));
            }
            Err(e) => {
                failed += 1;
                summary.push(serde_json::json!({
                    "input": input.display().to_string(),
                    "error": e.to_string(),
                }));
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Done!");

    fs::write(
        output_dir.join("summary.json"),
        serde_json::to_string_pretty(&summary)?,
    )?;

    println!(
        "\n{} {} pages, {} failed",
        "Processed".green().bold(),
        inputs.len(),
        failed
    );
    if failed > 0 {
        for entry in summary.iter().filter(|e| e.get("error").is_some()) {
            println!(
                "  {} {}: {}",
                "✗".red(),
                entry["input"].as_str().unwrap_or_default(),
                entry["error"].as_str().unwrap_or_default()
            );
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "inkdoc".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Document reconstruction from OCR detections");
    println!();
    println!("License: MIT");
}
