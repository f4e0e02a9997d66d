use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use elide_core::{BarrierElisionEngine, ElisionConfig};
use elide_emit::{
    count_lines, AnnotatedEmitter, AnnotationConfig, EmitContext, EmitHelper, Emitter,
    EmitterConfig, JsonReport, OutputFormat, VerbosityLevel,
};
use elide_parser::ParsedModule;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "elide")]
#[command(about = "elide - GC barrier elision reports for textual JIT IR")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate every access with the barrier it needs.
    Analyze {
        /// An `.eir` file, or a directory searched for them.
        path: PathBuf,

        #[arg(long)]
        json: bool,

        #[arg(long, conflicts_with = "json")]
        ascii: bool,

        #[arg(long)]
        no_color: bool,

        /// Elision settings as JSON.
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long)]
        verbose: bool,
    },

    /// Print `method kind strength count` for each method.
    Counts {
        input: PathBuf,

        #[arg(short, long)]
        method: Option<String>,

        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check that a file parses, analyzes, and meets its `; barrier:` notes.
    Validate {
        input: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Analyze { verbose, .. } | Commands::Validate { verbose, .. } => *verbose,
        Commands::Counts { .. } => false,
    };
    init_logging(verbose);

    match cli.command {
        Commands::Analyze {
            path,
            json,
            ascii,
            no_color,
            config,
            output,
            verbose,
        } => {
            let format = if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            };
            cmd_analyze(path, format, ascii, no_color, config, output, verbose)
        }
        Commands::Counts {
            input,
            method,
            config,
        } => cmd_counts(input, method, config),
        Commands::Validate {
            input,
            config,
            verbose,
        } => cmd_validate(input, config, verbose),
    }
}

/// Logs go to stderr so they never mix with reports on stdout.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    // A second init only happens under test harnesses; the first one wins.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<ElisionConfig> {
    match path {
        Some(path) => ElisionConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(ElisionConfig::default()),
    }
}

/// `path` itself, or every `.eir` file below it in a stable order.
fn collect_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut inputs = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry?;
        let is_eir = entry.path().extension().is_some_and(|ext| ext == "eir");
        if entry.file_type().is_file() && is_eir {
            inputs.push(entry.into_path());
        }
    }

    if inputs.is_empty() {
        bail!("no .eir files found under {}", path.display());
    }
    Ok(inputs)
}

fn load_module(input: &Path) -> Result<ParsedModule> {
    elide_parser::parse_file(input).with_context(|| format!("failed to parse {}", input.display()))
}

fn cmd_analyze(
    path: PathBuf,
    format: OutputFormat,
    ascii: bool,
    no_color: bool,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let inputs = collect_inputs(&path)?;
    info!(files = inputs.len(), "analyzing {}", path.display());

    let emitter_config = EmitterConfig {
        use_colors: !no_color && output.is_none(),
        verbosity: if verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        },
        ..EmitterConfig::default()
    };
    let annotation_config = AnnotationConfig {
        use_ascii_cues: ascii,
        ..AnnotationConfig::default()
    };

    let mut text = Vec::new();
    let mut reports = Vec::new();

    for input in &inputs {
        let parsed = load_module(input)?;
        let emitter = AnnotatedEmitter::analyze(&parsed.module, &config)
            .with_context(|| format!("failed to analyze {}", input.display()))?
            .with_config(emitter_config.clone())
            .with_annotation_config(annotation_config.clone());
        debug!(
            methods = parsed.module.methods.len(),
            "analyzed {}",
            input.display()
        );

        match format {
            OutputFormat::Json => {
                reports.push(JsonReport::new(&parsed.module.name, emitter.annotations()));
            }
            OutputFormat::Text => {
                let mut context = EmitContext::from_config(&emitter_config);
                if inputs.len() > 1 {
                    EmitHelper::write_section(&mut text, &context, &input.display().to_string())?;
                }
                emitter.emit(&parsed.module, &mut text, &mut context)?;
            }
        }
    }

    let rendered = match format {
        OutputFormat::Json if reports.len() == 1 => reports[0].to_json()? + "\n",
        OutputFormat::Json => serde_json::to_string_pretty(&reports)? + "\n",
        OutputFormat::Text => String::from_utf8(text)?,
    };

    match output {
        Some(output_path) => {
            fs::write(&output_path, &rendered)
                .with_context(|| format!("failed to write {}", output_path.display()))?;
            if verbose {
                eprintln!(
                    " {} Report written to {}",
                    "SUCCESS:".bright_green().bold(),
                    output_path.display()
                );
            }
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

fn cmd_counts(input: PathBuf, method: Option<String>, config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let parsed = load_module(&input)?;

    let methods: Vec<_> = match &method {
        Some(name) => vec![parsed
            .module
            .get_method(name)
            .with_context(|| format!("no method @{} in {}", name, input.display()))?],
        None => parsed.module.methods.values().collect(),
    };

    for method in methods {
        let annotation = BarrierElisionEngine::run(method, &config)
            .with_context(|| format!("barrier elision failed for method @{}", method.name))?;
        for line in count_lines(&annotation) {
            println!("{}", line);
        }
    }

    Ok(())
}

fn cmd_validate(input: PathBuf, config: Option<PathBuf>, verbose: bool) -> Result<()> {
    if verbose {
        println!("{}", " Validating barrier annotations".bright_cyan().bold());
        println!("{}", "=".repeat(50).bright_cyan());
        println!(" Input: {}", input.display());
        println!();
    }

    let config = load_config(config.as_deref())?;
    let parsed = match elide_parser::parse_file(&input) {
        Ok(parsed) => parsed,
        Err(e) => {
            println!("{}", " INVALID".bright_red().bold());
            println!("\n{}", "Parse Error:".bright_red());
            println!("{}", e);
            bail!("Validation failed");
        }
    };

    let mut mismatches = Vec::new();
    let mut checked = 0;

    for method in parsed.module.methods.values() {
        let annotation = match BarrierElisionEngine::run(method, &config) {
            Ok(annotation) => annotation,
            Err(e) => {
                println!("{}", " INVALID".bright_red().bold());
                println!("\n{} @{}: {}", "Analysis Error:".bright_red(), method.name, e);
                bail!("Validation failed");
            }
        };

        for expectation in parsed
            .expectations
            .iter()
            .filter(|e| e.method == method.name)
        {
            checked += 1;
            let actual = annotation.get(expectation.node);
            let matches = actual.is_some_and(|a| a.strength == expectation.strength);
            if !matches {
                let found = actual
                    .map(|a| format!("{} ({})", a.strength, a.reason))
                    .unwrap_or_else(|| "not a memory access".to_string());
                mismatches.push(format!(
                    "@{} {}: expected {}, got {}",
                    method.name, expectation.node, expectation.strength, found
                ));
            }
        }

        if verbose {
            let counts = annotation.counts();
            println!(
                "   @{}: {} accesses, {} barriers emitted, {} elided",
                method.name,
                annotation.len(),
                counts.emitted(),
                counts.elided()
            );
        }
    }

    if mismatches.is_empty() {
        println!("{}", " VALID".bright_green().bold());
        if verbose {
            println!(
                "   {} methods, {} barrier notes checked",
                parsed.module.methods.len(),
                checked
            );
        }
        Ok(())
    } else {
        println!("{}", " INVALID".bright_red().bold());
        for mismatch in &mismatches {
            println!("   {}", mismatch);
        }
        bail!("{} barrier note(s) not met", mismatches.len())
    }
}
