use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use grove_ast::DumpFormat;
use grove_cli::{parse_source, render_human, ParseReport};
use grove_config::{ConfigDiagnostics, GroveConfig};

#[derive(Parser)]
#[command(name = "grove", version, about = "Groovy front-end: parse files and inspect their AST")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a single file and print its diagnostics
    Parse(ParseArgs),
}

#[derive(Args)]
struct ParseArgs {
    /// File to parse
    file: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
    /// Also print a debug dump of the AST: source, tree or html
    #[arg(long)]
    dump: Option<DumpFormat>,
    /// Config file (defaults to `grove.toml` in the current directory)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override `converter.max_nesting_depth`
    #[arg(long)]
    max_nesting_depth: Option<usize>,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Parse(args) => {
            let (config, source, diagnostics) = load_config(args.config.as_ref())?;
            grove_config::init_tracing(&config.logging);
            if let Some(path) = &source {
                report_config_diagnostics(path, &diagnostics);
            }

            let mut options = config.converter.convert_options();
            if let Some(depth) = args.max_nesting_depth {
                options.max_nesting_depth = depth;
            }
            let dump = args.dump.or_else(|| config.converter.dump_format());

            let text = std::fs::read_to_string(&args.file)
                .with_context(|| format!("failed to read {}", args.file.display()))?;
            let report = parse_source(&args.file, &text, &options, dump)
                .with_context(|| format!("failed to convert {}", args.file.display()))?;
            let exit = if report.has_errors() { 1 } else { 0 };
            print_output(&report, args.json)?;
            Ok(exit)
        }
    }
}

fn load_config(
    explicit: Option<&PathBuf>,
) -> Result<(GroveConfig, Option<PathBuf>, ConfigDiagnostics)> {
    if let Some(path) = explicit {
        let (config, diagnostics) = GroveConfig::load_from_path_with_diagnostics(path)?;
        return Ok((config, Some(path.clone()), diagnostics));
    }
    let cwd = std::env::current_dir().context("failed to read the current directory")?;
    Ok(grove_config::load_for_root_with_diagnostics(&cwd)?)
}

fn report_config_diagnostics(path: &Path, diagnostics: &ConfigDiagnostics) {
    for key in &diagnostics.unknown_keys {
        tracing::warn!(target: "grove.cli", path = %path.display(), "unknown config key `{key}`");
    }
    for warning in &diagnostics.warnings {
        tracing::warn!(target: "grove.cli", path = %path.display(), "{warning}");
    }
}

fn print_output(report: &ParseReport, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(report)?;
        println!("{out}");
    } else {
        print!("{}", render_human(report));
    }
    Ok(())
}
