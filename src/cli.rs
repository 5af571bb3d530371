//! Command-line surface: a single flat command (there is only one operation, "compile this
//! file"), unlike the reference tool's subcommand split between parse/tree/compile/analyze.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::Parser;
use log::info;

use crate::compiler::Compiler;
use crate::diagnostics::{Diagnostic, Severity};
use crate::generator::GeneratorKind;
use crate::options::{ApiVersion, Options};

#[derive(Parser)]
#[command(name = "idlc")]
#[command(about = "Interface definition language compiler", version, author)]
pub struct Cli {
    /// The root .idl file to compile
    #[arg(required = true)]
    input: PathBuf,

    /// Back-end to generate: c or js
    #[arg(long, value_name = "NAME")]
    generator: Option<String>,

    /// Where to write generated output (defaults to stdout)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Additional directory to search when resolving imports; may be repeated
    #[arg(long = "imports", value_name = "DIR")]
    imports: Vec<PathBuf>,

    /// Preprocessor-style addition name to enable; may be repeated
    #[arg(long = "additions", value_name = "NAME")]
    additions: Vec<String>,

    /// Treat warnings as errors
    #[arg(long, default_value_t = false)]
    warnings: bool,

    /// API version stamped into the compiled context, as MAJOR.MINOR.MICRO
    #[arg(long, value_name = "MAJOR.MINOR.MICRO")]
    apiver: Option<String>,
}

fn parse_apiver(s: &str) -> Result<ApiVersion> {
    let parts: Vec<&str> = s.split('.').collect();
    let [major, minor, micro] = parts[..] else {
        return Err(anyhow!("invalid --apiver '{}': expected MAJOR.MINOR.MICRO", s));
    };
    Ok(ApiVersion {
        major: major.parse().map_err(|_| anyhow!("invalid --apiver '{}': major is not a number", s))?,
        minor: minor.parse().map_err(|_| anyhow!("invalid --apiver '{}': minor is not a number", s))?,
        micro: micro.parse().map_err(|_| anyhow!("invalid --apiver '{}': micro is not a number", s))?,
    })
}

fn format_diagnostic(d: &Diagnostic) -> String {
    let kind = match d.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };
    format!("{} [{}]: {} at {}:{}:{}.", kind, d.code, d.message, d.file, d.line, d.column)
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut options = Options::new();
    options.set_warnings_as_errors(cli.warnings);
    options.set_import_dirs(cli.imports);
    options.set_additions(cli.additions);
    if let Some(apiver) = &cli.apiver {
        options.set_version(Some(parse_apiver(apiver)?));
    }

    let generator_kind = match &cli.generator {
        Some(name) => {
            Some(GeneratorKind::from_name(name).ok_or_else(|| anyhow!("unknown generator '{}' (expected 'c' or 'js')", name))?)
        }
        None => None,
    };

    info!("compiling {}", cli.input.display());
    let result = Compiler::new(options).compile(&cli.input);

    for d in &result.diagnostics {
        eprintln!("{}", format_diagnostic(d));
    }

    if result.has_errors(cli.warnings) {
        return Ok(ExitCode::FAILURE);
    }

    if let Some(kind) = generator_kind {
        let rendered = result.generate(kind).map_err(|e| anyhow!(e.to_string()))?;
        match cli.output {
            Some(path) => fs::write(&path, rendered).map_err(|e| anyhow!("failed to write '{}': {}", path.display(), e))?,
            None => print!("{}", rendered),
        }
    }

    Ok(ExitCode::SUCCESS)
}
