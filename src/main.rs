//! `fxmlc`: compiles serialized markup documents into builder plans.

use clap::{Args, Parser, Subcommand};
use fxml_compiler::config::CompilerConfig;
use fxml_compiler::discovery::find_documents;
use fxml_compiler::document::DocumentCompiler;
use fxml_compiler::error::CompileError;
use fxml_compiler::project::{compile_project, load_metadata, write_plans};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "fxmlc")]
#[command(about = "Compile FXML markup trees into builder construction code")]
struct Cli {
    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Options {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Metadata table; may be repeated
    #[arg(long, global = true)]
    metadata: Vec<PathBuf>,

    #[arg(long, global = true)]
    resource_root: Option<PathBuf>,

    #[arg(long, global = true)]
    root_package: Option<String>,

    /// Output file for `compile`, output directory for `build`
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    #[arg(long, global = true)]
    no_cache: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile one document and print its builder plan
    Compile { document: PathBuf },
    /// Compile every document under the resource root
    Build,
    /// List the documents under the resource root
    Discover,
}

impl Options {
    fn config(&self) -> Result<CompilerConfig, CompileError> {
        let mut config = match &self.config {
            Some(path) => CompilerConfig::load(path)?,
            None => CompilerConfig::default(),
        };
        config.metadata.extend(self.metadata.iter().cloned());
        if let Some(root) = &self.resource_root {
            config.resource_root = root.clone();
        }
        if let Some(package) = &self.root_package {
            config.root_package = package.clone();
        }
        if self.no_cache {
            config.use_cache = false;
        }
        Ok(config)
    }
}

fn run(cli: Cli) -> Result<ExitCode, CompileError> {
    let config = cli.options.config()?;

    match cli.command {
        Command::Discover => {
            for document in find_documents(&config.resource_root, &config.document_suffix) {
                println!("{}", document.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Compile { document } => {
            let introspector = Arc::new(load_metadata(&config.metadata)?);
            let plan = DocumentCompiler::new(introspector, &config).compile_file(&document)?;
            let json = plan
                .to_json_string()
                .map_err(|e| CompileError::json(&document, e))?;
            match &cli.options.out {
                Some(out) => fs::write(out, json).map_err(|e| CompileError::io(out, e))?,
                None => println!("{}", json),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Build => {
            let introspector = Arc::new(load_metadata(&config.metadata)?);
            let report = compile_project(&config, introspector);
            let output_dir = cli.options.out.clone().unwrap_or_else(|| config.output_dir.clone());
            let written = write_plans(&report, &output_dir)?;
            let cached = report.units.iter().filter(|unit| unit.cached).count();
            info!(written = written.len(), cached, out = %output_dir.display(), "build finished");

            if report.has_failures() {
                for (document, failure) in report.failures() {
                    eprintln!("{}: {}", document.display(), chain(failure));
                }
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// The error followed by each of its sources.
fn chain(error: &CompileError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(&format!("\n  caused by: {}", cause));
        source = cause.source();
    }
    message
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fxml_compiler=info,fxmlc=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", chain(&e));
            ExitCode::FAILURE
        }
    }
}
