use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use x86_lift::translate::Program;
use x86_lift::{TranslateOptions, translate_program};

#[derive(Parser)]
#[command(name = "x86-lift")]
#[command(about = "x86 machine code to typed IR translator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate the decoded functions of a program document.
    Translate {
        #[arg(help = "Input JSON document (globals, functions and their basic blocks)")]
        input: PathBuf,

        #[arg(short, long, help = "Output file for the IR (default: stdout)")]
        output: Option<PathBuf>,

        #[arg(
            long,
            help = "Skip functions using unsupported instructions instead of aborting"
        )]
        skip_unsupported: bool,

        #[arg(long, help = "Verify with LLVM and print LLVM's textual IR")]
        llvm: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Translate {
            input,
            output,
            skip_unsupported,
            llvm,
        } => {
            let program = read_program(&input)?;
            let options = TranslateOptions { skip_unsupported };
            let translation =
                translate_program(&program, &options).context("Translation failed")?;

            for failure in &translation.failures {
                eprintln!(
                    "warning: skipped {} at {}: {}",
                    failure.name, failure.addr, failure.error
                );
            }

            let text = if llvm {
                emit_llvm(&translation.module, &input)?
            } else {
                translation.module.to_string()
            };

            match output {
                Some(path) => {
                    fs::write(&path, &text)
                        .with_context(|| format!("Failed to write output to {}", path.display()))?;
                    eprintln!(
                        "Translated {} -> {} ({} functions, {} skipped)",
                        input.display(),
                        path.display(),
                        translation.module.functions.len(),
                        translation.failures.len()
                    );
                }
                None => print!("{text}"),
            }
        }
    }

    Ok(())
}

fn read_program(path: &Path) -> Result<Program> {
    tracing::debug!(path = %path.display(), "reading program document");
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse program document {}", path.display()))
}

#[cfg(feature = "llvm")]
fn emit_llvm(module: &x86_lift::ir::Module, input: &Path) -> Result<String> {
    let name = input
        .file_stem()
        .map_or_else(|| "module".into(), |s| s.to_string_lossy());
    x86_lift::llvm_backend::emit_llvm_ir(module, &name).context("LLVM lowering failed")
}

#[cfg(not(feature = "llvm"))]
fn emit_llvm(_module: &x86_lift::ir::Module, _input: &Path) -> Result<String> {
    anyhow::bail!("--llvm requires x86-lift to be built with the `llvm` feature")
}
