//! The `nestql` command line: parse, compile, or chunk query files.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser as ClapParser, Subcommand};

use crate::{compose_message, DisplayOptions, Options};

#[derive(ClapParser)]
#[command(name = "nestql", version, about = "Compile nested selection queries into flat SQL")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print each query's selection graph as JSON
    Parse(IoArgs),
    /// Compile each query into a SQL SELECT
    Compile(IoArgs),
    /// Split a multi-query input into individual queries
    Chunks(IoArgs),
}

#[derive(Args)]
struct IoArgs {
    /// Input file, or `-` for stdin
    input: PathBuf,

    /// Strip ANSI colors from diagnostics
    #[arg(long)]
    plain: bool,
}

impl IoArgs {
    fn options(&self) -> Options {
        Options {
            display: if self.plain {
                DisplayOptions::Plain
            } else {
                DisplayOptions::AnsiColor
            },
        }
    }
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Command::Parse(io) => {
            let source = read_input(&io.input)?;
            let options = io.options();
            let chunks = crate::chunk_source(&source)
                .map_err(|e| compose_message(e, &source, &options))?;
            for chunk in &chunks {
                let graph = crate::parse_source(chunk)
                    .map_err(|e| compose_message(e, chunk, &options))?;
                println!("{}", serde_json::to_string_pretty(&graph)?);
            }
        }
        Command::Compile(io) => {
            let source = read_input(&io.input)?;
            let statements = crate::compile(&source, &io.options())?;
            for statement in &statements {
                println!("{}", statement.query);
            }
        }
        Command::Chunks(io) => {
            let source = read_input(&io.input)?;
            let options = io.options();
            let chunks = crate::chunk_source(&source)
                .map_err(|e| compose_message(e, &source, &options))?;
            for chunk in &chunks {
                println!("{chunk}");
            }
        }
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("reading stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }
}
