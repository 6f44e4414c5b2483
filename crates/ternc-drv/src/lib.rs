//! ternc-drv - Compiler driver.
//!
//! Orchestrates one invocation of the pipeline:
//!
//! ```text
//! source bytes -> Lexer -> Parser (+ scopes, types) -> typed AST
//!              -> Lowerer -> LLVM module -> verify -> object file
//! ```
//!
//! All failures are fatal; the binary prints the diagnostic to stderr
//! and exits 1 without writing any output file.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use inkwell::context::Context;
use tracing::{debug, info};

/// Command-line configuration for one compiler invocation.
#[derive(Debug, Parser)]
#[command(
    name = "ternc",
    version,
    about = "Ahead-of-time compiler for the Tern language"
)]
pub struct Config {
    /// Source file to compile.
    pub input: PathBuf,

    /// Object file to write.
    pub output: PathBuf,

    /// Echo the module's LLVM IR to stdout.
    #[arg(long)]
    pub emit_ir: bool,

    /// Verbose phase logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Compilation session: reads the source, runs the pipeline, and emits
/// the object file.
pub struct Session {
    pub config: Config,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the whole pipeline for this session's configuration.
    pub fn compile(&self) -> anyhow::Result<()> {
        info!(input = %self.config.input.display(), "compiling");
        let source = std::fs::read_to_string(&self.config.input)
            .with_context(|| format!("failed to read {}", self.config.input.display()))?;

        debug!("parsing");
        let nodes = ternc_par::parse(&source)?;
        debug!(statements = nodes.len(), "parsed");

        let module_name = self
            .config
            .input
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("default");

        debug!("lowering");
        let context = Context::create();
        let mut lowerer = ternc_gen::Lowerer::new(&context, module_name);
        lowerer.lower(&nodes)?;

        debug!("verifying");
        lowerer.verify()?;

        if self.config.emit_ir {
            println!("{}", lowerer.emit_ir());
        }

        info!(output = %self.config.output.display(), "writing object file");
        lowerer.write_object_file(&self.config.output)?;
        Ok(())
    }
}
