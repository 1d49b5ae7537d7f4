//! solgraph CLI
//!
//! Command-line interface for running reentrancy analysis over a solc AST
//! JSON document and its paired source file.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser as ClapParser, Subcommand};

#[derive(ClapParser)]
#[command(name = "solgraph")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Solidity reentrancy static analyzer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a contract's solc AST JSON against its source file
    Analyze {
        /// Path to the solc AST JSON (--combined-json ast output)
        ast: PathBuf,
        /// Path to the original .sol source file
        source: PathBuf,
        /// Optional TOML config file (`[detectors] disabled = [...]`)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print shell completions for the given shell
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("solgraph=info".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze { ast, source, config } => run_analyze(&ast, &source, config.as_deref()),
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        }
    }
}

fn run_analyze(ast_path: &std::path::Path, source_path: &std::path::Path, config_path: Option<&std::path::Path>) {
    let ast_text = match fs::read_to_string(ast_path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: failed to read {}: {e}", ast_path.display());
            process::exit(1);
        }
    };
    let source = match fs::read_to_string(source_path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: failed to read {}: {e}", source_path.display());
            process::exit(1);
        }
    };
    let ast: serde_json::Value = match serde_json::from_str(&ast_text) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: invalid AST JSON in {}: {e}", ast_path.display());
            process::exit(1);
        }
    };

    let mut config = solgraph::AnalyzerConfig::new();
    if let Some(path) = config_path {
        let doc = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("Error: failed to read {}: {e}", path.display());
                process::exit(1);
            }
        };
        config = match config.merge(&doc) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        };
    }

    let results = match solgraph::analyze_source_unit(&ast, &source, &config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let mut had_fatal = false;
    for analysis in &results {
        if let Some(fatal) = &analysis.fatal {
            had_fatal = true;
            eprintln!("Error: {fatal}");
            continue;
        }
        for warning in &analysis.warnings {
            eprintln!("warning: {warning}");
        }
        for finding in &analysis.findings {
            println!(
                "{}:{}: [{}] {}: {}",
                source_path.display(),
                finding.location,
                finding.severity,
                finding.detector_id,
                finding.message
            );
        }
    }

    if had_fatal {
        process::exit(1);
    }
}
