//! Loop cost analysis CLI.
//!
//! This binary runs the cache-locality cost model over JSON function descriptions. It performs:
//! 1. **Analyze:** Compute the cost of every loop in every perfect nest and print the selected report sections, or the costs as JSON.
//! 2. **Nests:** List the perfect loop nests of a function, outermost loop first.

use clap::builder::PossibleValuesParser;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::{fs, process};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use loopcost_core::analysis::SECTIONS;
use loopcost_core::config::AccessOrder;
use loopcost_core::nest::find_perfect_nests;
use loopcost_core::{Config, Function, LinearAnalyzer, analyze_function};

#[derive(Parser, Debug)]
#[command(
    name = "loopcost",
    author,
    version,
    about = "Cache-aware loop cost analysis",
    long_about = "Estimate, for each loop of a perfect loop nest, how many cache lines the nest touches when that loop runs innermost.\n\nFunctions are read from JSON descriptions. A loop outside every perfect nest reports a cost of -1.\n\nExamples:\n  loopcost analyze matmul.json\n  loopcost analyze matmul.json --section costs --line-size 8\n  loopcost analyze matmul.json --order column-major --json\n  loopcost nests matmul.json"
)]
struct Cli {
    /// Raise the log level (-v info, -vv debug, -vvv trace). Overrides RUST_LOG.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute loop costs for every perfect nest of a function.
    Analyze {
        /// JSON function description.
        file: PathBuf,

        /// JSON analysis configuration (cache and cost model settings).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Cache line size in array elements, overriding the configuration.
        #[arg(long)]
        line_size: Option<u32>,

        /// Array layout, overriding the configuration.
        #[arg(long, value_enum)]
        order: Option<Order>,

        /// Report section to print; repeat to select several. Default: all.
        #[arg(long = "section", value_parser = PossibleValuesParser::new(SECTIONS))]
        sections: Vec<String>,

        /// Print per-loop costs as JSON instead of the text report.
        #[arg(long)]
        json: bool,
    },

    /// List the perfect loop nests of a function.
    Nests {
        /// JSON function description.
        file: PathBuf,
    },
}

/// Array layout as spelled on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Order {
    RowMajor,
    ColumnMajor,
}

impl From<Order> for AccessOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::RowMajor => Self::RowMajor,
            Order::ColumnMajor => Self::ColumnMajor,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze {
            file,
            config,
            line_size,
            order,
            sections,
            json,
        } => cmd_analyze(&file, config.as_deref(), line_size, order, &sections, json),
        Commands::Nests { file } => cmd_nests(&file),
    }
}

/// Installs the stderr log subscriber.
///
/// `RUST_LOG` is honoured unless `-v` was given; the default level is `warn`.
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads and decodes a function description, exiting with code 1 on failure.
fn load_function(path: &Path) -> Function {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", path.display(), e);
        process::exit(1);
    });
    Function::from_json(&text).unwrap_or_else(|e| {
        eprintln!("Error in {}: {}", path.display(), e);
        process::exit(1);
    })
}

/// Builds the analysis configuration from an optional file and command-line overrides.
fn load_config(path: Option<&Path>, line_size: Option<u32>, order: Option<Order>) -> Config {
    let mut config = path.map_or_else(Config::default, |p| {
        Config::from_file(p).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        })
    });
    if let Some(words) = line_size {
        config.cache.line_words = words;
    }
    if let Some(order) = order {
        config.analysis.access_order = order.into();
    }
    debug!(?config, "configuration loaded");
    config
}

/// Runs the cost model over every perfect nest of the function in `file`.
///
/// Prints the selected report sections, or one JSON entry per loop when `json` is set.
fn cmd_analyze(
    file: &Path,
    config: Option<&Path>,
    line_size: Option<u32>,
    order: Option<Order>,
    sections: &[String],
    json: bool,
) {
    let config = load_config(config, line_size, order);
    let func = load_function(file);
    let report = analyze_function(&func, &LinearAnalyzer::new(), &config);

    if json {
        match serde_json::to_string_pretty(&report.entries(&func)) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    } else {
        print!("{}", report.render(&func, sections));
    }
}

/// Prints each perfect nest of the function in `file`, outermost loop first.
fn cmd_nests(file: &Path) {
    let func = load_function(file);
    let nests = find_perfect_nests(&func);
    if nests.is_empty() {
        println!("{}: no perfect loop nests", func.name());
        return;
    }
    for nest in &nests {
        println!("{}", nest.display(&func));
    }
}
