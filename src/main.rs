use anyhow::{Context, Result};
use clap::Parser;
use spanq::config::ParserConfig;
use spanq::output::{self, OutputFormat};
use spanq::query::PhraseQueryParser;
use spanq::utils::TermDictionary;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spanq")]
#[command(about = "Rewrite quoted phrases in a text query into positional queries")]
struct Cli {
    /// Query text
    #[arg(trailing_var_arg = true, required = true)]
    query: Vec<String>,

    /// Parser configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Term dictionary used for wildcard/fuzzy/range expansion (JSON)
    #[arg(short, long)]
    terms: Option<PathBuf>,

    /// Default field, overriding the configuration
    #[arg(short, long)]
    field: Option<String>,

    /// Let phrase terms match in any order
    #[arg(long)]
    unordered: bool,

    /// Print the rewritten tree as JSON
    #[arg(long)]
    json: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let color = !cli.no_color;
    if let Err(e) = run(cli) {
        let _ = output::print_error(&format!("{:#}", e), color);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ParserConfig::from_path(path)?,
        None => ParserConfig::default(),
    };
    if let Some(field) = cli.field {
        config.default_field = field;
    }
    if cli.unordered {
        config.in_order = false;
    }

    let terms = match &cli.terms {
        Some(path) => TermDictionary::from_path(path)?,
        None => TermDictionary::new(),
    };

    let query_str = cli.query.join(" ");
    let parser = PhraseQueryParser::new(config, &terms);
    let query = parser
        .parse(&query_str)
        .with_context(|| format!("Failed to parse query `{}`", query_str))?;

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    output::print_query(&query, format)?;
    Ok(())
}
