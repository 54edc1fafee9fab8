mod echo;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use anyhow::{Context, bail};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use owo_colors::OwoColorize;
use quire_core::{
    AuConfig, ConfigParser, DirectoryContentSource, EmittedRecord, JsonConfig, PluginConfig, PluginLoader,
    PluginLoaderBuilder, TextConfig, records_to_json, records_to_text, report_to_json, report_to_text,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use echo::{print_banner, print_detail, print_info, print_resolution_summary, print_step, print_success};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for emitted records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Text,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            _ => Err(format!("Invalid format: {}. Valid options: json, text", s)),
        }
    }
}

/// Group an archived directory tree into articles and print their metadata
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author = "Quire Contributors")]
#[command(version)]
#[command(about = "Resolve archived article trees into metadata records", long_about = None)]
struct Args {
    /// Directory holding the archival unit's files
    #[arg(value_name = "DIR", required_unless_present = "completions")]
    dir: Option<PathBuf>,

    /// Plugin id (looked up in the plugin directories) or plugin file
    #[arg(long, value_name = "ID|FILE", required_unless_present = "completions")]
    plugin: Option<String>,

    /// URL the directory is served under (overrides base_url from --au)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// AU variable binding, repeatable
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE")]
    params: Vec<String>,

    /// JSON file of AU variable bindings
    #[arg(long, value_name = "FILE")]
    au: Option<PathBuf>,

    /// Directory searched for plugin definitions
    #[arg(long, value_name = "DIR")]
    plugin_dir: Option<PathBuf>,

    /// Output format (json, text)
    #[arg(short, long, default_value = "json", value_name = "FORMAT")]
    format: OutputFormat,

    /// Print the per-article report instead of emitted records
    #[arg(long)]
    articles: bool,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// AU bindings: the `--au` file, then `-p` pairs, then `--base-url`
fn build_au_config(args: &Args) -> anyhow::Result<AuConfig> {
    let mut au = match &args.au {
        Some(path) => AuConfig::from_file(path).with_context(|| format!("Failed to load AU config: {}", path.display()))?,
        None => AuConfig::new(),
    };

    au.extend_from_pairs(&args.params).context("Invalid AU parameter")?;

    if let Some(base_url) = &args.base_url {
        au.set("base_url", base_url.as_str());
    }

    if au.get("base_url").is_none() {
        bail!("No base URL: pass --base-url or set base_url in the AU config");
    }

    Ok(au)
}

fn load_plugin(plugin: &str, plugin_dir: Option<&Path>) -> anyhow::Result<PluginConfig> {
    let path = Path::new(plugin);
    if path.is_file() {
        debug!(path = %path.display(), "loading plugin file");
        return ConfigParser::parse_file(path).with_context(|| format!("Failed to parse plugin: {}", path.display()));
    }

    let mut loader = match plugin_dir {
        Some(dir) => PluginLoaderBuilder::new().standard_dir(dir).build(),
        None => PluginLoader::default(),
    };

    loader.load(plugin).with_context(|| format!("Failed to load plugin: {}", plugin))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        let mut cmd = Args::command();
        clap_complete::generate(shell, &mut cmd, "quire", &mut io::stdout());
        return Ok(());
    }

    init_logging(args.verbose);

    let (Some(dir), Some(plugin)) = (args.dir.as_deref(), args.plugin.as_deref()) else {
        bail!("DIR and --plugin are required");
    };

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    let started = Instant::now();

    if args.verbose {
        print_step(1, 4, &format!("Loading plugin {}", plugin.bright_white()));
    }

    let au = build_au_config(&args)?;
    let config = load_plugin(plugin, args.plugin_dir.as_deref())?;
    let resolver = config.build(&au).context("Invalid plugin configuration")?;

    if args.verbose {
        print_detail("Name", resolver.name());
        print_detail("Schema", &resolver.schema().id);
        for (name, value) in au.iter() {
            print_detail(name, value);
        }
        eprintln!();
        print_step(2, 4, &format!("Scanning {}", dir.display().bright_white()));
    }

    let base_url = au.get("base_url").unwrap_or_default();
    let source = DirectoryContentSource::new(dir, base_url)
        .with_context(|| format!("Failed to open directory: {}", dir.display()))?;

    if args.verbose {
        print_detail("Base URL", source.base_url());
        eprintln!();
        print_step(3, 4, "Resolving articles");
    }

    let mut records: Vec<EmittedRecord> = Vec::new();
    let report = resolver.resolve(&source, &mut records).context("Resolution failed")?;

    if args.verbose {
        print_resolution_summary(&report, started.elapsed());
        eprintln!();
        print_step(4, 4, "Writing output");
    }

    let output = match (args.format, args.articles) {
        (OutputFormat::Json, false) => {
            records_to_json(&records, &report, &JsonConfig { include_report: false, pretty: true })?
        }
        (OutputFormat::Json, true) => report_to_json(&report, true)?,
        (OutputFormat::Text, false) => {
            records_to_text(&records, &report, &TextConfig { line_width: 0, include_summary: args.verbose })
        }
        (OutputFormat::Text, true) => report_to_text(&report),
    };

    match args.output {
        Some(path) => {
            fs::write(&path, &output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => println!("{}", output),
    }

    Ok(())
}
