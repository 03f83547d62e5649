//! `modelgen`: generate typed data models from a JSON Schema document.

mod config;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use config::{GenerateConfig, ModelgenConfig, SourceConfig};
use modelgen::{
    CollectionStyle, DefaultStyle, Dialect, EnumStyle, FetchOptions, FieldOrder, LoadOptions,
    SchemaSource, UnionStyle,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "modelgen", version, about = "Generate typed data models from JSON Schema")]
struct Cli {
    /// File to write the generated models to.
    output: PathBuf,

    /// Schema location: URL, file path, or `-` for stdin.
    #[arg(long)]
    source: Option<String>,

    /// JSON Schema dialect to validate against.
    #[arg(long, value_enum)]
    dialect: Option<Dialect>,

    /// Output backend.
    #[arg(long)]
    backend: Option<String>,

    /// Config file to use instead of ./modelgen.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Per-request timeout for URL sources, in seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Retries after a transient fetch failure.
    #[arg(long, value_name = "N")]
    retries: Option<u32>,

    /// Name of the root model.
    #[arg(long)]
    root_name: Option<String>,

    /// Dotted path of the base object models extend.
    #[arg(long)]
    base_class: Option<String>,

    #[arg(long, value_enum)]
    enum_style: Option<EnumStyle>,

    /// Replace single-value enumerations with a literal type.
    #[arg(long, value_name = "BOOL")]
    collapse_single_enums: Option<bool>,

    #[arg(long, value_enum)]
    default_style: Option<DefaultStyle>,

    #[arg(long, value_enum)]
    collection_style: Option<CollectionStyle>,

    #[arg(long, value_enum)]
    union_style: Option<UnionStyle>,

    /// Carry titles, descriptions and examples into the output.
    #[arg(long, value_name = "BOOL")]
    include_docs: Option<bool>,

    /// Stamp the generation time into the header.
    #[arg(long, value_name = "BOOL")]
    include_timestamp: Option<bool>,

    #[arg(long, value_enum)]
    field_order: Option<FieldOrder>,

    /// Convert property names to snake_case.
    #[arg(long, value_name = "BOOL")]
    snake_case_fields: Option<bool>,

    /// Raise log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> ModelgenConfig {
        ModelgenConfig {
            source: SourceConfig {
                locator: self.source.clone(),
                dialect: self.dialect,
                timeout_secs: self.timeout,
                retries: self.retries,
            },
            backend: self.backend.clone(),
            generate: GenerateConfig {
                root_name: self.root_name.clone(),
                base_class: self.base_class.clone(),
                enum_style: self.enum_style,
                collapse_single_enums: self.collapse_single_enums,
                default_style: self.default_style,
                collection_style: self.collection_style,
                union_style: self.union_style,
                include_docs: self.include_docs,
                include_timestamp: self.include_timestamp,
                field_order: self.field_order,
                snake_case_fields: self.snake_case_fields,
            },
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("reading working directory")?;
    let config = ModelgenConfig::load(&cwd, cli.config.as_deref())?.merge(cli.overrides());

    let locator = config
        .source
        .locator
        .as_deref()
        .ok_or_else(|| anyhow!("no schema source given (use --source or [source] locator)"))?;
    let source = SchemaSource::parse(locator);

    let defaults = FetchOptions::default();
    let load = LoadOptions {
        dialect: config.source.dialect.unwrap_or_default(),
        fetch: FetchOptions {
            timeout: config
                .source
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            retries: config.source.retries.unwrap_or(defaults.retries),
            backoff: defaults.backoff,
        },
    };

    let backend_name = config.backend.as_deref().unwrap_or("pydantic");
    let backend = modelgen::get_backend(backend_name).ok_or_else(|| {
        anyhow!(
            "unknown backend '{backend_name}' (available: {})",
            modelgen::backend_names().join(", ")
        )
    })?;

    let options = config.generate.to_options();
    tracing::debug!(?options, backend = backend.name(), "generation options");

    modelgen::generate_to_path(&source, &load, &options, backend, &cli.output).with_context(
        || {
            format!(
                "generating {} from {}",
                cli.output.display(),
                source.locator()
            )
        },
    )
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_become_overrides() {
        let cli = Cli::parse_from([
            "modelgen",
            "out.py",
            "--source",
            "-",
            "--dialect",
            "draft2019-09",
            "--union-style",
            "wrapper",
            "--collapse-single-enums",
            "false",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        let overrides = cli.overrides();
        assert_eq!(overrides.source.locator.as_deref(), Some("-"));
        assert_eq!(overrides.source.dialect, Some(Dialect::Draft201909));
        assert_eq!(overrides.generate.union_style, Some(UnionStyle::Wrapper));
        assert_eq!(overrides.generate.collapse_single_enums, Some(false));
        assert_eq!(overrides.generate.root_name, None);
    }

    #[test]
    fn flags_win_over_config() {
        let file = ModelgenConfig {
            backend: Some("rust".into()),
            generate: GenerateConfig {
                root_name: Some("FromFile".into()),
                include_docs: Some(false),
                ..GenerateConfig::default()
            },
            ..ModelgenConfig::default()
        };
        let cli = Cli::parse_from(["modelgen", "out.py", "--root-name", "FromFlag"]);
        let merged = file.merge(cli.overrides());
        let options = merged.generate.to_options();
        assert_eq!(options.root_name, "FromFlag");
        assert!(!options.include_docs);
        assert_eq!(merged.backend.as_deref(), Some("rust"));
    }
}
