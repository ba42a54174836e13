#![deny(missing_docs)]

//! # Resolve Command
//!
//! Reads a document, inlines its external references into `components`, then
//! optionally flattens inline models or resolves it fully.

use std::fs;
use std::path::PathBuf;

use oasref_core::resolver::parse_document;
use oasref_core::{
    AppError, AppResult, AuthorizationValue, DocumentLoader, FsLoader, InlineModelResolver,
    OpenApi, OpenApiResolver, ResolverFully, ResolverSettings,
};

/// Serialization of the resolved document.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// YAML output.
    #[default]
    Yaml,
    /// Pretty-printed JSON output.
    Json,
}

/// Arguments for the resolve command.
#[derive(clap::Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Path or URL of the root document.
    pub input: String,

    /// Write the result here instead of stdout.
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Output format.
    #[clap(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Keep path-level parameters on the path item instead of copying them into each operation.
    #[clap(long, env = "OASREF_NO_SHARED_PARAMS")]
    pub no_shared_params: bool,

    /// Hoist inline object schemas into named components.
    #[clap(long, env = "OASREF_FLATTEN_INLINE")]
    pub flatten_inline: bool,

    /// Give every hoisted model its own name, even when structurally identical.
    #[clap(long, requires = "flatten_inline")]
    pub skip_matches: bool,

    /// Replace schema and example references reachable from operations by their targets.
    #[clap(long, env = "OASREF_RESOLVE_FULLY")]
    pub resolve_fully: bool,

    /// Keep `allOf` compositions when resolving fully.
    #[clap(long, requires = "resolve_fully")]
    pub no_aggregate: bool,

    /// Credentials for remote documents: `header:NAME=VALUE[@HOST]` or `query:NAME=VALUE[@HOST]`.
    /// Repeat the flag for several values; `OASREF_AUTH` takes one per line.
    #[clap(long = "auth", env = "OASREF_AUTH", value_delimiter = '\n')]
    pub auths: Vec<String>,
}

/// Executes the resolve command.
pub fn execute(args: &ResolveArgs) -> AppResult<()> {
    let rendered = render(args, &FsLoader)?;

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| {
                    AppError::General(format!("Failed to create output dir: {}", e))
                })?;
            }
            fs::write(path, rendered).map_err(|e| {
                AppError::General(format!("Failed to write {}: {}", path.display(), e))
            })?;
            tracing::info!(output = %path.display(), "resolved document written");
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

/// Loads, resolves and serializes the input document.
pub fn render(args: &ResolveArgs, loader: &dyn DocumentLoader) -> AppResult<String> {
    let auths = args
        .auths
        .iter()
        .map(|spec| AuthorizationValue::parse(spec))
        .collect::<AppResult<Vec<_>>>()?;

    let text = loader.load(&args.input, &auths)?;
    let mut openapi = OpenApi::from_json_value(parse_document(&text, &args.input)?)?;

    OpenApiResolver::new(&mut openapi, loader)
        .with_auths(auths)
        .with_parent_location(args.input.clone())
        .with_settings(ResolverSettings {
            add_parameters_to_each_operation: !args.no_shared_params,
        })
        .resolve()?;

    if args.flatten_inline {
        InlineModelResolver::new()
            .skip_matches(args.skip_matches)
            .flatten(&mut openapi);
    }
    if args.resolve_fully {
        ResolverFully::new(!args.no_aggregate).resolve_fully(&mut openapi);
    }

    match args.format {
        OutputFormat::Yaml => openapi.to_yaml_string(),
        OutputFormat::Json => openapi.to_json_string(),
    }
}
