#![deny(missing_docs)]

//! # oasref
//!
//! Command line front-end for `oasref-core`.
//!
//! Supported Commands:
//! - `resolve`: Inlines external `$ref` targets into `components` and prints the result.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod logging;
mod resolve;

#[derive(Parser, Debug)]
#[clap(author, version, about = "OpenAPI $ref resolver")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve external references of an OpenAPI document.
    Resolve(resolve::ResolveArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(logging::LogFormat::from_env());

    let result = match &cli.command {
        Commands::Resolve(args) => resolve::execute(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "resolve failed");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_resolve_flags() {
        let cli = Cli::try_parse_from([
            "oasref",
            "resolve",
            "api.yaml",
            "--format",
            "json",
            "--flatten-inline",
            "--skip-matches",
            "--auth",
            "header:X-Key=1",
        ])
        .unwrap();
        let Commands::Resolve(args) = cli.command;
        assert_eq!(args.input, "api.yaml");
        assert_eq!(args.format, resolve::OutputFormat::Json);
        assert!(args.flatten_inline && args.skip_matches);
        assert_eq!(args.auths, vec!["header:X-Key=1".to_string()]);
    }

    #[test]
    fn auth_values_keep_commas() {
        let cli = Cli::try_parse_from([
            "oasref",
            "resolve",
            "api.yaml",
            "--auth",
            "header:Accept=a,b",
            "--auth",
            "query:key=1@api.example.com",
        ])
        .unwrap();
        let Commands::Resolve(args) = cli.command;
        assert_eq!(
            args.auths,
            vec![
                "header:Accept=a,b".to_string(),
                "query:key=1@api.example.com".to_string()
            ]
        );
    }
}
