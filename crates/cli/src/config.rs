//! Command line configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FHIRKIT_LOG_LEVEL` | warn | Log level |
//! | `FHIRKIT_PRETTY` | false | Pretty-print `convert` output |
//! | `RUST_LOG` | | Full `tracing` filter; overrides the log level |

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use fhirkit_serde::FhirFormat;

#[derive(Debug, Clone, Parser)]
#[command(name = "fhirkit")]
#[command(about = "Convert and inspect FHIR resources", version)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, env = "FHIRKIT_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Convert a resource between FHIR JSON and FHIR XML.
    Convert(ConvertArgs),
    /// Print the element tree of a resource.
    Inspect(InspectArgs),
    /// Print the static type information of a model type.
    TypeInfo {
        /// Type name, e.g. `Quantity` or `SubstanceDefinition.moiety`.
        type_name: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ConvertArgs {
    /// Input file, or `-` for standard input.
    pub input: PathBuf,

    /// Input format; inferred from the input extension when omitted.
    #[arg(long, value_parser = parse_format)]
    pub from: Option<FhirFormat>,

    /// Output format; inferred from `--output`, otherwise the other format.
    #[arg(long, value_parser = parse_format)]
    pub to: Option<FhirFormat>,

    /// Pretty-print the output.
    #[arg(long, env = "FHIRKIT_PRETTY")]
    pub pretty: bool,

    /// Output file; standard output when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    /// Input file, or `-` for standard input.
    pub input: PathBuf,

    /// Input format; inferred from the input extension when omitted.
    #[arg(long, value_parser = parse_format)]
    pub from: Option<FhirFormat>,

    /// Only show these top-level fields (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,
}

fn parse_format(s: &str) -> std::result::Result<FhirFormat, String> {
    s.parse().map_err(|e: fhirkit_serde::SerdeError| e.to_string())
}

/// `--from` if given, else the input extension.
pub fn input_format(input: &Path, from: Option<FhirFormat>) -> Result<FhirFormat> {
    from.or_else(|| FhirFormat::from_path(input)).ok_or_else(|| {
        anyhow!(
            "cannot infer the format of {}; pass --from json|xml",
            input.display()
        )
    })
}

impl ConvertArgs {
    pub fn input_format(&self) -> Result<FhirFormat> {
        input_format(&self.input, self.from)
    }

    /// `--to` if given, else the output extension, else the other format.
    pub fn output_format(&self, input: FhirFormat) -> FhirFormat {
        self.to
            .or_else(|| self.output.as_deref().and_then(FhirFormat::from_path))
            .unwrap_or(match input {
                FhirFormat::Json => FhirFormat::Xml,
                FhirFormat::Xml => FhirFormat::Json,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_convert_formats_are_inferred() {
        let cli = parse(&["fhirkit", "convert", "aspirin.json"]);
        let Command::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        let from = args.input_format().unwrap();
        assert_eq!(from, FhirFormat::Json);
        assert_eq!(args.output_format(from), FhirFormat::Xml);

        let cli = parse(&["fhirkit", "convert", "in.xml", "-o", "out.xml", "--pretty"]);
        let Command::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert!(args.pretty);
        assert_eq!(args.output_format(FhirFormat::Xml), FhirFormat::Xml);
    }

    #[test]
    fn test_explicit_formats_win() {
        let cli = parse(&["fhirkit", "convert", "-", "--from", "xml", "--to", "json"]);
        let Command::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.input_format().unwrap(), FhirFormat::Xml);
        assert_eq!(args.output_format(FhirFormat::Xml), FhirFormat::Json);
    }

    #[test]
    fn test_unknown_input_format_is_an_error() {
        let cli = parse(&["fhirkit", "inspect", "resource.txt"]);
        let Command::Inspect(args) = cli.command else {
            panic!("expected inspect");
        };
        assert!(input_format(&args.input, args.from).is_err());
        assert!(Cli::try_parse_from(["fhirkit", "convert", "x", "--from", "yaml"]).is_err());
    }

    #[test]
    fn test_select_and_log_level() {
        let cli = parse(&[
            "fhirkit",
            "inspect",
            "a.json",
            "--select",
            "status,moiety",
            "--log-level",
            "debug",
        ]);
        assert_eq!(cli.log_level, "debug");
        let Command::Inspect(args) = cli.command else {
            panic!("expected inspect");
        };
        assert_eq!(args.select, vec!["status", "moiety"]);
    }
}
