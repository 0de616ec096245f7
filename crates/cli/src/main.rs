//! fhirkit command line
//!
//! Converts FHIR resources between JSON and XML, prints their element trees
//! the way a FHIRPath evaluator sees them and prints static type information.

mod commands;
mod config;

use clap::Parser;
use config::{Cli, Command};
use tracing::info;

/// Initializes the tracing subscriber; `RUST_LOG` overrides `level`.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    // The binary's own crate name is `fhirkit`, so that directive covers it.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fhirkit={level},fhirkit_serde={level}")));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Command::Convert(args) => {
            let from = args.input_format()?;
            let to = args.output_format(from);
            let input = commands::read_input(&args.input)?;
            let output = commands::convert(&input, from, to, args.pretty)?;
            match &args.output {
                Some(path) => {
                    std::fs::write(path, output)?;
                    info!(path = %path.display(), format = %to, "wrote output");
                }
                None => println!("{}", output),
            }
        }
        Command::Inspect(args) => {
            let from = config::input_format(&args.input, args.from)?;
            let input = commands::read_input(&args.input)?;
            let resource = commands::decode(&input, from)?;
            print!("{}", commands::inspect(&resource, &args.select));
        }
        Command::TypeInfo { type_name } => {
            print!("{}", commands::type_info(&type_name)?);
        }
    }

    Ok(())
}
