use anyhow::Result;
use clap::Parser;
use routegen::cli::{Cli, Commands};
use routegen::commands::{check, generate, init_config, list_routes, routes};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    routegen::observability::init_logging(cli.verbosity);
    routegen::observability::install_panic_hook();

    match cli.command {
        Commands::Generate {
            path,
            output,
            config,
            format,
        } => routegen::commands::generate_project(generate::GenerateConfig {
            path,
            output,
            config,
            format,
        }),
        Commands::Check {
            path,
            config,
            format,
        } => routegen::commands::check_project(check::CheckConfig {
            path,
            config,
            format,
        }),
        Commands::Routes {
            path,
            config,
            format,
        } => list_routes(routes::RoutesConfig {
            path,
            config,
            format,
        }),
        Commands::Init { force } => {
            init_config(&std::env::current_dir()?, force)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
