use anyhow::Result;
use clap::{CommandFactory, Parser, error::ErrorKind};
use reqwest::StatusCode;
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use github_api::cli::build_request;
use github_api::response::render;
use github_api::{ApiError, Cli, Config, GitHub};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.connection.verbose);

    let config = match Config::resolve(cli.connection.config_source()) {
        Ok(config) => config,
        Err(e) => Cli::command().error(ErrorKind::MissingRequiredArgument, e).exit(),
    };

    if let Err(e) = run(&cli, config).await {
        eprintln!("Error: {:#}", e);
        print_hints(&e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: &Cli, config: Config) -> Result<()> {
    let github = GitHub::new(config)?;
    let request = build_request(&cli.command).await?;
    let args = cli.command.args();

    let response = github.send(&request, args.paginate()).await?;
    let output = render(&response, args.output_filter(), args.json_style())?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "warn,github_api=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_hints(e: &anyhow::Error) {
    if let Some(status) = e.downcast_ref::<ApiError>().and_then(ApiError::status) {
        match status {
            StatusCode::UNAUTHORIZED => {
                eprintln!("Possible causes:");
                eprintln!("   - The token is missing, expired or revoked");
                eprintln!("   - Basic auth is disabled on this host; use a token");
            }
            StatusCode::NOT_FOUND => {
                eprintln!("Possible causes:");
                eprintln!("   - The path is wrong (paths are relative to the API root)");
                eprintln!("   - The token lacks access to a private resource");
            }
            StatusCode::FORBIDDEN => {
                eprintln!("Possible causes:");
                eprintln!("   - The token lacks a required scope");
                eprintln!("   - The rate limit is exhausted (run with -v to see it)");
            }
            _ => {}
        }
        return;
    }

    let error_msg = format!("{:#}", e).to_lowercase();
    if error_msg.contains("dns error") || error_msg.contains("failed to lookup") {
        eprintln!("Possible causes:");
        eprintln!("   - Check that --host / GITHUB_HOST names a reachable server");
        eprintln!("   - Check your network connection");
    } else if error_msg.contains("timed out") {
        eprintln!("Suggestion:");
        eprintln!("   - Increase timeout with --timeout <seconds>");
        eprintln!("   - Check if the server is responsive");
    } else if error_msg.contains("connection refused") {
        eprintln!("Possible causes:");
        eprintln!("   - Server is not running");
        eprintln!("   - Wrong port number in --host");
    }
}
