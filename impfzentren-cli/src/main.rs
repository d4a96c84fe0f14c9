//! impfzentren: vaccination appointment checker for impfzentren.bayern
//!
//! Logs every configured identity in, walks districts, centers and sites,
//! then asks for the next free appointment of every site, rotating the
//! identities between requests. Each stage is written to `--output-dir`.
//!
//! Usage:
//!   impfzentren --config config.json run
//!   impfzentren --config config.json probe
//!   impfzentren --config config.json login

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use impfzentren_client::{
    Authenticator, ClientError, IdentityRotator, JsonStore, Pipeline, RunSummary, TokenField,
    load_identities,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "impfzentren", version)]
#[command(about = "Check vaccination appointment availability on impfzentren.bayern")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Identity configuration (one object or an array of objects)
    #[arg(short, long, global = true, default_value = "config.json")]
    config: PathBuf,

    /// Directory receiving the stage JSON files
    #[arg(short, long, global = true, default_value = ".")]
    output_dir: PathBuf,

    /// Token sent as bearer credential
    #[arg(long, global = true, value_enum, default_value_t = TokenFieldArg::Refresh)]
    token_field: TokenFieldArg,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Run every stage: vaccines, districts, centers, sites, appointments (default)
    Run,
    /// Probe appointments for the sites stored by a previous run
    Probe,
    /// Log every identity in and exit
    Login,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TokenFieldArg {
    Refresh,
    Access,
}

impl From<TokenFieldArg> for TokenField {
    fn from(arg: TokenFieldArg) -> Self {
        match arg {
            TokenFieldArg::Refresh => Self::Refresh,
            TokenFieldArg::Access => Self::Access,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logs go to stderr; `log` records of the client library are bridged in.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let expected = e
                .downcast_ref::<ClientError>()
                .is_some_and(ClientError::is_expected);
            if expected {
                tracing::warn!("{e:#}");
            } else {
                tracing::error!("{e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let token_field = TokenField::from(cli.token_field);
    let identities = load_identities(&cli.config)
        .await
        .with_context(|| format!("Failed to load identities from {}", cli.config.display()))?;

    let members = Authenticator::new()
        .login_all(identities)
        .await
        .context("Login failed")?;
    let rotator = IdentityRotator::new(members)?;
    tracing::info!("{} identities logged in", rotator.len());

    let store = JsonStore::new(&cli.output_dir);
    let pipeline = Pipeline::new(&rotator, &store, token_field);

    match cli.command.unwrap_or(Command::Run) {
        Command::Login => {
            for member in rotator.members() {
                tracing::info!(
                    username = %member.identity.username,
                    env = %member.identity.env,
                    "Login ok"
                );
            }
        }
        Command::Run => {
            let summary = pipeline.run().await.context("Run aborted")?;
            report(&summary);
        }
        Command::Probe => {
            let summary = pipeline
                .probe_stored()
                .await
                .context("Appointment probe aborted")?;
            report(&summary);
        }
    }
    Ok(())
}

fn report(summary: &RunSummary) {
    tracing::info!(
        vaccines = summary.vaccines,
        districts = summary.districts,
        centers = summary.centers,
        sites = summary.sites,
        available = summary.available,
        "Done: {} of {} sites have a free appointment",
        summary.available,
        summary.sites
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["impfzentren"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert_eq!(cli.output_dir, PathBuf::from("."));
        assert_eq!(TokenField::from(cli.token_field), TokenField::Refresh);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "impfzentren",
            "probe",
            "--config",
            "ids.json",
            "--token-field",
            "access",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Command::Probe)));
        assert_eq!(cli.config, PathBuf::from("ids.json"));
        assert_eq!(TokenField::from(cli.token_field), TokenField::Access);
    }

    #[test]
    fn unknown_token_field_is_rejected() {
        assert!(Cli::try_parse_from(["impfzentren", "--token-field", "id"]).is_err());
    }
}
