mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "launchpad", about = "Deploy static sites to AWS and Vercel")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a .env file from envs/<environment>/<app>.json
    Env {
        /// Environment name (e.g. dev, prod)
        #[arg(long)]
        environment: String,
        /// Application name
        #[arg(long)]
        app: String,
        /// Output file
        #[arg(long, short = 'o', default_value = ".env")]
        output: PathBuf,
    },
    /// Provision S3 + CloudFront hosting and sync the static export
    Deploy {
        /// Environment name (overrides [site].environment)
        #[arg(long)]
        environment: Option<String>,
        /// Application name (overrides [site].app)
        #[arg(long)]
        app: Option<String>,
        /// Print stack outputs as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a Vercel project with the environment's variables
    Vercel {
        /// Vercel API token
        #[arg(long, env = "VERCEL_TOKEN", hide_env_values = true)]
        token: String,
        /// GitHub repository (owner/repo)
        #[arg(long)]
        repo: String,
        /// Environment name
        #[arg(long, alias = "environment")]
        project: String,
        /// Application name
        #[arg(long, alias = "app")]
        name: String,
        /// Vercel API base URL (overrides [vercel].api_url)
        #[arg(long)]
        api_url: Option<String>,
        /// Team scope (overrides [vercel].team_id)
        #[arg(long)]
        team_id: Option<String>,
    },
    /// Add launchpad.toml to the current directory
    Init,
    /// Check AWS setup and readiness
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs on stderr; stdout carries command output (`deploy --json`).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                // arch-lint: allow(no-silent-result-drop) reason="unset or invalid RUST_LOG falls back to info"
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Env {
            environment,
            app,
            output,
        } => commands::write_env(&environment, &app, &output)?,
        Commands::Deploy {
            environment,
            app,
            json,
        } => commands::deploy(environment.as_deref(), app.as_deref(), json).await?,
        Commands::Vercel {
            token,
            repo,
            project,
            name,
            api_url,
            team_id,
        } => {
            let args = commands::VercelArgs {
                token: token.into(),
                repo,
                environment: project,
                app: name,
                api_url,
                team_id,
            };
            commands::vercel(args).await?
        }
        Commands::Init => commands::init_project()?,
        Commands::Doctor => commands::doctor().await?,
    }

    Ok(())
}
