use launchpad_cloud::{CreateProject, VercelClient};
use launchpad_core::{EnvVars, LaunchpadConfig, platform_project_name};
use secrecy::SecretString;
use std::path::Path;

pub struct VercelArgs {
    pub token: SecretString,
    pub repo: String,
    pub environment: String,
    pub app: String,
    pub api_url: Option<String>,
    pub team_id: Option<String>,
}

/// Create a Vercel project for `<app>-<environment>`.
pub async fn vercel(args: VercelArgs) -> anyhow::Result<()> {
    let project_dir = Path::new(".");
    let config = LaunchpadConfig::load(project_dir)?;
    let env = EnvVars::load(project_dir, &args.environment, &args.app)?;

    // arch-lint: allow(no-silent-result-drop) reason="the flag overrides the configured URL"
    let api_url = args.api_url.as_deref().unwrap_or(&config.vercel.api_url);
    let team_id = args.team_id.or(config.vercel.team_id);
    let client = VercelClient::new(args.token, api_url, team_id)?;

    let project = CreateProject {
        name: platform_project_name(&args.app, &args.environment),
        framework: config.vercel.framework,
        output_directory: config.build.output_dir,
        repo: args.repo,
        env,
    };

    println!("Creating Vercel project {}...", project.name);
    let created = client.create_project(&project).await?;

    println!("Project created: {}", created.id);
    println!("Project Details:");
    println!("{}", serde_json::to_string_pretty(&created.details)?);

    Ok(())
}
