use launchpad_core::LaunchpadConfig;
use std::path::Path;

const TEMPLATE: &str = r#"[site]
# app = "portfolio"
# environment = "prod"
base_domain = "example.com"
# region = "us-east-1"

[build]
# output_dir = "out"

[certificate]
# validation_poll_attempts = 10
# validation_poll_interval_secs = 3

[vercel]
# api_url = "https://api.vercel.com"
# framework = "nextjs"
# team_id = "team_..."
"#;

/// Add launchpad.toml to the current directory.
pub fn init_project() -> anyhow::Result<()> {
    let config_path = Path::new(LaunchpadConfig::FILE_NAME);
    if config_path.exists() {
        eprintln!("{} already exists, skipping", LaunchpadConfig::FILE_NAME);
        println!("Nothing to create — already initialized.");
        return Ok(());
    }

    std::fs::write(config_path, TEMPLATE)?;
    println!("Created {}", LaunchpadConfig::FILE_NAME);

    println!();
    println!("Next steps:");
    println!();
    println!("  1. Set [site].base_domain in {}", LaunchpadConfig::FILE_NAME);
    println!();
    println!("  2. Describe each environment's variables:");
    println!("     envs/<environment>/<app>.json  ->  {{\"envs\": {{\"API_URL\": \"...\"}}}}");
    println!();
    println!("  3. Write a local .env:");
    println!("     launchpad env --environment dev --app <app>");
    println!();
    println!("  4. Deploy:");
    println!("     launchpad deploy --environment prod --app <app>");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_as_config() {
        let config: LaunchpadConfig = toml::from_str(TEMPLATE).unwrap();
        assert_eq!(config.site.base_domain.as_deref(), Some("example.com"));
        assert_eq!(config.build.output_dir, "out");
    }
}
