use launchpad_core::{EnvVars, envfile};
use std::path::Path;

/// Render `envs/<environment>/<app>.json` into a dotenv file.
pub fn write_env(environment: &str, app: &str, output: &Path) -> anyhow::Result<()> {
    let vars = EnvVars::load(Path::new("."), environment, app)?;

    envfile::write(output, &vars)?;

    println!(
        "Wrote {} variable(s) to {}",
        vars.len(),
        output.display()
    );
    Ok(())
}
