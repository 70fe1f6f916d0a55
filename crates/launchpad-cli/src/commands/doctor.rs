use launchpad_cloud::{AwsClient, CheckResult};
use launchpad_core::LaunchpadConfig;
use std::path::Path;

pub async fn doctor() -> anyhow::Result<()> {
    let project_dir = Path::new(".");
    let client = AwsClient::new();
    let mut report = client.doctor().await;

    match LaunchpadConfig::load(project_dir) {
        Ok(config) => {
            report.config_file = if project_dir.join(LaunchpadConfig::FILE_NAME).exists() {
                CheckResult::ok("Found")
            } else {
                CheckResult::fail("Not found — run: launchpad init")
            };

            report.base_domain = match config.require_base_domain() {
                Ok(domain) => CheckResult::ok(domain),
                Err(e) => CheckResult::fail(&e.to_string()),
            };

            let output_dir = project_dir.join(&config.build.output_dir);
            report.output_dir = if output_dir.is_dir() {
                CheckResult::ok(&config.build.output_dir)
            } else {
                CheckResult::fail(&format!(
                    "{} not found — run the static export first",
                    config.build.output_dir
                ))
            };
        }
        Err(e) => {
            report.config_file = CheckResult::fail(&e.to_string());
            report.base_domain = CheckResult::fail("launchpad.toml unreadable");
            report.output_dir = CheckResult::fail("launchpad.toml unreadable");
        }
    }

    println!();
    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("some checks failed — see above for details");
    }

    Ok(())
}
