use launchpad_cloud::{AwsClient, SitePlan, StackOutputs, ValidationPoll, provision_site};
use launchpad_core::{LaunchpadConfig, StackNames};
use std::path::PathBuf;

/// Provision the static hosting stack and sync the export.
pub async fn deploy(
    environment: Option<&str>,
    app: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let project_dir = PathBuf::from(".");
    let config = LaunchpadConfig::load(&project_dir)?;

    let app = config.resolve_app(app)?;
    let environment = config.resolve_environment(environment)?;
    let base_domain = config.require_base_domain()?;
    let names = StackNames::new(app, environment, base_domain)?;

    let plan = SitePlan {
        names,
        region: config.site.region.clone(),
        site_dir: project_dir.join(&config.build.output_dir),
        poll: ValidationPoll::from(&config.certificate),
    };

    let client = AwsClient::new();

    // Pre-flight checks
    if !json {
        println!("Running pre-flight checks...");
    }
    let report = client.check_prerequisites().await?;
    tracing::info!(account = ?report.account, "aws credentials ok");

    if !json {
        println!(
            "Deploying {} ({}) to {}...",
            plan.names.app, plan.names.environment, plan.names.subdomain
        );
    }
    let outputs = provision_site(&client, &plan).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
    } else {
        print_outputs(&outputs);
    }

    Ok(())
}

fn print_outputs(outputs: &StackOutputs) {
    println!();
    println!("Certificate:       {}", outputs.acm_certificate_arn);
    println!("CloudFront target: {}", outputs.cloudfront_target);

    if let Some(records) = &outputs.acm_dns_validation_records {
        println!();
        println!("ACM validation records:");
        for record in records {
            println!(
                "  {} {} -> {}  ({})",
                record.record_type, record.name, record.value, record.domain
            );
        }
    }

    println!();
    print!("{}", outputs.suggested_dns_instructions);
}
