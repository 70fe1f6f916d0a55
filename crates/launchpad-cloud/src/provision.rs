//! Static site stack orchestration.
//!
//! ```text
//! launchpad deploy
//!   1. Bucket        ── s3api head-bucket / create-bucket
//!   2. OAC           ── cloudfront list/create-origin-access-control
//!   3. Certificate   ── acm list-certificates → request-certificate
//!   4. Distribution  ── cloudfront list/create/update-distribution   (1, 2, 3)
//!   5. Bucket policy ── s3api put-bucket-policy                      (1, 4)
//!   6. Folder sync   ── s3 sync <output_dir> s3://<bucket>           (after 4)
//! ```
//!
//! Steps run strictly in order; the first failure aborts the run and
//! already-reconciled resources are left in place for the next run.

use crate::certificate::{CertificateError, ResolvedCertificate, ValidationPoll, ValidationRecord};
use crate::client::AwsClient;
use crate::executor::AwsExecutor;
use crate::hosting::{DistributionSpec, HostingError, ViewerTls, bucket_policy};
use launchpad_core::StackNames;
use serde::Serialize;
use std::path::PathBuf;

/// Everything needed to reconcile one site stack.
#[derive(Debug, Clone)]
pub struct SitePlan {
    pub names: StackNames,
    /// Bucket region
    pub region: String,
    /// Local static export directory
    pub site_dir: PathBuf,
    pub poll: ValidationPoll,
}

/// Operator-facing results of a deploy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackOutputs {
    /// CNAMEs for ACM validation; only present while the certificate awaits validation.
    pub acm_dns_validation_records: Option<Vec<ValidationRecord>>,
    pub acm_certificate_arn: String,
    pub cloudfront_target: String,
    pub suggested_dns_instructions: String,
}

impl StackOutputs {
    pub fn new(names: &StackNames, certificate: ResolvedCertificate, cloudfront_domain: &str) -> Self {
        Self {
            acm_dns_validation_records: certificate.validation_records,
            acm_certificate_arn: certificate.arn,
            cloudfront_target: cloudfront_domain.to_owned(),
            suggested_dns_instructions: dns_instructions(&names.subdomain, cloudfront_domain),
        }
    }
}

pub fn dns_instructions(subdomain: &str, cloudfront_domain: &str) -> String {
    format!(
        "Ask your DNS provider to create:\n\
         1) (If present) CNAME(s) for ACM validation from acmDnsValidationRecords.\n\
         2) CNAME record: {subdomain} -> {cloudfront_domain}\n"
    )
}

/// Reconcile the full stack for `plan` and return its outputs.
pub async fn provision_site<E: AwsExecutor>(
    client: &AwsClient<E>,
    plan: &SitePlan,
) -> Result<StackOutputs, ProvisionError> {
    let names = &plan.names;
    tracing::info!(app = %names.app, environment = %names.environment, subdomain = %names.subdomain, "provisioning site stack");

    // Nothing to serve: fail before touching any resource.
    if !plan.site_dir.is_dir() {
        return Err(HostingError::SiteDirMissing(plan.site_dir.clone()).into());
    }

    let bucket = client.ensure_bucket(&names.bucket, &plan.region).await?;
    let oac_id = client
        .ensure_origin_access_control(&names.origin_access_control)
        .await?;
    let certificate = client.resolve_certificate(names, plan.poll).await?;

    let spec = DistributionSpec {
        name: &names.distribution,
        bucket: &bucket,
        origin_access_control_id: &oac_id,
        tls: ViewerTls::for_site(&certificate, &names.subdomain),
    };
    let distribution = client.ensure_distribution(&spec).await?;

    let policy = bucket_policy(&bucket.arn, &distribution.arn);
    client.put_bucket_policy(&bucket.name, &policy).await?;

    tracing::info!(folder = %names.folder, dir = %plan.site_dir.display(), "syncing site files");
    client.sync_folder(&plan.site_dir, &bucket.name).await?;

    Ok(StackOutputs::new(names, certificate, &distribution.domain_name))
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Certificate(#[from] CertificateError),

    #[error(transparent)]
    Hosting(#[from] HostingError),
}
