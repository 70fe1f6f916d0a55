//! S3 + CloudFront static hosting resources.
//!
//! Each `ensure_*` operation describes the resource first and creates it
//! only when missing, so re-running a deploy converges on the same stack.

use crate::aws::{AwsError, decode};
use crate::certificate::ResolvedCertificate;
use crate::client::{AwsClient, args};
use crate::executor::AwsExecutor;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

const CLOUDFRONT_PRINCIPAL: &str = "cloudfront.amazonaws.com";

// ── Types ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub name: String,
    pub arn: String,
    pub regional_domain: String,
}

impl Bucket {
    pub fn new(name: &str, region: &str) -> Self {
        Self {
            name: name.to_owned(),
            arn: format!("arn:aws:s3:::{name}"),
            regional_domain: format!("{name}.s3.{region}.amazonaws.com"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Distribution {
    pub id: String,
    #[serde(rename = "ARN")]
    pub arn: String,
    pub domain_name: String,
}

/// Viewer-facing TLS for the distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerTls {
    /// ACM certificate served via SNI, with the site hostname as alias.
    Acm {
        certificate_arn: String,
        aliases: Vec<String>,
    },
    /// Shared `*.cloudfront.net` certificate; CloudFront allows no aliases here.
    Default,
}

impl ViewerTls {
    /// Attach the certificate when it is issued. A certificate still pending
    /// DNS validation cannot be attached yet, so the default certificate is
    /// used until a later run finds it issued.
    pub fn for_site(certificate: &ResolvedCertificate, subdomain: &str) -> Self {
        if certificate.is_usable() {
            Self::Acm {
                certificate_arn: certificate.arn.clone(),
                aliases: vec![subdomain.to_owned()],
            }
        } else {
            tracing::warn!(
                arn = %certificate.arn,
                status = ?certificate.status,
                "certificate not issued yet; using default CloudFront certificate"
            );
            Self::Default
        }
    }

    pub fn viewer_certificate(&self) -> Value {
        match self {
            Self::Acm {
                certificate_arn, ..
            } => json!({
                "ACMCertificateArn": certificate_arn,
                "SSLSupportMethod": "sni-only",
                "MinimumProtocolVersion": "TLSv1.2_2021",
            }),
            Self::Default => json!({ "CloudFrontDefaultCertificate": true }),
        }
    }

    pub fn aliases(&self) -> Value {
        let items: &[String] = match self {
            Self::Acm { aliases, .. } => aliases,
            Self::Default => &[],
        };
        if items.is_empty() {
            json!({ "Quantity": 0 })
        } else {
            json!({ "Quantity": items.len(), "Items": items })
        }
    }

    /// Whether an existing `ViewerCertificate` block already satisfies this
    /// setting. A distribution already on an ACM certificate is never
    /// downgraded to the default one.
    pub fn is_satisfied_by(&self, existing: &Value) -> bool {
        let existing_arn = existing.get("ACMCertificateArn").and_then(Value::as_str);
        match self {
            Self::Acm {
                certificate_arn, ..
            } => existing_arn == Some(certificate_arn.as_str()),
            Self::Default => true,
        }
    }
}

/// Desired state of the site distribution.
#[derive(Debug, Clone)]
pub struct DistributionSpec<'a> {
    /// Used as `CallerReference` and `Comment`; the comment is how a later
    /// run finds this distribution again.
    pub name: &'a str,
    pub bucket: &'a Bucket,
    pub origin_access_control_id: &'a str,
    pub tls: ViewerTls,
}

/// Full `DistributionConfig` for `cloudfront create-distribution`.
pub fn distribution_config(spec: &DistributionSpec<'_>) -> Value {
    let origin_id = &spec.bucket.arn;
    json!({
        "CallerReference": spec.name,
        "Comment": spec.name,
        "Enabled": true,
        "DefaultRootObject": "index.html",
        "PriceClass": "PriceClass_100",
        "Aliases": spec.tls.aliases(),
        "ViewerCertificate": spec.tls.viewer_certificate(),
        "Origins": {
            "Quantity": 1,
            "Items": [{
                "Id": origin_id,
                "DomainName": spec.bucket.regional_domain,
                "OriginAccessControlId": spec.origin_access_control_id,
                "S3OriginConfig": { "OriginAccessIdentity": "" },
            }],
        },
        "DefaultCacheBehavior": {
            "TargetOriginId": origin_id,
            "ViewerProtocolPolicy": "redirect-to-https",
            "AllowedMethods": {
                "Quantity": 2,
                "Items": ["GET", "HEAD"],
                "CachedMethods": { "Quantity": 2, "Items": ["GET", "HEAD"] },
            },
            "Compress": true,
            "ForwardedValues": {
                "QueryString": false,
                "Cookies": { "Forward": "none" },
            },
            "MinTTL": 0,
        },
        "CustomErrorResponses": {
            "Quantity": 1,
            "Items": [{
                "ErrorCode": 404,
                "ResponseCode": "404",
                "ResponsePagePath": "/404.html",
            }],
        },
        "Restrictions": {
            "GeoRestriction": { "RestrictionType": "none", "Quantity": 0 },
        },
    })
}

/// Read-only access for CloudFront, limited to one distribution.
pub fn bucket_policy(bucket_arn: &str, distribution_arn: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Sid": "AllowCloudFrontServicePrincipalReadOnly",
            "Effect": "Allow",
            "Principal": { "Service": CLOUDFRONT_PRINCIPAL },
            "Action": ["s3:GetObject"],
            "Resource": [format!("{bucket_arn}/*")],
            "Condition": { "StringEquals": { "AWS:SourceArn": distribution_arn } },
        }],
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OacListOutput {
    origin_access_control_list: OacList,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OacList {
    #[serde(default)]
    items: Vec<OacSummary>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OacSummary {
    id: String,
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OacCreateOutput {
    origin_access_control: OacCreated,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OacCreated {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DistributionListOutput {
    distribution_list: DistributionList,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DistributionList {
    #[serde(default)]
    items: Vec<DistributionSummary>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DistributionSummary {
    #[serde(flatten)]
    distribution: Distribution,
    #[serde(default)]
    comment: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DistributionCreateOutput {
    distribution: Distribution,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DistributionConfigOutput {
    #[serde(rename = "ETag")]
    etag: String,
    distribution_config: serde_json::Map<String, Value>,
}

// ── Operations ──

impl<E: AwsExecutor> AwsClient<E> {
    /// Ensure the site bucket exists, creating it if needed.
    pub async fn ensure_bucket(&self, name: &str, region: &str) -> Result<Bucket, HostingError> {
        let exists = self
            .executor
            .exec(&args(["s3api", "head-bucket", "--bucket", name]))
            .await
            .is_ok();

        if exists {
            tracing::info!(bucket = name, "bucket exists");
        } else {
            let mut cmd = args([
                "s3api",
                "create-bucket",
                "--bucket",
                name,
                "--region",
                region,
                "--output",
                "json",
            ]);
            // us-east-1 rejects an explicit LocationConstraint
            if region != "us-east-1" {
                cmd.push("--create-bucket-configuration".to_owned());
                cmd.push(format!("LocationConstraint={region}"));
            }
            self.executor
                .exec(&cmd)
                .await
                .map_err(|e| HostingError::Bucket {
                    name: name.to_owned(),
                    source: e,
                })?;
            tracing::info!(bucket = name, region, "bucket created");
        }

        Ok(Bucket::new(name, region))
    }

    /// Ensure an S3 origin access control named `name` exists; returns its id.
    pub async fn ensure_origin_access_control(&self, name: &str) -> Result<String, HostingError> {
        let to_err = |e| HostingError::OriginAccessControl {
            name: name.to_owned(),
            source: e,
        };

        let list_cmd = args(["cloudfront", "list-origin-access-controls", "--output", "json"]);
        let output = self.executor.exec(&list_cmd).await.map_err(to_err)?;
        let listed: OacListOutput = decode(&list_cmd, &output).map_err(to_err)?;

        if let Some(existing) = listed
            .origin_access_control_list
            .items
            .into_iter()
            .find(|o| o.name == name)
        {
            tracing::info!(oac = name, id = %existing.id, "origin access control exists");
            return Ok(existing.id);
        }

        let config = json!({
            "Name": name,
            "SigningProtocol": "sigv4",
            "SigningBehavior": "always",
            "OriginAccessControlOriginType": "s3",
        })
        .to_string();
        let create_cmd = args([
            "cloudfront",
            "create-origin-access-control",
            "--origin-access-control-config",
            &config,
            "--output",
            "json",
        ]);
        let output = self.executor.exec(&create_cmd).await.map_err(to_err)?;
        let created: OacCreateOutput = decode(&create_cmd, &output).map_err(to_err)?;

        tracing::info!(oac = name, id = %created.origin_access_control.id, "origin access control created");
        Ok(created.origin_access_control.id)
    }

    /// Ensure the site distribution exists and serves the desired certificate.
    pub async fn ensure_distribution(
        &self,
        spec: &DistributionSpec<'_>,
    ) -> Result<Distribution, HostingError> {
        let to_err = |e| HostingError::Distribution {
            name: spec.name.to_owned(),
            source: e,
        };

        let list_cmd = args(["cloudfront", "list-distributions", "--output", "json"]);
        let output = self.executor.exec(&list_cmd).await.map_err(to_err)?;
        let listed: DistributionListOutput = decode(&list_cmd, &output).map_err(to_err)?;

        if let Some(existing) = listed
            .distribution_list
            .items
            .into_iter()
            .find(|d| d.comment == spec.name)
        {
            let distribution = existing.distribution;
            tracing::info!(distribution = spec.name, id = %distribution.id, "distribution exists");
            self.reconcile_viewer_tls(&distribution.id, &spec.tls)
                .await
                .map_err(to_err)?;
            return Ok(distribution);
        }

        let config = distribution_config(spec).to_string();
        let create_cmd = args([
            "cloudfront",
            "create-distribution",
            "--distribution-config",
            &config,
            "--output",
            "json",
        ]);
        let output = self.executor.exec(&create_cmd).await.map_err(to_err)?;
        let created: DistributionCreateOutput = decode(&create_cmd, &output).map_err(to_err)?;

        tracing::info!(
            distribution = spec.name,
            id = %created.distribution.id,
            domain = %created.distribution.domain_name,
            "distribution created"
        );
        Ok(created.distribution)
    }

    /// Swap in the desired viewer certificate and aliases when they differ.
    async fn reconcile_viewer_tls(&self, id: &str, tls: &ViewerTls) -> Result<(), AwsError> {
        let get_cmd = args([
            "cloudfront",
            "get-distribution-config",
            "--id",
            id,
            "--output",
            "json",
        ]);
        let output = self.executor.exec(&get_cmd).await?;
        let current: DistributionConfigOutput = decode(&get_cmd, &output)?;

        let mut config = current.distribution_config;
        let satisfied = config
            .get("ViewerCertificate")
            .is_some_and(|vc| tls.is_satisfied_by(vc));
        if satisfied {
            tracing::debug!(id, "viewer certificate up to date");
            return Ok(());
        }

        config.insert("ViewerCertificate".to_owned(), tls.viewer_certificate());
        config.insert("Aliases".to_owned(), tls.aliases());
        let config = Value::Object(config).to_string();
        self.executor
            .exec(&args([
                "cloudfront",
                "update-distribution",
                "--id",
                id,
                "--if-match",
                &current.etag,
                "--distribution-config",
                &config,
                "--output",
                "json",
            ]))
            .await?;

        tracing::info!(id, "distribution viewer certificate updated");
        Ok(())
    }

    pub async fn put_bucket_policy(&self, bucket: &str, policy: &Value) -> Result<(), HostingError> {
        let policy = policy.to_string();
        self.executor
            .exec(&args([
                "s3api",
                "put-bucket-policy",
                "--bucket",
                bucket,
                "--policy",
                &policy,
            ]))
            .await
            .map_err(|e| HostingError::Policy {
                bucket: bucket.to_owned(),
                source: e,
            })?;

        tracing::info!(bucket, "bucket policy applied");
        Ok(())
    }

    /// Mirror `dir` into the bucket, deleting objects no longer present locally.
    pub async fn sync_folder(&self, dir: &Path, bucket: &str) -> Result<(), HostingError> {
        if !dir.is_dir() {
            return Err(HostingError::SiteDirMissing(dir.to_path_buf()));
        }
        let dir_str = dir
            .to_str()
            .ok_or_else(|| HostingError::InvalidPath(dir.to_path_buf()))?;
        let target = format!("s3://{bucket}");

        self.executor
            .exec_streaming(&args(["s3", "sync", dir_str, &target, "--delete"]))
            .await
            .map_err(|e| HostingError::Sync {
                bucket: bucket.to_owned(),
                source: e,
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HostingError {
    #[error("failed to ensure bucket {name}")]
    Bucket { name: String, source: AwsError },

    #[error("failed to ensure origin access control {name}")]
    OriginAccessControl { name: String, source: AwsError },

    #[error("failed to ensure distribution {name}")]
    Distribution { name: String, source: AwsError },

    #[error("failed to apply bucket policy to {bucket}")]
    Policy { bucket: String, source: AwsError },

    #[error("failed to sync site files to {bucket}")]
    Sync { bucket: String, source: AwsError },

    #[error("site directory {0} not found — run the static export first")]
    SiteDirMissing(PathBuf),

    #[error("site directory path is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::{CertificateOrigin, CertificateStatus};

    fn cert(status: CertificateStatus) -> ResolvedCertificate {
        ResolvedCertificate {
            arn: "arn:aws:acm:us-east-1:123:certificate/abc".to_owned(),
            origin: CertificateOrigin::Existing,
            status,
            validation_records: None,
        }
    }

    fn spec<'a>(bucket: &'a Bucket, tls: ViewerTls) -> DistributionSpec<'a> {
        DistributionSpec {
            name: "dist-blog-prod",
            bucket,
            origin_access_control_id: "E2OAC",
            tls,
        }
    }

    #[test]
    fn bucket_names_derive_arn_and_domain() {
        let bucket = Bucket::new("bucket-blog-prod", "eu-west-1");
        assert_eq!(bucket.arn, "arn:aws:s3:::bucket-blog-prod");
        assert_eq!(bucket.regional_domain, "bucket-blog-prod.s3.eu-west-1.amazonaws.com");
    }

    #[test]
    fn issued_certificate_uses_acm_with_alias() {
        let tls = ViewerTls::for_site(&cert(CertificateStatus::Issued), "blog.example.dev");
        let vc = tls.viewer_certificate();
        assert_eq!(vc["ACMCertificateArn"], "arn:aws:acm:us-east-1:123:certificate/abc");
        assert_eq!(vc["SSLSupportMethod"], "sni-only");
        assert_eq!(vc["MinimumProtocolVersion"], "TLSv1.2_2021");
        assert_eq!(tls.aliases()["Items"][0], "blog.example.dev");
    }

    #[test]
    fn pending_certificate_falls_back_to_default() {
        let tls = ViewerTls::for_site(&cert(CertificateStatus::PendingValidation), "blog.example.dev");
        assert_eq!(tls, ViewerTls::Default);
        assert_eq!(tls.viewer_certificate()["CloudFrontDefaultCertificate"], true);
        assert_eq!(tls.aliases(), json!({ "Quantity": 0 }));
    }

    #[test]
    fn distribution_config_wires_bucket_and_oac() {
        let bucket = Bucket::new("bucket-blog-prod", "us-east-1");
        let config = distribution_config(&spec(&bucket, ViewerTls::Default));

        let origin = &config["Origins"]["Items"][0];
        assert_eq!(origin["Id"], "arn:aws:s3:::bucket-blog-prod");
        assert_eq!(origin["DomainName"], "bucket-blog-prod.s3.us-east-1.amazonaws.com");
        assert_eq!(origin["OriginAccessControlId"], "E2OAC");
        assert_eq!(
            config["DefaultCacheBehavior"]["TargetOriginId"],
            "arn:aws:s3:::bucket-blog-prod"
        );
        assert_eq!(config["Comment"], "dist-blog-prod");
        assert_eq!(config["CallerReference"], "dist-blog-prod");
    }

    #[test]
    fn distribution_config_cache_and_errors() {
        let bucket = Bucket::new("b", "us-east-1");
        let config = distribution_config(&spec(&bucket, ViewerTls::Default));

        let behavior = &config["DefaultCacheBehavior"];
        assert_eq!(behavior["ViewerProtocolPolicy"], "redirect-to-https");
        assert_eq!(behavior["AllowedMethods"]["Items"], json!(["GET", "HEAD"]));
        assert_eq!(behavior["Compress"], true);
        assert_eq!(behavior["ForwardedValues"]["Cookies"]["Forward"], "none");
        assert_eq!(config["PriceClass"], "PriceClass_100");
        assert_eq!(config["DefaultRootObject"], "index.html");
        assert_eq!(
            config["CustomErrorResponses"]["Items"][0]["ResponsePagePath"],
            "/404.html"
        );
        assert_eq!(
            config["Restrictions"]["GeoRestriction"]["RestrictionType"],
            "none"
        );
    }

    #[test]
    fn bucket_policy_scoped_to_distribution() {
        let policy = bucket_policy(
            "arn:aws:s3:::bucket-blog-prod",
            "arn:aws:cloudfront::123:distribution/EX",
        );
        let statement = &policy["Statement"][0];
        assert_eq!(statement["Principal"]["Service"], "cloudfront.amazonaws.com");
        assert_eq!(statement["Action"], json!(["s3:GetObject"]));
        assert_eq!(statement["Resource"], json!(["arn:aws:s3:::bucket-blog-prod/*"]));
        assert_eq!(
            statement["Condition"]["StringEquals"]["AWS:SourceArn"],
            "arn:aws:cloudfront::123:distribution/EX"
        );
    }

    #[test]
    fn bucket_policy_never_names_another_distribution() {
        let policy = bucket_policy("arn:aws:s3:::b", "arn:aws:cloudfront::123:distribution/X");
        let source = &policy["Statement"][0]["Condition"]["StringEquals"]["AWS:SourceArn"];
        assert_ne!(source, "arn:aws:cloudfront::123:distribution/Y");
        assert!(!policy.to_string().contains("distribution/Y"));
    }

    #[test]
    fn acm_tls_not_satisfied_by_default_certificate() {
        let tls = ViewerTls::for_site(&cert(CertificateStatus::Issued), "blog.example.dev");
        assert!(!tls.is_satisfied_by(&json!({ "CloudFrontDefaultCertificate": true })));
        assert!(tls.is_satisfied_by(&json!({
            "ACMCertificateArn": "arn:aws:acm:us-east-1:123:certificate/abc"
        })));
    }

    #[test]
    fn default_tls_never_downgrades_existing_acm() {
        assert!(ViewerTls::Default.is_satisfied_by(&json!({
            "ACMCertificateArn": "arn:aws:acm:us-east-1:123:certificate/old"
        })));
    }
}
