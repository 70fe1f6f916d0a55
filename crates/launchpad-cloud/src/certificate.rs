//! ACM certificate resolution: reuse an issued certificate for the
//! subdomain, or request a DNS-validated one and surface its challenge
//! records.

use crate::aws::{AwsError, decode};
use crate::client::{AwsClient, args};
use crate::executor::AwsExecutor;
use launchpad_core::{CertificateConfig, StackNames};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// CloudFront only accepts certificates issued in us-east-1.
pub const ACM_REGION: &str = "us-east-1";

/// `list-certificates` omits non-RSA-2048 keys unless asked for them.
const KEY_TYPES_FILTER: &str = "keyTypes=RSA_1024,RSA_2048,RSA_3072,RSA_4096,EC_prime256v1,EC_secp384r1,EC_secp521r1";

const REUSABLE_TYPES: &[&str] = &["AMAZON_ISSUED", "IMPORTED"];

// ── Types ──

/// ACM reports timestamps as epoch seconds or ISO 8601 depending on the
/// CLI's `cli_timestamp_format`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Epoch(f64),
    Text(String),
}

impl Timestamp {
    pub fn epoch_seconds(&self) -> Option<f64> {
        match self {
            Self::Epoch(secs) => Some(*secs),
            Self::Text(s) => match chrono::DateTime::parse_from_rfc3339(s) {
                Ok(dt) => Some(dt.timestamp_millis() as f64 / 1000.0),
                Err(e) => {
                    tracing::warn!(value = %s, error = %e, "unparseable ACM timestamp");
                    None
                }
            },
        }
    }
}

/// One entry of `acm list-certificates`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CertificateSummary {
    pub certificate_arn: String,
    pub domain_name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "Type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub not_before: Option<Timestamp>,
    #[serde(default)]
    pub issued_at: Option<Timestamp>,
    #[serde(default)]
    pub imported_at: Option<Timestamp>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl CertificateSummary {
    fn recency(&self) -> f64 {
        [
            &self.not_before,
            &self.issued_at,
            &self.imported_at,
            &self.created_at,
        ]
        .into_iter()
        .flatten()
        .find_map(Timestamp::epoch_seconds)
        // arch-lint: allow(no-silent-result-drop) reason="undated certificates sort last"
        .unwrap_or(f64::MIN)
    }

    fn is_reusable_for(&self, domain: &str) -> bool {
        self.domain_name.eq_ignore_ascii_case(domain)
            && self.status.as_deref().is_none_or(|s| s == "ISSUED")
            && self
                .kind
                .as_deref()
                .is_none_or(|k| REUSABLE_TYPES.contains(&k))
    }

    /// Only ACM-issued requests can still be waiting on DNS validation.
    fn is_pending_for(&self, domain: &str) -> bool {
        self.domain_name.eq_ignore_ascii_case(domain)
            && self
                .status
                .as_deref()
                .is_none_or(|s| s == "PENDING_VALIDATION")
            && self.kind.as_deref().is_none_or(|k| k == "AMAZON_ISSUED")
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListCertificates {
    #[serde(default)]
    certificate_summary_list: Vec<CertificateSummary>,
}

/// Outcome of looking up an existing certificate.
///
/// A failed query is kept distinct from "nothing found" so callers never
/// request a duplicate certificate because the inventory was unreachable.
#[derive(Debug)]
pub enum CertificateLookup {
    Found(CertificateSummary),
    NotFound,
    QueryFailed(AwsError),
}

/// DNS challenge record the operator must publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationRecord {
    pub domain: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateOrigin {
    /// Issued before this run; not owned by launchpad.
    Existing,
    /// Requested by launchpad, on this run or on an earlier one whose DNS
    /// validation is still outstanding.
    Requested,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateStatus {
    Issued,
    PendingValidation,
    #[serde(untagged)]
    Other(String),
}

impl From<&str> for CertificateStatus {
    fn from(s: &str) -> Self {
        match s {
            "ISSUED" => Self::Issued,
            "PENDING_VALIDATION" => Self::PendingValidation,
            other => Self::Other(other.to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCertificate {
    pub arn: String,
    pub origin: CertificateOrigin,
    pub status: CertificateStatus,
    /// Present only when the certificate is awaiting DNS validation.
    pub validation_records: Option<Vec<ValidationRecord>>,
}

impl ResolvedCertificate {
    /// CloudFront refuses certificates that are not yet issued.
    pub fn is_usable(&self) -> bool {
        self.status == CertificateStatus::Issued
    }
}

/// Bounded wait for ACM to attach validation records to a new request.
#[derive(Debug, Clone, Copy)]
pub struct ValidationPoll {
    pub attempts: u32,
    pub interval: Duration,
}

impl From<&CertificateConfig> for ValidationPoll {
    fn from(config: &CertificateConfig) -> Self {
        Self {
            attempts: config.validation_poll_attempts.max(1),
            interval: Duration::from_secs(config.validation_poll_interval_secs),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RequestCertificateOutput {
    certificate_arn: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeCertificateOutput {
    certificate: CertificateDetail,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CertificateDetail {
    status: String,
    #[serde(default)]
    domain_validation_options: Vec<DomainValidation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DomainValidation {
    domain_name: String,
    #[serde(default)]
    resource_record: Option<ResourceRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResourceRecord {
    name: String,
    #[serde(rename = "Type")]
    record_type: String,
    value: String,
}

/// Pick the most recently issued reusable certificate for `domain`.
pub fn select_most_recent(
    summaries: Vec<CertificateSummary>,
    domain: &str,
) -> Option<CertificateSummary> {
    summaries
        .into_iter()
        .filter(|c| c.is_reusable_for(domain))
        .max_by(|a, b| a.recency().total_cmp(&b.recency()))
}

/// Pick the most recently created certificate for `domain` that is still
/// waiting on DNS validation.
pub fn select_pending(
    summaries: Vec<CertificateSummary>,
    domain: &str,
) -> Option<CertificateSummary> {
    summaries
        .into_iter()
        .filter(|c| c.is_pending_for(domain))
        .max_by(|a, b| a.recency().total_cmp(&b.recency()))
}

// ── Operations ──

impl<E: AwsExecutor> AwsClient<E> {
    async fn list_certificates(&self, status: &str) -> Result<Vec<CertificateSummary>, AwsError> {
        let cmd = args([
            "acm",
            "list-certificates",
            "--region",
            ACM_REGION,
            "--certificate-statuses",
            status,
            "--includes",
            KEY_TYPES_FILTER,
            "--output",
            "json",
        ]);

        let output = self.executor.exec(&cmd).await?;
        let list: ListCertificates = decode(&cmd, &output)?;
        Ok(list.certificate_summary_list)
    }

    pub async fn lookup_certificate(&self, domain: &str) -> CertificateLookup {
        match self.list_certificates("ISSUED").await {
            Ok(summaries) => match select_most_recent(summaries, domain) {
                Some(cert) => CertificateLookup::Found(cert),
                None => CertificateLookup::NotFound,
            },
            Err(e) => CertificateLookup::QueryFailed(e),
        }
    }

    /// A certificate for `domain` requested earlier and still awaiting DNS
    /// validation. ACM only deduplicates requests within its idempotency
    /// window, so later runs must find the pending one themselves.
    pub async fn find_pending_certificate(
        &self,
        domain: &str,
    ) -> Result<Option<CertificateSummary>, AwsError> {
        let summaries = self.list_certificates("PENDING_VALIDATION").await?;
        Ok(select_pending(summaries, domain))
    }

    pub async fn request_certificate(&self, names: &StackNames) -> Result<String, CertificateError> {
        let token = names.idempotency_token();
        let tags = format!("Key=Name,Value={}", names.certificate);
        let cmd = args([
            "acm",
            "request-certificate",
            "--region",
            ACM_REGION,
            "--domain-name",
            &names.subdomain,
            "--validation-method",
            "DNS",
            "--idempotency-token",
            &token,
            "--tags",
            &tags,
            "--output",
            "json",
        ]);

        let output = self
            .executor
            .exec(&cmd)
            .await
            .map_err(|e| CertificateError::Request {
                domain: names.subdomain.clone(),
                source: e,
            })?;

        let parsed: RequestCertificateOutput =
            decode(&cmd, &output).map_err(|e| CertificateError::Request {
                domain: names.subdomain.clone(),
                source: e,
            })?;

        Ok(parsed.certificate_arn)
    }

    /// Poll `describe-certificate` until every domain carries its DNS
    /// challenge record. ACM fills them in asynchronously after a request.
    pub async fn wait_for_validation_records(
        &self,
        arn: &str,
        poll: ValidationPoll,
    ) -> Result<(CertificateStatus, Vec<ValidationRecord>), CertificateError> {
        let cmd = args([
            "acm",
            "describe-certificate",
            "--region",
            ACM_REGION,
            "--certificate-arn",
            arn,
            "--output",
            "json",
        ]);

        for attempt in 1..=poll.attempts {
            let output = self
                .executor
                .exec(&cmd)
                .await
                .map_err(|e| CertificateError::Describe {
                    arn: arn.to_owned(),
                    source: e,
                })?;
            let detail: DescribeCertificateOutput =
                decode(&cmd, &output).map_err(|e| CertificateError::Describe {
                    arn: arn.to_owned(),
                    source: e,
                })?;

            if let Some(records) = collect_records(&detail.certificate) {
                return Ok((detail.certificate.status.as_str().into(), records));
            }

            tracing::debug!(arn, attempt, "validation records not ready");
            if attempt < poll.attempts {
                tokio::time::sleep(poll.interval).await;
            }
        }

        Err(CertificateError::ValidationRecordsUnavailable {
            arn: arn.to_owned(),
            attempts: poll.attempts,
        })
    }

    /// Reuse an issued certificate for the subdomain, or request one.
    pub async fn resolve_certificate(
        &self,
        names: &StackNames,
        poll: ValidationPoll,
    ) -> Result<ResolvedCertificate, CertificateError> {
        match self.lookup_certificate(&names.subdomain).await {
            CertificateLookup::Found(cert) => {
                tracing::info!(arn = %cert.certificate_arn, domain = %names.subdomain, "reusing issued certificate");
                Ok(ResolvedCertificate {
                    arn: cert.certificate_arn,
                    origin: CertificateOrigin::Existing,
                    status: CertificateStatus::Issued,
                    validation_records: None,
                })
            }
            CertificateLookup::NotFound => {
                let pending = self
                    .find_pending_certificate(&names.subdomain)
                    .await
                    .map_err(|e| CertificateError::Query {
                        domain: names.subdomain.clone(),
                        source: e,
                    })?;

                let arn = match pending {
                    Some(cert) => {
                        tracing::info!(arn = %cert.certificate_arn, domain = %names.subdomain, "certificate still pending validation; not requesting another");
                        cert.certificate_arn
                    }
                    None => {
                        tracing::info!(domain = %names.subdomain, "no certificate; requesting one");
                        self.request_certificate(names).await?
                    }
                };
                let (status, records) = self.wait_for_validation_records(&arn, poll).await?;
                Ok(ResolvedCertificate {
                    arn,
                    origin: CertificateOrigin::Requested,
                    status,
                    validation_records: Some(records),
                })
            }
            CertificateLookup::QueryFailed(e) => Err(CertificateError::Query {
                domain: names.subdomain.clone(),
                source: e,
            }),
        }
    }
}

fn collect_records(detail: &CertificateDetail) -> Option<Vec<ValidationRecord>> {
    if detail.domain_validation_options.is_empty() {
        return None;
    }
    detail
        .domain_validation_options
        .iter()
        .map(|opt| {
            opt.resource_record.as_ref().map(|rr| ValidationRecord {
                domain: opt.domain_name.clone(),
                name: rr.name.clone(),
                record_type: rr.record_type.clone(),
                value: rr.value.clone(),
            })
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("certificate inventory query failed for {domain}; refusing to request a duplicate")]
    Query { domain: String, source: AwsError },

    #[error("failed to request certificate for {domain}")]
    Request { domain: String, source: AwsError },

    #[error("failed to describe certificate {arn}")]
    Describe { arn: String, source: AwsError },

    #[error("ACM did not publish DNS validation records for {arn} after {attempts} attempt(s)")]
    ValidationRecordsUnavailable { arn: String, attempts: u32 },
}
