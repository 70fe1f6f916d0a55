use crate::executor::{AwsExecutor, RealExecutor};
use serde::Deserialize;

/// AWS operations client, parameterized over the executor for testability.
///
/// Certificate and hosting operations live in [`crate::certificate`] and
/// [`crate::hosting`] as further `impl` blocks on this type.
pub struct AwsClient<E: AwsExecutor = RealExecutor> {
    pub(crate) executor: E,
}

impl AwsClient<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for AwsClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CallerIdentity {
    account: String,
    arn: String,
}

impl<E: AwsExecutor> AwsClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    // ── Preflight ──

    pub async fn check_prerequisites(&self) -> Result<PreflightReport, PreflightError> {
        let mut report = PreflightReport::default();

        // 1. aws CLI available
        match self.executor.exec(&args(["--version"])).await {
            Ok(version) => report.aws_version = Some(parse_cli_version(&version)),
            Err(_) => return Err(PreflightError::AwsCliNotInstalled),
        }

        // 2. Authenticated
        let identity_args = args(["sts", "get-caller-identity", "--output", "json"]);
        match self.executor.exec(&identity_args).await {
            Ok(out) => {
                let identity: CallerIdentity = crate::aws::decode(&identity_args, &out)
                    .map_err(|e| PreflightError::Identity { source: e })?;
                report.account = Some(identity.account);
                report.caller_arn = Some(identity.arn);
            }
            Err(_) => return Err(PreflightError::NotAuthenticated),
        }

        tracing::debug!(
            aws_version = ?report.aws_version,
            account = ?report.account,
            "preflight passed"
        );
        Ok(report)
    }

    // ── Doctor ──

    /// Run all diagnostic checks without early return.
    /// Returns a report with pass/fail for each check item.
    pub async fn doctor(&self) -> DoctorReport {
        let mut report = DoctorReport::default();

        // 1. aws CLI
        match self.executor.exec(&args(["--version"])).await {
            Ok(v) => report.aws_cli = CheckResult::ok(&parse_cli_version(&v)),
            Err(e) => report.aws_cli = CheckResult::fail(&e.to_string()),
        }

        // 2. Caller identity
        let identity_args = args(["sts", "get-caller-identity", "--output", "json"]);
        match self.executor.exec(&identity_args).await {
            Ok(out) => match crate::aws::decode::<CallerIdentity>(&identity_args, &out) {
                Ok(id) => {
                    report.identity = CheckResult::ok(&format!("{} ({})", id.account, id.arn));
                }
                Err(e) => report.identity = CheckResult::fail(&e.to_string()),
            },
            Err(_) => report.identity = CheckResult::fail("no credentials — run: aws configure"),
        }

        report
    }
}

// ── Helper ──

pub(crate) fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}

/// `aws-cli/2.15.0 Python/3.11.6 ...` → `2.15.0`
fn parse_cli_version(output: &str) -> String {
    // arch-lint: allow(no-silent-result-drop) reason="empty version output is reported as unknown"
    let first = output.split_whitespace().next().unwrap_or("unknown");
    // arch-lint: allow(no-silent-result-drop) reason="non-standard banners are shown as printed"
    first.strip_prefix("aws-cli/").unwrap_or(first).to_owned()
}

// ── Preflight types ──

#[derive(Debug, Default)]
pub struct PreflightReport {
    pub aws_version: Option<String>,
    pub account: Option<String>,
    pub caller_arn: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PreflightError {
    #[error(
        "aws CLI not installed — https://docs.aws.amazon.com/cli/latest/userguide/getting-started-install.html"
    )]
    AwsCliNotInstalled,

    #[error("not authenticated — run: aws configure (or set AWS_PROFILE)")]
    NotAuthenticated,

    #[error("could not read caller identity")]
    Identity { source: crate::aws::AwsError },
}

// ── Doctor types ──

#[derive(Debug, Default)]
pub struct DoctorReport {
    pub aws_cli: CheckResult,
    pub identity: CheckResult,
    pub config_file: CheckResult,
    pub base_domain: CheckResult,
    pub output_dir: CheckResult,
}

impl DoctorReport {
    pub fn all_passed(&self) -> bool {
        self.checks().iter().all(|(_, c)| c.passed)
    }

    fn checks(&self) -> [(&'static str, &CheckResult); 5] {
        [
            ("aws CLI", &self.aws_cli),
            ("Credentials", &self.identity),
            ("launchpad.toml", &self.config_file),
            ("Base domain", &self.base_domain),
            ("Output dir", &self.output_dir),
        ]
    }
}

impl std::fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Launchpad Doctor")?;
        writeln!(f, "────────────────────────────────")?;
        for (label, check) in self.checks() {
            writeln!(f, "{label:<16} {:<4} {}", check.icon(), check.detail)?;
        }
        writeln!(f, "────────────────────────────────")?;
        if self.all_passed() {
            write!(f, "All checks passed!")
        } else {
            write!(f, "Some checks failed.")
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn ok(detail: &str) -> Self {
        Self {
            passed: true,
            detail: detail.to_owned(),
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            passed: false,
            detail: detail.to_owned(),
        }
    }

    pub fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}
