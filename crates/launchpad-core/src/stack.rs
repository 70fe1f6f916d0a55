//! Resource naming for one `(app, environment)` hosting stack.
//!
//! Every managed resource is named `<kind>-<app>-<environment>`, so two
//! environments of the same app never collide and a re-run finds the
//! resources it declared before.

/// ACM rejects idempotency tokens longer than this.
const IDEMPOTENCY_TOKEN_MAX: usize = 32;

/// S3 bucket names are capped at 63 characters; `folder-` plus two
/// identifiers and a separator must fit.
const IDENTIFIER_MAX: usize = 27;

/// Validate an app or environment identifier.
///
/// Accepts lowercase ASCII letters, digits and `-`, not starting or ending
/// with `-`. Identifiers end up in file paths, bucket names and hostnames,
/// so anything else is rejected up front.
pub fn validate_identifier(kind: &'static str, value: &str) -> crate::Result<()> {
    let reason = if value.is_empty() {
        Some("must not be empty")
    } else if value.len() > IDENTIFIER_MAX {
        Some("must be at most 27 characters")
    } else if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        Some("only lowercase letters, digits and '-' are allowed")
    } else if value.starts_with('-') || value.ends_with('-') {
        Some("must not start or end with '-'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(crate::Error::InvalidIdentifier {
            kind,
            value: value.to_owned(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Names of every resource in a hosting stack.
///
/// # Examples
///
/// ```
/// use launchpad_core::StackNames;
///
/// let names = StackNames::new("portfolio", "prod", "example.dev").unwrap();
/// assert_eq!(names.subdomain, "portfolio.example.dev");
/// assert_eq!(names.bucket, "bucket-portfolio-prod");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackNames {
    pub app: String,
    pub environment: String,
    /// Public hostname: `<app>.<base_domain>`
    pub subdomain: String,
    pub bucket: String,
    pub certificate: String,
    pub distribution: String,
    pub origin_access_control: String,
    pub policy: String,
    pub folder: String,
}

impl StackNames {
    pub fn new(app: &str, environment: &str, base_domain: &str) -> crate::Result<Self> {
        validate_identifier("app", app)?;
        validate_identifier("environment", environment)?;

        let base_domain = base_domain.trim().trim_matches('.');
        if base_domain.is_empty() {
            return Err(crate::Error::InvalidIdentifier {
                kind: "base_domain",
                value: base_domain.to_owned(),
                reason: "must not be empty",
            });
        }

        let suffixed = |kind: &str| format!("{kind}-{app}-{environment}");

        Ok(Self {
            app: app.to_owned(),
            environment: environment.to_owned(),
            subdomain: format!("{app}.{base_domain}"),
            bucket: suffixed("bucket"),
            certificate: suffixed("cert"),
            distribution: suffixed("dist"),
            origin_access_control: suffixed("oac"),
            policy: suffixed("policy"),
            folder: suffixed("folder"),
        })
    }

    /// Project name used on the hosting platform: `<app>-<environment>`.
    pub fn platform_project(&self) -> String {
        platform_project_name(&self.app, &self.environment)
    }

    /// Token passed to `acm request-certificate` so repeated requests for the
    /// same stack return the same certificate.
    pub fn idempotency_token(&self) -> String {
        self.certificate
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .take(IDEMPOTENCY_TOKEN_MAX)
            .collect()
    }
}

/// `<app>-<environment>`; does not require a base domain.
pub fn platform_project_name(app: &str, environment: &str) -> String {
    format!("{app}-{environment}")
}
