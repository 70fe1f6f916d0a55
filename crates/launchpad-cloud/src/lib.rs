pub mod aws;
pub mod certificate;
pub mod client;
pub mod executor;
pub mod hosting;
pub mod provision;
pub mod vercel;

pub use aws::AwsError;
pub use certificate::{
    CertificateError, CertificateLookup, CertificateOrigin, CertificateStatus, ResolvedCertificate,
    ValidationPoll, ValidationRecord,
};
pub use client::{AwsClient, CheckResult, DoctorReport, PreflightError, PreflightReport};
pub use executor::{AwsExecutor, RealExecutor};
pub use hosting::{Bucket, Distribution, DistributionSpec, HostingError, ViewerTls};
pub use provision::{ProvisionError, SitePlan, StackOutputs, provision_site};
pub use vercel::{CreateProject, ProjectCreated, VercelClient, VercelError};
