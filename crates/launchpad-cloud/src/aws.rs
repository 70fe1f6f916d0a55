#[derive(Debug, thiserror::Error)]
pub enum AwsError {
    #[error("aws CLI not found — install: https://docs.aws.amazon.com/cli/latest/userguide/getting-started-install.html")]
    NotFound { source: std::io::Error },

    #[error("aws command failed: {args:?}\n{stderr}")]
    CommandFailed { args: Vec<String>, stderr: String },

    #[error("aws output was not valid UTF-8")]
    InvalidUtf8 { source: std::string::FromUtf8Error },

    #[error("unexpected output from `aws {command}`")]
    Decode {
        command: String,
        source: serde_json::Error,
    },
}

/// Parse JSON printed by `aws ... --output json`.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    args: &[String],
    output: &str,
) -> Result<T, AwsError> {
    serde_json::from_str(output).map_err(|e| AwsError::Decode {
        command: args.iter().take(2).cloned().collect::<Vec<_>>().join(" "),
        source: e,
    })
}
