use crate::aws::AwsError;
use std::process::Stdio;
use tokio::process::Command;

/// Abstraction over aws CLI execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
#[allow(async_fn_in_trait)]
pub trait AwsExecutor: Send + Sync {
    /// Execute an aws command and capture stdout.
    async fn exec(&self, args: &[String]) -> Result<String, AwsError>;

    /// Execute an aws command, streaming output to the terminal.
    async fn exec_streaming(&self, args: &[String]) -> Result<(), AwsError>;
}

/// Environment forced on every aws invocation. AWS CLI v2 pipes output
/// through a pager and may open the interactive prompt; either would block
/// an unattended deploy.
const NON_INTERACTIVE_ENV: [(&str, &str); 2] = [("AWS_PAGER", ""), ("AWS_CLI_AUTO_PROMPT", "off")];

/// Real aws CLI executor.
pub struct RealExecutor;

fn aws_command(args: &[String]) -> Command {
    let mut cmd = Command::new("aws");
    cmd.args(args).envs(NON_INTERACTIVE_ENV).stdin(Stdio::null());
    cmd
}

impl AwsExecutor for RealExecutor {
    async fn exec(&self, args: &[String]) -> Result<String, AwsError> {
        tracing::debug!(?args, "aws exec");
        let output = aws_command(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| AwsError::NotFound { source: e })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| AwsError::InvalidUtf8 { source: e })
        } else {
            Err(AwsError::CommandFailed {
                args: args.to_vec(),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_owned(),
            })
        }
    }

    /// Used for `s3 sync`, whose per-file progress goes straight to the terminal.
    async fn exec_streaming(&self, args: &[String]) -> Result<(), AwsError> {
        tracing::debug!(?args, "aws exec (streaming)");
        let status = aws_command(args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| AwsError::NotFound { source: e })?;

        if status.success() {
            Ok(())
        } else {
            Err(AwsError::CommandFailed {
                args: args.to_vec(),
                stderr: format!("exit code: {status}"),
            })
        }
    }
}
