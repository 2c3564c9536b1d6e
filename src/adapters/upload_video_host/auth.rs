//! Delegated authorization for the video host
//!
//! The interactive consent flow lives outside this crate. We only obtain a
//! bearer token, either configured directly or printed by a helper command.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::errors::DomainError;

/// Source of a bearer token for the video host
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn access_token(&self, cancel: &CancellationToken) -> Result<String, DomainError>;
}

/// A token supplied up front
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl Authorizer for StaticToken {
    async fn access_token(&self, _cancel: &CancellationToken) -> Result<String, DomainError> {
        Ok(self.token.clone())
    }
}

/// Runs a helper command whose trimmed stdout is the token
pub struct CommandAuthorizer {
    program: String,
    args: Vec<String>,
}

impl CommandAuthorizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a configured command line on whitespace
    pub fn from_command_line(command_line: &str) -> Result<Self, DomainError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| DomainError::Config("Authorization command is empty".to_string()))?;
        Ok(Self::new(program, parts.collect()))
    }
}

#[async_trait]
impl Authorizer for CommandAuthorizer {
    async fn access_token(&self, cancel: &CancellationToken) -> Result<String, DomainError> {
        debug!(program = %self.program, "Requesting access token");
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DomainError::upload(format!("Failed to run authorization command {}: {}", self.program, e))
            })?;

        let output = tokio::select! {
            output = child.wait_with_output() => output?,
            _ = cancel.cancelled() => return Err(DomainError::Cancelled),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DomainError::upload(format!(
                "Authorization command failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(DomainError::upload("Authorization command printed no token"));
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        let token = StaticToken::new("abc").access_token(&CancellationToken::new()).await.unwrap();
        assert_eq!(token, "abc");
    }

    #[test]
    fn test_command_line_split() {
        assert!(CommandAuthorizer::from_command_line("   ").is_err());
        let authorizer = CommandAuthorizer::from_command_line("gcloud auth print-access-token").unwrap();
        assert_eq!(authorizer.program, "gcloud");
        assert_eq!(authorizer.args, vec!["auth", "print-access-token"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_stdout_is_token() {
        let authorizer = CommandAuthorizer::new("sh", vec!["-c".into(), "echo ' tok123 '".into()]);
        let token = authorizer.access_token(&CancellationToken::new()).await.unwrap();
        assert_eq!(token, "tok123");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_failure_surfaces_stderr() {
        let authorizer = CommandAuthorizer::new("sh", vec!["-c".into(), "echo denied >&2; exit 3".into()]);
        let err = authorizer.access_token(&CancellationToken::new()).await.unwrap_err();
        assert!(err.to_string().contains("denied"));
    }
}
