//! Token credentials
//!
//! `DefaultCredential` walks a chain of sources: a client-secret credential
//! configured through `AZURE_*` variables, then the Azure CLI.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::infrastructure::traits::{CommandRunner, Environment, TokenCredential};
use crate::infrastructure::{InfraError, InfraResult};

/// Bearer token for one resource scope.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_on: Option<DateTime<Utc>>) -> Self {
        Self {
            token: token.into(),
            expires_on,
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

// ============================================================
// Azure CLI
// ============================================================

/// Subset of `az account get-access-token --output json`.
#[derive(Debug, Deserialize)]
struct CliTokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
    /// Epoch seconds (newer CLI versions)
    #[serde(default)]
    expires_on: Option<i64>,
}

/// Obtains tokens by shelling out to `az account get-access-token`.
pub struct AzureCliCredential {
    cmd: Arc<dyn CommandRunner>,
    program: String,
    timeout: Duration,
}

impl AzureCliCredential {
    pub fn new(cmd: Arc<dyn CommandRunner>, program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            cmd,
            program: program.into(),
            timeout,
        }
    }

    fn parse(&self, stdout: &[u8]) -> InfraResult<AccessToken> {
        let response: CliTokenResponse = serde_json::from_slice(stdout).map_err(|e| {
            InfraError::invalid_response(format!("{} token output: {}", self.program, e))
        })?;
        let expires_on = response
            .expires_on
            .and_then(|secs| DateTime::from_timestamp(secs, 0));
        Ok(AccessToken::new(response.access_token, expires_on))
    }
}

impl TokenCredential for AzureCliCredential {
    fn name(&self) -> &str {
        "AzureCliCredential"
    }

    #[instrument(level = "debug", skip(self))]
    fn get_token(&self, scope: &str) -> InfraResult<AccessToken> {
        let output = self
            .cmd
            .run(
                &self.program,
                &["account", "get-access-token", "--scope", scope, "--output", "json"],
                self.timeout,
            )
            .map_err(|e| InfraError::from_process(&self.program, self.timeout.as_secs(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("{} could not obtain a token", self.program)
            } else {
                stderr
            };
            return Err(InfraError::Authentication { message });
        }

        self.parse(&output.stdout)
    }
}

// ============================================================
// Client secret (service principal)
// ============================================================

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// OAuth2 client-credentials flow against the Microsoft identity platform.
pub struct ClientSecretCredential {
    http: reqwest::blocking::Client,
    authority_host: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
}

impl ClientSecretCredential {
    pub fn new(
        http: reqwest::blocking::Client,
        authority_host: impl Into<String>,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            authority_host: authority_host.into().trim_end_matches('/').to_string(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Build from `AZURE_TENANT_ID`, `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET`
    /// (and optional `AZURE_AUTHORITY_HOST`). `None` unless all three are set.
    pub fn from_env(env: &dyn Environment, http: reqwest::blocking::Client) -> Option<Self> {
        let non_empty = |key: &str| env.var(key).filter(|v| !v.trim().is_empty());
        let tenant = non_empty("AZURE_TENANT_ID")?;
        let client = non_empty("AZURE_CLIENT_ID")?;
        let secret = non_empty("AZURE_CLIENT_SECRET")?;
        let authority =
            non_empty("AZURE_AUTHORITY_HOST").unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string());
        Some(Self::new(http, authority, tenant, client, secret))
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host, self.tenant_id
        )
    }
}

impl TokenCredential for ClientSecretCredential {
    fn name(&self) -> &str {
        "ClientSecretCredential"
    }

    #[instrument(level = "debug", skip(self))]
    fn get_token(&self, scope: &str) -> InfraResult<AccessToken> {
        let response = self
            .http
            .post(self.token_url())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", scope),
            ])
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            let message = serde_json::from_str::<OAuthErrorResponse>(&body)
                .map(|e| e.error_description.unwrap_or(e.error))
                .unwrap_or_else(|_| format!("token endpoint returned {}", status.as_u16()));
            return Err(InfraError::Authentication { message });
        }

        let token: OAuthTokenResponse = serde_json::from_str(&body)
            .map_err(|e| InfraError::invalid_response(format!("token endpoint: {}", e)))?;
        let expires_on = token
            .expires_in
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs));
        Ok(AccessToken::new(token.access_token, expires_on))
    }
}

// ============================================================
// Chain
// ============================================================

/// Tries each source in order and returns the first token obtained.
pub struct DefaultCredential {
    sources: Vec<Arc<dyn TokenCredential>>,
}

impl DefaultCredential {
    pub fn new(sources: Vec<Arc<dyn TokenCredential>>) -> Self {
        Self { sources }
    }

    /// Standard chain: client secret (if configured), then Azure CLI.
    pub fn from_env(
        env: &dyn Environment,
        cmd: Arc<dyn CommandRunner>,
        http: reqwest::blocking::Client,
        az_program: &str,
        cli_timeout: Duration,
    ) -> Self {
        let mut sources: Vec<Arc<dyn TokenCredential>> = Vec::new();
        if let Some(secret) = ClientSecretCredential::from_env(env, http) {
            sources.push(Arc::new(secret));
        }
        sources.push(Arc::new(AzureCliCredential::new(cmd, az_program, cli_timeout)));
        Self::new(sources)
    }
}

impl TokenCredential for DefaultCredential {
    fn name(&self) -> &str {
        "DefaultCredential"
    }

    fn get_token(&self, scope: &str) -> InfraResult<AccessToken> {
        let mut failures = Vec::new();
        for source in &self.sources {
            match source.get_token(scope) {
                Ok(token) => {
                    debug!("token obtained via {}", source.name());
                    return Ok(token);
                }
                Err(e) => {
                    debug!("{} failed: {}", source.name(), e);
                    failures.push(format!("{}: {}", source.name(), e));
                }
            }
        }
        let message = if failures.is_empty() {
            "no credential sources configured".to_string()
        } else {
            failures.join("; ")
        };
        Err(InfraError::Authentication { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::process::{ExitStatus, Output};
    use std::sync::Mutex;

    #[cfg(unix)]
    fn exit_status(code: i32) -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(code << 8)
    }

    #[cfg(windows)]
    fn exit_status(code: i32) -> ExitStatus {
        use std::os::windows::process::ExitStatusExt;
        ExitStatus::from_raw(code as u32)
    }

    struct ScriptedRunner {
        result: Mutex<Option<io::Result<Output>>>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedRunner {
        fn new(result: io::Result<Output>) -> Self {
            Self {
                result: Mutex::new(Some(result)),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, cmd: &str, args: &[&str], _timeout: Duration) -> io::Result<Output> {
            let mut call = vec![cmd.to_string()];
            call.extend(args.iter().map(|a| a.to_string()));
            self.calls.lock().unwrap().push(call);
            self.result
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(io::Error::new(io::ErrorKind::Other, "no more results")))
        }

        fn run_interactive(
            &self,
            _cmd: &str,
            _args: &[&str],
            _timeout: Duration,
        ) -> io::Result<ExitStatus> {
            unreachable!("not used by credentials")
        }
    }

    struct Fixed(InfraResult<&'static str>);

    impl TokenCredential for Fixed {
        fn get_token(&self, _scope: &str) -> InfraResult<AccessToken> {
            match &self.0 {
                Ok(t) => Ok(AccessToken::new(*t, None)),
                Err(_) => Err(InfraError::Authentication {
                    message: "nope".into(),
                }),
            }
        }
    }

    #[test]
    fn given_cli_json_when_getting_token_then_parses_token_and_expiry() {
        let stdout = br#"{"accessToken":"abc","expiresOn":"2030-01-01 00:00:00.000000","expires_on":1893456000,"tokenType":"Bearer"}"#;
        let runner = Arc::new(ScriptedRunner::new(Ok(Output {
            status: exit_status(0),
            stdout: stdout.to_vec(),
            stderr: vec![],
        })));
        let cred = AzureCliCredential::new(runner.clone(), "az", Duration::from_secs(5));

        let token = cred.get_token("https://ai.azure.com/.default").unwrap();

        assert_eq!(token.token, "abc");
        assert_eq!(token.expires_on.unwrap().timestamp(), 1_893_456_000);
        let calls = runner.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            vec![
                "az",
                "account",
                "get-access-token",
                "--scope",
                "https://ai.azure.com/.default",
                "--output",
                "json"
            ]
        );
    }

    #[test]
    fn given_cli_failure_when_getting_token_then_authentication_error_carries_stderr() {
        let runner = Arc::new(ScriptedRunner::new(Ok(Output {
            status: exit_status(1),
            stdout: vec![],
            stderr: b"ERROR: Please run 'az login' to setup account.\n".to_vec(),
        })));
        let cred = AzureCliCredential::new(runner, "az", Duration::from_secs(5));

        let err = cred.get_token("scope").unwrap_err();

        match err {
            InfraError::Authentication { message } => assert!(message.contains("az login")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn given_cli_timeout_when_getting_token_then_timeout_error() {
        let runner = Arc::new(ScriptedRunner::new(Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "slow",
        ))));
        let cred = AzureCliCredential::new(runner, "az", Duration::from_secs(7));

        let err = cred.get_token("scope").unwrap_err();

        assert!(matches!(err, InfraError::Timeout { secs: 7, .. }));
    }

    #[test]
    fn given_first_source_fails_when_chaining_then_second_wins() {
        let chain = DefaultCredential::new(vec![
            Arc::new(Fixed(Err(InfraError::Authentication {
                message: String::new(),
            }))),
            Arc::new(Fixed(Ok("second"))),
        ]);

        assert_eq!(chain.get_token("scope").unwrap().token, "second");
    }

    #[test]
    fn given_all_sources_fail_when_chaining_then_authentication_error() {
        let chain = DefaultCredential::new(vec![Arc::new(Fixed(Err(
            InfraError::Authentication {
                message: String::new(),
            },
        )))]);

        let err = chain.get_token("scope").unwrap_err();
        assert_eq!(err.kind(), "AuthenticationError");
    }

    #[test]
    fn given_token_when_debug_printed_then_secret_is_hidden() {
        let token = AccessToken::new("super-secret", None);
        let printed = format!("{:?}", token);
        assert!(!printed.contains("super-secret"));
    }
}
