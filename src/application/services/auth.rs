//! Authentication gate
//!
//! Authenticated means: the Azure CLI answers `--version` and the credential
//! chain yields a token for the management scope.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::{timeouts, Settings, MANAGEMENT_SCOPE};
use crate::domain::AuthStatus;
use crate::infrastructure::traits::{CommandRunner, Prompter, TokenCredential};
use crate::infrastructure::{InfraError, InfraResult};

const LOGIN_HINT: &str = "Run: az login";
const INSTALL_HINT: &str =
    "Install the Azure CLI: https://learn.microsoft.com/cli/azure/install-azure-cli";

#[derive(Debug, Deserialize)]
struct AccountUser {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Account {
    user: AccountUser,
}

/// Whether a failed check may start `az login`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginPolicy {
    Never,
    Ask,
    Always,
}

/// Everything `foundry-auth` shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthReport {
    /// First line of `az --version`, `None` if the CLI is unavailable
    pub cli_version: Option<String>,
    pub user: Option<String>,
    pub status: AuthStatus,
}

pub struct AuthService {
    cmd: Arc<dyn CommandRunner>,
    credential: Arc<dyn TokenCredential>,
    settings: Arc<Settings>,
}

impl AuthService {
    pub fn new(
        cmd: Arc<dyn CommandRunner>,
        credential: Arc<dyn TokenCredential>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            cmd,
            credential,
            settings,
        }
    }

    fn az(&self) -> &str {
        &self.settings.az_path
    }

    /// Run `az` with captured output; non-zero exit is an error carrying stderr.
    fn run_az(&self, args: &[&str], timeout: Duration) -> InfraResult<String> {
        let output = self
            .cmd
            .run(self.az(), args, timeout)
            .map_err(|e| InfraError::from_process(self.az(), timeout.as_secs(), e))?;
        if !output.status.success() {
            return Err(InfraError::Command {
                program: self.az().to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                exit_code: output.status.code(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// First line of `az --version`.
    #[instrument(level = "debug", skip(self))]
    pub fn cli_version(&self) -> InfraResult<String> {
        let stdout = self.run_az(&["--version"], timeouts::VERSION_CHECK)?;
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    pub fn cli_installed(&self) -> bool {
        match self.cli_version() {
            Ok(version) => {
                debug!("azure cli: {}", version);
                true
            }
            Err(e) => {
                debug!("azure cli unavailable: {}", e);
                false
            }
        }
    }

    /// Signed-in user from `az account show`.
    #[instrument(level = "debug", skip(self))]
    pub fn account_user(&self) -> InfraResult<String> {
        let stdout = self.run_az(
            &["account", "show", "--output", "json"],
            timeouts::ACCOUNT_CHECK,
        )?;
        let account: Account = serde_json::from_str(&stdout)
            .map_err(|e| InfraError::invalid_response(format!("az account show: {}", e)))?;
        Ok(account.user.name)
    }

    /// Try to obtain a management-scope token.
    pub fn check_token(&self) -> InfraResult<()> {
        self.credential.get_token(MANAGEMENT_SCOPE).map(|token| {
            debug!("token acquired via {}: {:?}", self.credential.name(), token);
        })
    }

    /// Both gate checks, without side effects.
    #[instrument(level = "debug", skip(self))]
    pub fn verify(&self) -> AuthStatus {
        self.gate(self.cli_installed())
    }

    /// Gate status given an already known CLI check result.
    fn gate(&self, cli_installed: bool) -> AuthStatus {
        if !cli_installed {
            return AuthStatus::failed(
                "Azure CLI not found",
                vec![INSTALL_HINT.to_string(), LOGIN_HINT.to_string()],
            );
        }
        self.token_status()
    }

    fn token_status(&self) -> AuthStatus {
        match self.check_token() {
            Ok(()) => AuthStatus::ok("Authenticated"),
            Err(e) => AuthStatus::failed(
                format!("Not authenticated: {}", e),
                vec![LOGIN_HINT.to_string()],
            ),
        }
    }

    /// Run `az login` attached to the terminal.
    pub fn login(&self) -> InfraResult<()> {
        info!("starting az login");
        let timeout = timeouts::INTERACTIVE_LOGIN;
        let status = self
            .cmd
            .run_interactive(self.az(), &["login"], timeout)
            .map_err(|e| InfraError::from_process(self.az(), timeout.as_secs(), e))?;
        if status.success() {
            Ok(())
        } else {
            Err(InfraError::Command {
                program: self.az().to_string(),
                message: "login failed".to_string(),
                exit_code: status.code(),
            })
        }
    }

    /// Verify; on failure log in according to `policy` and verify again.
    pub fn ensure(&self, prompter: &dyn Prompter, policy: LoginPolicy) -> AuthStatus {
        let cli_installed = self.cli_installed();
        let status = self.gate(cli_installed);
        if status.authenticated || policy == LoginPolicy::Never || !cli_installed {
            return status;
        }

        if policy == LoginPolicy::Ask {
            match prompter.confirm("Not logged in. Run 'az login' now?", true) {
                Ok(true) => {}
                Ok(false) => return status,
                Err(e) => {
                    warn!("prompt failed: {}", e);
                    return status;
                }
            }
        }

        if let Err(e) = self.login() {
            return AuthStatus::failed(format!("Login failed: {}", e), vec![LOGIN_HINT.to_string()]);
        }
        self.gate(true)
    }

    /// Collect CLI version, user and token status.
    ///
    /// A missing CLI is only a warning here: the credential chain may still
    /// produce a token from service principal variables.
    pub fn report(&self) -> AuthReport {
        let cli_version = self
            .cli_version()
            .map_err(|e| debug!("azure cli unavailable: {}", e))
            .ok();
        let status = self.token_status();
        let user = if status.authenticated && cli_version.is_some() {
            self.account_user()
                .map_err(|e| debug!("account lookup failed: {}", e))
                .ok()
        } else {
            None
        };
        AuthReport {
            cli_version,
            user,
            status,
        }
    }
}
