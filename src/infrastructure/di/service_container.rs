//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{AgentService, AuthService, EnvFileService, SetupService};
use crate::application::ApplicationResult;
use crate::config::{timeouts, Settings, AGENT_SCOPE};
use crate::infrastructure::credential::DefaultCredential;
use crate::infrastructure::foundry::{http_client, FoundryClient};
use crate::infrastructure::traits::{
    AgentBackend, CommandRunner, Environment, FileSystem, ProcessEnvironment, Prompter,
    RealCommandRunner, RealFileSystem, TerminalPrompter, TokenCredential,
};
use crate::infrastructure::InfraResult;

/// Container holding the I/O boundaries and building services on demand.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Command runner abstraction
    pub cmd: Arc<dyn CommandRunner>,

    pub env: Arc<dyn Environment>,

    pub prompter: Arc<dyn Prompter>,

    /// Token source for the gate and the agent client
    pub credential: Arc<dyn TokenCredential>,

    /// Injected agent backend; the HTTP client is built when absent
    backend: Option<Arc<dyn AgentBackend>>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let cmd: Arc<dyn CommandRunner> = Arc::new(RealCommandRunner);
        let env: Arc<dyn Environment> = Arc::new(ProcessEnvironment);
        let credential = DefaultCredential::from_env(
            env.as_ref(),
            cmd.clone(),
            http_client(settings.timeout())?,
            &settings.az_path,
            timeouts::TOKEN_FETCH,
        );

        Ok(Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            cmd,
            env,
            Arc::new(TerminalPrompter::default()),
            Arc::new(credential),
        ))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        env: Arc<dyn Environment>,
        prompter: Arc<dyn Prompter>,
        credential: Arc<dyn TokenCredential>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            fs,
            cmd,
            env,
            prompter,
            credential,
            backend: None,
        }
    }

    /// Use `backend` instead of the HTTP client.
    pub fn with_backend(mut self, backend: Arc<dyn AgentBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Agent service for the configured endpoint. Fails if no endpoint is set.
    pub fn agent_service(&self) -> ApplicationResult<AgentService> {
        let backend = match &self.backend {
            Some(backend) => backend.clone(),
            None => {
                let endpoint = self.settings.endpoint()?;
                Arc::new(FoundryClient::new(
                    http_client(self.settings.timeout())?,
                    endpoint,
                    self.settings.api_version.clone(),
                    self.credential.clone(),
                    AGENT_SCOPE,
                ))
            }
        };
        Ok(AgentService::new(backend, self.settings.agent_name.clone()))
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(self.cmd.clone(), self.credential.clone(), self.settings.clone())
    }

    pub fn env_file_service(&self) -> EnvFileService {
        EnvFileService::new(self.fs.clone(), self.env.clone())
    }

    pub fn setup_service(&self) -> SetupService {
        SetupService::new(
            self.auth_service(),
            self.env_file_service(),
            self.fs.clone(),
            self.env.clone(),
            self.prompter.clone(),
            self.settings.clone(),
        )
    }
}
