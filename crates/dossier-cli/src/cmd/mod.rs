pub mod edit;
pub mod relations;
pub mod search;
pub mod show;

use std::sync::Arc;

use dossier_core::EditSettings;
use dossier_core::config::EffectiveConfig;
use dossier_core::error::ErrorCode;
use dossier_core::gateway::ReportGateway;
use dossier_core::session::SessionError;

use crate::client::GraphQlGateway;
use crate::output::{CliError, OutputMode, render_error};

/// Everything a command needs besides its own arguments.
pub struct Context {
    pub output: OutputMode,
    pub config: EffectiveConfig,
    pub me: Option<String>,
}

impl Context {
    pub fn settings(&self) -> EditSettings {
        EditSettings::from(&self.config.project)
    }

    /// Build the remote gateway, or report that no server is configured.
    pub fn gateway(&self) -> anyhow::Result<Arc<dyn ReportGateway>> {
        let Some(url) = self.config.server.url.clone() else {
            let code = ErrorCode::ServerNotConfigured;
            render_error(self.output, &CliError::coded(code.message(), code))?;
            anyhow::bail!("{}: {}", code.code(), code.message());
        };
        Ok(Arc::new(GraphQlGateway::new(
            url,
            self.config.server.token.clone(),
        )))
    }

    /// Render a session error and turn it into a command failure.
    pub fn fail(&self, err: &SessionError) -> anyhow::Error {
        let cli_err = CliError::coded(err.to_string(), err.code());
        if let Err(render_err) = render_error(self.output, &cli_err) {
            return render_err;
        }
        anyhow::anyhow!("{}: {err}", err.code())
    }
}
