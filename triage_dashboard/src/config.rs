use admin_client::{AdminApiConfig, PushConfig};
use log::*;

use crate::{cli::ConnectionOverrides, errors::DashboardError};

#[derive(Clone, Debug, Default)]
pub struct DashboardConfig {
    pub api: AdminApiConfig,
    pub push: PushConfig,
}

impl DashboardConfig {
    pub fn from_env_or_default() -> Self {
        Self { api: AdminApiConfig::from_env_or_default(), push: PushConfig::from_env_or_default() }
    }

    /// Command-line flags take precedence over the environment.
    pub fn apply_overrides(mut self, overrides: &ConnectionOverrides) -> Result<Self, DashboardError> {
        if let Some(url) = &overrides.api_url {
            debug!("🪛️ Using API URL {url} from the command line");
            self.api.base_url = url.clone();
        }
        if let Some(url) = &overrides.push_url {
            debug!("🪛️ Using push URL {url} from the command line");
            self.push.url = url.clone();
        }
        if let Some(protocol) = &overrides.push_protocol {
            self.push.protocol = protocol.parse().map_err(DashboardError::ConfigurationError)?;
        }
        Ok(self)
    }
}
