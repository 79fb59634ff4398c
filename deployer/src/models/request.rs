//! Deployment request

use std::collections::BTreeMap;

use build_api::models::DeployPayload;
use url::Url;

use crate::errors::DeployError;
use crate::models::presets::AppType;

/// One environment variable row; rows with an empty key are dropped on submit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A deployment request as entered by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    pub repository_url: String,
    pub app_type: AppType,
    pub install_command: String,
    pub build_command: String,
    pub start_command: String,
    pub port: u16,
    pub root_folder: String,
    pub environment: Vec<EnvVar>,
}

impl DeploymentRequest {
    /// Create a request pre-populated from the preset of `app_type`
    pub fn from_preset(repository_url: impl Into<String>, app_type: AppType) -> Self {
        let preset = app_type.preset();
        Self {
            repository_url: repository_url.into(),
            app_type,
            install_command: preset.install_cmd.to_string(),
            build_command: preset.build_cmd.to_string(),
            start_command: preset.start_cmd.to_string(),
            port: preset.port,
            root_folder: String::new(),
            environment: Vec::new(),
        }
    }

    /// Check the request before anything is sent
    pub fn validate(&self) -> Result<(), DeployError> {
        if self.repository_url.is_empty() {
            return Err(DeployError::ValidationError(
                "Repository URL is required".to_string(),
            ));
        }

        if Url::parse(&self.repository_url).is_err() {
            return Err(DeployError::ValidationError(
                "Please enter a valid URL".to_string(),
            ));
        }

        if self.start_command.is_empty() {
            return Err(DeployError::ValidationError(
                "Start command is required".to_string(),
            ));
        }

        Ok(())
    }

    /// Environment with empty keys removed; a repeated key keeps its last value
    pub fn environment_map(&self) -> BTreeMap<String, String> {
        self.environment
            .iter()
            .filter(|var| !var.key.is_empty())
            .map(|var| (var.key.clone(), var.value.clone()))
            .collect()
    }

    /// Build the JSON body for the build service
    pub fn to_payload(&self) -> DeployPayload {
        DeployPayload {
            repo_url: self.repository_url.clone(),
            app_type: self.app_type.as_str().to_string(),
            install_cmd: self.install_command.clone(),
            build_cmd: self.build_command.clone(),
            start_cmd: self.start_command.clone(),
            port: self.port,
            root_folder: self.root_folder.clone(),
            env: self.environment_map(),
        }
    }
}
