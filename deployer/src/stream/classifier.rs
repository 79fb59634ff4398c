//! Log line classification
//!
//! Each line is checked independently for a live URL announcement, a failure
//! marker and a container id. Classification is stateless.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::DeployError;

/// Patterns used to classify log lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// First match in a line is the live URL
    #[serde(default = "default_url_pattern")]
    pub url_pattern: String,

    /// Case-insensitive substrings marking a failure line
    #[serde(default = "default_failure_keywords")]
    pub failure_keywords: Vec<String>,

    /// Capture group 1 is the container id
    #[serde(default = "default_container_pattern")]
    pub container_pattern: String,
}

fn default_url_pattern() -> String {
    r"http?://localhost:[0-9]+[^\s]*".to_string()
}

fn default_failure_keywords() -> Vec<String> {
    vec!["error".to_string(), "failed".to_string()]
}

fn default_container_pattern() -> String {
    r"\(container: ([0-9A-Za-z_.-]+)\)".to_string()
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            url_pattern: default_url_pattern(),
            failure_keywords: default_failure_keywords(),
            container_pattern: default_container_pattern(),
        }
    }
}

/// A log line with the signals found in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub line: String,

    /// Live URL announced by this line
    pub live_url: Option<String>,

    /// Set to the full line when it matches a failure keyword
    pub error: Option<String>,

    pub container_id: Option<String>,
}

/// Compiled classification predicates
#[derive(Debug, Clone)]
pub struct Classifier {
    url: Regex,
    container: Regex,
    failure_keywords: Vec<String>,
}

impl Classifier {
    pub fn new(settings: &ClassifierSettings) -> Result<Self, DeployError> {
        let url = Regex::new(&settings.url_pattern)
            .map_err(|e| DeployError::ConfigError(format!("Invalid URL pattern: {}", e)))?;
        let container = Regex::new(&settings.container_pattern)
            .map_err(|e| DeployError::ConfigError(format!("Invalid container pattern: {}", e)))?;

        Ok(Self {
            url,
            container,
            failure_keywords: settings
                .failure_keywords
                .iter()
                .filter(|k| !k.is_empty())
                .map(|k| k.to_lowercase())
                .collect(),
        })
    }

    pub fn live_url(&self, line: &str) -> Option<String> {
        self.url.find(line).map(|m| m.as_str().to_string())
    }

    pub fn is_failure(&self, line: &str) -> bool {
        let folded = line.to_lowercase();
        self.failure_keywords.iter().any(|k| folded.contains(k.as_str()))
    }

    pub fn container_id(&self, line: &str) -> Option<String> {
        self.container
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    pub fn classify(&self, line: String) -> ClassifiedEvent {
        let live_url = self.live_url(&line);
        let error = self.is_failure(&line).then(|| line.clone());
        let container_id = self.container_id(&line);
        ClassifiedEvent {
            line,
            live_url,
            error,
            container_id,
        }
    }
}
