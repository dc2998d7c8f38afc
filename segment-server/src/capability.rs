use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Metadata for a single named capability, as loaded from the registry file.
/// The segmentation core only ever consumes the name string; these fields
/// exist for whatever loads the underlying model, which is out of scope
/// here, but the shape is carried faithfully so the registry file format
/// stays compatible with the rest of the fleet.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    pub compute_device: String,
    pub model_dirs: Vec<String>,
    pub model_load_path: String,
    pub module: String,

    #[serde(default)]
    pub beam_size: Option<i32>,
    #[serde(default)]
    pub compute_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CapabilitySet {
    pub capabilities: HashMap<String, Capability>,
}

impl CapabilitySet {
    pub fn load(path: &Path) -> Result<Self, CapabilityError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CapabilityError::Load(path.display().to_string(), e.to_string()))?;
        serde_json::from_str(&text)
            .map_err(|e| CapabilityError::Parse(path.display().to_string(), e.to_string()))
    }

    pub fn module_capabilities(&self, module: &str) -> HashMap<&str, &Capability> {
        self.capabilities
            .iter()
            .filter(|(_, cap)| cap.module == module)
            .map(|(name, cap)| (name.as_str(), cap))
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("failed to read capability file {0}: {1}")]
    Load(String, String),
    #[error("failed to parse capability file {0}: {1}")]
    Parse(String, String),
}

/// Finds the first capability named in `header` (a comma-separated list, in
/// the client's preference order) that is also present in `enabled`. The
/// client's ordering wins ties, matching the upstream resolution order.
pub fn find_request_capability<'a>(
    enabled: &'a [String],
    header: &str,
) -> Option<&'a str> {
    header
        .split(',')
        .map(str::trim)
        .find_map(|requested| enabled.iter().find(|cap| cap.as_str() == requested))
        .map(String::as_str)
}
