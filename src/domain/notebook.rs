// Copyright (c) 2025 - Cowboy AI, Inc.
//! Managed Notebook Descriptor

use serde::Serialize;

use super::invariants::{validate_non_empty, ValidationResult};

/// Whether a notebook feature is switched on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Toggle {
    Enabled,
    Disabled,
}

/// Interactive notebook settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotebookInstance {
    instance_type: String,
    default_code_repository: String,
    direct_internet_access: Toggle,
    root_access: Toggle,
}

impl NotebookInstance {
    /// `ml.t3.medium` with internet and root access
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            instance_type: "ml.t3.medium".to_string(),
            default_code_repository: repository.into(),
            direct_internet_access: Toggle::Enabled,
            root_access: Toggle::Enabled,
        }
    }

    pub fn with_instance_type(mut self, instance_type: impl Into<String>) -> Self {
        self.instance_type = instance_type.into();
        self
    }

    pub fn validate(&self) -> ValidationResult {
        validate_non_empty("notebook instance type", &self.instance_type)?;
        validate_non_empty("notebook repository", &self.default_code_repository)
    }

    pub fn instance_type(&self) -> &str {
        &self.instance_type
    }

    pub fn default_code_repository(&self) -> &str {
        &self.default_code_repository
    }

    /// Public placement is only useful with direct internet access
    pub fn needs_public_subnet(&self) -> bool {
        self.direct_internet_access == Toggle::Enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notebook_defaults() {
        let nb = NotebookInstance::new("https://example.com/repo.git");
        assert!(nb.validate().is_ok());
        assert!(nb.needs_public_subnet());
        let props = serde_json::to_value(&nb).unwrap();
        assert_eq!(props["InstanceType"], "ml.t3.medium");
        assert_eq!(props["DirectInternetAccess"], "Enabled");
        assert_eq!(props["RootAccess"], "Enabled");
        assert!(NotebookInstance::new("").validate().is_err());
    }
}
