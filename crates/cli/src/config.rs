//! JSON configuration loaded with `--config`.

use std::path::Path;

use pw_locator::{GenerateOptions, IconPolicy};
use serde::{Deserialize, Serialize};

use crate::error::{LocatorCliError, Result};

/// Schema version for config files.
pub const SCHEMA_VERSION: u32 = 1;

/// Generation defaults. Unset icon lists keep the built-in policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LocatorConfig {
	pub schema_version: u32,
	pub test_id_attribute: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub icon_class_prefixes: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub icon_attributes: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub icon_tags: Option<Vec<String>>,
	pub omit_internal_engines: bool,
}

impl Default for LocatorConfig {
	fn default() -> Self {
		Self {
			schema_version: SCHEMA_VERSION,
			test_id_attribute: "data-testid".to_string(),
			icon_class_prefixes: None,
			icon_attributes: None,
			icon_tags: None,
			omit_internal_engines: false,
		}
	}
}

impl LocatorConfig {
	pub fn load(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path).map_err(|source| LocatorCliError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_json(&text).map_err(|message| LocatorCliError::Config {
			path: path.to_path_buf(),
			message,
		})
	}

	fn from_json(text: &str) -> std::result::Result<Self, String> {
		let config: Self = serde_json::from_str(text).map_err(|err| err.to_string())?;
		if config.schema_version > SCHEMA_VERSION {
			return Err(format!(
				"schemaVersion {} is newer than supported version {SCHEMA_VERSION}",
				config.schema_version
			));
		}
		if config.test_id_attribute.trim().is_empty() {
			return Err("testIdAttribute must not be empty".to_string());
		}
		Ok(config)
	}

	pub fn icon_policy(&self) -> IconPolicy {
		let defaults = IconPolicy::default();
		IconPolicy {
			class_prefixes: self.icon_class_prefixes.clone().unwrap_or(defaults.class_prefixes),
			attributes: self.icon_attributes.clone().unwrap_or(defaults.attributes),
			tags: self.icon_tags.clone().unwrap_or(defaults.tags),
		}
	}

	/// Options for generation before per-command flags are applied.
	pub fn generate_options(&self) -> GenerateOptions {
		GenerateOptions {
			test_id_attribute_name: self.test_id_attribute.clone(),
			omit_internal_engines: self.omit_internal_engines,
			icons: self.icon_policy(),
			..GenerateOptions::default()
		}
	}
}
