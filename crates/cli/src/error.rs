use std::path::PathBuf;

use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, LocatorCliError>;

#[derive(Debug, Error)]
pub enum LocatorCliError {
	#[error("failed to read {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid config {}: {message}", path.display())]
	Config { path: PathBuf, message: String },

	#[error("element not found: {selector}")]
	SelectorNotFound { selector: String },

	#[error("selector {selector} matched {count} elements")]
	SelectorAmbiguous { selector: String, count: usize },

	#[error("{0}")]
	InvalidInput(String),

	#[error(transparent)]
	Locator(#[from] pw_locator::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl LocatorCliError {
	/// Convert this error to a CommandError for structured output
	pub fn to_command_error(&self) -> CommandError {
		let (code, message, details) = match self {
			LocatorCliError::Io { path, source } => (
				ErrorCode::IoError,
				format!("Failed to read {}: {source}", path.display()),
				Some(serde_json::json!({ "path": path })),
			),
			LocatorCliError::Config { path, message } => (
				ErrorCode::InvalidInput,
				format!("Invalid config {}: {message}", path.display()),
				Some(serde_json::json!({ "path": path })),
			),
			LocatorCliError::SelectorNotFound { selector } => (
				ErrorCode::SelectorNotFound,
				format!("No elements matched selector: {selector}"),
				Some(serde_json::json!({ "selector": selector })),
			),
			LocatorCliError::SelectorAmbiguous { selector, count } => (
				ErrorCode::SelectorAmbiguous,
				format!(
					"Selector \"{selector}\" matched {count} elements (exactly 1 required). \
					 Use a more specific selector or `>> nth=0` to select the first match."
				),
				Some(serde_json::json!({ "selector": selector, "count": count })),
			),
			LocatorCliError::InvalidInput(msg) => (ErrorCode::InvalidInput, msg.clone(), None),
			LocatorCliError::Locator(err) => (locator_error_code(err), err.to_string(), None),
			LocatorCliError::Json(err) => (ErrorCode::InternalError, format!("JSON error: {err}"), None),
		};

		CommandError {
			code,
			message,
			details,
		}
	}
}

fn locator_error_code(err: &pw_locator::Error) -> ErrorCode {
	use pw_locator::Error;

	match err {
		Error::InvalidSelector(_)
		| Error::UnknownEngine { .. }
		| Error::MalformedSelector(_)
		| Error::Engine(_)
		| Error::Capture => ErrorCode::InvalidSelector,
		Error::NotQueryable | Error::TargetOutsideRoot => ErrorCode::InvalidInput,
		Error::Html(_) => ErrorCode::IoError,
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn grammar_errors_are_invalid_selector() {
		let err = LocatorCliError::from(pw_locator::Error::from(pw_protocol::InvalidSelectorError::new(
			"Unexpected token",
		)));
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::InvalidSelector);
		assert_eq!(cmd.message, "Unexpected token");
	}

	#[test]
	fn unknown_engine_is_invalid_selector() {
		let err = LocatorCliError::Locator(pw_locator::Error::UnknownEngine {
			engine: "xpath".into(),
			selector: "xpath=//a".into(),
		});
		assert_eq!(err.to_command_error().code, ErrorCode::InvalidSelector);
	}

	#[test]
	fn outside_root_is_invalid_input() {
		let err = LocatorCliError::Locator(pw_locator::Error::TargetOutsideRoot);
		assert_eq!(err.to_command_error().code, ErrorCode::InvalidInput);
	}

	#[test]
	fn ambiguity_carries_count() {
		let err = LocatorCliError::SelectorAmbiguous {
			selector: "li".into(),
			count: 3,
		};
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::SelectorAmbiguous);
		assert_eq!(cmd.details, Some(serde_json::json!({ "selector": "li", "count": 3 })));
	}
}
