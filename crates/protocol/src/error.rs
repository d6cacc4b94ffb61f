use thiserror::Error;

pub type Result<T> = std::result::Result<T, InvalidSelectorError>;

/// A selector string that does not conform to the grammar.
///
/// Raised before any traversal happens. The message always quotes the
/// offending selector text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InvalidSelectorError {
	message: String,
}

impl InvalidSelectorError {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}

	pub fn message(&self) -> &str {
		&self.message
	}
}
