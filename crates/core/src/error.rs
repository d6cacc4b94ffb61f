//! Error types for selector evaluation and locator generation.

use pw_protocol::InvalidSelectorError;
use thiserror::Error;

/// Result type alias for locator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving or generating selectors.
///
/// An empty result is never an error, and neither is a selector that matches
/// more than one element.
#[derive(Debug, Error)]
pub enum Error {
	/// Grammar error from the selector parser.
	#[error(transparent)]
	InvalidSelector(#[from] InvalidSelectorError),

	/// A part names an engine that is not registered.
	#[error("Unknown engine \"{engine}\" while parsing selector {selector}")]
	UnknownEngine { engine: String, selector: String },

	/// Attribute-style body that does not fit its engine.
	#[error("Malformed attribute selector: {0}")]
	MalformedSelector(String),

	/// Engine called with the wrong argument shape.
	#[error("{0}")]
	Engine(String),

	/// `nth=` combined with a `*` capture.
	#[error("Can't query n-th element in a request with the capture.")]
	Capture,

	/// Query root is neither a document, an element nor a shadow root.
	#[error("Node is not queryable.")]
	NotQueryable,

	/// Generation target lies outside the requested root.
	#[error("Target element must belong to the root's subtree")]
	TargetOutsideRoot,

	/// Failed to read HTML input.
	#[error("HTML error: {0}")]
	Html(#[from] std::io::Error),
}

impl Error {
	pub(crate) fn engine(message: impl Into<String>) -> Self {
		Error::Engine(message.into())
	}
}
