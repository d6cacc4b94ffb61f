//! Command plumbing: resolve + execute contract, dispatch and shared helpers.

mod generate;
mod parse;
mod query;

use std::path::Path;

use pw_locator::{Document, GenerateOptions, NodeId, Selectors};
use pw_protocol::escape::normalize_white_space;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::{Cli, Commands};
use crate::config::LocatorConfig;
use crate::error::{LocatorCliError, Result};
use crate::output::{CommandInputs, ElementSummary, OutputFormat, ResultBuilder, print_result};

pub use generate::GenerateCommand;
pub use parse::ParseCommand;
pub use query::QueryCommand;

/// Longest text preview shown for a matched element, in characters.
const TEXT_PREVIEW_CHARS: usize = 80;

/// Standard outcome from a command execution (typed payload).
#[derive(Debug)]
pub struct CommandOutcome<T> {
	pub inputs: CommandInputs,
	pub data: T,
}

/// Canonical command trait. Each command module is
/// `pub struct XxxCommand; impl CommandDef for XxxCommand { ... }`
pub trait CommandDef {
	const NAME: &'static str;

	type Raw;
	type Resolved;
	type Data: Serialize;

	/// Resolve raw args and config into ready-to-execute args (loads files).
	fn resolve(raw: Self::Raw, config: &LocatorConfig) -> Result<Self::Resolved>;

	/// Execute the command. **Must not print**. Wrapper prints.
	fn execute(args: &Self::Resolved) -> Result<CommandOutcome<Self::Data>>;
}

pub fn dispatch(cli: Cli) -> Result<()> {
	let config = match &cli.config {
		Some(path) => LocatorConfig::load(path)?,
		None => LocatorConfig::default(),
	};
	let format = cli.format;

	match cli.command {
		Commands::Parse(args) => run::<ParseCommand>(args, &config, format),
		Commands::Query(args) => run::<QueryCommand>(args, &config, format),
		Commands::Generate(args) => run::<GenerateCommand>(args, &config, format),
	}
}

fn run<C: CommandDef>(raw: C::Raw, config: &LocatorConfig, format: OutputFormat) -> Result<()> {
	let builder = ResultBuilder::new(C::NAME);
	let resolved = C::resolve(raw, config)?;
	let outcome = C::execute(&resolved)?;
	let result = builder.inputs(outcome.inputs).data(outcome.data).build();
	info!(
		target = "pw",
		command = C::NAME,
		duration_ms = result.timings.as_ref().map_or(0, |t| t.duration_ms),
		"command finished"
	);
	print_result(&result, format);
	Ok(())
}

pub(crate) fn load_document(path: &Path) -> Result<Document> {
	let html = std::fs::read_to_string(path).map_err(|source| LocatorCliError::Io {
		path: path.to_path_buf(),
		source,
	})?;
	let doc = Document::parse_html(&html)?;
	info!(target = "pw", path = %path.display(), nodes = doc.len(), "loaded document");
	Ok(doc)
}

/// Resolves `selector` from `scope`, requiring exactly one match.
pub(crate) fn resolve_single(selectors: &Selectors<'_>, selector: &str, scope: NodeId) -> Result<NodeId> {
	let parsed = selectors.parse_selector(selector)?;
	let matches = selectors.query_all(&parsed, scope)?;
	match matches.as_slice() {
		[] => Err(LocatorCliError::SelectorNotFound {
			selector: selector.to_string(),
		}),
		[single] => Ok(*single),
		_ => Err(LocatorCliError::SelectorAmbiguous {
			selector: selector.to_string(),
			count: matches.len(),
		}),
	}
}

/// Resolves `--root`, defaulting to the document.
pub(crate) fn resolve_root(selectors: &Selectors<'_>, root: Option<&str>) -> Result<NodeId> {
	let doc_root = selectors.document().root();
	match root {
		Some(selector) => resolve_single(selectors, selector, doc_root),
		None => Ok(doc_root),
	}
}

/// Summarizes a matched element. `options` requests a locator for it.
pub(crate) fn summarize(
	selectors: &Selectors<'_>,
	index: usize,
	element: NodeId,
	options: Option<&GenerateOptions>,
) -> ElementSummary {
	let doc = selectors.document();
	let id = doc.element_id(element);
	let text = normalize_white_space(&doc.text_content(element));
	let locator = options.and_then(|options| match selectors.generate(element, options) {
		Ok(generated) => Some(generated.selector),
		Err(err) => {
			warn!(target = "pw", index, error = %err, "locator generation failed");
			None
		}
	});

	ElementSummary {
		index,
		tag: doc.tag_name(element).to_string(),
		id: (!id.is_empty()).then(|| id.to_string()),
		text: (!text.is_empty()).then(|| preview(&text)),
		locator,
	}
}

fn preview(text: &str) -> String {
	if text.chars().count() <= TEXT_PREVIEW_CHARS {
		return text.to_string();
	}
	let mut out: String = text.chars().take(TEXT_PREVIEW_CHARS).collect();
	out.push('…');
	out
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn preview_truncates_by_chars() {
		assert_eq!(preview("short"), "short");
		let long = "é".repeat(100);
		let out = preview(&long);
		assert_eq!(out.chars().count(), TEXT_PREVIEW_CHARS + 1);
		assert!(out.ends_with('…'));
	}

	#[test]
	fn resolve_single_requires_one_match() {
		let doc = Document::parse_html("<ul><li>a</li><li>b</li></ul><p id=p>x</p>").unwrap();
		let selectors = Selectors::new(&doc);

		assert!(resolve_single(&selectors, "#p", doc.root()).is_ok());
		assert!(matches!(
			resolve_single(&selectors, "li", doc.root()),
			Err(LocatorCliError::SelectorAmbiguous { count: 2, .. })
		));
		assert!(matches!(
			resolve_single(&selectors, "table", doc.root()),
			Err(LocatorCliError::SelectorNotFound { .. })
		));
		assert!(matches!(
			resolve_single(&selectors, "xpath=//li", doc.root()),
			Err(LocatorCliError::Locator(pw_locator::Error::UnknownEngine { .. }))
		));
	}

	#[test]
	fn summaries_skip_empty_fields() {
		let doc = Document::parse_html("<div id=card>  Hello\n  world </div><span></span>").unwrap();
		let selectors = Selectors::new(&doc);
		let div = resolve_single(&selectors, "#card", doc.root()).unwrap();
		let span = resolve_single(&selectors, "span", doc.root()).unwrap();

		let summary = summarize(&selectors, 0, div, Some(&GenerateOptions::default()));
		assert_eq!(summary.tag, "div");
		assert_eq!(summary.id.as_deref(), Some("card"));
		assert_eq!(summary.text.as_deref(), Some("Hello world"));
		let locator = summary.locator.unwrap();
		assert_eq!(resolve_single(&selectors, &locator, doc.root()).unwrap(), div);

		let summary = summarize(&selectors, 1, span, None);
		assert_eq!(summary.id, None);
		assert_eq!(summary.text, None);
		assert_eq!(summary.locator, None);
	}
}
