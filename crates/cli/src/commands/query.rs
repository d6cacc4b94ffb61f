use std::path::PathBuf;

use pw_locator::{Document, GenerateOptions, ParsedSelector, PartEngine, Selectors, stringify_selector};
use tracing::debug;

use super::{CommandDef, CommandOutcome, load_document, resolve_root, summarize};
use crate::cli::QueryArgs;
use crate::config::LocatorConfig;
use crate::error::Result;
use crate::output::{CommandInputs, QueryData};

pub struct QueryCommand;

pub struct QueryResolved {
	pub file: PathBuf,
	pub doc: Document,
	pub selector: String,
	pub root: Option<String>,
	pub light: bool,
	pub options: GenerateOptions,
}

impl CommandDef for QueryCommand {
	const NAME: &'static str = "query";

	type Raw = QueryArgs;
	type Resolved = QueryResolved;
	type Data = QueryData;

	fn resolve(raw: Self::Raw, config: &LocatorConfig) -> Result<Self::Resolved> {
		Ok(QueryResolved {
			doc: load_document(&raw.file)?,
			file: raw.file,
			selector: raw.selector,
			root: raw.root,
			light: raw.light,
			options: config.generate_options(),
		})
	}

	fn execute(args: &Self::Resolved) -> Result<CommandOutcome<Self::Data>> {
		let selectors = Selectors::new(&args.doc);
		let root = resolve_root(&selectors, args.root.as_deref())?;

		let mut parsed = selectors.parse_selector(&args.selector)?;
		if args.light {
			parsed = selectors.parse_selector(&light_selector(&parsed))?;
		}
		let elements = selectors.query_all(&parsed, root)?;
		debug!(target = "pw", selector = %args.selector, matches = elements.len(), "query resolved");

		// Locators are generated relative to the query root.
		let options = GenerateOptions {
			root: args.root.is_some().then_some(root),
			..args.options.clone()
		};
		let summaries = elements
			.iter()
			.enumerate()
			.map(|(index, &element)| summarize(&selectors, index, element, Some(&options)))
			.collect();

		Ok(CommandOutcome {
			inputs: CommandInputs {
				file: Some(args.file.clone()),
				selector: Some(args.selector.clone()),
				root: args.root.clone(),
				extra: args.light.then(|| serde_json::json!({ "light": true })),
			},
			data: QueryData {
				selector: stringify_selector(&parsed),
				count: elements.len(),
				elements: summaries,
			},
		})
	}
}

/// Rewrites top-level parts to their `:light` engines where one exists.
///
/// CSS parts become `css:light=`. Nested bodies are left as written.
fn light_selector(parsed: &ParsedSelector) -> String {
	let parts: Vec<String> = parsed
		.parts
		.iter()
		.enumerate()
		.map(|(i, part)| {
			let light = format!("{}:light", part.name);
			let name = if part.name == "css" || PartEngine::from_name(&light).is_some() {
				light
			} else {
				part.name.clone()
			};
			let capture = if parsed.capture == Some(i) { "*" } else { "" };
			format!("{capture}{name}={}", part.source)
		})
		.collect();
	parts.join(" >> ")
}
