use pw_locator::{Document, Selectors, stringify_selector};

use super::{CommandDef, CommandOutcome};
use crate::cli::ParseArgs;
use crate::config::LocatorConfig;
use crate::error::Result;
use crate::output::{CommandInputs, ParseData};

pub struct ParseCommand;

impl CommandDef for ParseCommand {
	const NAME: &'static str = "parse";

	type Raw = ParseArgs;
	type Resolved = ParseArgs;
	type Data = ParseData;

	fn resolve(raw: Self::Raw, _config: &LocatorConfig) -> Result<Self::Resolved> {
		Ok(raw)
	}

	fn execute(args: &Self::Resolved) -> Result<CommandOutcome<Self::Data>> {
		// Engine names are checked against the registry, which needs a document.
		let doc = Document::new();
		let parsed = Selectors::new(&doc).parse_selector(&args.selector)?;

		Ok(CommandOutcome {
			inputs: CommandInputs {
				selector: Some(args.selector.clone()),
				..Default::default()
			},
			data: ParseData {
				normalized: stringify_selector(&parsed),
				engines: parsed.parts.iter().map(|part| part.name.clone()).collect(),
				parsed,
			},
		})
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::error::LocatorCliError;

	fn parse(selector: &str) -> Result<ParseData> {
		let args = ParseCommand::resolve(
			ParseArgs {
				selector: selector.to_string(),
			},
			&LocatorConfig::default(),
		)?;
		Ok(ParseCommand::execute(&args)?.data)
	}

	#[test]
	fn normalizes_and_lists_engines() {
		let data = parse("css=div.item   >> text=\"Save\" >> nth=0").unwrap();
		assert_eq!(data.normalized, "div.item >> text=\"Save\" >> nth=0");
		assert_eq!(data.engines, vec!["css", "text", "nth"]);
		assert_eq!(data.parsed.capture, None);
	}

	#[test]
	fn keeps_capture() {
		let data = parse("*css=form >> button").unwrap();
		assert_eq!(data.parsed.capture, Some(0));
		assert_eq!(data.normalized, "*css=form >> button");
	}

	#[test]
	fn unknown_engine_is_rejected() {
		assert!(matches!(
			parse("xpath=//div"),
			Err(LocatorCliError::Locator(pw_locator::Error::UnknownEngine { .. }))
		));
	}

	#[test]
	fn grammar_error_is_rejected() {
		assert!(matches!(
			parse("div >> "),
			Err(LocatorCliError::Locator(pw_locator::Error::InvalidSelector(_)))
		));
	}
}
