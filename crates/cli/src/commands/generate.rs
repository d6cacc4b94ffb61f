use std::path::PathBuf;

use pw_locator::{Document, GenerateOptions, Selectors};
use tracing::debug;

use super::{CommandDef, CommandOutcome, load_document, resolve_root, resolve_single, summarize};
use crate::cli::GenerateArgs;
use crate::config::LocatorConfig;
use crate::error::{LocatorCliError, Result};
use crate::output::{CommandInputs, GenerateData};

pub struct GenerateCommand;

pub struct GenerateResolved {
	pub file: PathBuf,
	pub doc: Document,
	pub target: String,
	pub root: Option<String>,
	/// Config defaults with command-line flags applied; `root` is set at execution.
	pub options: GenerateOptions,
}

impl CommandDef for GenerateCommand {
	const NAME: &'static str = "generate";

	type Raw = GenerateArgs;
	type Resolved = GenerateResolved;
	type Data = GenerateData;

	fn resolve(raw: Self::Raw, config: &LocatorConfig) -> Result<Self::Resolved> {
		let mut options = config.generate_options();
		if let Some(name) = raw.test_id_attribute {
			if name.trim().is_empty() {
				return Err(LocatorCliError::InvalidInput(
					"--test-id-attribute must not be empty".to_string(),
				));
			}
			options.test_id_attribute_name = name;
		}
		options.omit_internal_engines |= raw.omit_internal;
		options.multiple = raw.multiple;
		options.for_text_expect = raw.text_expect;

		Ok(GenerateResolved {
			doc: load_document(&raw.file)?,
			file: raw.file,
			target: raw.target,
			root: raw.root,
			options,
		})
	}

	fn execute(args: &Self::Resolved) -> Result<CommandOutcome<Self::Data>> {
		let selectors = Selectors::new(&args.doc);
		let root = resolve_root(&selectors, args.root.as_deref())?;
		let target = resolve_single(&selectors, &args.target, root)?;

		let options = GenerateOptions {
			root: args.root.is_some().then_some(root),
			..args.options.clone()
		};
		let generated = selectors.generate(target, &options)?;
		debug!(
			target = "pw",
			selector = %generated.selector,
			variants = generated.selectors.len(),
			"generated locator"
		);

		let element = generated.elements.first().copied().unwrap_or(target);
		Ok(CommandOutcome {
			inputs: CommandInputs {
				file: Some(args.file.clone()),
				selector: Some(args.target.clone()),
				root: args.root.clone(),
				extra: Some(serde_json::json!({
					"multiple": options.multiple,
					"textExpect": options.for_text_expect,
					"testIdAttribute": options.test_id_attribute_name,
					"omitInternal": options.omit_internal_engines,
				})),
			},
			data: GenerateData {
				element: summarize(&selectors, 0, element, None),
				match_count: generated.elements.len(),
				selector: generated.selector,
				selectors: generated.selectors,
			},
		})
	}
}
