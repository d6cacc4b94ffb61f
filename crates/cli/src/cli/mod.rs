#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

/// Root CLI for pw.
#[derive(Parser, Debug)]
#[command(name = "pw")]
#[command(about = "Resolve and generate Playwright-style selectors against static HTML")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: toon (default), json, ndjson, or text
	#[arg(short = 'f', long, global = true, value_enum, default_value = "toon")]
	pub format: OutputFormat,

	/// JSON configuration file (test id attribute, icon policy)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Parse a selector and print its parts.
	Parse(ParseArgs),
	/// List the elements a selector matches in an HTML file.
	Query(QueryArgs),
	/// Generate a locator for the element a selector points at.
	Generate(GenerateArgs),
}

impl Commands {
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Parse(_) => "parse",
			Commands::Query(_) => "query",
			Commands::Generate(_) => "generate",
		}
	}
}

#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
	#[arg(value_name = "SELECTOR")]
	pub selector: String,
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
	/// HTML file to load
	#[arg(value_name = "FILE")]
	pub file: PathBuf,

	#[arg(value_name = "SELECTOR")]
	pub selector: String,

	/// Query from the single element this selector matches
	#[arg(long, value_name = "SELECTOR")]
	pub root: Option<String>,

	/// Use the light-DOM variants of text and attribute engines
	#[arg(long)]
	pub light: bool,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
	/// HTML file to load
	#[arg(value_name = "FILE")]
	pub file: PathBuf,

	/// Selector that must match exactly one target element
	#[arg(value_name = "TARGET_SELECTOR")]
	pub target: String,

	/// Also emit text-free and id-free variants
	#[arg(long)]
	pub multiple: bool,

	/// Generate for a text assertion on the nearest suitable ancestor
	#[arg(long)]
	pub text_expect: bool,

	/// Attribute used for test ids (default: data-testid)
	#[arg(long, value_name = "NAME")]
	pub test_id_attribute: Option<String>,

	/// Emit only selectors that avoid internal: engines
	#[arg(long)]
	pub omit_internal: bool,

	/// Generate relative to the single element this selector matches
	#[arg(long, value_name = "SELECTOR")]
	pub root: Option<String>,
}
