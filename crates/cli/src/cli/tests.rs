use std::path::PathBuf;

use clap::Parser;

use super::*;

#[test]
fn parse_command() {
	let cli = Cli::try_parse_from(["pw", "parse", "text=Hello >> nth=0"]).unwrap();

	match cli.command {
		Commands::Parse(args) => assert_eq!(args.selector, "text=Hello >> nth=0"),
		_ => panic!("Expected Parse command"),
	}
	assert_eq!(cli.format, OutputFormat::Toon);
	assert_eq!(cli.verbose, 0);
}

#[test]
fn parse_query_command() {
	let args = vec!["pw", "query", "page.html", "li", "--root", "#list", "--light"];
	let cli = Cli::try_parse_from(args).unwrap();

	match cli.command {
		Commands::Query(args) => {
			assert_eq!(args.file, PathBuf::from("page.html"));
			assert_eq!(args.selector, "li");
			assert_eq!(args.root.as_deref(), Some("#list"));
			assert!(args.light);
		}
		_ => panic!("Expected Query command"),
	}
}

#[test]
fn parse_generate_command() {
	let args = vec![
		"pw",
		"generate",
		"page.html",
		"button",
		"--multiple",
		"--text-expect",
		"--test-id-attribute",
		"data-qa",
		"--omit-internal",
	];
	let cli = Cli::try_parse_from(args).unwrap();

	match cli.command {
		Commands::Generate(args) => {
			assert_eq!(args.target, "button");
			assert!(args.multiple);
			assert!(args.text_expect);
			assert!(args.omit_internal);
			assert_eq!(args.test_id_attribute.as_deref(), Some("data-qa"));
			assert_eq!(args.root, None);
		}
		_ => panic!("Expected Generate command"),
	}
}

#[test]
fn global_flags_after_subcommand() {
	let args = vec!["pw", "parse", "css=div", "-vv", "-f", "json", "--config", "pw.json"];
	let cli = Cli::try_parse_from(args).unwrap();

	assert_eq!(cli.verbose, 2);
	assert_eq!(cli.format, OutputFormat::Json);
	assert_eq!(cli.config, Some(PathBuf::from("pw.json")));
	assert_eq!(cli.command.name(), "parse");
}

#[test]
fn generate_requires_target() {
	assert!(Cli::try_parse_from(["pw", "generate", "page.html"]).is_err());
}
