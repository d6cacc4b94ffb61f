use clap::Parser;
use pw_cli::cli::Cli;
use pw_cli::commands;
use pw_cli::error::LocatorCliError;
use pw_cli::logging;
use pw_cli::output::{self, OutputFormat, ResultBuilder};

fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	let command = cli.command.name();

	if let Err(err) = commands::dispatch(cli) {
		handle_error(err, command, format);
		std::process::exit(1);
	}
}

fn handle_error(err: LocatorCliError, command: &str, format: OutputFormat) {
	let cmd_error = err.to_command_error();

	// Always print to stderr for humans
	output::print_error_stderr(&cmd_error);

	// Also emit the envelope to stdout with ok=false (for agents)
	if format != OutputFormat::Text {
		let result: output::CommandResult<()> = ResultBuilder::new(command).command_error(cmd_error).build();
		output::print_result(&result, format);
	}
}
