use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

fn default_filter(verbosity: u8) -> &'static str {
	// 0 = errors only, locator engine silent
	// 1 (-v) = info for pw, warn for pw_locator
	// 2+ (-vv) = debug for everything
	match verbosity {
		0 => "error,pw_locator=off",
		1 => "info,pw_locator=warn",
		_ => "debug",
	}
}

pub fn init_logging(verbosity: u8) {
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn verbosity_levels() {
		assert_eq!(default_filter(0), "error,pw_locator=off");
		assert_eq!(default_filter(1), "info,pw_locator=warn");
		assert_eq!(default_filter(5), "debug");
	}
}
