//! `/source/flags` literals as they appear inside selector bodies.

use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Serialize, Serializer};

use crate::error::{InvalidSelectorError, Result};

const KNOWN_FLAGS: &str = "dgimsuvy";

/// Characters that keep their backslash when translated; any other escaped
/// non-alphanumeric character is emitted as a plain literal.
const REGEX_META: &str = "\\.+*?()|[]{}^$#&-~";

/// A regex literal with its original source and flags preserved.
///
/// Equality and display use the literal text, so two literals that differ
/// only in spelling are distinct cache keys.
#[derive(Debug, Clone)]
pub struct RegexLiteral {
	source: String,
	flags: String,
	regex: Regex,
}

impl RegexLiteral {
	/// Compiles `source` with `flags`.
	///
	/// Unescaped `/` outside character classes is escaped in the stored
	/// source so that [`Display`](fmt::Display) yields a parseable literal.
	pub fn new(source: &str, flags: &str) -> Result<Self> {
		for (i, flag) in flags.char_indices() {
			if !KNOWN_FLAGS.contains(flag) || flags[..i].contains(flag) {
				return Err(InvalidSelectorError::new(format!(
					"Invalid flags supplied to RegExp constructor '{flags}'"
				)));
			}
		}
		let source = escape_slashes(source);
		let translated = translate(&source);
		let regex = RegexBuilder::new(&translated)
			.case_insensitive(flags.contains('i'))
			.multi_line(flags.contains('m'))
			.dot_matches_new_line(flags.contains('s'))
			.build()
			.map_err(|err| {
				InvalidSelectorError::new(format!(
					"Invalid regular expression: /{source}/{flags}: {err}"
				))
			})?;
		Ok(Self {
			source,
			flags: flags.to_string(),
			regex,
		})
	}

	/// Parses `/source/flags`, splitting at the last slash.
	pub fn parse(literal: &str) -> Result<Self> {
		let last = literal.rfind('/').filter(|&i| i > 0);
		match (literal.starts_with('/'), last) {
			(true, Some(last)) => Self::new(&literal[1..last], &literal[last + 1..]),
			_ => Err(InvalidSelectorError::new(format!(
				"Invalid regular expression literal: {literal}"
			))),
		}
	}

	pub fn source(&self) -> &str {
		&self.source
	}

	pub fn flags(&self) -> &str {
		&self.flags
	}

	pub fn has_flag(&self, flag: char) -> bool {
		self.flags.contains(flag)
	}

	pub fn is_match(&self, text: &str) -> bool {
		self.regex.is_match(text)
	}
}

impl PartialEq for RegexLiteral {
	fn eq(&self, other: &Self) -> bool {
		self.source == other.source && self.flags == other.flags
	}
}

impl fmt::Display for RegexLiteral {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "/{}/{}", self.source, self.flags)
	}
}

impl Serialize for RegexLiteral {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

fn escape_slashes(source: &str) -> String {
	let mut out = String::with_capacity(source.len());
	let mut chars = source.chars();
	let mut in_class = false;
	while let Some(c) = chars.next() {
		match c {
			'\\' => {
				out.push(c);
				if let Some(next) = chars.next() {
					out.push(next);
				}
				continue;
			}
			'[' => in_class = true,
			']' => in_class = false,
			'/' if !in_class => out.push('\\'),
			'\n' => {
				out.push_str("\\n");
				continue;
			}
			'\r' => {
				out.push_str("\\r");
				continue;
			}
			_ => {}
		}
		out.push(c);
	}
	out
}

/// Rewrites browser-only identity escapes (`\/`, `\>`, `\"`, ...) into
/// plain literals the `regex` crate accepts.
fn translate(source: &str) -> String {
	let mut out = String::with_capacity(source.len());
	let mut chars = source.chars();
	while let Some(c) = chars.next() {
		if c != '\\' {
			out.push(c);
			continue;
		}
		match chars.next() {
			Some(next) if !next.is_ascii_alphanumeric() && !REGEX_META.contains(next) => {
				out.push(next)
			}
			Some(next) => {
				out.push('\\');
				out.push(next);
			}
			None => out.push('\\'),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_source_and_flags() {
		let re = RegexLiteral::parse("/hello\\s+world/i").unwrap();
		assert_eq!(re.source(), "hello\\s+world");
		assert_eq!(re.flags(), "i");
		assert!(re.is_match("HELLO   world"));
		assert_eq!(re.to_string(), "/hello\\s+world/i");
	}

	#[test]
	fn identity_escapes_become_literals() {
		let re = RegexLiteral::parse("/a\\/b\\>\\>c/").unwrap();
		assert!(re.is_match("a/b>>c"));
	}

	#[test]
	fn slashes_are_escaped_in_source() {
		let re = RegexLiteral::new("^a/b$", "").unwrap();
		assert_eq!(re.to_string(), "/^a\\/b$/");
		assert!(re.is_match("a/b"));
	}

	#[test]
	fn rejects_bad_flags_and_literals() {
		assert!(RegexLiteral::new("a", "q").is_err());
		assert!(RegexLiteral::new("a", "ii").is_err());
		assert!(RegexLiteral::parse("abc").is_err());
		assert!(RegexLiteral::parse("/").is_err());
	}

	#[test]
	fn unsupported_syntax_is_invalid_selector() {
		let err = RegexLiteral::new("(?=a)", "").unwrap_err();
		assert!(err.message().starts_with("Invalid regular expression"));
	}
}
