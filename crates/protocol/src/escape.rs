//! String escaping for the pieces of selector text the generator emits.
//!
//! Each helper produces text that the matching parser in this crate reads
//! back to the original value.


use std::fmt::Write as _;

use crate::regex_literal::RegexLiteral;

/// Whitespace as understood by `\s` and `String.prototype.trim` in browsers.
///
/// Differs from [`char::is_whitespace`]: includes U+FEFF, excludes U+0085.
pub fn is_selector_whitespace(c: char) -> bool {
	matches!(
		c,
		'\t' | '\n'
			| '\u{0B}'
			| '\u{0C}'
			| '\r'
			| ' '
			| '\u{A0}'
			| '\u{1680}'
			| '\u{2000}'..='\u{200A}'
			| '\u{2028}'
			| '\u{2029}'
			| '\u{202F}'
			| '\u{205F}'
			| '\u{3000}'
			| '\u{FEFF}'
	)
}

/// Drops zero-width spaces, trims, and collapses whitespace runs to one space.
pub fn normalize_white_space(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut pending_space = false;
	for c in text.chars().filter(|&c| c != '\u{200B}') {
		if is_selector_whitespace(c) {
			pending_space = !out.is_empty();
			continue;
		}
		if pending_space {
			out.push(' ');
			pending_space = false;
		}
		out.push(c);
	}
	out
}

/// Serializes `s` as a CSS identifier (CSSOM "serialize an identifier").
pub fn css_escape(s: &str) -> String {
	let chars: Vec<char> = s.chars().collect();
	let mut out = String::with_capacity(s.len());
	for (i, &c) in chars.iter().enumerate() {
		let code = c as u32;
		if code == 0 {
			out.push('\u{FFFD}');
		} else if (0x01..=0x1f).contains(&code)
			|| code == 0x7f
			|| (c.is_ascii_digit() && (i == 0 || (i == 1 && chars[0] == '-')))
		{
			let _ = write!(out, "\\{code:x} ");
		} else if i == 0 && c == '-' && chars.len() == 1 {
			out.push('\\');
			out.push(c);
		} else if code >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() {
			out.push(c);
		} else {
			out.push('\\');
			out.push(c);
		}
	}
	out
}

/// Double-quoted CSS attribute value, e.g. `"foo bar"`.
pub fn quote_css_attribute_value(text: &str) -> String {
	format!("\"{}\"", css_escape(text).replace("\\ ", " "))
}

/// Quotes `text` the way `JSON.stringify` does.
pub fn json_quote(text: &str) -> String {
	serde_json::Value::String(text.to_owned()).to_string()
}

/// Body for the text engines: `"text"s` when exact, `"text"i` otherwise.
pub fn escape_for_text_selector(text: &str, exact: bool) -> String {
	format!("{}{}", json_quote(text), if exact { 's' } else { 'i' })
}

/// Attribute value for `internal:attr`/`internal:role` bodies.
pub fn escape_for_attribute_selector(value: &str, exact: bool) -> String {
	let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
	format!("\"{escaped}\"{}", if exact { 's' } else { 'i' })
}

/// Escapes regex metacharacters so `text` matches literally.
pub fn escape_regex(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		if matches!(
			c,
			'.' | '*' | '+' | '?' | '^' | '$' | '{' | '}' | '(' | ')' | '|' | '[' | ']' | '\\'
		) {
			out.push('\\');
		}
		out.push(c);
	}
	out
}

/// Renders a regex literal so it survives the `>>` splitter and quote tracking.
///
/// Quotes preceded by an even number of backslashes get one more, and `>>`
/// becomes `\>\>`. Unicode-mode literals are emitted verbatim.
pub fn escape_regex_for_selector(regex: &RegexLiteral) -> String {
	let literal = regex.to_string();
	if regex.has_flag('u') || regex.has_flag('v') {
		return literal;
	}
	let mut out = String::with_capacity(literal.len() + 4);
	let mut backslashes = 0usize;
	for c in literal.chars() {
		if matches!(c, '"' | '\'' | '`') && backslashes % 2 == 0 {
			out.push('\\');
		}
		if c == '\\' {
			backslashes += 1;
		} else {
			backslashes = 0;
		}
		out.push(c);
	}
	out.replace(">>", "\\>\\>")
}
