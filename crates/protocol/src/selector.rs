//! Top-level selector strings: `engine=body` parts joined by `>>`.


use std::fmt;

use serde::Serialize;

use crate::css::{CssComplexSelectorList, parse_css};
use crate::error::{InvalidSelectorError, Result};

/// Part names whose body is a JSON-quoted nested selector.
pub const NESTED_SELECTOR_NAMES: &[&str] = &[
	"internal:has",
	"internal:has-not",
	"internal:and",
	"internal:or",
	"internal:chain",
	"left-of",
	"right-of",
	"above",
	"below",
	"near",
];

/// Nested names that also accept a trailing maximum distance.
pub const SPATIAL_SELECTOR_NAMES: &[&str] = &["left-of", "right-of", "above", "below", "near"];

/// Pseudo-classes handled by the locator engine rather than native CSS.
pub const CUSTOM_CSS_NAMES: &[&str] = &[
	"not",
	"is",
	"where",
	"has",
	"scope",
	"light",
	"visible",
	"text",
	"text-is",
	"text-matches",
	"has-text",
	"right-of",
	"left-of",
	"above",
	"below",
	"near",
	"nth-match",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedSelector {
	pub parts: Vec<SelectorPart>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub capture: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectorPart {
	pub name: String,
	pub body: PartBody,
	/// Body text as written (after `css:light` wrapping).
	pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum PartBody {
	Text(String),
	Css(CssComplexSelectorList),
	Nested(Box<NestedSelectorBody>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedSelectorBody {
	pub parsed: ParsedSelector,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub distance: Option<f64>,
}

impl SelectorPart {
	pub fn text_body(&self) -> Option<&str> {
		match &self.body {
			PartBody::Text(text) => Some(text),
			_ => None,
		}
	}

	pub fn nested_body(&self) -> Option<&NestedSelectorBody> {
		match &self.body {
			PartBody::Nested(nested) => Some(nested),
			_ => None,
		}
	}
}

impl fmt::Display for ParsedSelector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&stringify_selector(self))
	}
}

/// Parses a selector string into parts, validating every css and nested body.
///
/// Engine names are not checked here; the engine registry does that.
pub fn parse_selector(selector: &str) -> Result<ParsedSelector> {
	let strings = split_selector_string(selector)?;
	let mut parts: Vec<SelectorPart> = Vec::with_capacity(strings.parts.len());
	for (name, body) in strings.parts {
		if name == "css" || name == "css:light" {
			let source = if name == "css:light" {
				format!(":light({body})")
			} else {
				body
			};
			let css = parse_css(&source)?;
			parts.push(SelectorPart {
				name: "css".to_string(),
				body: PartBody::Css(css),
				source,
			});
			continue;
		}
		if NESTED_SELECTOR_NAMES.contains(&name.as_str()) {
			let (inner, distance) = parse_nested_body(&name, &body)?;
			let mut parsed = parse_selector(&inner)?;
			strip_shared_frame_prefix(&mut parsed, &parts);
			parts.push(SelectorPart {
				name,
				body: PartBody::Nested(Box::new(NestedSelectorBody { parsed, distance })),
				source: body,
			});
			continue;
		}
		parts.push(SelectorPart {
			name,
			body: PartBody::Text(body.clone()),
			source: body,
		});
	}
	if let Some(first) = parts.first() {
		if NESTED_SELECTOR_NAMES.contains(&first.name.as_str()) {
			return Err(InvalidSelectorError::new(format!(
				"\"{}\" selector cannot be first",
				first.name
			)));
		}
	}
	Ok(ParsedSelector {
		parts,
		capture: strings.capture,
	})
}

fn parse_nested_body(name: &str, body: &str) -> Result<(String, Option<f64>)> {
	let malformed = || InvalidSelectorError::new(format!("Malformed selector: {name}={body}"));
	let values: Vec<serde_json::Value> =
		serde_json::from_str(&format!("[{body}]")).map_err(|_| malformed())?;
	let (inner, distance) = match values.as_slice() {
		[serde_json::Value::String(inner)] => (inner.clone(), None),
		[serde_json::Value::String(inner), serde_json::Value::Number(distance)]
			if SPATIAL_SELECTOR_NAMES.contains(&name) =>
		{
			(inner.clone(), distance.as_f64())
		}
		_ => return Err(malformed()),
	};
	Ok((inner, distance))
}

/// Drops a leading `... >> internal:control=enter-frame` prefix of a nested
/// selector when the outer selector already starts with the same frame path.
fn strip_shared_frame_prefix(nested: &mut ParsedSelector, outer: &[SelectorPart]) {
	let Some(last_frame) = nested
		.parts
		.iter()
		.rposition(|part| part.name == "internal:control" && part.source == "enter-frame")
	else {
		return;
	};
	let prefix = &nested.parts[..=last_frame];
	if outer.len() <= last_frame {
		return;
	}
	if stringify_parts(prefix, None) == stringify_parts(&outer[..=last_frame], None) {
		nested.parts.drain(..=last_frame);
		nested.capture = nested.capture.and_then(|c| c.checked_sub(last_frame + 1));
	}
}

/// Joins parts with `" >> "`, omitting `css=` unless the part is captured.
pub fn stringify_selector(selector: &ParsedSelector) -> String {
	stringify_parts(&selector.parts, selector.capture)
}

fn stringify_parts(parts: &[SelectorPart], capture: Option<usize>) -> String {
	let mut out = String::new();
	for (i, part) in parts.iter().enumerate() {
		if i > 0 {
			out.push_str(" >> ");
		}
		let captured = capture == Some(i);
		if captured {
			out.push('*');
		}
		if captured || part.name != "css" {
			out.push_str(&part.name);
			out.push('=');
		}
		out.push_str(&part.source);
	}
	out
}

/// Calls `visitor(part, nested)` for every part, descending into nested bodies.
pub fn visit_all_selector_parts<F>(selector: &ParsedSelector, visitor: &mut F)
where
	F: FnMut(&SelectorPart, bool),
{
	fn visit<F: FnMut(&SelectorPart, bool)>(selector: &ParsedSelector, nested: bool, visitor: &mut F) {
		for part in &selector.parts {
			visitor(part, nested);
			if let PartBody::Nested(body) = &part.body {
				visit(&body.parsed, true, visitor);
			}
		}
	}
	visit(selector, false, visitor);
}

struct SelectorStrings {
	parts: Vec<(String, String)>,
	capture: Option<usize>,
}

impl SelectorStrings {
	fn append(&mut self, chunk: &str) -> Result<()> {
		let part = chunk.trim();
		let is_name = |name: &str| {
			!name.is_empty()
				&& name
					.chars()
					.all(|c| c.is_ascii_alphanumeric() || "_-+:*".contains(c))
		};
		let quoted = |q: char| part.len() > 1 && part.starts_with(q) && part.ends_with(q);
		let (mut name, body) = match part.find('=') {
			Some(eq) if is_name(part[..eq].trim()) => {
				(part[..eq].trim().to_string(), part[eq + 1..].to_string())
			}
			_ if quoted('"') || quoted('\'') => ("text".to_string(), part.to_string()),
			_ if part.trim_start_matches('(').starts_with("//") || part.starts_with("..") => {
				("xpath".to_string(), part.to_string())
			}
			_ => ("css".to_string(), part.to_string()),
		};
		let capture = name.starts_with('*');
		if capture {
			name.remove(0);
		}
		self.parts.push((name, body));
		if capture {
			if self.capture.is_some() {
				return Err(InvalidSelectorError::new(
					"Only one of the selectors can capture using * modifier",
				));
			}
			self.capture = Some(self.parts.len() - 1);
		}
		Ok(())
	}
}

fn split_selector_string(selector: &str) -> Result<SelectorStrings> {
	let mut strings = SelectorStrings {
		parts: Vec::new(),
		capture: None,
	};
	if !selector.contains(">>") {
		strings.append(selector)?;
		return Ok(strings);
	}

	let bytes = selector.as_bytes();
	let mut index = 0;
	let mut start = 0;
	let mut quote: Option<u8> = None;
	// `text=foo's` keeps its apostrophe literal.
	let ignore_text_quote = |start: usize, index: usize| {
		let prefix = selector[start..index].trim_start();
		prefix
			.strip_prefix("text")
			.map(str::trim_start)
			.and_then(|rest| rest.strip_prefix('='))
			.is_some_and(|rest| !rest.is_empty() && !rest.contains('\n'))
	};
	while index < bytes.len() {
		let c = bytes[index];
		if c == b'\\' && index + 1 < bytes.len() {
			index += 2;
		} else if Some(c) == quote {
			quote = None;
			index += 1;
		} else if quote.is_none() && matches!(c, b'"' | b'\'' | b'`') && !ignore_text_quote(start, index) {
			quote = Some(c);
			index += 1;
		} else if quote.is_none() && c == b'>' && bytes.get(index + 1) == Some(&b'>') {
			strings.append(&selector[start..index])?;
			index += 2;
			start = index;
		} else {
			index += 1;
		}
	}
	strings.append(&selector[start..])?;
	Ok(strings)
}
