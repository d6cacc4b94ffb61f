//! Element text as the text engines see it, and text matchers.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use pw_protocol::RegexLiteral;
use pw_protocol::escape::normalize_white_space;

use crate::aria::{Accessibility, id_refs, input_type};
use crate::dom::{Document, NodeId, NodeKind};
use crate::error::{Error, Result};

/// Text of an element or shadow root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementText {
	/// Concatenated text of the subtree, shadow roots included.
	pub full: String,
	/// `full` with whitespace normalized.
	pub normalized: String,
	/// Runs of direct child text nodes, split at child elements.
	pub immediate: Vec<String>,
}

impl ElementText {
	fn from_value(value: &str) -> Self {
		Self {
			full: value.to_string(),
			normalized: normalize_white_space(value),
			immediate: vec![value.to_string()],
		}
	}
}

/// Per-session memo of [`element_text`].
#[derive(Debug, Default)]
pub struct TextCache {
	entries: RefCell<HashMap<NodeId, Rc<ElementText>>>,
}

impl TextCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn clear(&self) {
		self.entries.borrow_mut().clear();
	}

	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.borrow().is_empty()
	}
}

/// Nodes whose text never participates in text matching: scripts, styles
/// and anything inside `<head>`.
pub fn should_skip_for_text_matching(doc: &Document, node: NodeId) -> bool {
	matches!(doc.tag_name(node), "script" | "noscript" | "style")
		|| doc.head().is_some_and(|head| doc.contains(head, node))
}

/// Text of an element or shadow root, memoized in `cache`.
pub fn element_text(doc: &Document, cache: &TextCache, root: NodeId) -> Rc<ElementText> {
	if let Some(cached) = cache.entries.borrow().get(&root) {
		return Rc::clone(cached);
	}
	let value = Rc::new(compute_element_text(doc, cache, root));
	cache.entries.borrow_mut().insert(root, Rc::clone(&value));
	value
}

fn compute_element_text(doc: &Document, cache: &TextCache, root: NodeId) -> ElementText {
	if should_skip_for_text_matching(doc, root) {
		return ElementText::default();
	}
	if doc.tag_name(root) == "input" && matches!(input_type(doc, root).as_str(), "submit" | "button") {
		return ElementText::from_value(&doc.value(root));
	}

	let mut value = ElementText::default();
	let mut current_immediate = String::new();
	for child in doc.children(root) {
		match doc.kind(*child) {
			NodeKind::Text(text) => {
				value.full.push_str(text);
				current_immediate.push_str(text);
			}
			NodeKind::Comment(_) => {}
			_ => {
				if !current_immediate.is_empty() {
					value.immediate.push(std::mem::take(&mut current_immediate));
				}
				if doc.is_element(*child) {
					value.full.push_str(&element_text(doc, cache, *child).full);
				}
			}
		}
	}
	if !current_immediate.is_empty() {
		value.immediate.push(current_immediate);
	}
	if let Some(shadow) = doc.shadow_root(root) {
		value.full.push_str(&element_text(doc, cache, shadow).full);
	}
	if !value.full.is_empty() {
		value.normalized = normalize_white_space(&value.full);
	}
	value
}

/// Where a text matcher found its match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
	None,
	/// The element matches and none of its children do.
	SelfOnly,
	/// The element matches and so does at least one child.
	SelfAndChildren,
}

pub fn element_matches_text(
	doc: &Document,
	cache: &TextCache,
	element: NodeId,
	matcher: &TextMatcher,
) -> TextMatch {
	if should_skip_for_text_matching(doc, element) {
		return TextMatch::None;
	}
	if !matcher.matches(&element_text(doc, cache, element)) {
		return TextMatch::None;
	}
	for child in doc.element_children(element) {
		if matcher.matches(&element_text(doc, cache, child)) {
			return TextMatch::SelfAndChildren;
		}
	}
	if let Some(shadow) = doc.shadow_root(element) {
		if matcher.matches(&element_text(doc, cache, shadow)) {
			return TextMatch::SelfAndChildren;
		}
	}
	TextMatch::SelfOnly
}

/// Label texts of an element: `aria-labelledby` targets, else a non-blank
/// `aria-label`, else the native labels of a labelable control.
pub fn element_labels(
	doc: &Document,
	aria: &dyn Accessibility,
	cache: &TextCache,
	element: NodeId,
) -> Vec<Rc<ElementText>> {
	if let Some(refs) = doc.attribute(element, "aria-labelledby") {
		return id_refs(doc, element, Some(refs))
			.into_iter()
			.map(|label| element_text(doc, cache, label))
			.collect();
	}
	if let Some(label) = doc.attribute(element, "aria-label") {
		if !label.trim().is_empty() {
			return vec![Rc::new(ElementText::from_value(label))];
		}
	}
	let labelable = match doc.tag_name(element) {
		"button" | "meter" | "output" | "progress" | "select" | "textarea" => true,
		"input" => input_type(doc, element) != "hidden",
		_ => false,
	};
	if !labelable {
		return Vec::new();
	}
	aria.labels(doc, element)
		.into_iter()
		.map(|label| element_text(doc, cache, label))
		.collect()
}

/// How a text selector body compares against element text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatchKind {
	Regex,
	Strict,
	Lax,
}

#[derive(Debug, Clone)]
pub enum TextMatcher {
	/// Tests the full, unnormalized text.
	Regex(RegexLiteral),
	/// Whole normalized text equals the needle.
	Exact(String),
	/// Some run of direct child text equals the needle.
	Immediate(String),
	/// Lower-cased normalized text contains the lower-cased needle.
	Substring(String),
}

impl TextMatcher {
	/// Substring matcher; the needle is normalized and lower-cased here.
	pub fn substring(needle: &str) -> Self {
		TextMatcher::Substring(normalize_white_space(needle).to_lowercase())
	}

	pub fn immediate(needle: &str) -> Self {
		TextMatcher::Immediate(normalize_white_space(needle))
	}

	pub fn matches(&self, text: &ElementText) -> bool {
		match self {
			TextMatcher::Regex(regex) => regex.is_match(&text.full),
			TextMatcher::Exact(needle) => text.normalized == *needle,
			TextMatcher::Immediate(needle) => {
				if needle.is_empty() && text.immediate.is_empty() {
					return true;
				}
				text.immediate
					.iter()
					.any(|run| normalize_white_space(run) == *needle)
			}
			TextMatcher::Substring(needle) => text.normalized.to_lowercase().contains(needle.as_str()),
		}
	}
}

/// Builds the matcher for a `text=` style body.
///
/// `/re/flags` is a regex over the full text. A body in double or single
/// quotes is strict; `internal` bodies are JSON strings and also accept the
/// `"…"i` (lax) and `"…"s` (strict) suffix forms. Anything else is a lax,
/// case-insensitive substring match.
pub fn create_text_matcher(selector: &str, internal: bool) -> Result<(TextMatcher, TextMatchKind)> {
	if selector.starts_with('/') && selector.rfind('/').is_some_and(|i| i > 0) {
		return Ok((TextMatcher::Regex(RegexLiteral::parse(selector)?), TextMatchKind::Regex));
	}
	let unquote = |quoted: &str| -> Result<String> {
		if internal {
			serde_json::from_str::<String>(quoted)
				.map_err(|err| Error::engine(format!("Malformed text selector {quoted}: {err}")))
		} else {
			Ok(css_unquote(quoted))
		}
	};
	let chars: Vec<char> = selector.chars().collect();
	let n = chars.len();
	let suffixed = |suffix: char| internal && n > 2 && chars[0] == '"' && chars[n - 2] == '"' && chars[n - 1] == suffix;

	let (body, strict) = if n > 1 && chars[0] == '"' && chars[n - 1] == '"' {
		(unquote(selector)?, true)
	} else if suffixed('i') {
		(unquote(&selector[..selector.len() - 1])?, false)
	} else if suffixed('s') {
		(unquote(&selector[..selector.len() - 1])?, true)
	} else if n > 1 && chars[0] == '\'' && chars[n - 1] == '\'' {
		(unquote(selector)?, true)
	} else {
		(selector.to_string(), false)
	};
	let body = normalize_white_space(&body);

	if strict {
		if internal {
			return Ok((TextMatcher::Exact(body), TextMatchKind::Strict));
		}
		return Ok((TextMatcher::Immediate(body), TextMatchKind::Strict));
	}
	Ok((TextMatcher::Substring(body.to_lowercase()), TextMatchKind::Lax))
}

/// Strips surrounding quotes and backslash escapes.
fn css_unquote(quoted: &str) -> String {
	let mut chars: Vec<char> = quoted.chars().collect();
	chars.pop();
	let inner = &chars[1.min(chars.len())..];
	let mut out = String::with_capacity(inner.len());
	let mut i = 0;
	while i < inner.len() {
		if inner[i] == '\\' && i + 1 < inner.len() {
			i += 1;
		}
		out.push(inner[i]);
		i += 1;
	}
	out
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::aria::HtmlAccessibility;

	fn by_id(doc: &Document, id: &str) -> NodeId {
		doc.get_element_by_id(doc.root(), id).unwrap()
	}

	#[test]
	fn full_and_immediate_text() {
		let doc = Document::parse_html(
			r#"<div id="d">Hello <b>big</b> world<!-- c --><script>x()</script></div>"#,
		)
		.unwrap();
		let cache = TextCache::new();
		let text = element_text(&doc, &cache, by_id(&doc, "d"));
		assert_eq!(text.full, "Hello big world");
		assert_eq!(text.normalized, "Hello big world");
		assert_eq!(text.immediate, vec!["Hello ".to_string(), " world".to_string()]);
		assert!(!cache.is_empty());
	}

	#[test]
	fn submit_inputs_use_their_value() {
		let doc = Document::parse_html(r#"<input id="s" type="submit" value=" Send  now ">"#).unwrap();
		let cache = TextCache::new();
		let text = element_text(&doc, &cache, by_id(&doc, "s"));
		assert_eq!(text.normalized, "Send now");
		assert_eq!(text.immediate, vec![" Send  now ".to_string()]);
	}

	#[test]
	fn shadow_text_is_included() {
		let doc = Document::parse_html(
			r#"<div id="host"><template shadowrootmode="open"><span>inside</span></template>light</div>"#,
		)
		.unwrap();
		let cache = TextCache::new();
		assert_eq!(element_text(&doc, &cache, by_id(&doc, "host")).full, "lightinside");
	}

	#[test]
	fn matches_self_or_children() {
		let doc = Document::parse_html(r#"<div id="outer">Log <span id="inner">in</span></div>"#).unwrap();
		let cache = TextCache::new();
		let login = TextMatcher::substring("log in");
		let inside = TextMatcher::substring("in");
		assert_eq!(
			element_matches_text(&doc, &cache, by_id(&doc, "outer"), &login),
			TextMatch::SelfOnly
		);
		assert_eq!(
			element_matches_text(&doc, &cache, by_id(&doc, "outer"), &inside),
			TextMatch::SelfAndChildren
		);
		assert_eq!(
			element_matches_text(&doc, &cache, by_id(&doc, "inner"), &login),
			TextMatch::None
		);
	}

	#[test]
	fn text_matcher_kinds() {
		let text = ElementText {
			full: "Hello  World".to_string(),
			normalized: "Hello World".to_string(),
			immediate: vec!["Hello  World".to_string()],
		};
		let check = |selector: &str, internal: bool| {
			let (matcher, kind) = create_text_matcher(selector, internal).unwrap();
			(matcher.matches(&text), kind)
		};
		assert_eq!(check("hello", false), (true, TextMatchKind::Lax));
		assert_eq!(check("\"Hello World\"", false), (true, TextMatchKind::Strict));
		assert_eq!(check("'Hello'", false), (false, TextMatchKind::Strict));
		assert_eq!(check("\"hello world\"i", true), (true, TextMatchKind::Lax));
		assert_eq!(check("\"Hello World\"s", true), (true, TextMatchKind::Strict));
		assert_eq!(check("\"Hello\"", true), (false, TextMatchKind::Strict));
		assert_eq!(check("/h\\w+o/i", false), (true, TextMatchKind::Regex));
	}

	#[test]
	fn nbsp_is_whitespace_for_exact_text() {
		let doc = Document::parse_html("<button id=\"b\">Sign\u{a0}in</button>").unwrap();
		let cache = TextCache::new();
		let (matcher, _) = create_text_matcher("\"Sign in\"", true).unwrap();
		assert!(matcher.matches(&element_text(&doc, &cache, by_id(&doc, "b"))));
	}

	#[test]
	fn labels_in_priority_order() {
		let doc = Document::parse_html(
			r#"<span id="l1">First</span><span id="l2">Second</span>
			<input id="a" aria-labelledby="l1 l2" aria-label="ignored">
			<input id="b" aria-label="Named">
			<label for="c">Native</label><input id="c">
			<div id="d"></div>"#,
		)
		.unwrap();
		let cache = TextCache::new();
		let labels = |id: &str| -> Vec<String> {
			element_labels(&doc, &HtmlAccessibility, &cache, by_id(&doc, id))
				.iter()
				.map(|t| t.normalized.clone())
				.collect()
		};
		assert_eq!(labels("a"), vec!["First".to_string(), "Second".to_string()]);
		assert_eq!(labels("b"), vec!["Named".to_string()]);
		assert_eq!(labels("c"), vec!["Native".to_string()]);
		assert!(labels("d").is_empty());
	}
}
