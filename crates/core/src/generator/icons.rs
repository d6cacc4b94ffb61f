//! Icon glyph stripping for human-facing text candidates.

use pw_protocol::escape::{is_selector_whitespace, normalize_white_space};

use crate::dom::{Document, NodeId};
use crate::layout::Layout;
use crate::text::{TextCache, element_text};

/// Which descendants count as decorative icons.
///
/// Class names match a prefix exactly or followed by `-` or `_`, so
/// `fa` covers `fa-save` but not `fade`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconPolicy {
	pub class_prefixes: Vec<String>,
	/// Attributes whose presence marks an icon.
	pub attributes: Vec<String>,
	pub tags: Vec<String>,
}

impl Default for IconPolicy {
	fn default() -> Self {
		let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
		Self {
			class_prefixes: owned(&[
				"material-icons",
				"material-symbols",
				"fa",
				"fas",
				"far",
				"fab",
				"bi",
				"glyphicon",
				"icon",
				"mdi",
				"codicon",
			]),
			attributes: owned(&["data-icon", "data-lucide", "data-feather"]),
			tags: owned(&["mat-icon", "ion-icon", "svg"]),
		}
	}
}

impl IconPolicy {
	/// Policy that never strips anything.
	pub fn none() -> Self {
		Self {
			class_prefixes: Vec::new(),
			attributes: Vec::new(),
			tags: Vec::new(),
		}
	}

	pub fn is_icon(&self, doc: &Document, element: NodeId) -> bool {
		let tag = doc.tag_name(element);
		if self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
			return true;
		}
		if self.attributes.iter().any(|a| doc.has_attribute(element, a)) {
			return true;
		}
		doc.class_list(element).any(|class| {
			self.class_prefixes.iter().any(|prefix| {
				class
					.strip_prefix(prefix.as_str())
					.is_some_and(|rest| rest.is_empty() || rest.starts_with(['-', '_']))
			})
		})
	}

	/// Texts to strip from `element`'s own candidates: the text of every icon
	/// below it and any generated `::before`/`::after` content in its subtree.
	pub(crate) fn icon_texts(
		&self,
		doc: &Document,
		layout: &dyn Layout,
		cache: &TextCache,
		element: NodeId,
	) -> Vec<String> {
		let mut texts = Vec::new();
		let mut stack = vec![element];
		while let Some(node) = stack.pop() {
			if node != element && self.is_icon(doc, node) {
				texts.push(element_text(doc, cache, node).normalized.clone());
				continue;
			}
			if let Some(generated) = layout.generated_content(doc, node) {
				texts.push(normalize_white_space(&generated.before));
				texts.push(normalize_white_space(&generated.after));
			}
			if let Some(shadow) = doc.shadow_root(node) {
				stack.extend(doc.element_children(shadow));
			}
			stack.extend(doc.element_children(node));
		}
		texts.retain(|t| !t.is_empty());
		texts
	}
}

/// Removes one whitespace-delimited occurrence of each icon text, then
/// renormalizes.
pub(crate) fn strip_icon_text(text: &str, icons: &[String]) -> String {
	if icons.is_empty() {
		return text.to_string();
	}
	let mut out = text.to_string();
	for icon in icons {
		if let Some(at) = find_delimited(&out, icon) {
			out.replace_range(at..at + icon.len(), " ");
		}
	}
	normalize_white_space(&out)
}

fn find_delimited(haystack: &str, needle: &str) -> Option<usize> {
	let bounded_before = |at: usize| {
		haystack[..at]
			.chars()
			.next_back()
			.is_none_or(is_selector_whitespace)
	};
	let bounded_after = |end: usize| haystack[end..].chars().next().is_none_or(is_selector_whitespace);
	haystack
		.match_indices(needle)
		.map(|(at, _)| at)
		.find(|&at| bounded_before(at) && bounded_after(at + needle.len()))
}
