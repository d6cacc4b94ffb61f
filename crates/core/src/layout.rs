//! Geometry and visibility seam.
//!
//! The engine never computes layout. It asks a [`Layout`] for element boxes
//! and visibility; [`StaticLayout`] answers from explicit rectangles and
//! inline `style` attributes so a parsed document is usable without a
//! renderer.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dom::{Document, NodeId};

/// Axis-aligned box in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self {
			x,
			y,
			width,
			height,
		}
	}

	pub fn left(&self) -> f64 {
		self.x
	}

	pub fn top(&self) -> f64 {
		self.y
	}

	pub fn right(&self) -> f64 {
		self.x + self.width
	}

	pub fn bottom(&self) -> f64 {
		self.y + self.height
	}
}

/// Result of [`Layout::compute_box`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElementBox {
	pub visible: bool,
	/// `None` when the element is not rendered or has no known geometry.
	pub rect: Option<Rect>,
	/// Laid out as an inline box.
	pub inline: bool,
}

/// `::before` / `::after` text of an element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneratedContent {
	pub before: String,
	pub after: String,
}

pub trait Layout {
	fn compute_box(&self, doc: &Document, element: NodeId) -> ElementBox;

	fn is_visible(&self, doc: &Document, element: NodeId) -> bool {
		self.compute_box(doc, element).visible
	}

	/// Generated content, when the layout knows about any.
	fn generated_content(&self, _doc: &Document, _element: NodeId) -> Option<GeneratedContent> {
		None
	}
}

/// Tags that never produce a box.
const NON_RENDERED_TAGS: &[&str] = &[
	"head", "script", "style", "template", "noscript", "meta", "link", "title", "base",
];

const INLINE_TAGS: &[&str] = &[
	"a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "data", "dfn", "em", "i", "img", "input",
	"kbd", "label", "mark", "q", "s", "samp", "select", "small", "span", "strong", "sub", "sup",
	"textarea", "time", "u", "var", "button",
];

/// Layout backed by explicit rectangles and inline styles.
///
/// Elements without a registered rectangle take one from inline
/// `left`/`top`/`width`/`height` pixel values when all four are present.
/// An element with no geometry at all is visible unless its styles hide it.
#[derive(Debug, Clone, Default)]
pub struct StaticLayout {
	rects: BTreeMap<NodeId, Rect>,
	generated: BTreeMap<NodeId, GeneratedContent>,
}

impl StaticLayout {
	pub const fn new() -> Self {
		Self {
			rects: BTreeMap::new(),
			generated: BTreeMap::new(),
		}
	}

	pub fn with_rect(mut self, element: NodeId, rect: Rect) -> Self {
		self.rects.insert(element, rect);
		self
	}

	pub fn set_rect(&mut self, element: NodeId, rect: Rect) {
		self.rects.insert(element, rect);
	}

	/// Registers `::before` / `::after` text for an element.
	pub fn set_generated_content(&mut self, element: NodeId, before: &str, after: &str) {
		self.generated.insert(
			element,
			GeneratedContent {
				before: before.to_string(),
				after: after.to_string(),
			},
		);
	}

	fn rect(&self, doc: &Document, element: NodeId) -> Option<Rect> {
		if let Some(rect) = self.rects.get(&element) {
			return Some(*rect);
		}
		let px = |name: &str| inline_style(doc, element, name).as_deref().and_then(parse_px);
		Some(Rect::new(px("left")?, px("top")?, px("width")?, px("height")?))
	}
}

impl Layout for StaticLayout {
	fn compute_box(&self, doc: &Document, element: NodeId) -> ElementBox {
		let inline = match inline_style(doc, element, "display") {
			Some(display) => display == "inline",
			None => INLINE_TAGS.contains(&doc.tag_name(element)),
		};
		if !is_rendered(doc, element) {
			return ElementBox {
				visible: false,
				rect: None,
				inline,
			};
		}
		let rect = self.rect(doc, element);
		let visible = rect.is_none_or(|r| r.width > 0.0 && r.height > 0.0);
		ElementBox {
			visible,
			rect,
			inline,
		}
	}

	fn generated_content(&self, _doc: &Document, element: NodeId) -> Option<GeneratedContent> {
		self.generated.get(&element).cloned()
	}
}

/// Whether styles and markup allow `element` to produce a box at all.
fn is_rendered(doc: &Document, element: NodeId) -> bool {
	if !doc.is_element(element) || !is_style_visibility_visible(doc, element) {
		return false;
	}
	let mut current = Some(element);
	while let Some(node) = current {
		if is_display_none(doc, node) {
			return false;
		}
		current = doc.parent_element_or_shadow_host(node);
	}
	true
}

/// `display: none` from the inline style or the user-agent defaults.
pub(crate) fn is_display_none(doc: &Document, element: NodeId) -> bool {
	if let Some(display) = inline_style(doc, element, "display") {
		return display == "none";
	}
	NON_RENDERED_TAGS.contains(&doc.tag_name(element))
		|| doc.has_attribute(element, "hidden")
		|| (doc.tag_name(element) == "input"
			&& doc
				.attribute(element, "type")
				.is_some_and(|t| t.eq_ignore_ascii_case("hidden")))
}

/// Nearest inline `visibility` declaration wins.
pub(crate) fn is_style_visibility_visible(doc: &Document, element: NodeId) -> bool {
	let mut current = Some(element);
	while let Some(node) = current {
		if let Some(visibility) = inline_style(doc, node, "visibility") {
			return visibility != "hidden" && visibility != "collapse";
		}
		current = doc.parent_element_or_shadow_host(node);
	}
	true
}

/// Value of one property from the inline `style` attribute, lower-cased.
/// The last declaration wins.
pub(crate) fn inline_style(doc: &Document, element: NodeId, property: &str) -> Option<String> {
	let style = doc.attribute(element, "style")?;
	style
		.split(';')
		.filter_map(|decl| decl.split_once(':'))
		.filter(|(name, _)| name.trim().eq_ignore_ascii_case(property))
		.map(|(_, value)| {
			value
				.trim()
				.trim_end_matches("!important")
				.trim()
				.to_ascii_lowercase()
		})
		.last()
}

fn parse_px(value: &str) -> Option<f64> {
	let number = value.strip_suffix("px").unwrap_or(value).trim();
	number.parse().ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn inline_geometry_and_visibility() {
		let doc = Document::parse_html(
			r#"<div id="a" style="left: 10px; top: 20px; width: 30px; height: 40px"></div>
			<div id="b" style="display:none"><span id="c">x</span></div>
			<div style="visibility: hidden"><p id="d" style="visibility: visible">y</p><p id="e">z</p></div>
			<div id="f" style="left:0;top:0;width:0;height:10px"></div>"#,
		)
		.unwrap();
		let by_id = |id: &str| doc.get_element_by_id(doc.root(), id).unwrap();
		let layout = StaticLayout::new();

		let a = layout.compute_box(&doc, by_id("a"));
		assert!(a.visible);
		assert_eq!(a.rect, Some(Rect::new(10.0, 20.0, 30.0, 40.0)));
		assert!(!a.inline);

		assert!(!layout.is_visible(&doc, by_id("b")));
		assert!(!layout.is_visible(&doc, by_id("c")));
		assert!(layout.is_visible(&doc, by_id("d")));
		assert!(!layout.is_visible(&doc, by_id("e")));
		assert!(!layout.is_visible(&doc, by_id("f")));
		assert!(layout.compute_box(&doc, by_id("c")).inline);
	}

	#[test]
	fn explicit_rect_wins() {
		let doc = Document::parse_html(r#"<div id="a" style="left:1px;top:1px;width:1px;height:1px"></div>"#).unwrap();
		let a = doc.get_element_by_id(doc.root(), "a").unwrap();
		let layout = StaticLayout::new().with_rect(a, Rect::new(5.0, 5.0, 50.0, 10.0));
		assert_eq!(layout.compute_box(&doc, a).rect.map(|r| r.right()), Some(55.0));
	}

	#[test]
	fn non_rendered_tags_and_hidden_inputs() {
		let doc = Document::parse_html(
			r#"<head><title>t</title></head><body><input id="h" type="hidden"><p id="p" hidden>x</p></body>"#,
		)
		.unwrap();
		let layout = StaticLayout::new();
		let title = doc
			.descendant_elements(doc.root())
			.find(|e| doc.tag_name(*e) == "title")
			.unwrap();
		assert!(!layout.is_visible(&doc, title));
		assert!(!layout.is_visible(&doc, doc.get_element_by_id(doc.root(), "h").unwrap()));
		assert!(!layout.is_visible(&doc, doc.get_element_by_id(doc.root(), "p").unwrap()));
		assert!(layout.is_visible(&doc, doc.body().unwrap()));
	}
}
