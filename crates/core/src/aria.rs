//! Accessibility seam: roles, accessible names, labels and ARIA states.
//!
//! [`HtmlAccessibility`] follows the HTML-AAM role mappings and the
//! accessible-name computation closely enough for locator generation against
//! a static document. Anything fancier plugs in through [`Accessibility`].

use std::collections::HashSet;

use pw_protocol::escape::normalize_white_space;

use crate::dom::{Document, NodeId};
use crate::layout::{self, Layout};

pub const ARIA_SELECTED_ROLES: &[&str] = &[
	"gridcell", "option", "row", "tab", "rowheader", "columnheader", "treeitem",
];

pub const ARIA_CHECKED_ROLES: &[&str] = &[
	"checkbox", "menuitemcheckbox", "option", "radio", "switch", "menuitemradio", "treeitem",
];

pub const ARIA_PRESSED_ROLES: &[&str] = &["button"];

pub const ARIA_EXPANDED_ROLES: &[&str] = &[
	"application", "button", "checkbox", "combobox", "gridcell", "link", "listbox", "menuitem",
	"row", "rowheader", "tab", "treeitem", "columnheader", "menuitemcheckbox", "menuitemradio",
	"switch",
];

pub const ARIA_LEVEL_ROLES: &[&str] = &["heading", "listitem", "row", "treeitem"];

pub const ARIA_DISABLED_ROLES: &[&str] = &[
	"application", "button", "composite", "gridcell", "group", "input", "link", "menuitem",
	"scrollbar", "separator", "tab", "checkbox", "columnheader", "combobox", "grid", "listbox",
	"menu", "menubar", "menuitemcheckbox", "menuitemradio", "option", "radio", "radiogroup", "row",
	"rowheader", "searchbox", "select", "slider", "spinbutton", "switch", "tablist", "textbox",
	"toolbar", "tree", "treegrid", "treeitem",
];

const ALL_ROLES: &[&str] = &[
	"alert", "alertdialog", "application", "article", "banner", "blockquote", "button", "caption",
	"cell", "checkbox", "code", "columnheader", "combobox", "command", "complementary", "composite",
	"contentinfo", "definition", "deletion", "dialog", "directory", "document", "emphasis", "feed",
	"figure", "form", "generic", "grid", "gridcell", "group", "heading", "img", "input", "insertion",
	"landmark", "link", "list", "listbox", "listitem", "log", "main", "marquee", "math", "meter",
	"menu", "menubar", "menuitem", "menuitemcheckbox", "menuitemradio", "navigation", "none", "note",
	"option", "paragraph", "presentation", "progressbar", "radio", "radiogroup", "range", "region",
	"roletype", "row", "rowgroup", "rowheader", "scrollbar", "search", "searchbox", "section",
	"sectionhead", "select", "separator", "slider", "spinbutton", "status", "strong", "structure",
	"subscript", "superscript", "switch", "tab", "table", "tablist", "tabpanel", "term", "textbox",
	"time", "timer", "toolbar", "tooltip", "tree", "treegrid", "treeitem", "widget", "window",
];

const ABSTRACT_ROLES: &[&str] = &[
	"command", "composite", "input", "landmark", "range", "roletype", "section", "sectionhead",
	"select", "structure", "widget", "window",
];

/// `aria-checked` / `aria-pressed` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AriaState {
	False,
	True,
	Mixed,
}

impl From<bool> for AriaState {
	fn from(value: bool) -> Self {
		if value { AriaState::True } else { AriaState::False }
	}
}

/// Accessibility queries the engine needs.
pub trait Accessibility {
	/// Computed role, explicit or implicit.
	fn role(&self, doc: &Document, element: NodeId) -> Option<String>;

	fn accessible_name(
		&self,
		doc: &Document,
		layout: &dyn Layout,
		element: NodeId,
		include_hidden: bool,
	) -> String;

	/// Native `<label>` elements associated with a form control.
	fn labels(&self, doc: &Document, element: NodeId) -> Vec<NodeId>;

	/// Excluded from the accessibility tree.
	fn is_hidden(&self, doc: &Document, element: NodeId) -> bool;

	fn checked(&self, doc: &Document, element: NodeId) -> AriaState;

	fn pressed(&self, doc: &Document, element: NodeId) -> AriaState;

	fn selected(&self, doc: &Document, element: NodeId) -> bool;

	/// `None` when the element does not expose an expanded state.
	fn expanded(&self, doc: &Document, element: NodeId) -> Option<bool>;

	/// Heading or `aria-level` level, 0 when not applicable.
	fn level(&self, doc: &Document, element: NodeId) -> u32;

	fn disabled(&self, doc: &Document, element: NodeId) -> bool;
}

/// Default accessibility provider for HTML documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlAccessibility;

impl Accessibility for HtmlAccessibility {
	fn role(&self, doc: &Document, element: NodeId) -> Option<String> {
		aria_role(doc, element).map(str::to_string)
	}

	fn accessible_name(
		&self,
		doc: &Document,
		layout: &dyn Layout,
		element: NodeId,
		include_hidden: bool,
	) -> String {
		let role = aria_role(doc, element).unwrap_or("");
		if NAME_PROHIBITED_ROLES.contains(&role) {
			return String::new();
		}
		let mut computation = NameComputation {
			doc,
			layout,
			visited: HashSet::new(),
		};
		let options = NameOptions {
			include_hidden,
			..NameOptions::default()
		};
		as_flat_string(&computation.text_alternative(element, options))
	}

	fn labels(&self, doc: &Document, element: NodeId) -> Vec<NodeId> {
		native_labels(doc, element)
	}

	fn is_hidden(&self, doc: &Document, element: NodeId) -> bool {
		is_element_hidden_for_aria(doc, element)
	}

	fn checked(&self, doc: &Document, element: NodeId) -> AriaState {
		if doc.tag_name(element) == "input" {
			let kind = input_type(doc, element);
			if kind == "checkbox" || kind == "radio" {
				return doc.is_checked(element).into();
			}
		}
		if has_role(doc, element, ARIA_CHECKED_ROLES) {
			return match doc.attribute(element, "aria-checked") {
				Some("true") => AriaState::True,
				Some("mixed") => AriaState::Mixed,
				_ => AriaState::False,
			};
		}
		AriaState::False
	}

	fn pressed(&self, doc: &Document, element: NodeId) -> AriaState {
		if has_role(doc, element, ARIA_PRESSED_ROLES) {
			match doc.attribute(element, "aria-pressed") {
				Some("true") => return AriaState::True,
				Some("mixed") => return AriaState::Mixed,
				_ => {}
			}
		}
		AriaState::False
	}

	fn selected(&self, doc: &Document, element: NodeId) -> bool {
		if doc.tag_name(element) == "option" {
			return doc.has_attribute(element, "selected");
		}
		has_role(doc, element, ARIA_SELECTED_ROLES) && aria_boolean(doc, element, "aria-selected") == Some(true)
	}

	fn expanded(&self, doc: &Document, element: NodeId) -> Option<bool> {
		if doc.tag_name(element) == "details" {
			return Some(doc.has_attribute(element, "open"));
		}
		if has_role(doc, element, ARIA_EXPANDED_ROLES) {
			return doc.attribute(element, "aria-expanded").map(|v| v == "true");
		}
		None
	}

	fn level(&self, doc: &Document, element: NodeId) -> u32 {
		if let Some(level) = doc
			.tag_name(element)
			.strip_prefix('h')
			.and_then(|n| n.parse::<u32>().ok())
			.filter(|n| (1..=6).contains(n))
		{
			return level;
		}
		if has_role(doc, element, ARIA_LEVEL_ROLES) {
			if let Some(level) = doc
				.attribute(element, "aria-level")
				.and_then(|v| v.trim().parse::<u32>().ok())
				.filter(|n| *n >= 1)
			{
				return level;
			}
		}
		0
	}

	fn disabled(&self, doc: &Document, element: NodeId) -> bool {
		is_natively_disabled(doc, element) || has_explicit_aria_disabled(doc, Some(element))
	}
}

fn has_role(doc: &Document, element: NodeId, roles: &[&str]) -> bool {
	aria_role(doc, element).is_some_and(|role| roles.contains(&role))
}

fn aria_boolean(doc: &Document, element: NodeId, name: &str) -> Option<bool> {
	doc.attribute(element, name)
		.map(|v| v.eq_ignore_ascii_case("true"))
}

// Roles.

const ANCESTOR_PREVENTING_LANDMARK_TAGS: &[&str] = &["article", "aside", "main", "nav", "section"];
const ANCESTOR_PREVENTING_LANDMARK_ROLES: &[&str] =
	&["article", "complementary", "main", "navigation", "region"];

const NAMING_GLOBAL_PROHIBITED: &[&str] = &[
	"caption", "code", "deletion", "emphasis", "generic", "insertion", "paragraph", "presentation",
	"strong", "subscript", "superscript",
];

const GLOBAL_ARIA_ATTRIBUTES: &[&str] = &[
	"aria-atomic", "aria-busy", "aria-controls", "aria-current", "aria-describedby", "aria-details",
	"aria-dropeffect", "aria-flowto", "aria-grabbed", "aria-hidden", "aria-keyshortcuts",
	"aria-label", "aria-labelledby", "aria-live", "aria-owns", "aria-relevant",
	"aria-roledescription",
];

fn has_global_aria_attribute(doc: &Document, element: NodeId, for_role: Option<&str>) -> bool {
	let role = for_role.unwrap_or("");
	GLOBAL_ARIA_ATTRIBUTES.iter().any(|attr| {
		let prohibited = match *attr {
			"aria-label" | "aria-labelledby" => NAMING_GLOBAL_PROHIBITED.contains(&role),
			"aria-roledescription" => role == "generic",
			_ => false,
		};
		!prohibited && doc.has_attribute(element, attr)
	})
}

fn has_tab_index(doc: &Document, element: NodeId) -> bool {
	doc.attribute(element, "tabindex").is_some_and(|v| {
		let v = v.trim();
		v.is_empty() || v.parse::<f64>().is_ok_and(|n| !n.is_nan())
	})
}

fn is_focusable(doc: &Document, element: NodeId) -> bool {
	!is_natively_disabled(doc, element) && (is_natively_focusable(doc, element) || has_tab_index(doc, element))
}

fn is_natively_focusable(doc: &Document, element: NodeId) -> bool {
	match doc.tag_name(element) {
		"button" | "details" | "select" | "textarea" => true,
		"a" | "area" => doc.has_attribute(element, "href"),
		"input" => !doc.has_attribute(element, "hidden"),
		_ => false,
	}
}

fn has_explicit_accessible_name(doc: &Document, element: NodeId) -> bool {
	doc.has_attribute(element, "aria-label") || doc.has_attribute(element, "aria-labelledby")
}

const INPUT_TYPES: &[&str] = &[
	"button", "checkbox", "color", "date", "datetime-local", "email", "file", "hidden", "image",
	"month", "number", "password", "radio", "range", "reset", "search", "submit", "tel", "text",
	"time", "url", "week",
];

/// Normalized `type` of an input, `text` for missing or unknown values.
pub(crate) fn input_type(doc: &Document, element: NodeId) -> String {
	let kind = doc.attribute(element, "type").unwrap_or("").to_ascii_lowercase();
	if INPUT_TYPES.contains(&kind.as_str()) {
		kind
	} else {
		"text".to_string()
	}
}

fn table_role(doc: &Document, element: NodeId) -> &'static str {
	let grid = doc
		.closest_cross_shadow(element, None, |e| doc.tag_name(e) == "table")
		.and_then(|table| explicit_role(doc, table))
		.is_some_and(|role| role == "grid" || role == "treegrid");
	if grid { "gridcell" } else { "cell" }
}

fn implicit_role_by_tag(doc: &Document, element: NodeId) -> Option<&'static str> {
	let role = match doc.tag_name(element) {
		"a" | "area" => return doc.has_attribute(element, "href").then_some("link"),
		"article" => "article",
		"aside" => "complementary",
		"blockquote" => "blockquote",
		"button" => "button",
		"caption" => "caption",
		"code" => "code",
		"datalist" => "listbox",
		"dd" => "definition",
		"del" => "deletion",
		"details" => "group",
		"dfn" => "term",
		"dialog" => "dialog",
		"dt" => "term",
		"em" => "emphasis",
		"fieldset" => "group",
		"figure" => "figure",
		"footer" | "header" => {
			let prevented = doc
				.closest_cross_shadow(element, None, |e| {
					let role = doc.attribute(e, "role");
					(role.is_none() && ANCESTOR_PREVENTING_LANDMARK_TAGS.contains(&doc.tag_name(e)))
						|| role.is_some_and(|r| ANCESTOR_PREVENTING_LANDMARK_ROLES.contains(&r))
				})
				.is_some();
			if prevented {
				return None;
			}
			if doc.tag_name(element) == "footer" { "contentinfo" } else { "banner" }
		}
		"form" => return has_explicit_accessible_name(doc, element).then_some("form"),
		"h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
		"hr" => "separator",
		"html" => "document",
		"img" => {
			let presentation = doc.attribute(element, "alt") == Some("")
				&& doc.attribute(element, "title").is_none_or(str::is_empty)
				&& !has_global_aria_attribute(doc, element, None)
				&& !has_tab_index(doc, element);
			if presentation { "presentation" } else { "img" }
		}
		"input" => return implicit_input_role(doc, element),
		"ins" => "insertion",
		"li" => "listitem",
		"main" => "main",
		"mark" => "mark",
		"math" => "math",
		"menu" => "list",
		"meter" => "meter",
		"nav" => "navigation",
		"ol" | "ul" => "list",
		"optgroup" => "group",
		"option" => "option",
		"output" => "status",
		"p" => "paragraph",
		"progress" => "progressbar",
		"section" => return has_explicit_accessible_name(doc, element).then_some("region"),
		"select" => {
			let size = doc
				.attribute(element, "size")
				.and_then(|s| s.trim().parse::<i64>().ok())
				.unwrap_or(0);
			if doc.has_attribute(element, "multiple") || size > 1 { "listbox" } else { "combobox" }
		}
		"strong" => "strong",
		"sub" => "subscript",
		"sup" => "superscript",
		"svg" => "img",
		"table" => "table",
		"tbody" | "thead" | "tfoot" => "rowgroup",
		"td" => table_role(doc, element),
		"th" => match doc.attribute(element, "scope") {
			Some("col") => "columnheader",
			Some("row") => "rowheader",
			_ => table_role(doc, element),
		},
		"textarea" => "textbox",
		"time" => "time",
		"tr" => "row",
		_ => return None,
	};
	Some(role)
}

fn implicit_input_role(doc: &Document, element: NodeId) -> Option<&'static str> {
	let kind = input_type(doc, element);
	let has_datalist = || {
		id_refs(doc, element, doc.attribute(element, "list"))
			.first()
			.is_some_and(|list| doc.tag_name(*list) == "datalist")
	};
	Some(match kind.as_str() {
		"search" if doc.has_attribute(element, "list") => "combobox",
		"search" => "searchbox",
		"email" | "tel" | "text" | "url" if has_datalist() => "combobox",
		"email" | "tel" | "text" | "url" => "textbox",
		"hidden" => return None,
		"button" | "image" | "reset" | "submit" => "button",
		"checkbox" => "checkbox",
		"number" => "spinbutton",
		"radio" => "radio",
		"range" => "slider",
		_ => "textbox",
	})
}

fn presentation_inheritance_parents(tag: &str) -> &'static [&'static str] {
	match tag {
		"dd" | "dt" => &["dl", "div"],
		"div" => &["dl"],
		"li" => &["ol", "ul"],
		"tbody" | "tfoot" | "thead" => &["table"],
		"td" | "th" => &["tr"],
		"tr" => &["thead", "tbody", "tfoot", "table"],
		_ => &[],
	}
}

fn implicit_role(doc: &Document, element: NodeId) -> Option<&'static str> {
	let role = implicit_role_by_tag(doc, element)?;
	let mut ancestor = element;
	loop {
		let parents = presentation_inheritance_parents(doc.tag_name(ancestor));
		let Some(parent) = doc.parent_element_or_shadow_host(ancestor) else {
			break;
		};
		if !parents.contains(&doc.tag_name(parent)) {
			break;
		}
		if let Some(parent_role @ ("none" | "presentation")) = explicit_role(doc, parent) {
			if !has_presentation_conflict_resolution(doc, parent, Some(parent_role)) {
				return Some(parent_role);
			}
		}
		ancestor = parent;
	}
	Some(role)
}

fn explicit_role(doc: &Document, element: NodeId) -> Option<&'static str> {
	let roles = doc.attribute(element, "role")?;
	roles.split(' ').map(str::trim).find_map(|role| {
		ALL_ROLES
			.iter()
			.find(|r| **r == role && !ABSTRACT_ROLES.contains(r))
			.copied()
	})
}

fn has_presentation_conflict_resolution(doc: &Document, element: NodeId, role: Option<&str>) -> bool {
	has_global_aria_attribute(doc, element, role) || is_focusable(doc, element)
}

/// Computed ARIA role of an element.
pub fn aria_role(doc: &Document, element: NodeId) -> Option<&'static str> {
	if !doc.is_element(element) {
		return None;
	}
	let Some(explicit) = explicit_role(doc, element) else {
		return implicit_role(doc, element);
	};
	if explicit == "none" || explicit == "presentation" {
		let implicit = implicit_role(doc, element);
		if has_presentation_conflict_resolution(doc, element, implicit) {
			return implicit;
		}
	}
	Some(explicit)
}

// Hidden state.

fn is_element_ignored_for_aria(doc: &Document, element: NodeId) -> bool {
	matches!(doc.tag_name(element), "style" | "script" | "noscript" | "template")
}

pub(crate) fn is_element_hidden_for_aria(doc: &Document, element: NodeId) -> bool {
	if is_element_ignored_for_aria(doc, element) {
		return true;
	}
	let tag = doc.tag_name(element);
	let option_inside_select = tag == "option"
		&& doc
			.closest_cross_shadow(element, None, |e| doc.tag_name(e) == "select")
			.is_some();
	if !option_inside_select && tag != "slot" && !layout::is_style_visibility_visible(doc, element) {
		return true;
	}
	let mut current = Some(element);
	while let Some(node) = current {
		let unslotted = doc
			.parent_element(node)
			.is_some_and(|p| doc.shadow_root(p).is_some())
			&& assigned_slot(doc, node).is_none();
		if unslotted
			|| layout::is_display_none(doc, node)
			|| aria_boolean(doc, node, "aria-hidden") == Some(true)
		{
			return true;
		}
		current = doc.parent_element_or_shadow_host(node);
	}
	false
}

/// Slot a light child of a shadow host is rendered into.
pub(crate) fn assigned_slot(doc: &Document, node: NodeId) -> Option<NodeId> {
	let host = doc.parent_element(node)?;
	let shadow = doc.shadow_root(host)?;
	let name = if doc.is_element(node) {
		doc.attribute(node, "slot").unwrap_or("")
	} else {
		""
	};
	doc.descendant_elements(shadow)
		.find(|e| doc.tag_name(*e) == "slot" && doc.attribute(*e, "name").unwrap_or("") == name)
}

fn assigned_nodes(doc: &Document, slot: NodeId) -> Vec<NodeId> {
	let Some(host) = doc.host(doc.root_node(slot)) else {
		return Vec::new();
	};
	doc.children(host)
		.iter()
		.copied()
		.filter(|child| assigned_slot(doc, *child) == Some(slot))
		.collect()
}

// Disabled state.

fn is_natively_disabled(doc: &Document, element: NodeId) -> bool {
	let native = matches!(
		doc.tag_name(element),
		"button" | "input" | "select" | "textarea" | "option" | "optgroup"
	);
	native && (doc.has_attribute(element, "disabled") || belongs_to_disabled_fieldset(doc, element))
}

fn belongs_to_disabled_fieldset(doc: &Document, element: NodeId) -> bool {
	let mut current = Some(element);
	while let Some(node) = current {
		if doc.tag_name(node) == "fieldset" && doc.has_attribute(node, "disabled") {
			return true;
		}
		current = doc.parent_element(node);
	}
	false
}

fn has_explicit_aria_disabled(doc: &Document, element: Option<NodeId>) -> bool {
	let mut current = element;
	while let Some(node) = current {
		if has_role(doc, node, ARIA_DISABLED_ROLES) {
			match doc
				.attribute(node, "aria-disabled")
				.map(str::to_ascii_lowercase)
				.as_deref()
			{
				Some("true") => return true,
				Some("false") => return false,
				_ => {}
			}
		}
		current = doc.parent_element_or_shadow_host(node);
	}
	false
}

// Labels and id references.

/// Elements referenced by a space-separated id list, searched in the
/// element's own tree (document or shadow root). First element per id.
pub fn id_refs(doc: &Document, element: NodeId, refs: Option<&str>) -> Vec<NodeId> {
	let Some(refs) = refs else {
		return Vec::new();
	};
	let root = doc.root_node(element);
	if !doc.is_document(root) && !doc.is_shadow_root(root) {
		return Vec::new();
	}
	let mut result: Vec<NodeId> = Vec::new();
	for id in refs.split(' ').filter(|id| !id.is_empty()) {
		if let Some(found) = doc.get_element_by_id(root, id) {
			if !result.contains(&found) {
				result.push(found);
			}
		}
	}
	result
}

fn is_labelable(doc: &Document, element: NodeId) -> bool {
	match doc.tag_name(element) {
		"button" | "meter" | "output" | "progress" | "select" | "textarea" => true,
		"input" => input_type(doc, element) != "hidden",
		_ => false,
	}
}

/// DOM `label.control`.
fn label_control(doc: &Document, label: NodeId) -> Option<NodeId> {
	match doc.attribute(label, "for") {
		Some(id) => doc
			.get_element_by_id(doc.root_node(label), id)
			.filter(|e| is_labelable(doc, *e)),
		None => doc.descendant_elements(label).find(|e| is_labelable(doc, *e)),
	}
}

/// DOM `element.labels`, in tree order.
pub(crate) fn native_labels(doc: &Document, element: NodeId) -> Vec<NodeId> {
	if !is_labelable(doc, element) {
		return Vec::new();
	}
	doc.descendant_elements(doc.root_node(element))
		.filter(|label| doc.tag_name(*label) == "label" && label_control(doc, *label) == Some(element))
		.collect()
}

// Accessible name.

const NAME_PROHIBITED_ROLES: &[&str] = &[
	"caption", "code", "definition", "deletion", "emphasis", "generic", "insertion", "mark",
	"paragraph", "presentation", "strong", "subscript", "suggestion", "superscript", "term", "time",
];

const NAME_FROM_CONTENT_ROLES: &[&str] = &[
	"button", "cell", "checkbox", "columnheader", "gridcell", "heading", "link", "menuitem",
	"menuitemcheckbox", "menuitemradio", "option", "radio", "row", "rowheader", "switch", "tab",
	"tooltip", "treeitem",
];

const DESCENDANT_NAME_FROM_CONTENT_ROLES: &[&str] = &[
	"", "caption", "code", "contentinfo", "definition", "deletion", "emphasis", "insertion", "list",
	"listitem", "mark", "none", "paragraph", "presentation", "region", "row", "rowgroup", "section",
	"strong", "subscript", "superscript", "table", "term", "time",
];

fn allows_name_from_content(role: &str, target_descendant: bool) -> bool {
	NAME_FROM_CONTENT_ROLES.contains(&role)
		|| (target_descendant && DESCENDANT_NAME_FROM_CONTENT_ROLES.contains(&role))
}

/// Collapses whitespace runs but keeps non-breaking spaces.
fn as_flat_string(s: &str) -> String {
	s.split('\u{a0}')
		.map(|chunk| {
			let mut out = String::with_capacity(chunk.len());
			let mut in_space = false;
			for c in chunk.chars() {
				if c.is_whitespace() {
					if !in_space {
						out.push(' ');
					}
					in_space = true;
				} else {
					out.push(c);
					in_space = false;
				}
			}
			out
		})
		.collect::<Vec<_>>()
		.join("\u{a0}")
		.trim()
		.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum EmbeddedInTarget {
	None,
	#[default]
	SelfTarget,
	Descendant,
}

/// Traversal context; each `Some(hidden)` records whether the element that
/// started that kind of traversal was hidden.
#[derive(Debug, Clone, Copy, Default)]
struct NameOptions {
	include_hidden: bool,
	embedded_in_labelled_by: Option<bool>,
	embedded_in_label: Option<bool>,
	embedded_in_native_text_alternative: Option<bool>,
	embedded_in_target: EmbeddedInTarget,
}

struct NameComputation<'a> {
	doc: &'a Document,
	layout: &'a dyn Layout,
	visited: HashSet<NodeId>,
}

impl NameComputation<'_> {
	fn text_alternative(&mut self, element: NodeId, options: NameOptions) -> String {
		let doc = self.doc;
		if self.visited.contains(&element) {
			return String::new();
		}
		let child_options = NameOptions {
			embedded_in_target: match options.embedded_in_target {
				EmbeddedInTarget::SelfTarget => EmbeddedInTarget::Descendant,
				other => other,
			},
			..options
		};

		// Hidden, unless reached through a hidden reference.
		if !options.include_hidden {
			let in_hidden_traversal = options.embedded_in_labelled_by == Some(true)
				|| options.embedded_in_native_text_alternative == Some(true)
				|| options.embedded_in_label == Some(true);
			if is_element_ignored_for_aria(doc, element)
				|| (!in_hidden_traversal && is_element_hidden_for_aria(doc, element))
			{
				self.visited.insert(element);
				return String::new();
			}
		}

		let labelled_by = doc
			.attribute(element, "aria-labelledby")
			.map(|refs| id_refs(doc, element, Some(refs)));

		if options.embedded_in_labelled_by.is_none() {
			let name = labelled_by
				.iter()
				.flatten()
				.map(|label| {
					self.text_alternative(
						*label,
						NameOptions {
							embedded_in_labelled_by: Some(is_element_hidden_for_aria(doc, *label)),
							embedded_in_target: EmbeddedInTarget::None,
							embedded_in_label: None,
							embedded_in_native_text_alternative: None,
							..options
						},
					)
				})
				.collect::<Vec<_>>()
				.join(" ");
			if !name.is_empty() {
				return name;
			}
		}

		let role = aria_role(doc, element).unwrap_or("");
		let tag = doc.tag_name(element);

		// Embedded controls contribute their value.
		if options.embedded_in_label.is_some()
			|| options.embedded_in_labelled_by.is_some()
			|| options.embedded_in_target == EmbeddedInTarget::Descendant
		{
			let own_label = native_labels(doc, element).contains(&element);
			let own_labelled_by = labelled_by.as_ref().is_some_and(|l| l.contains(&element));
			if !own_label && !own_labelled_by {
				if role == "textbox" {
					self.visited.insert(element);
					if tag == "input" || tag == "textarea" {
						return doc.value(element);
					}
					return doc.text_content(element);
				}
				if role == "combobox" || role == "listbox" {
					self.visited.insert(element);
					let selected: Vec<NodeId> = if tag == "select" {
						let choices: Vec<NodeId> = doc
							.descendant_elements(element)
							.filter(|o| doc.tag_name(*o) == "option")
							.collect();
						let mut selected: Vec<NodeId> = choices
							.iter()
							.copied()
							.filter(|o| doc.has_attribute(*o, "selected"))
							.collect();
						if selected.is_empty() {
							selected.extend(choices.first().copied());
						}
						selected
					} else {
						let listbox = if role == "combobox" {
							doc.descendant_elements(element)
								.find(|e| aria_role(doc, *e) == Some("listbox"))
						} else {
							Some(element)
						};
						listbox
							.map(|listbox| {
								doc.descendant_elements(listbox)
									.filter(|e| {
										doc.attribute(*e, "aria-selected") == Some("true")
											&& aria_role(doc, *e) == Some("option")
									})
									.collect()
							})
							.unwrap_or_default()
					};
					if selected.is_empty() && tag == "input" {
						return doc.value(element);
					}
					return selected
						.into_iter()
						.map(|option| self.text_alternative(option, child_options))
						.collect::<Vec<_>>()
						.join(" ");
				}
				if matches!(role, "progressbar" | "scrollbar" | "slider" | "spinbutton" | "meter") {
					self.visited.insert(element);
					return doc
						.attribute(element, "aria-valuetext")
						.or_else(|| doc.attribute(element, "aria-valuenow"))
						.or_else(|| doc.attribute(element, "value"))
						.unwrap_or("")
						.to_string();
				}
				if role == "menu" {
					self.visited.insert(element);
					return String::new();
				}
			}
		}

		let aria_label = doc.attribute(element, "aria-label").unwrap_or("");
		if !aria_label.trim().is_empty() {
			self.visited.insert(element);
			return aria_label.to_string();
		}

		if role != "presentation" && role != "none" {
			if let Some(name) = self.native_text_alternative(element, tag, labelled_by.is_some(), options, child_options) {
				return name;
			}
		}

		let name_from_summary = tag == "summary" && role != "presentation" && role != "none";
		if allows_name_from_content(role, options.embedded_in_target == EmbeddedInTarget::Descendant)
			|| name_from_summary
			|| options.embedded_in_labelled_by.is_some()
			|| options.embedded_in_label.is_some()
			|| options.embedded_in_native_text_alternative.is_some()
		{
			self.visited.insert(element);
			let name = self.name_from_content(element, child_options);
			let significant = if options.embedded_in_target == EmbeddedInTarget::SelfTarget {
				!name.trim().is_empty()
			} else {
				!name.is_empty()
			};
			if significant {
				return name;
			}
		}

		if (role != "presentation" && role != "none") || tag == "iframe" {
			self.visited.insert(element);
			let title = doc.attribute(element, "title").unwrap_or("");
			if !title.trim().is_empty() {
				return title.to_string();
			}
		}

		self.visited.insert(element);
		String::new()
	}

	/// Host-language rules for form controls, images, tables and friends.
	fn native_text_alternative(
		&mut self,
		element: NodeId,
		tag: &str,
		has_labelled_by: bool,
		options: NameOptions,
		child_options: NameOptions,
	) -> Option<String> {
		let doc = self.doc;
		let attr = |name: &str| doc.attribute(element, name).unwrap_or("").to_string();
		let kind = if tag == "input" { input_type(doc, element) } else { String::new() };

		if tag == "input" && matches!(kind.as_str(), "button" | "submit" | "reset") {
			self.visited.insert(element);
			let value = doc.value(element);
			if !value.trim().is_empty() {
				return Some(value);
			}
			return Some(match kind.as_str() {
				"submit" => "Submit".to_string(),
				"reset" => "Reset".to_string(),
				_ => attr("title"),
			});
		}

		if tag == "input" && kind == "image" {
			self.visited.insert(element);
			let labels = native_labels(doc, element);
			if !labels.is_empty() && options.embedded_in_labelled_by.is_none() {
				return Some(self.name_from_labels(&labels, options));
			}
			for name in ["alt", "title"] {
				let value = attr(name);
				if !value.trim().is_empty() {
					return Some(value);
				}
			}
			return Some("Submit".to_string());
		}

		if !has_labelled_by && tag == "button" {
			self.visited.insert(element);
			let labels = native_labels(doc, element);
			if !labels.is_empty() {
				return Some(self.name_from_labels(&labels, options));
			}
		}

		if !has_labelled_by && tag == "output" {
			self.visited.insert(element);
			let labels = native_labels(doc, element);
			if !labels.is_empty() {
				return Some(self.name_from_labels(&labels, options));
			}
			return Some(attr("title"));
		}

		if !has_labelled_by && matches!(tag, "textarea" | "select" | "input") {
			self.visited.insert(element);
			let labels = native_labels(doc, element);
			if !labels.is_empty() {
				return Some(self.name_from_labels(&labels, options));
			}
			let use_placeholder = tag == "textarea"
				|| (tag == "input"
					&& matches!(kind.as_str(), "text" | "password" | "search" | "tel" | "email" | "url"));
			let title = attr("title");
			if !use_placeholder || !title.is_empty() {
				return Some(title);
			}
			return Some(attr("placeholder"));
		}

		let caption_child = |child_tag: &str| doc.element_children(element).find(|c| doc.tag_name(*c) == child_tag);

		if !has_labelled_by && (tag == "fieldset" || tag == "figure") {
			self.visited.insert(element);
			let caption_tag = if tag == "fieldset" { "legend" } else { "figcaption" };
			if let Some(caption) = caption_child(caption_tag) {
				return Some(self.text_alternative(
					caption,
					NameOptions {
						embedded_in_native_text_alternative: Some(is_element_hidden_for_aria(doc, caption)),
						..child_options
					},
				));
			}
			return Some(attr("title"));
		}

		if tag == "img" || tag == "area" {
			self.visited.insert(element);
			let alt = attr("alt");
			if !alt.trim().is_empty() {
				return Some(alt);
			}
			return Some(attr("title"));
		}

		if tag == "table" {
			self.visited.insert(element);
			if let Some(caption) = caption_child("caption") {
				return Some(self.text_alternative(
					caption,
					NameOptions {
						embedded_in_native_text_alternative: Some(is_element_hidden_for_aria(doc, caption)),
						..child_options
					},
				));
			}
			let summary = attr("summary");
			if !summary.is_empty() {
				return Some(summary);
			}
		}

		if tag == "svg" {
			self.visited.insert(element);
			if let Some(title) = caption_child("title") {
				return Some(self.text_alternative(
					title,
					NameOptions {
						embedded_in_labelled_by: Some(is_element_hidden_for_aria(doc, title)),
						..child_options
					},
				));
			}
		}
		None
	}

	fn name_from_labels(&mut self, labels: &[NodeId], options: NameOptions) -> String {
		labels
			.iter()
			.map(|label| {
				self.text_alternative(
					*label,
					NameOptions {
						embedded_in_label: Some(is_element_hidden_for_aria(self.doc, *label)),
						embedded_in_native_text_alternative: None,
						embedded_in_labelled_by: None,
						embedded_in_target: EmbeddedInTarget::None,
						..options
					},
				)
			})
			.filter(|name| !name.is_empty())
			.collect::<Vec<_>>()
			.join(" ")
	}

	fn name_from_content(&mut self, element: NodeId, child_options: NameOptions) -> String {
		let doc = self.doc;
		let generated = self.layout.generated_content(doc, element).unwrap_or_default();
		let mut tokens = vec![generated.before];
		let assigned = if doc.tag_name(element) == "slot" {
			assigned_nodes(doc, element)
		} else {
			Vec::new()
		};
		if !assigned.is_empty() {
			for child in assigned {
				tokens.push(self.content_token(child, false, child_options));
			}
		} else {
			for child in doc.children(element).to_vec() {
				tokens.push(self.content_token(child, true, child_options));
			}
			if let Some(shadow) = doc.shadow_root(element) {
				for child in doc.children(shadow).to_vec() {
					tokens.push(self.content_token(child, true, child_options));
				}
			}
			for owned in id_refs(doc, element, doc.attribute(element, "aria-owns")) {
				tokens.push(self.content_token(owned, true, child_options));
			}
		}
		tokens.push(generated.after);
		tokens.concat()
	}

	fn content_token(&mut self, node: NodeId, skip_slotted: bool, child_options: NameOptions) -> String {
		let doc = self.doc;
		if skip_slotted && assigned_slot(doc, node).is_some() {
			return String::new();
		}
		if doc.is_element(node) {
			let token = self.text_alternative(node, child_options);
			let inline = self.layout.compute_box(doc, node).inline;
			if !inline || doc.tag_name(node) == "br" {
				return format!(" {token} ");
			}
			return token;
		}
		if doc.is_text(node) {
			return doc.node_text(node).unwrap_or("").to_string();
		}
		String::new()
	}
}

/// Normalized accessible name, as compared by the role engine.
pub fn normalized_accessible_name(
	aria: &dyn Accessibility,
	doc: &Document,
	layout: &dyn Layout,
	element: NodeId,
	include_hidden: bool,
) -> String {
	normalize_white_space(&aria.accessible_name(doc, layout, element, include_hidden))
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::layout::StaticLayout;

	fn by_id(doc: &Document, id: &str) -> NodeId {
		doc.get_element_by_id(doc.root(), id).unwrap()
	}

	#[test]
	fn implicit_roles() {
		let doc = Document::parse_html(
			r##"<a id="link" href="#">x</a><a id="plain">y</a>
			<input id="search" type="search"><input id="text"><input id="weird" type="foo">
			<input id="hidden" type="hidden"><input id="check" type="checkbox">
			<select id="combo"></select><select id="list" multiple></select>
			<img id="deco" alt=""><img id="pic" alt="A cat">
			<section id="sec"></section><section id="region" aria-label="Main"></section>
			<article><footer id="foot"></footer></article><footer id="page-foot"></footer>
			<table role="grid"><tr><td id="grid-cell"></td></tr></table>
			<ul role="none"><li id="item">a</li></ul>
			<div id="btn" role="foo button">go</div><div id="abstract" role="widget"></div>"##,
		)
		.unwrap();
		let role = |id: &str| aria_role(&doc, by_id(&doc, id));
		assert_eq!(role("link"), Some("link"));
		assert_eq!(role("plain"), None);
		assert_eq!(role("search"), Some("searchbox"));
		assert_eq!(role("text"), Some("textbox"));
		assert_eq!(role("weird"), Some("textbox"));
		assert_eq!(role("hidden"), None);
		assert_eq!(role("check"), Some("checkbox"));
		assert_eq!(role("combo"), Some("combobox"));
		assert_eq!(role("list"), Some("listbox"));
		assert_eq!(role("deco"), Some("presentation"));
		assert_eq!(role("pic"), Some("img"));
		assert_eq!(role("sec"), None);
		assert_eq!(role("region"), Some("region"));
		assert_eq!(role("foot"), None);
		assert_eq!(role("page-foot"), Some("contentinfo"));
		assert_eq!(role("grid-cell"), Some("gridcell"));
		assert_eq!(role("item"), Some("none"));
		assert_eq!(role("btn"), Some("button"));
		assert_eq!(role("abstract"), None);
	}

	#[test]
	fn accessible_names() {
		let doc = Document::parse_html(
			r#"<button id="b1">Save <span>draft</span></button>
			<button id="b2" aria-label="Close">x</button>
			<span id="lbl">Billing</span><input id="i1" aria-labelledby="lbl">
			<label for="i2">Email</label><input id="i2">
			<label>Name <input id="i3"></label>
			<input id="i4" placeholder="Search">
			<input id="s1" type="submit"><input id="s2" type="button" value="Go">
			<img id="img" alt="Logo">
			<div id="d1">Title <p>Para</p></div>
			<a id="a1" href="x" title="Home"></a>
			<fieldset id="fs"><legend>Shipping</legend></fieldset>
			<button id="hid">Open <span aria-hidden="true">icon</span></button>"#,
		)
		.unwrap();
		let layout = StaticLayout::new();
		let name = |id: &str| HtmlAccessibility.accessible_name(&doc, &layout, by_id(&doc, id), false);
		assert_eq!(name("b1"), "Save draft");
		assert_eq!(name("b2"), "Close");
		assert_eq!(name("i1"), "Billing");
		assert_eq!(name("i2"), "Email");
		assert_eq!(name("i3"), "Name");
		assert_eq!(name("i4"), "Search");
		assert_eq!(name("s1"), "Submit");
		assert_eq!(name("s2"), "Go");
		assert_eq!(name("img"), "Logo");
		assert_eq!(name("d1"), "");
		assert_eq!(name("a1"), "Home");
		assert_eq!(name("fs"), "Shipping");
		assert_eq!(name("hid"), "Open");
	}

	#[test]
	fn generated_content_joins_the_name() {
		let doc = Document::parse_html(r#"<button id="b"><i id="icon"></i>Next</button>"#).unwrap();
		let mut layout = StaticLayout::new();
		layout.set_generated_content(by_id(&doc, "icon"), "\u{2192}", "");
		let name = HtmlAccessibility.accessible_name(&doc, &layout, by_id(&doc, "b"), false);
		assert_eq!(name, "\u{2192}Next");
	}

	#[test]
	fn states() {
		let doc = Document::parse_html(
			r#"<input id="c" type="checkbox" checked><div id="m" role="checkbox" aria-checked="mixed"></div>
			<button id="p" aria-pressed="true">x</button><details id="d" open></details>
			<div id="e" role="button" aria-expanded="false"></div><h3 id="h">t</h3>
			<div id="l" role="heading" aria-level="5"></div>
			<fieldset disabled><button id="fb">x</button></fieldset>
			<div aria-disabled="true" role="group"><div id="inner" role="button"></div></div>
			<select><option id="o" selected>a</option></select>"#,
		)
		.unwrap();
		let aria = HtmlAccessibility;
		let id = |s: &str| by_id(&doc, s);
		assert_eq!(aria.checked(&doc, id("c")), AriaState::True);
		assert_eq!(aria.checked(&doc, id("m")), AriaState::Mixed);
		assert_eq!(aria.pressed(&doc, id("p")), AriaState::True);
		assert_eq!(aria.expanded(&doc, id("d")), Some(true));
		assert_eq!(aria.expanded(&doc, id("e")), Some(false));
		assert_eq!(aria.expanded(&doc, id("h")), None);
		assert_eq!(aria.level(&doc, id("h")), 3);
		assert_eq!(aria.level(&doc, id("l")), 5);
		assert!(aria.disabled(&doc, id("fb")));
		assert!(aria.disabled(&doc, id("inner")));
		assert!(aria.selected(&doc, id("o")));
	}

	#[test]
	fn hidden_for_aria() {
		let doc = Document::parse_html(
			r#"<div aria-hidden="true"><span id="a">x</span></div>
			<div style="display:none"><span id="b">x</span></div>
			<div style="visibility:hidden"><span id="c">x</span></div>
			<span id="d">x</span>"#,
		)
		.unwrap();
		let hidden = |id: &str| HtmlAccessibility.is_hidden(&doc, by_id(&doc, id));
		assert!(hidden("a"));
		assert!(hidden("b"));
		assert!(hidden("c"));
		assert!(!hidden("d"));
	}

	#[test]
	fn unslotted_light_children_are_hidden() {
		let mut doc = Document::new();
		let html = doc.create_element("html");
		let root = doc.root();
		doc.append_child(root, html);
		let host = doc.create_element("div");
		doc.append_child(html, host);
		let shadow = doc.attach_shadow(host, crate::dom::ShadowRootMode::Open);
		let slot = doc.create_element("slot");
		doc.set_attribute(slot, "name", "title");
		doc.append_child(shadow, slot);
		let slotted = doc.create_element("span");
		doc.set_attribute(slotted, "slot", "title");
		doc.append_child(host, slotted);
		let stray = doc.create_element("span");
		doc.append_child(host, stray);

		assert_eq!(assigned_slot(&doc, slotted), Some(slot));
		assert!(!is_element_hidden_for_aria(&doc, slotted));
		assert!(is_element_hidden_for_aria(&doc, stray));
	}
}
