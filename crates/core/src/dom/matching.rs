//! Native CSS predicate of a simple selector against one element.

use pw_protocol::{CompoundSelector, NthIndex, PseudoClass};

use super::{Document, NodeId, NodeKind};

const FORM_CONTROLS: &[&str] = &["button", "input", "select", "textarea", "optgroup", "option", "fieldset"];

const TEXT_INPUT_TYPES: &[&str] = &[
	"", "text", "search", "url", "tel", "email", "password", "number", "date", "datetime-local",
	"month", "time", "week",
];

impl Document {
	/// Whether `element` satisfies the native part of a simple selector.
	pub fn matches_compound(&self, element: NodeId, css: &CompoundSelector) -> bool {
		if !self.is_element(element) {
			return false;
		}
		if let Some(tag) = &css.tag {
			if self.tag_name(element) != tag {
				return false;
			}
		}
		if !css.ids.iter().all(|id| self.attribute(element, "id") == Some(id.as_str())) {
			return false;
		}
		if !css
			.classes
			.iter()
			.all(|class| self.class_list(element).any(|c| c == class))
		{
			return false;
		}
		if !css
			.attributes
			.iter()
			.all(|cond| cond.matches(self.attribute(element, &cond.name)))
		{
			return false;
		}
		css.pseudo_classes
			.iter()
			.all(|pseudo| self.matches_pseudo(element, *pseudo))
	}

	fn matches_pseudo(&self, element: NodeId, pseudo: PseudoClass) -> bool {
		match pseudo {
			PseudoClass::FirstChild => self.position(element, false, false) == Some(1),
			PseudoClass::LastChild => self.position(element, true, false) == Some(1),
			PseudoClass::OnlyChild => {
				self.position(element, false, false) == Some(1) && self.position(element, true, false) == Some(1)
			}
			PseudoClass::FirstOfType => self.position(element, false, true) == Some(1),
			PseudoClass::LastOfType => self.position(element, true, true) == Some(1),
			PseudoClass::OnlyOfType => {
				self.position(element, false, true) == Some(1) && self.position(element, true, true) == Some(1)
			}
			PseudoClass::NthChild(nth) => self.nth(element, nth, false, false),
			PseudoClass::NthLastChild(nth) => self.nth(element, nth, true, false),
			PseudoClass::NthOfType(nth) => self.nth(element, nth, false, true),
			PseudoClass::NthLastOfType(nth) => self.nth(element, nth, true, true),
			PseudoClass::Root => self.document_element() == Some(element),
			PseudoClass::Empty => self.children(element).iter().all(|c| match self.kind(*c) {
				NodeKind::Text(text) => text.is_empty(),
				NodeKind::Comment(_) => true,
				_ => false,
			}),
			PseudoClass::Checked => self.is_checked(element),
			PseudoClass::Disabled => self.is_disabled(element),
			PseudoClass::Enabled => {
				FORM_CONTROLS.contains(&self.tag_name(element)) && !self.is_disabled(element)
			}
			PseudoClass::Required => self.is_required_capable(element) && self.has_attribute(element, "required"),
			PseudoClass::Optional => self.is_required_capable(element) && !self.has_attribute(element, "required"),
			PseudoClass::ReadWrite => self.is_read_write(element),
			PseudoClass::ReadOnly => !self.is_read_write(element),
			PseudoClass::Link | PseudoClass::AnyLink => {
				matches!(self.tag_name(element), "a" | "area") && self.has_attribute(element, "href")
			}
			PseudoClass::PlaceholderShown => {
				matches!(self.tag_name(element), "input" | "textarea")
					&& self.has_attribute(element, "placeholder")
					&& self.value(element).is_empty()
			}
			PseudoClass::Defined => !self.tag_name(element).contains('-'),
		}
	}

	/// 1-based position among element siblings, optionally counted from the
	/// end and optionally restricted to the same tag.
	fn position(&self, element: NodeId, from_end: bool, of_type: bool) -> Option<usize> {
		let parent = self.parent_node(element)?;
		let tag = self.tag_name(element);
		let siblings: Vec<NodeId> = self
			.element_children(parent)
			.filter(|s| !of_type || self.tag_name(*s) == tag)
			.collect();
		let index = siblings.iter().position(|s| *s == element)?;
		Some(if from_end {
			siblings.len() - index
		} else {
			index + 1
		})
	}

	fn nth(&self, element: NodeId, nth: NthIndex, from_end: bool, of_type: bool) -> bool {
		self.position(element, from_end, of_type)
			.is_some_and(|p| nth.matches(p))
	}

	pub(crate) fn is_checked(&self, element: NodeId) -> bool {
		match self.tag_name(element) {
			"input" => {
				let kind = self.attribute(element, "type").unwrap_or("").to_ascii_lowercase();
				matches!(kind.as_str(), "checkbox" | "radio") && self.has_attribute(element, "checked")
			}
			"option" => self.has_attribute(element, "selected"),
			_ => false,
		}
	}

	/// Native disabled state, including controls inside a disabled fieldset
	/// (except those in its first legend).
	pub(crate) fn is_disabled(&self, element: NodeId) -> bool {
		let tag = self.tag_name(element);
		if !FORM_CONTROLS.contains(&tag) {
			return false;
		}
		if self.has_attribute(element, "disabled") {
			return true;
		}
		if matches!(tag, "option" | "optgroup") {
			return self
				.parent_element(element)
				.is_some_and(|p| matches!(self.tag_name(p), "optgroup" | "select") && self.is_disabled(p));
		}
		let mut child = element;
		let mut current = self.parent_element(element);
		while let Some(ancestor) = current {
			if self.tag_name(ancestor) == "fieldset" && self.has_attribute(ancestor, "disabled") {
				let first_legend = self
					.element_children(ancestor)
					.find(|c| self.tag_name(*c) == "legend");
				if first_legend != Some(child) {
					return true;
				}
			}
			child = ancestor;
			current = self.parent_element(ancestor);
		}
		false
	}

	fn is_required_capable(&self, element: NodeId) -> bool {
		matches!(self.tag_name(element), "input" | "select" | "textarea")
	}

	fn is_read_write(&self, element: NodeId) -> bool {
		match self.tag_name(element) {
			"input" => {
				let kind = self.attribute(element, "type").unwrap_or("").to_ascii_lowercase();
				TEXT_INPUT_TYPES.contains(&kind.as_str())
					&& !self.has_attribute(element, "readonly")
					&& !self.is_disabled(element)
			}
			"textarea" => !self.has_attribute(element, "readonly") && !self.is_disabled(element),
			_ => self.is_content_editable(element),
		}
	}

	/// Inherited `contenteditable`.
	pub(crate) fn is_content_editable(&self, element: NodeId) -> bool {
		let mut current = Some(element);
		while let Some(node) = current {
			if let Some(value) = self.attribute(node, "contenteditable") {
				return !value.eq_ignore_ascii_case("false");
			}
			current = self.parent_element(node);
		}
		false
	}
}
