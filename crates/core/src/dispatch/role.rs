//! `role=` and `internal:role=`: ARIA role plus state and name filters.

use pw_protocol::escape::normalize_white_space;
use pw_protocol::{AttributeOperator, AttributeSelectorPart, AttributeValue, parse_attribute_selector};

use crate::aria::{
	ARIA_CHECKED_ROLES, ARIA_EXPANDED_ROLES, ARIA_LEVEL_ROLES, ARIA_PRESSED_ROLES,
	ARIA_SELECTED_ROLES, Accessibility, AriaState, normalized_accessible_name,
};
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::layout::Layout;

const SUPPORTED_ATTRIBUTES: &[&str] = &[
	"checked",
	"disabled",
	"expanded",
	"include-hidden",
	"level",
	"name",
	"pressed",
	"selected",
];

/// Validated `role[attr...]` body.
#[derive(Debug, Clone, Default)]
pub(super) struct RoleOptions {
	role: String,
	checked: Option<AriaState>,
	pressed: Option<AriaState>,
	selected: Option<bool>,
	expanded: Option<bool>,
	level: Option<u32>,
	disabled: Option<bool>,
	include_hidden: bool,
	name: Option<AttributeSelectorPart>,
}

fn quoted_list(values: &[&str]) -> String {
	let mut sorted = values.to_vec();
	sorted.sort_unstable();
	sorted
		.iter()
		.map(|v| format!("\"{v}\""))
		.collect::<Vec<_>>()
		.join(", ")
}

fn only_for_roles(attr: &AttributeSelectorPart, roles: &[&str], role: &str) -> Result<()> {
	if roles.contains(&role) {
		return Ok(());
	}
	Err(Error::engine(format!(
		"\"{}\" attribute is only supported for roles: {}",
		attr.name,
		quoted_list(roles)
	)))
}

fn validate_op(attr: &AttributeSelectorPart) -> Result<()> {
	match attr.op {
		AttributeOperator::Truthy | AttributeOperator::Equals => Ok(()),
		op => Err(Error::engine(format!(
			"\"{}\" does not support \"{}\" matcher",
			attr.name,
			op.as_str()
		))),
	}
}

/// Value of a boolean-ish attribute; `[attr]` alone reads as `true`.
fn bool_value(attr: &AttributeSelectorPart) -> Option<bool> {
	match (&attr.op, &attr.value) {
		(AttributeOperator::Truthy, _) => Some(true),
		(_, Some(AttributeValue::Bool(value))) => Some(*value),
		_ => None,
	}
}

fn expect_bool(attr: &AttributeSelectorPart) -> Result<bool> {
	validate_op(attr)?;
	bool_value(attr)
		.ok_or_else(|| Error::engine(format!("\"{}\" must be one of true, false", attr.name)))
}

fn expect_tristate(attr: &AttributeSelectorPart) -> Result<AriaState> {
	validate_op(attr)?;
	if let Some(value) = bool_value(attr) {
		return Ok(value.into());
	}
	match &attr.value {
		Some(AttributeValue::String(value)) if value == "mixed" => Ok(AriaState::Mixed),
		_ => Err(Error::engine(format!(
			"\"{}\" must be one of true, false, \"mixed\"",
			attr.name
		))),
	}
}

pub(super) fn parse_role_options(body: &str, internal: bool) -> Result<RoleOptions> {
	let parsed = parse_attribute_selector(body, true)?;
	let role = parsed.name.to_lowercase();
	if role.is_empty() {
		return Err(Error::engine("Role must not be empty"));
	}
	let mut options = RoleOptions {
		role,
		..RoleOptions::default()
	};
	for attr in parsed.attributes {
		match attr.name.as_str() {
			"checked" => {
				only_for_roles(&attr, ARIA_CHECKED_ROLES, &options.role)?;
				options.checked = Some(expect_tristate(&attr)?);
			}
			"pressed" => {
				only_for_roles(&attr, ARIA_PRESSED_ROLES, &options.role)?;
				options.pressed = Some(expect_tristate(&attr)?);
			}
			"selected" => {
				only_for_roles(&attr, ARIA_SELECTED_ROLES, &options.role)?;
				options.selected = Some(expect_bool(&attr)?);
			}
			"expanded" => {
				only_for_roles(&attr, ARIA_EXPANDED_ROLES, &options.role)?;
				options.expanded = Some(expect_bool(&attr)?);
			}
			"level" => {
				only_for_roles(&attr, ARIA_LEVEL_ROLES, &options.role)?;
				let level = match (&attr.op, &attr.value) {
					(AttributeOperator::Equals, Some(AttributeValue::Number(n))) => Some(*n),
					(AttributeOperator::Equals, Some(AttributeValue::String(s))) => s.parse::<f64>().ok(),
					_ => None,
				};
				let level = level
					.filter(|n| n.is_finite() && *n >= 0.0)
					.ok_or_else(|| Error::engine("\"level\" attribute must be compared to a number"))?;
				options.level = Some(level as u32);
			}
			"disabled" => options.disabled = Some(expect_bool(&attr)?),
			"include-hidden" => options.include_hidden = expect_bool(&attr)?,
			"name" => {
				if attr.op == AttributeOperator::Truthy {
					return Err(Error::engine("\"name\" attribute must have a value"));
				}
				let mut attr = attr;
				match &mut attr.value {
					Some(AttributeValue::String(value)) => {
						*value = normalize_white_space(value);
						if internal && !attr.case_sensitive && attr.op == AttributeOperator::Equals {
							attr.op = AttributeOperator::Contains;
						}
					}
					Some(AttributeValue::Regex(_)) => {}
					_ => {
						return Err(Error::engine(
							"\"name\" attribute must be a string or a regular expression",
						));
					}
				}
				options.name = Some(attr);
			}
			other => {
				return Err(Error::engine(format!(
					"Unknown attribute \"{other}\", must be one of {}.",
					quoted_list(SUPPORTED_ATTRIBUTES)
				)));
			}
		}
	}
	Ok(options)
}

fn matches_role(
	doc: &Document,
	layout: &dyn Layout,
	aria: &dyn Accessibility,
	element: NodeId,
	options: &RoleOptions,
) -> bool {
	if aria.role(doc, element).as_deref() != Some(options.role.as_str()) {
		return false;
	}
	if options.selected.is_some_and(|selected| aria.selected(doc, element) != selected) {
		return false;
	}
	if options.checked.is_some_and(|checked| aria.checked(doc, element) != checked) {
		return false;
	}
	if options.pressed.is_some_and(|pressed| aria.pressed(doc, element) != pressed) {
		return false;
	}
	if let Some(expanded) = options.expanded {
		if aria.expanded(doc, element) != Some(expanded) {
			return false;
		}
	}
	if options.level.is_some_and(|level| aria.level(doc, element) != level) {
		return false;
	}
	if options.disabled.is_some_and(|disabled| aria.disabled(doc, element) != disabled) {
		return false;
	}
	if !options.include_hidden && aria.is_hidden(doc, element) {
		return false;
	}
	if let Some(name) = &options.name {
		let accessible =
			normalized_accessible_name(aria, doc, layout, element, options.include_hidden);
		if !name.matches_str(Some(&accessible)) {
			return false;
		}
	}
	true
}

/// Elements below `root` (never `root` itself) with the requested role,
/// light tree first, then each shadow root in discovery order.
pub(super) fn query_role(
	doc: &Document,
	layout: &dyn Layout,
	aria: &dyn Accessibility,
	root: NodeId,
	options: &RoleOptions,
) -> Vec<NodeId> {
	let mut result = Vec::new();
	collect_roles(doc, layout, aria, root, options, &mut result);
	result
}

fn collect_roles(
	doc: &Document,
	layout: &dyn Layout,
	aria: &dyn Accessibility,
	scope: NodeId,
	options: &RoleOptions,
	out: &mut Vec<NodeId>,
) {
	let mut shadows: Vec<NodeId> = doc.shadow_root(scope).into_iter().collect();
	for element in doc.descendant_elements(scope) {
		if matches_role(doc, layout, aria, element, options) {
			out.push(element);
		}
		shadows.extend(doc.shadow_root(element));
	}
	for shadow in shadows {
		collect_roles(doc, layout, aria, shadow, options, out);
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn err(body: &str) -> String {
		parse_role_options(body, false).unwrap_err().to_string()
	}

	#[test]
	fn validates_attributes() {
		assert_eq!(err(""), "Error while parsing selector `` - selector cannot be empty");
		assert_eq!(err("[name=x]"), "Role must not be empty");
		assert_eq!(
			err("button[checked]"),
			"\"checked\" attribute is only supported for roles: \"checkbox\", \"menuitemcheckbox\", \"menuitemradio\", \"option\", \"radio\", \"switch\", \"treeitem\""
		);
		assert_eq!(
			err("checkbox[checked=\"yes\"]"),
			"\"checked\" must be one of true, false, \"mixed\""
		);
		assert_eq!(err("heading[level=high]"), "\"level\" attribute must be compared to a number");
		assert_eq!(err("button[name]"), "\"name\" attribute must have a value");
		assert_eq!(
			err("button[foo=1]"),
			"Unknown attribute \"foo\", must be one of \"checked\", \"disabled\", \"expanded\", \"include-hidden\", \"level\", \"name\", \"pressed\", \"selected\"."
		);
		assert_eq!(err("button[disabled*=\"x\"]"), "\"disabled\" does not support \"*=\" matcher");
	}

	#[test]
	fn internal_names_are_substrings_unless_exact() {
		let name = |body: &str, internal: bool| {
			parse_role_options(body, internal).unwrap().name.unwrap().op
		};
		assert_eq!(name(r#"button[name="Go"i]"#, true), AttributeOperator::Contains);
		assert_eq!(name(r#"button[name="Go"s]"#, true), AttributeOperator::Equals);
		assert_eq!(name(r#"button[name="Go"i]"#, false), AttributeOperator::Equals);
		assert_eq!(name("button[name=/go/i]", true), AttributeOperator::Equals);
	}

	#[test]
	fn parses_states() {
		let options =
			parse_role_options("checkbox[checked=\"mixed\"][disabled][include-hidden=false]", false)
				.unwrap();
		assert_eq!(options.checked, Some(AriaState::Mixed));
		assert_eq!(options.disabled, Some(true));
		assert!(!options.include_hidden);
		assert_eq!(parse_role_options("HEADING[level=2]", false).unwrap().level, Some(2));
	}
}
