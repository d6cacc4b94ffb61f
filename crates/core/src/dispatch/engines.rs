//! Top-level part engines: the `name=` half of `name=body >> ...`.

use pw_protocol::{
	AttributeValue, CompoundSelector, CssComplexSelector, NestedSelectorBody, PartBody,
	SelectorPart, parse_attribute_selector,
};

use super::Selectors;
use super::role::{parse_role_options, query_role};
use crate::dom::NodeId;
use crate::error::{Error, Result};
use crate::evaluator::QueryContext;
use crate::spatial::SpatialRelation;
use crate::text::{
	TextMatch, TextMatchKind, create_text_matcher, element_labels, element_matches_text, element_text,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartEngine {
	Css,
	Text { shadow: bool },
	/// `id=`, `data-testid=` and friends: exact attribute value.
	Attribute { attribute: &'static str, shadow: bool },
	Role { internal: bool },
	Nth,
	Visible,
	Control,
	Has,
	HasNot,
	And,
	Or,
	Chain,
	Label,
	InternalText,
	HasText,
	HasNotText,
	/// `internal:attr=` and `internal:testid=`.
	NamedAttribute,
	Describe,
	Layout(SpatialRelation),
}

pub const PART_ENGINES: &[(&str, PartEngine)] = &[
	("css", PartEngine::Css),
	("text", PartEngine::Text { shadow: true }),
	("text:light", PartEngine::Text { shadow: false }),
	("id", PartEngine::Attribute { attribute: "id", shadow: true }),
	("id:light", PartEngine::Attribute { attribute: "id", shadow: false }),
	("data-testid", PartEngine::Attribute { attribute: "data-testid", shadow: true }),
	("data-testid:light", PartEngine::Attribute { attribute: "data-testid", shadow: false }),
	("data-test-id", PartEngine::Attribute { attribute: "data-test-id", shadow: true }),
	("data-test-id:light", PartEngine::Attribute { attribute: "data-test-id", shadow: false }),
	("data-test", PartEngine::Attribute { attribute: "data-test", shadow: true }),
	("data-test:light", PartEngine::Attribute { attribute: "data-test", shadow: false }),
	("role", PartEngine::Role { internal: false }),
	("nth", PartEngine::Nth),
	("visible", PartEngine::Visible),
	("internal:control", PartEngine::Control),
	("internal:has", PartEngine::Has),
	("internal:has-not", PartEngine::HasNot),
	("internal:and", PartEngine::And),
	("internal:or", PartEngine::Or),
	("internal:chain", PartEngine::Chain),
	("internal:label", PartEngine::Label),
	("internal:text", PartEngine::InternalText),
	("internal:has-text", PartEngine::HasText),
	("internal:has-not-text", PartEngine::HasNotText),
	("internal:attr", PartEngine::NamedAttribute),
	("internal:testid", PartEngine::NamedAttribute),
	("internal:role", PartEngine::Role { internal: true }),
	("internal:describe", PartEngine::Describe),
	("left-of", PartEngine::Layout(SpatialRelation::LeftOf)),
	("right-of", PartEngine::Layout(SpatialRelation::RightOf)),
	("above", PartEngine::Layout(SpatialRelation::Above)),
	("below", PartEngine::Layout(SpatialRelation::Below)),
	("near", PartEngine::Layout(SpatialRelation::Near)),
];

impl PartEngine {
	pub fn from_name(name: &str) -> Option<Self> {
		PART_ENGINES
			.iter()
			.find(|(n, _)| *n == name)
			.map(|(_, engine)| *engine)
	}
}

fn text_body(part: &SelectorPart) -> Result<&str> {
	part.text_body()
		.ok_or_else(|| Error::engine(format!("\"{}\" engine expects a text body", part.name)))
}

fn nested_body(part: &SelectorPart) -> Result<&NestedSelectorBody> {
	part.nested_body()
		.ok_or_else(|| Error::engine(format!("\"{}\" engine expects a nested selector", part.name)))
}

/// Runs one part engine from a single root.
pub(super) fn query_engine_all(
	selectors: &Selectors<'_>,
	engine: PartEngine,
	part: &SelectorPart,
	root: NodeId,
) -> Result<Vec<NodeId>> {
	let doc = selectors.doc;
	let evaluator = &selectors.evaluator;
	let is_element = doc.is_element(root);
	match engine {
		PartEngine::Css => {
			let PartBody::Css(css) = &part.body else {
				return Err(Error::engine("\"css\" engine expects a parsed CSS body"));
			};
			evaluator.query(QueryContext::new(root), css)
		}
		PartEngine::Attribute { attribute, shadow } => {
			let css = CssComplexSelector::from_compound(CompoundSelector::with_attribute_value(
				attribute,
				text_body(part)?,
			));
			let ctx = QueryContext {
				pierce_shadow: shadow,
				..QueryContext::new(root)
			};
			evaluator.query(ctx, &[css])
		}
		PartEngine::Text { shadow } => query_text(selectors, root, text_body(part)?, shadow, false),
		PartEngine::InternalText => query_text(selectors, root, text_body(part)?, true, true),
		PartEngine::HasText | PartEngine::HasNotText => {
			if !is_element {
				return Ok(Vec::new());
			}
			let (matcher, _) = create_text_matcher(text_body(part)?, true)?;
			let matched = matcher.matches(&element_text(doc, evaluator.text_cache(), root));
			let keep = matched == (engine == PartEngine::HasText);
			Ok(if keep { vec![root] } else { Vec::new() })
		}
		PartEngine::Label => {
			let (matcher, _) = create_text_matcher(text_body(part)?, true)?;
			let cache = evaluator.text_cache();
			Ok(evaluator
				.query_css(QueryContext::new(root), None)
				.iter()
				.copied()
				.filter(|element| {
					element_labels(doc, selectors.aria, cache, *element)
						.iter()
						.any(|label| matcher.matches(label))
				})
				.collect())
		}
		PartEngine::NamedAttribute => query_named_attribute(selectors, root, text_body(part)?),
		PartEngine::Role { internal } => {
			let options = parse_role_options(text_body(part)?, internal)?;
			Ok(query_role(doc, selectors.layout, selectors.aria, root, &options))
		}
		PartEngine::Describe => Ok(if is_element { vec![root] } else { Vec::new() }),
		PartEngine::Control => match text_body(part)? {
			"enter-frame" | "return-empty" => Ok(Vec::new()),
			"component" => {
				if !is_element {
					return Ok(Vec::new());
				}
				let children: Vec<NodeId> = doc.element_children(root).take(2).collect();
				Ok(match children.as_slice() {
					[only] => vec![*only],
					_ => vec![root],
				})
			}
			other => Err(Error::engine(format!(
				"Internal error, unknown internal:control selector {other}"
			))),
		},
		PartEngine::Has | PartEngine::HasNot => {
			if !is_element {
				return Ok(Vec::new());
			}
			let has = !selectors.query_all(&nested_body(part)?.parsed, root)?.is_empty();
			let keep = has == (engine == PartEngine::Has);
			Ok(if keep { vec![root] } else { Vec::new() })
		}
		PartEngine::Visible => {
			if !is_element {
				return Ok(Vec::new());
			}
			let visible = text_body(part)? == "true";
			let keep = selectors.layout.is_visible(doc, root) == visible;
			Ok(if keep { vec![root] } else { Vec::new() })
		}
		PartEngine::Chain => selectors.query_all(&nested_body(part)?.parsed, root),
		// Handled over the whole root set by the dispatcher.
		PartEngine::Nth | PartEngine::And | PartEngine::Or | PartEngine::Layout(_) => Ok(Vec::new()),
	}
}

fn query_text(
	selectors: &Selectors<'_>,
	root: NodeId,
	body: &str,
	shadow: bool,
	internal: bool,
) -> Result<Vec<NodeId>> {
	let doc = selectors.doc;
	let evaluator = &selectors.evaluator;
	let cache = evaluator.text_cache();
	let (matcher, kind) = create_text_matcher(body, internal)?;
	let mut result = Vec::new();
	let mut last_did_not_match_self: Option<NodeId> = None;

	let mut append = |element: NodeId| {
		if kind == TextMatchKind::Lax
			&& last_did_not_match_self.is_some_and(|last| doc.contains(last, element))
		{
			return;
		}
		match element_matches_text(doc, cache, element, &matcher) {
			TextMatch::None => last_did_not_match_self = Some(element),
			TextMatch::SelfOnly => result.push(element),
			TextMatch::SelfAndChildren if kind == TextMatchKind::Strict && !internal => {
				result.push(element);
			}
			TextMatch::SelfAndChildren => {}
		}
	};

	if doc.is_element(root) {
		append(root);
	}
	let ctx = QueryContext {
		pierce_shadow: shadow,
		..QueryContext::new(root)
	};
	for element in evaluator.query_css(ctx, None).iter() {
		append(*element);
	}
	Ok(result)
}

fn query_named_attribute(selectors: &Selectors<'_>, root: NodeId, body: &str) -> Result<Vec<NodeId>> {
	let doc = selectors.doc;
	let parsed = parse_attribute_selector(body, true)?;
	let [attr] = parsed.attributes.as_slice() else {
		return Err(Error::MalformedSelector(body.to_string()));
	};
	if !parsed.name.is_empty() {
		return Err(Error::MalformedSelector(body.to_string()));
	}
	let matcher = |actual: &str| match &attr.value {
		Some(AttributeValue::Regex(regex)) => regex.is_match(actual),
		Some(AttributeValue::String(expected)) if attr.case_sensitive => actual == expected,
		Some(AttributeValue::String(expected)) => {
			actual.to_lowercase().contains(&expected.to_lowercase())
		}
		_ => false,
	};
	let name = attr.name.to_ascii_lowercase();
	let candidates = selectors
		.evaluator
		.query_css(QueryContext::new(root), Some(&CompoundSelector::with_attribute(&name)));
	Ok(candidates
		.iter()
		.copied()
		.filter(|element| doc.attribute(*element, &name).is_some_and(&matcher))
		.collect())
}
