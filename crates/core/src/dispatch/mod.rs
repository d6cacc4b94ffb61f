//! Query Dispatcher: resolves `engine=body >> engine=body` selectors.
//!
//! [`Selectors`] is the library entry point. It owns one [`Evaluator`]
//! session, so every query issued through it shares caches while a query is
//! running and starts clean afterwards.

mod engines;
mod role;

#[cfg(test)]
mod tests;

use indexmap::IndexSet;
use pw_protocol::{
	NestedSelectorBody, ParsedSelector, PartBody, SelectorPart, parse_selector, stringify_selector,
	visit_all_selector_parts,
};
use tracing::debug;

pub use engines::{PART_ENGINES, PartEngine};

use crate::aria::{Accessibility, HtmlAccessibility};
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::evaluator::{Evaluator, sort_in_dom_order};
use crate::layout::{Layout, StaticLayout};
use crate::spatial::{SpatialRelation, element_score};

static DEFAULT_LAYOUT: StaticLayout = StaticLayout::new();
static DEFAULT_ARIA: HtmlAccessibility = HtmlAccessibility;

/// Selector resolution over one document.
pub struct Selectors<'a> {
	pub(crate) doc: &'a Document,
	pub(crate) layout: &'a dyn Layout,
	pub(crate) aria: &'a dyn Accessibility,
	pub(crate) evaluator: Evaluator<'a>,
}

impl<'a> Selectors<'a> {
	/// Uses [`StaticLayout`] and [`HtmlAccessibility`].
	pub fn new(doc: &'a Document) -> Self {
		Self {
			doc,
			layout: &DEFAULT_LAYOUT,
			aria: &DEFAULT_ARIA,
			evaluator: Evaluator::new(doc, &DEFAULT_LAYOUT),
		}
	}

	pub fn with_layout(mut self, layout: &'a dyn Layout) -> Self {
		self.layout = layout;
		self.evaluator = Evaluator::new(self.doc, layout);
		self
	}

	pub fn with_accessibility(mut self, aria: &'a dyn Accessibility) -> Self {
		self.aria = aria;
		self
	}

	pub fn document(&self) -> &'a Document {
		self.doc
	}

	pub fn layout(&self) -> &'a dyn Layout {
		self.layout
	}

	pub fn accessibility(&self) -> &'a dyn Accessibility {
		self.aria
	}

	pub fn evaluator(&self) -> &Evaluator<'a> {
		&self.evaluator
	}

	/// Parses and checks that every part, nested ones included, names a
	/// registered engine.
	pub fn parse_selector(&self, selector: &str) -> Result<ParsedSelector> {
		let parsed = parse_selector(selector)?;
		let mut unknown: Option<String> = None;
		visit_all_selector_parts(&parsed, &mut |part, _| {
			if unknown.is_none() && PartEngine::from_name(&part.name).is_none() {
				unknown = Some(part.name.clone());
			}
		});
		match unknown {
			Some(engine) => Err(Error::UnknownEngine {
				engine,
				selector: selector.to_string(),
			}),
			None => Ok(parsed),
		}
	}

	/// First match, if any.
	pub fn query(&self, selector: &ParsedSelector, root: NodeId) -> Result<Option<NodeId>> {
		Ok(self.query_all(selector, root)?.into_iter().next())
	}

	/// Whether `element` is among the matches of `selector` from `root`.
	pub fn matches(&self, element: NodeId, selector: &ParsedSelector, root: NodeId) -> Result<bool> {
		Ok(self.query_all(selector, root)?.contains(&element))
	}

	/// All matches, in the order the last part produced them.
	pub fn query_all(&self, selector: &ParsedSelector, root: NodeId) -> Result<Vec<NodeId>> {
		if let Some(capture) = selector.capture {
			return self.query_all(&capture_as_has(selector, capture)?, root);
		}
		let doc = self.doc;
		if !(doc.is_document(root) || doc.is_element(root) || doc.is_shadow_root(root)) {
			return Err(Error::NotQueryable);
		}
		if doc.is_shadow_root(root) {
			if let [part] = selector.parts.as_slice() {
				if part.name == "css" && part.source == ":scope" {
					return Ok(vec![root]);
				}
			}
		}

		let _epoch = self.evaluator.begin();
		let mut roots: IndexSet<NodeId> = IndexSet::from([root]);
		for part in &selector.parts {
			let engine = PartEngine::from_name(&part.name).ok_or_else(|| Error::UnknownEngine {
				engine: part.name.clone(),
				selector: stringify_selector(selector),
			})?;
			roots = match engine {
				PartEngine::Nth => query_nth(roots, part),
				PartEngine::And => {
					let and = self.query_all(&nested(part)?.parsed, root)?;
					and.into_iter().filter(|e| roots.contains(e)).collect()
				}
				PartEngine::Or => {
					let or = self.query_all(&nested(part)?.parsed, root)?;
					sort_in_dom_order(doc, roots.into_iter().chain(or)).into_iter().collect()
				}
				PartEngine::Layout(relation) => self.query_layout(relation, &roots, part, root)?,
				_ => {
					let mut next = IndexSet::new();
					for scope in &roots {
						next.extend(engines::query_engine_all(self, engine, part, *scope)?);
					}
					next
				}
			};
		}
		debug!(
			target = "pw_locator.dispatch",
			selector = %selector,
			matches = roots.len(),
			"query_all"
		);
		Ok(roots.into_iter().collect())
	}

	fn query_layout(
		&self,
		relation: SpatialRelation,
		roots: &IndexSet<NodeId>,
		part: &SelectorPart,
		original_root: NodeId,
	) -> Result<IndexSet<NodeId>> {
		let body = nested(part)?;
		let inner = self.query_all(&body.parsed, original_root)?;
		let mut scored: Vec<(NodeId, f64)> = roots
			.iter()
			.filter_map(|element| {
				element_score(self.doc, self.layout, relation, *element, &inner, body.distance)
					.map(|score| (*element, score))
			})
			.collect();
		scored.sort_by(|a, b| a.1.total_cmp(&b.1));
		Ok(scored.into_iter().map(|(element, _)| element).collect())
	}
}

fn nested(part: &SelectorPart) -> Result<&NestedSelectorBody> {
	part.nested_body()
		.ok_or_else(|| Error::engine(format!("\"{}\" engine expects a nested selector", part.name)))
}

/// `a >> *b >> c` becomes `a >> b >> internal:has="c"`.
fn capture_as_has(selector: &ParsedSelector, capture: usize) -> Result<ParsedSelector> {
	if selector.parts.iter().any(|part| part.name == "nth") {
		return Err(Error::Capture);
	}
	let split = (capture + 1).min(selector.parts.len());
	let (head, tail) = selector.parts.split_at(split);
	let mut parts = head.to_vec();
	if !tail.is_empty() {
		let parsed = ParsedSelector {
			parts: tail.to_vec(),
			capture: None,
		};
		parts.push(SelectorPart {
			name: "internal:has".to_string(),
			source: stringify_selector(&parsed),
			body: PartBody::Nested(Box::new(NestedSelectorBody {
				parsed,
				distance: None,
			})),
		});
	}
	Ok(ParsedSelector {
		parts,
		capture: None,
	})
}

/// `nth=N`: zero-based, negative counts from the end; anything unparsable
/// selects nothing.
fn query_nth(roots: IndexSet<NodeId>, part: &SelectorPart) -> IndexSet<NodeId> {
	let len = roots.len() as i64;
	let index = part
		.text_body()
		.and_then(|body| body.trim().parse::<f64>().ok())
		.filter(|n| n.is_finite())
		.map(|n| n.trunc() as i64)
		.map(|n| if n < 0 { len + n } else { n })
		.filter(|n| (0..len).contains(n));
	match index {
		Some(index) => roots.get_index(index as usize).copied().into_iter().collect(),
		None => IndexSet::new(),
	}
}
