//! Selector Evaluator: runs CSS chains and engine pseudo-classes against a
//! [`Document`].
//!
//! An [`Evaluator`] is a query session. Every intermediate result is memoized
//! while at least one [`CacheEpoch`] is alive; dropping the outermost guard
//! clears all tables. Public entry points open their own epoch, so callers
//! only need [`Evaluator::begin`] to share caches across several queries.

mod engines;
mod sort;

#[cfg(test)]
mod tests;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use pw_protocol::{Combinator, CompoundSelector, CssComplexSelector, CssFunctionArgument, CssSimpleSelector};
use tracing::trace;

pub use engines::{CSS_ENGINES, CssEngine};
pub use sort::sort_in_dom_order;

use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::text::TextCache;

/// Where a query runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryContext {
	/// Document, element or shadow root whose subtree is searched. The scope
	/// itself never matches.
	pub scope: NodeId,
	/// Descend into open and closed shadow roots.
	pub pierce_shadow: bool,
	/// Scope before `:scope` promoted it to its parent.
	pub original_scope: Option<NodeId>,
}

impl QueryContext {
	pub fn new(scope: NodeId) -> Self {
		Self {
			scope,
			pierce_shadow: true,
			original_scope: None,
		}
	}

	pub fn light(scope: NodeId) -> Self {
		Self {
			pierce_shadow: false,
			..Self::new(scope)
		}
	}
}

type Elements = Rc<Vec<NodeId>>;
type Table<K, V> = RefCell<HashMap<K, V>>;

#[derive(Default)]
struct Memo {
	query_css: Table<(String, QueryContext), Elements>,
	matches: Table<(NodeId, String, QueryContext), bool>,
	query: Table<(String, QueryContext), Elements>,
	matches_simple: Table<(NodeId, String, QueryContext), bool>,
	matches_parents: Table<(NodeId, String, usize, QueryContext), bool>,
	call_matches: Table<(NodeId, CssEngine, QueryContext, String), bool>,
	call_query: Table<(CssEngine, QueryContext, String), Elements>,
	query_simple: Table<(String, QueryContext), Elements>,
	text: TextCache,
	retain: Cell<usize>,
}

impl Memo {
	fn clear(&self) {
		self.query_css.borrow_mut().clear();
		self.matches.borrow_mut().clear();
		self.query.borrow_mut().clear();
		self.matches_simple.borrow_mut().clear();
		self.matches_parents.borrow_mut().clear();
		self.call_matches.borrow_mut().clear();
		self.call_query.borrow_mut().clear();
		self.query_simple.borrow_mut().clear();
		self.text.clear();
	}
}

/// Keeps the evaluator caches alive; the outermost guard clears them on drop.
#[must_use = "caches are released as soon as the epoch is dropped"]
pub struct CacheEpoch<'e> {
	memo: &'e Memo,
}

impl Drop for CacheEpoch<'_> {
	fn drop(&mut self) {
		let depth = self.memo.retain.get().saturating_sub(1);
		self.memo.retain.set(depth);
		if depth == 0 {
			self.memo.clear();
			trace!(target = "pw_locator.evaluator", "cache epoch closed");
		}
	}
}

fn cached<K, V, F>(table: &Table<K, V>, key: K, compute: F) -> Result<V>
where
	K: Eq + Hash,
	V: Clone,
	F: FnOnce() -> Result<V>,
{
	let hit = table.borrow().get(&key).cloned();
	if let Some(value) = hit {
		return Ok(value);
	}
	let value = compute()?;
	table.borrow_mut().insert(key, value.clone());
	Ok(value)
}

fn args_key(args: &[CssFunctionArgument]) -> String {
	args.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join(", ")
}

fn list_key(selectors: &[&CssComplexSelector]) -> String {
	selectors
		.iter()
		.map(|s| s.text())
		.collect::<Vec<_>>()
		.join(", ")
}

/// Query session over one document.
pub struct Evaluator<'a> {
	doc: &'a Document,
	layout: &'a dyn Layout,
	memo: Memo,
	score_map: RefCell<Option<HashMap<NodeId, f64>>>,
}

impl<'a> Evaluator<'a> {
	pub fn new(doc: &'a Document, layout: &'a dyn Layout) -> Self {
		debug_assert!(engines::names_in_sync(), "CSS engine table out of sync with the parser");
		Self {
			doc,
			layout,
			memo: Memo::default(),
			score_map: RefCell::new(None),
		}
	}

	pub fn document(&self) -> &'a Document {
		self.doc
	}

	pub fn layout(&self) -> &'a dyn Layout {
		self.layout
	}

	/// Opens a cache epoch. Nested epochs share the outermost one's tables.
	pub fn begin(&self) -> CacheEpoch<'_> {
		self.memo.retain.set(self.memo.retain.get() + 1);
		CacheEpoch { memo: &self.memo }
	}

	/// Element text memo, valid for the current epoch.
	pub fn text_cache(&self) -> &TextCache {
		&self.memo.text
	}

	/// Elements matching any selector of the list, in document order when the
	/// list has more than one entry.
	pub fn query(&self, ctx: QueryContext, selector: &[CssComplexSelector]) -> Result<Vec<NodeId>> {
		let _epoch = self.begin();
		let selectors: Vec<&CssComplexSelector> = selector.iter().collect();
		Ok(self.query_selectors(ctx, &selectors)?.to_vec())
	}

	pub fn matches(&self, element: NodeId, selector: &[CssComplexSelector], ctx: QueryContext) -> Result<bool> {
		let _epoch = self.begin();
		let selectors: Vec<&CssComplexSelector> = selector.iter().collect();
		self.matches_selectors(element, &selectors, ctx)
	}

	/// `:is(...)` semantics over a list.
	fn query_selectors(&self, ctx: QueryContext, selectors: &[&CssComplexSelector]) -> Result<Elements> {
		if selectors.is_empty() {
			return Err(Error::engine("\"is\" engine expects non-empty selector list"));
		}
		if let [single] = selectors {
			return self.query_complex(ctx, single);
		}
		cached(&self.memo.query, (list_key(selectors), ctx), || {
			let mut elements = Vec::new();
			for selector in selectors {
				elements.extend(self.query_complex(ctx, selector)?.iter().copied());
			}
			Ok(Rc::new(sort_in_dom_order(self.doc, elements)))
		})
	}

	fn matches_selectors(&self, element: NodeId, selectors: &[&CssComplexSelector], ctx: QueryContext) -> Result<bool> {
		if selectors.is_empty() {
			return Err(Error::engine("\"is\" engine expects non-empty selector list"));
		}
		for selector in selectors {
			if self.matches_complex(element, selector, ctx)? {
				return Ok(true);
			}
		}
		Ok(false)
	}

	fn query_complex(&self, ctx: QueryContext, complex: &CssComplexSelector) -> Result<Elements> {
		cached(&self.memo.query, (complex.text().to_string(), ctx), || {
			let simples = complex.simples();
			let Some(last) = simples.last() else {
				return Err(Error::engine(format!("Malformed selector \"{complex}\"")));
			};
			let ctx = if complex.has_function("scope") {
				self.expand_context_for_scope_matching(ctx)
			} else {
				ctx
			};

			// Nested queries get their own score map.
			let previous = self.score_map.replace(Some(HashMap::new()));
			let filtered = self.query_simple(ctx, &last.selector).and_then(|candidates| {
				let mut elements = Vec::with_capacity(candidates.len());
				for &element in candidates.iter() {
					if self.matches_parents(element, complex, simples.len().checked_sub(2), ctx)? {
						elements.push(element);
					}
				}
				Ok(elements)
			});
			let scores = self.score_map.replace(previous);
			let mut elements = filtered?;

			if let Some(scores) = scores.filter(|s| !s.is_empty()) {
				elements.sort_by(|a, b| match (scores.get(a), scores.get(b)) {
					(Some(a), Some(b)) => a.total_cmp(b),
					(None, Some(_)) => std::cmp::Ordering::Greater,
					(Some(_), None) => std::cmp::Ordering::Less,
					(None, None) => std::cmp::Ordering::Equal,
				});
			}
			Ok(Rc::new(elements))
		})
	}

	fn matches_complex(&self, element: NodeId, complex: &CssComplexSelector, ctx: QueryContext) -> Result<bool> {
		cached(&self.memo.matches, (element, complex.text().to_string(), ctx), || {
			let simples = complex.simples();
			let Some(last) = simples.last() else {
				return Err(Error::engine(format!("Malformed selector \"{complex}\"")));
			};
			let ctx = if complex.has_function("scope") {
				self.expand_context_for_scope_matching(ctx)
			} else {
				ctx
			};
			if !self.matches_simple(element, &last.selector, ctx)? {
				return Ok(false);
			}
			self.matches_parents(element, complex, simples.len().checked_sub(2), ctx)
		})
	}

	/// `:scope` must be able to match the scope itself, so the search moves
	/// up one level and remembers where it started.
	fn expand_context_for_scope_matching(&self, ctx: QueryContext) -> QueryContext {
		if !self.doc.is_element(ctx.scope) {
			return ctx;
		}
		let Some(parent) = self.doc.parent_element_or_shadow_host(ctx.scope) else {
			return ctx;
		};
		QueryContext {
			scope: parent,
			original_scope: ctx.original_scope.or(Some(ctx.scope)),
			..ctx
		}
	}

	fn matches_simple(&self, element: NodeId, simple: &CssSimpleSelector, ctx: QueryContext) -> Result<bool> {
		cached(&self.memo.matches_simple, (element, simple.text().to_string(), ctx), || {
			if element == ctx.scope {
				return Ok(false);
			}
			if let Some(css) = simple.css() {
				if !self.doc.matches_compound(element, css) {
					return Ok(false);
				}
			}
			for function in simple.functions() {
				let engine = CssEngine::from_name(&function.name)?;
				if !self.matches_engine(engine, element, &function.args, ctx)? {
					return Ok(false);
				}
			}
			Ok(true)
		})
	}

	fn query_simple(&self, ctx: QueryContext, simple: &CssSimpleSelector) -> Result<Elements> {
		if simple.functions().is_empty() {
			return Ok(self.query_css(ctx, simple.css()));
		}
		cached(&self.memo.query_simple, (simple.text().to_string(), ctx), || {
			let functions = simple.functions();
			let engines = functions
				.iter()
				.map(|f| CssEngine::from_name(&f.name))
				.collect::<Result<Vec<_>>>()?;

			let (mut elements, first) = match simple.css().filter(|css| !css.is_universal()) {
				Some(css) => (self.query_css(ctx, Some(css)).to_vec(), None),
				None => {
					let first = engines.iter().position(|e| e.can_query()).unwrap_or(0);
					let elements = self.query_engine(engines[first], ctx, &functions[first].args)?;
					(elements.to_vec(), Some(first))
				}
			};

			// Engines with a `matches` predicate filter first; query-only
			// engines are checked by membership afterwards.
			for matchers_pass in [true, false] {
				for (i, function) in functions.iter().enumerate() {
					if Some(i) == first || engines[i].can_match() != matchers_pass {
						continue;
					}
					let mut kept = Vec::with_capacity(elements.len());
					for element in elements {
						if self.matches_engine(engines[i], element, &function.args, ctx)? {
							kept.push(element);
						}
					}
					elements = kept;
				}
			}
			Ok(Rc::new(elements))
		})
	}

	fn matches_parents(
		&self,
		element: NodeId,
		complex: &CssComplexSelector,
		index: Option<usize>,
		ctx: QueryContext,
	) -> Result<bool> {
		let Some(index) = index else {
			return Ok(true);
		};
		let key = (element, complex.text().to_string(), index, ctx);
		cached(&self.memo.matches_parents, key, || {
			let simples = complex.simples();
			let simple = &simples[index].selector;
			let previous_combinator = index.checked_sub(1).map(|i| simples[i].combinator);
			let next_index = index.checked_sub(1);

			match simples[index].combinator {
				Combinator::Child => {
					let Some(parent) = self.parent_in_context(element, ctx) else {
						return Ok(false);
					};
					Ok(self.matches_simple(parent, simple, ctx)?
						&& self.matches_parents(parent, complex, next_index, ctx)?)
				}
				Combinator::NextSibling => {
					let Some(sibling) = self.previous_sibling_in_context(element, ctx) else {
						return Ok(false);
					};
					Ok(self.matches_simple(sibling, simple, ctx)?
						&& self.matches_parents(sibling, complex, next_index, ctx)?)
				}
				Combinator::Descendant | Combinator::SelfOrAncestor => {
					let mut current = if simples[index].combinator == Combinator::SelfOrAncestor {
						Some(element)
					} else {
						self.parent_in_context(element, ctx)
					};
					while let Some(ancestor) = current {
						if self.matches_simple(ancestor, simple, ctx)? {
							if self.matches_parents(ancestor, complex, next_index, ctx)? {
								return Ok(true);
							}
							if previous_combinator == Some(Combinator::Descendant) {
								break;
							}
						}
						current = self.parent_in_context(ancestor, ctx);
					}
					Ok(false)
				}
				Combinator::SubsequentSibling => {
					let mut current = self.previous_sibling_in_context(element, ctx);
					while let Some(sibling) = current {
						if self.matches_simple(sibling, simple, ctx)? {
							if self.matches_parents(sibling, complex, next_index, ctx)? {
								return Ok(true);
							}
							if previous_combinator == Some(Combinator::SubsequentSibling) {
								break;
							}
						}
						current = self.previous_sibling_in_context(sibling, ctx);
					}
					Ok(false)
				}
			}
		})
	}

	fn parent_in_context(&self, element: NodeId, ctx: QueryContext) -> Option<NodeId> {
		if element == ctx.scope {
			return None;
		}
		if !ctx.pierce_shadow {
			return self.doc.parent_element(element);
		}
		self.doc.parent_element_or_shadow_host(element)
	}

	fn previous_sibling_in_context(&self, element: NodeId, ctx: QueryContext) -> Option<NodeId> {
		if element == ctx.scope {
			return None;
		}
		self.doc.previous_element_sibling(element)
	}

	fn matches_engine(
		&self,
		engine: CssEngine,
		element: NodeId,
		args: &[CssFunctionArgument],
		ctx: QueryContext,
	) -> Result<bool> {
		if engine.can_match() {
			return self.call_matches(engine, element, args, ctx);
		}
		Ok(self.call_query(engine, args, ctx)?.contains(&element))
	}

	fn query_engine(&self, engine: CssEngine, ctx: QueryContext, args: &[CssFunctionArgument]) -> Result<Elements> {
		if engine.can_query() {
			return self.call_query(engine, args, ctx);
		}
		let all = self.query_css(ctx, None);
		let mut elements = Vec::new();
		for &element in all.iter() {
			if self.call_matches(engine, element, args, ctx)? {
				elements.push(element);
			}
		}
		Ok(Rc::new(elements))
	}

	fn call_matches(
		&self,
		engine: CssEngine,
		element: NodeId,
		args: &[CssFunctionArgument],
		ctx: QueryContext,
	) -> Result<bool> {
		cached(&self.memo.call_matches, (element, engine, ctx, args_key(args)), || {
			engines::matches(self, engine, element, args, ctx)
		})
	}

	fn call_query(&self, engine: CssEngine, args: &[CssFunctionArgument], ctx: QueryContext) -> Result<Elements> {
		cached(&self.memo.call_query, (engine, ctx, args_key(args)), || {
			engines::query(self, engine, ctx, args).map(Rc::new)
		})
	}

	/// Elements under the scope matching a native compound selector (all
	/// elements for `None`): light tree first, then each shadow root.
	pub(crate) fn query_css(&self, ctx: QueryContext, css: Option<&CompoundSelector>) -> Elements {
		let key = (css.map_or_else(|| "*".to_string(), ToString::to_string), ctx);
		let hit = self.memo.query_css.borrow().get(&key).cloned();
		if let Some(elements) = hit {
			return elements;
		}
		let mut result = Vec::new();
		self.collect_css(ctx.scope, css, ctx.pierce_shadow, &mut result);
		let result = Rc::new(result);
		self.memo.query_css.borrow_mut().insert(key, Rc::clone(&result));
		result
	}

	fn collect_css(&self, root: NodeId, css: Option<&CompoundSelector>, pierce: bool, out: &mut Vec<NodeId>) {
		let doc = self.doc;
		let descendants: Vec<NodeId> = doc.descendant_elements(root).collect();
		out.extend(
			descendants
				.iter()
				.copied()
				.filter(|e| css.is_none_or(|css| doc.matches_compound(*e, css))),
		);
		if !pierce {
			return;
		}
		if let Some(shadow) = doc.shadow_root(root) {
			self.collect_css(shadow, css, pierce, out);
		}
		for element in descendants {
			if let Some(shadow) = doc.shadow_root(element) {
				self.collect_css(shadow, css, pierce, out);
			}
		}
	}

	/// Records a proximity score for the innermost running query.
	pub(crate) fn mark_score(&self, element: NodeId, score: f64) {
		if let Some(scores) = self.score_map.borrow_mut().as_mut() {
			scores.insert(element, score);
		}
	}
}
