//! Locator Generator: the cheapest selector that re-identifies an element.
//!
//! Every element yields scored candidates (test ids, roles with accessible
//! names, labels, text, ids, tags). Candidates are verified against the
//! Query Dispatcher in score order, optionally scoped by one ancestor's own
//! best candidate, and an `nth=` suffix is accepted as a last resort for the
//! target itself. When nothing semantic is unique, a positional CSS path is
//! emitted instead.
//!
//! Scores are costs: lower is better. A chain of tokens is scored by
//! weighting each token with its distance from the end, so an expensive
//! token is cheaper as the last hop than as the first.

mod candidates;
mod fallback;
mod icons;


use std::cell::RefCell;
use std::collections::HashMap;

use indexmap::IndexSet;
use serde::Serialize;
use tracing::debug;

pub use candidates::is_guid_like;
pub use icons::IconPolicy;

use self::candidates::{Candidate, NTH_SCORE, SelectorToken, filter_regex_tokens, has_css_id_token};
use crate::dispatch::Selectors;
use crate::dom::NodeId;
use crate::error::{Error, Result};

/// Widest match set that still earns an `nth=` suffix.
const MAX_NTH_MATCHES: usize = 5;

/// Ceiling for an ancestor's selector in text-assertion mode.
const TEXT_EXPECT_MAX_SCORE: u64 = 1000;

/// Options for [`Selectors::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
	/// Attribute emitted through `internal:testid`.
	pub test_id_attribute_name: String,
	/// Drop every candidate that needs an `internal:` engine, text ones included.
	///
	/// The test id is still used, emitted as a plain CSS attribute selector
	/// (`[data-testid="x"]`) rather than being dropped.
	pub omit_internal_engines: bool,
	/// Generate relative to this element; the target must lie inside it.
	pub root: Option<NodeId>,
	/// Pick the nearest ancestor that can carry a text assertion.
	pub for_text_expect: bool,
	/// Also return text-free and id-free variants.
	pub multiple: bool,
	pub icons: IconPolicy,
}

impl Default for GenerateOptions {
	fn default() -> Self {
		Self {
			test_id_attribute_name: "data-testid".to_string(),
			omit_internal_engines: false,
			root: None,
			for_text_expect: false,
			multiple: false,
			icons: IconPolicy::default(),
		}
	}
}

/// Output of [`Selectors::generate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSelector {
	/// Best selector; always `selectors[0]`.
	pub selector: String,
	/// Distinct variants, best first. One entry unless `multiple` was set.
	pub selectors: Vec<String>,
	/// What `selector` matches from the root, re-queried after generation.
	pub elements: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct InternalOptions {
	pub no_text: bool,
	pub no_css_id: bool,
}

/// One `generate_selector_for` search.
#[derive(Debug, Clone, Copy)]
struct Search {
	target: NodeId,
	internal: InternalOptions,
}

/// Best tokens per element, split by whether text candidates were allowed.
#[derive(Default)]
struct TokenCache {
	allow_text: HashMap<NodeId, Option<Candidate>>,
	disallow_text: HashMap<NodeId, Option<Candidate>>,
}

impl TokenCache {
	fn map(&mut self, allow_text: bool) -> &mut HashMap<NodeId, Option<Candidate>> {
		if allow_text { &mut self.allow_text } else { &mut self.disallow_text }
	}

	fn clear(&mut self) {
		self.allow_text.clear();
		self.disallow_text.clear();
	}
}

pub(crate) struct Generator<'s, 'a> {
	selectors: &'s Selectors<'a>,
	options: &'s GenerateOptions,
	/// Query root for verification: the requested root or the document.
	scope: NodeId,
	cache: RefCell<TokenCache>,
}

impl<'a> Selectors<'a> {
	/// Synthesizes a selector that resolves to `target` (or its interactive
	/// ancestor) from `options.root`, or from the document.
	pub fn generate(&self, target: NodeId, options: &GenerateOptions) -> Result<GeneratedSelector> {
		let _epoch = self.evaluator.begin();
		let generator = Generator {
			selectors: self,
			options,
			scope: options.root.unwrap_or_else(|| self.doc.root()),
			cache: RefCell::new(TokenCache::default()),
		};

		let selectors = if options.for_text_expect {
			vec![join_tokens(&generator.text_expect_tokens(target)?)]
		} else {
			let target = generator.retarget(target);
			if options.multiple {
				generator.multiple_variants(target)?
			} else {
				let plain = InternalOptions::default();
				let tokens = match generator.generate_selector_for(target, plain)? {
					Some(tokens) => tokens,
					None => generator.css_fallback(target, plain)?,
				};
				vec![join_tokens(&tokens)]
			}
		};

		let selector = selectors.first().cloned().unwrap_or_default();
		let parsed = self.parse_selector(&selector)?;
		let elements = self.query_all(&parsed, generator.scope)?;
		debug!(
			target = "pw_locator.generator",
			%selector,
			variants = selectors.len(),
			matches = elements.len(),
			"generated selector"
		);
		Ok(GeneratedSelector {
			selector,
			selectors,
			elements,
		})
	}
}

impl Generator<'_, '_> {
	/// Moves a click target onto its visible interactive ancestor.
	fn retarget(&self, target: NodeId) -> NodeId {
		let doc = self.selectors.doc;
		if matches!(doc.tag_name(target), "input" | "textarea" | "select") || doc.is_content_editable(target) {
			return target;
		}
		let interactive = |element: NodeId| {
			matches!(doc.tag_name(element), "button" | "select" | "input" | "a")
				|| matches!(doc.attribute(element, "role"), Some("button" | "checkbox" | "radio" | "link"))
		};
		match doc.closest_cross_shadow(target, self.options.root, interactive) {
			Some(parent) if self.selectors.layout.is_visible(doc, parent) => {
				if parent != target {
					debug!(target = "pw_locator.generator", from = %target, to = %parent, "retargeted");
				}
				parent
			}
			_ => target,
		}
	}

	/// Nearest inclusive ancestor whose text-free selector is cheap enough,
	/// else the CSS path of `<html>`.
	fn text_expect_tokens(&self, target: NodeId) -> Result<Candidate> {
		let doc = self.selectors.doc;
		let internal = InternalOptions {
			no_text: true,
			no_css_id: false,
		};
		let mut current = Some(target);
		while let Some(element) = current {
			if let Some(tokens) = self.generate_selector_for(element, internal)? {
				if combine_scores(&tokens) <= TEXT_EXPECT_MAX_SCORE {
					return Ok(tokens);
				}
			}
			if Some(element) == self.options.root {
				break;
			}
			current = doc.parent_element_or_shadow_host(element);
		}
		match doc.document_element() {
			Some(html) => self.css_fallback(html, InternalOptions::default()),
			None => Ok(vec![SelectorToken::css("html", 1)]),
		}
	}

	fn multiple_variants(&self, target: NodeId) -> Result<Vec<String>> {
		let with_text = self.generate_selector_for(target, InternalOptions::default())?;
		let without_text = self.generate_selector_for(
			target,
			InternalOptions {
				no_text: true,
				no_css_id: false,
			},
		)?;
		let mut variants = Vec::new();
		if with_text.as_deref().is_some_and(has_css_id_token) {
			variants.push(self.generate_selector_for(
				target,
				InternalOptions {
					no_text: false,
					no_css_id: true,
				},
			)?);
		}
		if without_text.as_deref().is_some_and(has_css_id_token) {
			variants.push(self.generate_selector_for(
				target,
				InternalOptions {
					no_text: true,
					no_css_id: true,
				},
			)?);
		}
		let mut tokens: Vec<Candidate> = [with_text, without_text]
			.into_iter()
			.chain(variants)
			.flatten()
			.collect();
		if tokens.is_empty() {
			let css = self.css_fallback(target, InternalOptions::default())?;
			let id_free = has_css_id_token(&css);
			tokens.push(css);
			if id_free {
				tokens.push(self.css_fallback(
					target,
					InternalOptions {
						no_text: false,
						no_css_id: true,
					},
				)?);
			}
		}
		let unique: IndexSet<String> = tokens.iter().map(|t| join_tokens(t)).collect();
		Ok(unique.into_iter().collect())
	}

	/// Best semantic tokens for `target`, or `None` when only the CSS
	/// fallback would do.
	fn generate_selector_for(&self, target: NodeId, internal: InternalOptions) -> Result<Option<Candidate>> {
		let doc = self.selectors.doc;
		if let Some(root) = self.options.root {
			if !doc.is_inside_scope(root, target) {
				return Err(Error::TargetOutsideRoot);
			}
		}
		if Some(target) == self.options.root {
			return Ok(Some(vec![SelectorToken::css(":scope", 1)]));
		}
		if Some(target) == doc.document_element() {
			return Ok(Some(vec![SelectorToken::css("html", 1)]));
		}
		// Cached tokens depend on the target and the internal options.
		self.cache.borrow_mut().clear();
		let search = Search { target, internal };
		let tokens = self.calculate_cached(search, target, !internal.no_text)?;
		debug!(
			target = "pw_locator.generator",
			element = %target,
			no_text = internal.no_text,
			no_css_id = internal.no_css_id,
			found = tokens.is_some(),
			"searched candidates"
		);
		Ok(tokens)
	}

	fn calculate_cached(&self, search: Search, element: NodeId, allow_text: bool) -> Result<Option<Candidate>> {
		let hit = self.cache.borrow_mut().map(allow_text).get(&element).cloned();
		if let Some(tokens) = hit {
			return Ok(tokens);
		}
		let tokens = self.calculate(search, element, allow_text)?;
		self.cache
			.borrow_mut()
			.map(allow_text)
			.insert(element, tokens.clone());
		Ok(tokens)
	}

	fn calculate(&self, search: Search, element: NodeId, allow_text: bool) -> Result<Option<Candidate>> {
		let is_target = element == search.target;
		let allow_nth = is_target;
		let omit_internal = self.options.omit_internal_engines;

		let mut text_candidates = if allow_text {
			self.build_text_candidates(element, is_target)
		} else {
			Vec::new()
		};
		if omit_internal {
			text_candidates.retain(|c| !c.iter().any(|t| t.engine.starts_with("internal:")));
		}
		if !is_target {
			filter_regex_tokens(&mut text_candidates);
		}
		let no_text_candidates: Vec<Candidate> = self
			.build_no_text_candidates(element, search.internal)
			.into_iter()
			.filter(|t| !omit_internal || !t.engine.starts_with("internal:"))
			.map(|t| vec![t])
			.collect();

		let all: Vec<Candidate> = text_candidates
			.iter()
			.chain(&no_text_candidates)
			.cloned()
			.collect();
		let mut result = self.choose_first_selector(self.scope, element, &all, allow_nth)?;

		// Regex candidates never go under a parent scope.
		filter_regex_tokens(&mut text_candidates);

		// Only the target itself searches its ancestors, so at most one
		// ancestor hop precedes any candidate.
		if is_target {
			self.check_with_text(search, element, allow_text, &text_candidates, &no_text_candidates, &mut result)?;
			if !text_candidates.is_empty() {
				self.check_with_text(search, element, allow_text, &[], &no_text_candidates, &mut result)?;
			}
		}
		Ok(result)
	}

	/// Tries `parent_tokens + candidate` for every ancestor, keeping the
	/// result whenever the combination is cheaper.
	fn check_with_text(
		&self,
		search: Search,
		element: NodeId,
		allow_text: bool,
		text_candidates: &[Candidate],
		no_text_candidates: &[Candidate],
		result: &mut Option<Candidate>,
	) -> Result<()> {
		let doc = self.selectors.doc;
		let allow_parent_text = allow_text && text_candidates.is_empty();
		let candidates: Vec<Candidate> = text_candidates
			.iter()
			.chain(no_text_candidates)
			.filter(|c| {
				result
					.as_deref()
					.is_none_or(|best| combine_scores(c) < combine_scores(best))
			})
			.cloned()
			.collect();
		let Some(mut best_possible_in_parent) = candidates.first().cloned() else {
			return Ok(());
		};

		let mut parent = doc.parent_element_or_shadow_host(element);
		while let Some(current) = parent.filter(|p| Some(*p) != self.options.root) {
			parent = doc.parent_element_or_shadow_host(current);
			let Some(parent_tokens) = self.calculate_cached(search, current, allow_parent_text)? else {
				continue;
			};
			// Lower bound: the cheapest candidate under this parent.
			if let Some(best) = result.as_deref() {
				if combine_scores(&concat(&parent_tokens, &best_possible_in_parent)) >= combine_scores(best) {
					continue;
				}
			}
			match self.choose_first_selector(current, element, &candidates, search.target == element)? {
				Some(best) => best_possible_in_parent = best,
				None => return Ok(()),
			}
			let combined = concat(&parent_tokens, &best_possible_in_parent);
			if result
				.as_deref()
				.is_none_or(|best| combine_scores(&combined) < combine_scores(best))
			{
				*result = Some(combined);
			}
		}
		Ok(())
	}

	/// Cheapest candidate that resolves to exactly `target` from `scope`. With
	/// `allow_nth`, the first candidate matching at most a handful of elements
	/// including `target` is kept with an `nth=` suffix as a fallback.
	fn choose_first_selector(
		&self,
		scope: NodeId,
		target: NodeId,
		candidates: &[Candidate],
		allow_nth: bool,
	) -> Result<Option<Candidate>> {
		let mut sorted: Vec<(u64, &Candidate)> = candidates.iter().map(|c| (combine_scores(c), c)).collect();
		sorted.sort_by_key(|(score, _)| *score);

		let mut best_with_index: Option<Candidate> = None;
		for (_, tokens) in sorted {
			let parsed = self.selectors.parse_selector(&join_tokens(tokens))?;
			let found = self.selectors.query_all(&parsed, scope)?;
			if found.len() == 1 && found[0] == target {
				return Ok(Some(tokens.clone()));
			}
			if !allow_nth || best_with_index.is_some() || found.len() > MAX_NTH_MATCHES {
				continue;
			}
			if let Some(index) = found.iter().position(|e| *e == target) {
				let mut with_nth = tokens.clone();
				with_nth.push(SelectorToken::new("nth", index.to_string(), NTH_SCORE));
				best_with_index = Some(with_nth);
			}
		}
		Ok(best_with_index)
	}
}

fn concat(head: &[SelectorToken], tail: &[SelectorToken]) -> Candidate {
	head.iter().chain(tail).cloned().collect()
}

/// Adjacent CSS tokens join with a space (descendant combinator); anything
/// else is chained with `>>`.
fn join_tokens(tokens: &[SelectorToken]) -> String {
	let mut parts: Vec<String> = Vec::new();
	let mut last_engine = "";
	for token in tokens {
		if !parts.is_empty()
			&& (last_engine != "css" || token.engine != "css" || token.selector.starts_with(":nth-match("))
		{
			parts.push(">>".to_string());
		}
		last_engine = token.engine;
		if token.engine == "css" {
			parts.push(token.selector.clone());
		} else {
			parts.push(format!("{}={}", token.engine, token.selector));
		}
	}
	parts.join(" ")
}

/// Each token weighted by its distance from the end of the chain.
fn combine_scores(tokens: &[SelectorToken]) -> u64 {
	let len = tokens.len() as u64;
	tokens
		.iter()
		.enumerate()
		.map(|(i, token)| u64::from(token.score) * (len - i as u64))
		.sum()
}
