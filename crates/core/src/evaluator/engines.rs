//! Engine pseudo-classes usable inside CSS: `:has()`, `:text()`, `:near()`...

use pw_protocol::{CUSTOM_CSS_NAMES, CssComplexSelector, CssFunctionArgument, RegexLiteral};

use super::{Evaluator, QueryContext, sort_in_dom_order};
use crate::dom::NodeId;
use crate::error::{Error, Result};
use crate::spatial::{SpatialRelation, element_score};
use crate::text::{TextMatch, TextMatcher, element_matches_text, element_text, should_skip_for_text_matching};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CssEngine {
	Not,
	Is,
	Where,
	Has,
	Scope,
	Light,
	Visible,
	Text,
	TextIs,
	TextMatches,
	HasText,
	RightOf,
	LeftOf,
	Above,
	Below,
	Near,
	NthMatch,
}

/// Registered pseudo-class names. Must list exactly the parser's custom names.
pub const CSS_ENGINES: &[(&str, CssEngine)] = &[
	("not", CssEngine::Not),
	("is", CssEngine::Is),
	("where", CssEngine::Where),
	("has", CssEngine::Has),
	("scope", CssEngine::Scope),
	("light", CssEngine::Light),
	("visible", CssEngine::Visible),
	("text", CssEngine::Text),
	("text-is", CssEngine::TextIs),
	("text-matches", CssEngine::TextMatches),
	("has-text", CssEngine::HasText),
	("right-of", CssEngine::RightOf),
	("left-of", CssEngine::LeftOf),
	("above", CssEngine::Above),
	("below", CssEngine::Below),
	("near", CssEngine::Near),
	("nth-match", CssEngine::NthMatch),
];

pub(super) fn names_in_sync() -> bool {
	let mut registered: Vec<&str> = CSS_ENGINES.iter().map(|(name, _)| *name).collect();
	let mut parsed: Vec<&str> = CUSTOM_CSS_NAMES.to_vec();
	registered.sort_unstable();
	parsed.sort_unstable();
	registered == parsed
}

impl CssEngine {
	pub fn from_name(name: &str) -> Result<Self> {
		CSS_ENGINES
			.iter()
			.find(|(n, _)| *n == name)
			.map(|(_, engine)| *engine)
			.ok_or_else(|| Error::engine(format!("Unknown selector engine \"{name}\"")))
	}

	pub fn name(self) -> &'static str {
		CSS_ENGINES
			.iter()
			.find(|(_, engine)| *engine == self)
			.map_or("", |(name, _)| name)
	}

	/// Has an element predicate.
	pub fn can_match(self) -> bool {
		self != CssEngine::NthMatch
	}

	/// Can enumerate its matches directly.
	pub fn can_query(self) -> bool {
		matches!(
			self,
			CssEngine::Is | CssEngine::Where | CssEngine::Scope | CssEngine::Light | CssEngine::NthMatch
		)
	}

	fn spatial(self) -> Option<SpatialRelation> {
		match self {
			CssEngine::RightOf => Some(SpatialRelation::RightOf),
			CssEngine::LeftOf => Some(SpatialRelation::LeftOf),
			CssEngine::Above => Some(SpatialRelation::Above),
			CssEngine::Below => Some(SpatialRelation::Below),
			CssEngine::Near => Some(SpatialRelation::Near),
			_ => None,
		}
	}
}

fn selectors(args: &[CssFunctionArgument]) -> Result<Vec<&CssComplexSelector>> {
	args.iter()
		.map(|arg| match arg {
			CssFunctionArgument::Selector(selector) => Ok(selector),
			other => Err(Error::engine(format!("Malformed selector \"{other}\""))),
		})
		.collect()
}

fn single_string<'a>(engine: CssEngine, args: &'a [CssFunctionArgument]) -> Result<&'a str> {
	match args {
		[CssFunctionArgument::String(text)] => Ok(text),
		_ => Err(Error::engine(format!("\"{}\" engine expects a single string", engine.name()))),
	}
}

fn expect_no_args(engine: CssEngine, args: &[CssFunctionArgument]) -> Result<()> {
	if args.is_empty() {
		return Ok(());
	}
	Err(Error::engine(format!("\"{}\" engine expects no arguments", engine.name())))
}

fn expect_selector_list(engine: CssEngine, args: &[CssFunctionArgument]) -> Result<()> {
	if !args.is_empty() {
		return Ok(());
	}
	let name = match engine {
		CssEngine::Where => "is",
		other => other.name(),
	};
	Err(Error::engine(format!("\"{name}\" engine expects non-empty selector list")))
}

/// `:scope` target: the document element for a document scope.
fn actual_scope(evaluator: &Evaluator<'_>, ctx: QueryContext) -> Option<NodeId> {
	let doc = evaluator.doc;
	let scope = ctx.original_scope.unwrap_or(ctx.scope);
	if doc.is_document(scope) {
		return doc.document_element();
	}
	doc.is_element(scope).then_some(scope)
}

pub(super) fn matches(
	evaluator: &Evaluator<'_>,
	engine: CssEngine,
	element: NodeId,
	args: &[CssFunctionArgument],
	ctx: QueryContext,
) -> Result<bool> {
	let doc = evaluator.doc;
	let cache = evaluator.text_cache();
	if let Some(relation) = engine.spatial() {
		return matches_spatial(evaluator, engine, relation, element, args, ctx);
	}
	match engine {
		CssEngine::Is | CssEngine::Where => {
			expect_selector_list(engine, args)?;
			evaluator.matches_selectors(element, &selectors(args)?, ctx)
		}
		CssEngine::Has => {
			expect_selector_list(engine, args)?;
			let inner = QueryContext { scope: element, ..ctx };
			Ok(!evaluator.query_selectors(inner, &selectors(args)?)?.is_empty())
		}
		CssEngine::Scope => {
			expect_no_args(engine, args)?;
			Ok(actual_scope(evaluator, ctx) == Some(element))
		}
		CssEngine::Not => {
			expect_selector_list(engine, args)?;
			Ok(!evaluator.matches_selectors(element, &selectors(args)?, ctx)?)
		}
		CssEngine::Light => {
			let light = QueryContext {
				pierce_shadow: false,
				..ctx
			};
			evaluator.matches_selectors(element, &selectors(args)?, light)
		}
		CssEngine::Visible => {
			expect_no_args(engine, args)?;
			Ok(evaluator.layout.is_visible(doc, element))
		}
		CssEngine::Text => {
			let matcher = TextMatcher::substring(single_string(engine, args)?);
			Ok(element_matches_text(doc, cache, element, &matcher) == TextMatch::SelfOnly)
		}
		CssEngine::TextIs => {
			let matcher = TextMatcher::immediate(single_string(engine, args)?);
			Ok(element_matches_text(doc, cache, element, &matcher) != TextMatch::None)
		}
		CssEngine::TextMatches => {
			let (source, flags) = match args {
				[CssFunctionArgument::String(source)] => (source.as_str(), ""),
				[CssFunctionArgument::String(source), CssFunctionArgument::String(flags)] => {
					(source.as_str(), flags.as_str())
				}
				_ => {
					return Err(Error::engine(
						"\"text-matches\" engine expects a regexp body and optional regexp flags",
					));
				}
			};
			let matcher = TextMatcher::Regex(RegexLiteral::new(source, flags)?);
			Ok(element_matches_text(doc, cache, element, &matcher) == TextMatch::SelfOnly)
		}
		CssEngine::HasText => {
			let matcher = TextMatcher::substring(single_string(engine, args)?);
			if should_skip_for_text_matching(doc, element) {
				return Ok(false);
			}
			Ok(matcher.matches(&element_text(doc, cache, element)))
		}
		_ => Err(Error::engine("Selector engine should implement \"matches\" or \"query\"")),
	}
}

fn matches_spatial(
	evaluator: &Evaluator<'_>,
	engine: CssEngine,
	relation: SpatialRelation,
	element: NodeId,
	args: &[CssFunctionArgument],
	ctx: QueryContext,
) -> Result<bool> {
	let (query_args, max_distance) = match args.split_last() {
		Some((CssFunctionArgument::Number(distance), rest)) => (rest, Some(*distance)),
		_ => (args, None),
	};
	if query_args.is_empty() {
		return Err(Error::engine(format!(
			"\"{}\" engine expects a selector list and optional maximum distance in pixels",
			engine.name()
		)));
	}
	let inner = evaluator.query_selectors(ctx, &selectors(query_args)?)?;
	let score = element_score(
		evaluator.doc,
		evaluator.layout,
		relation,
		element,
		&inner,
		max_distance,
	);
	match score {
		Some(score) => {
			evaluator.mark_score(element, score);
			Ok(true)
		}
		None => Ok(false),
	}
}

pub(super) fn query(
	evaluator: &Evaluator<'_>,
	engine: CssEngine,
	ctx: QueryContext,
	args: &[CssFunctionArgument],
) -> Result<Vec<NodeId>> {
	match engine {
		CssEngine::Is | CssEngine::Where => {
			expect_selector_list(engine, args)?;
			let list = selectors(args)?;
			let mut elements = Vec::new();
			for selector in &list {
				elements.extend(evaluator.query_complex(ctx, selector)?.iter().copied());
			}
			if list.len() == 1 {
				return Ok(elements);
			}
			Ok(sort_in_dom_order(evaluator.doc, elements))
		}
		CssEngine::Scope => {
			expect_no_args(engine, args)?;
			Ok(actual_scope(evaluator, ctx).into_iter().collect())
		}
		CssEngine::Light => {
			let light = QueryContext {
				pierce_shadow: false,
				..ctx
			};
			Ok(evaluator.query_selectors(light, &selectors(args)?)?.to_vec())
		}
		CssEngine::NthMatch => {
			let Some((last, rest)) = args.split_last().filter(|_| args.len() >= 2) else {
				return Err(Error::engine(
					"\"nth-match\" engine expects non-empty selector list and an index argument",
				));
			};
			let index = match last {
				CssFunctionArgument::Number(index) if *index >= 1.0 => *index as usize - 1,
				_ => {
					return Err(Error::engine(
						"\"nth-match\" engine expects a one-based index as the last argument",
					));
				}
			};
			let elements = query(evaluator, CssEngine::Is, ctx, rest)?;
			Ok(elements.get(index).copied().into_iter().collect())
		}
		_ => Err(Error::engine("Selector engine should implement \"matches\" or \"query\"")),
	}
}
