//! Positional CSS path used when no semantic candidate is unique.

use pw_protocol::escape::css_escape;
use pw_protocol::parse_css;

use super::candidates::{
	CSS_FALLBACK_SCORE, Candidate, NTH_SCORE, SelectorToken, is_guid_like, make_selector_for_id,
};
use super::{Generator, InternalOptions};
use crate::dom::NodeId;
use crate::error::Result;
use crate::evaluator::QueryContext;

impl Generator<'_, '_> {
	/// Builds `a > b > c` bottom-up from `target`, stopping as soon as the
	/// path resolves to `target` first. At each level: id unless generated, then growing
	/// class prefixes, then tag with `:nth-child` when it is not the first
	/// of its tag.
	pub(super) fn css_fallback(&self, target: NodeId, internal: InternalOptions) -> Result<Candidate> {
		let doc = self.selectors.doc;
		let mut tokens: Vec<String> = Vec::new();

		let mut current = Some(target);
		while let Some(element) = current.filter(|e| *e != self.scope) {
			let node_name = doc.tag_name(element).to_string();
			let mut best_token_for_level = String::new();

			let id = doc.element_id(element);
			if !id.is_empty() && !internal.no_css_id && !is_guid_like(id) {
				let token = make_selector_for_id(id);
				if let Some(selector) = self.unique_css_selector(target, &tokens, Some(&token))? {
					return self.make_strict(target, selector);
				}
				best_token_for_level = token;
			}

			let parent = doc.parent_node(element);

			let classes: Vec<&str> = doc.class_list(element).collect();
			for i in 0..classes.len() {
				let escaped: Vec<String> = classes[..=i].iter().map(|c| css_escape(c)).collect();
				let token = format!(".{}", escaped.join("."));
				if let Some(selector) = self.unique_css_selector(target, &tokens, Some(&token))? {
					return self.make_strict(target, selector);
				}
				// A class subset that is unique below the parent still pins the level.
				if best_token_for_level.is_empty() {
					if let Some(parent) = parent {
						if self.count_light(parent, &token) == 1 {
							best_token_for_level = token;
						}
					}
				}
			}

			if let Some(parent) = parent {
				let siblings: Vec<NodeId> = doc.element_children(parent).collect();
				let first_of_tag = siblings
					.iter()
					.find(|sibling| doc.tag_name(**sibling) == node_name)
					.is_some_and(|first| *first == element);
				let token = if first_of_tag {
					css_escape(&node_name)
				} else {
					let position = siblings.iter().position(|s| *s == element).unwrap_or(0);
					format!("{}:nth-child({})", css_escape(&node_name), position + 1)
				};
				if let Some(selector) = self.unique_css_selector(target, &tokens, Some(&token))? {
					return self.make_strict(target, selector);
				}
				if best_token_for_level.is_empty() {
					best_token_for_level = token;
				}
			} else if best_token_for_level.is_empty() {
				best_token_for_level = css_escape(&node_name);
			}
			tokens.insert(0, best_token_for_level);
			current = doc.parent_element_or_shadow_host(element);
		}
		self.make_strict(target, tokens.join(" > "))
	}

	/// `prefix > tokens...` when its first match from the scope is `target`.
	fn unique_css_selector(
		&self,
		target: NodeId,
		tokens: &[String],
		prefix: Option<&str>,
	) -> Result<Option<String>> {
		let selector = prefix
			.into_iter()
			.map(str::to_string)
			.chain(tokens.iter().cloned())
			.collect::<Vec<_>>()
			.join(" > ");
		let parsed = self.selectors.parse_selector(&selector)?;
		let first = self.selectors.query(&parsed, self.scope)?;
		Ok((first == Some(target)).then_some(selector))
	}

	/// Native `parent.querySelectorAll(token).length`.
	fn count_light(&self, parent: NodeId, token: &str) -> usize {
		let Ok(css) = parse_css(token) else {
			return 0;
		};
		self.selectors
			.evaluator
			.query(QueryContext::light(parent), &css)
			.map_or(0, |found| found.len())
	}

	/// Adds `nth=` when `selector` matches more than the target.
	fn make_strict(&self, target: NodeId, selector: String) -> Result<Candidate> {
		let parsed = self.selectors.parse_selector(&selector)?;
		let elements = self.selectors.query_all(&parsed, self.scope)?;
		let token = SelectorToken::css(selector, CSS_FALLBACK_SCORE);
		if elements.len() == 1 {
			return Ok(vec![token]);
		}
		match elements.iter().position(|e| *e == target) {
			Some(index) => Ok(vec![token, SelectorToken::new("nth", index.to_string(), NTH_SCORE)]),
			None => Ok(vec![token]),
		}
	}
}
