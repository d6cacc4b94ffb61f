//! Scored candidate tokens for one element.

use pw_protocol::RegexLiteral;
use pw_protocol::escape::{
	css_escape, escape_for_attribute_selector, escape_for_text_selector, escape_regex,
	escape_regex_for_selector, quote_css_attribute_value,
};

use super::icons::strip_icon_text;
use super::{Generator, InternalOptions};
use crate::aria::normalized_accessible_name;
use crate::dom::NodeId;
use crate::text::{element_labels, element_text};

// Lower is better.
const TEXT_SCORE_RANGE: u32 = 10;
const EXACT_PENALTY: u32 = TEXT_SCORE_RANGE / 2;

pub(super) const TEST_ID_SCORE: u32 = 1;
const OTHER_TEST_ID_SCORE: u32 = 2;
const IFRAME_BY_ATTRIBUTE_SCORE: u32 = 10;

const BEGIN_PENALIZED_SCORE: u32 = 50;
const ROLE_WITH_NAME_SCORE: u32 = 100;
const PLACEHOLDER_SCORE: u32 = 120;
const LABEL_SCORE: u32 = 140;
const ALT_TEXT_SCORE: u32 = 160;
const TEXT_SCORE: u32 = 180;
const TITLE_SCORE: u32 = 200;
const TEXT_SCORE_REGEX: u32 = 250;
const PLACEHOLDER_SCORE_EXACT: u32 = PLACEHOLDER_SCORE + EXACT_PENALTY;
const LABEL_SCORE_EXACT: u32 = LABEL_SCORE + EXACT_PENALTY;
const ROLE_WITH_NAME_SCORE_EXACT: u32 = ROLE_WITH_NAME_SCORE + EXACT_PENALTY;
const ALT_TEXT_SCORE_EXACT: u32 = ALT_TEXT_SCORE + EXACT_PENALTY;
const TEXT_SCORE_EXACT: u32 = TEXT_SCORE + EXACT_PENALTY;
const TITLE_SCORE_EXACT: u32 = TITLE_SCORE + EXACT_PENALTY;
const END_PENALIZED_SCORE: u32 = 300;

pub(super) const CSS_ID_SCORE: u32 = 500;
const ROLE_WITHOUT_NAME_SCORE: u32 = 510;
const CSS_INPUT_TYPE_NAME_SCORE: u32 = 520;
const CSS_TAG_NAME_SCORE: u32 = 530;
pub(super) const NTH_SCORE: u32 = 10_000;
pub(super) const CSS_FALLBACK_SCORE: u32 = 10_000_000;

/// Longest text used verbatim in an exact candidate.
const MAX_EXACT_TEXT_LENGTH: usize = 80;
const SHORT_TEXT_LENGTH: usize = 30;

const OTHER_TEST_ID_ATTRIBUTES: &[&str] = &["data-testid", "data-test-id", "data-test"];

/// Tags for which `name` is a form-level attribute.
const NAMED_TAGS: &[&str] = &[
	"button", "form", "fieldset", "frame", "iframe", "input", "keygen", "object", "output", "select",
	"textarea", "map", "meta", "param",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SelectorToken {
	pub engine: &'static str,
	pub selector: String,
	pub score: u32,
}

impl SelectorToken {
	pub fn new(engine: &'static str, selector: impl Into<String>, score: u32) -> Self {
		Self {
			engine,
			selector: selector.into(),
			score,
		}
	}

	pub fn css(selector: impl Into<String>, score: u32) -> Self {
		Self::new("css", selector, score)
	}

	fn is_regex(&self) -> bool {
		self.selector.starts_with('/')
	}
}

pub(super) type Candidate = Vec<SelectorToken>;

/// Drops candidates whose first token is a regex.
pub(super) fn filter_regex_tokens(candidates: &mut Vec<Candidate>) {
	candidates.retain(|c| !c.first().is_some_and(SelectorToken::is_regex));
}

/// Adds one point per ten chars of selector text to the mid-range scores.
///
/// Every length in the generator counts Unicode scalar values, so astral
/// characters weigh one, not two as in UTF-16.
pub(super) fn penalize_score_for_length(tokens: &mut [SelectorToken]) {
	for token in tokens {
		if token.score > BEGIN_PENALIZED_SCORE && token.score < END_PENALIZED_SCORE {
			let penalty = (token.selector.chars().count() / 10) as u32;
			token.score += TEXT_SCORE_RANGE.min(penalty);
		}
	}
}

/// `#id` when the id is a plain identifier, `[id="..."]` otherwise.
pub(super) fn make_selector_for_id(id: &str) -> String {
	let mut chars = id.chars();
	let plain = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
		&& id.len() > 1
		&& chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
	if plain {
		format!("#{id}")
	} else {
		format!("[id=\"{}\"]", css_escape(id))
	}
}

pub(super) fn has_css_id_token(tokens: &[SelectorToken]) -> bool {
	tokens.iter().any(|token| {
		token.engine == "css" && (token.selector.starts_with('#') || token.selector.starts_with("[id=\""))
	})
}

#[derive(Clone, Copy, PartialEq)]
enum CharKind {
	Lower,
	Upper,
	Digit,
	Other,
}

/// Ids that flip between letter cases and digits too often are generated.
pub fn is_guid_like(id: &str) -> bool {
	let mut last: Option<CharKind> = None;
	let mut transitions = 0usize;
	for c in id.chars() {
		if c == '-' || c == '_' {
			continue;
		}
		let kind = if c.is_ascii_lowercase() {
			CharKind::Lower
		} else if c.is_ascii_uppercase() {
			CharKind::Upper
		} else if c.is_ascii_digit() {
			CharKind::Digit
		} else {
			CharKind::Other
		};
		// `Ab` is a capitalized word, not a transition.
		if kind == CharKind::Lower && last == Some(CharKind::Upper) {
			last = Some(kind);
			continue;
		}
		if last.is_some_and(|last| last != kind) {
			transitions += 1;
		}
		last = Some(kind);
	}
	transitions as f64 >= id.chars().count() as f64 / 4.0
}

fn is_word_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}

/// Cuts `text` to `max_length` characters, backing off to the last word
/// boundary. Empty when no boundary exists.
pub(super) fn trim_word_boundary(text: &str, max_length: usize) -> String {
	let chars: Vec<char> = text.chars().collect();
	if chars.len() <= max_length {
		return text.to_string();
	}
	let chars = &chars[..max_length];
	let boundary = (0..chars.len()).rev().find(|&i| {
		let before = i.checked_sub(1).is_some_and(|p| is_word_char(chars[p]));
		before != is_word_char(chars[i])
	});
	match boundary {
		Some(i) => chars[..i].iter().collect::<String>().trim_end().to_string(),
		None => String::new(),
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct TextAlternative {
	pub text: String,
	pub score_bonus: u32,
}

fn is_number_char(c: char) -> bool {
	c.is_ascii_digit() || c == '.' || c == ','
}

fn is_separator(c: char) -> bool {
	!(c == '.' || c == ',' || is_word_char(c))
}

/// Shorter variants of `text`: without a leading or trailing counter, and
/// cut at word boundaries.
pub(super) fn suitable_text_alternatives(text: &str) -> Vec<TextAlternative> {
	let chars: Vec<char> = text.chars().collect();
	let n = chars.len();
	let mut result = Vec::new();
	let bonus = |alt: &str| if alt.chars().count() <= SHORT_TEXT_LENGTH { 2 } else { 1 };

	let leading = chars.iter().take_while(|c| is_number_char(**c)).count();
	if leading > 0 && leading < n && is_separator(chars[leading]) {
		let rest: String = chars[leading..].iter().collect();
		let alt = trim_word_boundary(rest.trim_start(), MAX_EXACT_TEXT_LENGTH);
		let score_bonus = bonus(&alt);
		result.push(TextAlternative { text: alt, score_bonus });
	}

	let trailing = chars.iter().rev().take_while(|c| is_number_char(**c)).count();
	if trailing > 0 && trailing < n && is_separator(chars[n - trailing - 1]) {
		let rest: String = chars[..n - trailing].iter().collect();
		let alt = trim_word_boundary(rest.trim_end(), MAX_EXACT_TEXT_LENGTH);
		let score_bonus = bonus(&alt);
		result.push(TextAlternative { text: alt, score_bonus });
	}

	if n <= SHORT_TEXT_LENGTH {
		result.push(TextAlternative {
			text: text.to_string(),
			score_bonus: 0,
		});
	} else {
		result.push(TextAlternative {
			text: trim_word_boundary(text, MAX_EXACT_TEXT_LENGTH),
			score_bonus: 0,
		});
		result.push(TextAlternative {
			text: trim_word_boundary(text, SHORT_TEXT_LENGTH),
			score_bonus: 1,
		});
	}

	result.retain(|r| !r.text.is_empty());
	if result.is_empty() {
		result.push(TextAlternative {
			text: chars.iter().take(MAX_EXACT_TEXT_LENGTH).collect(),
			score_bonus: 0,
		});
	}
	result
}

fn anchored_regex(text: &str) -> Option<String> {
	let regex = RegexLiteral::new(&format!("^{}$", escape_regex(text)), "").ok()?;
	Some(escape_regex_for_selector(&regex))
}

impl Generator<'_, '_> {
	/// Role other than `none`/`presentation`.
	fn meaningful_role(&self, element: NodeId) -> Option<String> {
		let selectors = self.selectors;
		selectors
			.aria
			.role(selectors.doc, element)
			.filter(|role| role != "none" && role != "presentation")
	}

	fn attribute(&self, element: NodeId, name: &str) -> Option<&str> {
		self.selectors
			.doc
			.attribute(element, name)
			.filter(|value| !value.is_empty())
	}

	pub(super) fn build_no_text_candidates(&self, element: NodeId, internal: InternalOptions) -> Vec<SelectorToken> {
		let doc = self.selectors.doc;
		let tag = doc.tag_name(element);
		let test_id = self.options.test_id_attribute_name.as_str();
		let mut candidates = Vec::new();

		for attr in OTHER_TEST_ID_ATTRIBUTES {
			if *attr == test_id {
				continue;
			}
			if let Some(value) = self.attribute(element, attr) {
				candidates.push(SelectorToken::css(
					format!("[{attr}={}]", quote_css_attribute_value(value)),
					OTHER_TEST_ID_SCORE,
				));
			}
		}

		if !internal.no_css_id {
			if let Some(id) = self.attribute(element, "id").filter(|id| !is_guid_like(id)) {
				candidates.push(SelectorToken::css(make_selector_for_id(id), CSS_ID_SCORE));
			}
		}

		candidates.push(SelectorToken::css(css_escape(tag), CSS_TAG_NAME_SCORE));

		if tag == "iframe" {
			for attribute in ["name", "title"] {
				if let Some(value) = self.attribute(element, attribute) {
					candidates.push(SelectorToken::css(
						format!("{}[{attribute}={}]", css_escape(tag), quote_css_attribute_value(value)),
						IFRAME_BY_ATTRIBUTE_SCORE,
					));
				}
			}
			if let Some(value) = self.attribute(element, test_id) {
				candidates.push(SelectorToken::css(
					format!("[{test_id}={}]", quote_css_attribute_value(value)),
					TEST_ID_SCORE,
				));
			}
			penalize_score_for_length(&mut candidates);
			return candidates;
		}

		if let Some(value) = self.attribute(element, test_id) {
			let token = if self.options.omit_internal_engines {
				SelectorToken::css(format!("[{test_id}={}]", quote_css_attribute_value(value)), TEST_ID_SCORE)
			} else {
				SelectorToken::new(
					"internal:testid",
					format!("[{test_id}={}]", escape_for_attribute_selector(value, true)),
					TEST_ID_SCORE,
				)
			};
			candidates.push(token);
		}

		if tag == "input" || tag == "textarea" {
			if let Some(placeholder) = self.attribute(element, "placeholder") {
				candidates.push(SelectorToken::new(
					"internal:attr",
					format!("[placeholder={}]", escape_for_attribute_selector(placeholder, true)),
					PLACEHOLDER_SCORE_EXACT,
				));
				for alternative in suitable_text_alternatives(placeholder) {
					candidates.push(SelectorToken::new(
						"internal:attr",
						format!("[placeholder={}]", escape_for_attribute_selector(&alternative.text, false)),
						PLACEHOLDER_SCORE - alternative.score_bonus,
					));
				}
			}
		}

		let cache = self.selectors.evaluator.text_cache();
		for label in element_labels(doc, self.selectors.aria, cache, element) {
			let label_text = &label.normalized;
			candidates.push(SelectorToken::new(
				"internal:label",
				escape_for_text_selector(label_text, true),
				LABEL_SCORE_EXACT,
			));
			for alternative in suitable_text_alternatives(label_text) {
				candidates.push(SelectorToken::new(
					"internal:label",
					escape_for_text_selector(&alternative.text, false),
					LABEL_SCORE - alternative.score_bonus,
				));
			}
		}

		if let Some(role) = self.meaningful_role(element) {
			candidates.push(SelectorToken::new("internal:role", role, ROLE_WITHOUT_NAME_SCORE));
		}

		if NAMED_TAGS.contains(&tag) {
			if let Some(name) = self.attribute(element, "name") {
				candidates.push(SelectorToken::css(
					format!("{}[name={}]", css_escape(tag), quote_css_attribute_value(name)),
					CSS_INPUT_TYPE_NAME_SCORE,
				));
			}
		}

		let type_attr = doc.attribute(element, "type");
		let hidden_input = type_attr == Some("hidden");
		if (tag == "input" || tag == "textarea") && !hidden_input {
			if let Some(ty) = type_attr.filter(|ty| !ty.is_empty()) {
				candidates.push(SelectorToken::css(
					format!("{}[type={}]", css_escape(tag), quote_css_attribute_value(ty)),
					CSS_INPUT_TYPE_NAME_SCORE,
				));
			}
		}

		if matches!(tag, "input" | "textarea" | "select") && !hidden_input {
			candidates.push(SelectorToken::css(css_escape(tag), CSS_INPUT_TYPE_NAME_SCORE + 1));
		}

		penalize_score_for_length(&mut candidates);
		candidates
	}

	pub(super) fn build_text_candidates(&self, element: NodeId, is_target: bool) -> Vec<Candidate> {
		let selectors = self.selectors;
		let doc = selectors.doc;
		let tag = doc.tag_name(element);
		if tag == "select" {
			return Vec::new();
		}
		let cache = selectors.evaluator.text_cache();
		let icons = self
			.options
			.icons
			.icon_texts(doc, selectors.layout, cache, element);
		let strip = |text: &str| strip_icon_text(text, &icons);
		let mut candidates: Vec<Candidate> = Vec::new();

		if let Some(title) = self.attribute(element, "title").map(strip).filter(|t| !t.is_empty()) {
			candidates.push(vec![SelectorToken::new(
				"internal:attr",
				format!("[title={}]", escape_for_attribute_selector(&title, true)),
				TITLE_SCORE_EXACT,
			)]);
			for alternative in suitable_text_alternatives(&title) {
				candidates.push(vec![SelectorToken::new(
					"internal:attr",
					format!("[title={}]", escape_for_attribute_selector(&alternative.text, false)),
					TITLE_SCORE - alternative.score_bonus,
				)]);
			}
		}

		let alt_tag = matches!(tag, "applet" | "area" | "img" | "input");
		if let Some(alt) = self
			.attribute(element, "alt")
			.filter(|_| alt_tag)
			.map(strip)
			.filter(|t| !t.is_empty())
		{
			candidates.push(vec![SelectorToken::new(
				"internal:attr",
				format!("[alt={}]", escape_for_attribute_selector(&alt, true)),
				ALT_TEXT_SCORE_EXACT,
			)]);
			for alternative in suitable_text_alternatives(&alt) {
				candidates.push(vec![SelectorToken::new(
					"internal:attr",
					format!("[alt={}]", escape_for_attribute_selector(&alternative.text, false)),
					ALT_TEXT_SCORE - alternative.score_bonus,
				)]);
			}
		}

		let text = strip(&element_text(doc, cache, element).normalized);
		let text_length = text.chars().count();
		let text_alternatives = if text.is_empty() {
			Vec::new()
		} else {
			suitable_text_alternatives(&text)
		};
		let exact_regex = (text_length <= MAX_EXACT_TEXT_LENGTH)
			.then(|| anchored_regex(&text))
			.flatten();
		if !text.is_empty() {
			if is_target {
				if text_length <= MAX_EXACT_TEXT_LENGTH {
					candidates.push(vec![SelectorToken::new(
						"internal:text",
						escape_for_text_selector(&text, true),
						TEXT_SCORE_EXACT,
					)]);
				}
				for alternative in &text_alternatives {
					candidates.push(vec![SelectorToken::new(
						"internal:text",
						escape_for_text_selector(&alternative.text, false),
						TEXT_SCORE - alternative.score_bonus,
					)]);
				}
			}
			let css_token = SelectorToken::css(css_escape(tag), CSS_TAG_NAME_SCORE);
			for alternative in &text_alternatives {
				candidates.push(vec![
					css_token.clone(),
					SelectorToken::new(
						"internal:has-text",
						escape_for_text_selector(&alternative.text, false),
						TEXT_SCORE - alternative.score_bonus,
					),
				]);
			}
			if let Some(regex) = &exact_regex {
				candidates.push(vec![
					css_token,
					SelectorToken::new("internal:has-text", regex.clone(), TEXT_SCORE_REGEX),
				]);
			}
		}

		if let Some(role) = self.meaningful_role(element) {
			let name = strip(&normalized_accessible_name(
				selectors.aria,
				doc,
				selectors.layout,
				element,
				false,
			));
			if !name.is_empty() {
				candidates.push(vec![SelectorToken::new(
					"internal:role",
					format!("{role}[name={}]", escape_for_attribute_selector(&name, true)),
					ROLE_WITH_NAME_SCORE_EXACT,
				)]);
				for alternative in suitable_text_alternatives(&name) {
					candidates.push(vec![SelectorToken::new(
						"internal:role",
						format!("{role}[name={}]", escape_for_attribute_selector(&alternative.text, false)),
						ROLE_WITH_NAME_SCORE - alternative.score_bonus,
					)]);
				}
			} else {
				let role_token = SelectorToken::new("internal:role", role, ROLE_WITHOUT_NAME_SCORE);
				for alternative in &text_alternatives {
					candidates.push(vec![
						role_token.clone(),
						SelectorToken::new(
							"internal:has-text",
							escape_for_text_selector(&alternative.text, false),
							TEXT_SCORE - alternative.score_bonus,
						),
					]);
				}
				if let Some(regex) = exact_regex {
					candidates.push(vec![
						role_token,
						SelectorToken::new("internal:has-text", regex, TEXT_SCORE_REGEX),
					]);
				}
			}
		}

		for group in &mut candidates {
			penalize_score_for_length(group);
		}
		candidates
	}
}
