//! CSS sub-grammar used by `css=` parts and by engine arguments.
//!
//! A complex selector is split into simple selectors joined by combinators.
//! Each simple selector keeps its native CSS predicate ([`CompoundSelector`])
//! apart from the engine pseudo-classes listed in
//! [`CUSTOM_CSS_NAMES`](crate::selector::CUSTOM_CSS_NAMES), which become
//! [`CssFunction`] calls evaluated by the locator engine.
//!
//! The combinator stored on a simple selector relates it to the simple
//! selector that follows it in the chain.

#[cfg(test)]
mod tests;

use std::fmt::{self, Write as _};

use serde::Serialize;

use crate::error::{InvalidSelectorError, Result};
use crate::escape::css_escape;
use crate::selector::CUSTOM_CSS_NAMES;

pub type CssComplexSelectorList = Vec<CssComplexSelector>;

/// Relation between two neighbouring simple selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Combinator {
	#[serde(rename = "")]
	Descendant,
	#[serde(rename = ">")]
	Child,
	#[serde(rename = "+")]
	NextSibling,
	#[serde(rename = "~")]
	SubsequentSibling,
	/// `>=`: the element itself or any ancestor.
	#[serde(rename = ">=")]
	SelfOrAncestor,
}

impl Combinator {
	pub fn as_str(self) -> &'static str {
		match self {
			Combinator::Descendant => "",
			Combinator::Child => ">",
			Combinator::NextSibling => "+",
			Combinator::SubsequentSibling => "~",
			Combinator::SelfOrAncestor => ">=",
		}
	}
}

/// A chain of simple selectors, e.g. `#a > .b:has-text("x") span`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CssComplexSelector {
	simples: Vec<CssSimpleWithCombinator>,
	#[serde(skip)]
	text: String,
}

impl CssComplexSelector {
	pub fn new(simples: Vec<CssSimpleWithCombinator>) -> Self {
		let mut text = String::new();
		for (i, simple) in simples.iter().enumerate() {
			text.push_str(simple.selector.text());
			if i + 1 < simples.len() {
				match simple.combinator {
					Combinator::Descendant => text.push(' '),
					other => {
						let _ = write!(text, " {} ", other.as_str());
					}
				}
			}
		}
		Self { simples, text }
	}

	/// Single simple selector with a native predicate only.
	pub fn from_compound(css: CompoundSelector) -> Self {
		Self::new(vec![CssSimpleWithCombinator {
			selector: CssSimpleSelector::new(Some(css), Vec::new()),
			combinator: Combinator::Descendant,
		}])
	}

	pub fn simples(&self) -> &[CssSimpleWithCombinator] {
		&self.simples
	}

	/// Canonical text; equal selectors have equal text.
	pub fn text(&self) -> &str {
		&self.text
	}

	/// Whether any simple selector in the chain calls the engine `name`.
	pub fn has_function(&self, name: &str) -> bool {
		self.simples
			.iter()
			.any(|simple| simple.selector.functions().iter().any(|f| f.name == name))
	}
}

impl fmt::Display for CssComplexSelector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.text)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CssSimpleWithCombinator {
	pub selector: CssSimpleSelector,
	pub combinator: Combinator,
}

/// Native CSS predicate plus engine function calls, e.g. `div.item:text("a")`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CssSimpleSelector {
	#[serde(skip_serializing_if = "Option::is_none")]
	css: Option<CompoundSelector>,
	functions: Vec<CssFunction>,
	#[serde(skip)]
	text: String,
}

impl CssSimpleSelector {
	pub fn new(css: Option<CompoundSelector>, functions: Vec<CssFunction>) -> Self {
		let mut text = css.as_ref().map(ToString::to_string).unwrap_or_default();
		for function in &functions {
			let _ = write!(text, "{function}");
		}
		Self {
			css,
			functions,
			text,
		}
	}

	pub fn css(&self) -> Option<&CompoundSelector> {
		self.css.as_ref()
	}

	pub fn functions(&self) -> &[CssFunction] {
		&self.functions
	}

	pub fn text(&self) -> &str {
		&self.text
	}
}

/// Engine pseudo-class call such as `:has(.a)` or `:right-of(div, 10)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CssFunction {
	pub name: String,
	pub args: Vec<CssFunctionArgument>,
}

impl fmt::Display for CssFunction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, ":{}", self.name)?;
		if self.args.is_empty() {
			return Ok(());
		}
		f.write_char('(')?;
		for (i, arg) in self.args.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{arg}")?;
		}
		f.write_char(')')
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CssFunctionArgument {
	Selector(CssComplexSelector),
	String(String),
	Number(f64),
}

impl fmt::Display for CssFunctionArgument {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CssFunctionArgument::Selector(selector) => f.write_str(selector.text()),
			CssFunctionArgument::String(value) => f.write_str(&css_string(value)),
			CssFunctionArgument::Number(value) => write!(f, "{value}"),
		}
	}
}

/// The native part of a simple selector: type, ids, classes, attributes and
/// structural/state pseudo-classes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompoundSelector {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tag: Option<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub ids: Vec<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub classes: Vec<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub attributes: Vec<AttributeCondition>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub pseudo_classes: Vec<PseudoClass>,
}

impl CompoundSelector {
	/// `*`
	pub fn universal() -> Self {
		Self::default()
	}

	/// `[name]`
	pub fn with_attribute(name: &str) -> Self {
		Self {
			attributes: vec![AttributeCondition {
				name: name.to_ascii_lowercase(),
				matcher: AttributeMatch::Exists,
				case_insensitive: false,
			}],
			..Self::default()
		}
	}

	/// `[name="value"]`
	pub fn with_attribute_value(name: &str, value: &str) -> Self {
		Self {
			attributes: vec![AttributeCondition {
				name: name.to_ascii_lowercase(),
				matcher: AttributeMatch::Equals(value.to_string()),
				case_insensitive: false,
			}],
			..Self::default()
		}
	}

	pub fn is_universal(&self) -> bool {
		self.tag.is_none()
			&& self.ids.is_empty()
			&& self.classes.is_empty()
			&& self.attributes.is_empty()
			&& self.pseudo_classes.is_empty()
	}
}

impl fmt::Display for CompoundSelector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.tag {
			Some(tag) => f.write_str(&css_escape(tag))?,
			None if self.is_universal() => f.write_char('*')?,
			None => {}
		}
		for id in &self.ids {
			write!(f, "#{}", css_escape(id))?;
		}
		for class in &self.classes {
			write!(f, ".{}", css_escape(class))?;
		}
		for attribute in &self.attributes {
			write!(f, "{attribute}")?;
		}
		for pseudo in &self.pseudo_classes {
			write!(f, "{pseudo}")?;
		}
		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeCondition {
	pub name: String,
	pub matcher: AttributeMatch,
	pub case_insensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeMatch {
	Exists,
	Equals(String),
	/// `~=`
	Includes(String),
	/// `|=`
	DashMatch(String),
	/// `^=`
	Prefix(String),
	/// `$=`
	Suffix(String),
	/// `*=`
	Substring(String),
}

impl AttributeMatch {
	fn operator(&self) -> &'static str {
		match self {
			AttributeMatch::Exists => "",
			AttributeMatch::Equals(_) => "=",
			AttributeMatch::Includes(_) => "~=",
			AttributeMatch::DashMatch(_) => "|=",
			AttributeMatch::Prefix(_) => "^=",
			AttributeMatch::Suffix(_) => "$=",
			AttributeMatch::Substring(_) => "*=",
		}
	}

	fn value(&self) -> Option<&str> {
		match self {
			AttributeMatch::Exists => None,
			AttributeMatch::Equals(v)
			| AttributeMatch::Includes(v)
			| AttributeMatch::DashMatch(v)
			| AttributeMatch::Prefix(v)
			| AttributeMatch::Suffix(v)
			| AttributeMatch::Substring(v) => Some(v),
		}
	}
}

impl AttributeCondition {
	/// Tests an attribute value (`None` when the attribute is absent).
	pub fn matches(&self, actual: Option<&str>) -> bool {
		let Some(actual) = actual else {
			return false;
		};
		let Some(expected) = self.matcher.value() else {
			return true;
		};
		let (actual, expected) = if self.case_insensitive {
			(actual.to_lowercase(), expected.to_lowercase())
		} else {
			(actual.to_string(), expected.to_string())
		};
		match self.matcher {
			AttributeMatch::Exists => true,
			AttributeMatch::Equals(_) => actual == expected,
			AttributeMatch::Includes(_) => {
				!expected.is_empty()
					&& !expected.contains(char::is_whitespace)
					&& actual.split_ascii_whitespace().any(|token| token == expected)
			}
			AttributeMatch::DashMatch(_) => {
				actual == expected || actual.starts_with(&format!("{expected}-"))
			}
			AttributeMatch::Prefix(_) => !expected.is_empty() && actual.starts_with(&expected),
			AttributeMatch::Suffix(_) => !expected.is_empty() && actual.ends_with(&expected),
			AttributeMatch::Substring(_) => !expected.is_empty() && actual.contains(&expected),
		}
	}
}

impl fmt::Display for AttributeCondition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}", css_escape(&self.name))?;
		if let Some(value) = self.matcher.value() {
			write!(f, "{}{}", self.matcher.operator(), css_string(value))?;
			if self.case_insensitive {
				f.write_str(" i")?;
			}
		}
		f.write_char(']')
	}
}

/// `An+B` from the `:nth-*` pseudo-classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NthIndex {
	pub a: i64,
	pub b: i64,
}

impl NthIndex {
	/// Whether the 1-based `position` is selected.
	pub fn matches(self, position: usize) -> bool {
		let position = position as i64;
		if self.a == 0 {
			return position == self.b;
		}
		let diff = position - self.b;
		diff % self.a == 0 && diff / self.a >= 0
	}
}

impl fmt::Display for NthIndex {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match (self.a, self.b) {
			(0, b) => write!(f, "{b}"),
			(a, 0) => write!(f, "{a}n"),
			(a, b) if b > 0 => write!(f, "{a}n+{b}"),
			(a, b) => write!(f, "{a}n{b}"),
		}
	}
}

/// Native pseudo-classes that can be decided from a static document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PseudoClass {
	FirstChild,
	LastChild,
	OnlyChild,
	FirstOfType,
	LastOfType,
	OnlyOfType,
	NthChild(NthIndex),
	NthLastChild(NthIndex),
	NthOfType(NthIndex),
	NthLastOfType(NthIndex),
	Root,
	Empty,
	Checked,
	Disabled,
	Enabled,
	Required,
	Optional,
	ReadOnly,
	ReadWrite,
	Link,
	AnyLink,
	PlaceholderShown,
	Defined,
}

impl PseudoClass {
	fn from_name(name: &str) -> Option<Self> {
		Some(match name {
			"first-child" => PseudoClass::FirstChild,
			"last-child" => PseudoClass::LastChild,
			"only-child" => PseudoClass::OnlyChild,
			"first-of-type" => PseudoClass::FirstOfType,
			"last-of-type" => PseudoClass::LastOfType,
			"only-of-type" => PseudoClass::OnlyOfType,
			"root" => PseudoClass::Root,
			"empty" => PseudoClass::Empty,
			"checked" => PseudoClass::Checked,
			"disabled" => PseudoClass::Disabled,
			"enabled" => PseudoClass::Enabled,
			"required" => PseudoClass::Required,
			"optional" => PseudoClass::Optional,
			"read-only" => PseudoClass::ReadOnly,
			"read-write" => PseudoClass::ReadWrite,
			"link" => PseudoClass::Link,
			"any-link" => PseudoClass::AnyLink,
			"placeholder-shown" => PseudoClass::PlaceholderShown,
			"defined" => PseudoClass::Defined,
			_ => return None,
		})
	}

	fn from_function(name: &str, nth: NthIndex) -> Option<Self> {
		Some(match name {
			"nth-child" => PseudoClass::NthChild(nth),
			"nth-last-child" => PseudoClass::NthLastChild(nth),
			"nth-of-type" => PseudoClass::NthOfType(nth),
			"nth-last-of-type" => PseudoClass::NthLastOfType(nth),
			_ => return None,
		})
	}

	fn name(self) -> &'static str {
		match self {
			PseudoClass::FirstChild => "first-child",
			PseudoClass::LastChild => "last-child",
			PseudoClass::OnlyChild => "only-child",
			PseudoClass::FirstOfType => "first-of-type",
			PseudoClass::LastOfType => "last-of-type",
			PseudoClass::OnlyOfType => "only-of-type",
			PseudoClass::NthChild(_) => "nth-child",
			PseudoClass::NthLastChild(_) => "nth-last-child",
			PseudoClass::NthOfType(_) => "nth-of-type",
			PseudoClass::NthLastOfType(_) => "nth-last-of-type",
			PseudoClass::Root => "root",
			PseudoClass::Empty => "empty",
			PseudoClass::Checked => "checked",
			PseudoClass::Disabled => "disabled",
			PseudoClass::Enabled => "enabled",
			PseudoClass::Required => "required",
			PseudoClass::Optional => "optional",
			PseudoClass::ReadOnly => "read-only",
			PseudoClass::ReadWrite => "read-write",
			PseudoClass::Link => "link",
			PseudoClass::AnyLink => "any-link",
			PseudoClass::PlaceholderShown => "placeholder-shown",
			PseudoClass::Defined => "defined",
		}
	}
}

impl fmt::Display for PseudoClass {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PseudoClass::NthChild(nth)
			| PseudoClass::NthLastChild(nth)
			| PseudoClass::NthOfType(nth)
			| PseudoClass::NthLastOfType(nth) => write!(f, ":{}({nth})", self.name()),
			other => write!(f, ":{}", other.name()),
		}
	}
}

fn css_string(value: &str) -> String {
	let mut out = String::with_capacity(value.len() + 2);
	out.push('"');
	for c in value.chars() {
		match c {
			'"' | '\\' => {
				out.push('\\');
				out.push(c);
			}
			'\n' => out.push_str("\\a "),
			c if (c as u32) < 0x20 || c as u32 == 0x7f => {
				let _ = write!(out, "\\{:x} ", c as u32);
			}
			c => out.push(c),
		}
	}
	out.push('"');
	out
}

/// Parses a selector list such as `div > .a, span:text("x")`.
pub fn parse_css(selector: &str) -> Result<CssComplexSelectorList> {
	let mut parser = CssParser::new(selector);
	let list = parser.consume_selector_list()?;
	parser.skip_whitespace();
	if !parser.at_end() {
		return Err(parser.unexpected());
	}
	Ok(list)
}

struct CssParser<'a> {
	source: &'a str,
	chars: Vec<char>,
	pos: usize,
}

impl<'a> CssParser<'a> {
	fn new(source: &'a str) -> Self {
		Self {
			source,
			chars: source.chars().collect(),
			pos: 0,
		}
	}

	fn peek(&self) -> Option<char> {
		self.chars.get(self.pos).copied()
	}

	fn peek_at(&self, offset: usize) -> Option<char> {
		self.chars.get(self.pos + offset).copied()
	}

	fn at_end(&self) -> bool {
		self.pos >= self.chars.len()
	}

	fn unexpected(&self) -> InvalidSelectorError {
		let token: String = match self.peek() {
			Some(c) if is_name_char(c) => self.chars[self.pos..]
				.iter()
				.take_while(|c| is_name_char(**c))
				.collect(),
			Some(c) => c.to_string(),
			None => String::new(),
		};
		InvalidSelectorError::new(format!(
			"Unexpected token \"{token}\" while parsing css selector \"{}\". Did you mean to CSS.escape it?",
			self.source
		))
	}

	fn error(&self, message: &str) -> InvalidSelectorError {
		InvalidSelectorError::new(format!(
			"{message} while parsing css selector \"{}\"",
			self.source
		))
	}

	fn skip_whitespace(&mut self) {
		while matches!(self.peek(), Some(' ' | '\t' | '\n' | '\r' | '\u{0C}')) {
			self.pos += 1;
		}
	}

	fn expect(&mut self, c: char) -> Result<()> {
		if self.peek() != Some(c) {
			return Err(self.unexpected());
		}
		self.pos += 1;
		Ok(())
	}

	fn consume_selector_list(&mut self) -> Result<CssComplexSelectorList> {
		let mut list = vec![self.consume_complex()?];
		loop {
			self.skip_whitespace();
			if self.peek() != Some(',') {
				break;
			}
			self.pos += 1;
			list.push(self.consume_complex()?);
		}
		Ok(list)
	}

	fn peek_combinator(&self) -> Option<(Combinator, usize)> {
		match (self.peek()?, self.peek_at(1)) {
			('>', Some('=')) => Some((Combinator::SelfOrAncestor, 2)),
			('>', _) => Some((Combinator::Child, 1)),
			('+', _) => Some((Combinator::NextSibling, 1)),
			('~', Some('=')) => None,
			('~', _) => Some((Combinator::SubsequentSibling, 1)),
			_ => None,
		}
	}

	fn at_clause_end(&self) -> bool {
		matches!(self.peek(), None | Some(',' | ')'))
	}

	fn consume_complex(&mut self) -> Result<CssComplexSelector> {
		self.skip_whitespace();
		let mut simples = Vec::new();
		if self.peek_combinator().is_some() {
			// Relative selector: starts at the scope element.
			let scope = CssFunction {
				name: "scope".to_string(),
				args: Vec::new(),
			};
			simples.push(CssSimpleWithCombinator {
				selector: CssSimpleSelector::new(None, vec![scope]),
				combinator: Combinator::Descendant,
			});
		} else {
			simples.push(CssSimpleWithCombinator {
				selector: self.consume_simple()?,
				combinator: Combinator::Descendant,
			});
		}
		loop {
			self.skip_whitespace();
			if let Some((combinator, len)) = self.peek_combinator() {
				self.pos += len;
				if let Some(last) = simples.last_mut() {
					last.combinator = combinator;
				}
				self.skip_whitespace();
			} else if self.at_clause_end() {
				break;
			}
			simples.push(CssSimpleWithCombinator {
				selector: self.consume_simple()?,
				combinator: Combinator::Descendant,
			});
		}
		Ok(CssComplexSelector::new(simples))
	}

	fn consume_simple(&mut self) -> Result<CssSimpleSelector> {
		let start = self.pos;
		let mut css = CompoundSelector::default();
		let mut has_css = false;
		let mut functions = Vec::new();

		match self.peek() {
			Some('*') => {
				self.pos += 1;
				has_css = true;
			}
			Some(c) if is_ident_start(c, self.peek_at(1)) => {
				css.tag = Some(self.consume_ident()?.to_ascii_lowercase());
				has_css = true;
			}
			_ => {}
		}

		loop {
			match self.peek() {
				Some('#') => {
					self.pos += 1;
					css.ids.push(self.consume_ident()?);
					has_css = true;
				}
				Some('.') => {
					self.pos += 1;
					css.classes.push(self.consume_ident()?);
					has_css = true;
				}
				Some('[') => {
					css.attributes.push(self.consume_attribute()?);
					has_css = true;
				}
				Some(':') => {
					self.pos += 1;
					if self.peek() == Some(':') {
						return Err(self.error("Unsupported pseudo-element"));
					}
					let name = self.consume_ident()?.to_ascii_lowercase();
					if CUSTOM_CSS_NAMES.contains(&name.as_str()) {
						let mut args = Vec::new();
						if self.peek() == Some('(') {
							self.pos += 1;
							args = self.consume_function_arguments()?;
							self.skip_whitespace();
							self.expect(')')?;
						}
						functions.push(CssFunction { name, args });
					} else {
						css.pseudo_classes.push(self.consume_native_pseudo(&name)?);
						has_css = true;
					}
				}
				_ => break,
			}
		}

		if self.pos == start {
			return Err(self.unexpected());
		}
		Ok(CssSimpleSelector::new(has_css.then_some(css), functions))
	}

	fn consume_native_pseudo(&mut self, name: &str) -> Result<PseudoClass> {
		if self.peek() != Some('(') {
			return PseudoClass::from_name(name)
				.ok_or_else(|| self.error(&format!("Unsupported pseudo-class \":{name}\"")));
		}
		self.pos += 1;
		let raw = self.consume_raw_until_close()?;
		let nth = parse_nth(&raw)
			.ok_or_else(|| self.error(&format!("Malformed argument \"{raw}\" of \":{name}\"")))?;
		PseudoClass::from_function(name, nth)
			.ok_or_else(|| self.error(&format!("Unsupported pseudo-class \":{name}()\"")))
	}

	/// Reads up to the matching `)` and consumes it.
	fn consume_raw_until_close(&mut self) -> Result<String> {
		let start = self.pos;
		let mut depth = 0usize;
		let mut quote: Option<char> = None;
		while let Some(c) = self.peek() {
			match (quote, c) {
				(_, '\\') => self.pos += 1,
				(Some(q), c) if c == q => quote = None,
				(Some(_), _) => {}
				(None, '"' | '\'') => quote = Some(c),
				(None, '(') => depth += 1,
				(None, ')') if depth == 0 => {
					let raw: String = self.chars[start..self.pos].iter().collect();
					self.pos += 1;
					return Ok(raw);
				}
				(None, ')') => depth -= 1,
				_ => {}
			}
			self.pos += 1;
		}
		Err(self.error("Unterminated parenthesis"))
	}

	fn consume_function_arguments(&mut self) -> Result<Vec<CssFunctionArgument>> {
		let mut args = vec![self.consume_argument()?];
		loop {
			self.skip_whitespace();
			if self.peek() != Some(',') {
				break;
			}
			self.pos += 1;
			args.push(self.consume_argument()?);
		}
		Ok(args)
	}

	fn consume_argument(&mut self) -> Result<CssFunctionArgument> {
		self.skip_whitespace();
		if self.at_number() {
			return Ok(CssFunctionArgument::Number(self.consume_number()?));
		}
		if let Some(quote @ ('"' | '\'')) = self.peek() {
			return Ok(CssFunctionArgument::String(self.consume_string(quote)?));
		}
		Ok(CssFunctionArgument::Selector(self.consume_complex()?))
	}

	fn at_number(&self) -> bool {
		let digit_at = |offset| self.peek_at(offset).is_some_and(|c| c.is_ascii_digit());
		match self.peek() {
			Some(c) if c.is_ascii_digit() => true,
			Some('.') => digit_at(1),
			Some('+' | '-') => digit_at(1) || (self.peek_at(1) == Some('.') && digit_at(2)),
			_ => false,
		}
	}

	fn consume_number(&mut self) -> Result<f64> {
		let start = self.pos;
		if matches!(self.peek(), Some('+' | '-')) {
			self.pos += 1;
		}
		while self.peek().is_some_and(|c| c.is_ascii_digit()) {
			self.pos += 1;
		}
		if self.peek() == Some('.') {
			self.pos += 1;
			while self.peek().is_some_and(|c| c.is_ascii_digit()) {
				self.pos += 1;
			}
		}
		if matches!(self.peek(), Some('e' | 'E'))
			&& (self.peek_at(1).is_some_and(|c| c.is_ascii_digit())
				|| (matches!(self.peek_at(1), Some('+' | '-'))
					&& self.peek_at(2).is_some_and(|c| c.is_ascii_digit())))
		{
			self.pos += 2;
			while self.peek().is_some_and(|c| c.is_ascii_digit()) {
				self.pos += 1;
			}
		}
		let raw: String = self.chars[start..self.pos].iter().collect();
		raw.parse::<f64>().map_err(|_| self.unexpected())
	}

	fn consume_string(&mut self, quote: char) -> Result<String> {
		self.pos += 1;
		let mut value = String::new();
		loop {
			match self.peek() {
				None => return Err(self.error("Unterminated string")),
				Some(c) if c == quote => {
					self.pos += 1;
					return Ok(value);
				}
				Some('\n') => return Err(self.error("Unterminated string")),
				Some('\\') => {
					self.pos += 1;
					match self.peek() {
						None => {}
						Some('\n') => self.pos += 1,
						Some(_) => value.push(self.consume_escape()),
					}
				}
				Some(c) => {
					value.push(c);
					self.pos += 1;
				}
			}
		}
	}

	/// Decodes the escape after a consumed backslash.
	fn consume_escape(&mut self) -> char {
		let start = self.pos;
		while self.pos - start < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
			self.pos += 1;
		}
		if self.pos == start {
			let c = self.peek().unwrap_or('\u{FFFD}');
			self.pos += 1;
			return c;
		}
		let hex: String = self.chars[start..self.pos].iter().collect();
		if matches!(self.peek(), Some(' ' | '\t' | '\n' | '\r' | '\u{0C}')) {
			self.pos += 1;
		}
		u32::from_str_radix(&hex, 16)
			.ok()
			.filter(|&code| code != 0)
			.and_then(char::from_u32)
			.unwrap_or('\u{FFFD}')
	}

	fn consume_ident(&mut self) -> Result<String> {
		let mut ident = String::new();
		loop {
			match self.peek() {
				Some('\\') if self.peek_at(1).is_some_and(|c| c != '\n') => {
					self.pos += 1;
					ident.push(self.consume_escape());
				}
				Some(c) if is_name_char(c) => {
					ident.push(c);
					self.pos += 1;
				}
				_ => break,
			}
		}
		if ident.is_empty() {
			return Err(self.unexpected());
		}
		Ok(ident)
	}

	fn consume_attribute(&mut self) -> Result<AttributeCondition> {
		self.expect('[')?;
		self.skip_whitespace();
		let name = self.consume_ident()?.to_ascii_lowercase();
		self.skip_whitespace();
		if self.peek() == Some(']') {
			self.pos += 1;
			return Ok(AttributeCondition {
				name,
				matcher: AttributeMatch::Exists,
				case_insensitive: false,
			});
		}

		let operator = match (self.peek(), self.peek_at(1)) {
			(Some('='), _) => {
				self.pos += 1;
				"="
			}
			(Some(c @ ('~' | '|' | '^' | '$' | '*')), Some('=')) => {
				self.pos += 2;
				match c {
					'~' => "~=",
					'|' => "|=",
					'^' => "^=",
					'$' => "$=",
					_ => "*=",
				}
			}
			_ => return Err(self.unexpected()),
		};
		self.skip_whitespace();
		let value = match self.peek() {
			Some(quote @ ('"' | '\'')) => self.consume_string(quote)?,
			_ => self.consume_ident()?,
		};
		self.skip_whitespace();
		let mut case_insensitive = false;
		match self.peek() {
			Some('i' | 'I') => {
				case_insensitive = true;
				self.pos += 1;
			}
			Some('s' | 'S') => self.pos += 1,
			_ => {}
		}
		self.skip_whitespace();
		self.expect(']')?;

		let matcher = match operator {
			"=" => AttributeMatch::Equals(value),
			"~=" => AttributeMatch::Includes(value),
			"|=" => AttributeMatch::DashMatch(value),
			"^=" => AttributeMatch::Prefix(value),
			"$=" => AttributeMatch::Suffix(value),
			_ => AttributeMatch::Substring(value),
		};
		Ok(AttributeCondition {
			name,
			matcher,
			case_insensitive,
		})
	}
}

fn is_name_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '-' || c == '_' || c as u32 >= 0x80
}

fn is_ident_start(c: char, next: Option<char>) -> bool {
	match c {
		'\\' => true,
		'-' => next.is_some_and(|n| n == '-' || n == '\\' || (is_name_char(n) && !n.is_ascii_digit())),
		c => c.is_ascii_alphabetic() || c == '_' || c as u32 >= 0x80,
	}
}

fn parse_nth(raw: &str) -> Option<NthIndex> {
	let compact: String = raw
		.chars()
		.filter(|c| !c.is_whitespace())
		.collect::<String>()
		.to_ascii_lowercase();
	match compact.as_str() {
		"odd" => return Some(NthIndex { a: 2, b: 1 }),
		"even" => return Some(NthIndex { a: 2, b: 0 }),
		"" => return None,
		_ => {}
	}
	let Some(n) = compact.find('n') else {
		return compact.parse().ok().map(|b| NthIndex { a: 0, b });
	};
	let a = match &compact[..n] {
		"" | "+" => 1,
		"-" => -1,
		a => a.parse().ok()?,
	};
	let rest = &compact[n + 1..];
	let b = match rest {
		"" => 0,
		rest if rest.starts_with('+') || rest.starts_with('-') => rest.parse().ok()?,
		_ => return None,
	};
	Some(NthIndex { a, b })
}
