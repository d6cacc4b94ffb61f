//! `name[attr=value]...` bodies used by `role=`, `internal:role=`,
//! `internal:attr=` and `internal:testid=`.

use serde::Serialize;

use crate::error::{InvalidSelectorError, Result};
use crate::regex_literal::RegexLiteral;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeSelector {
	pub name: String,
	pub attributes: Vec<AttributeSelectorPart>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttributeOperator {
	#[serde(rename = "<truthy>")]
	Truthy,
	#[serde(rename = "=")]
	Equals,
	#[serde(rename = "*=")]
	Contains,
	#[serde(rename = "^=")]
	StartsWith,
	#[serde(rename = "$=")]
	EndsWith,
	#[serde(rename = "|=")]
	DashPrefix,
	#[serde(rename = "~=")]
	Word,
}

impl AttributeOperator {
	fn from_token(token: &str) -> Option<Self> {
		Some(match token {
			"=" => AttributeOperator::Equals,
			"*=" => AttributeOperator::Contains,
			"^=" => AttributeOperator::StartsWith,
			"$=" => AttributeOperator::EndsWith,
			"|=" => AttributeOperator::DashPrefix,
			"~=" => AttributeOperator::Word,
			_ => return None,
		})
	}

	pub fn as_str(self) -> &'static str {
		match self {
			AttributeOperator::Truthy => "<truthy>",
			AttributeOperator::Equals => "=",
			AttributeOperator::Contains => "*=",
			AttributeOperator::StartsWith => "^=",
			AttributeOperator::EndsWith => "$=",
			AttributeOperator::DashPrefix => "|=",
			AttributeOperator::Word => "~=",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
	String(String),
	Regex(RegexLiteral),
	Bool(bool),
	Number(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSelectorPart {
	pub name: String,
	pub json_path: Vec<String>,
	pub op: AttributeOperator,
	pub value: Option<AttributeValue>,
	pub case_sensitive: bool,
}

impl AttributeSelectorPart {
	/// Matches a string-valued property against this part.
	///
	/// Case-insensitive comparison upper-cases both sides. Regex values are
	/// only meaningful with `=`; booleans and numbers never match a string.
	pub fn matches_str(&self, actual: Option<&str>) -> bool {
		let Some(actual) = actual else {
			return false;
		};
		if self.op == AttributeOperator::Truthy {
			return !actual.is_empty();
		}
		let fold = |s: &str| {
			if self.case_sensitive {
				s.to_string()
			} else {
				s.to_uppercase()
			}
		};
		let expected = match &self.value {
			Some(AttributeValue::Regex(regex)) => {
				return self.op == AttributeOperator::Equals && regex.is_match(actual);
			}
			Some(AttributeValue::String(expected)) => fold(expected),
			_ => return false,
		};
		let actual = fold(actual);
		match self.op {
			AttributeOperator::Truthy => true,
			AttributeOperator::Equals => actual == expected,
			AttributeOperator::Contains => actual.contains(&expected),
			AttributeOperator::StartsWith => actual.starts_with(&expected),
			AttributeOperator::EndsWith => actual.ends_with(&expected),
			AttributeOperator::DashPrefix => {
				actual == expected || actual.starts_with(&format!("{expected}-"))
			}
			AttributeOperator::Word => actual.split(' ').any(|word| word == expected),
		}
	}
}

/// Parses `name[attr op value]...`.
///
/// With `allow_unquoted_strings`, a bare value that is not `true`/`false` is
/// kept as a string; otherwise it must be a number.
pub fn parse_attribute_selector(
	selector: &str,
	allow_unquoted_strings: bool,
) -> Result<AttributeSelector> {
	let mut parser = AttributeParser {
		selector,
		chars: selector.chars().collect(),
		pos: 0,
	};
	let name = parser.read_identifier();
	parser.skip_spaces();
	let mut attributes = Vec::new();
	while parser.next() == Some('[') {
		attributes.push(parser.read_attribute(allow_unquoted_strings)?);
		parser.skip_spaces();
	}
	if !parser.eol() {
		return Err(parser.syntax_error(None));
	}
	if name.is_empty() && attributes.is_empty() {
		return Err(InvalidSelectorError::new(format!(
			"Error while parsing selector `{selector}` - selector cannot be empty"
		)));
	}
	Ok(AttributeSelector { name, attributes })
}

struct AttributeParser<'a> {
	selector: &'a str,
	chars: Vec<char>,
	pos: usize,
}

impl AttributeParser<'_> {
	fn next(&self) -> Option<char> {
		self.chars.get(self.pos).copied()
	}

	fn eol(&self) -> bool {
		self.pos >= self.chars.len()
	}

	fn eat(&mut self) -> Option<char> {
		let c = self.next();
		self.pos += 1;
		c
	}

	fn syntax_error(&self, stage: Option<&str>) -> InvalidSelectorError {
		let selector = self.selector;
		let Some(symbol) = self.next() else {
			return InvalidSelectorError::new(format!(
				"Unexpected end of selector while parsing selector `{selector}`"
			));
		};
		let stage = stage.map(|s| format!(" during {s}")).unwrap_or_default();
		InvalidSelectorError::new(format!(
			"Error while parsing selector `{selector}` - unexpected symbol \"{symbol}\" at position {}{stage}",
			self.pos
		))
	}

	fn skip_spaces(&mut self) {
		while self.next().is_some_and(char::is_whitespace) {
			self.pos += 1;
		}
	}

	fn read_identifier(&mut self) -> String {
		self.skip_spaces();
		let mut ident = String::new();
		while let Some(c) = self.next().filter(|&c| is_css_name_char(c)) {
			ident.push(c);
			self.pos += 1;
		}
		ident
	}

	/// Reads a quoted string, dropping the quotes and escaping backslashes.
	fn read_quoted_string(&mut self, quote: char) -> Result<String> {
		if self.eat() != Some(quote) {
			self.pos -= 1;
			return Err(self.syntax_error(Some("parsing quoted string")));
		}
		let mut value = String::new();
		while let Some(c) = self.next().filter(|&c| c != quote) {
			if c == '\\' {
				self.pos += 1;
			}
			if let Some(c) = self.eat() {
				value.push(c);
			}
		}
		if self.next() != Some(quote) {
			return Err(self.syntax_error(Some("parsing quoted string")));
		}
		self.pos += 1;
		Ok(value)
	}

	fn read_regular_expression(&mut self) -> Result<RegexLiteral> {
		self.pos += 1;
		let mut source = String::new();
		let mut in_class = false;
		while let Some(c) = self.next() {
			match c {
				'\\' => {
					source.push(c);
					self.pos += 1;
					if self.eol() {
						return Err(self.syntax_error(Some("parsing regular expression")));
					}
				}
				']' if in_class => in_class = false,
				'[' if !in_class => in_class = true,
				'/' if !in_class => break,
				_ => {}
			}
			if let Some(c) = self.eat() {
				source.push(c);
			}
		}
		if self.next() != Some('/') {
			return Err(self.syntax_error(Some("parsing regular expression")));
		}
		self.pos += 1;
		let mut flags = String::new();
		while let Some(c) = self.next().filter(|c| "dgimsuy".contains(*c)) {
			flags.push(c);
			self.pos += 1;
		}
		RegexLiteral::new(&source, &flags).map_err(|err| {
			InvalidSelectorError::new(format!(
				"Error while parsing selector `{}`: {}",
				self.selector,
				err.message()
			))
		})
	}

	fn read_attribute_token(&mut self) -> Result<String> {
		self.skip_spaces();
		let token = match self.next() {
			Some(quote @ ('\'' | '"')) => self.read_quoted_string(quote)?,
			_ => self.read_identifier(),
		};
		if token.is_empty() {
			return Err(self.syntax_error(Some("parsing property path")));
		}
		Ok(token)
	}

	fn read_operator(&mut self) -> Result<AttributeOperator> {
		self.skip_spaces();
		let mut token = String::new();
		if let Some(c) = self.eat() {
			token.push(c);
		}
		if token != "=" && !self.eol() {
			if let Some(c) = self.eat() {
				token.push(c);
			}
		}
		AttributeOperator::from_token(&token).ok_or_else(|| self.syntax_error(Some("parsing operator")))
	}

	fn read_attribute(&mut self, allow_unquoted_strings: bool) -> Result<AttributeSelectorPart> {
		self.pos += 1;
		let mut json_path = vec![self.read_attribute_token()?];
		self.skip_spaces();
		while self.next() == Some('.') {
			self.pos += 1;
			json_path.push(self.read_attribute_token()?);
			self.skip_spaces();
		}
		if self.next() == Some(']') {
			self.pos += 1;
			return Ok(AttributeSelectorPart {
				name: json_path.join("."),
				json_path,
				op: AttributeOperator::Truthy,
				value: None,
				case_sensitive: false,
			});
		}

		let op = self.read_operator()?;
		let mut case_sensitive = true;
		self.skip_spaces();
		let value = match self.next() {
			Some('/') => {
				if op != AttributeOperator::Equals {
					return Err(InvalidSelectorError::new(format!(
						"Error while parsing selector `{}` - cannot use {} in attribute with regular expression",
						self.selector,
						op.as_str()
					)));
				}
				AttributeValue::Regex(self.read_regular_expression()?)
			}
			Some(quote @ ('\'' | '"')) => {
				let value = self.read_quoted_string(quote)?;
				self.skip_spaces();
				match self.next() {
					Some('i' | 'I') => {
						case_sensitive = false;
						self.pos += 1;
					}
					Some('s' | 'S') => self.pos += 1,
					_ => {}
				}
				AttributeValue::String(value)
			}
			_ => {
				let mut raw = String::new();
				while let Some(c) = self
					.next()
					.filter(|&c| is_css_name_char(c) || c == '+' || c == '.')
				{
					raw.push(c);
					self.pos += 1;
				}
				match raw.as_str() {
					"true" => AttributeValue::Bool(true),
					"false" => AttributeValue::Bool(false),
					_ if allow_unquoted_strings => AttributeValue::String(raw),
					"" => AttributeValue::Number(0.0),
					_ => AttributeValue::Number(
						raw.parse()
							.map_err(|_| self.syntax_error(Some("parsing attribute value")))?,
					),
				}
			}
		};
		self.skip_spaces();
		if self.next() != Some(']') {
			return Err(self.syntax_error(Some("parsing attribute value")));
		}
		self.pos += 1;

		if op != AttributeOperator::Equals && !matches!(value, AttributeValue::String(_)) {
			let shown = match &value {
				AttributeValue::Regex(regex) => regex.to_string(),
				AttributeValue::Bool(b) => b.to_string(),
				AttributeValue::Number(n) => n.to_string(),
				AttributeValue::String(s) => s.clone(),
			};
			return Err(InvalidSelectorError::new(format!(
				"Error while parsing selector `{}` - cannot use {} in attribute with non-string matching value - {shown}",
				self.selector,
				op.as_str()
			)));
		}

		Ok(AttributeSelectorPart {
			name: json_path.join("."),
			json_path,
			op,
			value: Some(value),
			case_sensitive,
		})
	}
}

fn is_css_name_char(c: char) -> bool {
	c >= '\u{80}' || c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn role_with_name_and_states() {
		let parsed =
			parse_attribute_selector(r#"button[name="Sign in"i][pressed=true][level=2]"#, true)
				.unwrap();
		assert_eq!(parsed.name, "button");
		assert_eq!(parsed.attributes.len(), 3);
		assert_eq!(parsed.attributes[0].op, AttributeOperator::Equals);
		assert_eq!(
			parsed.attributes[0].value,
			Some(AttributeValue::String("Sign in".to_string()))
		);
		assert!(!parsed.attributes[0].case_sensitive);
		assert_eq!(parsed.attributes[1].value, Some(AttributeValue::Bool(true)));
		assert_eq!(parsed.attributes[2].value, Some(AttributeValue::String("2".into())));
	}

	#[test]
	fn numbers_when_unquoted_strings_disallowed() {
		let parsed = parse_attribute_selector("heading[level=2]", false).unwrap();
		assert_eq!(parsed.attributes[0].value, Some(AttributeValue::Number(2.0)));
		assert!(parse_attribute_selector("heading[level=abc]", false).is_err());
	}

	#[test]
	fn truthy_and_json_path() {
		let parsed = parse_attribute_selector("[disabled] [a.b.c = 'x']", true).unwrap();
		assert_eq!(parsed.name, "");
		assert_eq!(parsed.attributes[0].op, AttributeOperator::Truthy);
		assert_eq!(parsed.attributes[1].json_path, vec!["a", "b", "c"]);
		assert_eq!(parsed.attributes[1].name, "a.b.c");
	}

	#[test]
	fn regex_values() {
		let parsed = parse_attribute_selector(r"[name=/sub\/mit/i]", true).unwrap();
		let Some(AttributeValue::Regex(regex)) = &parsed.attributes[0].value else {
			panic!("expected regex");
		};
		assert!(regex.is_match("SUB/MIT"));
		let err = parse_attribute_selector("[name*=/x/]", true).unwrap_err();
		assert!(err.message().contains("cannot use *= in attribute with regular expression"));
	}

	#[test]
	fn error_messages() {
		let err = parse_attribute_selector("button[name=", true).unwrap_err();
		assert_eq!(
			err.message(),
			"Unexpected end of selector while parsing selector `button[name=`"
		);
		let err = parse_attribute_selector("button[name=\"x\"] !", true).unwrap_err();
		assert_eq!(
			err.message(),
			"Error while parsing selector `button[name=\"x\"] !` - unexpected symbol \"!\" at position 17"
		);
		let err = parse_attribute_selector("   ", true).unwrap_err();
		assert!(err.message().ends_with("selector cannot be empty"));
	}

	#[test]
	fn matching_string_parts() {
		let part = |op, value: &str, case_sensitive| AttributeSelectorPart {
			name: "name".into(),
			json_path: vec!["name".into()],
			op,
			value: Some(AttributeValue::String(value.into())),
			case_sensitive,
		};
		assert!(part(AttributeOperator::Equals, "save", false).matches_str(Some("SAVE")));
		assert!(!part(AttributeOperator::Equals, "save", true).matches_str(Some("SAVE")));
		assert!(part(AttributeOperator::Contains, "av", true).matches_str(Some("save")));
		assert!(part(AttributeOperator::Word, "b", true).matches_str(Some("a b")));
		assert!(!part(AttributeOperator::Equals, "x", true).matches_str(None));
	}
}
