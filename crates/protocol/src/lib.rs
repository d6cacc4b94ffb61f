//! Selector grammar shared by the locator engine and its front ends.
//!
//! This crate owns the textual surface of the selector language and nothing
//! else: it never touches a document. Everything here is a pure function from
//! strings to typed trees and back.
//!
//! # Main Types
//!
//! - [`ParsedSelector`] - `engine=body` parts joined by `>>`, with optional capture
//! - [`CssComplexSelector`] - one chain of simple selectors and combinators
//! - [`CompoundSelector`] - the native CSS predicate of a simple selector
//! - [`AttributeSelector`] - `name[attr=value]...` bodies of role/attribute engines
//! - [`RegexLiteral`] - a `/source/flags` literal compiled to a [`regex::Regex`]
//!
//! Round-tripping is exact for every selector the generator emits:
//! `stringify_selector(&parse_selector(s)?) == s`.

pub mod attribute;
pub mod css;
pub mod error;
pub mod escape;
pub mod regex_literal;
pub mod selector;

pub use attribute::{
	AttributeOperator, AttributeSelector, AttributeSelectorPart, AttributeValue,
	parse_attribute_selector,
};
pub use css::{
	AttributeCondition, AttributeMatch, Combinator, CompoundSelector, CssComplexSelector,
	CssComplexSelectorList, CssFunction, CssFunctionArgument, CssSimpleSelector,
	CssSimpleWithCombinator, NthIndex, PseudoClass, parse_css,
};
pub use error::{InvalidSelectorError, Result};
pub use regex_literal::RegexLiteral;
pub use selector::{
	CUSTOM_CSS_NAMES, NESTED_SELECTOR_NAMES, NestedSelectorBody, ParsedSelector, PartBody,
	SPATIAL_SELECTOR_NAMES, SelectorPart, parse_selector, stringify_selector,
	visit_all_selector_parts,
};
