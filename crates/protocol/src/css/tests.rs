use pretty_assertions::assert_eq;

use super::*;

fn single(selector: &str) -> CssComplexSelector {
	let mut list = parse_css(selector).unwrap();
	assert_eq!(list.len(), 1, "expected one complex selector in {selector:?}");
	list.remove(0)
}

#[test]
fn combinators_attach_to_preceding_simple() {
	let complex = single("#a > #b #c");
	let combinators: Vec<_> = complex.simples().iter().map(|s| s.combinator).collect();
	assert_eq!(
		combinators,
		vec![Combinator::Child, Combinator::Descendant, Combinator::Descendant]
	);
	assert_eq!(complex.text(), "#a > #b #c");
}

#[test]
fn self_or_ancestor_combinator() {
	let complex = single("section >= div");
	assert_eq!(complex.simples()[0].combinator, Combinator::SelfOrAncestor);
	assert_eq!(complex.text(), "section >= div");
}

#[test]
fn compound_parts() {
	let complex = single("DIV.item.active#main[data-x=\"1\" i]:first-child");
	let css = complex.simples()[0].selector.css().unwrap();
	assert_eq!(css.tag.as_deref(), Some("div"));
	assert_eq!(css.ids, vec!["main".to_string()]);
	assert_eq!(css.classes, vec!["item".to_string(), "active".to_string()]);
	assert_eq!(
		css.attributes,
		vec![AttributeCondition {
			name: "data-x".to_string(),
			matcher: AttributeMatch::Equals("1".to_string()),
			case_insensitive: true,
		}]
	);
	assert_eq!(css.pseudo_classes, vec![PseudoClass::FirstChild]);
}

#[test]
fn custom_functions_are_split_from_native_css() {
	let complex = single("button:has-text(\"Save\"):visible");
	let simple = &complex.simples()[0].selector;
	assert_eq!(simple.css().and_then(|c| c.tag.as_deref()), Some("button"));
	let names: Vec<_> = simple.functions().iter().map(|f| f.name.as_str()).collect();
	assert_eq!(names, vec!["has-text", "visible"]);
	assert_eq!(
		simple.functions()[0].args,
		vec![CssFunctionArgument::String("Save".to_string())]
	);
	assert_eq!(simple.text(), "button:has-text(\"Save\"):visible");
}

#[test]
fn function_only_simple_has_no_css() {
	let complex = single(":scope > span");
	assert!(complex.simples()[0].selector.css().is_none());
	assert!(complex.has_function("scope"));
}

#[test]
fn leading_combinator_inserts_scope() {
	let complex = single("div:has(> span.icon)");
	let CssFunctionArgument::Selector(inner) = &complex.simples()[0].selector.functions()[0].args[0]
	else {
		panic!("expected selector argument");
	};
	assert_eq!(inner.simples().len(), 2);
	assert!(inner.has_function("scope"));
	assert_eq!(inner.simples()[0].combinator, Combinator::Child);
	assert_eq!(inner.text(), ":scope > span.icon");
}

#[test]
fn spatial_arguments_take_numbers() {
	let complex = single("input:right-of(label, 25.5)");
	let args = &complex.simples()[0].selector.functions()[0].args;
	assert!(matches!(args[0], CssFunctionArgument::Selector(_)));
	assert_eq!(args[1], CssFunctionArgument::Number(25.5));
}

#[test]
fn selector_lists() {
	let list = parse_css("a, button , [role=button]").unwrap();
	let texts: Vec<_> = list.iter().map(|c| c.text().to_string()).collect();
	assert_eq!(texts, vec!["a", "button", "[role=\"button\"]"]);
}

#[test]
fn escapes_are_decoded() {
	let complex = single("#\\31 23.a\\:b");
	let css = complex.simples()[0].selector.css().unwrap();
	assert_eq!(css.ids, vec!["123".to_string()]);
	assert_eq!(css.classes, vec!["a:b".to_string()]);
	assert_eq!(complex.text(), "#\\31 23.a\\:b");
}

#[test]
fn nth_child_forms() {
	let parse_nth_of = |s: &str| {
		let complex = single(s);
		complex.simples()[0].selector.css().unwrap().pseudo_classes[0]
	};
	assert_eq!(
		parse_nth_of("li:nth-child(2n+1)"),
		PseudoClass::NthChild(NthIndex { a: 2, b: 1 })
	);
	assert_eq!(
		parse_nth_of("li:nth-child(odd)"),
		PseudoClass::NthChild(NthIndex { a: 2, b: 1 })
	);
	assert_eq!(
		parse_nth_of("li:nth-of-type(3)"),
		PseudoClass::NthOfType(NthIndex { a: 0, b: 3 })
	);
	assert_eq!(
		parse_nth_of("li:nth-last-child(-n + 2)"),
		PseudoClass::NthLastChild(NthIndex { a: -1, b: 2 })
	);
}

#[test]
fn nth_index_matching() {
	let odd = NthIndex { a: 2, b: 1 };
	assert!(odd.matches(1));
	assert!(!odd.matches(2));
	assert!(odd.matches(3));
	let first_two = NthIndex { a: -1, b: 2 };
	assert!(first_two.matches(1));
	assert!(first_two.matches(2));
	assert!(!first_two.matches(3));
	assert!(NthIndex { a: 0, b: 4 }.matches(4));
}

#[test]
fn attribute_condition_operators() {
	let cond = |matcher, case_insensitive| AttributeCondition {
		name: "x".to_string(),
		matcher,
		case_insensitive,
	};
	assert!(cond(AttributeMatch::Exists, false).matches(Some("")));
	assert!(!cond(AttributeMatch::Exists, false).matches(None));
	assert!(cond(AttributeMatch::Includes("b".into()), false).matches(Some("a b c")));
	assert!(!cond(AttributeMatch::Includes("b c".into()), false).matches(Some("a b c")));
	assert!(cond(AttributeMatch::DashMatch("en".into()), false).matches(Some("en-US")));
	assert!(!cond(AttributeMatch::DashMatch("en".into()), false).matches(Some("english")));
	assert!(cond(AttributeMatch::Prefix("ab".into()), false).matches(Some("abc")));
	assert!(!cond(AttributeMatch::Prefix(String::new()), false).matches(Some("abc")));
	assert!(cond(AttributeMatch::Suffix("BC".into()), true).matches(Some("abc")));
	assert!(cond(AttributeMatch::Substring("b".into()), false).matches(Some("abc")));
	assert!(!cond(AttributeMatch::Equals("ABC".into()), false).matches(Some("abc")));
}

#[test]
fn rejects_malformed_css() {
	let err = parse_css("div >").unwrap_err();
	assert_eq!(
		err.message(),
		"Unexpected token \"\" while parsing css selector \"div >\". Did you mean to CSS.escape it?"
	);
	let err = parse_css("a b$c").unwrap_err();
	assert!(err.message().starts_with("Unexpected token \"$\""));
	assert!(parse_css("").is_err());
	assert!(parse_css("p::before").is_err());
	assert!(parse_css("a:hover").is_err());
	assert!(parse_css("div:has(span").is_err());
	assert!(parse_css("[data-x=\"unterminated]").is_err());
}

#[test]
fn canonical_text_normalizes_spelling() {
	let a = single("div   >   span[data-id='x']");
	let b = single("div>span[data-id=x]");
	assert_eq!(a.text(), b.text());
	assert_eq!(a.text(), "div > span[data-id=\"x\"]");
}
