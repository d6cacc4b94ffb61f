//! pw-locator: selector resolution and locator generation over a static DOM
//!
//! Resolves `engine=body >> engine=body` selectors (CSS with custom
//! pseudo-classes, text, role, test ids, labels, nested `has`/`and`/`or`,
//! spatial relations) against a [`Document`], piercing open shadow roots,
//! and generates the cheapest selector that re-identifies a given element.
//!
//! # Examples
//!
//! ```ignore
//! use pw_locator::{Document, GenerateOptions, Selectors};
//!
//! let doc = Document::parse_html(r#"<button>Submit</button><button>Cancel</button>"#)?;
//! let selectors = Selectors::new(&doc);
//!
//! let parsed = selectors.parse_selector("internal:role=button[name=\"Submit\"i]")?;
//! let button = selectors.query(&parsed, doc.root())?.unwrap();
//!
//! let generated = selectors.generate(button, &GenerateOptions::default())?;
//! assert_eq!(generated.selector, "internal:role=button[name=\"Submit\"i]");
//! assert_eq!(generated.elements, vec![button]);
//! ```
//!
//! Geometry and accessibility come from the [`Layout`] and
//! [`Accessibility`] traits. [`StaticLayout`] and [`HtmlAccessibility`]
//! are used unless others are supplied through [`Selectors::with_layout`]
//! and [`Selectors::with_accessibility`].

pub mod aria;
pub mod dispatch;
pub mod dom;
pub mod error;
pub mod evaluator;
pub mod generator;
pub mod layout;
pub mod spatial;
pub mod text;

pub use aria::{Accessibility, AriaState, HtmlAccessibility};
pub use dispatch::{PART_ENGINES, PartEngine, Selectors};
pub use dom::{Document, NodeId, NodeKind, ShadowRootMode};
pub use error::{Error, Result};
pub use evaluator::{Evaluator, QueryContext};
pub use generator::{GenerateOptions, GeneratedSelector, IconPolicy, is_guid_like};
pub use layout::{ElementBox, GeneratedContent, Layout, Rect, StaticLayout};
pub use pw_protocol::{ParsedSelector, parse_selector, stringify_selector};
pub use spatial::SpatialRelation;
