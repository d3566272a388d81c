//! <div align=center>
//!   <p><strong>Mandira: a logic-light template engine with filters</strong></p>
//! </div>
//!
//! Mandira is a mustache style template engine.  Templates are parsed once
//! into a tree and can then be rendered any number of times against
//! arbitrary data that implements [`Serialize`](serde::Serialize).  On top
//! of the classic mustache tags it supports a chain of filters on
//! variables and `{{?if}}` conditionals with comparisons and boolean
//! operators.
//!
//! ```
//! use mandira::{context, render};
//!
//! let rv = render("Hello {{name|title}}!", context! { name => "john" }).unwrap();
//! assert_eq!(rv, "Hello John!");
//! ```
//!
//! # Syntax
//!
//! | Tag | Meaning |
//! |---|---|
//! | `{{name}}` | Looks up `name` and writes it HTML escaped |
//! | `{{{name}}}` | Writes the value without escaping |
//! | `{{! text }}` | A comment, produces nothing |
//! | `{{#name}}...{{/name}}` | A section, see below |
//! | `{{?if expr}}...{{?else}}...{{/if}}` | A conditional |
//!
//! Names are looked up in a chain of contexts from the innermost to the
//! outermost one.  Inside sections `.` refers to the current value and
//! `.index`/`.index1` to the zero or one based position of the current
//! item of a sequence.
//!
//! Sections render nothing when their value is absent, `false`, an empty
//! string or an empty sequence.  A sequence renders the body once per
//! item with the item as the innermost context, a record renders the body
//! once with the record as innermost context and any other value renders
//! the body once without changing the context.  The newline directly after
//! a section's opening tag is dropped.
//!
//! Variables and conditional operands may carry filters:
//!
//! ```text
//! {{names|index(0)|upper}}
//! {{price|format("$%.2f")}}
//! {{?if age >= 18 and not banned}}...{{/if}}
//! ```
//!
//! Conditions combine comparisons (`<`, `<=`, `>`, `>=`, `==`, `!=`) with
//! `and`, `or`, `not` and parentheses.  All comparisons are evaluated
//! before the boolean operators are applied strictly from left to right.
//!
//! # Failure Model
//!
//! Parsing reports structural problems as an [`Error`] with the line of
//! the offending tag.  Rendering never fails: names that do not resolve,
//! unknown filters or filters that fail make that one expression render as
//! empty text.  With the `tracing` feature these events are emitted as
//! `tracing` debug events.
//!
//! # Optional Features
//!
//! - `builtins`: registers the built-in [`filters`].
//! - `loader`: enables the [`Loader`] for template directories.
//! - `preserve_order`: records keep the insertion order of their keys.
//! - `tracing`: emits diagnostics through the `tracing` crate.
#![allow(clippy::get_first)]
#![allow(clippy::new_without_default)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

#[macro_use]
mod macros;

mod compiler;
mod environment;
mod error;
mod format_utils;
mod output;
mod template;
mod utils;
mod vm;

pub mod filters;
pub mod value;

#[cfg(feature = "loader")]
mod loader;

use std::path::Path;
use std::sync::OnceLock;

use serde::Serialize;

#[cfg(feature = "loader")]
#[cfg_attr(docsrs, doc(cfg(feature = "loader")))]
pub use self::loader::Loader;

pub use self::environment::Environment;
pub use self::error::{Error, ErrorKind};
pub use self::template::Template;
pub use self::utils::HtmlEscape;

/// Re-export for convenience.
pub use self::value::Value;

pub use self::macros::__context;

static DEFAULT_ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

/// Returns the process wide default environment.
///
/// Unless [`set_default_environment`] was called before, this is
/// initialized to [`Environment::new`] on first use.
pub fn default_environment() -> &'static Environment {
    DEFAULT_ENVIRONMENT.get_or_init(Environment::new)
}

/// Installs the process wide default environment.
///
/// This can happen only once and has to happen before the default
/// environment was first used.  Otherwise the environment is handed back.
///
/// ```
/// # use mandira::{render, set_default_environment, Environment};
/// let mut env = Environment::new();
/// env.add_filter("reverse", |v: String| v.chars().rev().collect::<String>());
/// set_default_environment(env).unwrap();
/// assert_eq!(render("{{x|reverse}}", mandira::context! { x => "abc" }).unwrap(), "cba");
/// ```
pub fn set_default_environment(env: Environment) -> Result<(), Environment> {
    DEFAULT_ENVIRONMENT.set(env)
}

/// Parses and renders a template with the default environment.
pub fn render<S: Serialize>(source: &str, ctx: S) -> Result<String, Error> {
    default_environment().render_str(source, ctx)
}

/// Parses a template and a layout and renders the template inside of the
/// layout.
///
/// ```
/// # use mandira::{context, render_in_layout};
/// let rv = render_in_layout(
///     "Hi {{name}}",
///     "<main>{{{content}}}</main>",
///     context! { name => "Ann" },
/// ).unwrap();
/// assert_eq!(rv, "<main>Hi Ann</main>");
/// ```
pub fn render_in_layout<S: Serialize>(source: &str, layout: &str, ctx: S) -> Result<String, Error> {
    let tmpl = ok!(Template::new(source));
    let layout = ok!(Template::new(layout));
    Ok(tmpl.render_in_layout(&layout, ctx))
}

/// Reads, parses and renders a template file with the default environment.
pub fn render_file<P: AsRef<Path>, S: Serialize>(path: P, ctx: S) -> Result<String, Error> {
    Template::from_file(path).map(|tmpl| tmpl.render(ctx))
}

/// Reads a template file and a layout file and renders the template inside
/// of the layout.
pub fn render_file_in_layout<P, L, S>(path: P, layout_path: L, ctx: S) -> Result<String, Error>
where
    P: AsRef<Path>,
    L: AsRef<Path>,
    S: Serialize,
{
    let tmpl = ok!(Template::from_file(path));
    let layout = ok!(Template::from_file(layout_path));
    Ok(tmpl.render_in_layout(&layout, ctx))
}
