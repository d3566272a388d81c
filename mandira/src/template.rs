use std::path::Path;
use std::{fmt, fs, io};

use serde::Serialize;

use crate::compiler::ast::Node;
use crate::compiler::scanner::parse;
use crate::error::{Error, ErrorKind};
use crate::value::Value;

/// A parsed template.
///
/// A template is parsed once and can then be rendered any number of times,
/// also concurrently from several threads.  It owns its source and does not
/// borrow from an [`Environment`](crate::Environment).
///
/// ```
/// # use mandira::{context, Template};
/// let tmpl = Template::new("{{#users}}{{.index1}}:{{name}} {{/users}}").unwrap();
/// let ctx = context! {
///     users => vec![context! { name => "ann" }, context! { name => "bob" }],
/// };
/// assert_eq!(tmpl.render(ctx), "1:ann 2:bob ");
/// ```
#[derive(Clone)]
pub struct Template {
    name: Option<String>,
    source: String,
    nodes: Vec<Node>,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ds = f.debug_struct("Template");
        ds.field("name", &self.name);
        ds.field("nodes", &self.nodes.len());
        ds.finish()
    }
}

impl Template {
    /// Parses a template from a string.
    ///
    /// Fails with a [`SyntaxError`](ErrorKind::SyntaxError) or
    /// [`ParseError`](ErrorKind::ParseError) carrying the line of the
    /// offending tag.
    pub fn new<S: Into<String>>(source: S) -> Result<Template, Error> {
        let source = source.into();
        let nodes = ok!(parse(&source));
        Ok(Template {
            name: None,
            source,
            nodes,
        })
    }

    /// Parses a template and gives it a name used in error messages.
    pub fn new_named<N, S>(name: N, source: S) -> Result<Template, Error>
    where
        N: Into<String>,
        S: Into<String>,
    {
        let name = name.into();
        let mut tmpl = ok!(Template::new(source).map_err(|mut err| {
            err.set_name(&name);
            err
        }));
        tmpl.name = Some(name);
        Ok(tmpl)
    }

    /// Reads and parses a template file.
    ///
    /// The path becomes the name of the template.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Template, Error> {
        let path = path.as_ref();
        let source = ok!(read_template(path, &path.display().to_string()));
        Template::new_named(path.display().to_string(), source)
    }

    /// Returns the name of the template if it has one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the source code of the template.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Renders the template with the default environment.
    ///
    /// The context can be anything that implements [`Serialize`].  To
    /// render against a chain of several contexts use
    /// [`Environment::render`](crate::Environment::render).
    pub fn render<S: Serialize>(&self, ctx: S) -> String {
        crate::default_environment().render(self, &[Value::from_serialize(&ctx)])
    }

    /// Renders the template inside `layout` with the default environment.
    ///
    /// See [`Environment::render_in_layout`](crate::Environment::render_in_layout).
    pub fn render_in_layout<S: Serialize>(&self, layout: &Template, ctx: S) -> String {
        crate::default_environment().render_in_layout(self, layout, &[Value::from_serialize(&ctx)])
    }
}

pub(crate) fn read_template(path: &Path, name: &str) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|err| {
        let kind = match err.kind() {
            io::ErrorKind::InvalidData => ErrorKind::InvalidOperation,
            _ => ErrorKind::TemplateNotFound,
        };
        Error::new(
            kind,
            format!("template {} does not exist or cannot be loaded", name),
        )
        .with_source(err)
    })
}
