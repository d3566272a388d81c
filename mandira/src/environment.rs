use std::borrow::Cow;
use std::collections::BTreeMap;
use std::{fmt, io};

use serde::Serialize;

use crate::error::Error;
use crate::filters::{self, BoxedFilter, Filter};
use crate::output::{Output, WriteWrapper};
use crate::template::Template;
use crate::value::{FunctionArgs, FunctionResult, Value};
use crate::vm::{Context, Vm};

/// An abstraction that holds the engine configuration.
///
/// The environment owns the filter registry and renders templates.  Since
/// registering filters requires a mutable reference, an environment is
/// usually configured once and then shared read-only, which is safe across
/// threads.
///
/// There are generally two ways to construct an environment:
///
/// * [`Environment::new`] creates an environment with all built-in filters.
/// * [`Environment::empty`] creates a completely blank environment.
///
/// ```
/// # use mandira::{context, Environment, Template};
/// let env = Environment::new();
/// let tmpl = Template::new("Hello {{name|upper}}!").unwrap();
/// let rv = env.render(&tmpl, &[context! { name => "world" }]);
/// assert_eq!(rv, "Hello WORLD!");
/// ```
#[derive(Clone)]
pub struct Environment {
    filters: BTreeMap<Cow<'static, str>, BoxedFilter>,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::empty()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Environment {
    /// Creates a new environment with sensible defaults.
    ///
    /// This environment contains all built-in filters.
    pub fn new() -> Environment {
        Environment {
            filters: filters::get_builtin_filters(),
        }
    }

    /// Creates a completely empty environment.
    ///
    /// Variables still render but every filter call yields empty text.
    pub fn empty() -> Environment {
        Environment {
            filters: BTreeMap::new(),
        }
    }

    /// Adds a new filter function.
    ///
    /// Filters are functions that receive the current value as the first
    /// argument.  For details about filters have a look at
    /// [`filters`](crate::filters).  Registering a filter under an existing
    /// name replaces it.
    pub fn add_filter<N, F, Rv, Args>(&mut self, name: N, f: F)
    where
        N: Into<Cow<'static, str>>,
        F: Filter<Rv, Args>,
        Rv: FunctionResult,
        Args: FunctionArgs,
    {
        self.filters.insert(name.into(), BoxedFilter::new(f));
    }

    /// Removes a filter by name.
    pub fn remove_filter(&mut self, name: &str) {
        self.filters.remove(name);
    }

    /// Returns `true` if a filter with that name is registered.
    pub fn has_filter(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    pub(crate) fn get_filter(&self, name: &str) -> Option<&BoxedFilter> {
        self.filters.get(name)
    }

    /// Renders a template against a context chain.
    ///
    /// The first value of `chain` is the innermost frame: names are looked
    /// up there first and then in each following value.  Rendering itself
    /// cannot fail; names that do not resolve and failing filters produce
    /// empty text.
    pub fn render(&self, tmpl: &Template, chain: &[Value]) -> String {
        let mut rv = String::with_capacity(tmpl.source().len());
        let mut ctx = Context::new(chain);
        // a `String` sink never reports an error
        Vm::new(self)
            .render(tmpl.nodes(), &mut ctx, &mut Output::new(&mut rv))
            .ok();
        rv
    }

    /// Renders a template into an [`io::Write`].
    ///
    /// The only error returned is a
    /// [`WriteFailure`](crate::ErrorKind::WriteFailure) of the writer.
    pub fn render_to_write<W: io::Write>(
        &self,
        tmpl: &Template,
        chain: &[Value],
        w: W,
    ) -> Result<(), Error> {
        let mut wrapper = WriteWrapper { w, err: None };
        let mut ctx = Context::new(chain);
        Vm::new(self)
            .render(tmpl.nodes(), &mut ctx, &mut Output::new(&mut wrapper))
            .map_err(|err| wrapper.take_err(Error::from(err)))
    }

    /// Renders a template and then renders `layout` with the result.
    ///
    /// The layout sees the rendered template as `content` in a new
    /// innermost frame in front of `chain`.  Since variables are escaped by
    /// default the layout will usually want `{{{content}}}`.
    ///
    /// ```
    /// # use mandira::{context, Environment, Template};
    /// let env = Environment::new();
    /// let page = Template::new("<p>{{msg}}</p>").unwrap();
    /// let layout = Template::new("<body>{{{content}}}</body>").unwrap();
    /// let rv = env.render_in_layout(&page, &layout, &[context! { msg => "hi" }]);
    /// assert_eq!(rv, "<body><p>hi</p></body>");
    /// ```
    pub fn render_in_layout(&self, tmpl: &Template, layout: &Template, chain: &[Value]) -> String {
        let content = self.render(tmpl, chain);
        let mut layout_chain = Vec::with_capacity(chain.len() + 1);
        layout_chain.push(Value::from_iter([("content", Value::from(content))]));
        layout_chain.extend(chain.iter().cloned());
        self.render(layout, &layout_chain)
    }

    /// Parses and renders a template from a string in one go.
    ///
    /// The context can be anything that implements [`Serialize`], usually
    /// a [`context!`](crate::context!) or a [`Value`].
    pub fn render_str<S: Serialize>(&self, source: &str, ctx: S) -> Result<String, Error> {
        let tmpl = ok!(Template::new(source));
        Ok(self.render(&tmpl, &[Value::from_serialize(&ctx)]))
    }
}
