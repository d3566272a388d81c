use std::borrow::Cow;
use std::fmt;

/// Represents template errors.
///
/// Parsing a template is the only step that fails hard.  Errors raised
/// while rendering (a filter refusing its arguments, a missing filter)
/// never escape a render call, they only blank out the expression that
/// produced them.
///
/// # Example
///
/// Here is an example of how you might want to report errors:
///
/// ```rust
/// match mandira::Template::new("{{#a}}never closed") {
///     Ok(_) => unreachable!(),
///     Err(err) => {
///         eprintln!("Could not parse template:");
///         eprintln!("  {}", err);
///     }
/// }
/// ```
pub struct Error {
    kind: ErrorKind,
    detail: Option<Cow<'static, str>>,
    name: Option<String>,
    lineno: usize,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("detail", &self.detail)
            .field("name", &self.name)
            .field("lineno", &self.lineno)
            .field("source", &self.source)
            .finish()
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind()
    }
}

impl Eq for Error {}

/// An enum describing the error kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The expression tokenizer or parser rejected a tag.
    SyntaxError,
    /// The template structure is broken (unbalanced tags and similar).
    ParseError,
    /// A template could not be found or read.
    TemplateNotFound,
    /// A filter is not registered with the environment.
    UnknownFilter,
    /// An object does not expose the requested method.
    UnknownMethod,
    /// A filter was invoked with too few arguments.
    MissingArgument,
    /// A filter was invoked with arguments it cannot use.
    InvalidArguments,
    /// An operation could not be carried out.
    InvalidOperation,
    /// A value could not be converted into the internal format.
    BadSerialization,
    /// Writing the rendered output failed.
    WriteFailure,
}

impl ErrorKind {
    fn description(self) -> &'static str {
        match self {
            ErrorKind::SyntaxError => "syntax error",
            ErrorKind::ParseError => "parse error",
            ErrorKind::TemplateNotFound => "template not found",
            ErrorKind::UnknownFilter => "unknown filter",
            ErrorKind::UnknownMethod => "unknown method",
            ErrorKind::MissingArgument => "missing argument",
            ErrorKind::InvalidArguments => "invalid arguments",
            ErrorKind::InvalidOperation => "invalid operation",
            ErrorKind::BadSerialization => "could not serialize to internal format",
            ErrorKind::WriteFailure => "failed to write output",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref detail) = self.detail {
            write!(f, "{}: {}", self.kind, detail)?;
        } else {
            write!(f, "{}", self.kind)?;
        }
        match (&self.name, self.lineno) {
            (Some(name), 0) => write!(f, " (in {})", name)?,
            (Some(name), lineno) => write!(f, " (in {}:{})", name, lineno)?,
            (None, 0) => {}
            (None, lineno) => write!(f, " (line {})", lineno)?,
        }
        Ok(())
    }
}

impl Error {
    /// Creates a new error with kind and detail.
    pub fn new<D: Into<Cow<'static, str>>>(kind: ErrorKind, detail: D) -> Error {
        Error {
            kind,
            detail: Some(detail.into()),
            name: None,
            lineno: 0,
            source: None,
        }
    }

    pub(crate) fn at_line(mut self, lineno: usize) -> Error {
        self.lineno = lineno;
        self
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = Some(name.into());
    }

    /// Attaches another error as source to this error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error detail
    ///
    /// The detail is an error message that provides further details about
    /// the error kind.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the name of the template the error happened in.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the line the error happened on.
    pub fn line(&self) -> Option<usize> {
        if self.lineno > 0 {
            Some(self.lineno)
        } else {
            None
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|err| err.as_ref() as _)
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Error::new(ErrorKind::WriteFailure, "formatting failed")
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error {
            kind,
            detail: None,
            name: None,
            lineno: 0,
            source: None,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Error::new(ErrorKind::BadSerialization, msg.to_string())
    }
}
