use std::{fmt, io};

use crate::error::{Error, ErrorKind};
use crate::utils::HtmlEscape;

/// An abstraction over [`fmt::Write`](std::fmt::Write) for the rendering.
///
/// Text nodes and raw variables are written as they are, everything else
/// goes through [`Output::write_escaped`].
pub struct Output<'a> {
    w: &'a mut (dyn fmt::Write + 'a),
}

impl<'a> Output<'a> {
    /// Creates a new output.
    pub(crate) fn new(w: &'a mut (dyn fmt::Write + 'a)) -> Self {
        Self { w }
    }

    /// Writes some data to the underlying buffer without escaping.
    #[inline]
    pub fn write_str(&mut self, s: &str) -> fmt::Result {
        self.w.write_str(s)
    }

    /// Writes a string with HTML escaping applied.
    #[inline]
    pub fn write_escaped(&mut self, s: &str) -> fmt::Result {
        write!(self.w, "{}", HtmlEscape(s))
    }
}

impl fmt::Write for Output<'_> {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        fmt::Write::write_str(self.w, s)
    }

    #[inline]
    fn write_char(&mut self, c: char) -> fmt::Result {
        fmt::Write::write_char(self.w, c)
    }
}

/// Adapts an [`io::Write`] for the renderer and keeps the I/O error.
pub struct WriteWrapper<W> {
    pub w: W,
    pub err: Option<io::Error>,
}

impl<W> WriteWrapper<W> {
    /// Replaces the given error with the held error if available.
    pub fn take_err(&mut self, original: Error) -> Error {
        self.err
            .take()
            .map(|io_err| {
                Error::new(ErrorKind::WriteFailure, "I/O error during rendering")
                    .with_source(io_err)
            })
            .unwrap_or(original)
    }
}

impl<W: io::Write> fmt::Write for WriteWrapper<W> {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.w.write_all(s.as_bytes()).map_err(|e| {
            self.err = Some(e);
            fmt::Error
        })
    }
}
