use std::fmt;
#[cfg(feature = "loader")]
use std::path::{Path, PathBuf};

/// Helper for HTML escaping with a [`Display`](std::fmt::Display) interface.
///
/// Only `"`, `'`, `&`, `<` and `>` are replaced.
pub struct HtmlEscape<'a>(pub &'a str);

impl fmt::Display for HtmlEscape<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        let mut start = 0;

        for (i, b) in s.bytes().enumerate() {
            let escaped = match b {
                b'"' => "&quot;",
                b'\'' => "&apos;",
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                _ => continue,
            };
            // all replaced bytes are ascii so slicing stays on char boundaries
            if start < i {
                ok!(f.write_str(&s[start..i]));
            }
            ok!(f.write_str(escaped));
            start = i + 1;
        }

        if start < s.len() {
            ok!(f.write_str(&s[start..]));
        }
        Ok(())
    }
}

/// Joins a `/` separated template path onto a base directory.
///
/// Segments starting with a dot or containing a backslash are refused.
#[cfg(feature = "loader")]
pub fn safe_join(base: &Path, template: &str) -> Option<PathBuf> {
    let mut rv = base.to_path_buf();
    for segment in template.split('/') {
        if segment.starts_with('.') || segment.contains('\\') {
            return None;
        }
        rv.push(segment);
    }
    Some(rv)
}
