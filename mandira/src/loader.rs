use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memo_map::MemoMap;

use crate::error::{Error, ErrorKind};
use crate::template::{read_template, Template};
use crate::utils::safe_join;

const TEMPLATE_EXTENSIONS: [&str; 3] = ["mnd", "mandira", "mda"];

fn not_found(path: &str) -> Error {
    Error::new(
        ErrorKind::TemplateNotFound,
        format!("template {} does not exist or cannot be loaded", path),
    )
}

/// Loads templates from a directory and caches them.
///
/// Templates are addressed by their `/` separated path relative to the
/// root directory.  Paths with segments starting with a dot or containing
/// a backslash cannot be loaded.
///
/// With `preload` the whole directory tree is parsed up front and only
/// templates found during that walk (or [`add`](Self::add)ed later) can be
/// retrieved.  Otherwise templates are parsed on first access and kept for
/// further lookups.
///
/// ```no_run
/// # use mandira::{context, Loader};
/// # fn test() -> Result<(), mandira::Error> {
/// let loader = Loader::new("templates", false)?;
/// let tmpl = loader.get("users/list.mnd")?;
/// println!("{}", tmpl.render(context! { users => Vec::<String>::new() }));
/// # Ok(()) }
/// ```
pub struct Loader {
    root: PathBuf,
    preload: bool,
    cache: MemoMap<String, Arc<Template>>,
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("root", &self.root)
            .field("preload", &self.preload)
            .field("cache", &self.cache.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Loader {
    /// Creates a loader for a root directory.
    ///
    /// With `preload` the directory is walked right away and the first
    /// template that fails to parse is reported.
    pub fn new<P: AsRef<Path>>(root: P, preload: bool) -> Result<Loader, Error> {
        let mut rv = Loader {
            root: root.as_ref().to_path_buf(),
            preload,
            cache: MemoMap::new(),
        };
        if preload {
            ok!(rv.refresh());
        }
        Ok(rv)
    }

    /// Checks if a path names a template file by its extension.
    ///
    /// ```
    /// # use mandira::Loader;
    /// assert!(Loader::is_template("index.mnd"));
    /// assert!(Loader::is_template("a/b/page.mandira"));
    /// assert!(!Loader::is_template("style.css"));
    /// ```
    pub fn is_template<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| TEMPLATE_EXTENSIONS.contains(&ext))
    }

    /// Returns the template for a path.
    pub fn get(&self, path: &str) -> Result<Arc<Template>, Error> {
        if let Some(tmpl) = self.cache.get(path) {
            return Ok(tmpl.clone());
        }
        if self.preload {
            return Err(not_found(path));
        }
        self.cache
            .get_or_try_insert(&path.to_string(), || -> Result<_, Error> {
                let full_path = ok!(safe_join(&self.root, path).ok_or_else(|| not_found(path)));
                debug!(path, "loading template");
                let source = ok!(read_template(&full_path, path));
                Template::new_named(path, source).map(Arc::new)
            })
            .map(Arc::clone)
    }

    /// Walks the root directory again and parses every template in it.
    ///
    /// Templates added with [`add`](Self::add) stay in the cache unless a
    /// file with the same path replaces them.
    pub fn refresh(&mut self) -> Result<(), Error> {
        let mut found = Vec::new();
        walk_templates(&self.root, String::new(), &mut found);
        for (name, full_path) in found {
            let source = ok!(read_template(&full_path, &name));
            let tmpl = ok!(Template::new_named(name.clone(), source));
            trace!(name = %name, "cached template");
            self.cache.replace(name, Arc::new(tmpl));
        }
        Ok(())
    }

    /// Adds a template sourced from elsewhere under the given path.
    pub fn add<P: Into<String>>(&mut self, path: P, template: Template) {
        self.cache.replace(path.into(), Arc::new(template));
    }

    /// Iterates over all cached templates.
    pub fn cache(&self) -> impl Iterator<Item = (&str, &Arc<Template>)> {
        self.cache.iter().map(|(name, tmpl)| (name.as_str(), tmpl))
    }
}

/// Collects all template files below `dir`.  Unreadable entries are
/// skipped.
fn walk_templates(dir: &Path, prefix: String, found: &mut Vec<(String, PathBuf)>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_err) => {
            debug!(dir = %dir.display(), error = %_err, "cannot read template directory");
            return;
        }
    };
    debug!(dir = %dir.display(), "walking template directory");
    let mut entries = entries.filter_map(Result::ok).collect::<Vec<_>>();
    entries.sort_by_key(|entry| entry.file_name());
    for entry in entries {
        let file_name = entry.file_name();
        let file_name = match file_name.to_str() {
            Some(file_name) => file_name,
            None => continue,
        };
        let name = if prefix.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", prefix, file_name)
        };
        let path = entry.path();
        match entry.file_type() {
            Ok(ty) if ty.is_dir() => walk_templates(&path, name, found),
            Ok(ty) if ty.is_file() && Loader::is_template(&path) => found.push((name, path)),
            _ => {}
        }
    }
}
