//! Module resolution for import specifiers

use crate::utils::{normalize_path, settle_path};
use serde::Deserialize;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Resolves an import specifier to the artifact it loads.
pub trait ModuleResolver {
    /// `None` means the module was not found.
    fn resolve(&self, specifier: &str, containing_file: &Path) -> Option<PathBuf>;
}

fn is_path_specifier(specifier: &str) -> bool {
    specifier.starts_with('.') || Path::new(specifier).is_absolute()
}

fn containing_dir(containing_file: &Path) -> &Path {
    containing_file.parent().unwrap_or_else(|| Path::new("."))
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    main: Option<String>,
}

/// Filesystem resolution following Node's `require.resolve`.
///
/// Path specifiers resolve against the importing file's directory; bare
/// specifiers are looked up in `node_modules` directories from there up to
/// the filesystem root.
#[derive(Debug, Clone)]
pub struct NodeModuleResolver {
    extensions: Vec<String>,
}

impl Default for NodeModuleResolver {
    fn default() -> Self {
        Self {
            extensions: vec!["js".to_string(), "json".to_string(), "node".to_string()],
        }
    }
}

impl NodeModuleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the extensions tried (without the leading dot), in order.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    fn load_as_file(&self, path: &Path) -> Option<PathBuf> {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        self.extensions
            .iter()
            .map(|ext| with_appended_extension(path, ext))
            .find(|candidate| candidate.is_file())
    }

    fn load_index(&self, dir: &Path) -> Option<PathBuf> {
        self.extensions
            .iter()
            .map(|ext| dir.join(format!("index.{}", ext)))
            .find(|candidate| candidate.is_file())
    }

    fn load_as_directory(&self, dir: &Path) -> Option<PathBuf> {
        if !dir.is_dir() {
            return None;
        }

        if let Some(main) = read_package_main(&dir.join("package.json")) {
            let target = dir.join(main);
            if let Some(found) = self
                .load_as_file(&target)
                .or_else(|| self.load_index(&target))
            {
                return Some(found);
            }
        }

        self.load_index(dir)
    }

    fn load(&self, path: &Path) -> Option<PathBuf> {
        self.load_as_file(path)
            .or_else(|| self.load_as_directory(path))
    }

    fn load_node_modules(&self, specifier: &str, start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .filter(|dir| dir.file_name().map_or(true, |name| name != "node_modules"))
            .find_map(|dir| self.load(&dir.join("node_modules").join(specifier)))
    }
}

impl ModuleResolver for NodeModuleResolver {
    fn resolve(&self, specifier: &str, containing_file: &Path) -> Option<PathBuf> {
        let base_dir = containing_dir(containing_file);

        let found = if is_path_specifier(specifier) {
            self.load(&base_dir.join(specifier))
        } else {
            self.load_node_modules(specifier, base_dir)
        };

        match found {
            Some(path) => Some(settle_path(&path)),
            None => {
                trace!(
                    "Module '{}' not found from {}",
                    specifier,
                    containing_file.display()
                );
                None
            }
        }
    }
}

fn with_appended_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

fn read_package_main(manifest: &Path) -> Option<String> {
    let content = fs::read_to_string(manifest).ok()?;
    match serde_json::from_str::<PackageManifest>(&content) {
        Ok(manifest) => manifest.main.filter(|main| !main.is_empty()),
        Err(e) => {
            trace!("Ignoring unreadable {}: {}", manifest.display(), e);
            None
        }
    }
}

/// Fixed specifier table for hosts with a virtual file system.
///
/// Bare specifiers are looked up by name. Path specifiers are joined to the
/// importing file's directory, normalized, and looked up as a path, with or
/// without a `.js` extension.
#[derive(Debug, Clone, Default)]
pub struct StaticModuleResolver {
    packages: HashMap<String, PathBuf>,
    files: HashMap<PathBuf, PathBuf>,
}

impl StaticModuleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package(mut self, name: impl Into<String>, artifact: impl Into<PathBuf>) -> Self {
        self.packages.insert(name.into(), artifact.into());
        self
    }

    /// Register a module reachable by path. `module_path` is the path without
    /// extension that a relative import names.
    pub fn with_file(mut self, module_path: impl AsRef<Path>, artifact: impl Into<PathBuf>) -> Self {
        self.files
            .insert(normalize_path(module_path.as_ref()), artifact.into());
        self
    }
}

impl ModuleResolver for StaticModuleResolver {
    fn resolve(&self, specifier: &str, containing_file: &Path) -> Option<PathBuf> {
        if !is_path_specifier(specifier) {
            return self.packages.get(specifier).cloned();
        }

        let target = normalize_path(&containing_dir(containing_file).join(specifier));
        self.files
            .get(&target)
            .or_else(|| {
                target
                    .to_str()
                    .and_then(|s| s.strip_suffix(".js"))
                    .and_then(|stem| self.files.get(Path::new(stem)))
            })
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn canonical(path: &Path) -> PathBuf {
        fs::canonicalize(path).unwrap()
    }

    #[test]
    fn test_relative_specifier_tries_extensions() {
        let dir = TempDir::new().unwrap();
        let target = write(dir.path(), "lib/dates.js", "");
        let importer = write(dir.path(), "src/app.ts", "");

        let resolver = NodeModuleResolver::new();
        assert_eq!(
            resolver.resolve("../lib/dates", &importer),
            Some(canonical(&target))
        );
        assert_eq!(
            resolver.resolve("../lib/dates.js", &importer),
            Some(canonical(&target))
        );
        assert_eq!(resolver.resolve("../lib/missing", &importer), None);
    }

    #[test]
    fn test_custom_extensions_tried_in_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "lib/dates.js", "");
        let mjs = write(dir.path(), "lib/dates.mjs", "");
        let cjs_index = write(dir.path(), "pkg/index.cjs", "");
        let importer = write(dir.path(), "app.ts", "");

        let resolver = NodeModuleResolver::new().with_extensions(["mjs", "cjs"]);
        assert_eq!(resolver.resolve("./lib/dates", &importer), Some(canonical(&mjs)));
        assert_eq!(resolver.resolve("./pkg", &importer), Some(canonical(&cjs_index)));

        // Only the listed extensions are tried.
        let js_only = NodeModuleResolver::new().with_extensions(["js"]);
        assert_eq!(js_only.resolve("./pkg", &importer), None);
    }

    #[test]
    fn test_directory_uses_package_main_then_index() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pkg/package.json", r#"{ "main": "dist/entry" }"#);
        let entry = write(dir.path(), "pkg/dist/entry.js", "");
        let index = write(dir.path(), "plain/index.js", "");
        let importer = write(dir.path(), "app.ts", "");

        let resolver = NodeModuleResolver::new();
        assert_eq!(resolver.resolve("./pkg", &importer), Some(canonical(&entry)));
        assert_eq!(resolver.resolve("./plain", &importer), Some(canonical(&index)));
    }

    #[test]
    fn test_bare_specifier_walks_up_node_modules() {
        let dir = TempDir::new().unwrap();
        let index = write(dir.path(), "node_modules/ts-transformer-dates/index.js", "");
        write(
            dir.path(),
            "node_modules/ts-transformer-dates/package.json",
            r#"{ "name": "ts-transformer-dates" }"#,
        );
        let scoped = write(dir.path(), "node_modules/@scope/dates/lib/index.js", "");
        let importer = write(dir.path(), "src/deep/nested/app.ts", "");

        let resolver = NodeModuleResolver::new();
        assert_eq!(
            resolver.resolve("ts-transformer-dates", &importer),
            Some(canonical(&index))
        );
        assert_eq!(
            resolver.resolve("@scope/dates/lib", &importer),
            Some(canonical(&scoped))
        );
        assert_eq!(resolver.resolve("left-pad", &importer), None);
    }

    #[test]
    fn test_broken_package_json_falls_back_to_index() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "node_modules/broken/package.json", "{ not json");
        let index = write(dir.path(), "node_modules/broken/index.js", "");
        let importer = write(dir.path(), "app.ts", "");

        assert_eq!(
            NodeModuleResolver::new().resolve("broken", &importer),
            Some(canonical(&index))
        );
    }

    #[test]
    fn test_static_resolver() {
        let resolver = StaticModuleResolver::new()
            .with_package("ts-transformer-dates", "/nm/ts-transformer-dates/index.js")
            .with_file("/src/lib/dates", "/src/lib/dates.js");

        assert_eq!(
            resolver.resolve("ts-transformer-dates", Path::new("/src/app.ts")),
            Some(PathBuf::from("/nm/ts-transformer-dates/index.js"))
        );
        assert_eq!(
            resolver.resolve("./lib/./dates", Path::new("/src/app.ts")),
            Some(PathBuf::from("/src/lib/dates.js"))
        );
        assert_eq!(
            resolver.resolve("../lib/dates.js", Path::new("/src/views/page.ts")),
            Some(PathBuf::from("/src/lib/dates.js"))
        );
        assert_eq!(resolver.resolve("other", Path::new("/src/app.ts")), None);
    }
}
