//! Template lookup.
//!
//! A template called `name` lives in `<root>/<namespace>/<name>/`, where the
//! namespace depends on where templates come from: `pip_init_templates` for a
//! directory given on the command line, `pip_init_internal_templates` for the
//! user's `~/.pip_init`.

use std::path::PathBuf;

use crate::{Error, Result};

pub const EXTERNAL_NAMESPACE: &str = "pip_init_templates";
pub const INTERNAL_NAMESPACE: &str = "pip_init_internal_templates";
pub const HOME_TEMPLATE_DIR: &str = ".pip_init";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    pub name: String,
    /// Dotted `<namespace>.<name>` path, shown to users.
    pub import_path: String,
    /// Directory holding `template.json`.
    pub root: PathBuf,
}

pub trait TemplateResolver {
    fn namespace(&self) -> &str;

    fn search_roots(&self) -> &[PathBuf];

    fn import_path(&self, name: &str) -> String {
        format!("{}.{}", self.namespace(), name)
    }

    fn resolve(&self, name: &str) -> Result<ResolvedTemplate> {
        let import_path = self.import_path(name);
        if !is_valid_name(name) {
            return Err(Error::InvalidTemplateName {
                name: name.to_string(),
                import_path,
            });
        }

        for root in self.search_roots() {
            let candidate = root.join(self.namespace()).join(name);
            tracing::debug!(?candidate, "looking for template");
            if candidate.is_dir() {
                return Ok(ResolvedTemplate {
                    name: name.to_string(),
                    import_path,
                    root: candidate,
                });
            }
        }

        Err(Error::TemplateNotFound {
            import_path,
            searched: self.search_roots().to_vec(),
        })
    }
}

/// Templates under a directory passed with `--template_dir`.
#[derive(Debug, Clone)]
pub struct ExternalTemplates {
    roots: Vec<PathBuf>,
}

impl ExternalTemplates {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            roots: vec![template_dir.into()],
        }
    }
}

impl TemplateResolver for ExternalTemplates {
    fn namespace(&self) -> &str {
        EXTERNAL_NAMESPACE
    }

    fn search_roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

/// Templates installed in the user's home, `~/.pip_init` unless overridden.
/// The directory does not have to exist.
#[derive(Debug, Clone)]
pub struct HomeTemplates {
    roots: Vec<PathBuf>,
}

impl HomeTemplates {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            roots: vec![root.into()],
        }
    }

    /// `~/.pip_init`, or `None` when no home directory can be determined.
    pub fn default_root() -> Option<PathBuf> {
        directories::UserDirs::new().map(|dirs| dirs.home_dir().join(HOME_TEMPLATE_DIR))
    }
}

impl TemplateResolver for HomeTemplates {
    fn namespace(&self) -> &str {
        INTERNAL_NAMESPACE
    }

    fn search_roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

/// Template names follow module naming: `[A-Za-z_][A-Za-z0-9_]*`.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn external_templates_resolve_under_their_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join(EXTERNAL_NAMESPACE).join("custom");
        fs::create_dir_all(&custom).unwrap();

        let resolved = ExternalTemplates::new(dir.path()).resolve("custom").unwrap();
        assert_eq!(resolved.root, custom);
        assert_eq!(resolved.import_path, "pip_init_templates.custom");
        assert_eq!(resolved.name, "custom");
    }

    #[test]
    fn home_templates_use_internal_namespace() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(EXTERNAL_NAMESPACE).join("default")).unwrap();

        match HomeTemplates::new(dir.path()).resolve("default") {
            Err(Error::TemplateNotFound {
                import_path,
                searched,
            }) => {
                assert_eq!(import_path, "pip_init_internal_templates.default");
                assert_eq!(searched, vec![dir.path().to_path_buf()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let default = dir.path().join(INTERNAL_NAMESPACE).join("default");
        fs::create_dir_all(&default).unwrap();
        fs::write(default.join("template.json"), "{}").unwrap();
        let resolved = HomeTemplates::new(dir.path()).resolve("default").unwrap();
        assert_eq!(resolved.root, default);
    }

    #[test]
    fn missing_home_directory_is_not_found() {
        let resolver = HomeTemplates::new("/nonexistent/pip_init/home");
        assert!(matches!(
            resolver.resolve("default"),
            Err(Error::TemplateNotFound { .. })
        ));
    }

    #[test]
    fn files_are_not_templates() {
        let dir = tempfile::tempdir().unwrap();
        let ns = dir.path().join(EXTERNAL_NAMESPACE);
        fs::create_dir_all(&ns).unwrap();
        fs::write(ns.join("single"), "").unwrap();
        assert!(ExternalTemplates::new(dir.path()).resolve("single").is_err());
    }

    #[test]
    fn rejects_names_that_are_not_module_names() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ExternalTemplates::new(dir.path());
        for name in ["", "../etc", "a/b", "9lives", "with-dash", "a.b"] {
            match resolver.resolve(name) {
                Err(Error::InvalidTemplateName { import_path, .. }) => {
                    assert_eq!(import_path, format!("pip_init_templates.{name}"));
                }
                other => panic!("{name:?} resolved to {other:?}"),
            }
        }
        assert!(is_valid_name("_private"));
        assert!(is_valid_name("django_app2"));
    }
}
