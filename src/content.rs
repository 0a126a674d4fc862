use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use globset::{Glob, GlobSet, GlobSetBuilder};
use handlebars::Handlebars;
use indexmap::IndexMap;
use serde_json::Value;
use walkdir::WalkDir;

use crate::{
    argument::{self, Argument},
    config::{Content, MANIFEST_FILE},
    helpers, Error, Result,
};

/// What a builder needs besides the content declaration itself.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub template_root: &'a Path,
    pub target_root: &'a Path,
    pub args: &'a [Argument],
}

/// A content declaration after rendering, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedContent {
    /// Rendered destination of the declaration.
    pub destination: PathBuf,
    pub entries: Vec<PreparedEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreparedEntry {
    Directory(PathBuf),
    File { path: PathBuf, contents: Vec<u8> },
}

impl PreparedEntry {
    pub fn path(&self) -> &Path {
        match self {
            PreparedEntry::Directory(path) => path,
            PreparedEntry::File { path, .. } => path,
        }
    }
}

pub trait ContentBuilder {
    fn build(&self, ctx: &BuildContext<'_>, content: &Content) -> Result<PreparedContent>;
}

pub trait ContentExtractor {
    /// Fail before anything is written if `content` cannot be extracted.
    fn check(&self, _content: &PreparedContent) -> Result<()> {
        Ok(())
    }

    fn extract(&self, content: &PreparedContent) -> Result<()>;
}

/// Renders file names and file contents with handlebars.
pub struct TemplateRenderer {
    engine: Handlebars<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut engine = Handlebars::new();
        engine.register_escape_fn(handlebars::no_escape);
        helpers::register(&mut engine);
        Self { engine }
    }

    fn context(ctx: &BuildContext<'_>) -> IndexMap<String, Value> {
        let mut parameters = argument::to_context(ctx.args);
        parameters
            .entry("target_dir".to_string())
            .or_insert_with(|| Value::String(ctx.target_root.to_string_lossy().into_owned()));
        if let Some(name) = ctx.target_root.file_name() {
            parameters
                .entry("target_name".to_string())
                .or_insert_with(|| Value::String(name.to_string_lossy().into_owned()));
        }
        parameters
    }

    fn render_str(
        &self,
        template: &str,
        parameters: &IndexMap<String, Value>,
        origin: &Path,
    ) -> Result<String> {
        self.engine
            .render_template(template, parameters)
            .map_err(|source| Error::Render {
                path: origin.to_path_buf(),
                source,
            })
    }

    /// Render every component of `relative` and append it to `base`.
    fn render_path(
        &self,
        base: &Path,
        relative: &Path,
        parameters: &IndexMap<String, Value>,
    ) -> Result<PathBuf> {
        let rendered = self.render_str(&relative.to_string_lossy(), parameters, relative)?;
        join_inside(base, Path::new(&rendered)).ok_or_else(|| Error::OutsideTarget {
            path: PathBuf::from(rendered),
        })
    }

    fn render_file(
        &self,
        source: &Path,
        render: bool,
        parameters: &IndexMap<String, Value>,
    ) -> Result<Vec<u8>> {
        let bytes = fs::read(source).map_err(Error::io(source))?;
        if !render {
            return Ok(bytes);
        }
        match String::from_utf8(bytes) {
            Ok(text) => {
                tracing::debug!(?source, "rendering file");
                Ok(self.render_str(&text, parameters, source)?.into_bytes())
            }
            Err(err) => {
                tracing::debug!(?source, "binary file, copying as is");
                Ok(err.into_bytes())
            }
        }
    }
}

impl ContentBuilder for TemplateRenderer {
    fn build(&self, ctx: &BuildContext<'_>, content: &Content) -> Result<PreparedContent> {
        let parameters = Self::context(ctx);
        let source = join_inside(ctx.template_root, &content.source).ok_or_else(|| {
            Error::OutsideTemplate {
                path: content.source.clone(),
            }
        })?;
        if !source.exists() {
            return Err(Error::MissingSource { path: source });
        }

        let destination = self.render_path(
            ctx.target_root,
            Path::new(&content.destination_template()),
            &parameters,
        )?;

        if source.is_file() {
            let contents = self.render_file(&source, content.render, &parameters)?;
            return Ok(PreparedContent {
                entries: vec![PreparedEntry::File {
                    path: destination.clone(),
                    contents,
                }],
                destination,
            });
        }

        let excludes = exclude_set(&content.exclude)?;
        let manifest = ctx.template_root.join(MANIFEST_FILE);
        let mut entries = vec![PreparedEntry::Directory(destination.clone())];
        let walker = WalkDir::new(&source)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.path() == manifest.as_path() {
                    return false;
                }
                let relative = entry.path().strip_prefix(&source).unwrap_or(entry.path());
                !excludes.is_match(relative)
            });

        for entry in walker {
            let entry = entry?;
            let relative = entry.path().strip_prefix(&source).unwrap_or(entry.path());
            let path = self.render_path(&destination, relative, &parameters)?;
            if entry.file_type().is_dir() {
                entries.push(PreparedEntry::Directory(path));
            } else {
                let contents = self.render_file(entry.path(), content.render, &parameters)?;
                entries.push(PreparedEntry::File { path, contents });
            }
        }

        Ok(PreparedContent {
            destination,
            entries,
        })
    }
}

fn exclude_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// `base` joined with `relative`, or `None` if `relative` climbs out of `base`.
fn join_inside(base: &Path, relative: &Path) -> Option<PathBuf> {
    let mut path = base.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(path)
}

/// Writes prepared content to disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectoryExtractor {
    force: bool,
}

impl DirectoryExtractor {
    pub fn new(force: bool) -> Self {
        Self { force }
    }
}

impl ContentExtractor for DirectoryExtractor {
    fn check(&self, content: &PreparedContent) -> Result<()> {
        if self.force {
            return Ok(());
        }
        match content.entries.iter().find(|entry| {
            matches!(entry, PreparedEntry::File { path, .. } if path.exists())
        }) {
            Some(entry) => Err(Error::AlreadyExists {
                path: entry.path().to_path_buf(),
            }),
            None => Ok(()),
        }
    }

    fn extract(&self, content: &PreparedContent) -> Result<()> {
        for entry in &content.entries {
            match entry {
                PreparedEntry::Directory(path) => {
                    fs::create_dir_all(path).map_err(Error::io(path))?;
                }
                PreparedEntry::File { path, contents } => {
                    if path.exists() && !self.force {
                        return Err(Error::AlreadyExists { path: path.clone() });
                    }
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent).map_err(Error::io(parent))?;
                    }
                    fs::write(path, contents).map_err(Error::io(path))?;
                    tracing::info!(?path, "wrote file");
                }
            }
        }
        Ok(())
    }
}
