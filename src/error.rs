use std::{io, path::PathBuf};

use thiserror::Error;

/// Everything that can stop a scaffolding run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no template found at import path {import_path}")]
    TemplateNotFound {
        import_path: String,
        searched: Vec<PathBuf>,
    },

    #[error("'{name}' is not a valid template name (search path: {import_path})")]
    InvalidTemplateName { name: String, import_path: String },

    #[error("no argument handler named '{name}' is registered")]
    HandlerNotFound { name: String },

    #[error("{count} argument handlers are registered as '{name}'")]
    AmbiguousHandler { name: String, count: usize },

    #[error("malformed template manifest: {0}")]
    ConfigParse(#[source] serde_json::Error),

    #[error("cannot serialize template manifest: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("invalid template manifest: {0}")]
    ConfigInvalid(String),

    #[error("cannot read manifest {}", .path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse manifest {}", .path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("content source {} does not exist", .path.display())]
    MissingSource { path: PathBuf },

    #[error("content source {} escapes the template directory", .path.display())]
    OutsideTemplate { path: PathBuf },

    #[error("destination {} escapes the target directory", .path.display())]
    OutsideTarget { path: PathBuf },

    #[error("cannot render template for {}", .path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: handlebars::RenderError,
    },

    #[error("cannot read entry: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid exclude pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("{} already exists (use --force to overwrite)", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("I/O error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("argument '{name}' is not declared by the template")]
    UnknownArgument { name: String },

    #[error("cannot parse argument override '{token}': expected name=value")]
    InvalidOverride { token: String },

    #[error("value '{value}' for argument '{name}' is not a valid {expected}")]
    InvalidValue {
        name: String,
        value: String,
        expected: &'static str,
    },

    #[error("prompt failed")]
    Prompt(#[source] io::Error),

    #[error("interrupted")]
    Interrupted,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Failures the orchestrator turns into a user-facing message and status 1
    /// instead of propagating.
    pub fn is_reported(&self) -> bool {
        matches!(
            self,
            Error::TemplateNotFound { .. }
                | Error::InvalidTemplateName { .. }
                | Error::HandlerNotFound { .. }
                | Error::AmbiguousHandler { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Error {
        let path = path.into();
        move |source| Error::Io { path, source }
    }
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        match err {
            dialoguer::Error::IO(e) if e.kind() == io::ErrorKind::Interrupted => Error::Interrupted,
            dialoguer::Error::IO(e) => Error::Prompt(e),
        }
    }
}
