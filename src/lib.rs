mod error;
mod helpers;

pub mod argument;
pub mod config;
pub mod content;
pub mod handler;
pub mod resolve;

pub use crate::error::{Error, Result};
pub use crate::helpers::to_module_name;

use std::{
    env,
    path::{Path, PathBuf},
};

use clap::Args;
use console::{Emoji, Style};
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    config::ConfigLoader,
    content::{BuildContext, ContentBuilder, ContentExtractor, PreparedContent},
    handler::{HandlerRegistry, DEFAULT_HANDLER_NAME, SCRIPTED_HANDLER_NAME},
    resolve::TemplateResolver,
};

/// Exit status of a run that went through.
pub const SUCCESS: u8 = 0;
/// Exit status when the template or its argument handler cannot be found.
pub const FAILURE: u8 = 1;
/// Exit status when the user interrupts a prompt.
pub const INTERRUPTED: u8 = 130;

#[derive(Args, Debug, Clone)]
pub struct Opts {
    /// Template extract destination
    #[arg(default_value = ".")]
    pub target: PathBuf,

    /// Name of the template
    #[arg(short, long, default_value = "default")]
    pub name: String,

    /// Template root directory, searched for `pip_init_templates/<name>`
    #[arg(short = 't', long = "template_dir", visible_alias = "template-dir")]
    pub template_dir: Option<PathBuf>,

    /// Argument handler to use instead of the one named by the template
    #[arg(short = 'H', long)]
    pub handler: Option<String>,

    /// Argument values for the scripted handler, e.g. "package_name=demo 'author=Jane Doe'"
    #[arg(short, long, env = "PIP_INIT_ARGS", default_value = "")]
    pub args: String,

    /// Directory holding `pip_init_internal_templates` [default: ~/.pip_init]
    #[arg(long, env = "PIP_INIT_HOME")]
    pub home: Option<PathBuf>,

    /// Overwrite files that already exist in the target directory
    #[arg(short, long)]
    pub force: bool,
}

impl Opts {
    /// `target` as an absolute path.
    pub fn target_root(&self) -> Result<PathBuf> {
        absolute(&self.target)
    }

    /// `--template_dir` as an absolute path.
    pub fn template_root(&self) -> Result<Option<PathBuf>> {
        self.template_dir.as_deref().map(absolute).transpose()
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().map_err(Error::io("."))?;
    Ok(cwd.join(path))
}

/// The scaffolding pipeline: resolve, load, bind arguments, build, extract.
pub struct Scaffold<'a> {
    resolver: &'a dyn TemplateResolver,
    handlers: &'a HandlerRegistry,
    builder: &'a dyn ContentBuilder,
    extractor: &'a dyn ContentExtractor,
    handler_override: Option<String>,
}

impl<'a> Scaffold<'a> {
    pub fn new(
        resolver: &'a dyn TemplateResolver,
        handlers: &'a HandlerRegistry,
        builder: &'a dyn ContentBuilder,
        extractor: &'a dyn ContentExtractor,
    ) -> Self {
        Self {
            resolver,
            handlers,
            builder,
            extractor,
            handler_override: None,
        }
    }

    /// Use this handler whatever the manifest says.
    pub fn with_handler(mut self, name: Option<String>) -> Self {
        self.handler_override = name;
        self
    }

    /// Run the pipeline, stopping at the first failure.
    pub fn run(&self, name: &str, target_root: &Path) -> Result<()> {
        let template = self.resolver.resolve(name)?;
        tracing::debug!(import_path = %template.import_path, root = ?template.root, "resolved template");

        let config = ConfigLoader::read(&template.root)?;

        let handler_name = self
            .handler_override
            .as_deref()
            .or(config.args_handler_name.as_deref())
            .unwrap_or(DEFAULT_HANDLER_NAME);
        let handler = self.handlers.resolve(handler_name)?;
        if let Some(overrides) = self.handlers.overrides() {
            if handler.name() != SCRIPTED_HANDLER_NAME {
                tracing::warn!(
                    handler = handler.name(),
                    overrides,
                    "argument overrides are only read by the scripted handler, ignoring them"
                );
            }
        }
        let args = handler.handle_args(&config.args)?;

        let ctx = BuildContext {
            template_root: &template.root,
            target_root,
            args: &args,
        };
        let prepared = config
            .contents
            .iter()
            .map(|content| self.builder.build(&ctx, content))
            .collect::<Result<Vec<PreparedContent>>>()?;
        for content in &prepared {
            self.extractor.check(content)?;
        }

        let progress = ProgressBar::new(prepared.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("{spinner} [{pos}/{len}] {wide_msg}") {
            progress.set_style(style);
        }
        for content in &prepared {
            progress.set_message(content.destination.display().to_string());
            self.extractor.extract(content)?;
            progress.inc(1);
        }
        progress.finish_and_clear();

        Ok(())
    }

    /// Run the pipeline and report the outcome on stdout.
    ///
    /// Template and handler resolution failures are printed and turned into
    /// [`FAILURE`]; anything else is returned as an error.
    pub fn execute(&self, name: &str, target_root: &Path) -> Result<u8> {
        match self.run(name, target_root) {
            Ok(()) => {
                println!(
                    "{} {}",
                    Emoji("✨", ""),
                    Style::new().green().apply_to("Succeeded.")
                );
                Ok(SUCCESS)
            }
            Err(err) if err.is_reported() => {
                report(&err);
                Ok(FAILURE)
            }
            Err(err) => Err(err),
        }
    }
}

fn report(err: &Error) {
    let red = Style::new().red().bold();
    match err {
        Error::TemplateNotFound { import_path, .. }
        | Error::InvalidTemplateName { import_path, .. } => {
            println!(
                "{}",
                red.apply_to("failed to import template! check if the path is valid.")
            );
            println!("search path: {}", Style::new().cyan().apply_to(import_path));
        }
        _ => {
            println!("{}", red.apply_to("could not identify argument handler!"));
            println!("{err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        opts: Opts,
    }

    fn parse(args: &[&str]) -> Opts {
        Cli::try_parse_from(std::iter::once("pip_init").chain(args.iter().copied()))
            .unwrap()
            .opts
    }

    #[test]
    fn defaults() {
        let opts = parse(&[]);
        assert_eq!(opts.target, PathBuf::from("."));
        assert_eq!(opts.name, "default");
        assert!(opts.template_dir.is_none());
        assert!(opts.handler.is_none());
        assert!(!opts.force);
    }

    #[test]
    fn option_spellings() {
        let opts = parse(&["out", "-n", "flask", "-t", "/srv/templates", "-H", "scripted", "-f"]);
        assert_eq!(opts.target, PathBuf::from("out"));
        assert_eq!(opts.name, "flask");
        assert_eq!(opts.template_dir, Some(PathBuf::from("/srv/templates")));
        assert_eq!(opts.handler.as_deref(), Some("scripted"));
        assert!(opts.force);

        let opts = parse(&["--name", "cli", "--template_dir", "tpl"]);
        assert_eq!(opts.name, "cli");
        assert_eq!(opts.template_dir, Some(PathBuf::from("tpl")));
        let opts = parse(&["--template-dir", "tpl"]);
        assert_eq!(opts.template_dir, Some(PathBuf::from("tpl")));

        assert!(Cli::try_parse_from(["pip_init", "--bogus"]).is_err());
    }

    #[test]
    fn roots_are_absolute() {
        let cwd = env::current_dir().unwrap();
        let opts = parse(&["out", "-t", "tpl"]);
        assert_eq!(opts.target_root().unwrap(), cwd.join("out"));
        assert_eq!(opts.template_root().unwrap(), Some(cwd.join("tpl")));

        let opts = parse(&[]);
        assert!(opts.target_root().unwrap().is_absolute());
        assert_eq!(opts.template_root().unwrap(), None);

        let absolute = cwd.join("elsewhere");
        let opts = parse(&[absolute.to_str().unwrap()]);
        assert_eq!(opts.target_root().unwrap(), absolute);
    }
}
