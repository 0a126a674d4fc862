use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use pip_init::{
    content::{DirectoryExtractor, TemplateRenderer},
    handler::HandlerRegistry,
    resolve::{ExternalTemplates, HomeTemplates, TemplateResolver},
    Error, Opts, Scaffold, INTERRUPTED,
};

/// Python package template extractor
#[derive(Parser)]
#[command(name = "pip_init", author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    opts: Opts,

    /// More output on stderr (-v info, -vv debug); PIP_INIT_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("PIP_INIT_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(opts: Opts) -> Result<u8> {
    let target_root = opts.target_root()?;
    let resolver: Box<dyn TemplateResolver> = match opts.template_root()? {
        Some(template_dir) => Box::new(ExternalTemplates::new(template_dir)),
        None => {
            let home = opts
                .home
                .clone()
                .or_else(HomeTemplates::default_root)
                .ok_or_else(|| anyhow!("cannot determine the home directory, use --home"))?;
            Box::new(HomeTemplates::new(home))
        }
    };

    let handlers = HandlerRegistry::builtin(&opts.args);
    let renderer = TemplateRenderer::new();
    let extractor = DirectoryExtractor::new(opts.force);

    let status = Scaffold::new(resolver.as_ref(), &handlers, &renderer, &extractor)
        .with_handler(opts.handler)
        .execute(&opts.name, &target_root)?;
    Ok(status)
}

/// Exit status for `err` if it ends the run quietly instead of as an error.
fn quiet_status(err: &anyhow::Error) -> Option<u8> {
    match err.downcast_ref::<Error>() {
        Some(Error::Interrupted) => Some(INTERRUPTED),
        _ => None,
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.opts) {
        Ok(status) => Ok(ExitCode::from(status)),
        Err(err) => match quiet_status(&err) {
            Some(status) => {
                println!("Ctrl+C");
                Ok(ExitCode::from(status))
            }
            None => Err(err),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_exits_with_130() {
        assert_eq!(quiet_status(&Error::Interrupted.into()), Some(130));
        assert_eq!(
            quiet_status(&anyhow::Error::from(Error::Interrupted).context("prompt")),
            Some(130)
        );
        assert_eq!(
            quiet_status(&Error::UnknownArgument { name: "x".into() }.into()),
            None
        );
        assert_eq!(quiet_status(&anyhow!("no home")), None);
    }

    #[test]
    fn verbose_flag_counts() {
        let cli = Cli::try_parse_from(["pip_init", "-vv", "out"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.opts.target, std::path::PathBuf::from("out"));
    }
}
