use anyhow::{Context as _, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use protopath::{
    cli::{Args, Command},
    report, GenerateCommand, RunContext,
};

fn main() -> Result<()> {
    // stdout carries results; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("PROTOPATH_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let ctx = RunContext::from_args(&args)?;
    let ws = &ctx.workspace;

    match args.command {
        Command::Paths { format } => {
            let paths = ws.resolve(&ctx.registrations)?;
            print!("{}", report::render_paths(&paths, format)?);
        }

        Command::Resolve { format } => {
            let paths = ws.resolve(&ctx.registrations)?;
            println!("{}", report::build_report(ws.root(), &paths, format)?.trim_end());
        }

        Command::Generate { dry_run } => {
            let gen = ctx
                .generate
                .as_ref()
                .context("no [generate] section in config")?;
            let cmd = GenerateCommand::from(gen);

            // resolution finishes before anything is launched
            let paths = ws.resolve(&ctx.registrations)?;

            if dry_run {
                println!("{}", cmd.render(&paths.files));
            } else {
                cmd.run(ws.root(), &paths.files)?;
            }
        }
    }

    Ok(())
}
