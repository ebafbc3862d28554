use clap::Parser;
use color_eyre::Result;

mod cli;
mod dispatch;

use cli::SnaplayerCli;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = SnaplayerCli::parse();
    init_tracing(cli.trace, cli.verbose, cli.quiet, cli.log_json);

    let config = snaplayer_core::Config::from_env()?;
    dispatch::run(&cli, config)
}

fn init_tracing(trace: bool, verbose: u8, quiet: bool, json: bool) {
    let level = if trace {
        "trace"
    } else if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("snaplayer={level},snaplayer_core={level}");
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    let _ = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
}
