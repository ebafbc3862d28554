use std::io::{self, Write};
use std::path::Path;

use color_eyre::eyre::{eyre, Result, WrapErr};
use snaplayer_core::{
    diff, materialize, walk, Config, Layer, MaterializeOptions, Snapshot, SnapshotLayer,
};
use tracing::debug;

use crate::cli::{
    CommandCli, DeltaArgs, DiffArgs, FilesArgs, LayerArgs, LayerOutputArgs, SnaplayerCli,
    SnapshotArgs,
};

pub(crate) fn run(cli: &SnaplayerCli, config: Config) -> Result<()> {
    let options = config.into_materialize();
    match &cli.command {
        CommandCli::Snapshot(args) => snapshot(cli, args),
        CommandCli::Diff(args) => diff_snapshots(cli, args),
        CommandCli::Files(args) => files(args),
        CommandCli::Layer(args) => layer(args, options),
        CommandCli::Delta(args) => delta(cli, args, options),
    }
}

fn snapshot(cli: &SnaplayerCli, args: &SnapshotArgs) -> Result<()> {
    let snapshot = walk(&args.dir)?;
    emit_snapshot(cli, &snapshot, args.out.as_deref())
}

fn diff_snapshots(cli: &SnaplayerCli, args: &DiffArgs) -> Result<()> {
    let old = load_snapshot(&args.old)?;
    let new = load_snapshot(&args.new)?;
    let delta = diff(&old, &new);
    emit_snapshot(cli, &delta, args.out.as_deref())
}

fn files(args: &FilesArgs) -> Result<()> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let mut stdout = io::stdout().lock();
    for path in snapshot.paths() {
        writeln!(stdout, "{path}")?;
    }
    Ok(())
}

fn layer(args: &LayerArgs, options: MaterializeOptions) -> Result<()> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let layer = write_layer(&snapshot, &args.output, options)?;
    emit_layer(&layer)
}

fn delta(cli: &SnaplayerCli, args: &DeltaArgs, options: MaterializeOptions) -> Result<()> {
    let old = load_snapshot(&args.old)?;
    let new = walk(&args.dir)?;
    if let Some(save) = &args.save {
        save_snapshot(cli, &new, save)?;
    }
    let changes = diff(&old, &new);
    debug!(changed = changes.len(), "delta computed");
    let layer = write_layer(&changes, &args.output, options)?;
    emit_layer(&layer)
}

fn write_layer(
    snapshot: &Snapshot,
    output: &LayerOutputArgs,
    options: MaterializeOptions,
) -> Result<SnapshotLayer> {
    let options = match output.level {
        Some(level) => options.with_compression_level(level)?,
        None => options,
    };
    Ok(materialize(snapshot, &output.work, &options)?)
}

fn load_snapshot(path: &Path) -> Result<Snapshot> {
    Snapshot::load(path).map_err(|err| eyre!("{err:#}"))
}

fn save_snapshot(cli: &SnaplayerCli, snapshot: &Snapshot, path: &Path) -> Result<()> {
    snapshot.save(path).map_err(|err| eyre!("{err:#}"))?;
    if !cli.quiet {
        eprintln!(
            "Saved {snapshot} ({} entries) to {}",
            snapshot.len(),
            path.display()
        );
    }
    Ok(())
}

fn emit_snapshot(cli: &SnaplayerCli, snapshot: &Snapshot, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => save_snapshot(cli, snapshot, path),
        None => {
            let bytes = snapshot.to_json().map_err(|err| eyre!("{err:#}"))?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(&bytes)?;
            writeln!(stdout)?;
            Ok(())
        }
    }
}

fn emit_layer(layer: &SnapshotLayer) -> Result<()> {
    let payload =
        serde_json::to_string_pretty(&layer.info()).wrap_err("failed to encode layer info")?;
    println!("{payload}");
    Ok(())
}
