use std::path::PathBuf;

use clap::{value_parser, ArgAction, Args, Parser, Subcommand};

pub const SNAPLAYER_HELP_TEMPLATE: &str =
    "{before-help}\nUsage:\n    {usage}\n\n{all-args}\n";

pub const SNAPLAYER_BEFORE_HELP: &str = concat!(
    "snaplayer ",
    env!("CARGO_PKG_VERSION"),
    " – filesystem snapshots as image layers\n\n",
    "\x1b[1;36mWorkflow\x1b[0m\n",
    "  snapshot         Record metadata for every node under a directory.\n",
    "  diff             Keep only entries added or modified since an older snapshot.\n",
    "  layer            Write a snapshot as a tar + gzip layer and print its hashes.\n",
    "  delta            Snapshot, diff and layer in one step.\n\n",
    "\x1b[1;36mInspection\x1b[0m\n",
    "  files            List the paths recorded in a snapshot.\n",
);

#[derive(Parser, Debug)]
#[command(
    name = "snaplayer",
    author,
    version,
    disable_help_subcommand = true,
    before_help = SNAPLAYER_BEFORE_HELP,
    help_template = SNAPLAYER_HELP_TEMPLATE
)]
pub struct SnaplayerCli {
    #[arg(
        short,
        long,
        help = "Suppress human output and informational logs",
        global = true
    )]
    pub quiet: bool,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase logging (-vv reaches trace)",
        global = true
    )]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[arg(short = 'j', long, help = "Emit log lines as JSON", global = true)]
    pub log_json: bool,
    #[command(subcommand)]
    pub command: CommandCli,
}

#[derive(Subcommand, Debug)]
pub enum CommandCli {
    #[command(
        about = "Record metadata for every node under DIR.",
        override_usage = "snaplayer snapshot <DIR> [-o FILE]"
    )]
    Snapshot(SnapshotArgs),
    #[command(
        about = "Entries of NEW that are absent from OLD or changed in size or mtime.",
        override_usage = "snaplayer diff <OLD> <NEW> [-o FILE]"
    )]
    Diff(DiffArgs),
    #[command(about = "List the paths recorded in a snapshot.")]
    Files(FilesArgs),
    #[command(
        about = "Write a snapshot as a tar + gzip layer and print diffId, digest, size and media type.",
        override_usage = "snaplayer layer <SNAPSHOT> --work PATH [--level N]"
    )]
    Layer(LayerArgs),
    #[command(
        about = "Snapshot DIR, diff it against OLD and write the changes as a layer.",
        override_usage = "snaplayer delta <OLD> <DIR> --work PATH [--save FILE]"
    )]
    Delta(DeltaArgs),
}

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,
    #[arg(short, long, value_name = "FILE", help = "Write the snapshot JSON here instead of stdout")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DiffArgs {
    #[arg(value_name = "OLD")]
    pub old: PathBuf,
    #[arg(value_name = "NEW")]
    pub new: PathBuf,
    #[arg(short, long, value_name = "FILE", help = "Write the diff JSON here instead of stdout")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct FilesArgs {
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct LayerOutputArgs {
    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "Uncompressed tar path; the gzip copy lands next to it"
    )]
    pub work: PathBuf,
    #[arg(
        long,
        value_name = "N",
        value_parser = value_parser!(u32).range(0..=9),
        help = "Gzip level (overrides SNAPLAYER_GZIP_LEVEL)"
    )]
    pub level: Option<u32>,
}

#[derive(Args, Debug)]
pub struct LayerArgs {
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,
    #[command(flatten)]
    pub output: LayerOutputArgs,
}

#[derive(Args, Debug)]
pub struct DeltaArgs {
    #[arg(value_name = "OLD")]
    pub old: PathBuf,
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,
    #[command(flatten)]
    pub output: LayerOutputArgs,
    #[arg(long, value_name = "FILE", help = "Also save the fresh snapshot of DIR")]
    pub save: Option<PathBuf>,
}
