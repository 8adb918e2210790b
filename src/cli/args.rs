// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Prepare Options:
    --input, -i <INPUT>        JSON-lines corpus, one raw example per line
    --topology, -t <FILE>      JSON topology descriptor [default: MediaPipe Holistic]
    --groups <G1,G2,..>        Landmark groups to keep [default: pose + both hands]
    --frames <N>               Resample frame-count numerator [default: 32]
    --fps <FPS>                Native frame rate of examples without one [default: 30]
    --dims <N>                 Output coordinate dimensionality [default: 2]
    --held-out <S1,S2,..>      Signer ids reserved for validation
    --seed <SEED>              Seed training-time augmentation
    --half                     Return FP16 feature tensors
    --quiet, -q                Only print warnings and errors
    --verbose <BOOL>           Show per-stage progress [default: true]

Examples:
    pose-corpus prepare --input autsl.jsonl
    pose-corpus prepare -i autsl.jsonl --held-out 3,7 --seed 42
    pose-corpus prepare -i corpus.jsonl -t openpose.json --groups BODY,LEFT_HAND,RIGHT_HAND
    pose-corpus prepare -i autsl.jsonl --frames 48 --fps 25 --dims 3"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a pose corpus and report its contents
    Prepare(PrepareArgs),
}

/// Arguments for the prepare command.
#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// JSON-lines corpus, one raw example per line
    #[arg(short, long)]
    pub input: PathBuf,

    /// JSON topology descriptor (defaults to MediaPipe Holistic)
    #[arg(short, long)]
    pub topology: Option<PathBuf>,

    /// Landmark groups to keep, in output order
    #[arg(
        long,
        value_delimiter = ',',
        default_values = ["POSE_LANDMARKS", "LEFT_HAND_LANDMARKS", "RIGHT_HAND_LANDMARKS"]
    )]
    pub groups: Vec<String>,

    /// Resample frame-count numerator
    #[arg(long, default_value_t = 32)]
    pub frames: usize,

    /// Native frame rate of examples that do not carry one
    #[arg(long, default_value_t = 30.0)]
    pub fps: f64,

    /// Output coordinate dimensionality
    #[arg(long, default_value_t = 2)]
    pub dims: usize,

    /// Signer ids reserved for validation
    #[arg(long, value_delimiter = ',')]
    pub held_out: Vec<u64>,

    /// Seed for training-time augmentation (unseeded when absent)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Return FP16 feature tensors
    #[arg(long, default_value_t = false)]
    pub half: bool,

    /// Only print warnings and errors
    #[arg(short, long, default_value_t = false, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show per-stage progress
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}
