// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;

use pose_corpus::cli::args::{Cli, Commands};
use pose_corpus::cli::logging::{Verbosity, set_verbose, set_verbosity};
use pose_corpus::cli::prepare::run_prepare;

fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Prepare(args) => {
            if args.quiet {
                set_verbosity(Verbosity::Quiet);
            } else {
                set_verbose(args.verbose);
            }
            run_prepare(args);
        }
    }
}
