use clap::Parser;
use taskflow::cli::commands::Cli;
use taskflow::cli::handlers;
use taskflow::io::{config_io, logging};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            // No subcommand → launch TUI
            let dir = config_io::config_dir(cli.config_dir.as_deref());
            let _guard = logging::init_tui(&dir, cli.verbose);
            taskflow::tui::run(&dir)
        }
        Some(_) => {
            logging::init_cli(cli.verbose);
            handlers::dispatch(cli)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
