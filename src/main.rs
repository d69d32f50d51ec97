use clap::Parser;
use jot::cli::commands::Cli;
use jot::cli::handlers;
use jot::io::config_io;
use jot::logging::init_logging;

fn main() {
    let cli = Cli::parse();

    let config = match config_io::read_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(&config.log.level);

    if let Err(e) = handlers::dispatch(cli, &config) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
