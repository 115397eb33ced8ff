//! Wrangle CLI: compile and run data-preparation recipes.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "wrangle",
    version,
    about = "Compile and run data-preparation recipes over JSON-lines rows"
)]
struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: wrangle::cli::Commands,
}

fn main() {
    let cli = Cli::parse();
    wrangle::cli::init_logging(cli.verbose);
    if let Err(e) = wrangle::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
