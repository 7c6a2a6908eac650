use clap::Parser;
use tracing::error;

use crate::cmds::Opt;

mod cmds;
mod commands;
mod errors;

fn main() {
    let opt = Opt::parse();

    let tracing_level = if opt.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // stdout is reserved for the changelog when writing to `-`
    tracing_subscriber::fmt::fmt()
        .with_max_level(tracing_level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = commands::generate::execute(opt.generate) {
        error!("{e}");
        std::process::exit(1);
    }
}
