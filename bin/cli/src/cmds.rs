use clap::Parser;

use crate::commands::generate::GenerateCommand;

#[derive(Debug, Parser)]
#[command(
    name = "gitchanges",
    version,
    about = "Generates a Keep a Changelog style changelog from git history"
)]
pub struct Opt {
    #[arg(long, help = "Prints a verbose output during the program execution")]
    pub debug: bool,

    #[command(flatten)]
    pub generate: GenerateCommand,
}
