use clap::Parser;

/// `wtf` takes no subcommands: it launches the wrapped shell directly.
///
/// The only recognized flag is version, in both `--version` and `-v` form.
#[derive(Parser, Debug)]
#[command(name = "wtf", about = "Terminal wrapper with an AI chat sidebar")]
pub struct Cli {
    #[arg(short = 'v', long = "version", action = clap::ArgAction::SetTrue)]
    pub version: bool,
}
