use clap::Parser;
use penarm::cli::Cli;
use penarm::init_logging;

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let cli = Cli::parse();
    tracing::debug!("penarm {} ({})", penarm::VERSION, penarm::BUILD_DATE);
    cli.run()
}
