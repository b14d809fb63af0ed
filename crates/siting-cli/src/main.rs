use clap::Parser;
use siting_cli::{run, Cli};
use siting_core::SitingRules;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("siting_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    run(&cli, &SitingRules::default(), &mut stdout.lock())
}
