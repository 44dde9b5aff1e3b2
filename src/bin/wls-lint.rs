use wlsc::linter;
use wlsc::Config;

use color_eyre::Result;
use termcolor::StandardStream;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::build()?;
    let mut stdout = StandardStream::stdout(config.use_color);

    linter::lint(&config, &mut stdout)
}
