use wlsc::migrate_tool;
use wlsc::MigrateOptions;

use color_eyre::Result;
use termcolor::StandardStream;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = MigrateOptions::from_args();
    let mut stdout = StandardStream::stdout(opts.use_color);

    let code = migrate_tool::run(&opts, &mut stdout)?;
    std::process::exit(code);
}
