use clap::Parser;
use passlocal::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Status => passlocal::cli::commands::status::execute(&cli),
        Commands::Init => passlocal::cli::commands::init::execute(&cli),
        Commands::List => passlocal::cli::commands::list::execute(&cli),
        Commands::Folder { ref action } => passlocal::cli::commands::folder::execute(&cli, action),
        Commands::Secret { ref action } => passlocal::cli::commands::secret::execute(&cli, action),
        Commands::Passwd => passlocal::cli::commands::passwd::execute(&cli),
    };

    if let Err(e) = result {
        passlocal::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `PASSLOCAL_LOG` (default `warn`, or `info`
/// with `--verbose`).
fn init_logging(verbose: bool) {
    let default = if verbose { "passlocal=info" } else { "warn" };
    let filter = EnvFilter::try_from_env("PASSLOCAL_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
