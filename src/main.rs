use clap::Parser;
use curbside::cli::{Cli, Commands};
use miette::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix
    // piping. Without this, piping to `head`, `grep -q`, etc. causes a panic
    // on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let file = cli.file;

    match cli.command {
        Commands::New => curbside::cli::commands::new::run(file),
        Commands::Edit { id } => curbside::cli::commands::edit::run(&id, file),
        Commands::Import { path } => curbside::cli::commands::import::run(&path, file),
        Commands::List => curbside::cli::commands::list::run(file),
    }
}
