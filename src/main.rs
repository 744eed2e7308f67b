use clap::Parser;
use miette::Result;
use outreach::cli::{Cli, Commands, GlobalOpts};
use tracing_subscriber::EnvFilter;

/// Diagnostic logging on stderr; `RUST_LOG` overrides the flag-derived level
fn init_tracing(global: &GlobalOpts) {
    let default = if global.verbose { "outreach=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(global.verbose)
        .try_init();
}

fn main() -> Result<()> {
    // Reset SIGPIPE so piping to `head` exits quietly instead of panicking
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_tracing(&global);

    match cli.command {
        Commands::Init(args) => outreach::cli::commands::init::run(args),
        Commands::Import(args) => outreach::cli::commands::import::run(args, &global),
        Commands::Preview(args) => outreach::cli::commands::preview::run(args, &global),
        Commands::Contacts(cmd) => outreach::cli::commands::contacts::run(cmd, &global),
        Commands::Completions(args) => outreach::cli::commands::completions::run(args),
    }
}
