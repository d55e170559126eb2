use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "calmroom", version, about = "Calmroom CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Guided breathing cycle
    Breathe(commands::breathe::BreatheArgs),
    /// Reaction time test
    Reaction(commands::reaction::ReactionArgs),
    /// Repeat a growing tile pattern
    Pattern(commands::pattern::PatternArgs),
    /// Guided stretches
    Stretch {
        #[command(subcommand)]
        action: commands::stretch::StretchAction,
    },
    /// Find the matching pairs
    Memory(commands::memory::MemoryArgs),
    /// Tap the named colour before time runs out
    ColorTap(commands::color_tap::ColorTapArgs),
    /// Unscramble calm words
    Scramble(commands::scramble::ScrambleArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Breathe(args) => commands::breathe::run(args),
        Commands::Reaction(args) => commands::reaction::run(args),
        Commands::Pattern(args) => commands::pattern::run(args),
        Commands::Stretch { action } => commands::stretch::run(action),
        Commands::Memory(args) => commands::memory::run(args),
        Commands::ColorTap(args) => commands::color_tap::run(args),
        Commands::Scramble(args) => commands::scramble::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
