use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use planetary_system::config::DEFAULT_CONFIG_PATH;
use planetary_system::state::RunOptions;
use std::io;
use std::path::PathBuf;

/// Sun, planets on circular orbits, and asteroids you fling at them
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// System description to load (written with defaults if missing)
  #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
  config: PathBuf,
  /// Overwrite the system description with the defaults before loading
  #[arg(long, default_value_t = false)]
  reset_config: bool,
  /// Run in headless mode (no window)
  #[arg(long, default_value_t = false)]
  headless: bool,
  /// Frames to simulate in headless mode
  #[arg(short, long, default_value_t = 600)]
  frames: u32,
  /// Random asteroids to launch in headless mode
  #[arg(short, long, default_value_t = 0)]
  asteroids: u32,
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Generate shell completion scripts
  Completions {
    /// The shell to generate the script for
    #[arg(value_enum)]
    shell: Shell,
  },
}

fn main() -> anyhow::Result<()> {
  let args = Args::parse();

  if let Some(Commands::Completions { shell }) = args.command {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    return Ok(());
  }

  planetary_system::state::run(&RunOptions {
    config_path: args.config,
    reset_config: args.reset_config,
    headless: args.headless,
    frames: args.frames,
    asteroids: args.asteroids,
  })
}
