use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "sdkconn")]
#[command(about = "SDK channel lifecycle tools")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Run a lifecycle script against an in-memory registry
	///
	/// Prints every registry event as one JSON line, then a summary line.
	Replay {
		/// Script file (JSON)
		#[arg(value_name = "SCRIPT")]
		script: PathBuf,

		/// Registry configuration file (JSON)
		#[arg(long, value_name = "FILE")]
		config: Option<PathBuf>,
	},
}

/// Cargo-like help colors.
fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
}
