//! Command dispatch.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use sdkconn_runtime::RegistryConfig;
use tracing::info;

use crate::cli::{Cli, Commands};
use crate::replay::replay;
use crate::script::Script;

pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
	match cli.command {
		Commands::Replay { script, config } => run_replay(&script, config.as_deref()).await,
	}
}

async fn run_replay(script_path: &Path, config_path: Option<&Path>) -> anyhow::Result<()> {
	let config = match config_path {
		Some(path) => RegistryConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
		None => RegistryConfig::default(),
	};
	let script = Script::load(script_path)?;
	info!(
		target: "sdkconn.replay",
		script = %script_path.display(),
		steps = script.steps.len(),
		"replaying script"
	);

	let stdout = std::io::stdout();
	let mut out = stdout.lock();
	let summary = replay(&script, config, &mut out).await?;
	out.flush().context("flushing replay output")?;

	info!(
		target: "sdkconn.replay",
		channels = summary.channels.len(),
		rejected = summary.rejected,
		"replay finished"
	);
	Ok(())
}
