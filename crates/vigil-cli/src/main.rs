// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Vigil command-line driver.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vigil::CaptureOptions;
use vigil_config::VigilConfig;
use vigil_core::{classify_environment, ExceptionInfo, Level};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Drive the Vigil monitoring pipeline from the shell.
#[derive(Parser, Debug)]
#[command(name = "vigil", about = "Vigil error monitoring CLI", version)]
struct Args {
	/// Config file to read instead of /etc/vigil/vigil.toml
	#[arg(long, env = "VIGIL_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Capture a message event
	Message {
		text: String,
		#[arg(long, default_value = "info")]
		level: Level,
		/// Call-site tag, repeatable
		#[arg(long = "tag", value_name = "KEY=VALUE", value_parser = parse_tag)]
		tags: Vec<(String, String)>,
	},
	/// Capture an exception event
	Error {
		text: String,
		#[arg(long)]
		fatal: bool,
		#[arg(long = "tag", value_name = "KEY=VALUE", value_parser = parse_tag)]
		tags: Vec<(String, String)>,
	},
	/// Print the browser and OS labels for a user agent
	Classify { user_agent: String },
	/// Mark, wait, and measure
	Measure {
		name: String,
		#[arg(long, default_value_t = 100)]
		millis: u64,
	},
	/// Print the resolved configuration
	Config,
}

fn parse_tag(raw: &str) -> Result<(String, String), String> {
	match raw.split_once('=') {
		Some((key, value)) if !key.trim().is_empty() => {
			Ok((key.trim().to_string(), value.trim().to_string()))
		}
		_ => Err(format!("expected key=value, got '{raw}'")),
	}
}

fn with_tags(mut options: CaptureOptions, tags: Vec<(String, String)>) -> CaptureOptions {
	for (key, value) in tags {
		options = options.tag(key, value);
	}
	options
}

fn load(args: &Args) -> anyhow::Result<VigilConfig> {
	let config = match &args.config {
		Some(path) => vigil_config::load_config_with_file(path),
		None => vigil_config::load_config(),
	};
	config.context("failed to load configuration")
}

fn init_logging(config: &VigilConfig) -> anyhow::Result<()> {
	tracing_subscriber::registry()
		.with(vigil_logs::env_filter(&config.logging)?)
		.with(vigil_logs::fmt_layer(&config.logging))
		.with(vigil::MonitorLayer::new(vigil::global().clone()))
		.try_init()
		.map_err(|e| anyhow!("failed to install subscriber: {e}"))
}

fn print_config(config: &VigilConfig) {
	let monitoring = &config.monitoring;
	println!(
		"dsn = {}",
		monitoring
			.dsn
			.as_ref()
			.map(|dsn| dsn.redacted())
			.unwrap_or_else(|| "(none)".to_string())
	);
	println!("environment = {}", monitoring.environment);
	println!(
		"release = {}",
		monitoring.release.as_deref().unwrap_or("(none)")
	);
	println!("sample_rate = {}", monitoring.sample_rate);
	println!("enable_performance = {}", monitoring.enable_performance);
	println!("debug = {}", monitoring.debug);
	println!("max_breadcrumbs = {}", monitoring.max_breadcrumbs);
	for pattern in &monitoring.ignore_errors {
		println!("ignore_errors += {pattern}");
	}
	let mut tags: Vec<_> = monitoring.tags.iter().collect();
	tags.sort();
	for (key, value) in tags {
		println!("tags.{key} = {value}");
	}
	println!("log.level = {}", config.logging.level);
	println!("log.format = {}", config.logging.format);
}

fn run(command: Command, config: &VigilConfig) -> anyhow::Result<()> {
	match command {
		Command::Message { text, level, tags } => {
			let options = with_tags(CaptureOptions::new().level(level), tags);
			match vigil::capture_message(text, options) {
				Some(id) => println!("{id}"),
				None => println!("dropped"),
			}
		}
		Command::Error { text, fatal, tags } => {
			let mut options = with_tags(CaptureOptions::new(), tags);
			if fatal {
				options = options.fatal();
			}
			match vigil::capture_exception(ExceptionInfo::new("Error", text), options) {
				Some(id) => println!("{id}"),
				None => println!("dropped"),
			}
		}
		Command::Classify { user_agent } => {
			let info = classify_environment(Some(&user_agent));
			println!("{}", serde_json::to_string(&info)?);
		}
		Command::Measure { name, millis } => {
			let start = format!("{name}-start");
			let end = format!("{name}-end");
			vigil::mark(&start);
			thread::sleep(Duration::from_millis(millis));
			vigil::mark(&end);
			let elapsed = vigil::measure(&name, &start, &end)
				.ok_or_else(|| anyhow!("measure '{name}' is missing a mark"))?;
			println!(
				"{}{name} = {}",
				vigil::performance::MEASURE_TAG_PREFIX,
				vigil::performance::format_duration(elapsed)
			);
		}
		Command::Config => print_config(config),
	}
	Ok(())
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	dotenvy::dotenv().ok();

	let config = load(&args)?;

	if matches!(args.command, Command::Config) {
		return run(args.command, &config);
	}

	init_logging(&config)?;
	vigil::init(config.monitoring.clone()).context("failed to initialise monitor")?;
	vigil::install_panic_hook(vigil::global().clone());

	tracing::debug!(command = ?args.command, "running command");
	let result = run(args.command, &config);

	if !vigil::shutdown(SHUTDOWN_TIMEOUT) {
		tracing::warn!("pending events were not delivered before shutdown");
	}
	result
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_message_with_tags() {
		let args = Args::try_parse_from([
			"vigil", "message", "hello", "--level", "warning", "--tag", "feature=payment", "--tag",
			"stage=dev",
		])
		.unwrap();

		match args.command {
			Command::Message { text, level, tags } => {
				assert_eq!(text, "hello");
				assert_eq!(level, Level::Warning);
				assert_eq!(
					tags,
					vec![
						("feature".to_string(), "payment".to_string()),
						("stage".to_string(), "dev".to_string())
					]
				);
			}
			other => panic!("unexpected command: {other:?}"),
		}
	}

	#[test]
	fn rejects_malformed_tag() {
		assert!(Args::try_parse_from(["vigil", "error", "boom", "--tag", "novalue"]).is_err());
		assert!(Args::try_parse_from(["vigil", "error", "boom", "--tag", "=x"]).is_err());
	}

	#[test]
	fn parse_tag_keeps_equals_in_value() {
		assert_eq!(
			parse_tag("query=a=b").unwrap(),
			("query".to_string(), "a=b".to_string())
		);
	}

	#[test]
	fn measure_defaults() {
		let args = Args::try_parse_from(["vigil", "measure", "checkout"]).unwrap();
		match args.command {
			Command::Measure { name, millis } => {
				assert_eq!(name, "checkout");
				assert_eq!(millis, 100);
			}
			other => panic!("unexpected command: {other:?}"),
		}
	}

	#[test]
	fn config_path_flag() {
		let args = Args::try_parse_from(["vigil", "--config", "/tmp/vigil.toml", "config"]).unwrap();
		assert_eq!(args.config, Some(PathBuf::from("/tmp/vigil.toml")));
	}
}
