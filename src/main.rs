//! valkey-failover - command-line client for Active-Active Valkey/Redis
//!
//! Runs single operations through the failover client, or a short demo loop
//! that keeps incrementing a counter while endpoints come and go.

use anyhow::{Context, Result};
use std::thread;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use valkey_failover::client::{Expiry, SetOptions};
use valkey_failover::config::{CliArgs, CliCommand, FailoverConfig};
use valkey_failover::failover::{Command, FailoverClient, JsonSetCommand, SetCommand};

fn setup_logging(verbose: bool, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Map a one-shot subcommand onto a facade command
///
/// `demo` is a loop rather than a single command and is handled by the caller.
fn to_command(cmd: &CliCommand) -> Result<Command> {
    let command = match cmd {
        CliCommand::Ping => Command::Ping,
        CliCommand::Get { key } => Command::Get { key: key.clone() },
        CliCommand::Set {
            key,
            value,
            ex,
            px,
            nx,
        } => {
            let expiry = match (ex, px) {
                (Some(secs), _) => Some(Expiry::Seconds(*secs)),
                (None, Some(ms)) => Some(Expiry::Millis(*ms)),
                (None, None) => None,
            };
            Command::Set(SetCommand {
                key: key.clone(),
                value: value.clone().into_bytes(),
                options: SetOptions {
                    expiry,
                    only_if_absent: *nx,
                },
            })
        }
        CliCommand::Incr { key } => Command::Incr { key: key.clone() },
        CliCommand::JsonSet { key, path, json } => Command::JsonSet(JsonSetCommand {
            key: key.clone(),
            path: path.clone(),
            document: serde_json::from_str(json).context("Invalid JSON document")?,
        }),
        CliCommand::Demo { .. } => anyhow::bail!("demo is not a single command"),
    };
    Ok(command)
}

fn run_demo(client: &mut FailoverClient, key: &str, count: u32, interval: Duration) -> Result<()> {
    info!("Incrementing {} {} times", key, count);
    for i in 1..=count {
        let value = client.incr(key)?;
        info!(
            iteration = i,
            value,
            endpoint = %client.active_endpoint(),
            "INCR {}", key
        );
        if i < count {
            thread::sleep(interval);
        }
    }

    let value = client.get(key)?;
    match value {
        Some(v) => println!("{} = {}", key, v),
        None => println!("{} = (nil)", key),
    }
    Ok(())
}

fn run() -> Result<()> {
    let args = CliArgs::parse_args();

    setup_logging(args.verbose, args.quiet)?;

    let config = FailoverConfig::from_cli(&args)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    info!(
        "Endpoints: {:?}",
        config
            .endpoints
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
    );

    let mut client = FailoverClient::new(config)?;

    let result = match &args.command {
        CliCommand::Demo {
            key,
            count,
            interval_ms,
        } => run_demo(&mut client, key, *count, Duration::from_millis(*interval_ms)),
        other => to_command(other).and_then(|command| {
            let out = client.run(&command)?;
            println!("{}", out);
            Ok(())
        }),
    };

    client.close();
    result
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn command_for(argv: &[&str]) -> Result<Command> {
        let args = CliArgs::parse_from(argv);
        to_command(&args.command)
    }

    #[test]
    fn test_set_flags_become_options() {
        let command = command_for(&["valkey-failover", "set", "k", "v", "--px", "250", "--nx"]).unwrap();
        assert_eq!(
            command,
            Command::Set(SetCommand {
                key: "k".into(),
                value: b"v".to_vec(),
                options: SetOptions {
                    expiry: Some(Expiry::Millis(250)),
                    only_if_absent: true,
                },
            })
        );
    }

    #[test]
    fn test_json_set_parses_document() {
        let command =
            command_for(&["valkey-failover", "json-set", "doc", "$", r#"{"n":1}"#]).unwrap();
        match command {
            Command::JsonSet(cmd) => assert_eq!(cmd.document, serde_json::json!({"n": 1})),
            other => panic!("unexpected command {:?}", other),
        }
        assert!(command_for(&["valkey-failover", "json-set", "doc", "$", "{oops"]).is_err());
    }

    #[test]
    fn test_demo_is_not_a_single_command() {
        assert!(command_for(&["valkey-failover", "demo"]).is_err());
    }
}
