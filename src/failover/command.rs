//! Facade commands as plain values
//!
//! Lets callers (the CLI, batch jobs) describe an operation as data and run
//! it through the same retry boundary as the typed facade methods.

use std::fmt;

use super::probe::probe;
use crate::client::{SetOptions, StoreCommands, StoreConnection, StoreValue};
use crate::utils::StoreError;

/// One facade operation with its arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ping,
    Get { key: String },
    Set(SetCommand),
    Incr { key: String },
    JsonSet(JsonSetCommand),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetCommand {
    pub key: String,
    pub value: Vec<u8>,
    pub options: SetOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonSetCommand {
    pub key: String,
    pub path: String,
    pub document: serde_json::Value,
}

/// Result of a [`Command`]
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Pong,
    Value(Option<StoreValue>),
    /// Whether SET / JSON.SET wrote anything
    Written(bool),
    Integer(i64),
}

impl Command {
    /// Run against a single connection, without retries
    pub fn apply<C>(&self, conn: &mut C) -> Result<CommandOutput, StoreError>
    where
        C: StoreConnection + ?Sized,
    {
        match self {
            Command::Ping => probe(conn).map(|()| CommandOutput::Pong),
            Command::Get { key } => conn.get(key).map(CommandOutput::Value),
            Command::Set(cmd) => conn
                .set(&cmd.key, &cmd.value, &cmd.options)
                .map(CommandOutput::Written),
            Command::Incr { key } => conn.incr(key).map(CommandOutput::Integer),
            Command::JsonSet(cmd) => {
                let json = serde_json::to_string(&cmd.document)
                    .map_err(|e| StoreError::InvalidArgument(e.to_string()))?;
                conn.json_set(&cmd.key, &cmd.path, &json)
                    .map(CommandOutput::Written)
            }
        }
    }
}

/// Formatted like valkey-cli replies
impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutput::Pong => f.write_str("PONG"),
            CommandOutput::Value(Some(StoreValue::Text(s))) => write!(f, "\"{}\"", s),
            CommandOutput::Value(Some(StoreValue::Bytes(b))) => {
                write!(f, "\"{}\"", b.escape_ascii())
            }
            CommandOutput::Value(None) | CommandOutput::Written(false) => f.write_str("(nil)"),
            CommandOutput::Written(true) => f.write_str("OK"),
            CommandOutput::Integer(n) => write!(f, "(integer) {}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Connector, Expiry};
    use crate::config::Endpoint;
    use crate::failover::testing::{ScriptedConnection, ScriptedConnector};

    fn conn() -> ScriptedConnection {
        ScriptedConnector::new()
            .connect(&Endpoint::new("a", 6379))
            .unwrap()
    }

    #[test]
    fn test_apply_each_command() {
        let mut c = conn();

        assert_eq!(Command::Ping.apply(&mut c).unwrap(), CommandOutput::Pong);
        assert_eq!(
            Command::Get { key: "k".into() }.apply(&mut c).unwrap(),
            CommandOutput::Value(Some(StoreValue::Text("a:k".into())))
        );
        assert_eq!(
            Command::Incr { key: "n".into() }.apply(&mut c).unwrap(),
            CommandOutput::Integer(1)
        );

        let set = Command::Set(SetCommand {
            key: "k".into(),
            value: b"v".to_vec(),
            options: SetOptions {
                expiry: Some(Expiry::Seconds(5)),
                only_if_absent: false,
            },
        });
        assert_eq!(set.apply(&mut c).unwrap(), CommandOutput::Written(true));

        let json = Command::JsonSet(JsonSetCommand {
            key: "doc".into(),
            path: "$".into(),
            document: serde_json::json!({"region": "use1", "n": 1}),
        });
        assert_eq!(json.apply(&mut c).unwrap(), CommandOutput::Written(true));
    }

    #[test]
    fn test_output_display() {
        assert_eq!(CommandOutput::Pong.to_string(), "PONG");
        assert_eq!(CommandOutput::Value(None).to_string(), "(nil)");
        assert_eq!(
            CommandOutput::Value(Some(StoreValue::Text("v".into()))).to_string(),
            "\"v\""
        );
        assert_eq!(
            CommandOutput::Value(Some(StoreValue::Bytes(vec![0x00, b'a']))).to_string(),
            "\"\\x00a\""
        );
        assert_eq!(CommandOutput::Written(true).to_string(), "OK");
        assert_eq!(CommandOutput::Written(false).to_string(), "(nil)");
        assert_eq!(CommandOutput::Integer(7).to_string(), "(integer) 7");
    }
}
