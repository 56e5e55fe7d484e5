use tracing::error;

use crate::{reply::Reply, storage::Store, Error, Result};

pub const HELP: &str = "\
Available commands:
  SET key value       Store value at key, replacing any value and expiry.
  GET key             Return the value at key, or (nil) if there is none.
  DELETE key          Remove key if it exists. DEL is an alias.
  EXPIRE key seconds  Remove key automatically after the given seconds.
                      Ignored if key does not exist.
  TTL key             Seconds left before key expires. -1 if key has no
                      expiry, -2 if key does not exist.
  PERSIST             Save the whole store to disk.
  HELP                Show this message.
  EXIT                Quit.

Command names are case-insensitive.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { key: String, value: String },
    Get(String),
    Delete(String),
    Expire { key: String, seconds: u64 },
    Ttl(String),
    Persist,
    Help,
}

impl Command {
    /// Splits `line` on whitespace and builds the command it names.
    /// A blank line yields `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut parts = line.split_whitespace();

        let command = match parts.next() {
            Some(verb) => verb.to_uppercase(),
            None => return Ok(None),
        };
        let args: Vec<&str> = parts.collect();

        let cmd = match (command.as_str(), args.as_slice()) {
            ("SET", [key, value]) => Command::Set {
                key: key.to_string(),
                value: value.to_string(),
            },
            ("GET", [key]) => Command::Get(key.to_string()),
            ("DELETE" | "DEL", [key]) => Command::Delete(key.to_string()),
            ("EXPIRE", [key, seconds]) => {
                let seconds = seconds.parse::<u64>().map_err(|_| {
                    Error::Command(format!(
                        "invalid seconds '{}': expected a non-negative integer",
                        seconds
                    ))
                })?;
                Command::Expire {
                    key: key.to_string(),
                    seconds,
                }
            }
            ("TTL", [key]) => Command::Ttl(key.to_string()),
            ("PERSIST", []) => Command::Persist,
            ("HELP", []) => Command::Help,
            ("SET" | "GET" | "DELETE" | "DEL" | "EXPIRE" | "TTL" | "PERSIST" | "HELP", _) => {
                return Err(Error::Command(format!(
                    "wrong number of arguments for '{}'",
                    command
                )))
            }
            _ => {
                return Err(Error::Command(format!(
                    "unknown command '{}'. Type HELP for guidance.",
                    command
                )))
            }
        };

        Ok(Some(cmd))
    }

    pub fn execute(&self, store: &Store) -> Reply {
        match self {
            Command::Set { key, value } => {
                store.set(key.clone(), value.clone());
                Reply::Ok
            }
            Command::Get(key) => store.get(key).into(),
            Command::Delete(key) => {
                store.delete(key);
                Reply::Ok
            }
            Command::Expire { key, seconds } => {
                store.expire(key, *seconds);
                Reply::Ok
            }
            Command::Ttl(key) => Reply::Integer(store.ttl(key)),
            Command::Persist => match store.persist() {
                Ok(()) => Reply::Ok,
                Err(e) => {
                    error!("Failed to persist to {:?}: {}", store.snapshot_path(), e);
                    Reply::Error(format!("failed to persist: {}", e))
                }
            },
            Command::Help => Reply::Text(HELP.to_string()),
        }
    }
}

/// Parses and runs one input line. Blank lines produce no reply.
pub fn dispatch(line: &str, store: &Store) -> Option<Reply> {
    match Command::parse(line) {
        Ok(Some(cmd)) => Some(cmd.execute(store)),
        Ok(None) => None,
        Err(e) => Some(e.into()),
    }
}
