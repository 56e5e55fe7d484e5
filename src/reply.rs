use std::fmt;

use crate::Error;

/// Outcome of a command, rendered for the terminal by `Display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Value(String),
    Nil,
    Integer(i64),
    Text(String),
    Error(String),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => f.write_str("OK"),
            Reply::Value(s) => write!(f, "\"{}\"", s),
            Reply::Nil => f.write_str("(nil)"),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Text(s) => f.write_str(s),
            Reply::Error(s) => write!(f, "(error) {}", s),
        }
    }
}

impl From<Error> for Reply {
    fn from(e: Error) -> Self {
        Reply::Error(e.to_string())
    }
}

impl From<Option<String>> for Reply {
    fn from(value: Option<String>) -> Self {
        value.map_or(Reply::Nil, Reply::Value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_replies() {
        assert_eq!(Reply::Ok.to_string(), "OK");
        assert_eq!(Reply::Value("world".into()).to_string(), "\"world\"");
        assert_eq!(Reply::Nil.to_string(), "(nil)");
        assert_eq!(Reply::Integer(-2).to_string(), "(integer) -2");
        assert_eq!(Reply::Text("line one\nline two".into()).to_string(), "line one\nline two");
    }

    #[test]
    fn errors_become_error_replies() {
        let reply = Reply::from(Error::Command("bad input".into()));
        assert_eq!(reply.to_string(), "(error) Command error: bad input");
    }

    #[test]
    fn optional_values() {
        assert_eq!(Reply::from(Some("v".to_string())), Reply::Value("v".into()));
        assert_eq!(Reply::from(None::<String>), Reply::Nil);
    }
}
