//! Replies written back for each command

use std::fmt;

use lrucache::CacheError;

/// Reply to a single command line
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Command succeeded with nothing to report
    Ok,
    /// Stored value
    Value(String),
    /// Stored nil value (distinct from a missing key)
    Nil,
    /// Non-strict lookup found nothing
    Miss,
    /// Integer result
    Integer(i64),
    /// Fractional result
    Float(f64),
    /// Ordered list of keys
    List(Vec<String>),
    /// Multi-line `field:value` report
    Info(Vec<(&'static str, String)>),
    /// Error message
    Error(String),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => write!(f, "OK"),
            Reply::Value(v) => write!(f, "{}", v),
            Reply::Nil => write!(f, "(nil)"),
            Reply::Miss => write!(f, "(miss)"),
            Reply::Integer(n) => write!(f, "{}", n),
            Reply::Float(x) => write!(f, "{:.2}", x),
            Reply::List(items) if items.is_empty() => write!(f, "(empty)"),
            Reply::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, item)?;
                }
                Ok(())
            }
            Reply::Info(fields) => {
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}:{}", name, value)?;
                }
                Ok(())
            }
            Reply::Error(msg) => write!(f, "ERR {}", msg),
        }
    }
}

impl From<Option<String>> for Reply {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(v) => Reply::Value(v),
            None => Reply::Nil,
        }
    }
}

impl From<CacheError> for Reply {
    fn from(err: CacheError) -> Self {
        Reply::Error(err.to_string())
    }
}
