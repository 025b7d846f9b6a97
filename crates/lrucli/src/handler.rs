//! Command handler for cache scripts

use lrucache::{CacheError, SharedLruCache};
use tracing::{debug, warn};

use crate::reply::Reply;

/// Cache driven by the command interpreter. A `None` value is a stored nil.
pub type ScriptCache = SharedLruCache<String, Option<String>>;

pub struct CommandHandler {
    cache: ScriptCache,
}

impl CommandHandler {
    pub fn new(cache: ScriptCache) -> Self {
        Self { cache }
    }

    /// Execute one script line. Blank lines and `#` comments produce no reply.
    pub fn handle(&self, line: &str) -> Option<Reply> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let (command, rest) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));
        let command = command.to_uppercase();
        let rest = rest.trim_start();
        let args: Vec<&str> = rest.split_whitespace().collect();
        debug!(command = %command, args = args.len(), "handling command");

        let reply = match command.as_str() {
            "PUT" => self.handle_put(rest),
            "GET" => self.handle_get(&args),
            "TRYGET" => self.handle_try_get(&args),
            "DEL" => self.handle_del(&args),
            "CLEAR" => self.handle_clear(&args),
            "CAPACITY" => self.handle_capacity(&args),
            "UTIL" => self.handle_util(&args),
            "LEN" => self.handle_len(&args),
            "KEYS" => self.handle_keys(&args),
            "STATS" => self.handle_stats(&args),
            _ => {
                warn!(command = %command, "unknown command");
                Reply::Error(format!("unknown command '{}'", command))
            }
        };
        Some(reply)
    }

    /// `PUT <key> [value]`: the value is the rest of the line, spaces included.
    fn handle_put(&self, rest: &str) -> Reply {
        let (key, value) = rest
            .split_once(char::is_whitespace)
            .unwrap_or((rest, ""));
        if key.is_empty() {
            return CacheError::InvalidArgument("missing key for 'put' command".to_string())
                .into();
        }

        let value = value.trim();
        let value = (!value.is_empty()).then(|| value.to_string());
        self.cache.put(key.to_string(), value);
        Reply::Ok
    }

    fn handle_get(&self, args: &[&str]) -> Reply {
        let key = match single_key_arg("get", args) {
            Ok(key) => key,
            Err(reply) => return reply,
        };

        match self.cache.get(key) {
            Ok(value) => Reply::from(value),
            Err(e) => e.into(),
        }
    }

    fn handle_try_get(&self, args: &[&str]) -> Reply {
        let key = match single_key_arg("tryget", args) {
            Ok(key) => key,
            Err(reply) => return reply,
        };

        match self.cache.try_get(key) {
            Some(value) => Reply::from(value),
            None => Reply::Miss,
        }
    }

    fn handle_del(&self, args: &[&str]) -> Reply {
        let key = match single_key_arg("del", args) {
            Ok(key) => key,
            Err(reply) => return reply,
        };

        Reply::Integer(i64::from(self.cache.remove(key)))
    }

    fn handle_clear(&self, args: &[&str]) -> Reply {
        if !args.is_empty() {
            return wrong_arity("clear");
        }
        self.cache.clear();
        Reply::Ok
    }

    fn handle_capacity(&self, args: &[&str]) -> Reply {
        if !args.is_empty() {
            return wrong_arity("capacity");
        }
        Reply::Integer(self.cache.capacity() as i64)
    }

    fn handle_util(&self, args: &[&str]) -> Reply {
        if !args.is_empty() {
            return wrong_arity("util");
        }
        Reply::Float(self.cache.utilization())
    }

    fn handle_len(&self, args: &[&str]) -> Reply {
        if !args.is_empty() {
            return wrong_arity("len");
        }
        Reply::Integer(self.cache.len() as i64)
    }

    fn handle_keys(&self, args: &[&str]) -> Reply {
        if !args.is_empty() {
            return wrong_arity("keys");
        }
        Reply::List(self.cache.keys())
    }

    fn handle_stats(&self, args: &[&str]) -> Reply {
        if !args.is_empty() {
            return wrong_arity("stats");
        }

        let stats = self.cache.stats().snapshot();
        Reply::Info(vec![
            ("len", self.cache.len().to_string()),
            ("capacity", self.cache.capacity().to_string()),
            ("utilization", format!("{:.2}", self.cache.utilization())),
            ("hits", stats.hits.to_string()),
            ("misses", stats.misses.to_string()),
            ("inserts", stats.inserts.to_string()),
            ("evictions", stats.evictions.to_string()),
            ("hit_ratio", format!("{:.2}", stats.hit_ratio())),
        ])
    }
}

/// A missing key is a contract violation, not a miss.
fn key_arg<'a>(command: &str, args: &[&'a str]) -> Result<&'a str, CacheError> {
    args.first().copied().ok_or_else(|| {
        CacheError::InvalidArgument(format!("missing key for '{}' command", command))
    })
}

fn single_key_arg<'a>(command: &str, args: &[&'a str]) -> Result<&'a str, Reply> {
    let key = key_arg(command, args).map_err(Reply::from)?;
    if args.len() > 1 {
        return Err(wrong_arity(command));
    }
    Ok(key)
}

fn wrong_arity(command: &str) -> Reply {
    Reply::Error(format!("wrong number of arguments for '{}' command", command))
}
