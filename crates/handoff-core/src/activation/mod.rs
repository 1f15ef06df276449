//! Activation registry: hand out descriptors passed in by the service
//! supervisor.
//!
//! The supervisor is queried once, on first use. Descriptors it named are
//! looked up by name and may be handed out any number of times; unnamed ones
//! (empty, `unknown` or `stored` names) are handed out once each, in the
//! order they were passed.

mod env;

use std::collections::{HashMap, VecDeque};
use std::ffi::c_int;
use std::fmt;

use crate::errno;
use crate::log;
use crate::rule::Rule;

pub use env::{
    EnvListenFds, LISTEN_FDNAMES_ENV, LISTEN_FDS_ENV, LISTEN_FDS_START, LISTEN_PID_ENV,
};

/// Result of a supervisor query: the descriptor at position `i` is
/// `base + i` and is named `names[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenFds {
    pub base: c_int,
    pub names: Vec<String>,
}

impl ListenFds {
    #[must_use]
    pub fn count(&self) -> usize {
        self.names.len()
    }
}

/// Where the registry learns about passed descriptors.
pub trait ListenFdSource {
    /// Returns the passed descriptors or the errno of a failed query.
    fn query(&mut self) -> Result<ListenFds, c_int>;
}

/// Names the supervisor uses for descriptors that were not given one.
#[must_use]
pub fn is_anonymous_name(name: &str) -> bool {
    matches!(name, "" | "unknown" | "stored")
}

/// Mismatch between the sockets the supervisor passed and what the rules
/// ask for. None of these can be recovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationError {
    Query { errno: c_int },
    NoSockets,
    UnknownName(String),
    Exhausted,
}

impl fmt::Display for ActivationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query { errno } => write!(
                f,
                "Unable to get activation sockets: {}",
                errno::strerror_message(*errno)
            ),
            Self::NoSockets => f.write_str(
                "Needed at least one activation socket file descriptor, but found zero.",
            ),
            Self::UnknownName(name) => write!(f, "Can't get activation socket for '{name}'."),
            Self::Exhausted => f.write_str("Ran out of activation sockets to assign"),
        }
    }
}

impl std::error::Error for ActivationError {}

#[derive(Debug, Default)]
struct Pool {
    named: HashMap<String, c_int>,
    unnamed: VecDeque<c_int>,
}

impl Pool {
    fn from_listen_fds(fds: &ListenFds) -> Self {
        let mut pool = Self::default();
        for (fd, name) in (fds.base..).zip(&fds.names) {
            if is_anonymous_name(name) {
                pool.unnamed.push_back(fd);
            } else {
                pool.named.insert(name.clone(), fd);
            }
        }
        pool
    }
}

/// Name → descriptor map plus a queue of unnamed descriptors, filled from
/// `S` exactly once.
#[derive(Debug)]
pub struct ActivationRegistry<S> {
    source: S,
    state: Option<Result<Pool, ActivationError>>,
}

impl<S: ListenFdSource> ActivationRegistry<S> {
    #[must_use]
    pub const fn new(source: S) -> Self {
        Self {
            source,
            state: None,
        }
    }

    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.state.is_some()
    }

    /// Query the supervisor if that has not happened yet. The outcome,
    /// success or failure, is kept for the lifetime of the registry.
    pub fn ensure_populated(&mut self) -> Result<(), ActivationError> {
        self.pool().map(drop)
    }

    fn pool(&mut self) -> Result<&mut Pool, ActivationError> {
        let source = &mut self.source;
        let state = self.state.get_or_insert_with(|| {
            let fds = source
                .query()
                .map_err(|errno| ActivationError::Query { errno })?;
            if fds.count() == 0 {
                return Err(ActivationError::NoSockets);
            }
            let pool = Pool::from_listen_fds(&fds);
            log::debug(
                "activation",
                format_args!(
                    "received {} sockets from supervisor ({} named, {} unnamed)",
                    fds.count(),
                    pool.named.len(),
                    pool.unnamed.len()
                ),
            );
            Ok(pool)
        });
        state.as_mut().map_err(|err| err.clone())
    }

    /// Descriptor for `rule`: the socket named by `rule.fd_name` if set,
    /// otherwise the next unnamed socket.
    pub fn acquire(&mut self, rule: &Rule) -> Result<c_int, ActivationError> {
        self.acquire_name(rule.fd_name.as_deref())
    }

    /// [`ActivationRegistry::acquire`] with the name given directly.
    pub fn acquire_name(&mut self, name: Option<&str>) -> Result<c_int, ActivationError> {
        let pool = self.pool()?;
        let fd = match name {
            Some(name) => *pool
                .named
                .get(name)
                .ok_or_else(|| ActivationError::UnknownName(name.to_string()))?,
            None => pool.unnamed.pop_front().ok_or(ActivationError::Exhausted)?,
        };
        log::debug(
            "activation",
            format_args!("handing out fd {fd} for {}", name.unwrap_or("<unnamed>")),
        );
        Ok(fd)
    }

    /// Number of named sockets, once populated.
    #[must_use]
    pub fn named_count(&self) -> Option<usize> {
        match &self.state {
            Some(Ok(pool)) => Some(pool.named.len()),
            _ => None,
        }
    }

    /// Unnamed sockets not yet handed out, once populated.
    #[must_use]
    pub fn unnamed_remaining(&self) -> Option<usize> {
        match &self.state {
            Some(Ok(pool)) => Some(pool.unnamed.len()),
            _ => None,
        }
    }
}
