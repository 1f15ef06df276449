//! `LISTEN_PID` / `LISTEN_FDS` / `LISTEN_FDNAMES` protocol.

use std::env;
use std::ffi::c_int;

use super::{ListenFdSource, ListenFds};
use crate::errno;

pub const LISTEN_PID_ENV: &str = "LISTEN_PID";
pub const LISTEN_FDS_ENV: &str = "LISTEN_FDS";
pub const LISTEN_FDNAMES_ENV: &str = "LISTEN_FDNAMES";

/// First descriptor a supervisor passes.
pub const LISTEN_FDS_START: c_int = 3;

/// Reads passed descriptors from the process environment.
///
/// Descriptors addressed to another pid, or an absent protocol, yield an
/// empty result rather than an error. Every passed descriptor is marked
/// close-on-exec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvListenFds {
    pub base: c_int,
    /// Remove the protocol variables after reading them so child processes
    /// do not pick up descriptors meant for us.
    pub unset_environment: bool,
}

impl Default for EnvListenFds {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvListenFds {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            base: LISTEN_FDS_START,
            unset_environment: true,
        }
    }

    #[must_use]
    pub const fn with_base(base: c_int) -> Self {
        Self {
            base,
            unset_environment: true,
        }
    }

    fn read(&self) -> Result<ListenFds, c_int> {
        let empty = ListenFds {
            base: self.base,
            names: Vec::new(),
        };

        let Some(pid) = var(LISTEN_PID_ENV)? else {
            return Ok(empty);
        };
        let pid: libc::pid_t = parse_positive(&pid)?;
        // SAFETY: getpid has no preconditions.
        if pid != unsafe { libc::getpid() } {
            return Ok(empty);
        }

        let Some(count) = var(LISTEN_FDS_ENV)? else {
            return Ok(empty);
        };
        let count = parse_count(&count)?;
        if count == 0 {
            return Ok(empty);
        }
        if self.base.checked_add(count).is_none() {
            return Err(errno::EINVAL);
        }

        for fd in self.base..self.base + count {
            set_cloexec(fd)?;
        }

        let names = match var(LISTEN_FDNAMES_ENV)? {
            Some(raw) => {
                let names: Vec<String> = raw.split(':').map(str::to_string).collect();
                if names.len() != count as usize {
                    return Err(errno::EINVAL);
                }
                names
            }
            None => vec!["unknown".to_string(); count as usize],
        };

        Ok(ListenFds {
            base: self.base,
            names,
        })
    }

    fn clear_environment() {
        for key in [LISTEN_PID_ENV, LISTEN_FDS_ENV, LISTEN_FDNAMES_ENV] {
            // SAFETY: the registry queries once, from whichever thread first
            // needs an activation socket; no other code in this library reads
            // or writes these variables concurrently.
            unsafe { env::remove_var(key) };
        }
    }
}

impl ListenFdSource for EnvListenFds {
    fn query(&mut self) -> Result<ListenFds, c_int> {
        let result = self.read();
        if self.unset_environment {
            Self::clear_environment();
        }
        result
    }
}

fn var(key: &str) -> Result<Option<String>, c_int> {
    match env::var(key) {
        Ok(v) => Ok(Some(v)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(errno::EINVAL),
    }
}

fn parse_positive<T>(raw: &str) -> Result<T, c_int>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match raw.trim().parse::<T>() {
        Ok(v) if v > T::default() => Ok(v),
        _ => Err(errno::EINVAL),
    }
}

fn parse_count(raw: &str) -> Result<c_int, c_int> {
    match raw.trim().parse::<c_int>() {
        Ok(v) if v >= 0 => Ok(v),
        _ => Err(errno::EINVAL),
    }
}

fn set_cloexec(fd: c_int) -> Result<(), c_int> {
    // SAFETY: fcntl on an arbitrary descriptor is memory-safe; a bad one
    // reports EBADF.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
    if flags < 0 {
        return Err(errno::last_errno());
    }
    if flags & libc::FD_CLOEXEC != 0 {
        return Ok(());
    }
    // SAFETY: as above.
    if unsafe { libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC) } < 0 {
        return Err(errno::last_errno());
    }
    Ok(())
}
