//! Option ledger: capture socket configuration on one descriptor and replay
//! it onto another.
//!
//! Every `setsockopt` and tracked `ioctl` the application issues is appended
//! to a single FIFO, so replay reproduces the original call order across
//! both kinds. Replay first copies the descriptor flags (`F_GETFD`) and the
//! file-status flags (`F_GETFL`), then drains the FIFO. Draining is
//! destructive: each entry leaves the ledger before it is attempted, and the
//! first failure stops the replay.

mod host;

use std::collections::VecDeque;
use std::ffi::{c_int, c_ulong};
use std::fmt;
use std::mem;

use crate::errno;
use crate::log;

pub use host::HostFdOps;

/// `ioctl` request setting the process group that receives `SIGIO`/`SIGURG`.
/// Same value on every Linux architecture; `libc` has no binding for it.
pub const SIOCSPGRP: c_ulong = 0x8902;
/// `ioctl` request toggling `O_ASYNC`. Architecture dependent.
pub const FIOASYNC: c_ulong = libc::FIOASYNC as c_ulong;

/// Number of argument bytes captured for `request`, `None` when the request
/// is not tracked.
#[must_use]
pub const fn ioctl_arg_len(request: c_ulong) -> Option<usize> {
    match request {
        SIOCSPGRP => Some(mem::size_of::<libc::pid_t>()),
        FIOASYNC => Some(mem::size_of::<c_int>()),
        _ => None,
    }
}

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Option {
        level: c_int,
        name: c_int,
        value: Vec<u8>,
    },
    Ioctl {
        request: c_ulong,
        arg: Vec<u8>,
    },
}

/// Descriptor operations replay is built on. Every method returns the errno
/// of a failed call.
pub trait FdOps {
    fn get_fd_flags(&mut self, fd: c_int) -> Result<c_int, c_int>;
    fn get_status_flags(&mut self, fd: c_int) -> Result<c_int, c_int>;
    fn set_fd_flags(&mut self, fd: c_int, flags: c_int) -> Result<(), c_int>;
    fn set_status_flags(&mut self, fd: c_int, flags: c_int) -> Result<(), c_int>;
    fn set_option(&mut self, fd: c_int, level: c_int, name: c_int, value: &[u8]) -> Result<(), c_int>;
    fn ioctl(&mut self, fd: c_int, request: c_ulong, arg: &[u8]) -> Result<(), c_int>;
}

/// Which replay step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayStep {
    GetFd,
    GetFl,
    SetFd,
    SetFl,
    Option { level: c_int, name: c_int },
    Ioctl { request: c_ulong },
}

impl ReplayStep {
    /// Name of the underlying call, as `perror` would print it.
    #[must_use]
    pub const fn call_name(self) -> &'static str {
        match self {
            Self::GetFd => "fcntl(F_GETFD)",
            Self::GetFl => "fcntl(F_GETFL)",
            Self::SetFd => "fcntl(F_SETFD)",
            Self::SetFl => "fcntl(F_SETFL)",
            Self::Option { .. } => "setsockopt",
            Self::Ioctl { .. } => "ioctl",
        }
    }

    /// Failures before any entry is drained leave the ledger intact.
    #[must_use]
    pub const fn is_flag_step(self) -> bool {
        matches!(self, Self::GetFd | Self::GetFl | Self::SetFd | Self::SetFl)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayError {
    pub step: ReplayStep,
    pub errno: c_int,
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            self.step.call_name(),
            errno::strerror_message(self.errno)
        )
    }
}

impl std::error::Error for ReplayError {}

/// Ordered capture log for a single descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SockOpts {
    entries: VecDeque<Entry>,
}

impl SockOpts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Record a `setsockopt` call. `value` is copied.
    pub fn capture_option(&mut self, level: c_int, name: c_int, value: &[u8]) {
        self.entries.push_back(Entry::Option {
            level,
            name,
            value: value.to_vec(),
        });
    }

    /// Record an `ioctl` call if `request` is one we can safely replay.
    ///
    /// Returns `false` without recording anything for untracked requests or
    /// when `arg` is shorter than the request's argument.
    pub fn capture_ioctl(&mut self, request: c_ulong, arg: &[u8]) -> bool {
        let Some(len) = ioctl_arg_len(request) else {
            return false;
        };
        let Some(arg) = arg.get(..len) else {
            return false;
        };
        self.entries.push_back(Entry::Ioctl {
            request,
            arg: arg.to_vec(),
        });
        true
    }

    /// Copy descriptor flags from `old_fd` to `new_fd`, then drain the
    /// ledger onto `new_fd`.
    ///
    /// A flag failure leaves the ledger untouched. An entry failure leaves
    /// only the entries after the failing one.
    pub fn replay<O: FdOps + ?Sized>(
        &mut self,
        old_fd: c_int,
        new_fd: c_int,
        ops: &mut O,
    ) -> Result<(), ReplayError> {
        let result = self.replay_inner(old_fd, new_fd, ops);
        if let Err(err) = result {
            log::error("sockopts", format_args!("{err}"));
        }
        result
    }

    fn replay_inner<O: FdOps + ?Sized>(
        &mut self,
        old_fd: c_int,
        new_fd: c_int,
        ops: &mut O,
    ) -> Result<(), ReplayError> {
        let fail = |step: ReplayStep| move |errno: c_int| ReplayError { step, errno };

        let fd_flags = ops.get_fd_flags(old_fd).map_err(fail(ReplayStep::GetFd))?;
        let status_flags = ops
            .get_status_flags(old_fd)
            .map_err(fail(ReplayStep::GetFl))?;
        ops.set_fd_flags(new_fd, fd_flags)
            .map_err(fail(ReplayStep::SetFd))?;
        ops.set_status_flags(new_fd, status_flags)
            .map_err(fail(ReplayStep::SetFl))?;

        while let Some(entry) = self.entries.pop_front() {
            match entry {
                Entry::Option { level, name, value } => ops
                    .set_option(new_fd, level, name, &value)
                    .map_err(fail(ReplayStep::Option { level, name }))?,
                Entry::Ioctl { request, arg } => ops
                    .ioctl(new_fd, request, &arg)
                    .map_err(fail(ReplayStep::Ioctl { request }))?,
            }
        }

        log::debug(
            "sockopts",
            format_args!("replayed options from fd {old_fd} onto fd {new_fd}"),
        );
        Ok(())
    }

    /// [`SockOpts::replay`] against the real descriptors.
    pub fn replay_host(&mut self, old_fd: c_int, new_fd: c_int) -> Result<(), ReplayError> {
        self.replay(old_fd, new_fd, &mut HostFdOps)
    }
}
