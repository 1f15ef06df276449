//! [`FdOps`] backed by the real system calls.

use std::ffi::{c_int, c_ulong};

use super::FdOps;
use crate::errno;

/// Issues `fcntl`, `setsockopt` and `ioctl` directly through libc.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFdOps;

#[inline]
fn check(rc: c_int) -> Result<c_int, c_int> {
    if rc == -1 { Err(errno::last_errno()) } else { Ok(rc) }
}

impl FdOps for HostFdOps {
    fn get_fd_flags(&mut self, fd: c_int) -> Result<c_int, c_int> {
        // SAFETY: F_GETFD takes no argument.
        check(unsafe { libc::fcntl(fd, libc::F_GETFD) })
    }

    fn get_status_flags(&mut self, fd: c_int) -> Result<c_int, c_int> {
        // SAFETY: F_GETFL takes no argument.
        check(unsafe { libc::fcntl(fd, libc::F_GETFL) })
    }

    fn set_fd_flags(&mut self, fd: c_int, flags: c_int) -> Result<(), c_int> {
        // SAFETY: F_SETFD takes an int argument.
        check(unsafe { libc::fcntl(fd, libc::F_SETFD, flags) }).map(drop)
    }

    fn set_status_flags(&mut self, fd: c_int, flags: c_int) -> Result<(), c_int> {
        // SAFETY: F_SETFL takes an int argument.
        check(unsafe { libc::fcntl(fd, libc::F_SETFL, flags) }).map(drop)
    }

    fn set_option(&mut self, fd: c_int, level: c_int, name: c_int, value: &[u8]) -> Result<(), c_int> {
        // SAFETY: `value` is valid for `value.len()` bytes; the kernel only
        // reads from it.
        check(unsafe {
            libc::setsockopt(
                fd,
                level,
                name,
                value.as_ptr().cast(),
                value.len() as libc::socklen_t,
            )
        })
        .map(drop)
    }

    fn ioctl(&mut self, fd: c_int, request: c_ulong, arg: &[u8]) -> Result<(), c_int> {
        // Tracked requests only read their argument, but the kernel is
        // handed a writable copy regardless.
        let mut arg = arg.to_vec();
        // SAFETY: `arg` holds the full argument captured for `request`.
        check(unsafe { libc::ioctl(fd, request as _, arg.as_mut_ptr()) }).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sockopts::{FIOASYNC, SIOCSPGRP, SockOpts};

    struct Fd(c_int);

    impl Drop for Fd {
        fn drop(&mut self) {
            // SAFETY: closing a descriptor this test opened.
            unsafe { libc::close(self.0) };
        }
    }

    fn tcp_socket() -> Fd {
        // SAFETY: plain socket creation.
        let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_STREAM, 0) };
        assert!(fd >= 0, "socket() failed: errno {}", errno::last_errno());
        Fd(fd)
    }

    fn get_int_option(fd: c_int, level: c_int, name: c_int) -> c_int {
        let mut value: c_int = 0;
        let mut len = std::mem::size_of::<c_int>() as libc::socklen_t;
        // SAFETY: `value`/`len` are live locals sized for an int option.
        let rc = unsafe { libc::getsockopt(fd, level, name, (&mut value as *mut c_int).cast(), &mut len) };
        assert_eq!(rc, 0);
        value
    }

    #[test]
    fn replay_moves_options_and_flags_between_real_sockets() {
        let old = tcp_socket();
        let new = tcp_socket();

        let mut ops = HostFdOps;
        let flags = ops.get_status_flags(old.0).expect("F_GETFL");
        ops.set_status_flags(old.0, flags | libc::O_NONBLOCK).expect("F_SETFL");
        ops.set_fd_flags(old.0, libc::FD_CLOEXEC).expect("F_SETFD");

        let mut ledger = SockOpts::new();
        ledger.capture_option(libc::SOL_SOCKET, libc::SO_REUSEADDR, &1i32.to_ne_bytes());
        ledger.capture_option(libc::SOL_SOCKET, libc::SO_KEEPALIVE, &1i32.to_ne_bytes());
        // SAFETY: plain pid query.
        let pid = unsafe { libc::getpid() };
        assert!(ledger.capture_ioctl(SIOCSPGRP, &pid.to_ne_bytes()));
        assert!(ledger.capture_ioctl(FIOASYNC, &0i32.to_ne_bytes()));

        assert_eq!(ledger.replay_host(old.0, new.0), Ok(()));
        assert!(ledger.is_empty());

        assert_ne!(get_int_option(new.0, libc::SOL_SOCKET, libc::SO_REUSEADDR), 0);
        assert_ne!(get_int_option(new.0, libc::SOL_SOCKET, libc::SO_KEEPALIVE), 0);
        let new_flags = HostFdOps.get_status_flags(new.0).expect("F_GETFL");
        assert_ne!(new_flags & libc::O_NONBLOCK, 0);
        let new_fd_flags = HostFdOps.get_fd_flags(new.0).expect("F_GETFD");
        assert_ne!(new_fd_flags & libc::FD_CLOEXEC, 0);
    }

    #[test]
    fn replay_onto_closed_descriptor_fails_at_set_fd() {
        let old = tcp_socket();
        let mut ledger = SockOpts::new();
        ledger.capture_option(libc::SOL_SOCKET, libc::SO_REUSEADDR, &1i32.to_ne_bytes());

        let err = ledger.replay_host(old.0, -1).expect_err("bad target");
        assert_eq!(err.step, crate::sockopts::ReplayStep::SetFd);
        assert_eq!(err.errno, errno::EBADF);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn invalid_option_fails_and_is_consumed() {
        let old = tcp_socket();
        let new = tcp_socket();
        let mut ledger = SockOpts::new();
        ledger.capture_option(libc::SOL_SOCKET, 0x7fff, &1i32.to_ne_bytes());
        ledger.capture_option(libc::SOL_SOCKET, libc::SO_REUSEADDR, &1i32.to_ne_bytes());

        let err = ledger.replay_host(old.0, new.0).expect_err("unknown option");
        assert_eq!(err.errno, errno::ENOPROTOOPT);
        assert_eq!(ledger.len(), 1);
    }
}
