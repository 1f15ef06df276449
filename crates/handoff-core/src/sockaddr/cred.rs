//! Local peer credentials and their address encoding.

use std::ffi::c_int;
use std::mem;

use crate::errno;

/// Leading bytes of every credential-derived IPv6 address.
pub const CRED_INET6_PREFIX: [u8; 4] = [0xfe, 0x80, 0x00, 0x00];

/// The uid/gid/pid triple the kernel reports for the other end of a local
/// socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerCred {
    pub pid: libc::pid_t,
    pub uid: libc::uid_t,
    pub gid: libc::gid_t,
}

impl PeerCred {
    #[must_use]
    pub const fn new(pid: libc::pid_t, uid: libc::uid_t, gid: libc::gid_t) -> Self {
        Self { pid, uid, gid }
    }

    /// Credentials of the peer connected to `fd` (`SO_PEERCRED`).
    pub fn from_socket(fd: c_int) -> Result<Self, c_int> {
        let mut cred = libc::ucred {
            pid: 0,
            uid: 0,
            gid: 0,
        };
        let mut len = mem::size_of::<libc::ucred>() as libc::socklen_t;
        // SAFETY: `cred` and `len` are live locals sized for `ucred`.
        let rc = unsafe {
            libc::getsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_PEERCRED,
                (&mut cred as *mut libc::ucred).cast(),
                &mut len,
            )
        };
        if rc == -1 {
            return Err(errno::last_errno());
        }
        Ok(cred.into())
    }

    /// IPv4 encoding: the pid, big-endian, fills all four bytes. uid and gid
    /// do not fit and are dropped.
    #[must_use]
    pub const fn to_inet_octets(self) -> [u8; 4] {
        (self.pid as u32).to_be_bytes()
    }

    /// IPv6 encoding: `fe80:0000` followed by big-endian uid, gid and pid.
    #[must_use]
    pub fn to_inet6_octets(self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..4].copy_from_slice(&CRED_INET6_PREFIX);
        out[4..8].copy_from_slice(&self.uid.to_be_bytes());
        out[8..12].copy_from_slice(&self.gid.to_be_bytes());
        out[12..].copy_from_slice(&(self.pid as u32).to_be_bytes());
        out
    }

    /// Inverse of [`PeerCred::to_inet6_octets`]. Any address carrying the
    /// `fe80:0000` prefix decodes, so callers must know the address was
    /// synthesized.
    #[must_use]
    pub fn from_inet6_octets(octets: &[u8; 16]) -> Option<Self> {
        if octets[..4] != CRED_INET6_PREFIX {
            return None;
        }
        let word = |at: usize| {
            u32::from_be_bytes([octets[at], octets[at + 1], octets[at + 2], octets[at + 3]])
        };
        Some(Self {
            uid: word(4),
            gid: word(8),
            pid: word(12) as libc::pid_t,
        })
    }
}

impl From<libc::ucred> for PeerCred {
    fn from(cred: libc::ucred) -> Self {
        Self {
            pid: cred.pid,
            uid: cred.uid,
            gid: cred.gid,
        }
    }
}
