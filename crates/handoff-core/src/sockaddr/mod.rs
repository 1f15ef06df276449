//! Family-tagged socket addresses.
//!
//! [`SockAddr`] holds either a native `sockaddr_in` or `sockaddr_in6`, so the
//! bytes of an address are always exactly what the kernel reads and writes.
//! Every accessor matches on the family first and only ever touches the
//! structure of that family.
//!
//! Besides network addresses, a `SockAddr` can be synthesized from the
//! credentials of a local peer (see [`PeerCred`]). That lets address-based
//! rules treat Unix-domain peers the same way as network peers.

mod cred;

use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::fmt;
use std::mem::{self, MaybeUninit};
use std::ptr;
use std::slice;

use libc::{in_addr, in6_addr, sa_family_t, sockaddr, sockaddr_in, sockaddr_in6, sockaddr_storage, socklen_t};

pub use cred::{CRED_INET6_PREFIX, PeerCred};

/// Buffer size `inet_ntop` needs for a dotted quad plus NUL.
pub const INET_ADDRSTRLEN: usize = 16;
/// Buffer size `inet_ntop` needs for the longest IPv6 text form plus NUL.
pub const INET6_ADDRSTRLEN: usize = 46;

const INET6_LOOPBACK: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];

/// Address family tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Unset,
    Inet,
    Inet6,
}

impl Family {
    /// Any family other than `AF_INET`/`AF_INET6` maps to `Unset`.
    #[must_use]
    pub const fn from_raw(raw: sa_family_t) -> Self {
        match raw as c_int {
            libc::AF_INET => Self::Inet,
            libc::AF_INET6 => Self::Inet6,
            _ => Self::Unset,
        }
    }

    #[must_use]
    pub const fn as_raw(self) -> sa_family_t {
        match self {
            Self::Unset => libc::AF_UNSPEC as sa_family_t,
            Self::Inet => libc::AF_INET as sa_family_t,
            Self::Inet6 => libc::AF_INET6 as sa_family_t,
        }
    }

    /// Size of the native address structure for this family.
    #[must_use]
    pub const fn native_len(self) -> Option<socklen_t> {
        match self {
            Self::Unset => None,
            Self::Inet => Some(mem::size_of::<sockaddr_in>() as socklen_t),
            Self::Inet6 => Some(mem::size_of::<sockaddr_in6>() as socklen_t),
        }
    }
}

/// An IPv4 or IPv6 endpoint stored in the kernel's own layout.
#[derive(Clone, Copy, Default)]
pub enum SockAddr {
    #[default]
    Unset,
    Inet(sockaddr_in),
    Inet6(sockaddr_in6),
}

// Both structures are plain integers and byte arrays; all-zero is valid.
fn zeroed<T: Copy>() -> T {
    // SAFETY: only instantiated with `sockaddr_in`/`sockaddr_in6`, for which
    // the all-zero bit pattern is a valid value.
    unsafe { MaybeUninit::<T>::zeroed().assume_init() }
}

fn copy_prefix<T: Copy>(bytes: &[u8]) -> T {
    let mut out = zeroed::<T>();
    let n = bytes.len().min(mem::size_of::<T>());
    // SAFETY: at most `size_of::<T>()` bytes are written into `out`, and the
    // source slice holds at least `n` bytes.
    unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), (&mut out as *mut T).cast::<u8>(), n) };
    out
}

// glibc exports these from libc.so; the `libc` crate binds neither on Linux.
unsafe extern "C" {
    fn inet_ntop(af: c_int, src: *const c_void, dst: *mut c_char, size: socklen_t) -> *const c_char;
    fn inet_pton(af: c_int, src: *const c_char, dst: *mut c_void) -> c_int;
}

fn ntop(af: c_int, src: *const c_void, cap: usize) -> Option<String> {
    let mut buf = [0 as c_char; INET6_ADDRSTRLEN];
    // SAFETY: `src` points at an in_addr/in6_addr matching `af`; `buf` holds
    // `cap <= INET6_ADDRSTRLEN` bytes.
    let out = unsafe { inet_ntop(af, src, buf.as_mut_ptr(), cap as socklen_t) };
    if out.is_null() {
        return None;
    }
    // SAFETY: on success inet_ntop wrote a NUL-terminated string into `buf`.
    let text = unsafe { CStr::from_ptr(buf.as_ptr()) };
    text.to_str().ok().map(str::to_owned)
}

fn pton<T: Copy>(af: c_int, host: &str) -> Option<T> {
    let text = CString::new(host).ok()?;
    let mut out = zeroed::<T>();
    // SAFETY: `text` is NUL-terminated and `out` is an in_addr/in6_addr
    // matching `af`.
    let rc = unsafe { inet_pton(af, text.as_ptr(), (&mut out as *mut T).cast()) };
    (rc == 1).then_some(out)
}

impl SockAddr {
    #[must_use]
    pub const fn new() -> Self {
        Self::Unset
    }

    /// All-zero address of `family` (`0.0.0.0:0` or `[::]:0`).
    #[must_use]
    pub fn with_family(family: Family) -> Option<Self> {
        match family {
            Family::Unset => None,
            Family::Inet => {
                let mut sin = zeroed::<sockaddr_in>();
                sin.sin_family = family.as_raw();
                Some(Self::Inet(sin))
            }
            Family::Inet6 => {
                let mut sin6 = zeroed::<sockaddr_in6>();
                sin6.sin6_family = family.as_raw();
                Some(Self::Inet6(sin6))
            }
        }
    }

    /// Build an address from text. Fails for families other than
    /// `AF_INET`/`AF_INET6` and for hosts that do not parse in that family.
    #[must_use]
    pub fn create(host: &str, port: u16, family: sa_family_t) -> Option<Self> {
        let mut addr = Self::with_family(Family::from_raw(family))?;
        if !addr.set_host(host) || !addr.set_port(port) {
            return None;
        }
        Some(addr)
    }

    /// Copy an address out of a raw buffer.
    ///
    /// The family is read from the first two bytes; at most the native size
    /// of that family is copied, and a short buffer leaves the remainder
    /// zeroed. Unknown families and buffers too short to hold a family give
    /// `Unset`.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let Some(raw_family) = bytes.get(..mem::size_of::<sa_family_t>()) else {
            return Self::Unset;
        };
        let family = sa_family_t::from_ne_bytes([raw_family[0], raw_family[1]]);
        match Family::from_raw(family) {
            Family::Unset => Self::Unset,
            Family::Inet => Self::Inet(copy_prefix(bytes)),
            Family::Inet6 => Self::Inet6(copy_prefix(bytes)),
        }
    }

    /// Copy an address out of a `sockaddr` pointer as handed to `bind(2)`.
    ///
    /// # Safety
    ///
    /// `addr` must be null or valid for reads of `len` bytes.
    #[must_use]
    pub unsafe fn from_raw(addr: *const sockaddr, len: socklen_t) -> Self {
        if addr.is_null() {
            return Self::Unset;
        }
        let len = (len as usize).min(mem::size_of::<sockaddr_storage>());
        // SAFETY: caller guarantees `len` readable bytes at `addr`.
        let bytes = unsafe { slice::from_raw_parts(addr.cast::<u8>(), len) };
        Self::from_bytes(bytes)
    }

    #[must_use]
    pub const fn family(&self) -> Family {
        match self {
            Self::Unset => Family::Unset,
            Self::Inet(_) => Family::Inet,
            Self::Inet6(_) => Family::Inet6,
        }
    }

    /// Length of the native structure, `None` when unset.
    #[must_use]
    pub const fn socklen(&self) -> Option<socklen_t> {
        self.family().native_len()
    }

    /// The exact native bytes of this address; empty when unset.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Unset => &[],
            // SAFETY: `sockaddr_in` has no padding; the slice covers exactly
            // the borrowed structure.
            Self::Inet(sin) => unsafe {
                slice::from_raw_parts((sin as *const sockaddr_in).cast::<u8>(), mem::size_of::<sockaddr_in>())
            },
            // SAFETY: as above for `sockaddr_in6`.
            Self::Inet6(sin6) => unsafe {
                slice::from_raw_parts((sin6 as *const sockaddr_in6).cast::<u8>(), mem::size_of::<sockaddr_in6>())
            },
        }
    }

    #[must_use]
    pub fn get_host(&self) -> Option<String> {
        match self {
            Self::Unset => None,
            Self::Inet(sin) => ntop(
                libc::AF_INET,
                (&sin.sin_addr as *const in_addr).cast(),
                INET_ADDRSTRLEN,
            ),
            Self::Inet6(sin6) => ntop(
                libc::AF_INET6,
                (&sin6.sin6_addr as *const in6_addr).cast(),
                INET6_ADDRSTRLEN,
            ),
        }
    }

    /// Parse `host` in this address's family. Leaves the address untouched
    /// on failure.
    pub fn set_host(&mut self, host: &str) -> bool {
        match self {
            Self::Unset => false,
            Self::Inet(sin) => match pton::<in_addr>(libc::AF_INET, host) {
                Some(parsed) => {
                    sin.sin_addr = parsed;
                    true
                }
                None => false,
            },
            Self::Inet6(sin6) => match pton::<in6_addr>(libc::AF_INET6, host) {
                Some(parsed) => {
                    sin6.sin6_addr = parsed;
                    true
                }
                None => false,
            },
        }
    }

    /// Copy only the host part of `other`; both must share a family.
    pub fn set_host_from(&mut self, other: &SockAddr) -> bool {
        match (self, other) {
            (Self::Inet(dst), Self::Inet(src)) => {
                dst.sin_addr = src.sin_addr;
                true
            }
            (Self::Inet6(dst), Self::Inet6(src)) => {
                dst.sin6_addr = src.sin6_addr;
                true
            }
            _ => false,
        }
    }

    /// Replace the host with the encoding of a local peer's credentials.
    ///
    /// IPv4 carries only the pid; IPv6 carries `fe80:0000`, uid, gid and pid.
    /// See [`PeerCred::to_inet_octets`] and [`PeerCred::to_inet6_octets`].
    pub fn set_host_from_cred(&mut self, cred: &PeerCred) -> bool {
        match self {
            Self::Unset => false,
            Self::Inet(sin) => {
                sin.sin_addr.s_addr = u32::from_ne_bytes(cred.to_inet_octets());
                true
            }
            Self::Inet6(sin6) => {
                sin6.sin6_addr.s6_addr = cred.to_inet6_octets();
                true
            }
        }
    }

    /// Port in host byte order.
    #[must_use]
    pub fn get_port(&self) -> Option<u16> {
        match self {
            Self::Unset => None,
            Self::Inet(sin) => Some(u16::from_be(sin.sin_port)),
            Self::Inet6(sin6) => Some(u16::from_be(sin6.sin6_port)),
        }
    }

    pub fn set_port(&mut self, port: u16) -> bool {
        match self {
            Self::Unset => return false,
            Self::Inet(sin) => sin.sin_port = port.to_be(),
            Self::Inet6(sin6) => sin6.sin6_port = port.to_be(),
        }
        true
    }

    /// `127.0.0.0/8` or `::1`. Credential-derived addresses are never
    /// loopback.
    #[must_use]
    pub fn is_loopback(&self) -> bool {
        match self {
            Self::Unset => false,
            Self::Inet(sin) => u32::from_be(sin.sin_addr.s_addr) >> 24 == 127,
            Self::Inet6(sin6) => sin6.sin6_addr.s6_addr == INET6_LOOPBACK,
        }
    }

    /// Write the native structure into `storage` and set `len` to its size.
    /// Does nothing when unset.
    pub fn apply_to(&self, storage: &mut sockaddr_storage, len: &mut socklen_t) {
        let bytes = self.as_bytes();
        if bytes.is_empty() {
            return;
        }
        // SAFETY: `sockaddr_storage` is larger than either native structure.
        unsafe {
            ptr::copy_nonoverlapping(
                bytes.as_ptr(),
                (storage as *mut sockaddr_storage).cast::<u8>(),
                bytes.len(),
            );
        }
        *len = bytes.len() as socklen_t;
    }

    /// `getpeername(2)`-style output: copy as much of the native structure as
    /// fits in `buf` and return the untruncated length.
    pub fn write_truncated(&self, buf: &mut [u8]) -> Option<socklen_t> {
        let bytes = self.as_bytes();
        if bytes.is_empty() {
            return None;
        }
        let n = bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        Some(bytes.len() as socklen_t)
    }
}

impl PartialEq for SockAddr {
    fn eq(&self, other: &Self) -> bool {
        self.family() == other.family() && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for SockAddr {}

impl fmt::Display for SockAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let host = self.get_host().unwrap_or_else(|| "?".to_string());
        match (self, self.get_port()) {
            (Self::Inet(_), Some(port)) => write!(f, "{host}:{port}"),
            (Self::Inet6(_), Some(port)) => write!(f, "[{host}]:{port}"),
            _ => f.write_str("<unset>"),
        }
    }
}

impl fmt::Debug for SockAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("Unset"),
            Self::Inet(_) => f.debug_tuple("Inet").field(&format_args!("{self}")).finish(),
            Self::Inet6(_) => f.debug_tuple("Inet6").field(&format_args!("{self}")).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    const AF_INET: sa_family_t = libc::AF_INET as sa_family_t;
    const AF_INET6: sa_family_t = libc::AF_INET6 as sa_family_t;

    fn v4(host: &str, port: u16) -> SockAddr {
        SockAddr::create(host, port, AF_INET).expect("valid IPv4 address")
    }

    fn v6(host: &str, port: u16) -> SockAddr {
        SockAddr::create(host, port, AF_INET6).expect("valid IPv6 address")
    }

    #[test]
    fn create_rejects_unsupported_family() {
        assert!(SockAddr::create("127.0.0.1", 80, libc::AF_UNIX as sa_family_t).is_none());
        assert!(SockAddr::create("127.0.0.1", 80, libc::AF_UNSPEC as sa_family_t).is_none());
    }

    #[test]
    fn create_rejects_host_of_other_family() {
        assert!(SockAddr::create("::1", 80, AF_INET).is_none());
        assert!(SockAddr::create("10.0.0.1", 80, AF_INET6).is_none());
        assert!(SockAddr::create("not-an-address", 80, AF_INET).is_none());
        assert!(SockAddr::create("1.2.3.4\0", 80, AF_INET).is_none());
    }

    #[test]
    fn create_populates_host_and_port() {
        let addr = v4("192.0.2.7", 8080);
        assert_eq!(addr.family(), Family::Inet);
        assert_eq!(addr.get_host().as_deref(), Some("192.0.2.7"));
        assert_eq!(addr.get_port(), Some(8080));

        let addr = v6("2001:db8::5", 443);
        assert_eq!(addr.family(), Family::Inet6);
        assert_eq!(addr.get_host().as_deref(), Some("2001:db8::5"));
        assert_eq!(addr.get_port(), Some(443));
    }

    #[test]
    fn port_is_stored_in_network_order() {
        let addr = v4("10.0.0.1", 0x1234);
        let SockAddr::Inet(sin) = addr else {
            panic!("expected IPv4");
        };
        assert_eq!(sin.sin_port.to_ne_bytes(), [0x12, 0x34]);
    }

    #[test]
    fn unset_accessors_fail() {
        let mut addr = SockAddr::new();
        assert_eq!(addr.family(), Family::Unset);
        assert_eq!(addr.get_host(), None);
        assert_eq!(addr.get_port(), None);
        assert!(!addr.set_host("127.0.0.1"));
        assert!(!addr.set_port(1));
        assert!(!addr.set_host_from_cred(&PeerCred::new(1, 2, 3)));
        assert!(!addr.is_loopback());
        assert_eq!(addr.socklen(), None);
    }

    #[test]
    fn failed_set_host_keeps_previous_host() {
        let mut addr = v4("198.51.100.1", 1);
        assert!(!addr.set_host("300.1.1.1"));
        assert_eq!(addr.get_host().as_deref(), Some("198.51.100.1"));

        let mut addr = v6("fe80::1", 1);
        assert!(!addr.set_host("fe80:::1"));
        assert_eq!(addr.get_host().as_deref(), Some("fe80::1"));
    }

    #[test]
    fn set_host_from_copies_only_host() {
        let mut dst = v4("10.0.0.1", 1000);
        let src = v4("10.9.8.7", 2000);
        assert!(dst.set_host_from(&src));
        assert_eq!(dst.get_host().as_deref(), Some("10.9.8.7"));
        assert_eq!(dst.get_port(), Some(1000));
    }

    #[test]
    fn set_host_from_rejects_family_mismatch() {
        let mut dst = v4("10.0.0.1", 1000);
        let before = dst;
        assert!(!dst.set_host_from(&v6("::1", 1)));
        assert!(!dst.set_host_from(&SockAddr::new()));
        assert_eq!(dst, before);

        let mut unset = SockAddr::new();
        assert!(!unset.set_host_from(&before));
        assert_eq!(unset, SockAddr::Unset);
    }

    #[test]
    fn cred_address_inet_uses_pid_only() {
        let mut addr = v4("0.0.0.0", 0);
        assert!(addr.set_host_from_cred(&PeerCred::new(0x0a0b_0c0d, 1000, 100)));
        assert_eq!(addr.get_host().as_deref(), Some("10.11.12.13"));
    }

    #[test]
    fn cred_address_inet6_is_link_local_style() {
        let mut addr = v6("::", 0);
        assert!(addr.set_host_from_cred(&PeerCred::new(1234, 1000, 100)));
        assert_eq!(addr.get_host().as_deref(), Some("fe80::3e8:0:64:0:4d2"));
        assert!(!addr.is_loopback());
    }

    #[test]
    fn loopback_detection() {
        assert!(v4("127.0.0.1", 0).is_loopback());
        assert!(v4("127.255.3.4", 0).is_loopback());
        assert!(!v4("128.0.0.1", 0).is_loopback());
        assert!(!v4("10.127.0.1", 0).is_loopback());
        assert!(v6("::1", 0).is_loopback());
        assert!(!v6("::", 0).is_loopback());
        assert!(!v6("::ffff:127.0.0.1", 0).is_loopback());
        assert!(!v6("fe80::1", 0).is_loopback());
    }

    #[test]
    fn apply_to_writes_native_layout() {
        let addr = v4("192.0.2.1", 53);
        let mut storage = zeroed_storage();
        let mut len: socklen_t = 0;
        addr.apply_to(&mut storage, &mut len);
        assert_eq!(len as usize, mem::size_of::<sockaddr_in>());

        // SAFETY: `storage` now holds a sockaddr_in.
        let sin = unsafe { *(&storage as *const sockaddr_storage).cast::<sockaddr_in>() };
        assert_eq!(sin.sin_family, AF_INET);
        assert_eq!(u16::from_be(sin.sin_port), 53);
        assert_eq!(sin.sin_addr.s_addr.to_ne_bytes(), [192, 0, 2, 1]);

        let addr = v6("2001:db8::1", 853);
        addr.apply_to(&mut storage, &mut len);
        assert_eq!(len as usize, mem::size_of::<sockaddr_in6>());
    }

    #[test]
    fn apply_to_unset_leaves_length_alone() {
        let mut storage = zeroed_storage();
        let mut len: socklen_t = 77;
        SockAddr::new().apply_to(&mut storage, &mut len);
        assert_eq!(len, 77);
    }

    #[test]
    fn from_bytes_reads_family_from_buffer() {
        let original = v6("2001:db8::42", 9000);
        let copy = SockAddr::from_bytes(original.as_bytes());
        assert_eq!(copy, original);
        assert_eq!(copy.get_host().as_deref(), Some("2001:db8::42"));
    }

    #[test]
    fn from_bytes_handles_short_and_foreign_buffers() {
        assert_eq!(SockAddr::from_bytes(&[]), SockAddr::Unset);
        assert_eq!(SockAddr::from_bytes(&[2]), SockAddr::Unset);

        let unix_family = (libc::AF_UNIX as sa_family_t).to_ne_bytes();
        assert_eq!(SockAddr::from_bytes(&unix_family), SockAddr::Unset);

        let full = v4("10.1.2.3", 80);
        let short = SockAddr::from_bytes(&full.as_bytes()[..4]);
        assert_eq!(short.family(), Family::Inet);
        assert_eq!(short.get_port(), Some(80));
        assert_eq!(short.get_host().as_deref(), Some("0.0.0.0"));
    }

    #[test]
    fn from_raw_respects_length() {
        let addr = v4("203.0.113.9", 25);
        let mut storage = zeroed_storage();
        let mut len: socklen_t = 0;
        addr.apply_to(&mut storage, &mut len);

        // SAFETY: storage is valid for `len` bytes.
        let copy = unsafe { SockAddr::from_raw((&storage as *const sockaddr_storage).cast(), len) };
        assert_eq!(copy, addr);
        // SAFETY: null is accepted.
        assert_eq!(unsafe { SockAddr::from_raw(ptr::null(), 16) }, SockAddr::Unset);
    }

    #[test]
    fn write_truncated_reports_full_length() {
        let addr = v6("::1", 22);
        let mut small = [0u8; 8];
        assert_eq!(addr.write_truncated(&mut small), Some(28));
        assert_eq!(&small[..], &addr.as_bytes()[..8]);
        assert_eq!(SockAddr::new().write_truncated(&mut small), None);
    }

    #[test]
    fn copies_are_independent() {
        let original = v4("10.0.0.1", 1);
        let mut copy = original;
        assert!(copy.set_port(2));
        assert_eq!(original.get_port(), Some(1));
    }

    #[test]
    fn display_brackets_ipv6() {
        assert_eq!(v4("10.0.0.1", 80).to_string(), "10.0.0.1:80");
        assert_eq!(v6("::1", 443).to_string(), "[::1]:443");
        assert_eq!(SockAddr::new().to_string(), "<unset>");
    }

    #[test]
    fn text_conversion_uses_native_byte_layout() {
        let parsed = pton::<in_addr>(libc::AF_INET, "192.0.2.1").expect("dotted quad");
        assert_eq!(parsed.s_addr.to_ne_bytes(), [192, 0, 2, 1]);
        assert!(pton::<in_addr>(libc::AF_INET, "192.0.2").is_none());

        let parsed = pton::<in6_addr>(libc::AF_INET6, "fe80::1").expect("ipv6 text");
        assert_eq!(parsed.s6_addr, Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1).octets());
        let text = ntop(
            libc::AF_INET6,
            (&parsed as *const in6_addr).cast(),
            INET6_ADDRSTRLEN,
        );
        assert_eq!(text.as_deref(), Some("fe80::1"));

        let unspec = ntop(libc::AF_UNSPEC, (&parsed as *const in6_addr).cast(), INET6_ADDRSTRLEN);
        assert_eq!(unspec, None);
    }

    fn zeroed_storage() -> sockaddr_storage {
        // SAFETY: sockaddr_storage is plain data; all-zero is valid.
        unsafe { mem::zeroed() }
    }

    proptest! {
        #[test]
        fn prop_inet_create_roundtrips(octets in any::<[u8; 4]>(), port in any::<u16>()) {
            let host = Ipv4Addr::from(octets).to_string();
            let addr = SockAddr::create(&host, port, AF_INET).expect("dotted quad parses");
            prop_assert_eq!(addr.get_host(), Some(host));
            prop_assert_eq!(addr.get_port(), Some(port));
        }

        #[test]
        fn prop_inet6_create_roundtrips(octets in any::<[u8; 16]>(), port in any::<u16>()) {
            let original = Ipv6Addr::from(octets);
            let addr = SockAddr::create(&original.to_string(), port, AF_INET6)
                .expect("std text form parses");
            let host = addr.get_host().expect("inet_ntop succeeds");

            let reparsed = SockAddr::create(&host, port, AF_INET6).expect("own text form parses");
            prop_assert_eq!(reparsed.get_host(), Some(host.clone()));
            prop_assert_eq!(host.parse::<Ipv6Addr>().ok(), Some(original));
            prop_assert_eq!(reparsed.get_port(), Some(port));
        }

        #[test]
        fn prop_cred_encoding_is_deterministic(
            pid in 1..=4_194_304i32,
            uid in any::<u32>(),
            gid in any::<u32>(),
        ) {
            let cred = PeerCred::new(pid, uid, gid);

            let mut a = SockAddr::with_family(Family::Inet6).expect("inet6");
            let mut b = SockAddr::with_family(Family::Inet6).expect("inet6");
            prop_assert!(a.set_host_from_cred(&cred));
            prop_assert!(b.set_host_from_cred(&cred));
            prop_assert_eq!(a, b);
            let SockAddr::Inet6(sin6) = a else { unreachable!() };
            prop_assert_eq!(&sin6.sin6_addr.s6_addr[..4], &CRED_INET6_PREFIX[..]);
            prop_assert_eq!(&sin6.sin6_addr.s6_addr[4..8], &uid.to_be_bytes()[..]);
            prop_assert_eq!(&sin6.sin6_addr.s6_addr[8..12], &gid.to_be_bytes()[..]);
            prop_assert_eq!(&sin6.sin6_addr.s6_addr[12..], &(pid as u32).to_be_bytes()[..]);
            prop_assert!(!a.is_loopback());

            let mut v4 = SockAddr::with_family(Family::Inet).expect("inet");
            prop_assert!(v4.set_host_from_cred(&cred));
            let SockAddr::Inet(sin) = v4 else { unreachable!() };
            prop_assert_eq!(sin.sin_addr.s_addr.to_ne_bytes(), (pid as u32).to_be_bytes());
            prop_assert!(!v4.is_loopback());
        }
    }
}
