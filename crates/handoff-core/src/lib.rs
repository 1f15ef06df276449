//! Core of the handoff socket shim.
//!
//! Safe Rust implementations of the pieces the interposition layer builds
//! on: a family-tagged socket address ([`sockaddr::SockAddr`]), an ordered
//! ledger of socket options and ioctls to carry over to a replacement
//! descriptor ([`sockopts::SockOpts`]), and the registry of descriptors
//! passed in by a service supervisor ([`activation::ActivationRegistry`]).
//!
//! Errors are plain errno values (`Result<T, c_int>`) unless a richer type
//! is needed to produce a diagnostic.

pub mod activation;
pub mod config;
pub mod errno;
pub mod log;
pub mod rule;
pub mod sockaddr;
pub mod sockopts;

pub use activation::{ActivationError, ActivationRegistry, EnvListenFds, ListenFdSource};
pub use rule::Rule;
pub use sockaddr::{Family, PeerCred, SockAddr};
pub use sockopts::{FdOps, HostFdOps, ReplayError, SockOpts};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Mutex, MutexGuard, OnceLock};

    /// Serializes tests that touch the process environment.
    pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Sets (or removes) an environment variable and restores the previous
    /// value on drop. Hold [`env_lock`] while one is alive.
    pub(crate) struct EnvVarGuard {
        key: &'static str,
        previous: Option<std::ffi::OsString>,
    }

    impl EnvVarGuard {
        pub(crate) fn set(key: &'static str, value: Option<&str>) -> Self {
            let previous = std::env::var_os(key);
            // SAFETY: callers hold `env_lock`, so no other test thread
            // reads or writes the environment concurrently.
            unsafe {
                match value {
                    Some(v) => std::env::set_var(key, v),
                    None => std::env::remove_var(key),
                }
            }
            Self { key, previous }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            // SAFETY: as in `set`.
            unsafe {
                match &self.previous {
                    Some(v) => std::env::set_var(self.key, v),
                    None => std::env::remove_var(self.key),
                }
            }
        }
    }
}
