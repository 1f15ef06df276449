//! ABI layer for activation sockets.
//!
//! The process-wide registry reads `LISTEN_*` from the environment the first
//! time any rule asks for a socket. A mismatch between the rules and what
//! the supervisor passed cannot be recovered from: it is reported on stderr
//! and the process aborts.

use std::ffi::{CStr, c_char, c_int};
use std::sync::OnceLock;

use handoff_core::activation::{ActivationError, ActivationRegistry, EnvListenFds};
use handoff_core::log;
use handoff_core::rule::Rule;
use parking_lot::Mutex;

fn registry() -> &'static Mutex<ActivationRegistry<EnvListenFds>> {
    static REGISTRY: OnceLock<Mutex<ActivationRegistry<EnvListenFds>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(ActivationRegistry::new(EnvListenFds::new())))
}

fn abort_with(err: &ActivationError) -> ! {
    log::fatal("activation", format_args!("{err}"));
    std::process::abort()
}

/// Descriptor for `rule` from the process-wide registry. Never returns on
/// an activation error.
pub fn acquire_or_abort(rule: &Rule) -> c_int {
    let result = registry().lock().acquire(rule);
    result.unwrap_or_else(|err| abort_with(&err))
}

// ---------------------------------------------------------------------------
// handoff_activation_fd
// ---------------------------------------------------------------------------

/// Activation socket called `name`, or the next unnamed one when `name` is
/// null. Aborts the process if no such socket exists.
///
/// # Safety
///
/// `name` must be null or a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn handoff_activation_fd(name: *const c_char) -> c_int {
    let rule = if name.is_null() {
        Rule::activation()
    } else {
        // SAFETY: NUL-terminated per contract.
        let name = unsafe { CStr::from_ptr(name) };
        Rule::named_activation(name.to_string_lossy())
    };
    acquire_or_abort(&rule)
}
