//! Redirection rules as handed over by the rule loader.
//!
//! This crate only reads [`Rule::fd_name`]; the rest of the fields travel
//! with the rule so callers deal with a single type.

use std::ffi::c_int;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocketType {
    Tcp,
    Udp,
}

/// One rule. Every field is optional in serialized form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    pub direction: Option<Direction>,
    #[serde(rename = "type")]
    pub socket_type: Option<SocketType>,
    pub address: Option<String>,
    pub port: Option<u16>,
    pub port_end: Option<u16>,
    pub socket_path: Option<String>,
    pub socket_activation: bool,
    pub fd_name: Option<String>,
    /// errno returned to the caller instead of performing the call.
    pub reject: Option<c_int>,
    pub blackhole: bool,
    pub ignore: bool,
}

impl Rule {
    /// Rule taking the next unnamed activation socket.
    #[must_use]
    pub fn activation() -> Self {
        Self {
            socket_activation: true,
            ..Self::default()
        }
    }

    /// Rule taking the activation socket called `name`.
    #[must_use]
    pub fn named_activation(name: impl Into<String>) -> Self {
        Self {
            socket_activation: true,
            fd_name: Some(name.into()),
            ..Self::default()
        }
    }
}
