//! Internal verify implementation modules.
//!
//! `crate::verify` is the public facade; this module owns the wire and key
//! boundaries it orchestrates.

pub(crate) mod jwk;
pub(crate) mod wire;
