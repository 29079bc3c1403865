//! Credential handling for the gateway.
//!
//! Users are checked against Argon2id hashes held by the
//! [`Registry`](crate::registry::Registry); no sessions or tokens are issued.

pub mod password;
