//! Key material of this QoS monitor.
//!
//! The public key travels inside relay test proposals so the peer cloud
//! can authenticate the proposer; the signing key signs those proposals.

pub mod keys;

pub use keys::{generate_keypair, load_keypair, load_or_generate_keypair, save_keypair, KeyPair};
