//! Trusted-server auth-chain verification client.
//!
//! Implements the core `ChainValidator` capability over HTTP against an
//! ordered list of trusted Catalyst servers. Servers are independent,
//! possibly-unreliable services; correctness only requires one of them to
//! answer conclusively, so any per-server failure is masked by trying the
//! next one in order.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod client;

pub use client::{CatalystChainValidator, VerificationVerdict, VALIDATE_SIGNATURE_PATH};
