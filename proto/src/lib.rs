//! Transfer objects and error types shared between the idprov core engine
//! and the REST/UI layers that drive it. Everything here is serialisable so
//! that a configuration front-end can display findings exactly as the core
//! reported them.

#![deny(warnings)]
#![warn(unused_extern_crates)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod constants;
pub mod error;
pub mod to;
pub mod types;
