//! The protocol spoken between the crew runner and language models.
//!
//! A crew only needs three things from a model: send it a conversation
//! with the tools it may call, stream back text and tool call requests,
//! and hand over a provider-specific copy of the reply so it can be put
//! back into the history verbatim. This crate defines those shapes and
//! nothing else; providers live in their own crates.

#![deny(missing_docs)]

mod error;
mod opaque;
mod provider;
mod request;
mod response;

pub use error::*;
pub use opaque::*;
pub use provider::*;
pub use request::*;
pub use response::*;
