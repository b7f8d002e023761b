//! A small sequential crew runner.
//!
//! A crew is a list of role records and task records. Kicking it off fills
//! the task templates from named inputs and runs the tasks one after
//! another, each by the agent it names, handing every finished output to the
//! later tasks as context. Agents may call registered tools while working
//! on a task. There is no delegation between agents and no parallelism.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod conversation;
mod crew;
mod error;
mod executor;
mod interpolate;
mod model_client;
mod role;
pub mod tool;

pub use crew::{Crew, CrewBuilder, CrewOutput, TaskOutput};
pub use error::{Error, ErrorKind};
pub use interpolate::interpolate;
pub use role::{AgentRole, DEFAULT_MAX_ITERATIONS, TaskSpec};
