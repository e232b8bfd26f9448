//! `scriptrun-core` -- script task plugins and the runners they delegate to.
//!
//! A [`ScriptTask`](scripting::task::ScriptTask) describes one task
//! invocation (commands, image, input/output files). Running it assembles
//! the interpreter command line, executes it as a local process or in a
//! container, and returns a [`ScriptOutput`](scripting::executor::ScriptOutput).

pub mod error;
pub mod script_types;
pub mod scripting;
pub mod types;
