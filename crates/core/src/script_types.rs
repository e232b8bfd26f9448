//! Well-known task type names and their default container images.
//!
//! The type name is the `type` field of a task definition.

/// Ruby commands (`ruby`, `bundle`, `gem`, ...).
pub const TASK_TYPE_RUBY_COMMANDS: &str = "scripts.ruby.Commands";

/// Malloy CLI commands (`malloy-cli ...`).
pub const TASK_TYPE_MALLOY_CLI: &str = "scripts.malloy.CLI";

/// Plain shell commands.
pub const TASK_TYPE_SHELL_COMMANDS: &str = "scripts.shell.Commands";

pub const RUBY_DEFAULT_IMAGE: &str = "ruby";

pub const MALLOY_DEFAULT_IMAGE: &str = "ghcr.io/kestra-io/malloy";

pub const SHELL_DEFAULT_IMAGE: &str = "ubuntu";
