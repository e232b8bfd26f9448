//! Task kinds: the closed set of script plugins.
//!
//! Every kind shares the same execution path
//! ([`ScriptTask::run`](super::task::ScriptTask::run)); kinds differ only in
//! their type name, default container image and documentation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::script_types::{
    MALLOY_DEFAULT_IMAGE, RUBY_DEFAULT_IMAGE, SHELL_DEFAULT_IMAGE, TASK_TYPE_MALLOY_CLI,
    TASK_TYPE_RUBY_COMMANDS, TASK_TYPE_SHELL_COMMANDS,
};

use super::docs::{self, PluginDoc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TaskKind {
    RubyCommands,
    MalloyCli,
    ShellCommands,
}

impl TaskKind {
    pub const ALL: [TaskKind; 3] = [Self::RubyCommands, Self::MalloyCli, Self::ShellCommands];

    /// Value of the `type` field in a task definition.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RubyCommands => TASK_TYPE_RUBY_COMMANDS,
            Self::MalloyCli => TASK_TYPE_MALLOY_CLI,
            Self::ShellCommands => TASK_TYPE_SHELL_COMMANDS,
        }
    }

    /// Image used by the docker runner when the task names none.
    pub fn default_image(&self) -> &'static str {
        match self {
            Self::RubyCommands => RUBY_DEFAULT_IMAGE,
            Self::MalloyCli => MALLOY_DEFAULT_IMAGE,
            Self::ShellCommands => SHELL_DEFAULT_IMAGE,
        }
    }

    /// Documented configuration surface of this kind.
    pub fn doc(&self) -> PluginDoc {
        match self {
            Self::RubyCommands => docs::ruby_commands(),
            Self::MalloyCli => docs::malloy_cli(),
            Self::ShellCommands => docs::shell_commands(),
        }
    }
}

impl FromStr for TaskKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == s)
            .ok_or_else(|| CoreError::UnknownTaskType(s.to_string()))
    }
}

impl TryFrom<String> for TaskKind {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskKind> for String {
    fn from(value: TaskKind) -> Self {
        value.type_name().to_string()
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn default_images() {
        assert_eq!(TaskKind::RubyCommands.default_image(), "ruby");
        assert_eq!(TaskKind::MalloyCli.default_image(), "ghcr.io/kestra-io/malloy");
        assert_eq!(TaskKind::ShellCommands.default_image(), "ubuntu");
    }

    #[test]
    fn type_names_parse_back() {
        for kind in TaskKind::ALL {
            assert_eq!(kind.type_name().parse::<TaskKind>().expect("parse"), kind);
        }
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result = "scripts.python.Commands".parse::<TaskKind>();
        assert_matches!(result, Err(CoreError::UnknownTaskType(_)));
    }

    #[test]
    fn serializes_as_type_name() {
        let json = serde_json::to_string(&TaskKind::MalloyCli).expect("serialize");
        assert_eq!(json, "\"scripts.malloy.CLI\"");
    }
}
