//! Script command assembly.
//!
//! Turns an interpreter, setup ("before") commands and user commands into
//! the argument vector handed to a runner: the interpreter tokens followed
//! by one script body holding every command, one per line.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// TargetOs
// ---------------------------------------------------------------------------

/// Operating system the assembled script is written for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetOs {
    Linux,
    Windows,
    /// Whatever the host running the task is.
    #[default]
    Auto,
}

impl TargetOs {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "LINUX",
            Self::Windows => "WINDOWS",
            Self::Auto => "AUTO",
        }
    }

    /// Replace [`TargetOs::Auto`] with the host operating system.
    pub fn resolve(self) -> Self {
        match self {
            Self::Auto if cfg!(windows) => Self::Windows,
            Self::Auto => Self::Linux,
            other => other,
        }
    }

    pub fn line_separator(self) -> &'static str {
        match self.resolve() {
            Self::Windows => "\r\n",
            _ => "\n",
        }
    }

    /// Interpreter used when the task does not name one.
    pub fn default_interpreter(self) -> Vec<String> {
        let tokens: &[&str] = match self.resolve() {
            Self::Windows => &[
                "powershell.exe",
                "-NoLogo",
                "-NoProfile",
                "-NonInteractive",
                "-Command",
            ],
            _ => &["/bin/sh", "-c"],
        };
        tokens.iter().map(|t| t.to_string()).collect()
    }

    /// First line of the script when the task runs in fail-fast mode.
    pub fn exit_on_error_command(self) -> &'static str {
        match self.resolve() {
            Self::Windows => "$ErrorActionPreference = 'Stop'",
            _ => "set -e",
        }
    }
}

impl FromStr for TargetOs {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LINUX" => Ok(Self::Linux),
            "WINDOWS" => Ok(Self::Windows),
            "AUTO" => Ok(Self::Auto),
            _ => Err(CoreError::UnsupportedTargetOs(s.to_string())),
        }
    }
}

impl TryFrom<String> for TargetOs {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetOs> for String {
    fn from(value: TargetOs) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Structured result of [`assemble_script`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledScript {
    pub interpreter: Vec<String>,
    /// Setup commands followed by user commands, in their original order.
    pub lines: Vec<String>,
    /// Resolved target (never [`TargetOs::Auto`]).
    pub target_os: TargetOs,
}

impl AssembledScript {
    /// Script body: every line joined with the target's line separator.
    pub fn body(&self) -> String {
        self.lines.join(self.target_os.line_separator())
    }

    /// Interpreter tokens followed by the script body.
    pub fn into_command(self) -> Vec<String> {
        let body = self.body();
        let mut command = self.interpreter;
        command.push(body);
        command
    }
}

/// Assemble setup and user commands for `target_os`.
///
/// `interpreter` falls back to [`TargetOs::default_interpreter`] when
/// `None`. Commands are neither reordered nor deduplicated.
pub fn assemble_script(
    interpreter: Option<&[String]>,
    before_commands: &[String],
    commands: &[String],
    target_os: TargetOs,
) -> Result<AssembledScript, CoreError> {
    if commands.is_empty() {
        return Err(CoreError::Validation(
            "At least one command is required".to_string(),
        ));
    }

    let target_os = target_os.resolve();
    let interpreter = match interpreter {
        Some([]) => {
            return Err(CoreError::Validation(
                "Interpreter cannot be an empty list".to_string(),
            ))
        }
        Some(tokens) => tokens.to_vec(),
        None => target_os.default_interpreter(),
    };

    let lines = before_commands
        .iter()
        .chain(commands.iter())
        .cloned()
        .collect();

    Ok(AssembledScript {
        interpreter,
        lines,
        target_os,
    })
}

/// Flat form of [`assemble_script`]: the argument vector to execute.
pub fn script_commands(
    interpreter: Option<&[String]>,
    before_commands: &[String],
    commands: &[String],
    target_os: TargetOs,
) -> Result<Vec<String>, CoreError> {
    assemble_script(interpreter, before_commands, commands, target_os).map(|s| s.into_command())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
