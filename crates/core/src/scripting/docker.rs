//! Container options for the docker runner.

use serde::{Deserialize, Serialize};

/// When the docker runner pulls the task image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PullPolicy {
    #[default]
    IfNotPresent,
    Always,
    Never,
}

impl PullPolicy {
    /// Value of the `docker run --pull` flag.
    pub fn as_docker_flag(&self) -> &'static str {
        match self {
            Self::IfNotPresent => "missing",
            Self::Always => "always",
            Self::Never => "never",
        }
    }
}

/// Options for running a task inside a container.
///
/// `image` left unset means "use the task's default image"; see
/// [`ScriptTask::inject_defaults`](super::task::ScriptTask::inject_defaults).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DockerOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Entrypoint override. The empty string clears the image entrypoint so
    /// the interpreter runs directly; `None` keeps the image's own.
    #[serde(default = "default_entrypoint")]
    pub entrypoint: Option<String>,

    #[serde(default)]
    pub pull_policy: PullPolicy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,

    /// CPU limit, e.g. `"1.5"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpus: Option<String>,

    /// Memory limit, e.g. `"512m"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

fn default_entrypoint() -> Option<String> {
    Some(String::new())
}

impl Default for DockerOptions {
    fn default() -> Self {
        Self {
            image: None,
            entrypoint: default_entrypoint(),
            pull_policy: PullPolicy::default(),
            user: None,
            network_mode: None,
            cpus: None,
            memory: None,
        }
    }
}

impl DockerOptions {
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_pull_policy(mut self, policy: PullPolicy) -> Self {
        self.pull_policy = policy;
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_deserializes_to_defaults() {
        let options: DockerOptions = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(options, DockerOptions::default());
        assert_eq!(options.entrypoint.as_deref(), Some(""));
        assert!(options.image.is_none());
    }

    #[test]
    fn pull_policy_uses_screaming_snake_case() {
        let options: DockerOptions =
            serde_json::from_str(r#"{"image": "ruby:3.3", "pullPolicy": "ALWAYS"}"#)
                .expect("deserialize");
        assert_eq!(options.pull_policy, PullPolicy::Always);
        assert_eq!(options.image.as_deref(), Some("ruby:3.3"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<DockerOptions>(r#"{"imag": "ruby"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn pull_flags() {
        assert_eq!(PullPolicy::IfNotPresent.as_docker_flag(), "missing");
        assert_eq!(PullPolicy::Always.as_docker_flag(), "always");
        assert_eq!(PullPolicy::Never.as_docker_flag(), "never");
    }
}
