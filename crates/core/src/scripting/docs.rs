//! Declarative documentation for each task kind.
//!
//! A [`PluginDoc`] lists every property a task definition accepts plus full
//! usage examples. Hosts serialize it to JSON for their UI and validation
//! layers.

use serde::Serialize;

use crate::script_types::{
    MALLOY_DEFAULT_IMAGE, RUBY_DEFAULT_IMAGE, SHELL_DEFAULT_IMAGE, TASK_TYPE_MALLOY_CLI,
    TASK_TYPE_RUBY_COMMANDS, TASK_TYPE_SHELL_COMMANDS,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDoc {
    pub type_name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub properties: Vec<PropertyDoc>,
    pub examples: Vec<ExampleDoc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDoc {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub value_type: &'static str,
    pub title: &'static str,
    pub required: bool,
    /// Whether `{{ variable }}` placeholders are rendered.
    pub dynamic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleDoc {
    pub title: &'static str,
    /// A complete JSON task definition.
    pub code: &'static str,
}

const fn property(
    name: &'static str,
    value_type: &'static str,
    title: &'static str,
    required: bool,
    dynamic: bool,
    default: Option<&'static str>,
) -> PropertyDoc {
    PropertyDoc {
        name,
        value_type,
        title,
        required,
        dynamic,
        default,
    }
}

/// Properties shared by every kind; only the image default differs.
fn common_properties(default_image: &'static str) -> Vec<PropertyDoc> {
    vec![
        property("id", "string", "Unique task id.", true, false, None),
        property("type", "string", "Task type name.", true, false, None),
        property("commands", "array<string>", "The commands to run.", true, true, None),
        property(
            "beforeCommands",
            "array<string>",
            "Commands run before `commands`, in the same shell.",
            false,
            true,
            None,
        ),
        property(
            "interpreter",
            "array<string>",
            "Interpreter tokens the script body is appended to.",
            false,
            false,
            Some("[\"/bin/sh\", \"-c\"] (LINUX), powershell (WINDOWS)"),
        ),
        property(
            "targetOs",
            "string",
            "Operating system the script is written for: LINUX, WINDOWS or AUTO.",
            false,
            false,
            Some("AUTO"),
        ),
        property(
            "failFast",
            "boolean",
            "Stop at the first failing command.",
            false,
            false,
            Some("true"),
        ),
        property(
            "containerImage",
            "string",
            "Image used by the DOCKER runner when `docker.image` is unset.",
            false,
            true,
            Some(default_image),
        ),
        property(
            "docker",
            "object",
            "Docker options: image, entrypoint, pullPolicy, user, networkMode, cpus, memory.",
            false,
            false,
            None,
        ),
        property(
            "taskRunner",
            "string",
            "Where the commands run: PROCESS or DOCKER.",
            false,
            false,
            Some("PROCESS"),
        ),
        property(
            "env",
            "map<string, string>",
            "Additional environment variables.",
            false,
            true,
            None,
        ),
        property(
            "inputFiles",
            "map<string, string>",
            "Files written to the working directory before execution (name to content).",
            false,
            true,
            None,
        ),
        property(
            "outputFiles",
            "array<string>",
            "Glob patterns of files collected from the working directory after execution.",
            false,
            true,
            None,
        ),
        property(
            "timeout",
            "integer",
            "Maximum run time in seconds.",
            false,
            false,
            None,
        ),
        property(
            "warningOnStdErr",
            "boolean",
            "Flag the result as a warning when the script wrote to stderr.",
            false,
            false,
            Some("true"),
        ),
    ]
}

pub(crate) fn ruby_commands() -> PluginDoc {
    PluginDoc {
        type_name: TASK_TYPE_RUBY_COMMANDS,
        title: "Execute a Ruby script from the Command Line Interface.",
        description: "Runs Ruby commands in a shell, locally or in the `ruby` image. \
                      Use `inputFiles` to place the script and its data in the working \
                      directory and `outputFiles` to collect what it produces.",
        properties: common_properties(RUBY_DEFAULT_IMAGE),
        examples: vec![ExampleDoc {
            title: "Convert a JSON file to CSV with a Ruby script and keep the CSV as an output file.",
            code: r#"{
  "id": "generate_csv",
  "type": "scripts.ruby.Commands",
  "taskRunner": "DOCKER",
  "inputFiles": {
    "data.json": "[{\"Name\": \"Alice\", \"Age\": 30, \"City\": \"New York\"}, {\"Name\": \"Bob\", \"Age\": 22, \"City\": \"Los Angeles\"}, {\"Name\": \"Charlie\", \"Age\": 35, \"City\": \"Chicago\"}]",
    "main.rb": "require 'csv'\nrequire 'json'\n\ndata = JSON.parse(File.read('data.json'))\nheaders = data.first.keys\nCSV.open('output.csv', 'wb') do |csv|\n  csv << headers\n  data.each { |row| csv << row.values }\nend\n"
  },
  "beforeCommands": ["ruby -v"],
  "commands": ["ruby main.rb"],
  "outputFiles": ["*.csv"]
}"#,
        }],
    }
}

pub(crate) fn malloy_cli() -> PluginDoc {
    PluginDoc {
        type_name: TASK_TYPE_MALLOY_CLI,
        title: "Execute one or more Malloy commands from the Command Line Interface.",
        description: "Runs `malloy-cli` commands, locally when the CLI is on the PATH or in \
                      the Malloy image with the DOCKER runner.",
        properties: common_properties(MALLOY_DEFAULT_IMAGE),
        examples: vec![
            ExampleDoc {
                title: "Print the Malloy CLI help.",
                code: r#"{
  "id": "malloy_help",
  "type": "scripts.malloy.CLI",
  "commands": ["malloy-cli --help"]
}"#,
            },
            ExampleDoc {
                title: "Run a Malloy query against a DuckDB table and keep the result.",
                code: r#"{
  "id": "malloy_query",
  "type": "scripts.malloy.CLI",
  "taskRunner": "DOCKER",
  "inputFiles": {
    "model.malloy": "source: users is duckdb.table('users.csv') extend {\n  measure: user_count is count()\n}\n\nrun: users -> { aggregate: user_count }\n"
  },
  "commands": ["malloy-cli run model.malloy > result.json"],
  "outputFiles": ["result.json"]
}"#,
            },
        ],
    }
}

pub(crate) fn shell_commands() -> PluginDoc {
    PluginDoc {
        type_name: TASK_TYPE_SHELL_COMMANDS,
        title: "Execute one or more shell commands.",
        description: "Runs plain shell commands. Lines of the form \
                      `::{\"outputs\": {\"key\": \"value\"}}::` on stdout become output variables.",
        properties: common_properties(SHELL_DEFAULT_IMAGE),
        examples: vec![ExampleDoc {
            title: "Expose a value computed by the script as an output variable.",
            code: r#"{
  "id": "count_files",
  "type": "scripts.shell.Commands",
  "commands": [
    "echo 'counting files'",
    "echo \"::{\\\"outputs\\\": {\\\"count\\\": $(ls | wc -l)}}::\""
  ]
}"#,
        }],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::scripting::kind::TaskKind;
    use crate::scripting::task::ScriptTask;

    #[test]
    fn every_example_is_a_valid_task_definition() {
        for kind in TaskKind::ALL {
            for example in kind.doc().examples {
                let task = ScriptTask::from_json(example.code)
                    .unwrap_or_else(|e| panic!("example '{}' is invalid: {e}", example.title));
                assert_eq!(task.kind, kind);
            }
        }
    }

    #[test]
    fn container_image_default_matches_kind() {
        for kind in TaskKind::ALL {
            let doc = kind.doc();
            let image = doc
                .properties
                .iter()
                .find(|p| p.name == "containerImage")
                .and_then(|p| p.default);
            assert_eq!(image, Some(kind.default_image()));
            assert_eq!(doc.type_name, kind.type_name());
        }
    }

    #[test]
    fn commands_property_is_required_and_dynamic() {
        let doc = TaskKind::RubyCommands.doc();
        let commands = doc
            .properties
            .iter()
            .find(|p| p.name == "commands")
            .expect("commands documented");
        assert!(commands.required);
        assert!(commands.dynamic);
    }

    #[test]
    fn doc_serializes_property_type_field() {
        let json = serde_json::to_value(TaskKind::MalloyCli.doc()).expect("serialize");
        assert_eq!(json["typeName"], "scripts.malloy.CLI");
        assert_eq!(json["properties"][0]["type"], "string");
        assert!(json["examples"].as_array().is_some_and(|e| !e.is_empty()));
    }
}
