use std::io::Write;
use std::path::{Path, PathBuf};

use chatgraph_config::{ChatGraphConfig, ConfigFormat, ConfigOrigin};

const TOML_CONTENT: &str = r#"
[model]
provider = "anthropic"
model = "claude-3-5-sonnet-latest"
"#;

const JSON_CONTENT: &str = r#"{
    "model": { "provider": "anthropic", "model": "claude-3-5-sonnet-latest" }
}"#;

const YAML_CONTENT: &str = r#"
model:
  provider: anthropic
  model: claude-3-5-sonnet-latest
"#;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn format_from_path() {
    assert_eq!(
        ConfigFormat::from_path(Path::new("/etc/app/chatgraph.YAML")),
        Some(ConfigFormat::Yaml)
    );
    assert_eq!(
        ConfigFormat::from_path(Path::new("config.yml")),
        Some(ConfigFormat::Yaml)
    );
    assert_eq!(ConfigFormat::from_path(Path::new("Makefile")), None);
    assert_eq!(ConfigFormat::from_path(Path::new("chatgraph.ini")), None);
}

#[test]
fn same_config_in_every_format() {
    for (content, format) in [
        (TOML_CONTENT, ConfigFormat::Toml),
        (JSON_CONTENT, ConfigFormat::Json),
        (YAML_CONTENT, ConfigFormat::Yaml),
    ] {
        let config = ChatGraphConfig::parse(content, format).unwrap();
        assert_eq!(config.model.provider, "anthropic");
        assert_eq!(config.model.model, "claude-3-5-sonnet-latest");
        assert_eq!(config.model.api_key_env, "ANTHROPIC_API_KEY");
    }
}

#[test]
fn invalid_content_names_the_format() {
    let err = ChatGraphConfig::parse("not valid {{{", ConfigFormat::Toml).unwrap_err();
    assert!(err.to_string().contains("TOML"));
    let err = ChatGraphConfig::parse("not json", ConfigFormat::Json).unwrap_err();
    assert!(err.to_string().contains("JSON"));
    assert!(ChatGraphConfig::parse(":\n  bad:\nyaml: [", ConfigFormat::Yaml).is_err());
}

#[test]
fn values_that_cannot_drive_an_agent_are_rejected() {
    let err = ChatGraphConfig::parse(
        "[model]\nprovider = \"anthropic\"\nmodel = \" \"\n",
        ConfigFormat::Toml,
    )
    .unwrap_err();
    assert!(err.to_string().contains("model.model"));

    let err = ChatGraphConfig::parse(
        &format!("{TOML_CONTENT}\n[agent]\nmax_turns = 0\n"),
        ConfigFormat::Toml,
    )
    .unwrap_err();
    assert!(err.to_string().contains("agent.max_turns"));

    let err = ChatGraphConfig::parse(
        &format!("{TOML_CONTENT}\n[search]\nmax_results = 0\n"),
        ConfigFormat::Toml,
    )
    .unwrap_err();
    assert!(err.to_string().contains("search.max_results"));
}

#[test]
fn read_reports_the_offending_path() {
    let dir = tempfile::tempdir().unwrap();
    let broken = write(dir.path(), "chatgraph.json", "{\"model\": ");
    let err = ChatGraphConfig::read(&broken).unwrap_err();
    assert!(err.to_string().contains("chatgraph.json"));
    assert!(err.to_string().contains("JSON"));

    let unknown = write(dir.path(), "chatgraph.cfg", JSON_CONTENT);
    let err = ChatGraphConfig::read(&unknown).unwrap_err();
    assert!(err.to_string().contains(".toml, .json, .yaml or .yml"));
}

#[test]
fn explicit_path_must_exist() {
    let err = ChatGraphConfig::load(Some(Path::new("/tmp/no_such_chatgraph_config.toml")))
        .unwrap_err();
    assert!(err.to_string().contains("not found"));

    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "agent.yaml", YAML_CONTENT);
    let config = ChatGraphConfig::load(Some(&path)).unwrap();
    assert_eq!(config.model.model, "claude-3-5-sonnet-latest");
}

#[test]
fn resolve_falls_back_to_model_spec_without_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let candidates = vec![dir.path().join("chatgraph.toml"), dir.path().join("chatgraph.json")];

    let (config, origin) =
        ChatGraphConfig::resolve(&candidates, "anthropic:claude-3-7-sonnet-latest").unwrap();
    assert_eq!(
        origin,
        ConfigOrigin::ModelSpec("anthropic:claude-3-7-sonnet-latest".to_string())
    );
    assert_eq!(config.model.model, "claude-3-7-sonnet-latest");
    assert_eq!(config.model.api_key_env, "ANTHROPIC_API_KEY");
    assert_eq!(config.agent, Default::default());
}

#[test]
fn resolve_prefers_the_first_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let toml = dir.path().join("chatgraph.toml");
    let json = write(
        dir.path(),
        "chatgraph.json",
        r#"{"model": {"provider": "anthropic", "model": "from-json"}, "agent": {"max_turns": 3}}"#,
    );

    let (config, origin) =
        ChatGraphConfig::resolve(&[toml.clone(), json.clone()], "anthropic:from-spec").unwrap();
    assert_eq!(origin, ConfigOrigin::File(json));
    assert_eq!(config.model.model, "from-json");
    assert_eq!(config.agent.max_turns, Some(3));

    write(dir.path(), "chatgraph.toml", TOML_CONTENT);
    let (config, origin) =
        ChatGraphConfig::resolve(&[toml.clone()], "anthropic:from-spec").unwrap();
    assert_eq!(origin, ConfigOrigin::File(toml));
    assert_eq!(config.model.model, "claude-3-5-sonnet-latest");
}

#[test]
fn broken_file_does_not_fall_back_to_model_spec() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "chatgraph.toml", "[model\n");
    let err = ChatGraphConfig::resolve(&[path], "anthropic:from-spec").unwrap_err();
    assert!(err.to_string().contains("chatgraph.toml"));
}

#[test]
fn bad_model_spec_is_config_error() {
    let err = ChatGraphConfig::resolve(&[], "claude").unwrap_err();
    assert!(err.to_string().contains("provider:model"));
}
