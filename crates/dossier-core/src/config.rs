use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::Path;

use crate::reconcile::MarkingBatch;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub edit: EditConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_page_size")]
    pub identities_page_size: u32,
    #[serde(default = "default_page_size")]
    pub markings_page_size: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            identities_page_size: default_page_size(),
            markings_page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditConfig {
    #[serde(default)]
    pub marking_batch: MarkingBatch,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    /// Name under which this user appears in other users' edit context.
    #[serde(default)]
    pub me: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub server: ServerConfig,
    pub resolved_output: String,
}

/// Overrides that outrank both config files.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub token: Option<String>,
    pub json: bool,
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".dossier/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("dossier/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn resolve_config(project_root: &Path, overrides: &Overrides) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(overrides.json, user.output.clone(), env_format)?;

    let server = resolve_server(
        overrides,
        env::var("DOSSIER_URL").ok(),
        env::var("DOSSIER_TOKEN").ok(),
        &project.server,
        &user.server,
    );

    Ok(EffectiveConfig {
        project,
        user,
        server,
        resolved_output,
    })
}

/// Flag > env > project config > user config, per key.
fn resolve_server(
    overrides: &Overrides,
    env_url: Option<String>,
    env_token: Option<String>,
    project: &ServerConfig,
    user: &ServerConfig,
) -> ServerConfig {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    ServerConfig {
        url: non_empty(overrides.url.clone())
            .or_else(|| non_empty(env_url))
            .or_else(|| project.url.clone())
            .or_else(|| user.url.clone()),
        token: non_empty(overrides.token.clone())
            .or_else(|| non_empty(env_token))
            .or_else(|| project.token.clone())
            .or_else(|| user.token.clone()),
    }
}

fn resolve_output(
    cli_json: bool,
    user_output: Option<String>,
    env_format: Option<String>,
) -> Result<String> {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return Ok("json".to_string());
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    if std::io::stdout().is_terminal() {
        Ok("pretty".to_string())
    } else {
        Ok("text".to_string())
    }
}

const fn default_page_size() -> u32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("temp dir must be created");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.server, ServerConfig::default());
        assert_eq!(cfg.search.identities_page_size, 10);
        assert_eq!(cfg.search.markings_page_size, 10);
        assert_eq!(cfg.edit.marking_batch, MarkingBatch::First);
    }

    #[test]
    fn project_config_parses_all_sections() {
        let root = tempfile::tempdir().expect("temp dir must be created");
        std::fs::create_dir_all(root.path().join(".dossier")).expect("create .dossier");
        std::fs::write(
            root.path().join(".dossier/config.toml"),
            r#"
[server]
url = "https://cti.example.com/graphql"

[search]
identities_page_size = 25

[edit]
marking_batch = "all"
"#,
        )
        .expect("write config");

        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(
            cfg.server.url.as_deref(),
            Some("https://cti.example.com/graphql")
        );
        assert_eq!(cfg.server.token, None);
        assert_eq!(cfg.search.identities_page_size, 25);
        assert_eq!(cfg.search.markings_page_size, 10);
        assert_eq!(cfg.edit.marking_batch, MarkingBatch::All);
    }

    #[test]
    fn broken_project_config_is_an_error() {
        let root = tempfile::tempdir().expect("temp dir must be created");
        std::fs::create_dir_all(root.path().join(".dossier")).expect("create .dossier");
        std::fs::write(root.path().join(".dossier/config.toml"), "[edit\n").expect("write");
        let err = load_project_config(root.path()).expect_err("must fail");
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        let output = resolve_output(true, Some("pretty".to_string()), Some("text".to_string()))
            .expect("resolve should succeed");
        assert_eq!(output, "json");
    }

    #[test]
    fn env_format_beats_user_output() {
        let output = resolve_output(false, Some("json".to_string()), Some("human".to_string()))
            .expect("resolve should succeed");
        assert_eq!(output, "pretty");
    }

    #[test]
    fn server_resolution_precedence() {
        let project = ServerConfig {
            url: Some("https://project".into()),
            token: None,
        };
        let user = ServerConfig {
            url: Some("https://user".into()),
            token: Some("user-token".into()),
        };

        let from_files = resolve_server(&Overrides::default(), None, None, &project, &user);
        assert_eq!(from_files.url.as_deref(), Some("https://project"));
        assert_eq!(from_files.token.as_deref(), Some("user-token"));

        let from_env = resolve_server(
            &Overrides::default(),
            Some("https://env".into()),
            Some(String::new()),
            &project,
            &user,
        );
        assert_eq!(from_env.url.as_deref(), Some("https://env"));
        assert_eq!(from_env.token.as_deref(), Some("user-token"));

        let flags = Overrides {
            url: Some("https://flag".into()),
            token: Some("flag-token".into()),
            json: false,
        };
        let from_flags = resolve_server(&flags, Some("https://env".into()), None, &project, &user);
        assert_eq!(from_flags.url.as_deref(), Some("https://flag"));
        assert_eq!(from_flags.token.as_deref(), Some("flag-token"));
    }

    #[test]
    fn user_config_parses_identity_and_server() {
        let cfg: UserConfig = toml::from_str(
            r#"
output = "json"
me = "analyst@example.com"

[server]
token = "secret"
"#,
        )
        .expect("parse");
        assert_eq!(cfg.output.as_deref(), Some("json"));
        assert_eq!(cfg.me.as_deref(), Some("analyst@example.com"));
        assert_eq!(cfg.server.token.as_deref(), Some("secret"));
        assert_eq!(cfg.server.url, None);
    }
}
