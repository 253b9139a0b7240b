use std::{collections::HashMap, fs};

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub herolab_base_url: String,
    pub refresh_token: Option<String>,
    /// Mirrors the host module's "inject button" client setting: when off,
    /// the list is never opened from the user-list render signal.
    pub show_list_button: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/todos.db".into(),
            herolab_base_url: herolab_client::DEFAULT_BASE_URL.into(),
            refresh_token: None,
            show_list_button: true,
        }
    }
}

/// Defaults, overridden by `vtt-todo.toml` (string values), overridden by
/// `VTT_TODO_*` environment variables.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("vtt-todo.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            apply_overrides(&mut settings, &file_cfg);
        }
    }

    let mut env_cfg = HashMap::new();
    for (key, setting) in [
        ("VTT_TODO_DATABASE_URL", "database_url"),
        ("VTT_TODO_HEROLAB_BASE_URL", "herolab_base_url"),
        ("VTT_TODO_REFRESH_TOKEN", "refresh_token"),
        ("VTT_TODO_SHOW_LIST_BUTTON", "show_list_button"),
    ] {
        if let Ok(value) = std::env::var(key) {
            env_cfg.insert(setting.to_string(), value);
        }
    }
    apply_overrides(&mut settings, &env_cfg);

    settings
}

fn apply_overrides(settings: &mut Settings, cfg: &HashMap<String, String>) {
    if let Some(v) = cfg.get("database_url") {
        settings.database_url = v.clone();
    }
    if let Some(v) = cfg.get("herolab_base_url") {
        settings.herolab_base_url = v.clone();
    }
    if let Some(v) = cfg.get("refresh_token") {
        settings.refresh_token = Some(v.clone());
    }
    if let Some(v) = cfg.get("show_list_button") {
        if let Ok(parsed) = v.parse::<bool>() {
            settings.show_list_button = parsed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_named_settings() {
        let mut settings = Settings::default();
        let cfg = HashMap::from([
            ("refresh_token".to_string(), "secret".to_string()),
            ("show_list_button".to_string(), "false".to_string()),
        ]);

        apply_overrides(&mut settings, &cfg);

        assert_eq!(settings.refresh_token.as_deref(), Some("secret"));
        assert!(!settings.show_list_button);
        assert_eq!(settings.database_url, Settings::default().database_url);
    }

    #[test]
    fn unparseable_bool_keeps_the_default() {
        let mut settings = Settings::default();
        let cfg = HashMap::from([("show_list_button".to_string(), "maybe".to_string())]);

        apply_overrides(&mut settings, &cfg);

        assert!(settings.show_list_button);
    }
}
