use crate::storage::{KeyValueStore, StorageError};

pub const API_KEY_KEY: &str = "GEMINI_API_KEY";
pub const THEME_KEY: &str = "theme";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

/// User preferences kept next to the collections in the same storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub api_key: Option<String>,
    pub theme: Theme,
}

impl Settings {
    /// Read the stored key and theme. A blank stored key counts as unset, in
    /// which case the `GEMINI_API_KEY` environment variable is consulted.
    pub fn load(store: &impl KeyValueStore) -> Result<Self, StorageError> {
        let api_key = non_blank(store.get(API_KEY_KEY)?)
            .or_else(|| non_blank(std::env::var(API_KEY_ENV).ok()));
        // Only "light" is stored; anything else means dark.
        let theme = match store.get(THEME_KEY)?.as_deref() {
            Some("light") => Theme::Light,
            _ => Theme::Dark,
        };
        Ok(Self { api_key, theme })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn set_api_key(
        &mut self,
        store: &mut impl KeyValueStore,
        key: &str,
    ) -> Result<(), StorageError> {
        let key = key.trim();
        if key.is_empty() {
            return self.clear_api_key(store);
        }
        store.set(API_KEY_KEY, key)?;
        self.api_key = Some(key.to_string());
        log::info!("API key updated");
        Ok(())
    }

    pub fn clear_api_key(&mut self, store: &mut impl KeyValueStore) -> Result<(), StorageError> {
        store.remove(API_KEY_KEY)?;
        self.api_key = None;
        log::info!("API key cleared");
        Ok(())
    }

    pub fn set_theme(
        &mut self,
        store: &mut impl KeyValueStore,
        theme: Theme,
    ) -> Result<(), StorageError> {
        match theme {
            Theme::Light => store.set(THEME_KEY, Theme::Light.as_str())?,
            Theme::Dark => store.remove(THEME_KEY)?,
        }
        self.theme = theme;
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
