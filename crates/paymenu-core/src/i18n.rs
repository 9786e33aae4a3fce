//! Localization lookup.
//!
//! Translations are flat JSON objects, one file per language
//! (`<locales_dir>/<lang>.json`), with `{name}` placeholders.

use std::{collections::HashMap, fs, path::Path};

use crate::Result;

/// Localized text lookup port.
pub trait Translator: Send + Sync {
    /// Look up `key` for `lang` and substitute `{name}` placeholders.
    /// Falls back to the default language, then echoes the key.
    fn gettext(&self, lang: &str, key: &str, args: &[(&str, String)]) -> String;

    /// Map a client language code (`ru-RU`, `en`) to a supported language.
    fn resolve_language(&self, code: Option<&str>) -> String;
}

#[derive(Clone, Debug)]
pub struct JsonI18n {
    default_language: String,
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl JsonI18n {
    pub fn new(
        default_language: impl Into<String>,
        catalogs: HashMap<String, HashMap<String, String>>,
    ) -> Self {
        Self {
            default_language: default_language.into(),
            catalogs,
        }
    }

    /// Load every `*.json` catalog in `dir`.
    pub fn load(dir: &Path, default_language: &str) -> Result<Self> {
        let mut catalogs = HashMap::new();
        for ent in fs::read_dir(dir)?.flatten() {
            let path = ent.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(lang) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let raw = fs::read_to_string(&path)?;
            let catalog: HashMap<String, String> = serde_json::from_str(&raw)?;
            tracing::debug!(lang, keys = catalog.len(), "loaded locale catalog");
            catalogs.insert(lang.to_lowercase(), catalog);
        }

        if !catalogs.contains_key(default_language) {
            tracing::warn!(
                default_language,
                dir = %dir.display(),
                "no catalog for the default language; untranslated keys will be echoed"
            );
        }

        Ok(Self::new(default_language, catalogs))
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.catalogs.keys().map(String::as_str)
    }

    fn template(&self, lang: &str, key: &str) -> Option<&str> {
        self.catalogs
            .get(lang)
            .and_then(|c| c.get(key))
            .or_else(|| {
                self.catalogs
                    .get(&self.default_language)
                    .and_then(|c| c.get(key))
            })
            .map(String::as_str)
    }
}

impl Translator for JsonI18n {
    fn gettext(&self, lang: &str, key: &str, args: &[(&str, String)]) -> String {
        match self.template(lang, key) {
            Some(tpl) => substitute(tpl, args),
            None => key.to_string(),
        }
    }

    fn resolve_language(&self, code: Option<&str>) -> String {
        let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
            return self.default_language.clone();
        };
        let lower = code.to_lowercase();
        if self.catalogs.contains_key(&lower) {
            return lower;
        }
        let primary = lower.split(|c: char| c == '-' || c == '_').next().unwrap_or_default();
        if self.catalogs.contains_key(primary) {
            return primary.to_string();
        }
        self.default_language.clone()
    }
}

/// Replace `{name}` placeholders; unknown placeholders are left untouched.
pub fn substitute(template: &str, args: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (name, value) in args {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}
