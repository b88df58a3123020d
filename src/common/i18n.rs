// src/common/i18n.rs

use std::collections::HashMap;

/// Idioma usado quando o pedido não bate com nenhum catálogo.
pub const DEFAULT_LANG: &str = "en";

/// Idiomas com catálogo embutido no binário.
pub const SUPPORTED_LANGS: [&str; 3] = ["en", "fr", "pt"];

const CATALOGS: [(&str, &str); 3] = [
    ("en", include_str!("../../locales/en.json")),
    ("fr", include_str!("../../locales/fr.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

// Catálogo de mensagens por idioma: lang -> (chave -> texto)
#[derive(Debug, Default)]
pub struct I18nStore {
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut catalogs = HashMap::new();
        for (lang, raw) in CATALOGS {
            let messages: HashMap<String, String> = serde_json::from_str(raw)
                .map_err(|e| anyhow::anyhow!("catálogo '{lang}' inválido: {e}"))?;
            catalogs.insert(lang.to_string(), messages);
        }
        Ok(Self { catalogs })
    }

    /// Busca a chave no idioma pedido, depois no padrão; sem tradução devolve a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.lookup(lang, key)
            .or_else(|| self.lookup(DEFAULT_LANG, key))
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }

    /// Como `translate`, substituindo `{nome}` pelos argumentos.
    pub fn format(&self, lang: &str, key: &str, args: &[(&str, &str)]) -> String {
        args.iter()
            .fold(self.translate(lang, key), |msg, (name, value)| {
                msg.replace(&format!("{{{name}}}"), value)
            })
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.catalogs.get(lang)?.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_catalogs_have_the_same_keys() {
        let store = I18nStore::load().unwrap();
        let reference = &store.catalogs[DEFAULT_LANG];
        for lang in SUPPORTED_LANGS {
            let catalog = &store.catalogs[lang];
            for key in reference.keys() {
                assert!(catalog.contains_key(key), "'{lang}' sem a chave '{key}'");
            }
        }
    }

    #[test]
    fn falls_back_to_default_then_key() {
        let store = I18nStore::load().unwrap();
        assert_eq!(
            store.translate("de", "error.internal"),
            store.translate(DEFAULT_LANG, "error.internal")
        );
        assert_eq!(store.translate("fr", "no.such.key"), "no.such.key");
    }

    #[test]
    fn format_replaces_placeholders() {
        let store = I18nStore::load().unwrap();
        let msg = store.format("en", "error.not_found.tube", &[("id", "7")]);
        assert!(msg.contains('7'));
        assert!(!msg.contains("{id}"));
    }
}
