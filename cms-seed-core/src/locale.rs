//! Locale projection.
//!
//! Source rows carry one column per language for translatable fields
//! (`descripcion_general_en`, `descripcion_general_fr`, ...). The CMS expects
//! a single unsuffixed field per locale variant, so each row is projected once
//! per configured locale.

use serde::{Deserialize, Serialize};

use crate::record::{CleanRecord, LocaleView};

/// The locales a run produces: one default plus any number of extras.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleSet {
    pub default: String,
    #[serde(default)]
    pub extra: Vec<String>,
}

impl Default for LocaleSet {
    fn default() -> Self {
        Self {
            default: "es".to_string(),
            extra: vec!["en".to_string(), "ar".to_string(), "fr".to_string()],
        }
    }
}

impl LocaleSet {
    pub fn new(default: impl Into<String>, extra: Vec<String>) -> Self {
        Self {
            default: default.into(),
            extra,
        }
    }

    /// Default locale first, then the extras in configured order.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.default.as_str()).chain(self.extra.iter().map(String::as_str))
    }

    pub fn is_default(&self, locale: &str) -> bool {
        self.default == locale
    }
}

/// Name of the per-locale column for a logical field.
pub fn suffixed(field: &str, locale: &str) -> String {
    format!("{}_{}", field, locale)
}

/// Project a clean record for one locale.
///
/// For every logical field in `localized_fields` the unsuffixed output value
/// comes from, in order of preference:
///
/// 1. the existing unsuffixed field, when projecting the default locale;
/// 2. `<field>_<locale>`;
/// 3. `<field>_<default>`;
/// 4. the existing unsuffixed field.
///
/// Every `<field>_<l>` column for every configured locale is then removed, so
/// no other language can leak into the view.
pub fn project(
    record: &CleanRecord,
    locale: &str,
    localized_fields: &[String],
    locales: &LocaleSet,
) -> LocaleView {
    let mut fields = record.fields.clone();

    for name in localized_fields {
        let keep_unsuffixed = locales.is_default(locale) && fields.contains_key(name);
        if !keep_unsuffixed {
            let picked = fields
                .get(&suffixed(name, locale))
                .or_else(|| fields.get(&suffixed(name, &locales.default)))
                .cloned();
            if let Some(value) = picked {
                fields.insert(name.clone(), value);
            }
        }

        fields.remove(&suffixed(name, locale));
        for l in locales.all() {
            fields.remove(&suffixed(name, l));
        }
    }

    LocaleView {
        locale: locale.to_string(),
        fields,
    }
}

#[cfg(test)]
#[path = "tests/locale_tests.rs"]
mod tests;
