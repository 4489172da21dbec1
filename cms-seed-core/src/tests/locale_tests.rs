use serde_json::json;

use super::*;
use crate::record::Fields;

fn clean(value: serde_json::Value) -> CleanRecord {
    let fields: Fields = value.as_object().cloned().unwrap();
    CleanRecord {
        source_id: "r1".to_string(),
        fields,
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_picks_requested_locale_and_strips_variants() {
    let record = clean(json!({
        "description_fr": "Bonjour",
        "description_es": "Hola",
    }));
    let view = project(&record, "fr", &names(&["description"]), &LocaleSet::default());

    assert_eq!(view.locale, "fr");
    assert_eq!(view.to_value(), json!({"description": "Bonjour"}));
}

#[test]
fn test_default_locale_prefers_unsuffixed_field() {
    let record = clean(json!({
        "nombre_largo": "Asociación",
        "nombre_largo_es": "Otro texto",
        "nombre_largo_en": "Association",
    }));
    let view = project(&record, "es", &names(&["nombre_largo"]), &LocaleSet::default());
    assert_eq!(view.to_value(), json!({"nombre_largo": "Asociación"}));
}

#[test]
fn test_default_locale_uses_suffixed_field_when_unsuffixed_missing() {
    let record = clean(json!({"description_es": "Hola", "description_en": "Hello"}));
    let view = project(&record, "es", &names(&["description"]), &LocaleSet::default());
    assert_eq!(view.to_value(), json!({"description": "Hola"}));
}

#[test]
fn test_missing_translation_falls_back_to_default_locale() {
    let record = clean(json!({"description_es": "Hola", "description_en": "Hello"}));
    let view = project(&record, "ar", &names(&["description"]), &LocaleSet::default());
    assert_eq!(view.to_value(), json!({"description": "Hola"}));
}

#[test]
fn test_missing_translation_keeps_unsuffixed_default_text() {
    let record = clean(json!({"description": "Hola"}));
    let view = project(&record, "en", &names(&["description"]), &LocaleSet::default());
    assert_eq!(view.to_value(), json!({"description": "Hola"}));
}

#[test]
fn test_non_localized_fields_are_untouched() {
    let record = clean(json!({
        "nombre": "Centro",
        "telefono_en": "not a localized field",
        "description_en": "Hello",
    }));
    let view = project(&record, "en", &names(&["description"]), &LocaleSet::default());
    assert_eq!(view.get("nombre"), Some(&json!("Centro")));
    assert_eq!(view.get("telefono_en"), Some(&json!("not a localized field")));
    assert_eq!(view.get("description"), Some(&json!("Hello")));
}

#[test]
fn test_default_projection_has_no_suffixed_keys() {
    let locales = LocaleSet::default();
    let fields = names(&["descripcion_general", "nombre_largo", "listado_servicios_organizacion"]);
    let mut raw = Fields::new();
    for field in &fields {
        for l in locales.all() {
            raw.insert(suffixed(field, l), json!(format!("{field} in {l}")));
        }
    }
    let record = CleanRecord {
        source_id: "r1".to_string(),
        fields: raw,
    };

    for locale in locales.all() {
        let view = project(&record, locale, &fields, &locales);
        for field in &fields {
            for l in locales.all() {
                assert!(
                    !view.contains(&suffixed(field, l)),
                    "{locale} view leaked {}",
                    suffixed(field, l)
                );
            }
            assert_eq!(view.get(field), Some(&json!(format!("{field} in {locale}"))));
        }
    }
}

#[test]
fn test_projection_is_deterministic() {
    let record = clean(json!({"description_en": "Hello", "description_es": "Hola"}));
    let fields = names(&["description"]);
    let a = project(&record, "en", &fields, &LocaleSet::default());
    let b = project(&record, "en", &fields, &LocaleSet::default());
    assert_eq!(a, b);
}

#[test]
fn test_locale_set_lists_default_first() {
    let locales = LocaleSet::new("es", vec!["en".to_string(), "fr".to_string()]);
    assert_eq!(locales.all().collect::<Vec<_>>(), vec!["es", "en", "fr"]);
    assert!(locales.is_default("es"));
    assert!(!locales.is_default("en"));
}
