use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use cms_seed_core::*;
use cms_seed_import::*;
use serde_json::{Value, json};

#[derive(Debug, thiserror::Error)]
#[error("sink refused: {0}")]
struct FakeError(String);

#[derive(Debug, Clone)]
struct Call {
    kind: EntityKind,
    locale: Option<String>,
    key: Option<String>,
    body: Value,
}

/// In-memory sink handing out ids from a counter.
struct FakeSink {
    next_id: AtomicU64,
    calls: Mutex<Vec<Call>>,
    /// `nombre` values whose create fails.
    reject_create: HashSet<String>,
    /// Locales whose update fails.
    reject_locales: HashSet<String>,
}

impl FakeSink {
    fn starting_at(first: u64) -> Self {
        Self {
            next_id: AtomicU64::new(first),
            calls: Mutex::new(Vec::new()),
            reject_create: HashSet::new(),
            reject_locales: HashSet::new(),
        }
    }

    fn rejecting(mut self, nombre: &str) -> Self {
        self.reject_create.insert(nombre.to_string());
        self
    }

    fn rejecting_locale(mut self, locale: &str) -> Self {
        self.reject_locales.insert(locale.to_string());
        self
    }

    fn creates(&self, kind: EntityKind) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.kind == kind && c.locale.is_none())
            .map(|c| c.body.clone())
            .collect()
    }

    fn updates(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.locale.is_some())
            .cloned()
            .collect()
    }
}

impl RecordSink for FakeSink {
    type Error = FakeError;

    async fn create(&self, kind: EntityKind, view: &LocaleView) -> Result<CreatedRecord, FakeError> {
        self.calls.lock().unwrap().push(Call {
            kind,
            locale: None,
            key: None,
            body: view.to_value(),
        });
        if let Some(nombre) = view.get("nombre").and_then(Value::as_str) {
            if self.reject_create.contains(nombre) {
                return Err(FakeError(format!("HTTP 400 for {}", nombre)));
            }
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(CreatedRecord {
            id: DestinationId(id),
            document_id: Some(format!("doc-{}", id)),
        })
    }

    async fn update(
        &self,
        kind: EntityKind,
        key: &str,
        locale: &str,
        view: &LocaleView,
    ) -> Result<(), FakeError> {
        self.calls.lock().unwrap().push(Call {
            kind,
            locale: Some(locale.to_string()),
            key: Some(key.to_string()),
            body: view.to_value(),
        });
        if self.reject_locales.contains(locale) {
            return Err(FakeError(format!("locale {} not enabled", locale)));
        }
        Ok(())
    }
}

fn rows(values: Value) -> Vec<RawRecord> {
    values
        .as_array()
        .unwrap()
        .iter()
        .map(|v| RawRecord::from_row(v.as_object().cloned().unwrap(), "_id").unwrap())
        .collect()
}

#[tokio::test]
async fn test_area_macroarea_remapped_and_unknown_dropped() {
    let mut datasets = Datasets::new();
    datasets.insert(
        EntityKind::MacroArea,
        rows(json!([{ "_id": "m1", "nombre": "Social", "areas": ["a1"] }])),
    );
    datasets.insert(
        EntityKind::Area,
        rows(json!([
            { "_id": "a1", "nombre": "Vivienda", "macroarea": ["m1"], "sedes": ["s1"] },
            { "_id": "a2", "nombre": "Empleo", "macroarea": ["unknown"] }
        ])),
    );

    let sink = FakeSink::starting_at(501);
    let options = LoadOptions::default();
    let outcome = Loader::new(&sink, &options)
        .load_all(&datasets)
        .await
        .unwrap();

    assert_eq!(
        outcome.id_maps.resolve(EntityKind::MacroArea, "m1"),
        Some(DestinationId(501))
    );

    let macro_bodies = sink.creates(EntityKind::MacroArea);
    assert!(macro_bodies[0].get("areas").is_none());
    assert!(macro_bodies[0].get("_id").is_none());

    let areas = sink.creates(EntityKind::Area);
    assert_eq!(areas.len(), 2);
    assert_eq!(areas[0]["macroarea"], json!(501));
    assert!(areas[0].get("sedes").is_none());
    assert!(areas[1].get("macroarea").is_none());

    let area_stats = &outcome.stats[&EntityKind::Area];
    assert_eq!(area_stats.created, 2);
    assert_eq!(area_stats.relation_gaps, 1);
    assert!(outcome.id_maps.resolve(EntityKind::Area, "a2").is_some());
}

#[tokio::test]
async fn test_sede_without_organization_is_skipped() {
    let mut datasets = Datasets::new();
    datasets.insert(
        EntityKind::Sede,
        rows(json!([
            { "_id": "s1", "id": 1, "nombre": "Centro A", "organizacion": ["o1"] },
            { "_id": "s2", "id": 2, "nombre": "Centro B", "organizacion": ["o-missing"] },
            { "_id": "s3", "id": 3, "nombre": "Centro C" }
        ])),
    );
    datasets.insert(
        EntityKind::Organizacion,
        rows(json!([{ "_id": "o1", "id": 100, "nombre": "Cruz Roja" }])),
    );

    let sink = FakeSink::starting_at(1);
    let options = LoadOptions::default();
    let outcome = Loader::new(&sink, &options)
        .load(&datasets, &[EntityKind::Sede])
        .await
        .unwrap();

    let sedes = sink.creates(EntityKind::Sede);
    assert_eq!(sedes.len(), 1);
    assert_eq!(sedes[0]["organizacion"], json!("Cruz Roja"));
    assert_eq!(sedes[0]["idfromjson"], json!(1));
    assert!(sedes[0].get("id").is_none());

    let sede_map = outcome.id_maps.get(EntityKind::Sede).unwrap();
    assert!(sede_map.contains("s1"));
    assert!(!sede_map.contains("s2"));
    assert!(!sede_map.contains("s3"));
    assert_eq!(outcome.stats[&EntityKind::Sede].skipped, 2);

    // Organizations were only consulted for names.
    assert!(sink.creates(EntityKind::Organizacion).is_empty());
}

#[tokio::test]
async fn test_sede_organization_name_matches_created_organization() {
    let mut datasets = Datasets::new();
    datasets.insert(
        EntityKind::Sede,
        rows(json!([{ "_id": "s1", "id": 1, "nombre": "Centro", "organizacion": ["o1"] }])),
    );
    datasets.insert(
        EntityKind::Organizacion,
        rows(json!([{
            "_id": "o1",
            "id": 2,
            "nombre": " Caf&#233; Solidario ",
            "descripcion_general": "Hola"
        }])),
    );

    let sink = FakeSink::starting_at(1);
    let options = LoadOptions::default();
    Loader::new(&sink, &options)
        .load_all(&datasets)
        .await
        .unwrap();

    let sedes = sink.creates(EntityKind::Sede);
    let orgs = sink.creates(EntityKind::Organizacion);
    assert_eq!(sedes[0]["organizacion"], json!("Café Solidario"));
    assert_eq!(orgs[0]["nombre"], sedes[0]["organizacion"]);
}

#[tokio::test]
async fn test_sede_gets_geodata_from_coordinates() {
    let mut datasets = Datasets::new();
    datasets.insert(
        EntityKind::Sede,
        rows(json!([{ "_id": "s1", "id": "17", "nombre": "Centro", "organizacion": "o1" }])),
    );
    datasets.insert(
        EntityKind::Organizacion,
        rows(json!([{ "_id": "o1", "nombre": "Accem" }])),
    );
    let coordinates: CoordinateIndex = vec![cms_seed_remote::Coordinate {
        id: "17".to_string(),
        longitude: -3.7,
        latitude: 40.4,
    }]
    .into_iter()
    .collect();

    let sink = FakeSink::starting_at(1);
    let options = LoadOptions::default();
    Loader::new(&sink, &options)
        .with_coordinates(&coordinates)
        .load(&datasets, &[EntityKind::Sede])
        .await
        .unwrap();

    let sedes = sink.creates(EntityKind::Sede);
    assert_eq!(sedes[0]["geodata"], json!({ "lat": 40.4, "lng": -3.7 }));
}

fn organization(source_id: &str, nombre: &str) -> Value {
    json!({
        "_id": source_id,
        "id": 1,
        "nombre": nombre,
        "descripcion_general": "Hola",
        "descripcion_general_en": "Hello",
        "descripcion_general_fr": "Bonjour",
        "logo": ["/logos/x.png"],
        "email_general": "not-an-email"
    })
}

#[tokio::test]
async fn test_organization_translations_use_document_id() {
    let mut datasets = Datasets::new();
    datasets.insert(
        EntityKind::Organizacion,
        rows(json!([organization("o1", "Accem")])),
    );

    let sink = FakeSink::starting_at(40);
    let options = LoadOptions::default();
    let outcome = Loader::new(&sink, &options)
        .load_all(&datasets)
        .await
        .unwrap();

    let created = sink.creates(EntityKind::Organizacion);
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["descripcion_general"], json!("Hola"));
    assert!(created[0].get("descripcion_general_en").is_none());
    assert!(created[0].get("logo").is_none());
    assert!(created[0].get("email_general").is_none());

    let updates = sink.updates();
    assert_eq!(updates.len(), 3);
    assert!(updates.iter().all(|u| u.key.as_deref() == Some("doc-40")));
    let fr = updates
        .iter()
        .find(|u| u.locale.as_deref() == Some("fr"))
        .unwrap();
    assert_eq!(fr.body["descripcion_general"], json!("Bonjour"));
    assert!(fr.body.get("descripcion_general_fr").is_none());
    let ar = updates
        .iter()
        .find(|u| u.locale.as_deref() == Some("ar"))
        .unwrap();
    assert_eq!(ar.body["descripcion_general"], json!("Hola"));

    assert_eq!(outcome.stats[&EntityKind::Organizacion].translations_created, 3);
}

#[tokio::test]
async fn test_organization_missing_required_field_is_skipped() {
    let mut datasets = Datasets::new();
    datasets.insert(
        EntityKind::Organizacion,
        rows(json!([{ "_id": "o1", "id": 1, "nombre": "  " , "descripcion_general": "x" }])),
    );

    let sink = FakeSink::starting_at(1);
    let options = LoadOptions::default();
    let outcome = Loader::new(&sink, &options)
        .load_all(&datasets)
        .await
        .unwrap();

    assert!(sink.creates(EntityKind::Organizacion).is_empty());
    assert_eq!(outcome.totals().skipped, 1);
    assert!(matches!(
        outcome.report.entries()[0],
        ReportEntry::Skipped { .. }
    ));
}

#[tokio::test]
async fn test_translation_failure_keeps_id_map_entry() {
    let mut datasets = Datasets::new();
    datasets.insert(
        EntityKind::Organizacion,
        rows(json!([organization("o1", "Accem")])),
    );

    let sink = FakeSink::starting_at(9).rejecting_locale("ar");
    let options = LoadOptions::default();
    let outcome = Loader::new(&sink, &options)
        .load_all(&datasets)
        .await
        .unwrap();

    assert_eq!(
        outcome.id_maps.resolve(EntityKind::Organizacion, "o1"),
        Some(DestinationId(9))
    );
    let stats = &outcome.stats[&EntityKind::Organizacion];
    assert_eq!(stats.translations_failed, 1);
    assert_eq!(stats.translations_created, 2);
    assert_eq!(outcome.report.summary().failed_translations, 1);
}

#[tokio::test]
async fn test_skip_policy_continues_after_create_failure() {
    let mut datasets = Datasets::new();
    datasets.insert(
        EntityKind::MacroArea,
        rows(json!([
            { "_id": "m1", "nombre": "Bad" },
            { "_id": "m2", "nombre": "Good" }
        ])),
    );

    let sink = FakeSink::starting_at(1).rejecting("Bad");
    let options = LoadOptions::default().with_policy(ErrorPolicy::Skip);
    let outcome = Loader::new(&sink, &options)
        .load_all(&datasets)
        .await
        .unwrap();

    let map = outcome.id_maps.get(EntityKind::MacroArea).unwrap();
    assert!(!map.contains("m1"));
    assert!(map.contains("m2"));
    assert_eq!(outcome.stats[&EntityKind::MacroArea].failed, 1);
}

#[tokio::test]
async fn test_abort_policy_stops_at_first_failure() {
    let mut datasets = Datasets::new();
    datasets.insert(
        EntityKind::MacroArea,
        rows(json!([
            { "_id": "m1", "nombre": "Bad" },
            { "_id": "m2", "nombre": "Good" }
        ])),
    );
    datasets.insert(
        EntityKind::Area,
        rows(json!([{ "_id": "a1", "nombre": "Vivienda" }])),
    );

    let sink = FakeSink::starting_at(1).rejecting("Bad");
    let options = LoadOptions::default().with_policy(ErrorPolicy::Abort);
    let err = Loader::new(&sink, &options)
        .load_all(&datasets)
        .await
        .unwrap_err();

    let report = err.report();
    assert_eq!(report.summary().failed, 1);
    assert!(matches!(
        &report.entries()[0],
        ReportEntry::Failed { source_id, .. } if source_id == "m1"
    ));

    match err {
        LoadError::Aborted {
            kind, source_id, ..
        } => {
            assert_eq!(kind, EntityKind::MacroArea);
            assert_eq!(source_id, "m1");
        }
    }
    assert_eq!(sink.creates(EntityKind::MacroArea).len(), 1);
    assert!(sink.creates(EntityKind::Area).is_empty());
}

#[tokio::test]
async fn test_cancel_flag_stops_before_dispatch() {
    let mut datasets = Datasets::new();
    datasets.insert(
        EntityKind::MacroArea,
        rows(json!([{ "_id": "m1", "nombre": "Social" }])),
    );

    let cancel = AtomicBool::new(true);
    let sink = FakeSink::starting_at(1);
    let options = LoadOptions::default();
    let outcome = Loader::new(&sink, &options)
        .with_cancel_flag(&cancel)
        .load_all(&datasets)
        .await
        .unwrap();

    assert!(outcome.cancelled);
    assert!(sink.creates(EntityKind::MacroArea).is_empty());
}
