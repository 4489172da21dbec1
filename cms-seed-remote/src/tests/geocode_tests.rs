use serde_json::json;

use super::*;

fn sede(value: serde_json::Value) -> RawRecord {
    RawRecord::from_row(value.as_object().cloned().unwrap(), "_id").unwrap()
}

#[test]
fn test_full_address_query() {
    let record = sede(json!({
        "_id": "s1",
        "tipo_calle": "Calle",
        "direccion": "Mayor",
        "numero": 12,
        "localidad": "Madrid",
        "provincia": "Madrid",
        "cp": "28013"
    }));
    assert_eq!(
        address_query(&record).as_deref(),
        Some("Calle Mayor 12, Madrid, Madrid 28013")
    );
}

#[test]
fn test_optional_parts_are_omitted() {
    let record = sede(json!({
        "_id": "s1",
        "tipo_calle": "  ",
        "direccion": "Plaza Nueva",
        "localidad": "Sevilla",
        "provincia": "Sevilla"
    }));
    assert_eq!(
        address_query(&record).as_deref(),
        Some("Plaza Nueva, Sevilla, Sevilla")
    );
}

#[test]
fn test_incomplete_address_has_no_query() {
    let missing_city = sede(json!({
        "_id": "s1",
        "direccion": "Mayor",
        "provincia": "Madrid"
    }));
    assert_eq!(address_query(&missing_city), None);

    let blank_street = sede(json!({
        "_id": "s2",
        "direccion": "",
        "localidad": "Madrid",
        "provincia": "Madrid"
    }));
    assert_eq!(address_query(&blank_street), None);
}

#[test]
fn test_write_coordinates_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coordinates.json");
    let coords = vec![Coordinate {
        id: "17".to_string(),
        longitude: -3.7,
        latitude: 40.4,
    }];
    write_coordinates(&path, &coords).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value, json!([{ "id": "17", "longitude": -3.7, "latitude": 40.4 }]));
}

#[test]
fn test_coordinate_accepts_numeric_id() {
    let parsed: Vec<Coordinate> =
        serde_json::from_str(r#"[{"id": 42, "longitude": 1.5, "latitude": 2.5}]"#).unwrap();
    assert_eq!(parsed[0].id, "42");
}

#[test]
fn test_geocoder_requires_token() {
    let settings = MapboxSettings {
        access_token: None,
        country: "es".to_string(),
    };
    assert!(matches!(Geocoder::new(&settings), Err(CmsError::Config(_))));
}
