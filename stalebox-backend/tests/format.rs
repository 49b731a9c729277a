use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use stalebox_backend::{CacheEntry, Format, FormatError, FormatTypeId, HeaderValues, JsonFormat, RonFormat};

fn entry() -> CacheEntry {
    let mut headers = IndexMap::new();
    headers.insert(
        "content-type".to_owned(),
        HeaderValues::from_values(vec!["text/plain; charset=utf-8".to_owned()]),
    );
    headers.insert(
        "set-cookie".to_owned(),
        HeaderValues::from_values(vec!["a=1".to_owned(), "b=2".to_owned()]),
    );
    CacheEntry {
        headers,
        body: "olá \"mundo\"\n".to_owned(),
        code: 203,
    }
}

#[test]
fn json_keeps_every_field() {
    let format = JsonFormat;
    let encoded = format.encode(&entry()).unwrap();
    assert_eq!(format.decode(&encoded).unwrap(), entry());
    assert_eq!(format.format_type_id(), FormatTypeId::Json);
}

#[test]
fn ron_keeps_every_field() {
    let format = RonFormat;
    let encoded = format.encode(&entry()).unwrap();
    assert_eq!(format.decode(&encoded).unwrap(), entry());
    assert_eq!(format.format_type_id(), FormatTypeId::Ron);
}

#[test]
fn malformed_data_is_a_deserialize_error() {
    let formats: Vec<Box<dyn Format>> = vec![Box::new(JsonFormat), Box::new(RonFormat)];
    for format in formats {
        let result = format.decode(b"\xff not a record");
        assert!(
            matches!(result, Err(FormatError::Deserialize(_))),
            "{format:?} accepted malformed data"
        );
    }
}

#[test]
fn boxed_format_clones() {
    let format: Box<dyn Format> = Box::new(RonFormat);
    let cloned = format.clone();
    assert_eq!(cloned.format_type_id(), format.format_type_id());
}
