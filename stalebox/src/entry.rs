//! Conversion between [`Response`] and the stored [`CacheEntry`] record.

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use indexmap::IndexMap;
use stalebox_backend::{CacheEntry, Format, HeaderValues, Raw};
use stalebox_core::{Request, Response};

use crate::error::{CacheError, EncodingError};

/// Builds the stored record of a response.
///
/// Header names keep their first-seen order and every value of a repeated
/// header is kept.
pub fn to_entry(response: &Response) -> Result<CacheEntry, EncodingError> {
    let body = std::str::from_utf8(response.body())?.to_owned();
    let mut headers = IndexMap::with_capacity(response.headers().keys_len());
    for name in response.headers().keys() {
        let values = response
            .headers()
            .get_all(name)
            .iter()
            .map(|value| header_text(name, value))
            .collect::<Result<Vec<_>, _>>()?;
        headers.insert(name.as_str().to_owned(), HeaderValues::from_values(values));
    }
    Ok(CacheEntry {
        headers,
        body,
        code: response.code().as_u16(),
    })
}

/// Rebuilds a response from a stored record, attached to `request`.
pub fn from_entry(request: Request, entry: CacheEntry) -> Result<Response, CacheError> {
    let code = StatusCode::from_u16(entry.code).map_err(malformed)?;
    let mut headers = HeaderMap::with_capacity(entry.headers.len());
    for (name, values) in &entry.headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(malformed)?;
        for value in values.iter() {
            let value = HeaderValue::from_bytes(value.as_bytes()).map_err(malformed)?;
            headers.append(name.clone(), value);
        }
    }
    Ok(Response::new(
        request,
        code,
        headers,
        Bytes::from(entry.body),
    ))
}

/// Serializes a response into the bytes written under both cache keys.
///
/// Fails with [`CacheError::Encoding`] when the body or a header value is not
/// text; such a response is never written.
pub fn serialize_response(format: &dyn Format, response: &Response) -> Result<Raw, CacheError> {
    let entry = to_entry(response)?;
    Ok(format.encode(&entry)?)
}

/// Deserializes stored bytes into a response for `request`.
///
/// The response carries the request it was looked up for, not the one that
/// originally produced it.
pub fn deserialize_response(
    format: &dyn Format,
    request: Request,
    data: &[u8],
) -> Result<Response, CacheError> {
    let entry = format.decode(data)?;
    from_entry(request, entry)
}

fn header_text(name: &HeaderName, value: &HeaderValue) -> Result<String, EncodingError> {
    std::str::from_utf8(value.as_bytes())
        .map(str::to_owned)
        .map_err(|_| EncodingError::HeaderValue {
            name: name.as_str().to_owned(),
        })
}

fn malformed<E>(error: E) -> CacheError
where
    E: std::error::Error + Send + Sync + 'static,
{
    CacheError::MalformedEntry(Box::new(error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_TYPE, SET_COOKIE};
    use pretty_assertions::assert_eq;
    use stalebox_backend::{JsonFormat, RonFormat};

    fn response(body: &'static [u8]) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        Response::new(
            Request::get("/url"),
            StatusCode::OK,
            headers,
            Bytes::from_static(body),
        )
    }

    #[test]
    fn json_record_layout() {
        let raw = serialize_response(&JsonFormat, &response(b"fake response")).unwrap();
        assert_eq!(
            std::str::from_utf8(&raw).unwrap(),
            r#"{"headers":{"content-type":"text/plain"},"body":"fake response","code":200}"#
        );
    }

    #[test]
    fn repeated_headers_survive() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        let response = Response::new(
            Request::get("/url"),
            StatusCode::CREATED,
            headers,
            Bytes::from_static(b"{}"),
        );

        let formats: [&dyn Format; 2] = [&JsonFormat, &RonFormat];
        for format in formats {
            let raw = serialize_response(format, &response).unwrap();
            let restored = deserialize_response(format, Request::get("/other"), &raw).unwrap();

            assert_eq!(restored.content(), response.content());
            assert_eq!(restored.request().url(), "/other");
        }
    }

    #[test]
    fn binary_body_is_an_encoding_error() {
        let result = serialize_response(&JsonFormat, &response(b"\xff\xfe"));
        assert!(matches!(
            result,
            Err(CacheError::Encoding(EncodingError::Body(_)))
        ));
    }

    #[test]
    fn binary_header_is_an_encoding_error() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-blob",
            HeaderValue::from_bytes(b"\xff\xfe").unwrap(),
        );
        let response = Response::new(
            Request::get("/url"),
            StatusCode::OK,
            headers,
            Bytes::from_static(b"ok"),
        );

        let result = serialize_response(&JsonFormat, &response);
        assert!(
            matches!(
                &result,
                Err(CacheError::Encoding(EncodingError::HeaderValue { name })) if name == "x-blob"
            ),
            "{result:?}"
        );
    }

    #[test]
    fn utf8_header_value_survives() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-title",
            HeaderValue::from_bytes("café".as_bytes()).unwrap(),
        );
        let response = Response::new(
            Request::get("/url"),
            StatusCode::OK,
            headers,
            Bytes::from_static(b"ok"),
        );

        let raw = serialize_response(&JsonFormat, &response).unwrap();
        let restored = deserialize_response(&JsonFormat, Request::get("/url"), &raw).unwrap();
        assert_eq!(restored.headers()["x-title"].as_bytes(), "café".as_bytes());
    }

    #[test]
    fn invalid_status_is_malformed() {
        let raw = br#"{"headers":{},"body":"","code":42}"#;
        let result = deserialize_response(&JsonFormat, Request::get("/url"), raw);
        assert!(matches!(result, Err(CacheError::MalformedEntry(_))));
    }

    #[test]
    fn invalid_header_name_is_malformed() {
        let raw = br#"{"headers":{"bad name":"x"},"body":"","code":200}"#;
        let result = deserialize_response(&JsonFormat, Request::get("/url"), raw);
        assert!(matches!(result, Err(CacheError::MalformedEntry(_))));
    }

    #[test]
    fn garbage_is_a_format_error() {
        let result = deserialize_response(&JsonFormat, Request::get("/url"), b"not json");
        assert!(matches!(result, Err(CacheError::Format(_))));
    }
}
