//! Wire encoding of structured request bodies.

use bytes::Bytes;
use http::HeaderMap;
use http::header::{CONTENT_TYPE, HeaderValue};
use inflight_core::canonical::flatten_json;
use inflight_core::{MultipartField, RequestBody, TransportError, TransportErrorKind};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART_FORM_DATA: &str = "multipart/form-data";
const APPLICATION_JSON: &str = "application/json";

/// A body ready to attach to a reqwest request.
#[derive(Debug)]
pub(crate) enum Encoded {
    None,
    Bytes(Bytes),
    Multipart(Form),
}

/// Encodes `body`, adjusting `headers` to match.
///
/// A `Content-Type` set by the caller is kept, except for multipart bodies
/// where reqwest has to generate it with the boundary.
pub(crate) fn encode_body(
    body: &RequestBody,
    headers: &mut HeaderMap,
) -> Result<Encoded, TransportError> {
    match body {
        RequestBody::Empty => Ok(Encoded::None),
        RequestBody::Json(value) => match declared_content_type(headers) {
            Some(FORM_URLENCODED) => urlencoded(&flatten_json(value)).map(Encoded::Bytes),
            Some(MULTIPART_FORM_DATA) => {
                headers.remove(CONTENT_TYPE);
                let fields = flatten_json(value)
                    .into_iter()
                    .map(|(name, value)| MultipartField::text(name, value));
                multipart(fields).map(Encoded::Multipart)
            }
            _ => {
                default_content_type(headers, APPLICATION_JSON);
                json(value).map(Encoded::Bytes)
            }
        },
        RequestBody::Form(fields) => {
            default_content_type(headers, FORM_URLENCODED);
            urlencoded(fields).map(Encoded::Bytes)
        }
        RequestBody::Multipart(fields) => {
            headers.remove(CONTENT_TYPE);
            multipart(fields.iter().cloned()).map(Encoded::Multipart)
        }
        RequestBody::Bytes { content_type, data } => {
            if let Some(content_type) = content_type
                && !headers.contains_key(CONTENT_TYPE)
            {
                let value = HeaderValue::from_str(content_type).map_err(|error| {
                    TransportError::new(TransportErrorKind::Request, error.to_string())
                })?;
                headers.insert(CONTENT_TYPE, value);
            }
            Ok(Encoded::Bytes(data.clone()))
        }
    }
}

/// The mime type of the caller's `Content-Type`, without parameters.
fn declared_content_type(headers: &HeaderMap) -> Option<&'static str> {
    let value = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let mime = value.split(';').next().unwrap_or_default().trim();
    [FORM_URLENCODED, MULTIPART_FORM_DATA]
        .into_iter()
        .find(|known| mime.eq_ignore_ascii_case(known))
}

fn default_content_type(headers: &mut HeaderMap, value: &'static str) {
    headers
        .entry(CONTENT_TYPE)
        .or_insert(HeaderValue::from_static(value));
}

fn json(value: &Value) -> Result<Bytes, TransportError> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|error| TransportError::new(TransportErrorKind::Request, error.to_string()))
}

fn urlencoded(fields: &[(String, String)]) -> Result<Bytes, TransportError> {
    serde_urlencoded::to_string(fields)
        .map(Bytes::from)
        .map_err(|error| TransportError::new(TransportErrorKind::Request, error.to_string()))
}

fn multipart(fields: impl IntoIterator<Item = MultipartField>) -> Result<Form, TransportError> {
    fields.into_iter().try_fold(Form::new(), |form, field| -> Result<Form, TransportError> {
        Ok(match field {
            MultipartField::Text { name, value } => form.text(name, value),
            MultipartField::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                let mut part = Part::bytes(data.to_vec());
                if let Some(file_name) = file_name {
                    part = part.file_name(file_name);
                }
                if let Some(content_type) = content_type {
                    part = part.mime_str(&content_type).map_err(|error| {
                        TransportError::new(TransportErrorKind::Request, error.to_string())
                    })?;
                }
                form.part(name, part)
            }
        })
    })
}
