use reqwest::StatusCode;
use reqwest::blocking::{RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::firebase_auth::SharedCredentials;
use super::{DocumentStore, new_document_id};
use crate::error::StoreError;
use crate::http_client::http_client;
use crate::model::{CREATED_AT, Document, Record, UPDATED_AT};

const FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: usize = 300;

pub struct FirestoreStore {
    database: String,
    credentials: SharedCredentials,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl FirestoreStore {
    pub fn new(project_id: String, credentials: SharedCredentials) -> Self {
        Self {
            database: format!("projects/{project_id}/databases/(default)"),
            credentials,
        }
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{collection}/{id}", self.database)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let token = self
            .credentials
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(|c| c.id_token.clone()))
            .filter(|t| !t.is_empty());
        match token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn commit(&self, write: Value) -> Result<(), StoreError> {
        let client = http_client().map_err(|err| StoreError::Transport(err.to_string()))?;
        let url = format!("{FIRESTORE_URL}/{}/documents:commit", self.database);
        let resp = self
            .authorize(client.post(url))
            .json(&json!({ "writes": [write] }))
            .send()?;
        check(resp).map(|_| ())
    }
}

fn check(resp: Response) -> Result<String, StoreError> {
    let status = resp.status();
    let body = resp.text()?;
    if status.is_success() {
        return Ok(body);
    }
    Err(store_error(status, &body))
}

/// Maps a failed Firestore response to a [`StoreError`].
pub fn store_error(status: StatusCode, body: &str) -> StoreError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| format!("http {status}"));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::PermissionDenied,
        _ => StoreError::Backend(message),
    }
}

/// Encodes plain JSON as a Firestore typed value.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(record: &Record) -> Value {
    let fields: Map<String, Value> = record
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect();
    Value::Object(fields)
}

/// Decodes a Firestore typed value into plain JSON. Timestamps, references and
/// bytes come back as strings.
pub fn decode_value(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return Value::Null;
    };
    let Some((kind, inner)) = obj.iter().next() else {
        return Value::Null;
    };
    match kind.as_str() {
        "integerValue" => match inner {
            Value::String(s) => s.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            other => other.clone(),
        },
        "doubleValue" | "booleanValue" | "stringValue" | "timestampValue" | "referenceValue"
        | "bytesValue" | "geoPointValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(decode_fields(inner.get("fields").and_then(Value::as_object))),
        _ => Value::Null,
    }
}

pub fn decode_fields(fields: Option<&Map<String, Value>>) -> Record {
    fields
        .map(|fields| {
            fields
                .iter()
                .map(|(k, v)| (k.clone(), decode_value(v)))
                .collect()
        })
        .unwrap_or_default()
}

/// Parses one page of a `documents/{collection}` listing.
pub fn parse_list_page(body: &str) -> Result<(Vec<Document>, Option<String>), StoreError> {
    let page: ListResponse =
        serde_json::from_str(body).map_err(|err| StoreError::Decode(err.to_string()))?;
    let docs = page
        .documents
        .into_iter()
        .map(|raw| {
            let id = raw.name.rsplit('/').next().unwrap_or_default().to_string();
            Document::new(id, decode_fields(Some(&raw.fields)))
        })
        .collect();
    let next = page.next_page_token.filter(|t| !t.is_empty());
    Ok((docs, next))
}

fn field_path(key: &str) -> String {
    let simple = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        key.to_string()
    } else {
        format!("`{}`", key.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn server_time(field: &str) -> Value {
    json!({ "fieldPath": field, "setToServerValue": "REQUEST_TIME" })
}

fn without_timestamps(mut record: Record) -> Record {
    record.remove(CREATED_AT);
    record.remove(UPDATED_AT);
    record
}

impl DocumentStore for FirestoreStore {
    fn list_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let client = http_client().map_err(|err| StoreError::Transport(err.to_string()))?;
        let base = format!("{FIRESTORE_URL}/{}/documents/{collection}", self.database);
        let mut docs = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut req = client.get(&base).query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(token) = page_token.as_deref() {
                req = req.query(&[("pageToken", token)]);
            }
            let body = check(self.authorize(req).send()?)?;
            let (mut page, next) = parse_list_page(&body)?;
            docs.append(&mut page);
            match next {
                Some(token) => page_token = Some(token),
                None => return Ok(docs),
            }
        }
    }

    fn add(&mut self, collection: &str, record: Record) -> Result<String, StoreError> {
        let id = new_document_id();
        let fields = encode_fields(&without_timestamps(record));
        self.commit(json!({
            "update": { "name": self.document_name(collection, &id), "fields": fields },
            "currentDocument": { "exists": false },
            "updateTransforms": [server_time(CREATED_AT), server_time(UPDATED_AT)],
        }))?;
        Ok(id)
    }

    fn update(&mut self, collection: &str, id: &str, record: Record) -> Result<(), StoreError> {
        let record = without_timestamps(record);
        let mask: Vec<String> = record.keys().map(|k| field_path(k)).collect();
        let result = self.commit(json!({
            "update": { "name": self.document_name(collection, id), "fields": encode_fields(&record) },
            "updateMask": { "fieldPaths": mask },
            "currentDocument": { "exists": true },
            "updateTransforms": [server_time(UPDATED_AT)],
        }));
        match result {
            Err(StoreError::Backend(msg)) if msg.contains("No document to update") => {
                Err(StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })
            }
            other => other,
        }
    }

    fn delete(&mut self, collection: &str, id: &str) -> Result<(), StoreError> {
        let client = http_client().map_err(|err| StoreError::Transport(err.to_string()))?;
        let url = format!("{FIRESTORE_URL}/{}", self.document_name(collection, id));
        check(self.authorize(client.delete(url)).send()?).map(|_| ())
    }
}
