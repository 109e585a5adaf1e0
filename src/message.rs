//! Message bus payloads
//!
//! Inbound payloads are base64-wrapped JSON objects describing a storage
//! object. Outbound payloads are plain JSON bytes with no base64 layer; the
//! two directions are intentionally not symmetric.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Standard alphabet, trailing padding accepted but not required
const INBOUND: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Records that can be republished on the message bus
pub trait PubsubPayload: Serialize {
    /// Serialize to UTF-8 JSON bytes
    fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Metadata of a storage object, as carried by an upload notification
///
/// Every field is an opaque passthrough string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageObjectEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metageneration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_storage_class_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crc32c: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl StorageObjectEvent {
    /// Decode a base64-wrapped JSON payload
    ///
    /// Missing keys and `null` values become `None`. Unknown keys are ignored.
    /// Numbers and booleans under a known key are kept as their JSON text.
    pub fn from_pubsub_data(data: &[u8]) -> Result<Self, DecodeError> {
        let raw = INBOUND.decode(data)?;
        let text = String::from_utf8(raw)?;
        let value: Value = serde_json::from_str(&text)?;
        let Value::Object(map) = value else {
            return Err(DecodeError::NotAnObject);
        };

        Ok(Self {
            kind: field(&map, "kind")?,
            id: field(&map, "id")?,
            self_link: field(&map, "selfLink")?,
            name: field(&map, "name")?,
            bucket: field(&map, "bucket")?,
            generation: field(&map, "generation")?,
            metageneration: field(&map, "metageneration")?,
            content_type: field(&map, "contentType")?,
            time_created: field(&map, "timeCreated")?,
            updated: field(&map, "updated")?,
            storage_class: field(&map, "storageClass")?,
            time_storage_class_updated: field(&map, "timeStorageClassUpdated")?,
            size: field(&map, "size")?,
            md5_hash: field(&map, "md5Hash")?,
            media_link: field(&map, "mediaLink")?,
            crc32c: field(&map, "crc32c")?,
            etag: field(&map, "etag")?,
        })
    }

    /// `gs://bucket/name` locator of the object, when both parts are known
    pub fn gcs_uri(&self) -> Option<String> {
        match (self.bucket.as_deref(), self.name.as_deref()) {
            (Some(bucket), Some(name)) if !bucket.is_empty() && !name.is_empty() => {
                Some(format!("gs://{}/{}", bucket, name))
            }
            _ => None,
        }
    }
}

impl PubsubPayload for StorageObjectEvent {}

fn field(map: &Map<String, Value>, key: &'static str) -> Result<Option<String>, DecodeError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
        Some(_) => Err(DecodeError::FieldType(key)),
    }
}

/// Text bound for one target language
///
/// Holds the extracted text before translation and the translated text after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationMessage {
    pub text: String,
    pub filename: String,
    pub lang: String,
}

impl TranslationMessage {
    pub fn new(
        text: impl Into<String>,
        filename: impl Into<String>,
        lang: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            filename: filename.into(),
            lang: lang.into(),
        }
    }
}

impl PubsubPayload for TranslationMessage {}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("field {0} is not a scalar value")]
    FieldType(&'static str),
}
