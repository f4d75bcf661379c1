use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of one directive field. A selector that matched exactly one
/// element gives a scalar, more than one a list, zero serializes as null.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkEntry {
    pub href: String,
    pub text: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageEntry {
    pub src: String,
    pub alt: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// What came out of one page. Directive fields are always present in
/// `fields` (null included); the bulk captures only exist when the
/// directive asked for them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_links: Option<Vec<LinkEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_images: Option<Vec<ImageEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_tables: Option<Vec<Vec<Vec<String>>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FetchMethod {
    #[serde(rename = "rendered")]
    Rendered,
    #[serde(rename = "static-fallback")]
    StaticFallback,
}

/// One fetch, success or not. Page-load failures live in `error` with
/// `success: false`; they are never raised as errors past the fetcher.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedRecord {
    pub success: bool,
    pub url: String,
    pub method: FetchMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PageData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ExtractedRecord {
    pub fn captured(url: String, method: FetchMethod, data: PageData) -> Self {
        ExtractedRecord {
            success: true,
            url,
            method,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(url: String, method: FetchMethod, error: String) -> Self {
        ExtractedRecord {
            success: false,
            url,
            method,
            data: None,
            error: Some(error),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{FieldValue, PageData};

    #[test]
    fn null_fields_serialize_as_null_not_omitted() {
        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), FieldValue::Scalar("Hello".to_string()));
        fields.insert("missing".to_string(), FieldValue::Null);
        let data = PageData {
            fields,
            ..Default::default()
        };

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["title"], "Hello");
        assert!(json["missing"].is_null());
        assert!(json.get("missing").is_some());
    }

    #[test]
    fn list_fields_serialize_as_arrays() {
        let mut fields = BTreeMap::new();
        fields.insert(
            "headings".to_string(),
            FieldValue::List(vec!["One".to_string(), "Two".to_string()]),
        );
        let data = PageData {
            fields,
            ..Default::default()
        };

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["headings"][1], "Two");
    }

    #[test]
    fn bulk_captures_are_omitted_when_not_requested() {
        let data = PageData::default();
        let json = serde_json::to_value(&data).unwrap();

        assert!(json.get("allText").is_none());
        assert!(json.get("allLinks").is_none());
    }
}
