//! Request and response bodies for the text search endpoint.

use crate::place::PlaceRecord;
use crate::rect::Rectangle;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field that must be present in the field mask for the endpoint to return
/// pagination cursors.
pub const NEXT_PAGE_TOKEN_FIELD: &str = "nextPageToken";

/// Fixed query parameters shared by every rectangle of a sweep.
///
/// The template never carries a location restriction or a cursor; those are
/// supplied per request by [`SearchRequestTemplate::for_rectangle`] and
/// [`SearchTextRequest::with_page_token`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequestTemplate {
    /// Free-text query, e.g. `"restaurant"`.
    pub text_query: String,
    /// Comma separated response field mask, sent as a header.
    pub field_mask: String,
    /// Other fixed body fields (`includedType`, `languageCode`, ...).
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl SearchRequestTemplate {
    pub fn new(text_query: impl Into<String>, field_mask: impl Into<String>) -> Self {
        Self {
            text_query: text_query.into(),
            field_mask: field_mask.into(),
            extra: Map::new(),
        }
    }

    /// Add a fixed body field. Keys owned by the request itself
    /// (`textQuery`, `locationRestriction`, `pageToken`) are overridden per
    /// request and should not be set here.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// The field mask with `nextPageToken` appended when missing.
    pub fn effective_field_mask(&self) -> String {
        let has_cursor = self
            .field_mask
            .split(',')
            .any(|field| field.trim() == NEXT_PAGE_TOKEN_FIELD);

        match (has_cursor, self.field_mask.trim().is_empty()) {
            (true, _) => self.field_mask.clone(),
            (false, true) => NEXT_PAGE_TOKEN_FIELD.to_string(),
            (false, false) => format!("{},{}", self.field_mask, NEXT_PAGE_TOKEN_FIELD),
        }
    }

    /// Build the first-page request for `rectangle`.
    pub fn for_rectangle(&self, rectangle: &Rectangle) -> SearchTextRequest {
        SearchTextRequest {
            text_query: self.text_query.clone(),
            location_restriction: LocationRestriction {
                rectangle: *rectangle,
            },
            page_token: None,
            extra: self.extra.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRestriction {
    pub rectangle: Rectangle,
}

/// One request body sent to the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTextRequest {
    pub text_query: String,
    pub location_restriction: LocationRestriction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchTextRequest {
    /// The same request positioned at `token`.
    pub fn with_page_token(&self, token: impl Into<String>) -> Self {
        Self {
            page_token: Some(token.into()),
            ..self.clone()
        }
    }

    pub fn rectangle(&self) -> &Rectangle {
        &self.location_restriction.rectangle
    }
}

/// One page of results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    #[serde(default)]
    pub places: Vec<PlaceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl PageResponse {
    /// The cursor for the following page, treating `""` as absent.
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_page_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}
