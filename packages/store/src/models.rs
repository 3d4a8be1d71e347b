//! # Location entries
//!
//! Defines the records returned by [`crate::LocationRepository`]. They are
//! `Serialize + Deserialize` with camelCase field names, so the JSON stored in
//! the `locations` collection reads `userId`, `imageUri`, `dateAdded`.
//!
//! | Type | Represents |
//! |------|-----------|
//! | [`LocationRecord`] | One geotagged logbook entry. `id` stays empty until the store assigns one. |
//! | [`Visibility`] | Whether other users can discover the entry (`public`) or only its owner (`private`). |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dates::now_millis;
use crate::document::{Document, Snapshot};
use crate::error::StoreError;

/// Discoverability of a location entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(StoreError::InvalidRecord(format!(
                "Unknown visibility: {other}"
            ))),
        }
    }
}

/// A geotagged entry in a user's logbook.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    /// Store-assigned key; empty until persisted.
    #[serde(default)]
    pub id: String,
    /// Owner of the entry.
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Local or remote reference to a photo.
    #[serde(default)]
    pub image_uri: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    /// Creation time in epoch milliseconds.
    pub date_added: i64,
}

impl LocationRecord {
    /// A new, unsaved public entry stamped with the current time.
    pub fn new(user_id: &str, name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            id: String::new(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            description: String::new(),
            latitude,
            longitude,
            image_uri: None,
            visibility: Visibility::default(),
            date_added: now_millis(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_image_uri(mut self, uri: &str) -> Self {
        self.image_uri = Some(uri.to_string());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Override the creation stamp. Only meaningful before the record is saved.
    pub fn added_at(mut self, millis: i64) -> Self {
        self.date_added = millis;
        self
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Check the fields a save depends on.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.user_id.trim().is_empty() {
            return Err(StoreError::InvalidRecord("User not logged in".into()));
        }
        if self.name.trim().is_empty() {
            return Err(StoreError::InvalidRecord(
                "Please enter a location name".into(),
            ));
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(StoreError::InvalidRecord(format!(
                "Latitude out of range: {}",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(StoreError::InvalidRecord(format!(
                "Longitude out of range: {}",
                self.longitude
            )));
        }
        Ok(())
    }

    pub fn to_document(&self) -> Result<Document, StoreError> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(StoreError::Corrupt {
                id: self.id.clone(),
                reason: "record did not serialize to an object".into(),
            }),
        }
    }

    /// Decode a stored document; the snapshot id wins over any stored `id`.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        let id = snapshot.id;
        let mut record: LocationRecord =
            serde_json::from_value(serde_json::Value::Object(snapshot.data)).map_err(|e| {
                StoreError::Corrupt {
                    id: id.clone(),
                    reason: e.to_string(),
                }
            })?;
        record.id = id;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_uses_camel_case_fields() {
        let record = LocationRecord::new("u1", "Table Mountain", -33.96, 18.40)
            .with_visibility(Visibility::Private)
            .added_at(1_700_000_000_000);
        let doc = record.to_document().unwrap();

        assert_eq!(doc["userId"], "u1");
        assert_eq!(doc["visibility"], "private");
        assert_eq!(doc["dateAdded"], 1_700_000_000_000i64);
        assert!(doc.contains_key("imageUri"));
    }

    #[test]
    fn test_snapshot_id_overrides_stored_id() {
        let record = LocationRecord::new("u1", "Pier", 1.0, 2.0);
        let snapshot = Snapshot {
            id: "doc-42".into(),
            data: record.to_document().unwrap(),
        };
        let decoded = LocationRecord::from_snapshot(snapshot).unwrap();
        assert_eq!(decoded.id, "doc-42");
        assert_eq!(decoded.name, "Pier");
    }

    #[test]
    fn test_missing_visibility_defaults_to_public() {
        let mut data = LocationRecord::new("u1", "Pier", 1.0, 2.0).to_document().unwrap();
        data.remove("visibility");
        let decoded = LocationRecord::from_snapshot(Snapshot {
            id: "x".into(),
            data,
        })
        .unwrap();
        assert!(decoded.is_public());
    }

    #[test]
    fn test_validate() {
        assert!(LocationRecord::new("u1", "ok", 90.0, -180.0).validate().is_ok());
        assert!(LocationRecord::new("u1", "  ", 0.0, 0.0).validate().is_err());
        assert!(LocationRecord::new("", "name", 0.0, 0.0).validate().is_err());
        assert!(LocationRecord::new("u1", "n", 90.5, 0.0).validate().is_err());
        assert!(LocationRecord::new("u1", "n", 0.0, f64::NAN).validate().is_err());
    }

    #[test]
    fn test_visibility_parse() {
        assert_eq!("private".parse::<Visibility>().unwrap(), Visibility::Private);
        assert!("secret".parse::<Visibility>().is_err());
        assert_eq!(Visibility::Public.to_string(), "public");
    }
}
