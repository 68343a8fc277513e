//! Prototype catalog loading from JSON documents
//!
//! The document is an object keyed by prototype id:
//!
//! ```json
//! {
//!   "p0": {
//!     "mesh_name": "wall", "mesh_rotation": 1,
//!     "posX": "0", "negX": "0s", "posY": "-1", "negY": "-1", "posZ": "1", "negZ": "-1",
//!     "constrain_to": "bot", "constrain_from": "",
//!     "weight": 2,
//!     "valid_neighbours": [["p0"], ["p-1"], ["p0"], ["p-1"], [], []]
//!   }
//! }
//! ```

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde::de::{Deserializer, MapAccess, Visitor};

use crate::catalog::prototype::{LayerConstraint, PrototypeDef, Rotation};
use crate::catalog::store::{Catalog, CatalogOptions};
use crate::io::error::{Result, WfcError, WithPrototype, data_format};

/// One prototype entry exactly as it appears in the JSON document
#[derive(Debug, Deserialize)]
struct RawPrototype {
    mesh_name: String,
    mesh_rotation: i64,
    #[serde(default, rename = "posX")]
    pos_x: Option<String>,
    #[serde(default, rename = "posY")]
    pos_y: Option<String>,
    #[serde(default, rename = "negX")]
    neg_x: Option<String>,
    #[serde(default, rename = "negY")]
    neg_y: Option<String>,
    #[serde(default, rename = "posZ")]
    pos_z: Option<String>,
    #[serde(default, rename = "negZ")]
    neg_z: Option<String>,
    #[serde(default)]
    constrain_to: Option<String>,
    #[serde(default)]
    constrain_from: Option<String>,
    weight: i64,
    valid_neighbours: Vec<Vec<String>>,
}

impl RawPrototype {
    fn into_definition(self, id: String, legacy_rotation: bool) -> Result<PrototypeDef> {
        let rotation = u8::try_from(self.mesh_rotation)
            .ok()
            .and_then(Rotation::new)
            .ok_or_else(|| {
                data_format(&format!(
                    "mesh_rotation {} is outside 0..=3",
                    self.mesh_rotation
                ))
            })?;
        let rotation = if legacy_rotation {
            rotation.from_legacy()
        } else {
            rotation
        };

        if self.weight <= 0 {
            return Err(data_format(&format!(
                "weight {} must be positive",
                self.weight
            )));
        }
        let weight = u32::try_from(self.weight).map_err(|e| {
            data_format(&format!("weight {} is out of range: {e}", self.weight))
        })?;

        let valid_neighbours: [Vec<String>; 6] =
            self.valid_neighbours
                .try_into()
                .map_err(|lists: Vec<Vec<String>>| {
                    data_format(&format!(
                        "valid_neighbours must hold 6 lists, found {}",
                        lists.len()
                    ))
                })?;

        let constrain_to = LayerConstraint::parse(self.constrain_to.as_deref().unwrap_or(""))?;
        let constrain_from = LayerConstraint::parse(self.constrain_from.as_deref().unwrap_or(""))?;

        let sockets = [
            self.pos_x, self.pos_y, self.neg_x, self.neg_y, self.pos_z, self.neg_z,
        ]
        .map(Option::unwrap_or_default);

        Ok(PrototypeDef {
            id,
            mesh_name: self.mesh_name,
            rotation,
            sockets,
            constrain_to,
            constrain_from,
            weight,
            valid_neighbours,
        })
    }
}

/// Top-level document entries in source order, duplicate ids included
struct RawDocument(Vec<(String, RawPrototype)>);

struct RawDocumentVisitor;

impl<'de> Visitor<'de> for RawDocumentVisitor {
    type Value = RawDocument;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an object of prototypes keyed by id")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry::<String, RawPrototype>()? {
            entries.push(entry);
        }
        Ok(RawDocument(entries))
    }
}

impl<'de> Deserialize<'de> for RawDocument {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RawDocumentVisitor)
    }
}

/// Parse prototype definitions from a JSON document
///
/// Rotations are remapped here when `legacy_rotation` is set, so the
/// returned definitions already use the current convention.
///
/// # Errors
///
/// Returns a data-format error if the document is not valid JSON, a required
/// field is missing, or any field value is out of range. Repeated ids are
/// kept here and rejected when the catalog is built.
pub fn parse_definitions(json: &str, legacy_rotation: bool) -> Result<Vec<PrototypeDef>> {
    let RawDocument(raw) = serde_json::from_str(json).map_err(|e| data_format(&e))?;

    raw.into_iter()
        .map(|(id, prototype)| {
            prototype
                .into_definition(id.clone(), legacy_rotation)
                .for_prototype(&id)
        })
        .collect()
}

impl Catalog {
    /// Build a catalog from a JSON document
    ///
    /// # Errors
    ///
    /// Returns a data-format error for malformed documents or invalid
    /// prototype data
    pub fn from_json_str(json: &str, options: &CatalogOptions) -> Result<Self> {
        let definitions = parse_definitions(json, options.legacy_rotation)?;
        // Rotations were remapped while parsing
        let options = CatalogOptions {
            legacy_rotation: false,
            ..*options
        };
        Self::from_definitions(definitions, &options)
    }

    /// Build a catalog from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its content is invalid
    pub fn from_path(path: impl AsRef<Path>, options: &CatalogOptions) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| WfcError::FileSystem {
            path: path.to_path_buf(),
            operation: "read catalog",
            source,
        })?;

        let catalog = Self::from_json_str(&json, options)?;
        log::info!(
            "Loaded {} prototypes from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }
}
