//! Prototype definitions: one tile variant with mesh, rotation, weight and adjacency

use serde::Serialize;

use crate::algorithm::bitset::DomainSet;
use crate::io::error::{Result, data_format};
use crate::spatial::direction::Direction;

/// Quarter turns about the vertical axis, always in `0..=3`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Rotation(u8);

impl Rotation {
    /// No rotation
    pub const IDENTITY: Self = Self(0);

    /// Rotation from a quarter-turn count, `None` outside `0..=3`
    pub const fn new(quarter_turns: u8) -> Option<Self> {
        if quarter_turns <= 3 {
            Some(Self(quarter_turns))
        } else {
            None
        }
    }

    /// Number of quarter turns
    pub const fn quarter_turns(self) -> u8 {
        self.0
    }

    /// Yaw in degrees as the mesh placement convention applies it
    pub const fn degrees(self) -> u16 {
        self.0 as u16 * 90
    }

    /// Remap a rotation authored in the legacy coordinate convention
    ///
    /// The two conventions turn in opposite senses, so one and three quarter
    /// turns swap while zero and two stay put.
    pub const fn from_legacy(self) -> Self {
        match self.0 {
            1 => Self(3),
            3 => Self(1),
            other => Self(other),
        }
    }
}

/// Layer restriction tag carried by `constrain_to` / `constrain_from`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerConstraint {
    /// The topmost layer of the grid
    Top,
    /// The lowest layer of the grid
    Bottom,
}

impl LayerConstraint {
    /// Parse a tag from prototype data; an empty tag means no constraint
    ///
    /// # Errors
    ///
    /// Returns a data-format error for unrecognised tags
    pub fn parse(tag: &str) -> Result<Option<Self>> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "top" => Ok(Some(Self::Top)),
            "bottom" | "bot" => Ok(Some(Self::Bottom)),
            other => Err(data_format(&format!(
                "unknown layer constraint '{other}' (expected 'top' or 'bottom')"
            ))),
        }
    }

    /// Canonical tag spelling
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

/// Unvalidated prototype description used to build a catalog
///
/// Neighbour lists name prototype ids per direction; the catalog resolves
/// and checks them when it is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrototypeDef {
    /// Unique prototype id
    pub id: String,
    /// Opaque mesh reference resolved by the renderer
    pub mesh_name: String,
    /// Mesh rotation about the vertical axis
    pub rotation: Rotation,
    /// Socket labels in direction order, informational only
    pub sockets: [String; 6],
    /// Layer this prototype is confined to
    pub constrain_to: Option<LayerConstraint>,
    /// Layer this prototype may never occupy
    pub constrain_from: Option<LayerConstraint>,
    /// Relative selection weight, must be positive
    pub weight: u32,
    /// Permitted neighbour ids in direction order
    pub valid_neighbours: [Vec<String>; 6],
}

impl PrototypeDef {
    /// Start a definition with unit weight, no rotation and no neighbours
    pub fn new(id: impl Into<String>, mesh_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mesh_name: mesh_name.into(),
            rotation: Rotation::IDENTITY,
            sockets: Default::default(),
            constrain_to: None,
            constrain_from: None,
            weight: 1,
            valid_neighbours: Default::default(),
        }
    }

    /// Set the selection weight
    #[must_use]
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// Set the mesh rotation
    #[must_use]
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the layer this prototype is confined to
    #[must_use]
    pub fn with_constrain_to(mut self, layer: LayerConstraint) -> Self {
        self.constrain_to = Some(layer);
        self
    }

    /// Set the layer this prototype may never occupy
    #[must_use]
    pub fn with_constrain_from(mut self, layer: LayerConstraint) -> Self {
        self.constrain_from = Some(layer);
        self
    }

    /// Replace the neighbour list for one direction
    #[must_use]
    pub fn with_neighbours<I, S>(mut self, direction: Direction, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(list) = self.valid_neighbours.get_mut(direction.index()) {
            *list = ids.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Neighbour list for one direction
    pub fn neighbours(&self, direction: Direction) -> &[String] {
        self.valid_neighbours
            .get(direction.index())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Immutable, validated prototype as stored in a catalog
#[derive(Clone, Debug)]
pub struct Prototype {
    pub(crate) id: String,
    pub(crate) mesh_name: String,
    pub(crate) rotation: Rotation,
    pub(crate) sockets: [String; 6],
    pub(crate) constrain_to: Option<LayerConstraint>,
    pub(crate) constrain_from: Option<LayerConstraint>,
    pub(crate) weight: u32,
    pub(crate) valid_neighbours: [Vec<String>; 6],
    /// `valid_neighbours` compiled to catalog indices
    pub(crate) compatible: [DomainSet; 6],
}

impl Prototype {
    /// Unique prototype id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Opaque mesh reference
    pub fn mesh_name(&self) -> &str {
        &self.mesh_name
    }

    /// Mesh rotation about the vertical axis
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Socket label for one face
    pub fn socket(&self, direction: Direction) -> &str {
        self.sockets
            .get(direction.index())
            .map_or("", String::as_str)
    }

    /// Layer this prototype is confined to
    pub const fn constrain_to(&self) -> Option<LayerConstraint> {
        self.constrain_to
    }

    /// Layer this prototype may never occupy
    pub const fn constrain_from(&self) -> Option<LayerConstraint> {
        self.constrain_from
    }

    /// Relative selection weight
    pub const fn weight(&self) -> u32 {
        self.weight
    }

    /// Ids permitted in the adjacent cell towards `direction`
    pub fn valid_neighbours(&self, direction: Direction) -> &[String] {
        self.valid_neighbours
            .get(direction.index())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Catalog indices permitted in the adjacent cell towards `direction`
    pub fn compatible(&self, direction: Direction) -> &DomainSet {
        match direction {
            Direction::PosX => &self.compatible[0],
            Direction::PosY => &self.compatible[1],
            Direction::NegX => &self.compatible[2],
            Direction::NegY => &self.compatible[3],
            Direction::PosZ => &self.compatible[4],
            Direction::NegZ => &self.compatible[5],
        }
    }
}
