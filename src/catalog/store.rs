//! Validated, immutable prototype lookup shared by every run

use std::collections::HashMap;

use crate::algorithm::bitset::DomainSet;
use crate::catalog::prototype::{Prototype, PrototypeDef};
use crate::io::error::{Result, WfcError, WithPrototype, data_format};
use crate::spatial::direction::Direction;

/// How to treat neighbour lists that only one side of a pair declares
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SymmetryPolicy {
    /// Reject the catalog, naming the first one-sided pair
    #[default]
    Strict,
    /// Drop every one-sided pair so only mutual declarations remain
    Intersect,
}

/// Options applied while building a catalog
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CatalogOptions {
    /// Handling of asymmetric neighbour declarations
    pub symmetry: SymmetryPolicy,
    /// Remap rotations authored in the legacy convention
    pub legacy_rotation: bool,
}

/// Immutable lookup of prototypes keyed by id
///
/// Prototypes are stored sorted by id, so catalog indices do not depend on
/// the order definitions arrived in. Read-only after construction and safe
/// to share between concurrent runs.
#[derive(Clone, Debug)]
pub struct Catalog {
    prototypes: Vec<Prototype>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Validate definitions and compile their neighbour lists
    ///
    /// # Errors
    ///
    /// Returns a data-format error if:
    /// - No definitions are given, or two share an id
    /// - A weight is zero
    /// - A neighbour list names an id missing from the definitions
    /// - Neighbour lists are asymmetric under `SymmetryPolicy::Strict`
    pub fn from_definitions(
        mut definitions: Vec<PrototypeDef>,
        options: &CatalogOptions,
    ) -> Result<Self> {
        if definitions.is_empty() {
            return Err(data_format(&"catalog holds no prototypes"));
        }

        definitions.sort_by(|a, b| a.id.cmp(&b.id));

        let mut index = HashMap::with_capacity(definitions.len());
        for (i, definition) in definitions.iter().enumerate() {
            if index.insert(definition.id.clone(), i).is_some() {
                return Err(data_format(&"duplicate prototype id")).for_prototype(&definition.id);
            }
        }

        let capacity = definitions.len();
        let mut compatible = Vec::with_capacity(capacity);
        for definition in &definitions {
            let sets = compile_neighbours(definition, &index, capacity)
                .for_prototype(&definition.id)?;
            compatible.push(sets);
        }

        match options.symmetry {
            SymmetryPolicy::Strict => check_symmetry(&definitions, &compatible)?,
            SymmetryPolicy::Intersect => {
                let dropped = intersect_symmetric(&mut compatible);
                if dropped > 0 {
                    log::warn!("Dropped {dropped} one-sided neighbour declarations");
                }
            }
        }

        let prototypes: Vec<Prototype> = definitions
            .into_iter()
            .zip(compatible)
            .map(|(definition, sets)| build_prototype(definition, sets, options))
            .collect::<Result<_>>()?;

        let names: Vec<&str> = prototypes.iter().map(|p| p.id.as_str()).collect();
        let prototypes = prototypes
            .iter()
            .map(|prototype| with_resolved_names(prototype, &names))
            .collect();

        log::debug!("Built catalog with {capacity} prototypes");

        Ok(Self { prototypes, index })
    }

    /// Number of prototypes
    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    /// Test if the catalog holds no prototypes
    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }

    /// Prototype at a catalog index
    pub fn get(&self, index: usize) -> Option<&Prototype> {
        self.prototypes.get(index)
    }

    /// Prototype with the given id
    pub fn by_id(&self, id: &str) -> Option<&Prototype> {
        self.index_of(id).and_then(|index| self.get(index))
    }

    /// Catalog index of an id
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Catalog index of an id, failing for unknown ids
    ///
    /// # Errors
    ///
    /// Returns `UnknownPrototype` if the id is not in the catalog
    pub fn require(&self, id: &str) -> Result<usize> {
        self.index_of(id).ok_or_else(|| WfcError::UnknownPrototype {
            id: id.to_string(),
        })
    }

    /// Selection weight at a catalog index, zero for unknown indices
    pub fn weight(&self, index: usize) -> u32 {
        self.get(index).map_or(0, Prototype::weight)
    }

    /// Iterate prototypes in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &Prototype> + '_ {
        self.prototypes.iter()
    }

    /// Union of compatible neighbours over a domain towards `direction`
    ///
    /// This is the set a cell holding `domain` permits in its neighbour.
    pub fn allowed_neighbours(&self, domain: &DomainSet, direction: Direction) -> DomainSet {
        let mut allowed = DomainSet::new(self.len());
        for index in domain.iter() {
            if let Some(prototype) = self.get(index) {
                allowed.union_with(prototype.compatible(direction));
            }
        }
        allowed
    }
}

fn compile_neighbours(
    definition: &PrototypeDef,
    index: &HashMap<String, usize>,
    capacity: usize,
) -> Result<[DomainSet; 6]> {
    let mut sets: [DomainSet; 6] = std::array::from_fn(|_| DomainSet::new(capacity));
    for direction in Direction::ALL {
        let Some(set) = sets.get_mut(direction.index()) else {
            continue;
        };
        for neighbour in definition.neighbours(direction) {
            let Some(&target) = index.get(neighbour) else {
                return Err(data_format(&format!(
                    "neighbour '{neighbour}' listed towards {direction} does not exist"
                )));
            };
            set.insert(target);
        }
    }
    Ok(sets)
}

fn check_symmetry(definitions: &[PrototypeDef], compatible: &[[DomainSet; 6]]) -> Result<()> {
    for (a, sets) in compatible.iter().enumerate() {
        for direction in Direction::ALL {
            let Some(set) = sets.get(direction.index()) else {
                continue;
            };
            for b in set.iter() {
                let mutual = compatible
                    .get(b)
                    .and_then(|other| other.get(direction.opposite().index()))
                    .is_some_and(|back| back.contains(a));
                if !mutual {
                    let name = |i: usize| definitions.get(i).map_or("?", |d| d.id.as_str());
                    return Err(data_format(&format!(
                        "lists '{}' towards {direction} but '{}' does not list it towards {}",
                        name(b),
                        name(b),
                        direction.opposite()
                    )))
                    .for_prototype(name(a));
                }
            }
        }
    }
    Ok(())
}

/// Remove one-sided pairs, returning how many declarations were dropped
fn intersect_symmetric(compatible: &mut [[DomainSet; 6]]) -> usize {
    let mut one_sided = Vec::new();
    for (a, sets) in compatible.iter().enumerate() {
        for direction in Direction::ALL {
            let Some(set) = sets.get(direction.index()) else {
                continue;
            };
            for b in set.iter() {
                let mutual = compatible
                    .get(b)
                    .and_then(|other| other.get(direction.opposite().index()))
                    .is_some_and(|back| back.contains(a));
                if !mutual {
                    one_sided.push((a, direction, b));
                }
            }
        }
    }

    for &(a, direction, b) in &one_sided {
        if let Some(set) = compatible
            .get_mut(a)
            .and_then(|sets| sets.get_mut(direction.index()))
        {
            set.remove(b);
        }
    }
    one_sided.len()
}

fn build_prototype(
    definition: PrototypeDef,
    compatible: [DomainSet; 6],
    options: &CatalogOptions,
) -> Result<Prototype> {
    if definition.weight == 0 {
        return Err(data_format(&"weight must be positive")).for_prototype(&definition.id);
    }

    let rotation = if options.legacy_rotation {
        definition.rotation.from_legacy()
    } else {
        definition.rotation
    };

    Ok(Prototype {
        id: definition.id,
        mesh_name: definition.mesh_name,
        rotation,
        sockets: definition.sockets,
        constrain_to: definition.constrain_to,
        constrain_from: definition.constrain_from,
        weight: definition.weight,
        valid_neighbours: definition.valid_neighbours,
        compatible,
    })
}

/// Rewrite the id lists from the compiled sets so both always agree
fn with_resolved_names(prototype: &Prototype, names: &[&str]) -> Prototype {
    let valid_neighbours = std::array::from_fn(|d| {
        Direction::from_index(d)
            .map(|direction| {
                prototype
                    .compatible(direction)
                    .iter()
                    .filter_map(|i| names.get(i).map(|name| (*name).to_string()))
                    .collect()
            })
            .unwrap_or_default()
    });

    Prototype {
        valid_neighbours,
        ..prototype.clone()
    }
}
