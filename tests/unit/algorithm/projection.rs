//! Tests for reading grids into placement records

#[cfg(test)]
mod tests {
    use crate::common::{build, open_definition, single_catalog, terrain_catalog};
    use collapse3d::WfcError;
    use collapse3d::algorithm::bitset::DomainSet;
    use collapse3d::algorithm::projection::{PlacementRecord, project, project_final};
    use collapse3d::catalog::Rotation;
    use collapse3d::spatial::{Coord, Grid, GridSize};

    fn record(rotation: u8) -> PlacementRecord {
        PlacementRecord {
            position: Coord::new(1, 2, 3),
            prototype_id: "p4".to_string(),
            mesh_name: "stairs".to_string(),
            rotation: Rotation::new(rotation).expect("in range"),
            prototype: 4,
        }
    }

    // Tests an untouched grid projects to undetermined cells only
    // Verified by emitting records for multi-candidate cells
    #[test]
    fn test_project_undecided_grid() {
        let catalog = terrain_catalog();
        let grid = Grid::new(GridSize::new(2, 2, 1), &catalog).expect("grid");
        let projection = project(&grid, &catalog);

        assert!(projection.placements.is_empty());
        assert_eq!(projection.undetermined.len(), 4);
        assert!(projection.contradicted.is_empty());
        assert!(!projection.is_complete());
    }

    // Tests collapsed cells carry the prototype's id, mesh and rotation
    // Verified by reading the mesh from the wrong catalog index
    #[test]
    fn test_project_collapsed_cells() {
        let turned = open_definition("arch", 1, &["arch", "p-1"])
            .with_rotation(Rotation::new(2).expect("in range"));
        let catalog = build(vec![turned, open_definition("p-1", 1, &["arch", "p-1"])]);
        let mut grid = Grid::new(GridSize::new(2, 1, 1), &catalog).expect("grid");
        let arch = catalog.require("arch").expect("present");
        *grid.domain_mut(Coord::new(1, 0, 0)).expect("in bounds") = DomainSet::single(2, arch);

        let projection = project(&grid, &catalog);
        assert_eq!(projection.undetermined, vec![Coord::new(0, 0, 0)]);
        assert_eq!(
            projection.placements,
            vec![PlacementRecord {
                position: Coord::new(1, 0, 0),
                prototype_id: "arch".to_string(),
                mesh_name: "arch_mesh".to_string(),
                rotation: Rotation::new(2).expect("in range"),
                prototype: arch,
            }]
        );
    }

    // Tests empty cells are listed as contradicted
    // Verified by folding empty cells into the undetermined list
    #[test]
    fn test_project_contradicted_cells() {
        let catalog = terrain_catalog();
        let mut grid = Grid::new(GridSize::new(2, 1, 1), &catalog).expect("grid");
        *grid.domain_mut(Coord::new(0, 0, 0)).expect("in bounds") = DomainSet::new(4);

        let projection = project(&grid, &catalog);
        assert_eq!(projection.contradicted, vec![Coord::new(0, 0, 0)]);
        assert_eq!(projection.undetermined, vec![Coord::new(1, 0, 0)]);
    }

    // Tests the final projection insists on a collapsed grid
    // Verified by returning partial placements
    #[test]
    fn test_project_final() {
        let single = single_catalog();
        let grid = Grid::new(GridSize::new(2, 2, 2), &single).expect("grid");
        let placements = project_final(&grid, &single).expect("every cell collapsed");
        assert_eq!(placements.len(), 8);
        assert_eq!(placements.first().map(|p| p.position), Some(Coord::new(0, 0, 0)));
        assert_eq!(placements.last().map(|p| p.position), Some(Coord::new(1, 1, 1)));

        let catalog = terrain_catalog();
        let mut open = Grid::new(GridSize::new(1, 1, 2), &catalog).expect("grid");
        match project_final(&open, &catalog) {
            Err(WfcError::InvariantViolation { reason }) => assert!(reason.contains("not collapsed")),
            other => unreachable!("expected InvariantViolation, got {other:?}"),
        }

        *open.domain_mut(Coord::new(0, 0, 1)).expect("in bounds") = DomainSet::new(4);
        match project_final(&open, &catalog) {
            Err(WfcError::InvariantViolation { reason }) => assert!(reason.contains("(0, 0, 1)")),
            other => unreachable!("expected InvariantViolation, got {other:?}"),
        }
    }

    // Tests yaw and world placement helpers
    // Verified by dividing by the spacing
    #[test]
    fn test_record_helpers() {
        assert_eq!(record(3).yaw_degrees(), 270);
        assert_eq!(record(0).world_position(2.0), [2.0, 4.0, 6.0]);
    }

    // Tests the serialized form exposes placement fields only
    // Verified by serializing the catalog index
    #[test]
    fn test_record_serialization() {
        let value = serde_json::to_value(record(1)).expect("serializes");
        assert_eq!(
            value,
            serde_json::json!({
                "position": { "x": 1, "y": 2, "z": 3 },
                "prototype_id": "p4",
                "mesh_name": "stairs",
                "rotation": 1
            })
        );
    }
}
