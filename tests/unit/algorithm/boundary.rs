//! Tests for the edge and layer restriction pass

#[cfg(test)]
mod tests {
    use crate::common::{VOID, build, open_definition, terrain_catalog};
    use collapse3d::WfcError;
    use collapse3d::algorithm::boundary::{BoundaryReport, apply_boundary_constraints};
    use collapse3d::catalog::{Catalog, LayerConstraint, PrototypeDef};
    use collapse3d::spatial::{Coord, Grid, GridSize};

    fn ids(grid: &Grid, catalog: &Catalog, coord: Coord) -> Vec<String> {
        grid.domain(coord)
            .map(|domain| {
                domain
                    .iter()
                    .filter_map(|index| catalog.get(index).map(|p| p.id().to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn layered_catalog() -> Catalog {
        let everything = [VOID, "floor", "lamp", "pillar"];
        build(vec![
            open_definition(VOID, 1, &everything),
            open_definition("floor", 1, &everything).with_constrain_to(LayerConstraint::Bottom),
            open_definition("lamp", 1, &everything).with_constrain_to(LayerConstraint::Top),
            open_definition("pillar", 1, &everything).with_constrain_from(LayerConstraint::Top),
        ])
    }

    // Tests outer layers keep only prototypes that accept the void outwards
    // Verified by checking the inward direction instead of the outward one
    #[test]
    fn test_terrain_cube_edges() {
        let catalog = terrain_catalog();
        let mut grid = Grid::new(GridSize::new(3, 3, 3), &catalog).expect("grid");
        let report = apply_boundary_constraints(&mut grid, &catalog, VOID).expect("void exists");

        for coord in grid.coords().collect::<Vec<_>>() {
            let expected: &[&str] = match coord.y {
                0 => &["dirt", "p-1"],
                2 => &["grass", "p-1", "tree"],
                _ => &["dirt", "grass", "p-1", "tree"],
            };
            assert_eq!(ids(&grid, &catalog, coord), expected, "cell {coord}");
        }

        assert_eq!(
            report,
            BoundaryReport {
                cells_narrowed: 18,
                prototypes_removed: 27,
                batches_skipped: 0,
            }
        );
    }

    // Tests a second pass changes nothing
    // Verified by recomputing batches from the full catalog
    #[test]
    fn test_idempotent() {
        let catalog = terrain_catalog();
        let mut grid = Grid::new(GridSize::new(3, 3, 3), &catalog).expect("grid");
        apply_boundary_constraints(&mut grid, &catalog, VOID).expect("first pass");
        let before: Vec<Vec<String>> = grid.coords().map(|c| ids(&grid, &catalog, c)).collect();

        let second = apply_boundary_constraints(&mut grid, &catalog, VOID).expect("second pass");
        let after: Vec<Vec<String>> = grid.coords().map(|c| ids(&grid, &catalog, c)).collect();

        assert_eq!(second, BoundaryReport::default());
        assert_eq!(before, after);
    }

    // Tests constrain_to and constrain_from layer rules
    // Verified by swapping the top and bottom comparisons
    #[test]
    fn test_layer_constraints() {
        let catalog = layered_catalog();
        let mut grid = Grid::new(GridSize::new(1, 3, 1), &catalog).expect("grid");
        apply_boundary_constraints(&mut grid, &catalog, VOID).expect("void exists");

        assert_eq!(ids(&grid, &catalog, Coord::new(0, 0, 0)), ["floor", "p-1", "pillar"]);
        assert_eq!(ids(&grid, &catalog, Coord::new(0, 1, 0)), ["p-1", "pillar"]);
        assert_eq!(ids(&grid, &catalog, Coord::new(0, 2, 0)), ["lamp", "p-1"]);
    }

    // Tests batches that would empty a domain are skipped and counted
    // Verified by applying every batch unconditionally
    #[test]
    fn test_emptying_batches_skipped() {
        let catalog = build(vec![
            PrototypeDef::new(VOID, "void"),
            open_definition("block", 1, &["block"]),
        ]);
        let mut grid = Grid::new(GridSize::new(1, 1, 1), &catalog).expect("grid");
        let report = apply_boundary_constraints(&mut grid, &catalog, VOID).expect("void exists");

        assert_eq!(report.batches_skipped, 6);
        assert_eq!(report.cells_narrowed, 0);
        assert_eq!(ids(&grid, &catalog, Coord::new(0, 0, 0)).len(), 2);
    }

    // Tests an unknown void id is rejected before touching the grid
    // Verified by defaulting to catalog index 0
    #[test]
    fn test_unknown_void() {
        let catalog = terrain_catalog();
        let mut grid = Grid::new(GridSize::new(2, 2, 2), &catalog).expect("grid");
        let result = apply_boundary_constraints(&mut grid, &catalog, "nothing");
        assert!(matches!(result, Err(WfcError::UnknownPrototype { .. })));
        assert!(grid.cells().all(|cell| cell.domain.count() == 4));
    }
}
