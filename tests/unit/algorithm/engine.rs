//! Tests for the observe, collapse and propagate state machine

#[cfg(test)]
mod tests {
    use crate::common::{VOID, isolated_catalog, single_catalog, terrain_catalog};
    use collapse3d::WfcError;
    use collapse3d::algorithm::bitset::DomainSet;
    use collapse3d::algorithm::boundary::apply_boundary_constraints;
    use collapse3d::algorithm::engine::{ConstraintEngine, Contradiction, EngineState, StepResult};
    use collapse3d::algorithm::selection::RandomSelector;
    use collapse3d::catalog::Catalog;
    use collapse3d::spatial::{Coord, Grid, GridSize};

    fn engine_for(catalog: &Catalog, size: GridSize, seed: u64) -> ConstraintEngine<'_> {
        let grid = Grid::new(size, catalog).expect("grid");
        ConstraintEngine::new(grid, catalog, RandomSelector::new(seed))
    }

    fn possible_ids(engine: &ConstraintEngine<'_>, coord: Coord) -> Vec<String> {
        engine
            .possibilities(coord)
            .map(|map| map.keys().map(|id| (*id).to_string()).collect())
            .unwrap_or_default()
    }

    // Tests a fresh engine starts Ready with nothing collapsed
    // Verified by starting in Iterating
    #[test]
    fn test_initial_state() {
        let catalog = terrain_catalog();
        let engine = engine_for(&catalog, GridSize::new(2, 2, 2), 1);
        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(engine.collapse_count(), 0);
        assert_eq!(engine.collapsed_cells(), 0);
        assert!(!engine.is_collapsed());
    }

    // Tests a single self-compatible prototype collapses on the first step
    // Verified by collapsing a cell before checking for undecided cells
    #[test]
    fn test_single_cell_collapses_immediately() {
        let catalog = single_catalog();
        let mut engine = engine_for(&catalog, GridSize::new(1, 1, 1), 5);

        assert_eq!(engine.iterate(), StepResult::Collapsed);
        assert_eq!(engine.state(), EngineState::Collapsed);
        assert!(engine.is_collapsed());
        assert_eq!(engine.collapse_count(), 0);
    }

    // Tests two cells that accept no neighbour contradict on the first step
    // Verified by skipping propagation after the collapse
    #[test]
    fn test_incompatible_pair_contradicts() {
        let catalog = isolated_catalog();
        let mut engine = engine_for(&catalog, GridSize::new(2, 1, 1), 3);

        let StepResult::Contradiction(contradiction) = engine.iterate() else {
            unreachable!("an isolated pair cannot be placed side by side");
        };
        assert_eq!(contradiction.step, 1);
        assert_eq!(engine.state(), EngineState::Contradiction(contradiction));

        let mut replay = engine_for(&catalog, GridSize::new(2, 1, 1), 3);
        assert_eq!(replay.iterate(), StepResult::Contradiction(contradiction));
    }

    // Tests the collapsed cell count includes the cell collapsed in a failing step
    // Verified by counting collapsed cells only after settled steps
    #[test]
    fn test_contradiction_step_counts_collapsed_cells() {
        let catalog = isolated_catalog();
        let mut engine = engine_for(&catalog, GridSize::new(2, 1, 1), 3);

        assert!(matches!(engine.iterate(), StepResult::Contradiction(_)));
        assert_eq!(engine.collapsed_cells(), 1);
        assert_eq!(engine.collapsed_cells(), engine.grid().collapsed_count());
        assert!(!engine.is_collapsed());

        let mut banned = engine_for(&catalog, GridSize::new(2, 1, 1), 3);
        let coord = Coord::new(0, 0, 0);
        assert!(matches!(banned.ban(coord, "a"), Ok(Some(_))));
        assert_eq!(banned.collapsed_cells(), banned.grid().collapsed_count());
    }

    // Tests terminal states are sticky and leave the grid alone
    // Verified by resetting the state after reporting it
    #[test]
    fn test_terminal_states_are_sticky() {
        let catalog = isolated_catalog();
        let mut engine = engine_for(&catalog, GridSize::new(2, 1, 1), 8);
        let first = engine.iterate();
        let counts: Vec<usize> = engine.grid().cells().map(|c| c.domain.count()).collect();

        for _ in 0..3 {
            assert_eq!(engine.iterate(), first);
        }
        let after: Vec<usize> = engine.grid().cells().map(|c| c.domain.count()).collect();
        assert_eq!(counts, after);
        assert_eq!(engine.collapse_count(), 1);
        assert!(first.is_terminal());
    }

    // Tests a progressed step reports the collapse and what it narrowed
    // Verified by omitting the collapsed cell from the narrowed list
    #[test]
    fn test_progress_event() {
        let catalog = terrain_catalog();
        let mut engine = engine_for(&catalog, GridSize::new(3, 3, 3), 21);

        let StepResult::Progressed(event) = engine.iterate() else {
            unreachable!("the first step on a full terrain grid makes progress");
        };
        assert_eq!(event.narrowed.first(), Some(&event.coord));
        assert!(event.newly_collapsed.contains(&(event.coord, event.prototype)));
        assert_eq!(engine.state(), EngineState::Iterating);
        assert_eq!(engine.collapse_count(), 1);
        assert_eq!(engine.collapsed_cells(), event.newly_collapsed.len());
        assert!(engine.entropy(event.coord).is_some_and(|h| h.abs() < 1e-12));
        assert!(!StepResult::Progressed(event).is_terminal());
    }

    // Tests a grid handed over with an empty domain starts contradicted
    // Verified by only checking for contradictions during iterate
    #[test]
    fn test_empty_domain_on_creation() {
        let catalog = terrain_catalog();
        let mut grid = Grid::new(GridSize::new(2, 1, 1), &catalog).expect("grid");
        let coord = Coord::new(1, 0, 0);
        *grid.domain_mut(coord).expect("in bounds") = DomainSet::new(4);

        let mut engine = ConstraintEngine::new(grid, &catalog, RandomSelector::new(0));
        let expected = Contradiction { coord, step: 0 };
        assert_eq!(engine.state(), EngineState::Contradiction(expected));
        assert_eq!(engine.iterate(), StepResult::Contradiction(expected));
    }

    // Tests possibilities are keyed by id and bounds-checked
    // Verified by keying the map by catalog index
    #[test]
    fn test_possibilities() {
        let catalog = terrain_catalog();
        let engine = engine_for(&catalog, GridSize::new(1, 1, 1), 0);
        let possible = engine.possibilities(Coord::new(0, 0, 0)).expect("in bounds");
        let ids: Vec<&str> = possible.keys().copied().collect();
        assert_eq!(ids, vec!["dirt", "grass", "p-1", "tree"]);
        assert_eq!(possible.get("tree").map(|p| p.weight()), Some(1));

        assert!(matches!(
            engine.possibilities(Coord::new(1, 0, 0)),
            Err(WfcError::OutOfBounds { .. })
        ));
    }

    // Tests banning removes the prototype and propagates the change
    // Verified by removing without enqueueing the cell
    #[test]
    fn test_ban_propagates() {
        let catalog = terrain_catalog();
        let mut engine = engine_for(&catalog, GridSize::new(1, 2, 1), 0);
        let bottom = Coord::new(0, 0, 0);

        assert_eq!(engine.ban(bottom, "dirt").ok(), Some(None));
        assert_eq!(possible_ids(&engine, bottom), ["grass", "p-1", "tree"]);
        assert_eq!(possible_ids(&engine, Coord::new(0, 1, 0)), ["dirt", "p-1", "tree"]);

        // Banning again is a no-op
        assert_eq!(engine.ban(bottom, "dirt").ok(), Some(None));
    }

    // Tests ban argument errors
    // Verified by ignoring unknown ids
    #[test]
    fn test_ban_errors() {
        let catalog = terrain_catalog();
        let mut engine = engine_for(&catalog, GridSize::new(1, 1, 1), 0);
        assert!(matches!(
            engine.ban(Coord::new(0, 0, 0), "stone"),
            Err(WfcError::UnknownPrototype { .. })
        ));
        assert!(matches!(
            engine.ban(Coord::new(0, 4, 0), "dirt"),
            Err(WfcError::OutOfBounds { .. })
        ));

        let single = single_catalog();
        let mut finished = engine_for(&single, GridSize::new(1, 1, 1), 0);
        assert_eq!(finished.iterate(), StepResult::Collapsed);
        assert!(matches!(
            finished.ban(Coord::new(0, 0, 0), VOID),
            Err(WfcError::InvalidParameter { .. })
        ));
    }

    // Tests banning the last candidate records a contradiction
    // Verified by leaving the state untouched on empty domains
    #[test]
    fn test_ban_last_candidate() {
        let catalog = single_catalog();
        let mut engine = engine_for(&catalog, GridSize::new(1, 1, 1), 0);
        let coord = Coord::new(0, 0, 0);
        let expected = Contradiction { coord, step: 0 };

        assert_eq!(engine.ban(coord, VOID).ok(), Some(Some(expected)));
        assert_eq!(engine.state(), EngineState::Contradiction(expected));
    }

    // Tests settling propagates the boundary pass through the whole grid
    // Verified by settling only the first cell
    #[test]
    fn test_settle_after_boundary() {
        let catalog = terrain_catalog();
        let mut grid = Grid::new(GridSize::new(1, 2, 1), &catalog).expect("grid");
        apply_boundary_constraints(&mut grid, &catalog, VOID).expect("void exists");

        let mut engine = ConstraintEngine::new(grid, &catalog, RandomSelector::new(0));
        assert_eq!(engine.settle(), None);
        assert_eq!(possible_ids(&engine, Coord::new(0, 0, 0)), ["dirt", "p-1"]);
        assert_eq!(possible_ids(&engine, Coord::new(0, 1, 0)), ["grass", "p-1"]);
        assert_eq!(engine.state(), EngineState::Ready);
    }

    // Tests settling reports contradictions found without any collapse
    // Verified by discarding the settle outcome
    #[test]
    fn test_settle_contradiction() {
        let catalog = isolated_catalog();
        let mut engine = engine_for(&catalog, GridSize::new(2, 1, 1), 0);

        let contradiction = engine.settle().expect("no prototype fits next to another");
        assert_eq!(contradiction.step, 0);
        assert_eq!(engine.settle(), Some(contradiction));
        assert_eq!(engine.iterate(), StepResult::Contradiction(contradiction));
    }

    // Tests iterating to the end fills every cell
    // Verified by stopping when one cell remains
    #[test]
    fn test_runs_to_completion() {
        let catalog = terrain_catalog();
        let mut grid = Grid::new(GridSize::new(3, 3, 3), &catalog).expect("grid");
        apply_boundary_constraints(&mut grid, &catalog, VOID).expect("void exists");
        let mut engine = ConstraintEngine::new(grid, &catalog, RandomSelector::new(4));
        assert_eq!(engine.settle(), None);

        let mut steps = 0;
        while !engine.iterate().is_terminal() {
            steps += 1;
            assert!(steps <= 27, "more collapses than cells");
        }
        assert_eq!(engine.state(), EngineState::Collapsed);
        assert!(engine.is_collapsed());
        assert!(engine.grid().is_collapsed());
        assert_eq!(engine.collapse_count(), steps);
        assert_eq!(engine.collapsed_cells(), 27);

        let grid = engine.into_grid();
        assert_eq!(grid.collapsed_count(), 27);
    }
}
