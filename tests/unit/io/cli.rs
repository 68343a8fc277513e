//! Tests for command-line parsing, derived paths and end-to-end runs

#[cfg(test)]
mod tests {
    use crate::common::WALL_JSON;
    use clap::Parser;
    use collapse3d::WfcError;
    use collapse3d::algorithm::executor::RunOutcome;
    use collapse3d::catalog::SymmetryPolicy;
    use collapse3d::io::cli::{Cli, Runner};
    use collapse3d::io::configuration::{DEFAULT_MAX_ATTEMPTS, DEFAULT_SEED};
    use collapse3d::spatial::GridSize;
    use std::ffi::OsString;
    use std::path::{Path, PathBuf};

    fn write_catalog(dir: &Path) -> PathBuf {
        let path = dir.join("walls.json");
        std::fs::write(&path, WALL_JSON).expect("catalog written");
        path
    }

    fn cli_for(catalog: &Path, output: Option<&Path>, flags: &[&str]) -> Cli {
        let mut args = vec![OsString::from("program"), catalog.as_os_str().to_owned()];
        if let Some(output) = output {
            args.push(OsString::from("-o"));
            args.push(output.as_os_str().to_owned());
        }
        args.extend(flags.iter().map(OsString::from));
        Cli::parse_from(args)
    }

    // Tests CLI parsing with only the required catalog argument
    // Verified by changing default values to ensure defaults are used
    #[test]
    fn test_cli_parse_minimal_args() {
        let cli = Cli::parse_from(["program", "tiles.json"]);

        assert_eq!(cli.catalog, PathBuf::from("tiles.json"));
        assert_eq!(cli.seed, DEFAULT_SEED);
        assert_eq!(cli.size, GridSize::new(8, 3, 8));
        assert_eq!(cli.void_id, "p-1");
        assert_eq!(cli.attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(cli.regions, 1);
        assert_eq!(cli.max_steps, None);
        assert!(!cli.quiet);
        assert!(cli.should_show_progress());
        assert!(cli.run_config().settle_boundaries);
    }

    // Tests CLI parsing with every available argument
    // Verified by modifying custom parsers to ensure they're invoked
    #[test]
    fn test_cli_parse_all_args() {
        let cli = Cli::parse_from([
            "program",
            "tiles.json",
            "--seed",
            "7",
            "--size",
            "4X2x5",
            "--void-id",
            "air",
            "-a",
            "3",
            "-r",
            "2",
            "--max-steps",
            "12",
            "--no-settle",
            "--repair-asymmetry",
            "--legacy-rotation",
            "-o",
            "out/run.json",
            "-p",
            "-v",
            "-q",
        ]);

        assert_eq!(cli.seed, 7);
        assert_eq!(cli.size, GridSize::new(4, 2, 5));
        assert_eq!(cli.void_id, "air");
        assert_eq!(cli.attempts, 3);
        assert_eq!(cli.regions, 2);
        assert!(cli.preview && cli.visualize && cli.quiet);
        assert!(!cli.should_show_progress());

        let options = cli.catalog_options();
        assert_eq!(options.symmetry, SymmetryPolicy::Intersect);
        assert!(options.legacy_rotation);

        let config = cli.run_config();
        assert!(!config.settle_boundaries);
        assert_eq!(config.max_steps, Some(12));
        assert_eq!(config.void_id, "air");
    }

    // Tests malformed sizes are rejected at parse time
    // Verified by falling back to the default size
    #[test]
    fn test_cli_rejects_bad_size() {
        assert!(Cli::try_parse_from(["program", "tiles.json", "--size", "4x4"]).is_err());
        assert!(Cli::try_parse_from(["program", "tiles.json", "--size", "0x1x1"]).is_err());
        assert!(Cli::try_parse_from(["program"]).is_err());
    }

    // Tests region seeds are spaced by the attempt count
    // Verified by spacing regions one seed apart
    #[test]
    fn test_region_seeds() {
        let cli = Cli::parse_from(["program", "t.json", "-s", "10", "-a", "3", "-r", "3"]);
        assert_eq!(cli.region_seeds(), vec![10, 13, 16]);

        let single = Cli::parse_from(["program", "t.json", "-s", "5"]);
        assert_eq!(single.region_seeds(), vec![5]);
    }

    // Tests output paths derive from the catalog and output names
    // Verified by placing outputs in the working directory
    #[test]
    fn test_output_paths() {
        let cli = Cli::parse_from(["program", "data/tiles.json"]);
        assert_eq!(cli.output_path(), PathBuf::from("data/tiles_placements.json"));
        assert_eq!(
            cli.preview_path(),
            PathBuf::from("data/tiles_placements_preview.png")
        );
        assert_eq!(
            cli.visualization_path(),
            PathBuf::from("data/tiles_placements_visualization.gif")
        );

        let named = Cli::parse_from(["program", "data/tiles.json", "-o", "out/run.json"]);
        assert_eq!(named.output_path(), PathBuf::from("out/run.json"));
        assert_eq!(named.preview_path(), PathBuf::from("out/run_preview.png"));
    }

    // Tests a full run writes placements, preview and visualization
    // Verified by skipping exports after solving
    #[test]
    fn test_runner_writes_outputs() {
        let dir = tempfile::tempdir().expect("temp dir");
        let catalog = write_catalog(dir.path());
        let output = dir.path().join("out.json");
        let cli = cli_for(&catalog, Some(&output), &["-q", "--size", "3x2x3", "-p", "-v"]);
        let preview = cli.preview_path();
        let visualization = cli.visualization_path();

        let reports = Runner::new(cli).process().expect("run succeeds");
        let [report] = reports.as_slice() else {
            unreachable!("one region produces one report");
        };
        assert_eq!(report.outcome, RunOutcome::Collapsed);
        assert_eq!(report.placements.len(), 18);

        assert!(output.exists());
        assert!(preview.exists());
        assert!(visualization.exists());
    }

    // Tests several regions write one document each and numbered previews
    // Verified by writing only the first region
    #[test]
    fn test_runner_regions() {
        let dir = tempfile::tempdir().expect("temp dir");
        let catalog = write_catalog(dir.path());
        let output = dir.path().join("regions.json");
        let cli = cli_for(&catalog, Some(&output), &["-q", "--size", "2x2x2", "-r", "3", "-p"]);

        let reports = Runner::new(cli).process().expect("run succeeds");
        assert_eq!(reports.len(), 3);

        let text = std::fs::read_to_string(&output).expect("output written");
        let value: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(value.as_array().map(Vec::len), Some(3));
        for index in 0..3 {
            assert!(dir.path().join(format!("regions_preview_{index}.png")).exists());
        }
    }

    // Tests zero regions and missing catalogs are reported as errors
    // Verified by treating zero regions as one
    #[test]
    fn test_runner_errors() {
        let dir = tempfile::tempdir().expect("temp dir");
        let catalog = write_catalog(dir.path());

        let no_regions = cli_for(&catalog, None, &["-q", "-r", "0"]);
        assert!(matches!(
            Runner::new(no_regions).process(),
            Err(WfcError::InvalidParameter { .. })
        ));

        let missing = cli_for(&dir.path().join("missing.json"), None, &["-q"]);
        assert!(matches!(
            Runner::new(missing).process(),
            Err(WfcError::FileSystem { .. })
        ));
    }
}
