use super::CliError;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use vaspbench_core::domain::{BenchError, BenchResult};
use vaspbench_core::planner::{Dispatch, ExperimentFile, RunOutcome};
use vaspbench_core::serialization::to_json_artifact;

#[derive(Debug, Clone)]
pub(super) struct LoadedExperiment {
    pub(super) file: ExperimentFile,
    /// Directory relative `outfile` paths are resolved against.
    pub(super) dir: PathBuf,
}

/// `RUST_LOG` wins; otherwise warnings only, raised by each `-v`.
pub(super) fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub(super) fn current_working_dir() -> BenchResult<PathBuf> {
    std::env::current_dir().map_err(|source| {
        BenchError::io_system(
            "IO.CLI_CURRENT_DIR",
            format!("failed to read current working directory: {}", source),
        )
    })
}

pub(super) fn resolve_cli_path(working_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    }
}

pub(super) fn store_root(working_dir: &Path, store: Option<&Path>) -> PathBuf {
    store.map_or_else(
        || working_dir.to_path_buf(),
        |store| resolve_cli_path(working_dir, store),
    )
}

pub(super) fn load_experiment(
    working_dir: &Path,
    path: &Path,
) -> Result<LoadedExperiment, CliError> {
    let path = resolve_cli_path(working_dir, path);
    let source = fs::read_to_string(&path)
        .with_context(|| format!("failed to read experiment file '{}'", path.display()))?;
    let file = ExperimentFile::from_yaml_str(&source)?;
    let dir = path
        .parent()
        .map_or_else(|| working_dir.to_path_buf(), Path::to_path_buf);
    Ok(LoadedExperiment { file, dir })
}

pub(super) fn render_outcome(outcome: &RunOutcome) -> Result<String, CliError> {
    let mut rendered = String::new();
    rendered.push_str(&format!("{}\n", outcome.group_message()));

    for dispatch in &outcome.dispatches {
        match dispatch {
            Dispatch::DryRun { formula, bundle } => {
                let json = to_json_artifact(bundle.as_ref())
                    .with_context(|| format!("failed to render inputs for {}", formula))?;
                rendered.push_str(&format!("not submitting {}\n", formula));
                rendered.push_str(&json);
            }
            Dispatch::Submitted {
                structure_id,
                formula,
                run_id,
            } => {
                rendered.push_str(&format!(
                    "submitted {} (structure {}) as run {}\n",
                    formula, structure_id, run_id
                ));
            }
        }
    }

    if !outcome.dry_run {
        rendered.push_str(&format!(
            "recorded {} runs in {}\n",
            outcome.submitted_count(),
            outcome.ledger_location
        ));
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::{load_experiment, render_outcome, resolve_cli_path, store_root};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;
    use vaspbench_core::planner::{Dispatch, RunOutcome};

    #[test]
    fn relative_paths_resolve_against_the_working_directory() {
        let working_dir = Path::new("/work");
        assert_eq!(
            resolve_cli_path(working_dir, Path::new("store")),
            Path::new("/work/store")
        );
        assert_eq!(
            resolve_cli_path(working_dir, Path::new("/abs/store")),
            Path::new("/abs/store")
        );
        assert_eq!(store_root(working_dir, None), Path::new("/work"));
    }

    #[test]
    fn experiment_directory_is_the_file_parent() {
        let temp = TempDir::new().expect("tempdir should be created");
        let nested = temp.path().join("exp");
        fs::create_dir_all(&nested).expect("nested dir should be created");
        fs::write(nested.join("experiment.yaml"), "computer: deneb\n")
            .expect("experiment should be written");

        let loaded = load_experiment(temp.path(), Path::new("exp/experiment.yaml"))
            .expect("experiment should load");
        assert_eq!(loaded.dir, nested);
        assert_eq!(loaded.file.computer.as_deref(), Some("deneb"));

        assert!(load_experiment(temp.path(), Path::new("missing.yaml")).is_err());
    }

    #[test]
    fn submitted_outcome_lists_runs_and_ledger() {
        let outcome = RunOutcome {
            group_name: "bench".to_string(),
            group_created: false,
            dry_run: false,
            ledger_location: "/work/run_info.json".to_string(),
            dispatches: vec![Dispatch::Submitted {
                structure_id: 3,
                formula: "Si2".to_string(),
                run_id: 101,
            }],
            ledger: None,
        };

        let rendered = render_outcome(&outcome).expect("outcome should render");
        assert_eq!(
            rendered,
            "Appending to existing group bench.\n\
             submitted Si2 (structure 3) as run 101\n\
             recorded 1 runs in /work/run_info.json\n"
        );
    }
}
