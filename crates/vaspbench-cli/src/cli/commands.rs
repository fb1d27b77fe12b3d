use super::CliError;
use super::helpers::{
    current_working_dir, load_experiment, render_outcome, resolve_cli_path, store_root,
};
use std::path::PathBuf;
use tracing::debug;
use vaspbench_core::ledger::JsonLedgerFile;
use vaspbench_core::outputs::OutputCache;
use vaspbench_core::params::ParameterDeriver;
use vaspbench_core::planner::{ExperimentOverrides, RunPlanner, TestSet, resolve};
use vaspbench_core::store::FileStore;
use vaspbench_core::summary::SummaryRanker;

#[derive(clap::Args, Default)]
pub(super) struct StoreArgs {
    /// Store directory holding structures, potentials, groups and runs
    #[arg(long, env = "VASPBENCH_STORE", value_name = "DIR")]
    store: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct RunArgs {
    /// Computer to submit to
    #[arg(long = "computer", value_name = "NAME")]
    computer: Option<String>,

    /// Use the perturbed structure set (default)
    #[arg(long, conflicts_with = "non_perturbed")]
    perturbed: bool,

    /// Use the unperturbed structure set
    #[arg(long)]
    non_perturbed: bool,

    /// Group collecting the submitted runs
    #[arg(long, value_name = "NAME")]
    group_name: Option<String>,

    /// Potential family to draw potentials from
    #[arg(long, value_name = "FAMILY")]
    potcar_family: Option<String>,

    /// Print the inputs that would be submitted without submitting anything
    #[arg(long)]
    dry_run: bool,

    /// YAML file describing the experiment
    #[arg(long, value_name = "FILE")]
    experiment: Option<PathBuf>,

    #[command(flatten)]
    store: StoreArgs,
}

impl RunArgs {
    fn test_set(&self) -> Option<TestSet> {
        if self.non_perturbed {
            Some(TestSet::NonPerturbed)
        } else if self.perturbed {
            Some(TestSet::Perturbed)
        } else {
            None
        }
    }
}

#[derive(clap::Args)]
pub(super) struct SummarizeArgs {
    /// Group to summarize; repeat for several groups
    #[arg(short = 'G', long = "group", value_name = "NAME", required = true)]
    groups: Vec<String>,

    #[command(flatten)]
    store: StoreArgs,
}

pub(super) fn run_run_command(args: RunArgs) -> Result<i32, CliError> {
    let working_dir = current_working_dir()?;
    let experiment = args
        .experiment
        .as_deref()
        .map(|path| load_experiment(&working_dir, path))
        .transpose()?;

    let overrides = ExperimentOverrides {
        computer: args.computer.clone(),
        test_set: args.test_set(),
        group_name: args.group_name.clone(),
        potcar_family: args.potcar_family.clone(),
        dry_run: args.dry_run,
    };
    let mut config = resolve(
        experiment.as_ref().map(|loaded| &loaded.file),
        experiment.as_ref().map(|loaded| loaded.dir.as_path()),
        &overrides,
    )?;
    config.ledger_path = resolve_cli_path(&working_dir, &config.ledger_path);

    if config.dry_run {
        println!(
            "run_info file would be created at {}",
            config.ledger_path.display()
        );
    }

    let store = FileStore::new(store_root(&working_dir, args.store.store.as_deref()));
    debug!(
        store = %store.root().display(),
        resource = %config.resource,
        group = %config.group_name,
        dry_run = config.dry_run,
        "resolved experiment"
    );
    let deriver = ParameterDeriver::new(store.magnetic_reference()?);
    let ledger = JsonLedgerFile::new(&config.ledger_path);
    let planner = RunPlanner::new(&store, &store, &store, &ledger, deriver);

    let outcome = planner.run(&config)?;
    print!("{}", render_outcome(&outcome)?);
    Ok(0)
}

pub(super) fn run_summarize_command(args: SummarizeArgs) -> Result<i32, CliError> {
    let working_dir = current_working_dir()?;
    let store = FileStore::new(store_root(&working_dir, args.store.store.as_deref()));
    debug!(store = %store.root().display(), groups = ?args.groups, "summarizing groups");
    let mut cache = OutputCache::new();

    let report = SummaryRanker::new(&store).render(&args.groups, &mut cache)?;
    print!("{}", report);
    Ok(0)
}
