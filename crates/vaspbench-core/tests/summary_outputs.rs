use std::fs;
use tempfile::TempDir;
use vaspbench_core::domain::{CalculationState, RunId, Site, StoredStructure, Structure};
use vaspbench_core::ledger::InMemoryLedger;
use vaspbench_core::outputs::{LOG_FILE_NAME, OutputCache, REPORT_FILE_NAME};
use vaspbench_core::params::{MagneticReference, MagneticReferenceTable, ParameterDeriver};
use vaspbench_core::planner::{ExperimentOverrides, PERTURBED_COLLECTION, RunPlanner, resolve};
use vaspbench_core::potentials::{PotentialData, PotentialFamily};
use vaspbench_core::store::FileStore;
use vaspbench_core::summary::SummaryRanker;

const IRON_REPORT: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<modeling>
 <kpoints>
  <varray name="kpointlist" >
   <v>       0.00000000       0.00000000       0.00000000 </v>
   <v>       0.25000000       0.00000000       0.00000000 </v>
   <v>       0.25000000       0.25000000       0.00000000 </v>
  </varray>
 </kpoints>
 <parameters>
  <separator name="electronic" >
   <i name="NELECT">     16.00000000</i>
   <i name="ENMAX">    634.00000000</i>
  </separator>
 </parameters>
 <calculation>
  <scstep>
   <energy>
    <i name="e_fr_energy">    -10.10000000 </i>
   </energy>
  </scstep>
  <scstep>
   <energy>
    <i name="e_fr_energy">    -16.45000000 </i>
   </energy>
  </scstep>
  <varray name="forces" >
   <v>       0.00000000       0.00000000       0.01000000 </v>
   <v>       0.00000000       0.00000000      -0.01000000 </v>
  </varray>
  <varray name="stress" >
   <v>      -1.50000000       0.00000000       0.00000000 </v>
   <v>       0.00000000      -1.50000000       0.00000000 </v>
   <v>       0.00000000       0.00000000      -1.50000000 </v>
  </varray>
  <energy>
   <i name="e_fr_energy">    -16.46278183 </i>
  </energy>
  <eigenvalues>
   <array>
    <set>
     <set comment="spin 1">
     </set>
     <set comment="spin 2">
     </set>
    </set>
   </array>
  </eigenvalues>
 </calculation>
</modeling>
"#;

const SILICON_REPORT: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<modeling>
 <parameters>
  <i name="NELECT">      8.00000000</i>
  <i name="ENMAX">    245.34500000</i>
 </parameters>
 <calculation>
  <scstep>
   <energy>
    <i name="e_fr_energy">    -10.80000000 </i>
   </energy>
  </scstep>
  <energy>
   <i name="e_fr_energy">    -10.84052731 </i>
  </energy>
  <eigenvalues>
   <array>
    <set>
     <set comment="spin 1">
     </set>
    </set>
   </array>
  </eigenvalues>
 </calculation>
</modeling>
"#;

const IRON_LOG: &str = "\
 Analysis of symmetry for initial positions (statically):
 Found     16 space group operations
 The static configuration has the point symmetry D_4h.
 The point group associated with its full space group is D_4h.

 Analysis of symmetry for initial positions (statically):
 Found     48 space group operations
 The static configuration has the point symmetry O_h .
 The point group associated with its full space group is O_h .

 Analysis of symmetry for dynamics (positions and initial velocities):
 Found     16 space group operations
                         Elapsed time (sec):      120.502
";

fn potential(full_name: &str, zval: f64, enmax: f64) -> PotentialData {
    PotentialData {
        name: String::new(),
        full_name: full_name.to_string(),
        zval,
        enmax,
        md5: format!("md5-{}", zval),
    }
}

fn structures() -> Vec<StoredStructure> {
    let cubic = |a: f64| [[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]];
    vec![
        StoredStructure {
            id: 7,
            structure: Structure::new(
                cubic(2.87),
                vec![
                    Site::new("Fe", [0.0, 0.0, 0.0]),
                    Site::new("Fe", [1.435, 1.435, 1.435]),
                ],
            ),
        },
        StoredStructure {
            id: 3,
            structure: Structure::new(
                cubic(5.43),
                vec![
                    Site::new("Si", [0.0, 0.0, 0.0]),
                    Site::new("Si", [1.3575, 1.3575, 1.3575]),
                ],
            ),
        },
    ]
}

/// Submits Fe2 (run 1) and Si2 (run 2) into group `bench`.
fn submitted_store(temp: &TempDir) -> FileStore {
    let store = FileStore::new(temp.path());
    store
        .write_collection(PERTURBED_COLLECTION, &structures())
        .expect("collection should be written");
    let mut family = PotentialFamily::new();
    family.insert("Si_GW", potential("PAW_PBE Si_GW 15Jun2001", 4.0, 245.0));
    family.insert("Fe_sv_GW", potential("PAW_PBE Fe_sv_GW 23Mar2010", 16.0, 317.0));
    store
        .write_family("PBE.54", &family)
        .expect("family should be written");
    let mut reference = MagneticReferenceTable::new();
    reference.insert("Si", MagneticReference { spin: false, magmom: 0.0 });
    reference.insert("Fe", MagneticReference { spin: true, magmom: 4.0 });
    store
        .write_magnetic_reference(&reference)
        .expect("reference table should be written");

    let overrides = ExperimentOverrides {
        computer: Some("deneb".to_string()),
        group_name: Some("bench".to_string()),
        potcar_family: Some("PBE.54".to_string()),
        ..ExperimentOverrides::default()
    };
    let config = resolve(None, None, &overrides).expect("config should resolve");
    let ledger = InMemoryLedger::new();
    let deriver = ParameterDeriver::new(store.magnetic_reference().expect("reference table"));
    RunPlanner::new(&store, &store, &store, &ledger, deriver)
        .run(&config)
        .expect("submission should succeed");
    store
}

fn finish(store: &FileStore, run_id: RunId, report: Option<&str>, log: Option<&str>) {
    let retrieved = store.run_dir(run_id).join("retrieved");
    fs::create_dir_all(&retrieved).expect("retrieved dir should be created");
    if let Some(report) = report {
        fs::write(retrieved.join(REPORT_FILE_NAME), report).expect("report should be written");
    }
    if let Some(log) = log {
        fs::write(retrieved.join(LOG_FILE_NAME), log).expect("log should be written");
    }

    let mut record = store
        .load_calculation(run_id)
        .expect("calculation should load");
    record.state = CalculationState::Finished;
    store
        .save_calculation(&record)
        .expect("calculation should be saved");
}

#[test]
fn finished_runs_are_ranked_and_reported() {
    let temp = TempDir::new().expect("tempdir should be created");
    let store = submitted_store(&temp);
    finish(&store, 1, Some(IRON_REPORT), Some(IRON_LOG));
    finish(&store, 2, Some(SILICON_REPORT), None);

    let mut cache = OutputCache::new();
    let report = SummaryRanker::new(&store)
        .render(&["bench".to_string()], &mut cache)
        .expect("summary should render");

    assert!(report.starts_with("Group: bench\n\n=== 2 - Si2 ===\n"));
    let iron_at = report.find("=== 1 - Fe2 ===").expect("iron block should be present");
    let iron = &report[iron_at..];
    for line in [
        "Number of atoms / electrons: 2/16",
        "Fe: PAW_PBE Fe_sv_GW 23Mar2010 (md5-16)",
        "Cutoff (rho/wfc) (eV): 634",
        "Computed k-points: 3",
        "Total energy (eV): -16.46278183",
        "Cell symmetries: 48",
        "VASP computed point group(s): D_4h (D_4h)",
        "Magnetic treatment: collinear-spin (2 spin components)",
        "Number of SCF iterations (total): 2 (2)",
        "Wall-clock time: 120.502",
    ] {
        assert!(iron.contains(line), "missing '{}' in:\n{}", line, iron);
    }

    let silicon = &report[..iron_at];
    assert!(silicon.contains("Total energy (eV): -10.84052731"));
    assert!(silicon.contains("Magnetic treatment: non-spin-polarized (1 spin components)"));
    assert!(silicon.contains("Number of SCF iterations (total): 1 (1)"));
    assert!(silicon.contains("Cell symmetries: n/a"));
    assert!(silicon.contains("Wall-clock time: n/a"));
}

#[test]
fn unfinished_runs_are_listed_with_a_skip_notice() {
    let temp = TempDir::new().expect("tempdir should be created");
    let store = submitted_store(&temp);
    finish(&store, 1, Some(IRON_REPORT), Some(IRON_LOG));

    let mut cache = OutputCache::new();
    let report = SummaryRanker::new(&store)
        .render(&["bench".to_string()], &mut cache)
        .expect("summary should render");

    let silicon_at = report.find("=== 2 - Si2 ===").expect("silicon block should be present");
    let iron_at = report.find("=== 1 - Fe2 ===").expect("iron block should be present");
    assert!(silicon_at < iron_at);
    let silicon = &report[silicon_at..iron_at];
    assert!(silicon.contains("Calculation state is TOSUBMIT: skipping"));
    assert!(!silicon.contains("Total energy"));
}

#[test]
fn truncated_report_is_skipped_not_fatal() {
    let temp = TempDir::new().expect("tempdir should be created");
    let store = submitted_store(&temp);
    finish(&store, 1, Some(&IRON_REPORT[..200]), Some(IRON_LOG));
    finish(&store, 2, Some(SILICON_REPORT), None);

    let mut cache = OutputCache::new();
    let report = SummaryRanker::new(&store)
        .render(&["bench".to_string()], &mut cache)
        .expect("summary should render");

    let iron_at = report.find("=== 1 - Fe2 ===").expect("iron block should be present");
    assert!(report[iron_at..].contains("is truncated"));
    assert!(report[..iron_at].contains("Total energy (eV): -10.84052731"));
}

#[test]
fn corrupt_run_record_is_reported_and_the_rest_still_render() {
    let temp = TempDir::new().expect("tempdir should be created");
    let store = submitted_store(&temp);
    finish(&store, 2, Some(SILICON_REPORT), None);
    fs::write(store.run_dir(1).join("calculation.json"), "{ not json")
        .expect("record should be overwritten");

    let mut cache = OutputCache::new();
    let report = SummaryRanker::new(&store)
        .render(&["bench".to_string()], &mut cache)
        .expect("a corrupt record should not fail the summary");

    let corrupt_at = report.find("=== 1 - unreadable ===").expect("corrupt run is listed");
    let silicon_at = report.find("=== 2 - Si2 ===").expect("silicon block should be present");
    assert!(corrupt_at < silicon_at);
    let corrupt = &report[corrupt_at..silicon_at];
    assert!(corrupt.contains("Calculation record could not be read (failed to parse store file"));
    assert!(corrupt.contains(": skipping"));
    assert!(report[silicon_at..].contains("Total energy (eV): -10.84052731"));
}

#[test]
fn missing_run_record_is_reported_and_the_rest_still_render() {
    let temp = TempDir::new().expect("tempdir should be created");
    let store = submitted_store(&temp);
    finish(&store, 1, Some(IRON_REPORT), Some(IRON_LOG));
    fs::remove_file(store.run_dir(2).join("calculation.json"))
        .expect("record should be removed");

    let mut cache = OutputCache::new();
    let report = SummaryRanker::new(&store)
        .render(&["bench".to_string()], &mut cache)
        .expect("a missing record should not fail the summary");

    assert!(report.contains(
        "=== 2 - unreadable ===\n\
         Calculation record could not be read (run 2 does not exist): skipping"
    ));
    assert!(report.contains("Total energy (eV): -16.46278183"));
}

#[test]
fn finished_run_without_retrieved_outputs_is_skipped() {
    let temp = TempDir::new().expect("tempdir should be created");
    let store = submitted_store(&temp);
    finish(&store, 2, Some(SILICON_REPORT), None);
    let mut record = store.load_calculation(1).expect("calculation should load");
    record.state = CalculationState::Finished;
    store
        .save_calculation(&record)
        .expect("calculation should be saved");

    let mut cache = OutputCache::new();
    let report = SummaryRanker::new(&store)
        .render(&["bench".to_string()], &mut cache)
        .expect("summary should render");

    let iron_at = report.find("=== 1 - Fe2 ===").expect("iron block should be present");
    let iron = &report[iron_at..];
    assert!(iron.contains(
        "vasprun.xml could not be read (run has no retrieved output directory): skipping"
    ));
    assert!(!iron.contains("Total energy"));
    assert!(!iron.contains("Calculation state is"));
    assert!(report[..iron_at].contains("Total energy (eV): -10.84052731"));
}

#[test]
fn unknown_group_fails_the_whole_summary() {
    let temp = TempDir::new().expect("tempdir should be created");
    let store = submitted_store(&temp);

    let mut cache = OutputCache::new();
    let error = SummaryRanker::new(&store)
        .render(&["bench".to_string(), "missing".to_string()], &mut cache)
        .expect_err("unknown group should fail");
    assert_eq!(error.placeholder(), "INPUT.UNKNOWN_GROUP");
}
