use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::error::Error;
use assert_cmd::Command;
use tempfile::tempdir;

#[test]
fn init_run_and_snapshot_show_round_trip() -> Result<(), Box<dyn Error>> {
    let tmp = tempdir()?;

    let mut init = Command::cargo_bin("hidra")?;
    init.args(["init", "demo"]).current_dir(tmp.path());
    init.assert().success();

    let workspace = tmp.path().join("demo");
    assert!(workspace.join("hidra.toml").exists());
    assert!(workspace.join("genomes").join("genome.hgl").exists());

    let snapshot_path = workspace.join("snapshots").join("after.json");
    let mut run = Command::cargo_bin("hidra")?;
    run.args([
        "--workspace",
        workspace.to_str().expect("utf8 path"),
        "run",
        "--ticks",
        "10",
        "--snapshot-out",
        snapshot_path.to_str().expect("utf8 path"),
    ]);
    run.assert().success().stdout(predicate::str::contains("ticks_run: 10"));

    assert!(snapshot_path.exists());

    let genome_path = workspace.join("genomes").join("genome.hgl");
    let mut show = Command::cargo_bin("hidra")?;
    show.args([
        "snapshot",
        "show",
        snapshot_path.to_str().expect("utf8 path"),
        genome_path.to_str().expect("utf8 path"),
        "--json",
    ]);
    show.assert().success().stdout(predicate::str::contains("\"current_tick\": 10"));

    Ok(())
}

#[test]
fn inspect_reports_missing_manifest_outside_a_workspace() -> Result<(), Box<dyn Error>> {
    let tmp = tempdir()?;
    let mut inspect = Command::cargo_bin("hidra")?;
    inspect.args(["--workspace", tmp.path().to_str().expect("utf8 path"), "inspect"]);
    inspect.assert().success().stdout(predicate::str::contains("no hidra.toml found"));
    Ok(())
}
