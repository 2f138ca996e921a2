use crate::util::*;
use predicates::str::contains;
mod util;

#[test]
fn stats_json_to_stdout() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let tpc_file = write_two_lvl1_file(&tmp_d)?;
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.arg(tpc_file).arg("-S").arg("stdout").arg("-D").arg("json");
    cmd.assert().success();

    let stdout = cmd.output()?.stdout;
    match_on_output(&stdout, r#""time_frames": 2"#, 1)?;
    match_on_output(&stdout, r#""hits_output": 3"#, 1)?;
    match_on_output(&stdout, r#""run_number": 25926"#, 1)?;
    // The report is not printed when stats are written to stdout
    match_on_out_no_case(&stdout, "global stats", 0)?;

    Ok(())
}

#[test]
fn stats_toml_to_file_then_validate() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let tpc_file = write_two_lvl1_file(&tmp_d)?;
    let stats_file = tmp_d.child("stats.toml");

    let mut cmd = Command::cargo_bin("tpcframe")?;
    cmd.arg(&tpc_file)
        .arg("-S")
        .arg(stats_file.path())
        .arg("-D")
        .arg("toml");
    cmd.assert().success();
    stats_file.assert(contains("time_frames = 2"));

    let mut cmd = Command::cargo_bin("tpcframe")?;
    cmd.arg(&tpc_file).arg("-i").arg(stats_file.path()).arg("-E").arg("5");
    cmd.assert().success();
    match_on_out_no_case(&cmd.output()?.stderr, "mismatch", 0)?;

    Ok(())
}

#[test]
fn validate_mismatching_stats() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let tpc_file = write_two_lvl1_file(&tmp_d)?;
    let other_file = write_packet_file(&tmp_d, "one_lvl1.sprd", &[tpc_packet(0x1000, &[0])])?;
    let stats_file = tmp_d.child("stats.json");

    let mut cmd = Command::cargo_bin("tpcframe")?;
    cmd.arg(&tpc_file)
        .arg("-S")
        .arg(stats_file.path())
        .arg("-D")
        .arg("json");
    cmd.assert().success();

    let mut cmd = Command::cargo_bin("tpcframe")?;
    cmd.arg(&other_file)
        .arg("-i")
        .arg(stats_file.path())
        .arg("-E")
        .arg("5");
    cmd.assert()
        .code(5)
        .stderr(contains("time_frames mismatch, expected: 2, found: 1"));

    Ok(())
}

#[test]
fn input_stats_file_missing() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.arg("-i").arg("does/not/exist.json");
    cmd.assert()
        .failure()
        .stderr(contains("Input stats file does not exist"));

    Ok(())
}
