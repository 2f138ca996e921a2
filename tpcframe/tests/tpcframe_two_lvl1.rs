use crate::util::*;
use predicates::str::contains;
mod util;

// Asserts that the end of processing report summary contains correct information
fn validate_report_summary(byte_output: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    let match_patterns = vec![
        "Total Packets.*2",
        "Time frames.*2",
        "Hits output.*3",
        "Run Number.*25926",
        "Packet IDs.*4001",
    ];
    for pattern in match_patterns {
        match_on_out_no_case(byte_output, pattern, 1)?;
    }
    Ok(())
}

#[test]
fn report() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let tpc_file = write_two_lvl1_file(&tmp_d)?;
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.arg(tpc_file);
    cmd.assert().success();

    assert_no_errors_or_warn(&cmd.output()?.stderr)?;
    validate_report_summary(&cmd.output()?.stdout)?;
    match_on_out_no_case(&cmd.output()?.stdout, "fee data errors", 0)?;

    Ok(())
}

#[test]
fn report_from_stdin() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let tpc_file = write_two_lvl1_file(&tmp_d)?;
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.pipe_stdin(tpc_file)?;
    cmd.assert().success();

    assert_no_errors_or_warn(&cmd.output()?.stderr)?;
    validate_report_summary(&cmd.output()?.stdout)?;

    Ok(())
}

#[test]
fn filter_other_packet_id() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let tpc_file = write_two_lvl1_file(&tmp_d)?;
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.arg(tpc_file)
        .arg("-p")
        .arg("4002")
        .arg("-S")
        .arg("stdout")
        .arg("-D")
        .arg("json");
    cmd.assert().success();

    let stdout = cmd.output()?.stdout;
    match_on_output(&stdout, r#""time_frames": 0"#, 1)?;
    match_on_output(&stdout, r#""packets_filtered": 2"#, 1)?;

    Ok(())
}

#[test]
fn view_frames() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let tpc_file = write_two_lvl1_file(&tmp_d)?;
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.arg(tpc_file).arg("view").arg("frames").arg("-d");
    cmd.assert().success().stdout(contains("Reference BCO").count(1));

    let stdout = cmd.output()?.stdout;
    match_on_output(&stdout, "0x0000001000 +- +0x0000001000 +0 +2", 1)?;
    match_on_output(&stdout, "0x0000002000 +- +0x0000002000 +0 +1", 1)?;
    // No report when a view is active
    match_on_out_no_case(&stdout, "global stats", 0)?;

    Ok(())
}

#[test]
fn view_hits() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let tpc_file = write_two_lvl1_file(&tmp_d)?;
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.arg(tpc_file).arg("view").arg("hits").arg("-d");
    cmd.assert()
        .success()
        .stdout(is_match("0x[0-9A-F]{10} +0 +4001 ")?.count(3));

    let stdout = cmd.output()?.stdout;
    match_on_output(&stdout, "0x0000001000 +0 +4001 ", 2)?;
    match_on_output(&stdout, "0x0000002000 +0 +4001 ", 1)?;

    Ok(())
}

#[test]
fn view_gtm() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let tpc_file = write_two_lvl1_file(&tmp_d)?;
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.arg(tpc_file).arg("view").arg("gtm").arg("-d");
    cmd.assert().success();

    let stdout = cmd.output()?.stdout;
    match_on_output(&stdout, "4001 +0x0000001000 +LVL1", 1)?;
    match_on_output(&stdout, "4001 +0x0000002000 +LVL1", 1)?;

    Ok(())
}

#[test]
fn narrow_window_drops_nothing_at_the_reference() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let tpc_file = write_two_lvl1_file(&tmp_d)?;
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.arg(tpc_file)
        .arg("--bco-range-min")
        .arg("0")
        .arg("--bco-range-max")
        .arg("0");
    cmd.assert().success();

    match_on_out_no_case(&cmd.output()?.stdout, "Hits output.*3", 1)?;

    Ok(())
}
