use crate::util::*;
mod util;

/// Check that a not found file returns a fatal error, with a description of an OS error
///
/// Try with all the different verbosity values 0-4
#[test]
fn file_doesnt_exist() -> Result<(), Box<dyn std::error::Error>> {
    for verbosity in ["-v0", "-v1", "-v2", "-v3", "-v4"] {
        let mut cmd = Command::cargo_bin("tpcframe")?;
        cmd.arg("test/file/doesnt/exist").arg(verbosity);
        cmd.assert().failure().stderr(
            predicate::str::contains("ERROR - FATAL:").and(predicate::str::contains("os error")),
        );
    }
    Ok(())
}

#[test]
fn gl1_file_doesnt_exist() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let tpc_file = write_two_lvl1_file(&tmp_d)?;
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.arg(tpc_file).arg("--gl1").arg("test/gl1/doesnt/exist");
    cmd.assert().failure().stderr(
        predicate::str::contains("ERROR - FATAL:")
            .and(predicate::str::contains("Failed opening GL1 file")),
    );
    Ok(())
}

#[test]
fn bad_file_input() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let not_a_packet_file = tmp_d.child("not_packets.txt");
    not_a_packet_file.write_str("This is not a packet container file, just some text")?;
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.arg(not_a_packet_file.path()).arg("-v4");
    cmd.assert().failure();

    match_on_out_no_case(&cmd.output()?.stderr, "processing failed", 1)?;
    Ok(())
}

#[test]
fn invalid_header_format() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("tpcframe")?;
    // No file arg is needed when other args are invalid
    cmd.arg("--header-format").arg("v3");
    cmd.assert().failure();

    match_on_out_no_case(&cmd.output()?.stderr, "invalid value", 1)?;
    Ok(())
}

#[test]
fn invalid_matcher() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("tpcframe")?;
    cmd.arg("--matcher").arg("closest");
    cmd.assert().failure();

    match_on_out_no_case(&cmd.output()?.stderr, "invalid value", 1)?;
    Ok(())
}

#[test]
fn inverted_bco_range() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let tpc_file = write_two_lvl1_file(&tmp_d)?;
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.arg(tpc_file)
        .arg("--bco-range-min")
        .arg("100")
        .arg("--bco-range-max")
        .arg("-100");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("is larger than BCO range max"));
    Ok(())
}

#[test]
fn retention_shorter_than_window() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.arg("--retention").arg("16");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Retention (16 BCO) is shorter"));
    Ok(())
}

#[test]
fn any_errors_exit_code_zero() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.arg("-E").arg("0");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot be 0"));
    Ok(())
}

#[test]
fn stats_output_requires_format() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.arg("-S").arg("stdout");
    cmd.assert().failure();

    match_on_out_no_case(&cmd.output()?.stderr, "required arguments were not provided", 1)?;
    Ok(())
}

#[test]
fn view_requires_subcommand() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.arg("view");
    cmd.assert().failure().stderr(predicate::str::contains("Usage"));
    Ok(())
}
