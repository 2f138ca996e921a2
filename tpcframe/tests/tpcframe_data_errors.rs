use crate::util::*;
use predicates::str::contains;
mod util;

/// A valid hit at 0x1000, a hit with a corrupted CRC from board 3 at 0x2000
fn write_bad_crc_file(tmp_d: &TempDir) -> Result<String, Box<dyn std::error::Error>> {
    write_packet_file(
        tmp_d,
        "bad_crc.sprd",
        &[tpc_packet(0x1000, &[0]), tpc_packet_bad_crc(0x2000, &[3])],
    )
}

#[test]
fn crc_error_reported() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let tpc_file = write_bad_crc_file(&tmp_d)?;
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.arg(tpc_file);
    // Data errors don't fail the run unless an exit code is set for them
    cmd.assert()
        .success()
        .stderr(contains("1 errors in decoded data"));

    let stdout = cmd.output()?.stdout;
    match_on_out_no_case(&stdout, "fee data errors", 1)?;
    match_on_out_no_case(&stdout, "Hits output.*1", 1)?;

    Ok(())
}

#[test]
fn crc_error_exit_code() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let tpc_file = write_bad_crc_file(&tmp_d)?;
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.arg(tpc_file).arg("-E").arg("3");
    cmd.assert().code(3);

    Ok(())
}

#[test]
fn crc_error_muted() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let tpc_file = write_bad_crc_file(&tmp_d)?;
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.arg(tpc_file).arg("--mute-errors");
    cmd.assert().success();

    match_on_out_no_case(&cmd.output()?.stderr, "errors in decoded data", 0)?;
    // The report still shows the error
    match_on_out_no_case(&cmd.output()?.stdout, "fee data errors", 1)?;

    Ok(())
}

#[test]
fn no_errors_exit_code_unused() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let tpc_file = write_two_lvl1_file(&tmp_d)?;
    let mut cmd = Command::cargo_bin("tpcframe")?;

    cmd.arg(tpc_file).arg("-E").arg("3");
    cmd.assert().success();

    Ok(())
}
