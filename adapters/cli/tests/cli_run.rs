use std::{fs, process::Command};

#[test]
fn default_scenario_prints_summary() {
    let output = Command::new(env!("CARGO_BIN_EXE_fuel-run"))
        .args(["--seconds", "20", "--step-ms", "20"])
        .output()
        .expect("failed to run fuel-run");

    assert!(output.status.success(), "fuel-run exited with {}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("simulated 20.0s"), "{stdout}");
    assert!(stdout.contains("hostiles spawned:"), "{stdout}");
}

#[test]
fn scenario_file_drives_the_run() {
    let path = std::env::temp_dir().join(format!("fuel-run-scenario-{}.toml", std::process::id()));
    fs::write(
        &path,
        "seed = 3\n\n[hostile]\ncapacity = 0\n\n[pickup]\ncapacity = 0\n",
    )
    .expect("write scenario");

    let output = Command::new(env!("CARGO_BIN_EXE_fuel-run"))
        .arg("--config")
        .arg(&path)
        .args(["--seconds", "5"])
        .output()
        .expect("failed to run fuel-run");
    let _ = fs::remove_file(&path);

    assert!(output.status.success(), "fuel-run exited with {}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hostiles spawned: 0"), "{stdout}");
    assert!(stdout.contains("pickups spawned: 0"), "{stdout}");
}

#[test]
fn malformed_scenario_fails_with_context() {
    let path = std::env::temp_dir().join(format!("fuel-run-broken-{}.toml", std::process::id()));
    fs::write(&path, "seed = \"not a number\"\n").expect("write scenario");

    let output = Command::new(env!("CARGO_BIN_EXE_fuel-run"))
        .arg("--config")
        .arg(&path)
        .output()
        .expect("failed to run fuel-run");
    let _ = fs::remove_file(&path);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid scenario"), "{stderr}");
}
