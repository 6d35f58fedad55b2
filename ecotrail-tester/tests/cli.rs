use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "ecotrail-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_ecotrail-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("campaign"));
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn cli_runs_smoke_with_json_report_and_save_dir() {
    let exe = env!("CARGO_BIN_EXE_ecotrail-tester");
    let output_path = temp_path("run.json");
    let save_dir = temp_path("saves");
    let output = Command::new(exe)
        .args([
            "--report",
            "json",
            "--scenarios",
            "smoke,driver",
            "--iterations",
            "2",
            "--seeds",
            "1,2",
            "--save-dir",
        ])
        .arg(&save_dir)
        .arg("--output")
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Ecotrail Automated Tester"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output_path).expect("read report"))
            .expect("json report");
    let runs = report.as_array().expect("array");
    assert_eq!(runs.len(), 4);
    assert!(runs.iter().all(|run| run["passed"] == true));
    assert!(save_dir.join("smoke-1.json").exists());

    let _ = std::fs::remove_file(output_path);
    let _ = std::fs::remove_dir_all(save_dir);
}

#[test]
fn cli_rejects_bad_seed() {
    let exe = env!("CARGO_BIN_EXE_ecotrail-tester");
    let output = Command::new(exe)
        .args(["--seeds", "not-a-seed", "--iterations", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unrecognized seed token"));
}
