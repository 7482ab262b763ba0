use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn run_attest(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "-q", "-p", "attest-cli", "--"])
        .args(args)
        .output()
        .expect("failed to execute command")
}

#[test]
fn verify_clean_file_exits_zero() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("clean.py");
    fs::write(&input, "def add(a, b):\n    return a + b\n").unwrap();

    let output = run_attest(&["verify", input.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Total Findings: 0"));
}

#[test]
fn critical_finding_exits_nonzero_and_json_is_loadable() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("risky.py");
    fs::write(
        &input,
        "import os\n\ndef run(cmd):\n    os.system(f\"sh -c {cmd}\")\n",
    )
    .unwrap();
    let report_path = temp_dir.path().join("report.json");

    let output = run_attest(&[
        "verify",
        input.to_str().unwrap(),
        "--format",
        "json",
        "--output",
        report_path.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["metrics"]["critical_findings"], 1);

    // re-render the saved report as SARIF
    let sarif_path = temp_dir.path().join("report.sarif");
    let output = run_attest(&[
        "report",
        report_path.to_str().unwrap(),
        "--format",
        "sarif",
        "--output",
        sarif_path.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    let sarif: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&sarif_path).unwrap()).unwrap();
    assert_eq!(sarif["version"], "2.1.0");
    assert_eq!(
        sarif["runs"][0]["results"][0]["ruleId"],
        "security.command_injection"
    );
}

#[test]
fn malformed_file_fails_with_position() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("broken.py");
    fs::write(&input, "def broken(:\n    pass\n").unwrap();

    let output = run_attest(&["verify", input.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("syntax error"));
}

#[test]
fn directory_input_writes_one_report_per_file() {
    let temp_dir = TempDir::new().unwrap();
    let src_dir = temp_dir.path().join("src");
    fs::create_dir(&src_dir).unwrap();
    fs::write(src_dir.join("one.py"), "def f(x):\n    return x\n").unwrap();
    fs::write(src_dir.join("two.py"), "def g(y):\n    return y\n").unwrap();
    let out_dir = temp_dir.path().join("reports");

    let output = run_attest(&[
        "verify",
        src_dir.to_str().unwrap(),
        "--format",
        "json",
        "--output",
        out_dir.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(out_dir.join("one.json").exists());
    assert!(out_dir.join("two.json").exists());
}
