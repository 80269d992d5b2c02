use std::fs;
use std::process::Command;

#[test]
fn run_command_completes_a_job_end_to_end() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sources_path = dir.path().join("sources.json");
    let targets_path = dir.path().join("targets.json");
    let output_path = dir.path().join("result.json");
    let checkpoint_dir = dir.path().join("checkpoints");

    fs::write(
        &sources_path,
        r#"[
            {"name": "firstName", "value": "John", "type": "name"},
            {"name": "email_address", "value": "john@example.com", "type": "email"}
        ]"#,
    )
    .expect("write sources");
    fs::write(
        &targets_path,
        r#"[
            {"name": "first_name", "type": "name", "required": true},
            {"name": "email", "type": "email", "required": true}
        ]"#,
    )
    .expect("write targets");

    let status = Command::new(env!("CARGO_BIN_EXE_formfill"))
        .arg("run")
        .arg(&sources_path)
        .arg(&targets_path)
        .arg("--checkpoint-dir")
        .arg(&checkpoint_dir)
        .arg("--output")
        .arg(&output_path)
        .status()
        .expect("run formfill");
    assert!(status.success());

    let result: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output_path).expect("read result"))
            .expect("parse result");
    assert_eq!(result["status"], "completed");
    assert_eq!(result["mappings"].as_array().expect("mappings").len(), 2);

    // One checkpoint file per job, overwritten in place.
    let checkpoints: Vec<_> = fs::read_dir(&checkpoint_dir)
        .expect("read checkpoint dir")
        .collect();
    assert_eq!(checkpoints.len(), 1);
}

#[test]
fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sources_path = dir.path().join("sources.json");
    let targets_path = dir.path().join("targets.json");
    let checkpoint_dir = dir.path().join("checkpoints");

    fs::write(&sources_path, r#"[{"name": "city", "value": "Utrecht"}]"#).expect("write sources");
    fs::write(&targets_path, r#"[{"name": "city", "type": "text"}]"#).expect("write targets");

    let status = Command::new(env!("CARGO_BIN_EXE_formfill"))
        .arg("run")
        .arg(&sources_path)
        .arg(&targets_path)
        .arg("--checkpoint-dir")
        .arg(&checkpoint_dir)
        .arg("--dry-run")
        .status()
        .expect("run formfill");
    assert!(status.success());
    assert!(!checkpoint_dir.exists());
}

#[test]
fn duplicate_target_names_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sources_path = dir.path().join("sources.json");
    let targets_path = dir.path().join("targets.json");

    fs::write(&sources_path, "[]").expect("write sources");
    fs::write(
        &targets_path,
        r#"[
            {"name": "email", "type": "email", "required": true},
            {"name": "EMAIL", "type": "email"}
        ]"#,
    )
    .expect("write targets");

    let output = Command::new(env!("CARGO_BIN_EXE_formfill"))
        .arg("run")
        .arg(&sources_path)
        .arg(&targets_path)
        .arg("--checkpoint-dir")
        .arg(dir.path().join("checkpoints"))
        .output()
        .expect("run formfill");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("duplicate target field name"));
}
