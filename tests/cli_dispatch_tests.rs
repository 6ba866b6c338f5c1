use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const FIXTURE: &str = "tests/fixtures/characters.json";

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_pitchsim")
}

fn run(args: &[&str]) -> Output {
    Command::new(bin())
        .args(args)
        .env("PITCHSIM_DATA", FIXTURE)
        .env("RUST_LOG", "warn")
        .output()
        .expect("pitchsim should run")
}

fn unique_temp_path(name: &str, extension: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("pitchsim-{name}-{stamp}.{extension}"))
}

#[test]
fn calculate_command_dispatches_and_emits_json() {
    let output = run(&["calculate", "lancer", "--duration-ms", "3000"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let payload: serde_json::Value =
        serde_json::from_str(&stdout).expect("calculate should emit json");
    assert_eq!(payload["character"], "Lancer");
    assert_eq!(payload["total_damage"], 4800);
    assert_eq!(payload["hits"].as_array().map(Vec::len), Some(6));
    assert_eq!(payload["hits"][0]["type"], "hit");
}

#[test]
fn calculate_command_accepts_state_and_defense() {
    let output = run(&["calculate", "lancer", "awakened", "--duration", "1", "--def", "300"]);

    assert_eq!(output.status.code(), Some(0));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("calculate should emit json");
    assert_eq!(payload["variant"], "awakened");
    assert_eq!(payload["total_damage"], 2400);
}

#[test]
fn calculate_command_emits_csv() {
    let output = run(&["calculate", "lancer", "--duration-ms", "1000", "--csv"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "time,damage,type,hit_index,note");
    assert_eq!(lines[1], "0.3,800,hit,1,");
    assert_eq!(lines.len(), 3);
}

#[test]
fn calculate_command_reports_unknown_character() {
    let output = run(&["calculate", "nobody"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Character 'nobody' not found."));
}

#[test]
fn calculate_command_returns_usage_without_character() {
    let output = run(&["calculate"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: pitchsim calculate"));
}

#[test]
fn unknown_command_prints_usage() {
    let output = run(&["bogus"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: pitchsim"));
}

#[test]
fn list_command_emits_characters() {
    let output = run(&["list"]);

    assert_eq!(output.status.code(), Some(0));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("list should emit json");
    let characters = payload["characters"].as_array().expect("characters array");
    assert_eq!(characters.len(), 6);
    assert_eq!(characters[2]["default_variant"], "gatling");
}

#[test]
fn leaderboard_command_ranks_role() {
    let output = run(&["leaderboard", "--role", "atk"]);

    assert_eq!(output.status.code(), Some(0));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("leaderboard should emit json");
    let entries = payload.as_array().expect("leaderboard should be an array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["character"], "duelist");
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(entries[1]["character"], "lancer");
}

#[test]
fn yaml_dataset_is_loaded_by_extension() {
    let path = unique_temp_path("dataset", "yaml");
    fs::write(
        &path,
        "characters:\n  - id: solo\n    name: Solo\n    stats:\n      attack_multiplier: 2.0\n    base_action:\n      pitch: [500, 250]\n",
    )
    .expect("temp dataset should be writable");

    let output = Command::new(bin())
        .args(["calculate", "solo"])
        .env("PITCHSIM_DATA", &path)
        .output()
        .expect("pitchsim should run");
    let _ = fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(0));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("calculate should emit json");
    assert_eq!(payload["total_damage"], 1800);
    assert_eq!(payload["total_time"], 0.5);
}

#[test]
fn missing_dataset_fails_before_dispatch() {
    let output = Command::new(bin())
        .args(["list"])
        .env("PITCHSIM_DATA", unique_temp_path("missing", "json"))
        .output()
        .expect("pitchsim should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load character data"));
}
