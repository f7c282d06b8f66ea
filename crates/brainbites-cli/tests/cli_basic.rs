//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs.

use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "brainbites-cli", "--"])
        .args(args)
        .env("BRAINBITES_ENV", "dev")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_timer_status() {
    let (stdout, _, code) = run_cli(&["timer", "status"]);
    assert_eq!(code, 0, "timer status failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(parsed.get("available_seconds").is_some());
    assert!(parsed.get("is_running").is_some());
}

#[test]
fn test_timer_add_then_status() {
    let (_, _, code) = run_cli(&["timer", "add", "--seconds", "60"]);
    assert_eq!(code, 0, "timer add failed");
    let (stdout, _, code) = run_cli(&["timer", "status"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(parsed["total_earned_seconds"].as_u64().unwrap() >= 60);
}

#[test]
fn test_timer_tick() {
    let (_, _, code) = run_cli(&["timer", "tick"]);
    assert_eq!(code, 0, "timer tick failed");
}

#[test]
fn test_score_info() {
    let (stdout, _, code) = run_cli(&["score", "info"]);
    assert_eq!(code, 0, "score info failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(parsed.get("total_score").is_some());
    assert!(parsed.get("accuracy").is_some());
}

#[test]
fn test_score_stats() {
    let (stdout, _, code) = run_cli(&["score", "stats"]);
    assert_eq!(code, 0, "score stats failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(parsed.get("average_points_per_question").is_some());
}

#[test]
fn test_goals_list() {
    let (stdout, _, code) = run_cli(&["goals", "list"]);
    assert_eq!(code, 0, "goals list failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let goals = parsed.as_array().unwrap();
    assert_eq!(goals.len(), 3);
    for goal in goals {
        assert!(goal.get("id").is_some());
        assert!(goal.get("target").is_some());
    }
}

#[test]
fn test_goals_stats() {
    let (stdout, _, code) = run_cli(&["goals", "stats"]);
    assert_eq!(code, 0, "goals stats failed");
    assert!(serde_json::from_str::<serde_json::Value>(&stdout).is_ok());
}

#[test]
fn test_goals_claim_unknown_fails() {
    let (_, _, code) = run_cli(&["goals", "claim", "no_such_goal"]);
    assert_ne!(code, 0, "claiming an unknown goal should fail");
}

#[test]
fn test_quiz_categories() {
    let (stdout, _, code) = run_cli(&["quiz", "categories"]);
    assert_eq!(code, 0, "quiz categories failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(!parsed.as_array().unwrap().is_empty());
}

#[test]
fn test_config_list() {
    let (stdout, _, code) = run_cli(&["config", "list"]);
    assert_eq!(code, 0, "config list failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(parsed.get("rewards").is_some());
}

#[test]
fn test_config_get() {
    let (stdout, _, code) = run_cli(&["config", "get", "rewards.base_points"]);
    assert_eq!(code, 0, "config get failed");
    assert!(!stdout.trim().is_empty());
}

#[test]
fn test_config_get_unknown_fails() {
    let (_, _, code) = run_cli(&["config", "get", "no.such.key"]);
    assert_ne!(code, 0, "unknown config key should fail");
}
