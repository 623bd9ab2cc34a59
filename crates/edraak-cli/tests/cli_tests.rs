//! Integration tests for the Edraak CLI
//!
//! These tests invoke the actual edraak-cli binary and verify:
//! - Exit codes (0 = success, 1 = rejected input, 2 = error)
//! - stdout/stderr output
//! - JSON output format

use std::path::PathBuf;
use std::process::Command;

// ── Helpers ───────────────────────────────────────────────

fn edraak_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_edraak-cli"))
}

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn run_edraak(args: &[&str]) -> std::process::Output {
    Command::new(edraak_bin())
        .args(args)
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env_remove("FORUS_AUTH_SECRET_KEY")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute edraak-cli")
}

fn verify(request: &str, json: bool) -> std::process::Output {
    let request = fixture(request);
    let settings = fixture("settings.json");
    let mut args = vec![
        "verify",
        request.as_str(),
        "--config",
        settings.as_str(),
        "--now",
        "2017-06-01T12:00:00",
    ];
    if json {
        args.push("--json");
    }
    run_edraak(&args)
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("should be valid JSON")
}

// ── Version ───────────────────────────────────────────────

#[test]
fn test_version_command() {
    let output = run_edraak(&["version"]);
    assert!(output.status.success(), "version should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("edraak"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_flag() {
    let output = run_edraak(&["--version"]);
    assert!(output.status.success(), "--version should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

// ── Sign ──────────────────────────────────────────────────

#[test]
fn test_sign_matches_partner_signature() {
    let output = run_edraak(&[
        "sign",
        fixture("request-unsigned.json").as_str(),
        "--secret",
        "forus-test-secret",
    ]);
    assert!(output.status.success(), "sign should exit 0");
    let json = stdout_json(&output);
    assert_eq!(
        json["forus_hmac"],
        "4d13c17d7d895854e98daaecdbc28ac762cc2df57e5f5eb9abedf350bd48e74e"
    );
    assert_eq!(json["email"], "learner@forus.jo");
}

#[test]
fn test_sign_with_config_secret() {
    let output = run_edraak(&[
        "sign",
        fixture("request-unsigned.json").as_str(),
        "--config",
        fixture("settings.json").as_str(),
    ]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(
        json["forus_hmac"],
        "4d13c17d7d895854e98daaecdbc28ac762cc2df57e5f5eb9abedf350bd48e74e"
    );
}

#[test]
fn test_sign_message() {
    let output = run_edraak(&["sign", fixture("request-unsigned.json").as_str(), "--message"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim_end(),
        "course_id=course-v1:Edraak+ForUs+2017;email=learner@forus.jo;name=Forus Learner;\
         enrollment_action=enroll;country=JO;level_of_education=hs;gender=f;\
         year_of_birth=1995;lang=ar;time=2017-06-01T11:00:00"
    );
}

#[test]
fn test_sign_without_secret() {
    let output = run_edraak(&["sign", fixture("request-unsigned.json").as_str()]);
    assert_eq!(output.status.code(), Some(2), "missing secret should exit 2");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("secret_key"));
}

// ── Verify ────────────────────────────────────────────────

#[test]
fn test_verify_valid_request() {
    let output = verify("request-valid.json", false);
    assert!(output.status.success(), "valid request should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("accepted"));
}

#[test]
fn test_verify_valid_request_json() {
    let output = verify("request-valid.json", true);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["valid"], true);
    assert_eq!(json["fields"]["course_id"], "course-v1:Edraak+ForUs+2017");
}

#[test]
fn test_verify_tampered_request() {
    let output = verify("request-tampered.json", true);
    assert_eq!(output.status.code(), Some(1), "tampered request should exit 1");
    let json = stdout_json(&output);
    assert_eq!(json["valid"], false);
    let errors = json["errors"].as_object().unwrap();
    assert_eq!(errors.len(), 1, "signature errors are never mixed with field errors");
    assert_eq!(
        json["errors"]["forus_hmac"][0],
        "The security check has failed on the provided parameters"
    );
}

#[test]
fn test_verify_unsigned_request() {
    let output = verify("request-unsigned.json", false);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("forus_hmac"));
}

#[test]
fn test_verify_accumulates_field_errors() {
    let output = verify("request-invalid-fields.json", true);
    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert_eq!(json["errors"]["gender"][0], "Invalid gender has been provided");
    assert_eq!(json["errors"]["year_of_birth"][0], "Invalid birth year has been provided");
    assert_eq!(
        json["message"],
        "Invalid gender has been provided. Invalid birth year has been provided."
    );
}

#[test]
fn test_verify_closed_course_and_staff() {
    let output = verify("request-closed-course.json", true);
    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert_eq!(
        json["errors"]["course_id"][0],
        "Enrollment for this course has been closed"
    );
    assert_eq!(
        json["errors"]["email"][0],
        "ForUs profile cannot be created for admins and staff."
    );
}

#[test]
fn test_verify_expired_request() {
    let output = run_edraak(&[
        "verify",
        fixture("request-valid.json").as_str(),
        "--config",
        fixture("settings.json").as_str(),
        "--now",
        "2017-06-02T11:00:01",
        "--json",
    ]);
    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert_eq!(json["errors"]["time"][0], "Request has expired");
}

#[test]
fn test_verify_without_secret() {
    let output = run_edraak(&[
        "verify",
        fixture("request-valid.json").as_str(),
        "--config",
        fixture("settings-no-secret.json").as_str(),
    ]);
    assert_eq!(output.status.code(), Some(2), "missing secret should exit 2");
}

#[test]
fn test_verify_bad_now() {
    let output = run_edraak(&[
        "verify",
        fixture("request-valid.json").as_str(),
        "--config",
        fixture("settings.json").as_str(),
        "--now",
        "yesterday",
    ]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_verify_nonexistent_file() {
    let output = run_edraak(&[
        "verify",
        "nonexistent.json",
        "--config",
        fixture("settings.json").as_str(),
    ]);
    assert_eq!(output.status.code(), Some(2), "missing file should exit 2");
}

// ── Conflicts ─────────────────────────────────────────────

#[test]
fn test_conflicts_json() {
    let output = run_edraak(&[
        "conflicts",
        fixture("university-ids.json").as_str(),
        "--course",
        "course-v1:Edraak+UNI101+2017",
        "--json",
    ]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    let marked = json.as_array().unwrap();
    assert_eq!(marked.len(), 8, "records from other courses are left out");

    let summary: Vec<(String, bool)> = marked
        .iter()
        .map(|m| {
            (
                m["university_id"].as_str().unwrap().to_string(),
                m["is_conflicted"].as_bool().unwrap(),
            )
        })
        .collect();
    let expected = [
        ("20-01a", false),
        ("20-02t", false),
        ("20-03", false),
        ("20-04M\t", true),
        ("20-04M ", true),
        ("20-04m", true),
        ("20-10x", true),
        ("20-10x ", true),
    ];
    let expected: Vec<(String, bool)> = expected
        .iter()
        .map(|(id, conflicted)| (id.to_string(), *conflicted))
        .collect();
    assert_eq!(summary, expected);
}

#[test]
fn test_conflicts_text() {
    let output = run_edraak(&[
        "conflicts",
        fixture("university-ids.json").as_str(),
        "--course",
        "course-v1:Edraak+UNI101+2017",
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("8 IDs, 5 conflicted"));
}

// ── Check Form ────────────────────────────────────────────

#[test]
fn test_check_form_valid() {
    let output = run_edraak(&["check-form", fixture("form-valid.json").as_str(), "--json"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["valid"], true);
}

#[test]
fn test_check_form_invalid() {
    let output = run_edraak(&["check-form", fixture("form-invalid.json").as_str(), "--json"]);
    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert_eq!(json["valid"], false);
    for field in ["full_name", "university_id", "section_number"] {
        assert_eq!(
            json["errors"][field].as_array().unwrap().len(),
            1,
            "{} should report one message",
            field
        );
    }
}
