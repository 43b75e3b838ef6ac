//! Integration tests for the Webgen CLI
//!
//! These tests run the actual binary against a temporary project tree and
//! the mock provider, and verify exit codes, output and rewritten files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const INDEX_TEMPLATE: &str = r#"<script>
var mysfitsApiEndpoint = 'REPLACE_ME_mysfitsApiEndpoint';
var streamingApiEndpoint = 'REPLACE_ME_streamingApiEndpoint';
var questionsApiEndpoint = 'REPLACE_ME_questionsApiEndpoint';
var recommendationsApiEndpoint = 'REPLACE_ME_recommendationsApiEndpoint';
var awsRegion = 'REPLACE_ME_REGION';
var cognitoUserPoolId = 'REPLACE_ME_USER_POOL_ID';
var cognitoUserPoolClientId = 'REPLACE_ME_USER_POOL_CLIENT_ID';
</script>
"#;

const POOL_TEMPLATE: &str = r#"<script>
var cognitoUserPoolId = 'REPLACE_ME_USER_POOL_ID';
var cognitoUserPoolClientId = 'REPLACE_ME_USER_POOL_CLIENT_ID';
</script>
"#;

const XRAY_TEMPLATE: &str = "receiver_email = 'REPLACE_ME_RECEIVER_EMAIL'\n";

const FULL_FIXTURE: &str = r#"
[[rest_apis]]
id = "mys111"
name = "MysfitsApi"

[[rest_apis]]
id = "clk222"
name = "ClickProcessingApi"

[[user_pools]]
id = "us-east-1_Pool"
name = "MysfitsUserPool"

[[user_pool_clients]]
user_pool_id = "us-east-1_Pool"
client_id = "client999"
client_name = "MysfitsUserPoolClient"

[[endpoints]]
name = "knn-ml-m4-xlarge"
status = "InService"
created_at = 1700000000

[repositories]
"mythicalmysfits/service" = 2
"#;

// ============================================================================
// TEST HELPERS
// ============================================================================

/// Temporary project with every template file in place
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    for (file, content) in [
        ("web/index.html", INDEX_TEMPLATE),
        ("web/register.html", POOL_TEMPLATE),
        ("web/confirm.html", POOL_TEMPLATE),
        (
            "webgen/kinesis_firehose_stack.py",
            "mysfits_api_url = 'REPLACE_ME_API_URL'\n",
        ),
        ("webgen/xray_stack.py", XRAY_TEMPLATE),
        (
            "lambda_recommendations/service/recommendations.py",
            "ENDPOINT_NAME = 'REPLACE_ME_SAGEMAKER_ENDPOINT_NAME'\n",
        ),
    ] {
        let path = dir.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

fn write_fixture(dir: &TempDir, content: &str) -> String {
    let path = dir.path().join("fixture.toml");
    fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

fn read(dir: &TempDir, relative: &str) -> String {
    fs::read_to_string(dir.path().join(relative)).unwrap()
}

/// Binary pointed at `dir` with the mock provider and a clean environment
fn webgen_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("webgen").unwrap();
    cmd.current_dir(dir)
        .env("AWS_DEFAULT_REGION", "us-east-1")
        .env_remove("RECEIVER_EMAIL")
        .env_remove("RUST_LOG")
        .args(["--provider", "mock", "--root", dir.to_str().unwrap()]);
    cmd
}

// ============================================================================
// GENERAL
// ============================================================================

#[test]
fn test_help_flag() {
    Command::cargo_bin("webgen")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("placeholder substitution"))
        .stdout(predicate::str::contains("prepare"));
}

#[test]
fn test_missing_region_fails() {
    let dir = project();

    webgen_cmd(dir.path())
        .env_remove("AWS_DEFAULT_REGION")
        .args(["prepare", "replace_email"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AWS_DEFAULT_REGION"));

    assert_eq!(read(&dir, "webgen/xray_stack.py"), XRAY_TEMPLATE);
}

#[test]
fn test_unknown_provider_fails() {
    let dir = project();

    Command::cargo_bin("webgen")
        .unwrap()
        .current_dir(dir.path())
        .env("AWS_DEFAULT_REGION", "us-east-1")
        .args(["--provider", "gcp", "prepare", "replace_email"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("WEBGEN-011"));
}

// ============================================================================
// PREPARE
// ============================================================================

#[test]
fn test_prepare_web_all_found() {
    let dir = project();
    let fixture = write_fixture(&dir, FULL_FIXTURE);

    webgen_cmd(dir.path())
        .args(["--fixture", &fixture, "prepare", "replace_web_endpoints_and_cognito_ids"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found no API QuestionsAPI"))
        .stdout(predicate::str::contains("Found no API RecommendationsAPI"));

    let index = read(&dir, "web/index.html");
    assert!(index.contains("'https://mys111.execute-api.us-east-1.amazonaws.com/prod'"));
    assert!(index.contains("'https://clk222.execute-api.us-east-1.amazonaws.com/prod'"));
    assert!(index.contains("questionsApiEndpoint = 'NOT_FOUND'"));
    assert!(index.contains("awsRegion = 'us-east-1'"));
    assert!(index.contains("cognitoUserPoolClientId = 'client999'"));
    assert!(!index.contains("REPLACE_ME_"));

    let register = read(&dir, "web/register.html");
    assert!(register.contains("cognitoUserPoolId = 'us-east-1_Pool'"));
    assert_eq!(register, read(&dir, "web/confirm.html"));
}

#[test]
fn test_prepare_web_missing_primary_api_exits_1() {
    let dir = project();
    let fixture = write_fixture(
        &dir,
        r#"
[[rest_apis]]
id = "clk222"
name = "ClickProcessingApi"
"#,
    );

    webgen_cmd(dir.path())
        .args(["--fixture", &fixture, "prepare", "replace_web_endpoints_and_cognito_ids"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Found no API MysfitsApi"));

    assert_eq!(read(&dir, "web/index.html"), INDEX_TEMPLATE);
    assert_eq!(read(&dir, "web/register.html"), POOL_TEMPLATE);
    assert_eq!(read(&dir, "web/confirm.html"), POOL_TEMPLATE);
}

#[test]
fn test_prepare_provider_failure_exits_nonzero() {
    let dir = project();
    let fixture = write_fixture(&dir, "fail = [\"GetRestApis\"]\n");

    webgen_cmd(dir.path())
        .args(["--fixture", &fixture, "prepare", "replace_clickprocessingapi_endpoint"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("WEBGEN-010"))
        .stderr(predicate::str::contains("GetRestApis"));

    assert!(read(&dir, "webgen/kinesis_firehose_stack.py").contains("REPLACE_ME_API_URL"));
}

#[test]
fn test_prepare_email_unset_writes_sentinel() {
    let dir = project();

    webgen_cmd(dir.path())
        .args(["prepare", "replace_email"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RECEIVER_EMAIL"));

    assert_eq!(
        read(&dir, "webgen/xray_stack.py"),
        "receiver_email = 'NOT_FOUND'\n"
    );
}

#[test]
fn test_prepare_email_from_env() {
    let dir = project();

    webgen_cmd(dir.path())
        .env("RECEIVER_EMAIL", "alerts@example.com")
        .args(["prepare", "replace_email"])
        .assert()
        .success();

    assert_eq!(
        read(&dir, "webgen/xray_stack.py"),
        "receiver_email = 'alerts@example.com'\n"
    );
}

#[test]
fn test_prepare_recommendations() {
    let dir = project();
    let fixture = write_fixture(&dir, FULL_FIXTURE);

    webgen_cmd(dir.path())
        .args(["--fixture", &fixture, "prepare", "replace_recommendationsapi_endpoint"])
        .assert()
        .success();

    assert_eq!(
        read(&dir, "lambda_recommendations/service/recommendations.py"),
        "ENDPOINT_NAME = 'knn-ml-m4-xlarge'\n"
    );
}

#[test]
fn test_prepare_unknown_mode_is_noop() {
    let dir = project();

    webgen_cmd(dir.path())
        .args(["prepare", "replace_everything"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(read(&dir, "web/index.html"), INDEX_TEMPLATE);
    assert_eq!(read(&dir, "webgen/xray_stack.py"), XRAY_TEMPLATE);
}

#[test]
fn test_prepare_missing_target_file_fails() {
    let dir = project();
    fs::remove_file(dir.path().join("webgen/xray_stack.py")).unwrap();

    webgen_cmd(dir.path())
        .args(["prepare", "replace_email"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("WEBGEN-020"));
}

// ============================================================================
// ENDPOINTS / CHECK / REDEPLOY
// ============================================================================

#[test]
fn test_endpoints_json() {
    let dir = project();
    let fixture = write_fixture(&dir, FULL_FIXTURE);

    let output = webgen_cmd(dir.path())
        .args(["--fixture", &fixture, "endpoints", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["region"], "us-east-1");
    assert_eq!(json["user_pool"]["value"], "us-east-1_Pool");
    assert_eq!(json["model_endpoint"]["value"], "knn-ml-m4-xlarge");
    assert_eq!(json["apis"][2][1]["status"], "not_found");
}

#[test]
fn test_endpoints_table() {
    let dir = project();
    let fixture = write_fixture(&dir, FULL_FIXTURE);

    webgen_cmd(dir.path())
        .env("NO_COLOR", "1")
        .args(["--fixture", &fixture, "endpoints"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MysfitsApi"))
        .stdout(predicate::str::contains("2 value(s) not found"));
}

#[test]
fn test_check_inference_endpoint() {
    let dir = project();

    webgen_cmd(dir.path())
        .args(["check", "inference-endpoint"])
        .assert()
        .success()
        .stdout("true\n");

    let fixture = write_fixture(&dir, FULL_FIXTURE);
    webgen_cmd(dir.path())
        .args(["--fixture", &fixture, "check", "inference-endpoint"])
        .assert()
        .success()
        .stdout("false\n");
}

#[test]
fn test_check_ecr_empty() {
    let dir = project();

    webgen_cmd(dir.path())
        .args(["check", "ecr-empty"])
        .assert()
        .success()
        .stdout("true\n");

    let fixture = write_fixture(&dir, FULL_FIXTURE);
    webgen_cmd(dir.path())
        .args(["--fixture", &fixture, "check", "ecr-empty"])
        .assert()
        .success()
        .stdout("false\n");
}

#[test]
fn test_redeploy() {
    let dir = project();

    webgen_cmd(dir.path())
        .arg("redeploy")
        .assert()
        .success()
        .stdout(predicate::str::contains("MythicalMysfits-FargateService"));
}

// ============================================================================
// RENDER
// ============================================================================

#[test]
fn test_render_with_output() {
    let dir = project();
    let source = dir.path().join("api.json");
    let output = dir.path().join("api.rendered.json");
    fs::write(
        &source,
        r#"{"region": "REPLACE_ME_REGION", "account": "REPLACE_ME_ACCOUNT_ID"}"#,
    )
    .unwrap();

    webgen_cmd(dir.path())
        .env_remove("AWS_DEFAULT_REGION")
        .args([
            "render",
            source.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--set",
            "REPLACE_ME_REGION=eu-west-1",
            "--missing",
            "REPLACE_ME_ACCOUNT_ID",
        ])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        r#"{"region": "eu-west-1", "account": "NOT_FOUND"}"#
    );
}

#[test]
fn test_render_rejects_bad_binding() {
    let dir = project();

    webgen_cmd(dir.path())
        .args(["render", "web/index.html", "--set", "REGION=eu-west-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("WEBGEN-030"));

    assert_eq!(read(&dir, "web/index.html"), INDEX_TEMPLATE);
}

// ============================================================================
// ENVIRONMENT AND LOGGING
// ============================================================================

#[cfg(unix)]
#[test]
fn test_unrelated_non_utf8_env_var_is_ignored() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = project();

    webgen_cmd(dir.path())
        .env("UNRELATED_VAR", OsStr::from_bytes(b"\xff\xfe"))
        .env("RECEIVER_EMAIL", "ops@example.com")
        .args(["prepare", "replace_email"])
        .assert()
        .success();

    assert_eq!(
        read(&dir, "webgen/xray_stack.py"),
        "receiver_email = 'ops@example.com'\n"
    );
}

#[test]
fn test_rust_log_enables_debug_events() {
    let dir = project();

    webgen_cmd(dir.path())
        .env("RUST_LOG", "debug")
        .args(["prepare", "replace_email"])
        .assert()
        .success()
        .stderr(predicate::str::contains("substituted placeholder"));
}

#[test]
fn test_default_log_level_hides_debug_events() {
    let dir = project();

    webgen_cmd(dir.path())
        .args(["prepare", "replace_email"])
        .assert()
        .success()
        .stderr(predicate::str::contains("preparing files"))
        .stderr(predicate::str::contains("substituted placeholder").not());
}

// ============================================================================
// CLEAN
// ============================================================================

const DEPLOYED_FIXTURE: &str = r#"
tables = ["MysfitsTable"]
models = ["knn-model-1"]

[[user_pools]]
id = "us-east-1_Pool"
name = "MysfitsUserPool"

[repositories]
"mythicalmysfits/service" = 0
"#;

#[test]
fn test_clean_without_yes_only_lists() {
    let dir = project();
    let fixture = write_fixture(&dir, DEPLOYED_FIXTURE);

    webgen_cmd(dir.path())
        .args(["--fixture", &fixture, "clean"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would delete"))
        .stdout(predicate::str::contains("model knn-model-1"))
        .stdout(predicate::str::contains("table MysfitsTable"))
        .stdout(predicate::str::contains("user pool MysfitsUserPool (us-east-1_Pool)"))
        .stdout(predicate::str::contains("image repository mythicalmysfits/service"))
        .stdout(predicate::str::contains("--yes"))
        .stdout(predicate::str::contains("Deleted").not());
}

#[test]
fn test_clean_with_yes_deletes() {
    let dir = project();
    let fixture = write_fixture(&dir, DEPLOYED_FIXTURE);

    webgen_cmd(dir.path())
        .args(["--fixture", &fixture, "clean", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted table MysfitsTable"))
        .stdout(predicate::str::contains("Deleted image repository mythicalmysfits/service"));
}

#[test]
fn test_clean_nothing_deployed() {
    let dir = project();

    webgen_cmd(dir.path())
        .args(["clean", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to delete in us-east-1"));
}

#[test]
fn test_clean_provider_failure_exits_1() {
    let dir = project();
    let fixture = write_fixture(
        &dir,
        &format!("fail = [\"DeleteTable\"]\n{}", DEPLOYED_FIXTURE),
    );

    webgen_cmd(dir.path())
        .args(["--fixture", &fixture, "clean", "--yes"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("WEBGEN-010"));
}
