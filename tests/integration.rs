use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const KEY_ENV: &str = "PERSONAS_IT_API_KEY";

fn personas_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("personas");
    path
}

fn setup_test_env(generation_url: &str, extra: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    fs::write(
        root.join("personas.json"),
        r#"[
  {"numero_documento": "1001", "primer_nombre": "Maria", "apellidos": "Lopez", "tipo_documento": "Cédula"},
  {"numero_documento": "1002", "primer_nombre": "Juan", "apellidos": "Perez", "tipo_documento": "Tarjeta de identidad"}
]"#,
    )
    .unwrap();

    let config_content = format!(
        r#"[store]
path = "{root}/data/personas.sqlite"

[generation]
provider = "openai"
url = "{url}"
api_key_env = "{key_env}"
timeout_secs = 5

[server]
bind = "127.0.0.1:0"
{extra}
"#,
        root = root.display(),
        url = generation_url,
        key_env = KEY_ENV,
        extra = extra,
    );

    let config_path = config_dir.join("personas.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_personas(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = personas_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env(KEY_ENV, "test-key")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run personas binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn seed(config_path: &Path) {
    let records = config_path
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("personas.json");
    let (stdout, stderr, success) = run_personas(config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    let (stdout, stderr, success) =
        run_personas(config_path, &["import", records.to_str().unwrap()]);
    assert!(success, "import failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Imported 2 personas"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9", "");

    let (stdout, _, success1) = run_personas(&config_path, &["init"]);
    assert!(success1, "First init failed");
    assert!(stdout.contains("initialized"));

    let (_, _, success2) = run_personas(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_import_then_get() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9", "");
    seed(&config_path);

    let (stdout, stderr, success) = run_personas(&config_path, &["get", "1002"]);
    assert!(success, "get failed: {}", stderr);
    let record: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(record["primer_nombre"], "Juan");

    let (_, stderr, success) = run_personas(&config_path, &["get", "9999"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_query_end_to_end() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(mockito::Matcher::Regex("Consulta: maria".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Found Maria Lopez"}}]}"#)
        .create();

    let (_tmp, config_path) = setup_test_env(&server.url(), "");
    seed(&config_path);

    let (stdout, stderr, success) = run_personas(&config_path, &["query", "maria"]);
    assert!(success, "query failed: stdout={}, stderr={}", stdout, stderr);

    let outcome: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(outcome["answer"], "Found Maria Lopez");
    let data = outcome["relevant_data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["apellidos"], "Lopez");
    mock.assert();
}

#[test]
fn test_query_pushdown_matches_substrings() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"Dos personas"}}]}"#)
        .create();

    let (_tmp, config_path) = setup_test_env(&server.url(), "\n[matching]\nstrategy = \"pushdown\"\n");
    seed(&config_path);

    // "ula" hits "Cédula"; "tarjeta" hits Juan's document type.
    let (stdout, stderr, success) = run_personas(&config_path, &["query", "ULA tarjeta"]);
    assert!(success, "query failed: {}", stderr);
    let outcome: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(outcome["relevant_data"].as_array().unwrap().len(), 2);
}

#[test]
fn test_query_without_matches_reports_null() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"No hay datos"}}]}"#)
        .create();

    let (_tmp, config_path) = setup_test_env(&server.url(), "");
    seed(&config_path);

    let (stdout, _, success) = run_personas(&config_path, &["query", "zzzz"]);
    assert!(success);
    let outcome: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(outcome["answer"], "No hay datos");
    assert!(outcome["relevant_data"].is_null());
}

#[test]
fn test_query_generation_failure_exits_nonzero() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body("boom")
        .create();

    let (_tmp, config_path) = setup_test_env(&server.url(), "");
    seed(&config_path);

    let (stdout, stderr, success) = run_personas(&config_path, &["query", "maria"]);
    assert!(!success);
    assert!(stdout.trim().is_empty(), "no partial answer expected: {}", stdout);
    assert!(stderr.contains("generation service unavailable"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let (_tmp, config_path) =
        setup_test_env("http://127.0.0.1:9", "\n[matching]\ncap = 0\n");
    let (_, stderr, success) = run_personas(&config_path, &["init"]);
    assert!(!success);
    assert!(stderr.contains("matching.cap"));
}
