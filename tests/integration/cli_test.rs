use anyhow::Result;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Write the people table and return a `name=path` binding for it
fn people_binding(dir: &TempDir) -> Result<String> {
    let path = dir.path().join("people.json");
    fs::write(
        &path,
        r#"[
            {"name": "ann", "age": 31, "city": "oslo"},
            {"name": "bob", "age": 25, "city": "rome"},
            {"name": "cid", "age": 40, "city": "oslo"}
        ]"#,
    )?;
    Ok(binding("people", &path))
}

fn binding(name: &str, path: &Path) -> String {
    format!("{}={}", name, path.display())
}

fn dsql(args: &[&str]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_dsql")).args(args).output()?)
}

/// A query prints a text table followed by the row count
#[test]
fn test_cli_query_execution() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let people = people_binding(&dir)?;

    let output = dsql(&["-t", &people, "query", "select name, age from people where age > 30 order by age"])?;
    assert!(output.status.success(), "CLI query execution failed");

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("| name | age |"), "header missing from:\n{}", stdout);
    assert!(stdout.contains("| ann  | 31  |"));
    assert!(stdout.contains("| cid  | 40  |"));
    assert!(!stdout.contains("bob"));
    assert!(stdout.contains("(2 rows)"));

    Ok(())
}

/// Keywords are case-insensitive unless --preserve-case is given
#[test]
fn test_cli_lowercases_queries() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let people = people_binding(&dir)?;

    let output = dsql(&["-t", &people, "query", "SELECT NAME FROM PEOPLE WHERE CITY = 'rome'"])?;
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)?.contains("bob"));

    let output = dsql(&["-t", &people, "--preserve-case", "query", "SELECT name FROM people"])?;
    assert!(!output.status.success());

    Ok(())
}

#[test]
fn test_cli_json_output() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let people = people_binding(&dir)?;

    let output = dsql(&[
        "-t",
        &people,
        "--json",
        "query",
        "select city, count() n from people group by city",
    ])?;
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(
        json,
        serde_json::json!([
            {"city": "oslo", "n": 2.0},
            {"city": "rome", "n": 1.0},
        ])
    );

    Ok(())
}

#[test]
fn test_cli_joins_two_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let people = people_binding(&dir)?;

    let cities_path = dir.path().join("cities.json");
    fs::write(&cities_path, r#"[{"city": "oslo", "country": "no"}, {"city": "rome", "country": "it"}]"#)?;
    let cities = binding("cities", &cities_path);

    let output = dsql(&[
        "-t",
        &people,
        "--table",
        &cities,
        "--json",
        "query",
        "select p.name, c.country from people p join cities c on p.city = c.city order by p.name",
    ])?;
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json[1]["country"], "it");
    assert_eq!(json.as_array().map(Vec::len), Some(3));

    Ok(())
}

#[test]
fn test_cli_reports_errors() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let people = people_binding(&dir)?;

    let output = dsql(&["-t", &people, "query", "select nope from people"])?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("Error executing query"), "unexpected stderr:\n{}", stderr);

    let missing = binding("ghost", &dir.path().join("ghost.json"));
    let output = dsql(&["-t", &missing, "query", "select 1"])?;
    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr)?.contains("Failed to load table ghost"));

    let output = dsql(&["-t", "no-equals-sign", "query", "select 1"])?;
    assert!(!output.status.success());

    Ok(())
}

/// The shell reads queries from stdin until EOF
#[test]
fn test_cli_shell_from_stdin() -> Result<()> {
    use std::io::Write;
    use std::process::Stdio;

    let dir = tempfile::tempdir()?;
    let people = people_binding(&dir)?;

    let mut child = Command::new(env!("CARGO_BIN_EXE_dsql"))
        .args(["-t", &people, "shell"])
        .current_dir(dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(stdin) = child.stdin.as_mut() {
        stdin.write_all(b"select name from people where age < 30\nexit\n")?;
    }
    let output = child.wait_with_output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("bob"));
    assert!(stdout.contains("Goodbye!"));

    Ok(())
}
