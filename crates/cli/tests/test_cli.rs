use std::process::Command;

const BASIC: &str = r#"{"resourceType":"Basic","id":"b1","code":{"text":"x"}}"#;

fn fhirkit() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_fhirkit"));
    command
        .env_remove("RUST_LOG")
        .env_remove("FHIRKIT_PRETTY")
        .env_remove("FHIRKIT_LOG_LEVEL");
    command
}

#[test]
fn test_convert_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("basic.json");
    let xml_path = dir.path().join("basic.xml");
    std::fs::write(&json_path, BASIC).unwrap();

    let status = fhirkit()
        .arg("convert")
        .arg(&json_path)
        .arg("--output")
        .arg(&xml_path)
        .status()
        .unwrap();
    assert!(status.success());
    let xml = std::fs::read_to_string(&xml_path).unwrap();
    assert!(xml.contains(r#"<Basic xmlns="http://hl7.org/fhir"><id value="b1"/>"#));

    let output = fhirkit().arg("convert").arg(&xml_path).output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap().trim_end(), BASIC);
}

#[test]
fn test_log_level_reaches_command_logs() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("basic.json");
    let xml_path = dir.path().join("basic.xml");
    std::fs::write(&json_path, BASIC).unwrap();

    let output = fhirkit()
        .arg("convert")
        .arg(&json_path)
        .arg("--output")
        .arg(&xml_path)
        .arg("--log-level")
        .arg("info")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("converting"), "{}", stderr);
    assert!(stderr.contains("wrote output"), "{}", stderr);

    let quiet = fhirkit().arg("convert").arg(&json_path).output().unwrap();
    assert!(!String::from_utf8(quiet.stderr).unwrap().contains("converting"));
}

#[test]
fn test_type_info_command() {
    let output = fhirkit()
        .args(["type-info", "SubstanceDefinition.moiety"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("FHIR.SubstanceDefinition.moiety : FHIR.BackboneElement\n"));
    assert!(stdout.contains("  amount: FHIR.Quantity | FHIR.string\n"));
}

#[test]
fn test_bad_input_fails_with_message() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{"resourceType":"Basic","bogus":1}"#).unwrap();

    let output = fhirkit().arg("inspect").arg(&path).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("unknown field `bogus` (in Basic)"), "{}", stderr);
}
