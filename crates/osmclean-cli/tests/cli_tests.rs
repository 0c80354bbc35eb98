use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MAPPER_EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="streamdeck-osmapper">
  <node id="-1" lat="47.4979" lon="19.0402">
    <tag k="amenity" v="bench"/>
    <tag k="fixme" v="streamdeck-osmapper #42"/>
  </node>
</osm>
"#;

const NAMED_ICONS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="1"><tag k="name" v="sign.png7"/></node>
  <node id="2"><tag k="name" v="sign.png"/></node>
</osm>
"#;

fn osmclean() -> Result<Command, Box<dyn std::error::Error>> {
    Ok(Command::cargo_bin("osmclean")?)
}

#[test]
fn cleans_fixme_nodes_by_default() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("osm.xml");
    fs::write(&input, MAPPER_EXPORT)?;

    osmclean()?.arg(&input).assert().success();

    let output = fs::read_to_string(dir.path().join("osm.xml.clean.osm"))?;
    assert!(output.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
    assert!(!output.contains("<node"));
    assert!(output.contains("<osm version=\"0.6\" generator=\"streamdeck-osmapper\"/>"));

    // input left untouched
    assert_eq!(fs::read_to_string(&input)?, MAPPER_EXPORT);
    Ok(())
}

#[test]
fn name_rule_keeps_values_without_counter() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("icons.osm");
    fs::write(&input, NAMED_ICONS)?;

    osmclean()?
        .args(["--rule", "name"])
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::contains("Removed 1 node(s)"));

    let output = fs::read_to_string(dir.path().join("icons.osm.clean.osm"))?;
    assert!(!output.contains("sign.png7"));
    assert!(output.contains("<node id=\"2\">"));
    Ok(())
}

#[test]
fn second_run_on_cleaned_output_removes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("icons.osm");
    fs::write(&input, NAMED_ICONS)?;

    osmclean()?.args(["-r", "name"]).arg(&input).assert().success();
    let first = dir.path().join("icons.osm.clean.osm");

    osmclean()?
        .args(["-r", "name"])
        .arg(&first)
        .assert()
        .success()
        .stderr(predicate::str::contains("Removed 0 node(s)"));

    let second = dir.path().join("icons.osm.clean.osm.clean.osm");
    assert_eq!(fs::read_to_string(first)?, fs::read_to_string(second)?);
    Ok(())
}

#[test]
fn missing_input_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;

    osmclean()?
        .arg(dir.path().join("absent.osm"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to clean"));
    Ok(())
}

#[test]
fn malformed_input_fails_without_output() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("broken.osm");
    fs::write(&input, "<osm><node id=\"1\"></osm>")?;

    osmclean()?
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("mismatched closing tag"));

    assert!(!dir.path().join("broken.osm.clean.osm").exists());
    Ok(())
}

#[test]
fn requires_an_input_path() -> Result<(), Box<dyn std::error::Error>> {
    osmclean()?.assert().failure();
    Ok(())
}

#[test]
fn rejects_unknown_rule() -> Result<(), Box<dyn std::error::Error>> {
    osmclean()?
        .args(["--rule", "ref", "osm.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
    Ok(())
}

#[test]
fn keeps_latin1_output_encoding() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("latin1.osm");
    fs::write(
        &input,
        b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<osm>\
          <node id=\"1\"><tag k=\"fixme\" v=\"streamdeck-osmapper #7\"/></node>\
          <node id=\"2\"><tag k=\"name\" v=\"Sz\xE9ll K\xE1lm\xE1n t\xE9r\"/></node></osm>",
    )?;

    osmclean()?.arg(&input).assert().success();

    let output = fs::read(dir.path().join("latin1.osm.clean.osm"))?;
    let expected: &[u8] = b"<tag k=\"name\" v=\"Sz\xE9ll K\xE1lm\xE1n t\xE9r\"/>";
    assert!(output.windows(expected.len()).any(|w| w == expected));
    assert!(output.starts_with(b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n"));
    assert!(std::str::from_utf8(&output).is_err());
    Ok(())
}

#[test]
fn deep_nesting_fails_cleanly() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("deep.osm");
    fs::write(&input, format!("<osm>{}{}</osm>", "<x>".repeat(50_000), "</x>".repeat(50_000)))?;

    osmclean()?
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("max depth exceeded: 256"));
    Ok(())
}
