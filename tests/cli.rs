use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_temp(suffix: &str, contents: &str) -> NamedTempFile {
    let mut tmp = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp file");
    tmp.write_all(contents.as_bytes()).expect("write temp file");
    tmp
}

fn seascape() -> Command {
    Command::cargo_bin("seascape").expect("binary exists")
}

#[test]
fn headless_run_advances_water_at_fixed_step() {
    let mut cmd = seascape();
    cmd.args(["--headless", "60"]);
    cmd.assert()
        .success()
        .stdout(contains("Preset ocean"))
        .stdout(contains("Rendered 60 frame(s)"))
        .stdout(contains(
            "Parameters: elevation=0.50 azimuth=180.00 distortionScale=3.70 size=1.00",
        ))
        .stdout(contains("Water time: 0.5000"))
        .stdout(contains("Environment map generation: 1"));
}

#[test]
fn xml_config_moves_the_sun() {
    let config = write_temp(
        ".xml",
        r#"<scene>
  <elevation>30</elevation>
  <distortionScale>99</distortionScale>
</scene>
"#,
    );
    let mut cmd = seascape();
    cmd.arg("--config").arg(config.path()).args(["--headless", "1"]);
    cmd.assert()
        .success()
        .stdout(contains("distortion 8.00,"))
        .stdout(contains("distortion 99").not())
        .stdout(contains("elevation=30.00 azimuth=180.00 distortionScale=8.00"))
        .stdout(contains("0.5000, -0.8660)"))
        .stdout(contains("Water time: 0.0083"));
}

#[test]
fn model_override_places_the_mesh_on_the_water() {
    let model = write_temp(
        ".obj",
        "v 0 0 0\nv 1 0 0\nv 0 2 0\nf 1 2 3\n",
    );
    let mut cmd = seascape();
    cmd.arg("--model").arg(model.path()).args(["--headless", "2"]);
    cmd.assert()
        .success()
        .stdout(contains("Model origin: (-5.00, 0.00, 0.00)"));
}

#[test]
fn unknown_preset_is_rejected() {
    let mut cmd = seascape();
    cmd.args(["--preset", "desert", "--headless", "1"]);
    cmd.assert().failure().stderr(contains("unknown preset"));
}

#[test]
fn unknown_argument_prints_usage() {
    let mut cmd = seascape();
    cmd.arg("--bogus");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --bogus"))
        .stderr(contains("Usage: seascape"));
}

#[test]
fn malformed_config_is_reported() {
    let config = write_temp(".xml", "<scene><elevation>high</elevation></scene>");
    let mut cmd = seascape();
    cmd.arg("--config").arg(config.path()).args(["--headless", "1"]);
    cmd.assert().failure().stderr(contains("failed to parse"));
}
