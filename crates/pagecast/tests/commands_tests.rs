//! Integration tests for plan, list, check and crontab

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::cargo_bin;
use pagecast_testkit::{temp_dir_in_workspace, with_isolated_env};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;

const CONFIG: &str = r##"
[fields]
author = "Sam"

[templates.weekly-map]
cadence = "weekly"
week_start = "sunday"
offset = 1
folder = "*_Weekly/_Weekly-Maps"
file_name = "Weekly Map {{ period.end }}.md"
body_file = "_Templates/weekly_map.md"
schedule = "0 22 * * 6"

[templates.monthly]
cadence = "monthly"
folder = "Monthly"
file_name = "{{ period.key }}.md"
body = "# {{ period.start | %B %Y }}\n"
"##;

/// Helper: a vault with a template body and the weekly folder
fn create_vault(root: &Path) {
    fs::create_dir_all(root.join("_Templates")).unwrap();
    fs::create_dir_all(root.join("10_Weekly/_Weekly-Maps")).unwrap();
    fs::write(root.join("_Templates/weekly_map.md"), "# {{ period.key }}\n").unwrap();
    fs::write(root.join("pagecast.toml"), CONFIG).unwrap();
}

fn pagecast(dir: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin!(env!("CARGO_PKG_NAME")));
    cmd.current_dir(dir);
    cmd
}

#[test]
fn test_cli_help_flag() {
    with_isolated_env(&[], |_home| {
        let temp = temp_dir_in_workspace();

        pagecast(temp.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage:"))
            .stdout(predicate::str::contains("run"))
            .stdout(predicate::str::contains("crontab"));
    });
}

#[test]
fn test_plan_does_not_write() {
    with_isolated_env(&[], |_home| {
        let temp = temp_dir_in_workspace();
        create_vault(temp.path());

        let output = pagecast(temp.path())
            .args(["plan", "weekly-map", "--at", "2026-10-17T22:00:00Z", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(
            json["path"],
            "10_Weekly/_Weekly-Maps/Weekly Map 2026-10-24.md"
        );
        assert_eq!(json["exists"], false);
        assert_eq!(json["period"]["start"], "2026-10-18");

        let written = fs::read_dir(temp.path().join("10_Weekly/_Weekly-Maps"))
            .unwrap()
            .count();
        assert_eq!(written, 0);
    });
}

#[test]
fn test_plan_human_output() {
    with_isolated_env(&[], |_home| {
        let temp = temp_dir_in_workspace();
        create_vault(temp.path());

        pagecast(temp.path())
            .args(["plan", "monthly", "--at", "2026-10-18T12:00:00Z"])
            .assert()
            .success()
            .stdout(predicate::str::contains("monthly 2026-10"))
            .stdout(predicate::str::contains("Monthly/2026-10.md"))
            .stdout(predicate::str::contains("run would create it"));
    });
}

#[test]
fn test_list_json() {
    with_isolated_env(&[], |_home| {
        let temp = temp_dir_in_workspace();
        create_vault(temp.path());

        let output = pagecast(temp.path())
            .args(["list", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let templates = json.as_array().unwrap();
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0]["name"], "monthly");
        assert_eq!(templates[0]["cadence"], "monthly");
        assert!(templates[0].get("schedule").is_none());
        assert_eq!(templates[1]["name"], "weekly-map");
        assert_eq!(templates[1]["cadence"], "weekly (from Sun)");
        assert_eq!(templates[1]["offset"], 1);
        assert_eq!(templates[1]["schedule"], "0 22 * * 6");
    });
}

#[test]
fn test_check_passes() {
    with_isolated_env(&[], |_home| {
        let temp = temp_dir_in_workspace();
        create_vault(temp.path());

        pagecast(temp.path())
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("Template 'weekly-map'"))
            .stdout(predicate::str::contains("Template 'monthly'"));
    });
}

#[test]
fn test_check_reports_broken_template() {
    with_isolated_env(&[], |_home| {
        let temp = temp_dir_in_workspace();
        create_vault(temp.path());
        fs::remove_file(temp.path().join("_Templates/weekly_map.md")).unwrap();

        let output = pagecast(temp.path())
            .args(["check", "--json"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(1));

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let checks = json["checks"].as_array().unwrap();
        let weekly = checks
            .iter()
            .find(|check| check["id"] == "template:weekly-map")
            .unwrap();
        assert_eq!(weekly["status"], "error");
        assert!(
            weekly["message"]
                .as_str()
                .unwrap()
                .contains("_Templates/weekly_map.md")
        );

        let monthly = checks
            .iter()
            .find(|check| check["id"] == "template:monthly")
            .unwrap();
        assert_eq!(monthly["status"], "ok");
    });
}

#[test]
fn test_check_reports_invalid_config() {
    with_isolated_env(&[], |_home| {
        let temp = temp_dir_in_workspace();
        fs::write(
            temp.path().join("pagecast.toml"),
            "[templates.bad]\ncadence = \"daily\"\nfile_name = \"x.md\"\n",
        )
        .unwrap();

        pagecast(temp.path())
            .arg("check")
            .assert()
            .failure()
            .stdout(predicate::str::contains("CONFIG_INVALID_VALUE"))
            .stderr(predicate::str::contains("1 check(s) failed"));
    });
}

#[test]
fn test_crontab_lines() {
    with_isolated_env(&[], |_home| {
        let temp = temp_dir_in_workspace();
        create_vault(temp.path());

        pagecast(temp.path())
            .args(["crontab", "--bin", "/usr/local/bin/pagecast"])
            .assert()
            .success()
            .stdout(predicate::str::is_match(
                r"(?m)^0 22 \* \* 6 /usr/local/bin/pagecast --config \S+pagecast\.toml run weekly-map$",
            ).unwrap())
            .stdout(predicate::str::contains("# monthly: no schedule"));
    });
}
