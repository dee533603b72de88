use anyhow::Result;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

const MANIFEST: &str = "name: shop\nstatistics-path: stats.yaml\n";

const SCHEMA: &str = r#"
relations:
  - name: emp
    columns: [{ name: id }, { name: salary }, { name: bio }]
  - name: sales
    columns: [{ name: price }, { name: qty }]
"#;

const DESIGN: &str = r#"
entries:
  - { relation: emp, column: salary, onions: [DET, OPE] }
  - { relation: emp, column: bio, onions: [SWP] }
  - { relation: sales, expr: "price * qty", onions: [HOM_AGG] }
hom_groups:
  sales:
    - ["price * qty"]
"#;

const STATS: &str = "rows:\n  emp: 100\n  sales: 5000\n";

const REPORT_QUERY: &str = r#"
name: report
requirements:
  - { relation: emp, column: salary, capability: order }
  - { relation: emp, column: bio, capability: search }
  - { relation: sales, expr: "PRICE * qty", capability: aggregate }
"#;

/// A throwaway veil project: manifest, schema, design, statistics.
struct VeilTestEnv {
    _tmp: TempDir,
    root: PathBuf,
}

impl VeilTestEnv {
    fn new() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let root = tmp.path().join("shop");
        fs::create_dir_all(&root)?;

        let env = Self { _tmp: tmp, root };
        env.write("veil.yaml", MANIFEST)?;
        env.write("schema.yaml", SCHEMA)?;
        env.write("design.yaml", DESIGN)?;
        env.write("stats.yaml", STATS)?;
        env.write("report.yaml", REPORT_QUERY)?;
        Ok(env)
    }

    fn write(&self, name: &str, content: &str) -> Result<()> {
        fs::write(self.root.join(name), content)?;
        Ok(())
    }

    fn veil(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("veil"));
        cmd.current_dir(&self.root);
        cmd
    }

    fn stdout(&self, args: &[&str]) -> Result<String> {
        let output = self.veil().args(args).output()?;
        assert!(output.status.success(), "veil {:?} failed", args);
        Ok(String::from_utf8(output.stdout)?)
    }
}

#[test]
fn test_inspect_compact() -> Result<()> {
    let env = VeilTestEnv::new()?;
    let out = env.stdout(&["inspect", "--compact"])?;
    insta::assert_snapshot!(out.trim_end(), @r"
    emp.bio=SWP
    emp.salary=(DET|OPE)
    sales._virtual_local_0[price * qty]=HOM_AGG
    sales#0{price * qty}
    ");
    Ok(())
}

#[test]
fn test_inspect_table_with_completion() -> Result<()> {
    let env = VeilTestEnv::new()?;
    env.veil()
        .args(["inspect", "--complete"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Relation"))
        .stdout(predicate::str::contains("_virtual_local_0"))
        .stdout(predicate::str::contains("#0.0"))
        .stdout(predicate::str::contains("6 entries"));
    Ok(())
}

#[test]
fn test_complete_writes_design() -> Result<()> {
    let env = VeilTestEnv::new()?;
    env.veil()
        .args(["complete", "--output", "out/completed.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 added"));

    let written = fs::read_to_string(env.root.join("out/completed.yaml"))?;
    assert!(written.contains("column: id"));
    assert!(written.contains("hom_groups"));

    // The written design is a valid input again.
    env.veil()
        .args(["inspect", "--compact", "--design", "out/completed.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("emp.bio=(DET|SWP)"));
    Ok(())
}

#[test]
fn test_merge_designs() -> Result<()> {
    let env = VeilTestEnv::new()?;
    env.write(
        "extra.yaml",
        "entries:\n  - { relation: sales, expr: \"price + qty\", onions: [OPE] }\n  - { relation: emp, column: salary, onions: [SWP] }\n",
    )?;

    env.veil()
        .args(["merge", "design.yaml", "extra.yaml", "-o", "merged.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4 entries"));

    let out = env.stdout(&["inspect", "--compact", "--design", "merged.yaml"])?;
    assert!(out.contains("emp.salary=(DET|OPE|SWP)"));
    assert!(out.contains("sales._virtual_local_0[price * qty]=HOM_AGG"));
    assert!(out.contains("sales._virtual_local_1[price + qty]=OPE"));
    Ok(())
}

#[test]
fn test_merge_with_global_names() -> Result<()> {
    let env = VeilTestEnv::new()?;
    env.veil()
        .args(["merge", "design.yaml", "--global-names", "-o", "global.yaml"])
        .assert()
        .success();

    env.veil()
        .args(["inspect", "--compact", "--design", "global.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "sales._virtual_global_0[price * qty]=HOM_AGG",
        ));
    Ok(())
}

#[test]
fn test_plan_text() -> Result<()> {
    let env = VeilTestEnv::new()?;
    let out = env.stdout(&["plan", "report.yaml"])?;
    insta::assert_snapshot!(out.trim_end(), @r"
    ⚡ Plan for 'report'
    emp.salary [salary] order via OPE (oOPE, server)
    emp.bio [bio] search via SWP (oSWP, server)
    sales._virtual_local_0 [price * qty] aggregate via HOM_AGG(sales#0) (oAGG, server)
       cost 40600.00, ~5000 rows, 0 client-side step(s), 1 candidate(s)
    ");
    Ok(())
}

#[test]
fn test_plan_json() -> Result<()> {
    let env = VeilTestEnv::new()?;
    let out = env.stdout(&["plan", "report.yaml", "--format", "json"])?;
    let json: serde_json::Value = serde_json::from_str(&out)?;

    assert_eq!(json["query"], "report");
    assert_eq!(json["candidates"], 1);
    assert_eq!(json["rows"], 5000);
    assert_eq!(json["steps"][2]["binding"]["kind"], "hom_group");
    assert_eq!(json["steps"][2]["binding"]["group"], 0);
    Ok(())
}

#[test]
fn test_plan_falls_back_to_client() -> Result<()> {
    let env = VeilTestEnv::new()?;
    env.write(
        "sorted.yaml",
        "requirements:\n  - { relation: emp, column: bio, capability: order }\n",
    )?;
    env.veil()
        .args(["plan", "sorted.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "emp.bio [bio] order via DET (oDET, client)",
        ));
    Ok(())
}

#[test]
fn test_plan_without_admissible_onion_fails() -> Result<()> {
    let env = VeilTestEnv::new()?;
    env.write(
        "ghost.yaml",
        "requirements:\n  - { relation: emp, column: ssn, capability: equality }\n",
    )?;
    env.veil()
        .args(["plan", "ghost.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No admissible plan"));
    Ok(())
}

#[test]
fn test_plain_onion_in_design_fails() -> Result<()> {
    let env = VeilTestEnv::new()?;
    env.write(
        "design.yaml",
        "entries:\n  - { relation: emp, column: id, onions: [PLAIN] }\n",
    )?;
    env.veil().args(["inspect"]).assert().failure();
    Ok(())
}

#[test]
fn test_missing_manifest_fails() -> Result<()> {
    let env = VeilTestEnv::new()?;
    fs::remove_file(env.root.join("veil.yaml"))?;
    env.veil()
        .args(["inspect"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No configuration file found"));
    Ok(())
}
