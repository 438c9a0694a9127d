use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn tree_prune() -> Command {
    Command::cargo_bin("tree-prune").unwrap()
}

#[test]
fn reports_loaded_shared_and_written() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("g1.treefile"), "((x_gene1,y_gene1),z_gene1);").unwrap();
    fs::write(dir.path().join("g2.tree"), "(x_gene2,(y_gene2,w_gene2));").unwrap();
    fs::write(dir.path().join("notes.txt"), "not a tree").unwrap();

    tree_prune()
        .arg("--dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 2 trees."))
        .stdout(predicate::str::contains("Found 2 shared taxa."))
        .stdout(predicate::str::contains("Pruned tree saved to:").count(2));

    assert!(dir.path().join("g1_pruned.tree").exists());
    assert!(dir.path().join("g2_pruned.tree").exists());
}

#[test]
fn no_tree_files_is_not_a_failure() {
    let dir = tempdir().unwrap();
    tree_prune()
        .arg("--dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No tree files found."));
}

#[test]
fn quiet_mode_prints_nothing() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("g1.tree"), "(a,b);").unwrap();
    fs::write(dir.path().join("g2.tree"), "(a,c);").unwrap();

    tree_prune()
        .args(["--quiet", "--dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn empty_intersection_is_warned_about() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("g1.tree"), "(a,b);").unwrap();
    fs::write(dir.path().join("g2.tree"), "(c,d);").unwrap();

    tree_prune()
        .arg("--dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 0 shared taxa."))
        .stderr(predicate::str::contains("no taxon is shared"));
}

#[test]
fn parse_failure_exits_with_code_2() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("g1.tree"), "(a,b);").unwrap();
    fs::write(dir.path().join("g2.tree"), "   ").unwrap();

    tree_prune()
        .arg("--dir")
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("g2.tree"));
}

#[test]
fn explicit_inputs_with_dedup_and_seed() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.nwk");
    let b = dir.path().join("b.nwk");
    fs::write(&a, "((x_gene1,x_gene2),y_gene1);").unwrap();
    fs::write(&b, "(x_gene3,y_gene3);").unwrap();

    tree_prune()
        .arg("-i")
        .arg(&a)
        .arg("-i")
        .arg(&b)
        .args(["--dedup", "--seed", "7", "--suffix", "_shared", "--out-ext", "nwk"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 duplicate leaves."));

    let pruned = fs::read_to_string(dir.path().join("a_shared.nwk")).unwrap();
    assert_eq!(pruned.matches("x_gene").count(), 1);
    assert!(pruned.contains("y_gene1"));
}

#[test]
fn unparenthesized_list_exits_with_code_2() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("g1.tree"), "(a,b);").unwrap();
    fs::write(dir.path().join("g2.tree"), "a,b;").unwrap();

    tree_prune()
        .arg("--dir")
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("g2.tree"));
}

#[test]
fn pruned_single_leaf_output_can_be_fed_back() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("g1.tree"), "(x_gene1,y_gene1);").unwrap();
    fs::write(dir.path().join("g2.tree"), "(x_gene2,z_gene1);").unwrap();

    tree_prune().arg("--dir").arg(dir.path()).assert().success();
    assert_eq!(fs::read_to_string(dir.path().join("g1_pruned.tree")).unwrap(), "x_gene1;\n");

    tree_prune()
        .args(["--suffix", "_again", "-i"])
        .arg(dir.path().join("g1_pruned.tree"))
        .arg("-i")
        .arg(dir.path().join("g2_pruned.tree"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 shared taxa."));
}

#[test]
fn colliding_outputs_fail_before_writing() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("g1.tree"), "(a,b);").unwrap();
    fs::write(dir.path().join("g1.treefile"), "(a,c);").unwrap();

    tree_prune()
        .arg("--dir")
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("g1_pruned.tree"));
    assert!(!dir.path().join("g1_pruned.tree").exists());
}
