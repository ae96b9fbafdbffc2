//! End-to-end strip runs on tree files through the library API.

use std::fs;
use std::path::Path;

use assert_fs::prelude::*;
use h5strip::store::tree::{AttrValue, Dataset, Dtype, TreeFile};
use h5strip::{Config, Container, FileOutcome, Format, strip_all, strip_file};

fn tree_config(out: &Path) -> Config {
    Config {
        format: Format::Tree,
        ..Config::new(out)
    }
}

fn lcls_like(path: &Path) {
    let mut t = TreeFile::in_memory();
    t.insert_dataset(
        "/run/CsPad0/image",
        Dataset::from_u16(&[2, 2], &[10, 20, 30, 40]).with_attr("gain", AttrValue::Float(1.5)),
    )
    .unwrap();
    t.insert_dataset(
        "/run/meta/temperature",
        Dataset::scalar_f64(293.15).with_attr("units", AttrValue::Text("K".into())),
    )
    .unwrap();
    t.save(path).unwrap();
}

fn stripped(outcome: FileOutcome) -> h5strip::FileReport {
    match outcome {
        FileOutcome::Stripped(r) => r,
        other => panic!("expected a stripped file, got {other:?}"),
    }
}

#[test]
fn cspad_is_dropped_and_metadata_kept() {
    let temp = assert_fs::TempDir::new().unwrap();
    let src = temp.child("r0001.h5t");
    lcls_like(src.path());
    let out = temp.child("out");
    out.create_dir_all().unwrap();

    let cfg = Config {
        skip_list: vec!["CsPad".into()],
        ..tree_config(out.path())
    };
    let report = stripped(strip_file(src.path(), &cfg, &cfg.matcher().unwrap()).unwrap());
    assert_eq!(report.output, out.path().join("r0001.stripped.h5t"));
    assert_eq!((report.kept, report.excluded, report.copied), (1, 1, 1));
    assert!(report.failures.is_empty());

    let dst = TreeFile::open(&report.output).unwrap();
    assert_eq!(dst.dataset_paths(), vec!["/run/meta/temperature"]);
    assert!(dst.get("/run/CsPad0").is_none());

    let original = TreeFile::open(src.path()).unwrap();
    assert_eq!(
        dst.dataset("/run/meta/temperature"),
        original.dataset("/run/meta/temperature")
    );
}

#[test]
fn empty_skip_list_round_trips_every_dataset() {
    let temp = assert_fs::TempDir::new().unwrap();
    let src = temp.child("full.h5t");
    lcls_like(src.path());

    let cfg = Config {
        skip_list: Vec::new(),
        ..tree_config(temp.path())
    };
    let report = stripped(strip_file(src.path(), &cfg, &cfg.matcher().unwrap()).unwrap());

    let a = TreeFile::open(src.path()).unwrap();
    let b = TreeFile::open(&report.output).unwrap();
    assert_eq!(a.dataset_paths(), b.dataset_paths());
    for path in a.dataset_paths() {
        assert_eq!(a.dataset(&path), b.dataset(&path), "{path} differs");
    }
}

#[test]
fn one_faulty_dataset_among_ten() {
    let temp = assert_fs::TempDir::new().unwrap();
    let src = temp.child("faulty.h5t");
    let mut t = TreeFile::in_memory();
    for i in 0..10 {
        let ds = if i == 6 {
            Dataset::new(Dtype::ObjectRef, vec![2], vec![0; 16])
        } else {
            Dataset::from_f64(&[3], &[i as f64, 0.0, -1.0])
        };
        t.insert_dataset(&format!("/epics/pv{i}"), ds).unwrap();
    }
    t.save(src.path()).unwrap();

    let cfg = tree_config(temp.path());
    let report = stripped(strip_file(src.path(), &cfg, &cfg.matcher().unwrap()).unwrap());
    assert_eq!(report.kept, 10);
    assert_eq!(report.copied, 9);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, "/epics/pv6");

    let dst = TreeFile::open(&report.output).unwrap();
    assert_eq!(dst.dataset_paths().len(), 9);
    assert!(dst.get("/epics/pv6").is_none());
}

#[test]
fn second_run_without_force_opens_nothing() {
    let temp = assert_fs::TempDir::new().unwrap();
    let src = temp.child("again.h5t");
    lcls_like(src.path());
    let cfg = tree_config(temp.path());
    let matcher = cfg.matcher().unwrap();

    let first = stripped(strip_file(src.path(), &cfg, &matcher).unwrap());
    let before = fs::read(&first.output).unwrap();

    // The source is gone, so any attempt to open it would fail.
    fs::remove_file(src.path()).unwrap();
    match strip_file(src.path(), &cfg, &matcher).unwrap() {
        FileOutcome::SkippedExisting { output, .. } => assert_eq!(output, first.output),
        other => panic!("expected skip, got {other:?}"),
    }
    assert_eq!(fs::read(&first.output).unwrap(), before);
}

#[test]
fn force_with_no_skip_rebuilds_existing_output() {
    let temp = assert_fs::TempDir::new().unwrap();
    let src = temp.child("rebuild.h5t");
    lcls_like(src.path());
    let stale = temp.child("rebuild.stripped.h5t");
    stale.write_str("stale partial output").unwrap();

    let cfg = Config {
        force: true,
        no_skip: true,
        ..tree_config(temp.path())
    };
    let report = stripped(strip_file(src.path(), &cfg, &cfg.matcher().unwrap()).unwrap());
    assert_eq!(report.output, stale.path());

    let a = TreeFile::open(src.path()).unwrap();
    let b = TreeFile::open(stale.path()).unwrap();
    assert_eq!(b.dataset_paths(), a.dataset_paths());
    assert_eq!(
        b.dataset("/run/CsPad0/image"),
        a.dataset("/run/CsPad0/image")
    );
}

#[test]
fn unreadable_file_does_not_stop_the_batch() {
    let temp = assert_fs::TempDir::new().unwrap();
    let broken = temp.child("a_broken.h5t");
    broken.write_str("this is not a container").unwrap();
    let good = temp.child("b_good.h5t");
    lcls_like(good.path());
    let missing = temp.path().join("c_missing.h5t");

    let cfg = tree_config(temp.path());
    let inputs = vec![broken.path().to_path_buf(), good.path().to_path_buf(), missing];
    let report = strip_all(&inputs, &cfg, &cfg.matcher().unwrap());

    assert_eq!(report.stripped.len(), 1);
    assert_eq!(report.failed.len(), 2);
    assert_eq!(report.failed[0].source, broken.path());
    assert!(temp.child("b_good.stripped.h5t").path().exists());
}

#[test]
fn oversized_shape_fails_one_node_not_the_batch() {
    let temp = assert_fs::TempDir::new().unwrap();
    let src = temp.child("a_huge.h5t");
    let mut t = TreeFile::in_memory();
    t.insert_dataset(
        "/meta/bad",
        Dataset::new(Dtype::Float64, vec![1 << 40, 1 << 40], vec![0; 8]),
    )
    .unwrap();
    t.insert_dataset("/meta/ok", Dataset::scalar_f64(4.2)).unwrap();
    t.save(src.path()).unwrap();
    let next = temp.child("b_next.h5t");
    lcls_like(next.path());

    let cfg = tree_config(temp.path());
    let inputs = vec![src.path().to_path_buf(), next.path().to_path_buf()];
    let report = strip_all(&inputs, &cfg, &cfg.matcher().unwrap());

    assert!(report.failed.is_empty());
    assert_eq!(report.stripped.len(), 2);
    let huge = &report.stripped[0];
    assert_eq!(huge.copied, 1);
    assert_eq!(huge.failures.len(), 1);
    assert_eq!(huge.failures[0].path, "/meta/bad");

    let dst = TreeFile::open(&huge.output).unwrap();
    assert_eq!(dst.dataset_paths(), vec!["/meta/ok"]);
}
