//! XML config parsing, end to end, against a file in a temp directory.

use std::fs;
use tempfile::tempdir;

use h5strip::store::Format;
use h5strip::{LogLevel, load_config, load_config_from_xml_path};

#[test]
fn reads_config_xml_and_applies_values() {
    let td = tempdir().expect("create tempdir");

    let cfg_path = td.path().join("config.xml");
    let out_folder = td.path().join("stripped");
    let log_file = td.path().join("h5strip.log");

    let xml = format!(
        r#"
<config>
  <out_folder>{}</out_folder>
  <skip_list>Epix10k, Jungfrau</skip_list>
  <literal>true</literal>
  <format>tree</format>
  <log_level>info</log_level>
  <log_file>{}</log_file>
</config>
"#,
        out_folder.display(),
        log_file.display()
    );
    fs::write(&cfg_path, xml).expect("write config.xml");

    let cfg = load_config_from_xml_path(&cfg_path).expect("load_config_from_xml_path");

    assert_eq!(cfg.out_folder, out_folder);
    assert_eq!(cfg.skip_list, vec!["Epix10k", "Jungfrau"]);
    assert!(cfg.literal);
    assert!(!cfg.no_skip);
    assert_eq!(cfg.format, Format::Tree);
    assert_eq!(cfg.log_level, LogLevel::Info);
    assert_eq!(cfg.log_file.as_deref(), Some(log_file.as_path()));
}

#[test]
fn empty_elements_fall_back_to_defaults() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(
        &cfg_path,
        "<config>\n  <skip_list></skip_list>\n  <log_file></log_file>\n</config>\n",
    )
    .unwrap();

    let cfg = load_config(Some(&cfg_path)).unwrap();
    assert_eq!(cfg.skip_list, vec!["CsPad", "Camera"]);
    assert!(cfg.log_file.is_none());
}

#[test]
fn malformed_xml_is_an_error() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(&cfg_path, "<config><log_level>debug</config>").unwrap();
    assert!(load_config_from_xml_path(&cfg_path).is_err());
}

#[test]
fn literal_patterns_from_config_are_not_regexes() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(
        &cfg_path,
        "<config><skip_list>Cs.ad</skip_list><literal>true</literal></config>",
    )
    .unwrap();

    let m = load_config_from_xml_path(&cfg_path)
        .unwrap()
        .matcher()
        .unwrap();
    assert!(m.keeps("/run/CsPad/data"));
    assert!(m.matches("/run/Cs.ad/data"));
}
