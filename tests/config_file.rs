use std::fs;
use std::io::Write;

use apriori::{AprioriError, Miner, MinerConfig, Target};
use tempfile::NamedTempFile;

const TRANSACTIONS: &str = "a b c\na b\na c\nb c\na b c\n";

#[test]
fn test_config_from_file_drives_miner() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
target = "maximal"
min_support = 0.4
format = " %a"
"#
    )
    .unwrap();

    let config = MinerConfig::from_path(file.path()).unwrap();
    assert_eq!(config.target, Target::Maximal);

    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("sets.txt");
    let out = fs::File::create(&out_path).unwrap();
    let summary = Miner::new(config)
        .unwrap()
        .run_reader(TRANSACTIONS.as_bytes(), out)
        .unwrap();
    assert_eq!(summary.written, 1);
    assert_eq!(summary.transactions, 4);
    assert_eq!(fs::read_to_string(&out_path).unwrap(), "a b c 2\n");
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = MinerConfig::from_path(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, AprioriError::FileOpen { .. }));
}

#[test]
fn test_invalid_config_rejected() {
    let err = MinerConfig::from_toml_str("min_confidence = 1.5").unwrap_err();
    assert!(matches!(err, AprioriError::InvalidConfidence(_)));
    let err = MinerConfig::from_toml_str("target = 42").unwrap_err();
    assert!(matches!(err, AprioriError::Config(_)));
}

#[test]
fn test_config_survives_toml_round_trip() {
    let config = MinerConfig {
        target: Target::Rules,
        min_support: -2.0,
        max_size: Some(4),
        appearances: [("milk".to_string(), apriori::Appearance::Body)]
            .into_iter()
            .collect(),
        ..MinerConfig::default()
    };
    let text = config.to_toml_string().unwrap();
    assert_eq!(MinerConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn test_rule_output_format() {
    let config = MinerConfig {
        target: Target::Rules,
        min_support: 0.4,
        min_confidence: 0.7,
        min_size: 2,
        max_size: Some(2),
        ..MinerConfig::default()
    };
    let mut out = Vec::new();
    Miner::new(config)
        .unwrap()
        .run_reader(TRANSACTIONS.as_bytes(), &mut out)
        .unwrap();
    let text = String::from_utf8(out).unwrap();
    // every pair has support 3 of 5 and each item 4 of 5
    assert_eq!(text.lines().count(), 6);
    assert!(text.lines().all(|line| line.ends_with("  (80.0, 75.0)")));
}
