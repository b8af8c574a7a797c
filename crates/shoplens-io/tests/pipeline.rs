//! End-to-end integration tests: CSV -> split -> train -> evaluate -> JSON.

use std::fs;
use std::io::Write;
use std::path::Path;

use shoplens_io::{
    DatasetError, DatasetReader, ExperimentName, LABEL_COLUMN, ReportWriter, SplitSizes,
};
use shoplens_rf::{RandomForestConfig, RfError, TrainTestSplit, evaluate, train};
use tempfile::{NamedTempFile, TempDir};

/// Path to the test fixture directory.
fn fixture_path(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn evaluate_round_trip() {
    // 1. Read CSV and separate the label
    let dataset = DatasetReader::new(&fixture_path("purchases.csv"))
        .read()
        .expect("fixture should parse");
    assert_eq!(dataset.n_rows(), 100);
    let data = dataset.split_features(LABEL_COLUMN).unwrap();
    assert_eq!(data.n_features(), 8);
    assert!(!data.feature_names.iter().any(|n| n == LABEL_COLUMN));

    // 2. Partition 80/20
    let partition = TrainTestSplit::new(0.2).unwrap().with_seed(42).split(data.n_samples());
    assert_eq!(partition.holdout.len(), 20);
    assert_eq!(partition.train.len(), 80);
    let (train_x, train_y) = data.select(&partition.train);
    let (test_x, test_y) = data.select(&partition.holdout);

    // 3. Train and evaluate
    let config = RandomForestConfig::new(100).unwrap().with_seed(42);
    let model = train(&config, &train_x, &train_y, &data.feature_names).unwrap();
    let eval = evaluate(&config, &model, &test_x, &test_y).unwrap();
    assert_eq!(eval.predicted.len(), 20);
    assert!((0.0..=1.0).contains(&eval.accuracy));

    // 4. Write JSON artifact
    let dir = TempDir::new().unwrap();
    let writer = ReportWriter::new(dir.path(), ExperimentName::new("fixture".into()).unwrap()).unwrap();
    let split = SplitSizes {
        n_train: partition.train.len(),
        n_holdout: partition.holdout.len(),
    };
    writer
        .write_evaluation(&eval, model.importances(), split)
        .unwrap();

    // 5. Deserialize back and verify
    let json_path = dir.path().join("fixture_evaluate.json");
    let content: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();

    assert_eq!(content["experiment"], "fixture");
    assert_eq!(content["split"]["n_train"], 80);
    assert_eq!(content["split"]["n_holdout"], 20);
    assert_eq!(content["accuracy_percent"], eval.accuracy_percent());

    let matrix = content["confusion_matrix"].as_array().unwrap();
    assert_eq!(matrix.len(), 2);
    let total: u64 = matrix
        .iter()
        .flat_map(|row| row.as_array().unwrap())
        .map(|v| v.as_u64().unwrap())
        .sum();
    assert_eq!(total, 20);

    let importances = content["feature_importances"].as_array().unwrap();
    assert_eq!(importances.len(), 8);
    let sum: f64 = importances
        .iter()
        .map(|f| f["importance"].as_f64().unwrap())
        .sum();
    assert!((sum - 1.0).abs() < 1e-9);
    assert_eq!(importances[0]["rank"], 1);

    let classes = content["class_metrics"].as_array().unwrap();
    assert_eq!(classes.len(), 2);
    for class in classes {
        for key in ["precision", "recall", "f1"] {
            let v = class[key].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&v), "{key} = {v}");
        }
    }
}

#[test]
fn categorical_feature_needs_encoding() {
    let mut f = NamedTempFile::new().unwrap();
    let mut csv = String::from(
        "Age,AnnualIncome,NumberOfPurchases,ProductCategory,TimeSpentOnWebsite,Device,PurchaseStatus\n",
    );
    for i in 0..30 {
        let device = if i % 2 == 0 { "mobile" } else { "desktop" };
        csv.push_str(&format!("{},{},{},{},{},{device},{}\n", 20 + i, 30_000 + i * 1000, i % 7, i % 5, i, i % 2));
    }
    f.write_all(csv.as_bytes()).unwrap();
    f.flush().unwrap();

    let mut dataset = DatasetReader::new(f.path()).read().unwrap();
    let err = dataset.split_features(LABEL_COLUMN).unwrap_err();
    assert!(matches!(err, DatasetError::NonNumericFeature { ref column } if column == "Device"));

    let encoded = dataset.encode_all_categoricals(LABEL_COLUMN).unwrap();
    assert_eq!(encoded, vec!["Device"]);
    let data = dataset.split_features(LABEL_COLUMN).unwrap();
    // desktop < mobile
    assert_eq!(data.features[0][5], 1.0);
    assert_eq!(data.features[1][5], 0.0);

    let config = RandomForestConfig::new(10).unwrap();
    let model = train(&config, &data.features, &data.labels, &data.feature_names).unwrap();
    assert_eq!(model.forest().n_features(), 6);
}

#[test]
fn single_class_dataset_fails_training() {
    let mut f = NamedTempFile::new().unwrap();
    let mut csv = String::from(
        "Age,AnnualIncome,NumberOfPurchases,ProductCategory,TimeSpentOnWebsite,PurchaseStatus\n",
    );
    for i in 0..10 {
        csv.push_str(&format!("{},{},{},{},{},1\n", 20 + i, 40_000, i, i % 3, 10 + i));
    }
    f.write_all(csv.as_bytes()).unwrap();
    f.flush().unwrap();

    let data = DatasetReader::new(f.path())
        .read()
        .unwrap()
        .split_features(LABEL_COLUMN)
        .unwrap();
    let config = RandomForestConfig::new(10).unwrap();
    let err = train(&config, &data.features, &data.labels, &data.feature_names).unwrap_err();
    assert!(matches!(err, RfError::SingleClass { class: 1 }));
}
