use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use churn_lens::data::loader::load_file;
use churn_lens::{aggregate, Attribute, EngineError, FilterSpec, Session, Variable};
use parquet::arrow::ArrowWriter;
use tempfile::TempDir;

const CSV: &str = "\
RowNumber,CustomerId,Surname,CreditScore,Geography,Gender,Age,Tenure,Balance,NumOfProducts,HasCrCard,IsActiveMember,EstimatedSalary,Exited,Complain,Satisfaction Score,Card Type,Point Earned,Nickname
1,15634602,Hargrave,619,France,Female,42,2,0,1,1,1,101348.88,1,1,2,DIAMOND,464,Harry
2,15647311,Hill,608,Spain,Female,41,1,83807.86,1,0,1,112542.58,0,1,3,DIAMOND,456,
3,15619304,Onio,502,France,Female,42,8,159660.8,3,1,0,113931.57,1,1,3,DIAMOND,377,
4,15701354,Boni,699,France,Female,39,1,0,2,0,0,93826.63,0,0,5,GOLD,350,
5,15737888,Mitchell,850,Spain,Female,43,2,,1,1,1,79084.1,0,0,5,GOLD,425,
";

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn loads_bank_churn_csv() {
    let dir = TempDir::new().unwrap();
    let ds = load_file(&write(&dir, "churn.csv", CSV)).unwrap();

    assert_eq!(ds.len(), 5);
    assert_eq!(ds.columns().len(), Attribute::ALL.len());
    assert_eq!(ds.records()[0].geography.as_deref(), Some("France"));
    assert_eq!(ds.records()[2].balance, Some(159_660.8));
    // Empty balance cell is a null, not zero.
    assert_eq!(ds.records()[4].balance, None);

    let rows = aggregate(&ds, "Geography", "Exited").unwrap();
    assert_eq!(rows[0].category, "France");
    assert_eq!(rows[0].count, 3);
    assert!((rows[0].churn_rate - 200.0 / 3.0).abs() < 1e-9);
}

#[test]
fn csv_with_subset_of_columns() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "slim.csv", "Age,Exited\n30,1\n45,0\n");
    let ds = load_file(&path).unwrap();
    assert_eq!(ds.columns(), &[Attribute::Age, Attribute::Exited]);

    let spec = FilterSpec::new().one_of("Geography", ["France"]);
    assert!(churn_lens::apply(&ds, &spec).is_err());
}

#[test]
fn rejects_non_binary_outcome() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "bad.csv", "Age,Exited\n30,2\n");
    let err = load_file(&path).unwrap_err();
    assert!(format!("{err:#}").contains("Exited"));
}

#[test]
fn loads_records_json() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "churn.json",
        r#"[
            {"CreditScore": 619, "Geography": "France", "Balance": 0.0, "Exited": 1,
             "Satisfaction Score": 2},
            {"CreditScore": 608, "Geography": "Spain", "Balance": 83807.86, "Exited": 0,
             "Extra": true},
            {"CreditScore": null, "Geography": "Spain", "Exited": 1}
        ]"#,
    );
    let ds = load_file(&path).unwrap();
    assert_eq!(ds.len(), 3);
    assert!(ds.has_column(Attribute::SatisfactionScore));
    assert!(!ds.has_column(Attribute::Age));
    assert_eq!(ds.records()[2].credit_score, None);
    assert_eq!(ds.records()[0].satisfaction_score, Some(2));
}

#[test]
fn session_over_loaded_file() {
    let dir = TempDir::new().unwrap();
    let ds = load_file(&write(&dir, "churn.csv", CSV)).unwrap();
    let mut session = Session::new(ds, 24.4);
    session
        .set_filters(FilterSpec::new().range("CreditScore", 600.0, 700.0).unwrap())
        .unwrap();
    assert_eq!(session.filtered().len(), 3);

    let rows = session.analyze(Variable::Complaints).unwrap();
    let cats: Vec<&str> = rows.iter().map(|r| r.category.as_str()).collect();
    assert_eq!(cats, ["Filed Complaints", "No Complaints"]);

    let metrics = session.metrics();
    assert_eq!(metrics.total_customers, 3);
    assert!((metrics.churn_rate - 100.0 / 3.0).abs() < 1e-9);
}

#[test]
fn report_survives_missing_columns() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "slim.csv",
        "CreditScore,Geography,Age,Balance,Exited\n\
         619,France,25,0,1\n\
         608,Spain,45,83807.86,0\n\
         502,France,61,159660.8,1\n",
    );
    let session = Session::new(load_file(&path).unwrap(), 24.4);

    assert!(matches!(
        session.analyze(Variable::Complaints),
        Err(EngineError::SchemaMismatch { .. })
    ));
    assert!(session.analyze_or_empty(Variable::Complaints).unwrap().is_empty());
    assert!(session.analyze_or_empty(Variable::SatisfactionScore).unwrap().is_empty());

    let ages = session.analyze_or_empty(Variable::Age).unwrap();
    let cats: Vec<&str> = ages.iter().map(|r| r.category.as_str()).collect();
    assert_eq!(cats, ["Young", "Middle", "Senior"]);
    let geo = session.analyze_or_empty(Variable::Geography).unwrap();
    assert_eq!(geo[0].category, "France");
    assert_eq!(geo[0].count, 2);
}

#[test]
fn loads_parquet_columns() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("churn.parquet");

    let batch = RecordBatch::try_from_iter(vec![
        ("CreditScore", Arc::new(Int64Array::from(vec![619, 700])) as ArrayRef),
        ("Balance", Arc::new(Float64Array::from(vec![Some(10.5), None])) as ArrayRef),
        ("Geography", Arc::new(StringArray::from(vec!["France", "Spain"])) as ArrayRef),
        ("Nickname", Arc::new(StringArray::from(vec!["Harry", "Sal"])) as ArrayRef),
    ])
    .unwrap();
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let ds = load_file(&path).unwrap();
    assert_eq!(
        ds.columns(),
        &[Attribute::CreditScore, Attribute::Balance, Attribute::Geography]
    );
    assert_eq!(ds.len(), 2);
    assert_eq!(ds.records()[0].credit_score, Some(619));
    assert_eq!(ds.records()[1].credit_score, Some(700));
    assert_eq!(ds.records()[0].balance, Some(10.5));
    assert_eq!(ds.records()[1].balance, None);
    assert_eq!(ds.records()[1].geography.as_deref(), Some("Spain"));
}
