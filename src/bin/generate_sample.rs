use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    fn int_between(&mut self, lo: i64, hi: i64) -> i64 {
        lo + (self.next_f64() * (hi - lo + 1) as f64) as i64
    }

    fn pick<'a>(&mut self, options: &[&'a str]) -> &'a str {
        options[(self.next_f64() * options.len() as f64) as usize % options.len()]
    }
}

/// One line of the generated file, with the bank churn column names.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SampleRow {
    row_number: i64,
    customer_id: i64,
    surname: String,
    credit_score: i64,
    geography: String,
    gender: String,
    age: i64,
    tenure: i64,
    balance: f64,
    num_of_products: i64,
    has_cr_card: i64,
    is_active_member: i64,
    estimated_salary: f64,
    exited: i64,
    complain: i64,
    #[serde(rename = "Satisfaction Score")]
    satisfaction_score: i64,
    #[serde(rename = "Card Type")]
    card_type: String,
    #[serde(rename = "Point Earned")]
    point_earned: i64,
}

fn generate_row(i: i64, rng: &mut SimpleRng) -> SampleRow {
    let geography = rng.pick(&["France", "Germany", "Spain"]).to_string();
    let age = (rng.gauss(39.0, 10.0).round() as i64).clamp(18, 92);
    let credit_score = (rng.gauss(650.0, 95.0).round() as i64).clamp(350, 850);
    let balance = if rng.chance(0.36) {
        0.0
    } else {
        (rng.gauss(120_000.0, 30_000.0).max(1_000.0) * 100.0).round() / 100.0
    };
    let is_active_member = i64::from(rng.chance(0.52));
    let complain = i64::from(rng.chance(0.2));
    let satisfaction_score = rng.int_between(1, 5);

    // Complaints dominate churn; age, inactivity and Germany add to it.
    let mut risk: f64 = 0.08;
    if complain == 1 {
        risk += 0.75;
    }
    if age > 45 {
        risk += 0.15;
    }
    if is_active_member == 0 {
        risk += 0.07;
    }
    if geography == "Germany" {
        risk += 0.08;
    }
    let exited = i64::from(rng.chance(risk.min(0.98)));

    SampleRow {
        row_number: i + 1,
        customer_id: 15_600_000 + i * 7,
        surname: rng.pick(&["Hargrave", "Hill", "Onio", "Boni", "Mitchell", "Chu"]).to_string(),
        credit_score,
        geography,
        gender: rng.pick(&["Female", "Male"]).to_string(),
        age,
        tenure: rng.int_between(0, 10),
        balance,
        num_of_products: rng.int_between(1, 4),
        has_cr_card: i64::from(rng.chance(0.7)),
        is_active_member,
        estimated_salary: (rng.next_f64() * 199_000.0 * 100.0).round() / 100.0 + 11.58,
        exited,
        complain,
        satisfaction_score,
        card_type: rng.pick(&["DIAMOND", "GOLD", "SILVER", "PLATINUM"]).to_string(),
        point_earned: rng.int_between(119, 1000),
    }
}

fn write_parquet(rows: &[SampleRow], path: &str) -> Result<()> {
    let int = |f: fn(&SampleRow) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from_iter_values(rows.iter().map(f)))
    };
    let float = |f: fn(&SampleRow) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from_iter_values(rows.iter().map(f)))
    };
    let text = |f: fn(&SampleRow) -> &str| -> ArrayRef {
        Arc::new(StringArray::from_iter_values(rows.iter().map(f)))
    };

    let columns: Vec<(&str, ArrayRef)> = vec![
        ("RowNumber", int(|r| r.row_number)),
        ("CustomerId", int(|r| r.customer_id)),
        ("Surname", text(|r| r.surname.as_str())),
        ("CreditScore", int(|r| r.credit_score)),
        ("Geography", text(|r| r.geography.as_str())),
        ("Gender", text(|r| r.gender.as_str())),
        ("Age", int(|r| r.age)),
        ("Tenure", int(|r| r.tenure)),
        ("Balance", float(|r| r.balance)),
        ("NumOfProducts", int(|r| r.num_of_products)),
        ("HasCrCard", int(|r| r.has_cr_card)),
        ("IsActiveMember", int(|r| r.is_active_member)),
        ("EstimatedSalary", float(|r| r.estimated_salary)),
        ("Exited", int(|r| r.exited)),
        ("Complain", int(|r| r.complain)),
        ("Satisfaction Score", int(|r| r.satisfaction_score)),
        ("Card Type", text(|r| r.card_type.as_str())),
        ("Point Earned", int(|r| r.point_earned)),
    ];

    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), false))
            .collect::<Vec<Field>>(),
    ));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, array)| array).collect(),
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows: Vec<SampleRow> = (0..2_000).map(|i| generate_row(i, &mut rng)).collect();

    let csv_path = "sample_customers.csv";
    let mut writer =
        csv::Writer::from_path(csv_path).with_context(|| format!("creating {csv_path}"))?;
    for row in &rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;

    let parquet_path = "sample_customers.parquet";
    write_parquet(&rows, parquet_path)?;

    let churned = rows.iter().filter(|r| r.exited == 1).count();
    println!(
        "Wrote {} customers ({churned} churned) to {csv_path} and {parquet_path}",
        rows.len()
    );
    Ok(())
}
