use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

// ---------------------------------------------------------------------------
// Value – a single cell of the customer table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value, used at the edges (loaders, filter sets,
/// category keys). Records themselves store typed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Text(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

// ---------------------------------------------------------------------------
// Attribute – the fixed customer schema
// ---------------------------------------------------------------------------

/// Storage type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Integer,
    Float,
    /// Integer restricted to 0 or 1.
    Binary,
    Text,
}

/// One column of the customer table. Names match the headers of the bank
/// churn dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attribute {
    RowNumber,
    CustomerId,
    Surname,
    CreditScore,
    Geography,
    Gender,
    Age,
    Tenure,
    Balance,
    NumOfProducts,
    HasCrCard,
    IsActiveMember,
    EstimatedSalary,
    Exited,
    Complain,
    #[serde(rename = "Satisfaction Score")]
    SatisfactionScore,
    #[serde(rename = "Card Type")]
    CardType,
    #[serde(rename = "Point Earned")]
    PointEarned,
}

impl Attribute {
    /// Every attribute, in source column order.
    pub const ALL: [Attribute; 18] = [
        Attribute::RowNumber,
        Attribute::CustomerId,
        Attribute::Surname,
        Attribute::CreditScore,
        Attribute::Geography,
        Attribute::Gender,
        Attribute::Age,
        Attribute::Tenure,
        Attribute::Balance,
        Attribute::NumOfProducts,
        Attribute::HasCrCard,
        Attribute::IsActiveMember,
        Attribute::EstimatedSalary,
        Attribute::Exited,
        Attribute::Complain,
        Attribute::SatisfactionScore,
        Attribute::CardType,
        Attribute::PointEarned,
    ];

    /// Column header as it appears in the source file.
    pub fn name(self) -> &'static str {
        match self {
            Attribute::RowNumber => "RowNumber",
            Attribute::CustomerId => "CustomerId",
            Attribute::Surname => "Surname",
            Attribute::CreditScore => "CreditScore",
            Attribute::Geography => "Geography",
            Attribute::Gender => "Gender",
            Attribute::Age => "Age",
            Attribute::Tenure => "Tenure",
            Attribute::Balance => "Balance",
            Attribute::NumOfProducts => "NumOfProducts",
            Attribute::HasCrCard => "HasCrCard",
            Attribute::IsActiveMember => "IsActiveMember",
            Attribute::EstimatedSalary => "EstimatedSalary",
            Attribute::Exited => "Exited",
            Attribute::Complain => "Complain",
            Attribute::SatisfactionScore => "Satisfaction Score",
            Attribute::CardType => "Card Type",
            Attribute::PointEarned => "Point Earned",
        }
    }

    pub fn kind(self) -> AttributeKind {
        match self {
            Attribute::Surname | Attribute::Geography | Attribute::Gender | Attribute::CardType => {
                AttributeKind::Text
            }
            Attribute::Balance | Attribute::EstimatedSalary => AttributeKind::Float,
            Attribute::HasCrCard
            | Attribute::IsActiveMember
            | Attribute::Exited
            | Attribute::Complain => AttributeKind::Binary,
            _ => AttributeKind::Integer,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.kind() != AttributeKind::Text
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Attribute::ALL
            .iter()
            .copied()
            .find(|a| a.name() == trimmed)
            .ok_or_else(|| EngineError::schema_mismatch(s))
    }
}

// ---------------------------------------------------------------------------
// CustomerRecord – one row of the table
// ---------------------------------------------------------------------------

/// A single customer. Every field is nullable; a null is never read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub row_number: Option<i64>,
    pub customer_id: Option<i64>,
    pub surname: Option<String>,
    pub credit_score: Option<i64>,
    pub geography: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i64>,
    pub tenure: Option<i64>,
    pub balance: Option<f64>,
    pub num_of_products: Option<i64>,
    pub has_cr_card: Option<i64>,
    pub is_active_member: Option<i64>,
    pub estimated_salary: Option<f64>,
    pub exited: Option<i64>,
    pub complain: Option<i64>,
    pub satisfaction_score: Option<i64>,
    pub card_type: Option<String>,
    pub point_earned: Option<i64>,
}

impl CustomerRecord {
    fn int_field(&self, attribute: Attribute) -> Option<i64> {
        match attribute {
            Attribute::RowNumber => self.row_number,
            Attribute::CustomerId => self.customer_id,
            Attribute::CreditScore => self.credit_score,
            Attribute::Age => self.age,
            Attribute::Tenure => self.tenure,
            Attribute::NumOfProducts => self.num_of_products,
            Attribute::HasCrCard => self.has_cr_card,
            Attribute::IsActiveMember => self.is_active_member,
            Attribute::Exited => self.exited,
            Attribute::Complain => self.complain,
            Attribute::SatisfactionScore => self.satisfaction_score,
            Attribute::PointEarned => self.point_earned,
            _ => None,
        }
    }

    fn int_slot(&mut self, attribute: Attribute) -> Option<&mut Option<i64>> {
        Some(match attribute {
            Attribute::RowNumber => &mut self.row_number,
            Attribute::CustomerId => &mut self.customer_id,
            Attribute::CreditScore => &mut self.credit_score,
            Attribute::Age => &mut self.age,
            Attribute::Tenure => &mut self.tenure,
            Attribute::NumOfProducts => &mut self.num_of_products,
            Attribute::HasCrCard => &mut self.has_cr_card,
            Attribute::IsActiveMember => &mut self.is_active_member,
            Attribute::Exited => &mut self.exited,
            Attribute::Complain => &mut self.complain,
            Attribute::SatisfactionScore => &mut self.satisfaction_score,
            Attribute::PointEarned => &mut self.point_earned,
            _ => return None,
        })
    }

    /// Read an attribute as a [`Value`]; missing fields are [`Value::Null`].
    pub fn value(&self, attribute: Attribute) -> Value {
        match attribute {
            Attribute::Surname => text_value(&self.surname),
            Attribute::Geography => text_value(&self.geography),
            Attribute::Gender => text_value(&self.gender),
            Attribute::CardType => text_value(&self.card_type),
            Attribute::Balance => self.balance.map_or(Value::Null, Value::Float),
            Attribute::EstimatedSalary => self.estimated_salary.map_or(Value::Null, Value::Float),
            other => self.int_field(other).map_or(Value::Null, Value::Integer),
        }
    }

    /// Numeric reading of an attribute; `None` for nulls and text attributes.
    pub fn numeric(&self, attribute: Attribute) -> Option<f64> {
        match attribute {
            Attribute::Balance => self.balance,
            Attribute::EstimatedSalary => self.estimated_salary,
            other => self.int_field(other).map(|i| i as f64),
        }
    }

    /// Assign an attribute from a loosely typed cell, enforcing the record
    /// invariants: numbers are finite, integer columns hold whole numbers and
    /// flag columns (including the outcome) hold exactly 0 or 1.
    pub fn set(&mut self, attribute: Attribute, value: Value) -> EngineResult<()> {
        let invalid = |reason: String| EngineError::InvalidValue {
            attribute: attribute.name().to_string(),
            reason,
        };

        match attribute.kind() {
            AttributeKind::Text => {
                let text = match value {
                    Value::Null => None,
                    Value::Text(s) => Some(s),
                    other => Some(other.to_string()),
                };
                let slot = match attribute {
                    Attribute::Surname => &mut self.surname,
                    Attribute::Geography => &mut self.geography,
                    Attribute::Gender => &mut self.gender,
                    _ => &mut self.card_type,
                };
                *slot = text;
            }
            AttributeKind::Float => {
                let number = match value {
                    Value::Null => None,
                    Value::Text(s) => Some(
                        s.trim()
                            .parse::<f64>()
                            .map_err(|_| invalid(format!("'{s}' is not a number")))?,
                    ),
                    other => other.as_f64(),
                };
                if let Some(v) = number {
                    if !v.is_finite() {
                        return Err(invalid(format!("{v} is not finite")));
                    }
                }
                if attribute == Attribute::Balance {
                    self.balance = number;
                } else {
                    self.estimated_salary = number;
                }
            }
            kind @ (AttributeKind::Integer | AttributeKind::Binary) => {
                let number = match value {
                    Value::Null => None,
                    Value::Integer(i) => Some(i),
                    Value::Bool(b) => Some(i64::from(b)),
                    Value::Float(f) => Some(whole_number(f).ok_or_else(|| {
                        invalid(format!("{f} is not a whole number"))
                    })?),
                    Value::Text(s) => {
                        let trimmed = s.trim();
                        let parsed = trimmed.parse::<i64>().ok().or_else(|| {
                            trimmed.parse::<f64>().ok().and_then(whole_number)
                        });
                        Some(parsed.ok_or_else(|| invalid(format!("'{s}' is not an integer")))?)
                    }
                };
                if kind == AttributeKind::Binary {
                    if let Some(n) = number {
                        if n != 0 && n != 1 {
                            return Err(invalid(format!("expected 0 or 1, got {n}")));
                        }
                    }
                }
                if let Some(slot) = self.int_slot(attribute) {
                    *slot = number;
                }
            }
        }
        Ok(())
    }
}

fn text_value(field: &Option<String>) -> Value {
    field
        .as_ref()
        .map_or(Value::Null, |s| Value::Text(s.clone()))
}

fn whole_number(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

/// Look a column name up in a list of present columns.
pub(crate) fn resolve_column(columns: &[Attribute], name: &str) -> EngineResult<Attribute> {
    let attribute: Attribute = name.parse()?;
    if columns.contains(&attribute) {
        Ok(attribute)
    } else {
        Err(EngineError::schema_mismatch(name))
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// An immutable table of customers together with the schema columns the
/// source actually carried. Every engine operation returns a new `Dataset`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<CustomerRecord>,
    columns: Vec<Attribute>,
}

impl Dataset {
    /// Build a dataset whose source carried every schema column.
    pub fn new(records: Vec<CustomerRecord>) -> Self {
        Self::with_columns(records, Attribute::ALL)
    }

    /// Build a dataset restricted to the given columns. Columns are kept in
    /// schema order without duplicates.
    pub fn with_columns(
        records: Vec<CustomerRecord>,
        columns: impl IntoIterator<Item = Attribute>,
    ) -> Self {
        let present: BTreeSet<Attribute> = columns.into_iter().collect();
        let columns = Attribute::ALL
            .iter()
            .copied()
            .filter(|a| present.contains(a))
            .collect();
        Dataset { records, columns }
    }

    /// A dataset with the same schema over a different set of records.
    pub(crate) fn derive(&self, records: Vec<CustomerRecord>) -> Self {
        Dataset {
            records,
            columns: self.columns.clone(),
        }
    }

    pub fn records(&self) -> &[CustomerRecord] {
        &self.records
    }

    pub fn columns(&self) -> &[Attribute] {
        &self.columns
    }

    pub fn has_column(&self, attribute: Attribute) -> bool {
        self.columns.contains(&attribute)
    }

    /// Resolve a column name against this dataset's schema.
    pub fn resolve(&self, name: &str) -> EngineResult<Attribute> {
        resolve_column(&self.columns, name)
    }

    /// Number of customers.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Non-null numeric values of a column, in record order.
    pub fn numeric_values(&self, attribute: Attribute) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().filter_map(move |r| r.numeric(attribute))
    }

    /// Observed `(min, max)` of a numeric column, `None` if it has no values.
    pub fn numeric_range(&self, attribute: Attribute) -> Option<(f64, f64)> {
        self.numeric_values(attribute).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Sorted set of distinct non-null values of a column.
    pub fn unique_values(&self, attribute: Attribute) -> BTreeSet<Value> {
        self.records
            .iter()
            .map(|r| r.value(attribute))
            .filter(|v| !v.is_null())
            .collect()
    }
}
