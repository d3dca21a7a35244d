//! Job record models: the lenient wire shape reported by the source and the
//! validated domain shape the aggregation engine works on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use tracing::warn;

/// Lifecycle state of a job record: the physical unit is running (ON) or has
/// been stopped (OFF).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RunState {
    On,
    Off,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::On => "ON",
            RunState::Off => "OFF",
        }
    }

    /// Parse the source's state tag. Anything other than the two exact tags
    /// marks the record malformed.
    pub fn parse(s: &str) -> Option<RunState> {
        match s {
            "ON" => Some(RunState::On),
            "OFF" => Some(RunState::Off),
            _ => None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, RunState::On)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product referenced by a job record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRef {
    pub id: String,
    pub name: String,
}

/// Machine referenced by a job record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineRef {
    pub name: String,
}

/// A validated job event. Immutable as observed by the engine; records are
/// created and mutated only by the external source.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: String,
    pub product: ProductRef,
    pub machine: MachineRef,
    pub state: RunState,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Last-modified time, falling back to the creation time when the source
    /// omits it.
    pub fn effective_updated_at(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}

/// One job event exactly as the source reports it. Every field is optional so
/// that a malformed record still deserializes and can be skipped on its own,
/// instead of failing the whole snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJob {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub product: Option<RawProduct>,
    #[serde(default)]
    pub machine: Option<RawMachine>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProduct {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMachine {
    #[serde(default)]
    pub name: Option<String>,
}

impl From<&JobRecord> for RawJob {
    fn from(job: &JobRecord) -> Self {
        RawJob {
            id: Some(job.id.clone()),
            product: Some(RawProduct {
                id: Some(job.product.id.clone()),
                name: Some(job.product.name.clone()),
            }),
            machine: Some(RawMachine {
                name: Some(job.machine.name.clone()),
            }),
            state: Some(job.state.as_str().to_string()),
            created_at: Some(job.created_at.to_rfc3339()),
            updated_at: job.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// The source emits numeric and string identifiers interchangeably; normalize
/// both to strings so keys compare consistently.
fn string_or_number<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(de)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Validate a wire record into the domain model.
///
/// A record missing a usable id, product id/name, machine name, creation
/// time, or a recognizable state is dropped (`None`). An unparseable
/// `updatedAt` is treated as absent rather than malformed; the model falls
/// back to `createdAt`.
pub fn well_formed(raw: RawJob) -> Option<JobRecord> {
    let id = raw.id?;
    let product = raw.product?;
    let product_id = product.id?;
    let product_name = product.name?;
    let machine_name = raw.machine.and_then(|m| m.name)?;
    let state = raw.state.as_deref().and_then(RunState::parse)?;
    let created_at = raw.created_at.as_deref().and_then(parse_timestamp)?;
    let updated_at = raw.updated_at.as_deref().and_then(parse_timestamp);

    Some(JobRecord {
        id,
        product: ProductRef {
            id: product_id,
            name: product_name,
        },
        machine: MachineRef { name: machine_name },
        state,
        created_at,
        updated_at,
    })
}

/// Apply the silent-skip policy across a whole snapshot: malformed records
/// are logged and excluded, never propagated as errors.
pub fn well_formed_records<I>(raw: I) -> Vec<JobRecord>
where
    I: IntoIterator<Item = RawJob>,
{
    let mut records = Vec::new();
    for job in raw {
        let raw_id = job.id.clone();
        match well_formed(job) {
            Some(record) => records.push(record),
            None => warn!(job_id = ?raw_id, "skipping malformed job record"),
        }
    }
    records
}
