use super::{DutyStore, MemoryStore, StoreResult};
use crate::assignment::{Assignment, sort_assignments};
use crate::calendar::Holiday;
use crate::member::Member;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Everything a store holds, as written to a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutySnapshot {
    pub members: Vec<Member>,
    #[serde(default)]
    pub holidays: Vec<Holiday>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

impl DutySnapshot {
    pub fn capture(store: &dyn DutyStore) -> StoreResult<Self> {
        let mut assignments = store.all_assignments()?;
        sort_assignments(&mut assignments);
        Ok(Self {
            members: store.list_members()?,
            holidays: store.list_holidays()?,
            assignments,
        })
    }

    pub fn into_store(self) -> StoreResult<MemoryStore> {
        MemoryStore::from_parts(self.members, self.holidays, self.assignments)
    }
}

pub fn save_snapshot_to_json<P: AsRef<Path>>(store: &dyn DutyStore, path: P) -> StoreResult<()> {
    let snapshot = DutySnapshot::capture(store)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_snapshot_from_json<P: AsRef<Path>>(path: P) -> StoreResult<MemoryStore> {
    let file = File::open(path)?;
    let snapshot: DutySnapshot = serde_json::from_reader(file)?;
    snapshot.into_store()
}

#[derive(Debug, Serialize)]
struct AssignmentCsvRecord<'a> {
    date: String,
    duty: &'static str,
    member_id: i64,
    member_name: &'a str,
    origin: &'static str,
}

/// Write assignments as CSV, ordered by date then duty. Names are looked up in `members`;
/// unknown ids get an empty name.
pub fn export_assignments_to_csv<P: AsRef<Path>>(
    assignments: &[Assignment],
    members: &[Member],
    path: P,
) -> StoreResult<usize> {
    let names: HashMap<i64, &str> = members
        .iter()
        .map(|member| (member.id, member.name.as_str()))
        .collect();
    let mut rows = assignments.to_vec();
    sort_assignments(&mut rows);

    let mut writer = csv::Writer::from_path(path)?;
    for assignment in &rows {
        writer.serialize(AssignmentCsvRecord {
            date: assignment.date.to_string(),
            duty: assignment.duty.as_str(),
            member_id: assignment.member_id,
            member_name: names.get(&assignment.member_id).copied().unwrap_or_default(),
            origin: assignment.origin.as_str(),
        })?;
    }
    writer.flush()?;
    Ok(rows.len())
}
