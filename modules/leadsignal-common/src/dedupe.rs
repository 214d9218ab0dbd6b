use std::collections::HashMap;

use crate::types::JobRecord;

/// Collapse a run's records to one per id, last write wins. Output order is
/// not meaningful. Callers assign identities before deduplicating;
/// cross-run dedup is the storage layer's job via upsert.
pub fn dedupe_by_id(records: Vec<JobRecord>) -> Vec<JobRecord> {
    let mut unique: HashMap<String, JobRecord> = HashMap::with_capacity(records.len());
    for record in records {
        unique.insert(record.id.clone(), record);
    }
    unique.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, title: &str) -> JobRecord {
        JobRecord {
            id: id.to_string(),
            title: title.to_string(),
            ..JobRecord::default()
        }
    }

    #[test]
    fn later_record_wins_for_same_id() {
        let unique = dedupe_by_id(vec![record("a", "first"), record("a", "second")]);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].title, "second");
    }

    #[test]
    fn distinct_ids_all_survive() {
        let unique = dedupe_by_id(vec![record("a", ""), record("b", ""), record("c", "")]);
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(dedupe_by_id(Vec::new()).is_empty());
    }
}
