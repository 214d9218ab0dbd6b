use crate::scoring::text_blob;
use crate::types::JobRecord;

fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text.contains(&k.to_lowercase()))
}

/// Whether one record passes the include/exclude/location rules. Final
/// inclusion is the AND of the three checks; empty lists impose no
/// constraint.
pub fn matches_filters(
    record: &JobRecord,
    include: &[String],
    exclude: &[String],
    locations: &[String],
) -> bool {
    let blob = text_blob(record);

    if !include.is_empty() && !contains_any(&blob, include) {
        return false;
    }
    if !exclude.is_empty() && contains_any(&blob, exclude) {
        return false;
    }
    if !locations.is_empty() {
        let wanted: Vec<String> = locations.iter().map(|l| l.to_lowercase()).collect();
        let job_location = record.location.to_lowercase();
        let direct = wanted.iter().any(|l| job_location.contains(l.as_str()));
        // "remote" in the wanted list matches a remote posting regardless of
        // the rest of its location text.
        let remote = wanted.iter().any(|l| l == "remote") && job_location.contains("remote");
        if !direct && !remote {
            return false;
        }
    }
    true
}

/// Keep the records that pass all configured filters.
pub fn filter_records(
    records: Vec<JobRecord>,
    include: &[String],
    exclude: &[String],
    locations: &[String],
) -> Vec<JobRecord> {
    records
        .into_iter()
        .filter(|r| matches_filters(r, include, exclude, locations))
        .collect()
}
