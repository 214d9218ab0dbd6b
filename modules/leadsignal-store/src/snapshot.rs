use std::path::Path;

use leadsignal_common::{JobRecord, LeadSignalError};

const COLUMNS: [&str; 12] = [
    "id",
    "title",
    "company",
    "location",
    "salary",
    "tags",
    "posted_at",
    "url",
    "source",
    "collected_at",
    "description",
    "score",
];

/// Write the run's unique records as a CSV side artifact with a fixed
/// column layout.
pub fn write_csv(path: &Path, records: &[JobRecord]) -> Result<(), LeadSignalError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LeadSignalError::Storage(format!("create {}: {e}", parent.display()))
            })?;
        }
    }

    let mut out = String::new();
    out.push_str(&COLUMNS.join(","));
    out.push('\n');
    for record in records {
        let score = record.score.to_string();
        let fields = [
            record.id.as_str(),
            record.title.as_str(),
            record.company.as_str(),
            record.location.as_str(),
            record.salary.as_str(),
            record.tags.as_str(),
            record.posted_at.as_str(),
            record.url.as_str(),
            record.source.as_str(),
            record.collected_at.as_str(),
            record.description.as_str(),
            score.as_str(),
        ];
        let escaped: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        out.push_str(&escaped.join(","));
        out.push('\n');
    }

    std::fs::write(path, out)
        .map_err(|e| LeadSignalError::Storage(format!("write {}: {e}", path.display())))
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
