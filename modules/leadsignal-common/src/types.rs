use serde::{Deserialize, Serialize};

// --- Job records ---

/// Canonical normalized posting observed from a source.
///
/// Text fields default to the empty string rather than null so a record can
/// round-trip through CSV and both storage backends unchanged. `score` is
/// transient: computed at ingestion, persisted on the lead, never stored on
/// the job row itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Content-derived identity; same URL, same id.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub salary: String,
    #[serde(default)]
    pub tags: String,
    /// ISO 8601, or empty when the source date was missing or unparseable.
    #[serde(default)]
    pub posted_at: String,
    #[serde(default)]
    pub url: String,
    /// Name of the adapter that produced the record.
    #[serde(default)]
    pub source: String,
    /// First-seen timestamp; preserved across re-upserts.
    #[serde(default)]
    pub collected_at: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub score: i64,
}

// --- Leads ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Applied,
    Interview,
    Offer,
    Archived,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Applied => "applied",
            LeadStatus::Interview => "interview",
            LeadStatus::Offer => "offer",
            LeadStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(LeadStatus::New),
            "applied" => Ok(LeadStatus::Applied),
            "interview" => Ok(LeadStatus::Interview),
            "offer" => Ok(LeadStatus::Offer),
            "archived" => Ok(LeadStatus::Archived),
            other => Err(format!("unknown lead status: {other}")),
        }
    }
}

/// Per-posting tracking state, one-to-one with a [`JobRecord`] by shared id.
/// Created lazily with default status, never without a corresponding job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: String,
    #[serde(default)]
    pub status: LeadStatus,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub favourite: bool,
    #[serde(default)]
    pub resume_url: String,
    #[serde(default)]
    pub cover_letter_url: String,
    #[serde(default)]
    pub next_action: String,
    #[serde(default)]
    pub next_action_date: String,
    #[serde(default)]
    pub notes: String,
    /// Rewritten on every mutation.
    #[serde(default)]
    pub updated_at: String,
}

/// Partial update for a single lead. `None` fields are left untouched;
/// `updated_at` is rewritten by the store on every applied patch.
#[derive(Debug, Clone, Default)]
pub struct LeadPatch {
    pub status: Option<LeadStatus>,
    pub score: Option<i64>,
    pub favourite: Option<bool>,
    pub resume_url: Option<String>,
    pub cover_letter_url: Option<String>,
    pub next_action: Option<String>,
    pub next_action_date: Option<String>,
    pub notes: Option<String>,
}

impl LeadPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.score.is_none()
            && self.favourite.is_none()
            && self.resume_url.is_none()
            && self.cover_letter_url.is_none()
            && self.next_action.is_none()
            && self.next_action_date.is_none()
            && self.notes.is_none()
    }
}

// --- Query criteria ---

/// Criteria for querying stored jobs. Unset fields impose no constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobQuery {
    /// Case-insensitive substring match over title, company, tags and
    /// description.
    pub text: Option<String>,
    pub source: Option<String>,
    pub location: Option<String>,
    /// Inclusive `collected_at` lower bound, ISO 8601.
    pub collected_from: Option<String>,
    /// Inclusive `collected_at` upper bound, ISO 8601.
    pub collected_to: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for JobQuery {
    fn default() -> Self {
        Self {
            text: None,
            source: None,
            location: None,
            collected_from: None,
            collected_to: None,
            limit: 100,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadQuery {
    pub status: Option<LeadStatus>,
}
