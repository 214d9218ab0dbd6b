//! RemoteOK HTML listing: `remoteok.com/remote-{query}-jobs`.

use anyhow::Result;
use async_trait::async_trait;
use scraper::{Html, Selector};

use leadsignal_common::{to_iso_date, JobRecord};

use super::{element_text, SourceAdapter};

const BASE_URL: &str = "https://remoteok.com";

pub struct RemoteOkAdapter {
    client: reqwest::Client,
}

impl RemoteOkAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn parse_listing(html: &str) -> Vec<JobRecord> {
    let Ok(row_sel) = Selector::parse("tr.job") else { return Vec::new() };
    let Ok(title_sel) = Selector::parse("h2") else { return Vec::new() };
    let Ok(company_sel) = Selector::parse("h3") else { return Vec::new() };
    let Ok(link_sel) = Selector::parse("a.preventLink") else { return Vec::new() };
    let Ok(any_link_sel) = Selector::parse("a") else { return Vec::new() };
    let Ok(tag_sel) = Selector::parse("div.tags > a") else { return Vec::new() };
    let Ok(location_sel) = Selector::parse("div.location") else { return Vec::new() };
    let Ok(time_sel) = Selector::parse("time") else { return Vec::new() };
    let Ok(desc_sel) = Selector::parse("div.description") else { return Vec::new() };

    let document = Html::parse_document(html);
    let mut records = Vec::new();
    for row in document.select(&row_sel) {
        let link = row
            .select(&link_sel)
            .next()
            .or_else(|| row.select(&any_link_sel).next());
        // Hrefs on the listing page are site-relative.
        let url = link
            .and_then(|a| a.value().attr("href"))
            .map(|href| format!("{BASE_URL}{href}"))
            .unwrap_or_default();
        let tags = row
            .select(&tag_sel)
            .map(element_text)
            .collect::<Vec<_>>()
            .join(",");
        let posted_at = row
            .select(&time_sel)
            .next()
            .and_then(|t| t.value().attr("datetime"))
            .map(to_iso_date)
            .unwrap_or_default();
        records.push(JobRecord {
            title: row.select(&title_sel).next().map(element_text).unwrap_or_default(),
            company: row.select(&company_sel).next().map(element_text).unwrap_or_default(),
            location: row.select(&location_sel).next().map(element_text).unwrap_or_default(),
            tags,
            posted_at,
            url,
            source: "remoteok".to_string(),
            description: row.select(&desc_sel).next().map(element_text).unwrap_or_default(),
            ..JobRecord::default()
        });
    }
    records
}

#[async_trait]
impl SourceAdapter for RemoteOkAdapter {
    fn name(&self) -> &'static str {
        "remoteok"
    }

    /// `query` is search text; spaces become dashes in the listing URL.
    async fn fetch(&self, query: &str) -> Result<Vec<JobRecord>> {
        let slug = query.trim().replace(' ', "-");
        let url = format!("{BASE_URL}/remote-{slug}-jobs");
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(parse_listing(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
<table>
  <tr class="job" data-id="1">
    <td>
      <a class="preventLink" href="/remote-jobs/100-accessibility-engineer"></a>
      <h2>Accessibility Engineer</h2>
      <h3>Acme</h3>
      <div class="location">Worldwide</div>
      <div class="tags">
        <a><h3>wcag</h3></a>
        <a><h3>aria</h3></a>
      </div>
      <time datetime="2024-03-01T12:00:00+00:00">1d</time>
      <div class="description">Audit flows against WCAG 2.2.</div>
    </td>
  </tr>
  <tr class="job" data-id="2">
    <td>
      <a href="/remote-jobs/101-designer"></a>
      <h2>Designer</h2>
      <h3>Globex</h3>
    </td>
  </tr>
  <tr><td>not a job row</td></tr>
</table>
"#;

    #[test]
    fn listing_rows_map_onto_records() {
        let records = parse_listing(LISTING);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Accessibility Engineer");
        assert_eq!(records[0].company, "Acme");
        assert_eq!(
            records[0].url,
            "https://remoteok.com/remote-jobs/100-accessibility-engineer"
        );
        assert_eq!(records[0].tags, "wcag,aria");
        assert_eq!(records[0].location, "Worldwide");
        assert_eq!(records[0].posted_at, "2024-03-01T12:00:00Z");
        assert_eq!(records[0].source, "remoteok");
        assert!(records[0].description.contains("WCAG"));
        // Plain anchor is the fallback when preventLink is absent.
        assert_eq!(records[1].url, "https://remoteok.com/remote-jobs/101-designer");
        assert_eq!(records[1].posted_at, "");
    }

    #[test]
    fn page_without_job_rows_parses_to_nothing() {
        assert!(parse_listing("<html><body><p>nothing here</p></body></html>").is_empty());
    }
}
