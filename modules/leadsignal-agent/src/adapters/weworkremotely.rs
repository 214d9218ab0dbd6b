//! We Work Remotely HTML search: `weworkremotely.com/remote-jobs/search`.

use anyhow::Result;
use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use leadsignal_common::JobRecord;

use super::{element_text, SourceAdapter};

const BASE_URL: &str = "https://weworkremotely.com";
const SEARCH_URL: &str = "https://weworkremotely.com/remote-jobs/search";

pub struct WeWorkRemotelyAdapter {
    client: reqwest::Client,
}

impl WeWorkRemotelyAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn parse_search(html: &str) -> Vec<JobRecord> {
    let Ok(item_sel) = Selector::parse("section.jobs li") else { return Vec::new() };
    let Ok(anchor_sel) = Selector::parse("a") else { return Vec::new() };
    let Ok(company_sel) = Selector::parse("span.company") else { return Vec::new() };
    let Ok(title_sel) = Selector::parse("span.title") else { return Vec::new() };
    let Ok(region_sel) = Selector::parse("span.region") else { return Vec::new() };
    let Ok(tag_sel) = Selector::parse("span.tag") else { return Vec::new() };

    let document = Html::parse_document(html);
    let mut records = Vec::new();
    for item in document.select(&item_sel) {
        // Header and view-all rows either have no anchor or link elsewhere.
        let href = item
            .select(&anchor_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .filter(|href| href.contains("/remote-jobs/"));
        let Some(href) = href else { continue };
        let tags = item
            .select(&tag_sel)
            .map(element_text)
            .collect::<Vec<_>>()
            .join(",");
        records.push(JobRecord {
            title: item.select(&title_sel).next().map(element_text).unwrap_or_default(),
            company: item.select(&company_sel).next().map(element_text).unwrap_or_default(),
            location: item.select(&region_sel).next().map(element_text).unwrap_or_default(),
            tags,
            url: format!("{BASE_URL}{href}"),
            source: "weworkremotely".to_string(),
            ..JobRecord::default()
        });
    }
    records
}

#[async_trait]
impl SourceAdapter for WeWorkRemotelyAdapter {
    fn name(&self) -> &'static str {
        "weworkremotely"
    }

    /// `query` is search text, passed through as the `term` parameter.
    async fn fetch(&self, query: &str) -> Result<Vec<JobRecord>> {
        let url = Url::parse_with_params(SEARCH_URL, [("term", query)])?;
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(parse_search(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_PAGE: &str = r#"
<section class="jobs">
  <ul>
    <li class="feature">
      <a href="/remote-jobs/acme-accessibility-engineer">
        <span class="company">Acme</span>
        <span class="title">Accessibility Engineer</span>
        <span class="region company">Anywhere in the World</span>
      </a>
      <span class="tag">wcag</span>
      <span class="tag">design systems</span>
    </li>
    <li>
      <a href="/remote-jobs/globex-product-designer">
        <span class="company">Globex</span>
        <span class="title">Product Designer</span>
      </a>
    </li>
    <li class="view-all">
      <a href="/categories/remote-design-jobs">View all</a>
    </li>
  </ul>
</section>
<section class="other"><li><a href="/remote-jobs/should-not-match">x</a></li></section>
"#;

    #[test]
    fn search_items_map_onto_records() {
        let records = parse_search(SEARCH_PAGE);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Accessibility Engineer");
        assert_eq!(records[0].company, "Acme");
        assert_eq!(records[0].location, "Anywhere in the World");
        assert_eq!(records[0].tags, "wcag,design systems");
        assert_eq!(
            records[0].url,
            "https://weworkremotely.com/remote-jobs/acme-accessibility-engineer"
        );
        assert_eq!(records[0].source, "weworkremotely");
        assert_eq!(records[0].posted_at, "");
        assert_eq!(records[1].company, "Globex");
        assert_eq!(records[1].location, "");
    }

    #[test]
    fn rows_linking_outside_postings_are_skipped() {
        let records = parse_search(SEARCH_PAGE);
        assert!(records.iter().all(|r| r.url.contains("/remote-jobs/")));
    }
}
