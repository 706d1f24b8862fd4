use crate::domain::model::RawListing;
use crate::domain::ports::ListingsSource;
use crate::utils::error::{MonitorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Imoova 回送車表格頁。
///
/// 欄位順序：`[id+連結, 出發地, 目的地, 開始, 結束, 車款, ?, 天數]`
pub struct ImoovaSource {
    client: Client,
    url: Url,
}

impl ImoovaSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| MonitorError::InvalidConfigValueError {
            field: "source_url".to_string(),
            value: url.to_string(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::config(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl ListingsSource for ImoovaSource {
    async fn fetch(&self) -> Result<Vec<RawListing>> {
        tracing::debug!("Making listings request to: {}", self.url);
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| MonitorError::fetch(format!("request failed: {}", e)))?;

        tracing::debug!("Listings response status: {}", response.status());

        if !response.status().is_success() {
            return Err(MonitorError::fetch(format!(
                "listings page returned HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MonitorError::fetch(format!("could not read body: {}", e)))?;

        extract_listings(&body, &self.url)
    }
}

/// 從表格 HTML 取出原始刊登資料。少於三個欄位的列與表頭列會被略過。
pub fn extract_listings(html: &str, base: &Url) -> Result<Vec<RawListing>> {
    let document = Html::parse_document(html);
    let row_selector = selector("table tr")?;
    let cell_selector = selector("td")?;
    let link_selector = selector("a[href]")?;

    let mut listings = Vec::new();
    for row in document.select(&row_selector) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        if cells.len() < 3 {
            continue;
        }

        let origin = cell_text(cells[1]);
        if origin
            .as_deref()
            .is_some_and(|o| o.eq_ignore_ascii_case("origin"))
        {
            continue;
        }

        let link = cells[0]
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| base.join(href.trim()).ok())
            .map(String::from);

        listings.push(RawListing {
            source_id: cell_text(cells[0]),
            origin,
            destination: cell_text(cells[2]),
            start_date: cells.get(3).and_then(|c| cell_text(*c)),
            end_date: cells.get(4).and_then(|c| cell_text(*c)),
            vehicle_model: cells.get(5).and_then(|c| cell_text(*c)),
            days: cells.get(7).and_then(|c| cell_text(*c)),
            link,
        });
    }

    Ok(listings)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| MonitorError::fetch(format!("bad selector '{}': {}", css, e)))
}

fn cell_text(cell: ElementRef) -> Option<String> {
    let text = cell.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
<table>
  <tr><th>ID</th><th>Origin</th><th>Arrival</th></tr>
  <tr><td>ID</td><td>Origin</td><td>Arrival</td><td>Start</td></tr>
  <tr>
    <td><a href="/en/relocations/4711">4711</a></td>
    <td>Zürich  Airport</td><td>Milan</td>
    <td>2025-05-01</td><td>2025-05-05</td><td>Fiat Ducato</td><td>€1</td><td>4</td>
  </tr>
  <tr><td><a href="https://other.example/x/9">9</a></td><td>Lyon</td><td>Nice</td></tr>
  <tr><td>only</td><td>two</td></tr>
</table>
</body></html>
"#;

    #[test]
    fn test_extract_rows() {
        let base = Url::parse("https://www.imoova.com/en/relocations/table?region=EU").unwrap();
        let listings = extract_listings(PAGE, &base).unwrap();

        assert_eq!(listings.len(), 2);

        let first = &listings[0];
        assert_eq!(first.source_id.as_deref(), Some("4711"));
        assert_eq!(first.origin.as_deref(), Some("Zürich Airport"));
        assert_eq!(first.destination.as_deref(), Some("Milan"));
        assert_eq!(first.start_date.as_deref(), Some("2025-05-01"));
        assert_eq!(first.vehicle_model.as_deref(), Some("Fiat Ducato"));
        assert_eq!(first.days.as_deref(), Some("4"));
        assert_eq!(
            first.link.as_deref(),
            Some("https://www.imoova.com/en/relocations/4711")
        );

        let second = &listings[1];
        assert_eq!(second.link.as_deref(), Some("https://other.example/x/9"));
        assert!(second.start_date.is_none());
        assert!(second.days.is_none());
    }

    #[test]
    fn test_page_without_table_yields_nothing() {
        let base = Url::parse("https://www.imoova.com/").unwrap();
        assert!(extract_listings("<html><p>maintenance</p></html>", &base)
            .unwrap()
            .is_empty());
    }
}
