use crate::domain::model::{Offer, ParseFailure, ParsedBatch, RawListing};
use crate::utils::error::{MonitorError, Result};
use chrono::{Datelike, NaiveDate};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use url::Url;

const FULL_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d-%m-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%a %d %b %Y",
];

const YEARLESS_DATE_FORMATS: &[&str] = &["%d %b", "%d %B", "%b %d", "%a %d %b"];

/// 沒寫年份的日期若比參考日早超過這麼多天，就當成明年
const YEAR_ROLLOVER_DAYS: i64 = 183;

/// 把 [`RawListing`] 轉成正規化的 [`Offer`]。
///
/// `reference_date` 只用來推算沒有年份的日期。
#[derive(Debug, Clone, Copy)]
pub struct OfferParser {
    reference_date: NaiveDate,
}

impl OfferParser {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self { reference_date }
    }

    pub fn parse(&self, raw: &RawListing) -> Result<Offer> {
        let origin = required(&raw.origin, "origin")?;
        let destination = required(&raw.destination, "destination")?;
        let link = required(&raw.link, "link")?;
        Url::parse(&link)
            .map_err(|e| MonitorError::parse(format!("invalid link '{}': {}", link, e)))?;

        let start_text = required(&raw.start_date, "start_date")?;
        let end_text = required(&raw.end_date, "end_date")?;
        let start_date = self.parse_date(&start_text)?;
        let end_date = self.parse_date(&end_text)?;

        let duration_days = raw
            .days
            .as_deref()
            .and_then(parse_day_count)
            .unwrap_or_else(|| (end_date - start_date).num_days().max(0) as u32);

        let id = match cleaned(&raw.source_id) {
            Some(source_id) => source_id,
            None => derive_id(&origin, &destination, start_date, &link),
        };

        Ok(Offer {
            id,
            origin,
            destination,
            start_date,
            end_date,
            vehicle_model: cleaned(&raw.vehicle_model).unwrap_or_default(),
            duration_days,
            link,
        })
    }

    /// 解析整批資料。單筆失敗只記錄下來，不影響其他筆；重複的 id 只保留第一筆。
    pub fn parse_batch(&self, raws: &[RawListing]) -> ParsedBatch {
        let mut batch = ParsedBatch::default();
        let mut ids = HashSet::new();

        for (index, raw) in raws.iter().enumerate() {
            match self.parse(raw) {
                Ok(offer) => {
                    if ids.insert(offer.id.clone()) {
                        batch.offers.push(offer);
                    } else {
                        tracing::debug!(
                            "Skipping duplicate listing {} at index {}",
                            offer.id,
                            index
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!("⚠️ Skipping listing #{}: {}", index, e);
                    batch.failures.push(ParseFailure {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        batch
    }

    pub fn parse_date(&self, text: &str) -> Result<NaiveDate> {
        let text = text.trim();

        for format in FULL_DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(text, format) {
                return Ok(date);
            }
        }

        // chrono 不能解析沒有年份的日期，補上今年與明年各試一次。
        // 含星期的格式只會在其中一年通過 chrono 的星期檢查。
        let year = self.reference_date.year();
        for format in YEARLESS_DATE_FORMATS {
            let format_with_year = format!("{} %Y", format);
            let mut past = None;
            for candidate_year in [year, year + 1] {
                let with_year = format!("{} {}", text, candidate_year);
                if let Ok(date) = NaiveDate::parse_from_str(&with_year, &format_with_year) {
                    if (self.reference_date - date).num_days() <= YEAR_ROLLOVER_DAYS {
                        return Ok(date);
                    }
                    past.get_or_insert(date);
                }
            }
            if let Some(date) = past {
                return Ok(date);
            }
        }

        Err(MonitorError::parse(format!("unrecognized date '{}'", text)))
    }
}

fn cleaned(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(|v| v.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|v| !v.is_empty())
}

fn required(value: &Option<String>, field: &str) -> Result<String> {
    cleaned(value).ok_or_else(|| MonitorError::parse(format!("missing {}", field)))
}

/// "5", "5 days", "5d" 都接受
fn parse_day_count(text: &str) -> Option<u32> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// 來源沒有提供 id 時，用穩定欄位算出可重現的 id。
pub fn derive_id(origin: &str, destination: &str, start_date: NaiveDate, link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(origin.as_bytes());
    hasher.update(b"|");
    hasher.update(destination.as_bytes());
    hasher.update(b"|");
    hasher.update(start_date.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(link.as_bytes());
    hex::encode(hasher.finalize())
}
