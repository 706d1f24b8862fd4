use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// 一筆車輛回送 (relocation) 優惠。
///
/// `id` 是唯一的身分鍵：兩筆 `id` 相同的 Offer 視為同一筆刊登，其餘欄位的變動不影響相等性。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub origin: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub vehicle_model: String,
    pub duration_days: u32,
    pub link: String,
}

impl PartialEq for Offer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Offer {}

impl Hash for Offer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Listings Source 交出來的原始資料，每個欄位都可能缺少。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListing {
    pub source_id: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub vehicle_model: Option<String>,
    pub days: Option<String>,
    pub link: Option<String>,
}

/// A listing that could not be turned into an [`Offer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    /// Position of the entry in the fetched batch.
    pub index: usize,
    pub reason: String,
}

/// Result of parsing one full fetch.
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    pub offers: Vec<Offer>,
    pub failures: Vec<ParseFailure>,
}

impl ParsedBatch {
    pub fn snapshot_ids(&self) -> std::collections::HashSet<String> {
        self.offers.iter().map(|o| o.id.clone()).collect()
    }
}

pub const ALIVE_TEXT: &str =
    "🤖 Still alive! No new relocation offers found lately, but I keep searching.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Offer(Offer),
    Alive,
    Error(String),
}

impl Message {
    pub fn render(&self) -> String {
        match self {
            Message::Offer(offer) => format!(
                "✨ {} -> {}\n{} - {}\n{}\nDuration: {} days\n{}",
                offer.origin,
                offer.destination,
                offer.start_date,
                offer.end_date,
                offer.vehicle_model,
                offer.duration_days,
                offer.link
            ),
            Message::Alive => ALIVE_TEXT.to_string(),
            Message::Error(reason) => format!("❌ Error: {}", reason),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Message::Offer(_) => "offer",
            Message::Alive => "alive",
            Message::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    Delivered { attempts: u32 },
    Failed { attempts: u32, reason: String },
}

impl DeliveryResult {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryResult::Delivered { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDelivery {
    pub target: String,
    pub result: DeliveryResult,
}

/// 一則訊息對所有 chat target 的投遞結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub deliveries: Vec<TargetDelivery>,
}

impl DispatchReport {
    pub fn delivered_count(&self) -> usize {
        self.deliveries
            .iter()
            .filter(|d| d.result.is_delivered())
            .count()
    }

    pub fn any_delivered(&self) -> bool {
        self.delivered_count() > 0
    }

    pub fn all_delivered(&self) -> bool {
        self.delivered_count() == self.deliveries.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.deliveries.iter().filter_map(|d| match &d.result {
            DeliveryResult::Failed { reason, .. } => Some((d.target.as_str(), reason.as_str())),
            DeliveryResult::Delivered { .. } => None,
        })
    }
}

/// 單一輪詢週期的結果，不會被持久化。
#[derive(Debug, Clone, Default)]
pub struct CycleResult {
    /// Offers whose notification was attempted this cycle.
    pub dispatched: Vec<Offer>,
    pub fetched: usize,
    pub parse_failures: usize,
    pub matched: usize,
    pub pruned: Vec<String>,
    pub alive_sent: bool,
    pub fetch_error: Option<String>,
}

impl CycleResult {
    pub fn is_quiet(&self) -> bool {
        self.dispatched.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(id: &str, origin: &str) -> Offer {
        Offer {
            id: id.to_string(),
            origin: origin.to_string(),
            destination: "Paris".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 5, 4).unwrap(),
            vehicle_model: "VW California".to_string(),
            duration_days: 3,
            link: "https://www.imoova.com/en/relocations/123".to_string(),
        }
    }

    #[test]
    fn test_offer_identity_is_id_only() {
        let a = offer("123", "Madrid");
        let mut b = offer("123", "Barcelona");
        b.duration_days = 9;
        assert_eq!(a, b);
        assert_ne!(a, offer("124", "Madrid"));
    }

    #[test]
    fn test_offer_message_template() {
        let text = Message::Offer(offer("123", "Madrid")).render();
        assert_eq!(
            text,
            "✨ Madrid -> Paris\n2025-05-01 - 2025-05-04\nVW California\nDuration: 3 days\nhttps://www.imoova.com/en/relocations/123"
        );
    }

    #[test]
    fn test_error_and_alive_templates() {
        assert_eq!(
            Message::Error("site down".to_string()).render(),
            "❌ Error: site down"
        );
        assert_eq!(Message::Alive.render(), ALIVE_TEXT);
    }

    #[test]
    fn test_dispatch_report_counts() {
        let report = DispatchReport {
            deliveries: vec![
                TargetDelivery {
                    target: "1".to_string(),
                    result: DeliveryResult::Delivered { attempts: 1 },
                },
                TargetDelivery {
                    target: "2".to_string(),
                    result: DeliveryResult::Failed {
                        attempts: 3,
                        reason: "timeout".to_string(),
                    },
                },
            ],
        };
        assert_eq!(report.delivered_count(), 1);
        assert!(report.any_delivered());
        assert!(!report.all_delivered());
        assert_eq!(report.failures().collect::<Vec<_>>(), vec![("2", "timeout")]);
    }
}
