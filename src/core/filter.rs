use crate::core::city::{fold_city, matches_folded};
use crate::domain::model::Offer;

/// 依設定的城市清單挑出相關的 Offer。
///
/// 城市清單為空時不做過濾，所有 Offer 都是候選。
#[derive(Debug, Clone)]
pub struct CityFilter {
    targets: Vec<String>,
}

impl CityFilter {
    pub fn new(cities: &[String]) -> Self {
        let mut targets: Vec<String> = Vec::with_capacity(cities.len());
        for folded in cities.iter().map(|c| fold_city(c)) {
            if !folded.is_empty() && !targets.contains(&folded) {
                targets.push(folded);
            }
        }
        Self { targets }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn accepts(&self, offer: &Offer) -> bool {
        if self.is_unrestricted() {
            return true;
        }
        let origin = fold_city(&offer.origin);
        let destination = fold_city(&offer.destination);
        self.targets
            .iter()
            .any(|t| matches_folded(&origin, t) || matches_folded(&destination, t))
    }

    pub fn select<'a>(&self, offers: &'a [Offer]) -> Vec<&'a Offer> {
        offers.iter().filter(|o| self.accepts(o)).collect()
    }
}
