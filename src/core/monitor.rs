use crate::config::MonitorConfig;
use crate::core::dispatcher::Dispatcher;
use crate::core::filter::CityFilter;
use crate::core::parser::OfferParser;
use crate::core::seen_store::SeenStore;
use crate::domain::model::{CycleResult, Message, Offer};
use crate::domain::ports::{ListingsSource, NotifierSink, Storage};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::future::Future;

/// 跨週期保留的狀態。取代全域的「最後一次存活訊息時間」。
#[derive(Debug, Clone)]
pub struct MonitorState {
    pub last_liveness: DateTime<Utc>,
    /// 上一次已通知過的錯誤文字，相同錯誤連續發生時不再重複通知
    pub last_error: Option<String>,
    pub cycles: u64,
}

impl MonitorState {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            last_liveness: started_at,
            last_error: None,
            cycles: 0,
        }
    }
}

/// 輪詢主迴圈：抓取 → 解析 → 過濾 → 通知 → 更新/清理 store → 存活檢查 → 休眠。
pub struct Monitor<L: ListingsSource, N: NotifierSink, S: Storage> {
    config: MonitorConfig,
    source: L,
    dispatcher: Dispatcher<N>,
    store: SeenStore<S>,
    filter: CityFilter,
    state: MonitorState,
}

impl<L: ListingsSource, N: NotifierSink, S: Storage> Monitor<L, N, S> {
    pub fn new(
        config: MonitorConfig,
        source: L,
        sink: N,
        store: SeenStore<S>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let filter = CityFilter::new(&config.target_cities);
        let dispatcher = Dispatcher::new(sink, config.retry_policy());
        Self {
            config,
            source,
            dispatcher,
            store,
            filter,
            state: MonitorState::new(started_at),
        }
    }

    pub fn store(&self) -> &SeenStore<S> {
        &self.store
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn sink(&self) -> &N {
        self.dispatcher.sink()
    }

    /// 一直執行直到 `shutdown` 完成。關閉訊號只在週期之間 (休眠時) 檢查。
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!(
            "🚀 Monitoring {} every {:?} (cities: {})",
            self.config.source_url,
            self.config.poll_interval,
            if self.filter.is_unrestricted() {
                "all".to_string()
            } else {
                self.config.target_cities.join(", ")
            }
        );

        loop {
            let result = self.run_cycle(Utc::now()).await;
            log_cycle(self.state.cycles, &result);

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(
                        "🛑 Shutdown requested, stopping after cycle {}",
                        self.state.cycles
                    );
                    break;
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        self.flush().await;
    }

    /// 執行一個完整週期。所有非設定類的錯誤都在這裡被吸收。
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleResult {
        self.state.cycles += 1;
        let mut result = CycleResult::default();

        // FETCHING
        let raws = match self.source.fetch().await {
            Ok(raws) if raws.is_empty() => {
                self.report_fetch_failure(
                    "No offers found. The page structure may have changed.",
                    now,
                    &mut result,
                )
                .await;
                return result;
            }
            Ok(raws) => raws,
            Err(e) => {
                let reason = format!("Error fetching offers: {}", e);
                self.report_fetch_failure(&reason, now, &mut result).await;
                return result;
            }
        };
        result.fetched = raws.len();

        // PARSING
        let batch = OfferParser::new(now.date_naive()).parse_batch(&raws);
        result.parse_failures = batch.failures.len();
        if batch.offers.is_empty() {
            // 整批都解析失敗不算完整快照，不能拿來清理
            self.report_fetch_failure(
                &format!(
                    "None of the {} listings could be parsed. The page structure may have changed.",
                    raws.len()
                ),
                now,
                &mut result,
            )
            .await;
            return result;
        }
        self.state.last_error = None;
        let snapshot: HashSet<String> = batch.snapshot_ids();

        // FILTERING
        let matched = self.filter.select(&batch.offers);
        result.matched = matched.len();

        // NOTIFYING
        let fresh: Vec<Offer> = matched
            .into_iter()
            .filter(|offer| self.store.is_new(&offer.id))
            .cloned()
            .collect();

        let mut any_delivered = false;
        let mut failed_targets: BTreeMap<String, String> = BTreeMap::new();
        let mut failed_count = 0;
        for offer in fresh {
            let report = self
                .dispatcher
                .dispatch(&self.config.notifier_targets, &Message::Offer(offer.clone()))
                .await;
            tracing::info!(
                "📣 Offer [{}] {} -> {} notified to {}/{} chats",
                offer.id,
                offer.origin,
                offer.destination,
                report.delivered_count(),
                report.deliveries.len()
            );
            any_delivered |= report.any_delivered();
            for (target, reason) in report.failures() {
                failed_count += 1;
                failed_targets.insert(target.to_string(), reason.to_string());
            }
            // 已嘗試就算看過，避免 sink 掛掉時每輪重送
            result.dispatched.push(offer);
        }

        if !failed_targets.is_empty() {
            self.report_delivery_failures(failed_count, &failed_targets).await;
        }

        // UPDATING_STORE
        for offer in &result.dispatched {
            self.store.record_seen(&offer.id);
        }

        // PRUNING
        result.pruned = self.store.prune(&snapshot);
        if !result.pruned.is_empty() {
            tracing::info!(
                "🧹 Removed {} stale offers from {}: {}",
                result.pruned.len(),
                self.store.path(),
                result.pruned.join(", ")
            );
        }

        if let Err(e) = self.store.persist().await {
            tracing::error!("❌ Could not persist seen offers to {}: {}", self.store.path(), e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        }

        // LIVENESS_CHECK
        if any_delivered {
            self.state.last_liveness = now;
        } else if result.is_quiet() && self.liveness_due(now) {
            let report = self
                .dispatcher
                .dispatch(&self.config.notifier_targets, &Message::Alive)
                .await;
            if report.any_delivered() {
                tracing::info!("💓 Liveness ping sent");
                self.state.last_liveness = now;
                result.alive_sent = true;
            } else {
                tracing::warn!("⚠️ Liveness ping could not be delivered, will retry next cycle");
            }
        }

        result
    }

    fn liveness_due(&self, now: DateTime<Utc>) -> bool {
        (now - self.state.last_liveness)
            .to_std()
            .map(|elapsed| elapsed >= self.config.liveness_interval)
            .unwrap_or(false)
    }

    async fn report_fetch_failure(
        &mut self,
        reason: &str,
        now: DateTime<Utc>,
        result: &mut CycleResult,
    ) {
        tracing::warn!("⚠️ {}", reason);
        result.fetch_error = Some(reason.to_string());

        if self.state.last_error.as_deref() == Some(reason) {
            tracing::debug!("Same error already reported, not notifying again");
            return;
        }

        let report = self
            .dispatcher
            .dispatch(
                &self.config.notifier_targets,
                &Message::Error(reason.to_string()),
            )
            .await;
        if report.any_delivered() {
            self.state.last_error = Some(reason.to_string());
            // 錯誤通知送達也代表程式還活著
            self.state.last_liveness = now;
        }
    }

    /// 通知還能送達的 chat：有些 chat 沒收到這輪的 offer
    async fn report_delivery_failures(
        &self,
        failed_count: usize,
        failed_targets: &BTreeMap<String, String>,
    ) {
        let healthy: Vec<String> = self
            .config
            .notifier_targets
            .iter()
            .filter(|t| !failed_targets.contains_key(*t))
            .cloned()
            .collect();
        if healthy.is_empty() {
            tracing::error!("❌ No chat target is reachable, offers could not be delivered");
            return;
        }

        let details: Vec<String> = failed_targets
            .iter()
            .map(|(target, reason)| format!("{} ({})", target, reason))
            .collect();
        let reason = format!(
            "Could not deliver {} notification(s) to chat(s): {}",
            failed_count,
            details.join(", ")
        );
        self.dispatcher
            .dispatch(&healthy, &Message::Error(reason))
            .await;
    }

    /// 關閉前把尚未寫出的變更寫回
    pub async fn flush(&mut self) {
        if let Err(e) = self.store.persist().await {
            tracing::error!("❌ Final persist of {} failed: {}", self.store.path(), e);
        }
    }
}

fn log_cycle(cycle: u64, result: &CycleResult) {
    match &result.fetch_error {
        Some(reason) => tracing::warn!("Cycle {} skipped: {}", cycle, reason),
        None => tracing::info!(
            "🔁 Cycle {}: fetched {}, parse failures {}, matched {}, new {}, pruned {}{}",
            cycle,
            result.fetched,
            result.parse_failures,
            result.matched,
            result.dispatched.len(),
            result.pruned.len(),
            if result.alive_sent { ", alive ping sent" } else { "" }
        ),
    }
}
