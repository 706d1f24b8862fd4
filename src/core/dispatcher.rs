use crate::domain::model::{DeliveryResult, DispatchReport, Message, TargetDelivery};
use crate::domain::ports::NotifierSink;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// 第 n 次失敗後等待 base * 2^(n-1)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// 把訊息送到每個 chat target，個別重試、個別回報，不會中斷呼叫端。
pub struct Dispatcher<N: NotifierSink> {
    sink: N,
    policy: RetryPolicy,
}

impl<N: NotifierSink> Dispatcher<N> {
    pub fn new(sink: N, policy: RetryPolicy) -> Self {
        Self { sink, policy }
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    pub async fn dispatch(&self, targets: &[String], message: &Message) -> DispatchReport {
        let text = message.render();
        let mut report = DispatchReport::default();

        for target in targets {
            let result = self.deliver(target, &text).await;
            match &result {
                DeliveryResult::Delivered { attempts } => {
                    tracing::debug!(
                        "📨 {} message delivered to {} (attempts: {})",
                        message.kind(),
                        target,
                        attempts
                    );
                }
                DeliveryResult::Failed { attempts, reason } => {
                    tracing::error!(
                        "❌ {} message to {} failed after {} attempt(s): {}",
                        message.kind(),
                        target,
                        attempts,
                        reason
                    );
                }
            }
            report.deliveries.push(TargetDelivery {
                target: target.clone(),
                result,
            });
        }

        report
    }

    async fn deliver(&self, target: &str, text: &str) -> DeliveryResult {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.sink.send(target, text).await {
                Ok(()) => return DeliveryResult::Delivered { attempts: attempt },
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::warn!(
                        "🔄 Delivery to {} failed ({}), retrying in {:?} ({}/{})",
                        target,
                        e,
                        delay,
                        attempt,
                        max_attempts
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return DeliveryResult::Failed {
                        attempts: attempt,
                        reason: e.to_string(),
                    }
                }
            }
        }
    }
}
