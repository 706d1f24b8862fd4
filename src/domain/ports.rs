use crate::domain::model::RawListing;
use crate::utils::error::Result;
use async_trait::async_trait;

/// 持久化的邊界。`read_file` 在檔案不存在時回傳 `IoError(NotFound)`。
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    /// Readers never observe a half-written file.
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 提供目前完整的刊登快照。失敗時回傳 `FetchError`，不會回傳部分結果。
#[async_trait]
pub trait ListingsSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawListing>>;
}

/// 把已格式化的文字送到單一 chat。
#[async_trait]
pub trait NotifierSink: Send + Sync {
    async fn send(&self, target: &str, text: &str) -> Result<()>;
}
