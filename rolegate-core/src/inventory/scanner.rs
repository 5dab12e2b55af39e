// File: rolegate-core/src/inventory/scanner.rs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use rolegate_common::error::{Error, PlatformErrorKind};
use rolegate_common::models::inventory::{InventoryItem, ScanProgress, ScanResult, SortOrder};
use rolegate_common::traits::api::GamePlatformClient;

/// Pacing and retry knobs for a scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Pause between two categories.
    pub inter_request_delay: Duration,
    /// Retry `n` waits `retry_base_delay * n`.
    pub retry_base_delay: Duration,
    pub max_retries: u32,
    pub page_limit: u32,
    pub sort_order: SortOrder,
    /// Emit progress before every `progress_every`-th category and before the last.
    pub progress_every: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            inter_request_delay: Duration::from_millis(2000),
            retry_base_delay: Duration::from_millis(5000),
            max_retries: 3,
            page_limit: 100,
            sort_order: SortOrder::Asc,
            progress_every: 3,
        }
    }
}

impl ScanConfig {
    /// No delays at all; for tests and for single-category lookups.
    pub fn immediate() -> Self {
        Self {
            inter_request_delay: Duration::ZERO,
            retry_base_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Receives progress while a scan runs. Purely informational.
#[async_trait]
pub trait ScanObserver: Send + Sync {
    async fn on_progress(&self, progress: &ScanProgress);
}

enum CategoryOutcome {
    Items(Vec<InventoryItem>),
    Restricted,
    Invalid,
    RateLimited,
}

/// Walks inventory categories one at a time and collects what it can read.
pub struct InventoryScanner {
    client: Arc<dyn GamePlatformClient>,
    config: ScanConfig,
}

impl InventoryScanner {
    pub fn new(client: Arc<dyn GamePlatformClient>, config: ScanConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scans `categories` in order for `account_id`.
    ///
    /// Forbidden sections are skipped, invalid ones recorded, rate-limited
    /// ones retried and then recorded. Any other failure aborts the scan.
    pub async fn scan<S>(
        &self,
        account_id: u64,
        categories: &[S],
        observer: Option<&dyn ScanObserver>,
    ) -> Result<ScanResult, Error>
    where
        S: AsRef<str> + Sync,
    {
        let mut result = ScanResult::default();
        let total = categories.len();

        for (i, category) in categories.iter().enumerate() {
            let category = category.as_ref();

            if let Some(observer) = observer {
                let every = self.config.progress_every.max(1);
                if i % every == 0 || i + 1 == total {
                    observer
                        .on_progress(&ScanProgress {
                            current_category: category.to_string(),
                            position: i + 1,
                            total,
                            items_found: result.items.len(),
                            rate_limited: result.categories_rate_limited.len(),
                        })
                        .await;
                }
            }

            match self.query_category(account_id, category).await? {
                CategoryOutcome::Items(items) => {
                    debug!("{} => {} items for account {}", category, items.len(), account_id);
                    result.items.extend(items.into_iter().map(|mut item| {
                        item.category = category.to_string();
                        item
                    }));
                    result.categories_succeeded.push(category.to_string());
                }
                CategoryOutcome::Restricted => {
                    debug!("{} is not visible for account {}, skipping", category, account_id);
                    result.categories_restricted.push(category.to_string());
                }
                CategoryOutcome::Invalid => {
                    result.categories_invalid.push(category.to_string());
                }
                CategoryOutcome::RateLimited => {
                    result.categories_rate_limited.push(category.to_string());
                }
            }

            if i + 1 < total && !self.config.inter_request_delay.is_zero() {
                sleep(self.config.inter_request_delay).await;
            }
        }

        info!(
            "Inventory scan for {} done: {} items, {} ok, {} invalid, {} rate limited, {} restricted",
            account_id,
            result.items.len(),
            result.categories_succeeded.len(),
            result.categories_invalid.len(),
            result.categories_rate_limited.len(),
            result.categories_restricted.len()
        );
        Ok(result)
    }

    async fn query_category(&self, account_id: u64, category: &str) -> Result<CategoryOutcome, Error> {
        let mut retries = 0;
        loop {
            let page = self
                .client
                .get_inventory_page(account_id, category, self.config.sort_order, self.config.page_limit)
                .await;

            let err = match page {
                Ok(items) => return Ok(CategoryOutcome::Items(items)),
                Err(e) => e,
            };

            match err.kind() {
                PlatformErrorKind::Forbidden => return Ok(CategoryOutcome::Restricted),
                PlatformErrorKind::InvalidRequest => {
                    debug!("{} rejected as invalid: {}", category, err);
                    return Ok(CategoryOutcome::Invalid);
                }
                PlatformErrorKind::RateLimited if retries < self.config.max_retries => {
                    retries += 1;
                    let wait = self.config.retry_base_delay * retries;
                    warn!(
                        "Rate limited on {}, retrying in {:?}... (attempt {})",
                        category, wait, retries
                    );
                    if !wait.is_zero() {
                        sleep(wait).await;
                    }
                }
                PlatformErrorKind::RateLimited => {
                    warn!("Rate limited on {}, giving up after {} retries", category, retries);
                    return Ok(CategoryOutcome::RateLimited);
                }
                PlatformErrorKind::Other => return Err(err),
            }
        }
    }
}
