// File: rolegate-core/src/services/inventory_service.rs

use std::sync::Arc;

use tracing::info;

use rolegate_common::error::Error;
use rolegate_common::models::inventory::{ScanResult, INVENTORY_CATALOG};
use rolegate_common::models::roblox::AccountRef;
use rolegate_common::traits::api::GamePlatformClient;

use crate::inventory::{InventoryScanner, ScanObserver};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryLookup {
    NotFound { username: String },
    Scanned { account: AccountRef, scan: ScanResult },
}

/// Full-catalog inventory listing for the `check-inventory` command.
pub struct InventoryService {
    platform: Arc<dyn GamePlatformClient>,
    scanner: Arc<InventoryScanner>,
}

impl InventoryService {
    pub fn new(platform: Arc<dyn GamePlatformClient>, scanner: Arc<InventoryScanner>) -> Self {
        Self { platform, scanner }
    }

    pub async fn lookup(
        &self,
        username: &str,
        observer: Option<&dyn ScanObserver>,
    ) -> Result<InventoryLookup, Error> {
        let username = username.trim();
        let account_id = match self.platform.resolve_username(username).await {
            Ok(Some(id)) => id,
            Ok(None) | Err(Error::NotFound(_)) => {
                return Ok(InventoryLookup::NotFound {
                    username: username.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        info!("Scanning {} inventory categories for {} ({})", INVENTORY_CATALOG.len(), username, account_id);
        let scan = self.scanner.scan(account_id, INVENTORY_CATALOG, observer).await?;

        Ok(InventoryLookup::Scanned {
            account: AccountRef {
                account_id,
                username: username.to_string(),
            },
            scan,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolegate_common::models::inventory::InventoryItem;
    use rolegate_common::traits::api::MockGamePlatformClient;

    use crate::inventory::ScanConfig;

    fn service(mock: MockGamePlatformClient) -> InventoryService {
        let platform: Arc<dyn GamePlatformClient> = Arc::new(mock);
        let scanner = Arc::new(InventoryScanner::new(platform.clone(), ScanConfig::immediate()));
        InventoryService::new(platform, scanner)
    }

    #[tokio::test]
    async fn test_unknown_username() {
        let mut mock = MockGamePlatformClient::new();
        mock.expect_resolve_username().returning(|_| Ok(None));
        mock.expect_get_inventory_page().times(0);

        let lookup = service(mock).lookup("  ghost ", None).await.unwrap();
        assert_eq!(lookup, InventoryLookup::NotFound { username: "ghost".into() });
    }

    #[tokio::test]
    async fn test_scans_whole_catalog() {
        let mut mock = MockGamePlatformClient::new();
        mock.expect_resolve_username().returning(|_| Ok(Some(555)));
        mock.expect_get_inventory_page()
            .times(INVENTORY_CATALOG.len())
            .returning(|_, category, _, _| {
                Ok(match category {
                    "Hat" => vec![InventoryItem { item_id: 3, item_name: "Cap".into(), category: String::new() }],
                    _ => vec![],
                })
            });

        let InventoryLookup::Scanned { account, scan } = service(mock).lookup("Zed", None).await.unwrap() else {
            panic!("expected a scan");
        };
        assert_eq!(account.account_id, 555);
        assert_eq!(scan.categories_succeeded.len(), INVENTORY_CATALOG.len());
        assert_eq!(scan.items.len(), 1);
        assert_eq!(scan.items[0].category, "Hat");
    }
}
