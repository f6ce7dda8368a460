//! Kendra data-source sync
//!
//! Uses the AWS SDK: `StartDataSourceSyncJob` to trigger a crawl of the
//! document bucket and `ListDataSourceSyncJobs` to see whether one is still
//! running.

use super::{IndexError, IndexResult, SearchIndex, SyncJob, SyncStatus};
use crate::config::IndexConfig;
use async_trait::async_trait;
use aws_sdk_kendra::config::Region;
use aws_sdk_kendra::error::DisplayErrorContext;
use aws_sdk_kendra::types::DataSourceSyncJobStatus;
use aws_sdk_kendra::Client;
use tracing::{debug, info};

/// Recent jobs inspected when answering a status query
const STATUS_HISTORY: i32 = 10;

pub struct KendraIndex {
    client: Client,
    index_id: String,
    data_source_id: String,
}

impl KendraIndex {
    pub fn new(client: Client, index_id: &str, data_source_id: &str) -> Self {
        Self {
            client,
            index_id: index_id.to_string(),
            data_source_id: data_source_id.to_string(),
        }
    }

    /// Build from environment config. Fails when the index or data source
    /// id is missing.
    pub async fn from_config(config: &IndexConfig) -> IndexResult<Self> {
        let (Some(index_id), Some(data_source_id)) = (&config.index_id, &config.data_source_id)
        else {
            return Err(IndexError::NotConfigured);
        };

        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        info!(index_id = %index_id, data_source_id = %data_source_id, "Kendra index ready");
        Ok(Self::new(Client::new(&shared), index_id, data_source_id))
    }
}

/// Jobs in these states still hold the data source
pub(crate) fn is_running(status: &DataSourceSyncJobStatus) -> bool {
    matches!(
        status,
        DataSourceSyncJobStatus::Syncing
            | DataSourceSyncJobStatus::SyncingIndexing
            | DataSourceSyncJobStatus::Stopping
    )
}

#[async_trait]
impl SearchIndex for KendraIndex {
    async fn start_sync(&self) -> IndexResult<SyncJob> {
        let output = self
            .client
            .start_data_source_sync_job()
            .index_id(&self.index_id)
            .id(&self.data_source_id)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map_or(false, |se| se.is_resource_in_use_exception()) {
                    IndexError::AlreadySyncing
                } else {
                    IndexError::RequestFailed(DisplayErrorContext(&e).to_string())
                }
            })?;

        let execution_id = output.execution_id().map(str::to_string);
        info!(execution_id = ?execution_id, "Started Kendra sync job");
        Ok(SyncJob { execution_id })
    }

    async fn sync_status(&self) -> IndexResult<SyncStatus> {
        let output = self
            .client
            .list_data_source_sync_jobs()
            .index_id(&self.index_id)
            .id(&self.data_source_id)
            .max_results(STATUS_HISTORY)
            .send()
            .await
            .map_err(|e| IndexError::RequestFailed(DisplayErrorContext(&e).to_string()))?;

        let running = output
            .history()
            .iter()
            .filter_map(|job| job.status())
            .any(is_running);

        debug!(running, jobs = output.history().len(), "Checked Kendra sync status");
        Ok(if running {
            SyncStatus::Syncing
        } else {
            SyncStatus::Idle
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_states() {
        assert!(is_running(&DataSourceSyncJobStatus::Syncing));
        assert!(is_running(&DataSourceSyncJobStatus::SyncingIndexing));
        assert!(is_running(&DataSourceSyncJobStatus::Stopping));
        assert!(!is_running(&DataSourceSyncJobStatus::Succeeded));
        assert!(!is_running(&DataSourceSyncJobStatus::Failed));
        assert!(!is_running(&DataSourceSyncJobStatus::Aborted));
    }

    #[tokio::test]
    async fn test_missing_ids_not_configured() {
        let config = IndexConfig {
            index_id: Some("idx".to_string()),
            data_source_id: None,
            region: "us-east-1".to_string(),
        };
        assert!(matches!(
            KendraIndex::from_config(&config).await,
            Err(IndexError::NotConfigured)
        ));
    }
}
