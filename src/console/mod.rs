//! Documents admin console
//!
//! Headless model of the admin "Documents" page: it pages through the
//! listing API, keeps fetched pages cached for next/previous navigation,
//! tracks the multi-select and the delete confirmation, and mirrors the
//! search index sync state into a busy flag.
//!
//! Failures never panic or tear down state; they land in
//! [`DocumentsConsole::last_error`] for the caller to show.

pub mod api_client;
pub mod poller;

pub use api_client::{ClientError, ClientResult, DocumentsApi, HttpApiClient};
pub use poller::SyncPoller;

use bytes::Bytes;
use tracing::{error, info, warn};

use crate::config::ConsoleConfig;
use crate::folders::{flatten_folder_structure, FolderMap, FolderTree};
use crate::models::{DeleteOutcome, ListDocumentsRequest, ListDocumentsResponse, UploadUrlRequest};
use crate::search::STILL_SYNCING;
use crate::storage::ObjectRecord;
use crate::utils::run_bounded;

pub const UPLOAD_MISSING_INPUT: &str = "Please select a folder and a file";

pub struct DocumentsConsole<A: DocumentsApi> {
    api: A,
    delete_concurrency: usize,
    /// Fetched pages; slot `i` is page `i + 1`
    pub pages: Vec<ListDocumentsResponse>,
    /// 1-based
    pub current_page_index: usize,
    pub selected_items: Vec<ObjectRecord>,
    pub syncing: bool,
    pub show_modal_delete: bool,
    pub loading: bool,
    /// Folder tree of the page on screen
    pub tree: FolderMap,
    /// Flattened tree of the page on screen, as the table shows it
    pub folders: Vec<ObjectRecord>,
    pub last_error: Option<String>,
}

impl<A: DocumentsApi> DocumentsConsole<A> {
    pub fn new(api: A, config: &ConsoleConfig) -> Self {
        Self {
            api,
            delete_concurrency: config.delete_concurrency.max(1),
            pages: Vec::new(),
            current_page_index: 1,
            selected_items: Vec::new(),
            syncing: false,
            show_modal_delete: false,
            loading: false,
            tree: FolderMap::new(),
            folders: Vec::new(),
            last_error: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fetch one page. With `page_index` the page replaces that cached
    /// slot, otherwise it is appended. Returns whether the fetch succeeded.
    pub async fn load_documents(
        &mut self,
        continuation_token: Option<String>,
        page_index: Option<usize>,
    ) -> bool {
        self.loading = true;
        let request = ListDocumentsRequest {
            continuation_token,
            prefix: None,
        };

        let ok = match self.api.get_documents(request).await {
            Ok(page) => {
                self.show(&page);
                match page_index {
                    Some(index) if index >= 1 && index <= self.pages.len() => {
                        self.pages[index - 1] = page;
                    }
                    _ => self.pages.push(page),
                }
                true
            }
            Err(e) => {
                error!("Failed to load documents: {}", e);
                self.last_error = Some(format!("Failed to load documents: {}", e));
                false
            }
        };

        self.loading = false;
        ok
    }

    /// Rebuild the table view from `page`
    fn show(&mut self, page: &ListDocumentsResponse) {
        let tree = FolderTree::build(&page.contents);
        if !tree.conflicts.is_empty() {
            warn!(count = tree.conflicts.len(), "Page has colliding keys");
        }
        self.folders = flatten_folder_structure(&tree.root, "");
        self.tree = tree.root;
    }

    fn show_current(&mut self) {
        if let Some(page) = self.pages.get(self.current_page_index - 1).cloned() {
            self.show(&page);
        }
    }

    pub fn current_page(&self) -> Option<&ListDocumentsResponse> {
        self.pages.get(self.current_page_index.checked_sub(1)?)
    }

    /// More pages exist past the current one
    pub fn has_next_page(&self) -> bool {
        self.current_page()
            .and_then(|p| p.next_continuation_token.as_ref())
            .is_some()
    }

    /// Advance one page. Only hits the API when moving past the cached
    /// frontier; does nothing on the last page.
    pub async fn next_page(&mut self) {
        let Some(token) = self
            .current_page()
            .and_then(|p| p.next_continuation_token.clone())
        else {
            return;
        };

        if self.pages.len() <= self.current_page_index
            && !self.load_documents(Some(token), None).await
        {
            return;
        }

        self.current_page_index = self.pages.len().min(self.current_page_index + 1);
        self.show_current();
    }

    pub fn previous_page(&mut self) {
        self.current_page_index = self
            .pages
            .len()
            .saturating_sub(1)
            .min(self.current_page_index.saturating_sub(1))
            .max(1);
        self.show_current();
    }

    /// Reload the page on screen. Cached pages after it are dropped since
    /// their tokens may no longer line up.
    pub async fn refresh(&mut self) {
        let index = self.current_page_index.max(1);
        let token = if index <= 1 {
            None
        } else {
            self.pages
                .get(index - 2)
                .and_then(|p| p.next_continuation_token.clone())
        };

        if self.load_documents(token, Some(index)).await {
            self.pages.truncate(index);
        }
    }

    /// Add the record with `key` on the current page to the selection
    pub fn select(&mut self, key: &str) -> bool {
        if self.selected_items.iter().any(|r| r.key == key) {
            return true;
        }
        match self.folders.iter().find(|r| r.key == key) {
            Some(record) => {
                self.selected_items.push(record.clone());
                true
            }
            None => false,
        }
    }

    pub fn deselect(&mut self, key: &str) {
        self.selected_items.retain(|r| r.key != key);
    }

    pub fn clear_selection(&mut self) {
        self.selected_items.clear();
    }

    /// Open the confirmation modal; needs a non-empty selection
    pub fn request_delete(&mut self) -> bool {
        self.show_modal_delete = !self.selected_items.is_empty();
        self.show_modal_delete
    }

    pub fn cancel_delete(&mut self) {
        self.show_modal_delete = false;
    }

    pub fn delete_header(&self) -> String {
        if self.selected_items.len() > 1 {
            "Delete files".to_string()
        } else {
            "Delete file".to_string()
        }
    }

    pub fn delete_prompt(&self) -> String {
        self.delete_prompt_with(&[])
    }

    /// Modal text for the selection plus `extra_keys` picked outside the
    /// current page
    pub fn delete_prompt_with(&self, extra_keys: &[String]) -> String {
        let mut keys = self.selected_items.iter().map(|r| r.key.as_str());
        let mut extra = extra_keys.iter().map(String::as_str);
        let total = self.selected_items.len() + extra_keys.len();
        match (total, keys.next().or_else(|| extra.next())) {
            (1, Some(only)) => format!("Do you want to delete file {}?", only),
            (n, _) => format!("Do you want to delete {} files?", n),
        }
    }

    /// Delete the selection with bounded concurrency, then reload the
    /// current page and clear the selection. Outcomes are per item and in
    /// selection order.
    pub async fn confirm_delete(&mut self) -> Vec<DeleteOutcome> {
        self.show_modal_delete = false;
        self.loading = true;

        let keys: Vec<String> = self.selected_items.iter().map(|r| r.key.clone()).collect();
        let api = &self.api;
        let outcomes: Vec<DeleteOutcome> = run_bounded(keys, self.delete_concurrency, |key| async move {
            api.delete_file(&key).await
        })
        .await
        .into_iter()
        .map(|(key, result)| match result {
            Ok(()) => DeleteOutcome::ok(key),
            Err(e) => DeleteOutcome::failed(key, e.to_string()),
        })
        .collect();

        let failed = outcomes.iter().filter(|o| !o.deleted).count();
        if failed > 0 {
            warn!(failed, total = outcomes.len(), "Some deletes failed");
            self.last_error = Some(format!("Failed to delete {} of {} files", failed, outcomes.len()));
        } else {
            info!(total = outcomes.len(), "Deleted selected files");
        }

        self.refresh().await;
        self.selected_items.clear();
        self.loading = false;
        outcomes
    }

    /// One sync status check. Errors leave the flag as it was.
    pub async fn poll_sync_status(&mut self) {
        match self.api.kendra_is_syncing().await {
            Ok(status) => self.syncing = status == STILL_SYNCING,
            Err(e) => error!("Failed to check sync status: {}", e),
        }
    }

    /// Start a sync unless one is already running. The busy flag is set
    /// up front and cleared again if the request fails.
    pub async fn sync_now(&mut self) -> bool {
        if self.syncing {
            return false;
        }
        self.syncing = true;

        match self.api.sync_kendra().await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to start sync: {}", e);
                self.last_error = Some(format!("Failed to start sync: {}", e));
                self.syncing = false;
                false
            }
        }
    }

    /// Presign `folder + file_name` and PUT `data` there. Both the folder
    /// and the file name are required; a folder without a trailing slash
    /// gets one.
    pub async fn upload_file(
        &mut self,
        folder: &str,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> ClientResult<String> {
        if folder.trim_matches('/').is_empty() || file_name.is_empty() {
            self.last_error = Some(UPLOAD_MISSING_INPUT.to_string());
            return Err(ClientError::Invalid(UPLOAD_MISSING_INPUT.to_string()));
        }

        let folder_path = if folder.ends_with('/') {
            Some(folder.to_string())
        } else {
            Some(format!("{}/", folder))
        };
        let request = UploadUrlRequest {
            file_name: file_name.to_string(),
            folder_path,
            file_type: content_type.to_string(),
        };
        let key = request.object_key();

        let result: ClientResult<()> = async {
            let signed_url = self.api.upload_url(&request).await?;
            self.api
                .upload_to_signed_url(&signed_url, content_type, data)
                .await
        }
        .await;

        match result {
            Ok(()) => {
                info!(key = %key, "Uploaded file");
                Ok(key)
            }
            Err(e) => {
                self.last_error = Some("Failed to upload file".to_string());
                Err(e)
            }
        }
    }

    pub fn take_error(&mut self) -> Option<String> {
        self.last_error.take()
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeApi;
    use super::*;
    use crate::storage::MemoryObjectStore;

    async fn console_with(keys: &[&str], page_size: usize) -> DocumentsConsole<FakeApi> {
        let store = MemoryObjectStore::new("docs-bucket").with_page_size(page_size);
        for key in keys {
            store.insert(key, 5).await;
        }
        DocumentsConsole::new(FakeApi::new(store), &ConsoleConfig::default())
    }

    fn keys(records: &[ObjectRecord]) -> Vec<&str> {
        records.iter().map(|r| r.key.as_str()).collect()
    }

    #[tokio::test]
    async fn test_initial_load_flattens_tree() {
        let mut console = console_with(&["b/2.txt", "a/1.txt", "root.md"], 10).await;
        assert!(console.load_documents(None, None).await);

        assert_eq!(console.pages.len(), 1);
        assert_eq!(keys(&console.folders), vec!["a/1.txt", "b/2.txt", "root.md"]);
        assert!(console.tree["a"].is_folder());
        assert!(!console.loading);
    }

    #[tokio::test]
    async fn test_next_fetches_only_past_frontier() {
        let mut console = console_with(&["1", "2", "3", "4", "5"], 2).await;
        console.load_documents(None, None).await;

        console.next_page().await;
        assert_eq!(console.current_page_index, 2);
        assert_eq!(keys(&console.folders), vec!["3", "4"]);
        assert_eq!(console.api().list_calls(), 2);

        console.previous_page();
        assert_eq!(console.current_page_index, 1);
        assert_eq!(keys(&console.folders), vec!["1", "2"]);

        // Page 2 is cached
        console.next_page().await;
        assert_eq!(console.current_page_index, 2);
        assert_eq!(console.api().list_calls(), 2);

        console.next_page().await;
        assert_eq!(console.current_page_index, 3);
        assert_eq!(keys(&console.folders), vec!["5"]);
        assert!(!console.has_next_page());

        // Last page: nothing to do
        console.next_page().await;
        assert_eq!(console.current_page_index, 3);
        assert_eq!(console.api().list_calls(), 3);
    }

    #[tokio::test]
    async fn test_previous_never_below_one() {
        let mut console = console_with(&["1"], 2).await;
        console.load_documents(None, None).await;
        console.previous_page();
        assert_eq!(console.current_page_index, 1);
    }

    #[tokio::test]
    async fn test_refresh_replaces_slot_and_drops_later_pages() {
        let mut console = console_with(&["1", "2", "3"], 2).await;
        console.load_documents(None, None).await;
        console.next_page().await;
        console.previous_page();
        assert_eq!(console.pages.len(), 2);

        console.api().store.insert("0", 1).await;
        console.refresh().await;

        assert_eq!(console.pages.len(), 1);
        assert_eq!(keys(&console.folders), vec!["0", "1"]);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_state() {
        let mut console = console_with(&["1", "2"], 10).await;
        console.load_documents(None, None).await;

        console.api().store.fail_list(true);
        assert!(!console.load_documents(None, Some(1)).await);

        assert_eq!(keys(&console.folders), vec!["1", "2"]);
        assert!(console.take_error().unwrap().starts_with("Failed to load documents"));
        assert!(console.last_error.is_none());
    }

    #[tokio::test]
    async fn test_delete_flow_with_partial_failure() {
        let mut console = console_with(&["a.txt", "b.txt", "c.txt"], 10).await;
        console.load_documents(None, None).await;

        assert!(!console.request_delete());
        assert!(console.select("a.txt"));
        assert!(console.select("b.txt"));
        assert!(!console.select("missing.txt"));
        assert_eq!(console.delete_header(), "Delete files");
        assert_eq!(console.delete_prompt(), "Do you want to delete 2 files?");
        assert!(console.request_delete());

        console.api().store.fail_delete_of("b.txt").await;
        let outcomes = console.confirm_delete().await;

        assert!(!console.show_modal_delete);
        assert!(console.selected_items.is_empty());
        assert!(outcomes[0].deleted);
        assert!(!outcomes[1].deleted);
        assert_eq!(keys(&console.folders), vec!["b.txt", "c.txt"]);
        assert_eq!(console.last_error.as_deref(), Some("Failed to delete 1 of 2 files"));
    }

    #[tokio::test]
    async fn test_single_delete_prompt() {
        let mut console = console_with(&["docs/a.pdf"], 10).await;
        console.load_documents(None, None).await;
        console.select("docs/a.pdf");
        assert_eq!(console.delete_header(), "Delete file");
        assert_eq!(console.delete_prompt(), "Do you want to delete file docs/a.pdf?");
        console.request_delete();
        console.cancel_delete();
        assert!(!console.show_modal_delete);
        assert_eq!(console.selected_items.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_prompt_counts_keys_off_page() {
        let mut console = console_with(&["docs/a.pdf"], 10).await;
        console.load_documents(None, None).await;

        let off_page = vec!["later/z.pdf".to_string()];
        assert_eq!(
            console.delete_prompt_with(&off_page),
            "Do you want to delete file later/z.pdf?"
        );

        console.select("docs/a.pdf");
        assert_eq!(
            console.delete_prompt_with(&off_page),
            "Do you want to delete 2 files?"
        );
        assert_eq!(console.delete_prompt(), "Do you want to delete file docs/a.pdf?");
    }

    #[tokio::test]
    async fn test_sync_flag_follows_status() {
        let mut console = console_with(&[], 10).await;

        console.poll_sync_status().await;
        assert!(!console.syncing);

        assert!(console.sync_now().await);
        assert!(console.syncing);
        // Already syncing: no second job
        assert!(!console.sync_now().await);
        assert_eq!(console.api().index.syncs_started(), 1);

        console.poll_sync_status().await;
        assert!(console.syncing);

        console.api().index.finish_sync();
        console.poll_sync_status().await;
        assert!(!console.syncing);
    }

    #[tokio::test]
    async fn test_sync_failure_resets_flag() {
        let mut console = console_with(&[], 10).await;
        console.api().index.set_failing(true);

        assert!(!console.sync_now().await);
        assert!(!console.syncing);

        // Status errors leave the flag alone
        console.syncing = true;
        console.poll_sync_status().await;
        assert!(console.syncing);
    }

    #[tokio::test]
    async fn test_upload_adds_folder_separator() {
        let mut console = console_with(&[], 10).await;
        let key = console
            .upload_file("reports", "q1.pdf", "application/pdf", Bytes::from_static(b"%PDF"))
            .await
            .unwrap();

        assert_eq!(key, "reports/q1.pdf");
        let uploads = console.api().uploads.lock().unwrap().clone();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].0.starts_with("memory://docs-bucket/reports/q1.pdf?"));
        assert_eq!(uploads[0].1, "application/pdf");
    }

    #[tokio::test]
    async fn test_upload_requires_folder_and_file() {
        let mut console = console_with(&[], 10).await;

        let result = console
            .upload_file("", "q1.pdf", "application/pdf", Bytes::from_static(b"%PDF"))
            .await;
        assert!(matches!(result, Err(ClientError::Invalid(_))));
        assert_eq!(console.take_error().as_deref(), Some(UPLOAD_MISSING_INPUT));

        let result = console
            .upload_file("reports", "", "application/pdf", Bytes::from_static(b"%PDF"))
            .await;
        assert!(matches!(result, Err(ClientError::Invalid(_))));
        assert!(console.api().uploads.lock().unwrap().is_empty());
    }
}
