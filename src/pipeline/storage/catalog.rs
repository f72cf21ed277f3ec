use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::Dataset;

/// Most-recent-first collection of published datasets.
///
/// Cloning shares the same underlying list. All mutation goes through the
/// write lock, so concurrent stage-4 prepends are serialized and keep their
/// insertion order.
#[derive(Clone, Default)]
pub struct Catalog {
    datasets: Arc<RwLock<VecDeque<Dataset>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from datasets already ordered most-recent-first.
    pub fn with_datasets(datasets: Vec<Dataset>) -> Self {
        Self {
            datasets: Arc::new(RwLock::new(datasets.into())),
        }
    }

    /// Puts `dataset` at the front and returns the new catalog size.
    pub async fn prepend(&self, dataset: Dataset) -> usize {
        let mut datasets = self.datasets.write().await;
        debug!("Prepending dataset {} to catalog", dataset.id);
        datasets.push_front(dataset);
        datasets.len()
    }

    /// Appends older datasets behind everything already in the catalog.
    pub async fn extend_oldest(&self, older: impl IntoIterator<Item = Dataset>) {
        let mut datasets = self.datasets.write().await;
        datasets.extend(older);
    }

    pub async fn snapshot(&self) -> Vec<Dataset> {
        self.datasets.read().await.iter().cloned().collect()
    }

    pub async fn published(&self) -> Vec<Dataset> {
        self.datasets
            .read()
            .await
            .iter()
            .filter(|d| d.published)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.datasets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.datasets.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DatasetInfo;

    fn named(title: &str) -> Dataset {
        let mut dataset = Dataset::new(DatasetInfo {
            title: title.into(),
            ..Default::default()
        });
        dataset.published = true;
        dataset
    }

    #[tokio::test]
    async fn most_recent_first() {
        let catalog = Catalog::new();
        catalog.prepend(named("A")).await;
        catalog.prepend(named("B")).await;

        let titles: Vec<String> = catalog.snapshot().await.into_iter().map(|d| d.info.title).collect();
        assert_eq!(titles, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn older_entries_go_to_the_back() {
        let catalog = Catalog::new();
        catalog.prepend(named("new")).await;
        catalog.extend_oldest(vec![named("old1"), named("old2")]).await;

        let titles: Vec<String> = catalog.snapshot().await.into_iter().map(|d| d.info.title).collect();
        assert_eq!(titles, vec!["new", "old1", "old2"]);
    }

    #[tokio::test]
    async fn clones_share_state_and_concurrent_prepends_all_land() {
        let catalog = Catalog::new();
        let mut handles = Vec::new();
        for i in 0..20 {
            let catalog = catalog.clone();
            handles.push(tokio::spawn(async move {
                catalog.prepend(named(&format!("ds{i}"))).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(catalog.len().await, 20);
    }

    #[tokio::test]
    async fn published_filter_skips_drafts() {
        let catalog = Catalog::new();
        let mut draft = named("draft");
        draft.published = false;
        let live = named("live");
        catalog.prepend(draft).await;
        catalog.prepend(live).await;

        let published = catalog.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].info.title, "live");
    }
}
