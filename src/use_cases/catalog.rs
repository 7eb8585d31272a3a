// Read-only ship project lookup, loaded once from the configured catalog source.

use crate::domain::ports::CatalogSource;
use crate::domain::{ShipClass, ShipProject, ShipStats};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

pub struct ShipCatalog {
    source: Option<Arc<dyn CatalogSource>>,
    projects: OnceCell<HashMap<String, ShipProject>>,
}

impl ShipCatalog {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source: Some(source),
            projects: OnceCell::new(),
        }
    }

    /// Catalog with no source; every lookup falls back to class stats.
    pub fn class_stats_only() -> Self {
        Self {
            source: None,
            projects: OnceCell::new(),
        }
    }

    // Concurrent callers share one load. A failed load is not cached, so the next
    // battle start tries again.
    async fn projects(&self) -> Option<&HashMap<String, ShipProject>> {
        let source = self.source.as_ref()?;
        let loaded = self
            .projects
            .get_or_try_init(|| async {
                let projects = source.load_projects().await?;
                debug!(count = projects.len(), "ship catalog loaded");
                Ok::<_, crate::domain::CatalogError>(
                    projects
                        .into_iter()
                        .map(|project| (project.id.clone(), project))
                        .collect(),
                )
            })
            .await;

        match loaded {
            Ok(projects) => Some(projects),
            Err(e) => {
                warn!(error = %e, "ship catalog unavailable; using class stats");
                None
            }
        }
    }

    /// Class and stats for a fleet entry. Unknown projects use the entry's class.
    pub async fn resolve(&self, project_id: &str, class: ShipClass) -> (ShipClass, ShipStats) {
        match self
            .projects()
            .await
            .and_then(|projects| projects.get(project_id))
        {
            Some(project) => (project.class, project.resolve_stats()),
            None => (class, class.base_stats()),
        }
    }
}
