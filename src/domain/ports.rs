use async_trait::async_trait;

use crate::domain::errors::CatalogError;
use crate::domain::ship::ShipProject;

// Port for the design-time ship catalog consulted when a battle starts.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load_projects(&self) -> Result<Vec<ShipProject>, CatalogError>;
}
