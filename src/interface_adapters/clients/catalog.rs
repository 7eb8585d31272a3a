use crate::domain::ports::CatalogSource;
use crate::domain::{CatalogError, Module, ShipClass, ShipProject};

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

// Ship project as published by the fleet designer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipProjectDto {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub ship_class: String,
    #[serde(default)]
    pub speed: Option<u32>,
    #[serde(default)]
    pub maneuverability: Option<u32>,
    #[serde(default)]
    pub armor: Option<u32>,
    #[serde(default)]
    pub activation: Option<u8>,
    #[serde(default)]
    pub modules: Vec<ModuleDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleDto {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub effect: String,
    #[serde(default)]
    pub cost: u32,
}

impl TryFrom<ShipProjectDto> for ShipProject {
    type Error = CatalogError;

    fn try_from(dto: ShipProjectDto) -> Result<Self, Self::Error> {
        let class = ShipClass::parse(&dto.ship_class).ok_or_else(|| {
            CatalogError::Malformed(format!(
                "project {} has unknown class {}",
                dto.id, dto.ship_class
            ))
        })?;
        Ok(ShipProject {
            name: if dto.name.is_empty() {
                dto.id.clone()
            } else {
                dto.name
            },
            id: dto.id,
            class,
            speed: dto.speed,
            maneuverability: dto.maneuverability,
            armor: dto.armor,
            activation: dto.activation,
            modules: dto
                .modules
                .into_iter()
                .map(|module| Module {
                    id: module.id,
                    name: module.name,
                    effect: module.effect,
                    cost: module.cost,
                })
                .collect(),
        })
    }
}

// Keeps every project that converts; one bad entry does not hide the rest.
fn convert_projects(dtos: Vec<ShipProjectDto>) -> Vec<ShipProject> {
    dtos.into_iter()
        .filter_map(|dto| match ShipProject::try_from(dto) {
            Ok(project) => Some(project),
            Err(e) => {
                warn!(error = %e, "skipping catalog entry");
                None
            }
        })
        .collect()
}

// Thin reqwest client for the fleet designer's project list.
#[derive(Clone)]
pub struct HttpCatalog {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn load_projects(&self) -> Result<Vec<ShipProject>, CatalogError> {
        let url = format!("{}/api/ships", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CatalogError::Unavailable(format!(
                "{url} returned {}",
                response.status()
            )));
        }

        let dtos = response
            .json::<Vec<ShipProjectDto>>()
            .await
            .map_err(|e| CatalogError::Malformed(e.to_string()))?;
        Ok(convert_projects(dtos))
    }
}

/// Reads one project per `*.json` file from a directory.
pub struct DirectoryCatalog {
    dir: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl CatalogSource for DirectoryCatalog {
    async fn load_projects(&self) -> Result<Vec<ShipProject>, CatalogError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| CatalogError::Unavailable(format!("{}: {e}", self.dir.display())))?;

        let mut dtos = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let raw = match tokio::fs::read_to_string(&path).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read project file");
                    continue;
                }
            };
            match serde_json::from_str::<ShipProjectDto>(&raw) {
                Ok(dto) => dtos.push(dto),
                Err(e) => warn!(path = %path.display(), error = %e, "malformed project file"),
            }
        }

        debug!(dir = %self.dir.display(), files = dtos.len(), "project files read");
        Ok(convert_projects(dtos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ShipStats;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fleet-catalog-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn when_project_has_modules_then_they_carry_over() {
        let dto: ShipProjectDto = serde_json::from_str(
            r#"{
                "id": "p1",
                "name": "Raider",
                "shipClass": "Эсминец",
                "modules": [{"id": "m1", "name": "Booster", "effect": "+1 скорость", "cost": 2}]
            }"#,
        )
        .expect("dto");
        let project = ShipProject::try_from(dto).expect("project");
        assert_eq!(project.class, ShipClass::Destroyer);
        assert_eq!(project.modules.len(), 1);
        assert_eq!(project.modules[0].effect, "+1 скорость");
    }

    #[test]
    fn when_class_is_unknown_then_project_is_malformed() {
        let dto: ShipProjectDto =
            serde_json::from_str(r#"{"id": "p2", "shipClass": "carrier"}"#).expect("dto");
        assert!(matches!(
            ShipProject::try_from(dto),
            Err(CatalogError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn when_directory_has_json_files_then_each_becomes_a_project() {
        let dir = temp_dir();
        std::fs::write(
            dir.join("cruiser.json"),
            r#"{"id": "heavy", "name": "Heavy", "shipClass": "cruiser", "armor": 9}"#,
        )
        .expect("write project");
        std::fs::write(dir.join("notes.txt"), "not a project").expect("write notes");
        std::fs::write(dir.join("broken.json"), "{").expect("write broken");

        let projects = DirectoryCatalog::new(&dir)
            .load_projects()
            .await
            .expect("directory loads");
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, "heavy");
        assert_eq!(
            projects[0].resolve_stats(),
            ShipStats {
                armor: 9,
                ..ShipClass::Cruiser.base_stats()
            }
        );

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn when_directory_is_missing_then_catalog_is_unavailable() {
        let missing = std::env::temp_dir().join(format!("missing-{}", uuid::Uuid::new_v4()));
        let result = DirectoryCatalog::new(missing).load_projects().await;
        assert!(matches!(result, Err(CatalogError::Unavailable(_))));
    }
}
