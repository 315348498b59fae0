use std::sync::Arc;
use std::time::Instant;

use crate::catalog::{CatalogValidator, DepartmentDirectory, InMemoryCatalog, InMemoryDepartments};
use crate::core::{Config, Result};
use crate::reconcile::ReconciliationManager;

/// Server state - shared handles behind every request
///
/// Cheap to clone: everything heavy sits behind `Arc`.
///
/// | Field | Type | Meaning |
/// |-------|------|---------|
/// | config | Config | configuration (immutable) |
/// | manager | Arc<ReconciliationManager> | reconciliation engine over redb |
/// | started_at | Instant | process start, for uptime |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub manager: Arc<ReconciliationManager>,
    pub started_at: Instant,
}

impl ServerState {
    /// Build state from an existing manager
    pub fn new(config: Config, manager: ReconciliationManager) -> Self {
        Self {
            config,
            manager: Arc::new(manager),
            started_at: Instant::now(),
        }
    }

    /// Open the database and load collaborator seeds named by `config`
    pub fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir()?;

        let catalog = match &config.catalog_seed {
            Some(path) => InMemoryCatalog::from_json_file(path)?,
            None => InMemoryCatalog::default(),
        };
        if catalog.is_empty() {
            tracing::warn!("Catalog is empty; every item code will be rejected");
        }
        let departments = match &config.department_seed {
            Some(path) => InMemoryDepartments::from_json_file(path)?,
            None => InMemoryDepartments::default(),
        };
        if departments.is_empty() {
            tracing::warn!("Department directory is empty; new episodes cannot be created");
        }
        let catalog: Arc<dyn CatalogValidator> = Arc::new(catalog);
        let departments: Arc<dyn DepartmentDirectory> = Arc::new(departments);

        let db_path = config.db_path();
        tracing::info!(path = %db_path.display(), "Opening reconciliation database");
        let manager = ReconciliationManager::new(&db_path, catalog, departments)?
            .with_default_hospital(config.hospital_id.clone());

        Ok(Self::new(config.clone(), manager))
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
