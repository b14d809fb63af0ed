//! Shared application state.
//!
//! Reference data is read fresh from disk on every request, so the state
//! only carries configuration.

use siting_core::{
    loader, BufferZoneStore, Facility, PlanarProjection, RequirementRule, SitingError,
};

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct AppState {
    config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn buffer_store(&self) -> BufferZoneStore {
        BufferZoneStore::new(self.config.buffer_zones_path())
    }

    pub fn load_facilities(&self) -> Result<Vec<Facility>, SitingError> {
        Ok(loader::load_facilities(&self.config.facilities_path())?)
    }

    pub fn load_rules(&self) -> Result<Vec<RequirementRule>, SitingError> {
        Ok(loader::load_requirement_rules(&self.config.requirements_path())?)
    }

    /// Projections are built per call from the configured PROJ string.
    pub fn projection(&self) -> Result<PlanarProjection, SitingError> {
        Ok(self.config.rules.projection()?)
    }
}
