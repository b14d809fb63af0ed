//! Server configuration from environment.

use siting_core::SitingRules;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Root directory that data file paths are resolved against
    pub data_dir: PathBuf,
    pub facilities_file: String,
    pub requirements_file: String,
    pub buffer_zones_file: String,
    /// Name written into generated buffer collections
    pub buffer_collection_name: String,
    /// Upper bound on request bodies for the analysis routes
    pub max_body_bytes: usize,
    pub rules: SitingRules,
}

fn parsed<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = SitingRules::default();
        let rules = SitingRules {
            planar_proj: env::var("SITING_PLANAR_PROJ").unwrap_or(defaults.planar_proj),
            simplify_tolerance_ft: parsed("SITING_SIMPLIFY_TOLERANCE_FT")
                .filter(|v: &f64| v.is_finite() && *v >= 0.0)
                .unwrap_or(defaults.simplify_tolerance_ft),
            sliver_epsilon_sqft: parsed("SITING_SLIVER_EPSILON_SQFT")
                .filter(|v: &f64| v.is_finite() && *v >= 0.0)
                .unwrap_or(defaults.sliver_epsilon_sqft),
            max_vertices: parsed("SITING_MAX_VERTICES")
                .filter(|v: &usize| *v > 0)
                .unwrap_or(defaults.max_vertices),
            candidate_amenities: env::var("SITING_CANDIDATE_AMENITIES")
                .ok()
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .filter(|list| !list.is_empty())
                .unwrap_or(defaults.candidate_amenities),
            tank: defaults.tank,
        };

        Self {
            server_port: parsed("SITING_PORT").unwrap_or(3000),
            data_dir: env::var("SITING_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            facilities_file: env::var("SITING_FACILITIES_FILE")
                .unwrap_or_else(|_| "geojson/facilities.geojson".to_string()),
            requirements_file: env::var("SITING_REQUIREMENTS_FILE")
                .unwrap_or_else(|_| "distances_requirements.csv".to_string()),
            buffer_zones_file: env::var("SITING_BUFFER_ZONES_FILE")
                .unwrap_or_else(|_| "geojson/buffer_zones.geojson".to_string()),
            buffer_collection_name: env::var("SITING_BUFFER_COLLECTION_NAME")
                .unwrap_or_else(|_| siting_core::DEFAULT_COLLECTION_NAME.to_string()),
            max_body_bytes: parsed("SITING_MAX_BODY_BYTES").unwrap_or(2 * 1024 * 1024),
            rules,
        }
    }

    pub fn facilities_path(&self) -> PathBuf {
        self.data_dir.join(&self.facilities_file)
    }

    pub fn requirements_path(&self) -> PathBuf {
        self.data_dir.join(&self.requirements_file)
    }

    pub fn buffer_zones_path(&self) -> PathBuf {
        self.data_dir.join(&self.buffer_zones_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_budget_comes_from_env() {
        std::env::set_var("SITING_MAX_VERTICES", "1234");
        let config = Config::from_env();
        std::env::remove_var("SITING_MAX_VERTICES");
        assert_eq!(config.rules.max_vertices, 1234);
    }
}
