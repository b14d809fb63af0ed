//! Siting CLI - run the siting pipeline against local data files.
//!
//! Subcommands mirror the HTTP API: generate buffers, evaluate candidate
//! areas, run a point-distance check, list zoning violations and size the
//! storage footprint for a volume.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use siting_core::{
    area_centroid, check_distance, evaluate, find_violations, generate_and_store, loader,
    required_area_sqft, resolve_max_distances, BufferZoneStore, Facility, HazardCategory, LatLng,
    RequirementRule, SitingRules, DEFAULT_COLLECTION_NAME,
};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Hydrogen storage siting analysis
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory the data files are resolved against
    #[arg(long, global = true, default_value = "./data")]
    pub data_dir: PathBuf,

    /// Facility GeoJSON, relative to the data directory
    #[arg(long, global = true, default_value = "geojson/facilities.geojson")]
    pub facilities: PathBuf,

    /// Distance requirements CSV, relative to the data directory
    #[arg(long, global = true, default_value = "distances_requirements.csv")]
    pub requirements: PathBuf,

    /// Buffer zone GeoJSON, relative to the data directory
    #[arg(long, global = true, default_value = "geojson/buffer_zones.geojson")]
    pub buffer_zones: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate buffer zones and write them to disk
    Buffers {
        /// Name recorded in the collection
        #[arg(long, default_value = DEFAULT_COLLECTION_NAME)]
        name: String,
    },
    /// Evaluate candidate storage areas against stored buffers
    Evaluate {
        /// Requested storage volume in gallons
        #[arg(long)]
        volume_gal: Option<f64>,
    },
    /// Check one area against hazard points by geodesic distance
    Distance {
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lng: Option<f64>,
        /// Use the vertex average of this facility instead of --lat/--lng
        #[arg(long, conflicts_with_all = ["lat", "lng"])]
        area_id: Option<String>,
        #[arg(long)]
        volume_gal: f64,
        /// JSON file mapping hazard category to a list of [lat, lng] points
        #[arg(long)]
        hazards: PathBuf,
    },
    /// List zoning violations for candidate areas
    Violations {
        /// Only check areas with this amenity
        #[arg(long)]
        amenity: Option<String>,
    },
    /// Ground area needed for a storage volume
    RequiredArea {
        #[arg(long)]
        volume_gal: f64,
    },
}

impl Cli {
    fn path(&self, file: &Path) -> PathBuf {
        self.data_dir.join(file)
    }

    fn load_facilities(&self) -> Result<Vec<Facility>> {
        let path = self.path(&self.facilities);
        loader::load_facilities(&path)
            .with_context(|| format!("loading facilities from {}", path.display()))
    }

    fn load_rules(&self) -> Result<Vec<RequirementRule>> {
        let path = self.path(&self.requirements);
        loader::load_requirement_rules(&path)
            .with_context(|| format!("loading requirements from {}", path.display()))
    }

    fn store(&self) -> BufferZoneStore {
        BufferZoneStore::new(self.path(&self.buffer_zones))
    }
}

#[derive(Debug, Serialize)]
struct RequiredArea {
    storage_volume_gal: f64,
    tanks: f64,
    required_area_sqft: f64,
}

fn print_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Run a parsed command, writing results to `out`.
pub fn run(cli: &Cli, rules: &SitingRules, out: &mut impl Write) -> Result<()> {
    let projection = rules.projection().context("building planar projection")?;
    tracing::debug!(data_dir = %cli.data_dir.display(), command = ?cli.command, "Running command");

    match &cli.command {
        Command::Buffers { name } => {
            let facilities = cli.load_facilities()?;
            let distances = resolve_max_distances(&cli.load_rules()?)?;
            let store = cli.store();
            let collection =
                generate_and_store(&store, &facilities, &distances, rules, &projection, name)
                    .context("generating buffer zones")?;
            tracing::info!(zones = collection.zones.len(), "Buffer generation complete");
            writeln!(
                out,
                "Wrote {} buffer zones for {} facilities to {}",
                collection.zones.len(),
                facilities.len(),
                store.path().display()
            )?;
            for zone in &collection.zones {
                writeln!(
                    out,
                    "  {:<24} {:<28} {:>8.1} ft",
                    zone.facility_id,
                    zone.category_label(),
                    zone.buffer_distance_ft
                )?;
            }
        }
        Command::Evaluate { volume_gal } => {
            let store = cli.store();
            let zones = store
                .load()
                .with_context(|| format!("loading buffer zones from {}", store.path().display()))?;
            let facilities = cli.load_facilities()?;
            let candidates = loader::candidate_areas(&facilities, rules);
            let evaluation = evaluate(&candidates, &zones.zones, *volume_gal, rules, &projection)
                .context("evaluating storage areas")?;
            print_json(out, &evaluation)?;
        }
        Command::Distance {
            lat,
            lng,
            area_id,
            volume_gal,
            hazards,
        } => {
            let centroid = match (lat, lng, area_id) {
                (Some(lat), Some(lng), _) => LatLng::new(*lat, *lng),
                (_, _, Some(id)) => {
                    let facilities = cli.load_facilities()?;
                    let facility = facilities
                        .iter()
                        .find(|f| &f.id == id)
                        .with_context(|| format!("no facility with id '{id}'"))?;
                    area_centroid(&facility.geometry)
                        .with_context(|| format!("facility '{id}' has no vertices"))?
                }
                _ => bail!("either --lat and --lng or --area-id is required"),
            };
            let points = read_hazard_points(hazards)?;
            let verdict = check_distance(
                area_id.as_deref(),
                centroid,
                &points,
                *volume_gal,
                &cli.load_rules()?,
            )
            .context("checking hazard distances")?;
            print_json(out, &verdict)?;
        }
        Command::Violations { amenity } => {
            let violations = find_violations(
                &cli.load_facilities()?,
                &cli.load_rules()?,
                rules,
                &projection,
                amenity.as_deref(),
            )
            .context("checking zoning violations")?;
            print_json(out, &violations)?;
        }
        Command::RequiredArea { volume_gal } => {
            if !volume_gal.is_finite() || *volume_gal <= 0.0 {
                bail!("--volume-gal must be a finite positive number, got {volume_gal}");
            }
            print_json(
                out,
                &RequiredArea {
                    storage_volume_gal: *volume_gal,
                    tanks: rules.tank.tanks_for(*volume_gal),
                    required_area_sqft: required_area_sqft(*volume_gal, &rules.tank),
                },
            )?;
        }
    }
    Ok(())
}

/// Read `{"contains_people": [[lat, lng], ...], ...}`.
pub fn read_hazard_points(path: &Path) -> Result<BTreeMap<HazardCategory, Vec<LatLng>>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading hazard points from {}", path.display()))?;
    let parsed: BTreeMap<HazardCategory, Vec<[f64; 2]>> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing hazard points in {}", path.display()))?;
    Ok(parsed
        .into_iter()
        .map(|(category, points)| {
            (
                category,
                points.into_iter().map(|[lat, lng]| LatLng::new(lat, lng)).collect(),
            )
        })
        .collect())
}
