//! Loaders for the raw export files the checker consumes.
//!
//! The export pipeline writes per-table JSON files, the landgrid as a
//! GeoJSON feature collection, and the adjacency matrix as CSV with a
//! header row and a leading index column. Each loader normalizes its
//! file into the schema types the core stages expect.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use core_geoarg::StateAdjacency;
use geoarg_schema::{
    ArgEdge, GeoPoint, GeoStateEntry, Individual, IndividualId, NodeId, SpatialCell, StateId,
};

pub fn load_georef(path: &Path) -> Result<Vec<GeoStateEntry>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read georef table at {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse georef table at {}", path.display()))
}

pub fn load_arg_edges(path: &Path) -> Result<Vec<ArgEdge>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read edge table at {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse edge table at {}", path.display()))
}

/// Individual records as the export writes them. Location arrays arrive
/// latitude first and get swapped into longitude/latitude points.
#[derive(Debug, Deserialize)]
struct RawIndividual {
    id: u32,
    #[serde(default)]
    location: Option<Vec<f64>>,
    #[serde(default)]
    nodes: Vec<u32>,
}

pub fn load_individuals(path: &Path) -> Result<Vec<Individual>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read individuals table at {}", path.display()))?;
    parse_individuals(&raw)
        .with_context(|| format!("failed to parse individuals table at {}", path.display()))
}

fn parse_individuals(raw: &str) -> Result<Vec<Individual>> {
    let parsed: Vec<RawIndividual> = serde_json::from_str(raw)?;
    let mut truncated = 0u32;
    let individuals = parsed
        .into_iter()
        .map(|record| {
            let location = match record.location {
                Some(values) if values.len() >= 2 => Some(GeoPoint::new(values[1], values[0])),
                Some(_) => {
                    truncated += 1;
                    None
                }
                None => None,
            };
            Individual {
                id: IndividualId(record.id),
                nodes: record.nodes.into_iter().map(NodeId).collect(),
                location,
            }
        })
        .collect();
    if truncated > 0 {
        tracing::warn!(count = truncated, "individuals with truncated location arrays");
    }
    Ok(individuals)
}

#[derive(Debug, Deserialize)]
struct Centerpoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct CellProperties {
    state_id: i64,
    continent_id: String,
    centerpoint: Centerpoint,
}

#[derive(Debug, Deserialize)]
struct CellFeature {
    properties: CellProperties,
    geometry: geojson::Geometry,
}

#[derive(Debug, Deserialize)]
struct CellCollection {
    features: Vec<CellFeature>,
}

pub fn load_landgrid(path: &Path) -> Result<Vec<SpatialCell>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read landgrid at {}", path.display()))?;
    parse_landgrid(&raw).with_context(|| format!("failed to parse landgrid at {}", path.display()))
}

fn parse_landgrid(raw: &str) -> Result<Vec<SpatialCell>> {
    let collection: CellCollection = serde_json::from_str(raw)?;
    let mut cells = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        cells.push(cell_from_feature(feature)?);
    }
    Ok(cells)
}

fn cell_from_feature(feature: CellFeature) -> Result<SpatialCell> {
    let props = feature.properties;
    if props.state_id < 1 {
        bail!("cell has non-positive state id {}", props.state_id);
    }
    let geojson::Value::Polygon(rings) = feature.geometry.value else {
        bail!("cell {} has non-polygon geometry", props.state_id);
    };
    let Some(exterior) = rings.into_iter().next() else {
        bail!("cell {} has no boundary ring", props.state_id);
    };
    let mut boundary = Vec::with_capacity(exterior.len());
    for position in &exterior {
        if position.len() < 2 {
            bail!("cell {} has a truncated boundary position", props.state_id);
        }
        // GeoJSON positions are already longitude first.
        boundary.push(GeoPoint::new(position[0], position[1]));
    }
    Ok(SpatialCell {
        state_id: StateId(props.state_id as u32),
        continent_id: props.continent_id,
        centroid: GeoPoint::new(props.centerpoint.longitude, props.centerpoint.latitude),
        boundary,
    })
}

/// Parses the adjacency matrix CSV. The header row and the leading index
/// column are dropped; remaining cells are nonzero where the 1-based row
/// and column states touch.
pub fn load_adjacency(path: &Path) -> Result<StateAdjacency> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read adjacency matrix at {}", path.display()))?;
    parse_adjacency(&raw)
        .with_context(|| format!("failed to parse adjacency matrix at {}", path.display()))
}

fn parse_adjacency(raw: &str) -> Result<StateAdjacency> {
    let mut rows: Vec<Vec<u8>> = Vec::new();
    for (number, line) in raw.lines().enumerate().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut cells = Vec::new();
        for field in line.split(',').skip(1) {
            let value: f64 = field
                .trim()
                .parse()
                .with_context(|| format!("bad adjacency cell on line {}", number + 1))?;
            cells.push((value != 0.0) as u8);
        }
        rows.push(cells);
    }
    Ok(StateAdjacency::from_matrix(&rows))
}
