use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use geoarg_schema::{ArgEdge, GeoStateEntry, Individual, SpatialCell};

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn load_georef_rows() -> anyhow::Result<Vec<GeoStateEntry>> {
    read_json("georef_sample.json")
}

pub fn load_arg_edges() -> anyhow::Result<Vec<ArgEdge>> {
    read_json("arg_sample.json")
}

pub fn load_landgrid() -> anyhow::Result<Vec<SpatialCell>> {
    read_json("landgrid_sample.json")
}

pub fn load_individuals() -> anyhow::Result<Vec<Individual>> {
    read_json("individuals_sample.json")
}

fn read_json<T: serde::de::DeserializeOwned>(name: &str) -> anyhow::Result<T> {
    let path = fixture_path(name);
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("reading fixture {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing fixture {}", path.display()))
}
