//! Landgrid cell geometry: containment lookups, nearest-centroid fallback,
//! and projection of migration steps onto cell centroids.

use std::collections::HashMap;

use geo::{Contains, Distance, Euclidean, LineString, Point, Polygon};
use geoarg_schema::{GeoPoint, MigrationStep, SpatialCell, StateId};

/// Raised when reference geometry cannot be indexed. Fails the whole build:
/// a landgrid with broken cells would misplace every lookup after it.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("no spatial cells provided")]
    Empty,
    #[error("cell {0} has a non-finite coordinate")]
    NonFiniteCoordinate(StateId),
}

#[derive(Debug)]
struct IndexedCell {
    state: StateId,
    centroid: Point<f64>,
    polygon: Polygon<f64>,
}

/// Static lookup over the landgrid. Built once per dataset; coordinates are
/// degrees with x as longitude.
#[derive(Debug)]
pub struct SpatialIndex {
    // ascending by state id, so scans resolve ties toward the lowest id
    cells: Vec<IndexedCell>,
    by_state: HashMap<StateId, usize>,
}

impl SpatialIndex {
    pub fn build(cells: &[SpatialCell]) -> Result<Self, IndexError> {
        if cells.is_empty() {
            return Err(IndexError::Empty);
        }

        let mut indexed = Vec::with_capacity(cells.len());
        for cell in cells {
            if !cell.centroid.is_finite() || cell.boundary.iter().any(|p| !p.is_finite()) {
                return Err(IndexError::NonFiniteCoordinate(cell.state_id));
            }
            let ring: Vec<(f64, f64)> = cell
                .boundary
                .iter()
                .map(|p| (p.longitude, p.latitude))
                .collect();
            indexed.push(IndexedCell {
                state: cell.state_id,
                centroid: Point::new(cell.centroid.longitude, cell.centroid.latitude),
                polygon: Polygon::new(LineString::from(ring), vec![]),
            });
        }
        indexed.sort_unstable_by_key(|cell| cell.state);
        let by_state = indexed
            .iter()
            .enumerate()
            .map(|(index, cell)| (cell.state, index))
            .collect();

        Ok(Self {
            cells: indexed,
            by_state,
        })
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn centroid_of(&self, state: StateId) -> Option<GeoPoint> {
        self.by_state.get(&state).map(|&index| {
            let centroid = self.cells[index].centroid;
            GeoPoint::new(centroid.x(), centroid.y())
        })
    }

    /// Cell whose polygon contains the point.
    pub fn containing(&self, point: GeoPoint) -> Option<StateId> {
        let p = Point::new(point.longitude, point.latitude);
        self.cells
            .iter()
            .find(|cell| cell.polygon.contains(&p))
            .map(|cell| cell.state)
    }

    /// Cell with the smallest centroid distance; the lowest id wins ties.
    pub fn nearest(&self, point: GeoPoint) -> Option<StateId> {
        let p = Point::new(point.longitude, point.latitude);
        let mut best: Option<(f64, StateId)> = None;
        for cell in &self.cells {
            let distance = Euclidean::distance(p, cell.centroid);
            if best.map_or(true, |(kept, _)| distance < kept) {
                best = Some((distance, cell.state));
            }
        }
        best.map(|(_, state)| state)
    }

    /// Containment first, nearest centroid when no polygon claims the point.
    /// Boundary samples sit exactly on hexagon borders, so the fallback is
    /// routine, not exceptional.
    pub fn assign(&self, point: GeoPoint) -> Option<StateId> {
        self.containing(point).or_else(|| self.nearest(point))
    }

    /// Joins each step to its endpoint centroids for rendering. Steps naming
    /// a state with no cell are dropped here and counted.
    pub fn project_steps(&self, steps: &[MigrationStep]) -> ProjectedPaths {
        let mut projected = ProjectedPaths::default();
        for step in steps {
            match (
                self.centroid_of(step.source_id),
                self.centroid_of(step.target_id),
            ) {
                (Some(source), Some(target)) => projected.segments.push(ProjectedStep {
                    source,
                    target,
                    time: step.time,
                }),
                _ => projected.dropped += 1,
            }
        }
        if projected.dropped > 0 {
            tracing::debug!(
                dropped = projected.dropped,
                "steps referenced states without cells"
            );
        }
        projected
    }
}

/// A migration step joined to its cell centroids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedStep {
    pub source: GeoPoint,
    pub target: GeoPoint,
    pub time: f64,
}

/// Geometric view of a step list.
#[derive(Debug, Clone, Default)]
pub struct ProjectedPaths {
    pub segments: Vec<ProjectedStep>,
    /// Steps lost to unknown state ids.
    pub dropped: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(state: u32, min_lon: f64, min_lat: f64, size: f64) -> SpatialCell {
        SpatialCell {
            state_id: StateId(state),
            continent_id: "C1".to_string(),
            centroid: GeoPoint::new(min_lon + size / 2.0, min_lat + size / 2.0),
            boundary: vec![
                GeoPoint::new(min_lon, min_lat),
                GeoPoint::new(min_lon + size, min_lat),
                GeoPoint::new(min_lon + size, min_lat + size),
                GeoPoint::new(min_lon, min_lat + size),
            ],
        }
    }

    // a wide cell next to a small one: [0,2]^2 and [2.5,3]x[0,0.5]
    fn index() -> SpatialIndex {
        SpatialIndex::build(&[square(1, 0.0, 0.0, 2.0), square(2, 2.5, 0.0, 0.5)]).unwrap()
    }

    #[test]
    fn containment_beats_distance() {
        let index = index();
        // inside cell 1 but closer to cell 2's centroid at (2.75, 0.25)
        let point = GeoPoint::new(1.96875, 0.25);
        assert_eq!(index.nearest(point), Some(StateId(2)));
        assert_eq!(index.containing(point), Some(StateId(1)));
        assert_eq!(index.assign(point), Some(StateId(1)));
    }

    #[test]
    fn uncontained_points_fall_back_to_nearest_centroid() {
        let index = index();
        // in the gap between the two cells, nearer to cell 2
        let point = GeoPoint::new(2.25, 0.25);
        assert_eq!(index.containing(point), None);
        assert_eq!(index.assign(point), Some(StateId(2)));
    }

    #[test]
    fn nearest_ties_resolve_to_the_lowest_id() {
        let index =
            SpatialIndex::build(&[square(1, 0.0, 0.0, 1.0), square(2, 2.0, 0.0, 1.0)]).unwrap();
        // equidistant from both centroids at (0.5, 0.5) and (2.5, 0.5)
        assert_eq!(index.nearest(GeoPoint::new(1.5, 8.0)), Some(StateId(1)));
    }

    #[test]
    fn centroid_lookup_by_state() {
        let index = index();
        assert_eq!(
            index.centroid_of(StateId(2)),
            Some(GeoPoint::new(2.75, 0.25))
        );
        assert_eq!(index.centroid_of(StateId(9)), None);
    }

    #[test]
    fn empty_reference_geometry_is_rejected() {
        assert!(matches!(SpatialIndex::build(&[]), Err(IndexError::Empty)));
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let mut cell = square(3, 0.0, 0.0, 1.0);
        cell.boundary[1] = GeoPoint::new(f64::NAN, 0.0);
        let err = SpatialIndex::build(&[cell]).unwrap_err();
        assert!(matches!(err, IndexError::NonFiniteCoordinate(state) if state == StateId(3)));
    }

    #[test]
    fn projection_drops_and_counts_unknown_states() {
        let index = index();
        let steps = [
            MigrationStep {
                source_id: StateId(1),
                target_id: StateId(2),
                time: 40.0,
            },
            MigrationStep {
                source_id: StateId(1),
                target_id: StateId(77),
                time: 90.0,
            },
        ];

        let projected = index.project_steps(&steps);
        assert_eq!(projected.segments.len(), 1);
        assert_eq!(projected.dropped, 1);
        assert_eq!(projected.segments[0].source, GeoPoint::new(1.0, 1.0));
        assert_eq!(projected.segments[0].target, GeoPoint::new(2.75, 0.25));
    }
}
