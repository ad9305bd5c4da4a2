//! Eclipse classification from apparent sizes
//!
//! An occluder (e.g. the Moon) eclipses a source (e.g. the Sun) for an
//! observer (e.g. Earth) when their discs overlap on the observer's sky and
//! the occluder is the nearer of the two. Total when the occluder's disc
//! covers the source's entirely, annular when it sits inside a larger
//! source disc.

use crate::error::{SimError, SimResult};
use crate::system::{BodyId, Driver, SystemSnapshot};
use orrery_core::CartesianPosition;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EclipseKind {
    None,
    Partial,
    Annular,
    Total,
}

/// Geometry behind one classification (angles in radians)
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Occultation {
    pub kind: EclipseKind,
    /// Angle between the occluder and source centres
    pub separation: f64,
    pub occluder_angular_radius: f64,
    pub source_angular_radius: f64,
}

/// Angular radius of a sphere seen from `distance`; `None` from inside it
fn angular_radius(radius: f64, distance: f64) -> Option<f64> {
    if distance <= radius || distance == 0.0 {
        return None;
    }
    Some((radius / distance).asin())
}

/// Classify the view from `observer` of an occluder sphere against a source sphere
pub fn classify(
    observer: CartesianPosition,
    occluder: CartesianPosition,
    occluder_radius: f64,
    source: CartesianPosition,
    source_radius: f64,
) -> Occultation {
    let to_occluder = (occluder - observer).to_vector();
    let to_source = (source - observer).to_vector();
    let d_occluder = to_occluder.norm();
    let d_source = to_source.norm();

    let none = |separation: f64, occ: f64, src: f64| Occultation {
        kind: EclipseKind::None,
        separation,
        occluder_angular_radius: occ,
        source_angular_radius: src,
    };

    let (Some(occ), Some(src)) = (
        angular_radius(occluder_radius, d_occluder),
        angular_radius(source_radius, d_source),
    ) else {
        return none(0.0, 0.0, 0.0);
    };

    let separation = to_occluder.angle(&to_source);

    if d_occluder >= d_source || separation >= occ + src {
        return none(separation, occ, src);
    }

    let kind = if occ >= src && separation <= occ - src {
        EclipseKind::Total
    } else if occ < src && separation <= src - occ {
        EclipseKind::Annular
    } else {
        EclipseKind::Partial
    };

    Occultation {
        kind,
        separation,
        occluder_angular_radius: occ,
        source_angular_radius: src,
    }
}

/// A fixed observer/occluder/source triple resolved against a driver
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EclipseWatch {
    pub observer: BodyId,
    pub occluder: BodyId,
    pub source: BodyId,
    occluder_radius: f64,
    source_radius: f64,
}

impl EclipseWatch {
    /// Occluder and source need a radius; the observer is treated as a point
    pub fn new(driver: &Driver, observer: &str, occluder: &str, source: &str) -> SimResult<Self> {
        let observer = driver.require(observer)?;
        let occluder = driver.require(occluder)?;
        let source = driver.require(source)?;

        let radius_of = |name: &str, radius: Option<f64>| {
            radius.ok_or_else(|| SimError::InvalidBody {
                name: name.to_string(),
                reason: "a radius is required for eclipse checks".to_string(),
            })
        };

        Ok(Self {
            observer: observer.id(),
            occluder: occluder.id(),
            source: source.id(),
            occluder_radius: radius_of(occluder.name(), occluder.radius())?,
            source_radius: radius_of(source.name(), source.radius())?,
        })
    }

    pub fn check(&self, snapshot: &SystemSnapshot) -> Option<Occultation> {
        Some(classify(
            snapshot.get(self.observer)?,
            snapshot.get(self.occluder)?,
            self.occluder_radius,
            snapshot.get(self.source)?,
            self.source_radius,
        ))
    }
}
