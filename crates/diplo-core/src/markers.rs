//! Map marker thinning and nearby-record lookup
//!
//! Both operations work in degrees scaled from screen pixels of the current
//! [`Viewport`]. Records without coordinates never produce markers.

use serde::{Deserialize, Serialize};

use crate::record::{Record, RecordType};

/// Pixel radius within which markers collapse into one
pub const DEFAULT_THINNING_RADIUS_PX: f64 = 5.0;
/// Pixel radius of the nearby-record lookup
pub const DEFAULT_NEARBY_RADIUS_PX: f64 = 10.0;

const TILE_SIZE_PX: f64 = 512.0;

/// Visible map bounds and their size on screen
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    pub width_px: u32,
    pub height_px: u32,
}

impl Viewport {
    /// Approximate bounds of a web-mercator view centred on a point
    pub fn from_center(lat: f64, lng: f64, zoom: f64, width_px: u32, height_px: u32) -> Self {
        let lng_per_px = 360.0 / (TILE_SIZE_PX * 2f64.powf(zoom));
        let lat_per_px = lng_per_px * lat.to_radians().cos();
        let half_w = lng_per_px * f64::from(width_px) / 2.0;
        let half_h = lat_per_px * f64::from(height_px) / 2.0;
        Self {
            north: lat + half_h,
            south: lat - half_h,
            east: lng + half_w,
            west: lng - half_w,
            width_px,
            height_px,
        }
    }

    /// Degrees per screen pixel as (latitude, longitude)
    pub fn degrees_per_pixel(&self) -> (f64, f64) {
        let lat = (self.north - self.south).abs() / f64::from(self.height_px.max(1));
        let lng = (self.east - self.west).abs() / f64::from(self.width_px.max(1));
        (lat, lng)
    }
}

/// A kept marker; `index` points into the visible record slice
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub index: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub record_type: RecordType,
    pub priority: u8,
}

impl Marker {
    fn from_record(index: usize, record: &Record) -> Option<Self> {
        let (latitude, longitude) = record.coordinates()?;
        let record_type = record.record_type?;
        Some(Self {
            index,
            latitude,
            longitude,
            record_type,
            priority: record_type.priority(),
        })
    }
}

/// Greedy thinning in record order
///
/// A record within the per-axis threshold of an already kept marker replaces
/// it only if its priority is higher. The result is sorted by ascending
/// priority so the most important markers draw last.
pub fn thin_markers(visible: &[&Record], viewport: &Viewport, radius_px: f64) -> Vec<Marker> {
    let (lat_per_px, lng_per_px) = viewport.degrees_per_pixel();
    let threshold_lat = lat_per_px * radius_px;
    let threshold_lng = lng_per_px * radius_px;

    let mut kept: Vec<Marker> = Vec::new();
    for (index, record) in visible.iter().enumerate() {
        let Some(candidate) = Marker::from_record(index, record) else {
            continue;
        };
        let collision = kept.iter().position(|m| {
            (m.latitude - candidate.latitude).abs() <= threshold_lat
                && (m.longitude - candidate.longitude).abs() <= threshold_lng
        });
        match collision {
            Some(i) if candidate.priority > kept[i].priority => kept[i] = candidate,
            Some(_) => {}
            None => kept.push(candidate),
        }
    }

    kept.sort_by_key(|m| m.priority);
    kept
}

/// Indices of visible records around a clicked one
///
/// The clicked record comes first, the rest by descending priority.
pub fn nearby_records(
    visible: &[&Record],
    clicked: usize,
    viewport: &Viewport,
    radius_px: f64,
) -> Vec<usize> {
    let Some((lat, lng)) = visible.get(clicked).and_then(|r| r.coordinates()) else {
        return Vec::new();
    };
    let (_, lng_per_px) = viewport.degrees_per_pixel();
    let threshold = radius_px * lng_per_px;

    let mut near: Vec<usize> = visible
        .iter()
        .enumerate()
        .filter_map(|(i, r)| {
            let (rlat, rlng) = r.coordinates()?;
            ((rlat - lat).hypot(rlng - lng) <= threshold).then_some(i)
        })
        .collect();

    let priority = |i: usize| visible[i].record_type.map_or(0, |t| t.priority());
    near.sort_by(|&a, &b| {
        (b == clicked)
            .cmp(&(a == clicked))
            .then_with(|| priority(b).cmp(&priority(a)))
    });
    near
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        // 0.01 degrees per pixel on both axes
        Viewport {
            north: 10.0,
            south: 0.0,
            east: 10.0,
            west: 0.0,
            width_px: 1000,
            height_px: 1000,
        }
    }

    fn at(lat: f64, lng: f64, record_type: RecordType) -> Record {
        Record {
            latitude: Some(lat),
            longitude: Some(lng),
            record_type: Some(record_type),
            ..Default::default()
        }
    }

    #[test]
    fn test_degrees_per_pixel() {
        let (lat, lng) = viewport().degrees_per_pixel();
        assert!((lat - 0.01).abs() < 1e-12);
        assert!((lng - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_higher_priority_wins_collision() {
        let records = [
            at(5.0, 5.0, RecordType::SpecimenRecord),
            at(5.02, 5.02, RecordType::TypeLocality),
        ];
        let visible: Vec<&Record> = records.iter().collect();
        let markers = thin_markers(&visible, &viewport(), 5.0);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].record_type, RecordType::TypeLocality);
        assert_eq!(markers[0].index, 1);
    }

    #[test]
    fn test_lower_priority_does_not_replace() {
        let records = [
            at(5.0, 5.0, RecordType::TypeLocality),
            at(5.0, 5.0, RecordType::LiteratureRecord),
            at(8.0, 8.0, RecordType::LiteratureRecord),
            Record::default(),
        ];
        let visible: Vec<&Record> = records.iter().collect();
        let markers = thin_markers(&visible, &viewport(), 5.0);
        assert_eq!(markers.len(), 2);
        // ascending priority: literature first, type locality last
        assert_eq!(markers[0].index, 2);
        assert_eq!(markers[1].index, 0);
    }

    #[test]
    fn test_nearby_clicked_first_then_priority() {
        let records = [
            at(5.0, 5.0, RecordType::LiteratureRecord),
            at(5.05, 5.0, RecordType::SpecimenRecord),
            at(5.0, 5.05, RecordType::TypeLocality),
            at(6.0, 6.0, RecordType::TypeLocality),
        ];
        let visible: Vec<&Record> = records.iter().collect();
        let near = nearby_records(&visible, 0, &viewport(), 10.0);
        assert_eq!(near, vec![0, 2, 1]);
    }

    #[test]
    fn test_nearby_without_coordinates() {
        let records = [Record::default()];
        let visible: Vec<&Record> = records.iter().collect();
        assert!(nearby_records(&visible, 0, &viewport(), 10.0).is_empty());
        assert!(nearby_records(&visible, 5, &viewport(), 10.0).is_empty());
    }

    #[test]
    fn test_from_center_contains_center() {
        let v = Viewport::from_center(36.68917, 139.8192, 8.5, 1280, 800);
        assert!(v.south < 36.68917 && 36.68917 < v.north);
        assert!(v.west < 139.8192 && 139.8192 < v.east);
    }
}
