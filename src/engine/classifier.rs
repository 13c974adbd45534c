//! Threshold Table lookup
//!
//! Maps a cumulative volume to the truck class whose inclusive band contains
//! it. Bands are kept sorted by lower bound so the first match is also the
//! smallest qualifying truck. Volumes in the gaps between bands (for example
//! 1.0 to 4.0 t with the default table) match nothing: the demand keeps
//! accumulating until a later tick crosses the next lower bound.

use crate::types::{TruckClass, TruckClassBand};

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    bands: Vec<TruckClassBand>,
}

impl ThresholdTable {
    pub fn new(mut bands: Vec<TruckClassBand>) -> Self {
        bands.sort_by(|a, b| a.min_volume_tons.total_cmp(&b.min_volume_tons));
        Self { bands }
    }

    pub fn bands(&self) -> &[TruckClassBand] {
        &self.bands
    }

    /// Band containing `volume_tons`, if any. NaN never matches.
    pub fn band_for(&self, volume_tons: f64) -> Option<&TruckClassBand> {
        self.bands.iter().find(|band| band.contains(volume_tons))
    }

    pub fn classify(&self, volume_tons: f64) -> Option<TruckClass> {
        self.band_for(volume_tons).map(|band| band.class)
    }

    pub fn band(&self, class: TruckClass) -> Option<&TruckClassBand> {
        self.bands.iter().find(|band| band.class == class)
    }

    /// Smallest service radius in the table (km).
    ///
    /// Used as the default clustering radius so every cluster member lies
    /// inside the service area of whichever class the cluster qualifies for.
    pub fn smallest_radius_km(&self) -> Option<f64> {
        self.bands.iter().map(|b| b.radius_km).reduce(f64::min)
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::new(TruckClassBand::default_table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges_are_inclusive() {
        let table = ThresholdTable::default();
        assert_eq!(table.classify(0.5), Some(TruckClass::SmallTruck));
        assert_eq!(table.classify(1.0), Some(TruckClass::SmallTruck));
        assert_eq!(table.classify(4.0), Some(TruckClass::MediumTruck));
        assert_eq!(table.classify(14.0), Some(TruckClass::LargeTruck));
    }

    #[test]
    fn test_touching_bands_pick_the_smaller_truck() {
        // 8.0 is the upper edge of MEDIUM and the lower edge of LARGE
        let table = ThresholdTable::default();
        assert_eq!(table.classify(8.0), Some(TruckClass::MediumTruck));
        assert_eq!(table.classify(8.01), Some(TruckClass::LargeTruck));
    }

    #[test]
    fn test_gaps_and_out_of_range_match_nothing() {
        let table = ThresholdTable::default();
        assert_eq!(table.classify(0.45), None);
        assert_eq!(table.classify(1.2), None);
        assert_eq!(table.classify(2.5), None);
        assert_eq!(table.classify(3.99), None);
        assert_eq!(table.classify(14.01), None);
        assert_eq!(table.classify(0.0), None);
        assert_eq!(table.classify(f64::NAN), None);
    }

    #[test]
    fn test_unsorted_input_is_ordered() {
        let table = ThresholdTable::new(vec![
            TruckClassBand::large_truck(),
            TruckClassBand::small_truck(),
            TruckClassBand::medium_truck(),
        ]);
        let classes: Vec<_> = table.bands().iter().map(|b| b.class).collect();
        assert_eq!(
            classes,
            vec![TruckClass::SmallTruck, TruckClass::MediumTruck, TruckClass::LargeTruck]
        );
        assert_eq!(table.smallest_radius_km(), Some(5.0));
    }

    #[test]
    fn test_band_lookup_by_class() {
        let table = ThresholdTable::default();
        let band = table.band(TruckClass::MediumTruck).unwrap();
        assert!((band.radius_km - 12.0).abs() < f64::EPSILON);
        assert_eq!(band.time_window_hours, 48);
    }
}
