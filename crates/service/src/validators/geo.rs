use models::Record;

use super::{Rejection, ValidationContext, Validator};

/// Joint latitude/longitude bounds.
#[derive(Clone, Copy, Debug)]
pub struct GeoBounds {
    pub latitude_field: &'static str,
    pub longitude_field: &'static str,
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self { latitude_field: "latitude", longitude_field: "longitude" }
    }
}

impl Validator for GeoBounds {
    fn validate(&self, _ctx: &ValidationContext<'_>, candidate: &Record) -> Result<(), Rejection> {
        let (lat_field, lon_field) = (self.latitude_field, self.longitude_field);
        let (lat, lon) = match (candidate.get(lat_field), candidate.get(lon_field)) {
            (None, None) => return Ok(()),
            (Some(lat), Some(lon)) => (lat.as_f64(), lon.as_f64()),
            _ => {
                return Err(Rejection::invalid(format!(
                    "{lat_field} and {lon_field} must be provided together"
                )))
            }
        };
        let (Some(lat), Some(lon)) = (lat, lon) else {
            return Err(Rejection::invalid(format!("{lat_field} and {lon_field} must be numbers")));
        };
        if !(-90.0..=90.0).contains(&lat) {
            return Err(Rejection::invalid(format!("{lat_field} must be between -90 and 90")));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(Rejection::invalid(format!("{lon_field} must be between -180 and 180")));
        }
        Ok(())
    }
}
