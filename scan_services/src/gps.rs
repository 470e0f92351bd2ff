//! GPS position from EXIF tags.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{In, Tag, Value};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Position record; a field is `None` when its tags are missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub altitude: Option<f64>,
}

/// Raw GPS tag values as stored in the EXIF block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpsTags {
    pub latitude: Option<Vec<f64>>,
    pub latitude_ref: Option<String>,
    pub longitude: Option<Vec<f64>>,
    pub longitude_ref: Option<String>,
    pub altitude: Option<f64>,
    pub altitude_ref: Option<u8>,
}

impl GpsTags {
    pub fn from_exif(exif: &exif::Exif) -> Self {
        let field = |tag| exif.get_field(tag, In::PRIMARY).map(|f| &f.value);
        Self {
            latitude: field(Tag::GPSLatitude).and_then(rationals),
            latitude_ref: field(Tag::GPSLatitudeRef).and_then(ascii),
            longitude: field(Tag::GPSLongitude).and_then(rationals),
            longitude_ref: field(Tag::GPSLongitudeRef).and_then(ascii),
            altitude: field(Tag::GPSAltitude)
                .and_then(rationals)
                .and_then(|v| v.first().copied()),
            altitude_ref: field(Tag::GPSAltitudeRef).and_then(|v| match v {
                Value::Byte(bytes) => bytes.first().copied(),
                _ => None,
            }),
        }
    }

    pub fn resolve(&self) -> GpsFix {
        let lat = self
            .latitude
            .as_deref()
            .and_then(dms_to_degrees)
            .map(|deg| signed(deg, self.latitude_ref.as_deref(), "S"));
        let lon = self
            .longitude
            .as_deref()
            .and_then(dms_to_degrees)
            .map(|deg| signed(deg, self.longitude_ref.as_deref(), "W"));
        let altitude = self.altitude.map(|alt| match self.altitude_ref {
            Some(1) => -alt,
            _ => alt,
        });
        GpsFix { lat, lon, altitude }
    }
}

fn rationals(value: &Value) -> Option<Vec<f64>> {
    match value {
        Value::Rational(parts) if !parts.is_empty() => {
            Some(parts.iter().map(|r| r.to_f64()).collect())
        }
        _ => None,
    }
}

fn ascii(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string()),
        _ => None,
    }
}

/// Degrees, minutes and seconds to decimal degrees. Missing trailing
/// components count as zero.
pub fn dms_to_degrees(dms: &[f64]) -> Option<f64> {
    let degrees = *dms.first()?;
    let minutes = dms.get(1).copied().unwrap_or(0.0);
    let seconds = dms.get(2).copied().unwrap_or(0.0);
    Some(degrees + minutes / 60.0 + seconds / 3600.0)
}

fn signed(value: f64, reference: Option<&str>, negative: &str) -> f64 {
    if reference == Some(negative) {
        -value
    } else {
        value
    }
}

/// Reads the GPS record of an image. Files without EXIF data yield an
/// empty record.
pub fn read_gps(path: &Path) -> Result<GpsFix> {
    let file = File::open(path).map_err(|e| ServiceError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => {
            log::info!("No EXIF data in {path:?}");
            return Ok(GpsFix::default());
        }
        Err(exif::Error::Io(e)) => return Err(ServiceError::io(path, e)),
        Err(source) => {
            return Err(ServiceError::Exif {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let fix = GpsTags::from_exif(&exif).resolve();
    log::info!("GPS {path:?}: {fix:?}");
    Ok(fix)
}
