//! Static hazard coordinates (potholes and speed bumps).
//!
//! Each source file holds exactly one `latitude,longitude` pair per line. A header
//! line is allowed, as are blank lines and `#` comments.

use std::fmt;
use std::path::Path;

use super::LiveError;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance in metres (haversine).
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardKind {
    Pothole,
    SpeedBump,
}

impl fmt::Display for HazardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pothole => f.write_str("pothole"),
            Self::SpeedBump => f.write_str("speed bump"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestHazard {
    pub kind: HazardKind,
    pub point: GeoPoint,
    pub distance_m: f64,
}

/// Both hazard lists, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct HazardMap {
    pub potholes: Vec<GeoPoint>,
    pub speed_bumps: Vec<GeoPoint>,
}

impl HazardMap {
    /// Load whichever sources are given; a missing source is an empty list.
    pub fn load(
        potholes: Option<&Path>,
        speed_bumps: Option<&Path>,
    ) -> Result<Self, LiveError> {
        Ok(Self {
            potholes: potholes.map(load_points).transpose()?.unwrap_or_default(),
            speed_bumps: speed_bumps.map(load_points).transpose()?.unwrap_or_default(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.potholes.is_empty() && self.speed_bumps.is_empty()
    }

    pub fn nearest(&self, position: &GeoPoint) -> Option<NearestHazard> {
        let potholes = self.potholes.iter().map(|p| (HazardKind::Pothole, p));
        let bumps = self.speed_bumps.iter().map(|p| (HazardKind::SpeedBump, p));

        potholes
            .chain(bumps)
            .map(|(kind, point)| NearestHazard {
                kind,
                point: *point,
                distance_m: position.distance_m(point),
            })
            .min_by(|a, b| a.distance_m.total_cmp(&b.distance_m))
    }
}

pub fn load_points(path: &Path) -> Result<Vec<GeoPoint>, LiveError> {
    let content = std::fs::read_to_string(path).map_err(|source| LiveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_points(&content, path)
}

/// Parse coordinate lines; `origin` is only used in error messages.
pub fn parse_points(content: &str, origin: &Path) -> Result<Vec<GeoPoint>, LiveError> {
    let mut points = Vec::new();
    let mut seen_data = false;

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_pair(line) {
            Ok(point) => {
                points.push(point);
                seen_data = true;
            }
            // header row, e.g. "lat,lon"
            Err(_) if !seen_data && !line.starts_with(|c: char| c.is_ascii_digit() || c == '-') => {
                seen_data = true;
            }
            Err(reason) => {
                return Err(LiveError::Parse {
                    path: origin.to_path_buf(),
                    line: index + 1,
                    reason,
                });
            }
        }
    }

    Ok(points)
}

fn parse_pair(line: &str) -> Result<GeoPoint, String> {
    let mut fields = line.split([',', ';']).map(str::trim);
    let (Some(lat), Some(lon)) = (fields.next(), fields.next()) else {
        return Err(format!("expected latitude,longitude, got {line:?}"));
    };
    if fields.next().is_some() {
        return Err(format!("expected exactly two fields, got {line:?}"));
    }

    let latitude: f64 = lat
        .parse()
        .map_err(|_| format!("latitude {lat:?} is not a number"))?;
    let longitude: f64 = lon
        .parse()
        .map_err(|_| format!("longitude {lon:?} is not a number"))?;

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("coordinate ({latitude}, {longitude}) out of range"));
    }

    Ok(GeoPoint::new(latitude, longitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> &'static Path {
        Path::new("test.csv")
    }

    #[test]
    fn parses_header_comments_and_pairs() {
        let points = parse_points(
            "lat,lon\n# first block\n50.4474,30.4517\n\n50.4480; 30.4520\n",
            origin(),
        )
        .unwrap();

        assert_eq!(
            points,
            vec![GeoPoint::new(50.4474, 30.4517), GeoPoint::new(50.4480, 30.4520)]
        );
    }

    #[test]
    fn bad_line_reports_its_number() {
        let err = parse_points("50.1,30.1\n50.2,abc\n", origin()).unwrap_err();
        match err {
            LiveError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn header_after_data_is_an_error() {
        assert!(parse_points("50.1,30.1\nlat,lon\n", origin()).is_err());
        assert!(parse_points("91.0,30.0\n", origin()).is_err());
    }

    #[test]
    fn extra_fields_are_rejected() {
        let err = parse_points("50.1,30.1\n50.1,30.1,junk\n", origin()).unwrap_err();
        match err {
            LiveError::Parse { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("two fields"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn distance_is_plausible() {
        let a = GeoPoint::new(50.4474, 30.4517);
        assert_eq!(a.distance_m(&a), 0.0);

        // one thousandth of a degree of latitude is about 111 m
        let b = GeoPoint::new(50.4484, 30.4517);
        let d = a.distance_m(&b);
        assert!((d - 111.19).abs() < 0.5, "got {d}");
    }

    #[test]
    fn nearest_picks_across_both_kinds() {
        let map = HazardMap {
            potholes: vec![GeoPoint::new(50.0, 30.0)],
            speed_bumps: vec![GeoPoint::new(50.4475, 30.4517)],
        };

        let hit = map.nearest(&GeoPoint::new(50.4474, 30.4517)).unwrap();
        assert_eq!(hit.kind, HazardKind::SpeedBump);
        assert!(hit.distance_m < 20.0);

        assert!(HazardMap::default().nearest(&GeoPoint::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn load_reads_files_and_tolerates_missing_sources() {
        let dir = tempfile::tempdir().unwrap();
        let potholes = dir.path().join("potholes.csv");
        std::fs::write(&potholes, "50.1,30.1\n50.2,30.2\n").unwrap();

        let map = HazardMap::load(Some(potholes.as_path()), None).unwrap();
        assert_eq!(map.potholes.len(), 2);
        assert!(map.speed_bumps.is_empty());

        let missing = dir.path().join("nope.csv");
        assert!(matches!(
            HazardMap::load(None, Some(missing.as_path())),
            Err(LiveError::Io { .. })
        ));
    }
}
