//! # GPX Writer
//!
//! GPX 1.1 track with one `trkpt` per point and a speed extension.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write;

use super::xml_escape;
use crate::track::GpsTrack;

const GPX_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="tcf-track"
  xmlns="http://www.topografix.com/GPX/1/1"
  xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
  xmlns:gpxtpx="http://www.garmin.com/xmlschemas/TrackPointExtension/v2"
  xsi:schemaLocation="http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd">
"#;

fn iso(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render a track as GPX text
pub fn render_gpx(track: &GpsTrack) -> String {
    let mut out = String::from(GPX_HEADER);

    // Writing to a String cannot fail
    if let Some(start) = &track.start_time {
        let _ = writeln!(out, "  <metadata>\n    <time>{}</time>\n  </metadata>", iso(start));
    }

    let _ = writeln!(out, "  <trk>\n    <name>{}</name>\n    <trkseg>", xml_escape(&track.device_name));

    for p in &track.points {
        let _ = writeln!(out, "      <trkpt lat=\"{:.7}\" lon=\"{:.7}\">", p.latitude, p.longitude);
        let _ = writeln!(out, "        <ele>{:.3}</ele>", p.altitude);
        if let Some(time) = &p.time {
            let _ = writeln!(out, "        <time>{}</time>", iso(time));
        }
        let _ = writeln!(
            out,
            "        <extensions>\n          <gpxtpx:TrackPointExtension>\n            <gpxtpx:speed>{:.3}</gpxtpx:speed>\n          </gpxtpx:TrackPointExtension>\n        </extensions>",
            p.speed
        );
        out.push_str("      </trkpt>\n");
    }

    out.push_str("    </trkseg>\n  </trk>\n</gpx>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{AcceptanceStats, GeodeticPoint};
    use chrono::TimeZone;

    fn track() -> GpsTrack {
        let start = Utc.with_ymd_and_hms(2019, 2, 17, 10, 15, 30).unwrap();
        GpsTrack {
            points: vec![
                GeodeticPoint {
                    latitude: 40.4168,
                    longitude: -3.7038,
                    altitude: 667.0,
                    time: Some(start),
                    speed: 1.25,
                },
                GeodeticPoint {
                    latitude: 40.4169,
                    longitude: -3.7039,
                    altitude: 668.0,
                    time: None,
                    speed: 0.0,
                },
            ],
            start_time: Some(start),
            device_name: "Hero <7> & co".to_string(),
            stats: AcceptanceStats::default(),
        }
    }

    #[test]
    fn test_gpx_structure() {
        let gpx = render_gpx(&track());
        assert!(gpx.starts_with("<?xml"));
        assert!(gpx.contains("<time>2019-02-17T10:15:30.000Z</time>"));
        assert!(gpx.contains("<name>Hero &lt;7&gt; &amp; co</name>"));
        assert!(gpx.contains("<trkpt lat=\"40.4168000\" lon=\"-3.7038000\">"));
        assert!(gpx.contains("<ele>667.000</ele>"));
        assert!(gpx.contains("<gpxtpx:speed>1.250</gpxtpx:speed>"));
        assert_eq!(gpx.matches("<trkpt ").count(), 2);
        assert!(gpx.trim_end().ends_with("</gpx>"));
    }

    #[test]
    fn test_gpx_point_without_time_has_no_time_element() {
        let gpx = render_gpx(&track());
        // metadata + first point
        assert_eq!(gpx.matches("<time>").count(), 2);
    }

    #[test]
    fn test_gpx_without_start_time_has_no_metadata() {
        let mut t = track();
        t.start_time = None;
        assert!(!render_gpx(&t).contains("<metadata>"));
    }
}
