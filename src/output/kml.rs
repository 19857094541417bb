//! # KML Writer

use std::fmt::Write;

use super::xml_escape;
use crate::track::GeodeticPoint;

/// Render points as a single KML line string
pub fn render_kml(name: &str, points: &[GeodeticPoint]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n  <Document>\n");
    let _ = writeln!(out, "    <name>{}</name>", xml_escape(name));
    out.push_str("    <Placemark>\n      <LineString>\n        <altitudeMode>absolute</altitudeMode>\n        <coordinates>\n");

    for p in points {
        let _ = writeln!(out, "          {:.7},{:.7},{:.3}", p.longitude, p.latitude, p.altitude);
    }

    out.push_str("        </coordinates>\n      </LineString>\n    </Placemark>\n  </Document>\n</kml>\n");
    out
}
