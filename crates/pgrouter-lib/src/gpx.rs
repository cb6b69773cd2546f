//! GPX 1.1 track-log serialization of node-to-node routings.
//!
//! Each routing becomes one `<trk>` named `lon,lat->lon,lat: cost` holding a
//! single `<trkseg>` with one `<trkpt>` per path node, in map order. Numbers
//! are written in round-trip form with a fractional part (`40.0`, not `40`).

use std::fmt::Write;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::node::{PairRoutings, PgrNode, Routing};

const GPX_HEADER: &str = "<?xml version='1.0'?>\n\
<gpx version='1.1' creator='pgrouter' \
xmlns='http://www.topografix.com/GPX/1/1' \
xmlns:xsi='http://www.w3.org/2001/XMLSchema-instance' \
xsi:schemaLocation='http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd'>\n";

const GPX_FOOTER: &str = "</gpx>\n";

/// Render routings as a GPX document.
pub fn render_gpx(routings: &PairRoutings) -> String {
    let mut buffer = String::from(GPX_HEADER);
    for ((start, end), routing) in routings {
        render_track(&mut buffer, start, end, routing);
    }
    buffer.push_str(GPX_FOOTER);
    buffer
}

/// Render routings as GPX and save the document to `path`.
pub fn write_gpx(routings: &PairRoutings, path: &Path) -> Result<String> {
    let document = render_gpx(routings);
    fs::write(path, &document)?;
    info!(path = %path.display(), tracks = routings.len(), "gpx saved");
    Ok(document)
}

fn render_track(buffer: &mut String, start: &PgrNode, end: &PgrNode, routing: &Routing) {
    let _ = writeln!(buffer, " <trk>");
    let _ = writeln!(
        buffer,
        "  <name>{:?},{:?}->{:?},{:?}: {:?}</name>",
        start.lon, start.lat, end.lon, end.lat, routing.cost
    );
    let _ = writeln!(buffer, "  <trkseg>");
    for node in &routing.path {
        let _ = writeln!(buffer, "   <trkpt lat='{:?}' lon='{:?}'>", node.lat, node.lon);
        let _ = writeln!(buffer, "   </trkpt>");
    }
    let _ = writeln!(buffer, "  </trkseg>\n  </trk>");
}
