//! Parser for GPX 1.1 (GPS Exchange Format) documents.
//!
//! Maps an XML document into the typed [`Gpx`] tree: waypoints, routes,
//! tracks, and file-level metadata. The only structural validation is the
//! top-level version check; absent optional elements yield `None` or an
//! empty list, while malformed numeric fields fail the whole parse.
//!
//! ```
//! let gpx = gpx_parse::parse(
//!     r#"<gpx version="1.1" creator="example"><wpt lat="1.5" lon="2.5"/></gpx>"#,
//! )?;
//! assert_eq!(gpx.creator, "example");
//! assert_eq!(gpx.waypoints[0].lat, 1.5);
//! # Ok::<(), gpx_parse::GpxError>(())
//! ```

pub mod error;
pub mod parser;
pub mod types;

pub use error::GpxError;
pub use parser::parse;
pub use types::{
    Author, Bounds, Copyright, Email, Gpx, Link, Metadata, Route, Track, TrackSegment, Waypoint,
};
