use serde::{Deserialize, Serialize};

/// A parsed GPX 1.1 document.
///
/// Owns everything reachable from it; list fields preserve source document
/// order and may be empty but are never absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Gpx {
    /// Always the literal "1.1".
    pub version: String,
    /// Creator application, empty if the attribute is absent.
    pub creator: String,
    pub metadata: Metadata,
    pub waypoints: Vec<Waypoint>,
    pub routes: Vec<Route>,
    pub tracks: Vec<Track>,
    /// Raw inner XML of the root-level <extensions> element, uninterpreted.
    pub extensions: Option<String>,
}

/// File-level description (<metadata>).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: Option<String>,
    pub desc: Option<String>,
    pub time: Option<String>,
    pub keywords: Option<String>,
    pub author: Option<Author>,
    pub copyright: Option<Copyright>,
    pub links: Vec<Link>,
    pub bounds: Option<Bounds>,
    pub extensions: Option<String>,
}

/// Document author (<author>).
///
/// The GPX 1.1 schema allows the author a single link, unlike metadata,
/// waypoints, routes, and tracks which allow any number. Only the first
/// <link> child is kept here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub link: Option<Link>,
}

/// Author contact (<email>), split into id and domain attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub id: String,
    pub domain: String,
}

/// A hyperlink reference (<link>).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub text: Option<String>,
    pub link_type: Option<String>,
}

/// License information (<copyright>).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Copyright {
    pub author: String,
    pub year: Option<String>,
    pub license: Option<String>,
}

/// Lat/lon bounding box (<bounds>), attribute-sourced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

/// A single GPX point, shared by wpt, rtept, and trkpt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    pub ele: Option<f64>,
    pub time: Option<String>,
    pub magvar: Option<f64>,
    pub geoid_height: Option<f64>,
    pub name: Option<String>,
    pub cmt: Option<String>,
    pub desc: Option<String>,
    pub src: Option<String>,
    pub sym: Option<String>,
    pub point_type: Option<String>,
    pub fix: Option<String>,
    pub sat: Option<u32>,
    pub hdop: Option<f64>,
    pub vdop: Option<f64>,
    pub pdop: Option<f64>,
    pub age_of_dgps_data: Option<f64>,
    pub dgps_id: Option<u16>,
    pub links: Vec<Link>,
    pub extensions: Option<String>,
}

impl Waypoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            ..Self::default()
        }
    }
}

/// An ordered sequence of waypoints forming a planned path (<rte>).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub name: Option<String>,
    pub cmt: Option<String>,
    pub desc: Option<String>,
    pub src: Option<String>,
    pub number: Option<u32>,
    pub route_type: Option<String>,
    pub links: Vec<Link>,
    pub extensions: Option<String>,
    pub points: Vec<Waypoint>,
}

/// Recorded movement as an ordered sequence of segments (<trk>).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: Option<String>,
    pub cmt: Option<String>,
    pub desc: Option<String>,
    pub src: Option<String>,
    pub number: Option<u32>,
    pub track_type: Option<String>,
    pub links: Vec<Link>,
    pub extensions: Option<String>,
    pub segments: Vec<TrackSegment>,
}

/// A contiguous run of recorded points within a track (<trkseg>).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackSegment {
    pub points: Vec<Waypoint>,
    pub extensions: Option<String>,
}
