use std::str::FromStr;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{GpxError, Result};
use crate::types::*;

/// The only GPX version this parser accepts.
const SUPPORTED_VERSION: &str = "1.1";

/// Parse a GPX 1.1 XML string into a [`Gpx`] document.
///
/// The first top-level element is taken as the document root; its `version`
/// attribute must be exactly "1.1" or the parse fails before any child is
/// mapped. Malformed XML is reported by the underlying reader and passed
/// through unchanged.
pub fn parse(xml: &str) -> Result<Gpx> {
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => return parse_document(&e, &mut reader, false),
            Ok(Event::Empty(e)) => return parse_document(&e, &mut reader, true),
            // No root element means no version declaration either.
            Ok(Event::Eof) => {
                return Err(GpxError::UnsupportedVersion {
                    found: String::new(),
                });
            }
            Err(e) => return Err(GpxError::Xml(e)),
            _ => {}
        }
    }
}

/// Map the root element and everything below it.
fn parse_document<'a>(
    start: &BytesStart<'a>,
    reader: &mut Reader<&'a [u8]>,
    empty: bool,
) -> Result<Gpx> {
    let version = attr_value(start, b"version")?.unwrap_or_default();
    if version != SUPPORTED_VERSION {
        return Err(GpxError::UnsupportedVersion { found: version });
    }

    let mut gpx = Gpx {
        version,
        creator: attr_value(start, b"creator")?.unwrap_or_default(),
        ..Gpx::default()
    };
    if empty {
        return Ok(gpx);
    }

    let end_name = start.name().0.to_vec();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"metadata" => gpx.metadata = parse_metadata(reader)?,
                b"wpt" => gpx.waypoints.push(parse_waypoint(&e, reader, "wpt", false)?),
                b"rte" => gpx.routes.push(parse_route(reader)?),
                b"trk" => gpx.tracks.push(parse_track(reader)?),
                b"extensions" => gpx.extensions = Some(raw_inner_xml(reader, &e)?),
                _ => skip_element(reader, &e)?,
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"wpt" => gpx.waypoints.push(parse_waypoint(&e, reader, "wpt", true)?),
                b"rte" => gpx.routes.push(Route::default()),
                b"trk" => gpx.tracks.push(Track::default()),
                b"extensions" => gpx.extensions = Some(String::new()),
                _ => {}
            },
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(GpxError::Xml(e)),
            _ => {}
        }
    }

    Ok(gpx)
}

/// Map a <metadata> element.
fn parse_metadata<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Metadata> {
    let mut metadata = Metadata::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"name" => metadata.name = Some(element_text(reader, &e)?),
                b"desc" => metadata.desc = Some(element_text(reader, &e)?),
                b"time" => metadata.time = Some(element_text(reader, &e)?),
                b"keywords" => metadata.keywords = Some(element_text(reader, &e)?),
                b"author" => metadata.author = Some(parse_author(reader)?),
                b"copyright" => metadata.copyright = Some(parse_copyright(&e, reader, false)?),
                b"link" => metadata.links.push(parse_link(&e, reader, false)?),
                b"bounds" => {
                    metadata.bounds = Some(parse_bounds(&e)?);
                    skip_element(reader, &e)?;
                }
                b"extensions" => metadata.extensions = Some(raw_inner_xml(reader, &e)?),
                _ => skip_element(reader, &e)?,
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"name" => metadata.name = Some(String::new()),
                b"desc" => metadata.desc = Some(String::new()),
                b"time" => metadata.time = Some(String::new()),
                b"keywords" => metadata.keywords = Some(String::new()),
                b"author" => metadata.author = Some(Author::default()),
                b"copyright" => metadata.copyright = Some(parse_copyright(&e, reader, true)?),
                b"link" => metadata.links.push(parse_link(&e, reader, true)?),
                b"bounds" => metadata.bounds = Some(parse_bounds(&e)?),
                b"extensions" => metadata.extensions = Some(String::new()),
                _ => {}
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"metadata" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(GpxError::Xml(e)),
            _ => {}
        }
    }

    Ok(metadata)
}

/// Map an <author> element.
fn parse_author<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Author> {
    let mut author = Author::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"name" => author.name = Some(element_text(reader, &e)?),
                b"email" => {
                    author.email = Some(parse_email(&e)?);
                    skip_element(reader, &e)?;
                }
                b"link" => {
                    // The schema gives the author a single link, unlike every
                    // other link-bearing element. Keep the first, consume the
                    // rest.
                    let link = parse_link(&e, reader, false)?;
                    if author.link.is_none() {
                        author.link = Some(link);
                    }
                }
                _ => skip_element(reader, &e)?,
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"name" => author.name = Some(String::new()),
                b"email" => author.email = Some(parse_email(&e)?),
                b"link" => {
                    let link = parse_link(&e, reader, true)?;
                    if author.link.is_none() {
                        author.link = Some(link);
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"author" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(GpxError::Xml(e)),
            _ => {}
        }
    }

    Ok(author)
}

/// Map an <email> element. Both halves of the address are attributes.
fn parse_email(e: &BytesStart<'_>) -> Result<Email> {
    Ok(Email {
        id: attr_value(e, b"id")?.unwrap_or_default(),
        domain: attr_value(e, b"domain")?.unwrap_or_default(),
    })
}

/// Map a <copyright> element.
fn parse_copyright<'a>(
    start: &BytesStart<'a>,
    reader: &mut Reader<&'a [u8]>,
    empty: bool,
) -> Result<Copyright> {
    let mut copyright = Copyright {
        author: attr_value(start, b"author")?.unwrap_or_default(),
        ..Copyright::default()
    };
    if empty {
        return Ok(copyright);
    }

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"year" => copyright.year = Some(element_text(reader, &e)?),
                b"license" => copyright.license = Some(element_text(reader, &e)?),
                _ => skip_element(reader, &e)?,
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"year" => copyright.year = Some(String::new()),
                b"license" => copyright.license = Some(String::new()),
                _ => {}
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"copyright" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(GpxError::Xml(e)),
            _ => {}
        }
    }

    Ok(copyright)
}

/// Map a <bounds> element. All four corners are required float attributes.
fn parse_bounds(e: &BytesStart<'_>) -> Result<Bounds> {
    Ok(Bounds {
        min_lat: required_f64_attr(e, "bounds", "minlat")?,
        min_lon: required_f64_attr(e, "bounds", "minlon")?,
        max_lat: required_f64_attr(e, "bounds", "maxlat")?,
        max_lon: required_f64_attr(e, "bounds", "maxlon")?,
    })
}

/// Map a <link> element.
fn parse_link<'a>(
    start: &BytesStart<'a>,
    reader: &mut Reader<&'a [u8]>,
    empty: bool,
) -> Result<Link> {
    let mut link = Link {
        href: attr_value(start, b"href")?.unwrap_or_default(),
        ..Link::default()
    };
    if empty {
        return Ok(link);
    }

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"text" => link.text = Some(element_text(reader, &e)?),
                b"type" => link.link_type = Some(element_text(reader, &e)?),
                _ => skip_element(reader, &e)?,
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"text" => link.text = Some(String::new()),
                b"type" => link.link_type = Some(String::new()),
                _ => {}
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"link" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(GpxError::Xml(e)),
            _ => {}
        }
    }

    Ok(link)
}

/// Map a point element (wpt, rtept, trkpt).
///
/// `element` is the tag name carried into errors so a bad `lat` on a trkpt
/// reports as such. `lat` and `lon` are the only required fields anywhere in
/// the schema; every other child is optional, but a numeric child that is
/// present and malformed fails the whole parse rather than being dropped.
fn parse_waypoint<'a>(
    start: &BytesStart<'a>,
    reader: &mut Reader<&'a [u8]>,
    element: &'static str,
    empty: bool,
) -> Result<Waypoint> {
    let lat = required_f64_attr(start, element, "lat")?;
    let lon = required_f64_attr(start, element, "lon")?;

    let mut point = Waypoint::new(lat, lon);
    if empty {
        return Ok(point);
    }

    let end_name = start.name().0.to_vec();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"ele" => {
                    point.ele = Some(parse_number(element, "ele", &element_text(reader, &e)?)?)
                }
                b"time" => point.time = Some(element_text(reader, &e)?),
                b"magvar" => {
                    point.magvar =
                        Some(parse_number(element, "magvar", &element_text(reader, &e)?)?)
                }
                b"geoidheight" => {
                    point.geoid_height = Some(parse_number(
                        element,
                        "geoidheight",
                        &element_text(reader, &e)?,
                    )?)
                }
                b"name" => point.name = Some(element_text(reader, &e)?),
                b"cmt" => point.cmt = Some(element_text(reader, &e)?),
                b"desc" => point.desc = Some(element_text(reader, &e)?),
                b"src" => point.src = Some(element_text(reader, &e)?),
                b"sym" => point.sym = Some(element_text(reader, &e)?),
                b"type" => point.point_type = Some(element_text(reader, &e)?),
                b"fix" => point.fix = Some(element_text(reader, &e)?),
                b"sat" => {
                    point.sat = Some(parse_number(element, "sat", &element_text(reader, &e)?)?)
                }
                b"hdop" => {
                    point.hdop = Some(parse_number(element, "hdop", &element_text(reader, &e)?)?)
                }
                b"vdop" => {
                    point.vdop = Some(parse_number(element, "vdop", &element_text(reader, &e)?)?)
                }
                b"pdop" => {
                    point.pdop = Some(parse_number(element, "pdop", &element_text(reader, &e)?)?)
                }
                b"ageofdgpsdata" => {
                    point.age_of_dgps_data = Some(parse_number(
                        element,
                        "ageofdgpsdata",
                        &element_text(reader, &e)?,
                    )?)
                }
                b"dgpsid" => {
                    point.dgps_id =
                        Some(parse_number(element, "dgpsid", &element_text(reader, &e)?)?)
                }
                b"link" => point.links.push(parse_link(&e, reader, false)?),
                b"extensions" => point.extensions = Some(raw_inner_xml(reader, &e)?),
                _ => skip_element(reader, &e)?,
            },
            // Self-closing scalar children count as present with empty text,
            // the same as their <x></x> forms.
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"ele" => point.ele = Some(parse_number(element, "ele", "")?),
                b"time" => point.time = Some(String::new()),
                b"magvar" => point.magvar = Some(parse_number(element, "magvar", "")?),
                b"geoidheight" => {
                    point.geoid_height = Some(parse_number(element, "geoidheight", "")?)
                }
                b"name" => point.name = Some(String::new()),
                b"cmt" => point.cmt = Some(String::new()),
                b"desc" => point.desc = Some(String::new()),
                b"src" => point.src = Some(String::new()),
                b"sym" => point.sym = Some(String::new()),
                b"type" => point.point_type = Some(String::new()),
                b"fix" => point.fix = Some(String::new()),
                b"sat" => point.sat = Some(parse_number(element, "sat", "")?),
                b"hdop" => point.hdop = Some(parse_number(element, "hdop", "")?),
                b"vdop" => point.vdop = Some(parse_number(element, "vdop", "")?),
                b"pdop" => point.pdop = Some(parse_number(element, "pdop", "")?),
                b"ageofdgpsdata" => {
                    point.age_of_dgps_data = Some(parse_number(element, "ageofdgpsdata", "")?)
                }
                b"dgpsid" => point.dgps_id = Some(parse_number(element, "dgpsid", "")?),
                b"link" => point.links.push(parse_link(&e, reader, true)?),
                b"extensions" => point.extensions = Some(String::new()),
                _ => {}
            },
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(GpxError::Xml(e)),
            _ => {}
        }
    }

    Ok(point)
}

/// Map a <rte> element.
fn parse_route<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Route> {
    let mut route = Route::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"name" => route.name = Some(element_text(reader, &e)?),
                b"cmt" => route.cmt = Some(element_text(reader, &e)?),
                b"desc" => route.desc = Some(element_text(reader, &e)?),
                b"src" => route.src = Some(element_text(reader, &e)?),
                b"number" => {
                    route.number = Some(parse_number("rte", "number", &element_text(reader, &e)?)?)
                }
                b"type" => route.route_type = Some(element_text(reader, &e)?),
                b"link" => route.links.push(parse_link(&e, reader, false)?),
                b"extensions" => route.extensions = Some(raw_inner_xml(reader, &e)?),
                b"rtept" => route.points.push(parse_waypoint(&e, reader, "rtept", false)?),
                _ => skip_element(reader, &e)?,
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"name" => route.name = Some(String::new()),
                b"cmt" => route.cmt = Some(String::new()),
                b"desc" => route.desc = Some(String::new()),
                b"src" => route.src = Some(String::new()),
                b"number" => route.number = Some(parse_number("rte", "number", "")?),
                b"type" => route.route_type = Some(String::new()),
                b"rtept" => route.points.push(parse_waypoint(&e, reader, "rtept", true)?),
                b"link" => route.links.push(parse_link(&e, reader, true)?),
                b"extensions" => route.extensions = Some(String::new()),
                _ => {}
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"rte" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(GpxError::Xml(e)),
            _ => {}
        }
    }

    Ok(route)
}

/// Map a <trk> element.
fn parse_track<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Track> {
    let mut track = Track::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"name" => track.name = Some(element_text(reader, &e)?),
                b"cmt" => track.cmt = Some(element_text(reader, &e)?),
                b"desc" => track.desc = Some(element_text(reader, &e)?),
                b"src" => track.src = Some(element_text(reader, &e)?),
                b"number" => {
                    track.number = Some(parse_number("trk", "number", &element_text(reader, &e)?)?)
                }
                b"type" => track.track_type = Some(element_text(reader, &e)?),
                b"link" => track.links.push(parse_link(&e, reader, false)?),
                b"extensions" => track.extensions = Some(raw_inner_xml(reader, &e)?),
                b"trkseg" => track.segments.push(parse_segment(reader)?),
                _ => skip_element(reader, &e)?,
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"name" => track.name = Some(String::new()),
                b"cmt" => track.cmt = Some(String::new()),
                b"desc" => track.desc = Some(String::new()),
                b"src" => track.src = Some(String::new()),
                b"number" => track.number = Some(parse_number("trk", "number", "")?),
                b"type" => track.track_type = Some(String::new()),
                // An empty segment still counts as a segment.
                b"trkseg" => track.segments.push(TrackSegment::default()),
                b"link" => track.links.push(parse_link(&e, reader, true)?),
                b"extensions" => track.extensions = Some(String::new()),
                _ => {}
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trk" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(GpxError::Xml(e)),
            _ => {}
        }
    }

    Ok(track)
}

/// Map a <trkseg> element.
fn parse_segment<'a>(reader: &mut Reader<&'a [u8]>) -> Result<TrackSegment> {
    let mut segment = TrackSegment::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"trkpt" => segment
                    .points
                    .push(parse_waypoint(&e, reader, "trkpt", false)?),
                b"extensions" => segment.extensions = Some(raw_inner_xml(reader, &e)?),
                _ => skip_element(reader, &e)?,
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"trkpt" => segment
                    .points
                    .push(parse_waypoint(&e, reader, "trkpt", true)?),
                b"extensions" => segment.extensions = Some(String::new()),
                _ => {}
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trkseg" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(GpxError::Xml(e)),
            _ => {}
        }
    }

    Ok(segment)
}

/// Look up an attribute by local name on a start tag, unescaping its value.
fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| GpxError::Xml(e.into()))?;
        if attr.key.local_name().as_ref() == name {
            let val = attr.unescape_value().map_err(|e| GpxError::Xml(e.into()))?;
            return Ok(Some(val.into_owned()));
        }
    }
    Ok(None)
}

/// Read a required float attribute, distinguishing absent from malformed.
fn required_f64_attr(
    e: &BytesStart<'_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<f64> {
    match attr_value(e, attribute.as_bytes())? {
        Some(text) => parse_number(element, attribute, &text),
        None => Err(GpxError::MissingAttribute { element, attribute }),
    }
}

/// Strictly parse numeric text; malformed input fails the whole document.
fn parse_number<T: FromStr>(element: &'static str, field: &'static str, text: &str) -> Result<T> {
    let trimmed = text.trim();
    trimmed.parse().map_err(|_| GpxError::InvalidNumber {
        element,
        field,
        value: trimmed.to_string(),
    })
}

/// Capture the raw inner XML of an element without interpreting it.
/// Used for <extensions>, whose structure is caller-defined.
fn raw_inner_xml<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'_>) -> Result<String> {
    let raw = reader.read_text(start.name()).map_err(GpxError::Xml)?;
    Ok(raw.into_owned())
}

/// Skip an element and everything inside it.
fn skip_element<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'_>) -> Result<()> {
    reader.read_to_end(start.name()).map_err(GpxError::Xml)?;
    Ok(())
}

/// Read the text content of an element as an owned String.
/// Accumulates regular text, CDATA sections, and entity references
/// (Event::GeneralRef).
fn element_text<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'_>) -> Result<String> {
    let end_name = start.name().0.to_vec();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::CData(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::GeneralRef(e)) => {
                // Character references (&#60; &#x3C;) resolve directly; the
                // five predefined XML entities are handled by name.
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    text.push(ch);
                } else {
                    match std::str::from_utf8(e.as_ref()).unwrap_or_default() {
                        "amp" => text.push('&'),
                        "lt" => text.push('<'),
                        "gt" => text.push('>'),
                        "quot" => text.push('"'),
                        "apos" => text.push('\''),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(GpxError::Xml(e)),
            _ => {}
        }
    }

    Ok(text)
}
