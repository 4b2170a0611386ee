//! Shape decoding from TopoJSON topologies and GeoJSON feature collections.

use crate::data::shape::{Polygon, Ring, Shape, ShapeProps};
use crate::error::{DataError, DataResult};
use geojson::{GeoJson, JsonObject, JsonValue, Value};
use glam::DVec2;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Object name used by the exported district and country topologies
pub const PREFERRED_OBJECT: &str = "combined_polygon_vlight";

#[derive(Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Deserialize)]
struct Topology {
    #[serde(default)]
    transform: Option<Transform>,
    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
    #[serde(default)]
    objects: BTreeMap<String, TopoGeometry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArcRefs {
    Multi(Vec<Vec<Vec<i64>>>),
    Rings(Vec<Vec<i64>>),
    Line(Vec<i64>),
}

impl ArcRefs {
    fn len(&self) -> usize {
        match self {
            ArcRefs::Multi(v) => v.len(),
            ArcRefs::Rings(v) => v.len(),
            ArcRefs::Line(v) => v.len(),
        }
    }
}

#[derive(Deserialize)]
struct TopoGeometry {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    geometries: Vec<TopoGeometry>,
    #[serde(default)]
    arcs: Option<ArcRefs>,
    #[serde(default)]
    properties: Option<JsonObject>,
}

/// Decode shapes from a file holding either a TopoJSON topology or GeoJSON
pub fn decode_shapes(path: &Path, mut bytes: Vec<u8>) -> DataResult<Vec<Shape>> {
    // One pass over the bytes; the tree is then read as whichever format `type` names
    let value: JsonValue =
        simd_json::serde::from_slice(&mut bytes).map_err(|e| DataError::parse(path, e))?;

    if value.get("type").and_then(JsonValue::as_str) == Some("Topology") {
        let topology = Topology::deserialize(value).map_err(|e| DataError::parse(path, e))?;
        decode_topology(path, &topology)
    } else {
        let geojson = GeoJson::from_json_value(value).map_err(|e| DataError::parse(path, e))?;
        Ok(decode_geojson(&geojson))
    }
}

fn decode_topology(path: &Path, topology: &Topology) -> DataResult<Vec<Shape>> {
    let object = topology
        .objects
        .get(PREFERRED_OBJECT)
        .or_else(|| topology.objects.values().next())
        .ok_or_else(|| DataError::EmptyTopology {
            path: path.to_path_buf(),
        })?;

    let arcs = absolute_arcs(topology);
    let mut shapes = Vec::new();
    collect_geometry(path, object, &arcs, &mut shapes)?;
    debug!(path = %path.display(), arcs = arcs.len(), shapes = shapes.len(), "decoded topology");
    Ok(shapes)
}

/// Undo delta encoding and quantization
fn absolute_arcs(topology: &Topology) -> Vec<Vec<DVec2>> {
    topology
        .arcs
        .iter()
        .map(|arc| match &topology.transform {
            Some(t) => {
                let (mut x, mut y) = (0.0, 0.0);
                arc.iter()
                    .filter(|p| p.len() >= 2)
                    .map(|p| {
                        x += p[0];
                        y += p[1];
                        DVec2::new(x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1])
                    })
                    .collect()
            }
            None => arc
                .iter()
                .filter(|p| p.len() >= 2)
                .map(|p| DVec2::new(p[0], p[1]))
                .collect(),
        })
        .collect()
}

fn collect_geometry(
    path: &Path,
    geom: &TopoGeometry,
    arcs: &[Vec<DVec2>],
    out: &mut Vec<Shape>,
) -> DataResult<()> {
    let props = geom
        .properties
        .as_ref()
        .map(ShapeProps::from_json)
        .unwrap_or_default();

    match (geom.kind.as_deref(), &geom.arcs) {
        (Some("GeometryCollection"), _) => {
            for child in &geom.geometries {
                collect_geometry(path, child, arcs, out)?;
            }
        }
        // `[]` and `[[]]` both parse as the first untagged variant that fits
        (Some("Polygon" | "MultiPolygon"), Some(ArcRefs::Multi(v)))
            if v.iter().all(|rings| rings.is_empty()) =>
        {
            out.push(Shape::new(Vec::new(), props));
        }
        (Some("Polygon"), Some(ArcRefs::Rings(rings))) => {
            out.push(Shape::new(vec![polygon(path, rings, arcs)?], props));
        }
        (Some("MultiPolygon"), Some(ArcRefs::Multi(polys))) => {
            let polygons = polys
                .iter()
                .map(|rings| polygon(path, rings, arcs))
                .collect::<DataResult<Vec<_>>>()?;
            out.push(Shape::new(polygons, props));
        }
        (None, _) => out.push(Shape::new(Vec::new(), props)),
        (Some(other), refs) => {
            let arcs = refs.as_ref().map_or(0, ArcRefs::len);
            warn!(path = %path.display(), kind = other, arcs, "skipping unsupported geometry");
        }
    }
    Ok(())
}

fn polygon(path: &Path, rings: &[Vec<i64>], arcs: &[Vec<DVec2>]) -> DataResult<Polygon> {
    let rings = rings
        .iter()
        .map(|refs| stitch_ring(path, refs, arcs))
        .collect::<DataResult<Vec<_>>>()?;
    Ok(Polygon { rings })
}

/// Join arcs into one ring; a negative index `i` means arc `!i` reversed
fn stitch_ring(path: &Path, refs: &[i64], arcs: &[Vec<DVec2>]) -> DataResult<Ring> {
    let mut ring: Ring = Vec::new();
    for &r in refs {
        let (idx, reversed) = if r >= 0 { (r as usize, false) } else { (!r as usize, true) };
        let arc = arcs.get(idx).ok_or_else(|| DataError::ArcIndex {
            path: path.to_path_buf(),
            index: r,
            len: arcs.len(),
        })?;
        // Consecutive arcs share their joining point
        if !ring.is_empty() {
            ring.pop();
        }
        if reversed {
            ring.extend(arc.iter().rev());
        } else {
            ring.extend(arc.iter());
        }
    }
    // Degenerate rings are padded so every ring is closed with 4+ points
    if let Some(&first) = ring.first() {
        while ring.len() < 4 {
            ring.push(first);
        }
    }
    Ok(ring)
}

/// Extract polygon features from GeoJSON
pub fn decode_geojson(geojson: &GeoJson) -> Vec<Shape> {
    let mut shapes = Vec::new();
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                let props = feature
                    .properties
                    .as_ref()
                    .map(ShapeProps::from_json)
                    .unwrap_or_default();
                let polygons = feature
                    .geometry
                    .as_ref()
                    .map(|g| geometry_polygons(&g.value))
                    .unwrap_or_default();
                shapes.push(Shape::new(polygons, props));
            }
        }
        GeoJson::Feature(f) => {
            let props = f.properties.as_ref().map(ShapeProps::from_json).unwrap_or_default();
            let polygons = f
                .geometry
                .as_ref()
                .map(|g| geometry_polygons(&g.value))
                .unwrap_or_default();
            shapes.push(Shape::new(polygons, props));
        }
        GeoJson::Geometry(g) => {
            shapes.push(Shape::new(geometry_polygons(&g.value), ShapeProps::default()));
        }
    }
    shapes
}

fn to_ring(coords: &[Vec<f64>]) -> Ring {
    coords.iter().map(|c| DVec2::new(c[0], c[1])).collect()
}

fn geometry_polygons(value: &Value) -> Vec<Polygon> {
    match value {
        Value::Polygon(rings) => vec![Polygon {
            rings: rings.iter().map(|r| to_ring(r)).collect(),
        }],
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .map(|rings| Polygon {
                rings: rings.iter().map(|r| to_ring(r)).collect(),
            })
            .collect(),
        Value::GeometryCollection(geometries) => geometries
            .iter()
            .flat_map(|g| geometry_polygons(&g.value))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two unit squares sharing the edge x = 1, quantized with scale 1
    const TOPO: &str = r#"{
        "type": "Topology",
        "transform": {"scale": [1, 1], "translate": [10, 20]},
        "arcs": [
            [[1, 0], [0, 1]],
            [[1, 1], [-1, 0], [0, -1], [1, 0]],
            [[1, 0], [1, 0], [0, 1], [-1, 0]]
        ],
        "objects": {
            "combined_polygon_vlight": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Polygon", "arcs": [[0, 1]], "properties": {"adm2_id": "A", "iso_3": "KEN"}},
                    {"type": "MultiPolygon", "arcs": [[[2, -1]]], "properties": {"adm2_id": "B", "iso_3": "KEN"}},
                    {"type": null, "properties": {"adm2_id": "C"}},
                    {"type": "Point", "coordinates": [0, 0]}
                ]
            }
        }
    }"#;

    fn decode(text: &str) -> DataResult<Vec<Shape>> {
        decode_shapes(Path::new("test.json"), text.as_bytes().to_vec())
    }

    #[test]
    fn test_topology_shapes() {
        let shapes = decode(TOPO).unwrap();
        // Point is skipped, null geometry is kept without polygons
        assert_eq!(shapes.len(), 3);
        assert_eq!(shapes[0].props.adm2_id.as_deref(), Some("A"));
        assert_eq!(shapes[2].polygons.len(), 0);
    }

    #[test]
    fn test_delta_decoding_and_stitching() {
        let shapes = decode(TOPO).unwrap();
        let ring = &shapes[0].polygons[0].rings[0];
        let expected = [(11.0, 20.0), (11.0, 21.0), (10.0, 21.0), (10.0, 20.0), (11.0, 20.0)];
        let got: Vec<(f64, f64)> = ring.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(got, expected);
        assert_eq!(shapes[0].bbox.min, DVec2::new(10.0, 20.0));
        assert_eq!(shapes[0].bbox.max, DVec2::new(11.0, 21.0));
    }

    #[test]
    fn test_reversed_arc() {
        let shapes = decode(TOPO).unwrap();
        let ring = &shapes[1].polygons[0].rings[0];
        // Arc 2 then arc 0 reversed: back down the shared edge
        assert_eq!(ring.first(), Some(&DVec2::new(11.0, 20.0)));
        assert_eq!(ring.last(), Some(&DVec2::new(11.0, 20.0)));
        assert!(ring.contains(&DVec2::new(12.0, 21.0)));
        assert_eq!(shapes[1].bbox.max, DVec2::new(12.0, 21.0));
    }

    #[test]
    fn test_bad_arc_index() {
        let text = r#"{"type": "Topology", "arcs": [],
            "objects": {"x": {"type": "Polygon", "arcs": [[3]]}}}"#;
        assert!(matches!(decode(text), Err(DataError::ArcIndex { index: 3, .. })));
    }

    #[test]
    fn test_first_object_fallback() {
        let text = r#"{"type": "Topology", "arcs": [[[0, 0], [1, 0], [1, 1], [0, 0]]],
            "objects": {"countries": {"type": "Polygon", "arcs": [[0]], "properties": {"iso_3": "NGA"}}}}"#;
        let shapes = decode(text).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].props.iso_3.as_deref(), Some("NGA"));
    }

    #[test]
    fn test_empty_polygon_arcs_keep_their_slot() {
        let text = r#"{"type": "Topology", "arcs": [[[0, 0], [1, 0], [1, 1], [0, 0]]],
            "objects": {"districts": {"type": "GeometryCollection", "geometries": [
                {"type": "Polygon", "arcs": [[]], "properties": {"adm2_id": "A"}},
                {"type": "MultiPolygon", "arcs": [], "properties": {"adm2_id": "B"}},
                {"type": "Polygon", "arcs": [[0]], "properties": {"adm2_id": "C"}}
            ]}}}"#;
        let shapes = decode(text).unwrap();
        let ids: Vec<_> = shapes.iter().map(|s| s.props.adm2_id.as_deref()).collect();
        assert_eq!(ids, [Some("A"), Some("B"), Some("C")]);
        assert!(shapes[0].polygons.is_empty());
        assert!(shapes[1].polygons.is_empty());
        assert_eq!(shapes[2].polygons.len(), 1);
    }

    #[test]
    fn test_unknown_type_is_a_parse_error() {
        let text = r#"{"type": "Nonsense", "arcs": []}"#;
        assert!(matches!(decode(text), Err(DataError::Parse { .. })));
        assert!(matches!(decode("{ not json"), Err(DataError::Parse { .. })));
    }

    #[test]
    fn test_empty_topology() {
        let text = r#"{"type": "Topology", "arcs": [], "objects": {}}"#;
        assert!(matches!(decode(text), Err(DataError::EmptyTopology { .. })));
    }

    #[test]
    fn test_geojson_input() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"iso_3": "GHA"},
             "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [2, 0], [2, 2], [0, 0]]]}}
        ]}"#;
        let shapes = decode(text).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].props.iso_3.as_deref(), Some("GHA"));
        assert_eq!(shapes[0].bbox.max, DVec2::new(2.0, 2.0));
    }
}
