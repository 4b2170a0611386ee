use geojson::{JsonObject, JsonValue};
use glam::DVec2;

/// Closed ring of (lon, lat) points
pub type Ring = Vec<DVec2>;

/// Polygon with the exterior ring first, then holes
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polygon {
    pub rings: Vec<Ring>,
}

/// Axis-aligned geographic bounds
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: DVec2,
    pub max: DVec2,
}

impl BoundingBox {
    pub const EMPTY: BoundingBox = BoundingBox {
        min: DVec2::splat(f64::INFINITY),
        max: DVec2::splat(f64::NEG_INFINITY),
    };

    /// Bounds of every coordinate in the given polygons
    pub fn of_polygons(polygons: &[Polygon]) -> Self {
        let mut bbox = Self::EMPTY;
        for p in polygons.iter().flat_map(|poly| poly.rings.iter().flatten()) {
            bbox.extend(*p);
        }
        bbox
    }

    pub fn extend(&mut self, p: DVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }
}

/// The feature properties the dashboard reads
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapeProps {
    pub adm2_id: Option<String>,
    pub adm2_name: Option<String>,
    pub adm1_name: Option<String>,
    pub iso_3: Option<String>,
    pub lat_center: Option<f64>,
    pub long_center: Option<f64>,
}

fn as_text(v: &JsonValue) -> Option<String> {
    match v {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl ShapeProps {
    pub fn from_json(props: &JsonObject) -> Self {
        let text = |key: &str| props.get(key).and_then(as_text);
        let num = |key: &str| props.get(key).and_then(|v| v.as_f64());
        Self {
            adm2_id: text("adm2_id"),
            adm2_name: text("adm2_name"),
            adm1_name: text("adm1_name"),
            iso_3: text("iso_3"),
            lat_center: num("Lat_Center"),
            long_center: num("Long_Center"),
        }
    }

    /// District label: adm2 name unless blank, else the adm1 name
    pub fn display_name(&self) -> Option<&str> {
        self.adm2_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.adm1_name.as_deref())
    }
}

/// A map feature: polygons plus properties
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub polygons: Vec<Polygon>,
    pub props: ShapeProps,
    pub bbox: BoundingBox,
}

impl Shape {
    pub fn new(polygons: Vec<Polygon>, props: ShapeProps) -> Self {
        let bbox = BoundingBox::of_polygons(&polygons);
        Self { polygons, props, bbox }
    }

    /// Center point, preferring the exported centroid
    pub fn center(&self) -> DVec2 {
        match (self.props.long_center, self.props.lat_center) {
            (Some(lon), Some(lat)) => DVec2::new(lon, lat),
            _ => self.bbox.center(),
        }
    }

    /// Even-odd containment over all rings
    pub fn contains(&self, p: DVec2) -> bool {
        if !self.bbox.contains(p) {
            return false;
        }
        self.polygons.iter().any(|poly| {
            poly.rings
                .iter()
                .fold(false, |inside, ring| inside ^ ring_contains(ring, p))
        })
    }
}

fn ring_contains(ring: &[DVec2], p: DVec2) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}
