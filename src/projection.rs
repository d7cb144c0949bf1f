// ============================================================================
// spark-features - Coordinate Transforms
// Data-space (descriptor) <-> view-space (native) coordinate conversion
// ============================================================================
//
// The projection math itself belongs to whoever hosts the map; the container
// only needs a per-coordinate mapping in each direction. `transform_geometry`
// lifts that mapping over every geometry variant.
// ============================================================================

use geo_types::{
    Coord, Geometry, GeometryCollection, Line, LineString, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon, Rect, Triangle,
};

// =============================================================================
// TRANSFORM TRAIT
// =============================================================================

/// Converts coordinates between the data space descriptors are written in
/// and the view space native features live in.
pub trait CoordinateTransform {
    /// Data space -> view space
    fn to_view(&self, coord: Coord<f64>) -> Coord<f64>;

    /// View space -> data space
    fn to_data(&self, coord: Coord<f64>) -> Coord<f64>;

    fn geometry_to_view(&self, geometry: &Geometry<f64>) -> Geometry<f64> {
        transform_geometry(geometry, &|c| self.to_view(c))
    }

    fn geometry_to_data(&self, geometry: &Geometry<f64>) -> Geometry<f64> {
        transform_geometry(geometry, &|c| self.to_data(c))
    }
}

/// Data space and view space are the same.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityTransform;

impl CoordinateTransform for IdentityTransform {
    fn to_view(&self, coord: Coord<f64>) -> Coord<f64> {
        coord
    }

    fn to_data(&self, coord: Coord<f64>) -> Coord<f64> {
        coord
    }

    fn geometry_to_view(&self, geometry: &Geometry<f64>) -> Geometry<f64> {
        geometry.clone()
    }

    fn geometry_to_data(&self, geometry: &Geometry<f64>) -> Geometry<f64> {
        geometry.clone()
    }
}

/// A transform built from a pair of closures.
///
/// # Example
///
/// ```
/// use spark_features::projection::{CoordinateTransform, FnTransform};
/// use geo_types::{coord, Coord};
///
/// let scale = FnTransform::new(
///     |c: Coord<f64>| coord! { x: c.x * 2.0, y: c.y * 2.0 },
///     |c: Coord<f64>| coord! { x: c.x / 2.0, y: c.y / 2.0 },
/// );
/// assert_eq!(scale.to_view(coord! { x: 1.0, y: 3.0 }), coord! { x: 2.0, y: 6.0 });
/// ```
pub struct FnTransform<V, D> {
    to_view: V,
    to_data: D,
}

impl<V, D> FnTransform<V, D>
where
    V: Fn(Coord<f64>) -> Coord<f64>,
    D: Fn(Coord<f64>) -> Coord<f64>,
{
    pub fn new(to_view: V, to_data: D) -> Self {
        Self { to_view, to_data }
    }
}

impl<V, D> CoordinateTransform for FnTransform<V, D>
where
    V: Fn(Coord<f64>) -> Coord<f64>,
    D: Fn(Coord<f64>) -> Coord<f64>,
{
    fn to_view(&self, coord: Coord<f64>) -> Coord<f64> {
        (self.to_view)(coord)
    }

    fn to_data(&self, coord: Coord<f64>) -> Coord<f64> {
        (self.to_data)(coord)
    }
}

// =============================================================================
// GEOMETRY MAPPING
// =============================================================================

type CoordFn<'a> = &'a dyn Fn(Coord<f64>) -> Coord<f64>;

/// Apply `f` to every coordinate of `geometry`, keeping its shape.
pub fn transform_geometry(geometry: &Geometry<f64>, f: CoordFn<'_>) -> Geometry<f64> {
    match geometry {
        Geometry::Point(p) => Geometry::Point(map_point(p, f)),
        Geometry::Line(l) => Geometry::Line(Line::new(f(l.start), f(l.end))),
        Geometry::LineString(ls) => Geometry::LineString(map_line_string(ls, f)),
        Geometry::Polygon(p) => Geometry::Polygon(map_polygon(p, f)),
        Geometry::MultiPoint(mp) => {
            Geometry::MultiPoint(MultiPoint(mp.0.iter().map(|p| map_point(p, f)).collect()))
        }
        Geometry::MultiLineString(mls) => Geometry::MultiLineString(MultiLineString(
            mls.0.iter().map(|ls| map_line_string(ls, f)).collect(),
        )),
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(MultiPolygon(
            mp.0.iter().map(|p| map_polygon(p, f)).collect(),
        )),
        Geometry::GeometryCollection(gc) => Geometry::GeometryCollection(GeometryCollection(
            gc.0.iter().map(|g| transform_geometry(g, f)).collect(),
        )),
        Geometry::Rect(r) => Geometry::Rect(Rect::new(f(r.min()), f(r.max()))),
        Geometry::Triangle(t) => Geometry::Triangle(Triangle::new(f(t.0), f(t.1), f(t.2))),
    }
}

fn map_point(point: &Point<f64>, f: CoordFn<'_>) -> Point<f64> {
    Point(f(point.0))
}

fn map_line_string(line: &LineString<f64>, f: CoordFn<'_>) -> LineString<f64> {
    LineString(line.0.iter().map(|c| f(*c)).collect())
}

fn map_polygon(polygon: &Polygon<f64>, f: CoordFn<'_>) -> Polygon<f64> {
    Polygon::new(
        map_line_string(polygon.exterior(), f),
        polygon
            .interiors()
            .iter()
            .map(|ring| map_line_string(ring, f))
            .collect(),
    )
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{coord, line_string, point, polygon};

    fn shift() -> FnTransform<impl Fn(Coord<f64>) -> Coord<f64>, impl Fn(Coord<f64>) -> Coord<f64>> {
        FnTransform::new(
            |c: Coord<f64>| coord! { x: c.x + 10.0, y: c.y + 20.0 },
            |c: Coord<f64>| coord! { x: c.x - 10.0, y: c.y - 20.0 },
        )
    }

    #[test]
    fn identity_leaves_geometry() {
        let g = Geometry::Point(point!(x: 1.0, y: 2.0));
        assert_eq!(IdentityTransform.geometry_to_view(&g), g);
        assert_eq!(IdentityTransform.geometry_to_data(&g), g);
    }

    #[test]
    fn point_and_line_string() {
        let t = shift();
        let g = Geometry::Point(point!(x: 1.0, y: 1.0));
        assert_eq!(t.geometry_to_view(&g), Geometry::Point(point!(x: 11.0, y: 21.0)));

        let ls = Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)]);
        assert_eq!(
            t.geometry_to_view(&ls),
            Geometry::LineString(line_string![(x: 10.0, y: 20.0), (x: 11.0, y: 21.0)])
        );
    }

    #[test]
    fn polygon_rings_are_mapped() {
        let t = shift();
        let p = Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
        ]);
        let Geometry::Polygon(mapped) = t.geometry_to_view(&p) else {
            panic!("shape changed");
        };
        assert!(mapped.exterior().0.iter().all(|c| c.x >= 10.0 && c.y >= 20.0));
        assert!(mapped.interiors().is_empty());
    }

    #[test]
    fn round_trip_through_both_directions() {
        let t = shift();
        let g = Geometry::GeometryCollection(GeometryCollection(vec![
            Geometry::Point(point!(x: 3.0, y: 4.0)),
            Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 5.0)]),
        ]));
        assert_eq!(t.geometry_to_data(&t.geometry_to_view(&g)), g);
    }
}
