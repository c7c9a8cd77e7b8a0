//! Boolean operations on polygonal label regions.
//!
//! Label regions use even-odd parity: a region list is a set of rings, and a
//! point is inside when an odd number of rings contain it. The `geo` crate
//! works on explicit exterior/interior rings instead, so each operation maps
//! parity regions into a [`MultiPolygon`] by XOR-folding the individual
//! rings, runs the boolean op, and flattens the result back into a plain
//! ring list.

use geo::{BooleanOps, Coord, LineString, MultiPolygon, Polygon};

use crate::math::Point2;

/// Region lists as stored in polygon label models.
pub type Regions = Vec<Vec<Point2>>;

fn ring_to_polygon(ring: &[Point2]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = ring.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    Polygon::new(LineString::from(coords), Vec::new())
}

/// Fold a parity region list into a multi-polygon. Rings with fewer than
/// three vertices are degenerate and dropped.
fn regions_to_multi(regions: &[Vec<Point2>]) -> MultiPolygon<f64> {
    let mut acc = MultiPolygon::<f64>::new(Vec::new());
    for ring in regions.iter().filter(|r| r.len() >= 3) {
        let single = MultiPolygon::new(vec![ring_to_polygon(ring)]);
        acc = acc.xor(&single);
    }
    acc
}

fn line_string_to_ring(ls: &LineString<f64>) -> Vec<Point2> {
    let mut ring: Vec<Point2> = ls.coords().map(|c| Point2::new(c.x, c.y)).collect();
    // geo closes rings explicitly; the label model does not
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

/// Flatten a multi-polygon back into a parity region list. Exterior and
/// interior rings all become plain regions; parity recovers the holes.
fn multi_to_regions(multi: &MultiPolygon<f64>) -> Regions {
    let mut regions = Regions::new();
    for polygon in &multi.0 {
        let exterior = line_string_to_ring(polygon.exterior());
        if exterior.len() >= 3 {
            regions.push(exterior);
        }
        for interior in polygon.interiors() {
            let ring = line_string_to_ring(interior);
            if ring.len() >= 3 {
                regions.push(ring);
            }
        }
    }
    regions
}

/// Union of two region lists.
pub fn union(a: &Regions, b: &Regions) -> Regions {
    multi_to_regions(&regions_to_multi(a).union(&regions_to_multi(b)))
}

/// Intersection of two region lists.
pub fn intersection(a: &Regions, b: &Regions) -> Regions {
    multi_to_regions(&regions_to_multi(a).intersection(&regions_to_multi(b)))
}

/// Regions of `a` not covered by `b`.
pub fn difference(a: &Regions, b: &Regions) -> Regions {
    multi_to_regions(&regions_to_multi(a).difference(&regions_to_multi(b)))
}

/// Union of many region lists.
pub fn union_all(region_sets: &[Regions]) -> Regions {
    let mut acc = MultiPolygon::<f64>::new(Vec::new());
    for regions in region_sets {
        acc = acc.union(&regions_to_multi(regions));
    }
    multi_to_regions(&acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::rings_contain_point;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    #[test]
    fn test_union_disjoint() {
        let a = vec![square(0.0, 0.0, 10.0, 10.0)];
        let b = vec![square(20.0, 0.0, 30.0, 10.0)];
        let out = union(&a, &b);
        assert_eq!(out.len(), 2);
        assert!(rings_contain_point(&out, Point2::new(5.0, 5.0)));
        assert!(rings_contain_point(&out, Point2::new(25.0, 5.0)));
        assert!(!rings_contain_point(&out, Point2::new(15.0, 5.0)));
    }

    #[test]
    fn test_union_overlapping_merges() {
        let a = vec![square(0.0, 0.0, 10.0, 10.0)];
        let b = vec![square(5.0, 0.0, 15.0, 10.0)];
        let out = union(&a, &b);
        assert_eq!(out.len(), 1);
        assert!(rings_contain_point(&out, Point2::new(12.0, 5.0)));
    }

    #[test]
    fn test_difference_can_empty() {
        let a = vec![square(2.0, 2.0, 8.0, 8.0)];
        let cover = vec![square(0.0, 0.0, 10.0, 10.0)];
        assert!(difference(&a, &cover).is_empty());
    }

    #[test]
    fn test_difference_and_intersection_split() {
        let a = vec![square(0.0, 0.0, 10.0, 10.0)];
        let right = vec![square(5.0, -5.0, 15.0, 15.0)];
        let remaining = difference(&a, &right);
        let removed = intersection(&a, &right);
        assert!(rings_contain_point(&remaining, Point2::new(2.0, 5.0)));
        assert!(!rings_contain_point(&remaining, Point2::new(8.0, 5.0)));
        assert!(rings_contain_point(&removed, Point2::new(8.0, 5.0)));
        assert!(!rings_contain_point(&removed, Point2::new(2.0, 5.0)));
    }

    #[test]
    fn test_parity_hole_round_trip() {
        // Outer ring with an inner ring forms an annulus under parity
        let annulus = vec![square(0.0, 0.0, 10.0, 10.0), square(3.0, 3.0, 7.0, 7.0)];
        let out = union(&annulus, &Vec::new());
        assert!(rings_contain_point(&out, Point2::new(1.0, 1.0)));
        assert!(!rings_contain_point(&out, Point2::new(5.0, 5.0)));
        // Exterior plus hole ring
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_degenerate_rings_dropped() {
        let a = vec![vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)]];
        let b = vec![square(0.0, 0.0, 5.0, 5.0)];
        let out = union(&a, &b);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_union_all() {
        let sets = vec![
            vec![square(0.0, 0.0, 4.0, 4.0)],
            vec![square(3.0, 0.0, 8.0, 4.0)],
            vec![square(20.0, 0.0, 24.0, 4.0)],
        ];
        let out = union_all(&sets);
        assert_eq!(out.len(), 2);
    }
}
