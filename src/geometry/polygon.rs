//! Planar polygon measures used by the vertex-based population.
//!
//! All functions take the polygon as an ordered slice of vertex positions.
//! Counter-clockwise ordering gives a positive signed area; the mesh keeps
//! every element counter-clockwise so gradients can rely on the sign.
//!
//! Second moments follow the standard shoelace-style sums:
//! - Jxx = (1/12) Σ cᵢ (yᵢ² + yᵢyᵢ₊₁ + yᵢ₊₁²)
//! - Jyy = (1/12) Σ cᵢ (xᵢ² + xᵢxᵢ₊₁ + xᵢ₊₁²)
//! - Jxy = (1/24) Σ cᵢ (xᵢyᵢ₊₁ + 2xᵢyᵢ + 2xᵢ₊₁yᵢ₊₁ + xᵢ₊₁yᵢ)
//!
//! with cᵢ = xᵢyᵢ₊₁ − xᵢ₊₁yᵢ, evaluated about the centroid.

use glam::DVec2;

/// Signed area (shoelace formula). Positive for counter-clockwise polygons.
pub fn signed_area(vertices: &[DVec2]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }

    let mut twice_area = 0.0;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        twice_area += a.perp_dot(b);
    }
    0.5 * twice_area
}

/// Unsigned area.
pub fn area(vertices: &[DVec2]) -> f64 {
    signed_area(vertices).abs()
}

/// Sum of edge lengths, closing edge included.
pub fn perimeter(vertices: &[DVec2]) -> f64 {
    let n = vertices.len();
    if n < 2 {
        return 0.0;
    }
    (0..n)
        .map(|i| vertices[i].distance(vertices[(i + 1) % n]))
        .sum()
}

/// Area centroid.
///
/// Falls back to the vertex average when the polygon has (numerically) zero
/// area, which is exactly the situation a T2 swap has to cope with.
pub fn centroid(vertices: &[DVec2]) -> DVec2 {
    let n = vertices.len();
    if n == 0 {
        return DVec2::ZERO;
    }

    let a = signed_area(vertices);
    if a.abs() < 1e-14 {
        return vertex_average(vertices);
    }

    // Shift to the first vertex to keep the sums well conditioned
    let origin = vertices[0];
    let mut c = DVec2::ZERO;
    for i in 0..n {
        let p = vertices[i] - origin;
        let q = vertices[(i + 1) % n] - origin;
        let cross = p.perp_dot(q);
        c += (p + q) * cross;
    }
    origin + c / (6.0 * a)
}

/// Plain average of the vertex positions.
pub fn vertex_average(vertices: &[DVec2]) -> DVec2 {
    if vertices.is_empty() {
        return DVec2::ZERO;
    }
    vertices.iter().copied().sum::<DVec2>() / vertices.len() as f64
}

/// Second moments of area about the centroid, as `(Jxx, Jyy, Jxy)`.
///
/// `Jxx` is the moment about the x-axis (∫y² dA). Signs are normalised so
/// that the result does not depend on the winding direction.
pub fn second_moments(vertices: &[DVec2]) -> (f64, f64, f64) {
    let n = vertices.len();
    if n < 3 {
        return (0.0, 0.0, 0.0);
    }

    let c = centroid(vertices);
    let mut jxx = 0.0;
    let mut jyy = 0.0;
    let mut jxy = 0.0;

    for i in 0..n {
        let p = vertices[i] - c;
        let q = vertices[(i + 1) % n] - c;
        let cross = p.perp_dot(q);

        jxx += cross * (p.y * p.y + p.y * q.y + q.y * q.y);
        jyy += cross * (p.x * p.x + p.x * q.x + q.x * q.x);
        jxy += cross * (p.x * q.y + 2.0 * p.x * p.y + 2.0 * q.x * q.y + q.x * p.y);
    }

    let sign = if signed_area(vertices) < 0.0 { -1.0 } else { 1.0 };
    (sign * jxx / 12.0, sign * jyy / 12.0, sign * jxy / 24.0)
}

/// Unit vector along the polygon's short axis.
///
/// The short axis is the direction of least spread, i.e. the eigenvector of
/// the area covariance ∫(r rᵀ) dA with the smallest eigenvalue. Dividing a
/// cell along this axis cuts its long dimension in half.
pub fn short_axis(vertices: &[DVec2]) -> DVec2 {
    let (jxx, jyy, jxy) = second_moments(vertices);

    // Covariance entries: ∫x² dA = Jyy, ∫y² dA = Jxx, ∫xy dA = Jxy
    let a = jyy;
    let b = jxx;
    let c = jxy;

    let half_diff = 0.5 * (a - b);
    let spread = (half_diff * half_diff + c * c).sqrt();
    // Regular polygons have no preferred axis; cut horizontally
    if spread <= 1e-9 * (a + b).abs() {
        return DVec2::X;
    }
    if c.abs() < 1e-15 * (a.abs() + b.abs()).max(f64::MIN_POSITIVE) {
        return if a < b { DVec2::X } else { DVec2::Y };
    }

    let lambda_min = 0.5 * (a + b) - (half_diff * half_diff + c * c).sqrt();
    let axis = DVec2::new(c, lambda_min - a);
    let len = axis.length();
    if len < 1e-300 {
        DVec2::X
    } else {
        axis / len
    }
}

/// Gradient of the signed area with respect to vertex `i`.
///
/// For counter-clockwise polygons this is the gradient of the (positive)
/// area: ½ (yᵢ₊₁ − yᵢ₋₁, xᵢ₋₁ − xᵢ₊₁).
pub fn signed_area_gradient(vertices: &[DVec2], i: usize) -> DVec2 {
    let n = vertices.len();
    let next = vertices[(i + 1) % n];
    let prev = vertices[(i + n - 1) % n];
    0.5 * DVec2::new(next.y - prev.y, prev.x - next.x)
}

/// Gradient of the perimeter with respect to vertex `i`.
pub fn perimeter_gradient(vertices: &[DVec2], i: usize) -> DVec2 {
    let n = vertices.len();
    let here = vertices[i];
    let next = vertices[(i + 1) % n];
    let prev = vertices[(i + n - 1) % n];
    unit_or_zero(here - prev) + unit_or_zero(here - next)
}

/// Normalised vector, or zero for (near) zero-length input.
pub fn unit_or_zero(v: DVec2) -> DVec2 {
    let len = v.length();
    if len > 1e-12 {
        v / len
    } else {
        DVec2::ZERO
    }
}
