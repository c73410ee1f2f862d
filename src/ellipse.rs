use std::f64::consts::{FRAC_PI_2, SQRT_2};

use float_ord::FloatOrd;
use imageproc::point::Point;
use nalgebra::{Matrix3, Vector3};
use tracing::instrument;

/// Relative determinant of the linear scatter below which points are collinear.
const MIN_SPREAD_DETERMINANT: f64 = 1e-10;

/// Conics whose discriminant falls below this are treated as degenerate.
const MIN_DISCRIMINANT: f64 = 1e-9;

/// Ellipse in rotated-rectangle form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    pub center: (f64, f64),
    /// Full length of the minor axis.
    pub width: f64,
    /// Full length of the major axis.
    pub height: f64,
    /// Direction of the minor axis in degrees from the image x axis, in `[0, 180)`.
    pub angle: f64,
}

/// Direct least-squares ellipse fit (Halir-Flusser form of Fitzgibbon's
/// method) over a contour.
///
/// The conic is constrained to `4ac - b^2 = 1`, so any contour that spans a
/// plane gets an ellipse, whatever its shape. Points are centered and scaled
/// to unit RMS radius first. Returns `None` only for fewer than five points,
/// coincident or collinear points, or a singular system.
#[instrument(level = "trace", skip(points), fields(len = points.len()))]
pub fn fit_ellipse(points: &[Point<i32>]) -> Option<Ellipse> {
    if points.len() < 5 {
        return None;
    }

    let n = points.len() as f64;
    let (sum_x, sum_y) = points.iter().fold((0.0, 0.0), |(sx, sy), p| {
        (sx + p.x as f64, sy + p.y as f64)
    });
    let (mean_x, mean_y) = (sum_x / n, sum_y / n);
    let spread = points
        .iter()
        .map(|p| (p.x as f64 - mean_x).hypot(p.y as f64 - mean_y))
        .sum::<f64>()
        / n;
    if spread <= f64::EPSILON {
        return None;
    }
    let scale = spread / SQRT_2;

    let mut quad_scatter = Matrix3::<f64>::zeros();
    let mut mixed_scatter = Matrix3::<f64>::zeros();
    let mut linear_scatter = Matrix3::<f64>::zeros();
    for p in points {
        let x = (p.x as f64 - mean_x) / scale;
        let y = (p.y as f64 - mean_y) / scale;
        let quad = Vector3::new(x * x, x * y, y * y);
        let linear = Vector3::new(x, y, 1.0);
        quad_scatter += quad * quad.transpose();
        mixed_scatter += quad * linear.transpose();
        linear_scatter += linear * linear.transpose();
    }

    if linear_scatter.determinant().abs() <= MIN_SPREAD_DETERMINANT * n.powi(3) {
        log::trace!("Rejecting collinear contour");
        return None;
    }
    // Linear part of the conic as a function of the quadratic part.
    let linear_of_quad = -(linear_scatter.try_inverse()? * mixed_scatter.transpose());
    let reduced = quad_scatter + mixed_scatter * linear_of_quad;
    // Premultiply by the inverse of the 4ac - b^2 constraint matrix.
    let system = Matrix3::from_rows(&[
        reduced.row(2) * 0.5,
        reduced.row(1) * -1.0,
        reduced.row(0) * 0.5,
    ]);

    let quad = system
        .complex_eigenvalues()
        .iter()
        .filter(|value| value.im.abs() <= 1e-9 * value.re.abs().max(1.0))
        .filter_map(|value| null_vector(&(system - Matrix3::identity() * value.re)))
        .map(|vector| vector.normalize())
        .max_by_key(|vector| FloatOrd(4.0 * vector[0] * vector[2] - vector[1] * vector[1]))?;
    let linear = linear_of_quad * quad;
    let (a, b, c, d, e, f) = (quad[0], quad[1], quad[2], linear[0], linear[1], linear[2]);

    let discriminant = 4.0 * a * c - b * b;
    if discriminant <= MIN_DISCRIMINANT {
        log::trace!("Rejecting non-elliptic conic (discriminant {discriminant})");
        return None;
    }

    let x0 = (b * e - 2.0 * c * d) / discriminant;
    let y0 = (b * d - 2.0 * a * e) / discriminant;
    let f0 = f + (d * x0 + e * y0) / 2.0;

    let theta = 0.5 * b.atan2(a - c);
    let (sin, cos) = theta.sin_cos();
    let along = a * cos * cos + b * sin * cos + c * sin * sin;
    let across = a * sin * sin - b * sin * cos + c * cos * cos;
    let r_along = (-f0 / along).sqrt();
    let r_across = (-f0 / across).sqrt();
    if !(r_along.is_finite() && r_across.is_finite()) || r_along <= 0.0 || r_across <= 0.0 {
        log::trace!("Rejecting imaginary ellipse (radii {r_along}, {r_across})");
        return None;
    }

    let (minor, major, minor_direction) = if r_along <= r_across {
        (r_along, r_across, theta)
    } else {
        (r_across, r_along, theta + FRAC_PI_2)
    };

    Some(Ellipse {
        center: (x0 * scale + mean_x, y0 * scale + mean_y),
        width: 2.0 * minor * scale,
        height: 2.0 * major * scale,
        angle: minor_direction.to_degrees().rem_euclid(180.0),
    })
}

/// Null vector of a rank-deficient 3x3 matrix, from the best-conditioned
/// cross product of its rows.
fn null_vector(matrix: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let rows = [
        matrix.row(0).transpose(),
        matrix.row(1).transpose(),
        matrix.row(2).transpose(),
    ];
    [(0, 1), (0, 2), (1, 2)]
        .into_iter()
        .map(|(i, j)| rows[i].cross(&rows[j]))
        .max_by_key(|vector| FloatOrd(vector.norm_squared()))
        .filter(|vector| vector.norm_squared() > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        rotation_deg: f64,
        count: usize,
    ) -> Vec<Point<i32>> {
        let (sin_r, cos_r) = rotation_deg.to_radians().sin_cos();
        (0..count)
            .map(|i| {
                let t = i as f64 / count as f64 * std::f64::consts::TAU;
                let (x, y) = (rx * t.cos(), ry * t.sin());
                Point::new(
                    (cx + x * cos_r - y * sin_r).round() as i32,
                    (cy + x * sin_r + y * cos_r).round() as i32,
                )
            })
            .collect()
    }

    fn angle_distance(a: f64, b: f64) -> f64 {
        let diff = (a - b).rem_euclid(180.0);
        diff.min(180.0 - diff)
    }

    #[test]
    fn wide_ellipse_has_vertical_minor_axis() {
        let ellipse = fit_ellipse(&sample(100.0, 50.0, 40.0, 15.0, 0.0, 120)).unwrap();
        assert!(angle_distance(ellipse.angle, 90.0) < 2.0, "{ellipse:?}");
        assert!((ellipse.center.0 - 100.0).abs() < 1.0);
        assert!((ellipse.center.1 - 50.0).abs() < 1.0);
        assert!((ellipse.width - 30.0).abs() < 2.0);
        assert!((ellipse.height - 80.0).abs() < 2.0);
    }

    #[test]
    fn tall_ellipse_has_horizontal_minor_axis() {
        let ellipse = fit_ellipse(&sample(60.0, 60.0, 12.0, 35.0, 0.0, 120)).unwrap();
        assert!(angle_distance(ellipse.angle, 0.0) < 2.0, "{ellipse:?}");
        assert!(ellipse.width < ellipse.height);
    }

    #[test]
    fn rotated_ellipse_reports_minor_axis_direction() {
        let ellipse = fit_ellipse(&sample(200.0, 200.0, 80.0, 30.0, 30.0, 240)).unwrap();
        assert!(angle_distance(ellipse.angle, 120.0) < 2.0, "{ellipse:?}");
    }

    #[test]
    fn degenerate_inputs_do_not_fit() {
        let line = (0..20).map(|i| Point::new(i, i)).collect::<Vec<_>>();
        assert_eq!(fit_ellipse(&line), None);

        let same = vec![Point::new(3, 3); 10];
        assert_eq!(fit_ellipse(&same), None);

        let few = sample(10.0, 10.0, 5.0, 3.0, 0.0, 4);
        assert_eq!(fit_ellipse(&few), None);
    }

    /// Integer boundary of a rectilinear polygon, one point per pixel step.
    fn outline(vertices: &[(i32, i32)]) -> Vec<Point<i32>> {
        let mut points = Vec::new();
        for (i, &(x0, y0)) in vertices.iter().enumerate() {
            let (x1, y1) = vertices[(i + 1) % vertices.len()];
            let steps = (x1 - x0).abs().max((y1 - y0).abs());
            for step in 0..steps {
                points.push(Point::new(
                    x0 + (x1 - x0).signum() * step,
                    y0 + (y1 - y0).signum() * step,
                ));
            }
        }
        points
    }

    #[test]
    fn t_shape_still_fits() {
        let t = outline(&[
            (0, 0),
            (60, 0),
            (60, 12),
            (36, 12),
            (36, 70),
            (24, 70),
            (24, 12),
            (0, 12),
        ]);
        let ellipse = fit_ellipse(&t).unwrap();
        assert!(ellipse.angle.is_finite(), "{ellipse:?}");
        assert!(ellipse.width > 0.0 && ellipse.height >= ellipse.width);
    }

    #[test]
    fn l_shape_still_fits() {
        let l = outline(&[(0, 0), (12, 0), (12, 58), (45, 58), (45, 70), (0, 70)]);
        let ellipse = fit_ellipse(&l).unwrap();
        assert!(ellipse.angle.is_finite(), "{ellipse:?}");
        assert!((0.0..180.0).contains(&ellipse.angle));
    }
}
