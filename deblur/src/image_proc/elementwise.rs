//! Pointwise arithmetic between grids of identical shape.
//!
//! Shape checks happen before any sample is touched: a mismatched call
//! returns [`DeblurError::ShapeMismatch`] carrying both shapes and leaves
//! every operand as it was.

use crate::error::DeblurError;
use crate::image_proc::grid::ImageGrid;
use ndarray::Zip;

/// Fail unless `a` and `b` have the same `(height, width, channels)`.
pub fn check_same_shape(a: &ImageGrid, b: &ImageGrid) -> Result<(), DeblurError> {
    if a.shape() != b.shape() {
        return Err(DeblurError::ShapeMismatch {
            left: a.shape(),
            right: b.shape(),
        });
    }
    Ok(())
}

/// `a / b`, saturating to `a` when `b` is zero.
///
/// Substituting the numerator keeps NaN and infinities out of the
/// Richardson-Lucy ratio image.
#[inline]
pub fn safe_divide(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        a
    } else {
        a / b
    }
}

/// `c[i][j][k] = a[i][j][k] * b[i][j][k]`
pub fn multiply(a: &ImageGrid, b: &ImageGrid) -> Result<ImageGrid, DeblurError> {
    check_same_shape(a, b)?;
    let product = Zip::from(&a.view())
        .and(&b.view())
        .map_collect(|&x, &y| x * y);
    ImageGrid::from_array(product)
}

/// `c[i][j][k] = a[i][j][k] / b[i][j][k]`, or `a[i][j][k]` where the
/// denominator is zero.
pub fn divide(a: &ImageGrid, b: &ImageGrid) -> Result<ImageGrid, DeblurError> {
    check_same_shape(a, b)?;
    let quotient = Zip::from(&a.view())
        .and(&b.view())
        .map_collect(|&x, &y| safe_divide(x, y));
    ImageGrid::from_array(quotient)
}

/// In-place `a *= b`. On shape mismatch `a` is left untouched.
pub fn multiply_assign(a: &mut ImageGrid, b: &ImageGrid) -> Result<(), DeblurError> {
    check_same_shape(a, b)?;
    Zip::from(&mut a.view_mut())
        .and(&b.view())
        .for_each(|x, &y| *x *= y);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_proc::grid::GridShape;
    use ndarray::Array3;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn grid_from_fn(
        height: usize,
        width: usize,
        f: impl Fn(usize, usize, usize) -> f64,
    ) -> ImageGrid {
        let data = Array3::from_shape_fn((height, width, 3), |(r, c, k)| f(r, c, k));
        ImageGrid::from_array(data).unwrap()
    }

    #[test]
    fn test_multiply_values() {
        let a = grid_from_fn(2, 3, |r, c, k| (r + c + k) as f64);
        let b = grid_from_fn(2, 3, |_, _, k| (k + 1) as f64);
        let c = multiply(&a, &b).unwrap();

        assert_eq!(c.get(1, 2, 2), Some(15.0));
        assert_eq!(c.get(0, 0, 0), Some(0.0));
        assert_eq!(c.shape(), a.shape());
    }

    #[test]
    fn test_divide_saturates_on_zero_denominator() {
        let a = grid_from_fn(2, 2, |r, c, k| 10.0 + (r * 4 + c * 2 + k) as f64);
        let mut b_data = Array3::from_elem((2, 2, 3), 2.0);
        b_data[[1, 0, 2]] = 0.0;
        let b = ImageGrid::from_array(b_data).unwrap();

        let c = divide(&a, &b).unwrap();
        assert_eq!(c.get(1, 0, 2), a.get(1, 0, 2));
        assert_eq!(c.get(1, 0, 1), a.get(1, 0, 1).map(|v| v / 2.0));
        assert!(c.samples().all(|v| v.is_finite()));
    }

    #[test]
    fn test_divide_zero_by_zero_is_zero() {
        let zeros = ImageGrid::zeros(2, 2);
        let c = divide(&zeros, &zeros).unwrap();
        assert!(c.samples().all(|&v| v == 0.0));
    }

    #[test]
    fn test_divide_undoes_multiply() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let a = Array3::from_shape_fn((5, 4, 3), |_| rng.random_range(0.0..255.0));
        let a = ImageGrid::from_array(a).unwrap();
        let mut b = Array3::from_shape_fn((5, 4, 3), |_| rng.random_range(0.5..3.0));
        b[[0, 0, 0]] = 0.0;
        let b = ImageGrid::from_array(b).unwrap();

        let round_trip = divide(&multiply(&a, &b).unwrap(), &b).unwrap();
        for r in 0..5 {
            for c in 0..4 {
                for k in 0..3 {
                    if b.get(r, c, k) == Some(0.0) {
                        continue;
                    }
                    let expected = a.get(r, c, k).unwrap();
                    let actual = round_trip.get(r, c, k).unwrap();
                    assert!((actual - expected).abs() <= 1e-12 * expected.abs().max(1.0));
                }
            }
        }
    }

    #[test]
    fn test_multiply_assign_matches_multiply() {
        let a = grid_from_fn(3, 3, |r, c, k| (r * 9 + c * 3 + k) as f64 * 0.5);
        let b = grid_from_fn(3, 3, |r, _, _| r as f64 + 1.0);

        let expected = multiply(&a, &b).unwrap();
        let mut in_place = a.clone();
        multiply_assign(&mut in_place, &b).unwrap();
        assert_eq!(in_place, expected);
    }

    #[test]
    fn test_shape_mismatch_reports_both_shapes() {
        let a = ImageGrid::zeros(2, 3);
        let b = ImageGrid::zeros(3, 2);
        let expected = DeblurError::ShapeMismatch {
            left: GridShape::new(2, 3, 3),
            right: GridShape::new(3, 2, 3),
        };

        assert_eq!(multiply(&a, &b).unwrap_err(), expected);
        assert_eq!(divide(&a, &b).unwrap_err(), expected);
    }

    #[test]
    fn test_shape_mismatch_leaves_operand_unmutated() {
        let original = grid_from_fn(2, 2, |r, c, k| (r + c + k) as f64 + 1.0);
        let mut a = original.clone();
        let b = ImageGrid::zeros(2, 3);

        assert!(multiply_assign(&mut a, &b).is_err());
        assert_eq!(a, original);
    }
}
