use ndarray::Zip;

use crate::shared::region::Region;

/// Mean squared per-sample difference between two regions, over every
/// channel of every pixel. `0.0` means pixel-identical.
///
/// Returns `None` when the regions differ in shape, since no per-pixel
/// comparison exists.
pub fn mean_squared_error(a: &Region, b: &Region) -> Option<f64> {
    if a.shape() != b.shape() {
        return None;
    }
    let samples = a.data().len();
    if samples == 0 {
        return Some(0.0);
    }

    let sum = Zip::from(a.as_ndarray())
        .and(b.as_ndarray())
        .fold(0.0_f64, |acc, &x, &y| {
            let d = f64::from(x) - f64::from(y);
            acc + d * d
        });
    Some(sum / samples as f64)
}
