use clam_common::Real;

use crate::error::{DetectionResult, InputLocation, ensure_same_length};

/// Area under `y` sampled at the (possibly non-uniform) abscissae `x`.
///
/// Uses composite Simpson's rule. For an odd number of intervals the result is
/// the average of two estimates: Simpson over the first `N - 1` samples plus a
/// trapezoid on the last interval, and a trapezoid on the first interval plus
/// Simpson over the last `N - 1` samples. Fewer than two samples integrate to zero.
pub fn simpson(y: &[Real], x: &[Real]) -> DetectionResult<Real> {
    ensure_same_length(InputLocation::IntegrationAbscissae, y.len(), x.len())?;

    if y.len() % 2 == 1 {
        return Ok(basic_simpson(y, x));
    }

    let (Some((_, y_tail)), Some((_, x_tail))) = (y.split_first(), x.split_first()) else {
        return Ok(0.0);
    };
    let (Some((_, y_head)), Some((_, x_head))) = (y.split_last(), x.split_last()) else {
        return Ok(0.0);
    };
    let first_trapezoid = match (y, x) {
        ([y0, y1, ..], [x0, x1, ..]) => 0.5 * (x1 - x0) * (y1 + y0),
        _ => 0.0,
    };
    let last_trapezoid = match (y, x) {
        ([.., y0, y1], [.., x0, x1]) => 0.5 * (x1 - x0) * (y1 + y0),
        _ => 0.0,
    };

    let head_estimate = basic_simpson(y_head, x_head) + last_trapezoid;
    let tail_estimate = first_trapezoid + basic_simpson(y_tail, x_tail);
    Ok((head_estimate + tail_estimate) / 2.0)
}

/// Simpson's rule over consecutive interval pairs; a trailing unpaired interval is ignored.
fn basic_simpson(y: &[Real], x: &[Real]) -> Real {
    y.windows(3)
        .step_by(2)
        .zip(x.windows(3).step_by(2))
        .map(|pair| match pair {
            ([y0, y1, y2], [x0, x1, x2]) => {
                let h0 = x1 - x0;
                let h1 = x2 - x1;
                let hsum = h0 + h1;
                let hprod = h0 * h1;
                let h0divh1 = h0 / h1;
                hsum / 6.0
                    * (y0 * (2.0 - 1.0 / h0divh1) + y1 * hsum * hsum / hprod + y2 * (2.0 - h0divh1))
            }
            _ => 0.0,
        })
        .sum()
}
