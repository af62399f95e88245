//! Central finite differences of vector-valued functions.

/// Derivative order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// `(f(x+h) - f(x-h)) / 2h`
    First,
    /// `(f(x+h) - 2 f(x) + f(x-h)) / h²`
    Second,
}

/// Symmetric central difference of `f` at `x` with step `h`.
///
/// `f` may return any number of outputs (all calls must return the same
/// number); each output is differentiated independently.
pub fn central<F>(order: Order, x: f64, h: f64, mut f: F) -> Vec<f64>
where
    F: FnMut(f64) -> Vec<f64>,
{
    let up = f(x + h);
    let down = f(x - h);
    debug_assert_eq!(up.len(), down.len());
    match order {
        Order::First => up
            .iter()
            .zip(&down)
            .map(|(u, d)| (u - d) / (2. * h))
            .collect(),
        Order::Second => {
            let mid = f(x);
            up.iter()
                .zip(&down)
                .zip(&mid)
                .map(|((u, d), m)| (u - 2. * m + d) / h.powi(2))
                .collect()
        }
    }
}

/// Scalar convenience wrapper around [`central`].
pub fn central_scalar<F>(order: Order, x: f64, h: f64, mut f: F) -> f64
where
    F: FnMut(f64) -> f64,
{
    central(order, x, h, |x| vec![f(x)])[0]
}
