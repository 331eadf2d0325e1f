//! Toy batch gradient-descent linear regression over the matrix engine.

use crate::dtype::{DType, FromF64, ToF64, Value};
use crate::error::{CError, CResult};
use crate::matrix::{Matrix, Store};
use num_traits::Float;

/// The synthetic training target: every cell of `input` doubled.
pub fn expected_from(input: &Matrix) -> CResult<Matrix> {
    let two = match input.dtype() {
        DType::Int => Value::Int(2),
        DType::Float => Value::Float(2.0),
        DType::Double => Value::Double(2.0),
        DType::Size => Value::Size(2),
        DType::Char => Value::Char(2),
        DType::Bool => {
            return Err(CError::UnsupportedOperation(
                "expected_from is not defined for bool".to_string(),
            ))
        }
    };
    input.scale(two)
}

fn mse<T: Float + ToF64>(p: &[T], y: &[T]) -> f64 {
    if p.is_empty() {
        return 0.0;
    }
    let mut acc = 0.0;
    for (a, b) in p.iter().zip(y.iter()) {
        let d = a.as_f64() - b.as_f64();
        acc += d * d;
    }
    acc / p.len() as f64
}

/// Mean squared error between predictions and targets.
pub fn cost(p: &Matrix, y: &Matrix) -> CResult<f64> {
    p.check_live("cost")?;
    y.check_live("cost")?;
    if p.dtype() != y.dtype() {
        return Err(CError::TypeMismatch {
            op: "cost",
            lhs: p.dtype(),
            rhs: y.dtype(),
        });
    }
    if p.shape() != y.shape() {
        return Err(CError::ShapeMismatch {
            op: "cost",
            lhs: p.shape(),
            rhs: y.shape(),
        });
    }
    match (p.buf(), y.buf()) {
        (Store::Float(a), Store::Float(b)) => Ok(mse(a, b)),
        (Store::Double(a), Store::Double(b)) => Ok(mse(a, b)),
        _ => Err(CError::UnsupportedOperation(format!(
            "cost requires a floating dtype, got {}",
            p.dtype()
        ))),
    }
}

fn step<T: Float + FromF64>(
    xs: &[T],
    (xr, xc): (usize, usize),
    ws: &mut [T],
    wc: usize,
    ys: &[T],
    zs: &[T],
    zc: usize,
    learn: f64,
) {
    let rate = T::from_f64(learn / xr as f64);
    for i in 0..xc {
        for j in 0..wc {
            let mut g = T::zero();
            for k in 0..xr {
                g = g + (zs[k * zc + j] - ys[k * zc + j]) * xs[k * xc + i];
            }
            ws[i * wc + j] = ws[i * wc + j] - rate * g;
        }
    }
}

/// Runs `epochs` rounds of batch gradient descent, updating `w` in place,
/// and returns the final cost. `x`, `w` and `y` must share a floating dtype
/// with `x.cols() == w.rows()` and `y` shaped like `dot(x, w)`.
pub fn train(
    x: &Matrix,
    w: &mut Matrix,
    y: &Matrix,
    epochs: usize,
    learn: f64,
) -> CResult<f64> {
    for epoch in 0..epochs {
        let z = x.dot(w)?;
        let c = cost(&z, y)?;
        tracing::debug!(epoch, cost = c, "train step");
        let xd = x.shape();
        let wc = w.cols();
        let zc = z.cols();
        match (x.buf(), w.buf_mut(), y.buf(), z.buf()) {
            (Store::Float(xs), Store::Float(ws), Store::Float(ys), Store::Float(zs)) => {
                step(xs, xd, ws, wc, ys, zs, zc, learn)
            }
            (Store::Double(xs), Store::Double(ws), Store::Double(ys), Store::Double(zs)) => {
                step(xs, xd, ws, wc, ys, zs, zc, learn)
            }
            _ => {
                return Err(CError::UnsupportedOperation(
                    "train requires a floating dtype".to_string(),
                ))
            }
        }
    }
    let z = x.dot(w)?;
    let final_cost = cost(&z, y)?;
    tracing::debug!(cost = final_cost, "train done");
    Ok(final_cost)
}
