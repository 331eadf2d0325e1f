mod dtype;
mod error;
mod matrix;
mod op;
mod train;

pub use dtype::{DType, ElemType, FromF64, NumType, ToF64, Value};
pub use error::{CError, CResult};
pub use matrix::{Matrix, Store, StoreElem};
pub use train::{cost, expected_from, train};

#[macro_export]
macro_rules! matrix {
    ($([$($x:expr),* $(,)?]),+ $(,)?) => {{
        let mut data = Vec::new();
        let mut rows = 0usize;
        let mut cols = None;
        let mut ragged = false;
        $(
            let row = [$($x),*];
            rows += 1;
            match cols {
                None => cols = Some(row.len()),
                Some(c) if c != row.len() => ragged = true,
                Some(_) => {}
            }
            data.extend_from_slice(&row);
        )+
        let cols = cols.unwrap_or(0);
        if ragged {
            Err($crate::CError::ShapeMismatch {
                op: "matrix!",
                lhs: (rows, cols),
                rhs: (1, data.len()),
            })
        } else {
            $crate::Matrix::from_vec(rows, cols, data)
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_macro() {
        let m = matrix![[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]].unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.dtype(), DType::Float);
        assert_eq!(m.get(1, 2).unwrap(), Value::Float(6.0));
    }

    #[test]
    fn test_matrix_macro_rejects_ragged_rows() {
        // total length matches rows * last_cols, but the rows are misaligned
        assert!(matches!(
            matrix![[1, 2, 3], [4], [5, 6]],
            Err(CError::ShapeMismatch { op: "matrix!", .. })
        ));
    }

    // the original driver flow: build, operate, print, release
    #[test]
    fn test_engine_smoke() {
        let a = Matrix::random(3, 3, DType::Double, -10.0, 10.0).unwrap();
        let b = Matrix::random(3, 3, DType::Double, -10.0, 10.0).unwrap();

        let sum = a.add(&b).unwrap();
        let diff = sum.sub(&b).unwrap();
        assert!(diff.equal_approx(&a, 1e-9).unwrap());

        let prod = a.dot(&b).unwrap();
        assert_eq!(prod.shape(), (3, 3));

        let t = a.transpose().unwrap();
        println!("{}", t.shape_line("t"));
        println!("t = {}", t);

        let mut owned = prod;
        owned.unload();
        assert!(owned.is_released());
        assert!(matches!(owned.get(0, 0), Err(CError::UseAfterRelease(_))));
    }
}
