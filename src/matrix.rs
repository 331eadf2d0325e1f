use crate::dtype::{DType, ElemType, Value};
use crate::error::{CError, CResult};
use rand::distributions::Uniform;
use rand::prelude::Distribution;
use rand::Rng;
use std::fmt;

/// One owned buffer per element kind. Row-major: (r, c) lives at r * cols + c.
#[derive(Debug, Clone)]
pub enum Store {
    Bool(Vec<bool>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Size(Vec<usize>),
    Char(Vec<u8>),
}

impl Store {
    pub(crate) fn dtype(&self) -> DType {
        match self {
            Store::Bool(_) => DType::Bool,
            Store::Int(_) => DType::Int,
            Store::Float(_) => DType::Float,
            Store::Double(_) => DType::Double,
            Store::Size(_) => DType::Size,
            Store::Char(_) => DType::Char,
        }
    }

    fn len(&self) -> usize {
        match self {
            Store::Bool(v) => v.len(),
            Store::Int(v) => v.len(),
            Store::Float(v) => v.len(),
            Store::Double(v) => v.len(),
            Store::Size(v) => v.len(),
            Store::Char(v) => v.len(),
        }
    }

    fn empty(dtype: DType) -> Store {
        match dtype {
            DType::Bool => Store::Bool(Vec::new()),
            DType::Int => Store::Int(Vec::new()),
            DType::Float => Store::Float(Vec::new()),
            DType::Double => Store::Double(Vec::new()),
            DType::Size => Store::Size(Vec::new()),
            DType::Char => Store::Char(Vec::new()),
        }
    }
}

/// Ties a primitive element type to its `Store` variant.
pub trait StoreElem: ElemType {
    fn store(v: Vec<Self>) -> Store;
}

macro_rules! impl_store_elem {
    ($($t:ty => $v:ident),*) => {
        $(impl StoreElem for $t {
            fn store(v: Vec<Self>) -> Store {
                Store::$v(v)
            }
        })*
    };
}

impl_store_elem!(bool => Bool, i32 => Int, f32 => Float, f64 => Double, usize => Size, u8 => Char);

fn alloc_elem<T: ElemType>(n: usize, elem: T) -> CResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(n).map_err(|_| CError::OutOfMemory)?;
    v.resize(n, elem);
    Ok(v)
}

/// A dense 2-D buffer with a runtime element tag. Every operation returns a
/// freshly allocated result; shapes never change in place.
#[derive(Debug, Clone)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    buf: Store,
    released: bool,
}

impl Matrix {
    /// Zero-initialised `rows x cols` matrix of the given dtype.
    pub fn create(rows: usize, cols: usize, dtype: DType) -> CResult<Matrix> {
        let n = rows.checked_mul(cols).ok_or(CError::OutOfMemory)?;
        let buf = match dtype {
            DType::Bool => Store::Bool(alloc_elem(n, false)?),
            DType::Int => Store::Int(alloc_elem(n, 0i32)?),
            DType::Float => Store::Float(alloc_elem(n, 0f32)?),
            DType::Double => Store::Double(alloc_elem(n, 0f64)?),
            DType::Size => Store::Size(alloc_elem(n, 0usize)?),
            DType::Char => Store::Char(alloc_elem(n, 0u8)?),
        };
        Ok(Matrix {
            rows,
            cols,
            buf,
            released: false,
        })
    }

    /// Every cell set to `value`; the dtype is inferred from the value.
    pub fn fill(rows: usize, cols: usize, value: Value) -> CResult<Matrix> {
        let n = rows.checked_mul(cols).ok_or(CError::OutOfMemory)?;
        let buf = match value {
            Value::Bool(x) => Store::Bool(alloc_elem(n, x)?),
            Value::Int(x) => Store::Int(alloc_elem(n, x)?),
            Value::Float(x) => Store::Float(alloc_elem(n, x)?),
            Value::Double(x) => Store::Double(alloc_elem(n, x)?),
            Value::Size(x) => Store::Size(alloc_elem(n, x)?),
            Value::Char(x) => Store::Char(alloc_elem(n, x)?),
        };
        Ok(Matrix {
            rows,
            cols,
            buf,
            released: false,
        })
    }

    /// Uniform pseudo-random fill. The `[lo, hi)` range is interpreted per
    /// kind: integers draw from `[lo, hi]`, booleans flip a coin, chars draw
    /// from `A..=Z`, size clamps the range at zero.
    pub fn random(rows: usize, cols: usize, dtype: DType, lo: f64, hi: f64) -> CResult<Matrix> {
        if !(lo < hi) {
            return Err(CError::UnsupportedOperation(format!(
                "random: range [{}, {}) is empty",
                lo, hi
            )));
        }
        let mut m = Matrix::create(rows, cols, dtype)?;
        let mut rng = rand::thread_rng();
        match &mut m.buf {
            Store::Bool(v) => v.iter_mut().for_each(|x| *x = rng.gen()),
            Store::Int(v) => {
                let d = Uniform::new_inclusive(lo as i32, hi as i32);
                v.iter_mut().for_each(|x| *x = d.sample(&mut rng));
            }
            Store::Float(v) => {
                // a range that is non-empty in f64 can still collapse in f32
                let (flo, fhi) = (lo as f32, hi as f32);
                if !(flo < fhi) {
                    return Err(CError::UnsupportedOperation(format!(
                        "random: range [{}, {}) is empty",
                        flo, fhi
                    )));
                }
                let d = Uniform::new(flo, fhi);
                v.iter_mut().for_each(|x| *x = d.sample(&mut rng));
            }
            Store::Double(v) => {
                let d = Uniform::new(lo, hi);
                v.iter_mut().for_each(|x| *x = d.sample(&mut rng));
            }
            Store::Size(v) => {
                let d = Uniform::new_inclusive(lo.max(0.0) as usize, hi.max(0.0) as usize);
                v.iter_mut().for_each(|x| *x = d.sample(&mut rng));
            }
            Store::Char(v) => v.iter_mut().for_each(|x| *x = rng.gen_range(b'A'..=b'Z')),
        }
        Ok(m)
    }

    /// Typed construction from an existing row-major vector.
    pub fn from_vec<T: StoreElem>(rows: usize, cols: usize, v: Vec<T>) -> CResult<Matrix> {
        let n = rows.checked_mul(cols).ok_or(CError::OutOfMemory)?;
        if v.len() != n {
            return Err(CError::ShapeMismatch {
                op: "from_vec",
                lhs: (rows, cols),
                rhs: (1, v.len()),
            });
        }
        Ok(Matrix {
            rows,
            cols,
            buf: T::store(v),
            released: false,
        })
    }

    /// `n x n` matrix with ones (`true` for bool) on the diagonal.
    pub fn identity(n: usize, dtype: DType) -> CResult<Matrix> {
        if dtype == DType::Char {
            return Err(CError::UnsupportedOperation(
                "identity is not defined for char".to_string(),
            ));
        }
        let mut m = Matrix::create(n, n, dtype)?;
        match &mut m.buf {
            Store::Bool(v) => (0..n).for_each(|i| v[i * n + i] = true),
            Store::Int(v) => (0..n).for_each(|i| v[i * n + i] = 1),
            Store::Float(v) => (0..n).for_each(|i| v[i * n + i] = 1.0),
            Store::Double(v) => (0..n).for_each(|i| v[i * n + i] = 1.0),
            Store::Size(v) => (0..n).for_each(|i| v[i * n + i] = 1),
            Store::Char(_) => {}
        }
        Ok(m)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn dtype(&self) -> DType {
        self.buf.dtype()
    }

    pub fn elem_count(&self) -> usize {
        self.buf.len()
    }

    pub fn byte_size(&self) -> usize {
        self.buf.len() * self.dtype().size_of()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub(crate) fn buf(&self) -> &Store {
        &self.buf
    }

    pub(crate) fn buf_mut(&mut self) -> &mut Store {
        &mut self.buf
    }

    pub(crate) fn check_live(&self, op: &'static str) -> CResult<()> {
        if self.released {
            Err(CError::UseAfterRelease(op))
        } else {
            Ok(())
        }
    }

    fn offset(&self, row: usize, col: usize) -> CResult<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(CError::IndexOutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(row * self.cols + col)
    }

    pub fn get(&self, row: usize, col: usize) -> CResult<Value> {
        self.check_live("get")?;
        let i = self.offset(row, col)?;
        Ok(match &self.buf {
            Store::Bool(v) => Value::Bool(v[i]),
            Store::Int(v) => Value::Int(v[i]),
            Store::Float(v) => Value::Float(v[i]),
            Store::Double(v) => Value::Double(v[i]),
            Store::Size(v) => Value::Size(v[i]),
            Store::Char(v) => Value::Char(v[i]),
        })
    }

    pub fn set(&mut self, row: usize, col: usize, value: Value) -> CResult<()> {
        self.check_live("set")?;
        let i = self.offset(row, col)?;
        match (&mut self.buf, value) {
            (Store::Bool(v), Value::Bool(x)) => v[i] = x,
            (Store::Int(v), Value::Int(x)) => v[i] = x,
            (Store::Float(v), Value::Float(x)) => v[i] = x,
            (Store::Double(v), Value::Double(x)) => v[i] = x,
            (Store::Size(v), Value::Size(x)) => v[i] = x,
            (Store::Char(v), Value::Char(x)) => v[i] = x,
            (buf, value) => {
                return Err(CError::TypeMismatch {
                    op: "set",
                    lhs: buf.dtype(),
                    rhs: value.dtype(),
                })
            }
        }
        Ok(())
    }

    /// Frees the buffer and resets the shape to 0 x 0. Idempotent; after the
    /// first call every other operation fails with `UseAfterRelease`.
    pub fn unload(&mut self) {
        if self.released {
            return;
        }
        self.buf = Store::empty(self.dtype());
        self.rows = 0;
        self.cols = 0;
        self.released = true;
    }

    /// The original SHAPE line: `name(SHAPE: (r , c), dtype=...)`.
    pub fn shape_line(&self, name: &str) -> String {
        format!(
            "{}(SHAPE: ({} , {}), dtype={})",
            name,
            self.rows,
            self.cols,
            self.dtype()
        )
    }

    fn fmt_cell(&self, i: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.buf {
            Store::Bool(v) => write!(f, " {} ", v[i]),
            Store::Int(v) => write!(f, " {} ", v[i]),
            Store::Float(v) => write!(f, " {:.2} ", v[i]),
            Store::Double(v) => write!(f, " {:.2} ", v[i]),
            Store::Size(v) => write!(f, " {} ", v[i]),
            Store::Char(v) => write!(f, " {} ", v[i] as char),
        }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[\n")?;
        for r in 0..self.rows {
            for c in 0..self.cols {
                self.fmt_cell(r * self.cols + c, f)?;
            }
            f.write_str("\n")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_invariant() {
        let m = Matrix::create(3, 4, DType::Double).unwrap();
        assert_eq!(m.shape(), (3, 4));
        assert_eq!(m.elem_count(), 12);
        assert_eq!(m.byte_size(), 12 * 8);
        assert_eq!(m.get(0, 0).unwrap(), Value::Double(0.0));
        assert_eq!(m.get(2, 3).unwrap(), Value::Double(0.0));
    }

    #[test]
    fn test_fill() {
        let m = Matrix::fill(2, 2, Value::Float(5.0)).unwrap();
        assert_eq!(m.dtype(), DType::Float);
        assert_eq!(m.elem_count(), 4);
        for r in 0..2 {
            for c in 0..2 {
                assert_eq!(m.get(r, c).unwrap(), Value::Float(5.0));
            }
        }
    }

    #[test]
    fn test_get_set_boundary() {
        let mut m = Matrix::create(3, 5, DType::Int).unwrap();
        m.set(2, 4, Value::Int(9)).unwrap();
        assert_eq!(m.get(2, 4).unwrap(), Value::Int(9));
        assert!(matches!(
            m.get(3, 0),
            Err(CError::IndexOutOfBounds { row: 3, col: 0, .. })
        ));
        assert!(matches!(
            m.get(0, 5),
            Err(CError::IndexOutOfBounds { .. })
        ));
        assert!(matches!(
            m.set(3, 0, Value::Int(1)),
            Err(CError::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_set_kind_checked() {
        let mut m = Matrix::create(2, 2, DType::Int).unwrap();
        assert!(matches!(
            m.set(0, 0, Value::Float(1.0)),
            Err(CError::TypeMismatch { op: "set", .. })
        ));
    }

    #[test]
    fn test_unload_is_idempotent_and_safe() {
        let mut m = Matrix::fill(2, 2, Value::Int(1)).unwrap();
        m.unload();
        m.unload();
        assert!(m.is_released());
        assert_eq!(m.shape(), (0, 0));
        assert_eq!(m.elem_count(), 0);
        assert!(matches!(m.get(0, 0), Err(CError::UseAfterRelease("get"))));
        assert!(matches!(
            m.set(0, 0, Value::Int(1)),
            Err(CError::UseAfterRelease("set"))
        ));
    }

    #[test]
    fn test_random_respects_range() {
        let m = Matrix::random(4, 4, DType::Int, -10.0, 10.0).unwrap();
        for r in 0..4 {
            for c in 0..4 {
                match m.get(r, c).unwrap() {
                    Value::Int(v) => assert!((-10..=10).contains(&v)),
                    v => panic!("unexpected value {:?}", v),
                }
            }
        }
        let m = Matrix::random(4, 4, DType::Double, -500.0, 500.0).unwrap();
        for r in 0..4 {
            for c in 0..4 {
                match m.get(r, c).unwrap() {
                    Value::Double(v) => assert!((-500.0..500.0).contains(&v)),
                    v => panic!("unexpected value {:?}", v),
                }
            }
        }
        assert!(Matrix::random(2, 2, DType::Int, 5.0, 5.0).is_err());
    }

    #[test]
    fn test_random_float_range_collapsed_by_f32_cast() {
        // non-empty in f64, empty once cast to f32; must error, not panic
        assert!(matches!(
            Matrix::random(2, 2, DType::Float, 1.0, 1.0 + 1e-12),
            Err(CError::UnsupportedOperation(_))
        ));
        assert!(Matrix::random(2, 2, DType::Double, 1.0, 1.0 + 1e-12).is_ok());
    }

    #[test]
    fn test_random_char_is_uppercase() {
        let m = Matrix::random(3, 3, DType::Char, 0.0, 1.0).unwrap();
        for r in 0..3 {
            for c in 0..3 {
                match m.get(r, c).unwrap() {
                    Value::Char(v) => assert!(v.is_ascii_uppercase()),
                    v => panic!("unexpected value {:?}", v),
                }
            }
        }
    }

    #[test]
    fn test_from_vec_checks_len() {
        let m = Matrix::from_vec(2, 3, vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(m.get(1, 2).unwrap(), Value::Float(6.0));
        assert!(matches!(
            Matrix::from_vec(2, 3, vec![1.0f32]),
            Err(CError::ShapeMismatch { op: "from_vec", .. })
        ));
    }

    #[test]
    fn test_identity() {
        let m = Matrix::identity(3, DType::Int).unwrap();
        for r in 0..3 {
            for c in 0..3 {
                let want = if r == c { 1 } else { 0 };
                assert_eq!(m.get(r, c).unwrap(), Value::Int(want));
            }
        }
        assert!(Matrix::identity(3, DType::Char).is_err());
    }

    #[test]
    fn test_display_bracketed_rows() {
        let m = Matrix::from_vec(2, 2, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(format!("{}", m), "[\n 1  2 \n 3  4 \n]");
    }

    #[test]
    fn test_shape_line() {
        let m = Matrix::create(2, 3, DType::Float).unwrap();
        assert_eq!(m.shape_line("a"), "a(SHAPE: (2 , 3), dtype=float)");
    }
}
