use crate::dtype::{ElemType, NumType, ToF64, Value};
use crate::error::{CError, CResult};
use crate::matrix::{Matrix, Store};

/// Binary kernels. The generic `f` covers the numeric kinds; boolean
/// semantics differ per operation and live in `f_bool` overrides.
trait Map2 {
    const OP: &'static str;

    fn f<T: NumType>(
        &self,
        a: &[T],
        ad: (usize, usize),
        b: &[T],
        bd: (usize, usize),
        dst: &mut [T],
        dd: (usize, usize),
    ) -> CResult<()>;

    fn f_bool(
        &self,
        _a: &[bool],
        _ad: (usize, usize),
        _b: &[bool],
        _bd: (usize, usize),
        _dst: &mut [bool],
        _dd: (usize, usize),
    ) -> CResult<()> {
        Err(CError::UnsupportedOperation(format!(
            "{} is not defined for bool",
            Self::OP
        )))
    }

    fn map(
        &self,
        a: &Store,
        ad: (usize, usize),
        b: &Store,
        bd: (usize, usize),
        dst: &mut Store,
        dd: (usize, usize),
    ) -> CResult<()> {
        match (a, b, dst) {
            (Store::Int(x), Store::Int(y), Store::Int(d)) => self.f(x, ad, y, bd, d, dd),
            (Store::Float(x), Store::Float(y), Store::Float(d)) => self.f(x, ad, y, bd, d, dd),
            (Store::Double(x), Store::Double(y), Store::Double(d)) => self.f(x, ad, y, bd, d, dd),
            (Store::Size(x), Store::Size(y), Store::Size(d)) => self.f(x, ad, y, bd, d, dd),
            (Store::Char(x), Store::Char(y), Store::Char(d)) => self.f(x, ad, y, bd, d, dd),
            (Store::Bool(x), Store::Bool(y), Store::Bool(d)) => self.f_bool(x, ad, y, bd, d, dd),
            (a, b, _) => Err(CError::TypeMismatch {
                op: Self::OP,
                lhs: a.dtype(),
                rhs: b.dtype(),
            }),
        }
    }
}

/// Unary kernels; no boolean special case, every kind goes through `f`.
trait Map {
    const OP: &'static str;

    fn f<T: ElemType>(
        &self,
        a: &[T],
        ad: (usize, usize),
        dst: &mut [T],
        dd: (usize, usize),
    ) -> CResult<()>;

    fn map(&self, a: &Store, ad: (usize, usize), dst: &mut Store, dd: (usize, usize)) -> CResult<()> {
        match (a, dst) {
            (Store::Bool(x), Store::Bool(d)) => self.f(x, ad, d, dd),
            (Store::Int(x), Store::Int(d)) => self.f(x, ad, d, dd),
            (Store::Float(x), Store::Float(d)) => self.f(x, ad, d, dd),
            (Store::Double(x), Store::Double(d)) => self.f(x, ad, d, dd),
            (Store::Size(x), Store::Size(d)) => self.f(x, ad, d, dd),
            (Store::Char(x), Store::Char(d)) => self.f(x, ad, d, dd),
            (a, dst) => Err(CError::TypeMismatch {
                op: Self::OP,
                lhs: a.dtype(),
                rhs: dst.dtype(),
            }),
        }
    }
}

struct Add;

impl Map2 for Add {
    const OP: &'static str = "add";

    fn f<T: NumType>(
        &self,
        a: &[T],
        _ad: (usize, usize),
        b: &[T],
        _bd: (usize, usize),
        dst: &mut [T],
        _dd: (usize, usize),
    ) -> CResult<()> {
        for i in 0..dst.len() {
            dst[i] = a[i]._add(b[i]);
        }
        Ok(())
    }

    // boolean addition is logical OR
    fn f_bool(
        &self,
        a: &[bool],
        _ad: (usize, usize),
        b: &[bool],
        _bd: (usize, usize),
        dst: &mut [bool],
        _dd: (usize, usize),
    ) -> CResult<()> {
        for i in 0..dst.len() {
            dst[i] = a[i] || b[i];
        }
        Ok(())
    }
}

struct Sub;

impl Map2 for Sub {
    const OP: &'static str = "sub";

    fn f<T: NumType>(
        &self,
        a: &[T],
        _ad: (usize, usize),
        b: &[T],
        _bd: (usize, usize),
        dst: &mut [T],
        _dd: (usize, usize),
    ) -> CResult<()> {
        for i in 0..dst.len() {
            dst[i] = a[i]._sub(b[i]);
        }
        Ok(())
    }
    // no f_bool: boolean subtraction is unsupported
}

struct Hadamard;

impl Map2 for Hadamard {
    const OP: &'static str = "hadamard";

    fn f<T: NumType>(
        &self,
        a: &[T],
        _ad: (usize, usize),
        b: &[T],
        _bd: (usize, usize),
        dst: &mut [T],
        _dd: (usize, usize),
    ) -> CResult<()> {
        for i in 0..dst.len() {
            dst[i] = a[i]._mul(b[i]);
        }
        Ok(())
    }

    fn f_bool(
        &self,
        a: &[bool],
        _ad: (usize, usize),
        b: &[bool],
        _bd: (usize, usize),
        dst: &mut [bool],
        _dd: (usize, usize),
    ) -> CResult<()> {
        for i in 0..dst.len() {
            dst[i] = a[i] && b[i];
        }
        Ok(())
    }
}

struct MatMul;

impl Map2 for MatMul {
    const OP: &'static str = "dot";

    fn f<T: NumType>(
        &self,
        a: &[T],
        (m, k): (usize, usize),
        b: &[T],
        (_, n): (usize, usize),
        dst: &mut [T],
        _dd: (usize, usize),
    ) -> CResult<()> {
        for i in 0..m {
            for j in 0..n {
                let mut acc = T::zero();
                for p in 0..k {
                    acc = acc._add(a[i * k + p]._mul(b[p * n + j]));
                }
                dst[i * n + j] = acc;
            }
        }
        Ok(())
    }

    // OR-of-ANDs: true iff some inner index connects the two operands
    fn f_bool(
        &self,
        a: &[bool],
        (m, k): (usize, usize),
        b: &[bool],
        (_, n): (usize, usize),
        dst: &mut [bool],
        _dd: (usize, usize),
    ) -> CResult<()> {
        for i in 0..m {
            for j in 0..n {
                let mut acc = false;
                for p in 0..k {
                    acc = acc || (a[i * k + p] && b[p * n + j]);
                }
                dst[i * n + j] = acc;
            }
        }
        Ok(())
    }
}

struct Transpose;

impl Map for Transpose {
    const OP: &'static str = "transpose";

    fn f<T: ElemType>(
        &self,
        a: &[T],
        (r, c): (usize, usize),
        dst: &mut [T],
        _dd: (usize, usize),
    ) -> CResult<()> {
        for i in 0..r {
            for j in 0..c {
                dst[j * r + i] = a[i * c + j];
            }
        }
        Ok(())
    }
}

fn elementwise<M: Map2>(op: &M, a: &Matrix, b: &Matrix) -> CResult<Matrix> {
    a.check_live(M::OP)?;
    b.check_live(M::OP)?;
    if a.dtype() != b.dtype() {
        return Err(CError::TypeMismatch {
            op: M::OP,
            lhs: a.dtype(),
            rhs: b.dtype(),
        });
    }
    if a.shape() != b.shape() {
        return Err(CError::ShapeMismatch {
            op: M::OP,
            lhs: a.shape(),
            rhs: b.shape(),
        });
    }
    let mut dst = Matrix::create(a.rows(), a.cols(), a.dtype())?;
    let dd = dst.shape();
    op.map(a.buf(), a.shape(), b.buf(), b.shape(), dst.buf_mut(), dd)?;
    Ok(dst)
}

fn scan_eq<T: PartialEq>(a: &[T], b: &[T], cols: usize) -> Option<(usize, usize)> {
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        if x != y {
            return Some((i / cols, i % cols));
        }
    }
    None
}

fn scan_approx<T: ToF64 + Copy>(a: &[T], b: &[T], eps: f64) -> bool {
    a.iter()
        .zip(b.iter())
        .all(|(x, y)| (x.as_f64() - y.as_f64()).abs() <= eps)
}

impl Matrix {
    /// Elementwise sum; boolean addition is logical OR.
    pub fn add(&self, rhs: &Matrix) -> CResult<Matrix> {
        elementwise(&Add, self, rhs)
    }

    /// Elementwise difference; unsupported for bool.
    pub fn sub(&self, rhs: &Matrix) -> CResult<Matrix> {
        elementwise(&Sub, self, rhs)
    }

    /// Elementwise product; boolean hadamard is logical AND.
    pub fn hadamard(&self, rhs: &Matrix) -> CResult<Matrix> {
        elementwise(&Hadamard, self, rhs)
    }

    /// Matrix multiplication, `self.cols() == rhs.rows()` required.
    /// Accumulation happens in the element's native type.
    pub fn dot(&self, rhs: &Matrix) -> CResult<Matrix> {
        self.check_live("dot")?;
        rhs.check_live("dot")?;
        if self.dtype() != rhs.dtype() {
            return Err(CError::TypeMismatch {
                op: "dot",
                lhs: self.dtype(),
                rhs: rhs.dtype(),
            });
        }
        if self.cols() != rhs.rows() {
            return Err(CError::DimensionMismatch {
                lhs_cols: self.cols(),
                rhs_rows: rhs.rows(),
            });
        }
        let mut dst = Matrix::create(self.rows(), rhs.cols(), self.dtype())?;
        let dd = dst.shape();
        MatMul.map(self.buf(), self.shape(), rhs.buf(), rhs.shape(), dst.buf_mut(), dd)?;
        Ok(dst)
    }

    pub fn transpose(&self) -> CResult<Matrix> {
        self.check_live("transpose")?;
        let mut dst = Matrix::create(self.cols(), self.rows(), self.dtype())?;
        let dd = dst.shape();
        Transpose.map(self.buf(), self.shape(), dst.buf_mut(), dd)?;
        Ok(dst)
    }

    /// Multiplies every cell by `factor`, whose dtype must match.
    pub fn scale(&self, factor: Value) -> CResult<Matrix> {
        self.check_live("scale")?;
        if factor.dtype() != self.dtype() {
            return Err(CError::TypeMismatch {
                op: "scale",
                lhs: self.dtype(),
                rhs: factor.dtype(),
            });
        }
        let mut out = self.clone();
        match (out.buf_mut(), factor) {
            (Store::Int(v), Value::Int(k)) => v.iter_mut().for_each(|x| *x = x.wrapping_mul(k)),
            (Store::Float(v), Value::Float(k)) => v.iter_mut().for_each(|x| *x *= k),
            (Store::Double(v), Value::Double(k)) => v.iter_mut().for_each(|x| *x *= k),
            (Store::Size(v), Value::Size(k)) => v.iter_mut().for_each(|x| *x = x.wrapping_mul(k)),
            (Store::Char(v), Value::Char(k)) => v.iter_mut().for_each(|x| *x = x.wrapping_mul(k)),
            _ => {
                return Err(CError::UnsupportedOperation(
                    "scale is not defined for bool".to_string(),
                ))
            }
        }
        Ok(out)
    }

    /// Exact elementwise equality. Both dimensions must agree before any
    /// cell is compared; the first mismatching coordinate is traced.
    pub fn equal(&self, rhs: &Matrix) -> CResult<bool> {
        self.check_live("equal")?;
        rhs.check_live("equal")?;
        if self.dtype() != rhs.dtype() {
            return Err(CError::TypeMismatch {
                op: "equal",
                lhs: self.dtype(),
                rhs: rhs.dtype(),
            });
        }
        if self.shape() != rhs.shape() {
            return Err(CError::ShapeMismatch {
                op: "equal",
                lhs: self.shape(),
                rhs: rhs.shape(),
            });
        }
        let cols = self.cols().max(1);
        let mismatch = match (self.buf(), rhs.buf()) {
            (Store::Bool(a), Store::Bool(b)) => scan_eq(a, b, cols),
            (Store::Int(a), Store::Int(b)) => scan_eq(a, b, cols),
            (Store::Float(a), Store::Float(b)) => scan_eq(a, b, cols),
            (Store::Double(a), Store::Double(b)) => scan_eq(a, b, cols),
            (Store::Size(a), Store::Size(b)) => scan_eq(a, b, cols),
            (Store::Char(a), Store::Char(b)) => scan_eq(a, b, cols),
            (a, b) => {
                return Err(CError::TypeMismatch {
                    op: "equal",
                    lhs: a.dtype(),
                    rhs: b.dtype(),
                })
            }
        };
        if let Some((row, col)) = mismatch {
            tracing::debug!(row, col, "matrices differ");
            return Ok(false);
        }
        Ok(true)
    }

    /// Equality within `eps`, for the floating dtypes only.
    pub fn equal_approx(&self, rhs: &Matrix, eps: f64) -> CResult<bool> {
        self.check_live("equal_approx")?;
        rhs.check_live("equal_approx")?;
        if self.dtype() != rhs.dtype() {
            return Err(CError::TypeMismatch {
                op: "equal_approx",
                lhs: self.dtype(),
                rhs: rhs.dtype(),
            });
        }
        if self.shape() != rhs.shape() {
            return Err(CError::ShapeMismatch {
                op: "equal_approx",
                lhs: self.shape(),
                rhs: rhs.shape(),
            });
        }
        match (self.buf(), rhs.buf()) {
            (Store::Float(a), Store::Float(b)) => Ok(scan_approx(a, b, eps)),
            (Store::Double(a), Store::Double(b)) => Ok(scan_approx(a, b, eps)),
            _ => Err(CError::UnsupportedOperation(format!(
                "equal_approx requires a floating dtype, got {}",
                self.dtype()
            ))),
        }
    }
}
