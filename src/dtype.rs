use std::fmt;

/// Runtime tag for the element type a matrix stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Bool,
    Int,
    Float,
    Double,
    Size,
    Char,
}

impl DType {
    /// Bytes per element for this dtype.
    pub fn size_of(&self) -> usize {
        match self {
            DType::Bool => std::mem::size_of::<bool>(),
            DType::Int => std::mem::size_of::<i32>(),
            DType::Float => std::mem::size_of::<f32>(),
            DType::Double => std::mem::size_of::<f64>(),
            DType::Size => std::mem::size_of::<usize>(),
            DType::Char => std::mem::size_of::<u8>(),
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DType::Float | DType::Double)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::Bool => "bool",
            DType::Int => "int",
            DType::Float => "float",
            DType::Double => "double",
            DType::Size => "size",
            DType::Char => "char",
        };
        f.write_str(name)
    }
}

/// A single type-erased element. `get`/`set`/`fill` traffic in these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
    Double(f64),
    Size(usize),
    Char(u8),
}

impl Value {
    pub fn dtype(&self) -> DType {
        match self {
            Value::Bool(_) => DType::Bool,
            Value::Int(_) => DType::Int,
            Value::Float(_) => DType::Float,
            Value::Double(_) => DType::Double,
            Value::Size(_) => DType::Size,
            Value::Char(_) => DType::Char,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:.2}", v),
            Value::Double(v) => write!(f, "{:.2}", v),
            Value::Size(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", *v as char),
        }
    }
}

pub trait ElemType: Copy + PartialEq + 'static {
    const DTYPE: DType;
    fn zero() -> Self;
    fn one() -> Self;
    fn into_value(self) -> Value;
    fn from_value(v: Value) -> Option<Self>;
}

pub trait ToF64 {
    fn as_f64(&self) -> f64;
}

pub trait FromF64 {
    fn from_f64(a: f64) -> Self;
}

/// Per-kind arithmetic used by the generic op kernels. Integer kinds wrap on
/// overflow, matching native truncation.
pub trait NumType: ElemType {
    fn _add(self, rhs: Self) -> Self;
    fn _sub(self, rhs: Self) -> Self;
    fn _mul(self, rhs: Self) -> Self;
}

macro_rules! impl_elem {
    ($t:ty, $v:ident, $zero:expr, $one:expr) => {
        impl ElemType for $t {
            const DTYPE: DType = DType::$v;
            fn zero() -> Self {
                $zero
            }
            fn one() -> Self {
                $one
            }
            fn into_value(self) -> Value {
                Value::$v(self)
            }
            fn from_value(v: Value) -> Option<Self> {
                match v {
                    Value::$v(x) => Some(x),
                    _ => None,
                }
            }
        }
    };
}

macro_rules! impl_tof64 {
    ($($e:ident),*) => {
        $(impl ToF64 for $e {
            fn as_f64(&self) -> f64 {
                *self as f64
            }
        })*
    };
}

macro_rules! impl_fromf64 {
    ($($e:ident),*) => {
        $(impl FromF64 for $e {
            fn from_f64(a: f64) -> Self {
                a as $e
            }
        })*
    };
}

macro_rules! impl_num_wrapping {
    ($($e:ident),*) => {
        $(impl NumType for $e {
            fn _add(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }
            fn _sub(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }
            fn _mul(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }
        })*
    };
}

macro_rules! impl_num_float {
    ($($e:ident),*) => {
        $(impl NumType for $e {
            fn _add(self, rhs: Self) -> Self {
                self + rhs
            }
            fn _sub(self, rhs: Self) -> Self {
                self - rhs
            }
            fn _mul(self, rhs: Self) -> Self {
                self * rhs
            }
        })*
    };
}

impl_elem!(bool, Bool, false, true);
impl_elem!(i32, Int, 0, 1);
impl_elem!(f32, Float, 0.0, 1.0);
impl_elem!(f64, Double, 0.0, 1.0);
impl_elem!(usize, Size, 0, 1);
impl_elem!(u8, Char, 0, 1);

impl_tof64!(u8, i32, usize, f32, f64);
impl_fromf64!(u8, i32, usize, f32, f64);
impl_num_wrapping!(u8, i32, usize);
impl_num_float!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_of() {
        assert_eq!(DType::Int.size_of(), 4);
        assert_eq!(DType::Float.size_of(), 4);
        assert_eq!(DType::Double.size_of(), 8);
        assert_eq!(DType::Char.size_of(), 1);
    }

    #[test]
    fn test_value_dtype() {
        assert_eq!(Value::Int(3).dtype(), DType::Int);
        assert_eq!(Value::Bool(true).dtype(), DType::Bool);
        assert_eq!(Value::Double(1.5).dtype(), DType::Double);
    }

    #[test]
    fn test_from_value_kind_checked() {
        assert_eq!(i32::from_value(Value::Int(7)), Some(7));
        assert_eq!(i32::from_value(Value::Float(7.0)), None);
    }

    #[test]
    fn test_int_arithmetic_wraps() {
        assert_eq!(i32::MAX._add(1), i32::MIN);
        assert_eq!(0u8._sub(1), 255);
    }

    #[test]
    fn test_char_display() {
        assert_eq!(format!("{}", Value::Char(b'A')), "A");
    }
}
