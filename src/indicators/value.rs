use serde::{Deserialize, Serialize};
use std::fmt;

//an indicator reading that is either a finite number or undefined (warm-up, zero denominator)
//comparisons go through the helpers below so an undefined operand is an explicit non-match
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    Defined(f64),
    #[default]
    Undefined,
}

impl Value {
    //wraps x, mapping NaN/Inf to Undefined
    pub fn new(x: f64) -> Self {
        if x.is_finite() {
            Value::Defined(x)
        } else {
            Value::Undefined
        }
    }

    pub fn get(self) -> Option<f64> {
        match self {
            Value::Defined(x) => Some(x),
            Value::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Value::Defined(_))
    }

    pub fn unwrap_or(self, default: f64) -> f64 {
        self.get().unwrap_or(default)
    }

    pub fn map<F: FnOnce(f64) -> f64>(self, f: F) -> Value {
        match self {
            Value::Defined(x) => Value::new(f(x)),
            Value::Undefined => Value::Undefined,
        }
    }

    pub fn zip_with<F: FnOnce(f64, f64) -> f64>(self, other: Value, f: F) -> Value {
        match (self, other) {
            (Value::Defined(a), Value::Defined(b)) => Value::new(f(a, b)),
            _ => Value::Undefined,
        }
    }

    //a / b, undefined when b == 0
    pub fn ratio(self, denominator: Value) -> Value {
        match (self, denominator) {
            (Value::Defined(_), Value::Defined(b)) if b == 0.0 => Value::Undefined,
            (a, b) => a.zip_with(b, |a, b| a / b),
        }
    }

    pub fn gt(self, other: Value) -> bool {
        match (self, other) {
            (Value::Defined(a), Value::Defined(b)) => a > b,
            _ => false,
        }
    }

    pub fn lt(self, other: Value) -> bool {
        match (self, other) {
            (Value::Defined(a), Value::Defined(b)) => a < b,
            _ => false,
        }
    }

    pub fn above(self, threshold: f64) -> bool {
        self.gt(Value::Defined(threshold))
    }

    pub fn below(self, threshold: f64) -> bool {
        self.lt(Value::Defined(threshold))
    }
}

impl From<Option<f64>> for Value {
    fn from(x: Option<f64>) -> Self {
        x.map(Value::new).unwrap_or(Value::Undefined)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Defined(x) => match f.precision() {
                Some(p) => write!(f, "{:.*}", p, x),
                None => write!(f, "{}", x),
            },
            Value::Undefined => write!(f, "NaN"),
        }
    }
}
