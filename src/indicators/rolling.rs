use crate::indicators::value::Value;
use std::collections::VecDeque;

//fixed-size trailing window over the last `capacity` pushed values
//statistics are undefined until the window is full
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    values: VecDeque<f64>,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "window capacity must be >= 1");
        RollingWindow {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    //value pushed `k` pushes before the newest one
    pub fn lag(&self, k: usize) -> Value {
        if k >= self.values.len() {
            return Value::Undefined;
        }
        self.values.get(self.values.len() - 1 - k).copied().into()
    }

    pub fn mean(&self) -> Value {
        if !self.is_full() {
            return Value::Undefined;
        }
        Value::new(self.values.iter().sum::<f64>() / self.capacity as f64)
    }

    //sample standard deviation (n - 1 denominator)
    pub fn std_dev(&self) -> Value {
        if !self.is_full() || self.capacity < 2 {
            return Value::Undefined;
        }
        let n = self.capacity as f64;
        let mean = self.values.iter().sum::<f64>() / n;
        let sum_sq: f64 = self.values.iter().map(|x| (x - mean) * (x - mean)).sum();
        Value::new((sum_sq / (n - 1.0)).sqrt())
    }
}

//recursive exponential moving average, alpha = 2 / (span + 1), seeded with the first input
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f64,
    current: Option<f64>,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Ema {
            alpha: 2.0 / (span as f64 + 1.0),
            current: None,
        }
    }

    pub fn update(&mut self, value: f64) -> f64 {
        let next = match self.current {
            Some(prev) => self.alpha * value + (1.0 - self.alpha) * prev,
            None => value,
        };
        self.current = Some(next);
        next
    }
}
