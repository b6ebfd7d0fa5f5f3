//drawdown of each point from its running peak, (value - peak) / peak, non-positive
//a non-positive peak gives a 0 drawdown instead of a division by zero
pub fn drawdowns(values: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    values
        .iter()
        .map(|&value| {
            if value > peak {
                peak = value;
            }
            if peak > 0.0 {
                (value - peak) / peak
            } else {
                0.0
            }
        })
        .collect()
}

//deepest drawdown, 0 for an empty or never-declining series
pub fn max_drawdown(values: &[f64]) -> f64 {
    drawdowns(values).into_iter().fold(0.0, f64::min)
}
