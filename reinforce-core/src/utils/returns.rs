/// Standardizes `rewards` to zero mean and unit variance. The standard deviation is the
/// unbiased estimate, a single reward counts as zero spread, and `f32::EPSILON` keeps the
/// division finite when every reward is the same.
pub fn normalize_returns(rewards: &[f32]) -> Vec<f32> {
    let n = rewards.len();
    if n == 0 {
        return vec![];
    }
    let mean = rewards.iter().sum::<f32>() / n as f32;
    let std = if n > 1 {
        let variance = rewards.iter().map(|r| (r - mean).powi(2)).sum::<f32>() / (n - 1) as f32;
        variance.sqrt()
    } else {
        0.
    };
    let denominator = std + f32::EPSILON;
    rewards.iter().map(|r| (r - mean) / denominator).collect()
}
