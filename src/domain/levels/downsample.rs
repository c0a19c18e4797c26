//! Fixed-size display series from an arbitrary-length level series
//!
//! Longer inputs are averaged into `target` contiguous bins; shorter inputs are
//! linearly interpolated. Bin `i` starts at `floor(i * (len - 1) / (target - 1))`.

use super::sample::LevelSample;

/// Map `samples` onto exactly `target` display values.
///
/// Returns an empty series for empty input or a zero target.
pub fn downsample(samples: &[LevelSample], target: usize) -> Vec<LevelSample> {
    let len = samples.len();
    if len == 0 || target == 0 {
        return Vec::new();
    }
    if len == target {
        return samples.to_vec();
    }
    if target == 1 {
        return vec![average(samples)];
    }
    if len > target {
        bin(samples, target)
    } else {
        interpolate(samples, target)
    }
}

fn bin(samples: &[LevelSample], target: usize) -> Vec<LevelSample> {
    let len = samples.len();
    let span = len - 1;
    let steps = target - 1;

    (0..target)
        .map(|i| {
            let start = i * span / steps;
            let end = ((i + 1) * span / steps).min(len);
            if start >= end {
                LevelSample::silence(0)
            } else {
                average(&samples[start..end])
            }
        })
        .collect()
}

fn interpolate(samples: &[LevelSample], target: usize) -> Vec<LevelSample> {
    let last = samples.len() - 1;
    let step = last as f64 / (target - 1) as f64;

    (0..target)
        .map(|i| {
            let position = i as f64 * step;
            let lower = (position.floor() as usize).min(last);
            let upper = (position.ceil() as usize).min(last);
            if lower == upper {
                return samples[lower];
            }

            let fraction = position - lower as f64;
            let (a, b) = (samples[lower], samples[upper]);
            let level = a.level as f64 + (b.level as f64 - a.level as f64) * fraction;
            let time = a.time_ms as f64 + (b.time_ms as f64 - a.time_ms as f64) * fraction;
            LevelSample {
                level: level as f32,
                time_ms: time.round() as u64,
            }
        })
        .collect()
}

/// Mean level of a non-empty bucket, stamped with the time of its last sample
fn average(bucket: &[LevelSample]) -> LevelSample {
    let sum: f64 = bucket.iter().map(|s| s.level as f64).sum();
    LevelSample {
        level: (sum / bucket.len() as f64) as f32,
        time_ms: bucket.last().map(|s| s.time_ms).unwrap_or(0),
    }
}
