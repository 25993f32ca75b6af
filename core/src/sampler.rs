use crate::types::PriceSample;

/// Resample a chronological series to exactly `count` points.
///
/// Output index `i` takes raw index `floor(i / count * raw.len())`, clamped to
/// the last raw index. An empty input yields an empty output: substituting
/// data for a missing history is the data source's job.
pub fn sample_series(raw: &[PriceSample], count: usize) -> Vec<PriceSample> {
    if raw.is_empty() {
        return Vec::new();
    }
    let last = raw.len() - 1;
    (0..count)
        .map(|i| {
            // integer form of floor(i / count * len), exact for any length
            let idx = (i * raw.len()) / count;
            raw[idx.min(last)]
        })
        .collect()
}

/// Both competitors' resampled histories for one match.
#[derive(Clone, Debug, PartialEq)]
pub struct SampledPair {
    pub a: Vec<PriceSample>,
    pub b: Vec<PriceSample>,
}

impl SampledPair {
    pub fn new(raw_a: &[PriceSample], raw_b: &[PriceSample], count: usize) -> Self {
        Self {
            a: sample_series(raw_a, count),
            b: sample_series(raw_b, count),
        }
    }

    /// Both series share the sample count, so this is the clock's index range.
    pub fn len(&self) -> usize {
        self.a.len().min(self.b.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
