//! Shannon entropy over byte histograms.
//!
//! Values are in bits per byte, so always within `[0.0, 8.0]`: 0 for a buffer of
//! one repeated byte, 8 for a perfectly uniform distribution. Compressed or
//! encrypted data sits close to 8.

/// Calculates the Shannon entropy of a byte slice.
///
/// An empty slice has entropy 0.0.
#[inline]
pub fn entropy_of_slice(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut histogram = [0usize; 256];
    for &byte in data {
        histogram[byte as usize] += 1;
    }
    entropy_from_histogram(&histogram, data.len())
}

/// Entropy of at most the first `limit` bytes of `data`.
///
/// Large sections are approximated by their head rather than scanned in full.
#[inline]
pub fn entropy_of_prefix(data: &[u8], limit: usize) -> f64 {
    entropy_of_slice(&data[..data.len().min(limit)])
}

fn entropy_from_histogram(histogram: &[usize; 256], total: usize) -> f64 {
    let len = total as f64;
    let mut entropy = 0.0;
    for &count in histogram {
        if count == 0 {
            continue;
        }
        let p = count as f64 / len;
        entropy -= p * p.log2();
    }
    // Rounding can push a uniform histogram a hair past the bounds.
    entropy.clamp(0.0, 8.0)
}

/// Round to three decimals, the precision carried in reports.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
