/// Descriptor element tied to its family's distance metric
pub trait DescriptorElement: Copy + Send + Sync {
    /// Distance between two equal-length descriptor rows
    fn distance(a: &[Self], b: &[Self]) -> f64;
}

impl DescriptorElement for u8 {
    /// Hamming distance: differing bits across the rows
    fn distance(a: &[Self], b: &[Self]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum::<u32>() as f64
    }
}

impl DescriptorElement for f32 {
    /// Euclidean (L2) distance
    fn distance(a: &[Self], b: &[Self]) -> f64 {
        a.iter()
            .zip(b)
            .map(|(x, y)| {
                let d = f64::from(x - y);
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }
}
