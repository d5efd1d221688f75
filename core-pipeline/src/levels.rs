use core_coro::AsyncGenerator;

/// Root-mean-square level of a frame, normalized so full scale is 1.0.
///
/// An empty frame has level 0.
pub fn rms(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let full_scale = i16::MAX as f64;
    let sum_of_squares: f64 = samples
        .iter()
        .map(|&sample| {
            let normalized = sample as f64 / full_scale;
            normalized * normalized
        })
        .sum();
    (sum_of_squares / samples.len() as f64).sqrt()
}

/// Maps each sample frame to its [`rms`] level.
pub fn levels(source: AsyncGenerator<Vec<i16>>) -> AsyncGenerator<f64> {
    source.map(|frame| rms(&frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_coro::Generator;

    #[test]
    fn test_rms() {
        assert_eq!(rms(&[]), 0.0);
        assert_eq!(rms(&[0, 0, 0]), 0.0);
        assert!((rms(&[i16::MAX, -i16::MAX]) - 1.0).abs() < 1e-12);
        assert!((rms(&[i16::MAX, 0]) - 0.5_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_levels_stage() {
        let frames = vec![vec![0, 0], vec![i16::MAX, i16::MAX]];
        let values = AsyncGenerator::from(Generator::from_items(frames))
            .pipe(levels)
            .collect()
            .wait()
            .unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], 0.0);
        assert!((values[1] - 1.0).abs() < 1e-12);
    }
}
