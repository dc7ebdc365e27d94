//! Synthetic force-sensor sample generation.
//!
//! Models a load cell / FSR whose raw reading relates to the applied force by
//! a power law:
//!
//! `force(raw) = scale * raw^exponent + noise`, `noise ~ N(0, sigma)`

use std::fs::File;
use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::Observation;
use crate::error::AppError;

/// Parameters of the synthetic sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    pub count: usize,
    pub seed: u64,
    /// Raw reading range (ADC counts); must be non-negative.
    pub x_min: f64,
    pub x_max: f64,
    pub scale: f64,
    pub exponent: f64,
    /// Standard deviation of the additive force noise.
    pub noise: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            count: 200,
            seed: 42,
            x_min: 10.0,
            x_max: 1000.0,
            scale: 0.02,
            exponent: 1.35,
            noise: 0.5,
        }
    }
}

/// Generate a deterministic (per seed) noisy sensor response.
///
/// Readings are drawn uniformly from `[x_min, x_max]` and returned in draw
/// order, so the file is not pre-sorted.
pub fn generate_sample(config: &SampleConfig) -> Result<Vec<Observation>, AppError> {
    if config.count < 2 {
        return Err(AppError::new(2, "Sample count must be >= 2."));
    }
    if !(config.x_min.is_finite() && config.x_max.is_finite() && config.x_min >= 0.0 && config.x_max > config.x_min)
    {
        return Err(AppError::new(2, "Invalid raw range for sample generation (need 0 <= min < max)."));
    }
    if !(config.scale.is_finite() && config.exponent.is_finite()) {
        return Err(AppError::new(2, "Invalid power-law parameters."));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::new(2, "Noise level must be a finite value >= 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut points = Vec::with_capacity(config.count);
    for _ in 0..config.count {
        let raw = rng.gen_range(config.x_min..=config.x_max).round();
        let z: f64 = normal.sample(&mut rng);
        let force = config.scale * raw.powf(config.exponent) + config.noise * z;
        if !force.is_finite() {
            return Err(AppError::new(4, "Non-finite force generated; check scale/exponent."));
        }
        points.push(Observation::new(raw, force));
    }

    Ok(points)
}

/// Write a `raw,force` CSV.
pub fn write_sample_csv(path: &Path, points: &[Observation]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create sample CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(["raw", "force"])
        .map_err(|e| AppError::new(2, format!("Failed to write sample CSV header: {e}")))?;
    for p in points {
        writer
            .write_record([p.x.to_string(), format!("{:.6}", p.y)])
            .map_err(|e| AppError::new(2, format!("Failed to write sample CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush sample CSV: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ColumnRef;
    use crate::io::ingest::load_dataset;

    #[test]
    fn same_seed_same_sample() {
        let config = SampleConfig::default();
        let a = generate_sample(&config).unwrap();
        let b = generate_sample(&config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), config.count);

        let other = generate_sample(&SampleConfig { seed: 7, ..config }).unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn noise_free_sample_follows_power_law() {
        let config = SampleConfig {
            count: 50,
            noise: 0.0,
            ..SampleConfig::default()
        };
        for p in generate_sample(&config).unwrap() {
            assert!(p.x >= config.x_min && p.x <= config.x_max);
            let expected = config.scale * p.x.powf(config.exponent);
            assert!((p.y - expected).abs() < 1e-9, "x={} y={} expected={expected}", p.x, p.y);
        }
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let base = SampleConfig::default();
        for bad in [
            SampleConfig { count: 1, ..base.clone() },
            SampleConfig { x_min: -1.0, ..base.clone() },
            SampleConfig { x_max: 5.0, ..base.clone() },
            SampleConfig { noise: -0.1, ..base.clone() },
        ] {
            assert_eq!(generate_sample(&bad).unwrap_err().exit_code(), 2, "{bad:?}");
        }
    }

    #[test]
    fn written_sample_loads_back() {
        let points = generate_sample(&SampleConfig {
            count: 20,
            ..SampleConfig::default()
        })
        .unwrap();
        let path = std::env::temp_dir().join(format!("fcal-{}-sample.csv", std::process::id()));
        write_sample_csv(&path, &points).unwrap();

        let data = load_dataset(&path, &ColumnRef::Name("raw".into()), &ColumnRef::Name("force".into())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(data.points.len(), 20);
        assert!(data.row_errors.is_empty());
        for (loaded, original) in data.points.iter().zip(&points) {
            assert_eq!(loaded.x, original.x);
            assert!((loaded.y - original.y).abs() < 1e-6);
        }
    }
}
