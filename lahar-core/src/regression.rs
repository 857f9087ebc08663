//! Volume -> area regressions with confidence bounds.
//!
//! Both the cross-sectional and planimetric area budgets are derived from a
//! fixed-exponent power law `A = k * V^(2/3)`, fit in log-log space against
//! a small table of calibration events. The confidence bounds come from the
//! usual prediction-interval construction for simple linear regression,
//! using a Student's-t critical value at `n - 2` degrees of freedom.
//!
//! The calibration tables below (`FILLS_CROSS`, `FILLS_PLAN`) are
//! illustrative stand-ins: the published LAHARZ calibration dataset this
//! model is normally fit against was not available to build this crate
//! against (see DESIGN.md). They reproduce the right power-law shape and
//! scatter, not the exact historical figures.

use crate::error::{LaharError, Result};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// log-power-law coefficient for the cross-sectional area regression
/// (`A_cross = 0.05 * V^(2/3)`).
const CROSS_COEFF: f64 = 0.05;
/// log-power-law coefficient for the planimetric area regression
/// (`A_plan = 200 * V^(2/3)`).
const PLAN_COEFF: f64 = 200.0;
/// fixed regression exponent on log10(volume).
const EXPONENT: f64 = 2.0 / 3.0;

/// Confidence levels the calibration supports, as whole or half percentage
/// points. Each maps to a one-tailed tail probability `(1 - c/100) / 2`.
const SUPPORTED_CONFIDENCE: [f64; 7] = [50.0, 70.0, 80.0, 90.0, 95.0, 97.5, 99.0];

/// calibration events as (site label, volume m^3, area m^2) for the
/// cross-sectional regression.
const FILLS_CROSS: [(&str, f64, f64); 9] = [
    ("site_1", 1.0e5, 99.1),
    ("site_2", 3.0e5, 242.0),
    ("site_3", 1.0e6, 440.0),
    ("site_4", 3.0e6, 1164.9),
    ("site_5", 1.0e7, 2251.2),
    ("site_6", 3.0e7, 5069.9),
    ("site_7", 1.0e8, 9694.9),
    ("site_8", 3.0e8, 24647.7),
    ("site_9", 1.0e9, 50000.0),
];

/// calibration events as (site label, volume m^3, area m^2) for the
/// planimetric regression.
const FILLS_PLAN: [(&str, f64, f64); 9] = [
    ("site_1", 1.0e5, 452430.3),
    ("site_2", 3.0e5, 833540.4),
    ("site_3", 1.0e6, 2_200_000.0),
    ("site_4", 3.0e6, 3_744_180.0),
    ("site_5", 1.0e7, 9_933_024.0),
    ("site_6", 3.0e7, 18_344_500.0),
    ("site_7", 1.0e8, 48_259_232.0),
    ("site_8", 3.0e8, 78_872_640.0),
    ("site_9", 1.0e9, 204_000_000.0),
];

/// A central estimate plus upper/lower prediction bounds for one area
/// budget at one confidence level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaEstimate {
    pub central: f64,
    pub upper: f64,
    pub lower: f64,
}

/// Cross-sectional area estimate for a volume at a confidence level.
pub fn cross_section_area(volume: f64, confidence: f64) -> Result<AreaEstimate> {
    regress(&FILLS_CROSS, volume, confidence, CROSS_COEFF)
}

/// Planimetric area estimate for a volume at a confidence level.
pub fn planimetric_area(volume: f64, confidence: f64) -> Result<AreaEstimate> {
    regress(&FILLS_PLAN, volume, confidence, PLAN_COEFF)
}

fn regress(fills: &[(&str, f64, f64); 9], volume: f64, confidence: f64, coeff: f64) -> Result<AreaEstimate> {
    if !SUPPORTED_CONFIDENCE.contains(&confidence) {
        return Err(LaharError::InvalidConfig(format!(
            "unsupported confidence level: {}",
            confidence
        )));
    }

    let n = fills.len() as f64;

    let log_vols: Vec<f64> = fills.iter().map(|(_, v, _)| v.log10()).collect();
    let log_areas: Vec<f64> = fills.iter().map(|(_, _, a)| a.log10()).collect();

    let intercept = coeff.log10();
    let residual_sq_sum: f64 = log_vols
        .iter()
        .zip(log_areas.iter())
        .map(|(lv, la)| {
            let predicted = EXPONENT * lv + intercept;
            (la - predicted).powi(2)
        })
        .sum();
    let se = (residual_sq_sum / (n - 1.0)).sqrt();

    let mean_log_v = log_vols.iter().sum::<f64>() / n;
    let s_xx: f64 = log_vols.iter().map(|lv| (lv - mean_log_v).powi(2)).sum();

    let log_v = volume.log10();
    let se_mean = se * (1.0 / n + (log_v - mean_log_v).powi(2) / s_xx).sqrt();
    let se_pred = (se.powi(2) + se_mean.powi(2)).sqrt();

    let central = (volume.powf(EXPONENT) * coeff).round();
    let log_central = central.log10();

    let df = fills.len() as u32 - 2;
    let t = t_critical(df, confidence)?;

    let upper = 10f64.powf(log_central + t * se_pred);
    let lower = 10f64.powf(log_central - t * se_pred);

    Ok(AreaEstimate {
        central,
        upper,
        lower,
    })
}

/// Two-tailed Student's-t critical value at `df` degrees of freedom for a
/// given confidence level (e.g. 95.0 means the central 95% interval, i.e.
/// the one-tailed tail probability 0.025).
pub fn t_critical(df: u32, confidence: f64) -> Result<f64> {
    if !SUPPORTED_CONFIDENCE.contains(&confidence) {
        return Err(LaharError::InvalidConfig(format!(
            "unsupported confidence level: {}",
            confidence
        )));
    }
    let alpha = (1.0 - confidence / 100.0) / 2.0;
    let dist = StudentsT::new(0.0, 1.0, df as f64).map_err(|e| {
        LaharError::InvalidConfig(format!("degenerate t-distribution (df={}): {}", df, e))
    })?;
    Ok(dist.inverse_cdf(1.0 - alpha))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn central_cross_area_matches_power_law() {
        // V = 1000, c = 95: A_x_center = round(1000^(2/3) * 0.05) = 5
        let est = cross_section_area(1000.0, 95.0).unwrap();
        assert_eq!(est.central, 5.0);
    }

    #[test]
    fn central_planimetric_area_matches_power_law() {
        // V = 1000, c = 95: A_p_center = round(1000^(2/3) * 200) = 20000
        let est = planimetric_area(1000.0, 95.0).unwrap();
        assert_eq!(est.central, 20000.0);
    }

    #[test]
    fn bounds_bracket_the_central_estimate() {
        let est = cross_section_area(5_000_000.0, 90.0).unwrap();
        assert!(est.lower <= est.central);
        assert!(est.central <= est.upper);
    }

    #[test]
    fn unsupported_confidence_is_rejected() {
        assert!(cross_section_area(1000.0, 42.0).is_err());
    }

    #[test]
    fn higher_confidence_widens_the_interval() {
        let narrow = cross_section_area(1_000_000.0, 50.0).unwrap();
        let wide = cross_section_area(1_000_000.0, 99.0).unwrap();
        assert!(wide.upper - wide.lower > narrow.upper - narrow.lower);
    }
}
