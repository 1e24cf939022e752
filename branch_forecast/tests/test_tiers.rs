use branch_forecast::data::BranchSeries;
use branch_forecast::error::{ForecastError, Result};
use branch_forecast::events::BranchOverlay;
use branch_forecast::tiers::{
    AverageTier, ForecastTier, RegressionTier, SmoothingTier, TierCapabilities, TierUsed,
    TieredForecaster,
};
use chrono::{Days, NaiveDate};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn day(n: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap() + Days::new(n)
}

fn create_series(values: &[f64]) -> BranchSeries {
    let points: Vec<(NaiveDate, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| (day(i as u64), v))
        .collect();
    BranchSeries::from_points("A", &points).unwrap()
}

#[derive(Debug)]
struct FailingTier;

impl ForecastTier for FailingTier {
    fn tier(&self) -> TierUsed {
        TierUsed::Regression
    }

    fn min_points(&self) -> usize {
        1
    }

    fn predict(&self, _: &BranchSeries, _: Option<&BranchOverlay>, _: NaiveDate) -> Result<f64> {
        Err(ForecastError::ForecastingError("always fails".to_string()))
    }
}

#[derive(Debug)]
struct PanickingTier;

impl ForecastTier for PanickingTier {
    fn tier(&self) -> TierUsed {
        TierUsed::Regression
    }

    fn min_points(&self) -> usize {
        1
    }

    fn predict(&self, _: &BranchSeries, _: Option<&BranchOverlay>, _: NaiveDate) -> Result<f64> {
        panic!("tier blew up");
    }
}

#[derive(Debug)]
struct NanTier;

impl ForecastTier for NanTier {
    fn tier(&self) -> TierUsed {
        TierUsed::Smoothing
    }

    fn min_points(&self) -> usize {
        1
    }

    fn predict(&self, _: &BranchSeries, _: Option<&BranchOverlay>, _: NaiveDate) -> Result<f64> {
        Ok(f64::NAN)
    }
}

#[test]
fn test_scenario_a_flat_history() {
    let forecaster = TieredForecaster::from_capabilities(TierCapabilities::average_only(), None);
    let training = create_series(&[10.0; 7]);

    let prediction = forecaster.predict(&training, None, day(7));
    assert_eq!(prediction.value, 10.0);
    assert_eq!(prediction.tier, TierUsed::Average);
    assert_eq!(prediction.branch, "A");
    assert_eq!(prediction.date, day(7));
}

#[test]
fn test_scenario_b_trailing_seven() {
    let forecaster = TieredForecaster::from_capabilities(TierCapabilities::average_only(), None);
    let training = create_series(&[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 20.0]);

    let prediction = forecaster.predict(&training, None, day(8));
    assert_eq!(prediction.value, 11.43);
    assert_eq!(prediction.tier, TierUsed::Average);
}

#[rstest]
#[case(TierCapabilities::all())]
#[case(TierCapabilities::average_only())]
fn test_empty_training_is_zero(#[case] capabilities: TierCapabilities) {
    let forecaster = TieredForecaster::from_capabilities(capabilities, None);
    let prediction = forecaster.predict(&create_series(&[]), None, day(0));

    assert_eq!(prediction.value, 0.0);
    assert_eq!(prediction.tier, TierUsed::None);
}

#[test]
fn test_short_history_skips_model_tiers() {
    let forecaster = TieredForecaster::default();
    let prediction = forecaster.predict(&create_series(&[4.0, 6.0]), None, day(2));

    assert_eq!(prediction.tier, TierUsed::Average);
    assert_eq!(prediction.value, 5.0);
}

#[test]
fn test_full_chain_prefers_regression() {
    let forecaster = TieredForecaster::default();
    let training = create_series(&[10.0, 11.0, 12.0, 13.0, 14.0]);

    let prediction = forecaster.predict(&training, None, day(5));
    assert_eq!(prediction.tier, TierUsed::Regression);
    assert!((prediction.value - 15.0).abs() < 0.1, "value={}", prediction.value);
}

#[test]
fn test_failing_tier_falls_through() {
    let forecaster = TieredForecaster::with_tiers(vec![
        Box::new(FailingTier),
        Box::new(AverageTier::default()),
    ]);

    let prediction = forecaster.predict(&create_series(&[2.0, 4.0]), None, day(2));
    assert_eq!(prediction.tier, TierUsed::Average);
    assert_eq!(prediction.value, 3.0);
}

#[test]
fn test_panicking_tier_is_contained() {
    let forecaster = TieredForecaster::with_tiers(vec![
        Box::new(PanickingTier),
        Box::new(NanTier),
        Box::new(AverageTier::default()),
    ]);

    let prediction = forecaster.predict(&create_series(&[2.0, 4.0]), None, day(2));
    assert_eq!(prediction.tier, TierUsed::Average);
    assert_eq!(prediction.value, 3.0);
}

#[test]
fn test_exhausted_chain_is_zero() {
    let forecaster = TieredForecaster::with_tiers(vec![Box::new(FailingTier)]);
    let prediction = forecaster.predict(&create_series(&[2.0, 4.0]), None, day(2));

    assert_eq!(prediction.tier, TierUsed::None);
    assert_eq!(prediction.value, 0.0);
}

#[test]
fn test_tier_order_follows_capabilities() {
    let all = TieredForecaster::from_capabilities(TierCapabilities::all(), None);
    assert_eq!(
        all.tier_order(),
        vec![TierUsed::Regression, TierUsed::Smoothing, TierUsed::Average]
    );

    let no_regression = TieredForecaster::from_capabilities(
        TierCapabilities {
            regression: false,
            smoothing: true,
        },
        None,
    );
    assert_eq!(
        no_regression.tier_order(),
        vec![TierUsed::Smoothing, TierUsed::Average]
    );
}

#[test]
fn test_smoothing_tier_extrapolates_gap() {
    let tier = SmoothingTier::new(None);
    let training = create_series(&[10.0, 12.0, 14.0, 16.0]);

    // Three days past the last observation
    let value = tier.predict(&training, None, day(6)).unwrap();
    assert!((value - 22.0).abs() < 1e-6, "value={}", value);
    assert_eq!(tier.min_points(), 3);
}

#[test]
fn test_regression_tier_requires_data() {
    let tier = RegressionTier::new(None);
    assert!(tier.predict(&create_series(&[]), None, day(0)).is_err());
    assert_eq!(tier.tier(), TierUsed::Regression);
}

#[test]
fn test_average_tier_window() {
    assert!(AverageTier::new(0).is_err());
    let tier = AverageTier::new(2).unwrap();
    let value = tier.predict(&create_series(&[1.0, 2.0, 4.0]), None, day(3)).unwrap();
    assert_eq!(value, 3.0);
    assert_eq!(TierUsed::None.to_string(), "none");
}
