use serde::Serialize;
use tracing::{debug, warn};

use crate::models::vehicle::VehicleType;
use crate::services::fare::FareEstimator;

/// Platform fee charged on top of the driver's share, as a percentage of the
/// order price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePolicy {
    percent: u8,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self::promotion()
    }
}

impl FeePolicy {
    /// Zero-fee promotion.
    pub fn promotion() -> Self {
        Self { percent: 0 }
    }

    pub fn percent(percent: u8) -> Self {
        Self {
            percent: percent.min(100),
        }
    }

    /// Fee for `price`, rounded down. Negative prices carry no fee and are
    /// left for order validation to reject.
    pub fn fee_for(&self, price: i64) -> i64 {
        if price <= 0 {
            return 0;
        }
        price.saturating_mul(i64::from(self.percent)) / 100
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FareQuote {
    pub price: u64,
    /// False when the estimator gave nothing usable and `price` is the
    /// previously known one.
    pub estimated: bool,
}

/// Asks the estimator for a fresh fare. A failed, missing or zero estimate
/// never replaces the previous price.
pub async fn refresh_fare(
    estimator: &dyn FareEstimator,
    origin: &str,
    destination: &str,
    vehicle: VehicleType,
    previous: u64,
) -> FareQuote {
    match estimator.estimate(origin, destination, vehicle).await {
        Ok(price) if price > 0 => FareQuote {
            price,
            estimated: true,
        },
        Ok(_) => {
            debug!(%vehicle, "fare estimator returned zero; keeping previous price");
            FareQuote {
                price: previous,
                estimated: false,
            }
        }
        Err(err) => {
            warn!(error = %err, %vehicle, "fare estimation failed; keeping previous price");
            FareQuote {
                price: previous,
                estimated: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::services::fare::RuleBasedFareEstimator;
    use crate::services::ServiceError;

    struct Fixed(Result<u64, ServiceError>);

    #[async_trait]
    impl FareEstimator for Fixed {
        async fn estimate(
            &self,
            _origin: &str,
            _destination: &str,
            _vehicle: VehicleType,
        ) -> Result<u64, ServiceError> {
            self.0.clone()
        }
    }

    #[test]
    fn promotion_charges_nothing() {
        assert_eq!(FeePolicy::promotion().fee_for(35_000), 0);
    }

    #[test]
    fn percentage_fee_rounds_down() {
        let policy = FeePolicy::percent(10);
        assert_eq!(policy.fee_for(8_005), 800);
        assert_eq!(policy.fee_for(-100), 0);
        assert_eq!(FeePolicy::percent(250).fee_for(100), 100);
    }

    #[tokio::test]
    async fn estimate_replaces_previous_price() {
        let quote = refresh_fare(
            &RuleBasedFareEstimator,
            "Gangnam",
            "Pangyo",
            VehicleType::Labo,
            8_000,
        )
        .await;
        assert_eq!(
            quote,
            FareQuote {
                price: 35_000,
                estimated: true
            }
        );
    }

    #[tokio::test]
    async fn failure_or_zero_keeps_previous_price() {
        for estimator in [
            Fixed(Err(ServiceError::Unavailable("down".to_string()))),
            Fixed(Ok(0)),
        ] {
            let quote =
                refresh_fare(&estimator, "Gangnam", "Pangyo", VehicleType::Labo, 42_000).await;
            assert_eq!(
                quote,
                FareQuote {
                    price: 42_000,
                    estimated: false
                }
            );
        }
    }
}
