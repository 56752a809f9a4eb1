use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use crate::config::Config;
use crate::engine::pricing::FeePolicy;
use crate::error::AppError;
use crate::models::event::{DispatchEvent, DispatchEventKind};
use crate::observability::metrics::Metrics;
use crate::services::distance::DistanceOracle;
use crate::services::fare::{FareEstimator, RuleBasedFareEstimator};
use crate::services::geocoder::ReverseGeocoder;
use crate::services::places::KnownPlaces;
use crate::store::drivers::DriverRegistry;
use crate::store::orders::OrderStore;

const DEFAULT_NEARBY_RADIUS_KM: f64 = 10.0;

pub struct AppState {
    pub orders: OrderStore,
    pub drivers: DriverRegistry,
    pub events_tx: broadcast::Sender<DispatchEvent>,
    pub metrics: Metrics,
    pub fee_policy: FeePolicy,
    pub nearby_radius_km: f64,
    pub fare_estimator: Arc<dyn FareEstimator>,
    pub distance_oracle: Arc<dyn DistanceOracle>,
    pub geocoder: Arc<dyn ReverseGeocoder>,
}

impl AppState {
    pub fn new(event_buffer_size: usize) -> Result<Self, AppError> {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);
        let metrics = Metrics::new()
            .map_err(|err| AppError::Internal(format!("metrics registry: {err}")))?;
        let places = Arc::new(KnownPlaces::default());

        Ok(Self {
            orders: OrderStore::new(),
            drivers: DriverRegistry::new(),
            events_tx,
            metrics,
            fee_policy: FeePolicy::promotion(),
            nearby_radius_km: DEFAULT_NEARBY_RADIUS_KM,
            fare_estimator: Arc::new(RuleBasedFareEstimator),
            distance_oracle: places.clone(),
            geocoder: places,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let mut state = Self::new(config.event_buffer_size)?
            .with_fee_policy(FeePolicy::percent(config.platform_fee_percent))
            .with_nearby_radius_km(config.nearby_radius_km);

        if let Some(path) = &config.places_file {
            let places = KnownPlaces::from_json_file(path)
                .map_err(|err| AppError::Internal(format!("places file: {err}")))?;
            info!(places = places.len(), path = %path.display(), "loaded known places");
            state = state.with_places(places);
        }

        Ok(state)
    }

    pub fn with_fee_policy(mut self, fee_policy: FeePolicy) -> Self {
        self.fee_policy = fee_policy;
        self
    }

    pub fn with_nearby_radius_km(mut self, radius_km: f64) -> Self {
        self.nearby_radius_km = radius_km;
        self
    }

    pub fn with_fare_estimator(mut self, estimator: Arc<dyn FareEstimator>) -> Self {
        self.fare_estimator = estimator;
        self
    }

    pub fn with_places(mut self, places: KnownPlaces) -> Self {
        let places = Arc::new(places);
        self.distance_oracle = places.clone();
        self.geocoder = places;
        self
    }

    pub fn with_distance_oracle(mut self, oracle: Arc<dyn DistanceOracle>) -> Self {
        self.distance_oracle = oracle;
        self
    }

    /// Fire-and-forget: having no live subscribers is not an error.
    pub fn publish(&self, kind: DispatchEventKind) {
        let _ = self.events_tx.send(DispatchEvent::new(kind));
    }
}
