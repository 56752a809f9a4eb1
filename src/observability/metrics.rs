use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_created_total: IntCounter,
    pub order_transitions_total: IntCounterVec,
    pub acceptances_total: IntCounterVec,
    pub dispatch_latency_seconds: HistogramVec,
    pub pending_orders: IntGauge,
    pub tracking_drivers: IntGauge,
    pub stale_location_reports_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let orders_created_total =
            IntCounter::new("orders_created_total", "Total orders submitted")?;

        let order_transitions_total = IntCounterVec::new(
            Opts::new(
                "order_transitions_total",
                "Order status transitions by target status",
            ),
            &["to"],
        )?;

        let acceptances_total = IntCounterVec::new(
            Opts::new("acceptances_total", "Order acceptance attempts by outcome"),
            &["outcome"],
        )?;

        let dispatch_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "dispatch_latency_seconds",
                "Latency of dispatch operations in seconds",
            ),
            &["operation"],
        )?;

        let pending_orders = IntGauge::new("pending_orders", "Orders waiting for a driver")?;

        let tracking_drivers =
            IntGauge::new("tracking_drivers", "Drivers currently reporting a position")?;

        let stale_location_reports_total = IntCounter::new(
            "stale_location_reports_total",
            "Location reports ignored because a newer one was already applied",
        )?;

        registry.register(Box::new(orders_created_total.clone()))?;
        registry.register(Box::new(order_transitions_total.clone()))?;
        registry.register(Box::new(acceptances_total.clone()))?;
        registry.register(Box::new(dispatch_latency_seconds.clone()))?;
        registry.register(Box::new(pending_orders.clone()))?;
        registry.register(Box::new(tracking_drivers.clone()))?;
        registry.register(Box::new(stale_location_reports_total.clone()))?;

        Ok(Self {
            registry,
            orders_created_total,
            order_transitions_total,
            acceptances_total,
            dispatch_latency_seconds,
            pending_orders,
            tracking_drivers,
            stale_location_reports_total,
        })
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
