use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub trips_created_total: IntCounter,
    pub trip_transitions_total: IntCounterVec,
    pub nearby_queries_total: IntCounter,
    pub nearby_candidates: Histogram,
    pub promotion_discounts_total: IntCounterVec,
    pub ratings_total: IntCounterVec,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let trips_created_total = IntCounter::new("trips_created_total", "Trips created")
            .expect("valid trips_created_total metric");

        let trip_transitions_total = IntCounterVec::new(
            Opts::new(
                "trip_transitions_total",
                "Trip status transitions by target status and outcome",
            ),
            &["to", "outcome"],
        )
        .expect("valid trip_transitions_total metric");

        let nearby_queries_total =
            IntCounter::new("nearby_queries_total", "Nearby-rider queries served")
                .expect("valid nearby_queries_total metric");

        let nearby_candidates = Histogram::with_opts(
            HistogramOpts::new(
                "nearby_candidates",
                "Riders returned per nearby-rider query",
            )
            .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0]),
        )
        .expect("valid nearby_candidates metric");

        let promotion_discounts_total = IntCounterVec::new(
            Opts::new(
                "promotion_discounts_total",
                "Promotion discount requests by outcome",
            ),
            &["outcome"],
        )
        .expect("valid promotion_discounts_total metric");

        let ratings_total = IntCounterVec::new(
            Opts::new("ratings_total", "Trip rating submissions by outcome"),
            &["outcome"],
        )
        .expect("valid ratings_total metric");

        registry
            .register(Box::new(trips_created_total.clone()))
            .expect("register trips_created_total");
        registry
            .register(Box::new(trip_transitions_total.clone()))
            .expect("register trip_transitions_total");
        registry
            .register(Box::new(nearby_queries_total.clone()))
            .expect("register nearby_queries_total");
        registry
            .register(Box::new(nearby_candidates.clone()))
            .expect("register nearby_candidates");
        registry
            .register(Box::new(promotion_discounts_total.clone()))
            .expect("register promotion_discounts_total");
        registry
            .register(Box::new(ratings_total.clone()))
            .expect("register ratings_total");

        Self {
            registry,
            trips_created_total,
            trip_transitions_total,
            nearby_queries_total,
            nearby_candidates,
            promotion_discounts_total,
            ratings_total,
        }
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
