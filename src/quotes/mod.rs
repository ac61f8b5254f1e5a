//! Simulated quote comparison. Each abstract provider has fixed
//! characteristics (price multiplier, variance band, delivery and reliability
//! ranges, response latency); quotes for a request fan out to all providers
//! concurrently and resolve only once every provider has answered.

use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::time::{sleep, Duration};
use tracing::{debug, info};

use crate::database_ops::catalog::QuoteRow;
use crate::database_ops::db::Db;

#[derive(Debug, Clone, Copy)]
pub struct ProviderProfile {
    pub name: &'static str,
    pub multiplier: f64,
    pub variance: f64,
    pub delivery_days: (u32, u32),
    pub reliability: (f64, f64),
    pub latency_ms: (u64, u64),
}

/// Fixed provider characteristics the comparison is modeled on: one cheap but
/// loose, one baseline, one premium and dependable.
pub const PROVIDERS: [ProviderProfile; 3] = [
    ProviderProfile {
        name: "provider-a",
        multiplier: 0.95,
        variance: 0.15,
        delivery_days: (3, 7),
        reliability: (85.0, 95.0),
        latency_ms: (500, 1500),
    },
    ProviderProfile {
        name: "provider-b",
        multiplier: 1.0,
        variance: 0.20,
        delivery_days: (5, 10),
        reliability: (75.0, 90.0),
        latency_ms: (1000, 2500),
    },
    ProviderProfile {
        name: "provider-c",
        multiplier: 1.05,
        variance: 0.10,
        delivery_days: (7, 14),
        reliability: (90.0, 99.0),
        latency_ms: (800, 3000),
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderQuote {
    pub provider_name: String,
    pub price: f64,
    pub delivery_days: i64,
    pub reliability_score: f64,
    pub response_time_ms: i64,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// One provider's sample. Pure given the RNG, so a pinned seed produces exact,
/// assertable output.
pub fn sample_quote(
    profile: &ProviderProfile,
    quantity: f64,
    base_price: f64,
    rng: &mut impl Rng,
) -> ProviderQuote {
    let latency_ms = rng.gen_range(profile.latency_ms.0..=profile.latency_ms.1);
    let variation = rng.gen_range(-profile.variance..=profile.variance);
    let price = base_price * profile.multiplier * (1.0 + variation) * quantity;
    let delivery = rng.gen_range(f64::from(profile.delivery_days.0)..=f64::from(profile.delivery_days.1));
    let reliability = rng.gen_range(profile.reliability.0..=profile.reliability.1);

    ProviderQuote {
        provider_name: profile.name.to_string(),
        price: round2(price),
        delivery_days: delivery.round() as i64,
        reliability_score: round2(reliability),
        response_time_ms: latency_ms as i64,
    }
}

pub struct QuoteSimulator {
    profiles: Vec<ProviderProfile>,
    seed: Option<u64>,
}

impl Default for QuoteSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteSimulator {
    pub fn new() -> Self {
        Self {
            profiles: PROVIDERS.to_vec(),
            seed: None,
        }
    }

    /// Deterministic sampling: every provider derives its RNG from this seed,
    /// so repeated runs produce identical quotes.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            profiles: PROVIDERS.to_vec(),
            seed: Some(seed),
        }
    }

    /// One quote per configured provider, queried concurrently. The call
    /// resolves only when all providers have answered: no partial results and
    /// no per-provider timeout (a known gap carried over from the modeled
    /// behavior).
    pub async fn get_quotes(
        &self,
        product_id: &str,
        quantity: f64,
        base_price: f64,
    ) -> Vec<ProviderQuote> {
        debug!(product_id, quantity, base_price, "fanning out provider quotes");
        let tasks = self.profiles.iter().enumerate().map(|(i, profile)| {
            let profile = *profile;
            let seed = self.seed;
            async move {
                let mut rng = match seed {
                    Some(s) => StdRng::seed_from_u64(s.wrapping_add(i as u64)),
                    None => StdRng::from_entropy(),
                };
                let quote = sample_quote(&profile, quantity, base_price, &mut rng);
                // Model the provider's response latency.
                sleep(Duration::from_millis(quote.response_time_ms as u64)).await;
                quote
            }
        });
        join_all(tasks).await
    }
}

/// Create a product request and persist one quote row per provider. Base price
/// comes from the stored product (0 when it has none, matching the admin
/// flow's behavior for unpriced products).
pub async fn request_quotes(
    db: &Db,
    simulator: &QuoteSimulator,
    product_id: &str,
    quantity: f64,
    personalization_remarks: Option<&str>,
) -> anyhow::Result<(String, Vec<ProviderQuote>)> {
    let Some((name, price)) = db.product_name_and_price(product_id).await? else {
        anyhow::bail!("product {product_id} not found");
    };
    let base_price = price.unwrap_or(0.0);

    let request_id = db
        .insert_product_request(product_id, &name, quantity, personalization_remarks)
        .await?;
    info!(request_id = %request_id, product_id, "fetching provider quotes");

    let quotes = simulator.get_quotes(product_id, quantity, base_price).await;
    let rows: Vec<QuoteRow> = quotes
        .iter()
        .map(|q| QuoteRow {
            provider_name: q.provider_name.clone(),
            price: q.price,
            delivery_days: q.delivery_days,
            reliability_score: q.reliability_score,
            response_time_ms: q.response_time_ms,
        })
        .collect();
    db.insert_provider_quotes(&request_id, &rows).await?;
    info!(request_id = %request_id, count = quotes.len(), "stored provider quotes");

    Ok((request_id, quotes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_inside_the_configured_bands() {
        // provider-b: multiplier 1.0, variance 0.20. For base 10 / qty 1 every
        // sampled price must land in [8.0, 12.0].
        let profile = PROVIDERS[1];
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let quote = sample_quote(&profile, 1.0, 10.0, &mut rng);
            assert!(
                (8.0..=12.0).contains(&quote.price),
                "price out of band: {}",
                quote.price
            );
            assert!(
                (75.0..=90.0).contains(&quote.reliability_score),
                "reliability out of band: {}",
                quote.reliability_score
            );
            assert!((5..=10).contains(&quote.delivery_days));
            assert!((1000..=2500).contains(&quote.response_time_ms));
        }
    }

    #[test]
    fn quantity_scales_the_price() {
        let profile = PROVIDERS[1];
        let mut rng = StdRng::seed_from_u64(7);
        let quote = sample_quote(&profile, 50.0, 10.0, &mut rng);
        assert!((400.0..=600.0).contains(&quote.price));
    }

    #[test]
    fn prices_are_rounded_to_two_decimals() {
        let profile = PROVIDERS[0];
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let quote = sample_quote(&profile, 3.0, 9.99, &mut rng);
            let cents = quote.price * 100.0;
            assert!((cents - cents.round()).abs() < 1e-9);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn all_providers_answer_in_configuration_order() {
        let quotes = QuoteSimulator::with_seed(11)
            .get_quotes("prod-1", 2.0, 15.0)
            .await;
        let names: Vec<_> = quotes.iter().map(|q| q.provider_name.as_str()).collect();
        assert_eq!(names, ["provider-a", "provider-b", "provider-c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn seeded_runs_are_reproducible() {
        let first = QuoteSimulator::with_seed(99)
            .get_quotes("prod-1", 5.0, 20.0)
            .await;
        let second = QuoteSimulator::with_seed(99)
            .get_quotes("prod-1", 5.0, 20.0)
            .await;
        assert_eq!(first, second);

        let different = QuoteSimulator::with_seed(100)
            .get_quotes("prod-1", 5.0, 20.0)
            .await;
        assert_ne!(first, different);
    }

    // Real time here: mixing the paused clock with the pool's acquire timeout
    // is not worth the seconds saved.
    #[tokio::test]
    async fn request_quotes_persists_one_row_per_provider() {
        use crate::database_ops::catalog::{CatalogStore, NewProduct};
        use crate::database_ops::db::Db;

        let db = Db::connect("sqlite::memory:", 1).await.unwrap();
        let stored = db
            .insert_product(&NewProduct {
                source: "midocean".into(),
                name: "Quoted product".into(),
                price: Some(12.5),
                ..NewProduct::default()
            })
            .await
            .unwrap();

        let simulator = QuoteSimulator::with_seed(5);
        let (request_id, quotes) =
            request_quotes(&db, &simulator, &stored.id, 10.0, Some("engrave logo"))
                .await
                .unwrap();
        assert_eq!(quotes.len(), 3);

        let rows = db.quotes_for_request(&request_id).await.unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn unknown_products_cannot_be_quoted() {
        use crate::database_ops::db::Db;
        let db = Db::connect("sqlite::memory:", 1).await.unwrap();
        let err = request_quotes(&db, &QuoteSimulator::with_seed(1), "missing", 1.0, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
