use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

const TS_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// One output line; column names match the dashboard loader.
#[derive(Clone, Serialize)]
struct SampleRow {
    order_id: String,
    order_item_id: u32,
    customer_id: String,
    customer_unique_id: String,
    customer_city: &'static str,
    customer_state: &'static str,
    order_purchase_timestamp: String,
    order_approved_at: Option<String>,
    order_delivered_carrier_date: Option<String>,
    review_answer_timestamp: Option<String>,
    order_purchase_date: String,
    price: String,
    product_category_name_english: Option<&'static str>,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    /// Index into `weights`, chosen proportionally to each weight.
    fn weighted(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        let mut target = self.next_f64() * total;
        for (i, w) in weights.iter().enumerate() {
            if target < *w {
                return i;
            }
            target -= w;
        }
        weights.len() - 1
    }

    fn hex_id(&mut self) -> String {
        format!("{:016x}{:016x}", self.next_u64(), self.next_u64())
    }
}

const LOCATIONS: &[(&str, &str, f64)] = &[
    ("sao paulo", "SP", 15.0),
    ("campinas", "SP", 3.0),
    ("guarulhos", "SP", 2.0),
    ("rio de janeiro", "RJ", 7.0),
    ("niteroi", "RJ", 1.5),
    ("belo horizonte", "MG", 3.0),
    ("curitiba", "PR", 1.5),
    ("porto alegre", "RS", 1.5),
    ("salvador", "BA", 1.2),
    ("brasilia", "DF", 2.0),
    ("goiania", "GO", 0.8),
    ("recife", "PE", 0.7),
    ("fortaleza", "CE", 0.6),
    ("florianopolis", "SC", 0.6),
    ("vitoria", "ES", 0.5),
    ("manaus", "AM", 0.3),
];

const CATEGORIES: &[(&str, f64, f64)] = &[
    ("bed_bath_table", 11.0, 90.0),
    ("health_beauty", 9.5, 130.0),
    ("sports_leisure", 8.5, 110.0),
    ("furniture_decor", 8.0, 85.0),
    ("computers_accessories", 7.5, 115.0),
    ("housewares", 6.5, 90.0),
    ("watches_gifts", 5.5, 200.0),
    ("telephony", 4.0, 70.0),
    ("garden_tools", 4.0, 110.0),
    ("auto", 3.8, 140.0),
    ("toys", 3.6, 115.0),
    ("books_general_interest", 0.5, 50.0),
    ("cds_dvds_musicals", 0.1, 50.0),
    ("security_and_services", 0.05, 140.0),
];

fn main() -> anyhow::Result<()> {
    let mut rng = SimpleRng::new(42);

    let first_day = NaiveDate::from_ymd_opt(2017, 1, 5).unwrap();
    let days = 600;
    let n_customers = 1500;
    let n_orders = 4000;

    // Customers keep one location across all their orders.
    let customers: Vec<(String, usize)> = (0..n_customers)
        .map(|_| {
            let weights: Vec<f64> = LOCATIONS.iter().map(|l| l.2).collect();
            (rng.hex_id(), rng.weighted(&weights))
        })
        .collect();
    let category_weights: Vec<f64> = CATEGORIES.iter().map(|c| c.1).collect();

    let mut rows = Vec::new();
    for _ in 0..n_orders {
        let (customer_unique_id, loc) = &customers[rng.below(n_customers) as usize];
        let (city, state, _) = LOCATIONS[*loc];

        // Order volume grows over the period.
        let day = ((rng.next_f64().sqrt()) * days as f64) as i64;
        let seconds = rng.below(86_400) as i64;
        let purchased: NaiveDateTime = first_day.and_hms_opt(0, 0, 0).unwrap()
            + Duration::days(day)
            + Duration::seconds(seconds);

        let approved = (rng.next_f64() > 0.01)
            .then(|| purchased + Duration::minutes(10 + rng.below(2_000) as i64));
        let shipped = approved.and_then(|a| {
            (rng.next_f64() > 0.02).then(|| a + Duration::hours(24 + rng.below(96) as i64))
        });
        let reviewed = shipped.map(|s| s + Duration::days(7 + rng.below(20) as i64));

        let order_id = rng.hex_id();
        let customer_id = rng.hex_id();
        let items = 1 + (rng.next_f64() < 0.1) as u32 + (rng.next_f64() < 0.03) as u32;
        let cat_idx = rng.weighted(&category_weights);
        let (category, _, mean_price) = CATEGORIES[cat_idx];
        let category = (rng.next_f64() > 0.015).then_some(category);

        for item in 1..=items {
            let price = mean_price * (0.3 + 1.4 * rng.next_f64());
            let row = SampleRow {
                order_id: order_id.clone(),
                order_item_id: item,
                customer_id: customer_id.clone(),
                customer_unique_id: customer_unique_id.clone(),
                customer_city: city,
                customer_state: state,
                order_purchase_timestamp: purchased.format(TS_FMT).to_string(),
                order_approved_at: approved.map(|t| t.format(TS_FMT).to_string()),
                order_delivered_carrier_date: shipped.map(|t| t.format(TS_FMT).to_string()),
                review_answer_timestamp: reviewed.map(|t| t.format(TS_FMT).to_string()),
                order_purchase_date: purchased.format("%Y-%m-%d").to_string(),
                price: format!("{price:.2}"),
                product_category_name_english: category,
            };
            // Joined reviews duplicate some lines, as in the real export.
            if rng.next_f64() < 0.02 {
                rows.push(row.clone());
            }
            rows.push(row);
        }
    }

    let output_path = Path::new("dashboard/main_data.csv");
    if let Some(dir) = output_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let mut writer = csv::Writer::from_path(output_path)?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    println!(
        "Wrote {} order-item rows ({n_orders} orders, {n_customers} customers) to {}",
        rows.len(),
        output_path.display()
    );
    Ok(())
}
