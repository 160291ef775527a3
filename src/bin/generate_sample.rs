use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// One output row, in the column order of the real dataset.
#[derive(Serialize)]
struct Row {
    price: u32,
    model_year: Option<String>,
    model: &'static str,
    condition: &'static str,
    cylinders: Option<u8>,
    fuel: &'static str,
    odometer: Option<String>,
    transmission: &'static str,
    #[serde(rename = "type")]
    vehicle_type: &'static str,
    paint_color: Option<&'static str>,
    is_4wd: Option<f32>,
    date_posted: String,
    days_listed: u16,
}

/// (model, type, base price, cylinders)
const MODELS: &[(&str, &str, f64, u8)] = &[
    ("ford f-150", "pickup", 22000.0, 8),
    ("chevrolet silverado", "truck", 24000.0, 8),
    ("toyota camry", "sedan", 14000.0, 4),
    ("honda civic", "sedan", 12000.0, 4),
    ("jeep wrangler", "SUV", 21000.0, 6),
    ("subaru outback", "wagon", 15000.0, 4),
    ("ford mustang", "coupe", 18000.0, 8),
    ("honda odyssey", "mini-van", 13000.0, 6),
    ("nissan frontier", "pickup", 16000.0, 6),
    ("toyota highlander", "SUV", 19000.0, 6),
];

const CONDITIONS: &[(&str, f64)] = &[
    ("new", 1.3),
    ("like new", 1.15),
    ("excellent", 1.0),
    ("good", 0.85),
    ("fair", 0.6),
    ("salvage", 0.35),
];

const COLORS: &[&str] = &["white", "black", "silver", "grey", "blue", "red", "green"];

/// Unparsable cells written now and then so readers see them degrade to null.
const BAD_YEARS: &[&str] = &["abc", "unknown", "20l2"];
const BAD_ODOMETERS: &[&str] = &["lots", "n/a", "100k"];
const BAD_DATES: &[&str] = &["not a date", "2018-13-45", "yesterday"];

/// `Some(clean)` most of the time, sometimes blank, sometimes garbage.
fn messy(rng: &mut SimpleRng, clean: String, blank: f64, bad: &[&str]) -> Option<String> {
    if rng.chance(blank) {
        None
    } else if rng.chance(0.01) {
        Some(rng.pick(bad).to_string())
    } else {
        Some(clean)
    }
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let output_path = "vehicles_us.csv";
    let n_rows = 2000;

    let first_day = NaiveDate::from_ymd_opt(2018, 5, 1).context("invalid start date")?;
    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;

    for _ in 0..n_rows {
        let &(model, vehicle_type, base_price, cylinders) = rng.pick(MODELS);
        let &(condition, condition_factor) = rng.pick(CONDITIONS);

        let year = 1995 + (rng.next_u64() % 25) as u16;
        let age = f64::from(2019 - year);
        let odometer = (age * 12000.0 + rng.gauss(0.0, 15000.0)).max(0.0);
        let price = (base_price * condition_factor * 0.92_f64.powf(age)
            + rng.gauss(0.0, 1500.0))
        .max(500.0);

        let is_4wd = matches!(vehicle_type, "pickup" | "truck" | "SUV") && rng.chance(0.7);
        let posted = first_day + Duration::days((rng.next_u64() % 365) as i64);

        // Gaps the real dataset also has, plus a few unparsable cells.
        let model_year = messy(&mut rng, year.to_string(), 0.07, BAD_YEARS);
        let odometer = messy(&mut rng, format!("{odometer:.0}"), 0.15, BAD_ODOMETERS);
        let date_posted = messy(&mut rng, posted.format("%Y-%m-%d").to_string(), 0.0, BAD_DATES)
            .unwrap_or_default();
        let row = Row {
            price: price.round() as u32,
            model_year,
            model,
            condition,
            cylinders: (!rng.chance(0.1)).then_some(cylinders),
            fuel: if rng.chance(0.08) { "diesel" } else { "gas" },
            odometer,
            transmission: if rng.chance(0.9) { "automatic" } else { "manual" },
            vehicle_type,
            paint_color: (!rng.chance(0.18)).then(|| *rng.pick(COLORS)),
            is_4wd: is_4wd.then_some(1.0),
            date_posted,
            days_listed: (rng.next_u64() % 120) as u16,
        };
        writer
            .serialize(&row)
            .with_context(|| format!("writing {output_path}"))?;
    }
    writer.flush().with_context(|| format!("flushing {output_path}"))?;

    println!("Wrote {n_rows} listings to {output_path}");
    Ok(())
}
