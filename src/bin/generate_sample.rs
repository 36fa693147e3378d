use anyhow::{Context, Result};

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

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

const ROWS: usize = 500;

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let regions = ["North", "South", "East", "West"];
    let products = ["Widget", "Gadget", "Gizmo", "Doohickey", "Thingamajig"];
    let channels = ["Online", "Retail", "Partner"];
    // Base unit price per product, same order as `products`
    let prices = [12.5, 40.0, 7.25, 99.0, 23.0];

    let output_path = "sample_sales.csv";
    let mut writer = csv::Writer::from_path(output_path).context("creating output file")?;
    writer
        .write_record(["region", "product", "channel", "revenue", "units", "discount", "order_id"])
        .context("writing header")?;

    for order_id in 1..=ROWS {
        let region = rng.pick(&regions);
        let product_idx = (rng.next_u64() % products.len() as u64) as usize;
        let channel = rng.pick(&channels);
        let units = 1 + (rng.next_u64() % 20);
        let discount = (rng.next_f64() * 0.3 * 100.0).round() / 100.0;
        let revenue = units as f64 * prices[product_idx] * (1.0 - discount);

        writer
            .write_record([
                region.to_string(),
                products[product_idx].to_string(),
                channel.to_string(),
                format!("{revenue:.2}"),
                units.to_string(),
                format!("{discount:.2}"),
                order_id.to_string(),
            ])
            .with_context(|| format!("writing order {order_id}"))?;
    }
    writer.flush().context("flushing output file")?;

    println!("Wrote {ROWS} orders to {output_path}");
    Ok(())
}
