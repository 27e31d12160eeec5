use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, TextEncoder};
use prometheus::{register_int_counter, register_int_counter_vec};

lazy_static! {

    // Committed draws
    pub static ref DRAWS_TOTAL: IntCounterVec =
        register_int_counter_vec!("draws_total", "Number of committed draws", &["tier", "method"]).unwrap();

    pub static ref DRAW_CASCADES: IntCounter =
        register_int_counter!("draw_cascades", "Number of draws served from a lower tier than resolved").unwrap();

    // Failures and degradations
    pub static ref DRAW_FAILURES: IntCounterVec =
        register_int_counter_vec!("draw_failures", "Number of rolled back draws", &["kind"]).unwrap();

    pub static ref PITY_DEGRADED: IntCounter =
        register_int_counter!("pity_degraded", "Number of draws completed with neutral pity values").unwrap();
}

pub fn render() -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
