/// Building load minus scaled on-site PV production.
///
/// `net[i] = demand[i] - pv_size * pv[i]`. Negative values are net export
/// and are passed through unchanged. The output is as long as the shorter
/// input; [`super::HourlySeries`] guarantees they match.
pub fn net_demand(demand: &[f64], pv: &[f64], pv_size: f64) -> Vec<f64> {
    demand
        .iter()
        .zip(pv)
        .map(|(&d, &p)| d - pv_size * p)
        .collect()
}
