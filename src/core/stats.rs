//! Normal-approximation order statistics for the implicit neuron population.
//!
//! Neurons that have never fired are not stored anywhere; the input each of
//! them receives in a round is `Binomial(m, p)` where `m` is the number of
//! firing source neurons. Rather than sampling the whole population, the
//! projection engine only needs the top `k` order statistics, approximated
//! here through the normal quantile function.

/// Quantiles are clamped into the open unit interval before inversion so the
/// approximation never sees 0 or 1 (which map to +/- infinity).
const QUANTILE_EPS: f64 = 1e-12;

/// Inverse of the standard normal CDF.
///
/// Acklam's rational approximation; absolute error below 1.15e-9 over the
/// whole open interval, which is far tighter than the binomial-to-normal
/// approximation it feeds.
pub fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    let p = p.clamp(QUANTILE_EPS, 1.0 - QUANTILE_EPS);

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

/// Expected top-`count` order statistics of `population` draws from
/// `Binomial(m, p)`, largest first.
///
/// Uses the normal approximation with mean `m*p` and variance `m*p*(1-p)`;
/// the `i`-th largest of `population` draws sits at quantile
/// `1 - i/population`. Values are clamped into `[0, m]`, the support of the
/// binomial. `count` is clamped to the population size.
pub fn binomial_order_statistics(m: usize, p: f64, population: usize, count: usize) -> Vec<f32> {
    let count = count.min(population);
    if count == 0 {
        return Vec::new();
    }
    let mean = m as f64 * p;
    let sigma = (mean * (1.0 - p)).sqrt();
    (1..=count)
        .map(|i| {
            let q = 1.0 - i as f64 / population as f64;
            let value = mean + sigma * inverse_normal_cdf(q);
            value.clamp(0.0, m as f64) as f32
        })
        .collect()
}
