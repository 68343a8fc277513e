/// Shannon entropy of a discrete distribution given by relative weights
///
/// Computes `-Σ (w_i/W) ln(w_i/W)` in the rearranged form
/// `ln W - Σ w_i ln w_i / W`, which needs a single pass and no division per
/// term. Zero weights contribute nothing; an empty or all-zero input has
/// zero entropy.
pub fn weighted_entropy<I>(weights: I) -> f64
where
    I: IntoIterator<Item = u32>,
{
    let mut total = 0.0_f64;
    let mut weighted_log_sum = 0.0_f64;

    for weight in weights {
        if weight == 0 {
            continue;
        }
        let w = f64::from(weight);
        total += w;
        weighted_log_sum += w * w.ln();
    }

    if total <= 0.0 {
        return 0.0;
    }

    // Clamp tiny negative results from rounding on single-member domains
    (total.ln() - weighted_log_sum / total).max(0.0)
}

/// Pick the index whose cumulative weight first exceeds `draw`
///
/// `draw` must lie in `0..sum(weights)`; the caller samples it. Returns `None`
/// when the weights are empty or `draw` is past the total.
pub fn cumulative_index(weights: &[u32], draw: u64) -> Option<usize> {
    let mut cumulative = 0_u64;
    for (i, &weight) in weights.iter().enumerate() {
        cumulative += u64::from(weight);
        if draw < cumulative {
            return Some(i);
        }
    }
    None
}
