//! Tests for weighted entropy and cumulative weight lookup

#[cfg(test)]
mod tests {
    use collapse3d::math::probability::{cumulative_index, weighted_entropy};

    // Tests empty and single-member distributions have no entropy
    // Verified by returning ln(total) without subtracting the weighted term
    #[test]
    fn test_entropy_of_certain_outcome() {
        assert!(weighted_entropy(Vec::<u32>::new()).abs() < f64::EPSILON);
        assert!(weighted_entropy([7]).abs() < 1e-12);
    }

    // Tests uniform weights give ln(n)
    // Verified by dropping the ln(total) term
    #[test]
    fn test_entropy_of_uniform_weights() {
        let entropy = weighted_entropy([3, 3, 3, 3]);
        assert!((entropy - 4.0_f64.ln()).abs() < 1e-12);
    }

    // Tests skewed weights against the textbook formula
    // Verified by swapping w ln w for w ln W
    #[test]
    fn test_entropy_of_skewed_weights() {
        let expected = -(0.25_f64 * 0.25_f64.ln() + 0.75_f64 * 0.75_f64.ln());
        assert!((weighted_entropy([1, 3]) - expected).abs() < 1e-12);
    }

    // Tests zero weights are ignored
    // Verified by taking the logarithm of zero weights
    #[test]
    fn test_entropy_ignores_zero_weights() {
        let with_zero = weighted_entropy([0, 2, 2]);
        assert!((with_zero - 2.0_f64.ln()).abs() < 1e-12);
        assert!(weighted_entropy([0, 0]).abs() < f64::EPSILON);
    }

    // Tests more evenly spread weights yield higher entropy
    // Verified by returning a constant
    #[test]
    fn test_entropy_orders_distributions() {
        assert!(weighted_entropy([1, 1]) > weighted_entropy([1, 9]));
        assert!(weighted_entropy([1, 1, 1]) > weighted_entropy([1, 1]));
    }

    // Tests draws map to the slot whose cumulative weight first exceeds them
    // Verified by comparing with <= instead of <
    #[test]
    fn test_cumulative_index_boundaries() {
        let weights = [1, 3];
        assert_eq!(cumulative_index(&weights, 0), Some(0));
        assert_eq!(cumulative_index(&weights, 1), Some(1));
        assert_eq!(cumulative_index(&weights, 3), Some(1));
        assert_eq!(cumulative_index(&weights, 4), None);
    }

    // Tests zero-weight slots are never picked
    // Verified by returning the first index unconditionally
    #[test]
    fn test_cumulative_index_skips_zero_weights() {
        assert_eq!(cumulative_index(&[0, 2, 0, 1], 0), Some(1));
        assert_eq!(cumulative_index(&[0, 2, 0, 1], 2), Some(3));
        assert_eq!(cumulative_index(&[], 0), None);
    }
}
