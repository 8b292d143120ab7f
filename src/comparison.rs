use std::cmp::Ordering;

/// Compare two cast numbers. Null on either side never satisfies the
/// predicate.
pub fn cmp_numbers<F>(a: Option<f64>, b: Option<f64>, pred_on_ord: F) -> bool
where
    F: Fn(Ordering) -> bool,
{
    match (a, b) {
        // Cast numbers are never NaN, so the ordering is total here.
        (Some(da), Some(db)) => da.partial_cmp(&db).is_some_and(pred_on_ord),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_never_compares() {
        assert!(!cmp_numbers(None, Some(1.0), |o| o.is_le()));
        assert!(!cmp_numbers(Some(1.0), None, |o| o.is_ge()));
    }

    #[test]
    fn orders_numbers() {
        assert!(cmp_numbers(Some(2.0), Some(1.0), Ordering::is_gt));
        assert!(cmp_numbers(Some(1.0), Some(1.0), Ordering::is_ge));
        assert!(!cmp_numbers(Some(1.0), Some(1.0), Ordering::is_lt));
    }

    #[test]
    fn tiny_magnitudes_still_order() {
        assert!(cmp_numbers(Some(2e-16), Some(1e-16), Ordering::is_gt));
        assert!(cmp_numbers(Some(1e-17), Some(1e-16), Ordering::is_lt));
        assert!(!cmp_numbers(Some(1e-17), Some(1e-16), Ordering::is_ge));
    }
}
