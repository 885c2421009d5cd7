//! Top-k classification accuracy.

use std::cmp::Ordering;

use crate::error::MetricError;

/// Percentage of rows whose target class is among the `k` highest scores,
/// for each `k` in `ks`.
///
/// `scores` is a row-major `[batch, num_classes]` matrix. Equal scores rank
/// the lower class index first.
///
/// ```
/// use train_metrics::topk_accuracy;
///
/// let scores = [0.1, 0.7, 0.2, 0.5, 0.3, 0.2];
/// let acc = topk_accuracy(&scores, 3, &[2, 0], &[1, 2]).unwrap();
/// assert_eq!(acc, vec![50.0, 100.0]);
/// ```
pub fn topk_accuracy(
    scores: &[f32],
    num_classes: usize,
    targets: &[usize],
    ks: &[usize],
) -> Result<Vec<f64>, MetricError> {
    if num_classes == 0 {
        return Err(MetricError::InvalidInput("num_classes must be positive".into()));
    }
    if targets.is_empty() {
        return Err(MetricError::InvalidInput("empty batch".into()));
    }
    if scores.len() != targets.len() * num_classes {
        return Err(MetricError::InvalidInput(format!(
            "expected {} scores for {} rows of {} classes, got {}",
            targets.len() * num_classes,
            targets.len(),
            num_classes,
            scores.len()
        )));
    }
    if let Some(&k) = ks.iter().find(|&&k| k == 0 || k > num_classes) {
        return Err(MetricError::InvalidInput(format!(
            "k = {k} is outside 1..={num_classes}"
        )));
    }
    if let Some(&target) = targets.iter().find(|&&t| t >= num_classes) {
        return Err(MetricError::InvalidInput(format!(
            "target class {target} is outside 0..{num_classes}"
        )));
    }

    // Position of the target in each row's descending ranking.
    let ranks: Vec<usize> = scores
        .chunks_exact(num_classes)
        .zip(targets)
        .map(|(row, &target)| {
            let score = row[target];
            row.iter()
                .enumerate()
                .filter(|&(class, &other)| match other.total_cmp(&score) {
                    Ordering::Greater => true,
                    Ordering::Equal => class < target,
                    Ordering::Less => false,
                })
                .count()
        })
        .collect();

    let batch = targets.len() as f64;
    Ok(ks
        .iter()
        .map(|&k| {
            let correct = ranks.iter().filter(|&&rank| rank < k).count();
            correct as f64 * 100.0 / batch
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top1_and_top5() {
        // 4 rows, 6 classes; targets ranked 0th, 1st, 4th and 5th.
        #[rustfmt::skip]
        let scores = [
            0.9, 0.1, 0.0, 0.0, 0.0, 0.0,
            0.5, 0.6, 0.1, 0.0, 0.0, 0.0,
            0.6, 0.5, 0.4, 0.3, 0.2, 0.1,
            0.6, 0.5, 0.4, 0.3, 0.2, 0.1,
        ];
        let acc = topk_accuracy(&scores, 6, &[0, 0, 4, 5], &[1, 2, 5, 6]).unwrap();
        assert_eq!(acc, vec![25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn test_ties_prefer_lower_index() {
        let scores = [0.5, 0.5, 0.5];
        assert_eq!(topk_accuracy(&scores, 3, &[0], &[1]).unwrap(), vec![100.0]);
        assert_eq!(topk_accuracy(&scores, 3, &[2], &[1, 2]).unwrap(), vec![0.0, 0.0]);
        assert_eq!(topk_accuracy(&scores, 3, &[2], &[3]).unwrap(), vec![100.0]);
    }

    #[test]
    fn test_invalid_inputs() {
        let scores = [0.1, 0.9];
        assert!(matches!(
            topk_accuracy(&scores, 2, &[], &[1]),
            Err(MetricError::InvalidInput(_))
        ));
        assert!(matches!(
            topk_accuracy(&scores, 3, &[0], &[1]),
            Err(MetricError::InvalidInput(_))
        ));
        assert!(matches!(
            topk_accuracy(&scores, 2, &[0], &[0]),
            Err(MetricError::InvalidInput(_))
        ));
        assert!(matches!(
            topk_accuracy(&scores, 2, &[0], &[3]),
            Err(MetricError::InvalidInput(_))
        ));
        assert!(matches!(
            topk_accuracy(&scores, 2, &[2], &[1]),
            Err(MetricError::InvalidInput(_))
        ));
    }
}
