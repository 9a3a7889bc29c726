//! Shared numeric helpers for decoding.

/// Index of the largest value, taking the first occurrence on ties.
///
/// NaN entries never win. Returns `None` for an empty slice or one that is
/// entirely NaN.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if v <= current => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Left-pad with `pad` or truncate from the front so the result is exactly
/// `width` long. Truncation keeps the most recent (rightmost) elements.
pub fn pad_left(sequence: &[i64], width: usize, pad: i64) -> Vec<i64> {
    if sequence.len() >= width {
        return sequence[sequence.len() - width..].to_vec();
    }
    let mut padded = vec![pad; width - sequence.len()];
    padded.extend_from_slice(sequence);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_picks_largest() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
    }

    #[test]
    fn test_argmax_first_occurrence_on_tie() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4, 0.0]), Some(1));
    }

    #[test]
    fn test_argmax_ignores_nan() {
        assert_eq!(argmax(&[f32::NAN, 0.1, 0.3]), Some(2));
        assert_eq!(argmax(&[f32::NAN, f32::NAN]), None);
    }

    #[test]
    fn test_argmax_empty() {
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_argmax_negative_values() {
        assert_eq!(argmax(&[-3.0, -1.0, -2.0]), Some(1));
    }

    #[test]
    fn test_pad_left_pads_short_sequence() {
        assert_eq!(pad_left(&[5, 6], 5, 0), vec![0, 0, 0, 5, 6]);
    }

    #[test]
    fn test_pad_left_truncates_from_front() {
        assert_eq!(pad_left(&[1, 2, 3, 4, 5], 3, 0), vec![3, 4, 5]);
    }

    #[test]
    fn test_pad_left_exact_width_unchanged() {
        assert_eq!(pad_left(&[1, 2, 3], 3, 0), vec![1, 2, 3]);
        assert_eq!(pad_left(&[], 2, 0), vec![0, 0]);
    }
}
