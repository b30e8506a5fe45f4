//! Property-style tests for statistics and reconciliation

use boxrecon::{
    evaluate_size_consistency, median_dimensions, median_sizes, reconcile, BoundingBox, BoxArray,
    BoxError, BoxSlot, CheckMode, ConsistencyMode,
};

/// Deterministic line of word boxes: sizes near (100, 40) with a few outliers
/// and a missing slot every seventh position
fn noisy_line(seed: u64, len: usize) -> BoxArray {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) as u32
    };

    let mut slots = Vec::with_capacity(len);
    let mut x = 0i32;
    for i in 0..len {
        let r = next();
        if i % 7 == 3 {
            slots.push(BoxSlot::Missing);
            continue;
        }
        let w = match r % 10 {
            0 => 150 + r % 40,
            1 => 40 + r % 30,
            _ => 97 + r % 7,
        };
        let h = match (r / 10) % 10 {
            0 => 70 + r % 20,
            _ => 38 + (r / 100) % 5,
        };
        slots.push(BoxSlot::valid(BoundingBox::new(x, (r % 5) as i32, w, h)));
        x += w as i32 + 10;
    }

    BoxArray::new(slots)
}

/// Line lengths with 26, 27, 27 and 28 valid boxes
const LENGTHS: [usize; 4] = [30, 31, 32, 33];

/// Lower and upper middle values of a dimension
fn middle_pair(values: impl Iterator<Item = u32>) -> (f64, f64) {
    let mut sorted: Vec<u32> = values.collect();
    sorted.sort_unstable();
    let n = sorted.len();
    (sorted[(n - 1) / 2] as f64, sorted[n / 2] as f64)
}

#[test]
fn generated_lines_cover_both_parities() {
    let parities: Vec<usize> = LENGTHS
        .iter()
        .map(|&len| noisy_line(0, len).valid_count() % 2)
        .collect();
    assert!(parities.contains(&0));
    assert!(parities.contains(&1));
}

const MODES: [CheckMode; 3] = [CheckMode::Width, CheckMode::Height, CheckMode::Both];

#[test]
fn reconciliation_is_idempotent() {
    for seed in 0..20 {
        for len in LENGTHS {
            let boxes = noisy_line(seed, len);
            for mode in MODES {
                let first = reconcile(&boxes, mode, 0.05, 1.03).unwrap();
                let second = reconcile(&first.boxes, mode, 0.05, 1.03).unwrap();
                assert_eq!(
                    second.stats.total_corrected(),
                    0,
                    "seed {} len {} mode {:?}",
                    seed,
                    len,
                    mode
                );
                assert_eq!(
                    median_sizes(&first.boxes).unwrap(),
                    median_sizes(&boxes).unwrap()
                );
            }
        }
    }
}

#[test]
fn reconciliation_is_idempotent_with_tight_threshold() {
    for len in LENGTHS {
        let boxes = noisy_line(99, len);
        let first = reconcile(&boxes, CheckMode::Both, 0.01, 1.03).unwrap();
        let second = reconcile(&first.boxes, CheckMode::Both, 0.01, 1.03).unwrap();
        assert_eq!(second.stats.total_corrected(), 0, "len {}", len);
    }
}

#[test]
fn median_scales_with_transform() {
    for seed in 0..10 {
        for len in LENGTHS {
            let boxes = noisy_line(seed, len);
            let (med_w, med_h) = median_sizes(&boxes).unwrap();
            for k in [2.0, 3.0, 0.5] {
                let scaled = median_dimensions(&boxes.transform(0, 0, k, k).unwrap()).unwrap();
                let expect_w = med_w * k;
                let expect_h = med_h * k;
                assert!((scaled.width as f64 - expect_w).abs() <= 1.0, "seed {} k {}", seed, k);
                assert!((scaled.height as f64 - expect_h).abs() <= 1.0, "seed {} k {}", seed, k);
            }
        }
    }
}

#[test]
fn raising_threshold_never_adds_corrections() {
    let thresholds = [0.0, 0.01, 0.02, 0.03, 0.05, 0.1, 0.2, 0.5, 1.0];
    for seed in 0..10 {
        for len in LENGTHS {
            let boxes = noisy_line(seed, len);
            for mode in MODES {
                let counts: Vec<usize> = thresholds
                    .iter()
                    .map(|&t| reconcile(&boxes, mode, t, 1.03).unwrap().stats.total_corrected())
                    .collect();
                assert!(
                    counts.windows(2).all(|w| w[1] <= w[0]),
                    "seed {} len {} mode {:?}: {:?}",
                    seed,
                    len,
                    mode,
                    counts
                );
            }
        }
    }
}

/// Corrected sizes lie in `[m / f, m * f]`, widened to the middle pair when
/// the middle values themselves sit outside that band
#[test]
fn corrected_sizes_stay_in_band() {
    let size_factor = 1.03;
    for seed in 0..10 {
        for len in LENGTHS {
            let boxes = noisy_line(seed, len);
            let (med_w, med_h) = median_sizes(&boxes).unwrap();
            let (low_w, high_w) = middle_pair(boxes.iter_valid().map(|(_, b)| b.width()));
            let (low_h, high_h) = middle_pair(boxes.iter_valid().map(|(_, b)| b.height()));
            let result = reconcile(&boxes, CheckMode::Both, 0.05, size_factor).unwrap();

            for (i, original) in boxes.iter_valid() {
                let fixed = result.boxes.get(i).unwrap();
                assert_eq!((fixed.x(), fixed.y()), (original.x(), original.y()));
                if fixed.width() != original.width() {
                    let w = fixed.width() as f64;
                    assert!((med_w / size_factor).min(low_w) <= w, "seed {} len {}", seed, len);
                    assert!(w <= (med_w * size_factor).max(high_w), "seed {} len {}", seed, len);
                }
                if fixed.height() != original.height() {
                    let h = fixed.height() as f64;
                    assert!((med_h / size_factor).min(low_h) <= h, "seed {} len {}", seed, len);
                    assert!(h <= (med_h * size_factor).max(high_h), "seed {} len {}", seed, len);
                }
            }
        }
    }
}

#[test]
fn output_keeps_length_and_missing_slots() {
    let boxes = noisy_line(3, 30);
    let result = reconcile(&boxes, CheckMode::Both, 0.05, 1.03).unwrap();
    assert_eq!(result.boxes.len(), boxes.len());
    for (a, b) in boxes.slots().iter().zip(result.boxes.slots()) {
        assert_eq!(a.is_valid(), b.is_valid());
    }
}

#[test]
fn degenerate_inputs() {
    let none = BoxArray::with_missing(4);
    assert_eq!(median_dimensions(&none), Err(BoxError::EmptyInput));

    let one = BoxArray::new(vec![
        BoxSlot::Missing,
        BoxSlot::valid(BoundingBox::new(5, 5, 300, 20)),
    ]);
    for mode in [ConsistencyMode::Pairwise, ConsistencyMode::Median] {
        let dev = evaluate_size_consistency(&one, mode);
        assert_eq!((dev.width, dev.height), (0.0, 0.0));
    }
    let result = reconcile(&one, CheckMode::Both, 0.05, 1.03).unwrap();
    assert_eq!(result.stats.total_corrected(), 0);
    assert_eq!(result.boxes, one);

    assert_eq!(
        reconcile(&BoxArray::default(), CheckMode::Width, 0.05, 1.03).unwrap_err(),
        BoxError::EmptyInput
    );
}

#[test]
fn width_outlier_scenario() {
    let boxes = BoxArray::from_boxes(
        [100, 102, 98, 140]
            .iter()
            .enumerate()
            .map(|(i, &w)| BoundingBox::new(i as i32 * 160, 0, w, 30)),
    );

    assert_eq!(median_dimensions(&boxes).unwrap().width, 101);

    let result = reconcile(&boxes, CheckMode::Width, 0.05, 1.03).unwrap();
    assert_eq!(result.stats.num_width_corrected, 1);
    let widths: Vec<u32> = result.boxes.iter_valid().map(|(_, b)| b.width()).collect();
    assert_eq!(widths, vec![100, 102, 98, 104]);
    assert!((result.stats.width_to_height_ratio - 101.0 / 30.0).abs() < 1e-12);
}
