//! # Window Generation
//!
//! $$
//! [t_{ks},\,t_{ks+w}-1] \;\cup\; [t_{ks+w},\,t_{ks+w+s}-1]
//! $$
//!
//! Train/test windows over month-end dates. Training data is strictly
//! before the test start, so no window can look ahead.

use chrono::Duration;
use chrono::NaiveDate;

/// Date boundaries of one train/test split. Both ranges are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
  pub train_start: NaiveDate,
  pub train_end: NaiveDate,
  pub test_start: NaiveDate,
  pub test_end: NaiveDate,
}

/// Generate rolling windows over month-end dates with a fixed step.
///
/// For step index `k`, the train range starts at month `k*step` and spans
/// `window_months` months; the test range spans the following
/// `step_months` months, clipped to the last available date. The loop
/// requires `k*step + window + step` to stay strictly below the month
/// count so that every boundary month exists.
pub fn generate_windows(
  monthly: &[NaiveDate],
  last_date: NaiveDate,
  window_months: usize,
  step_months: usize,
) -> Vec<Window> {
  let mut out = Vec::new();
  if window_months == 0 || step_months == 0 {
    return out;
  }

  let mut start_idx = 0;
  while start_idx + window_months + step_months < monthly.len() {
    let train_start = monthly[start_idx];
    let test_start = monthly[start_idx + window_months];
    let train_end = test_start - Duration::days(1);
    let test_end = (monthly[start_idx + window_months + step_months] - Duration::days(1)).min(last_date);

    out.push(Window {
      train_start,
      train_end,
      test_start,
      test_end,
    });
    start_idx += step_months;
  }

  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn month_ends(count: usize) -> Vec<NaiveDate> {
    // Last trading day approximated as the 28th, which keeps the
    // arithmetic simple across month lengths.
    (0..count)
      .map(|i| {
        let year = 2020 + (i / 12) as i32;
        let month = (i % 12) as u32 + 1;
        NaiveDate::from_ymd_opt(year, month, 28).unwrap()
      })
      .collect()
  }

  #[test]
  fn train_ends_one_day_before_test_start() {
    let months = month_ends(20);
    let windows = generate_windows(&months, *months.last().unwrap(), 12, 1);

    assert!(!windows.is_empty());
    for w in &windows {
      assert_eq!(w.train_end + Duration::days(1), w.test_start);
      assert!(w.train_end < w.test_start);
      assert!(w.test_start <= w.test_end);
    }
  }

  #[test]
  fn windows_are_strictly_increasing_and_contiguous() {
    let months = month_ends(20);
    let windows = generate_windows(&months, *months.last().unwrap(), 12, 1);

    for pair in windows.windows(2) {
      assert!(pair[1].test_start > pair[0].test_start);
      // With a one-month step the next test range starts right after the
      // previous one ends.
      assert_eq!(pair[0].test_end + Duration::days(1), pair[1].test_start);
    }
  }

  #[test]
  fn window_count_follows_loop_bound() {
    let months = month_ends(20);
    let windows = generate_windows(&months, *months.last().unwrap(), 12, 1);

    // start_idx + 12 + 1 < 20 admits start indices 0..=6.
    assert_eq!(windows.len(), 7);
  }

  #[test]
  fn degenerate_configs_yield_no_windows() {
    let months = month_ends(20);
    assert!(generate_windows(&months, *months.last().unwrap(), 0, 1).is_empty());
    assert!(generate_windows(&months, *months.last().unwrap(), 12, 0).is_empty());
    assert!(generate_windows(&months[..5], months[4], 12, 1).is_empty());
  }
}
