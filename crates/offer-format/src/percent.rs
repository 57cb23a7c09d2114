//! Integer percentage partitions

/// A three-way split of a total into integer percentages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Partition {
    pub first: u32,
    pub second: u32,
    pub third: u32,
}

impl Partition {
    /// Split three absolute amounts into percentages of their sum
    ///
    /// The result sums to exactly 100 when the total is positive and to 0
    /// otherwise.
    pub fn from_amounts(first: f64, second: f64, third: f64) -> Self {
        let p = largest_remainder_percentages(&[first, second, third]);
        Self {
            first: p[0],
            second: p[1],
            third: p[2],
        }
    }

    /// Round the first two shares and give the third whatever is left
    ///
    /// Shares are fractions of the total. Halves round to even. When the two
    /// rounded values exceed 100 the second gives way first, then the first.
    /// The result always sums to 100.
    pub fn from_leading_shares(first: f64, second: f64) -> Self {
        let percent = |share: f64| {
            let share = if share.is_finite() { share.clamp(0.0, 1.0) } else { 0.0 };
            (share * 100.0).round_ties_even() as u32
        };
        let mut first = percent(first);
        let mut second = percent(second);

        let over = (first + second).saturating_sub(100);
        let from_second = over.min(second);
        second -= from_second;
        first = first.saturating_sub(over - from_second);

        Self {
            first,
            second,
            third: 100 - first - second,
        }
    }

    pub fn sum(&self) -> u32 {
        self.first + self.second + self.third
    }
}

/// Round shares to integer percentages using the largest remainder method
///
/// Every share is floored first, then the missing points go to the shares
/// with the largest fractional remainder (earlier shares win ties). Each
/// result is within 1 of its unrounded share. Negative or non-finite amounts
/// count as zero.
///
/// # Examples
/// ```
/// use offer_format::largest_remainder_percentages;
/// assert_eq!(largest_remainder_percentages(&[1.0, 1.0, 1.0]), vec![34, 33, 33]);
/// assert_eq!(largest_remainder_percentages(&[0.0, 0.0]), vec![0, 0]);
/// ```
pub fn largest_remainder_percentages(amounts: &[f64]) -> Vec<u32> {
    let cleaned: Vec<f64> = amounts
        .iter()
        .map(|a| if a.is_finite() && *a > 0.0 { *a } else { 0.0 })
        .collect();
    let total: f64 = cleaned.iter().sum();

    if total <= 0.0 {
        return vec![0; cleaned.len()];
    }

    let shares: Vec<f64> = cleaned.iter().map(|a| a / total * 100.0).collect();
    let mut result: Vec<u32> = shares.iter().map(|s| s.floor() as u32).collect();

    let assigned: u32 = result.iter().sum();
    let missing = 100u32.saturating_sub(assigned) as usize;

    let mut order: Vec<usize> = (0..shares.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = shares[a] - shares[a].floor();
        let rb = shares[b] - shares[b].floor();
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });

    for &idx in order.iter().take(missing) {
        result[idx] += 1;
    }

    result
}
