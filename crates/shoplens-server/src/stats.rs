//! Descriptive statistics over the full dataset, independent of the model.

use std::collections::BTreeMap;

use serde::Serialize;
use shoplens_io::{Column, Dataset, DatasetError};
use tracing::{debug, instrument};

/// Half-open age ranges `[lo, hi)` and their display labels.
pub const AGE_BUCKETS: [(f64, f64, &str); 7] = [
    (0.0, 18.0, "<18"),
    (18.0, 25.0, "18-24"),
    (25.0, 35.0, "25-34"),
    (35.0, 45.0, "35-44"),
    (45.0, 55.0, "45-54"),
    (55.0, 65.0, "55-64"),
    (65.0, 100.0, "65+"),
];

/// Aggregates behind the dashboard charts.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptiveStats {
    /// Row count per age range, in [`AGE_BUCKETS`] order. Ages outside
    /// `[0, 100)` are not counted.
    pub age_ranges: Vec<(String, usize)>,
    /// Sum of `NumberOfPurchases` per product category.
    pub purchases_by_category: Vec<(String, f64)>,
    /// Sum of `TimeSpentOnWebsite` per product category.
    pub time_by_category: Vec<(String, f64)>,
    /// Mean `AnnualIncome` per distinct age, ascending by age.
    pub income_by_age: Vec<(f64, f64)>,
}

impl DescriptiveStats {
    /// Compute every aggregate from the loaded dataset.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DatasetError::MissingColumn`] | A charted column is absent |
    /// | [`DatasetError::NonNumericFeature`] | A summed or averaged column holds text |
    #[instrument(skip_all, fields(n_rows = dataset.n_rows()))]
    pub fn compute(dataset: &Dataset) -> Result<Self, DatasetError> {
        let age = dataset.numeric("Age")?;
        let income = dataset.numeric("AnnualIncome")?;
        let purchases = dataset.numeric("NumberOfPurchases")?;
        let time = dataset.numeric("TimeSpentOnWebsite")?;
        let category = dataset.require("ProductCategory")?;

        let stats = Self {
            age_ranges: age_range_counts(age),
            purchases_by_category: sum_by_group(category, purchases),
            time_by_category: sum_by_group(category, time),
            income_by_age: mean_by_value(age, income),
        };
        debug!(
            n_categories = stats.purchases_by_category.len(),
            n_ages = stats.income_by_age.len(),
            "descriptive statistics computed"
        );
        Ok(stats)
    }
}

fn age_range_counts(ages: &[f64]) -> Vec<(String, usize)> {
    let mut counts = [0usize; AGE_BUCKETS.len()];
    for &age in ages {
        if let Some(i) = AGE_BUCKETS
            .iter()
            .position(|&(lo, hi, _)| age >= lo && age < hi)
        {
            counts[i] += 1;
        }
    }
    AGE_BUCKETS
        .iter()
        .zip(counts)
        .map(|(&(_, _, label), n)| (label.to_string(), n))
        .collect()
}

/// Sum `values` grouped by the cells of `groups`.
///
/// Numeric groups are ordered by value, text groups lexicographically.
fn sum_by_group(groups: &Column, values: &[f64]) -> Vec<(String, f64)> {
    match groups {
        Column::Numeric(keys) => {
            let mut sums: Vec<(f64, f64)> = Vec::new();
            for (&key, &value) in keys.iter().zip(values) {
                match sums.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, sum)) => *sum += value,
                    None => sums.push((key, value)),
                }
            }
            sums.sort_by(|a, b| a.0.total_cmp(&b.0));
            sums.into_iter().map(|(k, s)| (k.to_string(), s)).collect()
        }
        Column::Categorical(keys) => {
            let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
            for (key, &value) in keys.iter().zip(values) {
                *sums.entry(key.as_str()).or_insert(0.0) += value;
            }
            sums.into_iter().map(|(k, s)| (k.to_string(), s)).collect()
        }
    }
}

/// Mean of `values` for each distinct key, ascending by key.
fn mean_by_value(keys: &[f64], values: &[f64]) -> Vec<(f64, f64)> {
    let mut pairs: Vec<(f64, f64)> = keys.iter().copied().zip(values.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut means: Vec<(f64, f64)> = Vec::new();
    let mut run = (0.0, 0usize);
    for (i, &(key, value)) in pairs.iter().enumerate() {
        run.0 += value;
        run.1 += 1;
        let last_of_key = pairs.get(i + 1).is_none_or(|next| next.0 != key);
        if last_of_key {
            means.push((key, run.0 / run.1 as f64));
            run = (0.0, 0);
        }
    }
    means
}
