//! Expense totals grouped for the category chart and the weekday heatmap.

use std::collections::HashMap;

use crate::dashboard::{bucketing::Bucket, records::Expense};

/// The total spent in one category.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// Sum expenses by category, largest total first.
///
/// Ties are broken by category name so the order is stable between renders.
pub(super) fn expenses_by_category(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<&str, f64> = HashMap::new();

    for expense in expenses {
        *totals.entry(expense.category.as_str()).or_insert(0.0) += expense.amount;
    }

    let mut totals: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.to_owned(),
            total,
        })
        .collect();

    totals.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });

    totals
}

/// How strongly to shade a bucket in `[0, 1]`, relative to the largest bucket.
pub(super) fn bucket_intensity(bucket: &Bucket, buckets: &[Bucket]) -> f64 {
    let max = buckets
        .iter()
        .map(|bucket| bucket.value)
        .fold(0.0, f64::max);

    if max <= 0.0 {
        return 0.0;
    }

    (bucket.value / max).clamp(0.0, 1.0)
}

#[cfg(test)]
mod expenses_by_category_tests {
    use time::macros::datetime;

    use crate::dashboard::records::Expense;

    use super::{CategoryTotal, expenses_by_category};

    fn expense(amount: f64, category: &str) -> Expense {
        Expense {
            id: 0,
            amount,
            category: category.to_owned(),
            date: datetime!(2025-03-15 10:00:00 UTC),
            goal_id: None,
        }
    }

    #[test]
    fn sums_and_sorts_by_total() {
        let expenses = [
            expense(10.0, "Food"),
            expense(50.0, "Rent"),
            expense(15.0, "Food"),
            expense(25.0, "Bike"),
        ];

        let totals = expenses_by_category(&expenses);

        assert_eq!(
            totals,
            vec![
                CategoryTotal {
                    category: "Rent".to_owned(),
                    total: 50.0
                },
                CategoryTotal {
                    category: "Bike".to_owned(),
                    total: 25.0
                },
                CategoryTotal {
                    category: "Food".to_owned(),
                    total: 25.0
                },
            ]
        );
    }

    #[test]
    fn no_expenses_gives_no_categories() {
        assert!(expenses_by_category(&[]).is_empty());
    }
}
