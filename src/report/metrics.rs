//! Sales aggregation: grand total plus per-region, per-category and
//! per-month totals.

use std::collections::{BTreeMap, HashMap};

use crate::domain::{GroupTotal, MetricsResult, SalesRecord, YearMonth};

/// Compute all aggregates for one file's records.
pub fn compute_metrics(records: &[SalesRecord]) -> MetricsResult {
    let total_sales = records.iter().map(|r| r.sales).sum();

    let sales_by_region = group_descending(records, |r| r.region.as_str());
    let sales_by_category = group_descending(records, |r| r.category.as_str());

    let mut by_month: BTreeMap<YearMonth, f64> = BTreeMap::new();
    for r in records {
        *by_month.entry(r.month).or_insert(0.0) += r.sales;
    }

    MetricsResult {
        total_sales,
        sales_by_region,
        sales_by_category,
        sales_by_month: by_month.into_iter().collect(),
        record_count: records.len(),
    }
}

/// Sum `sales` per key and sort largest first.
///
/// Keys compare as exact strings. The sort is stable, so equal totals stay
/// in first-seen order.
fn group_descending<'a, F>(records: &'a [SalesRecord], key: F) -> Vec<GroupTotal>
where
    F: Fn(&'a SalesRecord) -> &'a str,
{
    let mut groups: Vec<GroupTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for r in records {
        let k = key(r);
        match index.get(k) {
            Some(&i) => groups[i].total += r.sales,
            None => {
                index.insert(k, groups.len());
                groups.push(GroupTotal::new(k, r.sales));
            }
        }
    }

    groups.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(date: (i32, u32, u32), region: &str, category: &str, sales: f64) -> SalesRecord {
        let order_date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        SalesRecord {
            order_date,
            month: YearMonth::from_date(order_date),
            region: region.to_string(),
            category: category.to_string(),
            sales,
        }
    }

    #[test]
    fn three_region_sample() {
        let records = vec![
            record((2024, 1, 5), "Region A", "Furniture", 100.00),
            record((2024, 1, 6), "Region B", "Technology", 250.50),
            record((2024, 2, 1), "Region C", "Furniture", 75.25),
        ];
        let m = compute_metrics(&records);

        assert!((m.total_sales - 425.75).abs() < 1e-9);
        let regions: Vec<(&str, f64)> = m.sales_by_region.iter().map(|g| (g.key.as_str(), g.total)).collect();
        assert_eq!(
            regions,
            vec![("Region B", 250.50), ("Region A", 100.00), ("Region C", 75.25)]
        );
        assert_eq!(m.record_count, 3);
    }

    #[test]
    fn group_totals_sum_to_grand_total() {
        let records = vec![
            record((2024, 1, 1), "East", "Toys", 10.10),
            record((2024, 1, 2), "West", "Toys", 20.20),
            record((2024, 2, 3), "East", "Books", 30.30),
            record((2024, 3, 4), "North", "Games", 0.07),
            record((2024, 3, 5), "West", "Books", 1234.56),
        ];
        let m = compute_metrics(&records);

        let by_region: f64 = m.sales_by_region.iter().map(|g| g.total).sum();
        let by_category: f64 = m.sales_by_category.iter().map(|g| g.total).sum();
        let by_month: f64 = m.sales_by_month.iter().map(|(_, v)| v).sum();
        assert!((by_region - m.total_sales).abs() < 1e-9);
        assert!((by_category - m.total_sales).abs() < 1e-9);
        assert!((by_month - m.total_sales).abs() < 1e-9);
    }

    #[test]
    fn sorted_descending_with_first_seen_tie_break() {
        let records = vec![
            record((2024, 1, 1), "Gamma", "X", 5.0),
            record((2024, 1, 1), "Alpha", "X", 9.0),
            record((2024, 1, 1), "Beta", "X", 5.0),
            record((2024, 1, 1), "Delta", "X", 5.0),
        ];
        let m = compute_metrics(&records);
        let keys: Vec<&str> = m.sales_by_region.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Alpha", "Gamma", "Beta", "Delta"]);
        for pair in m.sales_by_region.windows(2) {
            assert!(pair[0].total >= pair[1].total);
        }
    }

    #[test]
    fn keys_are_case_sensitive() {
        let records = vec![
            record((2024, 1, 1), "west", "X", 1.0),
            record((2024, 1, 1), "West", "X", 2.0),
        ];
        let m = compute_metrics(&records);
        assert_eq!(m.sales_by_region.len(), 2);
    }

    #[test]
    fn months_are_chronological() {
        let records = vec![
            record((2024, 3, 1), "A", "X", 1.0),
            record((2023, 12, 31), "A", "X", 2.0),
            record((2024, 3, 20), "A", "X", 4.0),
        ];
        let m = compute_metrics(&records);
        assert_eq!(
            m.sales_by_month,
            vec![
                (YearMonth { year: 2023, month: 12 }, 2.0),
                (YearMonth { year: 2024, month: 3 }, 5.0),
            ]
        );
    }
}
