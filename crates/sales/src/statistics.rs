//! Monthly sales statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::sale::Sale;

/// Figures for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStatistics {
    /// `YYYY-MM`
    pub month: String,
    pub sales: u64,
    pub sold_units: i64,
    pub sales_total: i64,
    pub adhesions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleStatistics {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub months: Vec<MonthlyStatistics>,
}

impl SaleStatistics {
    /// Sum of the monthly totals, saturating at the `i64` bounds.
    pub fn total(&self) -> i64 {
        self.months.iter().fold(0i64, |acc, m| acc.saturating_add(m.sales_total))
    }
}

fn month_entry(
    months: &mut BTreeMap<(i32, u32), MonthlyStatistics>,
    year: i32,
    month: u32,
) -> &mut MonthlyStatistics {
    months.entry((year, month)).or_insert_with(|| MonthlyStatistics {
        month: format!("{year:04}-{month:02}"),
        sales: 0,
        sold_units: 0,
        sales_total: 0,
        adhesions: 0,
    })
}

/// Group sales created in `[from, to]` and adhesions dated in the same range by month.
///
/// Months without any activity are omitted; the result is in chronological order.
pub fn statistics_by_month<'a>(
    sales: impl IntoIterator<Item = &'a Sale>,
    adhesion_dates: impl IntoIterator<Item = NaiveDate>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> SaleStatistics {
    let mut months = BTreeMap::new();

    for sale in sales {
        let created = sale.created_at();
        if created < from || created > to {
            continue;
        }
        let entry = month_entry(&mut months, created.year(), created.month());
        entry.sales += 1;
        let units = sale.items().iter().fold(0i64, |acc, i| acc.saturating_add(i.quantity));
        entry.sold_units = entry.sold_units.saturating_add(units);
        entry.sales_total = entry.sales_total.saturating_add(sale.total_price());
    }

    let (first_day, last_day) = (from.date_naive(), to.date_naive());
    for date in adhesion_dates {
        if date < first_day || date > last_day {
            continue;
        }
        month_entry(&mut months, date.year(), date.month()).adhesions += 1;
    }

    SaleStatistics {
        from,
        to,
        months: months.into_values().collect(),
    }
}
