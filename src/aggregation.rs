//! Derived views over the transaction list.
//!
//! Everything here is a pure function of its inputs: no caching, no I/O.
//! Callers pass the latest [`crate::ledger::LedgerStore`] snapshot on every
//! call, so a view can never lag behind the cache it was computed from.
//!
//! Transfers move money between the user's own accounts, so they never
//! count as income or expense. They still show up in day listings.

use alloc::collections::BTreeMap;

use chrono::{Datelike as _, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::config::TrackerConfig;
use crate::format::format_amount;
use crate::models::{Account, AccountId, Budget, Category, Transaction, TransactionType, YearMonth};

/// Income and expense sums for a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyTotals {
    /// Sum of income amounts.
    pub income: Decimal,
    /// Sum of expense amounts.
    pub expense: Decimal,
}

impl MonthlyTotals {
    /// Income minus expense.
    #[inline]
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.income.saturating_sub(self.expense)
    }

    /// Adds one transaction; transfers are ignored.
    fn add(&mut self, transaction: &Transaction) {
        match transaction.kind {
            TransactionType::Income => self.income = self.income.saturating_add(transaction.amount),
            TransactionType::Expense => self.expense = self.expense.saturating_add(transaction.amount),
            TransactionType::Transfer => {}
        }
    }
}

/// Sums income and expense booked in `month`.
#[inline]
#[must_use]
pub fn monthly_totals(transactions: &[Transaction], month: YearMonth) -> MonthlyTotals {
    let mut totals = MonthlyTotals::default();
    for transaction in transactions.iter().filter(|tx| month.contains(tx.date)) {
        totals.add(transaction);
    }
    totals
}

/// Expense per category for one month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategorySpend(BTreeMap<Category, Decimal>);

impl CategorySpend {
    /// Spend for `category`; zero when nothing was spent.
    #[inline]
    #[must_use]
    pub fn get(&self, category: Category) -> Decimal {
        self.0.get(&category).copied().unwrap_or(Decimal::ZERO)
    }

    /// Spend across all categories.
    #[inline]
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.0.values().fold(Decimal::ZERO, |total, amount| total.saturating_add(*amount))
    }

    /// Returns `true` if nothing was spent.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Categories with spend, in display order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (Category, Decimal)> + '_ {
        self.0.iter().map(|(category, amount)| (*category, *amount))
    }
}

/// Sums expenses per category for `month`.
#[inline]
#[must_use]
pub fn category_spend(transactions: &[Transaction], month: YearMonth) -> CategorySpend {
    let mut spend = BTreeMap::new();
    for transaction in transactions
        .iter()
        .filter(|tx| tx.kind == TransactionType::Expense && month.contains(tx.date))
    {
        let total = spend.entry(transaction.category).or_insert(Decimal::ZERO);
        *total = total.saturating_add(transaction.amount);
    }
    CategorySpend(spend)
}

/// Share of `limit` consumed by `spent`, in percent, clamped to `0..=100`.
///
/// ```rust
/// use nova_budget::aggregation::progress_percent;
/// use rust_decimal::Decimal;
///
/// let pct = progress_percent(Decimal::from(150), Decimal::from(100));
/// assert_eq!(pct, Decimal::ONE_HUNDRED);
/// ```
#[inline]
#[must_use]
pub fn progress_percent(spent: Decimal, limit: Decimal) -> Decimal {
    if limit <= Decimal::ZERO {
        return if spent > Decimal::ZERO {
            Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
    }
    spent
        .checked_div(limit)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map_or(Decimal::ONE_HUNDRED, |percent| {
            percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
        })
}

/// Severity band of a budget's usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    /// Below the warning threshold.
    Safe,
    /// At or above the warning threshold.
    Warning,
    /// At or above the danger threshold.
    Danger,
}

impl BudgetTier {
    /// Classifies a usage percentage against the configured thresholds.
    #[inline]
    #[must_use]
    pub fn classify(percent: Decimal, config: &TrackerConfig) -> Self {
        if percent >= config.danger_percent {
            Self::Danger
        } else if percent >= config.warning_percent {
            Self::Warning
        } else {
            Self::Safe
        }
    }

    /// Lowercase name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

/// A budget together with its usage in one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetProgress {
    /// The budget.
    pub budget: Budget,
    /// Expense booked against its category.
    pub spent: Decimal,
    /// Usage in percent, `0..=100`.
    pub percent: Decimal,
    /// Severity band.
    pub tier: BudgetTier,
}

impl BudgetProgress {
    /// Limit minus spend; negative once the budget is exceeded.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        self.budget.limit.saturating_sub(self.spent)
    }
}

/// Pairs every budget with its usage in `month`, keeping budget order.
#[inline]
#[must_use]
pub fn budget_progress(
    budgets: &[Budget],
    transactions: &[Transaction],
    month: YearMonth,
    config: &TrackerConfig,
) -> Vec<BudgetProgress> {
    let spend = category_spend(transactions, month);
    budgets
        .iter()
        .map(|budget| {
            let spent = spend.get(budget.category);
            let percent = progress_percent(spent, budget.limit);
            BudgetProgress {
                budget: budget.clone(),
                spent,
                percent,
                tier: BudgetTier::classify(percent, config),
            }
        })
        .collect()
}

/// Transactions and sums for one day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    /// Sum of income amounts.
    pub income: Decimal,
    /// Sum of expense amounts.
    pub expense: Decimal,
    /// Every transaction booked on the day, transfers included.
    pub transactions: Vec<Transaction>,
}

impl DayBucket {
    /// Income minus expense.
    #[inline]
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.income.saturating_sub(self.expense)
    }

    /// Number of transactions on the day.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.transactions.len()
    }

    /// Adds one transaction.
    fn push(&mut self, transaction: &Transaction) {
        match transaction.kind {
            TransactionType::Income => self.income = self.income.saturating_add(transaction.amount),
            TransactionType::Expense => self.expense = self.expense.saturating_add(transaction.amount),
            TransactionType::Transfer => {}
        }
        self.transactions.push(transaction.clone());
    }
}

/// Groups `month`'s transactions by day of month.
///
/// Days without transactions have no entry.
#[inline]
#[must_use]
pub fn day_buckets(transactions: &[Transaction], month: YearMonth) -> BTreeMap<u32, DayBucket> {
    let mut buckets: BTreeMap<u32, DayBucket> = BTreeMap::new();
    for transaction in transactions.iter().filter(|tx| month.contains(tx.date)) {
        buckets
            .entry(transaction.date.day())
            .or_default()
            .push(transaction);
    }
    buckets
}

/// Mini-chart bar heights for one calendar cell, in percent.
///
/// Bars are scaled against the larger of the day's own income and expense,
/// so the taller bar is always full height. A non-zero amount never drops
/// below the configured minimum height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChartBars {
    /// Income bar height; zero when there was no income.
    pub income: Decimal,
    /// Expense bar height; zero when there was no expense.
    pub expense: Decimal,
}

impl ChartBars {
    /// Scales a day's income and expense into bar heights.
    #[inline]
    #[must_use]
    pub fn scale(income: Decimal, expense: Decimal, min_percent: Decimal) -> Self {
        let max = income.max(expense);
        if max <= Decimal::ZERO {
            return Self::default();
        }
        let height = |amount: Decimal| {
            if amount <= Decimal::ZERO {
                return Decimal::ZERO;
            }
            (amount / max * Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
                .max(min_percent)
                .min(Decimal::ONE_HUNDRED)
        };
        Self {
            income: height(income),
            expense: height(expense),
        }
    }
}

/// One cell of the month grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    /// Day of month.
    pub day: u32,
    /// Full date.
    pub date: NaiveDate,
    /// Whether this is the caller's "today".
    pub is_today: bool,
    /// Activity on the day; `None` when nothing was booked.
    pub bucket: Option<DayBucket>,
    /// Mini-chart bar heights.
    pub bars: ChartBars,
}

impl CalendarDay {
    /// Net flow of the day; zero without activity.
    #[inline]
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.bucket.as_ref().map_or(Decimal::ZERO, DayBucket::net)
    }

    /// Number of transactions on the day.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.bucket.as_ref().map_or(0, DayBucket::count)
    }
}

/// Sunday-first month grid with per-day activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarMonth {
    /// Month shown.
    pub month: YearMonth,
    /// Blank cells before day 1.
    pub leading_blanks: u32,
    /// One entry per day of the month, in order.
    pub days: Vec<CalendarDay>,
    /// Income and expense for the whole month.
    pub totals: MonthlyTotals,
}

impl CalendarMonth {
    /// Lays out `month` and fills in its activity.
    #[inline]
    #[must_use]
    pub fn build(
        transactions: &[Transaction],
        month: YearMonth,
        today: NaiveDate,
        config: &TrackerConfig,
    ) -> Self {
        let mut buckets = day_buckets(transactions, month);
        let days: Vec<CalendarDay> = (1..=month.days())
            .filter_map(|day| {
                let date = month.day(day)?;
                let bucket = buckets.remove(&day);
                let bars = bucket.as_ref().map_or_else(ChartBars::default, |activity| {
                    ChartBars::scale(activity.income, activity.expense, config.min_bar_percent)
                });
                Some(CalendarDay {
                    day,
                    date,
                    is_today: date == today,
                    bucket,
                    bars,
                })
            })
            .collect();
        tracing::debug!(
            %month,
            active_days = days.iter().filter(|day| day.bucket.is_some()).count(),
            "built calendar month"
        );
        Self {
            month,
            leading_blanks: month.leading_blanks(),
            days,
            totals: monthly_totals(transactions, month),
        }
    }

    /// Total grid cells, blanks included.
    #[inline]
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.leading_blanks as usize + self.days.len()
    }

    /// Cell for `day`, if the month has it.
    #[inline]
    #[must_use]
    pub fn day(&self, day: u32) -> Option<&CalendarDay> {
        self.days.iter().find(|cell| cell.day == day)
    }
}

/// Everything booked on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayDetail {
    /// The date.
    pub date: NaiveDate,
    /// Sum of income amounts.
    pub income: Decimal,
    /// Sum of expense amounts.
    pub expense: Decimal,
    /// Transactions in ledger order.
    pub transactions: Vec<Transaction>,
}

impl DayDetail {
    /// Number of transactions.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.transactions.len()
    }

    /// Income minus expense.
    #[inline]
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.income.saturating_sub(self.expense)
    }

    /// One-line summary such as `2 transactions · +Rs. 1,200`.
    #[inline]
    #[must_use]
    pub fn summary(&self, currency: &str) -> String {
        let count = self.count();
        let noun = if count == 1 { "transaction" } else { "transactions" };
        let net = self.net();
        let sign = if net.is_sign_negative() && !net.is_zero() { "-" } else { "+" };
        format!("{count} {noun} · {sign}{currency} {}", format_amount(net.abs()))
    }
}

/// Collects the transactions booked on `date`.
#[inline]
#[must_use]
pub fn day_detail(transactions: &[Transaction], date: NaiveDate) -> DayDetail {
    let mut bucket = DayBucket::default();
    for transaction in transactions.iter().filter(|tx| tx.date == date) {
        bucket.push(transaction);
    }
    DayDetail {
        date,
        income: bucket.income,
        expense: bucket.expense,
        transactions: bucket.transactions,
    }
}

/// The `limit` most recent transactions, newest date first.
#[inline]
#[must_use]
pub fn recent_transactions(transactions: &[Transaction], limit: usize) -> Vec<Transaction> {
    let mut ordered = transactions.to_vec();
    ordered.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    ordered.truncate(limit);
    ordered
}

/// Transactions that move money in or out of `account`, in input order.
///
/// Transfers are listed for both their source and destination.
#[inline]
#[must_use]
pub fn account_transactions(transactions: &[Transaction], account: &AccountId) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|transaction| transaction.touches(account))
        .cloned()
        .collect()
}

/// Sum of all account balances.
#[inline]
#[must_use]
pub fn total_balance(accounts: &[Account]) -> Decimal {
    accounts
        .iter()
        .fold(Decimal::ZERO, |total, account| total.saturating_add(account.balance))
}

/// Figures shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Sum of all account balances.
    pub total_balance: Decimal,
    /// Month the totals refer to.
    pub month: YearMonth,
    /// Income and expense for that month.
    pub totals: MonthlyTotals,
    /// Most recent transactions.
    pub recent: Vec<Transaction>,
}

impl DashboardSummary {
    /// Computes the dashboard for the month containing `today`.
    #[inline]
    #[must_use]
    pub fn build(
        accounts: &[Account],
        transactions: &[Transaction],
        today: NaiveDate,
        config: &TrackerConfig,
    ) -> Self {
        let month = YearMonth::of(today);
        Self {
            total_balance: total_balance(accounts),
            month,
            totals: monthly_totals(transactions, month),
            recent: recent_transactions(transactions, config.recent_limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountType, BudgetId, TransactionId};
    use chrono::{DateTime, Utc};
    use rust_decimal_macros::dec;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    fn tx(id: &str, kind: TransactionType, amount: Decimal, category: Category, on: NaiveDate) -> Transaction {
        Transaction {
            id: TransactionId::from(id),
            kind,
            amount,
            account_id: AccountId::from("a"),
            to_account_id: (kind == TransactionType::Transfer).then(|| AccountId::from("b")),
            category,
            description: None,
            date: on,
            created_at: at(i64::from(on.ordinal())),
        }
    }

    fn may() -> YearMonth {
        YearMonth::new(2024, 5).unwrap()
    }

    fn ledger() -> Vec<Transaction> {
        vec![
            tx("1", TransactionType::Expense, dec!(200), Category::Food, date(5, 3)),
            tx("2", TransactionType::Income, dec!(1500), Category::Salary, date(5, 3)),
            tx("3", TransactionType::Expense, dec!(50.25), Category::Food, date(5, 10)),
            tx("4", TransactionType::Transfer, dec!(300), Category::Transfer, date(5, 10)),
            tx("5", TransactionType::Expense, dec!(80), Category::Bills, date(5, 21)),
            tx("6", TransactionType::Expense, dec!(999), Category::Food, date(4, 30)),
            tx("7", TransactionType::Income, dec!(10), Category::Other, date(6, 1)),
        ]
    }

    fn budget(category: Category, limit: Decimal) -> Budget {
        Budget {
            id: BudgetId::from(category.as_str()),
            category,
            limit,
            created_at: at(0),
        }
    }

    #[test]
    fn monthly_totals_exclude_transfers_and_other_months() {
        let totals = monthly_totals(&ledger(), may());
        assert_eq!(totals.income, dec!(1500));
        assert_eq!(totals.expense, dec!(330.25));
        assert_eq!(totals.net(), dec!(1169.75));
    }

    #[test]
    fn category_spend_counts_expenses_only() {
        let spend = category_spend(&ledger(), may());
        assert_eq!(spend.get(Category::Food), dec!(250.25));
        assert_eq!(spend.get(Category::Bills), dec!(80));
        assert_eq!(spend.get(Category::Salary), Decimal::ZERO);
        assert_eq!(spend.get(Category::Transfer), Decimal::ZERO);
        assert_eq!(spend.total(), dec!(330.25));
    }

    #[test]
    fn empty_month_has_zero_spend() {
        let spend = category_spend(&ledger(), YearMonth::new(2023, 1).unwrap());
        assert!(spend.is_empty());
        assert_eq!(spend.get(Category::Food), Decimal::ZERO);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(progress_percent(dec!(0), dec!(100)), dec!(0));
        assert_eq!(progress_percent(dec!(45), dec!(60)), dec!(75));
        assert_eq!(progress_percent(dec!(500), dec!(100)), dec!(100));
        assert_eq!(progress_percent(dec!(5), dec!(0)), dec!(100));
    }

    #[test]
    fn progress_with_tiny_limit_saturates() {
        let tiny = Decimal::new(1, 22);
        assert_eq!(progress_percent(dec!(100000000), tiny), dec!(100));
        assert_eq!(progress_percent(Decimal::MAX, Decimal::new(1, 28)), dec!(100));

        let expenses = [tx("big", TransactionType::Expense, dec!(100000000), Category::Food, date(5, 2))];
        let progress = budget_progress(&[budget(Category::Food, tiny)], &expenses, may(), &TrackerConfig::default());
        assert_eq!(progress[0].percent, dec!(100));
        assert_eq!(progress[0].tier, BudgetTier::Danger);
    }

    #[test]
    fn sums_saturate_instead_of_overflowing() {
        let huge = [
            tx("a", TransactionType::Expense, Decimal::MAX, Category::Food, date(5, 4)),
            tx("b", TransactionType::Expense, Decimal::MAX, Category::Food, date(5, 4)),
            tx("c", TransactionType::Income, Decimal::MAX, Category::Salary, date(5, 4)),
        ];
        let totals = monthly_totals(&huge, may());
        assert_eq!(totals.expense, Decimal::MAX);
        assert_eq!(totals.net(), Decimal::ZERO);
        assert_eq!(category_spend(&huge, may()).total(), Decimal::MAX);

        let bucket = &day_buckets(&huge, may())[&4];
        assert_eq!(bucket.expense, Decimal::MAX);
        assert_eq!(bucket.count(), 3);
        assert_eq!(day_detail(&huge, date(5, 4)).expense, Decimal::MAX);

        let calendar = CalendarMonth::build(&huge, may(), date(5, 4), &TrackerConfig::default());
        assert_eq!(calendar.day(4).unwrap().bars.expense, dec!(100));
    }

        #[test]
    fn tiers_follow_thresholds() {
        let config = TrackerConfig::default();
        assert_eq!(BudgetTier::classify(dec!(69.99), &config), BudgetTier::Safe);
        assert_eq!(BudgetTier::classify(dec!(70), &config), BudgetTier::Warning);
        assert_eq!(BudgetTier::classify(dec!(89.9), &config), BudgetTier::Warning);
        assert_eq!(BudgetTier::classify(dec!(90), &config), BudgetTier::Danger);
    }

    #[test]
    fn budget_progress_pairs_budgets_with_spend() {
        let budgets = [budget(Category::Food, dec!(250)), budget(Category::Bills, dec!(400))];
        let progress = budget_progress(&budgets, &ledger(), may(), &TrackerConfig::default());
        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].percent, dec!(100));
        assert_eq!(progress[0].tier, BudgetTier::Danger);
        assert_eq!(progress[0].remaining(), dec!(-0.25));
        assert_eq!(progress[1].percent, dec!(20));
        assert_eq!(progress[1].tier, BudgetTier::Safe);
    }

    #[test]
    fn day_buckets_skip_empty_days() {
        let buckets = day_buckets(&ledger(), may());
        assert_eq!(buckets.keys().copied().collect::<Vec<_>>(), vec![3, 10, 21]);
        assert!(buckets.values().all(|bucket| bucket.count() > 0));

        let third = &buckets[&3];
        assert_eq!(third.income, dec!(1500));
        assert_eq!(third.expense, dec!(200));
        assert_eq!(third.net(), dec!(1300));

        let tenth = &buckets[&10];
        assert_eq!(tenth.count(), 2);
        assert_eq!(tenth.expense, dec!(50.25));
        assert_eq!(tenth.income, Decimal::ZERO);
    }

    #[test]
    fn bars_scale_per_day_with_minimum_height() {
        let bars = ChartBars::scale(dec!(1500), dec!(100), Decimal::TEN);
        assert_eq!(bars.income, dec!(100));
        assert_eq!(bars.expense, Decimal::TEN);

        let bars = ChartBars::scale(dec!(50), dec!(200), Decimal::TEN);
        assert_eq!(bars.income, dec!(25));
        assert_eq!(bars.expense, dec!(100));

        let bars = ChartBars::scale(Decimal::ZERO, dec!(30), Decimal::TEN);
        assert_eq!(bars.income, Decimal::ZERO);
        assert_eq!(bars.expense, dec!(100));

        assert_eq!(ChartBars::scale(Decimal::ZERO, Decimal::ZERO, Decimal::TEN), ChartBars::default());
    }

    #[test]
    fn calendar_month_layout() {
        let calendar = CalendarMonth::build(&ledger(), may(), date(5, 10), &TrackerConfig::default());
        assert_eq!(calendar.leading_blanks, 3);
        assert_eq!(calendar.days.len(), 31);
        assert_eq!(calendar.cell_count(), 34);
        assert_eq!(calendar.totals.income, dec!(1500));

        let tenth = calendar.day(10).unwrap();
        assert!(tenth.is_today);
        assert_eq!(tenth.count(), 2);
        // Only a transfer and an expense: the expense bar is full height.
        assert_eq!(tenth.bars.expense, dec!(100));
        assert_eq!(tenth.bars.income, Decimal::ZERO);

        let quiet = calendar.day(11).unwrap();
        assert!(quiet.bucket.is_none());
        assert_eq!(quiet.net(), Decimal::ZERO);
        assert!(!quiet.is_today);
    }

    #[test]
    fn day_detail_summary() {
        let detail = day_detail(&ledger(), date(5, 3));
        assert_eq!(detail.count(), 2);
        assert_eq!(detail.summary("Rs."), "2 transactions · +Rs. 1,300");

        let single = day_detail(&ledger(), date(5, 21));
        assert_eq!(single.summary("Rs."), "1 transaction · -Rs. 80");

        let none = day_detail(&ledger(), date(5, 22));
        assert_eq!(none.count(), 0);
        assert_eq!(none.summary("Rs."), "0 transactions · +Rs. 0");
    }

    #[test]
    fn summary_keeps_sign_of_nets_that_round_to_zero() {
        let dust = [tx("d", TransactionType::Expense, dec!(0.001), Category::Other, date(5, 9))];
        let detail = day_detail(&dust, date(5, 9));
        assert_eq!(detail.summary("Rs."), "1 transaction · -Rs. 0");
    }

    #[test]
    fn recent_transactions_are_newest_first_and_limited() {
        let recent = recent_transactions(&ledger(), 3);
        let ids: Vec<&str> = recent.iter().map(|tx| tx.id.as_inner()).collect();
        assert_eq!(ids, vec!["7", "5", "3"]);
    }

    #[test]
    fn account_listing_includes_both_transfer_sides() {
        let ids = |account: &str| {
            account_transactions(&ledger(), &AccountId::from(account))
                .into_iter()
                .map(|tx| tx.id.into_inner())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids("a"), vec!["1", "2", "3", "4", "5", "6", "7"]);
        assert_eq!(ids("b"), vec!["4"]);
        assert!(ids("zzz").is_empty());
    }

    #[test]
    fn zero_recent_limit_lists_nothing() {
        assert!(recent_transactions(&ledger(), 0).is_empty());

        let config = TrackerConfig {
            recent_limit: 0,
            ..TrackerConfig::default()
        };
        let summary = DashboardSummary::build(&[], &ledger(), date(5, 25), &config);
        assert!(summary.recent.is_empty());
        assert_eq!(summary.total_balance, Decimal::ZERO);
        assert_eq!(summary.totals.income, dec!(1500));
    }

    #[test]
    fn dashboard_summary() {
        let accounts = [
            Account {
                id: AccountId::from("a"),
                name: "Main".to_owned(),
                kind: AccountType::Bank,
                balance: dec!(1200.50),
                created_at: at(0),
            },
            Account {
                id: AccountId::from("c"),
                name: "Card".to_owned(),
                kind: AccountType::Credit,
                balance: dec!(-200),
                created_at: at(1),
            },
        ];
        let summary = DashboardSummary::build(&accounts, &ledger(), date(5, 25), &TrackerConfig::default());
        assert_eq!(summary.total_balance, dec!(1000.50));
        assert_eq!(summary.month, may());
        assert_eq!(summary.totals.expense, dec!(330.25));
        assert_eq!(summary.recent.len(), 5);
    }
}
