//! Walks through one month of budgeting against the in-memory backends.
//!
//! Run with `cargo run --example walkthrough --features demo`. Settings are
//! read from `NOVA_*` variables (a `.env` file is honored) and logging is
//! controlled by `RUST_LOG`.

use std::error::Error;
use std::io::{self, Write as _};

use chrono::NaiveDate;
use nova_budget::auth::InMemoryAuth;
use nova_budget::config::TrackerConfig;
use nova_budget::format::{format_amount, format_signed};
use nova_budget::models::{
    AccountType, Category, NewAccount, NewBudget, TransactionDraft, YearMonth,
};
use nova_budget::store::InMemoryDocumentStore;
use nova_budget::tracker::BudgetTracker;
use rust_decimal::Decimal;
use secrecy::SecretString;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _dotenv = dotenvy::dotenv();

    let config = TrackerConfig::from_env()?;
    let currency = config.currency.clone();
    let tracker = BudgetTracker::builder()
        .store(InMemoryDocumentStore::new())
        .auth(InMemoryAuth::new())
        .config(config)
        .build()?;

    let password = SecretString::from("walkthrough".to_owned());
    let user = tracker.sign_up("demo@example.com", &password).await?;

    let bank = tracker
        .create_account(NewAccount::new("Salary account", AccountType::Bank, Decimal::from(25_000_u32)))
        .await?;
    let wallet = tracker
        .create_account(NewAccount::new("Wallet", AccountType::Cash, Decimal::from(1_500_u32)))
        .await?;
    let _food = tracker
        .create_budget(NewBudget::new(Category::Food, Decimal::from(6_000_u32)))
        .await?;
    let _bills = tracker
        .create_budget(NewBudget::new(Category::Bills, Decimal::from(12_000_u32)))
        .await?;

    let month = YearMonth::new(2024, 5).ok_or("invalid month")?;
    let on = |day: u32| month.day(day).ok_or("invalid day");
    let drafts = [
        TransactionDraft::income(Decimal::from(48_000_u32), bank.clone(), Category::Salary, on(1)?)
            .with_description("May salary"),
        TransactionDraft::expense(Decimal::from(11_500_u32), bank.clone(), Category::Bills, on(2)?)
            .with_description("Rent"),
        TransactionDraft::transfer(Decimal::from(3_000_u32), bank.clone(), wallet.clone(), on(2)?),
        TransactionDraft::expense(Decimal::new(42_050, 2), wallet.clone(), Category::Food, on(4)?),
        TransactionDraft::expense(Decimal::from(2_650_u32), bank.clone(), Category::Food, on(11)?),
        TransactionDraft::expense(Decimal::from(1_899_u32), bank, Category::Shopping, on(18)?),
        TransactionDraft::expense(Decimal::from(2_400_u32), wallet, Category::Food, on(25)?),
    ];
    for draft in drafts {
        let _report = tracker.add_transaction(draft).await?;
    }

    let today = NaiveDate::from_ymd_opt(2024, 5, 25).ok_or("invalid date")?;
    let mut out = io::stdout().lock();

    writeln!(out, "Signed in as {}", user.email)?;
    writeln!(out)?;
    writeln!(out, "Accounts")?;
    for account in tracker.accounts()? {
        writeln!(
            out,
            "  {} {:<16} {currency} {}",
            account.kind.glyph(),
            account.name,
            format_amount(account.balance)
        )?;
    }

    let dashboard = tracker.dashboard(today)?;
    writeln!(out)?;
    writeln!(out, "{}", dashboard.month)?;
    writeln!(
        out,
        "  balance {currency} {}  income {currency} {}  expense {currency} {}  net {}",
        format_amount(dashboard.total_balance),
        format_amount(dashboard.totals.income),
        format_amount(dashboard.totals.expense),
        format_signed(dashboard.totals.net(), &currency)
    )?;
    writeln!(out, "  recent:")?;
    for transaction in &dashboard.recent {
        writeln!(
            out,
            "    {} {} {:<12} {currency} {}",
            transaction.date,
            transaction.category.glyph(),
            transaction.category.label(),
            format_amount(transaction.amount)
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Spending by category")?;
    for (category, amount) in tracker.category_spend(month)?.iter() {
        writeln!(out, "  {:<14} {currency} {}", category.label(), format_amount(amount))?;
    }

    writeln!(out)?;
    writeln!(out, "Budgets")?;
    for progress in tracker.budget_progress(month)? {
        writeln!(
            out,
            "  {:<14} {:>6}%  [{}]  remaining {currency} {}",
            progress.budget.category.label(),
            progress.percent.round_dp(1),
            progress.tier.as_str(),
            format_amount(progress.remaining())
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Calendar")?;
    let calendar = tracker.calendar(month, today)?;
    for day in calendar.days.iter().filter(|day| day.bucket.is_some()) {
        writeln!(
            out,
            "  {:>2}{} {} entries  income {:>6}%  expense {:>6}%",
            day.day,
            if day.is_today { "*" } else { " " },
            day.count(),
            day.bars.income,
            day.bars.expense
        )?;
    }

    let detail = tracker.day_detail(on(2)?)?;
    writeln!(out)?;
    writeln!(out, "{}: {}", detail.date, detail.summary(&currency))?;

    tracker.sign_out().await?;
    writeln!(out, "Signed out; cached accounts: {}", tracker.accounts()?.len())?;
    Ok(())
}
