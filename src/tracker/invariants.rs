//! End-to-end balance scenarios through a signed-in session.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;

use super::BudgetTracker;
use crate::auth::InMemoryAuth;
use crate::models::{AccountId, AccountType, Category, NewAccount, TransactionDraft, YearMonth};
use crate::reconciler::balance_deltas;
use crate::store::{DocumentStore as _, InMemoryDocumentStore};

type Tracker = BudgetTracker<InMemoryDocumentStore, InMemoryAuth>;

async fn session() -> Tracker {
    let tracker = BudgetTracker::builder()
        .store(InMemoryDocumentStore::new())
        .auth(InMemoryAuth::new())
        .build()
        .unwrap();
    let _user = tracker
        .sign_up("ledger@example.com", &SecretString::from("s3cret!".to_owned()))
        .await
        .unwrap();
    tracker
}

async fn open(tracker: &Tracker, name: &str, balance: Decimal) -> AccountId {
    tracker
        .create_account(NewAccount::new(name, AccountType::Bank, balance))
        .await
        .unwrap()
}

fn balance(tracker: &Tracker, id: &AccountId) -> Decimal {
    tracker.ledger().account(id).unwrap().unwrap().balance
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

#[tokio::test]
async fn expense_then_edit_to_income() {
    let tracker = session().await;
    let account = open(&tracker, "Main", dec!(1000)).await;

    let report = tracker
        .add_transaction(TransactionDraft::expense(dec!(200), account.clone(), Category::Food, day(3)))
        .await
        .unwrap();
    assert_eq!(balance(&tracker, &account), dec!(800));

    let _edit = tracker
        .update_transaction(
            &report.transaction,
            TransactionDraft::income(dec!(200), account.clone(), Category::Salary, day(3)),
        )
        .await
        .unwrap();
    assert_eq!(balance(&tracker, &account), dec!(1200));
}

#[tokio::test]
async fn transfer_moves_and_deletion_restores() {
    let tracker = session().await;
    let from = open(&tracker, "A", dec!(1000)).await;
    let to = open(&tracker, "B", dec!(500)).await;

    let report = tracker
        .add_transaction(TransactionDraft::transfer(dec!(300), from.clone(), to.clone(), day(10)))
        .await
        .unwrap();
    assert_eq!(balance(&tracker, &from), dec!(700));
    assert_eq!(balance(&tracker, &to), dec!(800));

    let may = YearMonth::new(2024, 5).unwrap();
    let totals = tracker.monthly_totals(may).unwrap();
    assert_eq!(totals.income, Decimal::ZERO);
    assert_eq!(totals.expense, Decimal::ZERO);

    let _deleted = tracker.delete_transaction(&report.transaction).await.unwrap();
    assert_eq!(balance(&tracker, &from), dec!(1000));
    assert_eq!(balance(&tracker, &to), dec!(500));
    assert!(tracker.transactions().unwrap().is_empty());
}

#[tokio::test]
async fn delete_then_recreate_is_neutral() {
    let tracker = session().await;
    let account = open(&tracker, "Main", dec!(250)).await;
    let draft = TransactionDraft::expense(dec!(75.50), account.clone(), Category::Transport, day(7));

    let first = tracker.add_transaction(draft.clone()).await.unwrap();
    let _deleted = tracker.delete_transaction(&first.transaction).await.unwrap();
    assert_eq!(balance(&tracker, &account), dec!(250));

    let _second = tracker.add_transaction(draft).await.unwrap();
    assert_eq!(balance(&tracker, &account), dec!(174.50));
}

#[tokio::test]
async fn amount_edit_moves_balance_by_difference() {
    let tracker = session().await;
    let account = open(&tracker, "Main", dec!(1000)).await;
    let report = tracker
        .add_transaction(TransactionDraft::income(dec!(120), account.clone(), Category::Freelance, day(2)))
        .await
        .unwrap();
    let before = balance(&tracker, &account);

    let _edit = tracker
        .update_transaction(
            &report.transaction,
            TransactionDraft::income(dec!(345.25), account.clone(), Category::Freelance, day(2)),
        )
        .await
        .unwrap();
    assert_eq!(balance(&tracker, &account) - before, dec!(225.25));
}

#[tokio::test]
async fn edit_moving_between_accounts() {
    let tracker = session().await;
    let first = open(&tracker, "A", dec!(100)).await;
    let second = open(&tracker, "B", dec!(100)).await;
    let report = tracker
        .add_transaction(TransactionDraft::expense(dec!(40), first.clone(), Category::Shopping, day(5)))
        .await
        .unwrap();

    let _edit = tracker
        .update_transaction(
            &report.transaction,
            TransactionDraft::expense(dec!(40), second.clone(), Category::Shopping, day(5)),
        )
        .await
        .unwrap();
    assert_eq!(balance(&tracker, &first), dec!(100));
    assert_eq!(balance(&tracker, &second), dec!(60));
}

#[tokio::test]
async fn deleted_account_side_is_skipped() {
    let tracker = session().await;
    let from = open(&tracker, "A", dec!(1000)).await;
    let to = open(&tracker, "B", dec!(500)).await;
    let report = tracker
        .add_transaction(TransactionDraft::transfer(dec!(300), from.clone(), to.clone(), day(10)))
        .await
        .unwrap();

    tracker.delete_account(&to).await.unwrap();
    let reversal = tracker.delete_transaction(&report.transaction).await.unwrap();

    assert_eq!(reversal.applied.len(), 1);
    assert_eq!(reversal.skipped.len(), 1);
    assert_eq!(reversal.skipped[0].account, to);
    assert!(!reversal.is_complete());
    assert_eq!(balance(&tracker, &from), dec!(1000));
    assert!(tracker.ledger().account(&to).unwrap().is_none());
}

#[tokio::test]
async fn sign_out_clears_cache_and_ignores_late_writes() {
    let tracker = session().await;
    let uid = tracker.current_user().unwrap().unwrap().uid;
    let _account = open(&tracker, "Main", dec!(10)).await;

    tracker.sign_out().await.unwrap();
    assert!(tracker.accounts().unwrap().is_empty());
    assert!(tracker.current_user().unwrap().is_none());

    let _late = tracker
        .store()
        .add_account(&uid, NewAccount::new("Late", AccountType::Cash, dec!(1)))
        .await
        .unwrap();
    assert!(tracker.accounts().unwrap().is_empty());
    assert_eq!(
        tracker
            .store()
            .listener_count(&uid, crate::store::Collection::Accounts)
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn mixed_sequence_keeps_balances_consistent() {
    let tracker = session().await;
    let mut openings = HashMap::new();
    let mut accounts = Vec::new();
    for (name, opening) in [("A", dec!(1000)), ("B", dec!(250.75)), ("C", dec!(0))] {
        let id = open(&tracker, name, opening).await;
        let _previous = openings.insert(id.clone(), opening);
        accounts.push(id);
    }

    let mut seed: u64 = 0x2545_f491;
    let mut next = |bound: u64| {
        seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        (seed >> 33) % bound
    };

    for step in 0..60_u32 {
        let first = accounts[usize::try_from(next(3)).unwrap()].clone();
        let second = accounts[usize::try_from(next(3)).unwrap()].clone();
        let amount = Decimal::new(i64::try_from(next(50_000)).unwrap() + 1, 2);
        let date = day(1 + step % 28);
        let draft = match next(3) {
            0 => TransactionDraft::expense(amount, first, Category::Food, date),
            1 => TransactionDraft::income(amount, first, Category::Salary, date),
            _ if first != second => TransactionDraft::transfer(amount, first, second, date),
            _ => TransactionDraft::expense(amount, first, Category::Other, date),
        };

        let existing = tracker.transactions().unwrap();
        let action = next(4);
        if action == 0 && !existing.is_empty() {
            let victim = &existing[usize::try_from(next(existing.len() as u64)).unwrap()];
            let _deleted = tracker.delete_transaction(&victim.id).await.unwrap();
        } else if action == 1 && !existing.is_empty() {
            let target = &existing[usize::try_from(next(existing.len() as u64)).unwrap()];
            let _edited = tracker.update_transaction(&target.id, draft).await.unwrap();
        } else {
            let _created = tracker.add_transaction(draft).await.unwrap();
        }
    }

    let mut expected = openings;
    for transaction in tracker.transactions().unwrap() {
        for delta in balance_deltas(&transaction.fields()) {
            *expected.get_mut(&delta.account).unwrap() += delta.amount;
        }
    }
    for id in &accounts {
        assert_eq!(balance(&tracker, id), expected[id], "account {id}");
    }
}
