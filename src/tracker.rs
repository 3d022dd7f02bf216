//! Session object tying auth, store, cache, and views together.
//!
//! A [`BudgetTracker`] follows the auth service: when a user signs in, its
//! [`LedgerStore`] attaches to that user's collections; when the session
//! ends, the ledger detaches before anything else happens. Mutations go
//! through validation and, for transactions, the [`Reconciler`]. Views are
//! recomputed from the cache on every call.
//!
//! A mutation without a session fails with [`BudgetError::NotSignedIn`], or
//! with [`AuthError::SessionExpired`] when the provider revoked it; both ask
//! the user to sign in again.
//!
//! [`AuthError::SessionExpired`]: crate::error::AuthError::SessionExpired

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use secrecy::SecretString;

use crate::aggregation::{
    self, BudgetProgress, CalendarMonth, CategorySpend, DashboardSummary, DayBucket, DayDetail,
    MonthlyTotals,
};
use crate::auth::{AuthListener, AuthService};
use crate::config::TrackerConfig;
use crate::error::{BudgetError, Result};
use crate::ledger::{LedgerStore, SubscriptionFault};
use crate::models::{
    Account, AccountId, AccountPatch, Budget, BudgetId, BudgetPatch, NewAccount, NewBudget,
    Transaction, TransactionDraft, TransactionId, User, YearMonth,
};
use crate::reconciler::{ReconcileReport, Reconciler};
use crate::store::{DocumentStore, Subscription};

/// Builder for [`BudgetTracker`].
#[derive(Debug)]
pub struct BudgetTrackerBuilder<S, A> {
    /// Document store backend.
    store: Option<S>,
    /// Identity provider.
    auth: Option<A>,
    /// Display and threshold settings.
    config: Option<TrackerConfig>,
}

impl<S, A> BudgetTrackerBuilder<S, A>
where
    S: DocumentStore + 'static,
    A: AuthService + 'static,
{
    /// Sets the document store backend.
    #[inline]
    #[must_use]
    pub fn store(mut self, store: S) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the identity provider.
    #[inline]
    #[must_use]
    pub fn auth(mut self, auth: A) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Overrides the default configuration.
    #[inline]
    #[must_use]
    pub fn config(mut self, config: TrackerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the tracker and starts following the auth state.
    ///
    /// If the provider already has a signed-in user, the ledger attaches
    /// before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::Config`] if the store or auth service is
    /// missing or the configuration is invalid.
    #[inline]
    pub fn build(self) -> Result<BudgetTracker<S, A>> {
        let store = Arc::new(
            self.store
                .ok_or_else(|| BudgetError::Config("document store is required".to_owned()))?,
        );
        let auth = Arc::new(
            self.auth
                .ok_or_else(|| BudgetError::Config("auth service is required".to_owned()))?,
        );
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let ledger = Arc::new(LedgerStore::new());
        let auth_subscription = auth.on_auth_state_changed(follow_auth(&store, &ledger));

        Ok(BudgetTracker {
            store,
            auth,
            ledger,
            config,
            in_flight: AtomicBool::new(false),
            _auth_subscription: auth_subscription,
        })
    }
}

/// Listener that attaches the ledger on sign-in and detaches on sign-out.
fn follow_auth<S>(store: &Arc<S>, ledger: &Arc<LedgerStore>) -> AuthListener
where
    S: DocumentStore + 'static,
{
    let store = Arc::downgrade(store);
    let ledger = Arc::downgrade(ledger);
    Arc::new(move |user: Option<User>| {
        let (Some(live_store), Some(live_ledger)) = (store.upgrade(), ledger.upgrade()) else {
            return;
        };
        let outcome = match user {
            Some(signed_in) => {
                tracing::debug!(uid = %signed_in.uid, "auth state: signed in");
                live_ledger.attach(&*live_store, signed_in)
            }
            None => {
                tracing::debug!("auth state: signed out");
                live_ledger.detach()
            }
        };
        if let Err(err) = outcome {
            tracing::error!(error = %err, "failed to follow auth state");
        }
    })
}

/// A user's budget-tracking session.
///
/// # Example
///
/// ```rust
/// use nova_budget::auth::InMemoryAuth;
/// use nova_budget::store::InMemoryDocumentStore;
/// use nova_budget::tracker::BudgetTracker;
///
/// let tracker = BudgetTracker::builder()
///     .store(InMemoryDocumentStore::new())
///     .auth(InMemoryAuth::new())
///     .build()?;
/// assert!(tracker.current_user()?.is_none());
/// # Ok::<(), nova_budget::error::BudgetError>(())
/// ```
#[derive(Debug)]
pub struct BudgetTracker<S, A> {
    /// Document store backend.
    store: Arc<S>,
    /// Identity provider.
    auth: Arc<A>,
    /// Cache of the signed-in user's collections.
    ledger: Arc<LedgerStore>,
    /// Display and threshold settings.
    config: TrackerConfig,
    /// Set while a mutation is being saved.
    in_flight: AtomicBool,
    /// Keeps the ledger following the auth state; cancelled on drop.
    _auth_subscription: Subscription,
}

impl<S, A> BudgetTracker<S, A>
where
    S: DocumentStore + 'static,
    A: AuthService + 'static,
{
    /// Creates a new builder.
    #[inline]
    #[must_use]
    pub const fn builder() -> BudgetTrackerBuilder<S, A> {
        BudgetTrackerBuilder {
            store: None,
            auth: None,
            config: None,
        }
    }

    /// Active configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Document store backend.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Identity provider.
    #[inline]
    #[must_use]
    pub fn auth(&self) -> &A {
        &self.auth
    }

    /// Session cache.
    #[inline]
    #[must_use]
    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    /// Returns `true` while a mutation is being saved.
    #[inline]
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    // Session

    /// User the session belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn current_user(&self) -> Result<Option<User>> {
        self.ledger.user()
    }

    /// Signs in and attaches the ledger to the user's collections.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::Auth`] with a user-facing message if the
    /// provider rejects the credentials.
    #[tracing::instrument(skip_all)]
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<User> {
        let user = self.auth.sign_in(email, password).await?;
        self.ensure_attached(&user)?;
        tracing::debug!(uid = %user.uid, "signed in");
        Ok(user)
    }

    /// Registers, signs in, and attaches the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::Auth`] with a user-facing message if the
    /// provider rejects the registration.
    #[tracing::instrument(skip_all)]
    pub async fn sign_up(&self, email: &str, password: &SecretString) -> Result<User> {
        let user = self.auth.sign_up(email, password).await?;
        self.ensure_attached(&user)?;
        tracing::debug!(uid = %user.uid, "signed up");
        Ok(user)
    }

    /// Detaches the ledger, then ends the provider session.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails; the ledger is detached
    /// regardless.
    #[tracing::instrument(skip_all)]
    pub async fn sign_out(&self) -> Result<()> {
        self.ledger.detach()?;
        self.auth.sign_out().await?;
        tracing::debug!("signed out");
        Ok(())
    }

    /// User a mutation runs for.
    ///
    /// Without a session this reports [`AuthError::SessionExpired`] when the
    /// provider revoked it, and [`BudgetError::NotSignedIn`] otherwise.
    ///
    /// [`AuthError::SessionExpired`]: crate::error::AuthError::SessionExpired
    fn session_user(&self) -> Result<User> {
        if let Some(user) = self.ledger.user()? {
            return Ok(user);
        }
        let _current = self.auth.check_session()?;
        Err(BudgetError::NotSignedIn)
    }

    /// Attaches the ledger unless the auth listener already did.
    fn ensure_attached(&self, user: &User) -> Result<()> {
        if self.ledger.user()?.as_ref() != Some(user) {
            self.ledger.attach(&*self.store, user.clone())?;
        }
        Ok(())
    }

    // Accounts

    /// Cached accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn accounts(&self) -> Result<Vec<Account>> {
        self.ledger.accounts()
    }

    /// Opens an account with its opening balance.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::Busy`] if another mutation is running,
    /// [`BudgetError::NotSignedIn`] without a session, a validation error
    /// for a blank name, or the store error.
    #[tracing::instrument(skip_all)]
    pub async fn create_account(&self, account: NewAccount) -> Result<AccountId> {
        let _guard = MutationGuard::acquire(&self.in_flight)?;
        let user = self.session_user()?;
        let account = account.validate()?;
        let id = self.store.add_account(&user.uid, account).await?;
        tracing::debug!(%id, "account created");
        Ok(id)
    }

    /// Renames or retypes an account. Balance is untouched.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_account`], plus [`BudgetError::NotFound`].
    #[tracing::instrument(skip_all, fields(%id))]
    pub async fn update_account(&self, id: &AccountId, patch: AccountPatch) -> Result<()> {
        let _guard = MutationGuard::acquire(&self.in_flight)?;
        let user = self.session_user()?;
        let patch = patch.validate()?;
        self.store.update_account(&user.uid, id, patch).await
    }

    /// Deletes an account. Transactions that reference it are kept, and
    /// later reversals skip the missing side.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::Busy`], [`BudgetError::NotSignedIn`], or the
    /// store error.
    #[tracing::instrument(skip_all, fields(%id))]
    pub async fn delete_account(&self, id: &AccountId) -> Result<()> {
        let _guard = MutationGuard::acquire(&self.in_flight)?;
        let user = self.session_user()?;
        self.store.delete_account(&user.uid, id).await?;
        let orphaned = aggregation::account_transactions(&self.ledger.transactions()?, id).len();
        if orphaned > 0 {
            tracing::warn!(orphaned, "deleted account is still referenced by transactions");
        }
        Ok(())
    }

    // Transactions

    /// Cached transactions, newest date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn transactions(&self) -> Result<Vec<Transaction>> {
        self.ledger.transactions()
    }

    /// Cached transactions that move money in or out of `account`, newest
    /// date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn account_transactions(&self, account: &AccountId) -> Result<Vec<Transaction>> {
        Ok(aggregation::account_transactions(&self.ledger.transactions()?, account))
    }

    /// Records a transaction and applies its balance effect.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::Busy`] if another mutation is running, or any
    /// error from [`Reconciler::create`].
    #[inline]
    pub async fn add_transaction(&self, draft: TransactionDraft) -> Result<ReconcileReport> {
        let _guard = MutationGuard::acquire(&self.in_flight)?;
        let _user = self.session_user()?;
        self.reconciler().create(draft).await
    }

    /// Edits a transaction, moving balances from its old effect to the new.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::Busy`] if another mutation is running, or any
    /// error from [`Reconciler::update`].
    #[inline]
    pub async fn update_transaction(
        &self,
        id: &TransactionId,
        draft: TransactionDraft,
    ) -> Result<ReconcileReport> {
        let _guard = MutationGuard::acquire(&self.in_flight)?;
        let _user = self.session_user()?;
        self.reconciler().update(id, draft).await
    }

    /// Reverses a transaction's balance effect and deletes it.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::Busy`] if another mutation is running, or any
    /// error from [`Reconciler::delete`].
    #[inline]
    pub async fn delete_transaction(&self, id: &TransactionId) -> Result<ReconcileReport> {
        let _guard = MutationGuard::acquire(&self.in_flight)?;
        let _user = self.session_user()?;
        self.reconciler().delete(id).await
    }

    /// Reconciler over this session's store and cache.
    fn reconciler(&self) -> Reconciler<'_, S> {
        Reconciler::new(&*self.store, &self.ledger)
    }

    // Budgets

    /// Cached budgets.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn budgets(&self) -> Result<Vec<Budget>> {
        self.ledger.budgets()
    }

    /// Creates a monthly budget.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::Busy`], [`BudgetError::NotSignedIn`], a
    /// validation error for a non-positive limit, or the store error.
    #[tracing::instrument(skip_all)]
    pub async fn create_budget(&self, budget: NewBudget) -> Result<BudgetId> {
        let _guard = MutationGuard::acquire(&self.in_flight)?;
        let user = self.session_user()?;
        let budget = budget.validate()?;
        let id = self.store.add_budget(&user.uid, budget).await?;
        tracing::debug!(%id, "budget created");
        Ok(id)
    }

    /// Changes a budget's category or limit.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_budget`], plus [`BudgetError::NotFound`].
    #[tracing::instrument(skip_all, fields(%id))]
    pub async fn update_budget(&self, id: &BudgetId, patch: BudgetPatch) -> Result<()> {
        let _guard = MutationGuard::acquire(&self.in_flight)?;
        let user = self.session_user()?;
        let patch = patch.validate()?;
        self.store.update_budget(&user.uid, id, patch).await
    }

    /// Deletes a budget.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::Busy`], [`BudgetError::NotSignedIn`], or the
    /// store error.
    #[tracing::instrument(skip_all, fields(%id))]
    pub async fn delete_budget(&self, id: &BudgetId) -> Result<()> {
        let _guard = MutationGuard::acquire(&self.in_flight)?;
        let user = self.session_user()?;
        self.store.delete_budget(&user.uid, id).await
    }

    // Views

    /// Total balance, `today`'s month totals, and recent transactions.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn dashboard(&self, today: NaiveDate) -> Result<DashboardSummary> {
        let snapshot = self.ledger.snapshot()?;
        Ok(DashboardSummary::build(
            &snapshot.accounts,
            &snapshot.transactions,
            today,
            &self.config,
        ))
    }

    /// Income and expense for `month`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn monthly_totals(&self, month: YearMonth) -> Result<MonthlyTotals> {
        Ok(aggregation::monthly_totals(&self.ledger.transactions()?, month))
    }

    /// Expense per category for `month`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn category_spend(&self, month: YearMonth) -> Result<CategorySpend> {
        Ok(aggregation::category_spend(&self.ledger.transactions()?, month))
    }

    /// Every budget with its usage in `month`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn budget_progress(&self, month: YearMonth) -> Result<Vec<BudgetProgress>> {
        let snapshot = self.ledger.snapshot()?;
        Ok(aggregation::budget_progress(
            &snapshot.budgets,
            &snapshot.transactions,
            month,
            &self.config,
        ))
    }

    /// `month`'s transactions grouped by day.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn day_buckets(&self, month: YearMonth) -> Result<BTreeMap<u32, DayBucket>> {
        Ok(aggregation::day_buckets(&self.ledger.transactions()?, month))
    }

    /// Calendar grid for `month`, highlighting `today`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn calendar(&self, month: YearMonth, today: NaiveDate) -> Result<CalendarMonth> {
        Ok(CalendarMonth::build(
            &self.ledger.transactions()?,
            month,
            today,
            &self.config,
        ))
    }

    /// Everything booked on `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn day_detail(&self, date: NaiveDate) -> Result<DayDetail> {
        Ok(aggregation::day_detail(&self.ledger.transactions()?, date))
    }

    /// Listener failures reported since the collections last delivered.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn faults(&self) -> Result<Vec<SubscriptionFault>> {
        self.ledger.faults()
    }
}

/// Marks a mutation as in flight for as long as it lives.
#[derive(Debug)]
struct MutationGuard<'flag> {
    /// Flag cleared on drop.
    flag: &'flag AtomicBool,
}

impl<'flag> MutationGuard<'flag> {
    /// Sets the flag, or fails with [`BudgetError::Busy`] if already set.
    fn acquire(flag: &'flag AtomicBool) -> Result<Self> {
        let _previous = flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_current| {
                tracing::warn!("rejecting mutation: another change is still being saved");
                BudgetError::Busy
            })?;
        Ok(Self { flag })
    }
}

impl Drop for MutationGuard<'_> {
    #[inline]
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Today's date in the local time zone.
#[inline]
#[must_use]
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[cfg(test)]
mod invariants;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::InMemoryAuth;
    use crate::error::{AuthError, ValidationError};
    use crate::models::{AccountType, Category};
    use crate::store::{Collection, InMemoryDocumentStore};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    type Tracker = BudgetTracker<InMemoryDocumentStore, InMemoryAuth>;

    fn password() -> SecretString {
        SecretString::from("correct horse".to_owned())
    }

    fn tracker() -> Tracker {
        BudgetTracker::builder()
            .store(InMemoryDocumentStore::new())
            .auth(InMemoryAuth::new())
            .build()
            .unwrap()
    }

    async fn signed_in() -> Tracker {
        let tracker = tracker();
        let _user = tracker.sign_up("ana@example.com", &password()).await.unwrap();
        tracker
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn builder_requires_store_and_auth() {
        let missing_store = BudgetTracker::<InMemoryDocumentStore, InMemoryAuth>::builder()
            .auth(InMemoryAuth::new())
            .build();
        assert!(matches!(missing_store, Err(BudgetError::Config(_))));

        let missing_auth = BudgetTracker::<InMemoryDocumentStore, InMemoryAuth>::builder()
            .store(InMemoryDocumentStore::new())
            .build();
        assert!(matches!(missing_auth, Err(BudgetError::Config(_))));
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let config = TrackerConfig {
            warning_percent: dec!(95),
            danger_percent: dec!(50),
            ..TrackerConfig::default()
        };
        let result = BudgetTracker::builder()
            .store(InMemoryDocumentStore::new())
            .auth(InMemoryAuth::new())
            .config(config)
            .build();
        assert!(matches!(result, Err(BudgetError::Config(_))));
    }

    #[tokio::test]
    async fn mutations_require_a_session() {
        let tracker = tracker();
        let result = tracker
            .create_account(NewAccount::new("Main", AccountType::Bank, dec!(0)))
            .await;
        let err = result.unwrap_err();
        assert!(matches!(err, BudgetError::NotSignedIn));
        assert!(err.requires_reauth());
    }

    #[tokio::test]
    async fn sign_in_attaches_existing_data() {
        let tracker = signed_in().await;
        let _id = tracker
            .create_account(NewAccount::new("Main", AccountType::Bank, dec!(10)))
            .await
            .unwrap();
        tracker.sign_out().await.unwrap();
        assert!(tracker.accounts().unwrap().is_empty());

        let user = tracker.sign_in("ana@example.com", &password()).await.unwrap();
        assert_eq!(tracker.current_user().unwrap(), Some(user));
        assert_eq!(tracker.accounts().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejected_sign_in_surfaces_message() {
        let tracker = tracker();
        let err = tracker
            .sign_in("nobody@example.com", &password())
            .await
            .unwrap_err();
        assert!(matches!(err, BudgetError::Auth(AuthError::InvalidCredentials)));
        assert_eq!(err.to_string(), "The email or password is incorrect.");
        assert!(!err.requires_reauth());
    }

    #[tokio::test]
    async fn expired_session_detaches_ledger() {
        let tracker = signed_in().await;
        let _id = tracker
            .create_account(NewAccount::new("Main", AccountType::Bank, dec!(10)))
            .await
            .unwrap();
        tracker.auth().expire_session().unwrap();
        assert!(tracker.current_user().unwrap().is_none());
        assert!(tracker.accounts().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mutations_after_revoked_session_report_expiry() {
        let tracker = signed_in().await;
        tracker.auth().expire_session().unwrap();

        let err = tracker
            .create_budget(NewBudget::new(Category::Food, dec!(10)))
            .await
            .unwrap_err();
        assert!(matches!(err, BudgetError::Auth(AuthError::SessionExpired)));
        assert!(err.requires_reauth());
        assert_eq!(err.to_string(), "Your session has expired. Please sign in again.");
        assert!(!tracker.is_busy());

        let _user = tracker.sign_in("ana@example.com", &password()).await.unwrap();
        assert!(
            tracker
                .create_budget(NewBudget::new(Category::Food, dec!(10)))
                .await
                .is_ok()
        );

        tracker.sign_out().await.unwrap();
        let err = tracker
            .add_transaction(TransactionDraft::expense(dec!(1), AccountId::from("gone"), Category::Food, day(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, BudgetError::NotSignedIn));
    }

    #[tokio::test]
    async fn tiny_budget_limit_reports_full_usage() {
        let tracker = signed_in().await;
        let account = tracker
            .create_account(NewAccount::new("Main", AccountType::Bank, dec!(0)))
            .await
            .unwrap();
        let _budget = tracker
            .create_budget(NewBudget::new(Category::Food, Decimal::new(1, 22)))
            .await
            .unwrap();
        let _report = tracker
            .add_transaction(TransactionDraft::expense(dec!(100000000), account, Category::Food, day(8)))
            .await
            .unwrap();

        let progress = tracker.budget_progress(YearMonth::new(2024, 5).unwrap()).unwrap();
        assert_eq!(progress[0].percent, dec!(100));
        assert_eq!(progress[0].tier, aggregation::BudgetTier::Danger);
    }

    #[tokio::test]
    async fn overflowing_balance_surfaces_store_error() {
        let tracker = signed_in().await;
        let account = tracker
            .create_account(NewAccount::new("Vault", AccountType::Savings, Decimal::MAX))
            .await
            .unwrap();
        let err = tracker
            .add_transaction(TransactionDraft::income(dec!(1), account.clone(), Category::Salary, day(9)))
            .await
            .unwrap_err();
        assert!(matches!(err, BudgetError::Store(_)));
        assert!(!err.requires_reauth());
        assert_eq!(tracker.ledger().account(&account).unwrap().unwrap().balance, Decimal::MAX);
        assert!(!tracker.is_busy());
    }

    #[tokio::test]
    async fn account_listing_follows_the_cache() {
        let tracker = signed_in().await;
        let main = tracker
            .create_account(NewAccount::new("Main", AccountType::Bank, dec!(100)))
            .await
            .unwrap();
        let wallet = tracker
            .create_account(NewAccount::new("Wallet", AccountType::Cash, dec!(0)))
            .await
            .unwrap();
        let _coffee = tracker
            .add_transaction(TransactionDraft::expense(dec!(3), main.clone(), Category::Food, day(2)))
            .await
            .unwrap();
        let _top_up = tracker
            .add_transaction(TransactionDraft::transfer(dec!(20), main.clone(), wallet.clone(), day(5)))
            .await
            .unwrap();

        assert_eq!(tracker.account_transactions(&main).unwrap().len(), 2);
        let wallet_activity = tracker.account_transactions(&wallet).unwrap();
        assert_eq!(wallet_activity.len(), 1);
        assert_eq!(wallet_activity[0].amount, dec!(20));
    }

    #[tokio::test]
    async fn second_mutation_while_busy_is_rejected() {
        let tracker = signed_in().await;
        let guard = MutationGuard::acquire(&tracker.in_flight).unwrap();
        assert!(tracker.is_busy());
        let result = tracker
            .create_budget(NewBudget::new(Category::Food, dec!(100)))
            .await;
        assert!(matches!(result, Err(BudgetError::Busy)));
        drop(guard);

        assert!(!tracker.is_busy());
        assert!(
            tracker
                .create_budget(NewBudget::new(Category::Food, dec!(100)))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn guard_is_released_after_a_failed_mutation() {
        let tracker = signed_in().await;
        let result = tracker
            .create_budget(NewBudget::new(Category::Food, dec!(0)))
            .await;
        assert!(matches!(
            result,
            Err(BudgetError::Validation(ValidationError::NonPositiveLimit(_)))
        ));
        assert!(!tracker.is_busy());
    }

    #[tokio::test]
    async fn account_edits_do_not_touch_balance() {
        let tracker = signed_in().await;
        let id = tracker
            .create_account(NewAccount::new("  Wallet ", AccountType::Cash, dec!(42)))
            .await
            .unwrap();
        tracker
            .update_account(&id, AccountPatch::new().name("Pocket").kind(AccountType::Savings))
            .await
            .unwrap();
        let account = tracker.ledger().account(&id).unwrap().unwrap();
        assert_eq!(account.name, "Pocket");
        assert_eq!(account.kind, AccountType::Savings);
        assert_eq!(account.balance, dec!(42));
    }

    #[tokio::test]
    async fn budget_crud_and_progress() {
        let tracker = signed_in().await;
        let account = tracker
            .create_account(NewAccount::new("Main", AccountType::Bank, dec!(1000)))
            .await
            .unwrap();
        let budget = tracker
            .create_budget(NewBudget::new(Category::Food, dec!(200)))
            .await
            .unwrap();
        let _report = tracker
            .add_transaction(TransactionDraft::expense(dec!(150), account, Category::Food, day(4)))
            .await
            .unwrap();

        let may = YearMonth::new(2024, 5).unwrap();
        let progress = tracker.budget_progress(may).unwrap();
        assert_eq!(progress[0].percent, dec!(75));

        tracker
            .update_budget(&budget, BudgetPatch::new().limit(dec!(1000)))
            .await
            .unwrap();
        assert_eq!(tracker.budget_progress(may).unwrap()[0].percent, dec!(15));

        tracker.delete_budget(&budget).await.unwrap();
        assert!(tracker.budgets().unwrap().is_empty());
    }

    #[tokio::test]
    async fn views_read_the_latest_cache() {
        let tracker = signed_in().await;
        let account = tracker
            .create_account(NewAccount::new("Main", AccountType::Bank, dec!(500)))
            .await
            .unwrap();
        let _salary = tracker
            .add_transaction(TransactionDraft::income(dec!(2000), account.clone(), Category::Salary, day(1)))
            .await
            .unwrap();
        let _rent = tracker
            .add_transaction(TransactionDraft::expense(dec!(800), account, Category::Bills, day(1)))
            .await
            .unwrap();

        let may = YearMonth::new(2024, 5).unwrap();
        let dashboard = tracker.dashboard(day(20)).unwrap();
        assert_eq!(dashboard.total_balance, dec!(1700));
        assert_eq!(dashboard.totals.net(), dec!(1200));
        assert_eq!(tracker.monthly_totals(may).unwrap().income, dec!(2000));
        assert_eq!(tracker.category_spend(may).unwrap().get(Category::Bills), dec!(800));
        assert_eq!(tracker.day_buckets(may).unwrap().len(), 1);
        assert_eq!(tracker.day_detail(day(1)).unwrap().count(), 2);

        let calendar = tracker.calendar(may, day(1)).unwrap();
        assert!(calendar.day(1).unwrap().is_today);
        assert_eq!(calendar.day(1).unwrap().bars.expense, dec!(40));
    }

    #[tokio::test]
    async fn subscription_faults_are_reported_and_cleared() {
        let tracker = signed_in().await;
        let uid = tracker.current_user().unwrap().unwrap().uid;
        tracker
            .store()
            .fail_subscriptions(&uid, Collection::Budgets, "quota exceeded")
            .unwrap();
        assert_eq!(tracker.faults().unwrap().len(), 1);

        let _id = tracker
            .create_budget(NewBudget::new(Category::Health, dec!(50)))
            .await
            .unwrap();
        assert!(tracker.faults().unwrap().is_empty());
    }
}
