use crate::error::{CashFlowError, Result};
use crate::schema::{PlannedItem, StoredBudget, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Opaque identity of the account that owns a set of records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Record access for the forecasting operations. Every call is scoped to one account.
pub trait ForecastStore {
    fn transactions(&self, account: &AccountId) -> Result<Vec<Transaction>>;

    fn planned_income(&self, account: &AccountId) -> Result<Vec<PlannedItem>>;

    fn planned_expenses(&self, account: &AccountId) -> Result<Vec<PlannedItem>>;

    fn budget(&self, account: &AccountId) -> Result<Option<StoredBudget>>;

    fn save_budget(&self, account: &AccountId, budget: StoredBudget) -> Result<()>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountData {
    pub transactions: Vec<Transaction>,
    pub planned_income: Vec<PlannedItem>,
    pub planned_expenses: Vec<PlannedItem>,
    pub budget: Option<StoredBudget>,
}

/// An in-process store, constructed and handed to whoever needs it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<AccountId, AccountData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_transactions(
        &self,
        account: &AccountId,
        transactions: Vec<Transaction>,
    ) -> Result<()> {
        self.write()?
            .entry(account.clone())
            .or_default()
            .transactions
            .extend(transactions);
        Ok(())
    }

    pub fn set_planned_income(
        &self,
        account: &AccountId,
        items: Vec<PlannedItem>,
    ) -> Result<()> {
        self.write()?.entry(account.clone()).or_default().planned_income = items;
        Ok(())
    }

    pub fn set_planned_expenses(
        &self,
        account: &AccountId,
        items: Vec<PlannedItem>,
    ) -> Result<()> {
        self.write()?.entry(account.clone()).or_default().planned_expenses = items;
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<AccountId, AccountData>>> {
        self.accounts
            .read()
            .map_err(|_| CashFlowError::Store("account map lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<AccountId, AccountData>>> {
        self.accounts
            .write()
            .map_err(|_| CashFlowError::Store("account map lock poisoned".to_string()))
    }

    fn read_field<T, F>(&self, account: &AccountId, field: F) -> Result<T>
    where
        T: Default,
        F: FnOnce(&AccountData) -> T,
    {
        Ok(self.read()?.get(account).map(field).unwrap_or_default())
    }
}

impl ForecastStore for MemoryStore {
    fn transactions(&self, account: &AccountId) -> Result<Vec<Transaction>> {
        self.read_field(account, |data| data.transactions.clone())
    }

    fn planned_income(&self, account: &AccountId) -> Result<Vec<PlannedItem>> {
        self.read_field(account, |data| data.planned_income.clone())
    }

    fn planned_expenses(&self, account: &AccountId) -> Result<Vec<PlannedItem>> {
        self.read_field(account, |data| data.planned_expenses.clone())
    }

    fn budget(&self, account: &AccountId) -> Result<Option<StoredBudget>> {
        self.read_field(account, |data| data.budget.clone())
    }

    fn save_budget(&self, account: &AccountId, budget: StoredBudget) -> Result<()> {
        self.write()?.entry(account.clone()).or_default().budget = Some(budget);
        Ok(())
    }
}
