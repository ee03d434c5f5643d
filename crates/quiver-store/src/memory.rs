//! In-process implementation of [`Store`].

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::{
    error::{StoreError, StoreResult},
    model::{
        account::{Account, NewAccount, Role},
        space::{NewSpace, ProtectionChange, Space, SpaceUpdate},
    },
    store::Store,
};

#[derive(Debug, Default)]
struct Inner {
    /// Insertion order is creation order.
    accounts: Vec<Account>,
    spaces: Vec<Space>,
}

impl Inner {
    fn insert_account(&mut self, account: NewAccount) -> StoreResult<Account> {
        if self.accounts.iter().any(|a| a.username == account.username) {
            return Err(StoreError::Conflict(format!(
                "username {} is already taken",
                account.username
            )));
        }

        let role = if self.accounts.is_empty() {
            Role::Admin
        } else {
            Role::Member
        };

        let account = Account {
            id: uuid::Uuid::now_v7(),
            username: account.username,
            password_hash: account.password_hash,
            role,
            created_at: Utc::now(),
            api_key_digest: None,
        };
        self.accounts.push(account.clone());

        tracing::debug!(user_id = %account.id, role = %account.role, "Account stored");

        Ok(account)
    }

    fn insert_space(&mut self, space: NewSpace) -> StoreResult<Space> {
        if !self.accounts.iter().any(|a| a.id == space.owner_id) {
            return Err(StoreError::NotFound(format!("account {}", space.owner_id)));
        }

        let now = Utc::now();
        let space = Space {
            id: uuid::Uuid::now_v7(),
            owner_id: space.owner_id,
            name: space.name,
            is_encrypted: space.password_hash.is_some(),
            password_hash: space.password_hash,
            created_at: now,
            updated_at: now,
        };
        self.spaces.push(space.clone());

        Ok(space)
    }

    fn account_mut(&mut self, id: uuid::Uuid) -> StoreResult<&mut Account> {
        self.accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("account {id}")))
    }
}

/// Accounts and spaces held in memory behind a single lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a space record as-is, without normalizing its protection fields.
    ///
    /// Used to load records from an external source that may not uphold the
    /// encryption invariant.
    pub fn import_space(&self, space: Space) {
        self.write().spaces.push(space);
    }

    /// Acquires the read lock, recovering from poisoning.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                self.inner.clear_poison();
                poisoned.into_inner()
            }
        }
    }

    /// Acquires the write lock, recovering from poisoning.
    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                self.inner.clear_poison();
                poisoned.into_inner()
            }
        }
    }
}

impl Store for MemoryStore {
    fn account_count(&self) -> StoreResult<usize> {
        Ok(self.read().accounts.len())
    }

    fn initialize(&self, account: NewAccount, space_name: &str) -> StoreResult<(Account, Space)> {
        let mut inner = self.write();
        if !inner.accounts.is_empty() {
            return Err(StoreError::Conflict(
                "system is already initialized".to_string(),
            ));
        }

        let account = inner.insert_account(account)?;
        let space = inner.insert_space(NewSpace {
            owner_id: account.id,
            name: space_name.to_string(),
            password_hash: None,
        })?;

        Ok((account, space))
    }

    fn create_account(&self, account: NewAccount) -> StoreResult<Account> {
        self.write().insert_account(account)
    }

    fn account_by_id(&self, id: uuid::Uuid) -> StoreResult<Option<Account>> {
        Ok(self.read().accounts.iter().find(|a| a.id == id).cloned())
    }

    fn account_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .read()
            .accounts
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    fn accounts(&self) -> StoreResult<Vec<Account>> {
        Ok(self.read().accounts.clone())
    }

    fn set_password_hash(&self, id: uuid::Uuid, password_hash: String) -> StoreResult<Account> {
        let mut inner = self.write();
        let account = inner.account_mut(id)?;
        account.password_hash = password_hash;
        Ok(account.clone())
    }

    fn set_api_key_digest(&self, id: uuid::Uuid, digest: String) -> StoreResult<Account> {
        let mut inner = self.write();
        let account = inner.account_mut(id)?;
        account.api_key_digest = Some(digest);
        Ok(account.clone())
    }

    fn create_space(&self, space: NewSpace) -> StoreResult<Space> {
        self.write().insert_space(space)
    }

    fn space_by_id(&self, id: uuid::Uuid) -> StoreResult<Option<Space>> {
        Ok(self.read().spaces.iter().find(|s| s.id == id).cloned())
    }

    fn spaces(&self, owner: Option<uuid::Uuid>) -> StoreResult<Vec<Space>> {
        Ok(self
            .read()
            .spaces
            .iter()
            .filter(|s| owner.is_none_or(|owner| s.owner_id == owner))
            .cloned()
            .collect())
    }

    fn update_space(&self, id: uuid::Uuid, update: SpaceUpdate) -> StoreResult<Space> {
        let mut inner = self.write();
        let space = inner
            .spaces
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("space {id}")))?;

        if let Some(name) = update.name {
            space.name = name;
        }
        match update.protection {
            ProtectionChange::Keep => {}
            ProtectionChange::Enable(hash) => {
                space.is_encrypted = true;
                space.password_hash = Some(hash);
            }
            ProtectionChange::Disable => {
                space.is_encrypted = false;
                space.password_hash = None;
            }
        }
        space.updated_at = Utc::now();

        Ok(space.clone())
    }

    fn delete_space(&self, id: uuid::Uuid) -> StoreResult<()> {
        let mut inner = self.write();
        let before = inner.spaces.len();
        inner.spaces.retain(|s| s.id != id);
        if inner.spaces.len() == before {
            return Err(StoreError::NotFound(format!("space {id}")));
        }
        Ok(())
    }
}
