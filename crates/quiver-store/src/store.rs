use crate::{
    error::StoreResult,
    model::{
        account::{Account, NewAccount},
        space::{NewSpace, Space, SpaceUpdate},
    },
};

/// Durable storage for accounts and spaces.
///
/// Implementations must assign [`Role::Admin`](crate::model::account::Role::Admin)
/// to the first account they ever create and `Member` to every later one, and
/// must make that decision atomically with the insert.
pub trait Store: Send + Sync {
    /// ## Summary
    /// Returns the number of accounts.
    ///
    /// ## Errors
    /// Returns an error if the store cannot be read.
    fn account_count(&self) -> StoreResult<usize>;

    /// ## Summary
    /// Creates the first account together with its default space.
    ///
    /// ## Errors
    /// Returns `Conflict` if any account already exists.
    fn initialize(&self, account: NewAccount, space_name: &str) -> StoreResult<(Account, Space)>;

    /// ## Summary
    /// Creates an account, assigning its role by creation order.
    ///
    /// ## Errors
    /// Returns `Conflict` if the username is taken.
    fn create_account(&self, account: NewAccount) -> StoreResult<Account>;

    /// ## Errors
    /// Returns an error if the store cannot be read.
    fn account_by_id(&self, id: uuid::Uuid) -> StoreResult<Option<Account>>;

    /// ## Errors
    /// Returns an error if the store cannot be read.
    fn account_by_username(&self, username: &str) -> StoreResult<Option<Account>>;

    /// ## Summary
    /// Returns every account ordered by creation time, oldest first.
    ///
    /// ## Errors
    /// Returns an error if the store cannot be read.
    fn accounts(&self) -> StoreResult<Vec<Account>>;

    /// ## Errors
    /// Returns `NotFound` if the account does not exist.
    fn set_password_hash(&self, id: uuid::Uuid, password_hash: String) -> StoreResult<Account>;

    /// ## Errors
    /// Returns `NotFound` if the account does not exist.
    fn set_api_key_digest(&self, id: uuid::Uuid, digest: String) -> StoreResult<Account>;

    /// ## Errors
    /// Returns `NotFound` if the owner does not exist.
    fn create_space(&self, space: NewSpace) -> StoreResult<Space>;

    /// ## Errors
    /// Returns an error if the store cannot be read.
    fn space_by_id(&self, id: uuid::Uuid) -> StoreResult<Option<Space>>;

    /// ## Summary
    /// Returns spaces ordered by creation time; all spaces when `owner` is `None`.
    ///
    /// ## Errors
    /// Returns an error if the store cannot be read.
    fn spaces(&self, owner: Option<uuid::Uuid>) -> StoreResult<Vec<Space>>;

    /// ## Errors
    /// Returns `NotFound` if the space does not exist.
    fn update_space(&self, id: uuid::Uuid, update: SpaceUpdate) -> StoreResult<Space>;

    /// ## Summary
    /// Deletes a space. Contained folders and bookmarks go with it.
    ///
    /// ## Errors
    /// Returns `NotFound` if the space does not exist.
    fn delete_space(&self, id: uuid::Uuid) -> StoreResult<()>;
}
