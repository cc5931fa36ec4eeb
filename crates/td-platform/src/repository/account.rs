//! Account Repository
//!
//! Account persistence and authentication. This is the only component
//! that reads password hashes; everything above it sees the entity only
//! through DTOs that drop the hash.

use std::sync::Arc;

use mongodb::{bson::doc, options::FindOptions, Collection, Database};
use futures::TryStreamExt;
use tracing::{info, warn};

use crate::domain::{Account, AccountPatch, NewAccount};
use crate::error::{AppError, Result};
use crate::service::PasswordService;
use crate::tsid::TsidGenerator;

use super::is_duplicate_key_error;

pub struct AccountRepository {
    collection: Collection<Account>,
    passwords: Arc<PasswordService>,
}

impl AccountRepository {
    pub fn new(db: &Database, passwords: Arc<PasswordService>) -> Self {
        Self {
            collection: db.collection("accounts"),
            passwords,
        }
    }

    /// Create an account. The username (and email, when present) must be
    /// unused; the password is hashed here and never stored as given.
    pub async fn create(&self, new_account: NewAccount) -> Result<Account> {
        if self.find_by_username(&new_account.username).await?.is_some() {
            return Err(AppError::duplicate("Account", "username", &new_account.username));
        }
        if let Some(ref email) = new_account.email {
            if self.find_by_email(email).await?.is_some() {
                return Err(AppError::duplicate("Account", "email", email));
            }
        }

        let password_hash = self.passwords.hash_password(&new_account.password)?;
        let mut account = Account::new(new_account.username, password_hash);
        if let Some(email) = new_account.email {
            account = account.with_email(email);
        }
        if let Some(full_name) = new_account.full_name {
            account = account.with_full_name(full_name);
        }

        if let Err(err) = self.collection.insert_one(&account).await {
            // Lost a uniqueness race to a concurrent insert.
            if is_duplicate_key_error(&err) {
                return Err(AppError::duplicate("Account", "username", &account.username));
            }
            return Err(err.into());
        }

        info!(username = %account.username, "account created");
        Ok(account)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Account>> {
        if !TsidGenerator::is_valid(id) {
            return Ok(None);
        }
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    /// Lookup by username. The returned entity carries the password hash;
    /// it exists for authentication and must not leak past the API DTOs.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        Ok(self.collection.find_one(doc! { "username": username }).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    /// List accounts ordered by creation time ascending.
    pub async fn list(
        &self,
        skip: u64,
        limit: i64,
        is_active: Option<bool>,
    ) -> Result<Vec<Account>> {
        let mut filter = doc! {};
        if let Some(active) = is_active {
            filter.insert("isActive", active);
        }

        let options = FindOptions::builder()
            .sort(doc! { "createdAt": 1 })
            .skip(skip)
            .limit(limit)
            .build();

        let cursor = self.collection.find(filter).with_options(options).await?;
        Ok(cursor.try_collect().await?)
    }

    /// Apply a partial update. Only supplied fields change; a password in
    /// the patch is re-hashed. The updated timestamp always refreshes.
    /// Returns `None` when the id does not exist.
    pub async fn update(&self, id: &str, patch: AccountPatch) -> Result<Option<Account>> {
        let Some(mut account) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        if patch.is_empty() {
            return Ok(Some(account));
        }

        if let Some(ref email) = patch.email {
            if account.email.as_deref() != Some(email.as_str()) {
                if self.find_by_email(email).await?.is_some() {
                    return Err(AppError::duplicate("Account", "email", email));
                }
            }
            account.email = Some(email.clone());
        }
        if let Some(full_name) = patch.full_name {
            account.full_name = Some(full_name);
        }
        if let Some(ref password) = patch.password {
            let hash = self.passwords.hash_password(password)?;
            account.set_password_hash(hash);
            info!(username = %account.username, "password rotated");
        }
        if let Some(active) = patch.is_active {
            if active {
                account.activate();
            } else {
                account.deactivate();
            }
        }
        account.updated_at = chrono::Utc::now();

        if let Err(err) = self
            .collection
            .replace_one(doc! { "_id": &account.id }, &account)
            .await
        {
            if is_duplicate_key_error(&err) {
                return Err(AppError::duplicate(
                    "Account",
                    "email",
                    account.email.as_deref().unwrap_or_default(),
                ));
            }
            return Err(err.into());
        }

        Ok(Some(account))
    }

    /// Hard delete. Returns whether a record was removed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        if !TsidGenerator::is_valid(id) {
            return Ok(false);
        }
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    /// Flip the superuser flag. Not reachable through the public API;
    /// used by startup seeding.
    pub async fn promote_to_superuser(&self, id: &str) -> Result<Option<Account>> {
        let Some(mut account) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        account.is_superuser = true;
        account.updated_at = chrono::Utc::now();
        self.collection
            .replace_one(doc! { "_id": &account.id }, &account)
            .await?;
        Ok(Some(account))
    }

    pub async fn set_active(&self, id: &str, active: bool) -> Result<Option<Account>> {
        self.update(
            id,
            AccountPatch {
                is_active: Some(active),
                ..Default::default()
            },
        )
        .await
    }

    /// Authenticate by username and password. Unknown username, inactive
    /// account, and wrong password all yield `None`; callers cannot tell
    /// which check failed.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<Account>> {
        let Some(account) = self.find_by_username(username).await? else {
            warn!(username = %username, "authentication failed");
            return Ok(None);
        };
        if !account.is_active {
            warn!(username = %username, "authentication failed");
            return Ok(None);
        }
        if !self.passwords.verify_password(password, &account.password_hash) {
            warn!(username = %username, "authentication failed");
            return Ok(None);
        }
        info!(username = %username, "account authenticated");
        Ok(Some(account))
    }

    pub async fn count(&self, is_active: Option<bool>) -> Result<u64> {
        let mut filter = doc! {};
        if let Some(active) = is_active {
            filter.insert("isActive", active);
        }
        Ok(self.collection.count_documents(filter).await?)
    }
}
