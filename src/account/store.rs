//! Account storage and management

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

use super::auth::CredentialHasher;
use super::types::{parse_birthday, non_empty, Account, AccountChanges, NewAccount};
use crate::assets::{AssetStore, AvatarUpload};
use crate::error::{Collision, ServiceError};
use crate::storage::{Batch, Storage};

const ACCOUNT_PREFIX: &str = "account:";
const USERNAME_PREFIX: &str = "username:";
const EMAIL_PREFIX: &str = "email:";
/// Last sequential id handed out.
const SEQUENCE_KEY: &str = "meta:sequence";

fn account_key(internal_key: &str) -> String {
    format!("{}{}", ACCOUNT_PREFIX, internal_key)
}

fn username_key(username: &str) -> String {
    format!("{}{}", USERNAME_PREFIX, username)
}

fn email_key(email: &str) -> String {
    format!("{}{}", EMAIL_PREFIX, email)
}

/// Registry of all accounts.
///
/// Every mutation runs under `write_lock` and commits one atomic batch, so
/// the duplicate check, id assignment and insert of a create can never
/// interleave with another writer. Reads go straight to storage.
pub struct AccountRegistry {
    storage: Arc<Storage>,
    assets: Arc<AssetStore>,
    hasher: CredentialHasher,
    write_lock: Mutex<()>,
}

impl AccountRegistry {
    pub fn open(
        storage: Arc<Storage>,
        assets: Arc<AssetStore>,
        hasher: CredentialHasher,
    ) -> Result<Self, ServiceError> {
        let registry = Self {
            storage,
            assets,
            hasher,
            write_lock: Mutex::new(()),
        };
        registry.reconcile_sequence()?;
        Ok(registry)
    }

    /// Make sure the persisted counter is not behind the stored records.
    fn reconcile_sequence(&self) -> Result<(), ServiceError> {
        let stored: u64 = self.storage.get(SEQUENCE_KEY)?.unwrap_or(0);
        let highest = self
            .list()?
            .iter()
            .map(|a| a.sequential_id)
            .max()
            .unwrap_or(0);
        if highest > stored {
            warn!("sequence counter {} behind highest id {}, advancing", stored, highest);
            self.storage.put(SEQUENCE_KEY, &highest)?;
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // guards no data of its own; storage batches stay consistent
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All accounts ordered by sequential id
    pub fn list(&self) -> Result<Vec<Account>, ServiceError> {
        let mut accounts: Vec<Account> = self.storage.scan_prefix(ACCOUNT_PREFIX)?;
        accounts.sort_by_key(|a| a.sequential_id);
        Ok(accounts)
    }

    pub fn get(&self, internal_key: &str) -> Result<Option<Account>, ServiceError> {
        Ok(self.storage.get(&account_key(internal_key))?)
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<Account>, ServiceError> {
        self.follow_index(&username_key(username))
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<Account>, ServiceError> {
        self.follow_index(&email_key(email))
    }

    fn follow_index(&self, index_key: &str) -> Result<Option<Account>, ServiceError> {
        match self.storage.get::<String>(index_key)? {
            Some(internal_key) => self.get(&internal_key),
            None => Ok(None),
        }
    }

    /// Authenticate with email and credential
    pub fn authenticate(&self, email: &str, credential: &str) -> Result<Account, ServiceError> {
        if email.is_empty() || credential.is_empty() {
            return Err(ServiceError::InvalidRequest(
                "email and password are required".to_string(),
            ));
        }

        let account = self
            .find_by_email(email)?
            .ok_or(ServiceError::AuthenticationFailed)?;

        match self.hasher.verify(credential, &account.credential_hash) {
            Ok(true) => Ok(account),
            Ok(false) => Err(ServiceError::AuthenticationFailed),
            Err(e) => {
                error!("account {} has an unusable credential hash: {}", account.internal_key, e);
                Err(e.into())
            }
        }
    }

    /// Create a new account
    pub fn create(
        &self,
        new: NewAccount,
        avatar: Option<AvatarUpload>,
    ) -> Result<Account, ServiceError> {
        let username = required(new.username, "username")?;
        let credential = required(new.credential, "password")?;
        let email = required(new.email, "email")?;
        let role = required(new.role, "role")?;
        let birthday = parse_birthday(&required(new.birthday, "birthday")?)?;

        let credential_hash = self.hasher.hash(&credential)?;

        let _guard = self.lock();

        let collision = Collision::from_flags(
            self.storage.contains(&username_key(&username))?,
            self.storage.contains(&email_key(&email))?,
        );
        if let Some(collision) = collision {
            warn!("rejected account {} <{}>: duplicate {}", username, email, collision);
            return Err(ServiceError::DuplicateIdentity(collision));
        }

        let sequential_id = self.storage.get::<u64>(SEQUENCE_KEY)?.unwrap_or(0) + 1;

        let avatar_ref = match avatar {
            Some(upload) => Some(self.assets.store(&upload)?),
            None => None,
        };
        let now = current_timestamp();
        let account = Account {
            internal_key: uuid::Uuid::new_v4().to_string(),
            sequential_id,
            username,
            email,
            credential_hash,
            role,
            birthday,
            avatar_ref,
            created_at: now,
            updated_at: now,
        };

        let persisted = self.write_new(&account);
        if let Err(e) = persisted {
            if let Some(reference) = &account.avatar_ref {
                self.discard_asset(reference);
            }
            return Err(e);
        }

        info!(
            "created account #{} {} ({})",
            account.sequential_id, account.username, account.role
        );
        Ok(account)
    }

    fn write_new(&self, account: &Account) -> Result<(), ServiceError> {
        let mut batch = Batch::default();
        batch.put(&account_key(&account.internal_key), account)?;
        batch.put(&username_key(&account.username), &account.internal_key)?;
        batch.put(&email_key(&account.email), &account.internal_key)?;
        batch.put(SEQUENCE_KEY, &account.sequential_id)?;
        self.storage.commit(batch)?;
        Ok(())
    }

    /// Apply a partial update, optionally replacing the avatar
    pub fn update(
        &self,
        internal_key: &str,
        changes: AccountChanges,
        avatar: Option<AvatarUpload>,
    ) -> Result<Account, ServiceError> {
        if internal_key.is_empty() {
            return Err(ServiceError::InvalidRequest("_id is required".to_string()));
        }

        let username = non_empty(changes.username);
        let email = non_empty(changes.email);
        let role = non_empty(changes.role);
        let birthday = match non_empty(changes.birthday) {
            Some(raw) => Some(parse_birthday(&raw)?),
            None => None,
        };
        let credential_hash = match non_empty(changes.credential) {
            Some(credential) => Some(self.hasher.hash(&credential)?),
            None => None,
        };

        let guard = self.lock();

        let mut account = self
            .get(internal_key)?
            .ok_or_else(|| ServiceError::NotFound(format!("account {}", internal_key)))?;

        let new_username = username.filter(|u| *u != account.username);
        let new_email = email.filter(|e| *e != account.email);
        let collision = Collision::from_flags(
            match &new_username {
                Some(u) => self.storage.contains(&username_key(u))?,
                None => false,
            },
            match &new_email {
                Some(e) => self.storage.contains(&email_key(e))?,
                None => false,
            },
        );
        if let Some(collision) = collision {
            warn!("rejected update of {}: duplicate {}", internal_key, collision);
            return Err(ServiceError::DuplicateIdentity(collision));
        }

        let mut batch = Batch::default();
        if let Some(u) = new_username {
            batch.delete(&username_key(&account.username));
            batch.put(&username_key(&u), &account.internal_key)?;
            account.username = u;
        }
        if let Some(e) = new_email {
            batch.delete(&email_key(&account.email));
            batch.put(&email_key(&e), &account.internal_key)?;
            account.email = e;
        }
        if let Some(r) = role {
            account.role = r;
        }
        if let Some(b) = birthday {
            account.birthday = b;
        }
        if let Some(h) = credential_hash {
            account.credential_hash = h;
        }
        account.updated_at = current_timestamp();

        let new_avatar = match avatar {
            Some(upload) => Some(self.assets.store(&upload)?),
            None => None,
        };
        let replaced_avatar = match &new_avatar {
            Some(reference) => account.avatar_ref.replace(reference.clone()),
            None => None,
        };

        let committed = match batch.put(&account_key(&account.internal_key), &account) {
            Ok(()) => self.storage.commit(batch),
            Err(e) => Err(e),
        };
        if let Err(e) = committed {
            if let Some(reference) = &new_avatar {
                self.discard_asset(reference);
            }
            return Err(e.into());
        }
        drop(guard);

        if let Some(old) = replaced_avatar {
            self.discard_asset(&old);
        }

        info!("updated account #{} {}", account.sequential_id, account.username);
        Ok(account)
    }

    /// Overwrite the credential of the account registered under `email`
    pub fn reset_credential(&self, email: &str, new_credential: &str) -> Result<(), ServiceError> {
        if email.is_empty() || new_credential.is_empty() {
            return Err(ServiceError::InvalidRequest(
                "email and new password are required".to_string(),
            ));
        }

        let credential_hash = self.hasher.hash(new_credential)?;

        let _guard = self.lock();
        let mut account = self
            .find_by_email(email)?
            .ok_or_else(|| ServiceError::NotFound(format!("email {}", email)))?;

        account.credential_hash = credential_hash;
        account.updated_at = current_timestamp();
        self.storage.put(&account_key(&account.internal_key), &account)?;

        info!("credential reset for account #{}", account.sequential_id);
        Ok(())
    }

    /// Remove the account named `username`; its avatar file goes with it.
    pub fn delete(&self, username: &str) -> Result<Account, ServiceError> {
        if username.is_empty() {
            return Err(ServiceError::InvalidRequest("username is required".to_string()));
        }

        let guard = self.lock();
        let account = self
            .find_by_username(username)?
            .ok_or_else(|| ServiceError::NotFound(format!("username {}", username)))?;

        let mut batch = Batch::default();
        batch.delete(&account_key(&account.internal_key));
        batch.delete(&username_key(&account.username));
        batch.delete(&email_key(&account.email));
        self.storage.commit(batch)?;
        drop(guard);

        if let Some(reference) = &account.avatar_ref {
            self.discard_asset(reference);
        }

        info!("deleted account #{} {}", account.sequential_id, account.username);
        Ok(account)
    }

    /// Best-effort removal of an asset no record points at any more.
    fn discard_asset(&self, reference: &str) {
        match self.assets.remove(reference) {
            Ok(()) => debug!("discarded asset {}", reference),
            Err(e) => warn!("could not remove asset {}: {}", reference, e),
        }
    }
}

fn required(value: String, field: &str) -> Result<String, ServiceError> {
    if value.is_empty() {
        Err(ServiceError::InvalidRequest(format!("{} is required", field)))
    } else {
        Ok(value)
    }
}

fn current_timestamp() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::auth::test_hasher;
    use tempfile::TempDir;

    struct Fixture {
        registry: AccountRegistry,
        storage: Arc<Storage>,
        assets: Arc<AssetStore>,
        _dir: TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(Storage::open(dir.path().join("db")).unwrap());
        let assets =
            Arc::new(AssetStore::open(dir.path().join("uploads"), "http://localhost:3000").unwrap());
        let registry =
            AccountRegistry::open(Arc::clone(&storage), Arc::clone(&assets), test_hasher()).unwrap();
        Fixture { registry, storage, assets, _dir: dir }
    }

    fn new_account(username: &str, credential: &str, email: &str, role: &str, birthday: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            credential: credential.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            birthday: birthday.to_string(),
        }
    }

    fn alice() -> NewAccount {
        new_account("alice", "pw1", "a@x.com", "User", "1990-01-01")
    }

    fn avatar(bytes: &[u8]) -> Option<AvatarUpload> {
        Some(AvatarUpload {
            file_name: Some("avatar.png".to_string()),
            bytes: bytes.to_vec(),
        })
    }

    #[test]
    fn test_account_lifecycle_scenario() {
        let f = fixture();
        let r = &f.registry;

        assert_eq!(r.create(alice(), None).unwrap().sequential_id, 1);
        let bob = r
            .create(new_account("bob", "pw2", "b@x.com", "Admin", "1985-05-05"), None)
            .unwrap();
        assert_eq!(bob.sequential_id, 2);

        let carol = r.create(new_account("carol", "pw3", "a@x.com", "User", "2000-01-01"), None);
        assert!(matches!(
            carol,
            Err(ServiceError::DuplicateIdentity(Collision::Email))
        ));

        let logged_in = r.authenticate("a@x.com", "pw1").unwrap();
        assert_eq!(logged_in.role, "User");
        assert!(matches!(
            r.authenticate("a@x.com", "wrong"),
            Err(ServiceError::AuthenticationFailed)
        ));

        let removed = r.delete("bob").unwrap();
        assert_eq!(removed.sequential_id, 2);
        let names: Vec<_> = r.list().unwrap().into_iter().map(|a| a.username).collect();
        assert_eq!(names, vec!["alice"]);
    }

    #[test]
    fn test_missing_fields_are_rejected_before_storage() {
        let f = fixture();
        for field in 0..5 {
            let mut input = alice();
            match field {
                0 => input.username.clear(),
                1 => input.credential.clear(),
                2 => input.email.clear(),
                3 => input.role.clear(),
                _ => input.birthday.clear(),
            }
            assert!(matches!(
                f.registry.create(input, None),
                Err(ServiceError::InvalidRequest(_))
            ));
        }
        assert!(matches!(
            f.registry.create(new_account("a", "b", "c", "d", "yesterday"), None),
            Err(ServiceError::InvalidRequest(_))
        ));
        assert!(f.registry.list().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_reports_which_field() {
        let f = fixture();
        f.registry.create(alice(), None).unwrap();

        let same_name = new_account("alice", "x", "other@x.com", "User", "1990-01-01");
        assert!(matches!(
            f.registry.create(same_name, None),
            Err(ServiceError::DuplicateIdentity(Collision::Username))
        ));
        assert!(matches!(
            f.registry.create(alice(), None),
            Err(ServiceError::DuplicateIdentity(Collision::Both))
        ));
        assert_eq!(f.registry.list().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_does_not_leave_an_asset_behind() {
        let f = fixture();
        f.registry.create(alice(), None).unwrap();
        assert!(f.registry.create(alice(), avatar(b"img")).is_err());
        assert_eq!(std::fs::read_dir(f.assets.root()).unwrap().count(), 0);
    }

    #[test]
    fn test_concurrent_creates_get_gapless_ids() {
        let f = fixture();
        let registry = Arc::new(f.registry);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    (0..5)
                        .map(|i| {
                            let name = format!("user{}_{}", t, i);
                            let email = format!("{}@x.com", name);
                            registry
                                .create(new_account(&name, "pw", &email, "User", "2000-01-01"), None)
                                .unwrap()
                                .sequential_id
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=40).collect::<Vec<u64>>());
    }

    #[test]
    fn test_concurrent_creates_of_same_identity_admit_one() {
        let f = fixture();
        let registry = Arc::new(f.registry);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.create(alice(), None).is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(registry.list().unwrap().len(), 1);
    }

    #[test]
    fn test_ids_are_not_recycled_after_delete() {
        let f = fixture();
        f.registry.create(alice(), None).unwrap();
        f.registry
            .create(new_account("bob", "pw2", "b@x.com", "Admin", "1985-05-05"), None)
            .unwrap();
        f.registry.delete("bob").unwrap();

        let carol = f
            .registry
            .create(new_account("carol", "pw3", "c@x.com", "User", "2000-01-01"), None)
            .unwrap();
        assert_eq!(carol.sequential_id, 3);
    }

    #[test]
    fn test_sequence_survives_reopen() {
        let f = fixture();
        f.registry.create(alice(), None).unwrap();

        let reopened =
            AccountRegistry::open(Arc::clone(&f.storage), Arc::clone(&f.assets), test_hasher()).unwrap();
        let bob = reopened
            .create(new_account("bob", "pw2", "b@x.com", "Admin", "1985-05-05"), None)
            .unwrap();
        assert_eq!(bob.sequential_id, 2);
    }

    #[test]
    fn test_lagging_counter_is_reconciled() {
        let f = fixture();
        f.registry.create(alice(), None).unwrap();
        f.storage.put(SEQUENCE_KEY, &0u64).unwrap();

        let reopened =
            AccountRegistry::open(Arc::clone(&f.storage), Arc::clone(&f.assets), test_hasher()).unwrap();
        let bob = reopened
            .create(new_account("bob", "pw2", "b@x.com", "Admin", "1985-05-05"), None)
            .unwrap();
        assert_eq!(bob.sequential_id, 2);
    }

    #[test]
    fn test_credential_is_hashed_at_rest() {
        let f = fixture();
        let account = f.registry.create(alice(), None).unwrap();
        assert_ne!(account.credential_hash, "pw1");
        assert!(account.credential_hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_authenticate_requires_both_inputs() {
        let f = fixture();
        assert!(matches!(
            f.registry.authenticate("", "pw"),
            Err(ServiceError::InvalidRequest(_))
        ));
        assert!(matches!(
            f.registry.authenticate("a@x.com", ""),
            Err(ServiceError::InvalidRequest(_))
        ));
        assert!(matches!(
            f.registry.authenticate("nobody@x.com", "pw"),
            Err(ServiceError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_authenticate_is_exact_match() {
        let f = fixture();
        f.registry.create(alice(), None).unwrap();
        assert!(f.registry.authenticate("A@x.com", "pw1").is_err());
        assert!(f.registry.authenticate(" a@x.com", "pw1").is_err());
        assert!(f.registry.authenticate("a@x.com", "pw1 ").is_err());
    }

    #[test]
    fn test_reset_credential_changes_only_the_credential() {
        let f = fixture();
        let before = f.registry.create(alice(), avatar(b"img")).unwrap();

        f.registry.reset_credential("a@x.com", "new-pw").unwrap();

        let after = f.registry.authenticate("a@x.com", "new-pw").unwrap();
        assert!(f.registry.authenticate("a@x.com", "pw1").is_err());
        assert_eq!(after.view(), before.view());
        assert_ne!(after.credential_hash, before.credential_hash);
    }

    #[test]
    fn test_reset_credential_errors() {
        let f = fixture();
        assert!(matches!(
            f.registry.reset_credential("a@x.com", ""),
            Err(ServiceError::InvalidRequest(_))
        ));
        assert!(matches!(
            f.registry.reset_credential("a@x.com", "pw"),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_unknown_username() {
        let f = fixture();
        f.registry.create(alice(), None).unwrap();
        assert!(matches!(f.registry.delete("bob"), Err(ServiceError::NotFound(_))));
        assert!(matches!(f.registry.delete(""), Err(ServiceError::InvalidRequest(_))));
        assert_eq!(f.registry.list().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_frees_identity_and_removes_avatar() {
        let f = fixture();
        let account = f.registry.create(alice(), avatar(b"img")).unwrap();
        let reference = account.avatar_ref.clone().unwrap();

        f.registry.delete("alice").unwrap();
        assert!(f.assets.resolve(&reference).is_err());
        assert!(f.registry.find_by_email("a@x.com").unwrap().is_none());

        // username and email may be registered again
        let again = f.registry.create(alice(), None).unwrap();
        assert_eq!(again.sequential_id, 2);
    }

    #[test]
    fn test_avatar_round_trip() {
        let f = fixture();
        f.registry.create(alice(), avatar(b"\x89PNG bytes")).unwrap();

        let listed = &f.registry.list().unwrap()[0];
        let reference = listed.avatar_ref.as_deref().unwrap();
        assert_eq!(f.assets.resolve(reference).unwrap(), b"\x89PNG bytes");
    }

    #[test]
    fn test_update_partial_fields_keep_avatar() {
        let f = fixture();
        let created = f.registry.create(alice(), avatar(b"img")).unwrap();

        let changes = AccountChanges {
            role: Some("Admin".to_string()),
            birthday: Some("1991-02-03".to_string()),
            username: Some(String::new()),
            ..Default::default()
        };
        let updated = f.registry.update(&created.internal_key, changes, None).unwrap();

        assert_eq!(updated.role, "Admin");
        assert_eq!(updated.birthday.to_string(), "1991-02-03");
        assert_eq!(updated.username, "alice");
        assert_eq!(updated.avatar_ref, created.avatar_ref);
        assert_eq!(updated.sequential_id, created.sequential_id);
        assert!(f.registry.authenticate("a@x.com", "pw1").is_ok());
    }

    #[test]
    fn test_update_replaces_avatar_and_discards_old() {
        let f = fixture();
        let created = f.registry.create(alice(), avatar(b"old")).unwrap();
        let old_ref = created.avatar_ref.clone().unwrap();

        let updated = f
            .registry
            .update(&created.internal_key, AccountChanges::default(), avatar(b"new"))
            .unwrap();
        let new_ref = updated.avatar_ref.clone().unwrap();

        assert_ne!(new_ref, old_ref);
        assert_eq!(f.assets.resolve(&new_ref).unwrap(), b"new");
        assert!(f.assets.resolve(&old_ref).is_err());
    }

    #[test]
    fn test_update_moves_identity_indexes() {
        let f = fixture();
        let created = f.registry.create(alice(), None).unwrap();

        let changes = AccountChanges {
            username: Some("alicia".to_string()),
            email: Some("alicia@x.com".to_string()),
            credential: Some("pw9".to_string()),
            ..Default::default()
        };
        f.registry.update(&created.internal_key, changes, None).unwrap();

        assert!(f.registry.authenticate("alicia@x.com", "pw9").is_ok());
        assert!(f.registry.authenticate("a@x.com", "pw1").is_err());
        assert!(f.registry.find_by_username("alice").unwrap().is_none());
        assert_eq!(
            f.registry.find_by_username("alicia").unwrap().unwrap().internal_key,
            created.internal_key
        );
    }

    #[test]
    fn test_update_rejects_taken_identity() {
        let f = fixture();
        let created = f.registry.create(alice(), None).unwrap();
        f.registry
            .create(new_account("bob", "pw2", "b@x.com", "Admin", "1985-05-05"), None)
            .unwrap();

        let changes = AccountChanges {
            email: Some("b@x.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            f.registry.update(&created.internal_key, changes, avatar(b"img")),
            Err(ServiceError::DuplicateIdentity(Collision::Email))
        ));
        assert_eq!(f.registry.get(&created.internal_key).unwrap().unwrap().email, "a@x.com");
        assert_eq!(std::fs::read_dir(f.assets.root()).unwrap().count(), 0);

        // re-submitting one's own username is not a collision
        let own = AccountChanges {
            username: Some("alice".to_string()),
            ..Default::default()
        };
        assert!(f.registry.update(&created.internal_key, own, None).is_ok());
    }

    #[test]
    fn test_update_unknown_key() {
        let f = fixture();
        assert!(matches!(
            f.registry.update("missing", AccountChanges::default(), None),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            f.registry.update("", AccountChanges::default(), None),
            Err(ServiceError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_list_is_ordered_by_sequential_id() {
        let f = fixture();
        for name in ["zed", "amy", "mo"] {
            let email = format!("{}@x.com", name);
            f.registry
                .create(new_account(name, "pw", &email, "User", "2000-01-01"), None)
                .unwrap();
        }
        let ids: Vec<_> = f.registry.list().unwrap().iter().map(|a| a.sequential_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
