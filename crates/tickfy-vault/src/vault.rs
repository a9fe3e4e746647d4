//! Wallet vault operations.
//!
//! Every operation loads `wallets.json`, works on the in-memory copy and, for
//! mutations, writes the whole document back. The first load after an upgrade
//! from a single-wallet install folds the legacy `wallet.json` into the store.

use crate::error::VaultError;
use crate::persist::{ensure_private_dir, read_json, write_json};
use crate::store::{WalletRecord, WalletStore, WalletSummary};
use rand::RngCore;
use std::path::{Path, PathBuf};
use tickfy_crypto::{
    decrypt, derive_address, encrypt, generate_mnemonic, generate_salt, normalize_mnemonic,
    validate_mnemonic,
};
use tickfy_types::constants::{files, MIN_PASSWORD_LEN, WALLET_ID_BYTES};
use zeroize::Zeroizing;

/// Answers whether the node daemon is currently running.
///
/// Deleting a wallet while the daemon runs is refused; the vault asks through
/// this trait so it does not depend on the supervisor.
pub trait DaemonProbe {
    fn is_daemon_running(&self) -> bool;
}

/// Result of [`Vault::create_wallet`]. The mnemonic is handed out exactly once.
#[derive(Debug)]
pub struct NewWallet {
    pub id: String,
    pub address: String,
    pub mnemonic: Zeroizing<String>,
}

/// Result of [`Vault::list_wallets`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletList {
    pub wallets: Vec<WalletSummary>,
    /// The stored pointer, as persisted. May be stale; see
    /// [`WalletStore::active`].
    pub active_wallet_id: Option<String>,
}

/// Address and name of the wallet operations act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveWallet {
    pub id: String,
    pub address: String,
    pub name: String,
}

impl From<&WalletRecord> for ActiveWallet {
    fn from(w: &WalletRecord) -> Self {
        Self {
            id: w.id.clone(),
            address: w.address.clone(),
            name: w.name.clone(),
        }
    }
}

/// Handle to the wallet store inside a data directory.
#[derive(Debug, Clone)]
pub struct Vault {
    dir: PathBuf,
}

fn new_wallet_id() -> String {
    let mut bytes = [0u8; WALLET_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

fn check_password(password: &str) -> Result<(), VaultError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(VaultError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

impl Vault {
    /// Open (creating if needed) the vault rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, VaultError> {
        let dir = dir.into();
        ensure_private_dir(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn store_path(&self) -> PathBuf {
        self.dir.join(files::WALLET_STORE)
    }

    fn legacy_path(&self) -> PathBuf {
        self.dir.join(files::LEGACY_WALLET)
    }

    // ── persistence ──

    /// Load the store, migrating a legacy single-wallet file on first use.
    pub fn load(&self) -> Result<WalletStore, VaultError> {
        if let Some(store) = read_json::<WalletStore>(&self.store_path())? {
            return Ok(store);
        }
        self.migrate_legacy()
    }

    fn save(&self, store: &WalletStore) -> Result<(), VaultError> {
        write_json(&self.store_path(), store)
    }

    /// Fold `wallet.json` into a fresh store. The new store is written before
    /// the legacy file is removed, so an interrupted migration is redone from
    /// the store on the next load rather than lost.
    fn migrate_legacy(&self) -> Result<WalletStore, VaultError> {
        let legacy_path = self.legacy_path();
        let legacy = match read_json::<WalletRecord>(&legacy_path) {
            Ok(Some(record)) if !record.address.trim().is_empty() => record,
            Ok(Some(_)) => {
                log::warn!("ignoring legacy wallet without an address");
                return Ok(WalletStore::default());
            }
            Ok(None) => return Ok(WalletStore::default()),
            Err(e) => {
                log::warn!("ignoring unreadable legacy wallet: {}", e);
                return Ok(WalletStore::default());
            }
        };

        let mut record = legacy;
        if record.id.is_empty() {
            record.id = new_wallet_id();
        }
        if record.name.trim().is_empty() {
            record.name = "Wallet 1".to_string();
        }
        if record.created_at == 0 {
            record.created_at = now_unix();
        }

        let store = WalletStore {
            active_wallet_id: record.id.clone(),
            wallets: vec![record],
        };
        self.save(&store)?;
        log::info!("migrated legacy wallet into {}", files::WALLET_STORE);

        if let Err(e) = std::fs::remove_file(&legacy_path) {
            log::warn!("could not remove {}: {}", legacy_path.display(), e);
        }
        Ok(store)
    }

    fn append(
        &self,
        mut store: WalletStore,
        name: &str,
        phrase: &str,
        address: String,
        password: &str,
    ) -> Result<String, VaultError> {
        let salt = generate_salt();
        let encrypted_mnemonic = encrypt(phrase, password, &salt)?;
        let name = match name.trim() {
            "" => format!("Wallet {}", store.wallets.len() + 1),
            n => n.to_string(),
        };

        let id = new_wallet_id();
        store.wallets.push(WalletRecord {
            id: id.clone(),
            address,
            name,
            encrypted_mnemonic,
            salt,
            created_at: now_unix(),
        });
        store.active_wallet_id = id.clone();
        self.save(&store)?;
        Ok(id)
    }

    // ── operations ──

    /// Generate a fresh 24-word wallet, store it sealed, and make it active.
    pub fn create_wallet(&self, name: &str, password: &str) -> Result<NewWallet, VaultError> {
        check_password(password)?;
        let store = self.load()?;

        let mnemonic = Zeroizing::new(generate_mnemonic()?);
        let address = derive_address(&mnemonic)?;
        if store.contains_address(&address) {
            return Err(VaultError::AlreadyImported { address });
        }

        let id = self.append(store, name, &mnemonic, address.clone(), password)?;
        log::info!("created wallet {} ({})", id, address);
        Ok(NewWallet {
            id,
            address,
            mnemonic,
        })
    }

    /// Import an existing mnemonic and make it active. Returns `(id, address)`.
    pub fn import_wallet(
        &self,
        name: &str,
        mnemonic: &str,
        password: &str,
    ) -> Result<(String, String), VaultError> {
        check_password(password)?;
        let phrase = Zeroizing::new(normalize_mnemonic(mnemonic));
        validate_mnemonic(&phrase)?;

        let store = self.load()?;
        let address = derive_address(&phrase)?;
        if store.contains_address(&address) {
            return Err(VaultError::AlreadyImported { address });
        }

        let id = self.append(store, name, &phrase, address.clone(), password)?;
        log::info!("imported wallet {} ({})", id, address);
        Ok((id, address))
    }

    pub fn list_wallets(&self) -> Result<WalletList, VaultError> {
        let store = self.load()?;
        Ok(WalletList {
            wallets: store.wallets.iter().map(WalletSummary::from).collect(),
            active_wallet_id: Some(store.active_wallet_id).filter(|id| !id.is_empty()),
        })
    }

    pub fn set_active_wallet(&self, id: &str) -> Result<(), VaultError> {
        let mut store = self.load()?;
        if store.find(id).is_none() {
            return Err(VaultError::WalletNotFound(id.to_string()));
        }
        store.active_wallet_id = id.to_string();
        self.save(&store)
    }

    /// The active wallet, or the first one when the pointer is unset or stale.
    pub fn active_wallet_info(&self) -> Result<ActiveWallet, VaultError> {
        let store = self.load()?;
        store
            .active()
            .map(ActiveWallet::from)
            .ok_or(VaultError::NoWallet)
    }

    /// Remove a wallet. Refused while the daemon is running.
    pub fn delete_wallet(&self, id: &str, probe: &dyn DaemonProbe) -> Result<(), VaultError> {
        if probe.is_daemon_running() {
            return Err(VaultError::DaemonRunning);
        }
        let mut store = self.load()?;
        if store.remove(id).is_none() {
            return Err(VaultError::WalletNotFound(id.to_string()));
        }
        self.save(&store)?;
        log::info!("deleted wallet {}", id);
        Ok(())
    }

    /// Decrypt the mnemonic of wallet `id`.
    pub fn reveal_mnemonic(&self, id: &str, password: &str) -> Result<Zeroizing<String>, VaultError> {
        let store = self.load()?;
        let record = store
            .find(id)
            .ok_or_else(|| VaultError::WalletNotFound(id.to_string()))?;
        Ok(Zeroizing::new(decrypt(
            &record.encrypted_mnemonic,
            password,
            &record.salt,
        )?))
    }

    /// Decrypt the active wallet's mnemonic, proving the password.
    pub fn unlock_active(
        &self,
        password: &str,
    ) -> Result<(ActiveWallet, Zeroizing<String>), VaultError> {
        let store = self.load()?;
        let record = store.active().ok_or(VaultError::NoWallet)?;
        let phrase = decrypt(&record.encrypted_mnemonic, password, &record.salt)?;
        Ok((ActiveWallet::from(record), Zeroizing::new(phrase)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickfy_types::ErrorKind;

    const ZERO_24: &str = "abandon abandon abandon abandon abandon abandon abandon abandon \
                           abandon abandon abandon abandon abandon abandon abandon abandon \
                           abandon abandon abandon abandon abandon abandon abandon art";

    struct Daemon(bool);

    impl DaemonProbe for Daemon {
        fn is_daemon_running(&self) -> bool {
            self.0
        }
    }

    fn vault() -> (tempfile::TempDir, Vault) {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::open(dir.path().join("data")).unwrap();
        (dir, vault)
    }

    #[test]
    fn test_empty_vault() {
        let (_dir, vault) = vault();
        let list = vault.list_wallets().unwrap();
        assert!(list.wallets.is_empty());
        assert_eq!(list.active_wallet_id, None);
        assert_eq!(vault.active_wallet_info().unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_create_sets_active_and_seals_mnemonic() {
        let (_dir, vault) = vault();
        let created = vault.create_wallet("alice", "secret1").unwrap();
        assert_eq!(created.id.len(), WALLET_ID_BYTES * 2);
        assert_eq!(created.mnemonic.split_whitespace().count(), 24);
        assert_eq!(derive_address(&created.mnemonic).unwrap(), created.address);

        let active = vault.active_wallet_info().unwrap();
        assert_eq!(active.id, created.id);
        assert_eq!(active.name, "alice");

        let raw = std::fs::read_to_string(vault.store_path()).unwrap();
        assert!(!raw.contains(created.mnemonic.as_str()));

        let revealed = vault.reveal_mnemonic(&created.id, "secret1").unwrap();
        assert_eq!(revealed.as_str(), created.mnemonic.as_str());
    }

    #[test]
    fn test_short_password_rejected() {
        let (_dir, vault) = vault();
        let err = vault.create_wallet("a", "12345").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = vault.import_wallet("a", ZERO_24, "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(vault.list_wallets().unwrap().wallets.is_empty());
    }

    #[test]
    fn test_import_invalid_mnemonic() {
        let (_dir, vault) = vault();
        let err = vault
            .import_wallet("x", "abandon abandon abandon", "secret1")
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidMnemonic(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_duplicate_import_is_conflict() {
        let (_dir, vault) = vault();
        vault.import_wallet("one", ZERO_24, "secret1").unwrap();
        let spaced = format!("  {}  ", ZERO_24.replace(' ', "   "));
        let err = vault.import_wallet("two", &spaced, "secret2").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(vault.list_wallets().unwrap().wallets.len(), 1);
    }

    #[test]
    fn test_blank_name_gets_default() {
        let (_dir, vault) = vault();
        vault.import_wallet("   ", ZERO_24, "secret1").unwrap();
        assert_eq!(vault.active_wallet_info().unwrap().name, "Wallet 1");
    }

    #[test]
    fn test_set_active() {
        let (_dir, vault) = vault();
        let (first, _) = vault.import_wallet("one", ZERO_24, "secret1").unwrap();
        vault.create_wallet("two", "secret2").unwrap();
        vault.set_active_wallet(&first).unwrap();
        assert_eq!(vault.active_wallet_info().unwrap().id, first);

        let err = vault.set_active_wallet("ffffffffffffffff").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(vault.active_wallet_info().unwrap().id, first);
    }

    #[test]
    fn test_delete_refused_while_daemon_runs() {
        let (_dir, vault) = vault();
        let created = vault.create_wallet("a", "secret1").unwrap();
        let err = vault.delete_wallet(&created.id, &Daemon(true)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(vault.list_wallets().unwrap().wallets.len(), 1);
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let (_dir, vault) = vault();
        let err = vault.delete_wallet("nope", &Daemon(false)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_unlock_active_checks_password() {
        let (_dir, vault) = vault();
        vault.import_wallet("a", ZERO_24, "secret1").unwrap();
        let (active, phrase) = vault.unlock_active("secret1").unwrap();
        assert_eq!(active.name, "a");
        assert_eq!(phrase.as_str(), normalize_mnemonic(ZERO_24));

        let err = vault.unlock_active("secret2").unwrap_err();
        assert!(matches!(err, VaultError::WrongPassword));
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_corrupt_store_is_not_overwritten() {
        let (_dir, vault) = vault();
        std::fs::write(vault.store_path(), b"{ broken").unwrap();
        let err = vault.create_wallet("a", "secret1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(std::fs::read(vault.store_path()).unwrap(), b"{ broken");
    }
}
