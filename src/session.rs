use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::core::{PensionData, ProductInfo, UserDetails};
use crate::storage::{
    CPF_KEY, ENROLLMENT_KEY, KeyValueStore, PENSION_DETAIL_KEY, PRODUCT_KEY, StorageError,
    TOKEN_KEY,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub cpf: String,
    pub product: ProductInfo,
    pub user: UserDetails,
}

pub struct SessionManager<S: KeyValueStore> {
    store: S,
    state: watch::Sender<Option<Session>>,
}

impl<S: KeyValueStore> SessionManager<S> {
    pub fn new(store: S) -> Self {
        let (state, _) = watch::channel(None);
        Self { store, state }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }

    pub fn current(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.borrow().is_some()
    }

    fn read_stored(&self) -> Result<Option<Session>, StorageError> {
        let Some(token) = self.store.get(TOKEN_KEY)? else {
            return Ok(None);
        };
        let incomplete = |key: &str| StorageError::Corrupt {
            key: key.to_string(),
            reason: "missing from a stored session".to_string(),
        };
        let cpf = self.store.get(CPF_KEY)?.ok_or_else(|| incomplete(CPF_KEY))?;
        let product = self
            .store
            .get_json::<ProductInfo>(PRODUCT_KEY)?
            .ok_or_else(|| incomplete(PRODUCT_KEY))?;
        let user = self
            .store
            .get_json::<UserDetails>(ENROLLMENT_KEY)?
            .ok_or_else(|| incomplete(ENROLLMENT_KEY))?;
        Ok(Some(Session {
            token,
            cpf,
            product,
            user,
        }))
    }

    pub fn load(&self) -> Result<Option<Session>, StorageError> {
        match self.read_stored() {
            Ok(session) => {
                self.state.send_replace(session.clone());
                Ok(session)
            }
            Err(err) => {
                warn!(error = %err, "stored session is unreadable; treating as signed out");
                self.state.send_replace(None);
                Err(err)
            }
        }
    }

    pub fn save(&self, session: Session) -> Result<(), StorageError> {
        self.store.set(TOKEN_KEY, &session.token)?;
        self.store.set(CPF_KEY, &session.cpf)?;
        self.store.set_json(PRODUCT_KEY, &session.product)?;
        self.store.set_json(ENROLLMENT_KEY, &session.user)?;
        info!(user_id = session.user.id, "session saved");
        self.state.send_replace(Some(session));
        Ok(())
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        for key in [TOKEN_KEY, CPF_KEY, PRODUCT_KEY, ENROLLMENT_KEY, PENSION_DETAIL_KEY] {
            self.store.delete(key)?;
        }
        info!("session cleared");
        self.state.send_replace(None);
        Ok(())
    }

    pub fn cache_pension(&self, pension: &PensionData) -> Result<(), StorageError> {
        self.store.set_json(PENSION_DETAIL_KEY, pension)
    }

    pub fn cached_pension(&self) -> Result<Option<PensionData>, StorageError> {
        self.store.get_json(PENSION_DETAIL_KEY)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};

    pub(crate) fn sample_session() -> Session {
        Session {
            token: "jwt-abc".to_string(),
            cpf: "12345678900".to_string(),
            product: ProductInfo {
                company_code: "1".to_string(),
                registration: "12345".to_string(),
                plan_code: "7".to_string(),
                plan_name: "PLANO CD".to_string(),
            },
            user: UserDetails {
                id: 99,
                cpf: "12345678900".to_string(),
                name: "Maria da Silva".to_string(),
                birth_date: "1960-05-17".to_string(),
            },
        }
    }

    #[test]
    fn missing_token_loads_as_signed_out() {
        let manager = SessionManager::new(MemoryStore::new());
        assert_eq!(manager.load().expect("readable"), None);
        assert!(!manager.is_signed_in());
    }

    #[test]
    fn save_then_load_round_trips_through_the_file_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        SessionManager::new(FileStore::new(&path))
            .save(sample_session())
            .expect("writable");

        let restored = SessionManager::new(FileStore::new(&path));
        assert_eq!(restored.load().expect("readable"), Some(sample_session()));
        assert_eq!(restored.current(), Some(sample_session()));
    }

    #[test]
    fn subscribers_see_save_and_clear() {
        let manager = SessionManager::new(MemoryStore::new());
        let mut rx = manager.subscribe();

        manager.save(sample_session()).expect("writable");
        assert!(rx.has_changed().expect("sender alive"));
        assert_eq!(rx.borrow_and_update().clone(), Some(sample_session()));

        manager.clear().expect("deletable");
        assert!(rx.has_changed().expect("sender alive"));
        assert_eq!(*rx.borrow_and_update(), None);
        assert_eq!(manager.store().get(TOKEN_KEY).expect("readable"), None);
    }

    #[test]
    fn corrupt_session_is_an_error_and_signs_out() {
        let manager = SessionManager::new(MemoryStore::new());
        manager.save(sample_session()).expect("writable");
        manager
            .store()
            .set(ENROLLMENT_KEY, "{\"id\": ")
            .expect("writable");

        let err = manager.load().expect_err("corrupt");
        assert!(matches!(err, StorageError::Corrupt { .. }));
        assert_eq!(manager.current(), None);
    }

    #[test]
    fn token_without_profile_is_incomplete() {
        let store = MemoryStore::new();
        store.set(TOKEN_KEY, "jwt").expect("writable");
        let manager = SessionManager::new(store);
        assert!(matches!(
            manager.load(),
            Err(StorageError::Corrupt { key, .. }) if key == CPF_KEY
        ));
    }

    #[test]
    fn pension_cache_is_dropped_on_clear() {
        let manager = SessionManager::new(MemoryStore::new());
        let pension = crate::core::PensionData {
            registration: "12345".to_string(),
            modality: crate::core::Modality {
                parameter: "1.5".to_string(),
                code: 40,
                description: String::new(),
            },
            tax_regime: crate::core::TaxRegime {
                code: 1,
                description: String::new(),
            },
            balance: crate::core::Balance {
                value: rust_decimal::Decimal::from(1_000),
                reference: String::new(),
            },
            benefit: crate::core::Benefit {
                start_date: String::new(),
                value: rust_decimal::Decimal::from(10),
            },
        };
        manager.cache_pension(&pension).expect("writable");
        assert_eq!(manager.cached_pension().expect("readable"), Some(pension));
        manager.clear().expect("deletable");
        assert_eq!(manager.cached_pension().expect("readable"), None);
    }
}
