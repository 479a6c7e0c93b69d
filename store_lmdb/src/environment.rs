//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tracing::info;

use vreg_types::RegistryParams;

use crate::registry::{meta_key, LmdbRegistryStore};
use crate::LmdbError;

/// Database names in a registry environment.
pub const DATABASES: &[&str] = &["verifiers", "addresses", "names", "shard_balances", "meta"];

/// Current on-disk layout version.
pub const SCHEMA_VERSION: u32 = 1;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    verifiers_db: Database<Bytes, Bytes>,
    addresses_db: Database<Bytes, Bytes>,
    names_db: Database<Bytes, Bytes>,
    shard_balances_db: Database<Bytes, Bytes>,
    meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// `params` seeds the configuration of a fresh environment. When the
    /// environment already holds a registry, the persisted configuration
    /// wins and `params` is ignored.
    pub fn open(path: &Path, map_size: usize, params: &RegistryParams) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the environment is opened once per process for this path.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(DATABASES.len() as u32)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let verifiers_db = env.create_database(&mut wtxn, Some("verifiers"))?;
        let addresses_db = env.create_database(&mut wtxn, Some("addresses"))?;
        let names_db = env.create_database(&mut wtxn, Some("names"))?;
        let shard_balances_db = env.create_database(&mut wtxn, Some("shard_balances"))?;
        let meta_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some("meta"))?;

        if meta_db.get(&wtxn, meta_key::SCHEMA_VERSION)?.is_none() {
            info!(path = %path.display(), verifiers_per_shard = params.verifiers_per_shard, "initializing registry store");
            meta_db.put(&mut wtxn, meta_key::SCHEMA_VERSION, &SCHEMA_VERSION.to_be_bytes())?;
            meta_db.put(
                &mut wtxn,
                meta_key::VERIFIERS_PER_SHARD,
                &params.verifiers_per_shard.to_be_bytes(),
            )?;
            meta_db.put(&mut wtxn, meta_key::TOKEN_ADDRESS, params.token_address.as_bytes())?;
            meta_db.put(&mut wtxn, meta_key::ADDRESS_COUNT, &0u64.to_be_bytes())?;
        }
        wtxn.commit()?;

        Ok(Self {
            env: Arc::new(env),
            verifiers_db,
            addresses_db,
            names_db,
            shard_balances_db,
            meta_db,
        })
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    /// The on-disk layout version of this environment.
    pub fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        match self.meta_db.get(&rtxn, meta_key::SCHEMA_VERSION)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes
                    .try_into()
                    .map_err(|_| LmdbError::Serialization("schema_version has unexpected byte length".into()))?;
                Ok(u32::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }

    /// A registry store handle over this environment.
    pub fn registry_store(&self) -> LmdbRegistryStore {
        LmdbRegistryStore {
            env: Arc::clone(&self.env),
            verifiers_db: self.verifiers_db,
            addresses_db: self.addresses_db,
            names_db: self.names_db,
            shard_balances_db: self.shard_balances_db,
            meta_db: self.meta_db,
        }
    }
}
