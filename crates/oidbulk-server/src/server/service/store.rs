//! Selects the document store records are written to.
//!
//! With `MONGODB_URI` set (and the `mongodb` feature enabled) records go to
//! MongoDB. Otherwise they stay in a bounded in-process [`MemoryStore`] that
//! refuses batches once `MEMORY_STORE_CAPACITY` documents are held.

use crate::server::config::ServerConfig;
use core::future::Future;
#[cfg(feature = "mongodb")]
use oidbulk::MongoStore;
use oidbulk::{BulkWriter, EncodedRecord, MemoryStore, WriteError};

#[derive(Debug)]
pub enum Backend {
    Memory(MemoryStore),
    #[cfg(feature = "mongodb")]
    Mongo(MongoStore),
}

impl Backend {
    /// Opens the store named by `config`. For MongoDB this connects and
    /// creates the unique indexes before the server starts accepting jobs.
    pub async fn open(config: &ServerConfig) -> Result<Self, WriteError> {
        if let Some(backend) = Self::open_mongo(config).await? {
            return Ok(backend);
        }

        #[cfg(feature = "tracing")]
        tracing::warn!(
            "MONGODB_URI not set; keeping up to {} records in memory",
            config.memory_store_capacity
        );
        Ok(Self::memory(config))
    }

    #[cfg(feature = "mongodb")]
    async fn open_mongo(config: &ServerConfig) -> Result<Option<Self>, WriteError> {
        let Some(uri) = &config.mongodb_uri else {
            return Ok(None);
        };

        let store = MongoStore::connect(uri, &config.mongodb_database).await?;
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Writing to MongoDB collection {}.{}",
            config.mongodb_database,
            store.collection()
        );
        Ok(Some(Self::Mongo(store)))
    }

    #[cfg(not(feature = "mongodb"))]
    async fn open_mongo(_config: &ServerConfig) -> Result<Option<Self>, WriteError> {
        Ok(None)
    }

    pub fn memory(config: &ServerConfig) -> Self {
        Self::Memory(MemoryStore::bounded(config.memory_store_capacity))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            #[cfg(feature = "mongodb")]
            Self::Mongo(_) => "mongodb",
        }
    }

    pub fn collection(&self) -> &str {
        match self {
            Self::Memory(store) => store.collection(),
            #[cfg(feature = "mongodb")]
            Self::Mongo(store) => store.collection(),
        }
    }

    pub fn as_memory(&self) -> Option<&MemoryStore> {
        match self {
            Self::Memory(store) => Some(store),
            #[cfg(feature = "mongodb")]
            Self::Mongo(_) => None,
        }
    }
}

impl BulkWriter for Backend {
    fn bulk_insert(
        &self,
        records: Vec<EncodedRecord>,
    ) -> impl Future<Output = Result<usize, WriteError>> + Send {
        async move {
            match self {
                Self::Memory(store) => store.bulk_insert(records).await,
                #[cfg(feature = "mongodb")]
                Self::Mongo(store) => store.bulk_insert(records).await,
            }
        }
    }
}
