//! `Dragonfly` (Redis-compatible) connection and typed key operations.
//!
//! [`DragonflyPool`] wraps a [`fred`] client and exposes the handful of
//! commands the session store needs: expiring JSON writes, `SET NX`, a
//! `MULTI` pair write, `EXPIRE`, `TTL`, multi-key `DEL` and two small Lua
//! scripts that only touch the username index while it names the caller.

use std::time::Duration;

use fred::interfaces::LuaInterface;
use fred::prelude::*;
use fred::types::{Expiration, SetOptions};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DbError;

/// `KEYS[1]` record, `KEYS[2]` index, `ARGV[1]` owning id.
const DELETE_OWNED_INDEX: &str = r"
redis.call('DEL', KEYS[1])
if redis.call('GET', KEYS[2]) == ARGV[1] then
    return redis.call('DEL', KEYS[2])
end
return 0
";

/// `KEYS[1]` index, `ARGV[1]` owning id, `ARGV[2]` TTL in seconds.
const EXPIRE_OWNED_INDEX: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('EXPIRE', KEYS[1], ARGV[2])
end
return 0
";

/// Connection handle to a `Dragonfly` (Redis-compatible) instance.
#[derive(Clone)]
pub struct DragonflyPool {
    client: Client,
}

impl DragonflyPool {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let config = Config::from_url(url)
            .map_err(|e| DbError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self { client })
    }

    /// Serialize `value` as JSON and store it at `key` with an expiry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if serialization fails.
    /// Returns [`DbError::Dragonfly`] if the write fails.
    pub async fn set_json_ex<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: i64,
    ) -> Result<(), DbError> {
        let json = serde_json::to_string(value)?;
        let _: () = self
            .client
            .set(key, json.as_str(), Some(Expiration::EX(ttl_secs)), None, false)
            .await?;
        Ok(())
    }

    /// Read the value at `key` and deserialize from JSON.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if deserialization fails.
    /// Returns [`DbError::Dragonfly`] if the read fails.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DbError> {
        let value: Option<String> = self.client.get(key).await?;
        match value {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    /// Read a plain string value.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the read fails.
    pub async fn get_string(&self, key: &str) -> Result<Option<String>, DbError> {
        let value: Option<String> = self.client.get(key).await?;
        Ok(value)
    }

    /// `SET key value EX ttl NX`. Returns `true` if the key was written.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the write fails.
    pub async fn set_nx_ex(&self, key: &str, value: &str, ttl_secs: i64) -> Result<bool, DbError> {
        let reply: Option<String> = self
            .client
            .set(
                key,
                value,
                Some(Expiration::EX(ttl_secs)),
                Some(SetOptions::NX),
                false,
            )
            .await?;
        Ok(reply.is_some())
    }

    /// Write a JSON record and a plain string in one `MULTI`/`EXEC` block,
    /// both with the same expiry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if serialization fails.
    /// Returns [`DbError::Dragonfly`] if the transaction fails.
    pub async fn set_pair_ex<T: Serialize + Sync>(
        &self,
        record_key: &str,
        record: &T,
        index_key: &str,
        index_value: &str,
        ttl_secs: i64,
    ) -> Result<(), DbError> {
        let json = serde_json::to_string(record)?;
        let trx = self.client.multi();
        let _: () = trx
            .set(record_key, json.as_str(), Some(Expiration::EX(ttl_secs)), None, false)
            .await?;
        let _: () = trx
            .set(index_key, index_value, Some(Expiration::EX(ttl_secs)), None, false)
            .await?;
        let _: () = trx.exec(true).await?;
        Ok(())
    }

    /// Reset the expiry of an existing key. Returns `false` if the key is gone.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the command fails.
    pub async fn expire(&self, key: &str, ttl_secs: i64) -> Result<bool, DbError> {
        let applied: bool = self.client.expire(key, ttl_secs, None).await?;
        Ok(applied)
    }

    /// Remaining time-to-live of `key`. `None` if the key does not exist
    /// or carries no expiry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the command fails.
    pub async fn ttl(&self, key: &str) -> Result<Option<Duration>, DbError> {
        let secs: i64 = self.client.ttl(key).await?;
        // -2: missing, -1: persistent
        Ok(u64::try_from(secs).ok().map(Duration::from_secs))
    }

    /// Delete `record_key`, and `index_key` only if it still holds `owner`.
    /// Returns whether the index was removed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the script fails.
    pub async fn delete_with_owned_index(
        &self,
        record_key: &str,
        index_key: &str,
        owner: &str,
    ) -> Result<bool, DbError> {
        let removed: i64 = self
            .client
            .eval(
                DELETE_OWNED_INDEX,
                vec![record_key.to_owned(), index_key.to_owned()],
                vec![owner.to_owned()],
            )
            .await?;
        Ok(removed == 1)
    }

    /// Reset the expiry of `index_key` only if it still holds `owner`.
    /// Returns whether the expiry was applied.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the script fails.
    pub async fn expire_owned_index(
        &self,
        index_key: &str,
        owner: &str,
        ttl_secs: i64,
    ) -> Result<bool, DbError> {
        let applied: i64 = self
            .client
            .eval(
                EXPIRE_OWNED_INDEX,
                vec![index_key.to_owned()],
                vec![owner.to_owned(), ttl_secs.to_string()],
            )
            .await?;
        Ok(applied == 1)
    }

    /// Delete one or more keys.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the delete fails.
    pub async fn delete_many(&self, keys: Vec<String>) -> Result<u32, DbError> {
        let removed: u32 = self.client.del(keys).await?;
        Ok(removed)
    }

    /// Flush all keys from the `Dragonfly` instance.
    ///
    /// **WARNING:** This deletes all data. Only use for testing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the flush fails.
    pub async fn flush_all(&self) -> Result<(), DbError> {
        let _: () = self.client.flushall(false).await?;
        Ok(())
    }

    /// Return a reference to the underlying [`Client`].
    pub const fn client(&self) -> &Client {
        &self.client
    }
}
