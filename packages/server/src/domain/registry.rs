//! Connection Registry
//!
//! トランスポート接続ハンドルをキーとする接続レコードの台帳。
//! レコードの生成・破棄はトランスポート層の接続寿命に従います。

use std::collections::HashMap;

use super::entity::ConnectionRecord;
use super::error::RegistryError;
use super::value_object::ConnectionId;

/// 接続レコードの台帳
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    records: HashMap<ConnectionId, ConnectionRecord>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    /// 接続レコードを登録する
    ///
    /// 同じ接続ハンドルが既に登録されている場合は `DuplicateRegistration`。
    /// 正しいトランスポート層の使用では発生しない（プログラミングエラー）。
    pub fn register(&mut self, record: ConnectionRecord) -> Result<(), RegistryError> {
        if self.records.contains_key(&record.id) {
            return Err(RegistryError::DuplicateRegistration(record.id));
        }
        self.records.insert(record.id, record);
        Ok(())
    }

    /// 接続レコードを登録解除する
    ///
    /// 未登録のハンドルに対しては何もしない（切断と後始末が競合しうるため冪等）。
    pub fn unregister(&mut self, connection_id: &ConnectionId) -> Option<ConnectionRecord> {
        self.records.remove(connection_id)
    }

    /// 接続レコードを参照する
    pub fn lookup(&self, connection_id: &ConnectionId) -> Option<&ConnectionRecord> {
        self.records.get(connection_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
