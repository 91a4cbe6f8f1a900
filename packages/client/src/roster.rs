//! 参加者ロスター
//!
//! UI の参加者リストに相当するローカルビュー。追加は冪等で、既存エントリに
//! 対しては非空の表示名が与えられたときだけ名前を更新します。

use std::collections::HashMap;

/// ロスターの 1 エントリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
}

/// 参加者ロスター
#[derive(Debug, Default)]
pub struct Roster {
    entries: HashMap<String, String>,
}

impl Roster {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// エントリを追加または更新する
    ///
    /// 既に存在する ID に対しては UI 項目を重複させず、非空の表示名が
    /// 与えられた場合のみ名前を更新する。戻り値は新規追加だったかどうか。
    pub fn upsert(&mut self, id: &str, name: &str) -> bool {
        match self.entries.get_mut(id) {
            Some(existing) => {
                if !name.is_empty() {
                    *existing = name.to_string();
                }
                false
            }
            None => {
                self.entries.insert(id.to_string(), name.to_string());
                true
            }
        }
    }

    /// エントリを削除する（存在しなければ no-op）
    pub fn remove(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    /// 参加者 ID 順のエントリ一覧
    pub fn entries(&self) -> Vec<RosterEntry> {
        let mut entries: Vec<RosterEntry> = self
            .entries
            .iter()
            .map(|(id, name)| RosterEntry {
                id: id.clone(),
                name: name.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_adds_new_entry() {
        // テスト項目: 新しい参加者がロスターに追加される
        // given (前提条件):
        let mut roster = Roster::new();

        // when (操作):
        let added = roster.upsert("alice", "Alice");

        // then (期待する結果):
        assert!(added);
        assert!(roster.contains("alice"));
        assert_eq!(roster.name_of("alice"), Some("Alice"));
    }

    #[test]
    fn test_upsert_existing_entry_does_not_duplicate() {
        // テスト項目: 既存 ID の追加はエントリを重複させない
        // given (前提条件):
        let mut roster = Roster::new();
        roster.upsert("alice", "Alice");

        // when (操作):
        let added = roster.upsert("alice", "Alicia");

        // then (期待する結果):
        assert!(!added);
        assert_eq!(roster.len(), 1);
        // 非空の名前は更新される
        assert_eq!(roster.name_of("alice"), Some("Alicia"));
    }

    #[test]
    fn test_upsert_with_empty_name_keeps_existing_name() {
        // テスト項目: 空の表示名では既存の名前が維持される
        // given (前提条件):
        let mut roster = Roster::new();
        roster.upsert("alice", "Alice");

        // when (操作):
        roster.upsert("alice", "");

        // then (期待する結果):
        assert_eq!(roster.name_of("alice"), Some("Alice"));
    }

    #[test]
    fn test_remove_unknown_entry_is_noop() {
        // テスト項目: 存在しないエントリの削除は no-op になる
        // given (前提条件):
        let mut roster = Roster::new();

        // when (操作):
        let removed = roster.remove("ghost");

        // then (期待する結果):
        assert!(!removed);
        assert!(roster.is_empty());
    }

    #[test]
    fn test_entries_sorted_by_id() {
        // テスト項目: エントリ一覧が参加者 ID 順で返される
        // given (前提条件):
        let mut roster = Roster::new();
        roster.upsert("charlie", "Charlie");
        roster.upsert("alice", "Alice");
        roster.upsert("bob", "Bob");

        // when (操作):
        let entries = roster.entries();

        // then (期待する結果):
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob", "charlie"]);
    }
}
