use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::biz::{User, UserInput, UserRepo};
use crate::error::UserError;

/// 进程内存储, 用于测试替身和本地调试
///
/// id 单调递增且不复用, BTreeMap 的遍历顺序即插入顺序
#[derive(Debug, Default)]
pub struct InMemoryUserRepo {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    rows: BTreeMap<i64, User>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepo for InMemoryUserRepo {
    #[instrument(skip(self))]
    async fn insert(&self, input: UserInput) -> Result<User, UserError> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let user = User {
            id: inner.last_id,
            name: input.name,
            email: input.email,
            age: input.age,
            created_at: Utc::now(),
        };
        inner.rows.insert(user.id, user.clone());
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<User>, UserError> {
        Ok(self.inner.read().await.rows.values().cloned().collect())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserError> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    #[instrument(skip(self))]
    async fn update(&self, id: i64, input: UserInput) -> Result<Option<User>, UserError> {
        let mut inner = self.inner.write().await;
        Ok(inner.rows.get_mut(&id).map(|user| {
            user.name = input.name;
            user.email = input.email;
            user.age = input.age;
            user.clone()
        }))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<bool, UserError> {
        Ok(self.inner.write().await.rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_are_not_reused() {
        let repo = InMemoryUserRepo::new();
        let first = repo.insert(UserInput::new("a", "a@x.com", 1)).await.unwrap();
        assert!(repo.delete(first.id).await.unwrap());

        let second = repo.insert(UserInput::new("b", "b@x.com", 2)).await.unwrap();
        assert!(second.id > first.id);
        assert!(!repo.delete(first.id).await.unwrap());
    }
}
