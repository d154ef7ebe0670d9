use std::sync::Arc;

use tracing::{info, instrument};

use super::models::{User, UserInput};
use crate::error::UserError;

/// 用户存储抽象, 每个方法对应一次存储调用
pub trait UserRepo: Send + Sync + std::fmt::Debug {
    /// 写入新用户, 由存储生成 `id` 与 `created_at`
    fn insert(
        &self,
        input: UserInput,
    ) -> impl std::future::Future<Output = Result<User, UserError>> + Send;

    /// 按插入顺序返回全部用户
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<User>, UserError>> + Send;

    fn find_by_id(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<User>, UserError>> + Send;

    /// 覆盖 name/email/age, 记录不存在时返回 None
    fn update(
        &self,
        id: i64,
        input: UserInput,
    ) -> impl std::future::Future<Output = Result<Option<User>, UserError>> + Send;

    /// 返回是否真的删除了一行
    fn delete(&self, id: i64) -> impl std::future::Future<Output = Result<bool, UserError>> + Send;
}

/// 用户业务逻辑用例
#[derive(Debug)]
pub struct UserUseCase<R: UserRepo> {
    user_repo: Arc<R>,
}

impl<R: UserRepo> UserUseCase<R> {
    pub fn new(user_repo: Arc<R>) -> Self {
        Self { user_repo }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: UserInput) -> Result<User, UserError> {
        let user = self.user_repo.insert(input).await?;
        info!(user_id = user.id, "user created");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<User>, UserError> {
        self.user_repo.list().await
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: i64) -> Result<User, UserError> {
        self.user_repo
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: i64, input: UserInput) -> Result<User, UserError> {
        self.user_repo
            .update(id, input)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), UserError> {
        if self.user_repo.delete(id).await? {
            info!(user_id = id, "user deleted");
            Ok(())
        } else {
            Err(UserError::NotFound(id))
        }
    }
}
