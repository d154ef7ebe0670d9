use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 存储中的用户记录, `id` 与 `created_at` 由存储层生成
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: i64,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: DateTime<Utc>,
}

/// 创建与更新共用的请求体, 只有这三个字段可写
///
/// 客户端带上的 `id` / `createdAt` 会被忽略
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    pub name: String,
    pub email: String,
    pub age: i64,
}

impl UserInput {
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: i64) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            age,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serializes_created_at_alias() {
        let user = User {
            id: 1,
            name: "Ann".to_string(),
            email: "a@x.com".to_string(),
            age: 30,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("created_at").is_none());
        assert_eq!(value["id"], 1);
    }

    #[test]
    fn test_input_ignores_generated_fields() {
        let input: UserInput = serde_json::from_str(
            r#"{"id": 99, "name": "Ann", "email": "a@x.com", "age": 30,
                "createdAt": "2020-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(input, UserInput::new("Ann", "a@x.com", 30));
    }

    #[test]
    fn test_input_requires_all_fields() {
        assert!(serde_json::from_str::<UserInput>(r#"{"name": "Ann", "age": 30}"#).is_err());
        for raw in [
            r#"{"name": "Ann", "email": "a@x.com", "age": "old"}"#,
            r#"{"name": null, "email": "a@x.com", "age": 3}"#,
            r#"{"name": "Ann", "email": "a@x.com", "age": 30.5}"#,
            // 数字字符串和带小数点的整数同样不接受
            r#"{"name": "Ann", "email": "a@x.com", "age": "30"}"#,
            r#"{"name": "Ann", "email": "a@x.com", "age": 30.0}"#,
        ] {
            assert!(serde_json::from_str::<UserInput>(raw).is_err(), "{raw}");
        }
    }
}
