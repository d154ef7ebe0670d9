/*
 * @Description: 通用错误响应结构
 */

use serde::Serialize;

/// 业务错误码, 序列化为数值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrCode {
    /// 操作成功
    Success = 0,
    /// 资源未找到
    NotFound = 404,
    /// 内部服务器错误
    InternalServerError = 500,

    // 业务特定错误码 (1000+)
    /// 参数验证失败
    ValidationError = 1001,
    /// 数据库操作失败
    DatabaseError = 1002,
}

impl ErrCode {
    /// 获取默认的错误消息
    pub fn default_message(&self) -> &'static str {
        match *self {
            ErrCode::Success => "Success",
            ErrCode::NotFound => "Resource not found",
            ErrCode::InternalServerError => "Internal server error",
            ErrCode::ValidationError => "Validation failed",
            ErrCode::DatabaseError => "Database operation failed",
        }
    }
}

// 序列化时使用数值
impl Serialize for ErrCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(*self as i32)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response<T = ()>
where
    T: Serialize,
{
    /// 响应状态码
    pub code: ErrCode,
    /// 响应消息
    pub msg: String,
    /// 响应数据
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Response<T>
where
    T: Serialize,
{
    pub fn new(code: ErrCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
        }
    }

    pub fn success(data: Option<T>) -> Self {
        Self {
            code: ErrCode::Success,
            msg: ErrCode::Success.default_message().to_string(),
            data,
        }
    }

    // 失败响应, msg 为空时使用错误码的默认消息
    pub fn failed(code: ErrCode, msg: Option<impl Into<String>>) -> Self {
        match msg {
            Some(msg) => Self::new(code, msg),
            None => Self::new(code, code.default_message()),
        }
    }
}
