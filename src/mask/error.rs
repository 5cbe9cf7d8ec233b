//! # 遮罩格式错误
//!
//! ## 设计思路
//!
//! 编解码是纯函数，错误以返回值形式交给调用方，不做任何截断或补齐。
//! 每个分支对应一种可定位的格式问题，便于上层展示简短诊断。

/// 遮罩字符串 / 遮罩位图构造错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MaskFormatError {
    #[error("缺少遮罩前缀 `MASK:`")]
    MissingPrefix,

    #[error("遮罩结构错误：{0}")]
    Malformed(String),

    #[error("遮罩尺寸无效：{0}")]
    InvalidDimensions(String),

    #[error("游程长度无效：{0}")]
    InvalidRun(String),

    #[error("游程总和 {actual} 与像素总数 {expected} 不一致")]
    RunSumMismatch { expected: u64, actual: u64 },

    #[error("像素数据长度 {actual} 与 {width}x{height} 不匹配")]
    LengthMismatch { width: u32, height: u32, actual: usize },

    #[error("遮罩像素过大：{pixels} 像素（限制：{limit} 像素）")]
    TooLarge { pixels: u64, limit: u64 },
}

impl MaskFormatError {
    /// 稳定错误码，供日志检索与前端分支判断。
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingPrefix => "MASK_MISSING_PREFIX",
            Self::Malformed(_) => "MASK_MALFORMED",
            Self::InvalidDimensions(_) => "MASK_INVALID_DIMENSIONS",
            Self::InvalidRun(_) => "MASK_INVALID_RUN",
            Self::RunSumMismatch { .. } => "MASK_RUN_SUM_MISMATCH",
            Self::LengthMismatch { .. } => "MASK_LENGTH_MISMATCH",
            Self::TooLarge { .. } => "MASK_TOO_LARGE",
        }
    }
}
