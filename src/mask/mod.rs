//! # 遮罩模块（mask）
//!
//! ## 设计思路
//!
//! 遮罩链路只处理二值位图，不依赖任何图片加载或网络能力：
//!
//! ```text
//! 画布 RGBA（stroke）──分类──▶ BitmapMask ──encode──▶ "MASK:WxH:r0,r1,..."
//!                                  ▲                         │
//!                                  └─────────decode──────────┘
//! ```
//!
//! - `bitmap`：`BitmapMask` 及黑白/透明栅格导出
//! - `classifier`：笔触与栅格遮罩的分类规则
//! - `codec`：游程编解码
//! - `stroke`：编辑会话内的笔触画布
//! - `error`：`MaskFormatError`

mod bitmap;
mod classifier;
mod codec;
mod error;
mod stroke;

pub use bitmap::BitmapMask;
pub use classifier::{MaskClassifier, STROKE_COLOR, is_mask_white, is_paint_stroke};
pub use codec::{
    DEFAULT_MAX_MASK_PIXELS, MASK_PREFIX, decode, decode_with_limit, encode, encode_runs,
    is_mask_string,
};
pub use error::MaskFormatError;
pub use stroke::StrokeCanvas;
