//! # 遮罩预览模块（overlay）
//!
//! ## 设计思路
//!
//! 将“原图引用 + 遮罩字符串 → 着色预览”按职责拆分：
//!
//! - `handler`：编排整条链路，持有可切换的配置
//! - `loader`：两级回退加载（读回 / 仅绘制）与来源安全校验
//! - `pipeline`：解码、像素限制、缩放
//! - `compositor`：显示尺寸计算与红色着色
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! ```text
//! OverlayHandler::composite
//!    ├─ loader.rs（读回模式 → 失败则仅绘制模式）──▶ pipeline.rs（解码）
//!    └─ mask::decode_with_limit（与加载并发）
//!    ↓
//! require_readback 检查
//!    ↓
//! compositor.rs（fit_within → resize → tint）
//!    ↓
//! PixelBuffer 或 CompositeError
//! ```
//!
//! ## 分层职责建议
//!
//! - 配置与策略变更优先改 `config.rs`
//! - 流程顺序变更优先改 `handler.rs`
//! - 来源与网络行为改 `loader.rs`，像素行为改 `pipeline/compositor`

mod compositor;
mod config;
mod error;
mod handler;
mod loader;
mod pipeline;
mod source;

pub use compositor::{
    TINT_BLUE_CUT, TINT_GREEN_CUT, TINT_RED_BOOST, apply_mask_tint, composite_pixels, display_size,
    tint_pixel,
};
pub use config::{OverlayAdvancedConfig, OverlayConfig, PreviewProfile};
pub use error::{CompositeError, ImageError, LoadError};
pub use handler::OverlayHandler;
pub use pipeline::{probe_dimensions, resize_pixels};
pub use source::{AcquireMode, ImageSource, LoadedImage, PixelBuffer, encode_png, png_data_url};
