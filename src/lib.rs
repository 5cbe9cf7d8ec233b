//! # 遮罩编解码与叠加预览：库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 编辑界面 / CLI（调用方）                  │
//! │                                                          │
//! │  笔触画布 ──▶ 遮罩字符串 ──▶ 编辑请求 / 预览请求         │
//! └───────┼───────────────────────────┼──────────────────────┘
//!         ↕                           ↕  Result<T, AppError>
//! ┌───────┼───────────────────────────┼──────────────────────┐
//! │       ↕            Rust           ↕                      │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  ├─ mask ─────── BitmapMask + 游程编解码 + 笔触画布       │
//! │  │   └─ classifier   笔触红 / 栅格白 分类规则            │
//! │  │                                                       │
//! │  ├─ resample ─── 最近邻坐标映射 + fit_within              │
//! │  │                                                       │
//! │  └─ overlay ──── 两级加载 · 解码 · 缩放 · 红色着色        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，CLI 与外部调用的返回类型 |
//! | [`mask`] | 二值遮罩、`MASK:WxH:runs` 编解码、笔触画布 |
//! | [`resample`] | 不同分辨率网格之间的最近邻映射、保持宽高比的缩放尺寸 |
//! | [`overlay`] | 从 URL/Data URL/文件加载原图并生成遮罩着色预览 |

pub mod error;
pub mod mask;
pub mod overlay;
pub mod resample;
