//! # 加载与回退模块
//!
//! ## 设计思路
//!
//! 原图获取采用固定的两级策略：
//! 1. 读回模式：请求跨域读回许可（携带 `Origin`，要求响应给出匹配的
//!    `Access-Control-Allow-Origin`），结果可做像素检查。
//! 2. 仅绘制模式：第一级任何失败都会以不请求读回许可的方式重试一次，结果标记为不可读回。
//!
//! 两级都失败时返回 `LoadError`，没有第三级，也没有开放式重试循环。
//!
//! ## 实现思路
//!
//! - URL：协议 + 主机安全 + 内容类型 + 体积校验 + 流式下载 + 首包/分块超时。
//! - Data URL / Base64：格式解析 + 解码前体积估算。
//! - 文件：metadata 体积限制 + 读取。
//! - 所有来源在解码前都做文件签名校验。
//!
//! 取消即“不再等待”：丢弃 future 即可，加载过程不写任何共享状态。

use base64::{Engine as _, engine::general_purpose};
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use super::pipeline;
use super::source::{AcquireMode, ImageSource, LoadedImage, RawImageData};
use super::{ImageError, LoadError, OverlayConfig, OverlayHandler};

const STREAM_SIGNATURE_PROBE_BYTES: usize = 4096;
const BUFFER_INITIAL_CAPACITY: usize = 16 * 1024;

/// 上传允许的图片类型。
const UPLOAD_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

impl OverlayHandler {
    /// 两级回退加载并解码原图。
    pub(super) async fn acquire(
        &self,
        source: &ImageSource,
        config: &OverlayConfig,
    ) -> Result<LoadedImage, LoadError> {
        let readback = match Self::acquire_with_mode(source, config, AcquireMode::Readback).await {
            Ok(image) => return Ok(image),
            Err(err) => err,
        };

        log::warn!(
            "⚠️ 读回模式加载失败，改用仅绘制模式重试 - 来源: {} 原因: {}",
            source.hint(),
            readback
        );

        match Self::acquire_with_mode(source, config, AcquireMode::DrawOnly).await {
            Ok(image) => {
                log::info!(
                    "🎨 仅绘制模式加载成功 - 来源: {}（结果不可做像素检查）",
                    source.hint()
                );
                Ok(image)
            }
            Err(draw_only) => {
                log::error!(
                    "❌ 原图加载两级均失败 - 来源: {} 读回: {} 仅绘制: {}",
                    source.hint(),
                    readback.code(),
                    draw_only.code()
                );
                Err(LoadError { readback, draw_only })
            }
        }
    }

    async fn acquire_with_mode(
        source: &ImageSource,
        config: &OverlayConfig,
        mode: AcquireMode,
    ) -> Result<LoadedImage, ImageError> {
        let raw = match source {
            ImageSource::Url(url) => Self::load_from_url(url, config, mode).await?,
            ImageSource::DataUrl(data) => Self::load_from_data_url(data, config)?,
            ImageSource::FilePath(path) => Self::load_from_file(path, config).await?,
            ImageSource::Bytes(bytes) => Self::load_from_bytes(bytes, config)?,
        };

        let pixels = pipeline::decode_pixels(&raw, config)?;

        Ok(LoadedImage {
            pixels,
            mode,
            source_hint: raw.source_hint,
        })
    }

    /// 从 URL 下载原图字节。
    async fn load_from_url(
        url: &str,
        config: &OverlayConfig,
        mode: AcquireMode,
    ) -> Result<RawImageData, ImageError> {
        log::info!(
            "🌐 开始下载原图 - URL: {} 模式: {}",
            Self::redact_url_for_log(url),
            mode.as_str()
        );

        let mut current_url = Self::validate_url_safety(url, config)?;
        let client = Self::build_http_client(config)?;

        for redirect_count in 0..=config.max_redirects {
            let mut request = client.get(current_url.clone()).header(
                reqwest::header::ACCEPT,
                "image/avif,image/webp,image/png,image/jpeg,image/*;q=0.8",
            );
            if mode == AcquireMode::Readback {
                request = request.header(reqwest::header::ORIGIN, config.readback_origin.as_str());
            }

            let response = request
                .send()
                .await
                .map_err(|e| Self::map_reqwest_error(e, current_url.as_str(), config))?;

            if response.status().is_redirection() {
                if redirect_count >= config.max_redirects {
                    return Err(ImageError::Network(format!(
                        "重定向次数超过限制（{}）",
                        config.max_redirects
                    )));
                }

                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .ok_or_else(|| ImageError::Network("重定向响应缺少 Location 头".to_string()))?
                    .to_str()
                    .map_err(|e| ImageError::InvalidFormat(format!("重定向地址无效：{}", e)))?;

                let next_url = current_url
                    .join(location)
                    .map_err(|e| ImageError::InvalidFormat(format!("重定向 URL 解析失败：{}", e)))?;

                current_url = Self::validate_url_safety(next_url.as_str(), config)?;
                log::debug!("↪️ 跳转到: {}", Self::redact_url_for_log(current_url.as_str()));
                continue;
            }

            if !response.status().is_success() {
                return Err(ImageError::Network(format!(
                    "HTTP {}: {}",
                    response.status().as_u16(),
                    Self::status_message(response.status().as_u16())
                )));
            }

            if mode == AcquireMode::Readback {
                Self::check_cross_origin_readback(response.headers(), &config.readback_origin)?;
            }

            if let Some(ct) = response.headers().get(reqwest::header::CONTENT_TYPE) {
                if let Ok(ct_str) = ct.to_str() {
                    if !Self::is_image_content_type(ct_str) {
                        return Err(ImageError::InvalidFormat(format!("不是图片类型：{}", ct_str)));
                    }
                }
            }

            let total_len = response.content_length();
            if let Some(size) = total_len {
                if size > config.max_file_size {
                    return Err(Self::file_too_large(size, config.max_file_size));
                }
            }

            let bytes = Self::read_body_with_limits(response, total_len, config).await?;
            return Ok(RawImageData {
                bytes,
                source_hint: "url",
            });
        }

        Err(ImageError::Network("下载流程异常结束".to_string()))
    }

    /// 流式读取响应体：首包/分块超时、体积上限、签名探测。
    async fn read_body_with_limits(
        mut response: reqwest::Response,
        total_len: Option<u64>,
        config: &OverlayConfig,
    ) -> Result<Vec<u8>, ImageError> {
        let initial_capacity = total_len
            .map(|len| len.min(config.max_file_size) as usize)
            .filter(|len| *len > 0)
            .unwrap_or(BUFFER_INITIAL_CAPACITY);
        let mut buffer = Vec::with_capacity(initial_capacity);
        let mut signature_validated = false;
        let mut received_first_chunk = false;

        loop {
            let read_timeout = if received_first_chunk {
                Duration::from_millis(config.stream_chunk_timeout_ms)
            } else {
                Duration::from_millis(config.stream_first_byte_timeout_ms)
            };

            let next_chunk = tokio::time::timeout(read_timeout, response.chunk())
                .await
                .map_err(|_| {
                    if received_first_chunk {
                        ImageError::Timeout("下载数据流读取超时".to_string())
                    } else {
                        ImageError::Timeout("下载首包超时".to_string())
                    }
                })?
                .map_err(|e| ImageError::Network(format!("下载失败：{}", e)))?;

            let Some(chunk) = next_chunk else {
                break;
            };
            received_first_chunk = true;

            if (buffer.len() + chunk.len()) as u64 > config.max_file_size {
                return Err(ImageError::ResourceLimit("下载后文件超过大小限制".to_string()));
            }
            buffer.extend_from_slice(&chunk);

            if !signature_validated {
                signature_validated =
                    Self::validate_stream_signature_probe(&buffer, STREAM_SIGNATURE_PROBE_BYTES)?;
            }
        }

        if !signature_validated {
            Self::validate_image_signature(&buffer)?;
        }

        log::debug!("✅ 下载完成 - {} bytes", buffer.len());
        Ok(buffer)
    }

    /// 从 Data URL 或纯 Base64 加载原图字节。
    fn load_from_data_url(data: &str, config: &OverlayConfig) -> Result<RawImageData, ImageError> {
        log::debug!("📝 开始处理 base64 原图");

        let bytes = Self::parse_base64_with_limit(data, config.max_file_size)?;
        if bytes.len() as u64 > config.max_file_size {
            return Err(Self::file_too_large(bytes.len() as u64, config.max_file_size));
        }
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "data-url",
        })
    }

    async fn load_from_file(path: &Path, config: &OverlayConfig) -> Result<RawImageData, ImageError> {
        log::debug!("📁 开始读取本地原图 - 路径: {}", path.display());

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| ImageError::FileSystem(format!("无法读取文件信息 {}：{}", path.display(), e)))?;

        if metadata.len() > config.max_file_size {
            return Err(Self::file_too_large(metadata.len(), config.max_file_size));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ImageError::FileSystem(format!("无法读取图片文件：{}", e)))?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "file",
        })
    }

    fn load_from_bytes(bytes: &[u8], config: &OverlayConfig) -> Result<RawImageData, ImageError> {
        if bytes.len() as u64 > config.max_file_size {
            return Err(Self::file_too_large(bytes.len() as u64, config.max_file_size));
        }
        Self::validate_image_signature(bytes)?;

        Ok(RawImageData {
            bytes: bytes.to_vec(),
            source_hint: "bytes",
        })
    }

    /// 上传校验：仅接受 JPEG / PNG / WebP，且不超过体积上限。返回识别出的 MIME。
    pub fn validate_upload(bytes: &[u8], config: &OverlayConfig) -> Result<&'static str, ImageError> {
        if bytes.len() as u64 > config.max_file_size {
            return Err(Self::file_too_large(bytes.len() as u64, config.max_file_size));
        }

        let kind = infer::get(bytes)
            .ok_or_else(|| ImageError::InvalidFormat("无法识别图片类型".to_string()))?;

        if !UPLOAD_MIME_TYPES.contains(&kind.mime_type()) {
            return Err(ImageError::InvalidFormat(format!(
                "不支持的上传类型：{}（可选：JPEG / PNG / WebP）",
                kind.mime_type()
            )));
        }

        Ok(kind.mime_type())
    }

    fn check_cross_origin_readback(
        headers: &reqwest::header::HeaderMap,
        origin: &str,
    ) -> Result<(), ImageError> {
        let allowed = headers
            .get(reqwest::header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok())
            .map(str::trim);

        match allowed {
            Some("*") => Ok(()),
            Some(value) if value == origin => Ok(()),
            Some(value) => Err(ImageError::CrossOrigin(format!(
                "Access-Control-Allow-Origin 不匹配：{}",
                value
            ))),
            None => Err(ImageError::CrossOrigin(
                "响应缺少 Access-Control-Allow-Origin 头".to_string(),
            )),
        }
    }

    fn build_http_client(config: &OverlayConfig) -> Result<reqwest::Client, ImageError> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ImageError::Network(format!("无法创建 HTTP 客户端：{}", e)))
    }

    /// 校验 URL 安全性，默认阻止本地/内网目标。
    fn validate_url_safety(url: &str, config: &OverlayConfig) -> Result<reqwest::Url, ImageError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| ImageError::InvalidFormat(format!("URL 格式错误：{}", e)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ImageError::InvalidFormat("仅支持 HTTP/HTTPS".to_string()));
        }

        if config.allow_private_network {
            return Ok(parsed);
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| ImageError::InvalidFormat("URL 缺少主机地址".to_string()))?;

        if Self::is_local_hostname(host) {
            return Err(ImageError::InvalidFormat(format!("禁止访问本地网络地址：{}", host)));
        }

        let bare_host = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = bare_host.parse::<IpAddr>() {
            if Self::is_private_or_local_ip(ip) {
                return Err(ImageError::InvalidFormat(format!("禁止访问内网 IP：{}", ip)));
            }
        }

        Ok(parsed)
    }

    fn is_local_hostname(host: &str) -> bool {
        host.eq_ignore_ascii_case("localhost")
            || host.eq_ignore_ascii_case("localhost.")
            || host.ends_with(".local")
    }

    fn is_private_or_local_ip(ip: IpAddr) -> bool {
        match ip {
            IpAddr::V4(v4) => {
                v4.is_private()
                    || v4.is_loopback()
                    || v4.is_link_local()
                    || v4.is_broadcast()
                    || v4.is_unspecified()
                    || v4.is_multicast()
                    || v4.octets()[0] == 0
            }
            IpAddr::V6(v6) => {
                v6.is_loopback()
                    || v6.is_unspecified()
                    || v6.is_unique_local()
                    || v6.is_unicast_link_local()
                    || v6.is_multicast()
            }
        }
    }

    fn is_image_content_type(content_type: &str) -> bool {
        content_type
            .split(';')
            .next()
            .map(|base| base.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false)
    }

    fn redact_url_for_log(url: &str) -> String {
        let Ok(parsed) = reqwest::Url::parse(url) else {
            return "<invalid-url>".to_string();
        };

        let host = parsed.host_str().unwrap_or("<unknown-host>");
        let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();

        format!("{}://{}{}{}", parsed.scheme(), host, port, parsed.path())
    }

    fn map_reqwest_error(e: reqwest::Error, url: &str, config: &OverlayConfig) -> ImageError {
        let err_msg = e.to_string().replace(url, &Self::redact_url_for_log(url));

        if e.is_timeout() {
            ImageError::Timeout(format!("下载超时（{}秒）", config.download_timeout))
        } else if e.is_connect() {
            ImageError::Network(format!("无法连接：{}", err_msg))
        } else {
            ImageError::Network(format!("请求失败：{}", err_msg))
        }
    }

    fn status_message(code: u16) -> &'static str {
        match code {
            404 => "未找到",
            403 => "访问被拒绝",
            500..=599 => "服务器错误",
            _ => "请求失败",
        }
    }

    fn file_too_large(size: u64, limit: u64) -> ImageError {
        ImageError::ResourceLimit(format!(
            "文件过大：{:.2} MB（限制：{:.2} MB）",
            size as f64 / 1024.0 / 1024.0,
            limit as f64 / 1024.0 / 1024.0
        ))
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> u64 {
        (base64_data.trim().len() as u64).div_ceil(4) * 3
    }

    fn parse_base64_with_limit(data: &str, max_file_size: u64) -> Result<Vec<u8>, ImageError> {
        let normalized = data.trim();

        let payload = if normalized.starts_with("data:") {
            if !normalized.starts_with("data:image/") {
                return Err(ImageError::InvalidFormat("Data URL 不是图片类型".to_string()));
            }
            let base64_start = normalized
                .find(";base64,")
                .ok_or_else(|| ImageError::InvalidFormat("缺少 base64 标记".to_string()))?;
            &normalized[base64_start + 8..]
        } else {
            normalized
        };

        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(payload);
        if estimated_len > max_file_size {
            return Err(ImageError::ResourceLimit(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| ImageError::Decode(format!("Base64 解码失败：{}", e)))
    }

    /// 通过文件签名（magic bytes）校验输入是否为图片。
    fn validate_image_signature(bytes: &[u8]) -> Result<(), ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::InvalidFormat("图片内容为空".to_string()));
        }

        let kind = infer::get(bytes)
            .ok_or_else(|| ImageError::InvalidFormat("无法识别图片类型".to_string()))?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(ImageError::InvalidFormat(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }

        Ok(())
    }

    /// 流式签名探测：`Ok(true)` 已确认是图片，`Ok(false)` 字节不足继续读取。
    fn validate_stream_signature_probe(bytes: &[u8], probe_limit: usize) -> Result<bool, ImageError> {
        if bytes.is_empty() {
            return Ok(false);
        }

        if let Some(kind) = infer::get(bytes) {
            if kind.matcher_type() != infer::MatcherType::Image {
                return Err(ImageError::InvalidFormat(format!(
                    "下载内容不是图片类型：{}",
                    kind.mime_type()
                )));
            }
            return Ok(true);
        }

        if bytes.len() >= probe_limit {
            return Err(ImageError::InvalidFormat(format!(
                "下载前 {} 字节内无法识别图片类型",
                probe_limit
            )));
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::source::encode_png;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x * 10) as u8, (y * 10) as u8, 50, 255])
        });
        encode_png(&img).expect("failed to encode test image")
    }

    fn local_config() -> OverlayConfig {
        let mut config = OverlayConfig::default();
        config.allow_private_network = true;
        config
    }

    /// 依次应答 `responses.len()` 个连接，返回收到的请求头（小写）。
    fn serve(responses: Vec<(String, Vec<u8>)>) -> (u16, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
        let port = listener.local_addr().expect("read local addr failed").port();

        let server = thread::spawn(move || {
            let mut requests = Vec::new();
            for (head, body) in responses {
                let (mut stream, _) = listener.accept().expect("accept failed");

                let mut req_buf = [0u8; 2048];
                let n = stream.read(&mut req_buf).unwrap_or(0);
                requests.push(String::from_utf8_lossy(&req_buf[..n]).to_ascii_lowercase());

                let response = format!(
                    "{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    head,
                    body.len()
                );
                stream.write_all(response.as_bytes()).expect("write headers failed");
                stream.write_all(&body).expect("write body failed");
                stream.flush().expect("flush failed");
            }
            requests
        });

        (port, server)
    }

    #[tokio::test]
    async fn data_url_loads_in_readback_mode() {
        let handler = OverlayHandler::new(OverlayConfig::default());
        let data_url = crate::overlay::source::png_data_url(&png_bytes(6, 4));

        let loaded = handler
            .acquire(&ImageSource::DataUrl(data_url), &OverlayConfig::default())
            .await
            .expect("data url should load");

        assert_eq!(loaded.pixels.dimensions(), (6, 4));
        assert!(loaded.is_readable());
        assert_eq!(loaded.source_hint, "data-url");
    }

    #[tokio::test]
    async fn non_image_payload_fails_both_tiers() {
        let handler = OverlayHandler::new(OverlayConfig::default());
        let result = handler
            .acquire(&ImageSource::DataUrl("SGVsbG8=".to_string()), &OverlayConfig::default())
            .await;

        let err = result.expect_err("non-image payload must fail");
        assert!(matches!(err.readback, ImageError::InvalidFormat(_)));
        assert!(matches!(err.draw_only, ImageError::InvalidFormat(_)));
    }

    #[tokio::test]
    async fn missing_file_is_a_file_system_error() {
        let handler = OverlayHandler::new(OverlayConfig::default());
        let err = handler
            .acquire(
                &ImageSource::FilePath("/definitely/not/here.png".into()),
                &OverlayConfig::default(),
            )
            .await
            .expect_err("missing file must fail");

        assert!(matches!(err.draw_only, ImageError::FileSystem(_)));
    }

    #[tokio::test]
    async fn url_without_cors_header_falls_back_to_draw_only() {
        let png = png_bytes(8, 8);
        let head = "HTTP/1.1 200 OK\r\nContent-Type: image/png".to_string();
        let (port, server) = serve(vec![(head.clone(), png.clone()), (head, png)]);

        let handler = OverlayHandler::new(local_config());
        let url = format!("http://127.0.0.1:{}/photo.png", port);
        let loaded = handler
            .acquire(&ImageSource::Url(url), &local_config())
            .await
            .expect("second tier should succeed");

        let requests = server.join().expect("server thread failed");

        assert_eq!(loaded.mode, AcquireMode::DrawOnly);
        assert!(!loaded.is_readable());
        assert_eq!(loaded.pixels.dimensions(), (8, 8));
        assert!(requests[0].contains("origin: null"));
        assert!(!requests[1].contains("origin:"));
    }

    #[tokio::test]
    async fn url_with_cors_header_stays_readable() {
        let png = png_bytes(5, 3);
        let head = "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nAccess-Control-Allow-Origin: *".to_string();
        let (port, server) = serve(vec![(head, png)]);

        let handler = OverlayHandler::new(local_config());
        let url = format!("http://127.0.0.1:{}/photo.png", port);
        let loaded = handler
            .acquire(&ImageSource::Url(url), &local_config())
            .await
            .expect("first tier should succeed");

        server.join().expect("server thread failed");
        assert_eq!(loaded.mode, AcquireMode::Readback);
    }

    #[tokio::test]
    async fn http_errors_exhaust_exactly_two_tiers() {
        let head = "HTTP/1.1 404 Not Found\r\nContent-Type: text/plain".to_string();
        let (port, server) = serve(vec![(head.clone(), b"nope".to_vec()), (head, b"nope".to_vec())]);

        let handler = OverlayHandler::new(local_config());
        let url = format!("http://127.0.0.1:{}/missing.png", port);
        let err = handler
            .acquire(&ImageSource::Url(url), &local_config())
            .await
            .expect_err("404 must fail");

        let requests = server.join().expect("server thread failed");
        assert_eq!(requests.len(), 2);
        assert!(matches!(err.readback, ImageError::Network(_)));
        assert!(matches!(err.draw_only, ImageError::Network(_)));
    }

    #[test]
    fn url_safety_blocks_private_targets_by_default() {
        let config = OverlayConfig::default();
        for url in [
            "http://localhost/a.png",
            "http://127.0.0.1/a.png",
            "http://192.168.1.4/a.png",
            "http://[::1]/a.png",
            "ftp://example.com/a.png",
        ] {
            assert!(
                matches!(OverlayHandler::validate_url_safety(url, &config), Err(ImageError::InvalidFormat(_))),
                "{url} should be rejected"
            );
        }
        assert!(OverlayHandler::validate_url_safety("https://example.com/a.png", &config).is_ok());
    }

    #[test]
    fn cors_header_must_match_origin() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert!(matches!(
            OverlayHandler::check_cross_origin_readback(&headers, "null"),
            Err(ImageError::CrossOrigin(_))
        ));

        headers.insert(
            reqwest::header::ACCESS_CONTROL_ALLOW_ORIGIN,
            reqwest::header::HeaderValue::from_static("https://app.example"),
        );
        assert!(OverlayHandler::check_cross_origin_readback(&headers, "https://app.example").is_ok());
        assert!(OverlayHandler::check_cross_origin_readback(&headers, "null").is_err());
    }

    #[test]
    fn upload_validation_accepts_png_and_rejects_others() {
        let config = OverlayConfig::default();
        assert_eq!(
            OverlayHandler::validate_upload(&png_bytes(2, 2), &config).expect("png must pass"),
            "image/png"
        );

        let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;";
        assert!(matches!(
            OverlayHandler::validate_upload(gif, &config),
            Err(ImageError::InvalidFormat(_))
        ));

        let mut small = OverlayConfig::default();
        small.max_file_size = 16;
        assert!(matches!(
            OverlayHandler::validate_upload(&png_bytes(2, 2), &small),
            Err(ImageError::ResourceLimit(_))
        ));
    }

    #[test]
    fn base64_limit_is_checked_before_decode() {
        let huge = "A".repeat(1024 * 1024);
        let result = OverlayHandler::parse_base64_with_limit(&huge, 32);
        assert!(matches!(result, Err(ImageError::ResourceLimit(_))));
    }

    #[test]
    fn redact_url_for_log_removes_query_and_fragment() {
        let redacted = OverlayHandler::redact_url_for_log("https://cdn.example.com:8443/a/b.png?token=abc#frag");
        assert_eq!(redacted, "https://cdn.example.com:8443/a/b.png");
    }

    #[test]
    fn stream_probe_rejects_html() {
        let payload = b"<html><body>not an image</body></html>";
        let result = OverlayHandler::validate_stream_signature_probe(payload, 16);
        assert!(matches!(result, Err(ImageError::InvalidFormat(_))));
    }
}
