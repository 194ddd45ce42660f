// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 协议参数与常量模块
//!
//! 该模块集中定义了响应桥接层使用的常量，包括：
//! - 需要特殊分派的头部名称（精确匹配，区分大小写）。
//! - 传输缓冲区与公共根目录等默认值。
//! - HTTP/1.1 输出端使用的状态原因短语表。
//! - 演示服务器使用的 MIME 类型映射表。

use std::collections::HashMap;
use lazy_static::lazy_static;

/// 由 `set_content_type` 处理的头部名称
pub const CONTENT_TYPE: &str = "Content-Type";

/// 由 `set_content_length` 处理的头部名称
pub const CONTENT_LENGTH: &str = "Content-Length";

/// 决定分块传输信号的头部名称
pub const TRANSFER_ENCODING: &str = "Transfer-Encoding";

/// `Transfer-Encoding` 取该值时响应被视为分块传输
pub const CHUNKED: &str = "chunked";

/// 通道复制与流复制循环使用的默认缓冲区大小
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// 指定公共根目录的初始化参数名
pub const PUBLIC_ROOT_PARAM: &str = "public.root";

/// 未设置 `public.root` 时使用的默认公共根目录
pub const DEFAULT_PUBLIC_ROOT: &str = "/WEB-INF/public";

/// 服务器名称标识，用于 HTTP 响应头的 `Server` 字段
pub const SERVER_NAME: &str = "shaneyale-response-bridge";

/// 演示服务器读取请求报文头的字节上限（请求行与全部头部合计）
pub const MAX_REQUEST_HEAD: u64 = 8192;

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

lazy_static! {
    /// HTTP 状态码与其对应的标准原因短语映射表。
    ///
    /// 参考标准：[RFC 9110: HTTP Semantics](https://www.rfc-editor.org/rfc/rfc9110.html)。
    /// 未收录的状态码在状态行中使用空的原因短语。
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = {
        let mut map = HashMap::new();
        map.insert(100, "Continue");
        map.insert(101, "Switching Protocols");

        map.insert(200, "OK");
        map.insert(201, "Created");
        map.insert(202, "Accepted");
        map.insert(204, "No Content");
        map.insert(206, "Partial Content");

        map.insert(301, "Moved Permanently");
        map.insert(302, "Found");
        map.insert(303, "See Other");
        map.insert(304, "Not Modified");
        map.insert(307, "Temporary Redirect");
        map.insert(308, "Permanent Redirect");

        map.insert(400, "Bad Request");
        map.insert(401, "Unauthorized");
        map.insert(403, "Forbidden");
        map.insert(404, "Not Found");
        map.insert(405, "Method Not Allowed");
        map.insert(409, "Conflict");
        map.insert(410, "Gone");
        map.insert(411, "Length Required");
        map.insert(413, "Content Too Large");
        map.insert(415, "Unsupported Media Type");
        map.insert(416, "Range Not Satisfiable");

        map.insert(500, "Internal Server Error");
        map.insert(501, "Not Implemented");
        map.insert(502, "Bad Gateway");
        map.insert(503, "Service Unavailable");
        map.insert(504, "Gateway Timeout");
        map.insert(505, "HTTP Version Not Supported");
        map
    };
}

lazy_static! {
    /// 文件后缀名到 MIME 类型的映射表，演示服务器据此设置 `Content-Type`。
    pub static ref MIME_TYPES: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        map.insert("css", "text/css;charset=utf-8");
        map.insert("csv", "text/csv");
        map.insert("gif", "image/gif");
        map.insert("gz", "application/gzip");
        map.insert("htm", "text/html;charset=utf-8");
        map.insert("html", "text/html;charset=utf-8");
        map.insert("ico", "image/x-icon");
        map.insert("jpg", "image/jpeg");
        map.insert("jpeg", "image/jpeg");
        map.insert("js", "text/javascript;charset=utf-8");
        map.insert("json", "application/json");
        map.insert("mp3", "audio/mpeg");
        map.insert("mp4", "video/mp4");
        map.insert("pdf", "application/pdf");
        map.insert("png", "image/png");
        map.insert("svg", "image/svg+xml");
        map.insert("txt", "text/plain;charset=utf-8");
        map.insert("wasm", "application/wasm");
        map.insert("webp", "image/webp");
        map.insert("woff2", "font/woff2");
        map.insert("xml", "text/xml");
        map.insert("zip", "application/zip");
        // 兜底类型（通常用于无法识别后缀的二进制流）
        map.insert("_", "application/octet-stream");
        map
    };
}

/// 根据文件后缀查找 MIME 类型，未知后缀返回 `application/octet-stream`。
pub fn mime_for(extension: Option<&str>) -> &'static str {
    let key = extension.map(|e| e.to_ascii_lowercase());
    key.as_deref()
        .and_then(|e| MIME_TYPES.get(e).copied())
        .unwrap_or(MIME_TYPES["_"])
}

/// 查找状态码的原因短语。
pub fn reason_phrase(code: u16) -> &'static str {
    STATUS_CODES.get(&code).copied().unwrap_or("")
}
