// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了响应写出过程中可能出现的各类异常情况。
//!
//! ## 设计意图
//! - **错误分类**：涵盖状态码转换失败、`Content-Length` 无法转换为整数、输出通道 I/O 失败以及配置加载失败。
//! - **快速失败**：状态码非法时在写出任何头部之前立即返回；I/O 失败立即中止当前步骤，已写出的状态与头部不会回滚。
//! - **非错误情形**：响应已被上游提交（committed）或响应体不具备任何传输能力，都不属于异常，不在此枚举中出现。

use std::io;

use thiserror::Error;

/// 写出响应过程中发生的异常类型。
#[derive(Debug, Error)]
pub enum Exception {
    /// 状态值无法转换为非负整数状态码（例如 `"abc"`、`-1`）。
    #[error("Malformed status: {0}")]
    MalformedStatus(String),
    /// `Content-Length` 头部的值无法转换为非负整数。
    #[error("Malformed Content-Length: {0}")]
    MalformedContentLength(String),
    /// 输出通道上的写入、刷新或源通道上的读取失败。
    #[error("Transfer I/O failure: {0}")]
    Io(#[from] io::Error),
    /// 配置文件无法读取。
    #[error("Config error: {0}")]
    Config(String),
}

impl Exception {
    /// 是否为传输阶段的 I/O 失败。
    pub fn is_io(&self) -> bool {
        matches!(self, Exception::Io(_))
    }
}
