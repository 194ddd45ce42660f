// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 响应编排模块
//!
//! `Response` 持有一次响应的（状态, 头部, 响应体）三元组，并按严格顺序把它写到输出端：
//!
//! ```text
//! Pending ──(未提交)──▶ StatusWritten ──▶ HeadersWritten ──▶ BodyWritten
//!    │
//!    └──(已提交)──▶ Skipped
//! ```
//!
//! 输出端若已被上游（例如内部转发后的另一个处理器）提交，则不写出任何内容。

use std::fmt;

use bytes::Bytes;
use log::debug;

use crate::{
    body::Body,
    encoder::{self, TransferSignals},
    exception::Exception,
    header::HeaderTable,
    param::DEFAULT_BUFFER_SIZE,
    sink::ResponseSink,
    transfer::BodyTransfer,
};

/// 状态值：整数，或以数字开头的文本（如 `"200 OK"`）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Code(i64),
    Text(String),
}

impl Status {
    /// 转换为状态码。负数、超过 65535 或不以数字开头的文本都视为非法。
    pub fn to_code(&self) -> Result<u16, Exception> {
        let code = match self {
            Status::Code(c) => u16::try_from(*c).ok(),
            Status::Text(t) => {
                let t = t.trim();
                let digits_end = t
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(t.len());
                t[..digits_end].parse::<u16>().ok()
            }
        };
        code.ok_or_else(|| Exception::MalformedStatus(self.to_string()))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Code(c) => write!(f, "{}", c),
            Status::Text(t) => write!(f, "{}", t),
        }
    }
}

impl From<u16> for Status {
    fn from(c: u16) -> Self {
        Status::Code(c as i64)
    }
}

impl From<i32> for Status {
    fn from(c: i32) -> Self {
        Status::Code(c as i64)
    }
}

impl From<i64> for Status {
    fn from(c: i64) -> Self {
        Status::Code(c)
    }
}

impl From<&str> for Status {
    fn from(t: &str) -> Self {
        Status::Text(t.to_string())
    }
}

impl From<String> for Status {
    fn from(t: String) -> Self {
        Status::Text(t)
    }
}

/// 响应写出的进度。`BodyWritten` 与 `Skipped` 为终止状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseState {
    Pending,
    StatusWritten,
    HeadersWritten,
    BodyWritten,
    Skipped,
}

/// 一次响应的三元组及其写出流程。
#[derive(Debug)]
pub struct Response {
    status: Status,
    headers: HeaderTable,
    body: Body,
    signals: Option<TransferSignals>,
    state: ResponseState,
    buffer_size: usize,
    id: u128,
}

impl Response {
    pub fn new<S, B>(status: S, headers: HeaderTable, body: B) -> Self
    where
        S: Into<Status>,
        B: Into<Body>,
    {
        Self {
            status: status.into(),
            headers,
            body: body.into(),
            signals: None,
            state: ResponseState::Pending,
            buffer_size: DEFAULT_BUFFER_SIZE,
            id: 0,
        }
    }

    /// 通道与流复制循环使用的缓冲区大小。
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// 日志中使用的响应 ID。
    pub fn with_id(mut self, id: u128) -> Self {
        self.id = id;
        self
    }

    /// 写出状态码。状态值非法时立即失败，不产生任何输出端调用。
    pub fn write_status(&mut self, sink: &mut dyn ResponseSink) -> Result<u16, Exception> {
        let code = self.status.to_code()?;
        sink.set_status(code);
        self.state = ResponseState::StatusWritten;
        Ok(code)
    }

    /// 写出全部头部，并记住观察到的传输信号。
    pub fn write_headers(
        &mut self,
        sink: &mut dyn ResponseSink,
    ) -> Result<TransferSignals, Exception> {
        let signals = encoder::write_headers(&self.headers, sink)?;
        self.signals = Some(signals);
        self.state = ResponseState::HeadersWritten;
        Ok(signals)
    }

    /// 把响应体传输到输出端的字节通道，返回本层写出的字节数。
    ///
    /// 若之前没有调用 `write_headers`，传输信号直接由头部表推导。
    pub fn write_body(self, sink: &mut dyn ResponseSink) -> Result<u64, Exception> {
        let signals = self.signals();
        BodyTransfer::new(self.buffer_size)
            .with_id(self.id)
            .transfer(self.body, sink.output(), signals)
    }

    /// 按「状态 → 头部 → 响应体」的顺序写出整个响应。
    ///
    /// 输出端已提交时直接返回 `Skipped`，不做任何写入；响应体仍会被关闭。
    pub fn respond(mut self, sink: &mut dyn ResponseSink) -> Result<ResponseState, Exception> {
        if sink.is_committed() {
            debug!("[ID{}]输出端已被提交，跳过状态、头部与响应体", self.id);
            self.state = ResponseState::Skipped;
            return Ok(self.state);
        }
        let code = self.write_status(sink)?;
        let signals = self.write_headers(sink)?;
        debug!(
            "[ID{}]状态 {} 与 {} 个头部已写出，分块: {}, 声明长度: {}",
            self.id,
            code,
            self.headers.len(),
            signals.chunked,
            signals.has_content_length
        );
        self.write_body(sink)?;
        Ok(ResponseState::BodyWritten)
    }

    /// 不经过输出端，直接把响应体读入内存并关闭响应体。
    pub fn into_body_bytes(self) -> Result<Bytes, Exception> {
        self.body.collect()
    }

    pub fn into_parts(self) -> (Status, HeaderTable, Body) {
        (self.status, self.headers, self.body)
    }
}

impl Response {
    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn headers(&self) -> &HeaderTable {
        &self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn state(&self) -> ResponseState {
        self.state
    }

    pub fn id(&self) -> u128 {
        self.id
    }

    fn signals(&self) -> TransferSignals {
        self.signals
            .unwrap_or_else(|| TransferSignals::from_headers(&self.headers))
    }

    /// 是否为分块传输响应。
    pub fn chunked(&self) -> bool {
        self.signals().chunked
    }

    /// 是否在每个响应体块之后刷新。
    pub fn streamed(&self) -> bool {
        self.signals().streamed()
    }
}
