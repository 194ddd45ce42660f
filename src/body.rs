// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 响应体模块
//!
//! 响应体可以同时具备四种能力中的任意几种：
//! - **块序列**：产生一串字节块；
//! - **回调**：接收输出通道并自行写入；
//! - **通道**：可定位、可能已知大小的字节通道（例如文件）；
//! - **流**：顺序读取的输入流。
//!
//! 能力的选择在构造时完成：`BodyBuilder::build` 按「块序列 > 回调 > 通道 > 流」
//! 的固定优先级保留一种，其余能力直接丢弃。关闭钩子（如果有）由 `CloseGuard`
//! 持有，在传输结束后、或响应体未经传输就被丢弃时，恰好执行一次。

use std::{
    fmt,
    fs::File,
    io::{self, Cursor, Read, Seek, SeekFrom, Write},
};

use bytes::Bytes;

use crate::{encoder::TransferSignals, exception::Exception, transfer::BodyTransfer};

/// 块序列能力
pub type Chunks = Box<dyn Iterator<Item = io::Result<Bytes>> + Send>;

/// 回调能力：响应体拿到原始输出通道后自行负责全部写入
pub type Call = Box<dyn FnOnce(&mut dyn Write) -> io::Result<()> + Send>;

/// 关闭钩子
pub type CloseHook = Box<dyn FnOnce() + Send>;

/// 通道能力。
///
/// 除了顺序读取以外，通道还可以报告固定大小，并支持把 `[position, position + count)`
/// 一次性批量转移到目标通道，由底层 I/O 完成而不经过用户态的复制循环。
pub trait BodyChannel: Read + Send {
    /// 通道的固定字节大小，未知时返回 `None`。
    fn size(&self) -> Option<u64> {
        None
    }

    /// 是否支持 `transfer_to`。
    fn supports_transfer(&self) -> bool {
        false
    }

    /// 把 `[position, position + count)` 转移到 `target`，返回转移的字节数。
    fn transfer_to(&mut self, position: u64, count: u64, target: &mut dyn Write) -> io::Result<u64> {
        let _ = (position, count, target);
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "bulk transfer is not supported by this channel",
        ))
    }
}

impl BodyChannel for File {
    fn size(&self) -> Option<u64> {
        self.metadata().ok().map(|m| m.len())
    }

    fn supports_transfer(&self) -> bool {
        true
    }

    fn transfer_to(&mut self, position: u64, count: u64, target: &mut dyn Write) -> io::Result<u64> {
        self.seek(SeekFrom::Start(position))?;
        let mut region = Read::by_ref(self).take(count);
        io::copy(&mut region, target)
    }
}

impl<T: AsRef<[u8]> + Send> BodyChannel for Cursor<T> {
    fn size(&self) -> Option<u64> {
        Some(self.get_ref().as_ref().len() as u64)
    }

    fn supports_transfer(&self) -> bool {
        true
    }

    fn transfer_to(&mut self, position: u64, count: u64, target: &mut dyn Write) -> io::Result<u64> {
        let data = self.get_ref().as_ref();
        let start = (position as usize).min(data.len());
        let end = start.saturating_add(count as usize).min(data.len());
        target.write_all(&data[start..end])?;
        Ok((end - start) as u64)
    }
}

/// 在被丢弃时执行关闭钩子，保证钩子恰好执行一次。
#[derive(Default)]
pub struct CloseGuard {
    hook: Option<CloseHook>,
}

impl CloseGuard {
    pub fn new(hook: Option<CloseHook>) -> Self {
        Self { hook }
    }

    pub fn is_armed(&self) -> bool {
        self.hook.is_some()
    }

    /// 立即执行钩子；之后的调用与 `Drop` 都不再执行。
    pub fn close(&mut self) {
        if let Some(hook) = self.hook.take() {
            hook();
        }
    }
}

impl Drop for CloseGuard {
    fn drop(&mut self) {
        self.close();
    }
}

/// 构造时选定的响应体形态。
pub enum BodyKind {
    Empty,
    Chunks(Chunks),
    Call(Call),
    Channel(Box<dyn BodyChannel>),
    Stream(Box<dyn Read + Send>),
}

/// 不携带数据的形态标记，用于检查与日志。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    Empty,
    Chunks,
    Call,
    Channel,
    Stream,
}

impl fmt::Display for BodyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            BodyShape::Empty => write!(f, "empty"),
            BodyShape::Chunks => write!(f, "chunks"),
            BodyShape::Call => write!(f, "call"),
            BodyShape::Channel => write!(f, "channel"),
            BodyShape::Stream => write!(f, "stream"),
        }
    }
}

/// 响应体。最多被传输一次。
pub struct Body {
    kind: BodyKind,
    close: CloseGuard,
}

impl Body {
    pub fn builder() -> BodyBuilder {
        BodyBuilder::default()
    }

    pub fn empty() -> Self {
        Self {
            kind: BodyKind::Empty,
            close: CloseGuard::default(),
        }
    }

    pub fn from_chunks<I, T>(chunks: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
        T: Into<Bytes> + 'static,
    {
        Self::builder().chunks(chunks).build()
    }

    pub fn from_call<F>(call: F) -> Self
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()> + Send + 'static,
    {
        Self::builder().call(call).build()
    }

    pub fn from_channel<C: BodyChannel + 'static>(channel: C) -> Self {
        Self::builder().channel(channel).build()
    }

    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self::builder().stream(reader).build()
    }

    /// 文件以通道形态传输，从而可以走批量转移路径。
    pub fn from_file(file: File) -> Self {
        Self::from_channel(file)
    }

    pub fn shape(&self) -> BodyShape {
        match self.kind {
            BodyKind::Empty => BodyShape::Empty,
            BodyKind::Chunks(_) => BodyShape::Chunks,
            BodyKind::Call(_) => BodyShape::Call,
            BodyKind::Channel(_) => BodyShape::Channel,
            BodyKind::Stream(_) => BodyShape::Stream,
        }
    }

    pub fn has_close_hook(&self) -> bool {
        self.close.is_armed()
    }

    pub fn into_parts(self) -> (BodyKind, CloseGuard) {
        (self.kind, self.close)
    }

    /// 把整个响应体读入内存，随后关闭响应体。
    pub fn collect(self) -> Result<Bytes, Exception> {
        let mut buf = Vec::new();
        let signals = TransferSignals {
            chunked: false,
            has_content_length: true,
        };
        BodyTransfer::default().transfer(self, &mut buf, signals)?;
        Ok(Bytes::from(buf))
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("shape", &self.shape())
            .field("close_hook", &self.has_close_hook())
            .finish()
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        Body::from_chunks(std::iter::once(b))
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Body::from(Bytes::from(v))
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::from(Bytes::from(s))
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::from(Bytes::copy_from_slice(s.as_bytes()))
    }
}

/// 收集响应体的各种能力，`build` 时按优先级选定一种。
#[derive(Default)]
pub struct BodyBuilder {
    chunks: Option<Chunks>,
    call: Option<Call>,
    channel: Option<Box<dyn BodyChannel>>,
    stream: Option<Box<dyn Read + Send>>,
    close: Option<CloseHook>,
}

impl BodyBuilder {
    pub fn chunks<I, T>(self, chunks: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
        T: Into<Bytes> + 'static,
    {
        let to_chunk: fn(T) -> io::Result<Bytes> = |c| Ok(c.into());
        self.try_chunks(chunks.into_iter().map(to_chunk))
    }

    /// 块生成过程本身可能失败时使用。
    pub fn try_chunks<I>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = io::Result<Bytes>>,
        I::IntoIter: Send + 'static,
    {
        self.chunks = Some(Box::new(chunks.into_iter()));
        self
    }

    pub fn call<F>(mut self, call: F) -> Self
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()> + Send + 'static,
    {
        self.call = Some(Box::new(call));
        self
    }

    pub fn channel<C: BodyChannel + 'static>(mut self, channel: C) -> Self {
        self.channel = Some(Box::new(channel));
        self
    }

    pub fn stream<R: Read + Send + 'static>(mut self, reader: R) -> Self {
        self.stream = Some(Box::new(reader));
        self
    }

    pub fn on_close<F: FnOnce() + Send + 'static>(mut self, hook: F) -> Self {
        self.close = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> Body {
        let kind = if let Some(chunks) = self.chunks {
            BodyKind::Chunks(chunks)
        } else if let Some(call) = self.call {
            BodyKind::Call(call)
        } else if let Some(channel) = self.channel {
            BodyKind::Channel(channel)
        } else if let Some(stream) = self.stream {
            BodyKind::Stream(stream)
        } else {
            BodyKind::Empty
        };
        Body {
            kind,
            close: CloseGuard::new(self.close),
        }
    }
}
