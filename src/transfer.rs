// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 响应体传输模块
//!
//! 按响应体构造时选定的形态执行四种传输算法之一：
//! - 块序列：逐块写出，「流式」响应（分块传输或未声明长度）在每块之后刷新；
//! - 回调：把原始输出通道交给响应体，本层不做任何刷新；
//! - 通道：已知大小且支持批量转移时一次转移 `[0, size)`，否则走有界缓冲区复制循环；
//! - 流：与通道相同的有界缓冲区复制循环。
//!
//! 无论走哪条路径、是否中途失败，响应体的关闭钩子都会在函数返回前执行恰好一次。

use std::io::{self, Read, Write};

use log::debug;

use crate::{
    body::{Body, BodyKind},
    encoder::TransferSignals,
    exception::Exception,
    param::DEFAULT_BUFFER_SIZE,
};

/// 响应体传输策略。
#[derive(Debug, Clone, Copy)]
pub struct BodyTransfer {
    buffer_size: usize,
    id: u128,
}

impl Default for BodyTransfer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl BodyTransfer {
    /// `buffer_size` 为复制循环每次读取的上限，至少为 1。
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
            id: 0,
        }
    }

    /// 设置日志中使用的响应 ID。
    pub fn with_id(mut self, id: u128) -> Self {
        self.id = id;
        self
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// 传输整个响应体，返回本层写出的字节数。
    ///
    /// 回调形态由响应体自行写入，本层写出的字节数计为 0。
    pub fn transfer(
        &self,
        body: Body,
        out: &mut dyn Write,
        signals: TransferSignals,
    ) -> Result<u64, Exception> {
        let shape = body.shape();
        // guard 在任何返回路径上都会关闭响应体
        let (kind, mut guard) = body.into_parts();
        debug!(
            "[ID{}]传输响应体，形态: {}, 流式: {}",
            self.id,
            shape,
            signals.streamed()
        );

        let written = match kind {
            BodyKind::Chunks(chunks) => {
                let streamed = signals.streamed();
                let mut total = 0u64;
                for chunk in chunks {
                    let chunk = chunk?;
                    out.write_all(&chunk)?;
                    if streamed {
                        out.flush()?;
                    }
                    total += chunk.len() as u64;
                }
                total
            }
            BodyKind::Call(call) => {
                call(out)?;
                0
            }
            BodyKind::Channel(mut channel) => match channel.size() {
                Some(size) if channel.supports_transfer() => {
                    debug!("[ID{}]使用批量转移，大小: {} bytes", self.id, size);
                    channel.transfer_to(0, size, out)?
                }
                _ => self.copy_loop(&mut *channel, out)?,
            },
            BodyKind::Stream(mut reader) => self.copy_loop(&mut *reader, out)?,
            BodyKind::Empty => 0,
        };

        guard.close();
        debug!("[ID{}]响应体传输完成，共 {} 字节", self.id, written);
        Ok(written)
    }

    /// 有界缓冲区复制循环，读到流结束为止。
    fn copy_loop<R: Read + ?Sized>(&self, reader: &mut R, out: &mut dyn Write) -> io::Result<u64> {
        let mut buffer = vec![0u8; self.buffer_size];
        let mut total = 0u64;
        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break, // 流结束
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            out.write_all(&buffer[..n])?;
            total += n as u64;
        }
        Ok(total)
    }
}
