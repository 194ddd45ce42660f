// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 输出端（Sink）模块
//!
//! `ResponseSink` 是桥接层写出响应时唯一依赖的接口：状态设置、头部设置、
//! 提交状态查询以及字节输出通道。编排器只通过注入的 `&mut dyn ResponseSink`
//! 与其交互，因此测试中可以用记录调用的假实现替换。
//!
//! `Http1Sink` 是一个真实的实现：它把状态行和头部序列化为 HTTP/1.1 报文头，
//! 在第一次写出响应体（或 `finish`）时提交，并按 `Transfer-Encoding: chunked`
//! 对响应体分块。

use std::io::{self, BufWriter, Write};

use chrono::{DateTime, Utc};

use crate::param::{reason_phrase, CHUNKED, CRLF, DEFAULT_BUFFER_SIZE, SERVER_NAME};

/// 连接绑定的 HTTP 输出端。
///
/// 头部设置调用只修改输出端自身的缓冲状态，不会失败；所有可能失败的 I/O 都发生在
/// `output()` 返回的字节通道上。
pub trait ResponseSink {
    /// 响应是否已被提交（报文头已经写入底层连接）。
    fn is_committed(&self) -> bool;

    fn set_status(&mut self, status: u16);

    fn set_content_type(&mut self, content_type: &str);

    fn set_content_length(&mut self, length: u64);

    fn add_header(&mut self, name: &str, value: &str);

    fn add_int_header(&mut self, name: &str, value: i64);

    /// `epoch_millis` 为 Unix 毫秒时间戳。
    fn add_date_header(&mut self, name: &str, epoch_millis: i64);

    /// 响应体字节通道。
    fn output(&mut self) -> &mut dyn Write;
}

#[derive(Debug, Clone)]
struct Head {
    status: u16,
    content_type: Option<String>,
    content_length: Option<u64>,
    headers: Vec<(String, String)>,
}

impl Head {
    fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

/// `Http1Sink` 的字节通道。对响应体的第一次写入会先提交报文头。
pub struct Http1Output<W: Write> {
    head: Head,
    transport: BufWriter<W>,
    committed: bool,
    chunked: bool,
    head_only: bool,
    body_bytes: u64,
}

/// 1xx、204 与 304 响应不允许携带响应体，也不声明长度。
fn is_bodiless(status: u16) -> bool {
    (100..200).contains(&status) || status == 204 || status == 304
}

impl<W: Write> Http1Output<W> {
    fn commit(&mut self, finishing: bool) -> io::Result<()> {
        if self.committed {
            return Ok(());
        }
        let head = &self.head;
        let mut buf = format!(
            "HTTP/1.1 {} {}{}",
            head.status,
            reason_phrase(head.status),
            CRLF
        );
        if let Some(t) = &head.content_type {
            buf.push_str(&["Content-Type: ", t, CRLF].concat());
        }
        // 分块传输时不再声明长度
        match head.content_length {
            Some(len) if !self.chunked => {
                buf.push_str(&format!("Content-Length: {}{}", len, CRLF));
            }
            None if !self.chunked
                && finishing
                && !self.head_only
                && !is_bodiless(head.status) =>
            {
                buf.push_str(&["Content-Length: 0", CRLF].concat());
            }
            _ => {}
        }
        for (name, value) in &head.headers {
            buf.push_str(&[name.as_str(), ": ", value.as_str(), CRLF].concat());
        }
        if !head.has_header("Date") {
            buf.push_str(&["Date: ", &Utc::now().to_rfc2822(), CRLF].concat());
        }
        if !head.has_header("Server") {
            buf.push_str(&["Server: ", SERVER_NAME, CRLF].concat());
        }
        // 既无长度也不分块，只能以关闭连接作为响应体结束
        if head.content_length.is_none()
            && !self.chunked
            && !finishing
            && !self.head_only
            && !head.has_header("Connection")
        {
            buf.push_str(&["Connection: close", CRLF].concat());
        }
        buf.push_str(CRLF);

        self.transport.write_all(buf.as_bytes())?;
        self.committed = true;
        Ok(())
    }

    /// 已写出的响应体字节数（不含分块帧）。
    pub fn body_bytes(&self) -> u64 {
        self.body_bytes
    }
}

impl<W: Write> Write for Http1Output<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.commit(false)?;
        if buf.is_empty() {
            return Ok(0);
        }
        // HEAD 响应只写报文头，响应体字节直接丢弃
        if self.head_only {
            return Ok(buf.len());
        }
        if self.chunked {
            // 空块会被对端解释为结束标记，上面已经排除
            write!(self.transport, "{:x}{}", buf.len(), CRLF)?;
            self.transport.write_all(buf)?;
            self.transport.write_all(CRLF.as_bytes())?;
        } else {
            self.transport.write_all(buf)?;
        }
        self.body_bytes += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit(false)?;
        self.transport.flush()
    }
}

/// 写到任意 `Write` 传输层（通常是 `TcpStream`）上的 HTTP/1.1 输出端。
pub struct Http1Sink<W: Write> {
    output: Http1Output<W>,
}

impl<W: Write> Http1Sink<W> {
    pub fn new(transport: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, transport)
    }

    /// `capacity` 为输出端自身缓冲区的大小。
    pub fn with_capacity(capacity: usize, transport: W) -> Self {
        Self {
            output: Http1Output {
                head: Head {
                    status: 200,
                    content_type: None,
                    content_length: None,
                    headers: Vec::new(),
                },
                transport: BufWriter::with_capacity(capacity, transport),
                committed: false,
                chunked: false,
                head_only: false,
                body_bytes: 0,
            },
        }
    }

    /// 标记为 HEAD 响应：报文头照常写出，不写出任何响应体字节（包括分块结束标记）。
    pub fn set_head_only(&mut self, head_only: bool) {
        self.output.head_only = head_only;
    }

    pub fn is_head_only(&self) -> bool {
        self.output.head_only
    }

    pub fn is_chunked(&self) -> bool {
        self.output.chunked
    }

    pub fn body_bytes(&self) -> u64 {
        self.output.body_bytes()
    }

    /// 结束响应：必要时提交报文头，写出分块结束标记并刷新，返回底层传输层。
    pub fn finish(mut self) -> io::Result<W> {
        self.output.commit(true)?;
        if self.output.chunked && !self.output.head_only {
            self.output
                .transport
                .write_all(["0", CRLF, CRLF].concat().as_bytes())?;
        }
        self.output.transport.flush()?;
        self.output
            .transport
            .into_inner()
            .map_err(|e| e.into_error())
    }
}

impl<W: Write> ResponseSink for Http1Sink<W> {
    fn is_committed(&self) -> bool {
        self.output.committed
    }

    fn set_status(&mut self, status: u16) {
        self.output.head.status = status;
    }

    fn set_content_type(&mut self, content_type: &str) {
        self.output.head.content_type = Some(content_type.to_string());
    }

    fn set_content_length(&mut self, length: u64) {
        self.output.head.content_length = Some(length);
    }

    fn add_header(&mut self, name: &str, value: &str) {
        if name.eq_ignore_ascii_case("Transfer-Encoding") && value.eq_ignore_ascii_case(CHUNKED) {
            self.output.chunked = true;
        }
        self.output
            .head
            .headers
            .push((name.to_string(), value.to_string()));
    }

    fn add_int_header(&mut self, name: &str, value: i64) {
        self.add_header(name, &value.to_string());
    }

    fn add_date_header(&mut self, name: &str, epoch_millis: i64) {
        let value = match DateTime::<Utc>::from_timestamp_millis(epoch_millis) {
            Some(d) => d.to_rfc2822(),
            None => epoch_millis.to_string(),
        };
        self.add_header(name, &value);
    }

    fn output(&mut self) -> &mut dyn Write {
        &mut self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_head_is_written_on_first_body_write() {
        let mut sink = Http1Sink::new(Vec::new());
        sink.set_status(200);
        sink.set_content_type("text/plain");
        sink.set_content_length(5);
        assert!(!sink.is_committed());
        sink.output().write_all(b"hello").unwrap();
        assert!(sink.is_committed());

        let out = text(sink.finish().unwrap());
        assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(out.contains("Content-Type: text/plain\r\n"));
        assert!(out.contains("Content-Length: 5\r\n"));
        assert!(out.contains("Server: "));
        assert!(out.ends_with("\r\n\r\nhello"));
    }

    #[test]
    fn test_chunked_framing() {
        let mut sink = Http1Sink::new(Vec::new());
        sink.add_header("Transfer-Encoding", "chunked");
        assert!(sink.is_chunked());
        sink.output().write_all(b"hello").unwrap();
        sink.output().flush().unwrap();
        sink.output().write_all(b"there!").unwrap();

        let out = text(sink.finish().unwrap());
        assert!(!out.contains("Content-Length"));
        assert!(out.ends_with("\r\n\r\n5\r\nhello\r\n6\r\nthere!\r\n0\r\n\r\n"));
    }

    #[test]
    fn test_finish_without_body_declares_zero_length() {
        let mut sink = Http1Sink::new(Vec::new());
        sink.set_status(404);
        let out = text(sink.finish().unwrap());
        assert!(out.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(out.contains("Content-Length: 0\r\n"));
        assert!(!out.contains("Connection: close"));
    }

    #[test]
    fn test_unknown_length_is_close_delimited() {
        let mut sink = Http1Sink::new(Vec::new());
        sink.output().write_all(b"abc").unwrap();
        let out = text(sink.finish().unwrap());
        assert!(out.contains("Connection: close\r\n"));
        assert!(out.ends_with("abc"));
    }

    #[test]
    fn test_headers_keep_call_order() {
        let mut sink = Http1Sink::new(Vec::new());
        sink.add_header("Set-Cookie", "cookie1");
        sink.add_int_header("Expires", 0);
        sink.add_header("Set-Cookie", "cookie2");
        sink.add_date_header("Last-Modified", 0);
        let out = text(sink.finish().unwrap());
        let a = out.find("Set-Cookie: cookie1").unwrap();
        let b = out.find("Expires: 0").unwrap();
        let c = out.find("Set-Cookie: cookie2").unwrap();
        let d = out.find("Last-Modified: Thu,").unwrap();
        assert!(a < b && b < c && c < d);
        assert!(out.contains("1970 00:00:00 +0000"));
    }

    #[test]
    fn test_head_only_chunked_response_has_no_terminator() {
        let mut sink = Http1Sink::new(Vec::new());
        sink.set_head_only(true);
        sink.add_header("Transfer-Encoding", "chunked");
        let out = text(sink.finish().unwrap());
        assert!(out.contains("Transfer-Encoding: chunked\r\n"));
        assert!(out.ends_with("\r\n\r\n"));
        assert!(!out.contains("0\r\n\r\n"));
    }

    #[test]
    fn test_head_only_discards_body_bytes() {
        let mut sink = Http1Sink::new(Vec::new());
        sink.set_head_only(true);
        sink.set_content_length(5);
        sink.output().write_all(b"hello").unwrap();
        assert_eq!(sink.body_bytes(), 0);
        let out = text(sink.finish().unwrap());
        assert!(out.contains("Content-Length: 5\r\n"));
        assert!(out.ends_with("\r\n\r\n"));
        assert!(!out.contains("Connection: close"));
    }

    #[test]
    fn test_bodiless_status_declares_no_length() {
        for status in [101u16, 204, 304] {
            let mut sink = Http1Sink::new(Vec::new());
            sink.set_status(status);
            let out = text(sink.finish().unwrap());
            assert!(!out.contains("Content-Length"), "status {}", status);
        }
    }

    #[test]
    fn test_existing_connection_header_is_kept() {
        let mut sink = Http1Sink::new(Vec::new());
        sink.add_header("Connection", "keep-alive");
        sink.output().write_all(b"abc").unwrap();
        let out = text(sink.finish().unwrap());
        assert_eq!(out.matches("Connection:").count(), 1);
        assert!(out.contains("Connection: keep-alive\r\n"));
    }

    #[test]
    fn test_explicit_date_and_server_are_not_duplicated() {
        let mut sink = Http1Sink::new(Vec::new());
        sink.add_header("Server", "custom");
        sink.add_header("Date", "yesterday");
        let out = text(sink.finish().unwrap());
        assert_eq!(out.matches("Server:").count(), 1);
        assert_eq!(out.matches("Date:").count(), 1);
    }
}
