// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 头部编码模块
//!
//! 把 `HeaderTable` 按迭代顺序翻译成一串离散的输出端调用。每个条目的分派规则：
//!
//! 1. `Content-Type` → `set_content_type`
//! 2. `Content-Length` → `set_content_length`
//! 3. 整数值 → `add_int_header`
//! 4. 时间点 → `add_date_header`（先截断到整秒再乘以 1000）
//! 5. 字符串序列 → 每个元素一次 `add_header`，不拆分
//! 6. 其余字符串 → 按 `\n` 拆分，每个非空行一次 `add_header`
//!
//! 编码过程中同时观察 `Transfer-Encoding` 与 `Content-Length`，得到传输信号。

use log::trace;

use crate::{
    exception::Exception,
    header::{HeaderTable, HeaderValue},
    param::{CHUNKED, CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING},
    sink::ResponseSink,
};

/// 头部编码阶段传递给响应体传输阶段的唯一状态。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferSignals {
    /// 存在 `Transfer-Encoding: chunked`
    pub chunked: bool,
    /// 存在 `Content-Length`
    pub has_content_length: bool,
}

impl TransferSignals {
    /// 直接从头部表推导信号，不产生任何输出端调用。
    pub fn from_headers(headers: &HeaderTable) -> Self {
        let mut signals = Self::default();
        for (name, value) in headers.iter() {
            signals.observe(name, value);
        }
        signals
    }

    fn observe(&mut self, name: &str, value: &HeaderValue) {
        if name == TRANSFER_ENCODING && value.has_value(CHUNKED) {
            self.chunked = true;
        }
        if name == CONTENT_LENGTH {
            self.has_content_length = true;
        }
    }

    /// 是否在每个响应体块之后刷新：分块传输，或没有声明长度。
    pub fn streamed(&self) -> bool {
        self.chunked || !self.has_content_length
    }
}

/// 把头部表写到输出端，返回观察到的传输信号。
pub fn write_headers(
    headers: &HeaderTable,
    sink: &mut dyn ResponseSink,
) -> Result<TransferSignals, Exception> {
    let mut signals = TransferSignals::default();
    for (name, value) in headers.iter() {
        signals.observe(name, value);
        write_header(name, value, sink)?;
    }
    Ok(signals)
}

fn write_header(name: &str, value: &HeaderValue, sink: &mut dyn ResponseSink) -> Result<(), Exception> {
    if name == CONTENT_TYPE {
        sink.set_content_type(&value.to_string());
        return Ok(());
    }
    if name == CONTENT_LENGTH {
        sink.set_content_length(content_length(value)?);
        return Ok(());
    }
    match value {
        HeaderValue::Int(i) => sink.add_int_header(name, *i),
        HeaderValue::Date(d) => sink.add_date_header(name, d.timestamp() * 1000),
        HeaderValue::List(values) => {
            for v in values {
                sink.add_header(name, v);
            }
        }
        HeaderValue::Text(text) => {
            for line in split_lines(text) {
                sink.add_header(name, line);
            }
        }
    }
    trace!("已写出头部 {}", name);
    Ok(())
}

/// 按 `\n` 拆分以换行拼接的多值头部，丢弃空行。
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').filter(|line| !line.is_empty())
}

fn content_length(value: &HeaderValue) -> Result<u64, Exception> {
    let parsed = match value {
        HeaderValue::Int(i) => u64::try_from(*i).ok(),
        HeaderValue::Text(t) => t.trim().parse::<u64>().ok(),
        HeaderValue::List(l) if l.len() == 1 => l[0].trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| Exception::MalformedContentLength(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io::{self, Write};

    /// 只记录头部调用的输出端
    #[derive(Default)]
    struct HeaderLog {
        calls: Vec<String>,
        sink: io::Sink,
    }

    impl ResponseSink for HeaderLog {
        fn is_committed(&self) -> bool {
            false
        }
        fn set_status(&mut self, status: u16) {
            self.calls.push(format!("status {}", status));
        }
        fn set_content_type(&mut self, content_type: &str) {
            self.calls.push(format!("type {}", content_type));
        }
        fn set_content_length(&mut self, length: u64) {
            self.calls.push(format!("length {}", length));
        }
        fn add_header(&mut self, name: &str, value: &str) {
            self.calls.push(format!("header {}={}", name, value));
        }
        fn add_int_header(&mut self, name: &str, value: i64) {
            self.calls.push(format!("int {}={}", name, value));
        }
        fn add_date_header(&mut self, name: &str, epoch_millis: i64) {
            self.calls.push(format!("date {}={}", name, epoch_millis));
        }
        fn output(&mut self) -> &mut dyn Write {
            &mut self.sink
        }
    }

    fn encode(table: &HeaderTable) -> (Vec<String>, TransferSignals) {
        let mut log = HeaderLog::default();
        let signals = write_headers(table, &mut log).unwrap();
        (log.calls, signals)
    }

    #[test]
    fn test_content_type_length_and_generic() {
        let table: HeaderTable = vec![
            ("Content-Type", "text/html"),
            ("Content-Length", "20"),
            ("Server", "Apache/2.2.x"),
        ]
        .into_iter()
        .collect();
        let (calls, signals) = encode(&table);
        assert_eq!(
            calls,
            vec!["type text/html", "length 20", "header Server=Apache/2.2.x"]
        );
        assert!(signals.has_content_length);
        assert!(!signals.chunked);
        assert!(!signals.streamed());
    }

    #[test]
    fn test_list_value_is_not_split() {
        let mut table = HeaderTable::new();
        table.insert("Set-Cookie", vec!["cookie1", "a\nb"]);
        let (calls, _) = encode(&table);
        assert_eq!(calls, vec!["header Set-Cookie=cookie1", "header Set-Cookie=a\nb"]);
    }

    #[test]
    fn test_newline_joined_value_is_split() {
        let mut table = HeaderTable::new();
        table.insert("Set-Cookie", "cookie1\ncookie2");
        let (calls, _) = encode(&table);
        assert_eq!(calls, vec!["header Set-Cookie=cookie1", "header Set-Cookie=cookie2"]);
    }

    #[test]
    fn test_empty_segments_are_dropped() {
        let mut table = HeaderTable::new();
        table.insert("X-Multi", "a\n\nb\n");
        let (calls, _) = encode(&table);
        assert_eq!(calls, vec!["header X-Multi=a", "header X-Multi=b"]);
    }

    #[test]
    fn test_int_header() {
        let mut table = HeaderTable::new();
        table.insert("Expires", 0i64);
        let (calls, _) = encode(&table);
        assert_eq!(calls, vec!["int Expires=0"]);
    }

    #[test]
    fn test_date_header_truncates_to_seconds() {
        let time = Utc.timestamp_millis_opt(1_700_000_000_789).unwrap();
        let mut table = HeaderTable::new();
        table.insert("Last-Modified", time);
        let (calls, _) = encode(&table);
        assert_eq!(calls, vec!["date Last-Modified=1700000000000"]);
    }

    #[test]
    fn test_chunked_is_detected_and_still_written() {
        let mut table = HeaderTable::new();
        table.insert("Transfer-Encoding", "chunked");
        let (calls, signals) = encode(&table);
        assert_eq!(calls, vec!["header Transfer-Encoding=chunked"]);
        assert!(signals.chunked);
        assert!(signals.streamed());
    }

    #[test]
    fn test_chunked_in_list_value_is_detected() {
        let mut table = HeaderTable::new();
        table.insert("Content-Length", 6i64);
        table.insert("Transfer-Encoding", vec!["chunked"]);
        let (calls, signals) = encode(&table);
        assert_eq!(calls, vec!["length 6", "header Transfer-Encoding=chunked"]);
        assert!(signals.chunked);
        assert!(signals.streamed());
    }

    #[test]
    fn test_chunked_after_append_is_detected() {
        let mut table = HeaderTable::new();
        table.insert("Content-Length", 6i64);
        table
            .append("Transfer-Encoding", "gzip")
            .append("Transfer-Encoding", "chunked");
        let (calls, signals) = encode(&table);
        assert_eq!(
            calls,
            vec![
                "length 6",
                "header Transfer-Encoding=gzip",
                "header Transfer-Encoding=chunked"
            ]
        );
        assert!(signals.chunked);
        assert_eq!(signals, TransferSignals::from_headers(&table));
    }

    #[test]
    fn test_content_length_from_int_value() {
        let mut table = HeaderTable::new();
        table.insert("Content-Length", 10i64);
        let (calls, _) = encode(&table);
        assert_eq!(calls, vec!["length 10"]);
    }

    #[test]
    fn test_malformed_content_length() {
        let mut table = HeaderTable::new();
        table.insert("Content-Length", "twenty");
        let mut log = HeaderLog::default();
        let result = write_headers(&table, &mut log);
        assert!(matches!(result, Err(Exception::MalformedContentLength(_))));
    }

    #[test]
    fn test_signals_from_headers_without_calls() {
        let table: HeaderTable = vec![("Content-Length", "5")].into_iter().collect();
        let signals = TransferSignals::from_headers(&table);
        assert!(signals.has_content_length);
        assert!(!signals.streamed());
        assert!(TransferSignals::default().streamed());
    }
}
