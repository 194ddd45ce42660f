// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 集成测试共用的记录型输出端与计数工具。

#![allow(dead_code)]

use std::{
    cell::RefCell,
    io::{self, Write},
    rc::Rc,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use response_bridge::ResponseSink;

/// 输出端上发生的一次调用。
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Status(u16),
    ContentType(String),
    ContentLength(u64),
    Header(String, String),
    IntHeader(String, i64),
    DateHeader(String, i64),
    Write(Vec<u8>),
    Flush,
}

impl Event {
    pub fn is_header(&self) -> bool {
        matches!(
            self,
            Event::ContentType(_)
                | Event::ContentLength(_)
                | Event::Header(..)
                | Event::IntHeader(..)
                | Event::DateHeader(..)
        )
    }

    pub fn is_body(&self) -> bool {
        matches!(self, Event::Write(_) | Event::Flush)
    }
}

type Log = Rc<RefCell<Vec<Event>>>;

/// 记录写入与刷新的字节通道，可以在第 N 次写入时注入失败。
pub struct RecordingOutput {
    log: Log,
    writes: usize,
    fail_on_write: Option<usize>,
}

impl Write for RecordingOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes += 1;
        if self.fail_on_write == Some(self.writes) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer reset"));
        }
        self.log.borrow_mut().push(Event::Write(buf.to_vec()));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.log.borrow_mut().push(Event::Flush);
        Ok(())
    }
}

/// 按调用顺序记录全部输出端调用的假输出端。
pub struct RecordingSink {
    log: Log,
    committed: bool,
    output: RecordingOutput,
}

impl RecordingSink {
    pub fn new() -> Self {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        Self {
            log: Rc::clone(&log),
            committed: false,
            output: RecordingOutput {
                log,
                writes: 0,
                fail_on_write: None,
            },
        }
    }

    /// 模拟已被上游提交的输出端。
    pub fn committed() -> Self {
        let mut sink = Self::new();
        sink.committed = true;
        sink
    }

    /// 第 `n` 次写入（从 1 开始）失败。
    pub fn failing_on_write(n: usize) -> Self {
        let mut sink = Self::new();
        sink.output.fail_on_write = Some(n);
        sink
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }

    pub fn header_events(&self) -> Vec<Event> {
        self.events().into_iter().filter(Event::is_header).collect()
    }

    pub fn body_events(&self) -> Vec<Event> {
        self.events().into_iter().filter(Event::is_body).collect()
    }

    pub fn written(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Write(data) => Some(data),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn push(&self, event: Event) {
        self.log.borrow_mut().push(event);
    }
}

impl ResponseSink for RecordingSink {
    fn is_committed(&self) -> bool {
        self.committed
    }

    fn set_status(&mut self, status: u16) {
        self.push(Event::Status(status));
    }

    fn set_content_type(&mut self, content_type: &str) {
        self.push(Event::ContentType(content_type.to_string()));
    }

    fn set_content_length(&mut self, length: u64) {
        self.push(Event::ContentLength(length));
    }

    fn add_header(&mut self, name: &str, value: &str) {
        self.push(Event::Header(name.to_string(), value.to_string()));
    }

    fn add_int_header(&mut self, name: &str, value: i64) {
        self.push(Event::IntHeader(name.to_string(), value));
    }

    fn add_date_header(&mut self, name: &str, epoch_millis: i64) {
        self.push(Event::DateHeader(name.to_string(), epoch_millis));
    }

    fn output(&mut self) -> &mut dyn Write {
        &mut self.output
    }
}

/// 线程安全的调用计数器，用作关闭钩子。
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hook(&self) -> impl FnOnce() + Send + 'static {
        let count = Arc::clone(&self.0);
        move || {
            count.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn header(name: &str, value: &str) -> Event {
    Event::Header(name.to_string(), value.to_string())
}
