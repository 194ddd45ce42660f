// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 头部表模块
//!
//! `HeaderTable` 是保持插入顺序的「名称 → 值」映射。值可以是字符串、整数、
//! 时间点或字符串序列；字符串值中以 `\n` 拼接的多个值由编码器拆分。

use std::{fmt, time::SystemTime};

use chrono::{DateTime, Utc};
use indexmap::{map::Entry, IndexMap};

/// 单个头部的值。
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    /// 标量字符串，可能包含以换行拼接的多个值
    Text(String),
    /// 整数值，通过 `add_int_header` 写出
    Int(i64),
    /// 时间点，通过 `add_date_header` 以毫秒时间戳写出
    Date(DateTime<Utc>),
    /// 多个独立的值，每个元素一次 `add_header`，不做换行拆分
    List(Vec<String>),
}

impl HeaderValue {
    /// 写出的某个字符串值是否等于 `expected`：`Text` 按换行拆分后的任一行，
    /// 或 `List` 的任一元素。整数与时间点不参与比较。
    pub fn has_value(&self, expected: &str) -> bool {
        match self {
            HeaderValue::Text(t) => t.split('\n').any(|line| line == expected),
            HeaderValue::List(l) => l.iter().any(|v| v == expected),
            HeaderValue::Int(_) | HeaderValue::Date(_) => false,
        }
    }
}

impl fmt::Display for HeaderValue {
    /// `List` 以 `", "` 连接，`Date` 使用 RFC 2822 格式。
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Text(t) => write!(f, "{}", t),
            HeaderValue::Int(i) => write!(f, "{}", i),
            HeaderValue::Date(d) => write!(f, "{}", d.to_rfc2822()),
            HeaderValue::List(l) => write!(f, "{}", l.join(", ")),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(s: &str) -> Self {
        HeaderValue::Text(s.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self {
        HeaderValue::Text(s)
    }
}

macro_rules! int_header_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for HeaderValue {
                fn from(i: $t) -> Self {
                    HeaderValue::Int(i as i64)
                }
            }
        )*
    };
}

int_header_value!(i32, i64, u16, u32);

impl From<DateTime<Utc>> for HeaderValue {
    fn from(d: DateTime<Utc>) -> Self {
        HeaderValue::Date(d)
    }
}

impl From<SystemTime> for HeaderValue {
    fn from(t: SystemTime) -> Self {
        HeaderValue::Date(t.into())
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(v: Vec<String>) -> Self {
        HeaderValue::List(v)
    }
}

impl From<Vec<&str>> for HeaderValue {
    fn from(v: Vec<&str>) -> Self {
        HeaderValue::List(v.into_iter().map(str::to_string).collect())
    }
}

/// 保持插入顺序的头部表。名称按原样（区分大小写）比较。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderTable {
    entries: IndexMap<String, HeaderValue>,
}

impl HeaderTable {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// 设置头部。名称已存在时原位替换值，保留其原有位置。
    pub fn insert<K, V>(&mut self, name: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<HeaderValue>,
    {
        self.entries.insert(name.into(), value.into());
        self
    }

    /// 追加一个字符串值。名称已存在时把原条目扩展为 `List`。
    pub fn append<K, V>(&mut self, name: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let value = value.into();
        match self.entries.entry(name.into()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                let previous = std::mem::replace(existing, HeaderValue::List(Vec::new()));
                let mut list = match previous {
                    HeaderValue::List(l) => l,
                    other => vec![other.to_string()],
                };
                list.push(value);
                *existing = HeaderValue::List(list);
            }
            Entry::Vacant(entry) => {
                entry.insert(HeaderValue::Text(value));
            }
        }
        self
    }

    /// 按名称精确查找，不影响迭代顺序。
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<HeaderValue> {
        self.entries.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按插入顺序迭代。
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderTable
where
    K: Into<String>,
    V: Into<HeaderValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = HeaderTable::new();
        for (k, v) in iter {
            table.insert(k, v);
        }
        table
    }
}

impl<'a> IntoIterator for &'a HeaderTable {
    type Item = (&'a String, &'a HeaderValue);
    type IntoIter = indexmap::map::Iter<'a, String, HeaderValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
