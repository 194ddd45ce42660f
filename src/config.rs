// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use std::collections::HashMap;
use std::fs::File;
use std::io::prelude::*;

use log::{error, warn};
use num_cpus;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::exception::Exception;
use crate::param::DEFAULT_BUFFER_SIZE;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_base_dir")]
    base_dir: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_local")]
    local: bool,
    #[serde(default)]
    worker_threads: usize,
    #[serde(default = "default_buffer_size")]
    buffer_size: usize,
    #[serde(default = "default_buffer_size")]
    sink_buffer_size: usize,
    // 容器初始化参数，例如 "public.root"
    #[serde(default)]
    init_params: HashMap<String, String>,
}

fn default_base_dir() -> String {
    ".".to_string()
}

fn default_port() -> u16 {
    7878
}

fn default_local() -> bool {
    true
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE // 8KB
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            base_dir: default_base_dir(),
            port: default_port(),
            local: default_local(),
            worker_threads: 0,
            buffer_size: default_buffer_size(),
            sink_buffer_size: default_buffer_size(),
            init_params: HashMap::new(),
        }
    }

    /// 从 TOML 文件加载配置。文件无法读取时返回错误；内容无法解析时使用默认配置。
    pub fn from_toml(filename: &str) -> Result<Self, Exception> {
        let mut file = File::open(filename)
            .map_err(|e| Exception::Config(format!("no such file {}: {}", filename, e)))?;
        let mut str_val = String::new();
        file.read_to_string(&mut str_val)
            .map_err(|e| Exception::Config(format!("error reading {}: {}", filename, e)))?;
        Ok(Self::from_toml_str(&str_val))
    }

    pub fn from_toml_str(content: &str) -> Self {
        let mut raw_config: Config = match toml::from_str(content) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象，使用默认配置: {}", e);
                Config::new()
            }
        };
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        if raw_config.buffer_size == 0 {
            warn!("buffer_size被设置为0，复制循环至少需要1字节的缓冲区，该值将被改为{}。", DEFAULT_BUFFER_SIZE);
            raw_config.buffer_size = DEFAULT_BUFFER_SIZE;
        }
        if raw_config.sink_buffer_size == 0 {
            raw_config.sink_buffer_size = DEFAULT_BUFFER_SIZE;
        }
        raw_config
    }
}

impl Config {
    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn sink_buffer_size(&self) -> usize {
        self.sink_buffer_size
    }

    pub fn init_params(&self) -> &HashMap<String, String> {
        &self.init_params
    }
}
