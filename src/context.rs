// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 容器上下文模块
//!
//! 桥接层之外的两个协作者：
//! - 公共根目录解析：优先使用初始化参数 `public.root`，否则使用 `/WEB-INF/public`，
//!   再通过容器把路径实体化为文件系统路径；
//! - 日志适配：把 `log` 门面的记录转发到容器唯一的日志调用上。
//!
//! 编排器本身从不直接调用这里的任何东西。

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use log::{info, LevelFilter, Log, Metadata, Record};

use crate::{
    config::Config,
    param::{DEFAULT_PUBLIC_ROOT, PUBLIC_ROOT_PARAM},
};

/// 容器提供的配置查询、路径实体化与日志能力。
#[cfg_attr(test, mockall::automock)]
pub trait ContainerContext {
    fn init_parameter(&self, name: &str) -> Option<String>;

    /// 把容器内的虚拟路径实体化为文件系统路径。
    fn real_path(&self, path: &str) -> Option<String>;

    fn log(&self, message: &str);
}

/// 解析公共根目录。
pub fn public_root(context: &dyn ContainerContext) -> Option<String> {
    let root = context
        .init_parameter(PUBLIC_ROOT_PARAM)
        .unwrap_or_else(|| DEFAULT_PUBLIC_ROOT.to_string());
    context.real_path(&root)
}

/// 把日志记录转发到容器日志调用的 `log::Log` 实现，消息格式为 `"<LEVEL>: <message>"`。
pub struct ContextLogger<C> {
    context: C,
    level: LevelFilter,
}

impl<C: ContainerContext> ContextLogger<C> {
    pub fn new(context: C, level: LevelFilter) -> Self {
        Self { context, level }
    }

    pub fn context(&self) -> &C {
        &self.context
    }
}

impl<C: ContainerContext + Send + Sync> Log for ContextLogger<C> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.context
                .log(&format!("{}: {}", record.level(), record.args()));
        }
    }

    fn flush(&self) {}
}

/// 由配置文件支撑的容器上下文：初始化参数来自 `[init_params]`，
/// 虚拟路径相对 `base_dir` 实体化，日志转发给 `log` 门面。
#[derive(Debug, Clone)]
pub struct StaticContext {
    base_dir: PathBuf,
    init_params: HashMap<String, String>,
}

impl StaticContext {
    pub fn new<P: AsRef<Path>>(base_dir: P, init_params: HashMap<String, String>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            init_params,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.base_dir(), config.init_params().clone())
    }
}

impl ContainerContext for StaticContext {
    fn init_parameter(&self, name: &str) -> Option<String> {
        self.init_params.get(name).cloned()
    }

    fn real_path(&self, path: &str) -> Option<String> {
        let relative = path.trim_start_matches('/');
        let full = self.base_dir.join(relative);
        full.to_str().map(str::to_string)
    }

    fn log(&self, message: &str) {
        info!("{}", message);
    }
}
