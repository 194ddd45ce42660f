// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 演示文件服务器
//!
//! 在真实的 TCP 连接上驱动响应桥接层：
//! - 公共根目录由容器上下文解析（`public.root` 初始化参数或 `/WEB-INF/public`）
//! - 普通文件以通道形态传输（已知大小，走批量转移）
//! - 目录列表以分块传输逐行写出（每块之后刷新）
//! - 错误页面以单块、已声明长度的方式写出
//!
//! 每个连接在阻塞线程池中处理，桥接层本身是同步阻塞的。

use std::{
    fs::{self, File},
    io::{self, BufRead, BufReader, Read},
    net::{Ipv4Addr, SocketAddrV4, TcpStream},
    path::{Component, Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use log::{debug, error, info, warn};
use tokio::{net::TcpListener, runtime::Builder};

use response_bridge::{
    param::{mime_for, MAX_REQUEST_HEAD},
    public_root, Body, Config, HeaderTable, Http1Sink, Response, ResponseState,
    StaticContext,
};

/// # 程序入口点
///
/// 初始化日志、加载配置、解析公共根目录并启动接收循环。
fn main() {
    // 1. 日志系统：log4rs，通过外部 YAML 配置级别与输出目的地
    if let Err(e) = log4rs::init_file("config/log4rs.yaml", Default::default()) {
        eprintln!("无法初始化日志系统: {}", e);
    }

    // 2. 配置加载
    let config = match Config::from_toml("config/development.toml") {
        Ok(c) => c,
        Err(e) => {
            warn!("{}，使用默认配置", e);
            Config::from_toml_str("")
        }
    };
    info!("配置文件已载入");

    // 3. 公共根目录解析
    let context = StaticContext::from_config(&config);
    let root = match public_root(&context) {
        Some(r) => PathBuf::from(r),
        None => {
            warn!("无法实体化公共根目录，使用 base_dir");
            PathBuf::from(config.base_dir())
        }
    };
    info!("public root: {}", root.display());

    // 4. 异步运行时只负责接收连接，响应写出在阻塞线程池中进行
    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(r) => r,
        Err(e) => {
            error!("无法创建运行时: {}", e);
            return;
        }
    };

    runtime.block_on(serve(Arc::new(config), Arc::new(root)));
}

async fn serve(config: Arc<Config>, root: Arc<PathBuf>) {
    let address = match config.local() {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    let socket = SocketAddrV4::new(address, config.port());
    let listener = match TcpListener::bind(socket).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("无法绑定端口：{}，错误：{}", config.port(), e);
            return;
        }
    };
    info!("服务端将在{}上监听Socket连接", socket);

    let mut id: u128 = 0;
    loop {
        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            _ = tokio::signal::ctrl_c() => {
                info!("接收到停机信号，正在退出...");
                break;
            }
        };
        let (stream, addr) = match accepted {
            Ok(pair) => pair,
            Err(e) => {
                error!("接受连接失败: {}", e);
                continue;
            }
        };
        debug!("[ID{}]新的连接：{}", id, addr);

        let stream = match stream.into_std().and_then(|s| {
            s.set_nonblocking(false)?;
            Ok(s)
        }) {
            Ok(s) => s,
            Err(e) => {
                error!("[ID{}]无法切换为阻塞连接: {}", id, e);
                continue;
            }
        };

        let config = Arc::clone(&config);
        let root = Arc::clone(&root);
        let conn_id = id;
        tokio::task::spawn_blocking(move || handle_connection(stream, conn_id, &root, &config));
        id += 1;
    }
}

/// # 连接处理器
///
/// 读取请求行，构造响应三元组，通过 `Http1Sink` 写出。
fn handle_connection(stream: TcpStream, id: u128, root: &Path, config: &Config) {
    let start_time = Instant::now();

    let (method, path) = match read_request_line(&stream) {
        Ok(Some(line)) => line,
        Ok(None) => return, // 客户端主动关闭连接
        Err(e) => {
            error!("[ID{}]读取请求时遇到错误: {}", id, e);
            return;
        }
    };

    let head_only = method == "HEAD";
    let response = build_response(&method, &path, root, id)
        .with_id(id)
        .with_buffer_size(config.buffer_size());
    let status = response.status().to_string();

    let mut sink = Http1Sink::with_capacity(config.sink_buffer_size(), &stream);
    sink.set_head_only(head_only);
    match response.respond(&mut sink) {
        Ok(ResponseState::Skipped) => debug!("[ID{}]响应已由上游写出", id),
        Ok(_) => {}
        Err(e) => {
            error!("[ID{}]写出响应失败: {}", id, e);
            return;
        }
    }
    let sent = sink.body_bytes();
    if let Err(e) = sink.finish() {
        error!("[ID{}]结束响应失败: {}", id, e);
        return;
    }

    info!(
        "[ID{}] {} {} {} {} bytes {}ms",
        id,
        method,
        path,
        status,
        sent,
        start_time.elapsed().as_millis()
    );
}

/// 只解析请求行，其余报文头读完丢弃。报文头总长超过 `MAX_REQUEST_HEAD` 的部分不再读取。
fn read_request_line<R: Read>(stream: R) -> io::Result<Option<(String, String)>> {
    let mut reader = BufReader::new(stream.take(MAX_REQUEST_HEAD));
    let mut first = String::new();
    if reader.read_line(&mut first)? == 0 {
        return Ok(None);
    }
    if !first.ends_with('\n') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "request line exceeds the header size limit",
        ));
    }
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 || line.trim_end().is_empty() {
            break;
        }
    }
    let mut parts = first.split_whitespace();
    let method = parts.next().unwrap_or("").to_uppercase();
    let path = parts.next().unwrap_or("/").to_string();
    Ok(Some((method, path)))
}

fn build_response(method: &str, path: &str, root: &Path, id: u128) -> Response {
    let head_only = match method {
        "GET" => false,
        "HEAD" => true,
        _ => {
            let mut headers = HeaderTable::new();
            headers.insert("Allow", vec!["GET", "HEAD"]);
            return text_response(405, headers, "Method Not Allowed", false);
        }
    };

    let path = path.split('?').next().unwrap_or("/");
    let relative = Path::new(path.trim_start_matches('/'));
    // 拒绝 ".." 等越出公共根目录的路径
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        warn!("[ID{}]请求的路径：{} 包含非法片段，返回400", id, path);
        return text_response(400, HeaderTable::new(), "Bad Request", head_only);
    }
    let full_path = root.join(relative);

    if full_path.is_dir() {
        return dir_response(&full_path, path, head_only, id);
    }
    match File::open(&full_path) {
        Ok(file) => file_response(file, &full_path, head_only, id),
        Err(_) => {
            warn!("[ID{}]请求的路径：{} 不存在，返回404", id, path);
            text_response(404, HeaderTable::new(), "Not Found", head_only)
        }
    }
}

fn text_response(code: u16, mut headers: HeaderTable, text: &str, head_only: bool) -> Response {
    headers.insert("Content-Type", "text/plain;charset=utf-8");
    headers.insert("Content-Length", text.len() as i64);
    let body = match head_only {
        true => Body::empty(),
        false => Body::from(text),
    };
    Response::new(code, headers, body)
}

fn file_response(file: File, path: &Path, head_only: bool, id: u128) -> Response {
    let mut headers = HeaderTable::new();
    headers.insert("Content-Type", mime_for(path.extension().and_then(|e| e.to_str())));
    if let Ok(metadata) = file.metadata() {
        headers.insert("Content-Length", metadata.len() as i64);
        if let Ok(modified) = metadata.modified() {
            headers.insert("Last-Modified", modified);
        }
    }
    if head_only {
        return Response::new(200u16, headers, Body::empty());
    }
    let display = path.display().to_string();
    let body = Body::builder()
        .channel(file)
        .on_close(move || debug!("[ID{}]文件{}已关闭", id, display))
        .build();
    Response::new(200u16, headers, body)
}

/// 目录列表：每个条目一块，分块传输。
fn dir_response(dir: &Path, request_path: &str, head_only: bool, id: u128) -> Response {
    let mut headers = HeaderTable::new();
    headers.insert("Content-Type", "text/plain;charset=utf-8");
    headers.insert("Transfer-Encoding", "chunked");
    if head_only {
        return Response::new(200u16, headers, Body::empty());
    }

    let mut names: Vec<String> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                match e.path().is_dir() {
                    true => name + "/",
                    false => name,
                }
            })
            .collect(),
        Err(e) => {
            error!("[ID{}]无法读取目录{}: {}", id, dir.display(), e);
            return text_response(500, HeaderTable::new(), "Internal Server Error", false);
        }
    };
    names.sort();

    let title = format!("Index of {}\n", request_path);
    let lines = std::iter::once(title).chain(names.into_iter().map(|n| n + "\n"));
    Response::new(200u16, headers, Body::from_chunks(lines.collect::<Vec<String>>()))
}
