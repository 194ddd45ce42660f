// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

pub mod body;
pub mod config;
pub mod context;
pub mod encoder;
pub mod exception;
pub mod header;
pub mod param;
pub mod response;
pub mod sink;
pub mod transfer;

pub use body::{Body, BodyBuilder, BodyChannel, BodyShape};
pub use config::Config;
pub use context::{public_root, ContainerContext, ContextLogger, StaticContext};
pub use encoder::TransferSignals;
pub use exception::Exception;
pub use header::{HeaderTable, HeaderValue};
pub use response::{Response, ResponseState, Status};
pub use sink::{Http1Sink, ResponseSink};
pub use transfer::BodyTransfer;
