// Ghibli Assets Pipeline Modules
// Copyright (c) 2026 Xing_The_Creator | SYNOID

pub mod core;
pub mod download_guard;
pub mod downloader;
pub mod image_map;
pub mod production_tools;
pub mod report;
pub mod source_tools;
