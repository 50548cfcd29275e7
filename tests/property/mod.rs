// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! - `stage_laws`: ordering and fold laws of the single-input stages
//! - `timing_laws`: throttle and debounce decisions as functions of time
//! - `combinator_laws`: emission counts of the multi-input stages

mod combinator_laws;
mod stage_laws;
mod timing_laws;
