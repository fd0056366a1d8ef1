#![allow(dead_code)]

pub mod mocks;
pub mod offline_support;
