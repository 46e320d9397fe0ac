//! Core library for the hiretrack applicant-tracking service.
//!
//! The `applications` module carries the lifecycle engine and its contracts;
//! `config`, `telemetry`, and `seed` supply the ambient pieces the API
//! service composes at startup.

pub mod applications;
pub mod config;
pub mod error;
pub mod seed;
pub mod telemetry;
