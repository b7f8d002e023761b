//! Patient symptom form backed by a two-agent diagnosis crew.
//!
//! The web layer collects the patient's symptoms and history, hands them to
//! a [`Pipeline`](pipeline::Pipeline), and renders the answer together with
//! a Word document of it. The production pipeline is the medical crew in
//! [`crew`], a diagnostician followed by a treatment advisor, both able to
//! search the web and read pages.

#[macro_use]
extern crate tracing;

pub mod config;
pub mod crew;
pub mod pipeline;
pub mod report;
pub mod tools;
pub mod web;
