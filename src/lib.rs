//! Exploratory statistics and charts for the Iris reference dataset.

pub mod analysis;
pub mod app;
pub mod chart;
pub mod color;
pub mod data;
pub mod report;
pub mod ui;
