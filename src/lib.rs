//! Core library functions for the point cluster analyzer

pub mod config;
pub mod error;
pub mod data;
pub mod cluster;
pub mod storage;
pub mod viz;

pub use error::{ClusterError, Result};
pub use cluster::{
    build_engine, Algorithm, CenterEstimator, CenterMode, Cluster, ClusteringEngine,
    ClusteringReport, Partition, Point,
};
