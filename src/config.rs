//! The engine configuration (§3 "Two-grid", §9 Design Notes): frozen at
//! construction and threaded explicitly through every query call instead of
//! the original's global mutable config object (Design Notes §9, resolved
//! Open Question — see `DESIGN.md`).

use crate::error::{EngineError, EngineResult};
use crate::geometry::Mbr2D;

/// Immutable engine-wide configuration. Built once via [`EngineConfigBuilder`]
/// and shared (typically behind an `Arc`) across every worker thread.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    dataspace: Mbr2D,
    distribution_order: u32,
    partitioning_order: u32,
    worker_count: u32,
    april_order: u32,
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    pub fn dataspace(&self) -> Mbr2D {
        self.dataspace
    }

    pub fn distribution_order(&self) -> u32 {
        self.distribution_order
    }

    pub fn partitioning_order(&self) -> u32 {
        self.partitioning_order
    }

    pub fn worker_count(&self) -> u32 {
        self.worker_count
    }

    pub fn april_order(&self) -> u32 {
        self.april_order
    }

    /// A fresh [`crate::partition::TwoGrid`] matching this configuration.
    pub fn two_grid(&self) -> crate::partition::TwoGrid {
        crate::partition::TwoGrid::new(
            self.dataspace,
            self.distribution_order,
            self.partitioning_order,
            self.worker_count,
        )
    }
}

/// Builder for [`EngineConfig`]; validates every field before freezing it.
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    dataspace: Option<Mbr2D>,
    distribution_order: Option<u32>,
    partitioning_order: Option<u32>,
    worker_count: Option<u32>,
    april_order: Option<u32>,
}

impl EngineConfigBuilder {
    pub fn dataspace(mut self, dataspace: Mbr2D) -> Self {
        self.dataspace = Some(dataspace);
        self
    }

    pub fn distribution_order(mut self, order: u32) -> Self {
        self.distribution_order = Some(order);
        self
    }

    pub fn partitioning_order(mut self, order: u32) -> Self {
        self.partitioning_order = Some(order);
        self
    }

    pub fn worker_count(mut self, count: u32) -> Self {
        self.worker_count = Some(count);
        self
    }

    pub fn april_order(mut self, order: u32) -> Self {
        self.april_order = Some(order);
        self
    }

    pub fn build(self) -> EngineResult<EngineConfig> {
        let dataspace = self
            .dataspace
            .ok_or_else(|| EngineError::InvalidParameter("dataspace is required".into()))?;
        let distribution_order = self.distribution_order.unwrap_or(1);
        let partitioning_order = self.partitioning_order.unwrap_or(1);
        let worker_count = self.worker_count.unwrap_or(1);
        let april_order = self.april_order.unwrap_or(crate::april::DEFAULT_ORDER);

        if distribution_order == 0 || partitioning_order == 0 {
            return Err(EngineError::InvalidParameter(
                "distribution_order and partitioning_order must be positive".into(),
            ));
        }
        if worker_count == 0 {
            return Err(EngineError::InvalidParameter(
                "worker_count must be positive".into(),
            ));
        }
        if dataspace.x_extent() <= 0.0 || dataspace.y_extent() <= 0.0 {
            return Err(EngineError::InvalidParameter(
                "dataspace must have a positive extent on both axes".into(),
            ));
        }
        if april_order == 0 || april_order > 30 {
            return Err(EngineError::InvalidParameter(
                "april_order must be in 1..=30 (grid side must fit a u64 cell count)".into(),
            ));
        }

        Ok(EngineConfig {
            dataspace,
            distribution_order,
            partitioning_order,
            worker_count,
            april_order,
        })
    }
}
