//! System-wide file handle usage.

use super::{CycleContext, ResourceCollector, ResourceKind};
use crate::collector::traits::{ProviderError, StatProvider};
use crate::delta::ratio_pct;
use crate::model::Metric;

#[derive(Debug, Default)]
pub struct OpenFdCollector;

impl OpenFdCollector {
    pub fn new() -> Self {
        Self
    }
}

impl ResourceCollector for OpenFdCollector {
    fn kind(&self) -> ResourceKind {
        ResourceKind::OpenFd
    }

    fn collect(
        &mut self,
        ctx: &CycleContext<'_>,
        provider: &dyn StatProvider,
    ) -> Result<Vec<Metric>, ProviderError> {
        let nr = provider.file_nr()?;

        Ok(vec![
            ctx.metric("fd_allocated", nr.allocated as f64),
            ctx.metric("fd_max", nr.max as f64),
            ctx.metric("fd_util", ratio_pct(nr.allocated as f64, nr.max as f64)),
        ])
    }
}
