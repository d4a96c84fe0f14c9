//! Stage orchestration
//!
//! vaccines → districts → center index → sites → appointments. Each stage
//! result is written to the store as soon as the stage completes, so an
//! aborted run leaves the completed stages on disk.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::auth::bearer::TokenField;
use crate::error::Result;
use crate::prober::AppointmentProber;
use crate::rotator::IdentityRotator;
use crate::store::JsonStore;
use crate::types::SiteMap;
use crate::walker::ResourceWalker;

/// Pipeline stage, named after the blob it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vaccines,
    Districts,
    Centers,
    Sites,
    Appointments,
}

impl Stage {
    pub const ALL: [Self; 5] = [
        Self::Vaccines,
        Self::Districts,
        Self::Centers,
        Self::Sites,
        Self::Appointments,
    ];

    pub fn blob_name(self) -> &'static str {
        match self {
            Self::Vaccines => "vaccines",
            Self::Districts => "districts",
            Self::Centers => "centers",
            Self::Sites => "sites",
            Self::Appointments => "appointments",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.blob_name())
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub vaccines: usize,
    pub districts: usize,
    pub centers: usize,
    pub sites: usize,
    /// Sites with a known next appointment.
    pub available: usize,
}

impl RunSummary {
    fn count_available(sites: &SiteMap) -> usize {
        sites
            .values()
            .filter(|s| s.first_available().is_some())
            .count()
    }
}

pub struct Pipeline<'a> {
    rotator: &'a IdentityRotator,
    store: &'a JsonStore,
    token_field: TokenField,
}

impl<'a> Pipeline<'a> {
    pub fn new(rotator: &'a IdentityRotator, store: &'a JsonStore, token_field: TokenField) -> Self {
        Self {
            rotator,
            store,
            token_field,
        }
    }

    /// Run every stage.
    ///
    /// Any failure outside the per-site probes aborts the run; stages already
    /// written stay on disk.
    pub async fn run(&self) -> Result<RunSummary> {
        let walker = ResourceWalker::new(self.rotator, self.token_field);

        let vaccines = walker.list_vaccines().await?;
        self.checkpoint(Stage::Vaccines, &vaccines).await?;

        let districts = walker.list_districts().await?;
        self.checkpoint(Stage::Districts, &districts).await?;

        let index = ResourceWalker::build_center_index(&districts);
        self.checkpoint(Stage::Centers, &index).await?;

        let sites = walker.list_all_sites(&index).await?;
        self.checkpoint(Stage::Sites, &sites).await?;

        let site_count = sites.len();
        let appointments = self.probe_sites(sites).await?;

        Ok(RunSummary {
            vaccines: vaccines.as_array().map_or(0, Vec::len),
            districts: districts.len(),
            centers: index.values().map(Vec::len).sum(),
            sites: site_count,
            available: RunSummary::count_available(&appointments),
        })
    }

    /// Probe the sites stored by a previous run and write the appointments.
    pub async fn probe_stored(&self) -> Result<RunSummary> {
        let sites: SiteMap = self.store.read(Stage::Sites.blob_name()).await?;
        log::info!(
            "[pipeline] Loaded {} sites from {}",
            sites.len(),
            self.store.path_of(Stage::Sites.blob_name()).display()
        );

        let site_count = sites.len();
        let appointments = self.probe_sites(sites).await?;

        Ok(RunSummary {
            sites: site_count,
            available: RunSummary::count_available(&appointments),
            ..RunSummary::default()
        })
    }

    async fn probe_sites(&self, sites: SiteMap) -> Result<SiteMap> {
        let prober = AppointmentProber::new(self.rotator, self.token_field);
        let appointments = prober.probe_all(sites).await?;
        self.checkpoint(Stage::Appointments, &appointments).await?;
        Ok(appointments)
    }

    async fn checkpoint<T: Serialize + ?Sized>(&self, stage: Stage, value: &T) -> Result<()> {
        log::info!("[pipeline] Stage {stage} complete");
        self.store.write(stage.blob_name(), value).await
    }
}
