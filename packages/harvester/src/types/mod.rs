//! Data types: wire payloads, the output record, checkpoint state and configuration.

pub mod api;
pub mod checkpoint;
pub mod config;
pub(crate) mod de;
pub mod offer;

pub use api::{ApiEmploymentType, ApiOffer, OffersPage, SkillEntry};
pub use checkpoint::CheckpointState;
pub use config::{
    HarvestConfig, HarvestInput, OfferFilters, OrderBy, PauseRange, ProxyInput, SortBy,
    SourceEndpoints,
};
pub use offer::{EmploymentType, OfferLanguage, OfferLocation, OfferRecord, SOURCE_TAG};
