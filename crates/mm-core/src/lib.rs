pub mod geojson;
pub mod gradient;
pub mod index;
pub mod logging;
pub mod normalize;
pub mod progress;
pub mod registry;
pub mod store;

// Keep re-exports unique so downstream crates see a single symbol per helper.
pub use geojson::{
    ExtractorConfig, FeatureCollection, FetchError, FileDatasetSource, HttpDatasetSource,
};
pub use index::{MunicipalityIndex, build_index};
pub use progress::{
    NATIONAL_MUNICIPALITIES, PrefectureProgress, ProgressError, ProgressSnapshot, ProgressTracker,
};
pub use store::{JsonFileStore, MemoryStore, StoreError, VisitedPersistence, VisitedStore};
