pub mod context;
pub mod error;
pub mod names;
pub mod response;
pub mod traits;
pub mod types;

pub use context::{ContextEdge, ContextIndex, ContextNode, DiagramContext};
pub use error::{FailureClass, ScanError};
pub use names::{canonical_name, display_name};
pub use response::{AnalysisResponse, AssistantResponse, Suggestions};
pub use traits::{DiagramAssistant, DraftRequest, ExtractionBackend, ImageInput};
pub use types::{
    clamp_confidence, BoundingBox, Cardinality, DiagramScanResult, RawExtraction, RawToken,
    RelationKind, ScannedClass, ScannedRelation,
};
