//! Extraction and normalization stages of the diagram scanner.

pub mod composite;
pub mod draft;
pub mod mock;
pub mod normalize;
pub mod ocr;
pub mod scanner;
pub mod vision;

pub use composite::CompositeExtractor;
pub use draft::parse_draft;
pub use normalize::{aggregate_confidence, normalize, normalize_result};
pub use ocr::{candidates_from_layout, OcrExtractor, OcrLayout, ShapeBox};
pub use scanner::{DiagramScanner, DEFAULT_BACKEND_TIMEOUT};
pub use vision::{VisionExtractor, VisionProvider};
