mod labels;
mod model;

pub use labels::format_classifications;
pub use model::{Classification, ImageClassifier};
