pub mod annotate;
pub mod charset;
pub mod config;
pub mod convert;
pub mod entities;
pub mod error;
pub mod fallback;
pub mod normalize;
pub mod types;
pub mod walk;

pub use config::ConvertOptions;
pub use convert::{
    convert_html_bytes, convert_html_to_text, convert_html_with_options,
    extract_text_with_charset_detection,
};
pub use error::ConvertError;
pub use normalize::{normalize, normalize_with};
