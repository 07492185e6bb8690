// Library exports for dotviz

pub mod data;
pub mod graph;
pub mod graphviz;
pub mod layout;
pub mod render;
pub mod script;
pub mod value;
pub mod viewer;

pub use graph::{Edge, EdgeId, Graph, GraphError, Vertex, VertexId};
pub use graphviz::GraphViz;
pub use layout::{AttributeDelta, Attributes, LayoutError, LayoutStore, ObjectKey, Target};
pub use script::create_script;
pub use value::Value;

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Image format requested from the renderer (`-T` flag).
/// Formats without a variant are passed through to the renderer verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(try_from = "String")]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
    Svgz,
    Pdf,
    Ps,
    Jpg,
    Gif,
    /// Laid-out script, as emitted by the renderer itself
    Dot,
    Other(String),
}

impl OutputFormat {
    pub fn as_str(&self) -> &str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
            OutputFormat::Svgz => "svgz",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Ps => "ps",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Gif => "gif",
            OutputFormat::Dot => "dot",
            OutputFormat::Other(name) => name,
        }
    }

    pub fn is_svg(&self) -> bool {
        matches!(self, OutputFormat::Svg | OutputFormat::Svgz)
    }

    /// Media type used in `data:` URIs
    pub fn mime_type(&self) -> String {
        match self {
            OutputFormat::Svg | OutputFormat::Svgz => "image/svg+xml".to_string(),
            OutputFormat::Jpg => "image/jpeg".to_string(),
            OutputFormat::Pdf => "application/pdf".to_string(),
            OutputFormat::Ps => "application/postscript".to_string(),
            OutputFormat::Dot => "text/vnd.graphviz".to_string(),
            other => format!("image/{}", other.as_str()),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        // renderer formats look like `png`, `ps2` or `png:cairo:gd`
        let valid = !name.is_empty()
            && !name.starts_with(':')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == ':' || c == '_');
        if !valid {
            anyhow::bail!("Invalid output format '{}'", s);
        }

        Ok(match name.as_str() {
            "png" => OutputFormat::Png,
            "svg" => OutputFormat::Svg,
            "svgz" => OutputFormat::Svgz,
            "pdf" => OutputFormat::Pdf,
            "ps" => OutputFormat::Ps,
            "jpg" | "jpeg" => OutputFormat::Jpg,
            "gif" => OutputFormat::Gif,
            "dot" | "gv" => OutputFormat::Dot,
            _ => OutputFormat::Other(name),
        })
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = anyhow::Error;

    fn try_from(s: String) -> anyhow::Result<Self> {
        s.parse()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
    /// Renderer executable, looked up on PATH
    #[serde(default = "default_program")]
    pub program: String,
}

fn default_program() -> String { "dot".to_string() }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            program: default_program(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!("SVG".parse::<OutputFormat>().unwrap(), OutputFormat::Svg);
        assert_eq!("jpeg".parse::<OutputFormat>().unwrap(), OutputFormat::Jpg);
        assert!("".parse::<OutputFormat>().is_err());
        assert!("png; rm".parse::<OutputFormat>().is_err());
        assert!("../png".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_unlisted_format_passes_through() {
        let format: OutputFormat = "PS2".parse().unwrap();
        assert_eq!(format, OutputFormat::Other("ps2".to_string()));
        assert_eq!(format.as_str(), "ps2");
        assert_eq!(format.mime_type(), "image/ps2");
        assert!(!format.is_svg());

        let format: OutputFormat = "png:cairo".parse().unwrap();
        assert_eq!(format.to_string(), "png:cairo");
        assert_eq!(OutputFormat::Png.mime_type(), "image/png");
    }

    #[test]
    fn test_render_options_defaults() {
        let options: RenderOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.format, OutputFormat::Png);
        assert_eq!(options.program, "dot");

        let options: RenderOptions = serde_json::from_str(r#"{"type": "svg"}"#).unwrap();
        assert_eq!(options.format, OutputFormat::Svg);

        let options: RenderOptions = serde_json::from_str(r#"{"type": "bmp"}"#).unwrap();
        assert_eq!(options.format, OutputFormat::Other("bmp".to_string()));

        assert!(serde_json::from_str::<RenderOptions>(r#"{"type": "a b"}"#).is_err());
    }
}
