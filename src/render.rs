// Boundary to the external renderer: temp files, process invocation, embedding

use crate::{OutputFormat, RenderOptions};
use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

/// Render `script` into an image file and return its path.
/// The caller owns the returned file.
pub fn create_image_file(script: &str, options: &RenderOptions) -> Result<PathBuf> {
    let program = which::which(&options.program)
        .with_context(|| format!("Renderer '{}' not found on PATH", options.program))?;

    let mut script_file = tempfile::Builder::new()
        .prefix("graphviz")
        .tempfile()
        .context("Unable to create temporary file for graphviz script")?;
    script_file
        .write_all(script.as_bytes())
        .and_then(|_| script_file.flush())
        .with_context(|| {
            format!(
                "Unable to write graphviz script to temporary file '{}'",
                script_file.path().display()
            )
        })?;

    let mut image_path: OsString = script_file.path().as_os_str().to_owned();
    image_path.push(".");
    image_path.push(options.format.as_str());
    let image_path = PathBuf::from(image_path);

    tracing::debug!(
        program = %program.display(),
        format = %options.format,
        output = %image_path.display(),
        "invoking renderer"
    );

    let output = Command::new(&program)
        .arg("-T")
        .arg(options.format.as_str())
        .arg(script_file.path())
        .arg("-o")
        .arg(&image_path)
        .output()
        .with_context(|| format!("Unable to invoke '{}'", program.display()))?;

    if !output.status.success() {
        let code = output
            .status
            .code()
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        anyhow::bail!(
            "Unable to invoke '{}' to create image file (code {}): {}",
            options.program,
            code,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    // script_file is removed when dropped here
    Ok(image_path)
}

/// Render `script` and return the raw image bytes
pub fn create_image_data(script: &str, options: &RenderOptions) -> Result<Vec<u8>> {
    let path = create_image_file(script, options)?;
    let data = fs::read(&path)
        .with_context(|| format!("Failed to read rendered image '{}'", path.display()));
    if let Err(e) = fs::remove_file(&path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove rendered image");
    }
    data
}

/// Render `script` into a base64 `data:` URI
pub fn create_image_src(script: &str, options: &RenderOptions) -> Result<String> {
    let data = create_image_data(script, options)?;
    Ok(data_uri(&data, &options.format))
}

/// Render `script` into an HTML element embedding the image
pub fn create_image_html(script: &str, options: &RenderOptions) -> Result<String> {
    let src = create_image_src(script, options)?;
    Ok(html_embed(&src, &options.format))
}

pub fn data_uri(data: &[u8], format: &OutputFormat) -> String {
    format!("data:{};base64,{}", format.mime_type(), STANDARD.encode(data))
}

/// SVG goes into an `<object>` so that it stays scriptable; everything else is an `<img>`
pub fn html_embed(src: &str, format: &OutputFormat) -> String {
    if format.is_svg() {
        format!("<object type=\"image/svg+xml\" data=\"{}\"></object>", src)
    } else {
        format!("<img src=\"{}\" />", src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_dot() -> bool {
        which::which("dot").is_ok()
    }

    #[test]
    fn test_data_uri() {
        assert_eq!(data_uri(b"abc", &OutputFormat::Png), "data:image/png;base64,YWJj");
        assert_eq!(
            data_uri(b"<svg/>", &OutputFormat::Svg),
            "data:image/svg+xml;base64,PHN2Zy8+"
        );
    }

    #[test]
    fn test_html_embed() {
        assert_eq!(
            html_embed("data:x", &OutputFormat::Svgz),
            "<object type=\"image/svg+xml\" data=\"data:x\"></object>"
        );
        assert_eq!(html_embed("data:x", &OutputFormat::Png), "<img src=\"data:x\" />");
    }

    #[test]
    fn test_missing_program() {
        let options = RenderOptions {
            format: OutputFormat::Png,
            program: "definitely-not-a-renderer-binary".to_string(),
        };
        let result = create_image_data("graph G {\n}\n", &options);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found on PATH"));
    }

    #[test]
    fn test_data_uri_for_unlisted_format() {
        let format: OutputFormat = "bmp".parse().unwrap();
        assert_eq!(data_uri(b"abc", &format), "data:image/bmp;base64,YWJj");
        assert_eq!(html_embed("data:x", &format), "<img src=\"data:x\" />");
    }

    #[test]
    fn test_render_unlisted_format_verbatim() {
        if !has_dot() {
            return;
        }
        let options = RenderOptions {
            format: "plain".parse().unwrap(),
            ..RenderOptions::default()
        };
        let data = create_image_data("graph G {\n  a -- b\n}\n", &options).unwrap();
        assert!(String::from_utf8_lossy(&data).starts_with("graph "));
    }

    #[test]
    fn test_render_png() {
        if !has_dot() {
            return;
        }
        let data = create_image_data("graph G {\n  a -- b\n}\n", &RenderOptions::default()).unwrap();
        assert!(data.starts_with(&[137, 80, 78, 71, 13, 10, 26, 10]));
    }

    #[test]
    fn test_render_file_is_owned_by_caller() {
        if !has_dot() {
            return;
        }
        let options = RenderOptions {
            format: OutputFormat::Svg,
            ..RenderOptions::default()
        };
        let path = create_image_file("digraph G {\n  a -> b\n}\n", &options).unwrap();
        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "svg");
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_render_syntax_error() {
        if !has_dot() {
            return;
        }
        let result = create_image_data("graph G { -- }", &RenderOptions::default());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unable to invoke"));
    }
}
