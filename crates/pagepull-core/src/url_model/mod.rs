//! Resource descriptors: mapping an id to its remote URL and local path.
//!
//! A [`ResourceTemplate`] renders a URL template and a filename template for
//! each id; the filename is joined onto the output directory. Both templates
//! are validated once, up front, so rendering is infallible.

mod path;
mod template;

use std::path::{Path, PathBuf};

pub use path::is_safe_file_name;
pub use template::IdTemplate;

/// One unit of work: the id, where to fetch it from, and where to store it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: u32,
    pub url: String,
    pub path: PathBuf,
}

/// Maps a resource id to its descriptor. Implemented by [`ResourceTemplate`]
/// and by any `Fn(u32) -> Resource` closure (handy in tests).
pub trait Locate: Send + Sync {
    fn locate(&self, id: u32) -> Resource;
}

impl<F> Locate for F
where
    F: Fn(u32) -> Resource + Send + Sync,
{
    fn locate(&self, id: u32) -> Resource {
        self(id)
    }
}

/// Errors from parsing or validating URL / filename templates.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template {0:?} has no {{id}} placeholder")]
    MissingId(String),
    #[error("template {template:?} has unknown placeholder {{{placeholder}}}")]
    UnknownPlaceholder {
        template: String,
        placeholder: String,
    },
    #[error("template {0:?} has an unclosed '{{'")]
    Unclosed(String),
    #[error("url template {template:?} does not render to a valid http(s) URL: {reason}")]
    InvalidUrl { template: String, reason: String },
    #[error("file template {0:?} must render to a single file name (no separators, not . or ..)")]
    UnsafeFileName(String),
}

/// Deterministic id → [`Resource`] mapping built from two templates.
#[derive(Debug, Clone)]
pub struct ResourceTemplate {
    url: IdTemplate,
    file: IdTemplate,
    output_dir: PathBuf,
}

impl ResourceTemplate {
    pub fn new(
        url_template: &str,
        file_template: &str,
        output_dir: impl AsRef<Path>,
    ) -> Result<Self, TemplateError> {
        let url = IdTemplate::parse(url_template)?;
        let file = IdTemplate::parse(file_template)?;

        let sample = url.render(1);
        match url::Url::parse(&sample) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
            Ok(u) => {
                return Err(TemplateError::InvalidUrl {
                    template: url_template.to_string(),
                    reason: format!("unsupported scheme {:?}", u.scheme()),
                })
            }
            Err(e) => {
                return Err(TemplateError::InvalidUrl {
                    template: url_template.to_string(),
                    reason: e.to_string(),
                })
            }
        }

        // Digits never introduce separators, so checking the literals plus one render is enough.
        let literals_ok = file.literals().all(|s| !s.contains(['/', '\\', '\0']));
        if !literals_ok || !is_safe_file_name(&file.render(1)) {
            return Err(TemplateError::UnsafeFileName(file_template.to_string()));
        }

        Ok(Self {
            url,
            file,
            output_dir: output_dir.as_ref().to_path_buf(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl Locate for ResourceTemplate {
    fn locate(&self, id: u32) -> Resource {
        Resource {
            id,
            url: self.url.render(id),
            path: self.output_dir.join(self.file.render(id)),
        }
    }
}
