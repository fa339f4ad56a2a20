//! Content records carried by tiles.
//!
//! The core never interprets a post: it only tells content tiles apart from
//! plain ones and hands the record back to whoever renders the open post.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostData {
    pub id: String,
    pub title_short: String,
    pub title_long: String,
    pub body: String,
    pub thumbnail: Option<String>,
    pub images: Vec<String>,
    pub videos: Vec<String>,
}

impl PostData {
    /// Number of carousel entries (images then videos).
    pub fn media_count(&self) -> usize {
        self.images.len() + self.videos.len()
    }
}

pub fn posts_from_ron_str(src: &str) -> Result<Vec<PostData>, ConfigError> {
    Ok(ron::de::from_str(src)?)
}

pub fn load_posts(path: &Path) -> Result<Vec<PostData>, ConfigError> {
    let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    posts_from_ron_str(&src)
}

/// Animated state of the open post, read by the page-post collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PostView {
    /// `0` = hidden, `1` = fully shown.
    pub opacity: f32,
    /// Index of the carousel entry currently selected.
    pub carousel_index: usize,
    /// Animated carousel position, in entries.
    pub carousel_offset: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posts_parse_with_missing_fields() {
        let posts = posts_from_ron_str(
            r#"[(id: "a", title_short: "A", images: ["x.png", "y.png"]), (id: "b")]"#,
        )
        .unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].media_count(), 2);
        assert_eq!(posts[1].title_short, "");
    }
}
