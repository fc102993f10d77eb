use serde::{Deserialize, Serialize};

/// One item from the posts API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub body: String,
}

impl Post {
    /// File name the saved post is written under
    pub fn file_name(&self) -> String {
        format!("post_{}.txt", self.id)
    }

    /// Text typed into the editor for this post
    pub fn file_content(&self) -> String {
        format!("Title: {}\n\n{}", self.title, self.body)
    }
}

/// Deterministic substitute data used when the live API is unavailable.
///
/// Produces exactly `count` posts with ids 1..=count so a failed fetch
/// still drives a full batch.
pub fn placeholder_posts(count: usize) -> Vec<Post> {
    (1..=count as u64)
        .map(|i| Post {
            id: i,
            title: format!("Placeholder for post {}", i),
            body: format!("This is a placeholder for post {} because API call failed", i),
        })
        .collect()
}
