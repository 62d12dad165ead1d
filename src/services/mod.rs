pub mod content;
pub mod dashboard;
pub mod dates;
pub mod fuzzy;
pub mod meeting;
pub mod seed;
pub mod slug;
pub mod stats;
