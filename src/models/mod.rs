pub mod allow_list;
pub mod book;
pub mod slug;

pub use allow_list::AllowList;
pub use book::{Book, Part, Subsection, MAX_SUBSECTIONS_PER_PART, PART_ID_BLOCK};
pub use slug::{book_slug_from_url, slug_from_url, slugify};
