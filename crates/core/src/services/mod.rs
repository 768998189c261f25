mod page_info;
mod paginator;

#[cfg(test)]
mod fixtures;

pub use page_info::PageInfoAssembler;
pub use paginator::KeysetPaginator;
