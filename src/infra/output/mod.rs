// Site output: the page data file and optional standalone pages.

pub mod page_data_writer;
pub mod page_renderer;

pub use page_data_writer::write_page_data;
pub use page_renderer::render_pages;
