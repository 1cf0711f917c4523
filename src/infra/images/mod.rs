// Image assets: downloads remote images referenced by documents.

pub mod image_downloader;

pub use image_downloader::ImageDownloader;
